//! The answering side of a binding exchange: turns a request and the address
//! it arrived from into the response to send back.

use crate::attrs::address_attr::AddressAttr;
use crate::attrs::errcode_attr::ErrcodeAttr;
use crate::attrs::software::Software;
use crate::attrs::unknown_attrs::UnknownAttributes;
use crate::attrs::xor_address::XorMappedAddress;
use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::Result;
use crate::header::MessageClass;
use crate::message::{decode_message, Message};
use bytes::Bytes;
use log::debug;
use std::net::SocketAddr;

#[derive(Debug, Clone, Default)]
pub struct ResponderConfig {
    pub software: Option<String>,
    pub fingerprint: bool,
    // 同时带上旧的 mapped-address, 兼容 rfc 3489 客户端
    pub include_mapped_address: bool,
}

pub struct Responder {
    config: ResponderConfig,
}

impl Responder {
    pub fn new(config: ResponderConfig) -> Self {
        Self { config }
    }

    /// Decodes `buf` and packs the response for it, if any.
    pub fn handle(&self, buf: &[u8], source: SocketAddr) -> Result<Option<Bytes>> {
        let request = decode_message(buf)?;
        Ok(self.respond(&request, source).map(|x| self.pack(&x)))
    }

    /// Indications, responses and requests with a bad FINGERPRINT get no
    /// answer.
    pub fn respond(&self, request: &Message, source: SocketAddr) -> Option<Message> {
        if request.class() != MessageClass::Request {
            debug!("ignore {:?} from {}", request.header.msg_type, source);
            return None;
        }

        if request.fingerprint == Some(false) {
            debug!("drop request from {}, fingerprint mismatch", source);
            return None;
        }

        let trans_id = *request.trans_id();

        if request.method() != METHOD_BINDING {
            debug!("bad request method {:#05x} from {}", request.method(), source);
            return Some(self.error_response(request, ERROR_CODE_BAD_REQUEST, vec![]));
        }

        if !request.unknown_required.is_empty() {
            debug!(
                "unknown attributes {:04x?} from {}",
                request.unknown_required, source
            );
            let unknown = UnknownAttributes::new(request.unknown_required.clone());
            return Some(self.error_response(
                request,
                ERROR_CODE_UNKNOWN_ATTRIBUTE,
                vec![unknown.into()],
            ));
        }

        let mut attrs: Vec<RawAttr> = vec![XorMappedAddress::new(trans_id, source).into()];
        if self.config.include_mapped_address {
            attrs.push(AddressAttr::mapped(source).into());
        }
        if let Some(software) = &self.config.software {
            attrs.push(Software::new(software).into());
        }

        Some(Message::build(
            MessageClass::SuccessResponse,
            METHOD_BINDING,
            trans_id,
            attrs,
        ))
    }

    fn error_response(&self, request: &Message, code: u16, extra: Vec<RawAttr>) -> Message {
        let mut attrs: Vec<RawAttr> = vec![ErrcodeAttr::new(code, reason_phrase(code)).into()];
        attrs.extend(extra);
        if let Some(software) = &self.config.software {
            attrs.push(Software::new(software).into());
        }

        Message::build(
            MessageClass::ErrorResponse,
            request.method(),
            *request.trans_id(),
            attrs,
        )
    }

    pub fn pack(&self, response: &Message) -> Bytes {
        match self.config.fingerprint {
            true => response.pack_with_fingerprint(),
            false => response.pack(),
        }
    }
}
