use crate::attrs::address_attr::{AddressAttr, AddressFamily};
use crate::attrs::errcode_attr::ErrcodeAttr;
use crate::attrs::software::Software;
use crate::attrs::xor_address::XorMappedAddress;
use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::{Error, Result};
use crate::header::{MessageClass, TransId};
use crate::message::{decode_message, Message};
use crate::transaction::TransactionTracker;
use crate::util::print_bytes;
use bytes::Bytes;
use log::{debug, trace, warn};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// What to do with a matched response carrying comprehension-required
/// attributes this crate does not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownAttributePolicy {
    // 记录日志, 照常处理
    #[default]
    Ignore,
    // 返回 UnknownRequiredAttribute
    Reject,
}

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub software: Option<String>,
    pub fingerprint: bool,
    pub unknown_required: UnknownAttributePolicy,
    pub max_pending: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub trans_id: TransId,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingResult {
    Address {
        family: AddressFamily,
        ip: IpAddr,
        port: u16,
    },
    Failed {
        code: u16,
        reason: String,
    },
    // 不是发给我们的, 或重复的响应, 直接丢弃
    Unmatched,
}

impl BindingResult {
    fn from_addr(addr: SocketAddr) -> Self {
        BindingResult::Address {
            family: AddressFamily::of(&addr.ip()),
            ip: addr.ip(),
            port: addr.port(),
        }
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self {
            BindingResult::Address { ip, port, .. } => Some(SocketAddr::new(*ip, *port)),
            _ => None,
        }
    }

    /// `Failed` becomes `Error::BindingFailed`, `Unmatched` becomes `None`.
    pub fn into_address(self) -> Result<Option<SocketAddr>> {
        match self {
            BindingResult::Failed { code, reason } => Err(Error::BindingFailed { code, reason }),
            other => Ok(other.socket_addr()),
        }
    }
}

/// One client's view of binding exchanges: builds requests, consumes
/// whatever the transport receives.
pub struct BindingSession {
    config: SessionConfig,
    tracker: Arc<TransactionTracker>,
}

impl BindingSession {
    pub fn new(config: SessionConfig) -> Self {
        let tracker = Arc::new(TransactionTracker::with_max_pending(config.max_pending));
        Self { config, tracker }
    }

    /// Shares `tracker` with other sessions; `config.max_pending` is ignored.
    pub fn with_tracker(config: SessionConfig, tracker: Arc<TransactionTracker>) -> Self {
        Self { config, tracker }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<TransactionTracker> {
        &self.tracker
    }

    /// Finished transactions from earlier requests are purged first, so a
    /// matched or expired id stays observable only until the next request.
    pub fn start_binding_request(&self) -> Result<OutgoingRequest> {
        self.purge();
        let trans_id = self.tracker.begin_transaction()?;
        Ok(self.binding_request(trans_id))
    }

    /// The response will only be accepted from `server`.
    pub fn start_binding_request_to(&self, server: SocketAddr) -> Result<OutgoingRequest> {
        self.purge();
        let trans_id = self.tracker.begin_transaction_to(server)?;
        Ok(self.binding_request(trans_id))
    }

    /// Drops matched and expired transactions from the tracker. Sessions that
    /// stop issuing requests call this to release what is left.
    pub fn purge(&self) -> usize {
        let purged = self.tracker.purge();
        if purged > 0 {
            trace!("purge {} finished transactions", purged);
        }
        purged
    }

    fn binding_request(&self, trans_id: TransId) -> OutgoingRequest {
        let mut attrs: Vec<RawAttr> = vec![];
        if let Some(software) = &self.config.software {
            attrs.push(Software::new(software).into());
        }

        let request = Message::build(MessageClass::Request, METHOD_BINDING, trans_id, attrs);
        let data = match self.config.fingerprint {
            true => request.pack_with_fingerprint(),
            false => request.pack(),
        };

        debug!("binding request len: {}", data.len());
        trace!("\n{}", print_bytes(&data, " ", 8));

        OutgoingRequest { trans_id, data }
    }

    pub fn handle_received(&self, buf: &[u8]) -> Result<BindingResult> {
        self.handle(buf, None)
    }

    pub fn handle_received_from(&self, buf: &[u8], source: SocketAddr) -> Result<BindingResult> {
        self.handle(buf, Some(source))
    }

    pub fn expire(&self, trans_id: &TransId) -> bool {
        self.tracker.expire(trans_id)
    }

    fn handle(&self, buf: &[u8], source: Option<SocketAddr>) -> Result<BindingResult> {
        trace!("recv len: {}\n{}", buf.len(), print_bytes(buf, " ", 8));
        let message = decode_message(buf)?;

        if !message.class().is_response() || message.method() != METHOD_BINDING {
            debug!("discard {:?}, not a binding response", message.header.msg_type);
            return Ok(BindingResult::Unmatched);
        }

        if message.fingerprint == Some(false) {
            return Err(Error::FingerprintMismatch);
        }

        let trans_id = message.trans_id();
        let matched = match source {
            Some(v) => self.tracker.match_response_from(trans_id, v),
            None => self.tracker.match_response(trans_id),
        };
        if !matched {
            debug!(
                "discard response, no pending transaction {}",
                print_bytes(trans_id, "", 16)
            );
            return Ok(BindingResult::Unmatched);
        }

        if !message.unknown_required.is_empty() {
            match self.config.unknown_required {
                UnknownAttributePolicy::Reject => {
                    return Err(Error::UnknownRequiredAttribute(message.unknown_required));
                }
                UnknownAttributePolicy::Ignore => {
                    warn!(
                        "unknown comprehension-required attributes: {:04x?}",
                        message.unknown_required
                    );
                }
            }
        }

        match message.class() {
            MessageClass::ErrorResponse => {
                let err_code = message
                    .typed_attr::<ErrcodeAttr>(ATTR_ERROR_CODE)
                    .ok_or(Error::MissingAttribute(ATTR_ERROR_CODE))??;

                debug!("binding failed: {} {}", err_code.code, err_code.reason);
                Ok(BindingResult::Failed {
                    code: err_code.code,
                    reason: err_code.reason,
                })
            }
            _ => {
                let addr = mapped_address(&message)?;
                debug!("mapped address: {}", addr);
                Ok(BindingResult::from_addr(addr))
            }
        }
    }
}

// 优先 xor-mapped-address, 没有的话用 mapped-address
fn mapped_address(message: &Message) -> Result<SocketAddr> {
    if let Some(attr) = message.find_attr(ATTR_XOR_MAPPED_ADDRESS) {
        let xor = XorMappedAddress::from_base_attr(attr, message.trans_id())?;
        return Ok(xor.address);
    }

    if let Some(attr) = message.find_attr(ATTR_MAPPED_ADDRESS) {
        let mapped = AddressAttr::try_from(attr.clone())?;
        return Ok(mapped.address);
    }

    Err(Error::MissingAttribute(ATTR_XOR_MAPPED_ADDRESS))
}
