use crate::attrs::fingerprint::{self, Fingerprint, FINGERPRINT_ATTR_LEN};
use crate::attrs::RawAttr;
use crate::constants::*;
use crate::error::{Error, Result};
use crate::header::{Header, MessageClass, MessageType, TransId};
use bytes::{BufMut, Bytes, BytesMut};

// 是否是一个正确的stun 包
// 最高两位为 0
// 验证 magic cookie
// 验证message length, 4 的倍数且等于剩余字节数
// 属性按顺序解析, 任何一个属性出错整个包都丢弃

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub attrs: Vec<RawAttr>,

    // 解码时遇到的不认识的 comprehension-required 属性
    pub unknown_required: Vec<u16>,

    // None: 没有 fingerprint 属性
    pub fingerprint: Option<bool>,
}

impl Message {
    pub fn new(header: Header, attrs: Vec<RawAttr>) -> Self {
        let mut message = Self {
            header,
            attrs,
            unknown_required: vec![],
            fingerprint: None,
        };
        message.update_header_len();
        message
    }

    pub fn build(class: MessageClass, method: u16, trans_id: TransId, attrs: Vec<RawAttr>) -> Self {
        let msg_type = MessageType::from_class_method(class, method);
        Self::new(Header::new(msg_type, 0, trans_id), attrs)
    }

    fn body_len(&self) -> usize {
        self.attrs.iter().fold(0_usize, |acc, x| acc + x.len())
    }

    fn update_header_len(&mut self) {
        self.header.msg_len = header_len(self.body_len());
    }

    pub fn add_attr(&mut self, attr: RawAttr) {
        self.attrs.push(attr);
        self.update_header_len();
    }

    pub fn add_attrs(&mut self, mut attrs: Vec<RawAttr>) {
        self.attrs.append(&mut attrs);
        self.update_header_len();
    }

    pub fn class(&self) -> MessageClass {
        self.header.class()
    }

    pub fn method(&self) -> u16 {
        self.header.method()
    }

    pub fn trans_id(&self) -> &TransId {
        &self.header.trans_id
    }

    pub fn find_attr(&self, attr_type: u16) -> Option<&RawAttr> {
        self.attrs.iter().find(|x| x.attr_type == attr_type)
    }

    /// First attribute of `attr_type` converted to its typed form.
    pub fn typed_attr<T>(&self, attr_type: u16) -> Option<Result<T>>
    where
        T: TryFrom<RawAttr, Error = Error>,
    {
        self.find_attr(attr_type).map(|x| T::try_from(x.clone()))
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.header.msg_len as usize);
        buf.put_slice(&self.header.pack());
        for v in self.attrs.iter() {
            v.pack_into(&mut buf);
        }

        buf.freeze()
    }

    /// Like `pack`, with a FINGERPRINT attribute appended. The header length
    /// covers the fingerprint before the CRC is taken.
    pub fn pack_with_fingerprint(&self) -> Bytes {
        let body_len = self.body_len() + FINGERPRINT_ATTR_LEN;
        let header = Header::new(self.header.msg_type, header_len(body_len), self.header.trans_id);

        let mut buf = BytesMut::with_capacity(HEADER_LEN + body_len);
        buf.put_slice(&header.pack());
        for v in self.attrs.iter() {
            v.pack_into(&mut buf);
        }

        let crc = fingerprint::compute(&buf);
        RawAttr::from(Fingerprint::new(crc)).pack_into(&mut buf);

        buf.freeze()
    }

    pub fn unpack(buf: Bytes) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(Error::TooShort(buf.len()));
        }

        let header = Header::unpack(&buf)?;

        let declared = header.msg_len as usize;
        let actual = buf.len() - HEADER_LEN;
        if declared % 4 != 0 || declared != actual {
            return Err(Error::LengthMismatch { declared, actual });
        }

        let end = buf.len();
        let mut offset = HEADER_LEN;
        let mut attrs = vec![];
        let mut unknown_required = vec![];
        let mut fingerprint = None;

        while end - offset >= ATTR_HEADER_LEN {
            let (attr, consumed) = RawAttr::unpack(&buf, offset)?;

            if attr.attr_type == ATTR_FINGERPRINT {
                let fp = Fingerprint::try_from(attr.clone())?;
                // fingerprint 必须是最后一个属性
                let is_last = offset + consumed == end;
                fingerprint = Some(is_last && fp.verify(&buf[..offset]));
            }

            if !attr.is_understood() {
                unknown_required.push(attr.attr_type);
            }

            attrs.push(attr);
            offset += consumed;
        }

        if offset != end {
            return Err(Error::TrailingBytes(end - offset));
        }

        Ok(Self {
            header,
            attrs,
            unknown_required,
            fingerprint,
        })
    }
}

// 超长的 body 不截断, 写成 0xFFFF 让对端按长度错误丢弃
fn header_len(body_len: usize) -> u16 {
    debug_assert!(
        body_len <= MAX_BODY_LEN,
        "message body {} exceeds {} bytes",
        body_len,
        MAX_BODY_LEN
    );
    u16::try_from(body_len).unwrap_or(u16::MAX)
}

pub fn encode_message(
    class: MessageClass,
    method: u16,
    trans_id: TransId,
    attrs: &[RawAttr],
) -> Bytes {
    Message::build(class, method, trans_id, attrs.to_vec()).pack()
}

pub fn encode_request(method: u16, trans_id: TransId, attrs: &[RawAttr]) -> Bytes {
    encode_message(MessageClass::Request, method, trans_id, attrs)
}

pub fn decode_message(buf: &[u8]) -> Result<Message> {
    Message::unpack(Bytes::copy_from_slice(buf))
}
