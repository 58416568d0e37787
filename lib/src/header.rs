#![allow(clippy::len_without_is_empty)]

use crate::constants::*;
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use std::fmt;

pub type TransId = [u8; TRANS_ID_LEN];

// type 字段的 14 位里, class 的两位分散在 method 中间:
//
//  0                 1
//  2  3  4 5 6 7 8 9 0 1 2 3 4 5
// +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
// |M |M |M|M|M|C|M|M|M|C|M|M|M|M|
// |11|10|9|8|7|1|6|5|4|0|3|2|1|0|
// +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
pub const CLASS_C0_MASK: u16 = 0x0010;
pub const CLASS_C1_MASK: u16 = 0x0100;
pub const METHOD_LOW_MASK: u16 = 0x000F;
pub const METHOD_MID_MASK: u16 = 0x00E0;
pub const METHOD_HIGH_MASK: u16 = 0x3E00;
pub const METHOD_MAX: u16 = 0x0FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    Request,
    Indication,
    SuccessResponse,
    ErrorResponse,
}

impl MessageClass {
    fn to_bits(self) -> u16 {
        match self {
            MessageClass::Request => 0b00,
            MessageClass::Indication => 0b01,
            MessageClass::SuccessResponse => 0b10,
            MessageClass::ErrorResponse => 0b11,
        }
    }

    fn from_bits(bits: u16) -> Self {
        match bits & 0b11 {
            0b00 => MessageClass::Request,
            0b01 => MessageClass::Indication,
            0b10 => MessageClass::SuccessResponse,
            _ => MessageClass::ErrorResponse,
        }
    }

    pub fn is_response(self) -> bool {
        matches!(
            self,
            MessageClass::SuccessResponse | MessageClass::ErrorResponse
        )
    }
}

/// The 14-bit message type: a method with the two class bits interleaved.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType(u16);

impl MessageType {
    pub fn from_class_method(class: MessageClass, method: u16) -> Self {
        Self(pack_message_type(class, method))
    }

    pub fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn class(self) -> MessageClass {
        unpack_message_type(self.0).0
    }

    pub fn method(self) -> u16 {
        unpack_message_type(self.0).1
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MessageType({:#06x}, {:?}, method: {:#05x})",
            self.0,
            self.class(),
            self.method()
        )
    }
}

/// Method bits above 12 are dropped.
pub fn pack_message_type(class: MessageClass, method: u16) -> u16 {
    let m = method & METHOD_MAX;
    let c = class.to_bits();

    (m & METHOD_LOW_MASK)
        | ((m << 1) & METHOD_MID_MASK)
        | ((m << 2) & METHOD_HIGH_MASK)
        | ((c << 4) & CLASS_C0_MASK)
        | ((c << 7) & CLASS_C1_MASK)
}

pub fn unpack_message_type(msg_type: u16) -> (MessageClass, u16) {
    let method = (msg_type & METHOD_LOW_MASK)
        | ((msg_type & METHOD_MID_MASK) >> 1)
        | ((msg_type & METHOD_HIGH_MASK) >> 2);
    let class = ((msg_type & CLASS_C0_MASK) >> 4) | ((msg_type & CLASS_C1_MASK) >> 7);

    (MessageClass::from_bits(class), method)
}

// rfc 5389, 6
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub msg_type: MessageType,

    // 不包括header的20字节
    pub msg_len: u16,

    pub trans_id: TransId,
}

impl Header {
    pub fn new(msg_type: MessageType, msg_len: u16, trans_id: TransId) -> Self {
        Self {
            msg_type,
            msg_len,
            trans_id,
        }
    }

    pub fn len(&self) -> usize {
        HEADER_LEN
    }

    pub fn class(&self) -> MessageClass {
        self.msg_type.class()
    }

    pub fn method(&self) -> u16 {
        self.msg_type.method()
    }

    pub fn pack(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_LEN);
        buf.put_u16(self.msg_type.raw());
        buf.put_u16(self.msg_len);
        buf.put_u32(MAGIC_COOKIE);
        buf.put_slice(&self.trans_id);
        buf.freeze()
    }

    /// Parses the fixed header. The length field is only read here; checking
    /// it against the body is the caller's job.
    pub fn unpack(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(Error::TooShort(buf.len()));
        }

        let mut index = 0_usize;
        let msg_type = u16::from_be_bytes([buf[index], buf[index + 1]]);
        if msg_type & 0xC000 != 0 {
            return Err(Error::BadMessageType(msg_type));
        }

        index += 2;
        let msg_len = u16::from_be_bytes([buf[index], buf[index + 1]]);

        index += 2;
        let cookie = u32::from_be_bytes([
            buf[index],
            buf[index + 1],
            buf[index + 2],
            buf[index + 3],
        ]);
        if cookie != MAGIC_COOKIE {
            return Err(Error::BadCookie(cookie));
        }

        index += 4;
        let mut trans_id = [0_u8; TRANS_ID_LEN];
        trans_id.copy_from_slice(&buf[index..HEADER_LEN]);

        Ok(Self {
            msg_type: MessageType::from_raw(msg_type),
            msg_len,
            trans_id,
        })
    }
}
