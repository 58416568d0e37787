#![allow(clippy::len_without_is_empty)]

use crate::constants::*;
use crate::error::{Error, Result};
use crate::util::padding_len;
use bytes::{BufMut, Bytes, BytesMut};

pub mod address_attr;
pub mod errcode_attr;
pub mod fingerprint;
pub mod software;
pub mod unknown_attrs;
pub mod xor_address;

/// A type-length-value record as it sits on the wire. Attributes this crate
/// has no typed form for stay in this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttr {
    pub attr_type: u16,
    // value 的真实长度, 不含 padding
    pub attr_len: u16,
    pub value: Bytes,
}

impl RawAttr {
    /// `value` must not exceed 65535 bytes.
    pub fn new(attr_type: u16, value: Bytes) -> Self {
        debug_assert!(value.len() <= u16::MAX as usize, "attr value {} bytes", value.len());
        Self {
            attr_type,
            attr_len: value.len() as u16,
            value,
        }
    }

    /// Encoded size, padding included.
    pub fn len(&self) -> usize {
        let value_len = self.attr_len as usize;
        ATTR_HEADER_LEN + value_len + padding_len(value_len)
    }

    pub fn is_comprehension_required(&self) -> bool {
        is_comprehension_required(self.attr_type)
    }

    pub fn is_understood(&self) -> bool {
        !self.is_comprehension_required() || KNOWN_REQUIRED_ATTRS.contains(&self.attr_type)
    }

    pub fn pack(&self) -> Bytes {
        encode_attribute(self.attr_type, &self.value)
    }

    pub fn pack_into(&self, buf: &mut BytesMut) {
        put_attribute(buf, self.attr_type, &self.value);
    }

    /// Decodes the attribute starting at `offset`, returning it with the
    /// number of bytes consumed (padding included).
    pub fn unpack(buf: &Bytes, offset: usize) -> Result<(Self, usize)> {
        let (attr_type, value, consumed) = decode_attribute(buf, offset)?;
        Ok((Self::new(attr_type, value), consumed))
    }
}

pub fn encode_attribute(attr_type: u16, value: &[u8]) -> Bytes {
    let len = value.len();
    let mut buf = BytesMut::with_capacity(ATTR_HEADER_LEN + len + padding_len(len));
    put_attribute(&mut buf, attr_type, value);
    buf.freeze()
}

fn put_attribute(buf: &mut BytesMut, attr_type: u16, value: &[u8]) {
    buf.put_u16(attr_type);
    buf.put_u16(value.len() as u16);
    buf.put_slice(value);
    buf.put_bytes(0, padding_len(value.len()));
}

pub fn decode_attribute(buf: &Bytes, offset: usize) -> Result<(u16, Bytes, usize)> {
    let remaining = buf.len().saturating_sub(offset);
    if remaining < ATTR_HEADER_LEN {
        return Err(Error::malformed(format!(
            "attr header at offset {}: {} bytes left",
            offset, remaining
        )));
    }

    let attr_type = u16::from_be_bytes([buf[offset], buf[offset + 1]]);
    let attr_len = u16::from_be_bytes([buf[offset + 2], buf[offset + 3]]) as usize;
    let consumed = ATTR_HEADER_LEN + attr_len + padding_len(attr_len);

    if consumed > remaining {
        return Err(Error::malformed(format!(
            "attr {:#06x} len:{} needs {} bytes, {} left",
            attr_type, attr_len, consumed, remaining
        )));
    }

    let start = offset + ATTR_HEADER_LEN;
    let value = buf.slice(start..start + attr_len);

    Ok((attr_type, value, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_is_zero_and_not_counted() {
        for n in 0..12_usize {
            let value = vec![0xAB_u8; n];
            let buf = encode_attribute(0x8022, &value);

            let pad = (4 - n % 4) % 4;
            assert_eq!(buf.len(), 4 + n + pad);
            assert_eq!(buf.len() % 4, 0);
            assert_eq!(u16::from_be_bytes([buf[2], buf[3]]) as usize, n);
            assert!(buf[4 + n..].iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn test_decode_at_offset() {
        let mut buf = BytesMut::new();
        buf.put_slice(&encode_attribute(0x0006, b"alice"));
        buf.put_slice(&encode_attribute(0x8022, b"abcd"));
        let buf = buf.freeze();

        let (attr, consumed) = RawAttr::unpack(&buf, 0).unwrap();
        assert_eq!(consumed, 12);
        assert_eq!(attr.attr_type, 0x0006);
        assert_eq!(&attr.value[..], b"alice");

        let (attr, consumed) = RawAttr::unpack(&buf, 12).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(attr.attr_type, 0x8022);
        assert_eq!(&attr.value[..], b"abcd");
    }

    #[test]
    fn test_decode_truncated() {
        let buf = encode_attribute(0x0006, b"alice");

        // 少于 4 字节
        let short = buf.slice(..3);
        assert!(matches!(
            decode_attribute(&short, 0),
            Err(Error::MalformedAttribute(_))
        ));

        // 缺少 padding
        let no_pad = buf.slice(..9);
        assert!(matches!(
            decode_attribute(&no_pad, 0),
            Err(Error::MalformedAttribute(_))
        ));

        // offset 越界
        assert!(matches!(
            decode_attribute(&buf, 100),
            Err(Error::MalformedAttribute(_))
        ));
    }

    #[test]
    fn test_understood() {
        let unknown_optional = RawAttr::new(0x8999, Bytes::new());
        let unknown_required = RawAttr::new(0x0999, Bytes::new());
        let xor = RawAttr::new(ATTR_XOR_MAPPED_ADDRESS, Bytes::new());

        assert!(unknown_optional.is_understood());
        assert!(!unknown_required.is_understood());
        assert!(xor.is_understood());
    }
}
