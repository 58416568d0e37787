use crate::attrs::RawAttr;
use crate::constants::ATTR_UNKNOWN_ATTRIBUTES;
use crate::error::{Error, Result};
use bytes::{BufMut, BytesMut};

/// UNKNOWN-ATTRIBUTES, sent alongside a 420 error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttributes {
    pub attr_types: Vec<u16>,
}

impl UnknownAttributes {
    pub fn new(attr_types: Vec<u16>) -> Self {
        Self { attr_types }
    }
}

impl From<UnknownAttributes> for RawAttr {
    fn from(attr: UnknownAttributes) -> Self {
        let mut bytes_buf = BytesMut::with_capacity(attr.attr_types.len() * 2);
        for v in attr.attr_types.iter() {
            bytes_buf.put_u16(*v);
        }

        RawAttr::new(ATTR_UNKNOWN_ATTRIBUTES, bytes_buf.freeze())
    }
}

impl TryFrom<RawAttr> for UnknownAttributes {
    type Error = Error;

    fn try_from(base_attr: RawAttr) -> Result<Self> {
        if base_attr.value.len() % 2 != 0 {
            return Err(Error::malformed(format!(
                "unknown_attributes len:{} is odd",
                base_attr.value.len()
            )));
        }

        let attr_types = base_attr
            .value
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();

        Ok(Self { attr_types })
    }
}
