use crate::attrs::RawAttr;
use crate::constants::ATTR_SOFTWARE;
use crate::error::{Error, Result};
use bytes::Bytes;

// 最多 128 个字符
pub const MAX_SOFTWARE_CHARS: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Software {
    pub description: String,
}

impl Software {
    /// Longer descriptions are cut at the character limit.
    pub fn new(description: &str) -> Self {
        let description = description.chars().take(MAX_SOFTWARE_CHARS).collect();
        Self { description }
    }
}

impl From<Software> for RawAttr {
    fn from(attr: Software) -> Self {
        RawAttr::new(ATTR_SOFTWARE, Bytes::from(attr.description.into_bytes()))
    }
}

impl TryFrom<RawAttr> for Software {
    type Error = Error;

    fn try_from(base_attr: RawAttr) -> Result<Self> {
        let description = String::from_utf8(base_attr.value.to_vec())
            .map_err(|_| Error::malformed("software not utf8"))?;

        Ok(Self { description })
    }
}
