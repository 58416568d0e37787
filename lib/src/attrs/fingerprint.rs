use crate::attrs::RawAttr;
use crate::constants::{ATTR_FINGERPRINT, FINGERPRINT_XOR};
use crate::error::{Error, Result};
use bytes::Bytes;

pub const FINGERPRINT_ATTR_LEN: usize = 8;

/// CRC-32 of `data` xored with the fingerprint constant. `data` is the
/// message up to (not including) the FINGERPRINT attribute, with the header
/// length already counting it.
pub fn compute(data: &[u8]) -> u32 {
    crc32fast::hash(data) ^ FINGERPRINT_XOR
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub crc: u32,
}

impl Fingerprint {
    pub fn new(crc: u32) -> Self {
        Self { crc }
    }

    pub fn verify(&self, data: &[u8]) -> bool {
        self.crc == compute(data)
    }
}

impl From<Fingerprint> for RawAttr {
    fn from(attr: Fingerprint) -> Self {
        RawAttr::new(
            ATTR_FINGERPRINT,
            Bytes::copy_from_slice(&attr.crc.to_be_bytes()),
        )
    }
}

impl TryFrom<RawAttr> for Fingerprint {
    type Error = Error;

    fn try_from(base_attr: RawAttr) -> Result<Self> {
        let crc: [u8; 4] = base_attr.value[..]
            .try_into()
            .map_err(|_| Error::malformed(format!(
                "fingerprint attr len:{} != 4",
                base_attr.value.len()
            )))?;

        Ok(Self {
            crc: u32::from_be_bytes(crc),
        })
    }
}
