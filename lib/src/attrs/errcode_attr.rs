use crate::attrs::RawAttr;
use crate::constants::ATTR_ERROR_CODE;
use crate::error::{Error, Result};
use crate::util;
use bytes::{BufMut, BytesMut};

// reserved: 21 bit
// class:  3 bit        3-6
// number: 8 bit        0-99
// reason: utf8, 不含 padding

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrcodeAttr {
    pub code: u16,
    pub reason: String,
}

impl ErrcodeAttr {
    /// `code` must be in 300..=699, otherwise use `try_new`.
    pub fn new(code: u16, reason: &str) -> Self {
        debug_assert!(is_valid_code(code), "err_code {} out of range", code);
        Self {
            code,
            reason: reason.to_string(),
        }
    }

    pub fn try_new(code: u16, reason: &str) -> Result<Self> {
        if !is_valid_code(code) {
            return Err(Error::malformed(format!("err_code {} out of range", code)));
        }

        Ok(Self {
            code,
            reason: reason.to_string(),
        })
    }

    pub fn class(&self) -> u8 {
        util::pack_error_code(self.code).0
    }

    pub fn number(&self) -> u8 {
        util::pack_error_code(self.code).1
    }
}

// class 3-6, number 0-99
fn is_valid_code(code: u16) -> bool {
    (300..=699).contains(&code)
}

impl From<ErrcodeAttr> for RawAttr {
    fn from(attr: ErrcodeAttr) -> Self {
        let (class, number) = util::pack_error_code(attr.code);

        let mut bytes_buf = BytesMut::with_capacity(4 + attr.reason.len());
        bytes_buf.put_u16(0);
        bytes_buf.put_u8(class);
        bytes_buf.put_u8(number);
        bytes_buf.put_slice(attr.reason.as_bytes());

        RawAttr::new(ATTR_ERROR_CODE, bytes_buf.freeze())
    }
}

impl TryFrom<RawAttr> for ErrcodeAttr {
    type Error = Error;

    fn try_from(base_attr: RawAttr) -> Result<Self> {
        let value = &base_attr.value;
        if value.len() < 4 {
            return Err(Error::malformed(format!(
                "err_code attr buf len:{} < 4",
                value.len()
            )));
        }

        let class = value[2] & 0x07;
        let number = value[3];
        if !(3..=6).contains(&class) || number > 99 {
            return Err(Error::malformed(format!(
                "err_code class:{} number:{}",
                class, number
            )));
        }

        let reason = std::str::from_utf8(&value[4..])
            .map_err(|_| Error::malformed("err_code reason not utf8"))?;

        Ok(Self {
            code: util::unpack_error_code(class, number),
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_errcode_layout() {
        let raw: RawAttr = ErrcodeAttr::new(420, "Unknown Attribute").into();
        assert_eq!(raw.attr_type, ATTR_ERROR_CODE);
        assert_eq!(&raw.value[..4], &[0, 0, 4, 20]);
        assert_eq!(raw.attr_len as usize, 4 + "Unknown Attribute".len());

        let back = ErrcodeAttr::try_from(raw).unwrap();
        assert_eq!(back.code, 420);
        assert_eq!(back.reason, "Unknown Attribute");
    }

    #[test]
    fn test_errcode_bad_values() {
        let bad_class = RawAttr::new(ATTR_ERROR_CODE, Bytes::from_static(&[0, 0, 7, 0]));
        assert!(ErrcodeAttr::try_from(bad_class).is_err());

        let bad_number = RawAttr::new(ATTR_ERROR_CODE, Bytes::from_static(&[0, 0, 4, 100]));
        assert!(ErrcodeAttr::try_from(bad_number).is_err());

        let bad_utf8 = RawAttr::new(ATTR_ERROR_CODE, Bytes::from_static(&[0, 0, 4, 0, 0xff]));
        assert!(ErrcodeAttr::try_from(bad_utf8).is_err());
    }

    #[test]
    fn test_errcode_try_new_range() {
        for code in [0, 299, 700, 1000, u16::MAX] {
            assert!(
                matches!(ErrcodeAttr::try_new(code, "x"), Err(Error::MalformedAttribute(_))),
                "code {}",
                code
            );
        }

        // 边界值编码后能被自己解开
        for code in [300, 420, 699] {
            let raw: RawAttr = ErrcodeAttr::try_new(code, "edge").unwrap().into();
            let back = ErrcodeAttr::try_from(raw).unwrap();
            assert_eq!(back.code, code);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn test_errcode_new_rejects_1000() {
        let _ = ErrcodeAttr::new(1000, "too big");
    }
}
