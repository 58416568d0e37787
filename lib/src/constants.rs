pub const MAGIC_COOKIE: u32 = 0x2112A442;
pub const MAGIC_COOKIE_BYTES: [u8; 4] = MAGIC_COOKIE.to_be_bytes();

pub const TRANS_ID_LEN: usize = 12;
pub const HEADER_LEN: usize = 20;
pub const ATTR_HEADER_LEN: usize = 4;

// header 里的 length 只有 16 bit, 且必须是 4 的倍数
pub const MAX_BODY_LEN: usize = 0xFFFC;

pub const METHOD_BINDING: u16 = 0x0001;

pub const ATTR_FAMILY_IPV4: u8 = 0x01;
pub const ATTR_FAMILY_IPV6: u8 = 0x02;

// comprehension-required: 0x0000 - 0x7fff
pub const ATTR_MAPPED_ADDRESS: u16 = 0x0001;
pub const ATTR_USERNAME: u16 = 0x0006;
pub const ATTR_MESSAGE_INTEGRITY: u16 = 0x0008;
pub const ATTR_ERROR_CODE: u16 = 0x0009;
pub const ATTR_UNKNOWN_ATTRIBUTES: u16 = 0x000A;
pub const ATTR_REALM: u16 = 0x0014;
pub const ATTR_NONCE: u16 = 0x0015;
pub const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;

// comprehension-optional: 0x8000 - 0xffff
pub const ATTR_SOFTWARE: u16 = 0x8022;
pub const ATTR_ALTERNATE_SERVER: u16 = 0x8023;
pub const ATTR_FINGERPRINT: u16 = 0x8028;

pub const FINGERPRINT_XOR: u32 = 0x5354554E;

pub const ERROR_CODE_TRY_ALTERNATE: u16 = 300;
pub const ERROR_CODE_BAD_REQUEST: u16 = 400;
pub const ERROR_CODE_UNAUTHORIZED: u16 = 401;
pub const ERROR_CODE_UNKNOWN_ATTRIBUTE: u16 = 420;
pub const ERROR_CODE_STALE_NONCE: u16 = 438;
pub const ERROR_CODE_SERVER_ERROR: u16 = 500;

/// Comprehension-required attribute types this crate understands.
pub const KNOWN_REQUIRED_ATTRS: [u16; 8] = [
    ATTR_MAPPED_ADDRESS,
    ATTR_USERNAME,
    ATTR_MESSAGE_INTEGRITY,
    ATTR_ERROR_CODE,
    ATTR_UNKNOWN_ATTRIBUTES,
    ATTR_REALM,
    ATTR_NONCE,
    ATTR_XOR_MAPPED_ADDRESS,
];

pub fn is_comprehension_required(attr_type: u16) -> bool {
    attr_type & 0x8000 == 0
}

pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        ERROR_CODE_TRY_ALTERNATE => "Try Alternate",
        ERROR_CODE_BAD_REQUEST => "Bad Request",
        ERROR_CODE_UNAUTHORIZED => "Unauthorized",
        ERROR_CODE_UNKNOWN_ATTRIBUTE => "Unknown Attribute",
        ERROR_CODE_STALE_NONCE => "Stale Nonce",
        ERROR_CODE_SERVER_ERROR => "Server Error",
        _ => "",
    }
}
