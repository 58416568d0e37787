use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // buf 不够一个 header
    #[error("buf len:{0} < header len")]
    TooShort(usize),

    #[error("bad magic cookie: {0:#010x}")]
    BadCookie(u32),

    // 最高两位不是 0
    #[error("bad message type: {0:#06x}")]
    BadMessageType(u16),

    // header 中的长度和数据不匹配, 或不是 4 的倍数
    #[error("msg len:{declared} != {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("malformed attribute: {0}")]
    MalformedAttribute(String),

    #[error("{0} trailing bytes after attributes")]
    TrailingBytes(usize),

    #[error("unknown comprehension-required attributes: {0:04x?}")]
    UnknownRequiredAttribute(Vec<u16>),

    #[error("missing attribute: {0:#06x}")]
    MissingAttribute(u16),

    #[error("fingerprint mismatch")]
    FingerprintMismatch,

    #[error("too many pending transactions: {0}")]
    TrackerExhausted(usize),

    // 对端返回的错误响应
    #[error("binding failed, {code} {reason}")]
    BindingFailed { code: u16, reason: String },
}

impl Error {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedAttribute(msg.into())
    }
}
