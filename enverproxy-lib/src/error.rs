use thiserror::Error;

/// Errors that can occur in enverproxy.
///
/// `FrameTooShort` and `UnknownFrame` are intentionally *not* part of this
/// enum: per spec they are never fatal and never unwind a session, so the
/// codec reports them as typed decode outcomes (`Variant::Unknown`, zeroed
/// `InverterRecord`) rather than `Err` values. Only startup-fatal and
/// session-fatal conditions live here.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing required config key: {0}")]
    MissingKey(String),

    #[error("invalid value for config key {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ProxyError>;
