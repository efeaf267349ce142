#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unknown manifest format: {0} (expected sfv, simple or bsd)")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
