use std::io;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("unknown hash algorithm: {0}")]
    UnknownKind(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, HashError>;
