use std::io;

/// Errors that can occur when encoding or decoding binary NBT.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    Message(String),
}

impl Error {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Error::Message(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
