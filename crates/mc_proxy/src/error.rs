//! The proxy's own error type, layered over `anyhow` the way the rest of
//! this pack does: a small enum for the cases callers branch on, with an
//! `Internal` catch-all for everything else.

use mc_protocol::chat::ChatComponent;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("connection rejected: {}", .reason.plain_text())]
    Connect { reason: ChatComponent },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProxyError {
    pub fn connect(reason: ChatComponent) -> Self {
        Self::Connect { reason }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
