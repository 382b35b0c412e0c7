//! Error taxonomy for the A2S query protocol
//!
//! Decoding failures (`InvalidHeader`, `Truncated`, `UnknownType`,
//! `UnexpectedType`) describe a single bad datagram and are never fatal to a
//! serve loop. `Transport` wraps socket failures and is the only variant that
//! terminates the responder.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("invalid packet header: {0:#010x}")]
    InvalidHeader(u32),

    #[error("packet truncated while reading {field}")]
    Truncated { field: &'static str },

    #[error("unknown query type byte: {0:#04x}")]
    UnknownType(u8),

    #[error("unexpected packet type: expected '{expected}', found '{found}'")]
    UnexpectedType { expected: char, found: char },

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("query timed out")]
    Timeout,

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProtocolError {
    /// True for errors that describe the datagram rather than the socket.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidHeader(_)
                | ProtocolError::Truncated { .. }
                | ProtocolError::UnknownType(_)
                | ProtocolError::UnexpectedType { .. }
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
