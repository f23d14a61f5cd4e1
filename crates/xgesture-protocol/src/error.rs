//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding wire records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Buffer is shorter than the record it should hold.
    #[error("incomplete message: expected {expected} bytes, got {received}")]
    IncompleteMessage { expected: usize, received: usize },

    /// First byte of a reply buffer is neither a reply nor an error.
    #[error("unexpected reply code {code}")]
    UnexpectedReply { code: u8 },

    /// The server answered with an error packet.
    #[error(
        "server error {code} (major opcode {major_opcode}, minor opcode {minor_opcode}, sequence {sequence})"
    )]
    ServerError {
        code: u8,
        major_opcode: u8,
        minor_opcode: u16,
        sequence: u16,
    },

    /// Request carries a minor opcode this extension does not define.
    #[error("unknown request minor opcode {minor}")]
    UnknownRequest { minor: u8 },

    /// Length field disagrees with the record's fixed size.
    #[error("length mismatch: header declares {declared} units, record needs {actual}")]
    LengthMismatch { declared: u16, actual: u16 },
}
