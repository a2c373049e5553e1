//! Core results and error types

use crate::instruction::InsnId;
use thiserror::Error;

/// Core error type encompassing all core module errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read file at the specified path.
    #[error("could not read file '{path}': {source}")]
    FileRead {
        /// The path to the file that could not be read.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A type or method descriptor could not be parsed.
    #[error("invalid descriptor '{descriptor}': {msg}")]
    InvalidDescriptor {
        /// The descriptor text as given.
        descriptor: String,
        /// What was wrong with it.
        msg: String,
    },

    /// Failed to parse a method listing at the specified line.
    #[error("listing parse error at line {line}: {msg} ⇒ `{raw}`")]
    ParseError {
        /// The line number where parsing failed.
        line: usize,
        /// Description of the parsing error.
        msg: String,
        /// The raw content that failed to parse.
        raw: String,
    },

    /// The payload handed to an instruction does not fit its opcode.
    #[error("payload does not fit opcode {0}")]
    PayloadMismatch(String),

    /// The referenced record is not part of this instruction sequence.
    #[error("record {0} is not a member of this instruction sequence")]
    RecordNotMember(InsnId),

    /// The mnemonic is not part of the supported opcode set.
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),
}

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;
