use std::fmt;

use crate::encoder::EccLevel;

/// Everything that can go wrong building or emitting a symbol.
#[derive(Debug)]
pub enum Error {
    /// The payload had zero bytes; there is nothing to encode.
    EmptyPayload,
    /// No version up to 40 has enough capacity for this payload at this level.
    PayloadTooLarge { level: EccLevel, len: usize },
    /// Reading the input or writing the rendered image failed.
    Io(std::io::Error),
    /// An internal bug: a placement or interleaving step violated an invariant
    /// that should be impossible to reach from valid input.
    InvariantViolated(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyPayload => write!(f, "payload is empty"),
            Error::PayloadTooLarge { level, len } => write!(
                f,
                "payload of {len} bytes is too large for error correction level {level:?} (max version is 40)"
            ),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvariantViolated(msg) => write!(f, "internal invariant violated: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
