//! Error types for demo decoding.

use std::fmt;
use std::io;

/// Errors that can occur while opening or decoding a demo file.
///
/// Every variant is terminal for the current decode: a misread field
/// desynchronizes every offset after it, so nothing is retried or skipped
/// and there is no partial-success mode.
#[derive(Debug)]
pub enum DemoError {
    /// An I/O error occurred while opening, sizing, or reading the file.
    Io(io::Error),
    /// The file is shorter than the structural minimum
    /// (header plus one directory entry).
    TooSmall {
        /// Actual file size in bytes.
        size: u64,
        /// Minimum size required in bytes.
        required: u64,
    },
    /// The file does not start with the `HLDEMO` signature.
    BadSignature {
        /// The six bytes found where the signature was expected.
        found: [u8; 6],
    },
    /// The directory entry count is outside `[1, 1024]`.
    InvalidDirectoryCount {
        /// The count read from the file.
        count: u32,
    },
    /// A read requested more bits than remain in the buffer, or the
    /// cursor is already exhausted.
    BufferExhausted {
        /// Number of bits the read asked for.
        requested_bits: u64,
        /// Number of bits that were actually available.
        remaining_bits: u64,
    },
    /// A single primitive read requested more than 64 bits.
    InvalidWidth {
        /// Number of bits the read asked for.
        requested: u32,
    },
    /// A read or seek was attempted while no byte blob is acquired.
    NotAcquired,
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::TooSmall { size, required } => {
                write!(f, "file too small: {size} bytes, need at least {required}")
            }
            Self::BadSignature { found } => {
                write!(
                    f,
                    "bad signature: expected b\"HLDEMO\", found {:?}",
                    String::from_utf8_lossy(found)
                )
            }
            Self::InvalidDirectoryCount { count } => {
                write!(f, "invalid directory entry count {count} (expected 1..=1024)")
            }
            Self::BufferExhausted {
                requested_bits,
                remaining_bits,
            } => {
                write!(
                    f,
                    "buffer exhausted: {requested_bits} bits requested, {remaining_bits} remaining"
                )
            }
            Self::InvalidWidth { requested } => {
                write!(f, "cannot read more than 64 bits at a time ({requested} requested)")
            }
            Self::NotAcquired => write!(f, "no file data acquired"),
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DemoError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
