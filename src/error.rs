use core::fmt;

use bilge::prelude::*;

/// Outcome code kept in a buffer's last-error slot.
///
/// Fits in three bits so two of them can be packed into a single
/// status byte (see [`crate::StreamStatus`]).
#[bitsize(3)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBits)]
pub enum ErrorCode {
    Ok = 0b000,
    NullInput = 0b001,
    CapacityExceeded = 0b010,
    Overflow = 0b011,
    InsufficientData = 0b100,
    ZeroLength = 0b101,
    /// Unassigned value read back from a status byte.
    #[fallback]
    Reserved = 0b110,
}

impl ErrorCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, ErrorCode::Ok)
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Ok
    }
}

/// Error type for buffer operations. Every variant leaves the buffer
/// exactly as it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// A source or destination did not hold the requested number of bytes.
    NullInput {
        requested: usize,
        found: usize,
    },
    /// Overwrite longer than the whole buffer.
    CapacityExceeded {
        requested: usize,
        capacity: usize,
    },
    /// Append longer than the free space at the tail.
    Overflow {
        requested: usize,
        remaining: usize,
    },
    /// Remove or pop of more bytes than are queued.
    InsufficientData {
        requested: usize,
        available: usize,
    },
    /// Zero-byte remove or pop on a buffer configured to reject them.
    ZeroLength,
}

impl BufferError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BufferError::NullInput { .. } => ErrorCode::NullInput,
            BufferError::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
            BufferError::Overflow { .. } => ErrorCode::Overflow,
            BufferError::InsufficientData { .. } => ErrorCode::InsufficientData,
            BufferError::ZeroLength => ErrorCode::ZeroLength,
        }
    }
}

impl From<BufferError> for ErrorCode {
    fn from(value: BufferError) -> Self {
        value.code()
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::NullInput { requested, found } => {
                write!(f, "input holds {found} bytes, {requested} requested")
            }
            BufferError::CapacityExceeded {
                requested,
                capacity,
            } => write!(f, "write of {requested} bytes exceeds capacity {capacity}"),
            BufferError::Overflow {
                requested,
                remaining,
            } => write!(
                f,
                "append of {requested} bytes overflows, {remaining} bytes free"
            ),
            BufferError::InsufficientData {
                requested,
                available,
            } => write!(
                f,
                "removal of {requested} bytes with only {available} queued"
            ),
            BufferError::ZeroLength => f.write_str("zero-length removal rejected"),
        }
    }
}

impl core::error::Error for BufferError {}

impl embedded_io::Error for BufferError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            BufferError::Overflow { .. } | BufferError::CapacityExceeded { .. } => {
                embedded_io::ErrorKind::OutOfMemory
            }
            BufferError::NullInput { .. } | BufferError::ZeroLength => {
                embedded_io::ErrorKind::InvalidInput
            }
            BufferError::InsufficientData { .. } => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_hal_nb::serial::Error for BufferError {
    fn kind(&self) -> embedded_hal_nb::serial::ErrorKind {
        match self {
            BufferError::Overflow { .. } => embedded_hal_nb::serial::ErrorKind::Overrun,
            _ => embedded_hal_nb::serial::ErrorKind::Other,
        }
    }
}
