#![cfg_attr(not(test), no_std)]

//! Transmit and receive buffers for embedded serial links.
//!
//! A [`ChannelBuffer`] is a fixed-capacity byte queue: overwrite it, append
//! to the tail, pop or discard from the head. Every failing call leaves the
//! buffer untouched and records an [`ErrorCode`] that stays readable until
//! the next successful call. A [`Stream`] pairs a TX and an RX buffer and
//! moves bytes to and from a UART through `embedded-hal-nb`.
//!
//! ```
//! use embed_serial_buffer::{ChannelBuffer, ErrorCode};
//!
//! let mut buf = ChannelBuffer::<[u8; 8]>::inline();
//! buf.append(b"AB").unwrap();
//! buf.append(b"CDEFG").unwrap();
//! assert!(buf.append(b"HI").is_err());
//! assert_eq!(buf.last_error(), ErrorCode::Overflow);
//!
//! let mut out = [0; 3];
//! buf.pop_front(&mut out, 3).unwrap();
//! assert_eq!(&out, b"ABC");
//! assert_eq!(buf.as_slice(), b"DEFG");
//! ```

mod buffer;
mod error;
mod storage;
mod stream;
pub mod text;

pub use buffer::{
    BorrowedBuffer, BufferConfig, ChannelBuffer, InlineBuffer, OwnedBuffer, ZeroLengthPolicy,
};
pub use error::{BufferError, ErrorCode};
pub use storage::{Resizable, Storage};
pub use stream::{DEFAULT_RX_CAPACITY, DEFAULT_TX_CAPACITY, Stream, StreamConfig, StreamStatus};
