extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use embedded_hal_nb::serial;

use crate::error::{BufferError, ErrorCode};
use crate::storage::{Resizable, Storage};

/// How a buffer treats a remove or pop of zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroLengthPolicy {
    /// Zero-byte removals succeed and change nothing.
    #[default]
    Accept,
    /// Zero-byte removals fail with [`BufferError::ZeroLength`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferConfig {
    pub zero_length: ZeroLengthPolicy,
}

/// Capacity-bounded byte queue.
///
/// Valid bytes always sit at `storage[0..len)`. Removing from the head
/// shifts the remainder back down to offset 0.
#[derive(Debug)]
pub struct ChannelBuffer<S: Storage> {
    storage: S,
    filled: usize,
    last_error: ErrorCode,
    config: BufferConfig,
}

pub type OwnedBuffer = ChannelBuffer<Vec<u8>>;
pub type BorrowedBuffer<'a> = ChannelBuffer<&'a mut [u8]>;
pub type InlineBuffer<const N: usize> = ChannelBuffer<[u8; N]>;

impl ChannelBuffer<Vec<u8>> {
    /// Heap-allocated, zero-filled buffer of `capacity` bytes.
    pub fn owned(capacity: usize) -> Self {
        Self::from_storage(vec![0; capacity])
    }
}

impl<'a> ChannelBuffer<&'a mut [u8]> {
    /// Buffer over a caller-supplied region. The region's prior content is
    /// left as is but treated as empty.
    pub fn borrowed(region: &'a mut [u8]) -> Self {
        Self::from_storage(region)
    }
}

impl<const N: usize> ChannelBuffer<[u8; N]> {
    pub fn inline() -> Self {
        Self::from_storage([0; N])
    }
}

impl<const N: usize> Default for ChannelBuffer<[u8; N]> {
    fn default() -> Self {
        Self::inline()
    }
}

impl<S: Storage> ChannelBuffer<S> {
    pub fn from_storage(storage: S) -> Self {
        Self::with_config(storage, BufferConfig::default())
    }

    pub fn with_config(storage: S, config: BufferConfig) -> Self {
        ChannelBuffer {
            storage,
            filled: 0,
            last_error: ErrorCode::Ok,
            config,
        }
    }

    pub fn config(&self) -> BufferConfig {
        self.config
    }

    pub fn set_zero_length_policy(&mut self, policy: ZeroLengthPolicy) {
        self.config.zero_length = policy;
    }

    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Number of valid bytes queued.
    pub fn len(&self) -> usize {
        self.filled
    }

    /// Bytes ready to be read. Same as [`len`](Self::len); this is the
    /// figure a consumer checks before popping.
    pub fn available(&self) -> usize {
        self.filled
    }

    /// Free space at the tail.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.capacity()
    }

    /// Read-only view of the valid bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage.bytes()[..self.filled]
    }

    /// Outcome of the most recent mutating call. Not reset by reading it.
    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    /// Replace the contents with `data`.
    pub fn write(&mut self, data: &[u8]) -> Result<(), BufferError> {
        let capacity = self.capacity();
        if data.len() > capacity {
            return self.fail(BufferError::CapacityExceeded {
                requested: data.len(),
                capacity,
            });
        }
        self.storage.bytes_mut()[..data.len()].copy_from_slice(data);
        self.filled = data.len();
        self.succeed("write", data.len())
    }

    /// Push `data` onto the tail. Either all of it fits or nothing is copied.
    pub fn append(&mut self, data: &[u8]) -> Result<(), BufferError> {
        let remaining = self.remaining();
        if data.len() > remaining {
            return self.fail(BufferError::Overflow {
                requested: data.len(),
                remaining,
            });
        }
        let start = self.filled;
        self.storage.bytes_mut()[start..start + data.len()].copy_from_slice(data);
        self.filled += data.len();
        self.succeed("append", data.len())
    }

    /// Push the first `length` bytes of `data`.
    pub fn append_exact(&mut self, data: &[u8], length: usize) -> Result<(), BufferError> {
        match data.get(..length) {
            Some(head) => self.append(head),
            None => self.fail(BufferError::NullInput {
                requested: length,
                found: data.len(),
            }),
        }
    }

    /// Push the bytes of `text`. No terminator is added.
    pub fn append_str(&mut self, text: &str) -> Result<(), BufferError> {
        self.append(text.as_bytes())
    }

    /// Discard `count` bytes from the head.
    pub fn remove_front(&mut self, count: usize) -> Result<(), BufferError> {
        self.check_removal(count)?;
        self.compact(count);
        self.succeed("remove", count)
    }

    /// Discard a single byte from the head.
    pub fn remove_one(&mut self) -> Result<(), BufferError> {
        self.remove_front(1)
    }

    /// Copy `count` head bytes into `out`, then discard them.
    pub fn pop_front(&mut self, out: &mut [u8], count: usize) -> Result<(), BufferError> {
        if out.len() < count {
            return self.fail(BufferError::NullInput {
                requested: count,
                found: out.len(),
            });
        }
        self.check_removal(count)?;
        out[..count].copy_from_slice(&self.storage.bytes()[..count]);
        self.compact(count);
        self.succeed("pop", count)
    }

    /// Drain everything into `out`, returning the number of bytes copied.
    pub fn pop_all(&mut self, out: &mut [u8]) -> Result<usize, BufferError> {
        let count = self.filled;
        self.pop_front(out, count)?;
        Ok(count)
    }

    /// Empty the buffer and zero its whole region.
    pub fn clear(&mut self) {
        self.storage.bytes_mut().fill(0);
        self.filled = 0;
        self.last_error = ErrorCode::Ok;
    }

    /// Swap in a new backing region, returning the old one. Queued bytes
    /// are dropped.
    pub fn rebind(&mut self, storage: S) -> S {
        let old = core::mem::replace(&mut self.storage, storage);
        log::trace!(
            "rebind: capacity {} -> {}, {} queued bytes discarded",
            old.capacity(),
            self.capacity(),
            self.filled
        );
        self.filled = 0;
        self.last_error = ErrorCode::Ok;
        old
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn check_removal(&mut self, count: usize) -> Result<(), BufferError> {
        if count == 0 && self.config.zero_length == ZeroLengthPolicy::Reject {
            return self.fail(BufferError::ZeroLength);
        }
        if count > self.filled {
            return self.fail(BufferError::InsufficientData {
                requested: count,
                available: self.filled,
            });
        }
        Ok(())
    }

    // Caller has checked count <= filled.
    fn compact(&mut self, count: usize) {
        let filled = self.filled;
        self.storage.bytes_mut().copy_within(count..filled, 0);
        self.filled = filled - count;
    }

    fn succeed(&mut self, op: &str, bytes: usize) -> Result<(), BufferError> {
        log::trace!("{op}: {bytes} bytes, {} queued", self.filled);
        self.last_error = ErrorCode::Ok;
        Ok(())
    }

    fn fail<T>(&mut self, error: BufferError) -> Result<T, BufferError> {
        log::debug!("buffer operation rejected: {error}");
        self.last_error = error.code();
        Err(error)
    }
}

impl<S: Resizable> ChannelBuffer<S> {
    /// Reallocate to `capacity` bytes. Queued bytes are dropped.
    pub fn resize(&mut self, capacity: usize) {
        log::trace!(
            "resize: capacity {} -> {capacity}, {} queued bytes discarded",
            self.capacity(),
            self.filled
        );
        self.storage.reallocate(capacity);
        self.filled = 0;
        self.last_error = ErrorCode::Ok;
    }
}

impl<S: Storage> embedded_io::ErrorType for ChannelBuffer<S> {
    type Error = BufferError;
}

/// Non-blocking: `Ok(0)` for a non-empty `buf` means the queue is empty
/// right now, not end of stream, so `read_exact` reports `UnexpectedEof`
/// as soon as it runs dry. Check [`embedded_io::ReadReady`] first.
impl<S: Storage> embedded_io::Read for ChannelBuffer<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let count = buf.len().min(self.filled);
        if count == 0 {
            return Ok(0);
        }
        self.pop_front(buf, count)?;
        Ok(count)
    }
}

impl<S: Storage> embedded_io::ReadReady for ChannelBuffer<S> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_empty())
    }
}

impl<S: Storage> embedded_io::Write for ChannelBuffer<S> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        let count = buf.len().min(self.remaining());
        if count == 0 {
            return self.fail(BufferError::Overflow {
                requested: buf.len(),
                remaining: 0,
            });
        }
        self.append(&buf[..count])?;
        Ok(count)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<S: Storage> embedded_io::WriteReady for ChannelBuffer<S> {
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_full())
    }
}

impl<S: Storage> serial::ErrorType for ChannelBuffer<S> {
    type Error = BufferError;
}

impl<S: Storage> serial::Read for ChannelBuffer<S> {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        let mut byte = [0; 1];
        if self.is_empty() {
            return Err(nb::Error::WouldBlock);
        }
        self.pop_front(&mut byte, 1)?;
        Ok(byte[0])
    }
}

impl<S: Storage> serial::Write for ChannelBuffer<S> {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.is_full() {
            return Err(nb::Error::WouldBlock);
        }
        self.append(&[word])?;
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(data: &[u8], capacity: usize) -> OwnedBuffer {
        let mut b = ChannelBuffer::owned(capacity);
        b.write(data).unwrap();
        b
    }

    #[test]
    fn new_buffer_is_empty() {
        let b = ChannelBuffer::owned(8);
        assert!(b.is_empty());
        assert!(!b.is_full());
        assert_eq!(b.capacity(), 8);
        assert_eq!(b.available(), 0);
        assert_eq!(b.remaining(), 8);
        assert_eq!(b.last_error(), ErrorCode::Ok);
        assert_eq!(b.as_slice(), &[] as &[u8]);
    }

    #[test]
    fn hmi_scenario() {
        let mut b = InlineBuffer::<8>::inline();

        b.append(b"AB").unwrap();
        assert_eq!(b.len(), 2);

        b.append(b"CDEFG").unwrap();
        assert_eq!(b.len(), 7);
        assert_eq!(b.as_slice(), b"ABCDEFG");

        let err = b.append(b"HI").unwrap_err();
        assert_eq!(
            err,
            BufferError::Overflow {
                requested: 2,
                remaining: 1
            }
        );
        assert_eq!(b.last_error(), ErrorCode::Overflow);
        assert_eq!(b.as_slice(), b"ABCDEFG");

        let mut out = [0; 3];
        b.pop_front(&mut out, 3).unwrap();
        assert_eq!(&out, b"ABC");
        assert_eq!(b.as_slice(), b"DEFG");
        assert_eq!(b.len(), 4);
        assert_eq!(b.last_error(), ErrorCode::Ok);
    }

    #[test]
    fn write_overwrites_from_start() {
        let mut b = filled(b"hello", 8);
        b.write(b"hi").unwrap();
        assert_eq!(b.as_slice(), b"hi");
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn write_exactly_capacity() {
        let mut b = ChannelBuffer::owned(4);
        b.write(b"abcd").unwrap();
        assert!(b.is_full());
        assert_eq!(b.remaining(), 0);
    }

    #[test]
    fn write_past_capacity_is_rejected() {
        let mut b = filled(b"keep", 4);
        let err = b.write(b"abcde").unwrap_err();
        assert_eq!(
            err,
            BufferError::CapacityExceeded {
                requested: 5,
                capacity: 4
            }
        );
        assert_eq!(b.last_error(), ErrorCode::CapacityExceeded);
        assert_eq!(b.as_slice(), b"keep");
    }

    #[test]
    fn empty_append_is_noop() {
        let mut b = filled(b"xy", 2);
        b.append(&[]).unwrap();
        assert_eq!(b.as_slice(), b"xy");
    }

    #[test]
    fn append_exact_takes_prefix() {
        let mut b = ChannelBuffer::owned(8);
        b.append_exact(b"abcdef", 3).unwrap();
        assert_eq!(b.as_slice(), b"abc");
    }

    #[test]
    fn append_exact_with_short_source() {
        let mut b = filled(b"ab", 8);
        let err = b.append_exact(b"xyz", 5).unwrap_err();
        assert_eq!(
            err,
            BufferError::NullInput {
                requested: 5,
                found: 3
            }
        );
        assert_eq!(b.last_error(), ErrorCode::NullInput);
        assert_eq!(b.as_slice(), b"ab");
    }

    #[test]
    fn append_str_adds_no_terminator() {
        let mut b = ChannelBuffer::owned(8);
        b.append_str("OK").unwrap();
        assert_eq!(b.as_slice(), b"OK");
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn remove_front_compacts() {
        let mut b = filled(b"abcdef", 8);
        b.remove_front(2).unwrap();
        assert_eq!(b.as_slice(), b"cdef");
        b.remove_one().unwrap();
        assert_eq!(b.as_slice(), b"def");
    }

    #[test]
    fn remove_more_than_queued() {
        let mut b = filled(b"abc", 8);
        let err = b.remove_front(4).unwrap_err();
        assert_eq!(
            err,
            BufferError::InsufficientData {
                requested: 4,
                available: 3
            }
        );
        assert_eq!(b.as_slice(), b"abc");
        assert_eq!(b.last_error(), ErrorCode::InsufficientData);
    }

    #[test]
    fn remove_one_on_empty() {
        let mut b = ChannelBuffer::owned(2);
        assert!(b.remove_one().is_err());
        assert_eq!(b.last_error(), ErrorCode::InsufficientData);
    }

    #[test]
    fn zero_length_accepted_by_default() {
        let mut b = filled(b"abc", 8);
        b.remove_front(0).unwrap();
        let mut out = [0; 0];
        b.pop_front(&mut out, 0).unwrap();
        assert_eq!(b.as_slice(), b"abc");

        let mut empty = ChannelBuffer::owned(4);
        empty.remove_front(0).unwrap();
    }

    #[test]
    fn zero_length_rejected_when_configured() {
        let mut b = ChannelBuffer::with_config(
            vec![0u8; 4],
            BufferConfig {
                zero_length: ZeroLengthPolicy::Reject,
            },
        );
        assert_eq!(b.remove_front(0), Err(BufferError::ZeroLength));
        assert_eq!(b.last_error(), ErrorCode::ZeroLength);

        let mut out = [0; 4];
        assert_eq!(b.pop_front(&mut out, 0), Err(BufferError::ZeroLength));

        // appends are unaffected
        b.append(&[]).unwrap();
        assert_eq!(b.last_error(), ErrorCode::Ok);
    }

    #[test]
    fn pop_into_short_destination() {
        let mut b = filled(b"abc", 8);
        let mut out = [0; 2];
        let err = b.pop_front(&mut out, 3).unwrap_err();
        assert_eq!(
            err,
            BufferError::NullInput {
                requested: 3,
                found: 2
            }
        );
        assert_eq!(b.as_slice(), b"abc");
    }

    #[test]
    fn short_destination_checked_before_data() {
        let mut b = ChannelBuffer::owned(8);
        let mut out = [0; 1];
        let err = b.pop_front(&mut out, 5).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NullInput);
    }

    #[test]
    fn pop_all_drains() {
        let mut b = filled(b"abcd", 8);
        let mut out = [0; 8];
        let n = b.pop_all(&mut out).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&out[..n], b"abcd");
        assert!(b.is_empty());
    }

    #[test]
    fn last_error_sticks_until_success() {
        let mut b = ChannelBuffer::owned(2);
        let _ = b.append(b"abc");
        assert_eq!(b.last_error(), ErrorCode::Overflow);
        // queries leave it alone
        let _ = b.available();
        let _ = b.as_slice();
        assert_eq!(b.last_error(), ErrorCode::Overflow);
        b.append(b"a").unwrap();
        assert_eq!(b.last_error(), ErrorCode::Ok);
    }

    #[test]
    fn clear_zeroes_region() {
        let mut b = filled(b"abcd", 4);
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), 4);
        assert_eq!(b.into_storage(), vec![0; 4]);
    }

    #[test]
    fn resize_discards_content() {
        let mut b = filled(b"abcd", 4);
        b.resize(16);
        assert_eq!(b.capacity(), 16);
        assert!(b.is_empty());
        b.write(&[7; 16]).unwrap();
        b.resize(2);
        assert_eq!(b.capacity(), 2);
        assert!(b.is_empty());
    }

    #[test]
    fn borrowed_region() {
        let mut region = [0xFFu8; 6];
        {
            let mut b = ChannelBuffer::borrowed(&mut region);
            assert!(b.is_empty());
            assert_eq!(b.capacity(), 6);
            b.append(b"serial").unwrap();
            assert!(b.is_full());
            b.remove_front(3).unwrap();
            assert_eq!(b.as_slice(), b"ial");
        }
        assert_eq!(&region[..3], b"ial");
    }

    #[test]
    fn rebind_returns_previous_region() {
        let mut first = [0u8; 4];
        let mut second = [0u8; 8];
        let mut b = ChannelBuffer::borrowed(&mut first);
        b.append(b"abc").unwrap();
        let old = b.rebind(&mut second);
        assert_eq!(&old[..3], b"abc");
        assert_eq!(b.capacity(), 8);
        assert!(b.is_empty());
    }

    #[test]
    fn zero_capacity_buffer() {
        let mut b = InlineBuffer::<0>::default();
        assert!(b.is_full());
        b.write(&[]).unwrap();
        b.append(&[]).unwrap();
        assert!(b.append(b"x").is_err());
    }

    #[test]
    fn io_read_write() {
        use embedded_io::{Read, ReadReady, Write, WriteReady};

        let mut b = ChannelBuffer::owned(4);
        assert_eq!(Write::write(&mut b, b"abcdef").unwrap(), 4);
        assert!(!b.write_ready().unwrap());
        assert_eq!(
            Write::write(&mut b, b"g").unwrap_err(),
            BufferError::Overflow {
                requested: 1,
                remaining: 0
            }
        );
        assert_eq!(Write::write(&mut b, b"").unwrap(), 0);

        let mut out = [0; 3];
        assert_eq!(Read::read(&mut b, &mut out).unwrap(), 3);
        assert_eq!(&out, b"abc");
        assert!(b.read_ready().unwrap());
        assert_eq!(Read::read(&mut b, &mut out).unwrap(), 1);
        assert_eq!(out[0], b'd');
        assert_eq!(Read::read(&mut b, &mut out).unwrap(), 0);
    }

    #[test]
    fn io_read_exact_runs_dry() {
        let mut b = ChannelBuffer::owned(4);
        b.append(b"a").unwrap();
        let mut out = [0; 2];
        assert!(matches!(
            embedded_io::Read::read_exact(&mut b, &mut out),
            Err(embedded_io::ReadExactError::UnexpectedEof)
        ));
        assert_eq!(b.last_error(), ErrorCode::Ok);
    }

    #[test]
    fn serial_word_read_write() {
        let mut b = InlineBuffer::<2>::inline();
        serial::Write::write(&mut b, 1).unwrap();
        serial::Write::write(&mut b, 2).unwrap();
        assert!(matches!(
            serial::Write::write(&mut b, 3),
            Err(nb::Error::WouldBlock)
        ));
        assert_eq!(serial::Read::read(&mut b).unwrap(), 1);
        assert_eq!(serial::Read::read(&mut b).unwrap(), 2);
        assert!(matches!(serial::Read::read(&mut b), Err(nb::Error::WouldBlock)));
    }
}
