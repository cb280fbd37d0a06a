extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use bilge::prelude::*;
use embedded_hal_nb::serial;

use crate::buffer::{BufferConfig, ChannelBuffer, ZeroLengthPolicy};
use crate::error::{BufferError, ErrorCode};
use crate::storage::Storage;

pub const DEFAULT_TX_CAPACITY: usize = 256;
pub const DEFAULT_RX_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub tx_capacity: usize,
    pub rx_capacity: usize,
    /// Applied to both directions.
    pub zero_length: ZeroLengthPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            tx_capacity: DEFAULT_TX_CAPACITY,
            rx_capacity: DEFAULT_RX_CAPACITY,
            zero_length: ZeroLengthPolicy::Accept,
        }
    }
}

/// Last-error codes of both directions packed into one byte.
///
/// Bits 0..3 hold the TX code, bits 3..6 the RX code, the top two bits
/// are reserved.
#[bitsize(8)]
#[derive(DebugBits, Clone, Copy, PartialEq, FromBits)]
pub struct StreamStatus {
    pub tx: ErrorCode,
    pub rx: ErrorCode,
    _reserved: u2,
}

impl StreamStatus {
    pub fn is_ok(&self) -> bool {
        self.tx().is_ok() && self.rx().is_ok()
    }
}

/// A serial endpoint: one buffer for outbound bytes and one for inbound.
///
/// Protocol code queues outbound data with [`write`](Stream::write) and
/// hands it to a UART with [`flush`](Stream::flush); [`receive`](Stream::receive)
/// pulls whatever the UART has into the RX side for [`read`](Stream::read).
#[derive(Debug)]
pub struct Stream<T: Storage = Vec<u8>, R: Storage = Vec<u8>> {
    tx: ChannelBuffer<T>,
    rx: ChannelBuffer<R>,
}

impl Stream {
    pub fn new(tx_capacity: usize, rx_capacity: usize) -> Self {
        Self::with_config(StreamConfig {
            tx_capacity,
            rx_capacity,
            ..StreamConfig::default()
        })
    }

    pub fn with_config(config: StreamConfig) -> Self {
        let buffer_config = BufferConfig {
            zero_length: config.zero_length,
        };
        Stream {
            tx: ChannelBuffer::with_config(vec![0; config.tx_capacity], buffer_config),
            rx: ChannelBuffer::with_config(vec![0; config.rx_capacity], buffer_config),
        }
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::with_config(StreamConfig::default())
    }
}

impl<'a> Stream<&'a mut [u8], &'a mut [u8]> {
    /// Endpoint over two caller-supplied regions, held exclusively for `'a`.
    pub fn borrowed(tx: &'a mut [u8], rx: &'a mut [u8]) -> Self {
        Stream {
            tx: ChannelBuffer::borrowed(tx),
            rx: ChannelBuffer::borrowed(rx),
        }
    }
}

impl<T: Storage, R: Storage> Stream<T, R> {
    pub fn from_buffers(tx: ChannelBuffer<T>, rx: ChannelBuffer<R>) -> Self {
        Stream { tx, rx }
    }

    pub fn tx(&self) -> &ChannelBuffer<T> {
        &self.tx
    }

    pub fn rx(&self) -> &ChannelBuffer<R> {
        &self.rx
    }

    pub fn tx_mut(&mut self) -> &mut ChannelBuffer<T> {
        &mut self.tx
    }

    pub fn rx_mut(&mut self) -> &mut ChannelBuffer<R> {
        &mut self.rx
    }

    pub fn into_buffers(self) -> (ChannelBuffer<T>, ChannelBuffer<R>) {
        (self.tx, self.rx)
    }

    /// Queue `data` for transmission. All of it or none of it is queued.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, BufferError> {
        self.tx.append(data)?;
        Ok(data.len())
    }

    /// Take up to `buf.len()` received bytes.
    ///
    /// Nothing to take is not a fault: an empty RX or an empty `buf`
    /// returns 0 and leaves the RX last-error slot alone, whatever the
    /// zero-length policy.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let count = buf.len().min(self.rx.available());
        if count == 0 {
            return 0;
        }
        // count fits both `buf` and the queue, so the pop cannot fail
        self.rx.pop_front(buf, count).map_or(0, |()| count)
    }

    /// Whether any received bytes are waiting.
    pub fn available(&self) -> bool {
        !self.rx.is_empty()
    }

    pub fn status(&self) -> StreamStatus {
        StreamStatus::new(self.tx.last_error(), self.rx.last_error())
    }

    /// Pull bytes from `device` into RX until it would block or RX is full.
    /// A byte is only read from the device once there is room for it.
    pub fn receive<P: serial::Read>(&mut self, device: &mut P) -> Result<usize, P::Error> {
        let mut moved = 0;
        while !self.rx.is_full() {
            match device.read() {
                Ok(byte) => {
                    if self.rx.append(&[byte]).is_err() {
                        break;
                    }
                    moved += 1;
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
        if moved > 0 {
            log::trace!("received {moved} bytes, {} queued", self.rx.len());
        }
        Ok(moved)
    }

    /// Push queued TX bytes into `device`, oldest first. Bytes leave the
    /// queue only once the device accepts them, so a `WouldBlock` can be
    /// retried without loss.
    pub fn flush<P: serial::Write>(&mut self, device: &mut P) -> nb::Result<(), P::Error> {
        while let Some(&byte) = self.tx.as_slice().first() {
            device.write(byte)?;
            // queue is non-empty
            let _ = self.tx.remove_one();
        }
        device.flush()
    }
}

impl<T: Storage, R: Storage> embedded_io::ErrorType for Stream<T, R> {
    type Error = BufferError;
}

/// Reads never block: `Ok(0)` means RX is empty right now, not end of
/// stream. Poll [`embedded_io::ReadReady::read_ready`] or
/// [`Stream::available`] before calling `read_exact`, which treats `Ok(0)`
/// as `UnexpectedEof`.
impl<T: Storage, R: Storage> embedded_io::Read for Stream<T, R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        embedded_io::Read::read(&mut self.rx, buf)
    }
}

impl<T: Storage, R: Storage> embedded_io::ReadReady for Stream<T, R> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.available())
    }
}

impl<T: Storage, R: Storage> embedded_io::Write for Stream<T, R> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        embedded_io::Write::write(&mut self.tx, buf)
    }

    /// Only the in-memory TX queue is flushed, which is always complete.
    /// Nothing is sent anywhere; use [`Stream::flush`] with a device to
    /// hand the queued bytes to a UART.
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
