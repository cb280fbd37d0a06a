extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Backing region of a [`crate::ChannelBuffer`].
///
/// The whole region is the buffer's capacity. Implemented for an owned
/// heap allocation (`Vec<u8>`), a borrowed slice (`&mut [u8]`) and an
/// inline array (`[u8; N]`).
pub trait Storage {
    fn bytes(&self) -> &[u8];

    fn bytes_mut(&mut self) -> &mut [u8];

    fn capacity(&self) -> usize {
        self.bytes().len()
    }
}

/// Storage that can hand out a fresh region of a different size.
pub trait Resizable: Storage {
    /// Replace the region with a zeroed one of `capacity` bytes. Prior
    /// content is discarded.
    fn reallocate(&mut self, capacity: usize);
}

impl Storage for Vec<u8> {
    fn bytes(&self) -> &[u8] {
        self.as_slice()
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl Resizable for Vec<u8> {
    fn reallocate(&mut self, capacity: usize) {
        *self = vec![0; capacity];
    }
}

/// A borrowed region. The exclusive borrow keeps every other alias of the
/// region out for as long as the buffer lives.
impl Storage for &mut [u8] {
    fn bytes(&self) -> &[u8] {
        self
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

impl<const N: usize> Storage for [u8; N] {
    fn bytes(&self) -> &[u8] {
        self
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self
    }

    fn capacity(&self) -> usize {
        N
    }
}
