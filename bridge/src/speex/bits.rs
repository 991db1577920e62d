//! Owned Speex bit buffer.

use super::bridge::{BitsHandle, Bridge};
use super::error::SpeexError;
use super::ffi::SpeexLib;
use crate::gateway::{SliceSink, SliceSource};

/// A bit buffer allocated by the bridge and destroyed on drop.
pub struct Bits<L: SpeexLib> {
    bridge: Bridge<L>,
    handle: BitsHandle,
}

impl<L: SpeexLib> Drop for Bits<L> {
    fn drop(&mut self) {
        self.bridge.bits_destroy(self.handle);
    }
}

impl<L: SpeexLib> Bits<L> {
    pub fn new(bridge: Bridge<L>) -> Result<Self, SpeexError> {
        let handle = bridge.bits_init();
        if handle.is_null() {
            return Err(SpeexError::InitFailed("bits_init"));
        }
        Ok(Self { bridge, handle })
    }

    pub fn handle(&self) -> BitsHandle {
        self.handle
    }

    pub fn reset(&mut self) {
        self.bridge.bits_reset(self.handle);
    }

    /// Replaces the buffer contents with `packet`.
    pub fn read_from(&mut self, packet: &[u8]) -> Result<(), SpeexError> {
        self.bridge.bits_read_from(
            self.handle,
            &SliceSource::new(packet),
            0,
            packet.len() as i32,
        )
    }

    /// Writes as much of the buffer as fits in `out`. Returns the bytes
    /// written.
    pub fn write_to(&self, out: &mut [u8]) -> Result<usize, SpeexError> {
        let len = out.len() as i32;
        self.bridge
            .bits_write(self.handle, &SliceSink::new(out), 0, len)
    }

    /// Writes the whole buffer out into a new vector.
    pub fn to_vec(&self) -> Result<Vec<u8>, SpeexError> {
        let mut out = vec![0u8; self.nbytes()];
        let n = self.write_to(&mut out)?;
        out.truncate(n);
        Ok(out)
    }

    pub fn nbytes(&self) -> usize {
        self.bridge.bits_nbytes(self.handle)
    }

    /// Bits left to read.
    pub fn remaining(&self) -> i32 {
        self.bridge.bits_remaining(self.handle)
    }
}
