//! G.722 call adapters.

use std::ptr;

use super::ffi::{G722_RATE_64000, G722DecodeState, G722EncodeState, G722Lib};
use crate::gateway::{Pinnable, PinnedPair, Writable};
use crate::handle::Handle;

/// Handle to a G.722 encoder.
pub type EncoderHandle = Handle<G722EncodeState>;

/// Handle to a G.722 decoder.
pub type DecoderHandle = Handle<G722DecodeState>;

/// G.722 call surface.
///
/// A failed pin turns a `*_process` call into a silent no-op; the codec is
/// not invoked.
#[derive(Debug, Clone, Default)]
pub struct Bridge<L> {
    lib: L,
}

impl<L: G722Lib> Bridge<L> {
    pub fn new(lib: L) -> Self {
        Self { lib }
    }

    /// Returns the library this bridge forwards to.
    pub fn lib(&self) -> &L {
        &self.lib
    }

    /// Opens a 64 kbit/s encoder. Returns [`Handle::NULL`] on failure.
    pub fn encoder_open(&self) -> EncoderHandle {
        Handle::from_ptr(unsafe { self.lib.encode_init(ptr::null_mut(), G722_RATE_64000, 0) })
    }

    /// Encodes `2 * out_length` samples from `input[in_offset..]` into
    /// `out_length` bytes at `output[out_offset..]`.
    pub fn encoder_process<I, O>(
        &self,
        encoder: EncoderHandle,
        input: &I,
        in_offset: i32,
        output: &O,
        out_offset: i32,
        out_length: i32,
    ) where
        I: Pinnable<Elem = i16> + ?Sized,
        O: Writable<Elem = u8> + ?Sized,
    {
        let Ok(pins) = PinnedPair::acquire(output, input) else {
            return;
        };
        unsafe {
            self.lib.encode(
                encoder.as_ptr(),
                pins.dst.at_mut(out_offset),
                pins.src.at(in_offset),
                2 * out_length,
            );
        }
    }

    /// Releases and frees an encoder.
    pub fn encoder_close(&self, encoder: EncoderHandle) {
        unsafe {
            self.lib.encode_release(encoder.as_ptr());
            self.lib.encode_free(encoder.as_ptr());
        }
    }

    /// Opens a 64 kbit/s decoder. Returns [`Handle::NULL`] on failure.
    pub fn decoder_open(&self) -> DecoderHandle {
        Handle::from_ptr(unsafe { self.lib.decode_init(ptr::null_mut(), G722_RATE_64000, 0) })
    }

    /// Decodes `out_length / 2` bytes from `input[in_offset..]` into
    /// `out_length` samples at `output[out_offset..]`.
    pub fn decoder_process<I, O>(
        &self,
        decoder: DecoderHandle,
        input: &I,
        in_offset: i32,
        output: &O,
        out_offset: i32,
        out_length: i32,
    ) where
        I: Pinnable<Elem = u8> + ?Sized,
        O: Writable<Elem = i16> + ?Sized,
    {
        let Ok(pins) = PinnedPair::acquire(output, input) else {
            return;
        };
        unsafe {
            self.lib.decode(
                decoder.as_ptr(),
                pins.dst.at_mut(out_offset),
                pins.src.at(in_offset),
                out_length / 2,
            );
        }
    }

    /// Releases and frees a decoder.
    pub fn decoder_close(&self, decoder: DecoderHandle) {
        unsafe {
            self.lib.decode_release(decoder.as_ptr());
            self.lib.decode_free(decoder.as_ptr());
        }
    }
}

#[cfg(feature = "g722")]
impl Bridge<super::ffi::SpanDsp> {
    /// Returns a bridge to the linked spandsp library.
    pub fn native() -> Self {
        Self::new(super::ffi::SpanDsp)
    }
}
