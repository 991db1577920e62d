//! Speex call adapters.

use std::alloc::{self, Layout};
use std::ptr;

use super::error::SpeexError;
use super::ffi::{
    SpeexBits, SpeexDecoderState, SpeexEncoderState, SpeexLib, SpeexMode, SpeexResamplerState,
};
use crate::gateway::{Pinnable, Pinned, PinnedPair, Writable};
use crate::handle::Handle;

/// Handle to a bridge-allocated bit buffer.
pub type BitsHandle = Handle<SpeexBits>;

/// Handle to a library-owned mode descriptor. Never destroyed.
pub type ModeHandle = Handle<SpeexMode>;

/// Handle to a Speex encoder.
pub type EncoderHandle = Handle<SpeexEncoderState>;

/// Handle to a Speex decoder.
pub type DecoderHandle = Handle<SpeexDecoderState>;

/// Handle to a speexdsp resampler.
pub type ResamplerHandle = Handle<SpeexResamplerState>;

/// Speex call surface.
///
/// Buffers that cannot be pinned yield [`SpeexError::BufferUnavailable`]
/// without calling the library.
#[derive(Debug, Clone, Default)]
pub struct Bridge<L> {
    lib: L,
}

impl<L: SpeexLib> Bridge<L> {
    pub fn new(lib: L) -> Self {
        Self { lib }
    }

    /// Returns the library this bridge forwards to.
    pub fn lib(&self) -> &L {
        &self.lib
    }

    /// Allocates and initializes a bit buffer. Returns [`Handle::NULL`] if
    /// the allocation fails.
    pub fn bits_init(&self) -> BitsHandle {
        let bits = unsafe { alloc::alloc(Layout::new::<SpeexBits>()) }.cast::<SpeexBits>();
        if bits.is_null() {
            return Handle::NULL;
        }
        unsafe { self.lib.bits_init(bits) };
        Handle::from_ptr(bits)
    }

    /// Tears a bit buffer down, then frees it. A null handle is ignored.
    pub fn bits_destroy(&self, bits: BitsHandle) {
        if bits.is_null() {
            return;
        }
        let ptr = bits.as_ptr();
        unsafe {
            self.lib.bits_destroy(ptr);
            alloc::dealloc(ptr.cast(), Layout::new::<SpeexBits>());
        }
    }

    /// Loads `len` bytes from `bytes[offset..]` into the bit buffer.
    pub fn bits_read_from<B>(
        &self,
        bits: BitsHandle,
        bytes: &B,
        offset: i32,
        len: i32,
    ) -> Result<(), SpeexError>
    where
        B: Pinnable<Elem = u8> + ?Sized,
    {
        let src = Pinned::source(bytes).ok_or(SpeexError::BufferUnavailable)?;
        unsafe {
            self.lib
                .bits_read_from(bits.as_ptr(), src.at(offset).cast(), len)
        };
        Ok(())
    }

    /// Writes at most `max_len` bytes of the bit buffer to `bytes[offset..]`.
    /// Returns the number of bytes written.
    pub fn bits_write<B>(
        &self,
        bits: BitsHandle,
        bytes: &B,
        offset: i32,
        max_len: i32,
    ) -> Result<usize, SpeexError>
    where
        B: Writable<Elem = u8> + ?Sized,
    {
        let dst = Pinned::destination(bytes).ok_or(SpeexError::BufferUnavailable)?;
        let n = unsafe {
            self.lib
                .bits_write(bits.as_ptr(), dst.at_mut(offset).cast(), max_len)
        };
        Ok(n.max(0) as usize)
    }

    /// Number of bytes needed to write out the bit buffer.
    pub fn bits_nbytes(&self, bits: BitsHandle) -> usize {
        unsafe { self.lib.bits_nbytes(bits.as_ptr()) }.max(0) as usize
    }

    /// Number of bits left to read.
    pub fn bits_remaining(&self, bits: BitsHandle) -> i32 {
        unsafe { self.lib.bits_remaining(bits.as_ptr()) }
    }

    pub fn bits_reset(&self, bits: BitsHandle) {
        unsafe { self.lib.bits_reset(bits.as_ptr()) };
    }

    /// Looks up a mode descriptor. Returns [`Handle::NULL`] for unknown ids.
    pub fn lib_get_mode(&self, mode: impl Into<i32>) -> ModeHandle {
        Handle::from_const_ptr(self.lib.lib_get_mode(mode.into()))
    }

    pub fn encoder_init(&self, mode: ModeHandle) -> EncoderHandle {
        Handle::from_ptr(unsafe { self.lib.encoder_init(mode.as_ptr().cast_const()) })
    }

    pub fn encoder_destroy(&self, encoder: EncoderHandle) {
        unsafe { self.lib.encoder_destroy(encoder.as_ptr()) };
    }

    /// Encodes one frame from `input[in_offset..]` into `bits`. Returns the
    /// library's result: 0 when the frame need not be transmitted, 1
    /// otherwise.
    pub fn encode_int<I>(
        &self,
        encoder: EncoderHandle,
        input: &I,
        in_offset: i32,
        bits: BitsHandle,
    ) -> Result<i32, SpeexError>
    where
        I: Pinnable<Elem = i16> + ?Sized,
    {
        let src = Pinned::source(input).ok_or(SpeexError::BufferUnavailable)?;
        Ok(unsafe {
            self.lib
                .encode_int(encoder.as_ptr(), src.at(in_offset), bits.as_ptr())
        })
    }

    /// Issues a get-style encoder ctl and returns the fetched value.
    pub fn encoder_get_parameter(
        &self,
        encoder: EncoderHandle,
        request: i32,
    ) -> Result<i32, SpeexError> {
        let mut value = 0i32;
        let ret = unsafe {
            self.lib
                .encoder_ctl(encoder.as_ptr(), request, (&mut value as *mut i32).cast())
        };
        ctl_value(ret, value)
    }

    /// Issues a set-style encoder ctl.
    pub fn encoder_set_parameter(
        &self,
        encoder: EncoderHandle,
        request: i32,
        value: i32,
    ) -> Result<(), SpeexError> {
        let mut value = value;
        let ret = unsafe {
            self.lib
                .encoder_ctl(encoder.as_ptr(), request, (&mut value as *mut i32).cast())
        };
        ctl_status(ret)
    }

    pub fn decoder_init(&self, mode: ModeHandle) -> DecoderHandle {
        Handle::from_ptr(unsafe { self.lib.decoder_init(mode.as_ptr().cast_const()) })
    }

    pub fn decoder_destroy(&self, decoder: DecoderHandle) {
        unsafe { self.lib.decoder_destroy(decoder.as_ptr()) };
    }

    /// Decodes one frame from `bits` into `output[out_offset..]`.
    pub fn decode_int<O>(
        &self,
        decoder: DecoderHandle,
        bits: BitsHandle,
        output: &O,
        out_offset: i32,
    ) -> Result<(), SpeexError>
    where
        O: Writable<Elem = i16> + ?Sized,
    {
        let dst = Pinned::destination(output).ok_or(SpeexError::BufferUnavailable)?;
        let ret = unsafe {
            self.lib
                .decode_int(decoder.as_ptr(), bits.as_ptr(), dst.at_mut(out_offset))
        };
        SpeexError::from_decode(ret)
    }

    /// Issues a get-style decoder ctl and returns the fetched value.
    pub fn decoder_get_parameter(
        &self,
        decoder: DecoderHandle,
        request: i32,
    ) -> Result<i32, SpeexError> {
        let mut value = 0i32;
        let ret = unsafe {
            self.lib
                .decoder_ctl(decoder.as_ptr(), request, (&mut value as *mut i32).cast())
        };
        ctl_value(ret, value)
    }

    /// Issues a set-style decoder ctl.
    pub fn decoder_set_parameter(
        &self,
        decoder: DecoderHandle,
        request: i32,
        value: i32,
    ) -> Result<(), SpeexError> {
        let mut value = value;
        let ret = unsafe {
            self.lib
                .decoder_ctl(decoder.as_ptr(), request, (&mut value as *mut i32).cast())
        };
        ctl_status(ret)
    }

    /// Creates a resampler. On failure returns [`Handle::NULL`] and, when
    /// `err` is given, stores the `RESAMPLER_ERR_*` code in it.
    pub fn resampler_init(
        &self,
        channels: u32,
        in_rate: u32,
        out_rate: u32,
        quality: i32,
        err: Option<&mut i32>,
    ) -> ResamplerHandle {
        let err = err.map_or(ptr::null_mut(), |e| e as *mut i32);
        Handle::from_ptr(unsafe {
            self.lib
                .resampler_init(channels, in_rate, out_rate, quality, err)
        })
    }

    pub fn resampler_destroy(&self, resampler: ResamplerHandle) {
        unsafe { self.lib.resampler_destroy(resampler.as_ptr()) };
    }

    /// Resamples interleaved 16-bit samples.
    ///
    /// Offsets are in bytes whatever the element type of the buffers;
    /// counts are samples per channel. Returns the number of samples per
    /// channel written, as left in the in/out length after the call. The
    /// library's own return value is not consulted.
    #[allow(clippy::too_many_arguments)]
    pub fn resampler_process_interleaved_int<I, O>(
        &self,
        resampler: ResamplerHandle,
        input: &I,
        in_offset_bytes: i32,
        in_sample_count: u32,
        output: &O,
        out_offset_bytes: i32,
        out_sample_count: u32,
    ) -> Result<usize, SpeexError>
    where
        I: Pinnable + ?Sized,
        O: Writable + ?Sized,
    {
        let pins = PinnedPair::acquire(output, input).map_err(|_| SpeexError::BufferUnavailable)?;
        let mut in_len = in_sample_count;
        let mut out_len = out_sample_count;
        unsafe {
            self.lib.resampler_process_interleaved_int(
                resampler.as_ptr(),
                pins.src.byte_at(in_offset_bytes),
                &mut in_len,
                pins.dst.byte_at_mut(out_offset_bytes),
                &mut out_len,
            );
        }
        Ok(out_len as usize)
    }

    pub fn resampler_set_rate(
        &self,
        resampler: ResamplerHandle,
        in_rate: u32,
        out_rate: u32,
    ) -> Result<(), SpeexError> {
        let ret = unsafe {
            self.lib
                .resampler_set_rate(resampler.as_ptr(), in_rate, out_rate)
        };
        match ret {
            0 => Ok(()),
            code => Err(SpeexError::Resampler(code)),
        }
    }
}

fn ctl_value(ret: i32, value: i32) -> Result<i32, SpeexError> {
    match ret {
        0 => Ok(value),
        code => Err(SpeexError::Ctl(code)),
    }
}

fn ctl_status(ret: i32) -> Result<(), SpeexError> {
    ctl_value(ret, 0).map(|_| ())
}

#[cfg(feature = "speex")]
impl Bridge<super::ffi::LibSpeex> {
    /// Returns a bridge to the linked libspeex and libspeexdsp.
    pub fn native() -> Self {
        Self::new(super::ffi::LibSpeex)
    }
}
