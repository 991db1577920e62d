//! FFI bindings to libspeex and libspeexdsp's resampler.

use std::os::raw::{c_char, c_int, c_void};

/// `SpeexBits` from speex_bits.h. The bridge allocates it, so the layout
/// has to match.
#[repr(C)]
#[derive(Debug)]
pub struct SpeexBits {
    pub chars: *mut c_char,
    pub nb_bits: c_int,
    pub char_ptr: c_int,
    pub bit_ptr: c_int,
    pub owner: c_int,
    pub overflow: c_int,
    pub buf_size: c_int,
    pub reserved1: c_int,
    pub reserved2: *mut c_void,
}

/// Opaque `SpeexMode`, owned by the library.
pub enum SpeexMode {}

/// Opaque encoder state.
pub enum SpeexEncoderState {}

/// Opaque decoder state.
pub enum SpeexDecoderState {}

/// Opaque `SpeexResamplerState`.
pub enum SpeexResamplerState {}

pub type SpxInt16 = i16;
pub type SpxUint32 = u32;

/// libspeex / libspeexdsp entry points the bridge forwards to.
///
/// The ctl functions take a `void *` whose pointee type depends on the
/// request; every request the bridge issues uses an `int`.
pub trait SpeexLib: Clone {
    unsafe fn bits_init(&self, bits: *mut SpeexBits);
    unsafe fn bits_destroy(&self, bits: *mut SpeexBits);
    unsafe fn bits_reset(&self, bits: *mut SpeexBits);
    unsafe fn bits_read_from(&self, bits: *mut SpeexBits, bytes: *const c_char, len: c_int);
    unsafe fn bits_write(&self, bits: *mut SpeexBits, bytes: *mut c_char, max_len: c_int) -> c_int;
    unsafe fn bits_nbytes(&self, bits: *mut SpeexBits) -> c_int;
    unsafe fn bits_remaining(&self, bits: *mut SpeexBits) -> c_int;

    fn lib_get_mode(&self, mode: c_int) -> *const SpeexMode;

    unsafe fn encoder_init(&self, mode: *const SpeexMode) -> *mut SpeexEncoderState;
    unsafe fn encoder_destroy(&self, state: *mut SpeexEncoderState);
    unsafe fn encode_int(
        &self,
        state: *mut SpeexEncoderState,
        input: *const SpxInt16,
        bits: *mut SpeexBits,
    ) -> c_int;
    unsafe fn encoder_ctl(
        &self,
        state: *mut SpeexEncoderState,
        request: c_int,
        ptr: *mut c_void,
    ) -> c_int;

    unsafe fn decoder_init(&self, mode: *const SpeexMode) -> *mut SpeexDecoderState;
    unsafe fn decoder_destroy(&self, state: *mut SpeexDecoderState);
    unsafe fn decode_int(
        &self,
        state: *mut SpeexDecoderState,
        bits: *mut SpeexBits,
        out: *mut SpxInt16,
    ) -> c_int;
    unsafe fn decoder_ctl(
        &self,
        state: *mut SpeexDecoderState,
        request: c_int,
        ptr: *mut c_void,
    ) -> c_int;

    unsafe fn resampler_init(
        &self,
        nb_channels: SpxUint32,
        in_rate: SpxUint32,
        out_rate: SpxUint32,
        quality: c_int,
        err: *mut c_int,
    ) -> *mut SpeexResamplerState;
    unsafe fn resampler_destroy(&self, st: *mut SpeexResamplerState);
    unsafe fn resampler_process_interleaved_int(
        &self,
        st: *mut SpeexResamplerState,
        input: *const SpxInt16,
        in_len: *mut SpxUint32,
        out: *mut SpxInt16,
        out_len: *mut SpxUint32,
    ) -> c_int;
    unsafe fn resampler_set_rate(
        &self,
        st: *mut SpeexResamplerState,
        in_rate: SpxUint32,
        out_rate: SpxUint32,
    ) -> c_int;
}

#[cfg(feature = "speex")]
mod native {
    use super::*;

    unsafe extern "C" {
        pub fn speex_bits_init(bits: *mut SpeexBits);
        pub fn speex_bits_destroy(bits: *mut SpeexBits);
        pub fn speex_bits_reset(bits: *mut SpeexBits);
        pub fn speex_bits_read_from(bits: *mut SpeexBits, bytes: *const c_char, len: c_int);
        pub fn speex_bits_write(bits: *mut SpeexBits, bytes: *mut c_char, max_len: c_int) -> c_int;
        pub fn speex_bits_nbytes(bits: *mut SpeexBits) -> c_int;
        pub fn speex_bits_remaining(bits: *mut SpeexBits) -> c_int;

        pub fn speex_lib_get_mode(mode: c_int) -> *const SpeexMode;

        pub fn speex_encoder_init(mode: *const SpeexMode) -> *mut c_void;
        pub fn speex_encoder_destroy(state: *mut c_void);
        pub fn speex_encode_int(
            state: *mut c_void,
            input: *mut SpxInt16,
            bits: *mut SpeexBits,
        ) -> c_int;
        pub fn speex_encoder_ctl(state: *mut c_void, request: c_int, ptr: *mut c_void) -> c_int;

        pub fn speex_decoder_init(mode: *const SpeexMode) -> *mut c_void;
        pub fn speex_decoder_destroy(state: *mut c_void);
        pub fn speex_decode_int(
            state: *mut c_void,
            bits: *mut SpeexBits,
            out: *mut SpxInt16,
        ) -> c_int;
        pub fn speex_decoder_ctl(state: *mut c_void, request: c_int, ptr: *mut c_void) -> c_int;

        pub fn speex_resampler_init(
            nb_channels: SpxUint32,
            in_rate: SpxUint32,
            out_rate: SpxUint32,
            quality: c_int,
            err: *mut c_int,
        ) -> *mut SpeexResamplerState;
        pub fn speex_resampler_destroy(st: *mut SpeexResamplerState);
        pub fn speex_resampler_process_interleaved_int(
            st: *mut SpeexResamplerState,
            input: *const SpxInt16,
            in_len: *mut SpxUint32,
            out: *mut SpxInt16,
            out_len: *mut SpxUint32,
        ) -> c_int;
        pub fn speex_resampler_set_rate(
            st: *mut SpeexResamplerState,
            in_rate: SpxUint32,
            out_rate: SpxUint32,
        ) -> c_int;
    }
}

/// The libspeex and libspeexdsp linked into the process.
#[cfg(feature = "speex")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibSpeex;

#[cfg(feature = "speex")]
impl SpeexLib for LibSpeex {
    unsafe fn bits_init(&self, bits: *mut SpeexBits) {
        unsafe { native::speex_bits_init(bits) }
    }

    unsafe fn bits_destroy(&self, bits: *mut SpeexBits) {
        unsafe { native::speex_bits_destroy(bits) }
    }

    unsafe fn bits_reset(&self, bits: *mut SpeexBits) {
        unsafe { native::speex_bits_reset(bits) }
    }

    unsafe fn bits_read_from(&self, bits: *mut SpeexBits, bytes: *const c_char, len: c_int) {
        unsafe { native::speex_bits_read_from(bits, bytes, len) }
    }

    unsafe fn bits_write(&self, bits: *mut SpeexBits, bytes: *mut c_char, max_len: c_int) -> c_int {
        unsafe { native::speex_bits_write(bits, bytes, max_len) }
    }

    unsafe fn bits_nbytes(&self, bits: *mut SpeexBits) -> c_int {
        unsafe { native::speex_bits_nbytes(bits) }
    }

    unsafe fn bits_remaining(&self, bits: *mut SpeexBits) -> c_int {
        unsafe { native::speex_bits_remaining(bits) }
    }

    fn lib_get_mode(&self, mode: c_int) -> *const SpeexMode {
        unsafe { native::speex_lib_get_mode(mode) }
    }

    unsafe fn encoder_init(&self, mode: *const SpeexMode) -> *mut SpeexEncoderState {
        unsafe { native::speex_encoder_init(mode).cast() }
    }

    unsafe fn encoder_destroy(&self, state: *mut SpeexEncoderState) {
        unsafe { native::speex_encoder_destroy(state.cast()) }
    }

    unsafe fn encode_int(
        &self,
        state: *mut SpeexEncoderState,
        input: *const SpxInt16,
        bits: *mut SpeexBits,
    ) -> c_int {
        // speex_encode_int only reads the samples despite the mutable pointer.
        unsafe { native::speex_encode_int(state.cast(), input.cast_mut(), bits) }
    }

    unsafe fn encoder_ctl(
        &self,
        state: *mut SpeexEncoderState,
        request: c_int,
        ptr: *mut c_void,
    ) -> c_int {
        unsafe { native::speex_encoder_ctl(state.cast(), request, ptr) }
    }

    unsafe fn decoder_init(&self, mode: *const SpeexMode) -> *mut SpeexDecoderState {
        unsafe { native::speex_decoder_init(mode).cast() }
    }

    unsafe fn decoder_destroy(&self, state: *mut SpeexDecoderState) {
        unsafe { native::speex_decoder_destroy(state.cast()) }
    }

    unsafe fn decode_int(
        &self,
        state: *mut SpeexDecoderState,
        bits: *mut SpeexBits,
        out: *mut SpxInt16,
    ) -> c_int {
        unsafe { native::speex_decode_int(state.cast(), bits, out) }
    }

    unsafe fn decoder_ctl(
        &self,
        state: *mut SpeexDecoderState,
        request: c_int,
        ptr: *mut c_void,
    ) -> c_int {
        unsafe { native::speex_decoder_ctl(state.cast(), request, ptr) }
    }

    unsafe fn resampler_init(
        &self,
        nb_channels: SpxUint32,
        in_rate: SpxUint32,
        out_rate: SpxUint32,
        quality: c_int,
        err: *mut c_int,
    ) -> *mut SpeexResamplerState {
        unsafe { native::speex_resampler_init(nb_channels, in_rate, out_rate, quality, err) }
    }

    unsafe fn resampler_destroy(&self, st: *mut SpeexResamplerState) {
        unsafe { native::speex_resampler_destroy(st) }
    }

    unsafe fn resampler_process_interleaved_int(
        &self,
        st: *mut SpeexResamplerState,
        input: *const SpxInt16,
        in_len: *mut SpxUint32,
        out: *mut SpxInt16,
        out_len: *mut SpxUint32,
    ) -> c_int {
        unsafe { native::speex_resampler_process_interleaved_int(st, input, in_len, out, out_len) }
    }

    unsafe fn resampler_set_rate(
        &self,
        st: *mut SpeexResamplerState,
        in_rate: SpxUint32,
        out_rate: SpxUint32,
    ) -> c_int {
        unsafe { native::speex_resampler_set_rate(st, in_rate, out_rate) }
    }
}
