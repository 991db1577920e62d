//! FFI bindings to spandsp's G.722 codec.

use std::os::raw::c_int;

/// Opaque `g722_encode_state_t`.
pub enum G722EncodeState {}

/// Opaque `g722_decode_state_t`.
pub enum G722DecodeState {}

/// The only bit rate the bridge opens codecs at.
pub const G722_RATE_64000: c_int = 64000;

/// G.722 library entry points the bridge forwards to.
///
/// Mirrors the spandsp C API one function per method. Implemented by
/// [`SpanDsp`] for the real library and by test doubles.
pub trait G722Lib {
    unsafe fn encode_init(
        &self,
        s: *mut G722EncodeState,
        rate: c_int,
        options: c_int,
    ) -> *mut G722EncodeState;
    unsafe fn encode_release(&self, s: *mut G722EncodeState) -> c_int;
    unsafe fn encode_free(&self, s: *mut G722EncodeState) -> c_int;
    unsafe fn encode(
        &self,
        s: *mut G722EncodeState,
        g722_data: *mut u8,
        amp: *const i16,
        len: c_int,
    ) -> c_int;

    unsafe fn decode_init(
        &self,
        s: *mut G722DecodeState,
        rate: c_int,
        options: c_int,
    ) -> *mut G722DecodeState;
    unsafe fn decode_release(&self, s: *mut G722DecodeState) -> c_int;
    unsafe fn decode_free(&self, s: *mut G722DecodeState) -> c_int;
    unsafe fn decode(
        &self,
        s: *mut G722DecodeState,
        amp: *mut i16,
        g722_data: *const u8,
        len: c_int,
    ) -> c_int;
}

#[cfg(feature = "g722")]
mod native {
    use super::*;

    unsafe extern "C" {
        pub fn g722_encode_init(
            s: *mut G722EncodeState,
            rate: c_int,
            options: c_int,
        ) -> *mut G722EncodeState;
        pub fn g722_encode_release(s: *mut G722EncodeState) -> c_int;
        pub fn g722_encode_free(s: *mut G722EncodeState) -> c_int;
        pub fn g722_encode(
            s: *mut G722EncodeState,
            g722_data: *mut u8,
            amp: *const i16,
            len: c_int,
        ) -> c_int;

        pub fn g722_decode_init(
            s: *mut G722DecodeState,
            rate: c_int,
            options: c_int,
        ) -> *mut G722DecodeState;
        pub fn g722_decode_release(s: *mut G722DecodeState) -> c_int;
        pub fn g722_decode_free(s: *mut G722DecodeState) -> c_int;
        pub fn g722_decode(
            s: *mut G722DecodeState,
            amp: *mut i16,
            g722_data: *const u8,
            len: c_int,
        ) -> c_int;
    }
}

/// The spandsp library linked into the process.
#[cfg(feature = "g722")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanDsp;

#[cfg(feature = "g722")]
impl G722Lib for SpanDsp {
    unsafe fn encode_init(
        &self,
        s: *mut G722EncodeState,
        rate: c_int,
        options: c_int,
    ) -> *mut G722EncodeState {
        unsafe { native::g722_encode_init(s, rate, options) }
    }

    unsafe fn encode_release(&self, s: *mut G722EncodeState) -> c_int {
        unsafe { native::g722_encode_release(s) }
    }

    unsafe fn encode_free(&self, s: *mut G722EncodeState) -> c_int {
        unsafe { native::g722_encode_free(s) }
    }

    unsafe fn encode(
        &self,
        s: *mut G722EncodeState,
        g722_data: *mut u8,
        amp: *const i16,
        len: c_int,
    ) -> c_int {
        unsafe { native::g722_encode(s, g722_data, amp, len) }
    }

    unsafe fn decode_init(
        &self,
        s: *mut G722DecodeState,
        rate: c_int,
        options: c_int,
    ) -> *mut G722DecodeState {
        unsafe { native::g722_decode_init(s, rate, options) }
    }

    unsafe fn decode_release(&self, s: *mut G722DecodeState) -> c_int {
        unsafe { native::g722_decode_release(s) }
    }

    unsafe fn decode_free(&self, s: *mut G722DecodeState) -> c_int {
        unsafe { native::g722_decode_free(s) }
    }

    unsafe fn decode(
        &self,
        s: *mut G722DecodeState,
        amp: *mut i16,
        g722_data: *const u8,
        len: c_int,
    ) -> c_int {
        unsafe { native::g722_decode(s, amp, g722_data, len) }
    }
}
