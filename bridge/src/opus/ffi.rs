//! FFI bindings to libopus.

use std::os::raw::{c_int, c_uchar};

/// Opaque encoder state.
pub enum OpusEncoder {}

/// Opaque decoder state.
pub enum OpusDecoder {}

/// opus_int32 type (from opus_types.h)
pub type OpusInt32 = i32;

/// opus_int16 type (from opus_types.h)
pub type OpusInt16 = i16;

/// libopus entry points the bridge forwards to.
///
/// `opus_encoder_ctl` is variadic in C, so it is split into a setter taking
/// the value and a getter taking an out-pointer.
pub trait OpusLib {
    unsafe fn decoder_create(
        &self,
        fs: OpusInt32,
        channels: c_int,
        error: *mut c_int,
    ) -> *mut OpusDecoder;
    unsafe fn decoder_destroy(&self, st: *mut OpusDecoder);
    unsafe fn decode(
        &self,
        st: *mut OpusDecoder,
        data: *const c_uchar,
        len: OpusInt32,
        pcm: *mut OpusInt16,
        frame_size: c_int,
        decode_fec: c_int,
    ) -> c_int;
    unsafe fn decoder_get_nb_samples(
        &self,
        st: *const OpusDecoder,
        packet: *const c_uchar,
        len: OpusInt32,
    ) -> c_int;
    fn decoder_get_size(&self, channels: c_int) -> c_int;

    unsafe fn encoder_create(
        &self,
        fs: OpusInt32,
        channels: c_int,
        application: c_int,
        error: *mut c_int,
    ) -> *mut OpusEncoder;
    unsafe fn encoder_destroy(&self, st: *mut OpusEncoder);
    unsafe fn encode(
        &self,
        st: *mut OpusEncoder,
        pcm: *const OpusInt16,
        frame_size: c_int,
        data: *mut c_uchar,
        max_data_bytes: OpusInt32,
    ) -> OpusInt32;
    unsafe fn encoder_ctl_set(
        &self,
        st: *mut OpusEncoder,
        request: c_int,
        value: OpusInt32,
    ) -> c_int;
    unsafe fn encoder_ctl_get(
        &self,
        st: *mut OpusEncoder,
        request: c_int,
        value: *mut OpusInt32,
    ) -> c_int;
    fn encoder_get_size(&self, channels: c_int) -> c_int;

    unsafe fn packet_get_bandwidth(&self, data: *const c_uchar) -> c_int;
    unsafe fn packet_get_nb_channels(&self, data: *const c_uchar) -> c_int;
    unsafe fn packet_get_nb_frames(&self, packet: *const c_uchar, len: OpusInt32) -> c_int;
}

#[cfg(feature = "opus")]
mod native {
    use super::*;
    use std::os::raw::c_char;

    unsafe extern "C" {
        pub fn opus_strerror(error: c_int) -> *const c_char;

        pub fn opus_encoder_create(
            fs: OpusInt32,
            channels: c_int,
            application: c_int,
            error: *mut c_int,
        ) -> *mut OpusEncoder;
        pub fn opus_encoder_destroy(enc: *mut OpusEncoder);
        pub fn opus_encoder_get_size(channels: c_int) -> c_int;
        pub fn opus_encode(
            enc: *mut OpusEncoder,
            pcm: *const OpusInt16,
            frame_size: c_int,
            data: *mut c_uchar,
            max_data_bytes: OpusInt32,
        ) -> OpusInt32;
        pub fn opus_encoder_ctl(enc: *mut OpusEncoder, request: c_int, ...) -> c_int;

        pub fn opus_decoder_create(
            fs: OpusInt32,
            channels: c_int,
            error: *mut c_int,
        ) -> *mut OpusDecoder;
        pub fn opus_decoder_destroy(dec: *mut OpusDecoder);
        pub fn opus_decoder_get_size(channels: c_int) -> c_int;
        pub fn opus_decode(
            dec: *mut OpusDecoder,
            data: *const c_uchar,
            len: OpusInt32,
            pcm: *mut OpusInt16,
            frame_size: c_int,
            decode_fec: c_int,
        ) -> c_int;
        pub fn opus_decoder_get_nb_samples(
            dec: *const OpusDecoder,
            packet: *const c_uchar,
            len: OpusInt32,
        ) -> c_int;

        pub fn opus_packet_get_bandwidth(data: *const c_uchar) -> c_int;
        pub fn opus_packet_get_nb_channels(data: *const c_uchar) -> c_int;
        pub fn opus_packet_get_nb_frames(packet: *const c_uchar, len: OpusInt32) -> c_int;
    }
}

/// The libopus linked into the process.
#[cfg(feature = "opus")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibOpus;

#[cfg(feature = "opus")]
impl LibOpus {
    /// Gets libopus' message for an error code.
    pub fn error_string(error: c_int) -> String {
        unsafe {
            let c_str = native::opus_strerror(error);
            if c_str.is_null() {
                return format!("opus error {}", error);
            }
            std::ffi::CStr::from_ptr(c_str)
                .to_string_lossy()
                .into_owned()
        }
    }
}

#[cfg(feature = "opus")]
impl OpusLib for LibOpus {
    unsafe fn decoder_create(
        &self,
        fs: OpusInt32,
        channels: c_int,
        error: *mut c_int,
    ) -> *mut OpusDecoder {
        unsafe { native::opus_decoder_create(fs, channels, error) }
    }

    unsafe fn decoder_destroy(&self, st: *mut OpusDecoder) {
        unsafe { native::opus_decoder_destroy(st) }
    }

    unsafe fn decode(
        &self,
        st: *mut OpusDecoder,
        data: *const c_uchar,
        len: OpusInt32,
        pcm: *mut OpusInt16,
        frame_size: c_int,
        decode_fec: c_int,
    ) -> c_int {
        unsafe { native::opus_decode(st, data, len, pcm, frame_size, decode_fec) }
    }

    unsafe fn decoder_get_nb_samples(
        &self,
        st: *const OpusDecoder,
        packet: *const c_uchar,
        len: OpusInt32,
    ) -> c_int {
        unsafe { native::opus_decoder_get_nb_samples(st, packet, len) }
    }

    fn decoder_get_size(&self, channels: c_int) -> c_int {
        unsafe { native::opus_decoder_get_size(channels) }
    }

    unsafe fn encoder_create(
        &self,
        fs: OpusInt32,
        channels: c_int,
        application: c_int,
        error: *mut c_int,
    ) -> *mut OpusEncoder {
        unsafe { native::opus_encoder_create(fs, channels, application, error) }
    }

    unsafe fn encoder_destroy(&self, st: *mut OpusEncoder) {
        unsafe { native::opus_encoder_destroy(st) }
    }

    unsafe fn encode(
        &self,
        st: *mut OpusEncoder,
        pcm: *const OpusInt16,
        frame_size: c_int,
        data: *mut c_uchar,
        max_data_bytes: OpusInt32,
    ) -> OpusInt32 {
        unsafe { native::opus_encode(st, pcm, frame_size, data, max_data_bytes) }
    }

    unsafe fn encoder_ctl_set(
        &self,
        st: *mut OpusEncoder,
        request: c_int,
        value: OpusInt32,
    ) -> c_int {
        unsafe { native::opus_encoder_ctl(st, request, value) }
    }

    unsafe fn encoder_ctl_get(
        &self,
        st: *mut OpusEncoder,
        request: c_int,
        value: *mut OpusInt32,
    ) -> c_int {
        unsafe { native::opus_encoder_ctl(st, request, value) }
    }

    fn encoder_get_size(&self, channels: c_int) -> c_int {
        unsafe { native::opus_encoder_get_size(channels) }
    }

    unsafe fn packet_get_bandwidth(&self, data: *const c_uchar) -> c_int {
        unsafe { native::opus_packet_get_bandwidth(data) }
    }

    unsafe fn packet_get_nb_channels(&self, data: *const c_uchar) -> c_int {
        unsafe { native::opus_packet_get_nb_channels(data) }
    }

    unsafe fn packet_get_nb_frames(&self, packet: *const c_uchar, len: OpusInt32) -> c_int {
        unsafe { native::opus_packet_get_nb_frames(packet, len) }
    }
}
