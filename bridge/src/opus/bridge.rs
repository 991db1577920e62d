//! Opus call adapters.
//!
//! Every operation that can fail reports the libopus status through
//! [`OpusError`], keeping the code intact. Buffers that cannot be pinned
//! yield [`OpusError::AllocFail`] and a missing required buffer yields
//! [`OpusError::BadArg`]; libopus is not called in either case.

use std::ptr;

use super::ctl::*;
use super::error::{OPUS_OK, OpusError, check};
use super::ffi::{OpusDecoder, OpusEncoder, OpusLib};
use crate::gateway::{Pinnable, Pinned, PinnedPair, Writable};
use crate::handle::Handle;

/// Handle to an Opus encoder.
pub type EncoderHandle = Handle<OpusEncoder>;

/// Handle to an Opus decoder.
pub type DecoderHandle = Handle<OpusDecoder>;

/// Opus call surface.
#[derive(Debug, Clone, Default)]
pub struct Bridge<L> {
    lib: L,
}

impl<L: OpusLib> Bridge<L> {
    pub fn new(lib: L) -> Self {
        Self { lib }
    }

    /// Returns the library this bridge forwards to.
    pub fn lib(&self) -> &L {
        &self.lib
    }

    /// Creates a decoder. Returns [`Handle::NULL`] unless libopus reports
    /// success.
    pub fn decoder_create(&self, sample_rate: i32, channels: i32) -> DecoderHandle {
        let mut error = OPUS_OK;
        let st = unsafe { self.lib.decoder_create(sample_rate, channels, &mut error) };
        if error != OPUS_OK {
            return Handle::NULL;
        }
        Handle::from_ptr(st)
    }

    pub fn decoder_destroy(&self, decoder: DecoderHandle) {
        unsafe { self.lib.decoder_destroy(decoder.as_ptr()) };
    }

    /// Decodes one packet into `output[out_offset..]`.
    ///
    /// A missing `input`, or `in_length == 0`, asks libopus for loss
    /// concealment: it receives a null packet pointer. Returns the number of
    /// samples per channel written.
    #[allow(clippy::too_many_arguments)]
    pub fn decode<I, O>(
        &self,
        decoder: DecoderHandle,
        input: Option<&I>,
        in_offset: i32,
        in_length: i32,
        output: Option<&O>,
        out_offset: i32,
        frame_size: i32,
        decode_fec: bool,
    ) -> Result<usize, OpusError>
    where
        I: Pinnable<Elem = u8> + ?Sized,
        O: Writable<Elem = i16> + ?Sized,
    {
        let output = output.ok_or(OpusError::BadArg)?;
        let dst = Pinned::destination(output).ok_or(OpusError::AllocFail)?;
        let src = match input {
            Some(input) if in_length != 0 => {
                Some(Pinned::source(input).ok_or(OpusError::AllocFail)?)
            }
            _ => None,
        };

        let data = match &src {
            Some(src) => unsafe { src.at(in_offset) },
            None => ptr::null(),
        };
        let n = unsafe {
            self.lib.decode(
                decoder.as_ptr(),
                data,
                in_length,
                dst.at_mut(out_offset),
                frame_size,
                decode_fec as i32,
            )
        };
        check(n).map(|n| n as usize)
    }

    /// Returns the number of samples `packet[offset..offset + length]`
    /// decodes to at this decoder's rate.
    pub fn decoder_get_nb_samples<P>(
        &self,
        decoder: DecoderHandle,
        packet: Option<&P>,
        offset: i32,
        length: i32,
    ) -> Result<i32, OpusError>
    where
        P: Pinnable<Elem = u8> + ?Sized,
    {
        let packet = Self::pin_packet(packet)?;
        check(unsafe {
            self.lib
                .decoder_get_nb_samples(decoder.as_ptr(), packet.at(offset), length)
        })
    }

    /// Returns the decoder state size in bytes.
    pub fn decoder_get_size(&self, channels: i32) -> usize {
        self.lib.decoder_get_size(channels).max(0) as usize
    }

    /// Creates a VoIP encoder. Returns [`Handle::NULL`] unless libopus
    /// reports success.
    pub fn encoder_create(&self, sample_rate: i32, channels: i32) -> EncoderHandle {
        self.encoder_create_with(sample_rate, channels, Application::VoIP)
    }

    /// Creates an encoder for `application`.
    pub fn encoder_create_with(
        &self,
        sample_rate: i32,
        channels: i32,
        application: Application,
    ) -> EncoderHandle {
        let mut error = OPUS_OK;
        let st = unsafe {
            self.lib
                .encoder_create(sample_rate, channels, application.to_ffi(), &mut error)
        };
        if error != OPUS_OK {
            return Handle::NULL;
        }
        Handle::from_ptr(st)
    }

    pub fn encoder_destroy(&self, encoder: EncoderHandle) {
        unsafe { self.lib.encoder_destroy(encoder.as_ptr()) };
    }

    /// Encodes `frame_size` samples per channel from `input[in_offset..]`
    /// into at most `out_length` bytes at `output[out_offset..]`. Returns the
    /// packet length.
    #[allow(clippy::too_many_arguments)]
    pub fn encode<I, O>(
        &self,
        encoder: EncoderHandle,
        input: Option<&I>,
        in_offset: i32,
        frame_size: i32,
        output: Option<&O>,
        out_offset: i32,
        out_length: i32,
    ) -> Result<usize, OpusError>
    where
        I: Pinnable<Elem = i16> + ?Sized,
        O: Writable<Elem = u8> + ?Sized,
    {
        let (Some(input), Some(output)) = (input, output) else {
            return Err(OpusError::BadArg);
        };
        let pins = PinnedPair::acquire(output, input).map_err(|_| OpusError::AllocFail)?;
        let n = unsafe {
            self.lib.encode(
                encoder.as_ptr(),
                pins.src.at(in_offset),
                frame_size,
                pins.dst.at_mut(out_offset),
                out_length,
            )
        };
        check(n).map(|n| n as usize)
    }

    /// Returns the encoder state size in bytes.
    pub fn encoder_get_size(&self, channels: i32) -> usize {
        self.lib.encoder_get_size(channels).max(0) as usize
    }

    /// Issues a get-style control request and returns the fetched value.
    pub fn encoder_ctl_get(&self, encoder: EncoderHandle, request: i32) -> Result<i32, OpusError> {
        let mut value = 0;
        let ret = unsafe {
            self.lib
                .encoder_ctl_get(encoder.as_ptr(), request, &mut value)
        };
        match OpusError::from_code(ret) {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }

    /// Issues a set-style control request.
    pub fn encoder_ctl_set(
        &self,
        encoder: EncoderHandle,
        request: i32,
        value: i32,
    ) -> Result<(), OpusError> {
        let ret = unsafe { self.lib.encoder_ctl_set(encoder.as_ptr(), request, value) };
        check(ret).map(|_| ())
    }

    /// Returns the bandwidth coded in the packet's TOC byte.
    pub fn packet_get_bandwidth<P>(&self, data: Option<&P>, offset: i32) -> Result<i32, OpusError>
    where
        P: Pinnable<Elem = u8> + ?Sized,
    {
        let data = Self::pin_packet(data)?;
        check(unsafe { self.lib.packet_get_bandwidth(data.at(offset)) })
    }

    /// Returns the channel count coded in the packet's TOC byte.
    pub fn packet_get_nb_channels<P>(&self, data: Option<&P>, offset: i32) -> Result<i32, OpusError>
    where
        P: Pinnable<Elem = u8> + ?Sized,
    {
        let data = Self::pin_packet(data)?;
        check(unsafe { self.lib.packet_get_nb_channels(data.at(offset)) })
    }

    /// Returns the number of frames in `packet[offset..offset + length]`.
    pub fn packet_get_nb_frames<P>(
        &self,
        packet: Option<&P>,
        offset: i32,
        length: i32,
    ) -> Result<i32, OpusError>
    where
        P: Pinnable<Elem = u8> + ?Sized,
    {
        let packet = Self::pin_packet(packet)?;
        check(unsafe { self.lib.packet_get_nb_frames(packet.at(offset), length) })
    }

    fn pin_packet<P>(packet: Option<&P>) -> Result<Pinned<'_, P>, OpusError>
    where
        P: Pinnable<Elem = u8> + ?Sized,
    {
        let packet = packet.ok_or(OpusError::BadArg)?;
        Pinned::source(packet).ok_or(OpusError::AllocFail)
    }
}

macro_rules! encoder_ctl_accessors {
    ($($(#[$doc:meta])* $get:ident / $set:ident => $get_req:ident / $set_req:ident;)*) => {
        impl<L: OpusLib> Bridge<L> {
            $(
                $(#[$doc])*
                pub fn $get(&self, encoder: EncoderHandle) -> Result<i32, OpusError> {
                    self.encoder_ctl_get(encoder, $get_req)
                }

                $(#[$doc])*
                pub fn $set(&self, encoder: EncoderHandle, value: i32) -> Result<(), OpusError> {
                    self.encoder_ctl_set(encoder, $set_req, value)
                }
            )*
        }
    };
}

encoder_ctl_accessors! {
    /// Coded bandwidth, one of the `OPUS_BANDWIDTH_*` values or `OPUS_AUTO`.
    encoder_get_bandwidth / encoder_set_bandwidth
        => OPUS_GET_BANDWIDTH_REQUEST / OPUS_SET_BANDWIDTH_REQUEST;
    /// Target bitrate in bits per second, `OPUS_AUTO` or `OPUS_BITRATE_MAX`.
    encoder_get_bitrate / encoder_set_bitrate
        => OPUS_GET_BITRATE_REQUEST / OPUS_SET_BITRATE_REQUEST;
    /// Computational complexity, 0 to 10.
    encoder_get_complexity / encoder_set_complexity
        => OPUS_GET_COMPLEXITY_REQUEST / OPUS_SET_COMPLEXITY_REQUEST;
    /// Discontinuous transmission, 0 or 1.
    encoder_get_dtx / encoder_set_dtx
        => OPUS_GET_DTX_REQUEST / OPUS_SET_DTX_REQUEST;
    /// Forced channel count, 1, 2 or `OPUS_AUTO`.
    encoder_get_force_channels / encoder_set_force_channels
        => OPUS_GET_FORCE_CHANNELS_REQUEST / OPUS_SET_FORCE_CHANNELS_REQUEST;
    /// In-band forward error correction, 0 or 1.
    encoder_get_inband_fec / encoder_set_inband_fec
        => OPUS_GET_INBAND_FEC_REQUEST / OPUS_SET_INBAND_FEC_REQUEST;
    /// Upper bound on the coded bandwidth.
    encoder_get_max_bandwidth / encoder_set_max_bandwidth
        => OPUS_GET_MAX_BANDWIDTH_REQUEST / OPUS_SET_MAX_BANDWIDTH_REQUEST;
    /// Expected packet loss in percent, 0 to 100.
    encoder_get_packet_loss_perc / encoder_set_packet_loss_perc
        => OPUS_GET_PACKET_LOSS_PERC_REQUEST / OPUS_SET_PACKET_LOSS_PERC_REQUEST;
    /// Variable bitrate, 0 or 1.
    encoder_get_vbr / encoder_set_vbr
        => OPUS_GET_VBR_REQUEST / OPUS_SET_VBR_REQUEST;
    /// Constrained variable bitrate, 0 or 1.
    encoder_get_vbr_constraint / encoder_set_vbr_constraint
        => OPUS_GET_VBR_CONSTRAINT_REQUEST / OPUS_SET_VBR_CONSTRAINT_REQUEST;
}

#[cfg(feature = "opus")]
impl Bridge<super::ffi::LibOpus> {
    /// Returns a bridge to the linked libopus.
    pub fn native() -> Self {
        Self::new(super::ffi::LibOpus)
    }
}
