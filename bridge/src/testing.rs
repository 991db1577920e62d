//! Test doubles: an audited buffer and scripted codec libraries.
//!
//! The fakes keep just enough state to be checked against: allocations are
//! counted, calls are tallied by name, and the codecs are simple enough that
//! tests can predict their output exactly.

use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::os::raw::{c_char, c_int, c_uchar, c_void};
use std::ptr::{self, NonNull};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::g722::ffi::{G722DecodeState, G722EncodeState, G722Lib};
use crate::gateway::{Pinnable, Primitive, ReleaseMode, Writable};
use crate::opus::ctl::*;
use crate::opus::ffi::{OpusDecoder, OpusEncoder, OpusInt16, OpusInt32, OpusLib};
use crate::opus::{
    OPUS_ALLOC_FAIL, OPUS_BAD_ARG, OPUS_BUFFER_TOO_SMALL, OPUS_INVALID_PACKET, OPUS_OK,
    OPUS_UNIMPLEMENTED,
};
use crate::speex::ctl::*;
use crate::speex::ffi::{
    SpeexBits, SpeexDecoderState, SpeexEncoderState, SpeexLib, SpeexMode, SpeexResamplerState,
    SpxInt16, SpxUint32,
};

/// One gateway interaction with an [`AuditArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Pin(&'static str),
    PinFailed(&'static str),
    Unpin(&'static str, ReleaseMode),
}

#[derive(Default)]
struct AuditState {
    events: Vec<PinEvent>,
    live: usize,
}

/// Shared record of pin events across several arrays.
#[derive(Clone, Default)]
pub struct AuditLog {
    state: Arc<Mutex<AuditState>>,
}

impl AuditLog {
    pub fn events(&self) -> Vec<PinEvent> {
        self.state.lock().events.clone()
    }

    /// Pins not yet released.
    pub fn live(&self) -> usize {
        self.state.lock().live
    }

    fn record(&self, event: PinEvent) {
        let mut state = self.state.lock();
        match event {
            PinEvent::Pin(_) => state.live += 1,
            PinEvent::Unpin(..) => state.live -= 1,
            PinEvent::PinFailed(_) => {}
        }
        state.events.push(event);
    }
}

/// A named buffer that logs every pin and release.
pub struct AuditArray<T> {
    name: &'static str,
    data: UnsafeCell<Box<[T]>>,
    log: AuditLog,
    fail: bool,
}

impl<T: Primitive> AuditArray<T> {
    pub fn new(name: &'static str, len: usize, log: &AuditLog) -> Self {
        Self {
            name,
            data: UnsafeCell::new(vec![T::default(); len].into_boxed_slice()),
            log: log.clone(),
            fail: false,
        }
    }

    /// Makes every pin attempt fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

unsafe impl<T: Primitive> Pinnable for AuditArray<T> {
    type Elem = T;

    fn pin(&self) -> Option<NonNull<T>> {
        if self.fail {
            self.log.record(PinEvent::PinFailed(self.name));
            return None;
        }
        self.log.record(PinEvent::Pin(self.name));
        let data = unsafe { &mut *self.data.get() };
        NonNull::new(data.as_mut_ptr())
    }

    unsafe fn unpin(&self, _ptr: NonNull<T>, mode: ReleaseMode) {
        self.log.record(PinEvent::Unpin(self.name, mode));
    }
}

unsafe impl<T: Primitive> Writable for AuditArray<T> {}

/// Call tally and allocation count shared by the clones of one fake.
#[derive(Default)]
struct Ledger {
    calls: HashMap<&'static str, usize>,
    live: usize,
    last_len: Option<i32>,
    last_application: Option<i32>,
}

#[derive(Clone, Default)]
struct SharedLedger(Arc<Mutex<Ledger>>);

impl SharedLedger {
    fn call(&self, name: &'static str) {
        *self.0.lock().calls.entry(name).or_default() += 1;
    }

    fn calls(&self, name: &str) -> usize {
        self.0.lock().calls.get(name).copied().unwrap_or(0)
    }

    fn alloc<T>(&self, value: T) -> *mut T {
        self.0.lock().live += 1;
        Box::into_raw(Box::new(value))
    }

    unsafe fn free<T>(&self, ptr: *mut T) {
        if ptr.is_null() {
            return;
        }
        self.0.lock().live -= 1;
        drop(unsafe { Box::from_raw(ptr) });
    }

    fn live(&self) -> usize {
        self.0.lock().live
    }
}

// ---------------------------------------------------------------------------
// G.722
// ---------------------------------------------------------------------------

struct FakeG722Codec {
    _rate: c_int,
}

/// A G.722 stand-in that codes each sample pair as its mean.
#[derive(Clone, Default)]
pub struct FakeG722 {
    ledger: SharedLedger,
    refuse_init: bool,
}

impl FakeG722 {
    /// Makes both init calls fail.
    pub fn refuse_init(mut self) -> Self {
        self.refuse_init = true;
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.ledger.calls(name)
    }

    /// Codec states allocated and not yet freed.
    pub fn live_states(&self) -> usize {
        self.ledger.live()
    }

    /// Length argument of the latest encode or decode call.
    pub fn last_len(&self) -> Option<i32> {
        self.ledger.0.lock().last_len
    }

    fn init<T>(&self, name: &'static str, rate: c_int) -> *mut T {
        self.ledger.call(name);
        if self.refuse_init {
            return ptr::null_mut();
        }
        self.ledger.alloc(FakeG722Codec { _rate: rate }).cast()
    }

    fn process(&self, name: &'static str, len: c_int) {
        self.ledger.call(name);
        self.ledger.0.lock().last_len = Some(len);
    }
}

impl G722Lib for FakeG722 {
    unsafe fn encode_init(
        &self,
        _s: *mut G722EncodeState,
        rate: c_int,
        _options: c_int,
    ) -> *mut G722EncodeState {
        self.init("encode_init", rate)
    }

    unsafe fn encode_release(&self, _s: *mut G722EncodeState) -> c_int {
        self.ledger.call("encode_release");
        0
    }

    unsafe fn encode_free(&self, s: *mut G722EncodeState) -> c_int {
        self.ledger.call("encode_free");
        unsafe { self.ledger.free(s.cast::<FakeG722Codec>()) };
        0
    }

    unsafe fn encode(
        &self,
        _s: *mut G722EncodeState,
        g722_data: *mut u8,
        amp: *const i16,
        len: c_int,
    ) -> c_int {
        self.process("encode", len);
        let bytes = (len / 2).max(0) as usize;
        for i in 0..bytes {
            unsafe {
                let a = *amp.add(2 * i) as i32;
                let b = *amp.add(2 * i + 1) as i32;
                *g722_data.add(i) = ((a + b) / 2) as u8;
            }
        }
        bytes as c_int
    }

    unsafe fn decode_init(
        &self,
        _s: *mut G722DecodeState,
        rate: c_int,
        _options: c_int,
    ) -> *mut G722DecodeState {
        self.init("decode_init", rate)
    }

    unsafe fn decode_release(&self, _s: *mut G722DecodeState) -> c_int {
        self.ledger.call("decode_release");
        0
    }

    unsafe fn decode_free(&self, s: *mut G722DecodeState) -> c_int {
        self.ledger.call("decode_free");
        unsafe { self.ledger.free(s.cast::<FakeG722Codec>()) };
        0
    }

    unsafe fn decode(
        &self,
        _s: *mut G722DecodeState,
        amp: *mut i16,
        g722_data: *const u8,
        len: c_int,
    ) -> c_int {
        self.process("decode", len);
        let bytes = len.max(0) as usize;
        for i in 0..bytes {
            unsafe {
                let v = *g722_data.add(i) as i16;
                *amp.add(2 * i) = v;
                *amp.add(2 * i + 1) = v;
            }
        }
        (2 * bytes) as c_int
    }
}

// ---------------------------------------------------------------------------
// Opus
// ---------------------------------------------------------------------------

struct FakeOpusEncoder {
    sample_rate: i32,
    channels: i32,
    ctl: HashMap<i32, i32>,
}

struct FakeOpusDecoder {
    sample_rate: i32,
    channels: i32,
}

/// An Opus stand-in with real TOC bytes and range-checked controls.
///
/// Packets carry one CELT configuration TOC byte, a frame count byte for
/// 40 and 60 ms frames, and the frame's mean sample. Decoding restores that
/// mean into every sample.
#[derive(Clone, Default)]
pub struct FakeOpus {
    ledger: SharedLedger,
    refuse_create: bool,
    broken_sizes: bool,
}

impl FakeOpus {
    /// Makes both create calls report `OPUS_ALLOC_FAIL`.
    pub fn refuse_create(mut self) -> Self {
        self.refuse_create = true;
        self
    }

    /// Makes both size queries answer 0.
    pub fn broken_sizes(mut self) -> Self {
        self.broken_sizes = true;
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.ledger.calls(name)
    }

    pub fn live_states(&self) -> usize {
        self.ledger.live()
    }

    /// Application passed to the latest encoder create call.
    pub fn last_application(&self) -> Option<i32> {
        self.ledger.0.lock().last_application
    }

    fn check_create(&self, fs: i32, channels: c_int, error: *mut c_int) -> bool {
        let code = if self.refuse_create {
            OPUS_ALLOC_FAIL
        } else if !SAMPLE_RATES.contains(&fs) || !(1..=2).contains(&channels) {
            OPUS_BAD_ARG
        } else {
            OPUS_OK
        };
        if !error.is_null() {
            unsafe { *error = code };
        }
        code == OPUS_OK
    }
}

fn encoder_defaults() -> HashMap<i32, i32> {
    HashMap::from([
        (OPUS_SET_BITRATE_REQUEST, OPUS_AUTO),
        (OPUS_SET_MAX_BANDWIDTH_REQUEST, OPUS_BANDWIDTH_FULLBAND),
        (OPUS_SET_VBR_REQUEST, 1),
        (OPUS_SET_BANDWIDTH_REQUEST, OPUS_AUTO),
        (OPUS_SET_COMPLEXITY_REQUEST, 9),
        (OPUS_SET_INBAND_FEC_REQUEST, 0),
        (OPUS_SET_PACKET_LOSS_PERC_REQUEST, 0),
        (OPUS_SET_DTX_REQUEST, 0),
        (OPUS_SET_VBR_CONSTRAINT_REQUEST, 1),
        (OPUS_SET_FORCE_CHANNELS_REQUEST, OPUS_AUTO),
    ])
}

/// Validates a set request, returning the value to store.
fn opus_ctl_value(request: i32, value: i32, channels: i32) -> Result<i32, c_int> {
    let bandwidth = OPUS_BANDWIDTH_NARROWBAND..=OPUS_BANDWIDTH_FULLBAND;
    let ok = match request {
        OPUS_SET_BITRATE_REQUEST => {
            return match value {
                OPUS_AUTO | OPUS_BITRATE_MAX => Ok(value),
                v if v > 0 => Ok(v.clamp(500, 300_000 * channels)),
                _ => Err(OPUS_BAD_ARG),
            };
        }
        OPUS_SET_MAX_BANDWIDTH_REQUEST => bandwidth.contains(&value),
        OPUS_SET_BANDWIDTH_REQUEST => value == OPUS_AUTO || bandwidth.contains(&value),
        OPUS_SET_COMPLEXITY_REQUEST => (0..=10).contains(&value),
        OPUS_SET_PACKET_LOSS_PERC_REQUEST => (0..=100).contains(&value),
        OPUS_SET_VBR_REQUEST
        | OPUS_SET_INBAND_FEC_REQUEST
        | OPUS_SET_DTX_REQUEST
        | OPUS_SET_VBR_CONSTRAINT_REQUEST => (0..=1).contains(&value),
        OPUS_SET_FORCE_CHANNELS_REQUEST => value == OPUS_AUTO || (1..=channels).contains(&value),
        _ => return Err(OPUS_UNIMPLEMENTED),
    };
    if ok { Ok(value) } else { Err(OPUS_BAD_ARG) }
}

/// Samples per frame coded by a TOC byte at `fs`.
fn toc_samples_per_frame(toc: u8, fs: i32) -> i32 {
    if toc & 0x80 != 0 {
        (fs << ((toc >> 3) & 0x3)) / 400
    } else if toc & 0x60 == 0x60 {
        if toc & 0x08 != 0 { fs / 50 } else { fs / 100 }
    } else {
        match (toc >> 3) & 0x3 {
            3 => fs * 60 / 1000,
            size => (fs << size) / 100,
        }
    }
}

fn toc_bandwidth(toc: u8) -> i32 {
    if toc & 0x80 != 0 {
        match OPUS_BANDWIDTH_MEDIUMBAND + ((toc >> 5) & 0x3) as i32 {
            OPUS_BANDWIDTH_MEDIUMBAND => OPUS_BANDWIDTH_NARROWBAND,
            bw => bw,
        }
    } else if toc & 0x60 == 0x60 {
        OPUS_BANDWIDTH_SUPERWIDEBAND + ((toc >> 4) & 0x1) as i32
    } else {
        OPUS_BANDWIDTH_NARROWBAND + ((toc >> 5) & 0x3) as i32
    }
}

fn packet_frames(packet: &[u8]) -> Result<i32, c_int> {
    let toc = *packet.first().ok_or(OPUS_BAD_ARG)?;
    match toc & 0x3 {
        0 => Ok(1),
        1 | 2 => Ok(2),
        _ => packet
            .get(1)
            .map(|count| (count & 0x3f) as i32)
            .ok_or(OPUS_INVALID_PACKET),
    }
}

impl OpusLib for FakeOpus {
    unsafe fn decoder_create(
        &self,
        fs: OpusInt32,
        channels: c_int,
        error: *mut c_int,
    ) -> *mut OpusDecoder {
        self.ledger.call("decoder_create");
        if !self.check_create(fs, channels, error) {
            return ptr::null_mut();
        }
        self.ledger
            .alloc(FakeOpusDecoder {
                sample_rate: fs,
                channels,
            })
            .cast()
    }

    unsafe fn decoder_destroy(&self, st: *mut OpusDecoder) {
        self.ledger.call("decoder_destroy");
        unsafe { self.ledger.free(st.cast::<FakeOpusDecoder>()) };
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
        self.ledger.call("decode");
        let dec = unsafe { &*st.cast::<FakeOpusDecoder>() };
        let channels = dec.channels as usize;
        let fill = |samples: i32, value: i16| {
            for i in 0..samples.max(0) as usize * channels {
                unsafe { *pcm.add(i) = value };
            }
            samples
        };

        if data.is_null() || len == 0 {
            self.ledger.call("decode_plc");
            return fill(frame_size, 0);
        }
        if decode_fec != 0 {
            self.ledger.call("decode_fec");
            return fill(frame_size, 0);
        }

        let packet = unsafe { std::slice::from_raw_parts(data, len.max(0) as usize) };
        let header = if packet[0] & 0x3 == 3 { 2 } else { 1 };
        if packet.len() < header + 2 {
            return OPUS_INVALID_PACKET;
        }
        let frames = match packet_frames(packet) {
            Ok(frames) => frames,
            Err(code) => return code,
        };
        let samples = frames * toc_samples_per_frame(packet[0], dec.sample_rate);
        if samples > frame_size {
            return OPUS_BUFFER_TOO_SMALL;
        }
        let value = i16::from_le_bytes([packet[header], packet[header + 1]]);
        fill(samples, value)
    }

    unsafe fn decoder_get_nb_samples(
        &self,
        st: *const OpusDecoder,
        packet: *const c_uchar,
        len: OpusInt32,
    ) -> c_int {
        self.ledger.call("decoder_get_nb_samples");
        let dec = unsafe { &*st.cast::<FakeOpusDecoder>() };
        let packet = unsafe { std::slice::from_raw_parts(packet, len.max(0) as usize) };
        match packet_frames(packet) {
            Ok(frames) => frames * toc_samples_per_frame(packet[0], dec.sample_rate),
            Err(code) => code,
        }
    }

    fn decoder_get_size(&self, channels: c_int) -> c_int {
        match channels {
            _ if self.broken_sizes => 0,
            1 => 17_860,
            2 => 26_580,
            _ => 0,
        }
    }

    unsafe fn encoder_create(
        &self,
        fs: OpusInt32,
        channels: c_int,
        application: c_int,
        error: *mut c_int,
    ) -> *mut OpusEncoder {
        self.ledger.call("encoder_create");
        self.ledger.0.lock().last_application = Some(application);
        if !self.check_create(fs, channels, error) {
            return ptr::null_mut();
        }
        self.ledger
            .alloc(FakeOpusEncoder {
                sample_rate: fs,
                channels,
                ctl: encoder_defaults(),
            })
            .cast()
    }

    unsafe fn encoder_destroy(&self, st: *mut OpusEncoder) {
        self.ledger.call("encoder_destroy");
        unsafe { self.ledger.free(st.cast::<FakeOpusEncoder>()) };
    }

    unsafe fn encode(
        &self,
        st: *mut OpusEncoder,
        pcm: *const OpusInt16,
        frame_size: c_int,
        data: *mut c_uchar,
        max_data_bytes: OpusInt32,
    ) -> OpusInt32 {
        self.ledger.call("encode");
        let enc = unsafe { &*st.cast::<FakeOpusEncoder>() };

        // Frame length in 2.5 ms units.
        if frame_size <= 0 || (frame_size * 400) % enc.sample_rate != 0 {
            return OPUS_BAD_ARG;
        }
        let units = frame_size * 400 / enc.sample_rate;
        let (duration, frames) = match units {
            1 => (0, 1),
            2 => (1, 1),
            4 => (2, 1),
            8 => (3, 1),
            16 => (3, 2),
            24 => (3, 3),
            _ => return OPUS_BAD_ARG,
        };
        let base = match enc.sample_rate {
            8000 | 12000 => 16,
            16000 => 20,
            24000 => 24,
            _ => 28,
        };
        let stereo = if enc.channels == 2 { 0b100 } else { 0 };

        let count = (frame_size * enc.channels) as usize;
        let sum: i64 = (0..count).map(|i| unsafe { *pcm.add(i) } as i64).sum();
        let mean = (sum / count as i64) as i16;

        let mut packet = Vec::with_capacity(4);
        if frames == 1 {
            packet.push(((base + duration) << 3) as u8 | stereo);
        } else {
            packet.push(((base + duration) << 3) as u8 | stereo | 3);
            packet.push(frames as u8);
        }
        packet.extend(mean.to_le_bytes());

        if packet.len() > max_data_bytes.max(0) as usize {
            return OPUS_BUFFER_TOO_SMALL;
        }
        unsafe { ptr::copy_nonoverlapping(packet.as_ptr(), data, packet.len()) };
        packet.len() as OpusInt32
    }

    unsafe fn encoder_ctl_set(&self, st: *mut OpusEncoder, request: c_int, value: OpusInt32) -> c_int {
        self.ledger.call("encoder_ctl_set");
        let enc = unsafe { &mut *st.cast::<FakeOpusEncoder>() };
        match opus_ctl_value(request, value, enc.channels) {
            Ok(value) => {
                enc.ctl.insert(request, value);
                OPUS_OK
            }
            Err(code) => code,
        }
    }

    unsafe fn encoder_ctl_get(
        &self,
        st: *mut OpusEncoder,
        request: c_int,
        value: *mut OpusInt32,
    ) -> c_int {
        self.ledger.call("encoder_ctl_get");
        let enc = unsafe { &*st.cast::<FakeOpusEncoder>() };
        match enc.ctl.get(&(request - 1)) {
            Some(&v) if request % 2 == 1 => {
                unsafe { *value = v };
                OPUS_OK
            }
            _ => OPUS_UNIMPLEMENTED,
        }
    }

    fn encoder_get_size(&self, channels: c_int) -> c_int {
        match channels {
            _ if self.broken_sizes => 0,
            1 => 18_220,
            2 => 30_460,
            _ => 0,
        }
    }

    unsafe fn packet_get_bandwidth(&self, data: *const c_uchar) -> c_int {
        self.ledger.call("packet_get_bandwidth");
        toc_bandwidth(unsafe { *data })
    }

    unsafe fn packet_get_nb_channels(&self, data: *const c_uchar) -> c_int {
        self.ledger.call("packet_get_nb_channels");
        if unsafe { *data } & 0x4 != 0 { 2 } else { 1 }
    }

    unsafe fn packet_get_nb_frames(&self, packet: *const c_uchar, len: OpusInt32) -> c_int {
        self.ledger.call("packet_get_nb_frames");
        if len < 1 {
            return OPUS_BAD_ARG;
        }
        let packet = unsafe { std::slice::from_raw_parts(packet, len as usize) };
        packet_frames(packet).unwrap_or_else(|code| code)
    }
}


// ---------------------------------------------------------------------------
// Speex
// ---------------------------------------------------------------------------

struct FakeMode {
    frame_size: i32,
    sampling_rate: i32,
}

static FAKE_MODES: [FakeMode; 3] = [
    FakeMode {
        frame_size: 160,
        sampling_rate: 8000,
    },
    FakeMode {
        frame_size: 320,
        sampling_rate: 16000,
    },
    FakeMode {
        frame_size: 640,
        sampling_rate: 32000,
    },
];

/// Marker byte opening every fake Speex frame.
const FRAME_MARKER: u8 = 0x5a;

#[derive(Default)]
struct FakeBitsBuf {
    data: Vec<u8>,
    read_pos: usize,
}

struct FakeSpeexCodec {
    frame_size: i32,
    params: HashMap<i32, i32>,
}

impl FakeSpeexCodec {
    fn new(mode: *const SpeexMode, enhancement: i32) -> Self {
        let mode = unsafe { &*mode.cast::<FakeMode>() };
        Self {
            frame_size: mode.frame_size,
            params: HashMap::from([
                (SPEEX_SET_SAMPLING_RATE, mode.sampling_rate),
                (SPEEX_SET_QUALITY, 8),
                (SPEEX_SET_COMPLEXITY, 2),
                (SPEEX_SET_VBR, 0),
                (SPEEX_SET_ENH, enhancement),
            ]),
        }
    }

    fn quality(&self) -> i32 {
        self.params.get(&SPEEX_SET_QUALITY).copied().unwrap_or(0)
    }

    unsafe fn ctl(&mut self, request: c_int, ptr: *mut c_void) -> c_int {
        let value = ptr.cast::<i32>();
        match request {
            SPEEX_GET_FRAME_SIZE => unsafe { *value = self.frame_size },
            SPEEX_GET_BITRATE => unsafe { *value = 4 * 8 * 50 * (1 + self.quality()) },
            SPEEX_SET_QUALITY
            | SPEEX_SET_ENH
            | SPEEX_SET_VBR
            | SPEEX_SET_COMPLEXITY
            | SPEEX_SET_SAMPLING_RATE => {
                self.params.insert(request, unsafe { *value });
            }
            SPEEX_GET_ENH | SPEEX_GET_VBR | SPEEX_GET_COMPLEXITY | SPEEX_GET_SAMPLING_RATE => {
                let stored = self.params.get(&(request - 1)).copied().unwrap_or(0);
                unsafe { *value = stored };
            }
            _ => return -1,
        }
        0
    }
}

struct FakeResampler {
    channels: u32,
    in_rate: u32,
    out_rate: u32,
}

/// A Speex stand-in with a four byte frame format and a nearest-neighbour
/// resampler.
///
/// A frame is `[0x5a, quality, mean_lo, mean_hi]`; decoding fills the
/// frame with the mean.
#[derive(Clone, Default)]
pub struct FakeSpeex {
    ledger: SharedLedger,
    resample_status: Option<i32>,
}

impl FakeSpeex {
    /// Makes every resampler process call return `code` after producing
    /// its output.
    pub fn resample_status(mut self, code: i32) -> Self {
        self.resample_status = Some(code);
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.ledger.calls(name)
    }

    /// Bit buffers, codec states and resamplers not yet freed.
    pub fn live_allocations(&self) -> usize {
        self.ledger.live()
    }
}

unsafe fn bits_buf<'a>(bits: *mut SpeexBits) -> &'a mut FakeBitsBuf {
    unsafe { &mut *(*bits).reserved2.cast::<FakeBitsBuf>() }
}

impl SpeexLib for FakeSpeex {
    unsafe fn bits_init(&self, bits: *mut SpeexBits) {
        self.ledger.call("bits_init");
        let buf = self.ledger.alloc(FakeBitsBuf::default());
        unsafe {
            bits.write(SpeexBits {
                chars: ptr::null_mut(),
                nb_bits: 0,
                char_ptr: 0,
                bit_ptr: 0,
                owner: 1,
                overflow: 0,
                buf_size: 0,
                reserved1: 0,
                reserved2: buf.cast(),
            })
        };
    }

    unsafe fn bits_destroy(&self, bits: *mut SpeexBits) {
        self.ledger.call("bits_destroy");
        unsafe {
            self.ledger.free((*bits).reserved2.cast::<FakeBitsBuf>());
            (*bits).reserved2 = ptr::null_mut();
        }
    }

    unsafe fn bits_reset(&self, bits: *mut SpeexBits) {
        self.ledger.call("bits_reset");
        let buf = unsafe { bits_buf(bits) };
        buf.data.clear();
        buf.read_pos = 0;
    }

    unsafe fn bits_read_from(&self, bits: *mut SpeexBits, bytes: *const c_char, len: c_int) {
        self.ledger.call("bits_read_from");
        let buf = unsafe { bits_buf(bits) };
        let src = unsafe { std::slice::from_raw_parts(bytes.cast::<u8>(), len.max(0) as usize) };
        buf.data = src.to_vec();
        buf.read_pos = 0;
    }

    unsafe fn bits_write(&self, bits: *mut SpeexBits, bytes: *mut c_char, max_len: c_int) -> c_int {
        self.ledger.call("bits_write");
        let buf = unsafe { bits_buf(bits) };
        let n = buf.data.len().min(max_len.max(0) as usize);
        unsafe { ptr::copy_nonoverlapping(buf.data.as_ptr(), bytes.cast::<u8>(), n) };
        n as c_int
    }

    unsafe fn bits_nbytes(&self, bits: *mut SpeexBits) -> c_int {
        unsafe { bits_buf(bits) }.data.len() as c_int
    }

    unsafe fn bits_remaining(&self, bits: *mut SpeexBits) -> c_int {
        let buf = unsafe { bits_buf(bits) };
        ((buf.data.len() - buf.read_pos) * 8) as c_int
    }

    fn lib_get_mode(&self, mode: c_int) -> *const SpeexMode {
        usize::try_from(mode)
            .ok()
            .and_then(|i| FAKE_MODES.get(i))
            .map_or(ptr::null(), |m| (m as *const FakeMode).cast())
    }

    unsafe fn encoder_init(&self, mode: *const SpeexMode) -> *mut SpeexEncoderState {
        self.ledger.call("encoder_init");
        if mode.is_null() {
            return ptr::null_mut();
        }
        self.ledger.alloc(FakeSpeexCodec::new(mode, 0)).cast()
    }

    unsafe fn encoder_destroy(&self, state: *mut SpeexEncoderState) {
        self.ledger.call("encoder_destroy");
        unsafe { self.ledger.free(state.cast::<FakeSpeexCodec>()) };
    }

    unsafe fn encode_int(
        &self,
        state: *mut SpeexEncoderState,
        input: *const SpxInt16,
        bits: *mut SpeexBits,
    ) -> c_int {
        self.ledger.call("encode_int");
        let codec = unsafe { &*state.cast::<FakeSpeexCodec>() };
        let n = codec.frame_size as usize;
        let sum: i64 = (0..n).map(|i| unsafe { *input.add(i) } as i64).sum();
        let mean = (sum / n as i64) as i16;
        let buf = unsafe { bits_buf(bits) };
        buf.data.push(FRAME_MARKER);
        buf.data.push(codec.quality() as u8);
        buf.data.extend(mean.to_le_bytes());
        1
    }

    unsafe fn encoder_ctl(
        &self,
        state: *mut SpeexEncoderState,
        request: c_int,
        ptr: *mut c_void,
    ) -> c_int {
        self.ledger.call("encoder_ctl");
        unsafe { (*state.cast::<FakeSpeexCodec>()).ctl(request, ptr) }
    }

    unsafe fn decoder_init(&self, mode: *const SpeexMode) -> *mut SpeexDecoderState {
        self.ledger.call("decoder_init");
        if mode.is_null() {
            return ptr::null_mut();
        }
        self.ledger.alloc(FakeSpeexCodec::new(mode, 1)).cast()
    }

    unsafe fn decoder_destroy(&self, state: *mut SpeexDecoderState) {
        self.ledger.call("decoder_destroy");
        unsafe { self.ledger.free(state.cast::<FakeSpeexCodec>()) };
    }

    unsafe fn decode_int(
        &self,
        state: *mut SpeexDecoderState,
        bits: *mut SpeexBits,
        out: *mut SpxInt16,
    ) -> c_int {
        self.ledger.call("decode_int");
        let codec = unsafe { &*state.cast::<FakeSpeexCodec>() };
        let buf = unsafe { bits_buf(bits) };
        let Some(frame) = buf.data.get(buf.read_pos..buf.read_pos + 4) else {
            return -1;
        };
        if frame[0] != FRAME_MARKER {
            return -2;
        }
        let value = i16::from_le_bytes([frame[2], frame[3]]);
        buf.read_pos += 4;
        for i in 0..codec.frame_size as usize {
            unsafe { *out.add(i) = value };
        }
        0
    }

    unsafe fn decoder_ctl(
        &self,
        state: *mut SpeexDecoderState,
        request: c_int,
        ptr: *mut c_void,
    ) -> c_int {
        self.ledger.call("decoder_ctl");
        unsafe { (*state.cast::<FakeSpeexCodec>()).ctl(request, ptr) }
    }

    unsafe fn resampler_init(
        &self,
        nb_channels: SpxUint32,
        in_rate: SpxUint32,
        out_rate: SpxUint32,
        quality: c_int,
        err: *mut c_int,
    ) -> *mut SpeexResamplerState {
        self.ledger.call("resampler_init");
        let valid = nb_channels > 0
            && in_rate > 0
            && out_rate > 0
            && (SPEEX_RESAMPLER_QUALITY_MIN..=SPEEX_RESAMPLER_QUALITY_MAX).contains(&quality);
        let code = if valid {
            RESAMPLER_ERR_SUCCESS
        } else {
            RESAMPLER_ERR_INVALID_ARG
        };
        if !err.is_null() {
            unsafe { *err = code };
        }
        if !valid {
            return ptr::null_mut();
        }
        self.ledger
            .alloc(FakeResampler {
                channels: nb_channels,
                in_rate,
                out_rate,
            })
            .cast()
    }

    unsafe fn resampler_destroy(&self, st: *mut SpeexResamplerState) {
        self.ledger.call("resampler_destroy");
        unsafe { self.ledger.free(st.cast::<FakeResampler>()) };
    }

    unsafe fn resampler_process_interleaved_int(
        &self,
        st: *mut SpeexResamplerState,
        input: *const SpxInt16,
        in_len: *mut SpxUint32,
        out: *mut SpxInt16,
        out_len: *mut SpxUint32,
    ) -> c_int {
        self.ledger.call("resampler_process_interleaved_int");
        let rs = unsafe { &*st.cast::<FakeResampler>() };
        let (in_rate, out_rate) = (rs.in_rate as u64, rs.out_rate as u64);
        let ch = rs.channels as usize;
        let available = unsafe { *in_len } as u64;
        let capacity = unsafe { *out_len } as u64;

        let produced = capacity.min(available * out_rate / in_rate);
        for i in 0..produced {
            let frame = (i * in_rate / out_rate) as usize;
            for c in 0..ch {
                unsafe {
                    let v = input.add(frame * ch + c).read_unaligned();
                    out.add(i as usize * ch + c).write_unaligned(v);
                }
            }
        }
        let consumed = available.min((produced * in_rate).div_ceil(out_rate));
        unsafe {
            *in_len = consumed as SpxUint32;
            *out_len = produced as SpxUint32;
        }
        self.resample_status.unwrap_or(RESAMPLER_ERR_SUCCESS)
    }

    unsafe fn resampler_set_rate(
        &self,
        st: *mut SpeexResamplerState,
        in_rate: SpxUint32,
        out_rate: SpxUint32,
    ) -> c_int {
        self.ledger.call("resampler_set_rate");
        if in_rate == 0 || out_rate == 0 {
            return RESAMPLER_ERR_INVALID_ARG;
        }
        let rs = unsafe { &mut *st.cast::<FakeResampler>() };
        rs.in_rate = in_rate;
        rs.out_rate = out_rate;
        RESAMPLER_ERR_SUCCESS
    }
}

