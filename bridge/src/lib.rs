//! Foreign-function bridge to the G.722, Opus and Speex native codecs.
//!
//! Each codec family is exposed at two levels:
//!
//! - a `Bridge` forwarding one call per native function, with state passed
//!   around as typed [`Handle`]s and bulk data pinned through the
//!   [`gateway`];
//! - owned `Encoder`/`Decoder` types (and a Speex `Resampler`) that manage
//!   one handle each and release it on drop.
//!
//! The native libraries sit behind the [`g722::G722Lib`], [`opus::OpusLib`]
//! and [`speex::SpeexLib`] traits. The linked implementations are compiled
//! in with the `g722`, `opus` and `speex` features (`native` enables all
//! three).
//!
//! # Usage
//!
//! ```ignore
//! use codec_bridge::{g722, opus};
//!
//! let mut enc = g722::Encoder::new(g722::Bridge::native())?;
//! let payload = enc.encode_to_vec(&pcm)?;
//!
//! let bridge = opus::Bridge::native();
//! opus::assert_functional(&bridge)?;
//! let mut dec = opus::Decoder::new(bridge, 48000, 2)?;
//! let pcm = dec.decode(&packet)?;
//! ```
//!
//! # Thread Safety
//!
//! Bridges hold no state of their own. A handle must not be used from two
//! threads at once, the same rule the native libraries impose.

pub mod config;
pub mod g722;
pub mod gateway;
pub mod handle;
pub mod host;
pub mod opus;
pub mod speex;

#[cfg(test)]
mod testing;

pub use config::{BridgeConfig, ConfigError, load_config, save_config};
pub use gateway::{Pinnable, Pinned, PinnedPair, ReleaseMode, SliceSink, SliceSource, Writable};
pub use handle::{Handle, RawHandle};
pub use host::{Heap, ManagedArray, PinStats};
