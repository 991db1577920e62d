//! G.722 wideband speech codec over spandsp.
//!
//! [`Bridge`] is the raw call surface: handles in, handles out, no typed
//! errors. [`Encoder`] and [`Decoder`] own a handle and close it on drop.

pub mod ffi;

mod bridge;
mod codec;

pub use bridge::*;
pub use codec::*;
pub use ffi::G722Lib;
#[cfg(feature = "g722")]
pub use ffi::SpanDsp;
