//! CLI commands module.

mod check;
mod config;
mod g722;
mod opus;
mod resample;
mod speex;
mod util;

pub use check::CheckCommand;
pub use config::ConfigCommand;
pub use g722::G722Command;
pub use opus::OpusCommand;
pub use resample::ResampleCommand;
pub use speex::SpeexCommand;

pub(crate) use util::*;
