pub mod config;
pub mod encoder;
pub mod error;
pub mod ffmpeg;
pub mod job;
pub mod options;
pub mod sidecar_api;
#[cfg(test)]
mod test_support;

pub use encoder::EncoderKind;
pub use options::{EncodingDefaults, OptionSet};
