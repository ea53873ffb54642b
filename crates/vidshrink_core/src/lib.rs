//! vidshrink core - backend logic for the vidshrink video compressor
//!
//! This crate contains all business logic with zero UI dependencies:
//! loading the external ffmpeg engine, staging files into its private
//! workspace, running the fixed compression command and publishing the
//! result as a revocable artifact.

pub mod config;
pub mod engine;
pub mod logging;
pub mod session;
pub mod transcode;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
