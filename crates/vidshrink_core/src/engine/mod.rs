//! The external transcoding engine.
//!
//! - [`load`] fetches, verifies and starts the pinned ffmpeg build
//! - [`EngineHandle`] owns the running instance and its staging area
//! - [`StagingFs`] is the engine's private name-addressed filesystem

mod assets;
mod error;
mod handle;
mod loader;
mod staging;

#[cfg(all(test, unix))]
pub(crate) mod testing;

pub use assets::{parse_digest, platform_asset_name, sha256_hex, EngineAssets, EnginePaths};
pub use error::{EngineError, EngineResult};
pub use handle::{EngineHandle, EngineLease, EngineOptions};
pub use loader::{ensure_engine, load};
pub use staging::{validate_name, StagingFs};
