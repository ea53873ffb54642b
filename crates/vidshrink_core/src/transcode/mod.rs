//! Compression of one selected file and publication of the result.

mod artifact;
mod command;
mod filename;
mod invoker;

pub use artifact::{save_artifact, ArtifactStore, OutputArtifact, PublishError};
pub use command::{
    command_line, COMPRESS_ARGS, INPUT_NAME, OUTPUT_MIME, OUTPUT_NAME, PRESET, SCALE_FILTER,
    VIDEO_BITRATE, VIDEO_CODEC,
};
pub use filename::{download_file_name, COMPRESSED_SUFFIX, FALLBACK_DOWNLOAD_NAME};
pub use invoker::{run, TranscodeError, TranscodeOutcome, TranscodeReport};
