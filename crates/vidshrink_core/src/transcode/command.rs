//! The fixed compression command.
//!
//! This argument vector is the whole contract with the engine. It never
//! contains anything derived from the user's file: the input is always
//! staged as `input.mp4`, whatever its real container, and the engine
//! sniffs the actual format.

/// Staging name of the source video.
pub const INPUT_NAME: &str = "input.mp4";

/// Staging name the engine writes the result to.
pub const OUTPUT_NAME: &str = "output.mp4";

/// Content type of every published result.
pub const OUTPUT_MIME: &str = "video/mp4";

pub const VIDEO_CODEC: &str = "libx264";
pub const VIDEO_BITRATE: &str = "2000k";
/// Height fixed at 1280, width follows the aspect ratio rounded to even.
pub const SCALE_FILTER: &str = "scale=-2:1280";
pub const PRESET: &str = "fast";

/// Complete engine arguments for one compression run.
pub const COMPRESS_ARGS: [&str; 11] = [
    "-i",
    INPUT_NAME,
    "-vcodec",
    VIDEO_CODEC,
    "-b:v",
    VIDEO_BITRATE,
    "-vf",
    SCALE_FILTER,
    "-preset",
    PRESET,
    OUTPUT_NAME,
];

/// Display form of the command for logs.
pub fn command_line() -> String {
    COMPRESS_ARGS.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_vector_is_verbatim() {
        assert_eq!(
            COMPRESS_ARGS,
            [
                "-i",
                "input.mp4",
                "-vcodec",
                "libx264",
                "-b:v",
                "2000k",
                "-vf",
                "scale=-2:1280",
                "-preset",
                "fast",
                "output.mp4",
            ]
        );
    }

    #[test]
    fn command_line_matches_vector() {
        assert_eq!(
            command_line(),
            "-i input.mp4 -vcodec libx264 -b:v 2000k -vf scale=-2:1280 -preset fast output.mp4"
        );
    }
}
