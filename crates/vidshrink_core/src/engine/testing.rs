//! Shell-script stand-in for the engine, used by unit tests on Unix.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Behaves like the engine for the fixed compression command:
/// `-version` prints a banner, any other call copies `input.mp4` to the
/// last argument. Inputs containing `CORRUPT` fail, `SLOW` hangs.
const FAKE_ENGINE: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
  echo "ffmpeg version fake-engine"
  echo "configuration: test"
  exit 0
fi
for last in "$@"; do :; done
if [ ! -f input.mp4 ]; then
  echo "input.mp4: No such file or directory" >&2
  exit 1
fi
if grep -q CORRUPT input.mp4; then
  echo "input.mp4: Invalid data found when processing input" >&2
  exit 183
fi
if grep -q SLOW input.mp4; then
  exec sleep 30
fi
echo "args: $*" >&2
printf 'frame=    1 fps=0.0\rframe=    2 fps=0.0\r' >&2
cp input.mp4 "$last"
printf ' transcoded' >> "$last"
echo "video:1kB audio:0kB" >&2
"#;

pub(crate) fn write_fake_engine(dir: &Path) -> PathBuf {
    let path = dir.join("fake-ffmpeg.sh");
    std::fs::write(&path, FAKE_ENGINE).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
