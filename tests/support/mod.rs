#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Scratch directory holding fake `ffmpeg` / `ffprobe` shell scripts.
pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write an executable `/bin/sh` script named `name`.
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.path(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
        let mut perms = fs::metadata(&path).expect("script metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod script");
        path
    }

    /// Fake ffprobe printing the given lines and exiting with `code`.
    #[cfg(unix)]
    pub fn ffprobe(&self, lines: &[&str], code: i32) -> PathBuf {
        let body = lines
            .iter()
            .map(|l| format!("echo '{}'", l))
            .collect::<Vec<_>>()
            .join("\n");
        self.script("ffprobe", &format!("{}\nexit {}", body, code))
    }

    /// Fake ffmpeg that records its argv (one per line) next to itself.
    #[cfg(unix)]
    pub fn ffmpeg(&self, stderr_line: &str, code: i32) -> PathBuf {
        let log = self.path("ffmpeg-args.txt");
        self.script(
            "ffmpeg",
            &format!(
                "for a in \"$@\"; do echo \"$a\" >> '{}'; done\necho 'frame=1 fps=0.0'\necho '{}' 1>&2\nexit {}",
                log.display(),
                stderr_line,
                code
            ),
        )
    }

    pub fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(self.path("ffmpeg-args.txt"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}
