//! Settings resolved once at startup: tool locations and encoding defaults.

use std::path::{Path, PathBuf};

use crate::ffmpeg::discovery::{get_ffmpeg_path, resolve_ffprobe_path};
use crate::options::{EncodingDefaults, OptionSet};

#[derive(Debug, Clone)]
pub struct Settings {
    /// `None` when ffmpeg could not be located; converting then fails with a launch error.
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: PathBuf,
    pub defaults: EncodingDefaults,
}

impl Settings {
    /// Reads `FFMPEG_PATH` / `FFPROBE_PATH`, falling back to discovery.
    pub fn from_env() -> Self {
        let ffmpeg_path = match get_ffmpeg_path() {
            Ok(p) => Some(p.to_path_buf()),
            Err(e) => {
                log::warn!(target: "ffcmd::config", "{}", e);
                None
            }
        };
        let ffprobe_path = resolve_ffprobe_path(ffmpeg_path.as_deref());
        log::info!(
            target: "ffcmd::config",
            "ffmpeg={:?}, ffprobe={}",
            ffmpeg_path,
            ffprobe_path.display()
        );
        Self {
            ffmpeg_path,
            ffprobe_path,
            defaults: EncodingDefaults::default(),
        }
    }

    pub fn with_paths(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: Some(ffmpeg_path.into()),
            ffprobe_path: ffprobe_path.into(),
            defaults: EncodingDefaults::default(),
        }
    }

    /// Program to launch for a transcode. Falls back to the bare executable
    /// name so a missing install surfaces as a launch error.
    pub fn ffmpeg_program(&self) -> &Path {
        self.ffmpeg_path
            .as_deref()
            .unwrap_or(Path::new(crate::ffmpeg::FFMPEG_EXECUTABLE))
    }

    pub fn new_options(&self) -> OptionSet {
        OptionSet::new(&self.defaults)
    }
}
