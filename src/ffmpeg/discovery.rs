use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use crate::error::AppError;

/// Fixed location of the probe tool when nothing better is found.
pub const FALLBACK_FFPROBE_PATH: &str = "/usr/local/bin/ffprobe";

fn find_in_path(tool: &str) -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let finder = "where";
    #[cfg(not(target_os = "windows"))]
    let finder = "which";

    let output = Command::new(finder).arg(tool).output().ok()?;
    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout);
        let first = path.lines().next()?.trim();
        if !first.is_empty() {
            return Some(PathBuf::from(first));
        }
    }
    None
}

fn common_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/opt/homebrew/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/opt/local/bin/ffmpeg"),
        ]
    }

    #[cfg(target_os = "windows")]
    {
        vec![
            PathBuf::from("C:\\ffmpeg\\bin\\ffmpeg.exe"),
            PathBuf::from("C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe"),
        ]
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", unix)))]
    {
        vec![]
    }
}

static FFMPEG_PATH_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Path from an env override, if it names an existing file.
fn env_override(var: &str) -> Option<PathBuf> {
    let p = PathBuf::from(std::env::var_os(var)?);
    if p.exists() {
        log::debug!(
            target: "ffcmd::ffmpeg::discovery",
            "{} path from env: {}",
            var,
            p.display()
        );
        Some(p)
    } else {
        log::warn!(
            target: "ffcmd::ffmpeg::discovery",
            "{} points at missing file {}; ignoring",
            var,
            p.display()
        );
        None
    }
}

/// Uncached ffmpeg lookup: FFMPEG_PATH, common install paths, then PATH.
pub fn resolve_ffmpeg_path() -> Result<PathBuf, AppError> {
    if let Some(p) = env_override("FFMPEG_PATH") {
        return Ok(p);
    }

    for path in common_paths() {
        if path.exists() {
            log::debug!(
                target: "ffcmd::ffmpeg::discovery",
                "FFmpeg found in common path: {}",
                path.display()
            );
            return Ok(path);
        }
    }

    if let Some(p) = find_in_path("ffmpeg").filter(|p| p.exists()) {
        log::debug!(
            target: "ffcmd::ffmpeg::discovery",
            "FFmpeg found in PATH: {}",
            p.display()
        );
        return Ok(p);
    }

    log::error!(
        target: "ffcmd::ffmpeg::discovery",
        "FFmpeg not found in PATH or common locations"
    );
    Err(AppError::ToolNotFound(
        "FFmpeg not found. Please install FFmpeg on your system:\n  - macOS: brew install ffmpeg\n  - Linux: sudo apt install ffmpeg\n  - Windows: Download from https://ffmpeg.org/download.html"
            .to_string(),
    ))
}

/// Get FFmpeg path. Cached for process lifetime once found.
pub fn get_ffmpeg_path() -> Result<&'static Path, AppError> {
    if let Some(path) = FFMPEG_PATH_CACHE.get() {
        return Ok(path.as_path());
    }
    let path = resolve_ffmpeg_path()?;
    Ok(FFMPEG_PATH_CACHE.get_or_init(|| path).as_path())
}

/// Paths to try for ffprobe given an ffmpeg binary path (suffixed first, then plain).
pub fn ffprobe_candidates(ffmpeg_path: &Path) -> Vec<PathBuf> {
    let parent = match ffmpeg_path.parent() {
        Some(p) => p,
        None => return vec![],
    };
    let mut candidates = Vec::with_capacity(2);
    let suffix = ffmpeg_path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| stem.strip_prefix("ffmpeg"))
        .filter(|suffix| !suffix.is_empty());
    if let Some(suffix) = suffix {
        #[cfg(target_os = "windows")]
        candidates.push(parent.join(format!("ffprobe{suffix}.exe")));
        #[cfg(not(target_os = "windows"))]
        candidates.push(parent.join(format!("ffprobe{suffix}")));
    }
    #[cfg(target_os = "windows")]
    candidates.push(parent.join("ffprobe.exe"));
    #[cfg(not(target_os = "windows"))]
    candidates.push(parent.join("ffprobe"));
    candidates
}

/// Resolve ffprobe: FFPROBE_PATH, next to `ffmpeg` when known, then the fixed
/// fallback location. Never fails; a missing binary surfaces as a launch error
/// at probe time, which probing turns into default metadata.
pub fn resolve_ffprobe_path(ffmpeg: Option<&Path>) -> PathBuf {
    if let Some(p) = env_override("FFPROBE_PATH") {
        return p;
    }
    if let Some(found) = ffmpeg
        .map(ffprobe_candidates)
        .unwrap_or_default()
        .into_iter()
        .find(|c| c.exists())
    {
        log::debug!(
            target: "ffcmd::ffmpeg::discovery",
            "ffprobe found next to FFmpeg: {}",
            found.display()
        );
        return found;
    }
    PathBuf::from(FALLBACK_FFPROBE_PATH)
}
