//! FFprobe-based stream metadata (color space, bit depth, aspect ratio).
//!
//! Probing never fails from the caller's point of view: a missing tool, a
//! launch failure or a non-zero exit all yield the default result.

use std::path::Path;

use super::runner::ProcessRunner;

pub const UNKNOWN: &str = "Unknown";

const COLOR_SPACE_KEY: &str = "color_space";
const BIT_DEPTH_KEY: &str = "bit_depth";
const ASPECT_RATIO_KEY: &str = "display_aspect_ratio";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaProbeResult {
    pub color_space: String,
    pub bit_depth: String,
    pub aspect_ratio: String,
    #[serde(rename = "isHDR")]
    pub is_hdr: bool,
}

impl Default for MediaProbeResult {
    fn default() -> Self {
        Self {
            color_space: UNKNOWN.to_string(),
            bit_depth: UNKNOWN.to_string(),
            aspect_ratio: UNKNOWN.to_string(),
            is_hdr: false,
        }
    }
}

/// BT.2020 matrices are the only HDR signal available from these entries.
fn is_hdr_color_space(color_space: &str) -> bool {
    matches!(color_space, "bt2020nc" | "bt2020c")
}

pub fn probe_args(input_path: &str) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-show_entries".to_string(),
        format!(
            "stream={},{},{}",
            COLOR_SPACE_KEY, BIT_DEPTH_KEY, ASPECT_RATIO_KEY
        ),
        "-of".to_string(),
        "default=noprint_wrappers=1".to_string(),
        input_path.to_string(),
    ]
}

/// Parse `key=value` lines. Matching is by substring, so a line only has to
/// mention the key somewhere; each line feeds at most one field and later
/// lines overwrite earlier ones.
///
/// The value is the text after the last `=`. A line with an empty value such
/// as `bit_depth=` leaves the field at `"Unknown"`. It does not store `""`,
/// and it does not fall back to the text before the `=` (the key itself).
pub fn parse_probe_output(output: &str) -> MediaProbeResult {
    let mut result = MediaProbeResult::default();
    for line in output.lines() {
        let value = line.rsplit('=').next().unwrap_or("").trim();
        if value.is_empty() {
            continue;
        }
        let field = if line.contains(COLOR_SPACE_KEY) {
            &mut result.color_space
        } else if line.contains(BIT_DEPTH_KEY) {
            &mut result.bit_depth
        } else if line.contains(ASPECT_RATIO_KEY) {
            &mut result.aspect_ratio
        } else {
            continue;
        };
        *field = value.to_string();
    }
    result.is_hdr = is_hdr_color_space(&result.color_space);
    result
}

/// Run ffprobe on `input_path`. Degrades to [`MediaProbeResult::default`] on any failure.
pub fn probe_media(
    runner: &dyn ProcessRunner,
    ffprobe: &Path,
    input_path: &str,
) -> MediaProbeResult {
    log::debug!(
        target: "ffcmd::ffmpeg::ffprobe",
        "probe_media: path={}",
        input_path
    );

    let output = runner
        .run(ffprobe, &probe_args(input_path))
        .and_then(|out| out.into_success("ffprobe"));

    match output {
        Ok(text) => parse_probe_output(&text),
        Err(e) => {
            log::warn!(
                target: "ffcmd::ffmpeg::ffprobe",
                "ffprobe unavailable for {}: {}",
                input_path,
                e
            );
            MediaProbeResult::default()
        }
    }
}
