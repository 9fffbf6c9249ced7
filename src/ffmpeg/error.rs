//! Turn a failed transcode (exit code + captured output) into a short summary for the UI.
//!
//! Exit codes are from ffmpeg.c: 1 (general), 69 (rate exceeded),
//! 123 (hard exit), 255 (signal). -1 is used for spawn failure and
//! 128 + N for a child killed by signal N.
//! The captured output is kept as detail.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::runner::SIGNAL_EXIT_BASE;

static ERROR_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(error|invalid|unknown encoder|unrecognized option|no such file|not found|permission denied)")
        .expect("invalid error line regex")
});

const ELLIPSIS: &str = "…";
const SUMMARY_MAX_LEN: usize = 120;

/// Failure payload. Frontend shows summary; detail is expandable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FfmpegErrorPayload {
    pub summary: String,
    pub detail: String,
}

pub fn parse_ffmpeg_error(output: &str, exit_code: Option<i32>) -> FfmpegErrorPayload {
    let summary = match exit_code.and_then(known_exit_code_summary) {
        Some(msg) => match error_line(output) {
            Some(line) => format!("{} {}", msg, truncated(line, SUMMARY_MAX_LEN)),
            None => msg,
        },
        None => match (error_line(output), exit_code) {
            (Some(line), _) => truncated(line, SUMMARY_MAX_LEN),
            (None, Some(code)) => format!("FFmpeg failed (exit code {}).", code),
            (None, None) => truncated(first_line(output), SUMMARY_MAX_LEN),
        },
    };
    let detail = output.trim().to_string();
    FfmpegErrorPayload { summary, detail }
}

/// Highest signal number mapped to `SIGNAL_EXIT_BASE + N`.
const MAX_SIGNAL: i32 = 64;

fn known_exit_code_summary(code: i32) -> Option<String> {
    let msg = match code {
        -1 => "FFmpeg not found or failed to start.",
        1 => "FFmpeg failed.",
        69 => "Encoding rate limit exceeded.",
        123 | 255 => "Encoding was stopped.",
        c if (SIGNAL_EXIT_BASE + 1..=SIGNAL_EXIT_BASE + MAX_SIGNAL).contains(&c) => {
            return Some(format!(
                "Encoding was stopped (signal {}).",
                c - SIGNAL_EXIT_BASE
            ));
        }
        _ => return None,
    };
    Some(msg.to_string())
}

/// Last line that looks like an error report. ffmpeg prints the fatal one last.
fn error_line(output: &str) -> Option<&str> {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty() && ERROR_LINE_RE.is_match(l))
}

fn first_line(output: &str) -> &str {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

/// Truncate to max_len bytes on a char boundary, adding "…" if truncated.
fn truncated(line: &str, max_len: usize) -> String {
    if line.len() <= max_len {
        return line.to_string();
    }
    let mut end = max_len.saturating_sub(ELLIPSIS.len());
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &line[..end], ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_1() {
        let p = parse_ffmpeg_error("", Some(1));
        assert_eq!(p.summary, "FFmpeg failed.");
    }

    #[test]
    fn exit_code_1_appends_error_line() {
        let output = "ffmpeg version 7.0\nInput #0, mov\nUnknown encoder 'libx265'\n";
        let p = parse_ffmpeg_error(output, Some(1));
        assert_eq!(p.summary, "FFmpeg failed. Unknown encoder 'libx265'");
        assert!(p.detail.starts_with("ffmpeg version"));
    }

    #[test]
    fn exit_code_255() {
        let p = parse_ffmpeg_error("", Some(255));
        assert_eq!(p.summary, "Encoding was stopped.");
    }

    #[test]
    fn exit_code_minus_one() {
        let p = parse_ffmpeg_error("", Some(-1));
        assert!(p.summary.contains("not found") || p.summary.contains("start"));
    }

    #[test]
    fn killed_by_signal_is_stopped_not_launch_failure() {
        let p = parse_ffmpeg_error("working\n", Some(SIGNAL_EXIT_BASE + 9));
        assert_eq!(p.summary, "Encoding was stopped (signal 9).");
        assert!(!p.summary.contains("not found"));
        assert_eq!(p.detail, "working");
    }

    #[test]
    fn signal_summary_keeps_error_line() {
        let p = parse_ffmpeg_error("Error writing trailer\n", Some(SIGNAL_EXIT_BASE + 15));
        assert_eq!(
            p.summary,
            "Encoding was stopped (signal 15). Error writing trailer"
        );
    }

    #[test]
    fn unknown_code_prefers_error_line() {
        let p = parse_ffmpeg_error(
            "frame=  10\n/in/a.mov: Invalid data found when processing input\n",
            Some(42),
        );
        assert_eq!(
            p.summary,
            "/in/a.mov: Invalid data found when processing input"
        );
    }

    #[test]
    fn unknown_code_no_output() {
        let p = parse_ffmpeg_error("", Some(99));
        assert_eq!(p.summary, "FFmpeg failed (exit code 99).");
    }

    #[test]
    fn no_code_uses_first_line() {
        let p = parse_ffmpeg_error("Some random message\nSecond line", None);
        assert_eq!(p.summary, "Some random message");
    }

    #[test]
    fn long_line_truncated() {
        let long = "é".repeat(150);
        let p = parse_ffmpeg_error(&long, None);
        assert!(p.summary.len() <= SUMMARY_MAX_LEN);
        assert!(p.summary.ends_with('…'));
    }
}
