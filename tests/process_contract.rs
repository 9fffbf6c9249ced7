#![cfg(unix)]

mod support;

use std::path::Path;
use std::sync::Arc;

use ffcmd_core::config::Settings;
use ffcmd_core::ffmpeg::{
    MediaProbeResult, ProcessRunner, SIGNAL_EXIT_BASE, SystemRunner, probe_media,
};
use ffcmd_core::job::JobSlot;
use ffcmd_core::{EncoderKind, OptionSet, sidecar_api};
use serial_test::serial;
use support::FakeTools;

#[test]
#[serial]
fn probe_reads_real_process_output() {
    let tools = FakeTools::new();
    let ffprobe = tools.ffprobe(
        &["color_space=bt2020nc", "bit_depth=10", "display_aspect_ratio=16:9"],
        0,
    );
    let meta = probe_media(&SystemRunner, &ffprobe, "/in/a.mov");
    assert_eq!(meta.color_space, "bt2020nc");
    assert_eq!(meta.bit_depth, "10");
    assert_eq!(meta.aspect_ratio, "16:9");
    assert!(meta.is_hdr);
}

#[test]
#[serial]
fn probe_non_zero_exit_keeps_defaults() {
    let tools = FakeTools::new();
    let ffprobe = tools.ffprobe(&["color_space=bt709"], 1);
    let meta = probe_media(&SystemRunner, &ffprobe, "/in/a.mov");
    assert_eq!(meta, MediaProbeResult::default());
}

#[test]
fn probe_missing_tool_keeps_defaults() {
    let meta = probe_media(
        &SystemRunner,
        Path::new("/nonexistent/ffprobe"),
        "/in/a.mov",
    );
    assert_eq!(meta, MediaProbeResult::default());
}

#[tokio::test]
#[serial]
async fn convert_passes_unquoted_args_to_ffmpeg() {
    let tools = FakeTools::new();
    let ffmpeg = tools.ffmpeg("done", 0);
    let settings = Settings::with_paths(&ffmpeg, tools.path("ffprobe"));
    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);
    let slot = JobSlot::new();

    let mut options = OptionSet::default();
    options.set_encoder(EncoderKind::Hevc);
    options.hardware_acceleration = false;
    options.preset = "medium".into();
    options.profile = "main10".into();
    options.extra_encoder_params = "aud=1".into();
    options.output_file_name = "b c.mp4".into();

    let out_dir = tools.root().to_string_lossy().to_string();
    let report = sidecar_api::convert(
        runner,
        &settings,
        slot.begin().unwrap(),
        "/in/a b.mov",
        &out_dir,
        &options,
    )
    .await
    .unwrap();

    assert!(report.success);
    assert!(report.output.contains("frame=1"));
    assert!(report.output.contains("done"));

    let args = tools.recorded_args();
    assert_eq!(args[0], "-i");
    assert_eq!(args[1], "/in/a b.mov");
    assert!(args.contains(&"libx265".to_string()));
    assert!(args.contains(&"aud=1".to_string()));
    assert!(args.contains(&"hvc1".to_string()));
    assert_eq!(args.last().cloned(), Some(format!("{}/b c.mp4", out_dir)));
}

#[tokio::test]
#[serial]
async fn convert_surfaces_exit_code_and_output() {
    let tools = FakeTools::new();
    let ffmpeg = tools.ffmpeg("Error while opening encoder", 1);
    let settings = Settings::with_paths(&ffmpeg, tools.path("ffprobe"));
    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);
    let slot = JobSlot::new();

    let report = sidecar_api::convert(
        runner,
        &settings,
        slot.begin().unwrap(),
        "/in/a.mov",
        "/out",
        &OptionSet::default(),
    )
    .await
    .unwrap();

    assert!(!report.success);
    assert_eq!(report.exit_code, 1);
    assert!(report.output.contains("Error while opening encoder"));
    assert_eq!(
        report.summary.as_deref(),
        Some("FFmpeg failed. Error while opening encoder")
    );
}

#[tokio::test]
async fn convert_with_missing_ffmpeg_is_launch_error() {
    let settings = Settings::with_paths("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);
    let slot = JobSlot::new();
    let err = sidecar_api::convert(
        runner,
        &settings,
        slot.begin().unwrap(),
        "/in/a.mov",
        "/out",
        &OptionSet::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ffcmd_core::error::AppError::Launch { .. }));
    assert!(slot.current().is_none());
}

#[tokio::test]
#[serial]
async fn killed_transcode_reports_stopped_not_missing() {
    let tools = FakeTools::new();
    let ffmpeg = tools.script("ffmpeg", "echo 'frame=1 fps=0.0'\nkill -9 $$");
    let settings = Settings::with_paths(&ffmpeg, tools.path("ffprobe"));
    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);
    let slot = JobSlot::new();

    let report = sidecar_api::convert(
        runner,
        &settings,
        slot.begin().unwrap(),
        "/in/a.mov",
        "/out",
        &OptionSet::default(),
    )
    .await
    .unwrap();

    assert!(!report.success);
    assert_eq!(report.exit_code, SIGNAL_EXIT_BASE + 9);
    assert!(report.output.contains("frame=1"));
    assert_eq!(
        report.summary.as_deref(),
        Some("Encoding was stopped (signal 9).")
    );
}
