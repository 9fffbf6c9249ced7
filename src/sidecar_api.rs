//! Operations offered to the UI process: capability listing, option
//! mutation, probing, command preview and conversion.

use std::sync::Arc;

use crate::config::Settings;
use crate::encoder::{CRF_VALUES, EncoderInfo, EncoderKind, FRAME_RATES, TUNES, encoder_infos};
use crate::error::AppError;
use crate::ffmpeg::{
    MediaProbeResult, ProcessOutput, ProcessRunner, build_ffmpeg_command, exec_args,
    format_args_for_display_multiline, join_command_line, output_file_path, parse_ffmpeg_error,
    probe_media,
};
use crate::job::{JobGuard, run_transcode_async};
use crate::options::{EncodingDefaults, OptionSet};

pub const PROTOCOL_VERSION: u8 = 1;

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCapabilitiesResult {
    pub protocol_version: u8,
    pub encoders: Vec<EncoderInfo>,
    pub frame_rates: &'static [&'static str],
    pub crf_values: &'static [&'static str],
    pub tunes: &'static [&'static str],
    pub defaults: EncodingDefaults,
}

#[derive(Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedValues {
    pub presets: &'static [&'static str],
    pub profiles: &'static [&'static str],
    pub extra_params_applicable: bool,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandPreview {
    pub args: Vec<String>,
    pub command_line: String,
    pub display: String,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertReport {
    pub exit_code: i32,
    pub success: bool,
    /// Set for failed runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub output: String,
}

impl From<ProcessOutput> for ConvertReport {
    fn from(out: ProcessOutput) -> Self {
        let success = out.success();
        let summary =
            (!success).then(|| parse_ffmpeg_error(&out.output, Some(out.exit_code)).summary);
        Self {
            exit_code: out.exit_code,
            success,
            summary,
            output: out.output,
        }
    }
}

pub fn app_capabilities(settings: &Settings) -> AppCapabilitiesResult {
    AppCapabilitiesResult {
        protocol_version: PROTOCOL_VERSION,
        encoders: encoder_infos(),
        frame_rates: FRAME_RATES,
        crf_values: CRF_VALUES,
        tunes: TUNES,
        defaults: settings.defaults.clone(),
    }
}

pub fn allowed_values(options: &OptionSet) -> AllowedValues {
    AllowedValues {
        presets: options.allowed_presets(),
        profiles: options.allowed_profiles(),
        extra_params_applicable: options.extra_params_applicable(),
    }
}

pub fn set_encoder(mut options: OptionSet, encoder: EncoderKind) -> OptionSet {
    options.set_encoder(encoder);
    options
}

pub fn probe(runner: &dyn ProcessRunner, settings: &Settings, input_path: &str) -> MediaProbeResult {
    probe_media(runner, &settings.ffprobe_path, input_path)
}

fn log_build(input_path: &str, output_directory: &str, options: &OptionSet) {
    if !options.encoder.has_codec_mapping() {
        log::warn!(
            target: "ffcmd::sidecar",
            "No codec mapping for {}; using {}",
            options.encoder.label(),
            options.codec_id()
        );
    }
    log::debug!(
        target: "ffcmd::sidecar",
        "Building FFmpeg command: codec={}, CRF={}, preset={}, input={} -> output={}",
        options.codec_id(),
        options.crf,
        options.preset,
        input_path,
        output_file_path(output_directory, &options.output_file_name)
    );
}

pub fn preview_command(
    input_path: &str,
    output_directory: &str,
    options: &OptionSet,
) -> CommandPreview {
    log_build(input_path, output_directory, options);
    let args = build_ffmpeg_command(
        input_path,
        output_directory,
        &options.output_file_name,
        options,
    );
    CommandPreview {
        command_line: join_command_line(&args),
        display: format_args_for_display_multiline(&args),
        args,
    }
}

/// Validate, build and run one transcode. A launch failure is an error; a
/// non-zero exit is a report with `success == false`.
pub async fn convert(
    runner: Arc<dyn ProcessRunner>,
    settings: &Settings,
    guard: JobGuard,
    input_path: &str,
    output_directory: &str,
    options: &OptionSet,
) -> Result<ConvertReport, AppError> {
    options.validate()?;
    log_build(input_path, output_directory, options);
    let args = build_ffmpeg_command(
        input_path,
        output_directory,
        &options.output_file_name,
        options,
    );
    log::info!(
        target: "ffcmd::sidecar",
        "Converting: {}",
        join_command_line(&args)
    );
    let program = settings.ffmpeg_program().to_path_buf();
    let output = run_transcode_async(runner, guard, program, exec_args(&args)).await?;
    Ok(ConvertReport::from(output))
}
