use crate::encoder::HEVC_CONTAINER_TAG;
use crate::options::OptionSet;

/// Executable name placed in the first token of a built command.
pub const FFMPEG_EXECUTABLE: &str = "ffmpeg";

fn quoted(value: &str) -> String {
    format!("\"{}\"", value)
}

/// `<dir>/<file>`, joined verbatim without normalizing separators.
pub fn output_file_path(output_directory: &str, output_file_name: &str) -> String {
    format!("{}/{}", output_directory, output_file_name)
}

/// Builds the ffmpeg token vector, executable name first and the output path last.
///
/// The input path, output path and `-vf` value carry literal double quotes as
/// part of the token text; the vector is meant to be joined into a shell
/// command line. Use [`exec_args`] to run it without a shell.
pub fn build_ffmpeg_command(
    input_path: &str,
    output_directory: &str,
    output_file_name: &str,
    options: &OptionSet,
) -> Vec<String> {
    let output_path = output_file_path(output_directory, output_file_name);
    let codec = options.codec_id();

    let video_filter = format!(
        "scale={}:{},pad={}:{}",
        options.frame_width, options.frame_height, options.pad_width, options.pad_height
    );

    let mut args = vec![
        FFMPEG_EXECUTABLE.to_string(),
        "-i".to_string(),
        quoted(input_path),
        "-c:v".to_string(),
        codec.to_string(),
        "-crf".to_string(),
        options.crf.clone(),
        "-preset".to_string(),
        options.preset.clone(),
        "-tune".to_string(),
        options.tune.clone(),
        "-profile:v".to_string(),
        options.profile.clone(),
        "-r".to_string(),
        options.frame_rate.clone(),
        "-vf".to_string(),
        quoted(&video_filter),
    ];

    if options.is_software_hevc() {
        if !options.extra_encoder_params.is_empty() {
            args.extend([
                "-x265-params".to_string(),
                quoted(&options.extra_encoder_params),
            ]);
        }
        args.extend(["-tag:v".to_string(), HEVC_CONTAINER_TAG.to_string()]);
    }

    args.push(quoted(&output_path));
    args
}

/// Joins the tokens with single spaces, as a shell would be handed them.
pub fn join_command_line(args: &[String]) -> String {
    args.join(" ")
}

/// Argument vector for direct execution: drops the executable token and the
/// literal quotes that only make sense to a shell.
pub fn exec_args(args: &[String]) -> Vec<String> {
    args.iter()
        .skip(1)
        .map(|a| {
            a.strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(a)
                .to_string()
        })
        .collect()
}

/// Formats args for readable display: option and value on the same line when the next arg is a value.
pub fn format_args_for_display_multiline(args: &[String]) -> String {
    if args.is_empty() {
        return String::new();
    }
    let mut lines = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        let line = if arg.starts_with('-')
            && i + 1 < args.len()
            && !args[i + 1].starts_with('-')
        {
            let value = &args[i + 1];
            i += 2;
            format!("  {} {}", arg, value)
        } else {
            i += 1;
            format!("  {}", arg)
        };
        lines.push(line);
    }
    lines.join("\n")
}
