mod builder;
pub mod discovery;
mod error;
pub mod ffprobe;
mod runner;

pub use builder::{
    FFMPEG_EXECUTABLE, build_ffmpeg_command, exec_args, format_args_for_display_multiline,
    join_command_line, output_file_path,
};
pub use error::{FfmpegErrorPayload, parse_ffmpeg_error};
pub use ffprobe::{MediaProbeResult, parse_probe_output, probe_media};
pub use runner::{ProcessOutput, ProcessRunner, SIGNAL_EXIT_BASE, SystemRunner, decode_output};

