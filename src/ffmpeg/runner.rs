//! External process spawning with merged output capture.
//!
//! Spawns the tool as a child process and blocks until it exits. Stdout and
//! stderr are drained on two reader threads into one shared buffer, line by
//! line, so the captured text interleaves the streams roughly as the child
//! wrote them. Nothing is streamed to the caller before exit, and nothing is
//! dropped: the whole output is kept until the child exits.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

#[cfg(windows)]
use std::os::windows::process::CommandExt;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::error::AppError;

/// Exit code for a child killed by signal N is `SIGNAL_EXIT_BASE + N`, as in POSIX shells.
pub const SIGNAL_EXIT_BASE: i32 = 128;

/// Captured result of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutput {
    pub output: String,
    /// `SIGNAL_EXIT_BASE + N` when the child was killed by signal N.
    pub exit_code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into `AppError::NonZeroExit`.
    pub fn into_success(self, program: &str) -> Result<String, AppError> {
        if self.success() {
            Ok(self.output)
        } else {
            Err(AppError::NonZeroExit {
                program: program.to_string(),
                code: self.exit_code,
                output: self.output,
            })
        }
    }
}

/// Synchronous process invocation. Blocks until the child exits.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, AppError>;
}

/// Runs real processes via `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

fn read_stream<R: Read + Send + 'static>(
    reader: R,
    sink: Arc<Mutex<Vec<u8>>>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut stream_reader = BufReader::new(reader);
        let mut line_buf = Vec::with_capacity(256);
        while stream_reader.read_until(b'\n', &mut line_buf).unwrap_or(0) > 0 {
            sink.lock().extend_from_slice(&line_buf);
            line_buf.clear();
        }
    })
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| SIGNAL_EXIT_BASE + sig))
        .unwrap_or(SIGNAL_EXIT_BASE)
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(SIGNAL_EXIT_BASE)
}

/// Decode captured bytes. Invalid UTF-8 is `AppError::Decode`.
pub fn decode_output(bytes: Vec<u8>) -> Result<String, AppError> {
    String::from_utf8(bytes).map_err(|_| AppError::Decode)
}

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, AppError> {
        let program_str = program.to_string_lossy();
        log::debug!(
            target: "ffcmd::ffmpeg::runner",
            "Spawning: path={}, args={}",
            program_str,
            args.len()
        );

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(windows)]
        cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
        let mut child = cmd
            .spawn()
            .map_err(|e| AppError::launch(program_str.to_string(), e))?;

        let captured = Arc::new(Mutex::new(Vec::new()));
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(read_stream(stdout, Arc::clone(&captured)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(read_stream(stderr, Arc::clone(&captured)));
        }
        for handle in readers {
            let _ = handle.join();
        }

        let status = child.wait()?;
        let exit_code = exit_code_of(status);
        let bytes = std::mem::take(&mut *captured.lock());
        let output = decode_output(bytes).unwrap_or_else(|e| {
            log::warn!(
                target: "ffcmd::ffmpeg::runner",
                "{}: {}; treating as empty output",
                program_str,
                e
            );
            String::new()
        });

        if status.success() {
            log::info!(
                target: "ffcmd::ffmpeg::runner",
                "{} completed successfully",
                program_str
            );
        } else {
            let err_preview = output
                .lines()
                .rev()
                .take(3)
                .collect::<Vec<_>>()
                .join("; ");
            log::error!(
                target: "ffcmd::ffmpeg::runner",
                "{} failed (code={}): {}",
                program_str,
                exit_code,
                err_preview
            );
        }

        Ok(ProcessOutput { output, exit_code })
    }
}
