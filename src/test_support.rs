//! Canned `ProcessRunner` for unit tests.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::AppError;
use crate::ffmpeg::{ProcessOutput, ProcessRunner};

enum Outcome {
    Exit { code: i32, output: String },
    LaunchFailure,
}

pub struct FakeRunner {
    outcome: Outcome,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl FakeRunner {
    pub fn succeeding(output: &str) -> Self {
        Self::exiting(0, output)
    }

    pub fn exiting(code: i32, output: &str) -> Self {
        Self {
            outcome: Outcome::Exit {
                code,
                output: output.to_string(),
            },
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_to_launch() -> Self {
        Self {
            outcome: Outcome::LaunchFailure,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, AppError> {
        self.calls
            .lock()
            .push((program.to_path_buf(), args.to_vec()));
        match &self.outcome {
            Outcome::Exit { code, output } => Ok(ProcessOutput {
                output: output.clone(),
                exit_code: *code,
            }),
            Outcome::LaunchFailure => Err(AppError::launch(
                program.to_string_lossy().to_string(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            )),
        }
    }
}
