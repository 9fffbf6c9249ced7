//! App error type for sidecar requests. Implements Display and Serialize for the frontend.

use crate::ffmpeg::parse_ffmpeg_error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    ToolNotFound(String),

    #[error("Failed to start {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process output was not valid UTF-8")]
    Decode,

    #[error("{program} failed (code {code}): {output}")]
    NonZeroExit {
        program: String,
        code: i32,
        output: String,
    },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Another job is already running")]
    Busy,

    #[error("{0}")]
    Request(String),
}

impl AppError {
    pub fn launch(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }

    /// Exit code reported to the UI. Launch failures use -1, like ffmpeg's own spawn convention.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            AppError::Launch { .. } | AppError::ToolNotFound(_) => Some(-1),
            AppError::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            AppError::NonZeroExit { code, output, .. } => {
                let payload = parse_ffmpeg_error(output, Some(*code));
                let json =
                    serde_json::json!({ "summary": payload.summary, "detail": payload.detail });
                serializer.serialize_str(&json.to_string())
            }
            _ => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Request(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}
