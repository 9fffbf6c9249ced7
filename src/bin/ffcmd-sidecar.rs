use std::io::{self, BufRead, Write};
use std::sync::Arc;

use ffcmd_core::config::Settings;
use ffcmd_core::error::AppError;
use ffcmd_core::ffmpeg::{ProcessRunner, SystemRunner, parse_ffmpeg_error};
use ffcmd_core::job::{ActiveJob, JobSlot};
use ffcmd_core::{EncoderKind, OptionSet, sidecar_api};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
struct RpcRequest {
    id: u64,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, serde::Serialize)]
struct RpcSuccess {
    id: u64,
    result: Value,
}

#[derive(Debug, serde::Serialize)]
struct RpcFailure {
    id: u64,
    error: RpcErrorPayload,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RpcErrorPayload {
    summary: String,
    detail: String,
}

#[derive(Debug, serde::Serialize)]
struct RpcEvent {
    event: String,
    payload: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsParams {
    #[serde(default)]
    options: OptionSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetEncoderParams {
    #[serde(default)]
    options: OptionSet,
    /// Encoder id or its picker label.
    encoder: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProbeParams {
    input_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandParams {
    input_path: String,
    output_directory: String,
    #[serde(default)]
    options: OptionSet,
}

/// Shared, immutable state for every request.
struct Context {
    settings: Settings,
    runner: Arc<dyn ProcessRunner>,
    jobs: JobSlot,
}

type SharedWriter = Arc<Mutex<io::Stdout>>;

fn write_json_line<T: serde::Serialize>(writer: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, value)
        .map_err(|e| io::Error::other(format!("serialize response: {}", e)))?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn write_json_line_shared<T: serde::Serialize>(writer: &SharedWriter, value: &T) -> io::Result<()> {
    let mut guard = writer.lock();
    write_json_line(&mut *guard, value)
}

fn emit_rpc_event(writer: &SharedWriter, event: &str, payload: Value) {
    let message = RpcEvent {
        event: event.to_string(),
        payload,
    };
    let _ = write_json_line_shared(writer, &message);
}

fn parse_error_payload(err: &AppError) -> RpcErrorPayload {
    match err {
        AppError::NonZeroExit { code, output, .. } => {
            let parsed = parse_ffmpeg_error(output, Some(*code));
            RpcErrorPayload {
                summary: parsed.summary,
                detail: parsed.detail,
            }
        }
        AppError::Launch { .. } | AppError::ToolNotFound(_) => RpcErrorPayload {
            summary: parse_ffmpeg_error("", err.exit_code()).summary,
            detail: err.to_string(),
        },
        _ => {
            let text = err.to_string();
            RpcErrorPayload {
                summary: text.clone(),
                detail: text,
            }
        }
    }
}

fn params_from_value<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, AppError> {
    serde_json::from_value(params)
        .map_err(|e| AppError::from(format!("Invalid params payload: {}", e)))
}

fn to_value<T: serde::Serialize>(value: T, what: &str) -> Result<Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::from(format!("Failed to serialize {}: {}", what, e)))
}

fn dispatch_sync(method: &str, params: Value, ctx: &Context) -> Result<Value, AppError> {
    match method {
        "app.capabilities" => to_value(
            sidecar_api::app_capabilities(&ctx.settings),
            "app capabilities",
        ),
        "options.allowed" => {
            let parsed: OptionsParams = params_from_value(params)?;
            to_value(sidecar_api::allowed_values(&parsed.options), "allowed values")
        }
        "options.setEncoder" => {
            let parsed: SetEncoderParams = params_from_value(params)?;
            let encoder: EncoderKind = parsed.encoder.parse()?;
            to_value(
                sidecar_api::set_encoder(parsed.options, encoder),
                "options",
            )
        }
        "media.probe" => {
            let parsed: ProbeParams = params_from_value(params)?;
            to_value(
                sidecar_api::probe(ctx.runner.as_ref(), &ctx.settings, &parsed.input_path),
                "probe result",
            )
        }
        "command.preview" => {
            let parsed: CommandParams = params_from_value(params)?;
            to_value(
                sidecar_api::preview_command(
                    &parsed.input_path,
                    &parsed.output_directory,
                    &parsed.options,
                ),
                "command preview",
            )
        }
        "media.convert" => Err(AppError::from("media.convert requires async execution")),
        _ => Err(AppError::from(format!("Unknown method: {}", method))),
    }
}

fn respond(writer: &SharedWriter, id: u64, result: Result<Value, AppError>) {
    let response = match result {
        Ok(result) => serde_json::to_value(RpcSuccess { id, result })
            .map_err(|e| io::Error::other(format!("serialize success: {}", e))),
        Err(err) => {
            let payload = parse_error_payload(&err);
            serde_json::to_value(RpcFailure { id, error: payload })
                .map_err(|e| io::Error::other(format!("serialize failure: {}", e)))
        }
    };

    match response {
        Ok(value) => {
            let _ = write_json_line_shared(writer, &value);
        }
        Err(err) => {
            let failure = RpcFailure {
                id,
                error: RpcErrorPayload {
                    summary: "Serialization error".to_string(),
                    detail: err.to_string(),
                },
            };
            let _ = write_json_line_shared(writer, &failure);
        }
    }
}

async fn handle_convert(request: RpcRequest, writer: SharedWriter, ctx: Arc<Context>) {
    let parsed: CommandParams = match params_from_value(request.params) {
        Ok(parsed) => parsed,
        Err(err) => return respond(&writer, request.id, Err(err)),
    };
    let guard = match ctx.jobs.begin() {
        Ok(guard) => guard,
        Err(err) => return respond(&writer, request.id, Err(err)),
    };
    let job: ActiveJob = guard.job();

    let result = sidecar_api::convert(
        Arc::clone(&ctx.runner),
        &ctx.settings,
        guard,
        &parsed.input_path,
        &parsed.output_directory,
        &parsed.options,
    )
    .await;

    let result = match result {
        Ok(report) => {
            let event = if report.success {
                "media.job.complete"
            } else {
                "media.job.error"
            };
            emit_rpc_event(
                &writer,
                event,
                json!({
                    "jobId": job.job_id,
                    "exitCode": report.exit_code,
                    "summary": report.summary,
                }),
            );
            to_value(report, "convert report").map(|mut value| {
                value["jobId"] = json!(job.job_id);
                value
            })
        }
        Err(err) => {
            let payload = parse_error_payload(&err);
            emit_rpc_event(
                &writer,
                "media.job.error",
                json!({
                    "jobId": job.job_id,
                    "summary": payload.summary,
                    "detail": payload.detail,
                }),
            );
            Err(err)
        }
    };
    respond(&writer, request.id, result);
}

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let ctx = Arc::new(Context {
        settings: Settings::from_env(),
        runner: Arc::new(SystemRunner),
        jobs: JobSlot::new(),
    });
    let stdout: SharedWriter = Arc::new(Mutex::new(io::stdout()));
    let mut async_jobs: Vec<tokio::task::JoinHandle<()>> = Vec::new();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                let failure = RpcFailure {
                    id: 0,
                    error: RpcErrorPayload {
                        summary: "Invalid input stream".to_string(),
                        detail: err.to_string(),
                    },
                };
                let _ = write_json_line_shared(&stdout, &failure);
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let request: RpcRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                let failure = RpcFailure {
                    id: 0,
                    error: RpcErrorPayload {
                        summary: "Invalid request".to_string(),
                        detail: err.to_string(),
                    },
                };
                let _ = write_json_line_shared(&stdout, &failure);
                continue;
            }
        };

        log::debug!(
            target: "ffcmd::sidecar",
            "Request id={} method={}",
            request.id,
            request.method
        );

        if request.method == "media.convert" {
            let writer = Arc::clone(&stdout);
            let ctx = Arc::clone(&ctx);
            // Only running jobs are awaited at EOF.
            async_jobs.retain(|job| !job.is_finished());
            async_jobs.push(runtime.spawn(handle_convert(request, writer, ctx)));
        } else {
            let id = request.id;
            let result = dispatch_sync(&request.method, request.params, &ctx);
            respond(&stdout, id, result);
        }
    }

    runtime.block_on(async {
        for job in async_jobs {
            let _ = job.await;
        }
    });
    Ok(())
}
