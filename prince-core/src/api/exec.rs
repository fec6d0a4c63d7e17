//! Child-process execution and outcome classification.

use regex::Regex;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

use super::error::{ExecuteError, Failure};

/// Captured output of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    /// Raw stdout. Holds the document when `--output -` is used.
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl Rendered {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Diagnostic line prince(1) prints for a failed conversion.
///
/// This follows the tool's message format verbatim. If that format changes,
/// failures with exit status 0 go unnoticed.
fn tool_error_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"prince:\s+error:\s+([^\n]+)").expect("valid regex"))
}

/// Extracts the message of a `prince: error:` line from stderr.
pub fn tool_error(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    tool_error_regex()
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decides the outcome of a finished run.
///
/// A process-level failure wins; otherwise a diagnostic on stderr turns a
/// zero exit status into a failure.
pub fn classify(
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
) -> Result<Rendered, ExecuteError> {
    if !status.success() {
        return Err(ExecuteError::new(Failure::Exit(status), stdout, stderr));
    }
    if let Some(message) = tool_error(&stderr) {
        return Err(ExecuteError::new(Failure::Tool(message), stdout, stderr));
    }
    Ok(Rendered { stdout, stderr })
}

// ============================================================================
// Running
// ============================================================================

enum CaptureError {
    Io(std::io::Error),
    Overflow,
}

/// Reads `reader` to the end into `buf`, failing once more than `limit`
/// bytes arrived. `buf` keeps at most `limit` bytes.
async fn read_capped<R>(mut reader: R, buf: &mut Vec<u8>, limit: usize) -> Result<(), CaptureError>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await.map_err(CaptureError::Io)?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > limit {
            buf.truncate(limit);
            return Err(CaptureError::Overflow);
        }
    }
}

/// Runs `program` with `args` and classifies the result.
pub(crate) async fn run(
    program: &Path,
    args: &[String],
    cwd: &Path,
    timeout: Option<Duration>,
    max_buffer: usize,
) -> Result<Rendered, ExecuteError> {
    debug!(?args, cwd = %cwd.display(), "Spawning prince(1)");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| ExecuteError::new(Failure::Spawn(e), Vec::new(), Vec::new()))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();

    // Collect both streams concurrently so neither pipe fills up and stalls
    // the child, then reap it.
    let output_future = async {
        let capture_out = async {
            match stdout {
                Some(s) => read_capped(s, &mut out_buf, max_buffer).await,
                None => Ok(()),
            }
        };
        let capture_err = async {
            match stderr {
                Some(s) => read_capped(s, &mut err_buf, max_buffer).await,
                None => Ok(()),
            }
        };
        tokio::try_join!(capture_out, capture_err)?;
        child.wait().await.map_err(CaptureError::Io)
    };

    let result = match timeout {
        Some(limit) => {
            let timed = tokio::time::timeout(limit, output_future).await;
            match timed {
                Ok(result) => result,
                Err(_) => {
                    warn!("prince(1) timed out after {:?}", limit);
                    let _ = child.kill().await;
                    return Err(ExecuteError::new(Failure::Timeout(limit), out_buf, err_buf));
                }
            }
        }
        None => output_future.await,
    };

    match result {
        Ok(status) => {
            debug!(
                %status,
                stdout_bytes = out_buf.len(),
                stderr_bytes = err_buf.len(),
                "prince(1) finished"
            );
            classify(status, out_buf, err_buf)
        }
        Err(CaptureError::Overflow) => {
            warn!("prince(1) output exceeded {} bytes", max_buffer);
            let _ = child.kill().await;
            Err(ExecuteError::new(
                Failure::BufferExceeded(max_buffer),
                out_buf,
                err_buf,
            ))
        }
        Err(CaptureError::Io(e)) => {
            let _ = child.kill().await;
            Err(ExecuteError::new(Failure::Io(e), out_buf, err_buf))
        }
    }
}
