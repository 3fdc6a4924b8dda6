//! Resolution and supervised invocation of external renderer binaries.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use tokio::process::Command;

use super::error::RenderError;

/// Install locations probed when a binary is on neither override nor PATH.
const WELL_KNOWN_DIRS: &[&str] = &["/usr/bin", "/usr/local/bin"];

/// Resolves a renderer binary using a fixed search order: explicit
/// override path, override name looked up on PATH, the default name on
/// PATH, then a short list of well-known install directories.
///
/// Callers cache the result for the life of the process.
///
/// # Errors
///
/// Returns [`RenderError::ToolNotFound`] when no candidate exists.
pub fn resolve_tool(override_value: Option<&str>, default_name: &str) -> Result<PathBuf, RenderError> {
    if let Some(value) = override_value {
        let candidate = Path::new(value);
        if candidate.is_absolute() && candidate.is_file() {
            return Ok(candidate.to_path_buf());
        }
        if let Some(found) = find_on_path(value) {
            return Ok(found);
        }
    }
    if let Some(found) = find_on_path(default_name) {
        return Ok(found);
    }
    for dir in WELL_KNOWN_DIRS {
        let candidate = Path::new(dir).join(default_name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(RenderError::ToolNotFound(format!(
        "{default_name} not found: install it or configure an explicit binary path"
    )))
}

/// Resolves through a per-process cache. A resolution failure is cached
/// too, so a missing binary is not re-searched on every request.
pub(crate) fn resolve_tool_cached(
    cell: &OnceLock<Result<PathBuf, String>>,
    override_value: Option<&str>,
    default_name: &str,
) -> Result<PathBuf, RenderError> {
    let resolved = cell
        .get_or_init(|| resolve_tool(override_value, default_name).map_err(|err| err.to_string()));
    match resolved {
        Ok(path) => Ok(path.clone()),
        Err(message) => Err(RenderError::ToolNotFound(message.clone())),
    }
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Runs a renderer subprocess to completion under a deadline, returning
/// captured stdout. The child is killed if the deadline passes.
///
/// # Errors
///
/// - [`RenderError::Failed`] when the tool exits non-zero, with stderr
///   captured into the error
/// - [`RenderError::Timeout`] when the deadline passes
/// - [`RenderError::Io`] when the process cannot be spawned
pub async fn run_tool(
    tool: &str,
    mut command: Command,
    timeout_secs: u64,
) -> Result<Vec<u8>, RenderError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let deadline = Duration::from_secs(timeout_secs);
    match tokio::time::timeout(deadline, command.output()).await {
        Err(_) => Err(RenderError::Timeout {
            tool: tool.to_string(),
            secs: timeout_secs,
        }),
        Ok(Err(err)) => Err(err.into()),
        Ok(Ok(output)) if !output.status.success() => Err(RenderError::Failed {
            tool: tool.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
        Ok(Ok(output)) => Ok(output.stdout),
    }
}
