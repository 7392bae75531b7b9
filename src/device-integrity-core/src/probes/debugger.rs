//! Debugger detection.

use super::{signal, Category};
use crate::config::IntegrityConfig;
use crate::error::ProbeError;
use crate::host::HostContext;

const CATEGORY: Category = Category::Debugger;

/// Check if a debugger is attached, awaited, or tracing the process.
pub fn detect_debugger(host: &HostContext, config: &IntegrityConfig) -> bool {
    signal(CATEGORY, "debugger_connected", || {
        host.debug.is_debugger_connected()
    }) || signal(CATEGORY, "waiting_for_debugger", || {
        host.debug.is_waiting_for_debugger()
    }) || signal(CATEGORY, "tracer_pid", || {
        let status = host.fs.read_to_string(&config.status_path)?;
        Ok(tracer_pid(&status)? > 0)
    })
}

/// Extract `TracerPid:` from a `/proc/<pid>/status` document.
///
/// A missing line means nobody is tracing; an unparsable value is an error.
pub fn tracer_pid(status: &str) -> Result<i64, ProbeError> {
    let Some(line) = status.lines().find(|l| l.starts_with("TracerPid:")) else {
        return Ok(0);
    };
    let value = line.split_whitespace().nth(1).unwrap_or_default();
    value
        .parse()
        .map_err(|e| ProbeError::malformed("TracerPid", format!("{value:?}: {e}")))
}
