//! Action dispatch shared by the C ABI and the JNI entry point.
//!
//! The host bridge sends an action name; we run it against a
//! [`HostContext`] and hand back a JSON document. Unknown actions are
//! "unhandled" (`Ok(None)`) so the bridge can fall through to other plugins.

use device_integrity_core::{deny_debugger_if_possible, HostContext, IntegrityEngine};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced to the host bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The response could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Actions the bridge understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Evaluate device integrity.
    IsSecure,
    /// Harden the process against debugger attach.
    DenyDebuggerIfPossible,
}

impl Action {
    /// Name used by the host bridge.
    pub fn name(self) -> &'static str {
        match self {
            Self::IsSecure => "isSecure",
            Self::DenyDebuggerIfPossible => "denyDebuggerIfPossible",
        }
    }

    /// Look up an action by its bridge name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "isSecure" => Some(Self::IsSecure),
            "denyDebuggerIfPossible" => Some(Self::DenyDebuggerIfPossible),
            _ => None,
        }
    }
}

/// Response of `denyDebuggerIfPossible`.
#[derive(Debug, Serialize)]
struct HardeningResponse {
    applied: bool,
}

/// Run an action and return its JSON response.
///
/// `Ok(None)` means the action is not ours.
pub fn dispatch(action: &str, host: &HostContext) -> Result<Option<String>, BridgeError> {
    let Some(action) = Action::from_name(action) else {
        debug!(action, "Bridge: unhandled action");
        return Ok(None);
    };

    info!(action = action.name(), "Bridge: executing action");
    let json = match action {
        Action::IsSecure => {
            let report = IntegrityEngine::new().evaluate(host);
            serde_json::to_string(&report)?
        },
        Action::DenyDebuggerIfPossible => serde_json::to_string(&HardeningResponse {
            applied: deny_debugger_if_possible(),
        })?,
    };
    Ok(Some(json))
}
