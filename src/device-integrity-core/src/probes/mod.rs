//! Detection probes.
//!
//! Each category module exposes one `detect_*` function returning the
//! category's boolean. Composite categories OR their sub-probes, each of
//! which runs through [`signal`] so that errors and panics become
//! "signal absent" instead of escaping.
//!
//! | Category | Module | Sub-probes |
//! |----------|--------|------------|
//! | Root | [`root`] | build tags, su paths, packages, su exec, props, `/system` rw |
//! | Debugger | [`debugger`] | connected, waiting, TracerPid |
//! | UsbDebug | [`settings`] | `adb_enabled` |
//! | DeveloperOptions | [`settings`] | `development_settings_enabled` |
//! | RuntimeInstrumentation | [`instrumentation`] | maps, class, ports |
//! | AppDebuggable | [`app`] | `FLAG_DEBUGGABLE` |

pub mod app;
pub mod debugger;
pub mod instrumentation;
pub mod root;
pub mod settings;

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::error::ProbeError;

/// Detection category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// Root / privilege escalation.
    #[serde(rename = "rooted")]
    Root,
    /// Debugger attached or awaited.
    #[serde(rename = "debugger")]
    Debugger,
    /// USB/ADB debugging enabled.
    #[serde(rename = "usbDebug")]
    UsbDebug,
    /// Developer options enabled.
    #[serde(rename = "developerOptions")]
    DeveloperOptions,
    /// Dynamic instrumentation (Frida, Xposed, Substrate).
    #[serde(rename = "frida")]
    RuntimeInstrumentation,
    /// Application built debuggable.
    #[serde(rename = "appDebuggable")]
    AppDebuggable,
}

impl Category {
    /// All categories, in evaluation order.
    pub const ALL: [Category; 6] = [
        Category::Root,
        Category::Debugger,
        Category::UsbDebug,
        Category::DeveloperOptions,
        Category::RuntimeInstrumentation,
        Category::AppDebuggable,
    ];

    /// Field name in the result payload.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "rooted",
            Self::Debugger => "debugger",
            Self::UsbDebug => "usbDebug",
            Self::DeveloperOptions => "developerOptions",
            Self::RuntimeInstrumentation => "frida",
            Self::AppDebuggable => "appDebuggable",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run one sub-probe, converting every failure into `false`.
pub(crate) fn signal<F>(category: Category, probe: &'static str, check: F) -> bool
where
    F: FnOnce() -> Result<bool, ProbeError>,
{
    let outcome = catch_unwind(AssertUnwindSafe(check)).unwrap_or_else(|payload| {
        Err(ProbeError::Panicked {
            message: panic_message(payload.as_ref()),
        })
    });

    match outcome {
        Ok(true) => {
            info!(category = %category, probe, "integrity signal present");
            true
        },
        Ok(false) => {
            trace!(category = %category, probe, "no signal");
            false
        },
        Err(e) if e.is_absent() => {
            trace!(category = %category, probe, error = %e, "probe source absent");
            false
        },
        Err(e) => {
            debug!(category = %category, probe, error = %e, "probe failed, treating as absent");
            false
        },
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
