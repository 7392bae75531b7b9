//! Runtime instrumentation detection (Frida, Xposed, Substrate).
//!
//! Three sub-probes:
//!
//! - **Memory map**: any mapped region whose line mentions a known
//!   framework signature (`frida-agent`, `libsubstrate`, `XposedBridge.jar`, ...)
//! - **Class presence**: the Xposed bridge class resolves in the process
//! - **Loopback ports**: something accepts connections on frida-server's
//!   default ports
//!
//! frida-server can be started on another port and gadgets can be renamed,
//! so a clean result here is weak evidence.

use super::{signal, Category};
use crate::config::IntegrityConfig;
use crate::error::ProbeError;
use crate::host::HostContext;

const CATEGORY: Category = Category::RuntimeInstrumentation;

/// Check for signs of a dynamic instrumentation framework.
pub fn detect_instrumentation(host: &HostContext, config: &IntegrityConfig) -> bool {
    signal(CATEGORY, "maps_signature", || {
        let maps = host.fs.read_to_string(&config.maps_path)?;
        Ok(find_signature(&maps, &config.instrumentation_signatures).is_some())
    }) || signal(CATEGORY, "framework_class", || {
        Ok(host.classes.is_class_loadable(&config.instrumentation_class))
    }) || signal(CATEGORY, "loopback_port", || open_port(host, config))
}

/// Return the first signature found in a memory map, matching lines
/// case-insensitively. `signatures` must already be lower-case.
pub fn find_signature<'a>(maps: &str, signatures: &'a [String]) -> Option<&'a str> {
    maps.lines().find_map(|line| {
        let line = line.to_lowercase();
        signatures
            .iter()
            .find(|sig| line.contains(sig.as_str()))
            .map(String::as_str)
    })
}

fn open_port(host: &HostContext, config: &IntegrityConfig) -> Result<bool, ProbeError> {
    for &port in &config.instrumentation_ports {
        match host.network.connect(port, config.connect_timeout) {
            Ok(()) => {
                tracing::debug!(port, "loopback instrumentation port accepted connection");
                return Ok(true);
            },
            Err(e) => tracing::trace!(port, error = %e, "loopback port closed"),
        }
    }
    Ok(false)
}
