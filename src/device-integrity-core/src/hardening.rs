//! Best-effort anti-debugging hardening.
//!
//! Unlike the probes this mutates process state, so it is never run as part
//! of [`evaluate`](crate::evaluate); callers opt in explicitly.

use tracing::{debug, warn};

/// Make the current process harder to attach a debugger to.
///
/// - Linux/Android: clears the dumpable flag, which blocks non-root
///   `ptrace` attach and core dumps
/// - macOS/iOS: `ptrace(PT_DENY_ATTACH)`
///
/// Returns `true` if the platform call succeeded. A tracer that is already
/// attached stays attached.
pub fn deny_debugger_if_possible() -> bool {
    let applied = deny_attach();
    if applied {
        debug!("Debugger attach denial applied");
    } else {
        warn!("Debugger attach denial unavailable or failed");
    }
    applied
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn deny_attach() -> bool {
    // Safety: PR_SET_DUMPABLE takes a plain integer argument and touches no memory.
    let unused: libc::c_ulong = 0;
    unsafe { libc::prctl(libc::PR_SET_DUMPABLE, unused, unused, unused, unused) == 0 }
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn deny_attach() -> bool {
    // Safety: PT_DENY_ATTACH ignores the pid/addr/data arguments.
    unsafe { libc::ptrace(libc::PT_DENY_ATTACH, 0, std::ptr::null_mut(), 0) == 0 }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios"
)))]
fn deny_attach() -> bool {
    false
}
