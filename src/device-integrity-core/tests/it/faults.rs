//! Fault injection: a failing or panicking capability must read as
//! "not detected" and never escape `evaluate`.

use device_integrity_core::evaluate;
use device_integrity_core::host::{SystemCommandRunner, SystemFileSystem};

use crate::support::{Fault, Snapshot};

/// A snapshot where every signal would fire if its probe could run.
fn fully_compromised() -> Snapshot {
    let mut snapshot = Snapshot::clean();
    snapshot
        .file("/system/xbin/su", "")
        .file("/proc/mounts", "/dev/root /system ext4 rw 0 0\n")
        .file("/proc/self/status", "TracerPid:\t77\n")
        .file("/proc/self/maps", "7000-8000 r-xp 0 0 0 /data/local/tmp/frida-agent-64.so\n")
        .command("which su", "/system/xbin/su\n")
        .command("su -c id", "uid=0(root)\n")
        .command("getprop ro.secure", "0\n")
        .command("getprop ro.debuggable", "1\n");
    snapshot.packages.insert("eu.chainfire.supersu".into());
    snapshot.build_tags = "test-keys".into();
    snapshot
}

#[test]
fn every_signal_fires_without_faults() {
    let report = evaluate(&fully_compromised().host());
    assert!(report.rooted());
    assert!(report.debugger());
    assert!(report.runtime_instrumentation());
}

#[test]
fn all_capabilities_failing_yields_secure_report() {
    for fault in [Fault::Error, Fault::Panic] {
        let mut snapshot = fully_compromised();
        snapshot.open_ports.insert(27042);
        snapshot.fs_fault = fault;
        snapshot.command_fault = fault;
        snapshot.network_fault = fault;
        snapshot.platform_fault = fault;

        let report = evaluate(&snapshot.host());
        assert!(report.is_secure(), "{fault:?}: {report:?}");
    }
}

#[test]
fn filesystem_fault_disables_only_file_probes() {
    let mut snapshot = fully_compromised();
    snapshot.fs_fault = Fault::Error;
    let report = evaluate(&snapshot.host());
    // su exec, props, packages and tags still see root.
    assert!(report.rooted());
    // TracerPid unreadable; platform debugger flags are clear.
    assert!(!report.debugger());
    // Maps unreadable, no class, no port.
    assert!(!report.runtime_instrumentation());
}

#[test]
fn command_spawn_failure_disables_only_command_probes() {
    let mut snapshot = Snapshot::clean();
    snapshot
        .command("which su", "/system/xbin/su\n")
        .command("getprop ro.secure", "0\n");
    snapshot.command_fault = Fault::Error;
    assert!(!evaluate(&snapshot.host()).rooted());
}

#[test]
fn panicking_platform_does_not_escape() {
    let mut snapshot = Snapshot::clean();
    snapshot.platform_fault = Fault::Panic;
    let report = evaluate(&snapshot.host());
    assert!(report.is_secure());
}

#[test]
fn missing_proc_files_read_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let host = Snapshot::clean()
        .host()
        .with_filesystem(SystemFileSystem::rooted_at(dir.path()));
    let report = evaluate(&host);
    assert!(!report.debugger());
    assert!(!report.runtime_instrumentation());
}

#[test]
#[cfg(unix)]
fn real_command_runner_without_su_is_not_rooted() {
    // Only meaningful on hosts without an `su` on PATH.
    let path = std::env::var_os("PATH").unwrap_or_default();
    if std::env::split_paths(&path).any(|dir| dir.join("su").exists()) {
        return;
    }
    let host = Snapshot::clean().host().with_commands(SystemCommandRunner);
    assert!(!evaluate(&host).rooted());
}
