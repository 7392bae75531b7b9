//! Property-based tests for the verdict invariants.

use proptest::prelude::*;

use device_integrity_core::{evaluate, IntegrityReport, SettingKey};

use crate::support::Snapshot;

/// Snapshot where exactly the chosen categories should fire.
fn snapshot_with(flags: [bool; 6]) -> Snapshot {
    let [rooted, debugger, usb, dev, frida, app] = flags;
    let mut snapshot = Snapshot::clean();
    if rooted {
        snapshot.file("/sbin/su", "");
    }
    if debugger {
        snapshot.file("/proc/self/status", "Name:\tapp\nTracerPid:\t1337\n");
    }
    if usb {
        snapshot.setting(SettingKey::AdbEnabled, 1);
    }
    if dev {
        snapshot.setting(SettingKey::DevelopmentSettingsEnabled, 1);
    }
    if frida {
        snapshot.open_ports.insert(27043);
    }
    if app {
        snapshot.app_flags |= 0x2;
    }
    snapshot
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    /// isSecure is exactly the negated OR of the six categories.
    #[test]
    fn secure_is_negated_or(flags in any::<[bool; 6]>()) {
        let report = IntegrityReport::from_categories(
            flags[0], flags[1], flags[2], flags[3], flags[4], flags[5],
        );
        prop_assert_eq!(report.is_secure(), !flags.iter().any(|f| *f));
    }

    /// Each planted signal shows up in its own category and nowhere else.
    #[test]
    fn categories_are_independent(flags in any::<[bool; 6]>()) {
        let report = evaluate(&snapshot_with(flags).host());
        let observed = [
            report.rooted(),
            report.debugger(),
            report.usb_debug(),
            report.developer_options(),
            report.runtime_instrumentation(),
            report.app_debuggable(),
        ];
        prop_assert_eq!(observed, flags);
        prop_assert_eq!(
            report.is_secure(),
            !(report.rooted()
                || report.debugger()
                || report.usb_debug()
                || report.developer_options()
                || report.runtime_instrumentation()
                || report.app_debuggable())
        );
    }

    /// Unchanged environment, identical report.
    #[test]
    fn evaluation_is_idempotent(flags in any::<[bool; 6]>()) {
        let host = snapshot_with(flags).host();
        prop_assert_eq!(evaluate(&host), evaluate(&host));
    }

    /// Arbitrary status documents never make the debugger probe misfire
    /// unless they carry a positive TracerPid.
    #[test]
    fn arbitrary_status_never_escapes(text in "\\PC{0,200}") {
        let mut snapshot = Snapshot::clean();
        snapshot.file("/proc/self/status", &text);
        let report = evaluate(&snapshot.host());
        let traced = text
            .lines()
            .find(|l| l.starts_with("TracerPid:"))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|v| v.parse::<i64>().ok())
            .is_some_and(|pid| pid > 0);
        prop_assert_eq!(report.debugger(), traced);
    }
}
