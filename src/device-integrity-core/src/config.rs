//! Configuration for the integrity engine.
//!
//! The defaults are the probe catalogue: the exact paths, package names,
//! signatures and ports every evaluation checks. Nothing here is read from a
//! file or the environment.

use std::path::PathBuf;
use std::time::Duration;

/// Paths historically used by root-management tools and `su` binaries.
pub const SU_BINARY_PATHS: [&str; 9] = [
    "/system/app/Superuser.apk",
    "/sbin/su",
    "/system/bin/su",
    "/system/xbin/su",
    "/data/local/xbin/su",
    "/data/local/bin/su",
    "/system/sd/xbin/su",
    "/system/bin/failsafe/su",
    "/data/local/su",
];

/// Package identifiers of known root managers.
pub const ROOT_PACKAGES: [&str; 5] = [
    "eu.chainfire.supersu",
    "com.noshufou.android.su",
    "com.koushikdutta.superuser",
    "com.thirdparty.superuser",
    "com.topjohnwu.magisk",
];

/// Substrings of `/proc/self/maps` lines left by instrumentation frameworks.
pub const INSTRUMENTATION_SIGNATURES: [&str; 9] = [
    "frida",
    "gum-js-loop",
    "libfrida",
    "frida-gadget",
    "re.frida.server",
    "frida-agent",
    "substrate",
    "xposed",
    "edxp",
];

/// Default control ports of frida-server.
pub const INSTRUMENTATION_PORTS: [u16; 2] = [27042, 27043];

/// Entry-point class of the Xposed framework.
pub const XPOSED_BRIDGE_CLASS: &str = "de.robv.android.xposed.XposedBridge";

/// Configuration for [`IntegrityEngine`](crate::IntegrityEngine).
#[derive(Debug, Clone)]
pub struct IntegrityConfig {
    /// Marker in the build tags of test-signed builds.
    pub test_keys_marker: String,
    /// Property holding the build tags, read when the host has no build metadata.
    pub build_tags_property: String,
    /// Files whose presence indicates root.
    pub su_paths: Vec<PathBuf>,
    /// Root-manager packages.
    pub root_packages: Vec<String>,
    /// Property that reads "0" on insecure builds.
    pub secure_property: String,
    /// Property that reads "1" on debuggable builds.
    pub debuggable_property: String,
    /// Mount table.
    pub mounts_path: PathBuf,
    /// Mount point whose writability indicates root.
    pub system_mount_point: String,
    /// Per-process status file carrying `TracerPid:`.
    pub status_path: PathBuf,
    /// Per-process memory map.
    pub maps_path: PathBuf,
    /// Lower-case signatures searched for in the memory map.
    pub instrumentation_signatures: Vec<String>,
    /// Fully-qualified class whose presence indicates instrumentation.
    pub instrumentation_class: String,
    /// Loopback ports of instrumentation servers.
    pub instrumentation_ports: Vec<u16>,
    /// Connect timeout per loopback port.
    pub connect_timeout: Duration,
    /// Upper bound on any subordinate command.
    pub command_timeout: Duration,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            test_keys_marker: "test-keys".into(),
            build_tags_property: "ro.build.tags".into(),
            su_paths: SU_BINARY_PATHS.iter().map(PathBuf::from).collect(),
            root_packages: ROOT_PACKAGES.iter().map(|p| (*p).to_string()).collect(),
            secure_property: "ro.secure".into(),
            debuggable_property: "ro.debuggable".into(),
            mounts_path: "/proc/mounts".into(),
            system_mount_point: "/system".into(),
            status_path: "/proc/self/status".into(),
            maps_path: "/proc/self/maps".into(),
            instrumentation_signatures: INSTRUMENTATION_SIGNATURES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            instrumentation_class: XPOSED_BRIDGE_CLASS.into(),
            instrumentation_ports: INSTRUMENTATION_PORTS.to_vec(),
            connect_timeout: Duration::from_millis(100),
            command_timeout: Duration::from_secs(2),
        }
    }
}
