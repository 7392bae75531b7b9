//! Root detection.
//!
//! Six independent sub-probes; any one firing marks the device rooted:
//!
//! 1. Build tags carry `test-keys`
//! 2. A known `su` binary or Superuser APK exists on disk
//! 3. A known root-manager package is installed
//! 4. `su` can be found or executed
//! 5. `ro.secure=0` or `ro.debuggable=1`
//! 6. `/system` is mounted read-write

use super::{signal, Category};
use crate::config::IntegrityConfig;
use crate::error::ProbeError;
use crate::host::{read_property, HostContext};

const CATEGORY: Category = Category::Root;

/// Check if the device is rooted.
pub fn detect_root(host: &HostContext, config: &IntegrityConfig) -> bool {
    signal(CATEGORY, "test_keys", || has_test_keys(host, config))
        || signal(CATEGORY, "su_binary", || has_su_binary(host, config))
        || signal(CATEGORY, "root_packages", || has_root_packages(host, config))
        || signal(CATEGORY, "su_executable", || can_execute_su(host, config))
        || signal(CATEGORY, "dangerous_props", || has_dangerous_props(host, config))
        || signal(CATEGORY, "system_rw", || is_system_writable(host, config))
}

fn has_test_keys(host: &HostContext, config: &IntegrityConfig) -> Result<bool, ProbeError> {
    let tags = match &host.build {
        Some(build) => build.tags()?,
        None => read_property(
            host.commands.as_ref(),
            &config.build_tags_property,
            config.command_timeout,
        )?,
    };
    Ok(tags.contains(config.test_keys_marker.as_str()))
}

fn has_su_binary(host: &HostContext, config: &IntegrityConfig) -> Result<bool, ProbeError> {
    // A path that can't be stat'ed says nothing about the others.
    Ok(config
        .su_paths
        .iter()
        .any(|path| host.fs.exists(path).unwrap_or(false)))
}

fn has_root_packages(host: &HostContext, config: &IntegrityConfig) -> Result<bool, ProbeError> {
    let mut last_error = None;
    for package in &config.root_packages {
        match host.packages.is_installed(package) {
            Ok(true) => return Ok(true),
            Ok(false) => {},
            Err(e) => last_error = Some(e),
        }
    }
    match last_error {
        Some(e) => Err(e),
        None => Ok(false),
    }
}

fn can_execute_su(host: &HostContext, config: &IntegrityConfig) -> Result<bool, ProbeError> {
    let timeout = config.command_timeout;
    let which = host.commands.run(&["which", "su"], timeout);
    if matches!(&which, Ok(output) if output.has_output()) {
        return Ok(true);
    }
    let su = host.commands.run(&["su", "-c", "id"], timeout);
    match (which, su) {
        (_, Ok(output)) => Ok(output.has_output()),
        (Ok(_), Err(_)) => Ok(false),
        (Err(_), Err(e)) => Err(e),
    }
}

fn has_dangerous_props(host: &HostContext, config: &IntegrityConfig) -> Result<bool, ProbeError> {
    let commands = host.commands.as_ref();
    let timeout = config.command_timeout;
    let secure = read_property(commands, &config.secure_property, timeout);
    let debuggable = read_property(commands, &config.debuggable_property, timeout);
    match (secure, debuggable) {
        (Err(e), Err(_)) => Err(e),
        (secure, debuggable) => Ok(secure.is_ok_and(|v| v == "0")
            || debuggable.is_ok_and(|v| v == "1")),
    }
}

fn is_system_writable(host: &HostContext, config: &IntegrityConfig) -> Result<bool, ProbeError> {
    let mounts = host.fs.read_to_string(&config.mounts_path)?;
    Ok(mount_is_writable(&mounts, &config.system_mount_point))
}

/// Check whether `mount_point` is mounted with the `rw` option.
///
/// Lines follow the `/proc/mounts` layout:
/// `device mount_point fstype options dump pass`.
pub fn mount_is_writable(mounts: &str, mount_point: &str) -> bool {
    mounts.lines().any(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        fields.len() >= 4
            && fields[1] == mount_point
            && fields[3].split(',').any(|option| option == "rw")
    })
}
