//! Deterministic device snapshot for integration tests.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use device_integrity_core::{
    AppMetadata, BuildInfo, ClassRegistry, CommandOutput, CommandRunner, DebugState, FileSystem,
    HostContext, LoopbackConnector, PackageRegistry, ProbeError, SettingKey, SettingsStore,
};

pub const CLEAN_MOUNTS: &str = "\
/dev/block/dm-0 / ext4 ro,seclabel,relatime 0 0
/dev/block/dm-1 /system ext4 ro,seclabel,relatime 0 0
/dev/block/dm-2 /vendor ext4 ro,seclabel,relatime 0 0
/dev/block/by-name/userdata /data f2fs rw,lazytime,seclabel,nosuid,nodev 0 0
";

pub const CLEAN_STATUS: &str = "Name:\tcom.example.app\nState:\tS (sleeping)\nTgid:\t4321\nPid:\t4321\nPPid:\t612\nTracerPid:\t0\n";

pub const CLEAN_MAPS: &str = "\
12c00000-32c00000 rw-p 00000000 00:00 0                                  [anon:dalvik-main space]
70b3a000-70d1e000 rw-p 00000000 00:00 0                                  [anon:dalvik-/system/framework/boot.art]
7a1c200000-7a1c2d9000 r-xp 00000000 fd:00 1803                           /apex/com.android.runtime/lib64/bionic/libc.so
7a1d100000-7a1d150000 r--p 00000000 fd:05 402                            /data/app/~~x==/com.example.app/base.apk
";

/// Which capability misbehaves, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Behaves normally.
    None,
    /// Returns a generic I/O / platform error.
    Error,
    /// Panics.
    Panic,
}

/// A fixed device state, shared across every capability.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub files: HashMap<PathBuf, String>,
    pub commands: HashMap<String, String>,
    pub open_ports: HashSet<u16>,
    pub packages: HashSet<String>,
    pub settings: HashMap<SettingKey, i64>,
    pub app_flags: u32,
    pub debugger_connected: bool,
    pub waiting_for_debugger: bool,
    pub classes: HashSet<String>,
    pub build_tags: String,

    pub fs_fault: Fault,
    pub command_fault: Fault,
    pub network_fault: Fault,
    pub platform_fault: Fault,
}

impl Snapshot {
    /// A stock, locked-down release device.
    pub fn clean() -> Self {
        let mut snapshot = Self {
            files: HashMap::new(),
            commands: HashMap::new(),
            open_ports: HashSet::new(),
            packages: HashSet::new(),
            settings: HashMap::new(),
            app_flags: 0x0000_8004,
            debugger_connected: false,
            waiting_for_debugger: false,
            classes: HashSet::new(),
            build_tags: "release-keys".into(),
            fs_fault: Fault::None,
            command_fault: Fault::None,
            network_fault: Fault::None,
            platform_fault: Fault::None,
        };
        snapshot
            .file("/proc/mounts", CLEAN_MOUNTS)
            .file("/proc/self/status", CLEAN_STATUS)
            .file("/proc/self/maps", CLEAN_MAPS)
            .command("which su", "")
            .command("getprop ro.secure", "1\n")
            .command("getprop ro.debuggable", "0\n")
            .setting(SettingKey::AdbEnabled, 0)
            .setting(SettingKey::DevelopmentSettingsEnabled, 0);
        snapshot
    }

    pub fn file(&mut self, path: &str, contents: &str) -> &mut Self {
        self.files.insert(PathBuf::from(path), contents.to_string());
        self
    }

    pub fn command(&mut self, line: &str, output: &str) -> &mut Self {
        self.commands.insert(line.to_string(), output.to_string());
        self
    }

    pub fn setting(&mut self, key: SettingKey, value: i64) -> &mut Self {
        self.settings.insert(key, value);
        self
    }

    /// Host whose every capability reads this snapshot.
    pub fn host(&self) -> HostContext {
        let shared = Arc::new(self.clone());
        HostContext::system()
            .with_filesystem(SnapshotFs(Arc::clone(&shared)))
            .with_commands(SnapshotCommands(Arc::clone(&shared)))
            .with_network(SnapshotNetwork(Arc::clone(&shared)))
            .with_platform(Arc::new(SnapshotPlatform(shared)))
    }
}

fn inject(fault: Fault, what: &'static str) -> Result<(), ProbeError> {
    match fault {
        Fault::None => Ok(()),
        Fault::Error => Err(ProbeError::platform(format!("{what}: injected fault"))),
        Fault::Panic => panic!("{what}: injected panic"),
    }
}

struct SnapshotFs(Arc<Snapshot>);

impl FileSystem for SnapshotFs {
    fn exists(&self, path: &Path) -> Result<bool, ProbeError> {
        inject(self.0.fs_fault, "filesystem")?;
        Ok(self.0.files.contains_key(path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String, ProbeError> {
        inject(self.0.fs_fault, "filesystem")?;
        self.0
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| ProbeError::io(path, ErrorKind::NotFound.into()))
    }
}

struct SnapshotCommands(Arc<Snapshot>);

impl CommandRunner for SnapshotCommands {
    fn run(&self, args: &[&str], _timeout: Duration) -> Result<CommandOutput, ProbeError> {
        inject(self.0.command_fault, "commands")?;
        let line = args.join(" ");
        match self.0.commands.get(&line) {
            Some(text) => Ok(CommandOutput::from_text(Some(0), text)),
            None => Err(ProbeError::Spawn {
                command: line,
                source: ErrorKind::NotFound.into(),
            }),
        }
    }
}

struct SnapshotNetwork(Arc<Snapshot>);

impl LoopbackConnector for SnapshotNetwork {
    fn connect(&self, port: u16, _timeout: Duration) -> Result<(), ProbeError> {
        inject(self.0.network_fault, "network")?;
        if self.0.open_ports.contains(&port) {
            Ok(())
        } else {
            Err(ProbeError::Connect {
                port,
                source: ErrorKind::ConnectionRefused.into(),
            })
        }
    }
}

struct SnapshotPlatform(Arc<Snapshot>);

impl PackageRegistry for SnapshotPlatform {
    fn is_installed(&self, package: &str) -> Result<bool, ProbeError> {
        inject(self.0.platform_fault, "packages")?;
        Ok(self.0.packages.contains(package))
    }
}

impl SettingsStore for SnapshotPlatform {
    fn get_int(&self, key: SettingKey) -> Result<i64, ProbeError> {
        inject(self.0.platform_fault, "settings")?;
        self.0
            .settings
            .get(&key)
            .copied()
            .ok_or_else(|| ProbeError::platform("setting not found"))
    }
}

impl AppMetadata for SnapshotPlatform {
    fn flags(&self) -> Result<u32, ProbeError> {
        inject(self.0.platform_fault, "app metadata")?;
        Ok(self.0.app_flags)
    }
}

impl DebugState for SnapshotPlatform {
    fn is_debugger_connected(&self) -> Result<bool, ProbeError> {
        inject(self.0.platform_fault, "debug state")?;
        Ok(self.0.debugger_connected)
    }

    fn is_waiting_for_debugger(&self) -> Result<bool, ProbeError> {
        inject(self.0.platform_fault, "debug state")?;
        Ok(self.0.waiting_for_debugger)
    }
}

impl ClassRegistry for SnapshotPlatform {
    fn is_class_loadable(&self, name: &str) -> bool {
        if self.0.platform_fault == Fault::Panic {
            panic!("class registry: injected panic");
        }
        self.0.platform_fault == Fault::None && self.0.classes.contains(name)
    }
}

impl BuildInfo for SnapshotPlatform {
    fn tags(&self) -> Result<String, ProbeError> {
        inject(self.0.platform_fault, "build info")?;
        Ok(self.0.build_tags.clone())
    }
}
