//! Host capabilities consumed by the probes.
//!
//! Every probe reads the outside world through one of these narrow traits.
//! The OS-backed implementations live in [`system`]; platform-only
//! capabilities (package registry, settings, app metadata, ...) are supplied
//! by the embedding layer, e.g. the Android JNI bridge.
//!
//! ```rust,ignore
//! use device_integrity_core::host::HostContext;
//!
//! let host = HostContext::system()
//!     .with_packages(my_package_registry)
//!     .with_settings(my_settings_store);
//! ```

pub mod system;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProbeError;

pub use system::{
    SystemCommandRunner, SystemFileSystem, SystemLoopbackConnector, Unavailable,
};

/// Debuggable bit of the application flags.
pub const FLAG_DEBUGGABLE: u32 = 0x0000_0002;

/// First platform generation that moved development settings to the
/// global namespace (Android 4.2, API 17).
pub const GLOBAL_SETTINGS_MIN_SDK: i32 = 17;

/// Captured output of a subordinate command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, if the process exited normally.
    pub status: Option<i32>,
    /// Combined stdout/stderr, one entry per line.
    pub lines: Vec<String>,
}

impl CommandOutput {
    /// Build output from raw text.
    pub fn from_text(status: Option<i32>, text: &str) -> Self {
        Self {
            status,
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Check if any line carries non-whitespace text.
    #[must_use]
    pub fn has_output(&self) -> bool {
        self.lines.iter().any(|line| !line.trim().is_empty())
    }

    /// First line, trimmed.
    #[must_use]
    pub fn first_line(&self) -> Option<&str> {
        self.lines.first().map(|line| line.trim())
    }
}

/// Runs a subordinate command and captures its output.
pub trait CommandRunner: Send + Sync {
    /// Run `args[0]` with the remaining arguments.
    ///
    /// The implementation must release the child process on every path.
    fn run(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput, ProbeError>;
}

/// Read-only filesystem access.
pub trait FileSystem: Send + Sync {
    /// Check whether a path exists.
    fn exists(&self, path: &Path) -> Result<bool, ProbeError>;

    /// Read a whole (pseudo-)file as UTF-8, lossily.
    fn read_to_string(&self, path: &Path) -> Result<String, ProbeError>;
}

/// Outbound TCP connects to the loopback interface.
pub trait LoopbackConnector: Send + Sync {
    /// Connect to `127.0.0.1:port`, giving up after `timeout`.
    fn connect(&self, port: u16, timeout: Duration) -> Result<(), ProbeError>;
}

/// Application package registry.
pub trait PackageRegistry: Send + Sync {
    /// `Ok(false)` when the registry reports "not found".
    fn is_installed(&self, package: &str) -> Result<bool, ProbeError>;
}

/// Logical settings the engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// USB/ADB debugging enabled.
    AdbEnabled,
    /// Developer options enabled.
    DevelopmentSettingsEnabled,
}

/// Physical settings namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsNamespace {
    /// `Settings.Global`.
    Global,
    /// `Settings.Secure`.
    Secure,
}

impl SettingKey {
    /// Physical setting name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AdbEnabled => "adb_enabled",
            Self::DevelopmentSettingsEnabled => "development_settings_enabled",
        }
    }

    /// Resolve to the namespace used by the given platform generation.
    #[must_use]
    pub fn resolve(self, sdk_int: i32) -> (SettingsNamespace, &'static str) {
        let namespace = if sdk_int >= GLOBAL_SETTINGS_MIN_SDK {
            SettingsNamespace::Global
        } else {
            SettingsNamespace::Secure
        };
        (namespace, self.name())
    }
}

/// Integer settings store, keyed by logical key.
pub trait SettingsStore: Send + Sync {
    /// Read a setting. Implementations resolve the namespace themselves.
    fn get_int(&self, key: SettingKey) -> Result<i64, ProbeError>;
}

/// The running application's own metadata.
pub trait AppMetadata: Send + Sync {
    /// Application flags; see [`FLAG_DEBUGGABLE`].
    fn flags(&self) -> Result<u32, ProbeError>;
}

/// Runtime debugger flags exposed by the platform.
pub trait DebugState: Send + Sync {
    /// A debugger is connected.
    fn is_debugger_connected(&self) -> Result<bool, ProbeError>;

    /// The process is waiting for a debugger to attach.
    fn is_waiting_for_debugger(&self) -> Result<bool, ProbeError>;
}

/// Class/module registry of the running process.
pub trait ClassRegistry: Send + Sync {
    /// Check if a fully-qualified class name resolves.
    fn is_class_loadable(&self, name: &str) -> bool;
}

/// Build metadata.
pub trait BuildInfo: Send + Sync {
    /// Build signing tags, e.g. `release-keys`.
    fn tags(&self) -> Result<String, ProbeError>;
}

/// Read a system property through `getprop`.
///
/// Returns the first output line, trimmed; an empty string when unset.
pub fn read_property(
    commands: &dyn CommandRunner,
    key: &str,
    timeout: Duration,
) -> Result<String, ProbeError> {
    let output = commands.run(&["getprop", key], timeout)?;
    Ok(output.first_line().unwrap_or_default().to_string())
}

/// Handles to every capability a single evaluation needs.
///
/// Cheap to clone; all capabilities are shared.
#[derive(Clone)]
pub struct HostContext {
    pub(crate) fs: Arc<dyn FileSystem>,
    pub(crate) commands: Arc<dyn CommandRunner>,
    pub(crate) network: Arc<dyn LoopbackConnector>,
    pub(crate) packages: Arc<dyn PackageRegistry>,
    pub(crate) settings: Arc<dyn SettingsStore>,
    pub(crate) app: Arc<dyn AppMetadata>,
    pub(crate) debug: Arc<dyn DebugState>,
    pub(crate) classes: Arc<dyn ClassRegistry>,
    /// `None` reads the tags through `getprop` on [`commands`](Self::with_commands).
    pub(crate) build: Option<Arc<dyn BuildInfo>>,
}

impl HostContext {
    /// OS-backed filesystem, commands and loopback; everything the OS alone
    /// cannot answer reports [`Unavailable`]. Build tags come from `getprop`.
    pub fn system() -> Self {
        Self {
            fs: Arc::new(SystemFileSystem::new()),
            commands: Arc::new(SystemCommandRunner),
            network: Arc::new(SystemLoopbackConnector),
            packages: Arc::new(Unavailable),
            settings: Arc::new(Unavailable),
            app: Arc::new(Unavailable),
            debug: Arc::new(Unavailable),
            classes: Arc::new(Unavailable),
            build: None,
        }
    }

    /// Replace the filesystem.
    #[must_use]
    pub fn with_filesystem(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    /// Replace the command runner.
    ///
    /// Also used for build tags unless build metadata was provided.
    #[must_use]
    pub fn with_commands(mut self, commands: impl CommandRunner + 'static) -> Self {
        self.commands = Arc::new(commands);
        self
    }

    /// Replace the loopback connector.
    #[must_use]
    pub fn with_network(mut self, network: impl LoopbackConnector + 'static) -> Self {
        self.network = Arc::new(network);
        self
    }

    /// Provide the package registry.
    #[must_use]
    pub fn with_packages(mut self, packages: impl PackageRegistry + 'static) -> Self {
        self.packages = Arc::new(packages);
        self
    }

    /// Provide the settings store.
    #[must_use]
    pub fn with_settings(mut self, settings: impl SettingsStore + 'static) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    /// Provide the application metadata.
    #[must_use]
    pub fn with_app_metadata(mut self, app: impl AppMetadata + 'static) -> Self {
        self.app = Arc::new(app);
        self
    }

    /// Provide the debugger flags.
    #[must_use]
    pub fn with_debug_state(mut self, debug: impl DebugState + 'static) -> Self {
        self.debug = Arc::new(debug);
        self
    }

    /// Provide the class registry.
    #[must_use]
    pub fn with_classes(mut self, classes: impl ClassRegistry + 'static) -> Self {
        self.classes = Arc::new(classes);
        self
    }

    /// Provide build metadata.
    #[must_use]
    pub fn with_build_info(mut self, build: impl BuildInfo + 'static) -> Self {
        self.build = Some(Arc::new(build));
        self
    }

    /// Install one shared object as every platform-only capability.
    ///
    /// Convenient for bridges where a single handle (e.g. a JNI context)
    /// answers all of them.
    #[must_use]
    pub fn with_platform<P>(mut self, platform: Arc<P>) -> Self
    where
        P: PackageRegistry
            + SettingsStore
            + AppMetadata
            + DebugState
            + ClassRegistry
            + BuildInfo
            + 'static,
    {
        self.packages = platform.clone();
        self.settings = platform.clone();
        self.app = platform.clone();
        self.debug = platform.clone();
        self.classes = platform.clone();
        self.build = Some(platform);
        self
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext").finish_non_exhaustive()
    }
}
