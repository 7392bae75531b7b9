//! # device-integrity-core
//!
//! Best-effort verdict on whether the current process runs in a trustworthy
//! environment: not rooted, not debugged, not instrumented, not built
//! debuggable.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    IntegrityEngine                           │
//! │                                                              │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────────────┐ │
//! │  │   Root   │ │ Debugger │ │ Settings │ │ Instrumentation│ │
//! │  │ 6 probes │ │ 3 probes │ │ adb/dev  │ │    3 probes    │ │
//! │  └──────────┘ └──────────┘ └──────────┘ └────────────────┘ │
//! │                    │  (OR per category)                      │
//! │                    ▼                                         │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │              IntegrityReport                      │      │
//! │  │    six category flags + isSecure = !(any)        │      │
//! │  └──────────────────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//!               HostContext (filesystem, commands, loopback,
//!               packages, settings, app flags, debug flags,
//!               class registry, build tags)
//! ```
//!
//! ## Security Properties
//!
//! - **Fail-open per probe**: a probe that errors reports "not detected"
//! - **Total**: `evaluate` always returns a complete report
//! - **Read-only**: probes never modify system state
//!
//! This is not attestation. Every signal can be spoofed by an attacker who
//! controls the device.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use device_integrity_core::{HostContext, IntegrityEngine};
//!
//! let report = IntegrityEngine::new().evaluate(&HostContext::system());
//! if !report.is_secure() {
//!     // refuse to handle secrets
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::doc_markdown)] // Allow product names without backticks
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

pub mod config;
pub mod engine;
pub mod error;
pub mod hardening;
pub mod host;
pub mod probes;
pub mod report;

pub use config::IntegrityConfig;
pub use engine::{evaluate, IntegrityEngine};
pub use error::ProbeError;
pub use hardening::deny_debugger_if_possible;
pub use host::{
    AppMetadata, BuildInfo, ClassRegistry, CommandOutput, CommandRunner, DebugState, FileSystem,
    HostContext, LoopbackConnector, PackageRegistry, SettingKey, SettingsNamespace, SettingsStore,
};
pub use probes::Category;
pub use report::IntegrityReport;
