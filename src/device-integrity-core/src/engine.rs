//! Integrity aggregator.
//!
//! Runs every probe category once, in a fixed order, on the calling thread
//! and folds the results into an [`IntegrityReport`].
//!
//! ## Failure model
//!
//! `evaluate` cannot fail. Each sub-probe swallows its own errors and
//! reports "signal absent", so a probe that lacks permission is
//! indistinguishable from a clean one.

use tracing::{info, instrument, warn};

use crate::config::IntegrityConfig;
use crate::host::HostContext;
use crate::probes::{app, debugger, instrumentation, root, settings};
use crate::report::IntegrityReport;

/// Evaluates device integrity against a host.
///
/// Holds only the immutable probe catalogue; one engine can be shared by
/// any number of threads.
#[derive(Debug, Clone, Default)]
pub struct IntegrityEngine {
    config: IntegrityConfig,
}

impl IntegrityEngine {
    /// Engine with the default probe catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a custom catalogue.
    pub fn with_config(config: IntegrityConfig) -> Self {
        Self { config }
    }

    /// The probe catalogue in use.
    pub fn config(&self) -> &IntegrityConfig {
        &self.config
    }

    /// Run every category and build the report.
    #[instrument(skip_all)]
    pub fn evaluate(&self, host: &HostContext) -> IntegrityReport {
        let config = &self.config;

        let rooted = root::detect_root(host, config);
        let debugger = debugger::detect_debugger(host, config);
        let usb_debug = settings::detect_usb_debug(host);
        let developer_options = settings::detect_developer_options(host);
        let runtime_instrumentation = instrumentation::detect_instrumentation(host, config);
        let app_debuggable = app::detect_app_debuggable(host);

        let report = IntegrityReport::from_categories(
            rooted,
            debugger,
            usb_debug,
            developer_options,
            runtime_instrumentation,
            app_debuggable,
        );

        if report.is_secure() {
            info!("Integrity evaluation: environment secure");
        } else {
            let detected: Vec<&str> = report.detected().iter().map(|c| c.as_str()).collect();
            warn!(detected = ?detected, "Integrity evaluation: environment compromised");
        }

        report
    }
}

/// Evaluate with the default catalogue.
pub fn evaluate(host: &HostContext) -> IntegrityReport {
    IntegrityEngine::new().evaluate(host)
}
