//! The composite integrity verdict.

use serde::Serialize;

use crate::probes::Category;

/// Result of one evaluation.
///
/// Serializes to the bridge payload:
///
/// ```json
/// {"rooted":false,"debugger":false,"usbDebug":true,"developerOptions":true,
///  "frida":false,"appDebuggable":false,"isSecure":false}
/// ```
///
/// `is_secure` is derived at construction and cannot disagree with the
/// category fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    rooted: bool,
    debugger: bool,
    usb_debug: bool,
    developer_options: bool,
    #[serde(rename = "frida")]
    runtime_instrumentation: bool,
    app_debuggable: bool,
    is_secure: bool,
}

impl IntegrityReport {
    /// Build a report from the six category results.
    #[must_use]
    pub fn from_categories(
        rooted: bool,
        debugger: bool,
        usb_debug: bool,
        developer_options: bool,
        runtime_instrumentation: bool,
        app_debuggable: bool,
    ) -> Self {
        let compromised = rooted
            || debugger
            || usb_debug
            || developer_options
            || runtime_instrumentation
            || app_debuggable;
        Self {
            rooted,
            debugger,
            usb_debug,
            developer_options,
            runtime_instrumentation,
            app_debuggable,
            is_secure: !compromised,
        }
    }

    /// No category fired.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.is_secure
    }

    /// Root indicators found.
    #[must_use]
    pub fn rooted(&self) -> bool {
        self.rooted
    }

    /// Debugger attached, awaited, or tracing.
    #[must_use]
    pub fn debugger(&self) -> bool {
        self.debugger
    }

    /// USB debugging enabled.
    #[must_use]
    pub fn usb_debug(&self) -> bool {
        self.usb_debug
    }

    /// Developer options enabled.
    #[must_use]
    pub fn developer_options(&self) -> bool {
        self.developer_options
    }

    /// Instrumentation framework detected.
    #[must_use]
    pub fn runtime_instrumentation(&self) -> bool {
        self.runtime_instrumentation
    }

    /// Application built debuggable.
    #[must_use]
    pub fn app_debuggable(&self) -> bool {
        self.app_debuggable
    }

    /// Result for a single category.
    #[must_use]
    pub fn get(&self, category: Category) -> bool {
        match category {
            Category::Root => self.rooted,
            Category::Debugger => self.debugger,
            Category::UsbDebug => self.usb_debug,
            Category::DeveloperOptions => self.developer_options,
            Category::RuntimeInstrumentation => self.runtime_instrumentation,
            Category::AppDebuggable => self.app_debuggable,
        }
    }

    /// Categories that fired, in evaluation order.
    #[must_use]
    pub fn detected(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|category| self.get(*category))
            .collect()
    }
}
