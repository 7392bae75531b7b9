//! USB debugging and developer options.

use super::{signal, Category};
use crate::host::{HostContext, SettingKey};

/// Check if USB/ADB debugging is enabled.
pub fn detect_usb_debug(host: &HostContext) -> bool {
    signal(Category::UsbDebug, "adb_enabled", || {
        Ok(host.settings.get_int(SettingKey::AdbEnabled)? == 1)
    })
}

/// Check if developer options are enabled.
pub fn detect_developer_options(host: &HostContext) -> bool {
    signal(Category::DeveloperOptions, "development_settings_enabled", || {
        Ok(host.settings.get_int(SettingKey::DevelopmentSettingsEnabled)? == 1)
    })
}
