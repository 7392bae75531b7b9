//! Application build flags.

use super::{signal, Category};
use crate::host::{HostContext, FLAG_DEBUGGABLE};

/// Check if the running application was built debuggable.
pub fn detect_app_debuggable(host: &HostContext) -> bool {
    signal(Category::AppDebuggable, "flag_debuggable", || {
        Ok(host.app.flags()? & FLAG_DEBUGGABLE != 0)
    })
}
