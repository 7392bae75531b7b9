//! # device-integrity-ffi
//!
//! C-compatible FFI interface for the device integrity engine.
//!
//! ## Usage
//!
//! ```c
//! #include "device_integrity.h"
//!
//! int main() {
//!     uint8_t* response_data = NULL;
//!     size_t response_len = 0;
//!
//!     int result = device_integrity_execute("isSecure", &response_data, &response_len);
//!     if (result == 0) {
//!         // {"rooted":false,...,"isSecure":true}
//!         device_integrity_free(response_data);
//!     }
//!     return 0;
//! }
//! ```
//!
//! Android apps call `IntegrityBridge.nativeExecute(context, action)`
//! instead; see the `android` module.

#![allow(clippy::missing_safety_doc)] // FFI functions are inherently unsafe

pub mod bridge;

#[cfg(target_os = "android")]
mod android;

use std::ffi::{c_void, CStr};
use std::sync::Once;

use device_integrity_core::HostContext;

pub use bridge::{dispatch, Action, BridgeError};

/// Error codes returned by FFI functions.
#[repr(C)]
pub enum DeviceIntegrityError {
    /// Success.
    Success = 0,
    /// Invalid argument.
    InvalidArgument = -1,
    /// The action is not handled by this library.
    UnhandledAction = -2,
    /// Serialization error.
    SerializationError = -4,
    /// Internal error.
    InternalError = -99,
}

impl From<&BridgeError> for DeviceIntegrityError {
    fn from(err: &BridgeError) -> Self {
        match err {
            BridgeError::Serialization(_) => Self::SerializationError,
        }
    }
}

/// Install platform logging once per process.
pub(crate) fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        #[cfg(target_os = "android")]
        {
            android_logger::init_once(
                android_logger::Config::default()
                    .with_max_level(log::LevelFilter::Info)
                    .with_tag("DeviceIntegrity"),
            );
        }
    });
}

/// Execute an action and return its JSON response.
///
/// # Arguments
///
/// * `action` - Action name (null-terminated), e.g. `"isSecure"`
/// * `response_data` - Output pointer for the UTF-8 JSON response (caller must free with `device_integrity_free`)
/// * `response_len` - Output pointer for response length
///
/// # Returns
///
/// 0 on success, `-2` if the action is not handled, other negative codes on failure.
///
/// # Safety
///
/// - `action` must point to a valid null-terminated string
/// - `response_data` and `response_len` must be valid pointers
#[no_mangle]
pub unsafe extern "C" fn device_integrity_execute(
    action: *const libc::c_char,
    response_data: *mut *mut u8,
    response_len: *mut usize,
) -> i32 {
    if action.is_null() || response_data.is_null() || response_len.is_null() {
        return DeviceIntegrityError::InvalidArgument as i32;
    }
    init_logging();

    let action = match CStr::from_ptr(action).to_str() {
        Ok(s) => s,
        Err(_) => return DeviceIntegrityError::InvalidArgument as i32,
    };

    let response = match dispatch(action, &HostContext::system()) {
        Ok(Some(json)) => json.into_bytes(),
        Ok(None) => return DeviceIntegrityError::UnhandledAction as i32,
        Err(e) => {
            tracing::error!("Action {} failed: {}", action, e);
            return DeviceIntegrityError::from(&e) as i32;
        },
    };

    // Allocate and copy response
    let len = response.len();
    let ptr = libc::malloc(len.max(1)) as *mut u8;
    if ptr.is_null() {
        return DeviceIntegrityError::InternalError as i32;
    }

    std::ptr::copy_nonoverlapping(response.as_ptr(), ptr, len);

    *response_data = ptr;
    *response_len = len;

    DeviceIntegrityError::Success as i32
}

/// Free memory allocated by device integrity functions.
///
/// # Safety
///
/// `data` must be a pointer returned by a device integrity function, or NULL.
#[no_mangle]
pub unsafe extern "C" fn device_integrity_free(data: *mut c_void) {
    if !data.is_null() {
        libc::free(data);
    }
}

/// Get the library version.
///
/// Returns a static string with the version number.
#[no_mangle]
pub extern "C" fn device_integrity_version() -> *const libc::c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const libc::c_char
}
