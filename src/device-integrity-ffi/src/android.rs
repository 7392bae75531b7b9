//! Android JNI bindings.
//!
//! `IntegrityBridge.nativeExecute(context, action)` runs an action with the
//! platform capabilities answered through the calling app's `Context`.

use std::ptr;
use std::sync::Arc;

use device_integrity_core::{
    AppMetadata, BuildInfo, ClassRegistry, DebugState, HostContext, PackageRegistry, ProbeError,
    SettingKey, SettingsNamespace, SettingsStore,
};
use jni::errors::Error as JniError;
use jni::objects::{GlobalRef, JClass, JObject, JString, JValue};
use jni::sys::jstring;
use jni::{JNIEnv, JavaVM};
use tracing::{debug, error, warn};

use crate::bridge::dispatch;

const LOCAL_FRAME_CAPACITY: i32 = 16;
const NAME_NOT_FOUND: &str = "android/content/pm/PackageManager$NameNotFoundException";

/// Platform capabilities backed by an Android `Context`.
pub(crate) struct JniPlatform {
    vm: JavaVM,
    context: GlobalRef,
}

impl JniPlatform {
    pub(crate) fn new(vm: JavaVM, context: GlobalRef) -> Self {
        Self { vm, context }
    }

    /// Run `f` on an attached thread inside a local reference frame.
    ///
    /// Any pending Java exception is cleared before returning.
    fn call<T, F>(&self, f: F) -> Result<T, JniError>
    where
        F: FnOnce(&mut JNIEnv<'_>, &JObject<'_>) -> Result<T, JniError>,
    {
        let mut env = self.vm.attach_current_thread()?;
        let context = self.context.as_obj();
        let result = env.with_local_frame(LOCAL_FRAME_CAPACITY, |env| f(env, context));
        if env.exception_check().unwrap_or(false) {
            let _ = env.exception_clear();
        }
        result
    }
}

fn platform_error(what: &str, err: JniError) -> ProbeError {
    ProbeError::platform(format!("{what}: {err}"))
}

impl PackageRegistry for JniPlatform {
    fn is_installed(&self, package: &str) -> Result<bool, ProbeError> {
        self.call(|env, context| {
            let manager = env
                .call_method(
                    context,
                    "getPackageManager",
                    "()Landroid/content/pm/PackageManager;",
                    &[],
                )?
                .l()?;
            let name = env.new_string(package)?;
            let lookup = env.call_method(
                &manager,
                "getPackageInfo",
                "(Ljava/lang/String;I)Landroid/content/pm/PackageInfo;",
                &[JValue::Object(&name), JValue::Int(0)],
            );
            match lookup {
                Ok(_) => Ok(true),
                Err(JniError::JavaException) => {
                    let exception = env.exception_occurred()?;
                    env.exception_clear()?;
                    if env.is_instance_of(&exception, NAME_NOT_FOUND)? {
                        Ok(false)
                    } else {
                        Err(JniError::JavaException)
                    }
                },
                Err(e) => Err(e),
            }
        })
        .map_err(|e| platform_error("getPackageInfo", e))
    }
}

impl SettingsStore for JniPlatform {
    fn get_int(&self, key: SettingKey) -> Result<i64, ProbeError> {
        self.call(|env, context| {
            let sdk_int = env
                .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")?
                .i()?;
            let (namespace, name) = key.resolve(sdk_int);
            let class = match namespace {
                SettingsNamespace::Global => "android/provider/Settings$Global",
                SettingsNamespace::Secure => "android/provider/Settings$Secure",
            };
            let resolver = env
                .call_method(
                    context,
                    "getContentResolver",
                    "()Landroid/content/ContentResolver;",
                    &[],
                )?
                .l()?;
            let name = env.new_string(name)?;
            let value = env
                .call_static_method(
                    class,
                    "getInt",
                    "(Landroid/content/ContentResolver;Ljava/lang/String;I)I",
                    &[JValue::Object(&resolver), JValue::Object(&name), JValue::Int(0)],
                )?
                .i()?;
            Ok(i64::from(value))
        })
        .map_err(|e| platform_error(key.name(), e))
    }
}

impl AppMetadata for JniPlatform {
    fn flags(&self) -> Result<u32, ProbeError> {
        self.call(|env, context| {
            let info = env
                .call_method(
                    context,
                    "getApplicationInfo",
                    "()Landroid/content/pm/ApplicationInfo;",
                    &[],
                )?
                .l()?;
            // Java int, reinterpreted as a bit set
            Ok(env.get_field(&info, "flags", "I")?.i()? as u32)
        })
        .map_err(|e| platform_error("ApplicationInfo.flags", e))
    }
}

impl DebugState for JniPlatform {
    fn is_debugger_connected(&self) -> Result<bool, ProbeError> {
        self.call(|env, _| {
            env.call_static_method("android/os/Debug", "isDebuggerConnected", "()Z", &[])?
                .z()
        })
        .map_err(|e| platform_error("Debug.isDebuggerConnected", e))
    }

    fn is_waiting_for_debugger(&self) -> Result<bool, ProbeError> {
        self.call(|env, _| {
            env.call_static_method("android/os/Debug", "waitingForDebugger", "()Z", &[])?
                .z()
        })
        .map_err(|e| platform_error("Debug.waitingForDebugger", e))
    }
}

impl ClassRegistry for JniPlatform {
    fn is_class_loadable(&self, name: &str) -> bool {
        let loaded = self.call(|env, context| {
            let loader = env
                .call_method(context, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])?
                .l()?;
            let name = env.new_string(name)?;
            env.call_static_method(
                "java/lang/Class",
                "forName",
                "(Ljava/lang/String;ZLjava/lang/ClassLoader;)Ljava/lang/Class;",
                &[JValue::Object(&name), JValue::Bool(0), JValue::Object(&loader)],
            )?;
            Ok(())
        });
        loaded.is_ok()
    }
}

impl BuildInfo for JniPlatform {
    fn tags(&self) -> Result<String, ProbeError> {
        self.call(|env, _| {
            let tags = env
                .get_static_field("android/os/Build", "TAGS", "Ljava/lang/String;")?
                .l()?;
            if tags.is_null() {
                return Ok(String::new());
            }
            let tags = JString::from(tags);
            let tags: String = env.get_string(&tags)?.into();
            Ok(tags)
        })
        .map_err(|e| platform_error("Build.TAGS", e))
    }
}

fn execute(env: &mut JNIEnv<'_>, context: &JObject<'_>, action: &JString<'_>) -> Result<Option<String>, JniError> {
    let action: String = env.get_string(action)?.into();
    let platform = JniPlatform::new(env.get_java_vm()?, env.new_global_ref(context)?);
    let host = HostContext::system().with_platform(Arc::new(platform));

    match dispatch(&action, &host) {
        Ok(response) => Ok(response),
        Err(e) => {
            error!("Action {} failed: {}", action, e);
            Ok(None)
        },
    }
}

/// Run a bridge action. Returns the JSON response, or `null` when the
/// action is not handled or fails.
#[no_mangle]
pub extern "system" fn Java_io_deviceintegrity_IntegrityBridge_nativeExecute<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    context: JObject<'local>,
    action: JString<'local>,
) -> jstring {
    crate::init_logging();

    if context.is_null() || action.is_null() {
        warn!("nativeExecute: null argument");
        return ptr::null_mut();
    }

    let response = match execute(&mut env, &context, &action) {
        Ok(Some(json)) => json,
        Ok(None) => {
            debug!("nativeExecute: no response");
            return ptr::null_mut();
        },
        Err(e) => {
            error!("nativeExecute: JNI failure: {}", e);
            if env.exception_check().unwrap_or(false) {
                let _ = env.exception_clear();
            }
            return ptr::null_mut();
        },
    };

    match env.new_string(response) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            error!("nativeExecute: failed to create response string: {}", e);
            ptr::null_mut()
        },
    }
}
