#![cfg(target_os = "android")]

//! Thin JNI layer over the Android context. Only the calls the launcher
//! needs are wrapped here; the collaborator implementations in
//! [`crate::platform::android`] compose them.

use jni::objects::{GlobalRef, JObject, JString, JValue, JValueOwned};
use jni::{JNIEnv, JavaVM};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// see https://developer.android.com/reference/android/content/Intent
pub(crate) const FLAG_GRANT_READ_URI_PERMISSION: i32 = 0x0000_0001;
pub(crate) const FLAG_ACTIVITY_CLEAR_TOP: i32 = 0x0400_0000;
pub(crate) const FLAG_ACTIVITY_NEW_TASK: i32 = 0x1000_0000;

pub(crate) struct AndroidUtil {
    ctx: JObject<'static>,
    vm: JavaVM,
}

impl AndroidUtil {
    pub(crate) fn create() -> Result<AndroidUtil, String> {
        let ctx = ndk_context::android_context();
        let obj = unsafe { JObject::from_raw(ctx.context().cast()) };
        let vm = (unsafe { JavaVM::from_raw(ctx.vm().cast()) })
            .map_err(|e| format!("Could not get JavaVM from raw: {e}"))?;
        Ok(AndroidUtil { ctx: obj, vm })
    }

    /// see https://developer.android.com/reference/android/content/Context#getPackageName()
    pub(crate) fn package_name(&self) -> Result<String, String> {
        let name = self.call_object_method(&self.ctx, "getPackageName", "()Ljava/lang/String;", &[])?;
        self.global_ref_to_string(name)
    }

    /// Application-scoped downloads directory, the Android counterpart of a
    /// download dir on the host.
    pub(crate) fn external_download_dir(&self) -> Result<PathBuf, String> {
        // Environment.DIRECTORY_DOWNLOADS
        let kind = self.new_string("Download")?;
        let dir = self.call_object_method(
            &self.ctx,
            "getExternalFilesDir",
            "(Ljava/lang/String;)Ljava/io/File;",
            &[JValue::from(kind.as_obj())],
        )?;
        let path =
            self.call_object_method(dir.as_obj(), "getAbsolutePath", "()Ljava/lang/String;", &[])?;
        Ok(PathBuf::from(self.global_ref_to_string(path)?))
    }

    fn package_manager(&self) -> Result<GlobalRef, String> {
        self.call_object_method(
            &self.ctx,
            "getPackageManager",
            "()Landroid/content/pm/PackageManager;",
            &[],
        )
    }

    /// see https://developer.android.com/reference/android/content/pm/PackageManager#canRequestPackageInstalls()
    pub(crate) fn can_request_package_installs(&self) -> Result<bool, String> {
        let pm = self.package_manager()?;
        self.call_bool_method(pm.as_obj(), "canRequestPackageInstalls", "()Z", &[])
    }

    pub(crate) fn launch_intent_for_package(
        &self,
        package_id: &str,
    ) -> Result<Option<GlobalRef>, String> {
        let pm = self.package_manager()?;
        let package = self.new_string(package_id)?;
        self.call_nullable_method(
            pm.as_obj(),
            "getLaunchIntentForPackage",
            "(Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::from(package.as_obj())],
        )
    }

    /// versionName of the installed package, None when the package manager
    /// does not know the package (NameNotFoundException).
    pub(crate) fn installed_version(&self, package_id: &str) -> Result<Option<String>, String> {
        let pm = self.package_manager()?;
        let package = self.new_string(package_id)?;
        let info = match self.call_nullable_method(
            pm.as_obj(),
            "getPackageInfo",
            "(Ljava/lang/String;I)Landroid/content/pm/PackageInfo;",
            &[JValue::from(package.as_obj()), JValue::Int(0)],
        ) {
            Ok(Some(info)) => info,
            Ok(None) | Err(_) => return Ok(None),
        };
        self.string_field(info.as_obj(), "versionName")
    }

    /// see https://developer.android.com/reference/android/net/Uri#parse(java.lang.String)
    pub(crate) fn uri_parse(&self, url: &str) -> Result<GlobalRef, String> {
        let url_string = self.new_string(url)?;
        self.call_static_object_method(
            "android/net/Uri",
            "parse",
            "(Ljava/lang/String;)Landroid/net/Uri;",
            &[JValue::from(url_string.as_obj())],
        )
    }

    /// content:// uri for the artifact through the application's
    /// FileProvider, the grant the installer process needs to read it is
    /// added via [`FLAG_GRANT_READ_URI_PERMISSION`] on the install intent.
    pub(crate) fn file_provider_uri(&self, artifact: &Path) -> Result<GlobalRef, String> {
        let authority = self.new_string(&format!("{}.provider", self.package_name()?))?;
        let path_string = self.new_string(&artifact.to_string_lossy())?;

        let mut env = self.get_env()?;
        let file = env
            .new_object(
                "java/io/File",
                "(Ljava/lang/String;)V",
                &[JValue::from(path_string.as_obj())],
            )
            .map_err(|err| format!("Failed to create File object: {err}"))?;

        let result = env.call_static_method(
            "androidx/core/content/FileProvider",
            "getUriForFile",
            "(Landroid/content/Context;Ljava/lang/String;Ljava/io/File;)Landroid/net/Uri;",
            &[
                JValue::from(&self.ctx),
                JValue::from(authority.as_obj()),
                JValue::from(&file),
            ],
        );
        let uri = Self::unpack_call_result(&mut env, result, "getUriForFile")?;
        env.new_global_ref(&uri).map_err(|err| format!("Failed to create global ref: {err}"))
    }

    pub(crate) fn new_intent(&self, action: &str) -> Result<GlobalRef, String> {
        let action_string = self.new_string(action)?;
        let mut env = self.get_env()?;
        let intent = env
            .new_object(
                "android/content/Intent",
                "(Ljava/lang/String;)V",
                &[JValue::from(action_string.as_obj())],
            )
            .map_err(|err| format!("Failed to create intent: {err}"))?;
        env.new_global_ref(&intent).map_err(|err| format!("Failed to create global ref: {err}"))
    }

    pub(crate) fn new_intent_with_uri(
        &self,
        action: &str,
        uri: &GlobalRef,
    ) -> Result<GlobalRef, String> {
        let action_string = self.new_string(action)?;
        let mut env = self.get_env()?;
        let intent = env
            .new_object(
                "android/content/Intent",
                "(Ljava/lang/String;Landroid/net/Uri;)V",
                &[JValue::from(action_string.as_obj()), JValue::from(uri.as_obj())],
            )
            .map_err(|err| format!("Failed to create intent: {err}"))?;
        env.new_global_ref(&intent).map_err(|err| format!("Failed to create global ref: {err}"))
    }

    pub(crate) fn set_data_and_type(
        &self,
        intent: &GlobalRef,
        uri: &GlobalRef,
        mime: &str,
    ) -> Result<(), String> {
        let mime_string = self.new_string(mime)?;
        self.call_nullable_method(
            intent.as_obj(),
            "setDataAndType",
            "(Landroid/net/Uri;Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::from(uri.as_obj()), JValue::from(mime_string.as_obj())],
        )?;
        Ok(())
    }

    pub(crate) fn add_intent_flags(&self, intent: &GlobalRef, flags: i32) -> Result<(), String> {
        self.call_nullable_method(
            intent.as_obj(),
            "addFlags",
            "(I)Landroid/content/Intent;",
            &[JValue::Int(flags)],
        )?;
        Ok(())
    }

    /// see https://developer.android.com/reference/android/content/Context#startActivity(android.content.Intent)
    pub(crate) fn start_activity(&self, intent: &GlobalRef) -> Result<(), String> {
        let mut env = self.get_env()?;
        let result = env.call_method(
            &self.ctx,
            "startActivity",
            "(Landroid/content/Intent;)V",
            &[JValue::from(intent.as_obj())],
        );
        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                Self::clear_pending_exception(&mut env);
                Err(format!("Failed to start activity: {err}"))
            }
        }
    }

    fn call_object_method(
        &self,
        obj: &JObject,
        name: &str,
        sig: &str,
        args: &[JValue],
    ) -> Result<GlobalRef, String> {
        self.call_nullable_method(obj, name, sig, args)?
            .ok_or(format!("{name} unexpectedly returned null"))
    }

    fn call_nullable_method(
        &self,
        obj: &JObject,
        name: &str,
        sig: &str,
        args: &[JValue],
    ) -> Result<Option<GlobalRef>, String> {
        let mut env = self.get_env()?;
        let result = env.call_method(obj, name, sig, args);
        let value = Self::unpack_call_result(&mut env, result, name)?;
        if value.is_null() {
            return Ok(None);
        }
        env.new_global_ref(&value)
            .map(Some)
            .map_err(|err| format!("Failed to create global ref: {err}"))
    }

    fn call_static_object_method(
        &self,
        class: &str,
        name: &str,
        sig: &str,
        args: &[JValue],
    ) -> Result<GlobalRef, String> {
        let mut env = self.get_env()?;
        let result = env.call_static_method(class, name, sig, args);
        let value = Self::unpack_call_result(&mut env, result, name)?;
        env.new_global_ref(&value).map_err(|err| format!("Failed to create global ref: {err}"))
    }

    fn call_bool_method(
        &self,
        obj: &JObject,
        name: &str,
        sig: &str,
        args: &[JValue],
    ) -> Result<bool, String> {
        let mut env = self.get_env()?;
        match env.call_method(obj, name, sig, args) {
            Ok(value) => {
                value.z().map_err(|err| format!("Failed to unwrap result of {name}: {err}"))
            }
            Err(err) => {
                Self::clear_pending_exception(&mut env);
                Err(format!("Failed to call {name}: {err}"))
            }
        }
    }

    fn string_field(&self, obj: &JObject, name: &str) -> Result<Option<String>, String> {
        let mut env = self.get_env()?;
        let value = env
            .get_field(obj, name, "Ljava/lang/String;")
            .map_err(|err| format!("Failed to read field {name}: {err}"))?
            .l()
            .map_err(|err| format!("Failed to unwrap field {name}: {err}"))?;
        if value.is_null() {
            return Ok(None);
        }
        let global = env
            .new_global_ref(&value)
            .map_err(|err| format!("Failed to create global ref: {err}"))?;
        self.global_ref_to_string(global).map(Some)
    }

    fn new_string(&self, string: &str) -> Result<GlobalRef, String> {
        let env = self.get_env()?;
        let j_string =
            env.new_string(string).map_err(|err| format!("Failed to create new string: {err:?}"))?;
        env.new_global_ref(&j_string)
            .map_err(|err| format!("Failed to create global ref: {err}"))
    }

    fn global_ref_to_string(&self, global_ref: GlobalRef) -> Result<String, String> {
        let mut env = self.get_env()?;
        let j_str: &JString =
            global_ref.deref().try_into().map_err(|err| format!("Failed to deref: {err:?}"))?;
        let rust_str: String =
            env.get_string(j_str).map_err(|err| format!("Failed to get_string: {err:?}"))?.into();
        Ok(rust_str)
    }

    fn unpack_call_result<'local>(
        env: &mut JNIEnv<'local>,
        result: jni::errors::Result<JValueOwned<'local>>,
        name: &str,
    ) -> Result<JObject<'local>, String> {
        match result {
            Ok(value) => {
                value.l().map_err(|err| format!("Failed to unwrap result of {name}: {err}"))
            }
            Err(err) => {
                Self::clear_pending_exception(env);
                Err(format!("Failed to call {name}: {err}"))
            }
        }
    }

    /// A thrown Java exception stays pending on the thread and would poison
    /// every following JNI call, it has to be cleared before continuing.
    fn clear_pending_exception(env: &mut JNIEnv) {
        if env.exception_check().unwrap_or(false) {
            let _ = env.exception_clear();
        }
    }

    fn get_env(&self) -> Result<JNIEnv, String> {
        // permanent attach: global refs handed out by the helpers above stay
        // usable across calls on the same worker thread
        self.vm
            .attach_current_thread_permanently()
            .map_err(|err| format!("Failed to attach vm to current thread: {err}"))
    }
}
