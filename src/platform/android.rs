#![cfg(target_os = "android")]

//! Android implementations of the OS collaborators. Everything goes through
//! [`AndroidUtil`]; a fresh instance is created per call because JNI object
//! handles must not be shared across threads.

use crate::common::logging::{error, info};
use crate::platform::android_util::{
    AndroidUtil, FLAG_ACTIVITY_CLEAR_TOP, FLAG_ACTIVITY_NEW_TASK, FLAG_GRANT_READ_URI_PERMISSION,
};
use crate::platform::{AppRegistry, LaunchEntry, PackageInstaller, PermissionGate};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

const ACTION_VIEW: &str = "android.intent.action.VIEW";
const ACTION_MANAGE_UNKNOWN_APP_SOURCES: &str = "android.settings.MANAGE_UNKNOWN_APP_SOURCES";
const PACKAGE_ARCHIVE_MIME: &str = "application/vnd.android.package-archive";

/// How long the settings round-trip is polled for the grant before the
/// request counts as denied.
const PERMISSION_POLL_TIMEOUT: Duration = Duration::from_secs(60);
const PERMISSION_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct AndroidPlatform;

impl AndroidPlatform {
    pub fn create() -> Result<AndroidPlatform, String> {
        // probe the JNI context once so a broken environment fails fast
        AndroidUtil::create()?;
        Ok(AndroidPlatform)
    }

    /// Application-scoped downloads directory of the running app.
    pub fn external_download_dir() -> Result<PathBuf, String> {
        AndroidUtil::create()?.external_download_dir()
    }
}

impl AppRegistry for AndroidPlatform {
    /// A package counts as installed when its launch intent resolves.
    fn is_installed(&self, package_id: &str) -> bool {
        match AndroidUtil::create().and_then(|util| util.launch_intent_for_package(package_id)) {
            Ok(intent) => intent.is_some(),
            Err(e) => {
                error(format!("Could not query launch intent for {package_id}: {e}"));
                false
            }
        }
    }

    fn installed_version(&self, package_id: &str) -> Option<String> {
        match AndroidUtil::create().and_then(|util| util.installed_version(package_id)) {
            Ok(version) => version,
            Err(e) => {
                error(format!("Could not query version of {package_id}: {e}"));
                None
            }
        }
    }

    fn launch_entry(&self, package_id: &str) -> Option<LaunchEntry> {
        // the handle carries the package id, the intent is rebuilt on start
        match AndroidUtil::create().and_then(|util| util.launch_intent_for_package(package_id)) {
            Ok(Some(_)) => Some(LaunchEntry::new(package_id)),
            Ok(None) => None,
            Err(e) => {
                error(format!("Could not resolve entry point of {package_id}: {e}"));
                None
            }
        }
    }

    fn start_entry(&self, entry: &LaunchEntry) -> Result<(), String> {
        let util = AndroidUtil::create()?;
        let intent = util
            .launch_intent_for_package(entry.target())?
            .ok_or(format!("No launch intent for {}", entry.target()))?;
        util.add_intent_flags(&intent, FLAG_ACTIVITY_NEW_TASK)?;
        util.start_activity(&intent)
    }
}

impl PermissionGate for AndroidPlatform {
    fn can_install_unknown_sources(&self) -> bool {
        match AndroidUtil::create().and_then(|util| util.can_request_package_installs()) {
            Ok(can_install) => can_install,
            Err(e) => {
                error(format!("Could not query install permission: {e}"));
                false
            }
        }
    }

    /// Opens the unknown-sources settings screen for this app and polls the
    /// grant while the user is away in the settings activity.
    fn request_install_permission(&self) -> Result<bool, String> {
        let util = AndroidUtil::create()?;
        let uri = util.uri_parse(&format!("package:{}", util.package_name()?))?;
        let intent = util.new_intent_with_uri(ACTION_MANAGE_UNKNOWN_APP_SOURCES, &uri)?;
        util.add_intent_flags(&intent, FLAG_ACTIVITY_NEW_TASK)?;
        util.start_activity(&intent)?;

        info("Waiting for the install permission to be granted in the settings");
        let mut waited = Duration::ZERO;
        while waited < PERMISSION_POLL_TIMEOUT {
            thread::sleep(PERMISSION_POLL_INTERVAL);
            waited += PERMISSION_POLL_INTERVAL;
            if util.can_request_package_installs()? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl PackageInstaller for AndroidPlatform {
    fn install_package(&self, artifact: &Path) -> Result<(), String> {
        let util = AndroidUtil::create()?;
        let uri = util.file_provider_uri(artifact)?;
        let intent = util.new_intent(ACTION_VIEW)?;
        util.set_data_and_type(&intent, &uri, PACKAGE_ARCHIVE_MIME)?;
        util.add_intent_flags(
            &intent,
            FLAG_GRANT_READ_URI_PERMISSION | FLAG_ACTIVITY_CLEAR_TOP | FLAG_ACTIVITY_NEW_TASK,
        )?;
        util.start_activity(&intent)
    }
}
