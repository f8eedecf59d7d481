#![cfg(target_os = "android")]

use crate::common::logging::error;
use crate::config::config_launcher::LauncherConfig;
use crate::platform::android::AndroidPlatform;
use crate::ui::run_ui;

#[no_mangle]
unsafe fn android_main(app: slint::android::AndroidApp) {
    slint::android::init(app).map_err(|e| format!("Could not init slint: {e}")).unwrap();

    let mut config = LauncherConfig::default();
    match AndroidPlatform::external_download_dir() {
        Ok(dir) => config.download_dir = dir,
        Err(e) => error(format!("Could not resolve downloads directory: {e}")),
    }

    run_ui(config).map_err(|e| format!("Could not run UI: {e}")).unwrap();
}
