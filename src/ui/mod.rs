/// contains library content for android apk
#[cfg(target_os = "android")]
pub mod android;

/// used to import everything that is slint related
pub mod rust_slint_bridge;

use crate::config::config_launcher::LauncherConfig;
use crate::ui::rust_slint_bridge::RustSlintBridge;
use std::error::Error;

pub fn run_ui(config: LauncherConfig) -> Result<(), Box<dyn Error>> {
    let bridge = RustSlintBridge::create()?;
    bridge.schedule_run(config);
    bridge.run()?;

    Ok(())
}
