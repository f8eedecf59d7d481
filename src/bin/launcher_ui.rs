// Prevent console window in addition to Slint window in Windows release builds when,
// e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use clap::Parser;
use mememori_launcher::config::config_launcher::CliLauncher;
use mememori_launcher::ui::run_ui;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let config = CliLauncher::parse().into_config()?;
    run_ui(config)
}
