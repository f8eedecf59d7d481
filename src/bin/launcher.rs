use clap::Parser;
use mememori_launcher::common::logging::info;
use mememori_launcher::config::config_launcher::CliLauncher;
use mememori_launcher::launcher::{run_launcher, LauncherEvent, Outcome};

fn main() -> Result<(), String> {
    let config = CliLauncher::parse().into_config()?;

    let outcome = run_launcher(&config, |event| match event {
        LauncherEvent::Status(message) => info(&message),
        LauncherEvent::Progress(progress) => match progress.percent() {
            Some(pct) => info(&format!("Downloading... {pct}%")),
            None => info(&format!("Downloading... {} bytes", progress.bytes_transferred)),
        },
        LauncherEvent::State(_) => {}
    })
    .map_err(|e| e.to_string())?;

    match outcome {
        Outcome::Launched => info("Application launched"),
        Outcome::Installed(path) => info(&format!("Installer started for {path:?}")),
    }

    Ok(())
}
