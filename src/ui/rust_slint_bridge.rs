use crate::common::logging::{error, info};
use crate::config::config_launcher::LauncherConfig;
use crate::launcher::downloader::Progress;
use crate::launcher::{run_launcher, LauncherEvent, LauncherState, Outcome};
use slint::{ComponentHandle, Weak};
use std::error::Error;
use std::thread;
use std::time::Duration;

slint::include_modules!();

pub struct RustSlintBridge {
    app: App,
}

impl RustSlintBridge {
    pub fn create() -> Result<Self, Box<dyn Error>> {
        let app = App::new()?;
        Ok(RustSlintBridge { app })
    }

    /// Schedule the workflow on a worker thread once the event loop runs.
    /// The worker never touches UI state directly, every event is marshalled
    /// onto the UI thread.
    pub fn schedule_run(&self, config: LauncherConfig) {
        let app_weak = self.app.as_weak();
        slint::Timer::single_shot(Duration::from_millis(0), move || {
            let app_weak = app_weak.clone();
            thread::spawn(move || Self::run_workflow(config, app_weak));
        });
    }

    pub fn run(&self) -> Result<(), slint::PlatformError> {
        self.app.run()
    }

    fn run_workflow(config: LauncherConfig, app_weak: Weak<App>) {
        let events_weak = app_weak.clone();
        let result = run_launcher(&config, move |event| Self::apply_event(&events_weak, event));

        match result {
            Ok(Outcome::Launched) => {
                info("Application launched, closing the launcher");
                let _ = slint::invoke_from_event_loop(|| {
                    let _ = slint::quit_event_loop();
                });
            }
            Ok(Outcome::Installed(path)) => {
                info(&format!("Installer started for {path:?}"));
                Self::set_status(&app_weak, "Waiting for the installer to finish");
            }
            Err(e) => {
                Self::set_status(&app_weak, &format!("Error: {e}"));
                Self::notify_failure(&e.to_string());
            }
        }
    }

    fn apply_event(app_weak: &Weak<App>, event: LauncherEvent) {
        let _ = app_weak.upgrade_in_event_loop(move |app| {
            let bridge = app.global::<SlintRustBridge>();
            match event {
                LauncherEvent::Status(message) => bridge.set_status_text(message.into()),
                LauncherEvent::Progress(progress) => Self::apply_progress(&bridge, progress),
                LauncherEvent::State(state) => Self::apply_state(&bridge, state),
            }
        });
    }

    fn apply_progress(bridge: &SlintRustBridge<'_>, progress: Progress) {
        bridge.set_progress_visible(true);
        match progress.percent() {
            Some(pct) => {
                bridge.set_progress_indeterminate(false);
                bridge.set_progress(f32::from(pct) / 100.0);
                bridge.set_status_text(format!("Downloading... {pct}%").into());
            }
            None => bridge.set_progress_indeterminate(true),
        }
    }

    fn apply_state(bridge: &SlintRustBridge<'_>, state: LauncherState) {
        match state {
            LauncherState::Downloading => {
                bridge.set_progress_visible(true);
                bridge.set_progress_indeterminate(true);
            }
            LauncherState::Installing | LauncherState::Done => {
                bridge.set_progress_indeterminate(false);
                bridge.set_progress(1.0);
            }
            LauncherState::Failed => bridge.set_progress_visible(false),
            _ => {}
        }
    }

    fn set_status(app_weak: &Weak<App>, message: &str) {
        let message = message.to_string();
        let _ = app_weak.upgrade_in_event_loop(move |app| {
            app.global::<SlintRustBridge>().set_status_text(message.into());
        });
    }

    /// Desktop counterpart of the transient toast shown on Android.
    #[cfg(not(target_os = "android"))]
    fn notify_failure(message: &str) {
        if let Err(e) = notify_rust::Notification::new()
            .summary("MementoMori Launcher")
            .body(message)
            .show()
        {
            error(format!("Could not show notification: {e}"));
        }
    }

    #[cfg(target_os = "android")]
    fn notify_failure(message: &str) {
        error(message);
    }
}
