//! This module drives a single launcher run: permission gate, version
//! check, update decision and the resulting download/install or launch.

use crate::common::logging::{error, info};
use crate::config::config_launcher::LauncherConfig;
use crate::launcher::decision::{evaluate, Decision};
use crate::launcher::downloader::{DownloadTask, Downloader, Progress};
use crate::launcher::error::LauncherError;
use crate::launcher::install::InstallLauncher;
use crate::launcher::version_source::VersionSource;
use crate::platform::{AppRegistry, PackageInstaller, PermissionGate};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// compares installed and latest versions and picks an action
pub mod decision;
/// streams the installer artifact to disk
pub mod downloader;
pub mod error;
/// dispatches install and launch to the OS collaborators
pub mod install;
/// fetches and parses the remote version descriptor
pub mod version_source;

/// Phases of one run. A run is single-shot: states are only ever entered
/// once and there is no way back to CheckingVersion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherState {
    Init,
    PermissionPending,
    CheckingVersion,
    Launching,
    Downloading,
    Installing,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The installed application was current and has been started.
    Launched,
    /// An updated artifact was downloaded and handed to the installer.
    Installed(PathBuf),
}

/// Everything a run reports while it executes. Progress events strictly
/// precede the terminal Done/Failed state of the run.
#[derive(Debug, Clone, PartialEq)]
pub enum LauncherEvent {
    State(LauncherState),
    Status(String),
    Progress(Progress),
}

pub struct Launcher<'a> {
    config: &'a LauncherConfig,
    registry: &'a dyn AppRegistry,
    gate: &'a dyn PermissionGate,
    installer: &'a dyn PackageInstaller,
}

impl<'a> Launcher<'a> {
    pub fn create(
        config: &'a LauncherConfig,
        registry: &'a dyn AppRegistry,
        gate: &'a dyn PermissionGate,
        installer: &'a dyn PackageInstaller,
    ) -> Launcher<'a> {
        Launcher {
            config,
            registry,
            gate,
            installer,
        }
    }

    /// Execute one run. Events are delivered on the calling thread; callers
    /// that own user-facing state on another thread are expected to marshal
    /// inside `on_event`. All errors are terminal for the run.
    pub fn run<F: Fn(LauncherEvent)>(&self, on_event: F) -> Result<Outcome, LauncherError> {
        let result = self.run_flow(&on_event);

        match &result {
            Ok(_) => on_event(LauncherEvent::State(LauncherState::Done)),
            Err(e) => {
                error(e);
                on_event(LauncherEvent::State(LauncherState::Failed));
            }
        }

        result
    }

    fn run_flow<F: Fn(LauncherEvent)>(&self, on_event: &F) -> Result<Outcome, LauncherError> {
        on_event(LauncherEvent::State(LauncherState::Init));

        on_event(LauncherEvent::State(LauncherState::PermissionPending));
        self.check_permission(on_event)?;

        on_event(LauncherEvent::State(LauncherState::CheckingVersion));
        on_event(LauncherEvent::Status("Checking for the latest version...".to_string()));

        let source = VersionSource::create(
            &self.config.artifact_name,
            Duration::from_secs(self.config.version_check_timeout_secs),
        )?;
        let descriptor = source.fetch(&self.config.version_url)?;
        let latest = source.extract_version(&descriptor);
        info(&format!("Latest available version: {latest:?}"));

        let package_id = &self.config.package_id;
        let installed_present = self.registry.is_installed(package_id);
        let installed_version = self.registry.installed_version(package_id);
        info(&format!(
            "Package {package_id} installed: {installed_present}, version: {installed_version:?}"
        ));

        let install_launcher = InstallLauncher::create(self.registry, self.installer);

        match evaluate(installed_present, installed_version.as_deref(), latest.as_deref()) {
            Decision::Error { .. } => Err(LauncherError::Parse),
            Decision::Launch => {
                if let Some(version) = &latest {
                    self.delete_stale_artifact(version)?;
                }

                on_event(LauncherEvent::State(LauncherState::Launching));
                on_event(LauncherEvent::Status("Application is up to date, launching".to_string()));
                install_launcher.launch_existing(package_id)?;
                on_event(LauncherEvent::Status("Application launched".to_string()));
                Ok(Outcome::Launched)
            }
            Decision::Download => {
                // a missing application with an undeterminable latest version
                // would yield a nonsense artifact URL, treat it like the
                // unparseable-descriptor case
                let version = latest.ok_or(LauncherError::Parse)?;

                on_event(LauncherEvent::State(LauncherState::Downloading));
                on_event(LauncherEvent::Status("Starting download...".to_string()));

                let task = DownloadTask {
                    url: self.config.artifact_url(&version),
                    destination: self.config.artifact_path(&version),
                    expected_total_bytes: None,
                };
                let downloader =
                    Downloader::create(Duration::from_secs(self.config.download_timeout_secs))?;
                let artifact =
                    downloader.fetch(&task, |progress| on_event(LauncherEvent::Progress(progress)))?;

                on_event(LauncherEvent::Status("Download complete".to_string()));
                on_event(LauncherEvent::State(LauncherState::Installing));
                install_launcher.install(&artifact)?;
                Ok(Outcome::Installed(artifact))
            }
        }
    }

    fn check_permission<F: Fn(LauncherEvent)>(&self, on_event: &F) -> Result<(), LauncherError> {
        if self.gate.can_install_unknown_sources() {
            return Ok(());
        }

        on_event(LauncherEvent::Status(
            "Requesting permission to install applications".to_string(),
        ));
        let granted = match self.gate.request_install_permission() {
            Ok(granted) => granted,
            Err(e) => {
                error(format!("Could not request install permission: {e}"));
                false
            }
        };

        if granted {
            Ok(())
        } else {
            Err(LauncherError::Permission)
        }
    }

    /// A leftover artifact of the version that is already installed serves
    /// no purpose anymore and is removed before launching.
    fn delete_stale_artifact(&self, version: &str) -> Result<(), LauncherError> {
        let stale = self.config.artifact_path(version);
        if stale.exists() {
            info(&format!("Deleting stale artifact {stale:?}"));
            fs::remove_file(&stale).map_err(|e| {
                LauncherError::Storage(format!("Could not delete stale artifact {stale:?}: {e}"))
            })?;
        }
        Ok(())
    }
}

/// Run the whole workflow against the platform implementations of the
/// current target.
pub fn run_launcher<F: Fn(LauncherEvent)>(
    config: &LauncherConfig,
    on_event: F,
) -> Result<Outcome, LauncherError> {
    #[cfg(not(target_os = "android"))]
    {
        use crate::platform::host::{HostInstaller, HostPermissionGate, HostRegistry};

        let registry = HostRegistry::create(&config.state_dir);
        let gate = HostPermissionGate;
        let installer = HostInstaller;
        Launcher::create(config, &registry, &gate, &installer).run(on_event)
    }

    #[cfg(target_os = "android")]
    {
        use crate::platform::android::AndroidPlatform;

        let platform = AndroidPlatform::create().map_err(LauncherError::Launch)?;
        Launcher::create(config, &platform, &platform, &platform).run(on_event)
    }
}
