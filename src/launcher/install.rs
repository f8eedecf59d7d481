//! Hands a downloaded artifact to the OS installer, or starts the already
//! installed application.

use crate::common::logging::info;
use crate::launcher::error::LauncherError;
use crate::platform::{AppRegistry, PackageInstaller};
use std::path::Path;

pub struct InstallLauncher<'a> {
    registry: &'a dyn AppRegistry,
    installer: &'a dyn PackageInstaller,
}

impl<'a> InstallLauncher<'a> {
    pub fn create(
        registry: &'a dyn AppRegistry,
        installer: &'a dyn PackageInstaller,
    ) -> InstallLauncher<'a> {
        InstallLauncher {
            registry,
            installer,
        }
    }

    /// Hand the artifact to the OS installer. Failures are reported, never
    /// retried. A permission revoked between the gate check and this call
    /// surfaces here as a launch error.
    pub fn install(&self, artifact: &Path) -> Result<(), LauncherError> {
        info(&format!("Starting install of {artifact:?}"));
        self.installer.install_package(artifact).map_err(LauncherError::Launch)
    }

    /// Resolve and start the installed application's entry point. A package
    /// without a resolvable entry point is always an error, even though the
    /// registry reports it as installed.
    pub fn launch_existing(&self, package_id: &str) -> Result<(), LauncherError> {
        let entry = self
            .registry
            .launch_entry(package_id)
            .ok_or_else(|| LauncherError::Launch(format!("No entry point for {package_id}")))?;

        info(&format!("Starting {package_id}"));
        self.registry.start_entry(&entry).map_err(LauncherError::Launch)
    }
}
