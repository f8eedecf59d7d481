//! Host implementations of the OS collaborators, used by the desktop
//! binaries and as a development stand-in for the Android registry. The
//! registry of installed applications is a TOML manifest in the launcher
//! state directory, a launch entry is a shell command from that manifest,
//! and installing hands the artifact to the system handler.

use crate::common::logging::error;
use crate::platform::{AppRegistry, LaunchEntry, PackageInstaller, PermissionGate};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const MANIFEST_FILE_NAME: &str = "installed.toml";

#[derive(Debug, Default, Deserialize)]
struct InstalledManifest {
    #[serde(default)]
    packages: HashMap<String, InstalledPackage>,
}

#[derive(Debug, Deserialize)]
struct InstalledPackage {
    version: String,
    launch: Option<String>,
}

/// Registry backed by `installed.toml`:
///
/// ```toml
/// [packages."jp.boi.mementomori.apk"]
/// version = "1.0.0"
/// launch = "mementomori --windowed"
/// ```
pub struct HostRegistry {
    manifest_path: PathBuf,
}

impl HostRegistry {
    pub fn create(state_dir: &Path) -> HostRegistry {
        HostRegistry {
            manifest_path: state_dir.join(MANIFEST_FILE_NAME),
        }
    }

    fn manifest(&self) -> InstalledManifest {
        let content = match fs::read_to_string(&self.manifest_path) {
            Ok(content) => content,
            Err(_) => return InstalledManifest::default(),
        };

        match toml::from_str(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                error(format!("Could not parse {:?}: {e}", self.manifest_path));
                InstalledManifest::default()
            }
        }
    }
}

impl AppRegistry for HostRegistry {
    fn is_installed(&self, package_id: &str) -> bool {
        self.manifest().packages.contains_key(package_id)
    }

    fn installed_version(&self, package_id: &str) -> Option<String> {
        self.manifest().packages.get(package_id).map(|package| package.version.clone())
    }

    fn launch_entry(&self, package_id: &str) -> Option<LaunchEntry> {
        self.manifest().packages.get(package_id)?.launch.as_ref().map(LaunchEntry::new)
    }

    fn start_entry(&self, entry: &LaunchEntry) -> Result<(), String> {
        Command::new("sh")
            .arg("-c")
            .arg(entry.target())
            .spawn()
            .map(|_| ())
            .map_err(|e| format!("Could not start {:?}: {e}", entry.target()))
    }
}

/// There is no unknown-sources gate on the host, installs are always
/// permitted.
pub struct HostPermissionGate;

impl PermissionGate for HostPermissionGate {
    fn can_install_unknown_sources(&self) -> bool {
        true
    }

    fn request_install_permission(&self) -> Result<bool, String> {
        Ok(true)
    }
}

pub struct HostInstaller;

impl PackageInstaller for HostInstaller {
    fn install_package(&self, artifact: &Path) -> Result<(), String> {
        open::that(artifact)
            .map_err(|e| format!("Could not open {artifact:?} with the system installer: {e}"))
    }
}
