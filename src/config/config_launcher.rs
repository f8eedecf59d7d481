//! This module contains all data structs that are needed for configuring the
//! launcher binaries. Every value the workflow depends on, including the
//! identity of the target package, is injected here instead of being compiled
//! into the core modules.

use crate::common::fs::resolve_path;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const DEFAULT_PACKAGE_ID: &str = "jp.boi.mementomori.apk";
pub const DEFAULT_VERSION_URL: &str = "https://mememori-game.com/apps/vars.js";
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://mememori-game.com/apps/";
pub const DEFAULT_ARTIFACT_NAME: &str = "mementomori";
pub const USER_AGENT: &str = "MememoriLauncher/1.0";

pub const DEFAULT_VERSION_CHECK_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CliLauncher {
    /// Path to a TOML config file, CLI arguments take precedence
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// URL of the remote version descriptor
    #[arg(long)]
    pub version_url: Option<String>,
    /// Base URL the installer artifact is downloaded from
    #[arg(long)]
    pub download_base_url: Option<String>,
    /// Package id of the target application
    #[arg(short, long)]
    pub package_id: Option<String>,
    /// Directory downloaded installer artifacts are stored in
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,
}

impl CliLauncher {
    /// Build the effective launcher configuration from the config file
    /// (if any) overlaid with the CLI arguments.
    pub fn into_config(self) -> Result<LauncherConfig, String> {
        let mut config = match &self.config {
            Some(path) => LauncherConfig::load(path)?,
            None => LauncherConfig::default(),
        };

        if let Some(version_url) = self.version_url {
            config.version_url = version_url;
        }
        if let Some(download_base_url) = self.download_base_url {
            config.download_base_url = download_base_url;
        }
        if let Some(package_id) = self.package_id {
            config.package_id = package_id;
        }
        if let Some(download_dir) = self.download_dir {
            config.download_dir = resolve_path(&download_dir);
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LauncherConfig {
    #[serde(default = "default_version_url")]
    pub version_url: String,
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,
    #[serde(default = "default_package_id")]
    pub package_id: String,
    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    #[serde(default = "default_version_check_timeout_secs")]
    pub version_check_timeout_secs: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for LauncherConfig {
    fn default() -> LauncherConfig {
        LauncherConfig {
            version_url: default_version_url(),
            download_base_url: default_download_base_url(),
            package_id: default_package_id(),
            artifact_name: default_artifact_name(),
            state_dir: default_state_dir(),
            download_dir: default_download_dir(),
            version_check_timeout_secs: default_version_check_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
        }
    }
}

impl LauncherConfig {
    pub fn load(path: &Path) -> Result<LauncherConfig, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Could not read {path:?}: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Could not parse {path:?}: {e}"))
    }

    /// File name of the installer artifact for the given version, e.g.
    /// `mementomori_1.2.3.apk`
    pub fn artifact_file_name(&self, version: &str) -> String {
        format!("{}_{version}.apk", self.artifact_name)
    }

    pub fn artifact_url(&self, version: &str) -> String {
        format!("{}{}", self.download_base_url, self.artifact_file_name(version))
    }

    pub fn artifact_path(&self, version: &str) -> PathBuf {
        self.download_dir.join(self.artifact_file_name(version))
    }
}

fn default_version_url() -> String {
    DEFAULT_VERSION_URL.to_string()
}

fn default_download_base_url() -> String {
    DEFAULT_DOWNLOAD_BASE_URL.to_string()
}

fn default_package_id() -> String {
    DEFAULT_PACKAGE_ID.to_string()
}

fn default_artifact_name() -> String {
    DEFAULT_ARTIFACT_NAME.to_string()
}

fn default_state_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(env::temp_dir).join("mememori-launcher")
}

fn default_download_dir() -> PathBuf {
    default_state_dir().join("downloads")
}

fn default_version_check_timeout_secs() -> u64 {
    DEFAULT_VERSION_CHECK_TIMEOUT_SECS
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}
