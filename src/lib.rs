//! Exposes the modules that are needed by the launcher binaries and the
//! Android application

/// shared logging and filesystem helpers
pub mod common;
/// configuration loading and CLI argument structs
pub mod config;
/// version check, update decision, download and install workflow
pub mod launcher;
/// OS collaborator interfaces and their platform implementations
pub mod platform;
/// slint user interface
pub mod ui;
