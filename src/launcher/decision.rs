//! Pure decision logic comparing the installed version against the latest
//! available version.

/// Reason attached to [`Decision::Error`] when the latest version could not
/// be determined from the descriptor.
pub const REASON_VERSION_UNPARSEABLE: &str = "version info unparseable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The installed application is already current, start it.
    Launch,
    /// The application is missing or not current, download the installer.
    Download,
    /// The run cannot continue.
    Error { reason: &'static str },
}

/// Decide what to do for one launcher run.
///
/// Versions are compared as exact strings. A textually different but
/// semantically equal version ("1.2" vs "1.2.0") is treated as an update,
/// and so is a downgrade.
pub fn evaluate(
    installed_present: bool,
    installed_version: Option<&str>,
    latest_version: Option<&str>,
) -> Decision {
    if !installed_present {
        return Decision::Download;
    }

    match latest_version {
        None => Decision::Error {
            reason: REASON_VERSION_UNPARSEABLE,
        },
        Some(latest) if installed_version == Some(latest) => Decision::Launch,
        Some(_) => Decision::Download,
    }
}

#[cfg(test)]
mod tests {
    use crate::launcher::decision::{evaluate, Decision, REASON_VERSION_UNPARSEABLE};

    #[test]
    fn test_not_installed_downloads() {
        assert_eq!(evaluate(false, None, Some("1.0.0")), Decision::Download);
    }

    #[test]
    fn test_not_installed_downloads_even_without_latest() {
        assert_eq!(evaluate(false, None, None), Decision::Download);
    }

    #[test]
    fn test_installed_and_current_launches() {
        assert_eq!(evaluate(true, Some("1.0.0"), Some("1.0.0")), Decision::Launch);
    }

    #[test]
    fn test_installed_without_latest_is_error() {
        assert_eq!(
            evaluate(true, Some("1.0.0"), None),
            Decision::Error {
                reason: REASON_VERSION_UNPARSEABLE
            }
        );
    }

    #[test]
    fn test_installed_and_outdated_downloads() {
        assert_eq!(evaluate(true, Some("1.0.0"), Some("1.0.1")), Decision::Download);
    }

    #[test]
    fn test_installed_version_unknown_downloads() {
        assert_eq!(evaluate(true, None, Some("1.0.0")), Decision::Download);
    }

    #[test]
    fn test_no_semantic_comparison() {
        assert_eq!(evaluate(true, Some("1.2"), Some("1.2.0")), Decision::Download);
        assert_eq!(evaluate(true, Some("1.0.1"), Some("1.0.0")), Decision::Download);
    }
}
