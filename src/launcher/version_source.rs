//! Fetches the remote version descriptor and extracts the latest available
//! version from it.

use crate::common::logging::info;
use crate::config::config_launcher::USER_AGENT;
use crate::launcher::error::LauncherError;
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_CHARSET, CONTENT_TYPE};
use std::sync::LazyLock;
use std::time::Duration;

/// Direct assignment of the version inside the descriptor,
/// e.g. `var apkVersion = '1.2.3';`
static DIRECT_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var apkVersion = '([0-9.]+)';").expect("hard-coded pattern is valid")
});

/// Everything Unicode classifies as "other" except CR, LF and TAB. Stripped
/// from the decoded descriptor before matching, malformed upstream payloads
/// have been observed to contain stray control bytes.
static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{C}--[\r\n\t]]").expect("hard-coded pattern is valid"));

pub struct VersionSource {
    client: Client,
    filename_version: Regex,
}

impl VersionSource {
    /// Create a new VersionSource instance
    ///
    /// * `artifact_name` - base name of the installer artifact, used by the
    ///   fallback extraction pattern
    /// * `timeout` - connect and read timeout for the descriptor fetch
    pub fn create(artifact_name: &str, timeout: Duration) -> Result<Self, LauncherError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("UTF-8"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(LauncherError::transport)?;

        let pattern = format!(r"/apps/{}_([0-9.]+)\.apk", regex::escape(artifact_name));
        let filename_version =
            Regex::new(&pattern).expect("escaped artifact name yields a valid pattern");

        Ok(VersionSource {
            client,
            filename_version,
        })
    }

    /// Fetch the raw version descriptor text. The response is decoded using
    /// the charset declared in the Content-Type header (UTF-8 when absent)
    /// and sanitized of control characters.
    pub fn fetch(&self, url: &str) -> Result<String, LauncherError> {
        info(&format!("Fetching version descriptor from {url}"));

        let response = self.client.get(url).send().map_err(LauncherError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::http_status(status.as_u16()));
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_from_content_type);

        let bytes = response.bytes().map_err(LauncherError::transport)?;

        let encoding = charset
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&bytes);

        Ok(CONTROL_CHARS.replace_all(&text, "").into_owned())
    }

    /// Extract the latest version from a descriptor, trying the direct
    /// assignment pattern first and the artifact filename pattern second.
    /// Returns None when neither matches - the version is undeterminable,
    /// which is not an error at this level.
    pub fn extract_version(&self, descriptor: &str) -> Option<String> {
        if descriptor.is_empty() {
            return None;
        }

        if let Some(captures) = DIRECT_VERSION.captures(descriptor) {
            return Some(captures[1].to_string());
        }

        if let Some(captures) = self.filename_version.captures(descriptor) {
            return Some(captures[1].to_string());
        }

        None
    }
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').map(str::trim).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}
