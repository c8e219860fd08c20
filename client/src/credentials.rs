//! Vendor credential profile loading.
//!
//! Credentials live in `~/.veracode/credentials`, an INI-style profile file:
//!
//! ```ini
//! [default]
//! veracode_api_key_id = 0123abcd...
//! veracode_api_key_secret = <hex>
//! ```
//!
//! `VERACODE_API_KEY_ID` / `VERACODE_API_KEY_SECRET` override the file, and
//! `VERACODE_API_PROFILE` selects a section other than `default`. The secret
//! is hex-decoded at load time so that signing can never fail later over a
//! malformed key.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const KEY_ID_VAR: &str = "VERACODE_API_KEY_ID";
pub const KEY_SECRET_VAR: &str = "VERACODE_API_KEY_SECRET";
pub const PROFILE_VAR: &str = "VERACODE_API_PROFILE";

const DEFAULT_PROFILE: &str = "default";
const KEY_ID_FIELD: &str = "veracode_api_key_id";
const KEY_SECRET_FIELD: &str = "veracode_api_key_secret";

/// API key identifier plus the hex-decoded signing secret.
#[derive(Clone)]
pub struct ApiCredentials {
    api_id: String,
    secret: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("cannot determine home directory")]
    NoHomeDir,
    #[error("failed to read credentials at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("credential profile [{0}] not found")]
    ProfileNotFound(String),
    #[error("credential field {0} is missing or empty")]
    MissingField(&'static str),
    #[error("API key secret is not valid hex")]
    MalformedSecret,
}

impl ApiCredentials {
    /// Build credentials from a key identifier and a hex-encoded secret.
    pub fn new(api_id: impl Into<String>, secret_hex: &str) -> Result<Self, CredentialsError> {
        let api_id = api_id.into();
        if api_id.trim().is_empty() {
            return Err(CredentialsError::MissingField(KEY_ID_FIELD));
        }
        let secret =
            hex::decode(secret_hex.trim()).map_err(|_| CredentialsError::MalformedSecret)?;
        if secret.is_empty() {
            return Err(CredentialsError::MissingField(KEY_SECRET_FIELD));
        }
        Ok(Self { api_id, secret })
    }

    /// Resolve credentials from the environment, falling back to the
    /// profile file. Failure here is fatal to the whole run.
    pub fn load() -> Result<Self, CredentialsError> {
        if let (Ok(id), Ok(secret)) = (
            std::env::var(KEY_ID_VAR),
            std::env::var(KEY_SECRET_VAR),
        ) {
            return Self::new(id, &secret);
        }

        let path = credentials_path().ok_or(CredentialsError::NoHomeDir)?;
        let profile =
            std::env::var(PROFILE_VAR).unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
        Self::load_from_path(&path, &profile)
    }

    pub fn load_from_path(path: &Path, profile: &str) -> Result<Self, CredentialsError> {
        let content = fs::read_to_string(path).map_err(|source| CredentialsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse_profile(&content, profile)
    }

    #[must_use]
    pub fn api_id(&self) -> &str {
        &self.api_id
    }

    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}

// Manual Debug impl to prevent leaking the signing secret in logs.
impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_id", &self.api_id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// `~/.veracode/credentials`, the vendor's conventional location.
#[must_use]
pub fn credentials_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".veracode").join("credentials"))
}

fn parse_profile(content: &str, profile: &str) -> Result<ApiCredentials, CredentialsError> {
    let mut in_profile = false;
    let mut seen_profile = false;
    let mut api_id: Option<String> = None;
    let mut secret: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            in_profile = section.trim() == profile;
            seen_profile |= in_profile;
            continue;
        }
        if !in_profile {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                KEY_ID_FIELD => api_id = Some(value.trim().to_string()),
                KEY_SECRET_FIELD => secret = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    if !seen_profile {
        return Err(CredentialsError::ProfileNotFound(profile.to_string()));
    }
    let api_id = api_id
        .filter(|v| !v.is_empty())
        .ok_or(CredentialsError::MissingField(KEY_ID_FIELD))?;
    let secret = secret
        .filter(|v| !v.is_empty())
        .ok_or(CredentialsError::MissingField(KEY_SECRET_FIELD))?;
    ApiCredentials::new(api_id, &secret)
}
