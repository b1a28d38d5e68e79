//! Gateway profile configuration.
//!
//! Profiles live in `~/.fluxgate/config.yaml` (or the file named by
//! `FLUXGATE_CONFIG`):
//!
//! ```yaml
//! current_profile: prod
//! profiles:
//!   prod:
//!     url: https://grafana.example.com
//!     api_key: glsa_xxx
//!     timeout_secs: 60
//! ```
//!
//! Individual fields can be overridden with `FLUXGATE_URL`, `FLUXGATE_API_KEY`,
//! `FLUXGATE_ACCESS_TOKEN`, `FLUXGATE_ID_TOKEN` and `FLUXGATE_TIMEOUT_SECS`.

use crate::auth::{GatewayContext, GatewayCredentials};
use fluxgate_error::{find_closest_match, ErrorCode, ErrorContext, FluxgateError, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";
pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_CONFIG: &str = "FLUXGATE_CONFIG";
pub const ENV_PROFILE: &str = "FLUXGATE_PROFILE";
pub const ENV_URL: &str = "FLUXGATE_URL";
pub const ENV_API_KEY: &str = "FLUXGATE_API_KEY";
pub const ENV_ACCESS_TOKEN: &str = "FLUXGATE_ACCESS_TOKEN";
pub const ENV_ID_TOKEN: &str = "FLUXGATE_ID_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "FLUXGATE_TIMEOUT_SECS";

// Secrets are written back as a placeholder, never in clear.
fn serialize_secret<S>(secret: &Option<SecretString>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match secret {
        Some(_) => serializer.serialize_str("[REDACTED]"),
        None => serializer.serialize_none(),
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(SecretString::from))
}

/// Connection settings for one gateway.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct GatewayProfile {
    #[serde(default = "default_url")]
    #[validate(custom(function = "validate_gateway_url"))]
    pub url: String,

    #[serde(
        default,
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<SecretString>,

    #[serde(
        default,
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<SecretString>,

    #[serde(
        default,
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub id_token: Option<SecretString>,

    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 3600))]
    pub timeout_secs: u64,
}

impl Default for GatewayProfile {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_key: None,
            access_token: None,
            id_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn validate_gateway_url(url: &str) -> std::result::Result<(), validator::ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_url")),
    }
}

impl GatewayProfile {
    /// Apply field overrides. `lookup` is `std::env::var` in production.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL) {
            self.url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = Some(SecretString::from(key));
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            self.access_token = Some(SecretString::from(token));
        }
        if let Some(token) = lookup(ENV_ID_TOKEN) {
            self.id_token = Some(SecretString::from(token));
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = secs.trim().parse().map_err(|_| {
                FluxgateError::new(
                    ErrorCode::MissingRequiredField,
                    format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, secs),
                )
            })?;
        }
        Ok(())
    }

    /// Consume the profile into the context threaded through query calls.
    pub fn into_context(self) -> GatewayContext {
        let credentials = GatewayCredentials {
            access_token: self.access_token,
            id_token: self.id_token,
            api_key: self.api_key,
        };
        GatewayContext::new(&self.url, credentials)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// On-disk layout of the config file.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub current_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, GatewayProfile>,
}

impl ConfigFile {
    /// Read the config file, or an empty one if it does not exist.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            let err: FluxgateError = e.into();
            err.with_context(ErrorContext::Config {
                file_path: Some(path.display().to_string()),
                profile: None,
                field: None,
            })
        })
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}

/// Load the active profile from the default config path and the process
/// environment.
pub fn load(profile_arg: Option<&str>) -> Result<GatewayProfile> {
    load_from(&config_path(), profile_arg, |key| env::var(key).ok())
}

/// Load a profile from `path`.
///
/// Profile priority: `profile_arg` > `FLUXGATE_PROFILE` > `current_profile` >
/// `default`. A profile that was asked for by name must exist; the implicit
/// `default` falls back to built-in defaults.
pub fn load_from<F>(path: &Path, profile_arg: Option<&str>, lookup: F) -> Result<GatewayProfile>
where
    F: Fn(&str) -> Option<String>,
{
    let mut file = ConfigFile::read(path)?;

    let requested = profile_arg
        .map(str::to_string)
        .or_else(|| lookup(ENV_PROFILE))
        .or_else(|| file.current_profile.clone());

    let mut profile = match requested {
        Some(name) => file.profiles.remove(&name).ok_or_else(|| {
            let mut err = FluxgateError::new(
                ErrorCode::ProfileNotFound,
                format!("Profile '{}' not found in {}", name, path.display()),
            )
            .with_context(ErrorContext::Config {
                file_path: Some(path.display().to_string()),
                profile: Some(name.clone()),
                field: None,
            });
            if let Some(closest) = find_closest_match(&name, &file.profile_names()) {
                err = err.with_hint(format!("Did you mean '{}'?", closest));
            }
            err
        })?,
        None => file.profiles.remove(DEFAULT_PROFILE).unwrap_or_default(),
    };

    profile.apply_overrides(&lookup)?;
    profile.validate()?;

    tracing::debug!(url = %profile.url, config = %path.display(), "Loaded gateway profile");
    Ok(profile)
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = env::var(ENV_CONFIG) {
        return PathBuf::from(path);
    }

    // ~/.fluxgate/config.yaml
    match dirs::home_dir() {
        Some(home) => home.join(".fluxgate").join("config.yaml"),
        None => PathBuf::from(".fluxgate/config.yaml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthScheme;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    const CONFIG: &str = r#"
current_profile: staging
profiles:
  default:
    url: http://localhost:3000
  staging:
    url: https://staging.example.com/
    api_key: staging-key
    timeout_secs: 10
  production:
    url: https://grafana.example.com
    access_token: acc
    id_token: user
"#;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let profile = load_from(&dir.path().join("nope.yaml"), None, no_env).unwrap();
        assert_eq!(profile.url, DEFAULT_GATEWAY_URL);
        assert_eq!(profile.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(profile.api_key.is_none());
    }

    #[test]
    fn test_current_profile_is_used() {
        let file = write_config(CONFIG);
        let profile = load_from(file.path(), None, no_env).unwrap();
        assert_eq!(profile.url, "https://staging.example.com/");
        assert_eq!(profile.timeout_secs, 10);

        let ctx = profile.into_context();
        assert_eq!(ctx.base_url(), "https://staging.example.com");
        assert_eq!(ctx.timeout(), Duration::from_secs(10));
        assert_eq!(ctx.credentials().scheme(), AuthScheme::ApiKey("staging-key"));
    }

    #[test]
    fn test_profile_priority() {
        let file = write_config(CONFIG);

        let env: HashMap<&str, &str> = [(ENV_PROFILE, "default")].into_iter().collect();
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());
        let profile = load_from(file.path(), None, lookup).unwrap();
        assert_eq!(profile.url, "http://localhost:3000");

        // Explicit argument beats the environment
        let profile = load_from(file.path(), Some("production"), lookup).unwrap();
        assert_eq!(profile.url, "https://grafana.example.com");
    }

    #[test]
    fn test_unknown_profile_suggests_closest() {
        let file = write_config(CONFIG);
        let err = load_from(file.path(), Some("prodution"), no_env).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProfileNotFound);
        assert_eq!(err.hint.as_deref(), Some("Did you mean 'production'?"));
    }

    #[test]
    fn test_env_overrides() {
        let file = write_config(CONFIG);
        let env: HashMap<&str, &str> = [
            (ENV_URL, "https://override.example.com"),
            (ENV_ACCESS_TOKEN, "env-acc"),
            (ENV_ID_TOKEN, "env-user"),
            (ENV_TIMEOUT_SECS, "5"),
        ]
        .into_iter()
        .collect();
        let profile =
            load_from(file.path(), None, |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(profile.url, "https://override.example.com");
        assert_eq!(profile.timeout_secs, 5);
        let ctx = profile.into_context();
        // Token pair from env wins over the profile's api key
        assert_eq!(
            ctx.credentials().scheme(),
            AuthScheme::OnBehalfOf {
                access_token: "env-acc",
                id_token: "env-user"
            }
        );
    }

    #[test]
    fn test_invalid_url_rejected() {
        let file = write_config("profiles:\n  default:\n    url: not a url\n");
        let err = load_from(file.path(), None, no_env).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUrl);
    }

    #[test]
    fn test_timeout_out_of_range_rejected() {
        let file = write_config("profiles:\n  default:\n    timeout_secs: 0\n");
        let err = load_from(file.path(), None, no_env).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
    }

    #[test]
    fn test_malformed_yaml() {
        let file = write_config("profiles: [unclosed");
        let err = load_from(file.path(), None, no_env).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidYaml);
    }

    #[test]
    fn test_secrets_are_redacted_on_serialize() {
        let file = write_config(CONFIG);
        let config = ConfigFile::read(file.path()).unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("staging-key"));
        assert!(yaml.contains("[REDACTED]"));
    }
}
