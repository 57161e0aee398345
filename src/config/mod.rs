//! Client configuration (defaults < file or env < explicit options).

pub mod scopes;

pub use scopes::{available_scopes, is_valid_scope, validate_scopes, Scope};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ValidationError};

pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
pub const DEFAULT_VERIFY: bool = true;
pub const DEFAULT_USER_AGENT: &str = concat!("Solinte-Rust-SDK/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_OAUTH_BASE_URL: &str = "https://solinte.net/OAuth2";
pub const DEFAULT_API_BASE_URL: &str = "https://solinte.net/api.v1";

/// Sparse configuration input; unset fields fall back to defaults.
///
/// # Example
/// ```
/// use solinte::config::{Config, ConfigOptions};
///
/// let options = ConfigOptions::builder()
///     .client_id("my-app")
///     .client_secret("s3cret")
///     .redirect_uri("https://example.com/callback")
///     .timeout(10.0)
///     .build();
/// let config = Config::new(options)?;
/// assert_eq!(config.timeout().as_secs(), 10);
/// # Ok::<(), solinte::error::SolinteError>(())
/// ```
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize)]
pub struct ConfigOptions {
    #[builder(into)]
    pub client_id: Option<String>,
    #[builder(into)]
    pub client_secret: Option<String>,
    #[builder(into)]
    pub redirect_uri: Option<String>,
    /// Request timeout in seconds.
    pub timeout: Option<f64>,
    /// Verify TLS certificates.
    pub verify: Option<bool>,
    #[builder(into)]
    pub user_agent: Option<String>,
    #[builder(into)]
    pub oauth_base_url: Option<String>,
    #[builder(into)]
    pub api_base_url: Option<String>,
    /// Keys the SDK does not interpret, kept for the embedding application.
    #[serde(flatten)]
    #[builder(default)]
    pub extra: BTreeMap<String, Value>,
}

impl ConfigOptions {
    /// Load from `SOLINTE_*` environment variables (a `.env` file is read first if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            client_id: env_var("SOLINTE_CLIENT_ID"),
            client_secret: env_var("SOLINTE_CLIENT_SECRET"),
            redirect_uri: env_var("SOLINTE_REDIRECT_URI"),
            // An unparseable timeout is kept as NaN so validation reports it.
            timeout: env_var("SOLINTE_TIMEOUT").map(|raw| raw.trim().parse().unwrap_or(f64::NAN)),
            verify: env_var("SOLINTE_VERIFY").map(|raw| parse_flag(&raw)),
            user_agent: env_var("SOLINTE_USER_AGENT"),
            oauth_base_url: env_var("SOLINTE_OAUTH_BASE_URL"),
            api_base_url: env_var("SOLINTE_API_BASE_URL"),
            extra: BTreeMap::new(),
        }
    }

    /// Parse a TOML document using the configuration key names.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| {
            let mut errors = BTreeMap::new();
            errors.insert("toml".to_string(), err.message().to_string());
            ValidationError::new("Invalid configuration file", errors).into()
        })
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Overlay every field set in `other` on top of `self`.
    pub fn merge(mut self, other: ConfigOptions) -> Self {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        overlay!(
            client_id,
            client_secret,
            redirect_uri,
            timeout,
            verify,
            user_agent,
            oauth_base_url,
            api_base_url
        );
        self.extra.extend(other.extra);
        self
    }

    fn apply(&mut self, key: &str, value: Value) -> Result<()> {
        match key {
            "client_id" => self.client_id = expect_string(key, value)?,
            "client_secret" => self.client_secret = expect_string(key, value)?,
            "redirect_uri" => self.redirect_uri = expect_string(key, value)?,
            "user_agent" => self.user_agent = expect_string(key, value)?,
            "oauth_base_url" => self.oauth_base_url = expect_string(key, value)?,
            "api_base_url" => self.api_base_url = expect_string(key, value)?,
            "timeout" => {
                self.timeout = match value {
                    Value::Null => None,
                    Value::Number(n) => n.as_f64(),
                    _ => return Err(single_error(key, "timeout must be a positive number")),
                }
            }
            "verify" => {
                self.verify = match value {
                    Value::Null => None,
                    Value::Bool(flag) => Some(flag),
                    _ => return Err(single_error(key, "verify must be a boolean")),
                }
            }
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
        Ok(())
    }
}

/// Validated client configuration.
///
/// Every instance satisfies the configuration invariants: credentials are
/// non-empty, URL fields are absolute URLs and the timeout is positive.
#[derive(Clone)]
pub struct Config {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    timeout: f64,
    request_timeout: Duration,
    verify: bool,
    user_agent: String,
    oauth_base_url: String,
    api_base_url: String,
    extra: BTreeMap<String, Value>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_uri", &self.redirect_uri)
            .field("timeout", &self.timeout)
            .field("verify", &self.verify)
            .field("user_agent", &self.user_agent)
            .field("oauth_base_url", &self.oauth_base_url)
            .field("api_base_url", &self.api_base_url)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Config {
    /// Merge `options` over the defaults and validate.
    ///
    /// All violations are collected into a single validation error.
    pub fn new(options: ConfigOptions) -> Result<Self> {
        let mut errors = BTreeMap::new();

        let client_id = required(&mut errors, "client_id", options.client_id);
        let client_secret = required(&mut errors, "client_secret", options.client_secret);
        let redirect_uri = required(&mut errors, "redirect_uri", options.redirect_uri);
        if !redirect_uri.trim().is_empty() && !is_valid_url(&redirect_uri) {
            errors.insert(
                "redirect_uri".to_string(),
                "redirect_uri must be a valid URL".to_string(),
            );
        }

        let timeout = options.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let request_timeout = parse_timeout(timeout).unwrap_or_else(|| {
            errors.insert(
                "timeout".to_string(),
                "timeout must be a positive number".to_string(),
            );
            Duration::ZERO
        });

        let oauth_base_url = options
            .oauth_base_url
            .unwrap_or_else(|| DEFAULT_OAUTH_BASE_URL.to_string());
        if !is_valid_url(&oauth_base_url) {
            errors.insert(
                "oauth_base_url".to_string(),
                "oauth_base_url must be a valid URL".to_string(),
            );
        }

        let api_base_url = options
            .api_base_url
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !is_valid_url(&api_base_url) {
            errors.insert(
                "api_base_url".to_string(),
                "api_base_url must be a valid URL".to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(ValidationError::new("Invalid configuration", errors).into());
        }

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            timeout,
            request_timeout,
            verify: options.verify.unwrap_or(DEFAULT_VERIFY),
            user_agent: options
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            oauth_base_url,
            api_base_url,
            extra: options.extra,
        })
    }

    /// Build from `SOLINTE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ConfigOptions::from_env())
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn verify(&self) -> bool {
        self.verify
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn oauth_base_url(&self) -> &str {
        &self.oauth_base_url
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Look up any configuration key, including extra keys.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "client_id" => Some(Value::from(self.client_id.as_str())),
            "client_secret" => Some(Value::from(self.client_secret.as_str())),
            "redirect_uri" => Some(Value::from(self.redirect_uri.as_str())),
            "timeout" => Some(Value::from(self.timeout)),
            "verify" => Some(Value::from(self.verify)),
            "user_agent" => Some(Value::from(self.user_agent.as_str())),
            "oauth_base_url" => Some(Value::from(self.oauth_base_url.as_str())),
            "api_base_url" => Some(Value::from(self.api_base_url.as_str())),
            other => self.extra.get(other).filter(|v| !v.is_null()).cloned(),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set a single key and re-validate.
    ///
    /// On failure the configuration is left untouched. `null` resets a
    /// defaulted key to its default.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let mut options = self.to_options();
        options.apply(key, value.into())?;
        *self = Self::new(options)?;
        Ok(())
    }

    /// Every key with its current value.
    pub fn all(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for key in KNOWN_KEYS {
            if let Some(value) = self.get(key) {
                map.insert(key.to_string(), value);
            }
        }
        map
    }

    /// The options that reproduce this configuration.
    pub fn to_options(&self) -> ConfigOptions {
        ConfigOptions {
            client_id: Some(self.client_id.clone()),
            client_secret: Some(self.client_secret.clone()),
            redirect_uri: Some(self.redirect_uri.clone()),
            timeout: Some(self.timeout),
            verify: Some(self.verify),
            user_agent: Some(self.user_agent.clone()),
            oauth_base_url: Some(self.oauth_base_url.clone()),
            api_base_url: Some(self.api_base_url.clone()),
            extra: self.extra.clone(),
        }
    }

    pub fn available_scopes() -> BTreeMap<&'static str, &'static str> {
        scopes::available_scopes()
    }

    pub fn is_valid_scope(name: &str) -> bool {
        scopes::is_valid_scope(name)
    }

    pub fn validate_scopes<S: AsRef<str>>(list: &[S]) -> Result<Vec<String>> {
        scopes::validate_scopes(list)
    }
}

const KNOWN_KEYS: [&str; 8] = [
    "client_id",
    "client_secret",
    "redirect_uri",
    "timeout",
    "verify",
    "user_agent",
    "oauth_base_url",
    "api_base_url",
];

fn required(errors: &mut BTreeMap<String, String>, key: &str, value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            errors.insert(key.to_string(), format!("{key} is required"));
            String::new()
        }
    }
}

fn is_valid_url(raw: &str) -> bool {
    reqwest::Url::parse(raw)
        .map(|url| url.has_host())
        .unwrap_or(false)
}

fn expect_string(key: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(single_error(key, &format!("{key} must be a string"))),
    }
}

fn single_error(key: &str, message: &str) -> crate::error::SolinteError {
    let mut errors = BTreeMap::new();
    errors.insert(key.to_string(), message.to_string());
    ValidationError::new("Invalid configuration", errors).into()
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// A usable request timeout: representable as a `Duration` and at least 1ns.
fn parse_timeout(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
