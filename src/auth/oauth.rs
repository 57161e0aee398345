use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use reqwest::Url;
use strum::Display;
use tracing::{debug, warn};

use super::error::OAuthError;
use super::token::{TokenInfo, TokenResponse, TokenState, TokenStatus};
use crate::config::{validate_scopes, Config};
use crate::error::{Result, SolinteError};
use crate::http::{build_client, error_message, join_url};
use crate::util::clock::{Clock, SystemClock};

const AUTHORIZE_PATH: &str = "/Autorizar";
const TOKEN_PATH: &str = "/Token";
const DEFAULT_SCOPE: &str = "basic";
const STATE_BYTES: usize = 16;

/// OAuth 2.0 grant sent to the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
    Password,
}

/// Authorization redirect target plus the `state` it carries.
///
/// The caller must persist `state` and compare it against the value the
/// callback returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationUrl {
    pub url: String,
    pub state: String,
}

/// Runs OAuth grant flows and owns the resulting [`TokenState`].
///
/// Mutating operations take `&mut self`; sharing one manager across tasks
/// requires the caller's own synchronization.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use solinte::auth::TokenManager;
/// use solinte::config::{Config, ConfigOptions};
///
/// # async fn run() -> solinte::error::Result<()> {
/// let config = Config::new(
///     ConfigOptions::builder()
///         .client_id("app")
///         .client_secret("secret")
///         .redirect_uri("https://app.example.com/callback")
///         .build(),
/// )?;
/// let mut manager = TokenManager::new(Arc::new(config))?;
/// let auth = manager.authorization_url([("scope", "basic perfil")])?;
/// println!("open {} (state {})", auth.url, auth.state);
/// manager.exchange_code_for_token("code-from-callback", Some(auth.state.as_str())).await?;
/// # Ok(())
/// # }
/// ```
pub struct TokenManager {
    config: Arc<Config>,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
    state: TokenState,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("config", &self.config)
            .field("tokens", &self.token_info())
            .finish()
    }
}

impl TokenManager {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let http = build_client(&config)?;
        Ok(Self {
            config,
            http,
            clock: Arc::new(SystemClock),
            state: TokenState::default(),
        })
    }

    /// Replace the time source used for expiry computations.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the URL the user must visit to authorize this client.
    ///
    /// `params` override the defaults (`response_type=code`, `client_id`, a
    /// fresh random `state` and `scope=basic`); extra keys are appended.
    /// Every space-separated name in `scope` must be a known scope.
    pub fn authorization_url<I, K, V>(&self, params: I) -> Result<AuthorizationUrl>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged: Vec<(String, String)> = vec![
            ("response_type".to_string(), "code".to_string()),
            ("client_id".to_string(), self.config.client_id().to_string()),
            ("state".to_string(), generate_state()),
            ("scope".to_string(), DEFAULT_SCOPE.to_string()),
        ];
        for (key, value) in params {
            let (key, value) = (key.into(), value.into());
            match merged.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => merged.push((key, value)),
            }
        }

        if let Some((_, scope)) = merged.iter().find(|(k, _)| k == "scope") {
            let names: Vec<&str> = scope.split(' ').collect();
            validate_scopes(names.as_slice())?;
        }

        let endpoint = join_url(self.config.oauth_base_url(), AUTHORIZE_PATH);
        let mut url = Url::parse(&endpoint).map_err(|err| {
            SolinteError::InvalidArgument(format!("Invalid authorization URL {endpoint}: {err}"))
        })?;
        url.query_pairs_mut().extend_pairs(merged.iter());

        let state = merged
            .iter()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        Ok(AuthorizationUrl {
            url: url.into(),
            state,
        })
    }

    /// Exchange an authorization code returned to the redirect URI.
    pub async fn exchange_code_for_token(
        &mut self,
        code: &str,
        state: Option<&str>,
    ) -> Result<TokenResponse> {
        let mut form = self.credentials_form(GrantType::AuthorizationCode);
        form.push(("code", code.to_string()));
        if !self.config.redirect_uri().is_empty() {
            form.push(("redirect_uri", self.config.redirect_uri().to_string()));
        }
        if let Some(state) = state.filter(|s| !s.is_empty()) {
            form.push(("state", state.to_string()));
        }
        self.request_token(GrantType::AuthorizationCode, form).await
    }

    /// Obtain a new access token from `refresh_token`.
    ///
    /// A non-empty `scopes` list is validated and sent space-joined.
    pub async fn refresh_access_token(
        &mut self,
        refresh_token: &str,
        scopes: &[&str],
    ) -> Result<TokenResponse> {
        let mut form = self.credentials_form(GrantType::RefreshToken);
        form.push(("refresh_token", refresh_token.to_string()));
        push_scopes(&mut form, scopes)?;
        self.request_token(GrantType::RefreshToken, form).await
    }

    /// Resource-owner password grant, for confidential clients.
    pub async fn token_with_password(
        &mut self,
        username: &str,
        password: &str,
        scopes: &[&str],
    ) -> Result<TokenResponse> {
        let mut form = self.credentials_form(GrantType::Password);
        form.push(("username", username.to_string()));
        form.push(("password", password.to_string()));
        push_scopes(&mut form, scopes)?;
        self.request_token(GrantType::Password, form).await
    }

    /// Install an access token obtained elsewhere.
    ///
    /// `expires_in` (seconds) sets the expiry; when absent or zero the
    /// previous expiry is kept.
    pub fn set_access_token(&mut self, token: impl Into<String>, expires_in: Option<i64>) {
        let token = token.into();
        let expires_at = expires_in
            .filter(|secs| *secs != 0)
            .map(|secs| expiry_after(self.clock.now(), secs));
        self.update_state(|state| {
            state.access_token = Some(token);
            if let Some(expires_at) = expires_at {
                state.expires_at = expires_at;
            }
        });
    }

    pub fn set_refresh_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.update_state(|state| state.refresh_token = Some(token));
    }

    pub fn access_token(&self) -> Option<&str> {
        self.state.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.state.refresh_token.as_deref()
    }

    /// Whether the access token is past its expiry.
    ///
    /// With no recorded expiry the token is assumed valid.
    pub fn is_token_expired(&self) -> bool {
        self.state.is_expired_at(self.clock.now())
    }

    pub fn status(&self) -> TokenStatus {
        self.state.status_at(self.clock.now())
    }

    /// Refresh the access token when it has expired and a refresh token is held.
    ///
    /// Returns `true` only when a refresh happened. A rejected refresh is
    /// terminal: the whole token state is cleared and `false` is returned.
    pub async fn refresh_token_if_expired(&mut self) -> bool {
        if !self.is_token_expired() {
            return false;
        }
        let Some(refresh_token) = self.state.refresh_token.clone().filter(|t| !t.is_empty())
        else {
            return false;
        };

        debug!("access token expired, refreshing");
        match self.refresh_access_token(&refresh_token, &[]).await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "token refresh failed, clearing token state");
                self.clear_tokens();
                false
            }
        }
    }

    pub fn clear_tokens(&mut self) {
        self.update_state(|state| *state = TokenState::default());
    }

    /// Redacted summary of the held tokens.
    pub fn token_info(&self) -> TokenInfo {
        TokenInfo::from_state(&self.state, self.clock.now())
    }

    /// Snapshot of the current token state, e.g. for persisting.
    pub fn token_state(&self) -> TokenState {
        self.state.clone()
    }

    /// Replace the token state with a previously saved snapshot.
    pub fn restore_token_state(&mut self, snapshot: TokenState) {
        self.update_state(|state| *state = snapshot);
    }

    /// Every change to the token state goes through here.
    fn update_state(&mut self, change: impl FnOnce(&mut TokenState)) {
        change(&mut self.state);
        debug!(status = ?self.status(), "token state updated");
    }

    fn credentials_form(&self, grant: GrantType) -> Vec<(&'static str, String)> {
        vec![
            ("grant_type", grant.to_string()),
            ("client_id", self.config.client_id().to_string()),
            ("client_secret", self.config.client_secret().to_string()),
        ]
    }

    async fn request_token(
        &mut self,
        grant: GrantType,
        form: Vec<(&'static str, String)>,
    ) -> Result<TokenResponse> {
        let url = join_url(self.config.oauth_base_url(), TOKEN_PATH);
        debug!(grant_type = %grant, url = %url, "requesting token");

        let resp = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(OAuthError::from)?;
        let status = resp.status();
        let body = resp.text().await.map_err(OAuthError::from)?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &body, "Unknown OAuth error");
            return Err(OAuthError::rejected(Some(status.as_u16()), message).into());
        }

        let payload: TokenResponse = serde_json::from_str(&body).map_err(|err| {
            OAuthError::InvalidResponse(format!("Failed to decode token response JSON: {err}"))
        })?;

        if let Some(error) = &payload.error {
            let message = payload
                .error_description
                .clone()
                .unwrap_or_else(|| error.clone());
            return Err(OAuthError::rejected(None, message).into());
        }

        let now = self.clock.now();
        let access_token = payload.access_token.clone();
        let refresh_token = payload.refresh_token.clone();
        let expires_at = payload.expires_in.map(|secs| expiry_after(now, secs));
        self.update_state(|state| {
            if let Some(token) = access_token {
                state.access_token = Some(token);
            }
            if let Some(token) = refresh_token {
                state.refresh_token = Some(token);
            }
            if let Some(expires_at) = expires_at {
                state.expires_at = expires_at;
            }
        });

        Ok(payload)
    }
}

fn push_scopes(form: &mut Vec<(&'static str, String)>, scopes: &[&str]) -> Result<()> {
    if !scopes.is_empty() {
        validate_scopes(scopes)?;
        form.push(("scope", scopes.join(" ")));
    }
    Ok(())
}

/// `now + secs`, or no expiry when the offset is out of range.
fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(secs).and_then(|delta| now.checked_add_signed(delta))
}

/// 16 random bytes, hex-encoded.
fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
