//! Solinte API client: bearer-authenticated JSON requests.

use std::sync::Arc;

use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::auth::{
    AuthorizationUrl, OAuthError, TokenInfo, TokenManager, TokenResponse, TokenState,
    TokenStatus,
};
use crate::config::{Config, ConfigOptions};
use crate::error::{Result, SolinteError};
use crate::http::{append_query, build_client, error_message, join_url, status_error};
use crate::resources::Usuario;
use crate::util::clock::Clock;

/// Request parameters: query string for GET, JSON body for POST/PUT/PATCH.
pub type Params = Map<String, Value>;

/// Entry point to the Solinte API.
///
/// # Example
/// ```no_run
/// use solinte::{ConfigOptions, SolinteClient};
///
/// # async fn run() -> solinte::error::Result<()> {
/// let mut client = SolinteClient::new(
///     ConfigOptions::builder()
///         .client_id("app")
///         .client_secret("secret")
///         .redirect_uri("https://app.example.com/callback")
///         .build(),
/// )?;
/// client.set_access_token("token-from-storage", Some(3600));
/// let profile = client.usuario().perfil().get().await?;
/// println!("{profile}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SolinteClient {
    config: Arc<Config>,
    oauth: TokenManager,
    http: reqwest::Client,
}

impl SolinteClient {
    /// Validate `options` and build a client.
    pub fn new(options: ConfigOptions) -> Result<Self> {
        Self::from_config(Config::new(options)?)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let http = build_client(&config)?;
        let oauth = TokenManager::new(config.clone())?;
        Ok(Self {
            config,
            oauth,
            http,
        })
    }

    /// Build from `SOLINTE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_config(Config::from_env()?)
    }

    /// Replace the time source used for token expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.oauth = self.oauth.with_clock(clock);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn token_manager(&self) -> &TokenManager {
        &self.oauth
    }

    pub fn token_manager_mut(&mut self) -> &mut TokenManager {
        &mut self.oauth
    }

    // -- token manager proxies ------------------------------------------------

    pub fn authorization_url<I, K, V>(&self, params: I) -> Result<AuthorizationUrl>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.oauth.authorization_url(params)
    }

    pub async fn exchange_code_for_token(
        &mut self,
        code: &str,
        state: Option<&str>,
    ) -> Result<TokenResponse> {
        self.oauth.exchange_code_for_token(code, state).await
    }

    pub async fn refresh_access_token(
        &mut self,
        refresh_token: &str,
        scopes: &[&str],
    ) -> Result<TokenResponse> {
        self.oauth.refresh_access_token(refresh_token, scopes).await
    }

    pub async fn token_with_password(
        &mut self,
        username: &str,
        password: &str,
        scopes: &[&str],
    ) -> Result<TokenResponse> {
        self.oauth
            .token_with_password(username, password, scopes)
            .await
    }

    pub fn set_access_token(&mut self, token: impl Into<String>, expires_in: Option<i64>) {
        self.oauth.set_access_token(token, expires_in);
    }

    pub fn set_refresh_token(&mut self, token: impl Into<String>) {
        self.oauth.set_refresh_token(token);
    }

    pub fn access_token(&self) -> Option<&str> {
        self.oauth.access_token()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.oauth.refresh_token()
    }

    pub fn is_token_expired(&self) -> bool {
        self.oauth.is_token_expired()
    }

    pub fn token_status(&self) -> TokenStatus {
        self.oauth.status()
    }

    pub async fn refresh_token_if_expired(&mut self) -> bool {
        self.oauth.refresh_token_if_expired().await
    }

    pub fn clear_tokens(&mut self) {
        self.oauth.clear_tokens();
    }

    pub fn token_info(&self) -> TokenInfo {
        self.oauth.token_info()
    }

    pub fn token_state(&self) -> TokenState {
        self.oauth.token_state()
    }

    pub fn restore_token_state(&mut self, state: TokenState) {
        self.oauth.restore_token_state(state);
    }

    // -- API ------------------------------------------------------------------

    /// Access the `/usuario` resources.
    pub fn usuario(&mut self) -> Usuario<'_> {
        Usuario::new(self)
    }

    /// Send an authenticated request to `endpoint` (relative to the API base URL).
    ///
    /// An expired token is refreshed first when possible. If the refresh
    /// fails the request still goes out with the token held beforehand.
    /// 4xx responses surface as [`SolinteError::OAuth`], other failures as
    /// [`SolinteError::Api`].
    pub async fn request(
        &mut self,
        method: Method,
        endpoint: &str,
        params: &Params,
    ) -> Result<Value> {
        let previous = self
            .oauth
            .access_token()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or(OAuthError::NotAuthenticated)?;

        self.oauth.refresh_token_if_expired().await;
        let token = self
            .oauth
            .access_token()
            .map(str::to_string)
            .unwrap_or(previous);

        let target = join_url(self.config.api_base_url(), endpoint);
        let mut url = Url::parse(&target).map_err(|err| {
            SolinteError::InvalidArgument(format!("Invalid endpoint {endpoint}: {err}"))
        })?;
        if method == Method::GET {
            append_query(&mut url, params);
        }
        debug!(method = %method, endpoint, "Solinte API request");

        let sends_body =
            method == Method::POST || method == Method::PUT || method == Method::PATCH;
        let mut builder = self.http.request(method, url).bearer_auth(token);
        if sends_body {
            builder = builder.json(params);
        }

        let resp = builder
            .send()
            .await
            .map_err(|err| SolinteError::api(None, format!("Connection error: {err}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| SolinteError::api(None, format!("Connection error: {err}")))?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &body, "Unknown error");
            return Err(status_error(status.as_u16(), message));
        }

        serde_json::from_str(&body).map_err(|err| {
            SolinteError::api(None, format!("Failed to decode JSON response: {err}"))
        })
    }

    /// [`request`](Self::request), decoding the body into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &mut self,
        method: Method,
        endpoint: &str,
        params: &Params,
    ) -> Result<T> {
        let value = self.request(method, endpoint, params).await?;
        serde_json::from_value(value).map_err(|err| {
            SolinteError::api(None, format!("Unexpected response shape: {err}"))
        })
    }
}
