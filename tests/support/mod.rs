#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::{DateTime, TimeZone, Utc};
use solinte::util::ManualClock;
use solinte::{ConfigOptions, SolinteClient};
use wiremock::MockServer;

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const REDIRECT_URI: &str = "https://app.example.com/callback";

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// Options pointing both base URLs at the mock server.
pub fn options_for(server: &MockServer) -> ConfigOptions {
    ConfigOptions::builder()
        .client_id(CLIENT_ID)
        .client_secret(CLIENT_SECRET)
        .redirect_uri(REDIRECT_URI)
        .timeout(5.0)
        .oauth_base_url(format!("{}/OAuth2", server.uri()))
        .api_base_url(format!("{}/api.v1", server.uri()))
        .build()
}

/// A client against `server` driven by a manual clock.
pub fn client_for(server: &MockServer) -> (SolinteClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_at(epoch()));
    let client = SolinteClient::new(options_for(server))
        .expect("valid options")
        .with_clock(clock.clone());
    (client, clock)
}

/// A client that already holds a valid access token.
pub fn authenticated_client(server: &MockServer, token: &str) -> SolinteClient {
    let (mut client, _clock) = client_for(server);
    client.set_access_token(token, Some(3600));
    client
}

pub const SOLINTE_ENV_VARS: [&str; 8] = [
    "SOLINTE_CLIENT_ID",
    "SOLINTE_CLIENT_SECRET",
    "SOLINTE_REDIRECT_URI",
    "SOLINTE_TIMEOUT",
    "SOLINTE_VERIFY",
    "SOLINTE_USER_AGENT",
    "SOLINTE_OAUTH_BASE_URL",
    "SOLINTE_API_BASE_URL",
];

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Exclusive access to the `SOLINTE_*` variables for one test.
///
/// The variables start out unset and are restored on drop.
pub struct SolinteEnv {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl SolinteEnv {
    pub fn isolated() -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved = SOLINTE_ENV_VARS
            .iter()
            .map(|key| (*key, std::env::var(key).ok()))
            .collect();
        for key in SOLINTE_ENV_VARS {
            std::env::remove_var(key);
        }
        Self { saved, _lock: lock }
    }

    pub fn set(&self, key: &str, value: &str) -> &Self {
        std::env::set_var(key, value);
        self
    }
}

impl Drop for SolinteEnv {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}
