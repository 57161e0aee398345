//! Shared HTTP client construction, URL building and error translation.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Url;
use serde_json::{Map, Value};

use crate::auth::error::OAuthError;
use crate::config::Config;
use crate::error::{Result, SolinteError};

/// Build a reqwest client honoring the configured timeout, TLS and user agent.
pub(crate) fn build_client(config: &Config) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent())
        .default_headers(headers)
        .danger_accept_invalid_certs(!config.verify())
        .build()
        .map_err(|err| SolinteError::api(None, format!("Failed to build HTTP client: {err}")))
}

/// Concatenate a base URL and an endpoint path.
pub(crate) fn join_url(base: &str, endpoint: &str) -> String {
    let base = base.trim_end_matches('/');
    if endpoint.starts_with('/') {
        format!("{base}{endpoint}")
    } else {
        format!("{base}/{endpoint}")
    }
}

/// Append `params` to the query string, form-encoded.
///
/// Nested objects and arrays use bracket notation (`a[b]=1`, `a[0]=x`);
/// `null` values are skipped and booleans become `1`/`0`.
pub(crate) fn append_query(url: &mut Url, params: &Map<String, Value>) {
    let mut pairs = Vec::new();
    for (key, value) in params {
        flatten_param(key.clone(), value, &mut pairs);
    }
    if pairs.is_empty() {
        return;
    }
    let mut query = url.query_pairs_mut();
    for (key, value) in &pairs {
        query.append_pair(key, value);
    }
}

fn flatten_param(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => out.push((key, if *flag { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((key, n.to_string())),
        Value::String(s) => out.push((key, s.clone())),
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                flatten_param(format!("{key}[{idx}]"), item, out);
            }
        }
        Value::Object(fields) => {
            for (sub, item) in fields {
                flatten_param(format!("{key}[{sub}]"), item, out);
            }
        }
    }
}

/// Extract a human-readable message from an error response body.
///
/// JSON bodies are searched for `error`, `error_description`, then
/// `message`; `fallback` is used when none is present. Non-JSON bodies are
/// returned verbatim, or `HTTP <status>` when empty.
pub(crate) fn error_message(status: u16, body: &str, fallback: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => ["error", "error_description", "message"]
            .iter()
            .find_map(|key| json.get(key).and_then(value_text))
            .unwrap_or_else(|| fallback.to_string()),
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => body.to_string(),
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Map a failed API response to an error.
///
/// The Solinte API reports authorization and domain failures alike in the
/// 4xx range, so every client error is surfaced as an OAuth-class error.
/// Everything else is a generic API error.
pub(crate) fn status_error(status: u16, message: String) -> SolinteError {
    if (400..500).contains(&status) {
        OAuthError::rejected(Some(status), message).into()
    } else {
        SolinteError::api(Some(status), message)
    }
}
