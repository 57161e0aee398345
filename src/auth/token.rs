use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current OAuth credentials held by a [`TokenManager`](super::TokenManager).
///
/// Plain data so embedding applications can persist it between runs and
/// hand it back with [`TokenManager::restore_token_state`](super::TokenManager::restore_token_state).
///
/// # Example
/// ```
/// use solinte::auth::TokenState;
///
/// let state = TokenState {
///     access_token: Some("access".to_string()),
///     refresh_token: Some("refresh".to_string()),
///     expires_at: None,
/// };
/// let saved = serde_json::to_string(&state)?;
/// let restored: TokenState = serde_json::from_str(&saved)?;
/// assert_eq!(restored, state);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    /// Unknown expiry counts as valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> TokenStatus {
        match self.access_token {
            None => TokenStatus::Unauthenticated,
            Some(_) if self.is_expired_at(now) => TokenStatus::Expired,
            Some(_) => TokenStatus::Valid,
        }
    }
}

/// Lifecycle state derived from a [`TokenState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Unauthenticated,
    Valid,
    Expired,
}

/// Redacted view of the token state, safe to log or display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
}

impl TokenInfo {
    pub(crate) fn from_state(state: &TokenState, now: DateTime<Utc>) -> Self {
        Self {
            access_token: state.access_token.as_deref().and_then(mask_token),
            refresh_token: state.refresh_token.as_deref().and_then(mask_token),
            expires_at: state.expires_at,
            is_expired: state.is_expired_at(now),
        }
    }
}

/// `***` followed by the last four characters.
fn mask_token(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }
    let tail: String = {
        let chars: Vec<char> = token.chars().collect();
        chars[chars.len().saturating_sub(4)..].iter().collect()
    };
    Some(format!("***{tail}"))
}

/// Decoded body of a token-endpoint response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub token_type: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub expires_in: Option<i64>,
    /// Granted scopes, space-separated. A JSON array is joined.
    #[serde(default, deserialize_with = "lenient_text")]
    pub scope: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub error_description: Option<String>,
    /// Any other fields returned by the server.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accept `expires_in` as a number or a numeric string.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| D::Error::custom("expires_in out of range")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expires_in is not a number: {s}"))),
        Some(other) => Err(D::Error::custom(format!(
            "expires_in has unexpected type: {other}"
        ))),
    }
}

/// Accept any JSON value as text: arrays are space-joined, other
/// non-strings use their JSON rendering.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_text))
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(value_text).collect();
            Some(parts.join(" "))
        }
        other => Some(other.to_string()),
    }
}
