use thiserror::Error;

/// Failures from the OAuth token endpoint, and auth-class API rejections.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Access token not configured; call set_access_token() or exchange_code_for_token()")]
    NotAuthenticated,
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("OAuth error: {message}")]
    Rejected { message: String, status: Option<u16> },
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

impl OAuthError {
    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            status,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => *status,
            _ => None,
        }
    }

    /// The server- or transport-supplied message, without the display prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Connection(message) | Self::InvalidResponse(message) => message.clone(),
            Self::NotAuthenticated => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Connection(error.to_string())
    }
}

impl From<serde_json::Error> for OAuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}
