//! OAuth 2.0 grant flows and token lifecycle.

pub mod error;
pub mod oauth;
pub mod token;

pub use error::OAuthError;
pub use oauth::{AuthorizationUrl, GrantType, TokenManager};
pub use token::{TokenInfo, TokenResponse, TokenState, TokenStatus};
