//! Convenience re-exports for common use.

pub use crate::auth::{AuthorizationUrl, TokenInfo, TokenResponse, TokenState, TokenStatus};
pub use crate::client::{Params, SolinteClient};
pub use crate::config::{Config, ConfigOptions, Scope};
pub use crate::error::{ErrorCategory, OAuthError, Result, SolinteError, ValidationError};
pub use reqwest::Method;
