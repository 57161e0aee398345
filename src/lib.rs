//! Solinte: Rust SDK for the Solinte API
//!
//! OAuth 2.0 client (authorization code, password and refresh grants) plus
//! typed access to the `/usuario` resources.
//!
//! # Quick Start
//!
//! ```no_run
//! use solinte::prelude::*;
//!
//! # async fn example() -> solinte::error::Result<()> {
//! let mut client = SolinteClient::from_env()?;
//! let auth = client.authorization_url([("scope", "basic perfil")])?;
//! println!("Visit {}", auth.url);
//!
//! // ...after the redirect comes back with `code`:
//! client.exchange_code_for_token("code", Some(auth.state.as_str())).await?;
//! let roles = client.usuario().roles().get().await?;
//! println!("{roles}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub(crate) mod http;
pub mod prelude;
pub mod resources;
pub mod util;

pub use client::{Params, SolinteClient};
pub use config::{Config, ConfigOptions, Scope};
pub use error::{Result, SolinteError};
