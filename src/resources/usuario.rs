use reqwest::Method;
use serde_json::Value;

use super::roles::Roles;
use crate::client::{Params, SolinteClient};
use crate::error::Result;

/// `/usuario` entry point, bound to a client.
pub struct Usuario<'a> {
    client: &'a mut SolinteClient,
}

impl<'a> Usuario<'a> {
    pub(crate) fn new(client: &'a mut SolinteClient) -> Self {
        Self { client }
    }

    pub fn email(self) -> Email<'a> {
        Email {
            client: self.client,
        }
    }

    pub fn perfil(self) -> Perfil<'a> {
        Perfil {
            client: self.client,
        }
    }

    pub fn roles(self) -> Roles<'a> {
        Roles::new(self.client)
    }
}

/// The user's email address.
pub struct Email<'a> {
    client: &'a mut SolinteClient,
}

impl Email<'_> {
    /// `GET /usuario/email`
    pub async fn get(self) -> Result<Value> {
        self.client
            .request(Method::GET, "/usuario/email", &Params::new())
            .await
    }
}

/// The user's full profile.
pub struct Perfil<'a> {
    client: &'a mut SolinteClient,
}

impl Perfil<'_> {
    /// `GET /usuario/perfil`
    pub async fn get(self) -> Result<Value> {
        self.client
            .request(Method::GET, "/usuario/perfil", &Params::new())
            .await
    }
}
