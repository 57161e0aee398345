use reqwest::Method;
use serde_json::Value;

use crate::client::{Params, SolinteClient};
use crate::error::{Result, SolinteError};

const INCORPORA_REQUIRED: [&str; 4] = ["descripcion", "cuis", "rol_codigo", "rol_verificador"];
const DEFAULT_FECHA: &str = "hoy";

/// The user's roles.
pub struct Roles<'a> {
    client: &'a mut SolinteClient,
}

impl<'a> Roles<'a> {
    pub(crate) fn new(client: &'a mut SolinteClient) -> Self {
        Self { client }
    }

    /// `GET /usuario/roles`
    pub async fn get(self) -> Result<Value> {
        self.client
            .request(Method::GET, "/usuario/roles", &Params::new())
            .await
    }

    /// Balance of role `rid` on `fecha` (defaults to `hoy`).
    pub async fn saldo(self, rid: &str, fecha: Option<&str>) -> Result<Value> {
        let fecha = fecha.unwrap_or(DEFAULT_FECHA);
        let endpoint = format!(
            "/usuario/roles/saldo/{}/{}",
            urlencoding::encode(rid),
            urlencoding::encode(fecha)
        );
        self.client
            .request(Method::GET, &endpoint, &Params::new())
            .await
    }

    /// Add a role.
    ///
    /// `params` must contain `descripcion`, `cuis`, `rol_codigo` and
    /// `rol_verificador`; nothing is sent otherwise.
    pub async fn incorpora(self, params: Params) -> Result<Value> {
        check_required(&params, &INCORPORA_REQUIRED)?;
        self.client
            .request(Method::POST, "/usuario/roles/incorpora", &params)
            .await
    }

    /// Hide a role from the listing.
    pub async fn oculta(self, rid: &str) -> Result<Value> {
        let mut params = Params::new();
        params.insert("rid".to_string(), Value::from(rid));
        self.client
            .request(Method::POST, "/usuario/roles/oculta", &params)
            .await
    }

    pub async fn renombra(self, rid: &str, descripcion: &str) -> Result<Value> {
        let mut params = Params::new();
        params.insert("rid".to_string(), Value::from(rid));
        params.insert("descripcion".to_string(), Value::from(descripcion));
        self.client
            .request(Method::POST, "/usuario/roles/renombra", &params)
            .await
    }

    /// Share a role using `metodo`; `emails` is sent only when non-empty.
    pub async fn comparte(self, rid: &str, metodo: &str, emails: Option<&str>) -> Result<Value> {
        let mut params = Params::new();
        params.insert("rid".to_string(), Value::from(rid));
        params.insert("metodo".to_string(), Value::from(metodo));
        if let Some(emails) = emails.filter(|e| !e.is_empty()) {
            params.insert("emails".to_string(), Value::from(emails));
        }
        self.client
            .request(Method::POST, "/usuario/roles/comparte", &params)
            .await
    }
}

fn check_required(params: &Params, required: &[&str]) -> Result<()> {
    match required
        .iter()
        .find(|key| params.get(**key).map_or(true, Value::is_null))
    {
        Some(missing) => Err(SolinteError::InvalidArgument(format!(
            "Parameter '{missing}' is required"
        ))),
        None => Ok(()),
    }
}
