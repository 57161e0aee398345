//! OAuth scope catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::{Result, ValidationError};

/// A permission unit that can be requested for an access token.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Scope {
    Basic,
    Perfil,
    Roles,
    AdminRol,
    Contactos,
    AdminContacto,
    Mensajes,
    AdminMensaje,
}

impl Scope {
    pub fn description(self) -> &'static str {
        match self {
            Self::Basic => "Read-only, basic access to /usuario",
            Self::Perfil => "Read-only, access to the full user profile",
            Self::Roles => "Read-only, access to the user's role list",
            Self::AdminRol => "Read, create and modify roles",
            Self::Contactos => "Read-only, access to the user's contacts",
            Self::AdminContacto => "Read, create and modify contacts",
            Self::Mensajes => "Read-only, access to messages and communications",
            Self::AdminMensaje => "Read, create and modify messages",
        }
    }
}

/// Scope name → description for every scope the API knows.
pub fn available_scopes() -> BTreeMap<&'static str, &'static str> {
    Scope::iter()
        .map(|scope| (<&'static str>::from(scope), scope.description()))
        .collect()
}

pub fn is_valid_scope(name: &str) -> bool {
    name.parse::<Scope>().is_ok()
}

/// Return `scopes` unchanged when all of them are known.
///
/// Fails naming every unknown entry, in input order.
pub fn validate_scopes<S: AsRef<str>>(scopes: &[S]) -> Result<Vec<String>> {
    let invalid: Vec<String> = scopes
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !is_valid_scope(name))
        .map(str::to_string)
        .collect();

    if !invalid.is_empty() {
        let joined = invalid.join(", ");
        let mut errors = BTreeMap::new();
        errors.insert("invalid_scopes".to_string(), joined.clone());
        return Err(ValidationError {
            message: format!("Invalid scopes: {joined}"),
            errors,
            invalid_scopes: invalid,
        }
        .into());
    }

    Ok(scopes.iter().map(|s| s.as_ref().to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolinteError;

    #[test]
    fn catalog_has_eight_entries() {
        let scopes = available_scopes();
        assert_eq!(scopes.len(), 8);
        assert!(scopes.contains_key("admin_contacto"));
        assert!(scopes.contains_key("mensajes"));
    }

    #[test]
    fn scope_names_are_snake_case() {
        assert_eq!(Scope::AdminRol.to_string(), "admin_rol");
        assert_eq!("admin_mensaje".parse::<Scope>().unwrap(), Scope::AdminMensaje);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(is_valid_scope("basic"));
        assert!(!is_valid_scope("Basic"));
        assert!(!is_valid_scope(""));
    }

    #[test]
    fn valid_list_is_returned_unchanged() {
        let scopes = validate_scopes(&["roles", "basic", "roles"]).unwrap();
        assert_eq!(scopes, vec!["roles", "basic", "roles"]);
    }

    #[test]
    fn empty_list_is_valid() {
        let empty: [&str; 0] = [];
        assert!(validate_scopes(&empty).unwrap().is_empty());
    }

    #[test]
    fn invalid_entries_are_reported_in_input_order() {
        let err = validate_scopes(&["zeta", "basic", "alpha", "perfil"]).unwrap_err();
        match err {
            SolinteError::Validation(validation) => {
                assert_eq!(validation.invalid_scopes, vec!["zeta", "alpha"]);
                assert_eq!(validation.message, "Invalid scopes: zeta, alpha");
                assert_eq!(validation.fields(), vec!["invalid_scopes"]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
