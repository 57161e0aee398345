//! Typed handles over the `/usuario` endpoints.

pub mod roles;
pub mod usuario;

pub use roles::Roles;
pub use usuario::{Email, Perfil, Usuario};
