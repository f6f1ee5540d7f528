//! Database entity models.

pub mod asignacion;
pub mod user;
