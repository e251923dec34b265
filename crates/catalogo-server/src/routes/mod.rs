//! API routes modules.
//!
//! - `auth` - registration and login under `/api/auth`
//! - `vehicles` - vehicle CRUD and listing under `/api/veiculos`

pub mod auth;
pub mod vehicles;
