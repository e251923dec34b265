//! # catalogo-storage
//!
//! Record store abstraction layer for the Catalogo server.
//!
//! This crate defines the traits that every persistence backend implements.
//! It does not contain any implementations; those live in `catalogo-db-kv`
//! and `catalogo-db-postgres`.
//!
//! ## Overview
//!
//! - [`VehicleStorage`]: create, read, filtered listing, update, delete
//! - [`UserStorage`]: account creation and lookup by email or id
//!
//! A missing record is `Ok(None)`, never an error.

mod error;
mod traits;

pub use error::{ErrorCategory, StorageError};
pub use traits::{UserStorage, VehicleStorage};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared vehicle storage trait object.
pub type DynVehicleStorage = std::sync::Arc<dyn VehicleStorage>;

/// Shared user storage trait object.
pub type DynUserStorage = std::sync::Arc<dyn UserStorage>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use catalogo_storage::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, StorageError};
    pub use crate::traits::{UserStorage, VehicleStorage};
    pub use crate::{DynUserStorage, DynVehicleStorage, StorageResult};
}
