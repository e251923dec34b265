//! Storage traits for the record store abstraction layer.
//!
//! Every backend implements both traits. Implementations must be thread-safe
//! (`Send + Sync`) and usable as trait objects.

use async_trait::async_trait;
use catalogo_core::{NewUser, NewVehicle, User, Vehicle, VehicleFilter, VehiclePatch};

use crate::error::StorageError;

/// Vehicle persistence.
///
/// Listing order is `created_at` descending with ties broken by `id`
/// descending; `find`, `find_page` and the default `count` agree on it.
///
/// # Example
///
/// ```ignore
/// use catalogo_storage::{VehicleStorage, StorageError};
///
/// async fn brand_total(storage: &dyn VehicleStorage, brand: &str) -> Result<u64, StorageError> {
///     let filter = VehicleFilter::default().with_brand(brand).normalized();
///     storage.count(&filter).await
/// }
/// ```
#[async_trait]
pub trait VehicleStorage: Send + Sync {
    /// Persists a new vehicle with a generated id and
    /// `created_at == updated_at == now`.
    async fn create(&self, vehicle: NewVehicle) -> Result<Vehicle, StorageError>;

    /// Reads a vehicle by id. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing records.
    async fn find_by_id(&self, id: &str) -> Result<Option<Vehicle>, StorageError>;

    /// All vehicles matching `filter`, in listing order.
    async fn find(&self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, StorageError>;

    /// One window of [`VehicleStorage::find`].
    async fn find_page(
        &self,
        filter: &VehicleFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Vehicle>, StorageError> {
        let all = self.find(filter).await?;
        Ok(all
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    /// Number of vehicles matching `filter`.
    async fn count(&self, filter: &VehicleFilter) -> Result<u64, StorageError> {
        Ok(self.find(filter).await?.len() as u64)
    }

    /// Merges `patch` into the stored record and refreshes `updated_at`.
    /// Returns `None` if the id is unknown.
    async fn update(
        &self,
        id: &str,
        patch: VehiclePatch,
    ) -> Result<Option<Vehicle>, StorageError>;

    /// Removes a vehicle, returning the record as it was before deletion.
    async fn delete(&self, id: &str) -> Result<Option<Vehicle>, StorageError>;

    /// Returns the name of this storage backend.
    fn backend_name(&self) -> &'static str;
}

/// User account persistence. The email is the natural key.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Persists a new account.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, StorageError>;

    /// Looks up an account by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError>;

    async fn delete(&self, id: &str) -> Result<Option<User>, StorageError>;

    /// Returns the name of this storage backend.
    fn backend_name(&self) -> &'static str;
}
