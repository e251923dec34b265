use async_trait::async_trait;
use catalogo_core::{
    NewVehicle, Vehicle, VehicleFilter, VehiclePatch, listing_order, now_utc, unix_micros,
};
use catalogo_kv::{DynKvStore, KvError};
use catalogo_storage::{StorageError, VehicleStorage};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::keys;

/// Record store over a shared key-value backend.
///
/// A record write and its index write are two separate commands. A crash
/// between them leaves a record outside the index (invisible to listings)
/// or an index entry without a record (skipped with a warning).
#[derive(Clone)]
pub struct KvStorage {
    kv: DynKvStore,
}

impl KvStorage {
    pub fn new(kv: DynKvStore) -> Self {
        Self { kv }
    }

    pub(crate) async fn read_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        match self.kv.get(key).await.map_err(kv_error)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn write_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, &raw, None).await.map_err(kv_error)
    }

    pub(crate) fn kv(&self) -> &DynKvStore {
        &self.kv
    }
}

pub(crate) fn kv_error(err: KvError) -> StorageError {
    if err.is_connection_error() {
        StorageError::connection(err.to_string())
    } else {
        StorageError::internal(err.to_string())
    }
}

#[async_trait]
impl VehicleStorage for KvStorage {
    async fn create(&self, vehicle: NewVehicle) -> Result<Vehicle, StorageError> {
        let vehicle = Vehicle::from_new(vehicle, now_utc());
        self.write_json(&keys::vehicle_data(&vehicle.id), &vehicle)
            .await?;
        self.kv
            .index_add(
                keys::VEHICLE_INDEX,
                &vehicle.id,
                unix_micros(vehicle.created_at),
            )
            .await
            .map_err(kv_error)?;
        tracing::debug!(id = %vehicle.id, "vehicle created");
        Ok(vehicle)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Vehicle>, StorageError> {
        self.read_json(&keys::vehicle_data(id)).await
    }

    async fn find(&self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, StorageError> {
        let ids = self
            .kv
            .index_members(keys::VEHICLE_INDEX)
            .await
            .map_err(kv_error)?;

        let mut matched = Vec::new();
        for id in ids {
            match self.read_json::<Vehicle>(&keys::vehicle_data(&id)).await? {
                Some(vehicle) if filter.matches(&vehicle) => matched.push(vehicle),
                Some(_) => {}
                None => {
                    tracing::warn!(id = %id, index = keys::VEHICLE_INDEX, "index entry without record; skipping");
                }
            }
        }
        // The index is already score-ordered; this only matters for
        // records whose timestamps collide.
        matched.sort_by(listing_order);
        Ok(matched)
    }

    async fn update(
        &self,
        id: &str,
        patch: VehiclePatch,
    ) -> Result<Option<Vehicle>, StorageError> {
        let key = keys::vehicle_data(id);
        let Some(mut vehicle) = self.read_json::<Vehicle>(&key).await? else {
            return Ok(None);
        };
        vehicle.apply(patch, now_utc());
        self.write_json(&key, &vehicle).await?;
        tracing::debug!(id = %id, "vehicle updated");
        Ok(Some(vehicle))
    }

    async fn delete(&self, id: &str) -> Result<Option<Vehicle>, StorageError> {
        let key = keys::vehicle_data(id);
        let Some(vehicle) = self.read_json::<Vehicle>(&key).await? else {
            return Ok(None);
        };
        self.kv.delete(&key).await.map_err(kv_error)?;
        self.kv
            .index_remove(keys::VEHICLE_INDEX, id)
            .await
            .map_err(kv_error)?;
        tracing::debug!(id = %id, "vehicle deleted");
        Ok(Some(vehicle))
    }

    fn backend_name(&self) -> &'static str {
        "kv"
    }
}
