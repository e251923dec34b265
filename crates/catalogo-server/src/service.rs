//! Vehicle listing and write paths.
//!
//! Reads of the listing go through the cache; every write bumps the global
//! listing version afterwards so later reads cannot see a page computed
//! before the write.

use std::time::Duration;

use catalogo_core::{CoreError, NewVehicle, Vehicle, VehicleFilter, VehiclePatch, validate_id};
use catalogo_storage::{DynVehicleStorage, StorageError};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheBackend, VERSION_KEY, listing_key, listing_pattern};

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Version assumed while the counter key is absent.
const INITIAL_VERSION: i64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Invalid(#[from] CoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Listing request. `page` and `limit` are clamped by [`ListQuery::window`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: VehicleFilter,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListQuery {
    pub fn new(filter: VehicleFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `(page, limit)` with `limit` in `1..=100` (default 10) and `page >= 1`.
    pub fn window(&self) -> (u64, u64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let page = self.page.unwrap_or(1).max(1);
        (page, limit)
    }
}

/// One page of the listing, as served and as cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    pub data: Vec<Vehicle>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct Listing {
    pub page: ListingPage,
    pub from_cache: bool,
}

#[derive(Clone)]
pub struct VehicleService {
    store: DynVehicleStorage,
    cache: CacheBackend,
    listing_ttl: Duration,
}

impl VehicleService {
    pub fn new(store: DynVehicleStorage, cache: CacheBackend, listing_ttl: Duration) -> Self {
        Self {
            store,
            cache,
            listing_ttl,
        }
    }

    pub fn store(&self) -> &DynVehicleStorage {
        &self.store
    }

    /// Cache-first listing.
    ///
    /// If the version counter cannot be read the cache is bypassed for this
    /// request in both directions, since a page written under a guessed
    /// version could be served after a later write.
    pub async fn find_all(&self, query: ListQuery) -> Result<Listing, StorageError> {
        let (page, limit) = query.window();
        let filter = query.filter.normalized();

        let key = self
            .cache
            .read_counter(VERSION_KEY, INITIAL_VERSION)
            .await
            .map(|version| listing_key(version, &filter, page, limit));

        if let Some(key) = key.as_deref()
            && let Some(cached) = self.cache.get_json::<ListingPage>(key).await
        {
            tracing::debug!(key = %key, "listing cache hit");
            return Ok(Listing {
                page: cached,
                from_cache: true,
            });
        }

        let offset = (page - 1).saturating_mul(limit);
        let total = self.store.count(&filter).await?;
        let data = self.store.find_page(&filter, offset, limit).await?;
        let listing = ListingPage {
            data,
            total,
            page,
            limit,
        };

        match key.as_deref() {
            Some(key) => {
                tracing::debug!(key = %key, total, "listing cache miss");
                self.cache.set_json(key, &listing, self.listing_ttl).await;
            }
            None => tracing::debug!("listing version unavailable; cache bypassed"),
        }

        Ok(Listing {
            page: listing,
            from_cache: false,
        })
    }

    /// Direct store read. Ids that could never have been generated are
    /// reported as absent.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Vehicle>, StorageError> {
        if validate_id(id).is_err() {
            return Ok(None);
        }
        self.store.find_by_id(id).await
    }

    pub async fn create(&self, payload: VehiclePatch) -> Result<Vehicle, ServiceError> {
        let new_vehicle = NewVehicle::try_from(payload.validate()?)?;
        let vehicle = self.store.create(new_vehicle).await?;
        tracing::info!(id = %vehicle.id, brand = %vehicle.brand, "vehicle created");
        self.bump_version().await;
        Ok(vehicle)
    }

    pub async fn update(
        &self,
        id: &str,
        payload: VehiclePatch,
    ) -> Result<Option<Vehicle>, ServiceError> {
        let patch = payload.validate()?;
        if validate_id(id).is_err() {
            return Ok(None);
        }
        let updated = self.store.update(id, patch).await?;
        if let Some(vehicle) = &updated {
            tracing::info!(id = %vehicle.id, "vehicle updated");
            self.bump_version().await;
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<Option<Vehicle>, StorageError> {
        if validate_id(id).is_err() {
            return Ok(None);
        }
        let deleted = self.store.delete(id).await?;
        if let Some(vehicle) = &deleted {
            tracing::info!(id = %vehicle.id, "vehicle deleted");
            self.bump_version().await;
        }
        Ok(deleted)
    }

    /// Advances the listing version. Failures are logged and swallowed.
    ///
    /// `INCR` on an absent key yields 1, which equals the version assumed
    /// for an absent key, so that case is incremented once more.
    async fn bump_version(&self) {
        let Some(mut version) = self.cache.increment(VERSION_KEY).await else {
            tracing::warn!("listing version bump failed; cached pages expire by TTL");
            return;
        };
        if version == INITIAL_VERSION {
            match self.cache.increment(VERSION_KEY).await {
                Some(next) => version = next,
                None => {
                    tracing::warn!("listing version bump failed; cached pages expire by TTL");
                    return;
                }
            }
        }
        tracing::debug!(version, "listing version bumped");

        // Pages of the retired version can never be read again; drop them
        // in the background where the backend supports it.
        let stale = listing_pattern(version - 1);
        let cache = self.cache.clone();
        tokio::spawn(async move {
            let removed = cache.delete_pattern(&stale).await;
            if removed > 0 {
                tracing::debug!(pattern = %stale, removed, "stale listing pages removed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalogo_db_kv::KvStorage;
    use catalogo_kv::{KvStore, MemoryKv};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn service() -> (VehicleService, Arc<MemoryKv>) {
        let kv = Arc::new(MemoryKv::new());
        let store: DynVehicleStorage = Arc::new(KvStorage::new(kv.clone()));
        let cache = CacheBackend::new(kv.clone(), Duration::from_millis(250));
        (
            VehicleService::new(store, cache, Duration::from_secs(300)),
            kv,
        )
    }

    fn payload(brand: &str, vehicle_type: &str, year: i32) -> VehiclePatch {
        VehiclePatch {
            brand: Some(brand.into()),
            vehicle_type: Some(vehicle_type.into()),
            year: Some(year),
            ..Default::default()
        }
    }

    #[test]
    fn test_window_clamping() {
        assert_eq!(ListQuery::default().window(), (1, 10));
        assert_eq!(ListQuery::default().with_limit(0).window(), (1, 1));
        assert_eq!(ListQuery::default().with_limit(1000).window(), (1, 100));
        assert_eq!(ListQuery::default().with_page(0).window(), (1, 10));
        assert_eq!(ListQuery::default().with_page(7).window(), (7, 10));
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let (svc, _) = service();
        svc.create(payload("Fiat", "Hatch", 2020)).await.unwrap();

        let first = svc.find_all(ListQuery::default()).await.unwrap();
        let second = svc.find_all(ListQuery::default()).await.unwrap();
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(
            serde_json::to_vec(&first.page).unwrap(),
            serde_json::to_vec(&second.page).unwrap()
        );
    }

    #[tokio::test]
    async fn test_every_write_kind_invalidates() {
        let (svc, _) = service();
        let created = svc.create(payload("Fiat", "Hatch", 2020)).await.unwrap();
        svc.find_all(ListQuery::default()).await.unwrap();

        svc.create(payload("Ford", "Pickup", 2021)).await.unwrap();
        let after_create = svc.find_all(ListQuery::default()).await.unwrap();
        assert!(!after_create.from_cache);
        assert_eq!(after_create.page.total, 2);

        svc.update(
            &created.id,
            VehiclePatch {
                color: Some("Red".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        let after_update = svc.find_all(ListQuery::default()).await.unwrap();
        assert!(!after_update.from_cache);
        let fiat = after_update
            .page
            .data
            .iter()
            .find(|v| v.id == created.id)
            .unwrap();
        assert_eq!(fiat.color.as_deref(), Some("Red"));

        svc.delete(&created.id).await.unwrap().unwrap();
        let after_delete = svc.find_all(ListQuery::default()).await.unwrap();
        assert!(!after_delete.from_cache);
        assert_eq!(after_delete.page.total, 1);
    }

    #[tokio::test]
    async fn test_first_write_moves_version_past_default() {
        let (svc, kv) = service();
        svc.find_all(ListQuery::default()).await.unwrap();
        svc.create(payload("Fiat", "Hatch", 2020)).await.unwrap();

        let version: i64 = kv.get(VERSION_KEY).await.unwrap().unwrap().parse().unwrap();
        assert_eq!(version, 2);
        let listing = svc.find_all(ListQuery::default()).await.unwrap();
        assert!(!listing.from_cache);
        assert_eq!(listing.page.total, 1);
    }

    #[tokio::test]
    async fn test_absent_update_and_delete_leave_cache_alone() {
        let (svc, _) = service();
        svc.create(payload("Fiat", "Hatch", 2020)).await.unwrap();
        svc.find_all(ListQuery::default()).await.unwrap();

        assert!(
            svc.update("missing", VehiclePatch::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(svc.delete("missing").await.unwrap().is_none());
        assert!(svc.delete("bad:id").await.unwrap().is_none());
        assert!(svc.find_all(ListQuery::default()).await.unwrap().from_cache);
    }

    #[tokio::test]
    async fn test_pagination_visits_every_vehicle_once() {
        let (svc, _) = service();
        let n = 23;
        for i in 0..n {
            svc.create(payload("Fiat", "Hatch", 2000 + i)).await.unwrap();
        }

        let limit = 5;
        let pages = (n as u64).div_ceil(limit);
        let mut seen = HashSet::new();
        for page in 1..=pages {
            let listing = svc
                .find_all(ListQuery::default().with_page(page).with_limit(limit))
                .await
                .unwrap();
            assert_eq!(listing.page.total, n as u64);
            assert!(!listing.page.data.is_empty());
            for v in listing.page.data {
                assert!(seen.insert(v.id));
            }
        }
        assert_eq!(seen.len(), n as usize);

        let beyond = svc
            .find_all(ListQuery::default().with_page(pages + 1).with_limit(limit))
            .await
            .unwrap();
        assert!(beyond.page.data.is_empty());
    }

    #[tokio::test]
    async fn test_brand_filter_is_case_insensitive() {
        let (svc, _) = service();
        svc.create(payload("Toyota", "Sedan", 2020)).await.unwrap();
        svc.create(payload("Honda", "Sedan", 2020)).await.unwrap();

        for brand in ["toyota", "TOYOTA", " Toyota "] {
            let listing = svc
                .find_all(ListQuery::new(VehicleFilter::default().with_brand(brand)))
                .await
                .unwrap();
            assert_eq!(listing.page.total, 1);
            assert_eq!(listing.page.data[0].brand, "Toyota");
        }
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (svc, _) = service();
        let err = svc
            .create(VehiclePatch {
                brand: Some("Fiat".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));

        let err = svc.create(payload("Fiat", "Hatch", 1800)).await.unwrap_err();
        assert!(err.to_string().contains("year"));
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (svc, _) = service();
        let mut body = payload("Toyota", "Sedan", 2020);
        body.model_name = Some("Corolla".into());
        body.price = Some(95_000.0);
        let created = svc.create(body).await.unwrap();

        let found = svc.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.model_name.as_deref(), Some("Corolla"));
        assert_eq!(found.created_at, found.updated_at);
    }
}
