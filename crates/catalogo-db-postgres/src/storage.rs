//! PostgreSQL implementation of the record store traits.

use async_trait::async_trait;
use catalogo_core::{NewUser, NewVehicle, User, Vehicle, VehicleFilter, VehiclePatch, now_utc};
use catalogo_storage::{StorageError, UserStorage, VehicleStorage};
use sqlx_postgres::PgPool;

use crate::config::PostgresConfig;
use crate::migrations;
use crate::pool;
use crate::queries::{users, vehicles};

/// PostgreSQL document store for vehicles and users.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a new `PostgresStorage` with the given configuration.
    ///
    /// This will:
    /// 1. Create a connection pool
    /// 2. Run migrations (if configured)
    ///
    /// # Errors
    ///
    /// Returns an error if the connection pool cannot be created
    /// or if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::create_pool(&config).await?;
        pool::test_connection(&pool).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Creates a new `PostgresStorage` from an existing connection pool.
    ///
    /// Migrations are not run automatically when using this constructor.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VehicleStorage for PostgresStorage {
    async fn create(&self, vehicle: NewVehicle) -> Result<Vehicle, StorageError> {
        let vehicle = Vehicle::from_new(vehicle, now_utc());
        vehicles::insert(&self.pool, &vehicle).await?;
        tracing::debug!(id = %vehicle.id, "vehicle created");
        Ok(vehicle)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Vehicle>, StorageError> {
        vehicles::find_by_id(&self.pool, id).await
    }

    async fn find(&self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, StorageError> {
        vehicles::find(&self.pool, filter, None).await
    }

    async fn find_page(
        &self,
        filter: &VehicleFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Vehicle>, StorageError> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        vehicles::find(&self.pool, filter, Some((offset, limit))).await
    }

    async fn count(&self, filter: &VehicleFilter) -> Result<u64, StorageError> {
        vehicles::count(&self.pool, filter).await
    }

    async fn update(
        &self,
        id: &str,
        patch: VehiclePatch,
    ) -> Result<Option<Vehicle>, StorageError> {
        vehicles::update(&self.pool, id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<Option<Vehicle>, StorageError> {
        vehicles::delete(&self.pool, id).await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[async_trait]
impl UserStorage for PostgresStorage {
    async fn create(&self, user: NewUser) -> Result<User, StorageError> {
        let user = User::from_new(user, now_utc());
        users::insert(&self.pool, &user).await?;
        tracing::debug!(id = %user.id, "user created");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        users::find_by_email(&self.pool, email).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        users::find_by_id(&self.pool, id).await
    }

    async fn delete(&self, id: &str) -> Result<Option<User>, StorageError> {
        users::delete(&self.pool, id).await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
