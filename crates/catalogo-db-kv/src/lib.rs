//! Key-value record store backend for the Catalogo server.
//!
//! Records are stored as JSON strings in a [`catalogo_kv::KvStore`] and
//! enumerated through sorted indexes scored by creation time:
//!
//! | Key | Value |
//! |-----|-------|
//! | `veiculos:data:{id}` | vehicle JSON |
//! | `veiculos:index` | sorted set of vehicle ids |
//! | `users:data:{email}` | user JSON |
//! | `users:id:{id}` | email of user `id` |
//! | `users:index` | sorted set of emails |
//!
//! # Example
//!
//! ```ignore
//! use catalogo_db_kv::KvStorage;
//! use catalogo_kv::MemoryKv;
//! use catalogo_storage::VehicleStorage;
//!
//! let storage = KvStorage::new(Arc::new(MemoryKv::new()));
//! let created = storage.create(NewVehicle::new("Fiat", "Hatch", 2020)).await?;
//! ```

pub mod keys;
mod storage;
mod users;

pub use storage::KvStorage;
