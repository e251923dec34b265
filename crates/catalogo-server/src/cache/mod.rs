//! Listing cache over the shared key-value store.
//!
//! Every cached listing page is keyed by the current value of a global
//! version counter, so bumping the counter retires all pages at once. This
//! works on backends that cannot enumerate keys.
//!
//! ## Modules
//!
//! - `backend` - [`CacheBackend`], a timeout-bounded, failure-absorbing
//!   wrapper around a [`catalogo_kv::KvStore`]
//! - `keys` - key layout

pub mod backend;
pub mod keys;

pub use backend::CacheBackend;
pub use keys::{LISTING_PREFIX, VERSION_KEY, listing_key, listing_pattern};
