//! Storage adapters
//!
//! The storage abstraction (`store`), its in-memory and PostgreSQL backends,
//! and the factory that picks one from configuration.

pub mod factory;
pub mod memory;
pub mod postgresql;
pub mod store;

pub use factory::create_store;
pub use store::{BookingStore, Changeset, StoreGuard, StoreWrite};
