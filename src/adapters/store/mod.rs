//! Storage abstraction
//!
//! The [`traits::BookingStore`] trait every backend implements, and the
//! guarded [`changeset::Changeset`] unit all lifecycle writes travel in.

pub mod changeset;
pub mod traits;

pub use changeset::{Changeset, StoreGuard, StoreWrite};
pub use traits::BookingStore;
