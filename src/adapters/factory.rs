//! Factory for creating storage backends
//!
//! Selects a [`BookingStore`] implementation from the configured storage
//! target.

use crate::adapters::memory::MemoryStore;
use crate::adapters::postgresql::{PostgreSQLClient, PostgresStore};
use crate::adapters::store::traits::BookingStore;
use crate::config::schema::StorageTarget;
use crate::config::CarebookConfig;
use crate::domain::{CarebookError, Result};
use std::sync::Arc;

/// Creates the booking store selected by `storage_target`
///
/// For PostgreSQL this also runs the schema migration, so a freshly created
/// database is usable immediately.
///
/// # Errors
///
/// Returns an error if the PostgreSQL target is selected without a
/// `[postgresql]` section, or if the client cannot be created.
pub async fn create_store(config: &CarebookConfig) -> Result<Arc<dyn BookingStore>> {
    match config.storage_target {
        StorageTarget::Memory => {
            tracing::info!("Creating in-memory booking store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                CarebookError::Configuration(
                    "postgresql configuration is required when storage_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL booking store");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            client.ensure_schema().await?;
            Ok(Arc::new(PostgresStore::new(client)))
        }
    }
}
