//! Migrate command implementation
//!
//! This module implements the `migrate` command for initializing the
//! PostgreSQL schema.

use crate::adapters::postgresql::PostgreSQLClient;
use crate::config::load_config;
use crate::config::schema::StorageTarget;
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Running schema migration");

        println!("🔧 Running schema migration");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        if config.storage_target != StorageTarget::PostgreSQL {
            println!("The memory backend needs no migration.");
            return Ok(0);
        }

        let pg_config = match config.postgresql {
            Some(c) => c,
            None => {
                println!("❌ No [postgresql] section in the configuration");
                return Ok(2);
            }
        };

        let client = match PostgreSQLClient::new(pg_config).await {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to create PostgreSQL client");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        if let Err(e) = client.test_connection().await {
            println!("❌ Failed to connect to PostgreSQL");
            println!("   Error: {e}");
            return Ok(4);
        }

        match client.ensure_schema().await {
            Ok(_) => {
                println!("✅ Schema is up to date");
                println!("   Connection: {}", client.connection_string_safe());
                Ok(0)
            }
            Err(e) => {
                println!("❌ Migration failed");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }
}
