//! Status command implementation
//!
//! This module implements the `status` command for displaying booking and
//! payment status counts.

use crate::adapters::create_store;
use crate::config::load_config;
use crate::core::booking::{BookingService, StatusSummary};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking booking status");

        println!("📊 Booking Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let store = match create_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to connect to storage backend");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let service = BookingService::new(store, config.booking.policy());
        let summary = match service.status_summary().await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to load status counts");
                println!("   Error: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        print_summary(&summary);
        Ok(0)
    }
}

fn print_summary(summary: &StatusSummary) {
    println!("Appointments:");
    for (status, count) in &summary.appointments {
        println!("  {:<16} {count}", status.to_string());
    }
    println!();
    println!("Test bookings:");
    for (status, count) in &summary.test_bookings {
        println!("  {:<16} {count}", status.to_string());
    }
    println!();
    println!("Payments:");
    for (status, count) in &summary.payments {
        println!("  {:<16} {count}", status.to_string());
    }
    println!();
}
