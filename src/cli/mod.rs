//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Carebook using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Carebook - Clinic Booking and Payment State Manager
#[derive(Parser, Debug)]
#[command(name = "carebook")]
#[command(version, about, long_about = None)]
#[command(author = "Carebook Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "carebook.toml", env = "CAREBOOK_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CAREBOOK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Run the storage schema migration
    Migrate(commands::migrate::MigrateArgs),

    /// Show booking and payment status counts
    Status(commands::status::StatusArgs),
}
