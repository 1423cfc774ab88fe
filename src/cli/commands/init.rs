//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "carebook.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Carebook configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set storage_target to 'memory' or 'postgresql'");
                println!("  3. For PostgreSQL, set CAREBOOK_DATABASE_URL in your environment");
                println!("     (or a .env file) and run: carebook migrate");
                println!("  4. Validate configuration: carebook validate-config");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate the sample configuration
    fn generate_config() -> String {
        r#"# Carebook Configuration File
# Clinic booking and payment state manager

# Storage backend (memory or postgresql)
storage_target = "memory"  # memory | postgresql

[application]
log_level = "info"

# [postgresql]
# connection_string = "${CAREBOOK_DATABASE_URL}"
# max_connections = 10
# connection_timeout_seconds = 30
# statement_timeout_seconds = 60

[booking]
# Minimum notice, in hours, required to cancel a booking
# (0, the default, allows cancellation any time before the slot)
min_cancellation_notice_hours = 0

[logging]
local_enabled = true
local_path = "logs/"
local_rotation = "daily"
local_max_size_mb = 100
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_parses() {
        let contents = InitArgs::generate_config();
        // The commented postgresql section stays commented, so the sample
        // must parse as a valid memory-target config
        let parsed: crate::config::CarebookConfig = toml::from_str(&contents).unwrap();
        assert!(parsed.validate().is_ok());
    }
}
