//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{CarebookConfig, StorageTarget};
use crate::config::secret_string;
use crate::domain::errors::CarebookError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into CarebookConfig
/// 4. Applies environment variable overrides (CAREBOOK_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use carebook::config::load_config;
///
/// let config = load_config("carebook.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CarebookConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CarebookError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CarebookError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Perform environment variable substitution
    let contents = substitute_env_vars(&contents)?;

    // Parse TOML
    let mut config: CarebookConfig = toml::from_str(&contents)
        .map_err(|e| CarebookError::Configuration(format!("Failed to parse TOML: {e}")))?;

    // Apply environment variable overrides
    apply_env_overrides(&mut config);

    // Validate configuration
    config
        .validate()
        .map_err(|e| CarebookError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| CarebookError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        // Don't process env vars in comments
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(CarebookError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the CAREBOOK_* prefix
///
/// Environment variables follow the pattern: CAREBOOK_<SECTION>_<KEY>
/// For example: CAREBOOK_STORAGE_TARGET, CAREBOOK_POSTGRESQL_CONNECTION_STRING
fn apply_env_overrides(config: &mut CarebookConfig) {
    if let Ok(val) = std::env::var("CAREBOOK_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("CAREBOOK_STORAGE_TARGET") {
        match val.to_lowercase().as_str() {
            "memory" => config.storage_target = StorageTarget::Memory,
            "postgresql" => config.storage_target = StorageTarget::PostgreSQL,
            other => {
                tracing::warn!(value = other, "Ignoring unknown CAREBOOK_STORAGE_TARGET");
            }
        }
    }

    if let Some(ref mut pg_config) = config.postgresql {
        if let Ok(val) = std::env::var("CAREBOOK_POSTGRESQL_CONNECTION_STRING") {
            pg_config.connection_string = secret_string(val);
        }
        if let Ok(val) = std::env::var("CAREBOOK_POSTGRESQL_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                pg_config.max_connections = max;
            }
        }
    }

    if let Ok(val) = std::env::var("CAREBOOK_BOOKING_MIN_CANCELLATION_NOTICE_HOURS") {
        if let Ok(hours) = val.parse() {
            config.booking.min_cancellation_notice_hours = hours;
        }
    }

    if let Ok(val) = std::env::var("CAREBOOK_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("CAREBOOK_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_minimal_memory_config() {
        let file = write_config(
            r#"
storage_target = "memory"

[application]
log_level = "info"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.storage_target, StorageTarget::Memory);
        assert_eq!(config.booking.min_cancellation_notice_hours, 0);
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = load_config("/nonexistent/carebook.toml").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CAREBOOK_TEST_DB_URL", "postgresql://u:p@db:5432/carebook");
        let file = write_config(
            r#"
storage_target = "postgresql"

[application]
log_level = "debug"

[postgresql]
connection_string = "${CAREBOOK_TEST_DB_URL}"
"#,
        );
        let config = load_config(file.path()).unwrap();
        let pg = config.postgresql.unwrap();
        use secrecy::ExposeSecret;
        assert_eq!(
            pg.connection_string.expose_secret().as_ref(),
            "postgresql://u:p@db:5432/carebook"
        );
        std::env::remove_var("CAREBOOK_TEST_DB_URL");
    }

    #[test]
    fn test_missing_env_var_reported() {
        let file = write_config(
            r#"
storage_target = "postgresql"

[application]
log_level = "info"

[postgresql]
connection_string = "${CAREBOOK_UNSET_VAR_FOR_TEST}"
"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("CAREBOOK_UNSET_VAR_FOR_TEST"));
    }

    #[test]
    fn test_comments_are_not_substituted() {
        let file = write_config(
            r#"
# The connection string can use ${SOME_UNDEFINED_PLACEHOLDER}
storage_target = "memory"

[application]
log_level = "info"
"#,
        );
        assert!(load_config(file.path()).is_ok());
    }

    #[test]
    fn test_validation_failure_surfaces() {
        let file = write_config(
            r#"
storage_target = "memory"

[application]
log_level = "loud"
"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }
}
