use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::env;
use tracing::{info, warn};

use crate::intent_matcher::{MIN_COMMON_WORDS, MatcherSettings, SIMILARITY_THRESHOLD};

// Import logging macros
use crate::{log_system_event, log_validation};

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub tutor: TutorConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Logging system configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

/// Thresholds for the tutoring assistant's matching stages
#[derive(Debug, Clone, Deserialize)]
pub struct TutorConfig {
    pub similarity_threshold: f64,
    pub min_common_words: usize,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        log_system_event!(config, "Loading application configuration from environment variables");

        let config = Config {
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            tutor: TutorConfig::from_env()?,
        };

        log_system_event!(config, "Configuration loaded successfully");
        config.log_configuration_summary();

        Ok(config)
    }

    /// Log a summary of loaded configuration (without sensitive data)
    fn log_configuration_summary(&self) {
        info!(
            database_url_masked = %mask_sensitive_data(&self.database.url),
            server_address = %self.server.address(),
            log_level = %self.logging.level,
            similarity_threshold = self.tutor.similarity_threshold,
            min_common_words = self.tutor.min_common_words,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.database.url.starts_with("sqlite:") {
            let error = anyhow!("DATABASE_URL must start with 'sqlite:'");
            log_validation!(failure, "configuration", error = error);
            return Err(error);
        }

        if self.server.port == 0 {
            let error = anyhow!("Server port must be greater than 0");
            log_validation!(failure, "configuration", error = error);
            return Err(error);
        }

        if !(0.0..1.0).contains(&self.tutor.similarity_threshold) {
            let error = anyhow!(
                "TUTOR_SIMILARITY_THRESHOLD must be in [0, 1), got {}",
                self.tutor.similarity_threshold
            );
            log_validation!(failure, "configuration", error = error);
            return Err(error);
        }

        if self.tutor.min_common_words == 0 {
            warn!("TUTOR_MIN_COMMON_WORDS is 0 - every input will match the first knowledge entry");
        }

        let base_level = self.logging.level.split(',').next().unwrap_or_default();
        if !["trace", "debug", "info", "warn", "error"].contains(&base_level.to_lowercase().as_str()) {
            warn!("Invalid log level '{}', using 'info' as fallback", self.logging.level);
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self> {
        let url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:smart_learning.db?mode=rwc".to_string());

        Ok(DatabaseConfig { url })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self> {
        let port_str = env::var("PORT")
            .unwrap_or_else(|_| "5001".to_string());

        let port = port_str.parse::<u16>()
            .map_err(|_| anyhow!("Invalid PORT value: '{}'. Must be a number between 1-65535", port_str))?;

        let host = env::var("HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        Ok(ServerConfig { port, host })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self> {
        let level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info,smart_learning=debug".to_string());

        let file_enabled = env::var("LOG_FILE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let console_enabled = env::var("LOG_CONSOLE_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let log_directory = env::var("LOG_DIRECTORY")
            .unwrap_or_else(|_| "logs".to_string());

        Ok(LoggingConfig {
            level,
            file_enabled,
            console_enabled,
            log_directory,
        })
    }
}

impl TutorConfig {
    fn from_env() -> Result<Self> {
        let similarity_threshold = match env::var("TUTOR_SIMILARITY_THRESHOLD") {
            Ok(value) => value.parse::<f64>().map_err(|_| {
                anyhow!("Invalid TUTOR_SIMILARITY_THRESHOLD value: '{}'. Must be a number", value)
            })?,
            Err(_) => SIMILARITY_THRESHOLD,
        };

        let min_common_words = match env::var("TUTOR_MIN_COMMON_WORDS") {
            Ok(value) => value.parse::<usize>().map_err(|_| {
                anyhow!("Invalid TUTOR_MIN_COMMON_WORDS value: '{}'. Must be a whole number", value)
            })?,
            Err(_) => MIN_COMMON_WORDS,
        };

        Ok(TutorConfig {
            similarity_threshold,
            min_common_words,
        })
    }

    pub fn matcher_settings(&self) -> MatcherSettings {
        MatcherSettings {
            min_common_words: self.min_common_words,
            similarity_threshold: self.similarity_threshold,
        }
    }
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: SIMILARITY_THRESHOLD,
            min_common_words: MIN_COMMON_WORDS,
        }
    }
}

/// Mask sensitive data in configuration for safe logging
fn mask_sensitive_data(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            database: DatabaseConfig {
                url: "sqlite:test.db".to_string(),
            },
            server: ServerConfig {
                port: 5001,
                host: "0.0.0.0".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_enabled: true,
                console_enabled: true,
                log_directory: "logs".to_string(),
            },
            tutor: TutorConfig::default(),
        }
    }

    #[test]
    fn test_mask_sensitive_data() {
        assert_eq!(mask_sensitive_data("short"), "*****");
        assert_eq!(mask_sensitive_data("sqlite:smart_learning.db"), "sqli***g.db");
    }

    #[test]
    fn test_config_validation() {
        let config = valid_config();
        assert!(config.validate().is_ok());

        let mut invalid_config = config.clone();
        invalid_config.server.port = 0;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.database.url = "postgres://localhost/db".to_string();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config;
        invalid_config.tutor.similarity_threshold = 1.5;
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_tutor_defaults_match_matcher_constants() {
        let settings = TutorConfig::default().matcher_settings();
        assert_eq!(settings, MatcherSettings::default());
        assert_eq!(settings.min_common_words, 2);
        assert_eq!(settings.similarity_threshold, 0.3);
    }

    #[test]
    fn test_server_address() {
        assert_eq!(valid_config().server.address(), "0.0.0.0:5001");
    }
}
