//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Every
//! policy value the notification core consumes — importance thresholds,
//! the escalation level table, prep window bounds, checklist templates,
//! sweep cadence — is supplied here rather than hard-coded.

use quiet_sentinel_escalation::EscalationPolicy;
use quiet_sentinel_prep::{ChecklistCatalog, PrepWindow};
use quiet_sentinel_runtime::SweepConfig;
use quiet_sentinel_schedule::ImportanceThresholds;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP server listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// NATS connection settings for notification dispatch.
    pub nats: NatsSettings,

    /// Memory-retrieval service settings.
    #[serde(default)]
    pub memory: MemorySettings,

    /// Sweep driver configuration.
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Importance classifier thresholds.
    #[serde(default)]
    pub importance: ImportanceThresholds,

    /// Escalation level table.
    #[serde(default)]
    pub escalation: EscalationPolicy,

    /// Prep window bounds.
    #[serde(default)]
    pub prep_window: PrepWindow,

    /// Per-category checklist templates.
    #[serde(default)]
    pub checklists: ChecklistCatalog,
}

/// NATS connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NatsSettings {
    /// NATS server URL.
    pub url: String,
    /// Notification stream name override.
    #[serde(default)]
    pub stream_name: Option<String>,
}

/// Memory-retrieval service settings.
///
/// Enrichment is optional: with no base URL configured, prep artifacts
/// are generated without related notes.
#[derive(Debug, Clone, Deserialize)]
pub struct MemorySettings {
    /// Base URL of the memory service.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_memory_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_memory_timeout_seconds() -> u64 {
    5
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: default_memory_timeout_seconds(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Validates the policy values against their structural invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if any threshold, level table, or window is
    /// inconsistent.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.importance
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        self.escalation
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        self.prep_window
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_settings_default() {
        let settings = MemorySettings::default();
        assert!(settings.base_url.is_none());
        assert_eq!(settings.timeout_seconds, 5);
    }

    #[test]
    fn default_policy_values_validate() {
        let config = ServerConfig {
            database_url: "postgres://localhost/quiet_sentinel".to_string(),
            listen_addr: default_listen_addr(),
            nats: NatsSettings {
                url: "nats://localhost:4222".to_string(),
                stream_name: None,
            },
            memory: MemorySettings::default(),
            sweep: SweepConfig::default(),
            importance: ImportanceThresholds::default(),
            escalation: EscalationPolicy::default(),
            prep_window: PrepWindow::default(),
            checklists: ChecklistCatalog::default(),
        };

        assert!(config.validate().is_ok());
    }
}
