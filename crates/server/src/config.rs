use std::path::Path;

use serde::{Deserialize, Serialize};

use agegate_core::GateConfig;

use crate::error::ServerError;

/// Top-level configuration for the Agegate server, loaded from a JSON file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AgegateConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Session-state backend configuration.
    #[serde(default)]
    pub state: StateConfig,

    /// Verification/appeal record backend configuration.
    #[serde(default)]
    pub records: RecordsConfig,

    /// Discord connectivity. Disabled by default so the daemon can run
    /// end to end without platform credentials.
    #[serde(default)]
    pub discord: DiscordSection,

    /// Background worker scheduling.
    #[serde(default)]
    pub background: BackgroundSection,

    /// Gate policy: roles, channels, thresholds, templates.
    #[serde(default)]
    pub gate: GateConfig,
}

impl AgegateConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            ServerError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }
}

/// HTTP server bind configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Graceful shutdown timeout in seconds.
    ///
    /// Maximum time to wait for in-flight requests and pending audit tasks
    /// to complete during shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Session-state backend configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct StateConfig {
    /// Backend to use. Currently only `"memory"`.
    #[serde(default = "default_backend")]
    pub backend: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

/// Verification/appeal record backend configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// Backend to use: `"memory"` or `"sqlite"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Database path for the sqlite backend.
    #[serde(default = "default_records_path")]
    pub path: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_records_path(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_records_path() -> String {
    "agegate.db".to_owned()
}

/// Discord connectivity configuration.
///
/// When disabled, guild actions are logged instead of executed and audit
/// events stay in the in-memory sink.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DiscordSection {
    /// Whether to talk to the Discord REST API.
    #[serde(default)]
    pub enabled: bool,

    /// Bot token. Required when enabled.
    #[serde(default)]
    pub token: String,

    /// API base URL override, for proxies and tests.
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Background worker scheduling configuration.
#[derive(Debug, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct BackgroundSection {
    /// Whether to run the background processor at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between retention sweeps.
    #[serde(default = "default_daily")]
    pub retention_interval_seconds: u64,

    /// Seconds between reminder sweeps.
    #[serde(default = "default_daily")]
    pub reminder_interval_seconds: u64,

    /// Seconds between auto-kick sweeps.
    #[serde(default = "default_half_daily")]
    pub kick_interval_seconds: u64,

    /// Seconds between raid-watch checks.
    #[serde(default = "default_raid_check")]
    pub raid_check_interval_seconds: u64,

    /// Enable the retention reaper.
    #[serde(default = "default_true")]
    pub enable_retention: bool,

    /// Enable verification reminders.
    #[serde(default = "default_true")]
    pub enable_reminders: bool,

    /// Enable the unverified auto-kick sweep.
    #[serde(default = "default_true")]
    pub enable_auto_kick: bool,

    /// Enable the raid watchdog.
    #[serde(default = "default_true")]
    pub enable_raid_watch: bool,
}

impl Default for BackgroundSection {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_interval_seconds: default_daily(),
            reminder_interval_seconds: default_daily(),
            kick_interval_seconds: default_half_daily(),
            raid_check_interval_seconds: default_raid_check(),
            enable_retention: true,
            enable_reminders: true,
            enable_auto_kick: true,
            enable_raid_watch: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_daily() -> u64 {
    86_400
}

fn default_half_daily() -> u64 {
    43_200
}

fn default_raid_check() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: AgegateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.state.backend, "memory");
        assert_eq!(config.records.backend, "memory");
        assert!(!config.discord.enabled);
        assert!(config.background.enabled);
        assert_eq!(config.background.raid_check_interval_seconds, 300);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = AgegateConfig::load("/nonexistent/agegate.json").unwrap();
        assert_eq!(config.server.port, 8080);
        assert!((config.gate.verification.min_age - 13.0).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_document_overrides_selected_fields() {
        let json = r#"{
            "server": { "port": 9090 },
            "records": { "backend": "sqlite", "path": "gate.db" },
            "discord": { "enabled": true, "token": "bot-token" },
            "gate": {
                "guild": "112233",
                "verification": { "cooldown_minutes": 5 }
            }
        }"#;
        let config: AgegateConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.records.backend, "sqlite");
        assert_eq!(config.records.path, "gate.db");
        assert!(config.discord.enabled);
        assert_eq!(config.gate.guild.as_str(), "112233");
        assert_eq!(config.gate.verification.cooldown_minutes, 5);
        assert!((config.gate.verification.min_age - 13.0).abs() < f32::EPSILON);
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let dir = std::env::temp_dir().join("agegate-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "not json at all").unwrap();

        let err = AgegateConfig::load(&path).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
        assert!(err.to_string().contains("broken.json"));
    }
}
