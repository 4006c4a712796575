use framewatch_detect::SourceKind;
use serde::{Deserialize, Serialize};

use crate::error::FramewatchError;
use crate::gate::ChangeGate;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level engine configuration.
///
/// Every section falls back to the built-in defaults, so an override only
/// needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub retry_interval_ms: u64,
    pub max_retries: u32,
    pub observe_mutations: bool,
    pub revalidate_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub sdk_poll_interval_ms: u64,
    pub max_read_failures: u32,
}

/// Gate policy per source kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub native: ChangeGate,
    pub sdk: ChangeGate,
}

impl GateConfig {
    pub fn for_kind(&self, kind: SourceKind) -> ChangeGate {
        match kind {
            SourceKind::Native => self.native,
            SourceKind::Sdk => self.sdk,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Send `exists: false` on every fall back to idle. When off, the host
    /// is left to expire its last reading on its own.
    pub clear_on_idle: bool,
}

impl EngineConfig {
    /// Parse a (possibly partial) TOML override on top of the defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, FramewatchError> {
        toml::from_str(toml_str).map_err(|e| FramewatchError::Config(e.to_string()))
    }

    /// Serialize to TOML, e.g. to show the effective configuration.
    pub fn to_toml(&self) -> Result<String, FramewatchError> {
        toml::to_string_pretty(self).map_err(|e| FramewatchError::Config(e.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

fn default_log_level() -> String {
    "framewatch=info".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: 500,
            max_retries: 20,
            observe_mutations: true,
            revalidate_interval_ms: 2000,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            sdk_poll_interval_ms: 1000,
            max_read_failures: 5,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            native: ChangeGate::ValueDelta { threshold: 0.5 },
            sdk: ChangeGate::TimeDelta { interval_ms: 3000 },
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            clear_on_idle: true,
        }
    }
}
