//! Bridge configuration: reads `~/.playbridge/bridge.toml` and yields view
//! dimensions, the trusted child origins and handshake defaults.
//!
//! Loading never fails. A missing, unreadable or malformed file falls back to
//! defaults, and the default trust list is empty, so a broken config fails
//! closed.

use crate::error::{BridgeError, Result};
use crate::trust::OriginPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Display and trust settings of a `GameView`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ViewSettings {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Origin rules, see `OriginRule::parse`.
    #[serde(default)]
    pub trusted_origins: Vec<String>,
    /// Origin relative content urls are resolved against.
    #[serde(default)]
    pub content_origin: Option<String>,
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            trusted_origins: Vec::new(),
            content_origin: None,
        }
    }
}

/// Identity handshake defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HandshakeConfig {
    /// Countdown used when the guest does not pass a positive limit.
    #[serde(default = "default_limit_seconds")]
    pub default_limit_seconds: u32,
}

fn default_limit_seconds() -> u32 {
    15
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            default_limit_seconds: default_limit_seconds(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub handshake: HandshakeConfig,
}

impl BridgeConfig {
    /// Loads `~/.playbridge/bridge.toml` if it exists.
    pub fn load() -> Self {
        Self::load_from(dirs_path().join("bridge.toml"))
    }

    /// Loads config from an explicit path, falling back to defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No bridge config at {:?}, using defaults (no trusted origins)", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!("Loaded bridge config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("{} in {:?}. Falling back to defaults.", e, path);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read bridge config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Parses config from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| BridgeError::Config(e.to_string()))
    }

    /// Builds the trust predicate for the configured origins.
    pub fn origin_policy(&self) -> Result<OriginPolicy> {
        OriginPolicy::from_entries(&self.view.trusted_origins)
    }
}

/// Resolve the playbridge config directory.
fn dirs_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        Path::new(&home).join(".playbridge")
    } else if let Ok(home) = std::env::var("USERPROFILE") {
        Path::new(&home).join(".playbridge")
    } else {
        PathBuf::from(".playbridge")
    }
}
