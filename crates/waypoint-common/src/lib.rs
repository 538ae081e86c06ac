//! Centralized configuration resolution for Waypoint
//!
//! The only externally recognized setting is the listening port:
//! ```text
//! 1. WAYPOINT_PORT, then PORT          (environment)
//! 2. <config_dir>/waypoint/config.json  {"port": 4000} or {"port": "4000"}
//! 3. DEFAULT_PORT
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Port used when nothing else is configured
pub const DEFAULT_PORT: u16 = 4000;

/// Environment variables consulted for the port, in priority order
pub const PORT_ENV_VARS: [&str; 2] = ["WAYPOINT_PORT", "PORT"];

/// A port as it appears in configuration: either a number or a numeric string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum PortValue {
    Number(u16),
    Text(String),
}

impl PortValue {
    pub fn to_port(&self) -> anyhow::Result<u16> {
        match self {
            PortValue::Number(port) => Ok(*port),
            PortValue::Text(text) => parse_port(text),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct WaypointConfig {
    port: Option<PortValue>,
}

/// Parse a port string such as `"4000"` (surrounding whitespace allowed)
pub fn parse_port(raw: &str) -> anyhow::Result<u16> {
    raw.trim()
        .parse::<u16>()
        .map_err(|e| anyhow::anyhow!("Invalid port {:?}: {}", raw, e))
}

/// Get the global configuration path
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("waypoint").join("config.json"))
}

/// Load the persistent port from a specific config file.
///
/// A missing file is silent; an unreadable or malformed one is logged and skipped.
pub fn load_port_from(path: &Path) -> Option<u16> {
    if !path.exists() {
        return None;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read config file at {:?}: {}", path, e);
            return None;
        }
    };

    let config = match serde_json::from_str::<WaypointConfig>(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config file at {:?}: {}", path, e);
            return None;
        }
    };

    match config.port?.to_port() {
        Ok(port) => Some(port),
        Err(e) => {
            warn!("Ignoring port in {:?}: {}", path, e);
            None
        }
    }
}

/// Load the persistent port from the global config file
pub fn load_persistent_port() -> Option<u16> {
    load_port_from(&config_path()?)
}

/// Read the port from the environment, if any of [`PORT_ENV_VARS`] is set.
///
/// A set but unparseable value is an error rather than a silent fallback.
pub fn env_port() -> anyhow::Result<Option<u16>> {
    for var in PORT_ENV_VARS {
        if let Ok(val) = std::env::var(var) {
            return parse_port(&val)
                .map(Some)
                .map_err(|e| anyhow::anyhow!("{}: {}", var, e));
        }
    }
    Ok(None)
}

/// Combine already-gathered sources in priority order
pub fn pick_port(env: Option<u16>, persistent: Option<u16>) -> u16 {
    env.or(persistent).unwrap_or(DEFAULT_PORT)
}

/// Resolve the listening port from environment, persistent config, or default
pub fn resolve_port() -> anyhow::Result<u16> {
    let env = env_port()?;
    let persistent = if env.is_none() {
        load_persistent_port()
    } else {
        None
    };
    let port = pick_port(env, persistent);
    info!("Resolved listening port: {}", port);
    Ok(port)
}
