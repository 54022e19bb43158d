use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tick_store::StoreConfig;

const CONFIG_FILE: &str = ".tick-store.toml";

/// Host configuration, read from `.tick-store.toml`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HostConfig {
    /// Ticks per second
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Number of ticks to run before shutting down
    #[serde(default = "default_frames")]
    pub frames: u64,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_frame_rate() -> u32 {
    60
}

fn default_frames() -> u64 {
    180
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            frames: default_frames(),
            store: StoreConfig::default(),
        }
    }
}

impl HostConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load config from the config file, or use defaults if not found
    pub fn load() -> Self {
        if let Some(content) = load_config_file() {
            match Self::from_toml_str(&content) {
                Ok(config) => return config,
                Err(e) => log::warn!("Failed to parse {}: {}", CONFIG_FILE, e),
            }
        }

        log::debug!("Using default host config");
        Self::default()
    }

    /// Time between two ticks; a zero frame rate is treated as one tick per second
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }
}

/// Load config file content from CWD first, then home directory
fn load_config_file() -> Option<String> {
    if let Ok(content) = std::fs::read_to_string(CONFIG_FILE) {
        log::debug!("Loaded config from {}", CONFIG_FILE);
        return Some(content);
    }

    let home_config = home_config_path()?;
    match std::fs::read_to_string(&home_config) {
        Ok(content) => {
            log::debug!("Loaded config from {}", home_config.display());
            Some(content)
        }
        Err(_) => None,
    }
}

fn home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE))
}
