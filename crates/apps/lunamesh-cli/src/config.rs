use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lunamesh_delivery::form::{
    DEFAULT_ALTITUDE_M, DEFAULT_CHANNEL, DEFAULT_DRONE, DEFAULT_RECIPIENT,
};
use lunamesh_delivery::{DeliveryTracker, PigeonMailForm, DEFAULT_CHAT_MAX_BYTES};
use lunamesh_geo::{Coordinate, ReferenceFix, ReferenceResolver};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PigeonConfig {
    pub pigeon: PigeonDefaults,
    pub reference: ReferenceConfig,
    pub chat: ChatConfig,
    pub tracker: TrackerConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PigeonDefaults {
    pub recipient: String,
    pub drone: String,
    pub altitude_m: f64,
    pub channel: i64,
}

impl Default for PigeonDefaults {
    fn default() -> Self {
        Self {
            recipient: DEFAULT_RECIPIENT.into(),
            drone: DEFAULT_DRONE.into(),
            altitude_m: DEFAULT_ALTITUDE_M,
            channel: DEFAULT_CHANNEL,
        }
    }
}

/// Operator position used for the radius gate.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub allow_default_fallback: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub max_bytes: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { max_bytes: DEFAULT_CHAT_MAX_BYTES }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// 0 waits on the transport indefinitely.
    pub settle_timeout_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self { settle_timeout_secs: 60 }
    }
}

impl PigeonConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Ok(Self::from_toml(&contents)?)
    }

    /// Form pre-filled with the configured defaults.
    pub fn form(&self) -> PigeonMailForm {
        PigeonMailForm {
            altitude: self.pigeon.altitude_m,
            recipient_node_id: self.pigeon.recipient.clone(),
            drone_node_id: self.pigeon.drone.clone(),
            channel: self.pigeon.channel,
            ..PigeonMailForm::default()
        }
    }

    /// Configured operator position, or the fallback when enabled.
    pub fn reference_fix(&self) -> Option<ReferenceFix> {
        let live = match (self.reference.latitude, self.reference.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate::new(latitude, longitude)),
            _ => None,
        };
        let resolver = if self.reference.allow_default_fallback {
            ReferenceResolver::with_fallback()
        } else {
            ReferenceResolver::live_only()
        };
        resolver.resolve(live, None)
    }

    pub fn settle_timeout(&self) -> Option<Duration> {
        match self.tracker.settle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn tracker(&self) -> DeliveryTracker {
        match self.settle_timeout() {
            Some(timeout) => DeliveryTracker::with_settle_timeout(timeout),
            None => DeliveryTracker::new(),
        }
    }
}
