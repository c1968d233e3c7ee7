//! Startup configuration, read from a JSON file.
//!
//! Every field is optional in the file; anything left out falls back to the
//! same defaults the controller uses without a config (pin 0, 50 pixels,
//! full brightness, Auto mode, Bluetooth off). CLI flags are applied on top
//! by the binary.
//!
//! ```json
//! { "pin": 2, "count": 30, "brightness": 64, "mode": "manual" }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::band::{DEFAULT_BRIGHTNESS, DEFAULT_PIXEL_COUNT, MAX_PIXEL_COUNT, Pin};
use crate::error::ConfigError;
use crate::policy::UpdateMode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Pin the band binds to if nobody binds it explicitly
    pub pin: Pin,
    /// Pixel count used for that default binding
    pub count: usize,
    /// Brightness the band starts with
    pub brightness: u8,
    /// Starting update mode
    pub mode: UpdateMode,
    /// Start with Bluetooth on, i.e. strip output suppressed
    pub bluetooth: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            pin: Pin::default(),
            count: DEFAULT_PIXEL_COUNT,
            brightness: DEFAULT_BRIGHTNESS,
            mode: UpdateMode::default(),
            bluetooth: false,
        }
    }
}

impl ControllerConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the controller could never bind.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count > MAX_PIXEL_COUNT {
            return Err(ConfigError::TooManyPixels {
                count: self.count,
                max: MAX_PIXEL_COUNT,
            });
        }
        Ok(())
    }
}
