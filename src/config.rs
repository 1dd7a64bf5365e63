// SPDX-License-Identifier: GPL-3.0-only

use crate::backend::{analytics::DEFAULT_API_BASE_URL, refresh::DEFAULT_POLL_INTERVAL_SECS};
use cosmic::cosmic_config::{self, cosmic_config_derive::CosmicConfigEntry, CosmicConfigEntry};
use serde::{Deserialize, Serialize};

pub const APP_ID: &str = "io.github.gadashlet.GaDashlet";

const DEFAULT_KEY_FILE: &str = "client_secrets.json";
const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, CosmicConfigEntry)]
#[version = 1]
pub struct DashletConfig {
    /// Service account JSON key file
    pub key_file: String,
    /// Seconds between refreshes
    pub poll_interval_secs: u64,
    /// Suffix printed after revenue figures
    pub currency: String,
    /// Root of the analytics v3 API
    pub api_base_url: String,
}

impl Default for DashletConfig {
    fn default() -> Self {
        Self {
            key_file: DEFAULT_KEY_FILE.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            currency: DEFAULT_CURRENCY.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl DashletConfig {
    /// Load from cosmic-config, falling back to defaults.
    pub fn load() -> Self {
        let mut config = cosmic_config::Config::new(APP_ID, Self::VERSION)
            .ok()
            .and_then(|c| match Self::get_entry(&c) {
                Ok(config) => Some(config),
                Err((errs, config)) => {
                    for err in errs {
                        tracing::warn!(?err, "Error loading config entry");
                    }
                    Some(config)
                }
            })
            .unwrap_or_default();
        config.validate();
        config
    }

    /// Clamp the interval to 5 s..=1 h and replace blank strings with defaults.
    pub fn validate(&mut self) {
        self.poll_interval_secs = self.poll_interval_secs.clamp(5, 3600);

        let defaults = Self::default();
        for (field, default) in [
            (&mut self.key_file, defaults.key_file),
            (&mut self.currency, defaults.currency),
            (&mut self.api_base_url, defaults.api_base_url),
        ] {
            if field.trim().is_empty() {
                *field = default;
            }
        }
    }
}
