//! Runtime configuration read from the environment.
//!
//! A missing API key is not an error here: insight requests fail later with
//! the generic error text instead.

use crate::{aggregate::TimelineOrder, error::ConfigError, provider::Provider};

pub const PROVIDER_ENV: &str = "INSIGHTTRACK_PROVIDER";
pub const TIMELINE_ORDER_ENV: &str = "INSIGHTTRACK_TIMELINE_ORDER";
pub const LOG_LEVEL_ENV: &str = "INSIGHTTRACK_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub timeline_order: TimelineOrder,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: None,
            timeline_order: TimelineOrder::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let provider = match lookup(PROVIDER_ENV) {
            Some(value) => value
                .parse::<Provider>()
                .map_err(|value| ConfigError::UnknownProvider {
                    env_var: PROVIDER_ENV.to_string(),
                    value,
                })?,
            None => defaults.provider,
        };

        let timeline_order = match lookup(TIMELINE_ORDER_ENV) {
            Some(value) => value.parse::<TimelineOrder>().map_err(|value| {
                ConfigError::UnknownTimelineOrder {
                    env_var: TIMELINE_ORDER_ENV.to_string(),
                    value,
                }
            })?,
            None => defaults.timeline_order,
        };

        let api_key = lookup(provider.config().env_var)
            .or_else(|| lookup(crate::provider::FALLBACK_API_KEY_ENV))
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            provider,
            api_key,
            timeline_order,
            log_level: lookup(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
        })
    }

    /// Switch provider and pick up that provider's key from the environment.
    pub fn with_provider(mut self, provider: Provider) -> Self {
        if provider != self.provider {
            self.provider = provider;
            self.api_key = provider.api_key_from_env();
        }
        self
    }

    pub fn log_config(&self) {
        tracing::info!(
            provider = self.provider.name(),
            model = self.provider.config().model,
            api_key = if self.api_key.is_some() { "***" } else { "<unset>" },
            timeline_order = ?self.timeline_order,
            "Configuration loaded"
        );
    }
}
