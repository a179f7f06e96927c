use std::env;
use std::time::Duration;

use storage::http::RemoteConfig;

use crate::error::ConfigError;
use crate::persist::DEFAULT_QUIET_PERIOD;

pub const API_URL_VAR: &str = "ROLLCALL_API_URL";
pub const LOCALE_VAR: &str = "ROLLCALL_LOCALE";
pub const AUTOSAVE_VAR: &str = "ROLLCALL_AUTOSAVE_MS";

pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_LOCALE: &str = "fr";

/// Runtime settings for the REST client and autosave timing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub autosave_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::new(DEFAULT_API_URL, DEFAULT_LOCALE),
            autosave_delay: DEFAULT_QUIET_PERIOD,
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but unusable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(API_URL_VAR) {
            config.set_api_url(&url)?;
        }
        if let Some(locale) = lookup(LOCALE_VAR) {
            config.set_locale(&locale)?;
        }
        if let Some(raw) = lookup(AUTOSAVE_VAR) {
            config.set_autosave_ms(&raw)?;
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::EmptyApiUrl` for a blank value.
    pub fn set_api_url(&mut self, url: &str) -> Result<(), ConfigError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }
        self.remote.base_url = url.to_owned();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::EmptyLocale` for a blank value.
    pub fn set_locale(&mut self, locale: &str) -> Result<(), ConfigError> {
        let locale = locale.trim();
        if locale.is_empty() {
            return Err(ConfigError::EmptyLocale);
        }
        self.remote.locale = locale.to_owned();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidAutosaveDelay` unless `raw` is a positive
    /// millisecond count.
    pub fn set_autosave_ms(&mut self, raw: &str) -> Result<(), ConfigError> {
        let millis = raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| ConfigError::InvalidAutosaveDelay {
                raw: raw.to_owned(),
            })?;
        self.autosave_delay = Duration::from_millis(millis);
        Ok(())
    }
}
