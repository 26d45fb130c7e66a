use std::time::Duration;

use thiserror::Error;

use crate::domain::native::Scale;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} is not a number: {value:?}")]
    Unparsable { name: &'static str, value: String },

    #[error("scale factor {0} is outside {min}..={max}", min = ToolkitConfig::MIN_SCALE_FACTOR, max = ToolkitConfig::MAX_SCALE_FACTOR)]
    ScaleFactorOutOfRange(f32),

    #[error("poll interval must be at least {}ms", ToolkitConfig::MIN_POLL_INTERVAL_MS)]
    ZeroPollInterval,
}

/// Run-loop and display settings
#[derive(Debug, Clone, PartialEq)]
pub struct ToolkitConfig {
    /// Longest time the loop blocks before draining cross-thread actions
    pub poll_interval: Duration,
    /// Overrides the display's scale factor when set
    pub scale_factor: Option<f32>,
    /// Catch handler panics at the run loop instead of unwinding out of it
    pub catch_panics: bool,
}

impl ToolkitConfig {
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;
    pub const MIN_POLL_INTERVAL_MS: u64 = 1;
    pub const MAX_POLL_INTERVAL_MS: u64 = 1000;
    pub const MIN_SCALE_FACTOR: f32 = 0.25;
    pub const MAX_SCALE_FACTOR: f32 = 8.0;

    pub const SCALE_FACTOR_VAR: &'static str = "GUIPP_SCALE_FACTOR";
    pub const POLL_INTERVAL_VAR: &'static str = "GUIPP_POLL_INTERVAL_MS";

    pub fn sanitize_poll_interval(ms: u64) -> u64 {
        ms.clamp(Self::MIN_POLL_INTERVAL_MS, Self::MAX_POLL_INTERVAL_MS)
    }

    pub fn sanitize_scale_factor(factor: f32) -> f32 {
        if factor.is_finite() {
            factor.clamp(Self::MIN_SCALE_FACTOR, Self::MAX_SCALE_FACTOR)
        } else {
            1.0
        }
    }

    pub fn validate_scale_factor(factor: f32) -> Result<f32, ConfigError> {
        if factor.is_finite() && (Self::MIN_SCALE_FACTOR..=Self::MAX_SCALE_FACTOR).contains(&factor) {
            Ok(factor)
        } else {
            Err(ConfigError::ScaleFactorOutOfRange(factor))
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        let ms = u64::try_from(interval.as_millis()).unwrap_or(Self::MAX_POLL_INTERVAL_MS);
        self.poll_interval = Duration::from_millis(Self::sanitize_poll_interval(ms));
        self
    }

    pub fn with_scale_factor(mut self, factor: f32) -> Self {
        self.scale_factor = Some(Self::sanitize_scale_factor(factor));
        self
    }

    pub fn with_catch_panics(mut self, catch: bool) -> Self {
        self.catch_panics = catch;
        self
    }

    /// Defaults overridden by `GUIPP_SCALE_FACTOR` and `GUIPP_POLL_INTERVAL_MS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(Self::SCALE_FACTOR_VAR) {
            let factor = value.trim().parse::<f32>().map_err(|_| ConfigError::Unparsable {
                name: Self::SCALE_FACTOR_VAR,
                value: value.clone(),
            })?;
            config.scale_factor = Some(Self::validate_scale_factor(factor)?);
        }

        if let Some(value) = lookup(Self::POLL_INTERVAL_VAR) {
            let ms = value.trim().parse::<u64>().map_err(|_| ConfigError::Unparsable {
                name: Self::POLL_INTERVAL_VAR,
                value: value.clone(),
            })?;
            if ms < Self::MIN_POLL_INTERVAL_MS {
                return Err(ConfigError::ZeroPollInterval);
            }
            config.poll_interval = Duration::from_millis(Self::sanitize_poll_interval(ms));
        }

        Ok(config)
    }

    /// Scale to use given what the display reports
    pub fn scale(&self, display: Scale) -> Scale {
        self.scale_factor.map(Scale::new).unwrap_or(display)
    }
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(Self::DEFAULT_POLL_INTERVAL_MS),
            scale_factor: None,
            catch_panics: true,
        }
    }
}
