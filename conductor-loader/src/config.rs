use std::time::Duration;

use conductor_core::ManifestSettings;

/// How long the loader waits for retrieval + activation of one component.
pub const ACTIVATION_TIMEOUT: Duration = Duration::from_secs(30);
/// How long a critical component gets to register itself after activation.
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(10);
pub const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Pause after an optional component activates.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Loader timings. Defaults match the constants above; a manifest's
/// `settings` block overrides individual fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    pub activation_timeout: Duration,
    pub readiness_timeout: Duration,
    pub readiness_poll: Duration,
    pub settle_delay: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            activation_timeout: ACTIVATION_TIMEOUT,
            readiness_timeout: READINESS_TIMEOUT,
            readiness_poll: READINESS_POLL_INTERVAL,
            settle_delay: SETTLE_DELAY,
        }
    }
}

impl LoaderConfig {
    pub fn from_settings(settings: &ManifestSettings) -> Self {
        let defaults = Self::default();
        let ms = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_millis).unwrap_or(fallback)
        };
        Self {
            activation_timeout: ms(settings.activation_timeout_ms, defaults.activation_timeout),
            readiness_timeout: ms(settings.readiness_timeout_ms, defaults.readiness_timeout),
            // tokio intervals reject a zero period.
            readiness_poll: ms(settings.readiness_poll_ms, defaults.readiness_poll)
                .max(MIN_POLL_INTERVAL),
            settle_delay: ms(settings.settle_delay_ms, defaults.settle_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_keep_defaults() {
        let config = LoaderConfig::from_settings(&ManifestSettings::default());
        assert_eq!(config, LoaderConfig::default());
    }

    #[test]
    fn settings_override_individual_fields() {
        let settings = ManifestSettings {
            settle_delay_ms: Some(20),
            readiness_poll_ms: Some(0),
            ..ManifestSettings::default()
        };
        let config = LoaderConfig::from_settings(&settings);
        assert_eq!(config.settle_delay, Duration::from_millis(20));
        assert_eq!(config.readiness_poll, MIN_POLL_INTERVAL);
        assert_eq!(config.activation_timeout, ACTIVATION_TIMEOUT);
    }
}
