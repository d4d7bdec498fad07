use std::str::FromStr;

use crate::services::cache::DEFAULT_CACHE_TTL_SECS;
use crate::services::providers::avwx::AVWX_API_URL;
use crate::services::providers::awc::AWC_API_URL;
use crate::services::providers::checkwx::CHECKWX_API_URL;

/// Per-attempt provider timeout bounds (seconds).
const MIN_PROVIDER_TIMEOUT_SECS: u64 = 10;
const MAX_PROVIDER_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 12;

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cache_ttl_secs: u64,
    /// Clamped to 10..=15 seconds
    pub provider_timeout_secs: u64,
    pub checkwx_api_key: Option<String>,
    pub avwx_api_key: Option<String>,
    /// The free AviationWeather.gov source needs no key, only this switch.
    pub awc_enabled: bool,
    pub user_agent: String,
    pub checkwx_base_url: String,
    pub avwx_base_url: String,
    pub awc_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_or("PORT", 8080),
            cache_ttl_secs: parse_or("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
            provider_timeout_secs: parse_or("PROVIDER_TIMEOUT_SECS", DEFAULT_PROVIDER_TIMEOUT_SECS)
                .clamp(MIN_PROVIDER_TIMEOUT_SECS, MAX_PROVIDER_TIMEOUT_SECS),
            checkwx_api_key: non_empty("CHECKWX_API_KEY"),
            avwx_api_key: non_empty("AVWX_API_KEY"),
            awc_enabled: parse_or("AWC_ENABLED", true),
            user_agent: std::env::var("PROVIDER_USER_AGENT").unwrap_or_else(|_| {
                "FlightBriefing/0.1 (+https://github.com/flight-briefing/api)".to_string()
            }),
            checkwx_base_url: std::env::var("CHECKWX_BASE_URL")
                .unwrap_or_else(|_| CHECKWX_API_URL.to_string()),
            avwx_base_url: std::env::var("AVWX_BASE_URL")
                .unwrap_or_else(|_| AVWX_API_URL.to_string()),
            awc_base_url: std::env::var("AWC_BASE_URL").unwrap_or_else(|_| AWC_API_URL.to_string()),
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse `name` from the environment, warning and falling back on bad input.
fn parse_or<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Invalid {}='{}': {}, defaulting to {}", name, raw, e, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        // NOTE: set_var/remove_var are unsafe when other threads read the
        // environment. This is the only test in the crate that touches it.
        unsafe {
            std::env::remove_var("PORT");
            std::env::remove_var("CACHE_TTL_SECS");
            std::env::set_var("PROVIDER_TIMEOUT_SECS", "60");
            std::env::set_var("CHECKWX_API_KEY", "   ");
            std::env::remove_var("AVWX_API_KEY");
            std::env::set_var("AWC_ENABLED", "not-a-bool");
            std::env::remove_var("PROVIDER_USER_AGENT");
        }

        let config = AppConfig::from_env();

        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.provider_timeout_secs, 15);
        assert_eq!(config.checkwx_api_key, None);
        assert_eq!(config.avwx_api_key, None);
        assert!(config.awc_enabled);
        assert!(config.user_agent.contains("FlightBriefing"));
    }
}
