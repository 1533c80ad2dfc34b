// Store configuration read from the environment.
//
// Variables (all optional)
// - EVENTING_MAX_AGGREGATE_AGE_MS: age eviction horizon. Unset disables the age rule.
// - EVENTING_MAX_AGGREGATES_COUNT: count eviction ceiling, positive. Unset disables the count rule.
// - EVENTING_CLEANUP_INTERVAL_MS: eviction worker period. Unset disables the worker;
//   saves still run an inline eviction pass.
// - EVENTING_METRICS_INTERVAL_MS: telemetry worker period, 1000 by default.
// - EVENTING_HTTP_ADDR: listen address, 0.0.0.0:8080 by default.

use crate::shared::infrastructure::event_store::eviction::EvictionPolicy;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const MAX_AGGREGATE_AGE_MS: &str = "EVENTING_MAX_AGGREGATE_AGE_MS";
pub const MAX_AGGREGATES_COUNT: &str = "EVENTING_MAX_AGGREGATES_COUNT";
pub const CLEANUP_INTERVAL_MS: &str = "EVENTING_CLEANUP_INTERVAL_MS";
pub const METRICS_INTERVAL_MS: &str = "EVENTING_METRICS_INTERVAL_MS";
pub const HTTP_ADDR: &str = "EVENTING_HTTP_ADDR";

const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_millis(1_000);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub max_aggregate_age: Option<Duration>,
    pub max_aggregates_count: Option<usize>,
    pub cleanup_interval: Option<Duration>,
    pub metrics_interval: Duration,
    pub http_addr: SocketAddr,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_aggregate_age: None,
            max_aggregates_count: None,
            cleanup_interval: None,
            metrics_interval: DEFAULT_METRICS_INTERVAL,
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_aggregate_age = millis(&lookup, MAX_AGGREGATE_AGE_MS)?;
        let max_aggregates_count = count(&lookup, MAX_AGGREGATES_COUNT)?;
        let cleanup_interval = millis(&lookup, CLEANUP_INTERVAL_MS)?;
        let metrics_interval =
            millis(&lookup, METRICS_INTERVAL_MS)?.unwrap_or(DEFAULT_METRICS_INTERVAL);
        let http_addr = parsed::<SocketAddr>(&lookup, HTTP_ADDR, "a socket address")?
            .unwrap_or(Self::default().http_addr);

        Ok(Self {
            max_aggregate_age,
            max_aggregates_count,
            cleanup_interval,
            metrics_interval,
            http_addr,
        })
    }

    pub fn eviction_policy(&self) -> EvictionPolicy {
        EvictionPolicy {
            max_age: self.max_aggregate_age,
            max_count: self.max_aggregates_count,
        }
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        })
}

// Zero would make tokio's interval panic, so intervals and horizons must be positive.
fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    const EXPECTED: &str = "a positive number of milliseconds";
    match parsed::<u64>(lookup, name, EXPECTED)? {
        Some(0) => Err(ConfigError::Invalid {
            name,
            value: "0".into(),
            expected: EXPECTED,
        }),
        other => Ok(other.map(Duration::from_millis)),
    }
}

// Zero would evict every aggregate right after its own save.
fn count(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<usize>, ConfigError> {
    const EXPECTED: &str = "a positive count";
    match parsed::<usize>(lookup, name, EXPECTED)? {
        Some(0) => Err(ConfigError::Invalid {
            name,
            value: "0".into(),
            expected: EXPECTED,
        }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod store_config_tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[rstest]
    fn it_should_default_to_no_eviction_and_one_second_metrics() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert!(config.eviction_policy().is_disabled());
        assert_eq!(config.metrics_interval, Duration::from_millis(1_000));
        assert_eq!(config.http_addr.to_string(), "0.0.0.0:8080");
    }

    #[rstest]
    fn it_should_read_every_variable() {
        let config = StoreConfig::from_lookup(lookup(&[
            (MAX_AGGREGATE_AGE_MS, "60000"),
            (MAX_AGGREGATES_COUNT, "2"),
            (CLEANUP_INTERVAL_MS, "500"),
            (METRICS_INTERVAL_MS, "250"),
            (HTTP_ADDR, "127.0.0.1:9090"),
        ]))
        .unwrap();

        assert_eq!(
            config.eviction_policy(),
            EvictionPolicy::disabled()
                .with_max_age(Duration::from_secs(60))
                .with_max_count(2)
        );
        assert_eq!(config.cleanup_interval, Some(Duration::from_millis(500)));
        assert_eq!(config.metrics_interval, Duration::from_millis(250));
        assert_eq!(config.http_addr.port(), 9090);
    }

    #[rstest]
    #[case(MAX_AGGREGATE_AGE_MS, "sixty")]
    #[case(MAX_AGGREGATES_COUNT, "-1")]
    #[case(MAX_AGGREGATES_COUNT, "0")]
    #[case(CLEANUP_INTERVAL_MS, "0")]
    #[case(HTTP_ADDR, "localhost")]
    fn it_should_reject_values_that_do_not_parse(#[case] name: &'static str, #[case] value: &str) {
        let result = StoreConfig::from_lookup(lookup(&[(name, value)]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: n, .. }) if n == name));
    }

    #[rstest]
    fn it_should_treat_blank_values_as_unset() {
        let config = StoreConfig::from_lookup(lookup(&[(MAX_AGGREGATES_COUNT, "  ")])).unwrap();
        assert_eq!(config.max_aggregates_count, None);
    }
}
