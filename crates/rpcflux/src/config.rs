// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Environment variable configuration for the InfluxDB connection.
//!
//! Reads the store connection from environment variables:
//!
//! - `INFLUX_ENDPOINT`: InfluxDB base URL (e.g., "http://localhost:8086")
//! - `INFLUX_TOKEN`: API token used for writes
//! - `INFLUX_ORG`: Organization name
//! - `INFLUX_BUCKET`: Target bucket
//!
//! All four are required and must be non-empty. The gateway refuses to start
//! without them; there is no default store to write to.
//!
//! # Example
//!
//! ```bash
//! export INFLUX_ENDPOINT=http://localhost:8086
//! export INFLUX_TOKEN=s3cret-token
//! export INFLUX_ORG=telemetry
//! export INFLUX_BUCKET=rpc-traffic
//! ```

use std::env;
use thiserror::Error;

/// Environment variable names
pub const ENV_INFLUX_ENDPOINT: &str = "INFLUX_ENDPOINT";
pub const ENV_INFLUX_TOKEN: &str = "INFLUX_TOKEN";
pub const ENV_INFLUX_ORG: &str = "INFLUX_ORG";
pub const ENV_INFLUX_BUCKET: &str = "INFLUX_BUCKET";

/// InfluxDB v2 connection configuration.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// InfluxDB URL (e.g., "http://localhost:8086").
    pub url: String,
    /// InfluxDB organization.
    pub org: String,
    /// Target bucket.
    pub bucket: String,
    /// Authentication token.
    pub token: String,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required influx config: {0}")]
    Missing(&'static str),
}

impl InfluxConfig {
    /// Load the connection settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the connection settings through an arbitrary variable lookup.
    ///
    /// Unset and empty values are both treated as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        Ok(Self {
            url: require(ENV_INFLUX_ENDPOINT)?,
            token: require(ENV_INFLUX_TOKEN)?,
            org: require(ENV_INFLUX_ORG)?,
            bucket: require(ENV_INFLUX_BUCKET)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_set() -> HashMap<String, String> {
        vars(&[
            (ENV_INFLUX_ENDPOINT, "http://localhost:8086"),
            (ENV_INFLUX_TOKEN, "test-token"),
            (ENV_INFLUX_ORG, "myorg"),
            (ENV_INFLUX_BUCKET, "mybucket"),
        ])
    }

    #[test]
    fn test_config_complete() {
        let env = full_set();
        let config = InfluxConfig::from_lookup(|name| env.get(name).cloned()).expect("config");

        assert_eq!(config.url, "http://localhost:8086");
        assert_eq!(config.token, "test-token");
        assert_eq!(config.org, "myorg");
        assert_eq!(config.bucket, "mybucket");
    }

    #[test]
    fn test_each_missing_variable_is_reported_by_name() {
        for name in [
            ENV_INFLUX_ENDPOINT,
            ENV_INFLUX_TOKEN,
            ENV_INFLUX_ORG,
            ENV_INFLUX_BUCKET,
        ] {
            let mut env = full_set();
            env.remove(name);

            let err = InfluxConfig::from_lookup(|n| env.get(n).cloned())
                .expect_err("should be missing");
            let ConfigError::Missing(reported) = err;
            assert_eq!(reported, name);
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut env = full_set();
        env.insert(ENV_INFLUX_TOKEN.to_string(), String::new());

        let err =
            InfluxConfig::from_lookup(|n| env.get(n).cloned()).expect_err("empty token");
        assert!(matches!(err, ConfigError::Missing(ENV_INFLUX_TOKEN)));
    }
}
