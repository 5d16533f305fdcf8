// Copyright (c) 2026 Noderegistry
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Configuration loading: environment variables in the double-underscore
//! section style (`Section__Key`), `.env`-backed, with `HOST`/`PORT`
//! outside any section per §6.

use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value was present but not parseable.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// The offending environment variable.
        key: &'static str,
        /// Its raw value.
        value: String,
    },
}

/// Resolved server configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Listen address.
    pub host: IpAddr,
    /// Listen port.
    pub port: u16,
    /// `ConnectionStrings__DefaultConnection` — empty string selects the
    /// in-memory store; otherwise a sled data directory path.
    pub default_connection: String,
    /// `NonceValidation__WindowDuration`, parsed from `HH:MM:SS`.
    pub nonce_window: Duration,
    /// `NodeEviction__MaxNodesPerClusterVersion`.
    pub max_per_group: usize,
    /// `RateLimiting__Disabled` — read and surfaced only; rate limiting
    /// itself is an external collaborator (§1).
    pub rate_limiting_disabled: bool,
}

fn env_var(key: &'static str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Parse a `HH:MM:SS` duration string, per §6's `NonceValidation__WindowDuration`.
fn parse_hms(key: &'static str, text: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key,
        value: text.to_string(),
    };
    let mut parts = text.splitn(3, ':');
    let hours: u64 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let minutes: u64 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let seconds: u64 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(hours * 3600 + minutes * 60 + seconds))
}

impl Config {
    /// Load configuration from `.env` (if present) and the process
    /// environment, falling back to the defaults §6 names.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = env_var("HOST")
            .map(|v| {
                v.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "HOST",
                    value: v.clone(),
                })
            })
            .transpose()?
            .unwrap_or_else(|| "0.0.0.0".parse().unwrap());

        let port = env_var("PORT")
            .map(|v| {
                v.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "PORT",
                    value: v.clone(),
                })
            })
            .transpose()?
            .unwrap_or(8080);

        let default_connection = env_var("ConnectionStrings__DefaultConnection").unwrap_or_default();

        let nonce_window = match env_var("NonceValidation__WindowDuration") {
            Some(v) => parse_hms("NonceValidation__WindowDuration", &v)?,
            None => Duration::from_secs(24 * 3600),
        };

        let max_per_group = match env_var("NodeEviction__MaxNodesPerClusterVersion") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "NodeEviction__MaxNodesPerClusterVersion",
                value: v,
            })?,
            None => 5,
        };

        let rate_limiting_disabled = match env_var("RateLimiting__Disabled") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RateLimiting__Disabled",
                value: v,
            })?,
            None => false,
        };

        Ok(Self {
            host,
            port,
            default_connection,
            nonce_window,
            max_per_group,
            rate_limiting_disabled,
        })
    }
}
