// Copyright 2024 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! OCSP endpoint and ID-card validation configuration.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Describes errors found while loading or checking the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read configuration from {path}: {source}")]
    Io {
        /// Path of the configuration file.
        path: String,

        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or does not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// An endpoint URL is not an absolute `http` or `https` URL.
    #[error("invalid OCSP url '{url}': {reason}")]
    InvalidUrl {
        /// The configured URL.
        url: String,

        /// Why it was rejected.
        reason: String,
    },
}

/// Settings for one OCSP responder.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OcspEndpointConfig {
    /// Responder URL.
    pub url: String,

    /// CNs of the certificate issuers this responder answers for.
    #[serde(default)]
    pub issuer_cn: Vec<String>,

    /// TCP connect timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Response read timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Do not send (or expect) a nonce extension.
    #[serde(default)]
    pub nonce_disabled: bool,

    /// When set, responses must be signed by the trusted certificate with
    /// this CN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder_certificate_cn: Option<String>,

    /// Tolerated clock difference to the responder, in seconds.
    #[serde(default = "default_accepted_clock_skew_secs")]
    pub accepted_clock_skew_secs: u32,

    /// Maximum age of `thisUpdate`, in seconds, on top of the clock skew.
    #[serde(default = "default_response_lifetime_secs")]
    pub response_lifetime_secs: u32,
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_accepted_clock_skew_secs() -> u32 {
    2
}

fn default_response_lifetime_secs() -> u32 {
    900
}

fn default_true() -> bool {
    true
}

impl OcspEndpointConfig {
    /// Create a configuration for `url` with default settings.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            issuer_cn: Vec::new(),
            connect_timeout_ms: default_timeout_ms(),
            read_timeout_ms: default_timeout_ms(),
            nonce_disabled: false,
            responder_certificate_cn: None,
            accepted_clock_skew_secs: default_accepted_clock_skew_secs(),
            response_lifetime_secs: default_response_lifetime_secs(),
        }
    }

    /// TCP connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Response read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Tolerated clock difference to the responder.
    pub fn accepted_clock_skew(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.accepted_clock_skew_secs))
    }

    /// Maximum age of a response on top of the clock skew.
    pub fn response_lifetime(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.response_lifetime_secs))
    }

    /// Returns `true` if this responder answers for certificates issued by
    /// the CA named `issuer_cn`.
    pub fn serves_issuer(&self, issuer_cn: &str) -> bool {
        self.issuer_cn.iter().any(|cn| cn == issuer_cn)
    }

    /// Check that the URL is an absolute `http` or `https` URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.url).map_err(|e| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ConfigError::InvalidUrl {
                url: self.url.clone(),
                reason: format!("unsupported scheme {scheme}"),
            }),
        }
    }
}

impl fmt::Display for OcspEndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "url={}, issuer_cn={:?}, connect_timeout_ms={}, read_timeout_ms={}, nonce_disabled={}, responder_certificate_cn={:?}, accepted_clock_skew_secs={}, response_lifetime_secs={}",
            self.url,
            self.issuer_cn,
            self.connect_timeout_ms,
            self.read_timeout_ms,
            self.nonce_disabled,
            self.responder_certificate_cn,
            self.accepted_clock_skew_secs,
            self.response_lifetime_secs
        )
    }
}

/// Configuration of ID-card certificate validation.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IdCardConfig {
    /// PEM bundle with the trusted CA and OCSP responder certificates.
    pub truststore_path: PathBuf,

    /// Primary OCSP responders. The first one serving the subject's issuer is
    /// used.
    #[serde(default)]
    pub ocsp: Vec<OcspEndpointConfig>,

    /// Responders tried, in order, when the primary one is unavailable.
    #[serde(default)]
    pub fallback_ocsp: Vec<OcspEndpointConfig>,

    /// Use the AIA OCSP URL of the subject certificate when no primary
    /// responder is configured for its issuer.
    #[serde(default = "default_true")]
    pub aia_ocsp_enabled: bool,
}

impl IdCardConfig {
    /// Parse and check a TOML configuration.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file.
    ///
    /// A relative `truststore_path` is resolved against the directory of the
    /// configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let toml = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_toml(&toml)?;

        if config.truststore_path.is_relative() {
            if let Some(base_dir) = path.parent() {
                config.truststore_path = base_dir.join(&config.truststore_path);
            }
        }

        Ok(config)
    }

    /// Check every configured endpoint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ocsp
            .iter()
            .chain(self.fallback_ocsp.iter())
            .try_for_each(OcspEndpointConfig::validate)
    }
}
