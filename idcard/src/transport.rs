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

//! HTTP transport for OCSP requests (RFC 6960, appendix A).

use std::{io::Read, sync::Arc};

use thiserror::Error;

use crate::config::OcspEndpointConfig;

/// Media type of an encoded OCSP request.
pub const OCSP_REQUEST_CONTENT_TYPE: &str = "application/ocsp-request";

/// Media type of an encoded OCSP response.
pub const OCSP_RESPONSE_CONTENT_TYPE: &str = "application/ocsp-response";

const MAX_RESPONSE_LEN: u64 = 1_000_000;

/// Sends an encoded OCSP request to one responder.
pub trait OcspTransport: Send + Sync {
    /// Send `request` to the responder described by `config` and return the
    /// raw response body.
    fn send(&self, request: &[u8], config: &OcspEndpointConfig) -> Result<Vec<u8>, TransportError>;
}

/// Describes why an OCSP exchange failed. Every variant means the responder
/// is unavailable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The responder answered with a status other than 200.
    #[error("service returned HTTP status code {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,

        /// Response body, if there was one.
        body: Option<String>,
    },

    /// The `Content-Type` of a 200 response was wrong or missing.
    #[error("response Content-Type header is missing or invalid. Expected: 'application/ocsp-response', actual: {0:?}")]
    ContentType(Option<String>),

    /// The connection could not be established or broke down (including
    /// timeouts, DNS and TLS failures).
    #[error("OCSP not available: {url}: {detail}")]
    Connection {
        /// Responder URL.
        url: String,

        /// Description of the failure.
        detail: String,
    },

    /// Reading the response body failed.
    #[error("OCSP not available: {url}: failed to read response: {source}")]
    Io {
        /// Responder URL.
        url: String,

        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Blocking HTTP(S) transport built on `ureq`.
///
/// Connect and read timeouts are taken from each endpoint's configuration.
/// Redirects are not followed.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    tls_config: Option<Arc<rustls::ClientConfig>>,
}

impl HttpTransport {
    /// Create a transport using the default TLS settings of `ureq`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport that uses `tls_config` for `https` endpoints.
    pub fn with_tls_config(tls_config: Arc<rustls::ClientConfig>) -> Self {
        Self {
            tls_config: Some(tls_config),
        }
    }

    fn agent(&self, config: &OcspEndpointConfig) -> ureq::Agent {
        let mut builder = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout())
            .timeout_read(config.read_timeout())
            .timeout_write(config.read_timeout())
            .redirects(0);

        if let Some(tls_config) = &self.tls_config {
            builder = builder.tls_config(tls_config.clone());
        }

        builder.build()
    }
}

impl OcspTransport for HttpTransport {
    fn send(&self, request: &[u8], config: &OcspEndpointConfig) -> Result<Vec<u8>, TransportError> {
        log::debug!("Sending OCSP request to {}", config.url);

        let result = self
            .agent(config)
            .post(&config.url)
            .set("Content-Type", OCSP_REQUEST_CONTENT_TYPE)
            .set("Accept", OCSP_RESPONSE_CONTENT_TYPE)
            .send_bytes(request);

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().ok().filter(|body| !body.is_empty());
                return Err(TransportError::HttpStatus { status, body });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(TransportError::Connection {
                    url: config.url.clone(),
                    detail: transport.to_string(),
                });
            }
        };

        // 1xx-3xx responses are not errors for ureq.
        if response.status() != 200 {
            return Err(TransportError::HttpStatus {
                status: response.status(),
                body: None,
            });
        }

        let content_type = response.header("Content-Type").map(str::to_owned);
        if content_type.as_deref() != Some(OCSP_RESPONSE_CONTENT_TYPE) {
            return Err(TransportError::ContentType(content_type));
        }

        let len = response
            .header("Content-Length")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(10000);

        let mut body: Vec<u8> = Vec::with_capacity(len.min(MAX_RESPONSE_LEN as usize));

        response
            .into_reader()
            .take(MAX_RESPONSE_LEN)
            .read_to_end(&mut body)
            .map_err(|source| TransportError::Io {
                url: config.url.clone(),
                source,
            })?;

        Ok(body)
    }
}
