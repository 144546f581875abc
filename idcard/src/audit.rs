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

//! Audit trail of every OCSP exchange.

use tara_crypto::base64;

use crate::{config::OcspEndpointConfig, transport::TransportError};

/// Log target used by [`LogAuditSink`].
pub const AUDIT_LOG_TARGET: &str = "tara::ocsp::audit";

/// Receives the bytes of every OCSP request and response (or the failure
/// that replaced the response), together with the endpoint configuration
/// used.
pub trait AuditSink: Send + Sync {
    /// A request is about to be sent.
    fn request(&self, config: &OcspEndpointConfig, request: &[u8]);

    /// A response was received.
    fn response(&self, config: &OcspEndpointConfig, status: u16, response: &[u8]);

    /// The exchange failed.
    fn failure(&self, config: &OcspEndpointConfig, error: &TransportError);
}

/// Writes the audit trail through the `log` facade on
/// [`AUDIT_LOG_TARGET`]. Request and response bodies are Base64-encoded.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn request(&self, config: &OcspEndpointConfig, request: &[u8]) {
        log::info!(
            target: AUDIT_LOG_TARGET,
            "OCSP request: POST {} http.request.body.content={} ocsp.conf=[{}]",
            config.url,
            base64::encode(request),
            config
        );
    }

    fn response(&self, config: &OcspEndpointConfig, status: u16, response: &[u8]) {
        log::info!(
            target: AUDIT_LOG_TARGET,
            "OCSP response: {} http.response.status_code={} http.response.body.content={}",
            config.url,
            status,
            base64::encode(response)
        );
    }

    fn failure(&self, config: &OcspEndpointConfig, error: &TransportError) {
        match error {
            TransportError::HttpStatus {
                status,
                body: Some(body),
            } => log::info!(
                target: AUDIT_LOG_TARGET,
                "OCSP response: {} http.response.status_code={} http.response.body.content={}",
                config.url,
                status,
                body
            ),
            TransportError::HttpStatus { status, body: None } => log::info!(
                target: AUDIT_LOG_TARGET,
                "OCSP response: {} http.response.status_code={}",
                config.url,
                status
            ),
            other => log::warn!(
                target: AUDIT_LOG_TARGET,
                "OCSP request to {} failed: {}",
                config.url,
                other
            ),
        }
    }
}
