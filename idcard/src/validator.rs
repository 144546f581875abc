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

//! Revocation check of an ID-card authentication certificate with
//! failover across OCSP endpoints.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    audit::{AuditSink, LogAuditSink},
    certificate::Certificate,
    config::OcspEndpointConfig,
    error::{OcspError, Unavailable, ValidationFailure},
    request::OcspRequest,
    resolver::EndpointPolicyResolver,
    response::{OcspResponse, ResponseValidator},
    transport::OcspTransport,
    trust_store::TrustedCertificates,
};

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Checks ID-card certificates against their OCSP responders.
///
/// Endpoints are tried in the order given by the [`EndpointPolicyResolver`].
/// Only [`OcspError::ServiceUnavailable`] moves on to the next endpoint;
/// any other outcome is final.
#[derive(Clone)]
pub struct OcspValidator {
    trusted: Arc<TrustedCertificates>,
    resolver: Arc<dyn EndpointPolicyResolver>,
    transport: Arc<dyn OcspTransport>,
    audit: Arc<dyn AuditSink>,
    clock: Clock,
}

impl OcspValidator {
    /// Create a validator that audits through [`LogAuditSink`] and uses the
    /// system clock.
    pub fn new(
        trusted: Arc<TrustedCertificates>,
        resolver: Arc<dyn EndpointPolicyResolver>,
        transport: Arc<dyn OcspTransport>,
    ) -> Self {
        Self {
            trusted,
            resolver,
            transport,
            audit: Arc::new(LogAuditSink),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the audit sink.
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replace the clock used for freshness and validity checks.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Check that `subject` is issued by a trusted CA and is not revoked.
    ///
    /// Returns the configuration of the endpoint that answered `GOOD`.
    pub fn validate_certificate(
        &self,
        subject: &Certificate,
    ) -> Result<OcspEndpointConfig, OcspError> {
        log::info!(
            "OCSP certificate validation. Serialnumber=<{}>, SubjectDN=<{}>, issuerDN=<{}>",
            subject.serial(),
            subject.subject_dn(),
            subject.issuer_dn()
        );

        let issuer = self.trusted.issuer_of(subject).ok_or_else(|| {
            ValidationFailure::IssuerNotTrusted(subject.issuer_cn().unwrap_or_default().to_owned())
        })?;

        subject
            .verify_signed_by(issuer)
            .map_err(|e| ValidationFailure::CertificateSignatureInvalid(e.to_string()))?;

        let endpoints = self.resolver.resolve(subject);
        if endpoints.is_empty() {
            return Err(OcspError::Configuration(format!(
                "no OCSP endpoint configured for issuer '{}'",
                issuer.subject_cn().unwrap_or_default()
            )));
        }

        let last = endpoints.len() - 1;
        for (count, config) in endpoints.iter().enumerate() {
            if count > 0 {
                log::info!("Retrying OCSP request to: {}", config.url);
            }

            match self.check(subject, issuer, config) {
                Ok(()) => return Ok(config.clone()),
                Err(err) if err.is_retryable() && count < last => {
                    log::warn!("OCSP request to {} failed: {err}", config.url);
                }
                Err(err) => return Err(err),
            }
        }

        // The loop always returns on its last iteration.
        Err(OcspError::Configuration("no OCSP endpoint attempted".to_string()))
    }

    /// One request/response exchange with a single endpoint.
    fn check(
        &self,
        subject: &Certificate,
        issuer: &Certificate,
        config: &OcspEndpointConfig,
    ) -> Result<(), OcspError> {
        let request = OcspRequest::build(subject, issuer, config)?;
        let request_der = request.to_der()?;

        self.audit.request(config, &request_der);

        let response_der = match self.transport.send(&request_der, config) {
            Ok(bytes) => {
                self.audit.response(config, 200, &bytes);
                bytes
            }
            Err(err) => {
                self.audit.failure(config, &err);
                return Err(Unavailable::Transport(err).into());
            }
        };

        let response = OcspResponse::from_der(&response_der)?;

        ResponseValidator::new(&self.trusted, issuer, config, (self.clock)())
            .validate(&request, &response)
    }
}

impl std::fmt::Debug for OcspValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcspValidator")
            .field("trusted", &self.trusted.len())
            .finish_non_exhaustive()
    }
}
