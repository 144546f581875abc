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

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::transport::TransportError;

/// Describes the outcome of a certificate validation that did not end with
/// a `GOOD` status.
///
/// Only [`OcspError::ServiceUnavailable`] is retried against the next
/// configured OCSP endpoint. Every other variant ends the validation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OcspError {
    /// The OCSP responder could not be reached or could not answer
    /// authoritatively.
    #[error("OCSP service not available: {0}")]
    ServiceUnavailable(#[from] Unavailable),

    /// The OCSP responder answered, but the answer cannot be trusted or the
    /// subject certificate could not be checked.
    #[error("OCSP validation failed: {0}")]
    ValidationFailed(#[from] ValidationFailure),

    /// The OCSP responder reports the certificate as revoked.
    #[error("certificate has been revoked at {revoked_at}")]
    Revoked {
        /// Time of revocation as stated by the responder.
        revoked_at: DateTime<Utc>,

        /// CRL reason code, if the responder included one.
        reason: Option<u8>,
    },

    /// The OCSP responder does not know the certificate.
    #[error("certificate status is unknown")]
    Unknown,

    /// The validator is not configured to check this certificate.
    #[error("invalid OCSP configuration: {0}")]
    Configuration(String),

    /// An OCSP request could not be encoded.
    #[error("unable to encode OCSP request: {0}")]
    Encoding(String),
}

impl OcspError {
    /// Returns `true` if another OCSP endpoint should be tried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }

    /// Returns the error code reported to the caller's user-facing layer.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ServiceUnavailable(_) => ErrorCode::OcspNotAvailable,
            Self::Revoked { .. } => ErrorCode::CertificateRevoked,
            Self::Unknown => ErrorCode::CertificateStatusUnknown,
            Self::ValidationFailed(_) => ErrorCode::IdCardInvalidRequest,
            Self::Configuration(_) | Self::Encoding(_) => ErrorCode::InternalError,
        }
    }
}

/// Reasons an OCSP endpoint is considered unavailable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Unavailable {
    /// The HTTP exchange with the responder failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body is not a DER-encoded `OCSPResponse`.
    #[error("invalid OCSP response: {0}")]
    MalformedResponse(String),

    /// The response status code is not one defined by RFC 6960.
    #[error("invalid OCSP response: response status is missing or invalid")]
    InvalidResponseStatus,

    /// A successful response status without response bytes.
    #[error("invalid OCSP response: response returned empty body")]
    EmptyResponseBody,

    /// The responder reported `internalError`.
    #[error("response returned internal server error")]
    InternalError,

    /// The responder reported `tryLater`.
    #[error("response returned try later error")]
    TryLater,

    /// The responder rejected the request (`malformedRequest`,
    /// `sigRequired` or `unauthorized`) without a response body.
    #[error("responder rejected the request with status {0}")]
    Rejected(&'static str),

    /// The response bytes carry a type other than `id-pkix-ocsp-basic`.
    #[error("unsupported OCSP response type {0}")]
    UnsupportedResponseType(String),
}

/// Reasons an OCSP answer, or the subject certificate itself, was rejected.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum ValidationFailure {
    /// The subject certificate could not be parsed.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The subject certificate's issuer is not in the trust store.
    #[error("issuer certificate with CN '{0}' is not a trusted certificate")]
    IssuerNotTrusted(String),

    /// The subject certificate's signature does not verify with the issuer's
    /// public key.
    #[error("failed to verify user certificate: {0}")]
    CertificateSignatureInvalid(String),

    /// The response carries no certificates.
    #[error("OCSP response is missing mandatory element - the signing certificate")]
    MissingResponderCertificates,

    /// The nonce extension is missing from the response.
    #[error("no nonce found in OCSP response")]
    NonceMissing,

    /// The nonce extension in the response differs from the request.
    #[error("invalid OCSP response nonce")]
    NonceMismatch,

    /// The responder id is a key hash or a name without a CN.
    #[error("unable to find responder CN from OCSP response")]
    ResponderCnUnavailable,

    /// The configured responder certificate is not in the trust store.
    #[error("certificate with CN '{0}' is not trusted, please check your configuration")]
    ResponderNotTrusted(String),

    /// The responder id does not match the configured responder CN.
    #[error(
        "OCSP provider has signed the response using cert with CN '{actual}', but configuration expects CN '{expected}'"
    )]
    ResponderCnMismatch {
        /// CN configured for the endpoint.
        expected: String,

        /// CN found in the response.
        actual: String,
    },

    /// No embedded certificate carries the responder CN.
    #[error("responder ID contains CN '{0}', but no certificate with this CN was provided in the response")]
    ResponderCertificateMissing(String),

    /// An AIA responder certificate is not issued by the subject's issuer.
    #[error("OCSP responder certificate must be issued by '{expected}', but was issued by '{actual}'")]
    ResponderIssuerMismatch {
        /// CN of the subject certificate's issuer.
        expected: String,

        /// CN of the responder certificate's issuer.
        actual: String,
    },

    /// An AIA responder certificate's signature does not verify with the
    /// subject's issuer.
    #[error("OCSP responder certificate is not signed by the expected issuer: {0}")]
    ResponderCertificateSignatureInvalid(String),

    /// The responder certificate lacks the OCSP signing extended key usage.
    #[error("certificate '{0}' has no OCSP signing extension")]
    MissingOcspSigningEku(String),

    /// The responder certificate is expired or not yet valid.
    #[error("OCSP responder certificate '{0}' is not valid at the current time")]
    ResponderCertificateNotValid(String),

    /// The response signature does not verify with the responder certificate.
    #[error("OCSP response signature is not valid: {0}")]
    SignatureInvalid(String),

    /// No single response matches the requested certificate id.
    #[error("no OCSP response is present for the requested certificate")]
    NoMatchingResponse,

    /// `thisUpdate` is older than the accepted response lifetime.
    #[error("OCSP response was older than accepted")]
    ResponseTooOld,

    /// `thisUpdate` lies further in the future than the accepted clock skew.
    #[error("OCSP response cannot be produced in the future")]
    ResponseFromFuture,
}

/// Error codes used by the calling authentication flow to select the
/// message shown to the user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// `message.idc.error-ocsp-not-available`
    OcspNotAvailable,

    /// `message.idc.cert-revoked`
    CertificateRevoked,

    /// `message.idc.cert-unknown`
    CertificateStatusUnknown,

    /// `message.idc.error`
    IdCardInvalidRequest,

    /// `message.error.internal-error`
    InternalError,
}

impl ErrorCode {
    /// Message key for this code.
    pub fn message(&self) -> &'static str {
        match self {
            Self::OcspNotAvailable => "message.idc.error-ocsp-not-available",
            Self::CertificateRevoked => "message.idc.cert-revoked",
            Self::CertificateStatusUnknown => "message.idc.cert-unknown",
            Self::IdCardInvalidRequest => "message.idc.error",
            Self::InternalError => "message.error.internal-error",
        }
    }
}
