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

//! OCSP response parsing and validation (RFC 6960, section 4.2).

use asn1_rs::{Any, Class, FromDer, Tag};
use chrono::{DateTime, Utc};
use rasn::types::Oid;
use rasn_ocsp::{BasicOcspResponse, CertStatus as Asn1CertStatus, ResponderId as Asn1ResponderId};
use tara_crypto::raw_signature::verify_signed_data;

use crate::{
    certificate::{cn_of_name_der, Certificate},
    config::OcspEndpointConfig,
    error::{OcspError, Unavailable, ValidationFailure},
    request::{CertificateId, OcspRequest, OCSP_NONCE_OID},
    trust_store::TrustedCertificates,
};

/// `id-pkix-ocsp-basic`
const OCSP_BASIC_OID: &Oid = Oid::const_new(&[1, 3, 6, 1, 5, 5, 7, 48, 1, 1]);

/// Revocation status of a certificate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CertStatus {
    /// Not revoked.
    Good,

    /// Revoked at `revoked_at`.
    Revoked {
        /// Time of revocation.
        revoked_at: DateTime<Utc>,

        /// CRL reason code, if given.
        reason: Option<u8>,
    },

    /// Not known to the responder.
    Unknown,
}

/// Status of one certificate within a response.
#[derive(Clone, Debug)]
pub struct SingleResponse {
    /// The certificate this status applies to.
    pub cert_id: CertificateId,

    /// Revocation status.
    pub status: CertStatus,

    /// Time at which the status was known to be correct.
    pub this_update: DateTime<Utc>,

    /// Time at or before which newer information will be available.
    pub next_update: Option<DateTime<Utc>>,
}

/// How the responder identified itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResponderId {
    /// By name; holds the first CN of the name, if any.
    ByName(Option<String>),

    /// By SHA-1 hash of its public key.
    ByKey(Vec<u8>),
}

/// A parsed, successful OCSP response carrying a `BasicOCSPResponse`.
///
/// Parsing does not validate anything beyond the encoding; see
/// [`ResponseValidator`] for that.
#[derive(Clone, Debug)]
pub struct OcspResponse {
    responder_id: ResponderId,
    produced_at: DateTime<Utc>,
    signature_algorithm: Vec<u64>,
    signature: Vec<u8>,
    tbs_response_data: Vec<u8>,
    certificates: Vec<Certificate>,
    responses: Vec<SingleResponse>,
    nonce: Option<Vec<u8>>,
}

impl OcspResponse {
    /// Parse a DER-encoded `OCSPResponse`.
    ///
    /// Anything that shows the responder could not answer authoritatively
    /// (broken encoding, non-successful status, missing body) is reported as
    /// [`OcspError::ServiceUnavailable`].
    pub fn from_der(der: &[u8]) -> Result<Self, OcspError> {
        if der.is_empty() {
            return Err(Unavailable::EmptyResponseBody.into());
        }

        match response_status(der)? {
            0 => {}
            1 => return Err(Unavailable::Rejected("malformedRequest").into()),
            2 => return Err(Unavailable::InternalError.into()),
            3 => return Err(Unavailable::TryLater.into()),
            5 => return Err(Unavailable::Rejected("sigRequired").into()),
            6 => return Err(Unavailable::Rejected("unauthorized").into()),
            _ => return Err(Unavailable::InvalidResponseStatus.into()),
        }

        let ocsp_response =
            rasn::der::decode::<rasn_ocsp::OcspResponse>(der).map_err(malformed)?;

        let Some(bytes) = ocsp_response.bytes else {
            return Err(Unavailable::EmptyResponseBody.into());
        };

        if &*bytes.r#type != OCSP_BASIC_OID {
            return Err(Unavailable::UnsupportedResponseType(dotted(&bytes.r#type)).into());
        }

        let basic_der: &[u8] = &bytes.response;
        let basic = rasn::der::decode::<BasicOcspResponse>(basic_der).map_err(malformed)?;
        let raw = RawBasicResponse::from_der(basic_der)?;

        let certificates = raw
            .certs
            .iter()
            .map(|der| Certificate::from_der(der))
            .collect::<Result<Vec<_>, _>>()
            .map_err(malformed)?;

        let tbs = basic.tbs_response_data;

        let responder_id = match &tbs.responder_id {
            Asn1ResponderId::ByName(name) => {
                let name_der = rasn::der::encode(name).map_err(|e| malformed(e.to_string()))?;
                ResponderId::ByName(cn_of_name_der(&name_der))
            }
            Asn1ResponderId::ByKey(key_hash) => ResponderId::ByKey(key_hash.to_vec()),
        };

        let responses = tbs
            .responses
            .iter()
            .map(SingleResponse::from_asn1)
            .collect::<Result<Vec<_>, _>>()?;

        let nonce = tbs.response_extensions.as_ref().and_then(|extensions| {
            extensions
                .iter()
                .find(|ext| &*ext.extn_id == OCSP_NONCE_OID)
                .map(|ext| ext.extn_value.to_vec())
        });

        Ok(Self {
            responder_id,
            produced_at: tbs.produced_at.with_timezone(&Utc),
            signature_algorithm: basic
                .signature_algorithm
                .algorithm
                .iter()
                .map(|arc| u64::from(*arc))
                .collect(),
            signature: basic.signature.as_raw_slice().to_vec(),
            tbs_response_data: raw.tbs.to_vec(),
            certificates,
            responses,
            nonce,
        })
    }

    /// How the responder identified itself.
    pub fn responder_id(&self) -> &ResponderId {
        &self.responder_id
    }

    /// CN of the responder, when it identified itself by name.
    pub fn responder_cn(&self) -> Result<&str, ValidationFailure> {
        match &self.responder_id {
            ResponderId::ByName(Some(cn)) => Ok(cn),
            _ => Err(ValidationFailure::ResponderCnUnavailable),
        }
    }

    /// Time the response was signed.
    pub fn produced_at(&self) -> DateTime<Utc> {
        self.produced_at
    }

    /// The signature over `tbsResponseData`.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// `tbsResponseData` exactly as received.
    pub fn tbs_response_data(&self) -> &[u8] {
        &self.tbs_response_data
    }

    /// Certificates embedded in the response.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// All single responses, in the order received.
    pub fn responses(&self) -> &[SingleResponse] {
        &self.responses
    }

    /// The `extnValue` of the nonce extension, if present.
    pub fn nonce_extension_value(&self) -> Option<&[u8]> {
        self.nonce.as_deref()
    }

    /// The single response for `cert_id`, if present.
    pub fn find(&self, cert_id: &CertificateId) -> Option<&SingleResponse> {
        self.responses.iter().find(|r| r.cert_id == *cert_id)
    }

    fn verify_signature(&self, signer: &Certificate) -> Result<(), ValidationFailure> {
        let sig_alg = x509_parser::der_parser::Oid::from(&self.signature_algorithm)
            .map_err(|_| ValidationFailure::SignatureInvalid("invalid algorithm".to_string()))?;

        let public_key = signer
            .public_key_der()
            .map_err(|e| ValidationFailure::SignatureInvalid(e.to_string()))?;

        verify_signed_data(
            &sig_alg,
            &self.signature,
            &self.tbs_response_data,
            &public_key,
        )
        .map_err(|e| ValidationFailure::SignatureInvalid(e.to_string()))
    }
}

impl SingleResponse {
    fn from_asn1(single: &rasn_ocsp::SingleResponse) -> Result<Self, OcspError> {
        let status = match &single.cert_status {
            Asn1CertStatus::Good => CertStatus::Good,
            Asn1CertStatus::Revoked(info) => CertStatus::Revoked {
                revoked_at: info.revocation_time.with_timezone(&Utc),
                reason: info.revocation_reason.clone().map(|reason| reason as u8),
            },
            Asn1CertStatus::Unknown(_) => CertStatus::Unknown,
        };

        Ok(Self {
            cert_id: CertificateId::from_asn1(&single.cert_id)?,
            status,
            this_update: single.this_update.with_timezone(&Utc),
            next_update: single.next_update.map(|t| t.with_timezone(&Utc)),
        })
    }
}

/// Checks an [`OcspResponse`] against the request that produced it.
///
/// In order: embedded certificates are present, the nonce is echoed, the
/// signing certificate is trusted and signed the response, a single
/// response matches the request, it is fresh, and its status is `GOOD`.
pub struct ResponseValidator<'a> {
    trusted: &'a TrustedCertificates,
    issuer: &'a Certificate,
    config: &'a OcspEndpointConfig,
    now: DateTime<Utc>,
}

impl<'a> ResponseValidator<'a> {
    /// Create a validator for responses about certificates issued by
    /// `issuer`, received from the endpoint described by `config`.
    pub fn new(
        trusted: &'a TrustedCertificates,
        issuer: &'a Certificate,
        config: &'a OcspEndpointConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            trusted,
            issuer,
            config,
            now,
        }
    }

    /// Validate `response`. Returns `Ok(())` only for a trusted `GOOD`
    /// answer; `REVOKED` and `UNKNOWN` are reported as
    /// [`OcspError::Revoked`] and [`OcspError::Unknown`].
    pub fn validate(
        &self,
        request: &OcspRequest,
        response: &OcspResponse,
    ) -> Result<(), OcspError> {
        if response.certificates().is_empty() {
            return Err(ValidationFailure::MissingResponderCertificates.into());
        }

        self.validate_nonce(request, response)?;

        let signer = self.signing_certificate(response)?;
        self.validate_signer(signer)?;
        response.verify_signature(signer)?;

        let single = response
            .find(request.cert_id())
            .ok_or(ValidationFailure::NoMatchingResponse)?;

        self.validate_this_update(single)?;

        match &single.status {
            CertStatus::Good => Ok(()),
            CertStatus::Revoked { revoked_at, reason } => Err(OcspError::Revoked {
                revoked_at: *revoked_at,
                reason: *reason,
            }),
            CertStatus::Unknown => Err(OcspError::Unknown),
        }
    }

    fn validate_nonce(
        &self,
        request: &OcspRequest,
        response: &OcspResponse,
    ) -> Result<(), ValidationFailure> {
        if self.config.nonce_disabled {
            return Ok(());
        }

        // A request sent without a nonce can't be bound to its response.
        let Some(sent) = request.nonce_extension_value() else {
            return Err(ValidationFailure::NonceMissing);
        };

        match response.nonce_extension_value() {
            None => Err(ValidationFailure::NonceMissing),
            Some(received) if received != sent => Err(ValidationFailure::NonceMismatch),
            Some(_) => Ok(()),
        }
    }

    /// Find the certificate that must have signed `response`.
    fn signing_certificate<'r>(
        &'r self,
        response: &'r OcspResponse,
    ) -> Result<&'r Certificate, ValidationFailure> {
        let responder_cn = response.responder_cn()?;

        // An explicitly configured responder certificate is the only
        // acceptable signer.
        if let Some(pinned_cn) = &self.config.responder_certificate_cn {
            let cert = self
                .trusted
                .get(pinned_cn)
                .ok_or_else(|| ValidationFailure::ResponderNotTrusted(pinned_cn.clone()))?;

            if responder_cn != pinned_cn {
                return Err(ValidationFailure::ResponderCnMismatch {
                    expected: pinned_cn.clone(),
                    actual: responder_cn.to_owned(),
                });
            }

            return Ok(cert);
        }

        if let Some(cert) = self.trusted.get(responder_cn) {
            return Ok(cert);
        }

        // AIA OCSP: the responder certificate travels in the response and
        // must be issued by the CA that issued the subject certificate.
        let cert = response
            .certificates()
            .iter()
            .find(|c| c.subject_cn() == Some(responder_cn))
            .ok_or_else(|| {
                ValidationFailure::ResponderCertificateMissing(responder_cn.to_owned())
            })?;

        let responder_issuer = self.trusted.issuer_of(cert).ok_or_else(|| {
            ValidationFailure::IssuerNotTrusted(cert.issuer_cn().unwrap_or_default().to_owned())
        })?;

        if responder_issuer != self.issuer {
            return Err(ValidationFailure::ResponderIssuerMismatch {
                expected: self.issuer.subject_cn().unwrap_or_default().to_owned(),
                actual: responder_issuer.subject_cn().unwrap_or_default().to_owned(),
            });
        }

        cert.verify_signed_by(self.issuer)
            .map_err(|e| ValidationFailure::ResponderCertificateSignatureInvalid(e.to_string()))?;

        Ok(cert)
    }

    fn validate_signer(&self, signer: &Certificate) -> Result<(), ValidationFailure> {
        if !signer.has_ocsp_signing_eku() {
            return Err(ValidationFailure::MissingOcspSigningEku(
                signer.subject_dn().to_owned(),
            ));
        }

        if !signer.is_valid_at(self.now) {
            return Err(ValidationFailure::ResponderCertificateNotValid(
                signer.subject_dn().to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_this_update(&self, single: &SingleResponse) -> Result<(), ValidationFailure> {
        let skew = self.config.accepted_clock_skew();
        let lifetime = self.config.response_lifetime();

        if single.this_update < self.now - (skew + lifetime) {
            return Err(ValidationFailure::ResponseTooOld);
        }

        if single.this_update > self.now + skew {
            return Err(ValidationFailure::ResponseFromFuture);
        }

        Ok(())
    }
}

/// Raw slices of a `BasicOCSPResponse` that must not be re-encoded.
struct RawBasicResponse<'a> {
    tbs: &'a [u8],
    certs: Vec<&'a [u8]>,
}

impl<'a> RawBasicResponse<'a> {
    fn from_der(der: &'a [u8]) -> Result<Self, Unavailable> {
        let (_, basic, _) = split_tlv(der)?;

        let (tbs, _, rem) = split_tlv(basic.data)?;
        let (_, _, rem) = split_tlv(rem)?; // signatureAlgorithm
        let (_, _, rem) = split_tlv(rem)?; // signature

        let mut certs = Vec::new();

        if !rem.is_empty() {
            let (_, explicit, _) = split_tlv(rem)?;

            if explicit.class() == Class::ContextSpecific && explicit.tag() == Tag(0) {
                let (_, sequence, _) = split_tlv(explicit.data)?;

                let mut input = sequence.data;
                while !input.is_empty() {
                    let (cert, _, rem) = split_tlv(input)?;
                    certs.push(cert);
                    input = rem;
                }
            }
        }

        Ok(Self { tbs, certs })
    }
}

/// Split one DER element off `input`: its full encoding, the parsed
/// element and the remaining input.
fn split_tlv(input: &[u8]) -> Result<(&[u8], Any<'_>, &[u8]), Unavailable> {
    let (rem, any) = Any::from_der(input).map_err(|e| malformed(e.to_string()))?;
    Ok((&input[..input.len() - rem.len()], any, rem))
}

/// Read the `responseStatus` ENUMERATED without decoding the rest.
fn response_status(der: &[u8]) -> Result<u8, Unavailable> {
    let (_, outer, _) = split_tlv(der)?;
    let (_, status, _) = split_tlv(outer.data)?;

    if status.tag() != Tag::Enumerated {
        return Err(Unavailable::InvalidResponseStatus);
    }

    match status.data {
        [value] if *value <= 6 && *value != 4 => Ok(*value),
        _ => Err(Unavailable::InvalidResponseStatus),
    }
}

fn malformed(err: impl ToString) -> Unavailable {
    Unavailable::MalformedResponse(err.to_string())
}

fn dotted(oid: &Oid) -> String {
    oid.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
