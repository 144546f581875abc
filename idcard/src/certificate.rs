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

//! An owned X.509 certificate with the attributes the OCSP validator reads.

use std::fmt;

use chrono::{DateTime, Utc};
use tara_crypto::raw_signature::{verify_signed_data, RawSignatureValidationError};
use thiserror::Error;
use x509_parser::{
    certificate::X509Certificate,
    der_parser::{oid, Oid},
    extensions::{GeneralName, ParsedExtension},
    parse_x509_certificate,
    pem::Pem,
    time::ASN1Time,
};

const AD_OCSP_OID: Oid<'static> = oid!(1.3.6 .1 .5 .5 .7 .48 .1);
const AUTHORITY_INFO_ACCESS_OID: Oid<'static> = oid!(1.3.6 .1 .5 .5 .7 .1 .1);

/// Describes errors that can occur while loading a certificate.
#[derive(Debug, Eq, Error, PartialEq)]
pub enum CertificateError {
    /// The bytes are not a DER-encoded X.509 certificate.
    #[error("invalid X.509 certificate: {0}")]
    InvalidDer(String),

    /// The PEM text could not be decoded.
    #[error("invalid PEM: {0}")]
    InvalidPem(String),

    /// The PEM text does not contain a `CERTIFICATE` block.
    #[error("no certificate found in PEM data")]
    NoCertificate,
}

/// A DER-encoded X.509 certificate.
///
/// The certificate is parsed once on construction; the attributes needed for
/// trust store lookups and logging are kept alongside the DER bytes. Two
/// certificates compare equal iff their DER encodings are identical.
#[derive(Clone)]
pub struct Certificate {
    der: Vec<u8>,
    subject_cn: Option<String>,
    issuer_cn: Option<String>,
    subject_dn: String,
    issuer_dn: String,
    serial: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (rem, cert) = parse_x509_certificate(der)
            .map_err(|e| CertificateError::InvalidDer(e.to_string()))?;

        // Trailing bytes are not part of the certificate.
        let der = &der[..der.len() - rem.len()];

        let validity = cert.validity();

        Ok(Self {
            der: der.to_vec(),
            subject_cn: first_cn(cert.subject()),
            issuer_cn: first_cn(cert.issuer()),
            subject_dn: cert.subject().to_string(),
            issuer_dn: cert.issuer().to_string(),
            serial: cert.serial.to_string(),
            not_before: to_utc(&validity.not_before)?,
            not_after: to_utc(&validity.not_after)?,
        })
    }

    /// Parse the first `CERTIFICATE` block of PEM-encoded text.
    pub fn from_pem(pem: &[u8]) -> Result<Self, CertificateError> {
        Self::from_pem_bundle(pem)?
            .into_iter()
            .next()
            .ok_or(CertificateError::NoCertificate)
    }

    /// Parse every `CERTIFICATE` block of PEM-encoded text.
    pub fn from_pem_bundle(pems: &[u8]) -> Result<Vec<Self>, CertificateError> {
        let mut certs = Vec::new();

        for maybe_pem in Pem::iter_from_buffer(pems) {
            let pem = maybe_pem.map_err(|e| CertificateError::InvalidPem(e.to_string()))?;
            if pem.label == "CERTIFICATE" {
                certs.push(Self::from_der(&pem.contents)?);
            }
        }

        Ok(certs)
    }

    /// Parse a certificate given either as DER or as PEM text.
    pub fn load(data: &[u8]) -> Result<Self, CertificateError> {
        // A DER certificate always starts with a SEQUENCE tag.
        if data.first() == Some(&0x30) {
            Self::from_der(data)
        } else {
            Self::from_pem(data)
        }
    }

    /// The DER encoding of this certificate.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The first common name (CN) of the subject, if any.
    pub fn subject_cn(&self) -> Option<&str> {
        self.subject_cn.as_deref()
    }

    /// The first common name (CN) of the issuer, if any.
    pub fn issuer_cn(&self) -> Option<&str> {
        self.issuer_cn.as_deref()
    }

    /// The subject distinguished name in RFC 4514 form.
    pub fn subject_dn(&self) -> &str {
        &self.subject_dn
    }

    /// The issuer distinguished name in RFC 4514 form.
    pub fn issuer_dn(&self) -> &str {
        &self.issuer_dn
    }

    /// The serial number in decimal notation.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Start of the validity period.
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// End of the validity period.
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Returns `true` if `time` lies within the validity period, bounds
    /// included.
    pub fn is_valid_at(&self, time: DateTime<Utc>) -> bool {
        self.not_before <= time && time <= self.not_after
    }

    /// Returns `true` if the certificate carries the `id-kp-OCSPSigning`
    /// extended key usage.
    pub fn has_ocsp_signing_eku(&self) -> bool {
        let Ok(cert) = self.parsed() else {
            return false;
        };

        matches!(cert.extended_key_usage(), Ok(Some(eku)) if eku.value.ocsp_signing)
    }

    /// Returns the OCSP responder URLs listed in the Authority Information
    /// Access extension.
    pub fn ocsp_urls(&self) -> Vec<String> {
        let Ok(cert) = self.parsed() else {
            return Vec::new();
        };

        let Ok(em) = cert.extensions_map() else {
            return Vec::new();
        };

        let Some(aia_extension) = em.get(&AUTHORITY_INFO_ACCESS_OID) else {
            return Vec::new();
        };

        let ParsedExtension::AuthorityInfoAccess(aia) = aia_extension.parsed_extension() else {
            return Vec::new();
        };

        aia.accessdescs
            .iter()
            .filter(|ad| ad.access_method == AD_OCSP_OID)
            .filter_map(|ad| match ad.access_location {
                GeneralName::URI(uri) => Some(uri.to_string()),
                _ => None,
            })
            .collect()
    }

    /// DER-encoded `SubjectPublicKeyInfo` of this certificate.
    pub fn public_key_der(&self) -> Result<Vec<u8>, CertificateError> {
        Ok(self.parsed()?.public_key().raw.to_vec())
    }

    /// Raw bytes of the subject name, as used for OCSP issuer name hashes.
    pub(crate) fn subject_name_der(&self) -> Result<Vec<u8>, CertificateError> {
        Ok(self.parsed()?.subject().as_raw().to_vec())
    }

    /// The subject public key bits, as used for OCSP issuer key hashes.
    pub(crate) fn public_key_bits(&self) -> Result<Vec<u8>, CertificateError> {
        Ok(self.parsed()?.public_key().subject_public_key.data.to_vec())
    }

    /// The content octets of the serial number INTEGER.
    pub(crate) fn raw_serial(&self) -> Result<Vec<u8>, CertificateError> {
        Ok(self.parsed()?.raw_serial().to_vec())
    }

    /// Verify that this certificate's signature was made with the key of
    /// `issuer`.
    pub fn verify_signed_by(&self, issuer: &Certificate) -> Result<(), RawSignatureValidationError> {
        let cert = self
            .parsed()
            .map_err(|e| RawSignatureValidationError::InternalError(e.to_string()))?;

        let issuer_key = issuer
            .public_key_der()
            .map_err(|_| RawSignatureValidationError::InvalidPublicKey)?;

        verify_signed_data(
            &cert.signature_algorithm.algorithm,
            cert.signature_value.as_ref(),
            cert.tbs_certificate.as_ref(),
            &issuer_key,
        )
    }

    fn parsed(&self) -> Result<X509Certificate<'_>, CertificateError> {
        let (_, cert) = parse_x509_certificate(&self.der)
            .map_err(|e| CertificateError::InvalidDer(e.to_string()))?;
        Ok(cert)
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject_dn)
            .field("issuer", &self.issuer_dn)
            .field("serial", &self.serial)
            .finish()
    }
}

fn first_cn(name: &x509_parser::x509::X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_owned)
}

pub(crate) fn cn_of_name_der(name_der: &[u8]) -> Option<String> {
    use x509_parser::prelude::FromDer;

    let (_, name) = x509_parser::x509::X509Name::from_der(name_der).ok()?;
    first_cn(&name)
}

fn to_utc(time: &ASN1Time) -> Result<DateTime<Utc>, CertificateError> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| CertificateError::InvalidDer("validity out of range".to_string()))
}
