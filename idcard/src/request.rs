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

//! OCSP request construction (RFC 6960, section 4.1).

use rasn::types::{Any, Integer, ObjectIdentifier, OctetString, Oid};
use rasn_ocsp::{CertId, Request, TbsRequest};
use rasn_pkix::{AlgorithmIdentifier, Extension, Extensions};
use tara_crypto::hash::sha1;

use crate::{
    certificate::{Certificate, CertificateError},
    config::OcspEndpointConfig,
    error::{OcspError, ValidationFailure},
};

/// Hash algorithm of every certificate id we send. SK responders only
/// accept SHA-1 here.
pub(crate) const SHA1_OID: &Oid = Oid::const_new(&[1, 3, 14, 3, 2, 26]);

/// `id-pkix-ocsp-nonce`
pub(crate) const OCSP_NONCE_OID: &Oid = Oid::const_new(&[1, 3, 6, 1, 5, 5, 7, 48, 1, 2]);

/// Length of the random nonce value.
pub const NONCE_LEN: usize = 16;

/// Identifies a certificate in OCSP requests and responses.
///
/// Two ids are equal iff the hash algorithm, both hashes and the serial
/// number are equal. Algorithm parameters are not compared.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateId {
    hash_algorithm: ObjectIdentifier,
    issuer_name_hash: Vec<u8>,
    issuer_key_hash: Vec<u8>,
    serial_number: Vec<u8>,
}

impl CertificateId {
    /// Build the SHA-1 certificate id of `subject` as issued by `issuer`.
    pub fn new(subject: &Certificate, issuer: &Certificate) -> Result<Self, OcspError> {
        let issuer_name = issuer.subject_name_der().map_err(invalid_certificate)?;
        let issuer_key = issuer.public_key_bits().map_err(invalid_certificate)?;
        let serial = subject.raw_serial().map_err(invalid_certificate)?;

        Ok(Self {
            hash_algorithm: ObjectIdentifier::from(SHA1_OID),
            issuer_name_hash: sha1(&issuer_name),
            issuer_key_hash: sha1(&issuer_key),
            serial_number: canonical_integer(&serial)?,
        })
    }

    /// Hash algorithm used for the issuer hashes.
    pub fn hash_algorithm(&self) -> &ObjectIdentifier {
        &self.hash_algorithm
    }

    /// Hash of the issuer's distinguished name.
    pub fn issuer_name_hash(&self) -> &[u8] {
        &self.issuer_name_hash
    }

    /// Hash of the issuer's public key bits.
    pub fn issuer_key_hash(&self) -> &[u8] {
        &self.issuer_key_hash
    }

    /// DER encoding of the serial number INTEGER.
    pub fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }

    pub(crate) fn from_asn1(cert_id: &CertId) -> Result<Self, OcspError> {
        Ok(Self {
            hash_algorithm: cert_id.hash_algorithm.algorithm.clone(),
            issuer_name_hash: cert_id.issuer_name_hash.to_vec(),
            issuer_key_hash: cert_id.issuer_key_hash.to_vec(),
            serial_number: rasn::der::encode(&cert_id.serial_number).map_err(encoding)?,
        })
    }

    pub(crate) fn to_asn1(&self) -> Result<CertId, OcspError> {
        // Many OCSP responders expect NULL parameters rather than none.
        let null = rasn::der::encode(&()).map_err(encoding)?;

        Ok(CertId {
            hash_algorithm: AlgorithmIdentifier {
                algorithm: self.hash_algorithm.clone(),
                parameters: Some(Any::new(null)),
            },
            issuer_name_hash: OctetString::from(self.issuer_name_hash.clone()),
            issuer_key_hash: OctetString::from(self.issuer_key_hash.clone()),
            serial_number: rasn::der::decode::<Integer>(&self.serial_number)
                .map_err(|e| OcspError::Encoding(e.to_string()))?,
        })
    }
}

/// An OCSP request for a single certificate.
#[derive(Clone, Debug)]
pub struct OcspRequest {
    cert_id: CertificateId,
    nonce: Option<Vec<u8>>,
}

impl OcspRequest {
    /// Create a request for `cert_id`, optionally carrying `nonce`.
    pub fn new(cert_id: CertificateId, nonce: Option<[u8; NONCE_LEN]>) -> Result<Self, OcspError> {
        // The extension value is itself a DER OCTET STRING holding the
        // random bytes.
        let nonce = nonce
            .map(|n| rasn::der::encode(&OctetString::from(n.to_vec())))
            .transpose()
            .map_err(encoding)?;

        Ok(Self { cert_id, nonce })
    }

    /// Create the request for `subject` using the settings of `config`.
    ///
    /// A fresh random nonce is attached unless `nonce_disabled` is set.
    pub fn build(
        subject: &Certificate,
        issuer: &Certificate,
        config: &OcspEndpointConfig,
    ) -> Result<Self, OcspError> {
        let nonce = (!config.nonce_disabled).then(rand::random::<[u8; NONCE_LEN]>);
        Self::new(CertificateId::new(subject, issuer)?, nonce)
    }

    /// The certificate id being asked about.
    pub fn cert_id(&self) -> &CertificateId {
        &self.cert_id
    }

    /// The `extnValue` of the nonce extension, if one is sent.
    pub fn nonce_extension_value(&self) -> Option<&[u8]> {
        self.nonce.as_deref()
    }

    /// DER encoding of the `OCSPRequest`.
    pub fn to_der(&self) -> Result<Vec<u8>, OcspError> {
        let request_extensions = self.nonce.as_ref().map(|nonce| {
            Extensions::from(vec![Extension {
                extn_id: ObjectIdentifier::from(OCSP_NONCE_OID),
                critical: true,
                extn_value: OctetString::from(nonce.clone()),
            }])
        });

        let tbs_request = TbsRequest {
            version: rasn_ocsp::Version::from(0u8),
            requestor_name: None,
            request_list: vec![Request {
                req_cert: self.cert_id.to_asn1()?,
                single_request_extensions: None,
            }],
            request_extensions,
        };

        let ocsp_request = rasn_ocsp::OcspRequest {
            tbs_request,
            optional_signature: None,
        };

        rasn::der::encode(&ocsp_request).map_err(encoding)
    }
}

/// Re-encode the content octets of an INTEGER in canonical DER so that
/// serial numbers compare bytewise.
fn canonical_integer(content: &[u8]) -> Result<Vec<u8>, OcspError> {
    let len = u8::try_from(content.len())
        .map_err(|_| OcspError::Encoding("serial number too long".to_string()))?;

    let mut tlv = vec![0x02];
    if len >= 0x80 {
        tlv.push(0x81);
    }
    tlv.push(len);
    tlv.extend_from_slice(content);

    let serial = rasn::der::decode::<Integer>(&tlv).map_err(|e| {
        OcspError::ValidationFailed(ValidationFailure::InvalidCertificate(e.to_string()))
    })?;

    rasn::der::encode(&serial).map_err(encoding)
}

fn invalid_certificate(err: CertificateError) -> OcspError {
    OcspError::ValidationFailed(ValidationFailure::InvalidCertificate(err.to_string()))
}

fn encoding(err: rasn::error::EncodeError) -> OcspError {
    OcspError::Encoding(err.to_string())
}
