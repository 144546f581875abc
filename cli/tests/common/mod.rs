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

//! Test PKI and OCSP response fixtures for the command line tests.

use std::{fs, path::Path};

use chrono::Utc;
use ed25519_dalek::{pkcs8::DecodePrivateKey, Signer};
use rasn::types::{BitString, Integer, ObjectIdentifier, OctetString};
use rasn_ocsp::{
    BasicOcspResponse, CertId, CertStatus, OcspResponse, OcspResponseStatus, ResponderId,
    ResponseBytes, ResponseData, RevokedInfo, SingleResponse,
};
use rasn_pkix::AlgorithmIdentifier;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, KeyPair, PKCS_ED25519,
};
use tara_idcard::{Certificate, CertificateId};

pub const CA_CN: &str = "TEST of ESTEID2018";
pub const RESPONDER_CN: &str = "TEST of SK OCSP RESPONDER 2020";

pub struct Issued {
    pub rcgen: rcgen::Certificate,
    pub key: KeyPair,
}

impl Issued {
    pub fn certificate(&self) -> Certificate {
        Certificate::from_der(self.rcgen.der()).unwrap()
    }
}

fn issue(cn: &str, issuer: Option<&Issued>, customize: impl FnOnce(&mut CertificateParams)) -> Issued {
    let key = KeyPair::generate_for(&PKCS_ED25519).unwrap();

    let mut params = CertificateParams::default();
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, cn);
    customize(&mut params);

    let rcgen = match issuer {
        None => params.self_signed(&key),
        Some(issuer) => params.signed_by(&key, &issuer.rcgen, &issuer.key),
    }
    .unwrap();

    Issued { rcgen, key }
}

pub struct TestPki {
    pub ca: Issued,
    pub responder: Issued,
    pub user: Issued,
}

impl TestPki {
    pub fn new() -> Self {
        let ca = issue(CA_CN, None, |params| {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        });
        let responder = issue(RESPONDER_CN, Some(&ca), |params| {
            params.extended_key_usages = vec![ExtendedKeyUsagePurpose::OcspSigning];
        });
        let user = issue("JÕEORG,JAAK-KRISTJAN,38001085718", Some(&ca), |_| {});

        Self {
            ca,
            responder,
            user,
        }
    }

    /// Write the truststore, the user certificate and a configuration
    /// pointing at `ocsp_url` into `dir`.
    pub fn write_files(&self, dir: &Path, ocsp_url: &str) {
        fs::write(
            dir.join("truststore.pem"),
            format!("{}{}", self.ca.rcgen.pem(), self.responder.rcgen.pem()),
        )
        .unwrap();

        fs::write(dir.join("user.pem"), self.user.rcgen.pem()).unwrap();
        fs::write(dir.join("user.der"), self.user.rcgen.der()).unwrap();

        fs::write(
            dir.join("idcard.toml"),
            format!(
                r#"
truststore_path = "truststore.pem"
aia_ocsp_enabled = false

[[ocsp]]
url = "{ocsp_url}"
issuer_cn = ["{CA_CN}"]
nonce_disabled = true
"#
            ),
        )
        .unwrap();
    }

    /// A signed response about the user certificate.
    pub fn response(&self, revoked: bool) -> Vec<u8> {
        let id = CertificateId::new(&self.user.certificate(), &self.ca.certificate()).unwrap();

        let cert_id = CertId {
            hash_algorithm: AlgorithmIdentifier {
                algorithm: id.hash_algorithm().clone(),
                parameters: None,
            },
            issuer_name_hash: OctetString::from(id.issuer_name_hash().to_vec()),
            issuer_key_hash: OctetString::from(id.issuer_key_hash().to_vec()),
            serial_number: rasn::der::decode::<Integer>(id.serial_number()).unwrap(),
        };

        let now = Utc::now().fixed_offset();

        let cert_status = if revoked {
            CertStatus::Revoked(RevokedInfo {
                revocation_time: now,
                revocation_reason: None,
            })
        } else {
            CertStatus::Good
        };

        let responder_cert =
            rasn::der::decode::<rasn_pkix::Certificate>(self.responder.rcgen.der()).unwrap();

        let tbs_response_data = ResponseData {
            version: rasn_ocsp::Version::from(0u8),
            responder_id: ResponderId::ByName(responder_cert.tbs_certificate.subject.clone()),
            produced_at: now,
            responses: vec![SingleResponse {
                cert_id,
                cert_status,
                this_update: now,
                next_update: None,
                single_extensions: None,
            }],
            response_extensions: None,
        };

        let key = ed25519_dalek::SigningKey::from_pkcs8_der(&self.responder.key.serialize_der())
            .unwrap();
        let signature = key.sign(&rasn::der::encode(&tbs_response_data).unwrap());

        let basic = BasicOcspResponse {
            tbs_response_data,
            signature_algorithm: AlgorithmIdentifier {
                algorithm: ObjectIdentifier::new(vec![1, 3, 101, 112]).unwrap(),
                parameters: None,
            },
            signature: BitString::from_vec(signature.to_bytes().to_vec()),
            certs: Some(vec![responder_cert]),
        };

        rasn::der::encode(&OcspResponse {
            status: OcspResponseStatus::Successful,
            bytes: Some(ResponseBytes {
                r#type: ObjectIdentifier::new(vec![1, 3, 6, 1, 5, 5, 7, 48, 1, 1]).unwrap(),
                response: OctetString::from(rasn::der::encode(&basic).unwrap()),
            }),
        })
        .unwrap()
    }
}
