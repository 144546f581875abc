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

//! The set of certificates trusted for ID-card validation, keyed by CN.

use std::{
    collections::{hash_map::Entry, HashMap},
    path::Path,
};

use tara_crypto::{base64, hash::sha256};
use thiserror::Error;

use crate::certificate::{Certificate, CertificateError};

/// Describes errors that can occur while building the trust store.
#[derive(Debug, Error)]
pub enum TrustStoreError {
    /// The truststore file could not be read.
    #[error("could not read truststore from {path}: {source}")]
    Io {
        /// Path of the truststore.
        path: String,

        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A certificate in the truststore could not be parsed.
    #[error("failed to read trusted certificates: {0}")]
    InvalidCertificate(#[from] CertificateError),

    /// A trusted certificate has no subject CN.
    #[error("trusted certificate '{0}' has no subject CN")]
    MissingCommonName(String),

    /// Two trusted certificates share a subject CN.
    #[error("duplicate trusted certificate CN '{0}'")]
    DuplicateCommonName(String),
}

/// Trust anchors for ID-card validation: CA certificates that issue
/// subject certificates and OCSP responder certificates.
///
/// Lookups are by the first CN of the certificate's subject. The store is
/// built once and is read-only afterwards, so it can be shared across
/// threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct TrustedCertificates {
    by_cn: HashMap<String, Certificate>,
}

impl TrustedCertificates {
    /// Build a store from certificates.
    pub fn new(certs: impl IntoIterator<Item = Certificate>) -> Result<Self, TrustStoreError> {
        let mut by_cn = HashMap::new();

        for cert in certs {
            let cn = cert
                .subject_cn()
                .ok_or_else(|| TrustStoreError::MissingCommonName(cert.subject_dn().to_owned()))?
                .to_owned();

            match by_cn.entry(cn) {
                Entry::Occupied(entry) => {
                    return Err(TrustStoreError::DuplicateCommonName(entry.key().clone()));
                }
                Entry::Vacant(entry) => {
                    log::info!(
                        "Trusted OCSP responder certificate added to configuration - CN: {}, serialnumber: {}, validFrom: {}, validTo: {}, sha256: {}",
                        entry.key(),
                        cert.serial(),
                        cert.not_before(),
                        cert.not_after(),
                        base64::encode(&sha256(cert.der()))
                    );
                    entry.insert(cert);
                }
            }
        }

        Ok(Self { by_cn })
    }

    /// Build a store from every certificate in a PEM bundle.
    pub fn from_pem(pems: &[u8]) -> Result<Self, TrustStoreError> {
        Self::new(Certificate::from_pem_bundle(pems)?)
    }

    /// Build a store from a PEM bundle file.
    pub fn from_pem_file<P: AsRef<Path>>(path: P) -> Result<Self, TrustStoreError> {
        let path = path.as_ref();
        let pems = std::fs::read(path).map_err(|source| TrustStoreError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_pem(&pems)
    }

    /// Return the trusted certificate with subject CN `cn`.
    pub fn get(&self, cn: &str) -> Option<&Certificate> {
        self.by_cn.get(cn)
    }

    /// Return the trusted certificate whose CN equals the issuer CN of
    /// `cert`.
    pub fn issuer_of(&self, cert: &Certificate) -> Option<&Certificate> {
        let issuer_cn = cert.issuer_cn()?;
        log::debug!("IssuerCN extracted: {issuer_cn}");
        self.get(issuer_cn)
    }

    /// Number of trusted certificates.
    pub fn len(&self) -> usize {
        self.by_cn.len()
    }

    /// Returns `true` if no certificates are trusted.
    pub fn is_empty(&self) -> bool {
        self.by_cn.is_empty()
    }
}
