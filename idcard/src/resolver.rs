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

//! Selection of the OCSP endpoints to try for a subject certificate.

use crate::{
    certificate::Certificate,
    config::{IdCardConfig, OcspEndpointConfig},
};

/// Maps a subject certificate to the ordered list of OCSP endpoints that
/// should be asked about it.
pub trait EndpointPolicyResolver: Send + Sync {
    /// Return the endpoints to try, in order. An empty list means the
    /// certificate cannot be validated with the current configuration.
    fn resolve(&self, subject: &Certificate) -> Vec<OcspEndpointConfig>;
}

/// A fixed endpoint list, used for every certificate.
impl EndpointPolicyResolver for Vec<OcspEndpointConfig> {
    fn resolve(&self, _subject: &Certificate) -> Vec<OcspEndpointConfig> {
        self.clone()
    }
}

/// Resolves endpoints from an [`IdCardConfig`].
///
/// The primary endpoint is the first `ocsp` entry that serves the subject's
/// issuer CN; without one, the AIA OCSP URL of the subject certificate is
/// used (when enabled). Every `fallback_ocsp` entry serving the issuer
/// follows, in configuration order.
#[derive(Clone, Debug)]
pub struct ConfiguredEndpointResolver {
    ocsp: Vec<OcspEndpointConfig>,
    fallback_ocsp: Vec<OcspEndpointConfig>,
    aia_ocsp_enabled: bool,
}

impl ConfiguredEndpointResolver {
    /// Create a resolver from the endpoint lists of `config`.
    pub fn new(config: &IdCardConfig) -> Self {
        Self {
            ocsp: config.ocsp.clone(),
            fallback_ocsp: config.fallback_ocsp.clone(),
            aia_ocsp_enabled: config.aia_ocsp_enabled,
        }
    }

    fn primary(&self, subject: &Certificate, issuer_cn: &str) -> Option<OcspEndpointConfig> {
        if let Some(configured) = self.ocsp.iter().find(|c| c.serves_issuer(issuer_cn)) {
            return Some(configured.clone());
        }

        if !self.aia_ocsp_enabled {
            return None;
        }

        let url = subject.ocsp_urls().into_iter().next()?;
        log::debug!("Using AIA OCSP url {url} for issuer {issuer_cn}");

        let mut aia = OcspEndpointConfig::new(url);
        aia.issuer_cn.push(issuer_cn.to_owned());
        Some(aia)
    }
}

impl EndpointPolicyResolver for ConfiguredEndpointResolver {
    fn resolve(&self, subject: &Certificate) -> Vec<OcspEndpointConfig> {
        let Some(issuer_cn) = subject.issuer_cn() else {
            return Vec::new();
        };

        let mut endpoints: Vec<OcspEndpointConfig> =
            self.primary(subject, issuer_cn).into_iter().collect();

        endpoints.extend(
            self.fallback_ocsp
                .iter()
                .filter(|c| c.serves_issuer(issuer_cn))
                .cloned(),
        );

        endpoints
    }
}
