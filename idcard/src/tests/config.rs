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

use std::time::Duration;

use chrono::TimeDelta;

use crate::{ConfigError, IdCardConfig, OcspEndpointConfig};

const CONFIG: &str = r#"
truststore_path = "truststore.pem"

[[ocsp]]
url = "http://aia.demo.sk.ee/esteid2018"
issuer_cn = ["TEST of ESTEID2018"]
responder_certificate_cn = "TEST of SK OCSP RESPONDER 2020"
connect_timeout_ms = 500
nonce_disabled = true

[[fallback_ocsp]]
url = "https://ocsp.example.ee/"
issuer_cn = ["TEST of ESTEID2018", "TEST of ESTEID-SK 2015"]
accepted_clock_skew_secs = 5
response_lifetime_secs = 60
"#;

#[test]
fn parse() {
    let config = IdCardConfig::from_toml(CONFIG).unwrap();

    assert_eq!(config.truststore_path.to_str(), Some("truststore.pem"));
    assert!(config.aia_ocsp_enabled);

    let primary = &config.ocsp[0];
    assert_eq!(primary.url, "http://aia.demo.sk.ee/esteid2018");
    assert_eq!(primary.connect_timeout(), Duration::from_millis(500));
    assert_eq!(primary.read_timeout(), Duration::from_millis(3000));
    assert!(primary.nonce_disabled);
    assert_eq!(
        primary.responder_certificate_cn.as_deref(),
        Some("TEST of SK OCSP RESPONDER 2020")
    );
    assert_eq!(primary.accepted_clock_skew(), TimeDelta::seconds(2));
    assert_eq!(primary.response_lifetime(), TimeDelta::seconds(900));

    let fallback = &config.fallback_ocsp[0];
    assert!(fallback.serves_issuer("TEST of ESTEID-SK 2015"));
    assert!(!fallback.serves_issuer("TEST of EID-SK 2016"));
    assert!(!fallback.nonce_disabled);
    assert!(fallback.responder_certificate_cn.is_none());
    assert_eq!(fallback.accepted_clock_skew(), TimeDelta::seconds(5));
    assert_eq!(fallback.response_lifetime(), TimeDelta::seconds(60));
}

#[test]
fn defaults() {
    let endpoint = OcspEndpointConfig::new("http://ocsp.test");

    assert_eq!(endpoint.connect_timeout_ms, 3000);
    assert_eq!(endpoint.read_timeout_ms, 3000);
    assert_eq!(endpoint.accepted_clock_skew_secs, 2);
    assert_eq!(endpoint.response_lifetime_secs, 900);
    assert!(!endpoint.nonce_disabled);
    assert!(endpoint.issuer_cn.is_empty());
}

#[test]
fn aia_can_be_disabled() {
    let config = IdCardConfig::from_toml(
        r#"
        truststore_path = "/etc/tara/truststore.pem"
        aia_ocsp_enabled = false
        "#,
    )
    .unwrap();

    assert!(!config.aia_ocsp_enabled);
    assert!(config.ocsp.is_empty());
    assert!(config.fallback_ocsp.is_empty());
}

#[test]
fn rejects_unsupported_scheme() {
    let result = IdCardConfig::from_toml(
        r#"
        truststore_path = "truststore.pem"

        [[fallback_ocsp]]
        url = "ldap://ocsp.example.ee"
        "#,
    );

    assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
}

#[test]
fn rejects_relative_url() {
    assert!(matches!(
        OcspEndpointConfig::new("ocsp.example.ee").validate(),
        Err(ConfigError::InvalidUrl { .. })
    ));
}

#[test]
fn rejects_malformed_toml() {
    assert!(matches!(
        IdCardConfig::from_toml("truststore_path = "),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn truststore_relative_to_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("idcard.toml");
    std::fs::write(&path, CONFIG).unwrap();

    let config = IdCardConfig::from_file(&path).unwrap();

    assert_eq!(config.truststore_path, dir.path().join("truststore.pem"));
}

#[test]
fn display_lists_settings() {
    let endpoint = OcspEndpointConfig::new("http://ocsp.test");
    let text = endpoint.to_string();

    assert!(text.starts_with("url=http://ocsp.test,"));
    assert!(text.contains("nonce_disabled=false"));
}
