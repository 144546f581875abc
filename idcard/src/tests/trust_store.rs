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

use super::fixtures::{issue, TestPki, CA_CN, OTHER_CA_CN, RESPONDER_CN};
use crate::{TrustStoreError, TrustedCertificates};

#[test]
fn lookup_by_cn() {
    let pki = TestPki::new();
    let trusted = pki.trusted();

    assert_eq!(trusted.len(), 3);
    assert_eq!(trusted.get(CA_CN), Some(&pki.ca.cert));
    assert_eq!(trusted.get(OTHER_CA_CN), Some(&pki.other_ca.cert));
    assert_eq!(trusted.get(RESPONDER_CN), Some(&pki.responder.cert));
    assert!(trusted.get("unknown").is_none());
}

#[test]
fn issuer_of() {
    let pki = TestPki::new();
    let trusted = pki.trusted();

    assert_eq!(trusted.issuer_of(&pki.user.cert), Some(&pki.ca.cert));
    assert_eq!(trusted.issuer_of(&pki.ca.cert), Some(&pki.ca.cert));

    let stranger = issue("stranger", Some(&issue("Unknown CA", None, |_| {})), |_| {});
    assert!(trusted.issuer_of(&stranger.cert).is_none());
}

#[test]
fn from_pem_bundle() {
    let pki = TestPki::new();
    let bundle = format!("{}{}", pki.ca.pem(), pki.responder.pem());

    let trusted = TrustedCertificates::from_pem(bundle.as_bytes()).unwrap();

    assert_eq!(trusted.len(), 2);
    assert!(trusted.get(CA_CN).is_some());
    assert!(trusted.get(RESPONDER_CN).is_some());
}

#[test]
fn from_pem_file() {
    let pki = TestPki::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truststore.pem");
    std::fs::write(&path, pki.ca.pem()).unwrap();

    let trusted = TrustedCertificates::from_pem_file(&path).unwrap();
    assert_eq!(trusted.get(CA_CN), Some(&pki.ca.cert));

    assert!(matches!(
        TrustedCertificates::from_pem_file(dir.path().join("missing.pem")),
        Err(TrustStoreError::Io { .. })
    ));
}

#[test]
fn duplicate_cn() {
    let pki = TestPki::new();
    let twin = issue(CA_CN, None, |_| {});

    match TrustedCertificates::new([pki.ca.cert.clone(), twin.cert]) {
        Err(TrustStoreError::DuplicateCommonName(cn)) => assert_eq!(cn, CA_CN),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn empty() {
    let trusted = TrustedCertificates::new([]).unwrap();
    assert!(trusted.is_empty());
}
