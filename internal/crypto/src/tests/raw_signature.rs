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

use ed25519_dalek::{pkcs8::EncodePublicKey as _, Signer as _, SigningKey};
use p256::ecdsa::{signature::Signer as _, Signature as P256Signature, SigningKey as P256SigningKey};
use rand::rngs::OsRng;

use crate::raw_signature::{
    oids::*, validator_for_sig_alg, verify_signed_data, RawSignatureValidationError,
};

const SAMPLE_DATA: &[u8] = b"some sample content to sign";

fn ed25519_key() -> (SigningKey, Vec<u8>) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let spki = signing_key
        .verifying_key()
        .to_public_key_der()
        .unwrap()
        .as_bytes()
        .to_vec();
    (signing_key, spki)
}

fn p256_key() -> (P256SigningKey, Vec<u8>) {
    use p256::pkcs8::EncodePublicKey;

    let signing_key = P256SigningKey::random(&mut OsRng);
    let spki = signing_key
        .verifying_key()
        .to_public_key_der()
        .unwrap()
        .as_bytes()
        .to_vec();
    (signing_key, spki)
}

#[test]
fn ed25519() {
    let (key, spki) = ed25519_key();
    let signature = key.sign(SAMPLE_DATA);

    verify_signed_data(&ED25519_OID, &signature.to_bytes(), SAMPLE_DATA, &spki).unwrap();
}

#[test]
fn ed25519_bad_data() {
    let (key, spki) = ed25519_key();
    let signature = key.sign(SAMPLE_DATA);

    let mut data = SAMPLE_DATA.to_vec();
    data[10] = 0;

    assert_eq!(
        verify_signed_data(&ED25519_OID, &signature.to_bytes(), &data, &spki).unwrap_err(),
        RawSignatureValidationError::SignatureMismatch
    );
}

#[test]
fn ed25519_wrong_key() {
    let (key, _) = ed25519_key();
    let (_, other_spki) = ed25519_key();
    let signature = key.sign(SAMPLE_DATA);

    assert_eq!(
        verify_signed_data(&ED25519_OID, &signature.to_bytes(), SAMPLE_DATA, &other_spki)
            .unwrap_err(),
        RawSignatureValidationError::SignatureMismatch
    );
}

#[test]
fn ed25519_truncated_signature() {
    let (key, spki) = ed25519_key();
    let signature = key.sign(SAMPLE_DATA).to_bytes();

    assert_eq!(
        verify_signed_data(&ED25519_OID, &signature[..40], SAMPLE_DATA, &spki).unwrap_err(),
        RawSignatureValidationError::InvalidSignature
    );
}

#[test]
fn es256_der_signature() {
    let (key, spki) = p256_key();
    let signature: P256Signature = key.sign(SAMPLE_DATA);

    verify_signed_data(
        &ECDSA_WITH_SHA256_OID,
        signature.to_der().as_bytes(),
        SAMPLE_DATA,
        &spki,
    )
    .unwrap();
}

#[test]
fn es256_rejects_p1363_signature() {
    let (key, spki) = p256_key();
    let signature: P256Signature = key.sign(SAMPLE_DATA);

    let validator = validator_for_sig_alg(&ECDSA_WITH_SHA256_OID).unwrap();
    assert_eq!(
        validator
            .validate(&signature.to_bytes(), SAMPLE_DATA, &spki)
            .unwrap_err(),
        RawSignatureValidationError::InvalidSignature
    );
}

#[test]
fn es256_bad_data() {
    let (key, spki) = p256_key();
    let signature: P256Signature = key.sign(SAMPLE_DATA);

    assert_eq!(
        verify_signed_data(
            &ECDSA_WITH_SHA256_OID,
            signature.to_der().as_bytes(),
            b"other content",
            &spki,
        )
        .unwrap_err(),
        RawSignatureValidationError::SignatureMismatch
    );
}

#[test]
fn es384_with_p256_signature() {
    let (key, spki) = p256_key();
    let signature: P256Signature = key.sign(SAMPLE_DATA);

    // Signed over a SHA-256 digest, validated as SHA-384.
    assert_eq!(
        verify_signed_data(
            &ECDSA_WITH_SHA384_OID,
            signature.to_der().as_bytes(),
            SAMPLE_DATA,
            &spki,
        )
        .unwrap_err(),
        RawSignatureValidationError::SignatureMismatch
    );
}

#[test]
fn ecdsa_with_ed25519_key() {
    let (_, spki) = ed25519_key();

    assert_eq!(
        verify_signed_data(&ECDSA_WITH_SHA256_OID, &[0u8; 64], SAMPLE_DATA, &spki).unwrap_err(),
        RawSignatureValidationError::InvalidPublicKey
    );
}

#[test]
fn rsa256() {
    use rsa::{
        pkcs1v15::SigningKey as RsaSigningKey,
        pkcs8::EncodePublicKey,
        signature::{SignatureEncoding, Signer},
        RsaPrivateKey,
    };
    use sha2::Sha256;

    let private_key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
    let spki = private_key
        .to_public_key()
        .to_public_key_der()
        .unwrap()
        .as_bytes()
        .to_vec();

    let signing_key = RsaSigningKey::<Sha256>::new(private_key);
    let signature = signing_key.sign(SAMPLE_DATA).to_vec();

    verify_signed_data(&SHA256_WITH_RSAENCRYPTION_OID, &signature, SAMPLE_DATA, &spki).unwrap();

    assert_eq!(
        verify_signed_data(&SHA512_WITH_RSAENCRYPTION_OID, &signature, SAMPLE_DATA, &spki)
            .unwrap_err(),
        RawSignatureValidationError::SignatureMismatch
    );
}

#[test]
fn rsa_pss_is_unsupported() {
    assert!(validator_for_sig_alg(&RSA_PSS_OID).is_none());

    assert_eq!(
        verify_signed_data(&RSA_PSS_OID, &[], SAMPLE_DATA, &[]).unwrap_err(),
        RawSignatureValidationError::UnsupportedAlgorithm
    );
}
