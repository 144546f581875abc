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

use thiserror::Error;
use x509_parser::oid_registry::Oid;

/// A `RawSignatureValidator` implementation checks a signature encoded using a
/// specific signature algorithm and a private/public key pair.
///
/// IMPORTANT: The signature is typically embedded in a wrapper structure such
/// as an X.509 certificate or an OCSP `BasicOCSPResponse`. The caller is
/// responsible for extracting the signed bytes from that wrapper.
pub trait RawSignatureValidator {
    /// Return `Ok(())` if the signature `sig` is valid for the raw content
    /// `data` and the public key `public_key`.
    ///
    /// `public_key` is a DER-encoded `SubjectPublicKeyInfo`.
    fn validate(
        &self,
        sig: &[u8],
        data: &[u8],
        public_key: &[u8],
    ) -> Result<(), RawSignatureValidationError>;
}

/// Return a built-in signature validator for the signature algorithm
/// identified by `sig_alg` (the `algorithm` of an X.509
/// `AlgorithmIdentifier`, for example `ecdsa-with-SHA256`).
pub fn validator_for_sig_alg(sig_alg: &Oid) -> Option<Box<dyn RawSignatureValidator>> {
    crate::raw_signature::rust_native::validators::validator_for_sig_alg(sig_alg)
}

/// Verify that `sig` is a valid signature over `data` made with the key
/// described by the DER-encoded `SubjectPublicKeyInfo` `public_key`.
pub fn verify_signed_data(
    sig_alg: &Oid,
    sig: &[u8],
    data: &[u8],
    public_key: &[u8],
) -> Result<(), RawSignatureValidationError> {
    let validator =
        validator_for_sig_alg(sig_alg).ok_or(RawSignatureValidationError::UnsupportedAlgorithm)?;

    validator.validate(sig, data, public_key)
}

/// Describes errors that can be identified when validating a raw signature.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum RawSignatureValidationError {
    /// The signature does not match the provided data or public key.
    #[error("the signature does not match the provided data or public key")]
    SignatureMismatch,

    /// An error was reported by the underlying cryptography implementation.
    #[error("an error was reported by the cryptography library: {0}")]
    CryptoLibraryError(String),

    /// An invalid public key was provided.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// An invalid signature value was provided.
    #[error("invalid signature value")]
    InvalidSignature,

    /// The signature uses an unsupported signing or hash algorithm.
    #[error("signature uses an unsupported algorithm")]
    UnsupportedAlgorithm,

    /// An unexpected internal error occured while validating the signature.
    #[error("internal error ({0})")]
    InternalError(String),
}
