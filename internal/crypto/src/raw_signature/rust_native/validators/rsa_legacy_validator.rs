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

use rsa::{
    pkcs1v15::{Signature, VerifyingKey},
    pkcs8::DecodePublicKey,
    signature::Verifier,
    RsaPublicKey,
};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::raw_signature::{RawSignatureValidationError, RawSignatureValidator};

/// An `RsaLegacyValidator` can validate raw signatures with one of the
/// RSASSA-PKCS1-v1_5 signature algorithms (`sha*WithRSAEncryption`).
///
/// SHA-1 remains here because older OCSP responder certificates are still
/// signed that way.
pub enum RsaLegacyValidator {
    /// RSASSA-PKCS1-v1_5 using SHA-1
    Rsa1,

    /// RSASSA-PKCS1-v1_5 using SHA-256
    Rsa256,

    /// RSASSA-PKCS1-v1_5 using SHA-384
    Rsa384,

    /// RSASSA-PKCS1-v1_5 using SHA-512
    Rsa512,
}

impl RawSignatureValidator for RsaLegacyValidator {
    fn validate(
        &self,
        sig: &[u8],
        data: &[u8],
        public_key: &[u8],
    ) -> Result<(), RawSignatureValidationError> {
        let signature =
            Signature::try_from(sig).map_err(|_| RawSignatureValidationError::InvalidSignature)?;

        let public_key = RsaPublicKey::from_public_key_der(public_key)
            .map_err(|_| RawSignatureValidationError::InvalidPublicKey)?;

        let result = match self {
            RsaLegacyValidator::Rsa1 => {
                VerifyingKey::<Sha1>::new(public_key).verify(data, &signature)
            }
            RsaLegacyValidator::Rsa256 => {
                VerifyingKey::<Sha256>::new(public_key).verify(data, &signature)
            }
            RsaLegacyValidator::Rsa384 => {
                VerifyingKey::<Sha384>::new(public_key).verify(data, &signature)
            }
            RsaLegacyValidator::Rsa512 => {
                VerifyingKey::<Sha512>::new(public_key).verify(data, &signature)
            }
        };

        result.map_err(|_| RawSignatureValidationError::SignatureMismatch)
    }
}
