// Copyright 2022 Adobe. All rights reserved.
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

use ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature as P256Signature, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{Signature as P384Signature, VerifyingKey as P384VerifyingKey};
use spki::DecodePublicKey;

use crate::{
    hash::DigestAlgorithm,
    raw_signature::{RawSignatureValidationError, RawSignatureValidator},
};

/// An `EcdsaValidator` can validate raw signatures with one of the ECDSA
/// signature algorithms.
///
/// The curve (P-256 or P-384) is taken from the public key. Signatures may be
/// DER-encoded (CMS) or fixed-size `r | s` (XML-DSig).
pub enum EcdsaValidator {
    /// ECDSA with SHA-256
    Es256,

    /// ECDSA with SHA-384
    Es384,

    /// ECDSA with SHA-512
    Es512,
}

impl EcdsaValidator {
    fn digest_algorithm(&self) -> DigestAlgorithm {
        match self {
            Self::Es256 => DigestAlgorithm::Sha256,
            Self::Es384 => DigestAlgorithm::Sha384,
            Self::Es512 => DigestAlgorithm::Sha512,
        }
    }
}

impl RawSignatureValidator for EcdsaValidator {
    fn validate(
        &self,
        sig: &[u8],
        data: &[u8],
        public_key: &[u8],
    ) -> Result<(), RawSignatureValidationError> {
        let digest = self.digest_algorithm().digest(data);

        if let Ok(vk) = P256VerifyingKey::from_public_key_der(public_key) {
            let signature = P256Signature::from_der(sig)
                .or_else(|_| P256Signature::from_slice(sig))
                .map_err(|_| RawSignatureValidationError::InvalidSignature)?;

            return vk
                .verify_prehash(&digest, &signature)
                .map_err(|_| RawSignatureValidationError::SignatureMismatch);
        }

        if let Ok(vk) = P384VerifyingKey::from_public_key_der(public_key) {
            let signature = P384Signature::from_der(sig)
                .or_else(|_| P384Signature::from_slice(sig))
                .map_err(|_| RawSignatureValidationError::InvalidSignature)?;

            return vk
                .verify_prehash(&digest, &signature)
                .map_err(|_| RawSignatureValidationError::SignatureMismatch);
        }

        Err(RawSignatureValidationError::InvalidPublicKey)
    }
}
