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

use rsa::{
    pkcs1v15::{Signature, VerifyingKey},
    signature::Verifier,
    RsaPublicKey,
};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use spki::DecodePublicKey;

use crate::raw_signature::{RawSignatureValidationError, RawSignatureValidator};

/// An `RsaValidator` can validate raw signatures with one of the
/// RSASSA-PKCS1-v1_5 signature algorithms.
pub enum RsaValidator {
    /// RSASSA-PKCS1-v1_5 with SHA-1
    Rsa1,

    /// RSASSA-PKCS1-v1_5 with SHA-256
    Rsa256,

    /// RSASSA-PKCS1-v1_5 with SHA-384
    Rsa384,

    /// RSASSA-PKCS1-v1_5 with SHA-512
    Rsa512,
}

impl RawSignatureValidator for RsaValidator {
    fn validate(
        &self,
        sig: &[u8],
        data: &[u8],
        public_key: &[u8],
    ) -> Result<(), RawSignatureValidationError> {
        let key = RsaPublicKey::from_public_key_der(public_key)
            .map_err(|_| RawSignatureValidationError::InvalidPublicKey)?;

        let signature =
            Signature::try_from(sig).map_err(|_| RawSignatureValidationError::InvalidSignature)?;

        let result = match self {
            Self::Rsa1 => VerifyingKey::<Sha1>::new(key).verify(data, &signature),
            Self::Rsa256 => VerifyingKey::<Sha256>::new(key).verify(data, &signature),
            Self::Rsa384 => VerifyingKey::<Sha384>::new(key).verify(data, &signature),
            Self::Rsa512 => VerifyingKey::<Sha512>::new(key).verify(data, &signature),
        };

        result.map_err(|_| RawSignatureValidationError::SignatureMismatch)
    }
}
