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

use thiserror::Error;

use crate::raw_signature::{
    validators::{EcdsaValidator, Ed25519Validator, RsaValidator},
    SignatureAlgorithm,
};

/// A `RawSignatureValidator` implementation checks a signature encoded using a
/// specific signature algorithm and a private/public key pair.
///
/// IMPORTANT: This signature is typically embedded in a wrapper provided by
/// another signature mechanism. In AdES signatures, these wrappers are CMS
/// `SignerInfo` structures or XML-DSig `SignatureValue` elements.
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

/// Return a built-in signature validator for the requested signature
/// algorithm.
pub fn validator_for_signature_algorithm(
    alg: SignatureAlgorithm,
) -> Box<dyn RawSignatureValidator> {
    match alg {
        SignatureAlgorithm::RsaSha1 => Box::new(RsaValidator::Rsa1),
        SignatureAlgorithm::RsaSha256 => Box::new(RsaValidator::Rsa256),
        SignatureAlgorithm::RsaSha384 => Box::new(RsaValidator::Rsa384),
        SignatureAlgorithm::RsaSha512 => Box::new(RsaValidator::Rsa512),
        SignatureAlgorithm::EcdsaSha256 => Box::new(EcdsaValidator::Es256),
        SignatureAlgorithm::EcdsaSha384 => Box::new(EcdsaValidator::Es384),
        SignatureAlgorithm::EcdsaSha512 => Box::new(EcdsaValidator::Es512),
        SignatureAlgorithm::Ed25519 => Box::new(Ed25519Validator {}),
    }
}

/// Verify `sig` over `data` with the DER-encoded `SubjectPublicKeyInfo`
/// `public_key` using the given algorithm.
pub fn verify(
    alg: SignatureAlgorithm,
    sig: &[u8],
    data: &[u8],
    public_key: &[u8],
) -> Result<(), RawSignatureValidationError> {
    validator_for_signature_algorithm(alg).validate(sig, data, public_key)
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
}
