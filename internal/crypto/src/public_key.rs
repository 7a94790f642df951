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

//! Public key introspection used by cryptographic constraints.

use thiserror::Error;
use x509_parser::{prelude::FromDer, public_key::PublicKey, x509::SubjectPublicKeyInfo};

use crate::raw_signature::{oids::ED25519_OID, EncryptionAlgorithm};

/// Algorithm family and size of a public key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PublicKeyInfo {
    /// Public key algorithm family.
    pub algorithm: EncryptionAlgorithm,

    /// Key size in bits (RSA modulus length or curve size).
    pub key_size: usize,
}

impl PublicKeyInfo {
    /// Inspect a DER-encoded `SubjectPublicKeyInfo`.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, PublicKeyError> {
        let (_, spki) =
            SubjectPublicKeyInfo::from_der(der).map_err(|_| PublicKeyError::InvalidEncoding)?;
        Self::from_spki(&spki)
    }

    /// Inspect a parsed `SubjectPublicKeyInfo`.
    pub fn from_spki(spki: &SubjectPublicKeyInfo) -> Result<Self, PublicKeyError> {
        if spki.algorithm.algorithm == ED25519_OID {
            return Ok(Self {
                algorithm: EncryptionAlgorithm::Ed25519,
                key_size: 256,
            });
        }

        match spki.parsed() {
            Ok(PublicKey::RSA(rsa)) => Ok(Self {
                algorithm: EncryptionAlgorithm::Rsa,
                key_size: rsa.key_size(),
            }),
            Ok(PublicKey::EC(ec)) => Ok(Self {
                algorithm: EncryptionAlgorithm::Ecdsa,
                key_size: ec.key_size(),
            }),
            Ok(_) => Err(PublicKeyError::UnsupportedAlgorithm),
            Err(_) => Err(PublicKeyError::InvalidEncoding),
        }
    }
}

/// Describes errors that can occur when inspecting a public key.
#[derive(Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum PublicKeyError {
    /// The key could not be decoded.
    #[error("the public key could not be decoded")]
    InvalidEncoding,

    /// The key uses an algorithm this crate does not support.
    #[error("unsupported public key algorithm")]
    UnsupportedAlgorithm,
}
