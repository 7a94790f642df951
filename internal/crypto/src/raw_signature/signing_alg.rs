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

use std::{fmt, str::FromStr};

#[cfg(feature = "json_schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use x509_parser::oid_registry::Oid;

use crate::{hash::DigestAlgorithm, raw_signature::oids::*};

/// Describes the public key (encryption) algorithm family of a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[serde(rename_all = "UPPERCASE")]
#[non_exhaustive]
pub enum EncryptionAlgorithm {
    /// RSA
    Rsa,

    /// ECDSA over a NIST curve
    Ecdsa,

    /// Edwards-Curve DSA (Ed25519 instance only)
    Ed25519,
}

impl FromStr for EncryptionAlgorithm {
    type Err = UnknownAlgorithmError;

    fn from_str(alg: &str) -> Result<Self, Self::Err> {
        match alg.to_ascii_uppercase().as_str() {
            "RSA" => Ok(Self::Rsa),
            "ECDSA" | "EC" => Ok(Self::Ecdsa),
            "ED25519" | "EDDSA" => Ok(Self::Ed25519),
            _ => Err(UnknownAlgorithmError(alg.to_owned())),
        }
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Self::Rsa => "RSA",
                Self::Ecdsa => "ECDSA",
                Self::Ed25519 => "ED25519",
            }
        )
    }
}

/// Describes a complete signature algorithm: a public key algorithm paired
/// with the digest algorithm applied to the signed data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-1
    RsaSha1,

    /// RSASSA-PKCS1-v1_5 with SHA-256
    RsaSha256,

    /// RSASSA-PKCS1-v1_5 with SHA-384
    RsaSha384,

    /// RSASSA-PKCS1-v1_5 with SHA-512
    RsaSha512,

    /// ECDSA with SHA-256
    EcdsaSha256,

    /// ECDSA with SHA-384
    EcdsaSha384,

    /// ECDSA with SHA-512
    EcdsaSha512,

    /// Edwards-Curve DSA (Ed25519 instance only)
    Ed25519,
}

impl SignatureAlgorithm {
    /// Identifies a signature algorithm from an X.509 `AlgorithmIdentifier`
    /// OID.
    ///
    /// RSASSA-PSS is not supported because its digest lives in the
    /// algorithm parameters.
    pub fn from_oid(oid: &Oid) -> Option<Self> {
        if oid == &SHA1_WITH_RSAENCRYPTION_OID {
            Some(Self::RsaSha1)
        } else if oid == &SHA256_WITH_RSAENCRYPTION_OID {
            Some(Self::RsaSha256)
        } else if oid == &SHA384_WITH_RSAENCRYPTION_OID {
            Some(Self::RsaSha384)
        } else if oid == &SHA512_WITH_RSAENCRYPTION_OID {
            Some(Self::RsaSha512)
        } else if oid == &ECDSA_WITH_SHA256_OID {
            Some(Self::EcdsaSha256)
        } else if oid == &ECDSA_WITH_SHA384_OID {
            Some(Self::EcdsaSha384)
        } else if oid == &ECDSA_WITH_SHA512_OID {
            Some(Self::EcdsaSha512)
        } else if oid == &ED25519_OID {
            Some(Self::Ed25519)
        } else {
            None
        }
    }

    /// Combines a public key algorithm and a digest algorithm.
    pub fn from_parts(encryption: EncryptionAlgorithm, digest: DigestAlgorithm) -> Option<Self> {
        match (encryption, digest) {
            (EncryptionAlgorithm::Rsa, DigestAlgorithm::Sha1) => Some(Self::RsaSha1),
            (EncryptionAlgorithm::Rsa, DigestAlgorithm::Sha256) => Some(Self::RsaSha256),
            (EncryptionAlgorithm::Rsa, DigestAlgorithm::Sha384) => Some(Self::RsaSha384),
            (EncryptionAlgorithm::Rsa, DigestAlgorithm::Sha512) => Some(Self::RsaSha512),
            (EncryptionAlgorithm::Ecdsa, DigestAlgorithm::Sha256) => Some(Self::EcdsaSha256),
            (EncryptionAlgorithm::Ecdsa, DigestAlgorithm::Sha384) => Some(Self::EcdsaSha384),
            (EncryptionAlgorithm::Ecdsa, DigestAlgorithm::Sha512) => Some(Self::EcdsaSha512),
            (EncryptionAlgorithm::Ed25519, DigestAlgorithm::Sha512) => Some(Self::Ed25519),
            _ => None,
        }
    }

    /// Returns the digest algorithm applied to the signed data.
    ///
    /// Ed25519 hashes internally with SHA-512.
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        match self {
            Self::RsaSha1 => DigestAlgorithm::Sha1,
            Self::RsaSha256 | Self::EcdsaSha256 => DigestAlgorithm::Sha256,
            Self::RsaSha384 | Self::EcdsaSha384 => DigestAlgorithm::Sha384,
            Self::RsaSha512 | Self::EcdsaSha512 | Self::Ed25519 => DigestAlgorithm::Sha512,
        }
    }

    /// Returns the public key algorithm family.
    pub fn encryption_algorithm(&self) -> EncryptionAlgorithm {
        match self {
            Self::RsaSha1 | Self::RsaSha256 | Self::RsaSha384 | Self::RsaSha512 => {
                EncryptionAlgorithm::Rsa
            }
            Self::EcdsaSha256 | Self::EcdsaSha384 | Self::EcdsaSha512 => EncryptionAlgorithm::Ecdsa,
            Self::Ed25519 => EncryptionAlgorithm::Ed25519,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Self::RsaSha1 => "RSA-SHA1",
                Self::RsaSha256 => "RSA-SHA256",
                Self::RsaSha384 => "RSA-SHA384",
                Self::RsaSha512 => "RSA-SHA512",
                Self::EcdsaSha256 => "ECDSA-SHA256",
                Self::EcdsaSha384 => "ECDSA-SHA384",
                Self::EcdsaSha512 => "ECDSA-SHA512",
                Self::Ed25519 => "ED25519",
            }
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
/// This error is thrown when converting from a string to an algorithm
/// identifier if the algorithm string is unrecognized.
pub struct UnknownAlgorithmError(pub String);

impl fmt::Display for UnknownAlgorithmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "UnknownAlgorithmError({})", self.0)
    }
}

impl std::error::Error for UnknownAlgorithmError {}
