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

//! Evidence tokens: certificates, revocation data and timestamps.
//!
//! A token is immutable once constructed. The only state that changes after
//! construction is the issuer link (and, for certificates, the revocation
//! link), each of which is written at most once by the trust resolver.

use std::{fmt, sync::Arc};

use ades_crypto::{
    hash::{sha256, DigestAlgorithm},
    raw_signature::{self, RawSignatureValidationError, SignatureAlgorithm},
};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use x509_parser::x509::X509Name;

mod certificate;
pub use certificate::{
    certificate_chain, CertificateToken, ExtendedKeyUsage, KeyUsage, TrustServiceInfo,
};

mod pool;
pub use pool::CertificatePool;

mod revocation;
pub use revocation::{
    RevocationData, RevocationKind, RevocationOrigin, RevocationReason, RevocationStatus,
    RevocationToken,
};

mod timestamp;
pub use timestamp::{
    MessageImprint, ReferenceCategory, TimestampData, TimestampToken, TimestampType,
    TimestampedReference,
};

/// Identity of a token: the SHA-256 digest of its encoded bytes.
///
/// Two independently decoded copies of the same certificate share an id.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TokenId([u8; 32]);

impl TokenId {
    /// Derive the id of a token from its encoding.
    pub fn from_encoded(encoded: &[u8]) -> Self {
        let mut id = [0u8; 32];
        id.copy_from_slice(&sha256(encoded));
        Self(id)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First eight hex digits, used in token abbreviations.
    pub fn short(&self) -> String {
        const_hex::encode_upper(&self.0[..4])
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode_upper(self.0))
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.short())
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// An X.500 distinguished name.
///
/// Equality compares the DER encoding; the display string is informational.
#[derive(Clone, Debug, Eq)]
pub struct Principal {
    raw: Vec<u8>,
    name: String,
}

impl Principal {
    pub fn new(raw: Vec<u8>, name: impl Into<String>) -> Self {
        Self {
            raw,
            name: name.into(),
        }
    }

    pub fn from_x509_name(name: &X509Name) -> Self {
        Self {
            raw: name.as_raw().to_vec(),
            name: name.to_string(),
        }
    }

    /// DER encoding of the name.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// RFC 4514 rendering of the name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl std::hash::Hash for Principal {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Where a certificate was obtained from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    TrustedList,
    TrustedStore,
    Aia,
    Signature,
    Timestamp,
    Revocation,
    Other,
}

impl SourceTag {
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::TrustedList | Self::TrustedStore)
    }
}

/// A digest value together with the algorithm that produced it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Digest {
    pub algorithm: DigestAlgorithm,
    pub value: Vec<u8>,
}

impl Digest {
    pub fn new(algorithm: DigestAlgorithm, value: Vec<u8>) -> Self {
        Self { algorithm, value }
    }

    /// Compute the digest of `data` with `algorithm`.
    pub fn of(algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        Self {
            algorithm,
            value: algorithm.digest(data),
        }
    }

    /// Returns `true` if `data` hashes to this digest.
    pub fn matches(&self, data: &[u8]) -> bool {
        self.algorithm.digest(data) == self.value
    }
}

/// The signature carried by a revocation or timestamp token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenSignature {
    pub algorithm: SignatureAlgorithm,

    /// The exact bytes covered by the signature (TBS response, TBS CRL or
    /// signed attributes).
    pub signed_content: Vec<u8>,

    pub value: Vec<u8>,
}

impl TokenSignature {
    /// Verify the signature with the public key of `signer`.
    pub fn verify_with(
        &self,
        signer: &CertificateToken,
    ) -> Result<(), RawSignatureValidationError> {
        raw_signature::verify(
            self.algorithm,
            &self.value,
            &self.signed_content,
            signer.public_key(),
        )
    }
}

/// Capabilities shared by all evidence tokens.
pub trait Token: Send + Sync {
    fn id(&self) -> TokenId;

    /// Short display form such as `C-1A2B3C4D`.
    fn abbreviation(&self) -> String;

    /// The principal expected to have issued (signed) this token.
    fn issuer_principal(&self) -> &Principal;

    /// Returns `true` if `issuer` carries the key that signed this token.
    fn is_signed_by(&self, issuer: &CertificateToken) -> bool;

    fn is_self_signed(&self) -> bool {
        false
    }

    /// Trusted tokens never need their issuer resolved.
    fn is_trusted(&self) -> bool {
        false
    }

    fn encoded(&self) -> &[u8];

    /// The resolved issuer, if any.
    fn issuer_token(&self) -> Option<Arc<CertificateToken>>;

    /// Link the issuer. Returns `false` if an issuer was already linked.
    fn set_issuer(&self, issuer: Arc<CertificateToken>) -> bool;

    /// Certificates shipped inside the token.
    fn embedded_certificates(&self) -> &[Vec<u8>] {
        &[]
    }

    /// Locations from which the issuer certificate may be downloaded.
    fn ca_issuers_urls(&self) -> &[String] {
        &[]
    }
}

/// Describes errors that can occur when decoding evidence.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// The certificate could not be decoded.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("invalid time in token: {0}")]
    InvalidTime(String),
}
