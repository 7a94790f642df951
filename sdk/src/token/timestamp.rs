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

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CertificateToken, Digest, Principal, Token, TokenId, TokenSignature};

/// What a timestamp was computed over.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimestampType {
    /// Over the signature value.
    Signature,

    /// Over the signed content, before signing (CAdES content timestamp).
    Content,

    /// Over all signed data objects (XAdES).
    AllDataObjects,

    /// Over selected signed data objects (XAdES).
    IndividualDataObjects,

    /// Over the signature and the validation data references (SigAndRefs).
    ValidationData,

    /// Over the validation data references only (RefsOnly).
    ValidationDataRefsOnly,

    Archive,
}

impl TimestampType {
    pub fn is_content_timestamp(&self) -> bool {
        matches!(
            self,
            Self::Content | Self::AllDataObjects | Self::IndividualDataObjects
        )
    }

    /// Timestamps examined by the AdES-T process.
    pub fn is_signature_level(&self) -> bool {
        self.is_content_timestamp() || *self == Self::Signature
    }

    /// Position in the required chronological order: content timestamps
    /// first, archive timestamps last.
    pub fn order_rank(&self) -> u8 {
        match self {
            Self::Content | Self::AllDataObjects | Self::IndividualDataObjects => 0,
            Self::Signature => 1,
            Self::ValidationData | Self::ValidationDataRefsOnly => 2,
            Self::Archive => 3,
        }
    }

    /// Timestamps that necessarily cover the signature value.
    pub fn covers_signature(&self) -> bool {
        !self.is_content_timestamp()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceCategory {
    Signature,
    Certificate,
    Revocation,
    Timestamp,
    SignedData,
}

/// One object covered by a timestamp.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct TimestampedReference {
    pub category: ReferenceCategory,
    pub token_id: TokenId,
}

impl TimestampedReference {
    pub fn new(category: ReferenceCategory, token_id: TokenId) -> Self {
        Self { category, token_id }
    }
}

/// Result of checking the message imprint of a timestamp.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageImprint {
    /// The timestamped bytes were recovered.
    pub found: bool,

    /// The timestamped bytes hash to the imprint.
    pub intact: bool,
}

/// Decoded content of an RFC 3161 timestamp token, as produced by a format
/// adapter.
#[derive(Clone, Debug)]
pub struct TimestampData {
    pub kind: TimestampType,
    pub generation_time: DateTime<Utc>,
    pub message_imprint: Digest,

    /// The exact bytes the timestamp was computed over, if the format layer
    /// could reconstruct them.
    pub timestamped_data: Option<Vec<u8>>,

    /// Canonicalization applied to XML input before hashing.
    pub canonicalization_method: Option<String>,
    pub references: Vec<TimestampedReference>,
    pub certificates: Vec<Vec<u8>>,

    /// Name of the TSA signing certificate.
    pub signer: Principal,
    pub signature: TokenSignature,
    pub encoded: Vec<u8>,
}

pub struct TimestampToken {
    id: TokenId,
    data: TimestampData,
    imprint: OnceLock<MessageImprint>,
    issuer_token: OnceLock<Arc<CertificateToken>>,
}

impl TimestampToken {
    pub fn new(data: TimestampData) -> Self {
        Self {
            id: TokenId::from_encoded(&data.encoded),
            data,
            imprint: OnceLock::new(),
            issuer_token: OnceLock::new(),
        }
    }

    pub fn kind(&self) -> TimestampType {
        self.data.kind
    }

    pub fn generation_time(&self) -> DateTime<Utc> {
        self.data.generation_time
    }

    pub fn message_imprint(&self) -> &Digest {
        &self.data.message_imprint
    }

    pub fn canonicalization_method(&self) -> Option<&str> {
        self.data.canonicalization_method.as_deref()
    }

    pub fn references(&self) -> &[TimestampedReference] {
        &self.data.references
    }

    pub fn signature(&self) -> &TokenSignature {
        &self.data.signature
    }

    /// Check the message imprint against the timestamped bytes. The result
    /// is computed once.
    pub fn check_message_imprint(&self) -> MessageImprint {
        *self.imprint.get_or_init(|| match &self.data.timestamped_data {
            Some(data) => MessageImprint {
                found: true,
                intact: self.data.message_imprint.matches(data),
            },
            None => MessageImprint {
                found: false,
                intact: false,
            },
        })
    }
}

impl Token for TimestampToken {
    fn id(&self) -> TokenId {
        self.id
    }

    fn abbreviation(&self) -> String {
        format!("T-{}", self.id.short())
    }

    fn issuer_principal(&self) -> &Principal {
        &self.data.signer
    }

    fn is_signed_by(&self, issuer: &CertificateToken) -> bool {
        issuer.subject() == &self.data.signer && self.data.signature.verify_with(issuer).is_ok()
    }

    fn encoded(&self) -> &[u8] {
        &self.data.encoded
    }

    fn issuer_token(&self) -> Option<Arc<CertificateToken>> {
        self.issuer_token.get().cloned()
    }

    fn set_issuer(&self, issuer: Arc<CertificateToken>) -> bool {
        self.issuer_token.set(issuer).is_ok()
    }

    fn embedded_certificates(&self) -> &[Vec<u8>] {
        &self.data.certificates
    }
}

impl fmt::Debug for TimestampToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimestampToken")
            .field("id", &self.id)
            .field("kind", &self.data.kind)
            .field("generation_time", &self.data.generation_time)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use ades_crypto::{hash::DigestAlgorithm, raw_signature::SignatureAlgorithm};
    use chrono::TimeZone;

    use super::*;

    fn token(data: Option<&[u8]>) -> TimestampToken {
        TimestampToken::new(TimestampData {
            kind: TimestampType::Signature,
            generation_time: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            message_imprint: Digest::of(DigestAlgorithm::Sha256, b"signature value"),
            timestamped_data: data.map(<[u8]>::to_vec),
            canonicalization_method: None,
            references: Vec::new(),
            certificates: Vec::new(),
            signer: Principal::new(vec![0x30, 0x00], ""),
            signature: TokenSignature {
                algorithm: SignatureAlgorithm::EcdsaSha256,
                signed_content: Vec::new(),
                value: Vec::new(),
            },
            encoded: b"tst".to_vec(),
        })
    }

    #[test]
    fn imprint_intact() {
        let imprint = token(Some(b"signature value")).check_message_imprint();
        assert!(imprint.found);
        assert!(imprint.intact);
    }

    #[test]
    fn imprint_mismatch() {
        let imprint = token(Some(b"other value")).check_message_imprint();
        assert!(imprint.found);
        assert!(!imprint.intact);
    }

    #[test]
    fn imprint_missing_data() {
        let imprint = token(None).check_message_imprint();
        assert!(!imprint.found);
        assert!(!imprint.intact);
    }

    #[test]
    fn ordering_ranks() {
        assert!(TimestampType::Content.order_rank() < TimestampType::Signature.order_rank());
        assert!(
            TimestampType::Signature.order_rank() < TimestampType::ValidationData.order_rank()
        );
        assert!(
            TimestampType::ValidationDataRefsOnly.order_rank()
                < TimestampType::Archive.order_rank()
        );
        assert!(!TimestampType::Archive.is_signature_level());
        assert!(TimestampType::IndividualDataObjects.is_signature_level());
    }
}
