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

//! Signature description handed over by a format adapter.
//!
//! Decoding XAdES, CAdES or PAdES containers is left to format-specific
//! code; what reaches the validator is the already extracted material
//! described here.

use std::sync::Arc;

use ades_crypto::raw_signature::SignatureAlgorithm;
use chrono::{DateTime, Utc};

use crate::token::{Digest, RevocationToken, TimestampToken, TokenId};

/// The signature value and the exact bytes it covers.
#[derive(Clone, Debug)]
pub struct SignatureValue {
    pub algorithm: SignatureAlgorithm,

    /// Signed attributes (CAdES) or canonicalized `SignedInfo` (XAdES).
    pub signed_data: Vec<u8>,

    pub value: Vec<u8>,
}

/// A signed data object.
#[derive(Clone, Debug)]
pub struct DataReference {
    pub uri: String,
    pub digest: Digest,

    /// The referenced bytes, if the adapter could retrieve them.
    pub content: Option<Vec<u8>>,
}

/// Digest of the signing certificate as carried in the signing-certificate
/// signed attribute.
#[derive(Clone, Debug)]
pub struct CertificateReference {
    pub digest: Digest,
}

/// Explicit signature policy identifier.
#[derive(Clone, Debug, Default)]
pub struct SignaturePolicyReference {
    /// Policy OID or URN.
    pub identifier: String,

    /// Digest of the policy document, if the signature commits to one.
    pub digest: Option<Digest>,

    /// Location of the policy document.
    pub url: Option<String>,

    /// The policy document. When `None` and `url` is set, the validator
    /// downloads it.
    pub document: Option<Vec<u8>>,
}

/// Everything the validator needs to know about one signature.
#[derive(Clone, Debug)]
pub struct SignatureInput {
    /// Identifier used in reports, for example `S-1` or the XML `Id`.
    pub id: String,

    pub signature_value: SignatureValue,
    pub references: Vec<DataReference>,
    pub signing_certificate_reference: Option<CertificateReference>,

    /// DER certificates shipped with the signature.
    pub certificates: Vec<Vec<u8>>,

    pub revocations: Vec<Arc<RevocationToken>>,
    pub timestamps: Vec<Arc<TimestampToken>>,

    /// Claimed signing time.
    pub signing_time: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    pub commitment_types: Vec<String>,
    pub policy: Option<SignaturePolicyReference>,
}

impl SignatureInput {
    pub fn new(id: impl Into<String>, signature_value: SignatureValue) -> Self {
        Self {
            id: id.into(),
            signature_value,
            references: Vec::new(),
            signing_certificate_reference: None,
            certificates: Vec::new(),
            revocations: Vec::new(),
            timestamps: Vec::new(),
            signing_time: None,
            content_type: None,
            commitment_types: Vec::new(),
            policy: None,
        }
    }

    /// Identity of the signature for proof of existence purposes: the id of
    /// its signature value.
    pub fn token_id(&self) -> TokenId {
        TokenId::from_encoded(&self.signature_value.value)
    }

    pub fn with_reference(mut self, reference: DataReference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_certificate(mut self, der: Vec<u8>) -> Self {
        self.certificates.push(der);
        self
    }

    pub fn with_signing_certificate_reference(mut self, digest: Digest) -> Self {
        self.signing_certificate_reference = Some(CertificateReference { digest });
        self
    }

    pub fn with_revocation(mut self, revocation: Arc<RevocationToken>) -> Self {
        self.revocations.push(revocation);
        self
    }

    pub fn with_timestamp(mut self, timestamp: Arc<TimestampToken>) -> Self {
        self.timestamps.push(timestamp);
        self
    }

    pub fn with_signing_time(mut self, signing_time: DateTime<Utc>) -> Self {
        self.signing_time = Some(signing_time);
        self
    }

    pub fn with_policy(mut self, policy: SignaturePolicyReference) -> Self {
        self.policy = Some(policy);
        self
    }
}
