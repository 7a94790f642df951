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

//! Shared fixtures: a generated PKI and builders for signatures,
//! timestamps and CRL entries.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use ades_validation::{
    crypto::{hash::DigestAlgorithm, raw_signature::SignatureAlgorithm},
    http::{DataLoader, DataLoaderError},
    settings::Settings,
    signature::{DataReference, SignatureValue},
    token::{
        CertificateToken, Digest, ReferenceCategory, RevocationData, RevocationKind,
        RevocationOrigin, RevocationReason, RevocationStatus, RevocationToken, TimestampData,
        TimestampToken, TimestampType, TimestampedReference, Token, TokenId, TokenSignature,
    },
    SignatureInput,
};
use chrono::{DateTime, TimeZone, Utc};

#[path = "../../src/tests/pki.rs"]
pub mod pki;

use pki::{CertSpec, Issued};

pub const SIGNED_DOCUMENT: &[u8] = b"<Invoice><Total>42.00</Total></Invoice>";

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A root CA issuing one signer and one time-stamping unit.
pub struct TestPki {
    pub root: Issued,
    pub signer: Issued,
    pub tsa: Issued,
}

impl TestPki {
    pub fn new() -> Self {
        Self::with_signer(CertSpec::leaf("Signer"))
    }

    pub fn with_signer(signer: CertSpec) -> Self {
        let root = pki::self_signed(&CertSpec::ca("Test Root CA"));
        let signer = pki::issue(&signer, &root);
        let tsa = pki::issue(&CertSpec::tsa("Test TSA"), &root);

        Self { root, signer, tsa }
    }

    /// Offline settings trusting the root of this PKI.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.trust.trust_anchors = Some(self.root.cert.pem());
        settings.network.enabled = false;
        settings.resolver.fetch_aia = false;
        settings.resolver.online_revocation = false;
        settings
    }

    /// A signature by the signer over [`SIGNED_DOCUMENT`], shipping the
    /// signer certificate and a CRL entry stating it is not revoked.
    pub fn signature(&self, id: &str) -> SignatureInput {
        let signed_data = signed_attributes(id);
        let value = SignatureValue {
            algorithm: SignatureAlgorithm::EcdsaSha256,
            value: self.signer.sign(&signed_data),
            signed_data,
        };

        SignatureInput::new(id, value)
            .with_reference(DataReference {
                uri: "#invoice".to_owned(),
                digest: Digest::of(DigestAlgorithm::Sha256, SIGNED_DOCUMENT),
                content: Some(SIGNED_DOCUMENT.to_vec()),
            })
            .with_certificate(self.signer.der.clone())
            .with_signing_certificate_reference(Digest::of(
                DigestAlgorithm::Sha256,
                &self.signer.der,
            ))
            .with_signing_time(at(2019, 6, 1))
            .with_revocation(self.crl_entry(&self.signer, Status::Good, at(2019, 1, 1)))
    }

    /// A CRL entry about `cert`, signed by the root.
    pub fn crl_entry(
        &self,
        cert: &Issued,
        status: Status,
        this_update: DateTime<Utc>,
    ) -> Arc<RevocationToken> {
        let target = CertificateToken::from_der(&cert.der).unwrap();
        let root = CertificateToken::from_der(&self.root.der).unwrap();

        let (status, revocation_time, reason) = match status {
            Status::Good => (RevocationStatus::Good, None, None),
            Status::RevokedAt(time) => (
                RevocationStatus::Revoked,
                Some(time),
                Some(RevocationReason::KeyCompromise),
            ),
        };

        let tbs = format!(
            "crl|{}|{status:?}|{revocation_time:?}|{this_update}",
            target.id()
        )
        .into_bytes();

        Arc::new(RevocationToken::new(RevocationData {
            kind: RevocationKind::Crl,
            origin: RevocationOrigin::Embedded,
            status,
            revocation_time,
            reason,
            production_time: this_update,
            next_update: Some(this_update + chrono::Duration::days(30)),
            certificate_issuer: root.subject().clone(),
            certificate_serial: target.serial().to_vec(),
            issuer: root.subject().clone(),
            signature: TokenSignature {
                algorithm: SignatureAlgorithm::EcdsaSha256,
                value: self.root.sign(&tbs),
                signed_content: tbs.clone(),
            },
            encoded: tbs,
            certificates: Vec::new(),
        }))
    }

    /// A timestamp of `kind` over `timestamped`, issued by the TSA.
    pub fn timestamp(&self, spec: TimestampSpec<'_>) -> Arc<TimestampToken> {
        self.timestamp_by(&self.tsa, spec)
    }

    /// A timestamp issued by another time-stamping unit of this PKI.
    pub fn timestamp_by(&self, unit: &Issued, spec: TimestampSpec<'_>) -> Arc<TimestampToken> {
        let tsa = CertificateToken::from_der(&unit.der).unwrap();

        let signed_attributes = format!(
            "tst|{:?}|{}|{}",
            spec.kind,
            spec.generation_time,
            const_hex::encode(spec.timestamped)
        )
        .into_bytes();

        let imprint = Digest::of(spec.digest, spec.timestamped);
        let timestamped_data = if spec.tampered {
            b"tampered".to_vec()
        } else {
            spec.timestamped.to_vec()
        };

        Arc::new(TimestampToken::new(TimestampData {
            kind: spec.kind,
            generation_time: spec.generation_time,
            message_imprint: imprint,
            timestamped_data: Some(timestamped_data),
            canonicalization_method: None,
            references: spec.references,
            certificates: vec![unit.der.clone()],
            signer: tsa.subject().clone(),
            signature: TokenSignature {
                algorithm: SignatureAlgorithm::EcdsaSha256,
                value: unit.sign(&signed_attributes),
                signed_content: signed_attributes.clone(),
            },
            encoded: signed_attributes,
        }))
    }
}

impl Default for TestPki {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Status {
    Good,
    RevokedAt(DateTime<Utc>),
}

/// What a test timestamp covers.
pub struct TimestampSpec<'a> {
    pub kind: TimestampType,
    pub generation_time: DateTime<Utc>,
    pub timestamped: &'a [u8],
    pub digest: DigestAlgorithm,
    pub references: Vec<TimestampedReference>,
    pub tampered: bool,
}

impl<'a> TimestampSpec<'a> {
    pub fn new(kind: TimestampType, generation_time: DateTime<Utc>, timestamped: &'a [u8]) -> Self {
        Self {
            kind,
            generation_time,
            timestamped,
            digest: DigestAlgorithm::Sha256,
            references: Vec::new(),
            tampered: false,
        }
    }

    /// A signature timestamp over the signature value of `sig`.
    pub fn signature(sig: &'a SignatureInput, generation_time: DateTime<Utc>) -> Self {
        Self::new(
            TimestampType::Signature,
            generation_time,
            &sig.signature_value.value,
        )
        .covering(ReferenceCategory::Signature, sig.token_id())
    }

    pub fn covering(mut self, category: ReferenceCategory, id: TokenId) -> Self {
        self.references.push(TimestampedReference::new(category, id));
        self
    }

    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    pub fn tampered(mut self) -> Self {
        self.tampered = true;
        self
    }
}

fn signed_attributes(id: &str) -> Vec<u8> {
    let digest = Digest::of(DigestAlgorithm::Sha256, SIGNED_DOCUMENT);
    format!("signed-attributes|{id}|{}", const_hex::encode(&digest.value)).into_bytes()
}

/// A [`DataLoader`] that serves fixed content and counts requests.
#[derive(Default)]
pub struct SpyLoader {
    pub responses: Vec<(String, Vec<u8>)>,
    pub calls: AtomicUsize,
}

impl SpyLoader {
    pub fn serving(url: &str, content: Vec<u8>) -> Self {
        Self {
            responses: vec![(url.to_owned(), content)],
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataLoader for SpyLoader {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DataLoaderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| DataLoaderError::Status {
                uri: url.to_owned(),
                status: 404,
            })
    }
}

/// A [`DataLoader`] that never answers in time.
pub struct StalledLoader(pub std::time::Duration);

impl DataLoader for StalledLoader {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DataLoaderError> {
        std::thread::sleep(self.0);
        Err(DataLoaderError::Offline {
            uri: url.to_owned(),
        })
    }
}
