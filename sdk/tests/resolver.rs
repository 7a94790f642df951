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

//! Trust resolution: issuer linking, processing counts and timeouts.

mod common;

use std::{sync::Arc, time::Duration};

use ades_validation::{
    http::OfflineDataLoader,
    token::{CertificatePool, SourceTag, Token},
    DocumentValidator, EmbeddedRevocationSource, Error, ResolverConfig, ValidationContext,
};
use common::{
    at,
    pki::{self, CertSpec},
    StalledLoader, TestPki,
};

fn context(pool: &Arc<CertificatePool>) -> ValidationContext {
    ValidationContext::new(
        Arc::clone(pool),
        ResolverConfig::default(),
        Arc::new(OfflineDataLoader),
        Vec::new(),
        Arc::new(EmbeddedRevocationSource::new(Vec::new())),
    )
}

#[test]
fn shared_issuer_is_processed_once() {
    let pki = TestPki::new();

    let pool = Arc::new(CertificatePool::new());
    let root = pool
        .add_trust_anchor(&pki.root.der, SourceTag::TrustedStore, None)
        .unwrap();
    let signer = pool.get_or_create(&pki.signer.der, SourceTag::Signature).unwrap();
    let tsa = pool.get_or_create(&pki.tsa.der, SourceTag::Signature).unwrap();

    let ctx = context(&pool);
    ctx.add_certificate(Arc::clone(&signer));
    ctx.add_certificate(Arc::clone(&tsa));
    ctx.add_revocation(pki.crl_entry(&pki.signer, common::Status::Good, at(2019, 1, 1)));

    let resolved = ctx.validate(at(2020, 1, 1), Duration::from_secs(10)).unwrap();

    assert_eq!(resolved.processing_count(&signer.id()), 1);
    assert_eq!(resolved.processing_count(&tsa.id()), 1);
    assert_eq!(resolved.processing_count(&root.id()), 1);

    let chain = resolved.certificate_chain(&signer);
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1].id(), root.id());

    assert_eq!(resolved.revocations_for(&signer).len(), 1);
    assert!(resolved.latest_revocation(&tsa).is_none());
}

#[test]
fn issuer_is_chosen_by_signature_among_same_subjects() {
    // Both roots are named "Test Root CA".
    let decoy = TestPki::new();
    let pki = TestPki::new();

    let pool = Arc::new(CertificatePool::new());
    pool.add_trust_anchor(&decoy.root.der, SourceTag::TrustedStore, None)
        .unwrap();
    let root = pool
        .add_trust_anchor(&pki.root.der, SourceTag::TrustedStore, None)
        .unwrap();
    let signer = pool.get_or_create(&pki.signer.der, SourceTag::Signature).unwrap();

    let ctx = context(&pool);
    ctx.add_certificate(Arc::clone(&signer));
    let resolved = ctx.validate(at(2020, 1, 1), Duration::from_secs(10)).unwrap();

    let chain = resolved.certificate_chain(&signer);
    assert_eq!(chain.last().unwrap().id(), root.id());
    assert!(chain.last().unwrap().is_trusted());
}

#[test]
fn missing_issuer_is_logged() {
    let pki = TestPki::new();

    let pool = Arc::new(CertificatePool::new());
    let signer = pool.get_or_create(&pki.signer.der, SourceTag::Signature).unwrap();

    let ctx = context(&pool);
    ctx.add_certificate(Arc::clone(&signer));
    let resolved = ctx.validate(at(2020, 1, 1), Duration::from_secs(10)).unwrap();

    assert_eq!(resolved.certificate_chain(&signer).len(), 1);
    assert!(resolved
        .log()
        .has_message(ades_validation::status_tracker::message_codes::CTX_ISSUER_NOT_FOUND));
}

#[test]
fn slow_issuer_download_times_out() {
    let root = pki::self_signed(&CertSpec::ca("Test Root CA"));
    let intermediate = pki::issue(&CertSpec::ca("Test Intermediate CA"), &root);
    let signer = pki::issue(
        &CertSpec::leaf("Signer").with_ca_issuers("http://ca.test/intermediate.cer"),
        &intermediate,
    );
    let tsa = pki::issue(&CertSpec::tsa("Test TSA"), &root);
    let pki = TestPki { root, signer, tsa };

    let mut settings = pki.settings();
    settings.resolver.fetch_aia = true;
    settings.resolver.timeout_ms = 100;

    let validator = DocumentValidator::new(settings)
        .unwrap()
        .with_data_loader(Arc::new(StalledLoader(Duration::from_secs(2))))
        .with_validation_time(at(2020, 1, 1));

    assert!(matches!(
        validator.validate(&[pki.signature("S-1")]),
        Err(Error::Timeout { .. })
    ));
}

#[test]
fn embedded_certificates_join_the_validator_pool() {
    let pki = TestPki::new();
    let validator = DocumentValidator::new(pki.settings())
        .unwrap()
        .with_validation_time(at(2020, 1, 1));
    let pool = Arc::clone(validator.pool());
    assert_eq!(pool.len(), 1);

    let report = validator.validate(&[pki.signature("S-1")]).unwrap();
    assert!(report.signatures[0].is_valid());

    // Signer certificate only; the TSA is not involved.
    assert_eq!(pool.len(), 2);
}
