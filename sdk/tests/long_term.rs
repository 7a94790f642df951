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

//! AdES-T and long term validation through the document validator.

mod common;

use std::sync::Arc;

use ades_validation::{
    crypto::hash::DigestAlgorithm,
    policy::{CryptographicConstraint, Level},
    settings::Settings,
    status_tracker::message_codes::*,
    token::{Digest, ReferenceCategory, TimestampToken, TimestampType, Token},
    DocumentValidator, Indication, SignatureInput, SignatureReport, SubIndication,
};
use chrono::{DateTime, Utc};
use common::{
    at,
    pki::{self, CertSpec},
    Status, TestPki, TimestampSpec, SIGNED_DOCUMENT,
};

fn validate(pki: &TestPki, sig: SignatureInput) -> SignatureReport {
    validate_with(pki.settings(), sig)
}

fn validate_with(settings: Settings, sig: SignatureInput) -> SignatureReport {
    let report = DocumentValidator::new(settings)
        .unwrap()
        .with_validation_time(at(2020, 1, 1))
        .validate(&[sig])
        .unwrap();

    report.signatures.into_iter().next().unwrap()
}

fn revoked_signature(pki: &TestPki, timestamped_at: DateTime<Utc>) -> SignatureReport {
    let sig = pki
        .signature("S-1")
        .with_revocation(pki.crl_entry(
            &pki.signer,
            Status::RevokedAt(at(2019, 9, 1)),
            at(2019, 10, 1),
        ));
    let ts = pki.timestamp(TimestampSpec::signature(&sig, timestamped_at));

    validate(pki, sig.with_timestamp(ts))
}

#[test]
fn timestamp_before_revocation_rescues_the_signature() {
    let pki = TestPki::new();
    let report = revoked_signature(&pki, at(2019, 6, 2));

    assert!(report.basic.is(
        Indication::Indeterminate,
        Some(SubIndication::RevokedNoPoe)
    ));
    assert!(report.adest.is_valid(), "{:?}", report.adest);
    assert!(report.adest.has_message(ADEST_IRTPTBST));
    assert_eq!(report.best_signature_time, at(2019, 6, 2));
    assert!(report.is_valid());
}

#[test]
fn timestamp_after_revocation_does_not_rescue() {
    let pki = TestPki::new();
    let report = revoked_signature(&pki, at(2019, 12, 1));

    assert!(report.adest.is(
        Indication::Indeterminate,
        Some(SubIndication::RevokedNoPoe)
    ));
    assert!(report.adest.has_error(ADEST_IRTPTBST));

    // The signature timestamp gives a proof of existence, but the signer
    // was already revoked by then.
    assert_eq!(report.poe_time, Some(at(2019, 12, 1)));
    assert!(!report.past_signature.as_ref().unwrap().is_valid());
    assert_eq!(report.indication, Indication::Indeterminate);
    assert_eq!(report.sub_indication, Some(SubIndication::RevokedNoPoe));
}

#[test]
fn archive_timestamp_before_signature_timestamp_is_out_of_order() {
    let pki = TestPki::new();
    let sig = pki.signature("S-1");

    let signature_ts = pki.timestamp(TimestampSpec::signature(&sig, at(2019, 6, 2)));
    let archive_ts = pki.timestamp(
        TimestampSpec::new(TimestampType::Archive, at(2019, 3, 1), b"archived state")
            .covering(ReferenceCategory::Timestamp, signature_ts.id()),
    );

    let report = validate(&pki, sig.with_timestamp(signature_ts).with_timestamp(archive_ts));

    assert!(report.adest.has_error(ADEST_ROTVPIIC));
    assert!(report.ltv.is(
        Indication::Invalid,
        Some(SubIndication::TimestampOrderFailure)
    ));
    assert_eq!(report.indication, Indication::Invalid);
}

fn expired_signer() -> TestPki {
    TestPki::with_signer(CertSpec::leaf("Signer").valid_between(2000, 2010))
}

#[test]
fn broken_digest_gives_no_proof_of_existence() {
    let pki = expired_signer();
    let sig = pki.signature("S-1");

    let ts = pki.timestamp(
        TimestampSpec::new(
            TimestampType::ValidationData,
            at(2015, 1, 1),
            &sig.signature_value.value,
        )
        .with_digest(DigestAlgorithm::Sha1),
    );
    let report = validate(&pki, sig.with_timestamp(ts));

    assert!(report.adest.is(
        Indication::Indeterminate,
        Some(SubIndication::OutOfBoundsNoPoe)
    ));
    assert!(report.ltv.has_error(LTV_ABSV));
    assert!(report.ltv.has_message(LTV_ITVPC));
    assert_eq!(report.poe_time, None);
    assert!(report.past_signature.is_none());
    assert_eq!(report.sub_indication, Some(SubIndication::OutOfBoundsNoPoe));
}

#[test]
fn validation_data_timestamp_before_expiry_gives_valid() {
    let pki = expired_signer();
    let sig = pki.signature("S-1");

    let ts = pki.timestamp(TimestampSpec::new(
        TimestampType::ValidationData,
        at(2009, 6, 1),
        &sig.signature_value.value,
    ));
    let report = validate(&pki, sig.with_timestamp(ts));

    assert!(report.adest.is(
        Indication::Indeterminate,
        Some(SubIndication::OutOfBoundsNoPoe)
    ));
    assert_eq!(report.poe_time, Some(at(2009, 6, 1)));
    assert!(report.past_signature.as_ref().unwrap().is_valid());
    assert!(report.ltv.has_message(LTV_IDARGT));
    assert!(report.is_valid(), "{}", serde_json::to_string_pretty(&report).unwrap());
}

#[test]
fn broken_message_imprint_is_skipped() {
    let pki = expired_signer();
    let sig = pki.signature("S-1");

    let ts = pki.timestamp(
        TimestampSpec::new(
            TimestampType::ValidationData,
            at(2009, 6, 1),
            &sig.signature_value.value,
        )
        .tampered(),
    );
    let report = validate(&pki, sig.with_timestamp(ts));

    assert!(report
        .ltv
        .warnings()
        .any(|w| w.message_id.as_deref() == Some(LTV_IMIVC)));
    assert!(report.ltv.has_error(LTV_ABSV));
    assert!(report.timestamps[0].bbb.is_none());
    assert!(!report.is_valid());
}

#[test]
fn signing_time_far_before_timestamp_breaks_the_delay() {
    let pki = TestPki::new();
    let mut settings = pki.settings();
    settings
        .update_from_str(
            r#"
            [policy.timestamp.timestamp_delay]
            level = "FAIL"
            value = 1
            unit = "DAYS"
        "#,
            "toml",
        )
        .unwrap();

    let sig = pki.signature("S-1");
    let ts = pki.timestamp(TimestampSpec::signature(&sig, at(2019, 7, 1)));

    let report = DocumentValidator::new(settings)
        .unwrap()
        .with_validation_time(at(2020, 1, 1))
        .validate(&[sig.with_timestamp(ts)])
        .unwrap();
    let report = &report.signatures[0];

    assert!(report.adest.has_error(ADEST_ISTPTDABST));
    assert!(report.adest.is(
        Indication::Invalid,
        Some(SubIndication::SigConstraintsFailure)
    ));
    assert_eq!(report.indication, Indication::Invalid);
}

#[test]
fn stale_revocation_data_is_excused_by_an_archive_timestamp() {
    let pki = TestPki::new();
    let mut settings = pki.settings();
    settings
        .update_from_str(
            r#"
            [policy.signing_certificate.revocation_freshness]
            level = "FAIL"
            value = 0
            unit = "DAYS"
        "#,
            "toml",
        )
        .unwrap();

    // The embedded CRL expired on 2019-01-31.
    let sig = pki.signature("S-1");
    let ts = pki.timestamp(TimestampSpec::new(
        TimestampType::Archive,
        at(2019, 6, 2),
        &sig.signature_value.value,
    ));
    let report = validate_with(settings, sig.with_timestamp(ts));

    assert!(report.bbb.xcv.as_ref().unwrap().has_error(BBB_XCV_RFC));
    assert!(report
        .adest
        .is(Indication::Indeterminate, Some(SubIndication::TryLater)));
    assert_eq!(report.poe_time, Some(at(2019, 6, 2)));
    assert!(report.past_signature.as_ref().unwrap().is_valid());
    assert!(report.ltv.is_valid(), "{:?}", report.ltv);
    assert!(report.is_valid());
}

#[test]
fn failed_past_signature_validation_is_reported_verbatim() {
    let pki = TestPki::new();
    let mut sig = pki.signature("S-1").with_revocation(pki.crl_entry(
        &pki.signer,
        Status::RevokedAt(at(2019, 9, 1)),
        at(2019, 10, 1),
    ));
    sig.references[0].digest = Digest::of(DigestAlgorithm::Sha1, SIGNED_DOCUMENT);

    let ts = pki.timestamp(TimestampSpec::new(
        TimestampType::ValidationData,
        at(2019, 12, 1),
        &sig.signature_value.value,
    ));
    let report = validate(&pki, sig.with_timestamp(ts));

    assert!(report.adest.is(
        Indication::Indeterminate,
        Some(SubIndication::CryptoConstraintsFailureNoPoe)
    ));

    let past = report.past_signature.as_ref().unwrap();
    assert!(past.is(Indication::Indeterminate, Some(SubIndication::RevokedNoPoe)));

    assert_eq!(report.ltv.indication, past.indication);
    assert_eq!(report.ltv.sub_indication, past.sub_indication);
    assert!(report.ltv.has_error(PSV_IPCVC));
    assert!(report.ltv.has_error(BBB_XCV_ISCR));
    assert_eq!(report.sub_indication, Some(SubIndication::RevokedNoPoe));
}

/// A signer and a time-stamping unit that both expired on 2010-01-01,
/// and the old unit's timestamp over `sig` from 2009-06-01.
fn expired_unit_timestamp(pki: &TestPki, sig: &SignatureInput) -> Arc<TimestampToken> {
    let old_unit = pki::issue(&CertSpec::tsa("Old TSA").valid_between(2000, 2010), &pki.root);
    pki.timestamp_by(
        &old_unit,
        TimestampSpec::new(
            TimestampType::ValidationData,
            at(2009, 6, 1),
            &sig.signature_value.value,
        ),
    )
}

#[test]
fn expired_timestamp_is_rescued_by_an_archive_timestamp() {
    let pki = expired_signer();
    let sig = pki.signature("S-1");
    let old_ts = expired_unit_timestamp(&pki, &sig);

    let archive_ts = pki.timestamp(
        TimestampSpec::new(TimestampType::Archive, at(2009, 12, 1), b"archived state")
            .covering(ReferenceCategory::Timestamp, old_ts.id()),
    );
    let old_id = old_ts.id();
    let report = validate(&pki, sig.with_timestamp(old_ts).with_timestamp(archive_ts));

    let old = report.timestamps.iter().find(|t| t.id == old_id).unwrap();
    assert!(old.bbb.as_ref().unwrap().conclusion.is(
        Indication::Indeterminate,
        Some(SubIndication::OutOfBoundsNoPoe)
    ));
    assert!(!report
        .ltv
        .warnings()
        .any(|w| w.message_id.as_deref() == Some(LTV_ITVPC)));

    // Earlier than the archive timestamp, so the old timestamp counted.
    assert_eq!(report.poe_time, Some(at(2009, 6, 1)));
    assert!(report.is_valid(), "{}", serde_json::to_string_pretty(&report).unwrap());
}

#[test]
fn expired_timestamp_without_earlier_proof_contributes_nothing() {
    let pki = expired_signer();
    let sig = pki.signature("S-1");
    let old_ts = expired_unit_timestamp(&pki, &sig);

    let archive_ts = pki.timestamp(
        TimestampSpec::new(TimestampType::Archive, at(2011, 1, 1), b"archived state")
            .covering(ReferenceCategory::Timestamp, old_ts.id()),
    );
    let report = validate(&pki, sig.with_timestamp(old_ts).with_timestamp(archive_ts));

    assert!(report
        .ltv
        .warnings()
        .any(|w| w.message_id.as_deref() == Some(LTV_ITVPC)));

    // Only the archive timestamp gave a proof, after the signer expired.
    assert_eq!(report.poe_time, Some(at(2011, 1, 1)));
    assert!(report.ltv.is(
        Indication::Indeterminate,
        Some(SubIndication::OutOfBoundsNoPoe)
    ));
    assert!(!report.is_valid());
}

#[test]
fn proof_from_a_digest_broken_at_generation_time_is_discarded() {
    let pki = expired_signer();
    let mut settings = pki.settings();
    settings.policy.timestamp.cryptographic = Some(CryptographicConstraint {
        level: Level::Warn,
        ..settings.policy.cryptographic.clone()
    });

    let sig = pki.signature("S-1");
    let ts = pki.timestamp(
        TimestampSpec::new(
            TimestampType::ValidationData,
            at(2015, 1, 1),
            &sig.signature_value.value,
        )
        .with_digest(DigestAlgorithm::Sha1),
    );
    let report = validate_with(settings, sig.with_timestamp(ts));

    // SHA-1 only draws a warning from the timestamp's own building blocks.
    assert!(report.timestamps[0].is_valid());
    assert!(report
        .ltv
        .warnings()
        .any(|w| w.message_id.as_deref() == Some(LTV_IDARGT)));
    assert!(report.ltv.has_error(LTV_ABSV));
    assert_eq!(report.poe_time, None);
    assert!(report.past_signature.is_none());
    assert_eq!(report.sub_indication, Some(SubIndication::OutOfBoundsNoPoe));
}
