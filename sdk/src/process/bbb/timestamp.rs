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

//! Building blocks applied to a timestamp token, which is itself a
//! signature over its message imprint.

use std::sync::Arc;

use ades_status_tracker::message_codes::*;

use super::{key_size, timestamp_signer, xcv, BuildingBlocks, CryptoFailure};
use crate::{
    conclusion::{Indication, SubIndication},
    policy::{CryptoUsage, LevelConstraint},
    process::{
        checks::{Check, ConstraintSequence, Stop},
        RunContext,
    },
    token::{CertificateToken, TimestampToken, Token},
};

/// Run the building blocks for `ts`. Reports are placed under `location`.
pub fn timestamp_building_blocks(
    ctx: &RunContext<'_>,
    ts: &TimestampToken,
    location: &str,
) -> BuildingBlocks {
    let mut bbb = BuildingBlocks::new(location);

    let mut seq = ConstraintSequence::new(format!("{location}/isc"), "timestamp_isc");
    let signer = identify_signer(ts, &mut seq).ok();
    let isc = seq.conclude();
    let proceed = bbb.merge(&isc);
    bbb.isc = Some(isc);
    let Some(signer) = signer.filter(|_| proceed) else {
        return bbb;
    };
    bbb.signing_certificate = Some(Arc::clone(&signer));

    let mut seq = ConstraintSequence::new(format!("{location}/cv"), "timestamp_cv");
    let _ = verify(ctx, ts, &signer, &mut seq);
    let cv = seq.conclude();
    let proceed = bbb.merge(&cv);
    bbb.cv = Some(cv);
    if !proceed {
        return bbb;
    }

    let usage = CryptoUsage::signature(
        ts.signature().algorithm.digest_algorithm(),
        ts.signature().algorithm.encryption_algorithm(),
        key_size(&signer),
    );
    let mut seq = ConstraintSequence::new(format!("{location}/sav"), "timestamp_sav");
    let mut crypto_failure = None;
    let _ = accept(ctx, ts, usage, &mut seq, &mut crypto_failure);
    let sav = seq.conclude();
    bbb.signature_usage = Some(usage);
    bbb.crypto_failure = crypto_failure;
    let proceed = bbb.merge(&sav);
    bbb.sav = Some(sav);
    if !proceed {
        return bbb;
    }

    let xcv = xcv::validate_chain(
        ctx,
        &signer,
        &ctx.policy.timestamp_certificate,
        ctx.current_time,
        xcv::Mode::Current,
        format!("{location}/xcv"),
    );
    bbb.revocation_time = xcv.revocation_time;
    if bbb.crypto_failure.is_none() {
        bbb.crypto_failure = xcv.crypto_failure;
    }
    bbb.merge(&xcv.conclusion);
    bbb.xcv = Some(xcv.conclusion);

    bbb
}

fn identify_signer(
    ts: &TimestampToken,
    seq: &mut ConstraintSequence,
) -> Result<Arc<CertificateToken>, Stop> {
    let signer = timestamp_signer(ts);

    seq.check(
        Some(&LevelConstraint::FAIL),
        Check::new(
            BBB_ICS_ISCI,
            "Is there an identified candidate for the signing certificate?",
        )
        .on_failure(
            Indication::Indeterminate,
            SubIndication::NoSigningCertificateFound,
        )
        .attribute("timestamp", ts.abbreviation())
        .attribute("signer", ts.issuer_principal()),
        || signer.is_some(),
    )?;

    signer.ok_or(Stop)
}

fn verify(
    ctx: &RunContext<'_>,
    ts: &TimestampToken,
    signer: &CertificateToken,
    seq: &mut ConstraintSequence,
) -> Result<(), Stop> {
    let constraints = &ctx.policy.timestamp;
    let imprint = ts.check_message_imprint();

    seq.check(
        constraints.message_imprint_intact.as_ref(),
        Check::new(
            BBB_CV_TSP_IRDOF,
            "Is the timestamped data object found?",
        )
        .on_failure(Indication::Indeterminate, SubIndication::SignedDataNotFound)
        .attribute("timestamp", ts.abbreviation()),
        || imprint.found,
    )?;

    seq.check(
        constraints.message_imprint_intact.as_ref(),
        Check::new(
            BBB_CV_TSP_IRDOI,
            "Is the timestamp message imprint intact?",
        )
        .on_failure(Indication::Invalid, SubIndication::HashFailure)
        .attribute("timestamp", ts.abbreviation()),
        || imprint.intact,
    )?;

    seq.check(
        constraints.signature_intact.as_ref(),
        Check::new(BBB_CV_ISI, "Is the timestamp signature intact?")
            .on_failure(Indication::Invalid, SubIndication::SigCryptoFailure)
            .attribute("timestamp", ts.abbreviation()),
        || ts.is_signed_by(signer),
    )
}

fn accept(
    ctx: &RunContext<'_>,
    ts: &TimestampToken,
    usage: CryptoUsage,
    seq: &mut ConstraintSequence,
    crypto_failure: &mut Option<CryptoFailure>,
) -> Result<(), Stop> {
    let table = ctx.policy.timestamp_cryptographic();

    seq.check_crypto(
        table,
        usage,
        ctx.current_time,
        Check::new(
            BBB_SAV_ASCCM,
            "Are the timestamp signature algorithms reliable at validation time?",
        ),
        crypto_failure,
    )?;

    seq.check_crypto(
        table,
        CryptoUsage::digest(ts.message_imprint().algorithm),
        ctx.current_time,
        Check::new(
            BBB_SAV_DMDCCM,
            "Is the message imprint digest algorithm reliable at validation time?",
        ),
        crypto_failure,
    )
}
