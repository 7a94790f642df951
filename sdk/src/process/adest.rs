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

//! Validation process for signatures with time (AdES-T).
//!
//! Valid signature timestamps bring the best signature time down from the
//! validation time. Failures of the basic validation that a proof of
//! existence could excuse are then checked again at that time.

use std::{collections::BTreeMap, sync::Arc};

use ades_status_tracker::message_codes::*;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use super::{
    basic::is_forwarded,
    checks::{Check, ConstraintSequence, Stop},
    timestamp_building_blocks, BuildingBlocks, RunContext,
};
use crate::{
    conclusion::{Conclusion, Indication, SubIndication},
    policy::LevelConstraint,
    signature::SignatureInput,
    token::{TimestampToken, TimestampType, Token, TokenId},
};

/// Outcome of validating one timestamp of a signature.
#[derive(Clone, Debug, Serialize)]
pub struct TimestampValidation {
    pub id: TokenId,
    pub kind: TimestampType,
    pub generation_time: DateTime<Utc>,
    pub imprint_intact: bool,

    /// `None` when the message imprint could not be verified.
    pub bbb: Option<BuildingBlocks>,
}

impl TimestampValidation {
    pub fn is_valid(&self) -> bool {
        self.bbb.as_ref().is_some_and(|b| b.conclusion.is_valid())
    }
}

/// Validate `ts` unless its message imprint is broken.
pub(crate) fn validate_timestamp(
    ctx: &RunContext<'_>,
    ts: &TimestampToken,
    location: &str,
) -> TimestampValidation {
    let imprint_intact = ts.check_message_imprint().intact;
    let location = format!("{location}/{}", ts.abbreviation());

    TimestampValidation {
        id: ts.id(),
        kind: ts.kind(),
        generation_time: ts.generation_time(),
        imprint_intact,
        bbb: imprint_intact.then(|| timestamp_building_blocks(ctx, ts, &location)),
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct AdesTResult {
    pub conclusion: Conclusion,
    pub best_signature_time: DateTime<Utc>,
    pub timestamps: Vec<TimestampValidation>,
}

/// The best signature time never moves later.
pub fn update_best_signature_time(
    best: DateTime<Utc>,
    generation_time: DateTime<Utc>,
) -> DateTime<Utc> {
    best.min(generation_time)
}

/// Run the AdES-T process on top of the basic validation result.
pub fn adest_validation(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    bbb: &BuildingBlocks,
    basic: &Conclusion,
) -> AdesTResult {
    let location = format!("{}/adest", sig.id);
    let mut best_signature_time = ctx.current_time;

    if !basic.is_valid() && !is_forwarded(basic) {
        return AdesTResult {
            conclusion: Conclusion::relocated(basic, location),
            best_signature_time,
            timestamps: Vec::new(),
        };
    }

    let mut seq = ConstraintSequence::new(location.clone(), "adest");
    let mut timestamps = Vec::new();
    let mut signature_timestamp_found = false;

    let timestamp_location = format!("{location}/timestamps");
    for ts in sig.timestamps.iter().filter(|t| t.kind().is_signature_level()) {
        let validation = validate_timestamp(ctx, ts, &timestamp_location);

        if !validation.imprint_intact {
            seq.warn(
                Check::new(ADEST_IMIVC, "Is the message imprint verification conclusive?")
                    .attribute("timestamp", ts.abbreviation()),
            );
            timestamps.push(validation);
            continue;
        }

        let valid = validation.is_valid();
        let check = Check::new(
            ADEST_ITVPC,
            "Is the timestamp validation process conclusive?",
        )
        .attribute("timestamp", ts.abbreviation());
        if valid {
            seq.inform(check);
        } else {
            seq.warn(check);
        }

        if valid && ts.kind() == TimestampType::Signature {
            signature_timestamp_found = true;
            best_signature_time =
                update_best_signature_time(best_signature_time, ts.generation_time());
        }

        timestamps.push(validation);
    }

    debug!("{}: best signature time {best_signature_time}", sig.id);

    let _ = reconcile(
        ctx,
        sig,
        bbb,
        best_signature_time,
        signature_timestamp_found,
        &mut seq,
    );

    AdesTResult {
        conclusion: seq.conclude(),
        best_signature_time,
        timestamps,
    }
}

fn reconcile(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    bbb: &BuildingBlocks,
    best: DateTime<Utc>,
    signature_timestamp_found: bool,
    seq: &mut ConstraintSequence,
) -> Result<(), Stop> {
    let order = order_violation(&sig.timestamps);
    let mut check = Check::new(
        ADEST_ROTVPIIC,
        "Are the timestamps in the right order?",
    )
    .on_failure(Indication::Invalid, SubIndication::TimestampOrderFailure);
    if let Some((earlier, later)) = &order {
        check = check
            .attribute("timestamp", earlier)
            .attribute("precedes", later);
    }
    seq.check(
        ctx.policy.timestamp.coherence_order.as_ref(),
        check,
        || order.is_none(),
    )?;

    for stage in [&bbb.sav, &bbb.xcv].into_iter().flatten() {
        if stage.is_valid() {
            continue;
        }
        if !is_forwarded(stage) {
            return Err(seq.keep(stage));
        }

        match stage.sub_indication {
            Some(SubIndication::RevokedNoPoe) => {
                let mut check = Check::new(
                    ADEST_IRTPTBST,
                    "Is the revocation time posterior to the best signature time?",
                )
                .on_failure(Indication::Indeterminate, SubIndication::RevokedNoPoe)
                .attribute("best_signature_time", best);
                if let Some(revoked) = bbb.revocation_time {
                    check = check.attribute("revocation_time", revoked);
                }

                seq.check(Some(&LevelConstraint::FAIL), check, || {
                    bbb.revocation_time.is_some_and(|revoked| best < revoked)
                })?;
            }

            Some(SubIndication::OutOfBoundsNoPoe) => {
                let not_before = bbb.signing_certificate.as_ref().map(|c| c.not_before());
                seq.check(
                    Some(&LevelConstraint::FAIL),
                    Check::new(
                        ADEST_IBSVPTADC,
                        "Is the best signature time after the signing certificate issuance?",
                    )
                    .on_failure(Indication::Invalid, SubIndication::NotYetValid)
                    .attribute("best_signature_time", best),
                    || not_before.map_or(true, |issued| best >= issued),
                )?;

                // Expiry is only excused by the long term validation.
                return Err(seq.keep(stage));
            }

            Some(SubIndication::CryptoConstraintsFailureNoPoe) => {
                let mut check = Check::new(
                    ADEST_IAVRBST,
                    "Are the algorithms reliable at the best signature time?",
                )
                .on_failure(
                    Indication::Indeterminate,
                    SubIndication::CryptoConstraintsFailureNoPoe,
                )
                .attribute("best_signature_time", best);
                if let Some(failure) = &bbb.crypto_failure {
                    check = check
                        .attribute("algorithm", failure.usage)
                        .attribute("expired", failure.expired);
                }

                seq.check(Some(&LevelConstraint::FAIL), check, || {
                    bbb.crypto_failure
                        .as_ref()
                        .is_some_and(|f| f.is_reliable_at(best))
                })?;
            }

            _ => {}
        }
    }

    let delay = ctx.policy.timestamp.timestamp_delay.as_ref();
    if let (Some(delay), Some(signing_time), true) =
        (delay, sig.signing_time, signature_timestamp_found)
    {
        seq.check(
            Some(delay),
            Check::new(
                ADEST_ISTPTDABST,
                "Is the best signature time within the allowed delay after the signing time?",
            )
            .on_failure(Indication::Invalid, SubIndication::SigConstraintsFailure)
            .attribute("signing_time", signing_time)
            .attribute("best_signature_time", best),
            || best <= signing_time + delay.duration(),
        )?;
    }

    Ok(())
}

/// Find two timestamps out of the required order: content, signature,
/// validation data, archive. Only timestamps with an intact message imprint
/// take part. Returns the abbreviations of the offending pair.
fn order_violation(timestamps: &[Arc<TimestampToken>]) -> Option<(String, String)> {
    // Earliest and latest timestamp of each rank.
    let mut bounds: BTreeMap<u8, (&TimestampToken, &TimestampToken)> = BTreeMap::new();

    for ts in timestamps.iter().filter(|t| t.check_message_imprint().intact) {
        bounds
            .entry(ts.kind().order_rank())
            .and_modify(|(earliest, latest)| {
                if ts.generation_time() < earliest.generation_time() {
                    *earliest = ts;
                }
                if ts.generation_time() > latest.generation_time() {
                    *latest = ts;
                }
            })
            .or_insert((ts, ts));
    }

    let ranks: Vec<_> = bounds.values().collect();
    ranks.iter().enumerate().find_map(|(i, (_, latest))| {
        ranks[i + 1..]
            .iter()
            .find(|(earliest, _)| latest.generation_time() > earliest.generation_time())
            .map(|(earliest, _)| (latest.abbreviation(), earliest.abbreviation()))
    })
}
