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

//! Validation process for signatures providing long term availability and
//! integrity of validation material.
//!
//! Timestamps are processed layer by layer, archive timestamps first and
//! the newest of each layer first. Every usable timestamp gives a proof of
//! existence to the objects it covers; the signature is then validated
//! again at its earliest proof of existence.

use std::cmp::Reverse;

use ades_status_tracker::message_codes::*;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use super::{
    adest::{validate_timestamp, AdesTResult, TimestampValidation},
    bbb::xcv,
    checks::{Check, ConstraintSequence},
    past_signature_validation, BuildingBlocks, RunContext,
};
use crate::{
    conclusion::{Conclusion, Indication},
    policy::{Level, LevelConstraint},
    signature::SignatureInput,
    token::{TimestampToken, TimestampType, Token},
};

const LAYERS: [TimestampType; 4] = [
    TimestampType::Archive,
    TimestampType::ValidationDataRefsOnly,
    TimestampType::ValidationData,
    TimestampType::Signature,
];

#[derive(Clone, Debug, Serialize)]
pub struct LongTermResult {
    pub conclusion: Conclusion,
    pub timestamps: Vec<TimestampValidation>,

    /// Earliest proof of existence of the signature.
    pub poe_time: Option<DateTime<Utc>>,
    pub past_signature: Option<Conclusion>,
}

/// Run the long term validation process on top of the AdES-T result.
///
/// VALID and INVALID verdicts are returned as is; every INDETERMINATE one
/// is reconsidered at the earliest proof of existence of the signature.
pub fn long_term_validation(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    bbb: &BuildingBlocks,
    adest: &AdesTResult,
) -> LongTermResult {
    let location = format!("{}/ltv", sig.id);

    if adest.conclusion.is_valid() || adest.conclusion.indication == Indication::Invalid {
        return LongTermResult {
            conclusion: Conclusion::relocated(&adest.conclusion, location),
            timestamps: Vec::new(),
            poe_time: None,
            past_signature: None,
        };
    }

    let mut seq = ConstraintSequence::new(location.clone(), "ltv");
    let signature_id = sig.token_id();
    let timestamp_location = format!("{location}/timestamps");
    let warn = LevelConstraint::new(Level::Warn);
    let mut timestamps = Vec::new();

    for layer in LAYERS {
        let mut layer: Vec<_> = sig.timestamps.iter().filter(|t| t.kind() == layer).collect();
        layer.sort_by_key(|t| Reverse(t.generation_time()));

        for ts in layer {
            let validation = adest
                .timestamps
                .iter()
                .find(|v| v.id == ts.id())
                .cloned()
                .unwrap_or_else(|| validate_timestamp(ctx, ts, &timestamp_location));

            if !validation.imprint_intact {
                seq.warn(
                    Check::new(LTV_IMIVC, "Is the message imprint verification conclusive?")
                        .attribute("timestamp", ts.abbreviation()),
                );
                timestamps.push(validation);
                continue;
            }

            let usable = validation.is_valid()
                || validate_in_past(ctx, ts, &validation, &timestamp_location, &mut seq);

            let _ = seq.check(
                Some(&warn),
                Check::new(
                    LTV_ITVPC,
                    "Is the timestamp validation process conclusive?",
                )
                .attribute("timestamp", ts.abbreviation()),
                || usable,
            );

            if usable {
                let digest = ts.message_imprint().algorithm;
                let reliable = ctx
                    .policy
                    .timestamp_cryptographic()
                    .is_reliable_at(digest, ts.generation_time());

                let _ = seq.check(
                    Some(&warn),
                    Check::new(
                        LTV_IDARGT,
                        "Is the timestamp digest algorithm reliable at generation time?",
                    )
                    .attribute("timestamp", ts.abbreviation())
                    .attribute("algorithm", digest),
                    || reliable,
                );

                if reliable {
                    ctx.poe.extract(ts, Some(signature_id));
                }
            }

            timestamps.push(validation);
        }
    }

    let Some(poe_time) = ctx.poe.lowest(&signature_id) else {
        let mut check = Check::new(
            LTV_ABSV,
            "Is a proof of existence available for the signature?",
        );
        if let Some(sub) = adest.conclusion.sub_indication {
            check = check.on_failure(adest.conclusion.indication, sub);
        }
        let _ = seq.check(Some(&LevelConstraint::FAIL), check, || false);

        return LongTermResult {
            conclusion: seq.conclude(),
            timestamps,
            poe_time: None,
            past_signature: None,
        };
    };

    debug!("{}: earliest proof of existence {poe_time}", sig.id);

    let past = past_signature_validation(
        ctx,
        bbb,
        &adest.conclusion,
        poe_time,
        &format!("{location}/psv"),
    );

    seq.absorb(&past);
    if !past.is_valid() {
        let _ = seq.keep(&past);
    }

    LongTermResult {
        conclusion: seq.conclude(),
        timestamps,
        poe_time: Some(poe_time),
        past_signature: Some(past),
    }
}

/// Validate the chain of a timestamp that failed at the current time, as of
/// the earliest proof of existence of the timestamp itself.
fn validate_in_past(
    ctx: &RunContext<'_>,
    ts: &TimestampToken,
    validation: &TimestampValidation,
    location: &str,
    seq: &mut ConstraintSequence,
) -> bool {
    let Some(bbb) = validation.bbb.as_ref().filter(|b| b.conclusion.is_rescuable()) else {
        return false;
    };
    let (Some(signer), Some(control_time)) =
        (bbb.signing_certificate.as_ref(), ctx.poe.lowest(&ts.id()))
    else {
        return false;
    };

    let chain = xcv::validate_chain(
        ctx,
        signer,
        &ctx.policy.timestamp_certificate,
        control_time,
        xcv::Mode::Past,
        format!("{location}/{}/psv", ts.abbreviation()),
    );
    seq.absorb(&chain.conclusion);

    chain.conclusion.is_valid()
        && bbb
            .crypto_failure
            .as_ref()
            .map_or(true, |f| f.is_reliable_at(control_time))
}
