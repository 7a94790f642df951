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

use ades_status_tracker::message_codes::{PSV_IPCVC, PSV_IPSVC};
use chrono::{DateTime, Utc};

use super::{
    bbb::xcv,
    checks::{Check, ConstraintSequence, Stop},
    BuildingBlocks, RunContext,
};
use crate::{
    conclusion::{Conclusion, Indication, SubIndication},
    policy::LevelConstraint,
    token::Token,
};

/// Validate the signing certificate chain and the signature algorithms as of
/// `control_time`, the earliest proof of existence of the signature.
///
/// `current` is the verdict at the current time. It is kept when the
/// building blocks failed before certificate validation, since those
/// checks do not depend on time.
pub fn past_signature_validation(
    ctx: &RunContext<'_>,
    bbb: &BuildingBlocks,
    current: &Conclusion,
    control_time: DateTime<Utc>,
    location: &str,
) -> Conclusion {
    let mut seq = ConstraintSequence::new(location, "psv");
    let _ = validate(ctx, bbb, current, control_time, location, &mut seq);
    seq.conclude()
}

fn validate(
    ctx: &RunContext<'_>,
    bbb: &BuildingBlocks,
    current: &Conclusion,
    control_time: DateTime<Utc>,
    location: &str,
    seq: &mut ConstraintSequence,
) -> Result<(), Stop> {
    let accepted = bbb
        .sav
        .as_ref()
        .is_some_and(|sav| sav.is_valid() || sav.is_rescuable());
    let Some(cert) = bbb.signing_certificate.as_ref().filter(|_| accepted) else {
        return Err(seq.keep(current));
    };

    let chain = xcv::validate_chain(
        ctx,
        cert,
        &ctx.policy.signing_certificate,
        control_time,
        xcv::Mode::Past,
        format!("{location}/xcv"),
    );
    seq.absorb(&chain.conclusion);

    let mut check = Check::new(
        PSV_IPCVC,
        "Is the past certificate validation conclusive?",
    )
    .attribute("certificate", cert.abbreviation())
    .attribute("control_time", control_time);
    if let Some(sub) = chain.conclusion.sub_indication {
        check = check.on_failure(chain.conclusion.indication, sub);
    }
    seq.check(Some(&LevelConstraint::FAIL), check, || {
        chain.conclusion.is_valid()
    })?;

    let table = ctx.policy.signature_cryptographic();
    let usage = bbb.signature_usage;
    let mut check = Check::new(
        PSV_IPSVC,
        "Are the signature algorithms reliable at the control time?",
    )
    .on_failure(
        Indication::Indeterminate,
        SubIndication::CryptoConstraintsFailureNoPoe,
    )
    .attribute("control_time", control_time);
    if let Some(usage) = usage {
        check = check.attribute("algorithm", usage);
    }
    seq.check(Some(&LevelConstraint::FAIL), check, || {
        usage.is_some_and(|u| table.check(&u, control_time).is_acceptable())
            && bbb
                .crypto_failure
                .as_ref()
                .map_or(true, |f| f.is_reliable_at(control_time))
    })
}
