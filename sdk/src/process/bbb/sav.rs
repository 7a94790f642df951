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

use std::collections::BTreeSet;

use ades_status_tracker::message_codes::*;

use super::{key_size, CryptoFailure};
use crate::{
    conclusion::{Conclusion, Indication, SubIndication},
    policy::CryptoUsage,
    process::{
        checks::{Check, ConstraintSequence, Stop},
        RunContext,
    },
    signature::SignatureInput,
    token::CertificateToken,
};

pub(super) struct Acceptance {
    pub conclusion: Conclusion,
    pub usage: CryptoUsage,
    pub crypto_failure: Option<CryptoFailure>,
}

/// Check the signature attributes required by the policy and the
/// reliability of its algorithms at the validation time.
pub(super) fn accept_signature(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    cert: &CertificateToken,
    location: String,
) -> Acceptance {
    let algorithm = sig.signature_value.algorithm;
    let usage = CryptoUsage::signature(
        algorithm.digest_algorithm(),
        algorithm.encryption_algorithm(),
        key_size(cert),
    );

    let mut seq = ConstraintSequence::new(location, "sav");
    let mut crypto_failure = None;
    let _ = accept(ctx, sig, usage, &mut seq, &mut crypto_failure);

    Acceptance {
        conclusion: seq.conclude(),
        usage,
        crypto_failure,
    }
}

fn accept(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    usage: CryptoUsage,
    seq: &mut ConstraintSequence,
    crypto_failure: &mut Option<CryptoFailure>,
) -> Result<(), Stop> {
    let constraints = &ctx.policy.signature;
    let sig_constraints = |check: Check| {
        check.on_failure(
            Indication::Indeterminate,
            SubIndication::SigConstraintsFailure,
        )
    };

    seq.check(
        constraints.signing_time_present.as_ref(),
        sig_constraints(Check::new(BBB_SAV_ISQPSTP, "Is the signing time present?")),
        || sig.signing_time.is_some(),
    )?;

    seq.check(
        constraints.content_type_present.as_ref(),
        sig_constraints(Check::new(BBB_SAV_ISQPCTP, "Is the content type present?")),
        || sig.content_type.is_some(),
    )?;

    seq.check(
        constraints.content_timestamp_present.as_ref(),
        sig_constraints(Check::new(
            BBB_SAV_ISQPCTSIP,
            "Is the content timestamp present?",
        )),
        || sig.timestamps.iter().any(|t| t.kind().is_content_timestamp()),
    )?;

    let commitment = constraints.commitment_type.as_ref();
    seq.check(
        commitment,
        sig_constraints(Check::new(
            BBB_SAV_ISQPXTIP,
            "Is the commitment type indication acceptable?",
        )),
        || commitment.is_some_and(|c| c.accepts_any(&sig.commitment_types)),
    )?;

    let table = ctx.policy.signature_cryptographic();
    seq.check_crypto(
        table,
        usage,
        ctx.current_time,
        Check::new(
            BBB_SAV_ASCCM,
            "Are the signature algorithms reliable at validation time?",
        ),
        crypto_failure,
    )?;

    let digests: BTreeSet<_> = sig.references.iter().map(|r| r.digest.algorithm).collect();
    for digest in digests {
        seq.check_crypto(
            table,
            CryptoUsage::digest(digest),
            ctx.current_time,
            Check::new(
                BBB_SAV_DMDCCM,
                "Are the reference digest algorithms reliable at validation time?",
            ),
            crypto_failure,
        )?;
    }

    Ok(())
}
