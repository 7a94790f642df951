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

use ades_status_tracker::message_codes::{BBB_VCI_ISPA, BBB_VCI_ISPK, BBB_VCI_ISPM};

use crate::{
    conclusion::{Conclusion, Indication, SubIndication},
    process::{
        checks::{Check, ConstraintSequence, Stop},
        RunContext,
    },
    signature::SignatureInput,
};

const ANY_POLICY: &str = "ANY_POLICY";
const NO_POLICY: &str = "NO_POLICY";

/// Check the signature policy the signature commits to, if any.
pub(super) fn initialize_validation_context(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    location: String,
) -> Conclusion {
    let mut seq = ConstraintSequence::new(location, "vci");
    let _ = check_policy(ctx, sig, &mut seq);
    seq.conclude()
}

fn check_policy(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    seq: &mut ConstraintSequence,
) -> Result<(), Stop> {
    let constraints = &ctx.policy.signature;
    let accepted = constraints.policy.as_ref();

    let Some(policy) = &sig.policy else {
        return seq.check(
            accepted,
            Check::new(BBB_VCI_ISPK, "Is the signature policy known?")
                .on_failure(
                    Indication::Indeterminate,
                    SubIndication::SignaturePolicyNotAvailable,
                )
                .attribute("policy", NO_POLICY),
            || accepted.is_some_and(|c| c.accepts(NO_POLICY)),
        );
    };

    seq.check(
        accepted,
        Check::new(BBB_VCI_ISPK, "Is the signature policy known?")
            .on_failure(
                Indication::Indeterminate,
                SubIndication::SignaturePolicyNotAvailable,
            )
            .attribute("policy", &policy.identifier),
        || accepted.is_some_and(|c| c.accepts(&policy.identifier) || c.accepts(ANY_POLICY)),
    )?;

    seq.check(
        constraints.policy_available.as_ref(),
        Check::new(BBB_VCI_ISPA, "Is the signature policy available?").on_failure(
            Indication::Indeterminate,
            SubIndication::SignaturePolicyNotAvailable,
        ),
        || policy.document.is_some(),
    )?;

    // Nothing to compare when the signature does not commit to a digest.
    seq.check(
        constraints.policy_hash_match.as_ref(),
        Check::new(BBB_VCI_ISPM, "Does the signature policy digest match?").on_failure(
            Indication::Indeterminate,
            SubIndication::PolicyProcessingError,
        ),
        || match (&policy.digest, &policy.document) {
            (Some(digest), Some(document)) => digest.matches(document),
            _ => true,
        },
    )
}
