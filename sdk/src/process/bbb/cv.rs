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

use ades_crypto::raw_signature;
use ades_status_tracker::message_codes::{BBB_CV_IRDOF, BBB_CV_IRDOI, BBB_CV_ISI};
use log::debug;

use crate::{
    conclusion::{Conclusion, Indication, SubIndication},
    process::{
        checks::{Check, ConstraintSequence, Stop},
        RunContext,
    },
    signature::SignatureInput,
    token::CertificateToken,
};

/// Verify every signed reference, then the signature value.
pub(super) fn verify_signature(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    cert: &CertificateToken,
    location: String,
) -> Conclusion {
    let mut seq = ConstraintSequence::new(location, "cv");
    let _ = verify(ctx, sig, cert, &mut seq);
    seq.conclude()
}

fn verify(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    cert: &CertificateToken,
    seq: &mut ConstraintSequence,
) -> Result<(), Stop> {
    let constraints = &ctx.policy.signature;

    for reference in &sig.references {
        seq.check(
            constraints.reference_data_existence.as_ref(),
            Check::new(BBB_CV_IRDOF, "Is the reference data object found?")
                .on_failure(Indication::Indeterminate, SubIndication::SignedDataNotFound)
                .attribute("reference", &reference.uri),
            || reference.content.is_some(),
        )?;

        if let Some(content) = &reference.content {
            seq.check(
                constraints.reference_data_intact.as_ref(),
                Check::new(BBB_CV_IRDOI, "Is the reference data object intact?")
                    .on_failure(Indication::Invalid, SubIndication::HashFailure)
                    .attribute("reference", &reference.uri),
                || reference.digest.matches(content),
            )?;
        }
    }

    let value = &sig.signature_value;
    seq.check(
        constraints.signature_intact.as_ref(),
        Check::new(BBB_CV_ISI, "Is the signature intact?")
            .on_failure(Indication::Invalid, SubIndication::SigCryptoFailure)
            .attribute("algorithm", format!("{:?}", value.algorithm)),
        || {
            raw_signature::verify(
                value.algorithm,
                &value.value,
                &value.signed_data,
                cert.public_key(),
            )
            .inspect_err(|e| debug!("{}: signature value rejected: {e}", sig.id))
            .is_ok()
        },
    )
}
