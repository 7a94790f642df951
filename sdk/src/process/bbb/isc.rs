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

use std::{collections::HashSet, sync::Arc};

use ades_crypto::raw_signature;
use ades_status_tracker::message_codes::*;

use crate::{
    conclusion::{Conclusion, Indication, SubIndication},
    policy::LevelConstraint,
    process::{
        checks::{Check, ConstraintSequence, Stop},
        RunContext,
    },
    signature::SignatureInput,
    token::{CertificateToken, Token, TokenId},
};

/// Identify the signing certificate among the certificates shipped with
/// the signature and the trust anchors.
pub(super) fn identify_signing_certificate(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    location: String,
) -> (Conclusion, Option<Arc<CertificateToken>>) {
    let mut seq = ConstraintSequence::new(location, "isc");
    let cert = identify(ctx, sig, &mut seq).ok();
    (seq.conclude(), cert)
}

fn identify(
    ctx: &RunContext<'_>,
    sig: &SignatureInput,
    seq: &mut ConstraintSequence,
) -> Result<Arc<CertificateToken>, Stop> {
    let constraints = &ctx.policy.signature;
    let not_found = |check: Check| {
        check.on_failure(
            Indication::Indeterminate,
            SubIndication::NoSigningCertificateFound,
        )
    };

    let candidates = candidates(ctx, sig);
    seq.check(
        Some(&LevelConstraint::FAIL),
        not_found(Check::new(
            BBB_ICS_ISCI,
            "Is there an identified candidate for the signing certificate?",
        ))
        .attribute("candidates", candidates.len()),
        || !candidates.is_empty(),
    )?;

    let reference = sig.signing_certificate_reference.as_ref();
    seq.check(
        constraints.signing_certificate_attribute_present.as_ref(),
        not_found(Check::new(
            BBB_ICS_ISASCP,
            "Is the signed attribute referencing the signing certificate present?",
        )),
        || reference.is_some(),
    )?;

    let matching: Vec<Arc<CertificateToken>> = match reference {
        Some(reference) => {
            let matching: Vec<_> = candidates
                .iter()
                .filter(|c| reference.digest.matches(c.der()))
                .cloned()
                .collect();

            seq.check(
                constraints.signing_certificate_digest_match.as_ref(),
                not_found(Check::new(
                    BBB_ICS_ICDVV,
                    "Does the signing certificate digest match the certificate reference?",
                )),
                || !matching.is_empty(),
            )?;

            matching
        }

        // Without a reference, the certificate whose key verifies the
        // signature value is the signing certificate.
        None => candidates
            .iter()
            .filter(|c| {
                raw_signature::verify(
                    sig.signature_value.algorithm,
                    &sig.signature_value.value,
                    &sig.signature_value.signed_data,
                    c.public_key(),
                )
                .is_ok()
            })
            .cloned()
            .collect(),
    };

    seq.check(
        Some(&LevelConstraint::FAIL),
        not_found(Check::new(
            BBB_ICS_ISCU,
            "Is the signing certificate unambiguously identified?",
        ))
        .attribute("matching", matching.len()),
        || matching.len() == 1,
    )?;

    matching.into_iter().next().ok_or(Stop)
}

/// Certificates of the signature followed by the trust anchors, without
/// duplicates.
fn candidates(ctx: &RunContext<'_>, sig: &SignatureInput) -> Vec<Arc<CertificateToken>> {
    let pool = ctx.tokens.pool();
    let mut seen = HashSet::new();

    sig.certificates
        .iter()
        .filter_map(|der| pool.get(&TokenId::from_encoded(der)))
        .chain(pool.trusted_certificates())
        .filter(|c| seen.insert(c.id()))
        .collect()
}
