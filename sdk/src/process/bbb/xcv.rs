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

//! X.509 certificate validation.

use std::sync::Arc;

use ades_status_tracker::message_codes::*;
use chrono::{DateTime, Utc};

use super::{key_size, CryptoFailure};
use crate::{
    conclusion::{Conclusion, Indication, SubIndication},
    policy::{CertificateConstraints, CryptoUsage},
    process::{
        checks::{Check, ConstraintSequence, Stop},
        RunContext,
    },
    token::{CertificateToken, RevocationStatus, Token},
};

/// Whether a chain is validated at the current time or at a past control
/// time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Mode {
    Current,

    /// Revocation freshness is not checked.
    Past,
}

pub(crate) struct ChainValidation {
    pub conclusion: Conclusion,

    /// Set when the first certificate of the chain is revoked.
    pub revocation_time: Option<DateTime<Utc>>,
    pub crypto_failure: Option<CryptoFailure>,
}

#[derive(Default)]
struct Findings {
    revocation_time: Option<DateTime<Utc>>,
    crypto_failure: Option<CryptoFailure>,
}

/// Validate the chain of `cert` at `time`.
///
/// `leaf` constrains `cert` itself; every other certificate below the trust
/// anchor is checked against the CA certificate constraints.
pub(crate) fn validate_chain(
    ctx: &RunContext<'_>,
    cert: &Arc<CertificateToken>,
    leaf: &CertificateConstraints,
    time: DateTime<Utc>,
    mode: Mode,
    location: String,
) -> ChainValidation {
    let mut seq = ConstraintSequence::new(location, "xcv");
    let mut findings = Findings::default();
    let _ = validate(ctx, cert, leaf, time, mode, &mut seq, &mut findings);

    ChainValidation {
        conclusion: seq.conclude(),
        revocation_time: findings.revocation_time,
        crypto_failure: findings.crypto_failure,
    }
}

fn validate(
    ctx: &RunContext<'_>,
    cert: &Arc<CertificateToken>,
    leaf: &CertificateConstraints,
    time: DateTime<Utc>,
    mode: Mode,
    seq: &mut ConstraintSequence,
    findings: &mut Findings,
) -> Result<(), Stop> {
    let chain = ctx.tokens.certificate_chain(cert);
    let anchored = chain.last().is_some_and(|c| c.is_trusted());

    seq.check(
        leaf.prospective_chain.as_ref(),
        Check::new(
            BBB_XCV_CCCBB,
            "Can the certificate chain be built till a trust anchor?",
        )
        .on_failure(
            Indication::Indeterminate,
            SubIndication::NoCertificateChainFound,
        )
        .attribute("chain_length", chain.len()),
        || anchored,
    )?;

    // The trust anchor itself is not validated.
    let end = if anchored { chain.len() - 1 } else { chain.len() };

    for (index, cert) in chain[..end].iter().enumerate() {
        let constraints = if index == 0 {
            leaf
        } else {
            &ctx.policy.ca_certificate
        };
        let issuer = chain.get(index + 1).cloned().or_else(|| cert.issuer_token());

        validate_certificate(
            ctx,
            cert,
            issuer.as_deref(),
            index,
            constraints,
            time,
            mode,
            seq,
            findings,
        )?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn validate_certificate(
    ctx: &RunContext<'_>,
    cert: &CertificateToken,
    issuer: Option<&CertificateToken>,
    index: usize,
    constraints: &CertificateConstraints,
    time: DateTime<Utc>,
    mode: Mode,
    seq: &mut ConstraintSequence,
    findings: &mut Findings,
) -> Result<(), Stop> {
    let chain_constraints = |check: Check| {
        check
            .on_failure(
                Indication::Indeterminate,
                SubIndication::ChainConstraintsFailure,
            )
            .attribute("certificate", cert.abbreviation())
    };

    let key_usage = constraints.key_usage.as_ref();
    seq.check(
        key_usage,
        chain_constraints(Check::new(
            BBB_XCV_ISCGKU,
            "Has the certificate a key usage accepted by the policy?",
        )),
        || {
            let names: Vec<&str> = cert.key_usage().iter().map(|k| k.name()).collect();
            key_usage.is_some_and(|c| c.accepts_any(&names))
        },
    )?;

    let extended_key_usage = constraints.extended_key_usage.as_ref();
    seq.check(
        extended_key_usage,
        chain_constraints(Check::new(
            BBB_XCV_ISCGEKU,
            "Has the certificate an extended key usage accepted by the policy?",
        )),
        || {
            let names: Vec<String> = cert.extended_key_usage().iter().map(|k| k.name()).collect();
            extended_key_usage.is_some_and(|c| c.accepts_any(&names))
        },
    )?;

    if index > 0 {
        seq.check(
            constraints.basic_constraints_ca.as_ref(),
            chain_constraints(Check::new(BBB_XCV_ISCA, "Is the certificate a CA?")),
            || cert.is_ca(),
        )?;

        // `index - 1` CA certificates sit between this one and the leaf.
        seq.check(
            constraints.max_path_length.as_ref(),
            chain_constraints(Check::new(
                BBB_XCV_IPLC,
                "Is the path length constraint respected?",
            )),
            || {
                cert.path_len_constraint()
                    .map_or(true, |max| max as usize >= index - 1)
            },
        )?;
    }

    if !cert.is_trusted() && !cert.is_revocation_check_exempt() {
        check_revocation(ctx, cert, index, constraints, time, mode, seq, findings)?;
    }

    seq.check(
        constraints.validity_range.as_ref(),
        Check::new(
            BBB_XCV_ICTIVRSC,
            "Is the validation time in the validity range of the certificate?",
        )
        .on_failure(Indication::Indeterminate, SubIndication::OutOfBoundsNoPoe)
        .attribute("certificate", cert.abbreviation())
        .attribute("not_before", cert.not_before())
        .attribute("not_after", cert.not_after())
        .attribute("validation_time", time),
        || cert.is_valid_at(time),
    )?;

    let check = Check::new(
        BBB_XCV_ICSCCM,
        "Is the certificate signature algorithm reliable?",
    )
    .attribute("certificate", cert.abbreviation());

    match cert.signature_algorithm() {
        Some(algorithm) => seq.check_crypto(
            ctx.policy.certificate_cryptographic(constraints),
            CryptoUsage::signature(
                algorithm.digest_algorithm(),
                algorithm.encryption_algorithm(),
                issuer.map_or(0, key_size),
            ),
            time,
            check,
            &mut findings.crypto_failure,
        ),
        None => seq.check(
            Some(ctx.policy.certificate_cryptographic(constraints)),
            check.on_failure(
                Indication::Indeterminate,
                SubIndication::CryptoConstraintsFailure,
            ),
            || false,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn check_revocation(
    ctx: &RunContext<'_>,
    cert: &CertificateToken,
    index: usize,
    constraints: &CertificateConstraints,
    time: DateTime<Utc>,
    mode: Mode,
    seq: &mut ConstraintSequence,
    findings: &mut Findings,
) -> Result<(), Stop> {
    let revocation = ctx
        .tokens
        .latest_revocation(cert)
        .filter(|r| r.status() != RevocationStatus::Unknown);

    seq.check(
        constraints.revocation_data_available.as_ref(),
        Check::new(
            BBB_XCV_IRDPFC,
            "Is the revocation data present for the certificate?",
        )
        .on_failure(Indication::Indeterminate, SubIndication::TryLater)
        .attribute("certificate", cert.abbreviation()),
        || revocation.is_some(),
    )?;

    let Some(revocation) = revocation else {
        return Ok(());
    };

    let revoked = revocation.is_revoked_at(time);
    if revoked && index == 0 {
        findings.revocation_time = revocation.revocation_time();
    }

    let sub_indication = if index == 0 {
        SubIndication::RevokedNoPoe
    } else {
        SubIndication::RevokedCaNoPoe
    };

    let mut check = Check::new(BBB_XCV_ISCR, "Is the certificate not revoked?")
        .on_failure(Indication::Indeterminate, sub_indication)
        .attribute("certificate", cert.abbreviation())
        .attribute("revocation", revocation.abbreviation());
    if let Some(revoked_at) = revocation.revocation_time() {
        check = check.attribute("revocation_time", revoked_at);
    }
    seq.check(constraints.not_revoked.as_ref(), check, || !revoked)?;

    if mode == Mode::Current {
        let freshness = constraints.revocation_freshness.as_ref();
        seq.check(
            freshness,
            Check::new(BBB_XCV_RFC, "Is the revocation information fresh?")
                .on_failure(Indication::Indeterminate, SubIndication::TryLater)
                .attribute("revocation", revocation.abbreviation())
                .attribute("production_time", revocation.production_time()),
            || {
                freshness.is_some_and(|f| {
                    if f.value == 0 {
                        revocation.next_update().map_or(true, |next| time <= next)
                    } else {
                        time - revocation.production_time() <= f.duration()
                    }
                })
            },
        )?;
    }

    Ok(())
}
