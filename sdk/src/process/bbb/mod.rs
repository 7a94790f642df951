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

//! Basic building blocks.
//!
//! Identification of the signing certificate (ISC), validation context
//! initialization (VCI), cryptographic verification (CV), signature
//! acceptance validation (SAV) and X.509 certificate validation (XCV), run
//! in that order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use super::RunContext;
use crate::{
    conclusion::Conclusion,
    policy::{CryptoUsage, CryptographicConstraint},
    signature::SignatureInput,
    token::{CertificateToken, TimestampToken, Token},
};

mod cv;
mod isc;
mod sav;
mod timestamp;
mod vci;
pub(crate) mod xcv;

pub use timestamp::timestamp_building_blocks;

/// An algorithm that was acceptable once but has expired at the time it was
/// checked. It may still be accepted at an earlier, proven time.
#[derive(Clone, Debug, PartialEq)]
pub struct CryptoFailure {
    pub usage: CryptoUsage,

    /// The table the usage was checked against.
    pub constraint: CryptographicConstraint,
    pub expired: DateTime<Utc>,
}

impl CryptoFailure {
    /// Returns `true` if the algorithm was reliable at `time`.
    pub fn is_reliable_at(&self, time: DateTime<Utc>) -> bool {
        self.constraint.check(&self.usage, time).is_acceptable()
    }
}

/// Results of the building blocks for one signature or timestamp.
///
/// A sub-stage that did not run is `None`.
#[derive(Clone, Debug, Serialize)]
pub struct BuildingBlocks {
    pub isc: Option<Conclusion>,
    pub vci: Option<Conclusion>,
    pub cv: Option<Conclusion>,
    pub sav: Option<Conclusion>,
    pub xcv: Option<Conclusion>,
    pub conclusion: Conclusion,

    #[serde(skip)]
    pub signing_certificate: Option<Arc<CertificateToken>>,

    /// Algorithms of the signature value, once known.
    #[serde(skip)]
    pub signature_usage: Option<CryptoUsage>,

    /// Revocation time of the signing certificate, if it was found revoked.
    #[serde(skip)]
    pub revocation_time: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub crypto_failure: Option<CryptoFailure>,
}

impl BuildingBlocks {
    fn new(location: impl Into<String>) -> Self {
        Self {
            isc: None,
            vci: None,
            cv: None,
            sav: None,
            xcv: None,
            conclusion: Conclusion::valid(location),
            signing_certificate: None,
            signature_usage: None,
            revocation_time: None,
            crypto_failure: None,
        }
    }

    /// Fold a sub-stage conclusion into the overall one. Returns `false` if
    /// the pipeline must stop.
    ///
    /// A failure that a proof of existence cannot excuse replaces an earlier
    /// one that it could; otherwise the first failure stands.
    fn merge(&mut self, stage: &Conclusion) -> bool {
        self.conclusion.merge_annotations(stage);

        if stage.is_valid() {
            return true;
        }

        let replace = self.conclusion.is_valid()
            || (self.conclusion.is_rescuable() && !stage.is_rescuable());
        if replace {
            self.conclusion.indication = stage.indication;
            self.conclusion.sub_indication = stage.sub_indication;
        }

        stage.is_rescuable()
    }

    /// Sub-stage conclusions in execution order.
    pub fn stages(&self) -> impl Iterator<Item = &Conclusion> {
        [&self.isc, &self.vci, &self.cv, &self.sav, &self.xcv]
            .into_iter()
            .flatten()
    }
}

/// Run the building blocks for a signature.
///
/// A sub-stage that fails with anything other than a `_NO_POE`
/// sub-indication ends the run; the remaining sub-stages stay `None`.
pub fn building_blocks(ctx: &RunContext<'_>, sig: &SignatureInput) -> BuildingBlocks {
    let location = format!("{}/bbb", sig.id);
    let mut bbb = BuildingBlocks::new(&location);

    let (isc, cert) = isc::identify_signing_certificate(ctx, sig, format!("{location}/isc"));
    let proceed = bbb.merge(&isc);
    bbb.isc = Some(isc);
    let Some(cert) = cert.filter(|_| proceed) else {
        return bbb;
    };
    bbb.signing_certificate = Some(Arc::clone(&cert));

    let vci = vci::initialize_validation_context(ctx, sig, format!("{location}/vci"));
    let proceed = bbb.merge(&vci);
    bbb.vci = Some(vci);
    if !proceed {
        return bbb;
    }

    let cv = cv::verify_signature(ctx, sig, &cert, format!("{location}/cv"));
    let proceed = bbb.merge(&cv);
    bbb.cv = Some(cv);
    if !proceed {
        return bbb;
    }

    let sav = sav::accept_signature(ctx, sig, &cert, format!("{location}/sav"));
    bbb.signature_usage = Some(sav.usage);
    bbb.crypto_failure = sav.crypto_failure;
    let proceed = bbb.merge(&sav.conclusion);
    bbb.sav = Some(sav.conclusion);
    if !proceed {
        return bbb;
    }

    let xcv = xcv::validate_chain(
        ctx,
        &cert,
        &ctx.policy.signing_certificate,
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

    debug!(
        "{}: building blocks {} {:?}",
        sig.id, bbb.conclusion.indication, bbb.conclusion.sub_indication
    );

    bbb
}

/// Key size of `cert`'s public key, zero if it cannot be determined.
fn key_size(cert: &CertificateToken) -> usize {
    cert.public_key_info().map_or(0, |info| info.key_size)
}

/// The certificate that signed `ts`, if the resolver found it.
fn timestamp_signer(ts: &TimestampToken) -> Option<Arc<CertificateToken>> {
    ts.issuer_token()
}
