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

//! The report tree produced by [`DocumentValidator`].
//!
//! [`DocumentValidator`]: crate::DocumentValidator

use std::fmt;

use ades_status_tracker::LogItem;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::{
    conclusion::{Annotation, Conclusion, Indication, SubIndication},
    process::{AdesTResult, BuildingBlocks, LongTermResult, TimestampValidation},
    token::Token,
};

/// Annotations recorded by the trust resolver.
#[derive(Clone, Debug, Default)]
pub struct ResolverLog(pub Vec<LogItem>);

impl ResolverLog {
    pub fn has_message(&self, id: &str) -> bool {
        self.0.iter().any(|i| i.message_id.as_deref() == Some(id))
    }
}

impl Serialize for ResolverLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(Annotation::from))
    }
}

/// Verdict and process results for one signature.
#[derive(Clone, Debug, Serialize)]
pub struct SignatureReport {
    pub id: String,
    pub indication: Indication,
    pub sub_indication: Option<SubIndication>,

    /// Abbreviation of the signing certificate, if it was identified.
    pub signing_certificate: Option<String>,
    pub best_signature_time: DateTime<Utc>,

    /// Earliest proof of existence of the signature, if any was found.
    pub poe_time: Option<DateTime<Utc>>,

    pub bbb: BuildingBlocks,
    pub basic: Conclusion,
    pub adest: Conclusion,
    pub ltv: Conclusion,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub past_signature: Option<Conclusion>,

    /// Every timestamp validated for this signature, in processing order.
    pub timestamps: Vec<TimestampValidation>,
    pub resolver_log: ResolverLog,
}

impl SignatureReport {
    pub(crate) fn new(
        id: &str,
        bbb: BuildingBlocks,
        basic: Conclusion,
        adest: AdesTResult,
        ltv: LongTermResult,
        resolver_log: Vec<LogItem>,
    ) -> Self {
        let mut timestamps = adest.timestamps;
        for ts in ltv.timestamps {
            if !timestamps.iter().any(|t| t.id == ts.id) {
                timestamps.push(ts);
            }
        }

        Self {
            id: id.to_owned(),
            indication: ltv.conclusion.indication,
            sub_indication: ltv.conclusion.sub_indication,
            signing_certificate: bbb.signing_certificate.as_ref().map(|c| c.abbreviation()),
            best_signature_time: adest.best_signature_time,
            poe_time: ltv.poe_time,
            bbb,
            basic,
            adest: adest.conclusion,
            ltv: ltv.conclusion,
            past_signature: ltv.past_signature,
            timestamps,
            resolver_log: ResolverLog(resolver_log),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.indication == Indication::Valid
    }
}

/// Result of [`DocumentValidator::validate`].
///
/// [`DocumentValidator::validate`]: crate::DocumentValidator::validate
#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport {
    pub validation_time: DateTime<Utc>,
    pub policy_name: String,
    pub signatures: Vec<SignatureReport>,
}

impl ValidationReport {
    pub fn signature(&self, id: &str) -> Option<&SignatureReport> {
        self.signatures.iter().find(|s| s.id == id)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| e.to_string())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}
