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

//! Validation policy.
//!
//! A policy is a tree of optional constraints. A constraint that is absent
//! (`None`) passes trivially; a present constraint carries the [`Level`] at
//! which a failure is reported.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

mod cryptographic;
pub use cryptographic::{
    AlgorithmKeySize, CryptoCheck, CryptoUsage, CryptographicConstraint, DigestExpiration,
    EncryptionExpiration,
};

/// How a failed constraint is reported.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// The failure becomes the conclusion of the enclosing process.
    #[default]
    Fail,

    /// The failure is recorded as a warning.
    Warn,

    /// The failure is recorded as information.
    Inform,

    /// The check is not performed.
    Ignore,
}

/// Common view of every constraint kind.
pub trait Constraint {
    fn level(&self) -> Level;
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct LevelConstraint {
    pub level: Level,
}

impl LevelConstraint {
    pub const FAIL: Self = Self { level: Level::Fail };

    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Constraint for LevelConstraint {
    fn level(&self) -> Level {
        self.level
    }
}

/// A constraint listing accepted values. `*` accepts anything.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct MultiValuesConstraint {
    pub level: Level,
    pub values: Vec<String>,
}

impl MultiValuesConstraint {
    pub fn new(level: Level, values: &[&str]) -> Self {
        Self {
            level,
            values: values.iter().map(|v| (*v).to_owned()).collect(),
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == "*" || v == value)
    }

    /// Returns `true` if any of `values` is accepted.
    pub fn accepts_any<S: AsRef<str>>(&self, values: &[S]) -> bool {
        values.iter().any(|v| self.accepts(v.as_ref()))
    }
}

impl Constraint for MultiValuesConstraint {
    fn level(&self) -> Level {
        self.level
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeUnit {
    Milliseconds,
    #[default]
    Seconds,
    Minutes,
    Hours,
    Days,
}

/// A constraint bound to a duration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct TimeConstraint {
    pub level: Level,
    pub value: i64,
    pub unit: TimeUnit,
}

impl TimeConstraint {
    pub fn new(level: Level, value: i64, unit: TimeUnit) -> Self {
        Self { level, value, unit }
    }

    /// The configured duration. Negative values count as zero.
    pub fn duration(&self) -> TimeDelta {
        let factor = match self.unit {
            TimeUnit::Milliseconds => 1,
            TimeUnit::Seconds => 1_000,
            TimeUnit::Minutes => 60_000,
            TimeUnit::Hours => 3_600_000,
            TimeUnit::Days => 86_400_000,
        };

        TimeDelta::try_milliseconds(self.value.max(0).saturating_mul(factor))
            .unwrap_or_else(TimeDelta::zero)
    }
}

impl Constraint for TimeConstraint {
    fn level(&self) -> Level {
        self.level
    }
}

/// Constraints on the signature itself.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct SignatureConstraints {
    pub signing_certificate_attribute_present: Option<LevelConstraint>,
    pub signing_certificate_digest_match: Option<LevelConstraint>,

    /// Accepted signature policy identifiers. `ANY_POLICY` accepts any
    /// explicit policy and `NO_POLICY` accepts signatures without one.
    pub policy: Option<MultiValuesConstraint>,
    pub policy_available: Option<LevelConstraint>,
    pub policy_hash_match: Option<LevelConstraint>,
    pub reference_data_existence: Option<LevelConstraint>,
    pub reference_data_intact: Option<LevelConstraint>,
    pub signature_intact: Option<LevelConstraint>,
    pub signing_time_present: Option<LevelConstraint>,
    pub content_type_present: Option<LevelConstraint>,
    pub content_timestamp_present: Option<LevelConstraint>,
    pub commitment_type: Option<MultiValuesConstraint>,
    pub cryptographic: Option<CryptographicConstraint>,
}

/// Constraints applied to one certificate of a chain.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct CertificateConstraints {
    pub prospective_chain: Option<LevelConstraint>,
    pub validity_range: Option<LevelConstraint>,
    pub key_usage: Option<MultiValuesConstraint>,
    pub extended_key_usage: Option<MultiValuesConstraint>,
    pub basic_constraints_ca: Option<LevelConstraint>,
    pub max_path_length: Option<LevelConstraint>,
    pub revocation_data_available: Option<LevelConstraint>,
    pub not_revoked: Option<LevelConstraint>,

    /// Maximum age of revocation data. A value of zero requires the
    /// validation time to precede the next update of the revocation data.
    pub revocation_freshness: Option<TimeConstraint>,
    pub cryptographic: Option<CryptographicConstraint>,
}

/// Constraints on timestamps.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct TimestampConstraints {
    pub message_imprint_intact: Option<LevelConstraint>,

    /// Maximum delay between the claimed signing time and the best
    /// signature time.
    pub timestamp_delay: Option<TimeConstraint>,
    pub coherence_order: Option<LevelConstraint>,
    pub signature_intact: Option<LevelConstraint>,
    pub cryptographic: Option<CryptographicConstraint>,
}

/// A complete validation policy.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct ValidationPolicy {
    pub name: String,
    pub description: Option<String>,
    pub signature: SignatureConstraints,
    pub signing_certificate: CertificateConstraints,
    pub ca_certificate: CertificateConstraints,
    pub timestamp: TimestampConstraints,
    pub timestamp_certificate: CertificateConstraints,

    /// Applies wherever a section does not define its own table.
    pub cryptographic: CryptographicConstraint,
}

/// The policy configuration handed to the validation processes.
pub type PolicyConfig = ValidationPolicy;

impl ValidationPolicy {
    /// Cryptographic table for the signature.
    pub fn signature_cryptographic(&self) -> &CryptographicConstraint {
        self.signature
            .cryptographic
            .as_ref()
            .unwrap_or(&self.cryptographic)
    }

    /// Cryptographic table for a certificate section.
    pub fn certificate_cryptographic<'a>(
        &'a self,
        constraints: &'a CertificateConstraints,
    ) -> &'a CryptographicConstraint {
        constraints
            .cryptographic
            .as_ref()
            .unwrap_or(&self.cryptographic)
    }

    /// Cryptographic table for timestamps.
    pub fn timestamp_cryptographic(&self) -> &CryptographicConstraint {
        self.timestamp
            .cryptographic
            .as_ref()
            .unwrap_or(&self.cryptographic)
    }

    /// A policy that checks nothing but cryptographic algorithms.
    pub fn permissive() -> Self {
        Self {
            name: "permissive".to_owned(),
            description: None,
            signature: SignatureConstraints::default(),
            signing_certificate: CertificateConstraints::default(),
            ca_certificate: CertificateConstraints::default(),
            timestamp: TimestampConstraints::default(),
            timestamp_certificate: CertificateConstraints::default(),
            cryptographic: CryptographicConstraint::default(),
        }
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        let fail = || Some(LevelConstraint::new(Level::Fail));
        let warn = || Some(LevelConstraint::new(Level::Warn));
        let inform = || Some(LevelConstraint::new(Level::Inform));

        let certificate = CertificateConstraints {
            prospective_chain: fail(),
            validity_range: fail(),
            key_usage: None,
            extended_key_usage: None,
            basic_constraints_ca: None,
            max_path_length: None,
            revocation_data_available: fail(),
            not_revoked: fail(),
            revocation_freshness: Some(TimeConstraint::new(Level::Warn, 0, TimeUnit::Days)),
            cryptographic: None,
        };

        Self {
            name: "baseline".to_owned(),
            description: Some(
                "Baseline AdES policy: chain, revocation and algorithms are mandatory".to_owned(),
            ),
            signature: SignatureConstraints {
                signing_certificate_attribute_present: warn(),
                signing_certificate_digest_match: fail(),
                policy: Some(MultiValuesConstraint::new(
                    Level::Fail,
                    &["ANY_POLICY", "NO_POLICY"],
                )),
                policy_available: fail(),
                policy_hash_match: fail(),
                reference_data_existence: fail(),
                reference_data_intact: fail(),
                signature_intact: fail(),
                signing_time_present: warn(),
                content_type_present: None,
                content_timestamp_present: None,
                commitment_type: None,
                cryptographic: None,
            },
            signing_certificate: CertificateConstraints {
                key_usage: Some(MultiValuesConstraint::new(
                    Level::Warn,
                    &["digitalSignature", "nonRepudiation"],
                )),
                ..certificate.clone()
            },
            ca_certificate: CertificateConstraints {
                basic_constraints_ca: fail(),
                max_path_length: fail(),
                ..certificate.clone()
            },
            timestamp: TimestampConstraints {
                message_imprint_intact: fail(),
                timestamp_delay: None,
                coherence_order: fail(),
                signature_intact: fail(),
                cryptographic: None,
            },
            timestamp_certificate: CertificateConstraints {
                extended_key_usage: Some(MultiValuesConstraint::new(
                    Level::Warn,
                    &["timeStamping"],
                )),
                revocation_data_available: inform(),
                ..certificate
            },
            cryptographic: CryptographicConstraint::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn multi_values_wildcard() {
        let c = MultiValuesConstraint::new(Level::Fail, &["*"]);
        assert!(c.accepts("anything"));

        let c = MultiValuesConstraint::new(Level::Fail, &["digitalSignature"]);
        assert!(c.accepts_any(&["keyCertSign", "digitalSignature"]));
        assert!(!c.accepts_any(&["keyCertSign"]));
        assert!(!c.accepts_any::<&str>(&[]));
    }

    #[test]
    fn time_constraint_units() {
        assert_eq!(
            TimeConstraint::new(Level::Fail, 2, TimeUnit::Hours).duration(),
            TimeDelta::try_hours(2).unwrap()
        );
        assert_eq!(
            TimeConstraint::new(Level::Fail, -5, TimeUnit::Days).duration(),
            TimeDelta::zero()
        );
    }

    #[test]
    fn policy_json_round_trip() {
        let policy = ValidationPolicy::default();
        let json = serde_json::to_string(&policy).unwrap();
        let parsed: ValidationPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, parsed);
    }

    #[test]
    fn partial_policy_uses_defaults() {
        let policy: ValidationPolicy = serde_json::from_str(
            r#"{
                "name": "custom",
                "signing_certificate": { "not_revoked": { "level": "WARN" } }
            }"#,
        )
        .unwrap();

        assert_eq!(policy.name, "custom");
        assert_eq!(
            policy.signing_certificate.not_revoked,
            Some(LevelConstraint::new(Level::Warn))
        );
        assert!(policy.signing_certificate.prospective_chain.is_none());
        assert_eq!(policy.cryptographic, CryptographicConstraint::default());
    }
}
