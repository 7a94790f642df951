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

use std::fmt;

use ades_crypto::{hash::DigestAlgorithm, raw_signature::EncryptionAlgorithm};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{Constraint, Level};

/// A public key algorithm with the smallest key size the policy accepts.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct AlgorithmKeySize {
    pub algorithm: EncryptionAlgorithm,
    pub min_key_size: usize,
}

/// Date from which a digest algorithm is no longer considered reliable.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct DigestExpiration {
    pub algorithm: DigestAlgorithm,
    pub expires: NaiveDate,
}

/// Date from which a public key algorithm, for keys of at least `key_size`
/// bits and smaller than the next listed size, is no longer considered
/// reliable.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct EncryptionExpiration {
    pub algorithm: EncryptionAlgorithm,
    pub key_size: usize,
    pub expires: NaiveDate,
}

/// The algorithms involved in producing one signature or digest.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CryptoUsage {
    pub digest: DigestAlgorithm,

    /// Public key algorithm and key size. `None` for a plain digest.
    pub encryption: Option<(EncryptionAlgorithm, usize)>,
}

impl CryptoUsage {
    pub fn digest(digest: DigestAlgorithm) -> Self {
        Self {
            digest,
            encryption: None,
        }
    }

    pub fn signature(
        digest: DigestAlgorithm,
        encryption: EncryptionAlgorithm,
        key_size: usize,
    ) -> Self {
        Self {
            digest,
            encryption: Some((encryption, key_size)),
        }
    }
}

impl fmt::Display for CryptoUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encryption {
            Some((encryption, key_size)) => {
                write!(f, "{encryption}-{key_size} with {}", self.digest)
            }
            None => write!(f, "{}", self.digest),
        }
    }
}

/// Outcome of checking a [`CryptoUsage`] against a [`CryptographicConstraint`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CryptoCheck {
    Acceptable,

    /// The algorithm or key size is not accepted at all.
    NotAcceptable { reason: String },

    /// The algorithm was acceptable until `since`.
    Expired { algorithm: String, since: DateTime<Utc> },
}

impl CryptoCheck {
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Self::Acceptable)
    }
}

/// Algorithm reliability table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct CryptographicConstraint {
    pub level: Level,
    pub acceptable_encryption_algorithms: Vec<AlgorithmKeySize>,
    pub acceptable_digest_algorithms: Vec<DigestAlgorithm>,
    pub digest_expirations: Vec<DigestExpiration>,
    pub encryption_expirations: Vec<EncryptionExpiration>,
}

impl Constraint for CryptographicConstraint {
    fn level(&self) -> Level {
        self.level
    }
}

impl CryptographicConstraint {
    /// Check `usage` as of `time`.
    pub fn check(&self, usage: &CryptoUsage, time: DateTime<Utc>) -> CryptoCheck {
        if !self.acceptable_digest_algorithms.contains(&usage.digest) {
            return CryptoCheck::NotAcceptable {
                reason: format!("digest algorithm {} is not acceptable", usage.digest),
            };
        }

        if let Some((algorithm, key_size)) = usage.encryption {
            let Some(accepted) = self
                .acceptable_encryption_algorithms
                .iter()
                .find(|a| a.algorithm == algorithm)
            else {
                return CryptoCheck::NotAcceptable {
                    reason: format!("encryption algorithm {algorithm} is not acceptable"),
                };
            };

            if key_size < accepted.min_key_size {
                return CryptoCheck::NotAcceptable {
                    reason: format!(
                        "{algorithm} key size {key_size} is below the minimum of {}",
                        accepted.min_key_size
                    ),
                };
            }
        }

        if let Some(since) = self.digest_expiry(usage.digest) {
            if since <= time {
                return CryptoCheck::Expired {
                    algorithm: usage.digest.to_string(),
                    since,
                };
            }
        }

        if let Some((algorithm, key_size)) = usage.encryption {
            if let Some(since) = self.encryption_expiry(algorithm, key_size) {
                if since <= time {
                    return CryptoCheck::Expired {
                        algorithm: format!("{algorithm}-{key_size}"),
                        since,
                    };
                }
            }
        }

        CryptoCheck::Acceptable
    }

    /// Returns `true` if `digest` is accepted and not yet expired at `time`.
    pub fn is_reliable_at(&self, digest: DigestAlgorithm, time: DateTime<Utc>) -> bool {
        self.check(&CryptoUsage::digest(digest), time).is_acceptable()
    }

    pub fn digest_expiry(&self, digest: DigestAlgorithm) -> Option<DateTime<Utc>> {
        self.digest_expirations
            .iter()
            .find(|e| e.algorithm == digest)
            .map(|e| start_of_day(e.expires))
    }

    /// The entry with the largest key size not exceeding `key_size` applies.
    pub fn encryption_expiry(
        &self,
        algorithm: EncryptionAlgorithm,
        key_size: usize,
    ) -> Option<DateTime<Utc>> {
        self.encryption_expirations
            .iter()
            .filter(|e| e.algorithm == algorithm && e.key_size <= key_size)
            .max_by_key(|e| e.key_size)
            .map(|e| start_of_day(e.expires))
    }
}

impl Default for CryptographicConstraint {
    fn default() -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();

        Self {
            level: Level::Fail,
            acceptable_encryption_algorithms: vec![
                AlgorithmKeySize {
                    algorithm: EncryptionAlgorithm::Rsa,
                    min_key_size: 1900,
                },
                AlgorithmKeySize {
                    algorithm: EncryptionAlgorithm::Ecdsa,
                    min_key_size: 256,
                },
                AlgorithmKeySize {
                    algorithm: EncryptionAlgorithm::Ed25519,
                    min_key_size: 256,
                },
            ],
            acceptable_digest_algorithms: vec![
                DigestAlgorithm::Sha1,
                DigestAlgorithm::Sha224,
                DigestAlgorithm::Sha256,
                DigestAlgorithm::Sha384,
                DigestAlgorithm::Sha512,
            ],
            digest_expirations: vec![
                DigestExpiration {
                    algorithm: DigestAlgorithm::Sha1,
                    expires: date(2009, 12, 31),
                },
                DigestExpiration {
                    algorithm: DigestAlgorithm::Sha224,
                    expires: date(2029, 12, 31),
                },
            ],
            encryption_expirations: vec![
                EncryptionExpiration {
                    algorithm: EncryptionAlgorithm::Rsa,
                    key_size: 1900,
                    expires: date(2029, 12, 31),
                },
                EncryptionExpiration {
                    algorithm: EncryptionAlgorithm::Rsa,
                    key_size: 3000,
                    expires: date(2039, 12, 31),
                },
            ],
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}
