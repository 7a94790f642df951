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

//! Verdicts produced by each validation process.

use std::fmt;

use ades_status_tracker::{LogItem, LogKind};
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};

/// Top-level verdict.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Indication {
    Valid,
    Invalid,
    Indeterminate,
}

impl fmt::Display for Indication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
            Self::Indeterminate => "INDETERMINATE",
        })
    }
}

/// Reason refining an INVALID or INDETERMINATE [`Indication`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum SubIndication {
    FormatFailure,
    HashFailure,
    SigCryptoFailure,
    Revoked,
    SigConstraintsFailure,
    ChainConstraintsFailure,
    CertificateChainGeneralFailure,
    CryptoConstraintsFailure,
    Expired,
    NotYetValid,
    PolicyProcessingError,
    SignaturePolicyNotAvailable,
    TimestampOrderFailure,
    NoSigningCertificateFound,
    NoCertificateChainFound,
    RevokedNoPoe,
    RevokedCaNoPoe,
    OutOfBoundsNoPoe,
    OutOfBoundsNotRevoked,
    CryptoConstraintsFailureNoPoe,
    NoPoe,
    TryLater,
    SignedDataNotFound,
    Generic,
}

impl SubIndication {
    /// Failures a later proof of existence may excuse.
    pub fn is_rescuable(&self) -> bool {
        matches!(
            self,
            Self::CryptoConstraintsFailureNoPoe
                | Self::RevokedNoPoe
                | Self::RevokedCaNoPoe
                | Self::OutOfBoundsNoPoe
        )
    }
}

impl fmt::Display for SubIndication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse the serde names so reports and logs agree.
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(s)) => f.write_str(&s),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// The outcome of one validation process, with the annotations that led to
/// it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conclusion {
    pub indication: Indication,
    pub sub_indication: Option<SubIndication>,

    /// Location in the report tree, for example `S-1/bbb/xcv`.
    pub location: String,

    /// Annotations in the order they were produced.
    pub items: Vec<LogItem>,
}

impl Conclusion {
    pub fn new(
        indication: Indication,
        sub_indication: Option<SubIndication>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            indication,
            sub_indication,
            location: location.into(),
            items: Vec::new(),
        }
    }

    pub fn valid(location: impl Into<String>) -> Self {
        Self::new(Indication::Valid, None, location)
    }

    pub fn is_valid(&self) -> bool {
        self.indication == Indication::Valid
    }

    pub fn is(&self, indication: Indication, sub_indication: Option<SubIndication>) -> bool {
        self.indication == indication && self.sub_indication == sub_indication
    }

    /// Returns `true` if the conclusion carries one of the rescuable
    /// `_NO_POE` sub-indications.
    pub fn is_rescuable(&self) -> bool {
        self.indication == Indication::Indeterminate
            && self.sub_indication.is_some_and(|s| s.is_rescuable())
    }

    pub fn infos(&self) -> impl Iterator<Item = &LogItem> {
        self.items
            .iter()
            .filter(|i| matches!(i.kind, LogKind::Informational | LogKind::Success))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LogItem> {
        self.items.iter().filter(|i| i.kind == LogKind::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &LogItem> {
        self.items.iter().filter(|i| i.kind == LogKind::Failure)
    }

    /// Returns `true` if any annotation carries message `id`.
    pub fn has_message(&self, id: &str) -> bool {
        self.items
            .iter()
            .any(|i| i.message_id.as_deref() == Some(id))
    }

    /// Returns `true` if an error annotation carries message `id`.
    pub fn has_error(&self, id: &str) -> bool {
        self.errors().any(|i| i.message_id.as_deref() == Some(id))
    }

    /// Take over the verdict of `child`, keeping this conclusion's location.
    pub fn adopt(&mut self, child: &Conclusion) {
        self.indication = child.indication;
        self.sub_indication = child.sub_indication;
        self.merge_annotations(child);
    }

    /// Copy the annotations of `child` without changing the verdict.
    pub fn merge_annotations(&mut self, child: &Conclusion) {
        self.items.extend(child.items.iter().cloned());
    }

    /// Return a copy of `child` relocated to `location`.
    pub fn relocated(child: &Conclusion, location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..child.clone()
        }
    }
}

/// An annotation as rendered in reports.
#[derive(Debug, Serialize)]
pub(crate) struct Annotation<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<&'a str>,
    description: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<(&'a str, &'a str)>,
}

impl<'a> From<&'a LogItem> for Annotation<'a> {
    fn from(item: &'a LogItem) -> Self {
        Self {
            message_id: item.message_id.as_deref(),
            description: &item.description,
            attributes: item
                .attributes
                .iter()
                .map(|(k, v)| (k.as_ref(), v.as_str()))
                .collect(),
        }
    }
}

impl Serialize for Conclusion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let annotations = |kinds: &[LogKind]| -> Vec<Annotation<'_>> {
            self.items
                .iter()
                .filter(|i| kinds.contains(&i.kind))
                .map(Annotation::from)
                .collect()
        };

        let mut s = serializer.serialize_struct("Conclusion", 6)?;
        s.serialize_field("indication", &self.indication)?;
        s.serialize_field("sub_indication", &self.sub_indication)?;
        s.serialize_field("location", &self.location)?;
        s.serialize_field(
            "infos",
            &annotations(&[LogKind::Success, LogKind::Informational]),
        )?;
        s.serialize_field("warnings", &annotations(&[LogKind::Warning]))?;
        s.serialize_field("errors", &annotations(&[LogKind::Failure]))?;
        s.end()
    }
}
