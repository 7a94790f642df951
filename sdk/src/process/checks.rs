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

//! Ordered constraint evaluation.
//!
//! A stage runs its checks through a [`ConstraintSequence`]. The first check
//! failing at [`Level::Fail`] ends the stage and its outcome becomes the
//! stage conclusion; failures at lower levels are recorded as warnings or
//! information and the sequence goes on.

use std::borrow::Cow;

use ades_status_tracker::{log_item, ErrorBehavior, LogItem, StatusTracker};
use chrono::{DateTime, Utc};

use super::bbb::CryptoFailure;
use crate::{
    conclusion::{Conclusion, Indication, SubIndication},
    policy::{Constraint, CryptoCheck, CryptoUsage, CryptographicConstraint, Level},
};

/// Raised when a check fails at [`Level::Fail`].
#[derive(Debug)]
pub(crate) struct Stop;

/// One check: its message identifier, the question it answers and the
/// outcome it produces when it fails.
#[derive(Debug)]
pub(crate) struct Check {
    id: &'static str,
    description: Cow<'static, str>,
    indication: Indication,
    sub_indication: Option<SubIndication>,
    attributes: Vec<(&'static str, String)>,
}

impl Check {
    pub(crate) fn new(id: &'static str, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id,
            description: description.into(),
            indication: Indication::Indeterminate,
            sub_indication: None,
            attributes: Vec::new(),
        }
    }

    pub(crate) fn on_failure(mut self, indication: Indication, sub: SubIndication) -> Self {
        self.indication = indication;
        self.sub_indication = Some(sub);
        self
    }

    pub(crate) fn attribute(mut self, key: &'static str, value: impl ToString) -> Self {
        self.attributes.push((key, value.to_string()));
        self
    }

    fn into_item(self, location: &str, function: &'static str) -> LogItem {
        self.attributes.into_iter().fold(
            log_item!(location.to_owned(), self.description, function).message_id(self.id),
            |item, (k, v)| item.attribute(k, v),
        )
    }
}

/// Runs checks in order and collects their annotations.
pub(crate) struct ConstraintSequence {
    location: String,
    function: &'static str,
    tracker: StatusTracker,
    outcome: Option<(Indication, Option<SubIndication>)>,
}

impl ConstraintSequence {
    pub(crate) fn new(location: impl Into<String>, function: &'static str) -> Self {
        Self {
            location: location.into(),
            function,
            tracker: StatusTracker::with_error_behavior(ErrorBehavior::StopOnFirstError),
            outcome: None,
        }
    }

    /// Evaluate `check` under `constraint`.
    ///
    /// An absent constraint, or one at [`Level::Ignore`], passes without
    /// evaluating `passed`.
    pub(crate) fn check<C: Constraint + ?Sized>(
        &mut self,
        constraint: Option<&C>,
        check: Check,
        passed: impl FnOnce() -> bool,
    ) -> Result<(), Stop> {
        let Some(level) = constraint.map(|c| c.level()) else {
            return Ok(());
        };

        if level == Level::Ignore {
            return Ok(());
        }

        let outcome = (check.indication, check.sub_indication);
        let item = check.into_item(&self.location, self.function);

        if passed() {
            item.success(&mut self.tracker);
            return Ok(());
        }

        match level {
            Level::Fail => {
                self.outcome = Some(outcome);
                item.failure(&mut self.tracker, outcome).map_err(|_| Stop)?;
            }
            Level::Warn => item.warning(&mut self.tracker),
            Level::Inform | Level::Ignore => item.informational(&mut self.tracker),
        }

        Ok(())
    }

    /// Check `usage` against `table` at `time`.
    ///
    /// An expired algorithm is reported as rescuable; `failure` receives the
    /// usage so a later process can check it again at another time.
    pub(crate) fn check_crypto(
        &mut self,
        table: &CryptographicConstraint,
        usage: CryptoUsage,
        time: DateTime<Utc>,
        check: Check,
        failure: &mut Option<CryptoFailure>,
    ) -> Result<(), Stop> {
        let result = table.check(&usage, time);

        let check = check.attribute("algorithm", usage);
        let check = match &result {
            CryptoCheck::Acceptable => check,
            CryptoCheck::NotAcceptable { reason } => check
                .on_failure(
                    Indication::Indeterminate,
                    SubIndication::CryptoConstraintsFailure,
                )
                .attribute("reason", reason),
            CryptoCheck::Expired { since, .. } => {
                *failure = Some(CryptoFailure {
                    usage,
                    constraint: table.clone(),
                    expired: *since,
                });
                check
                    .on_failure(
                        Indication::Indeterminate,
                        SubIndication::CryptoConstraintsFailureNoPoe,
                    )
                    .attribute("expired", since)
            }
        };

        self.check(Some(table), check, || result.is_acceptable())
    }

    /// Record an annotation that is not the outcome of a constraint.
    pub(crate) fn inform(&mut self, check: Check) {
        check
            .into_item(&self.location, self.function)
            .informational(&mut self.tracker);
    }

    pub(crate) fn warn(&mut self, check: Check) {
        check
            .into_item(&self.location, self.function)
            .warning(&mut self.tracker);
    }

    /// End the sequence with the verdict of an earlier conclusion.
    pub(crate) fn keep(&mut self, earlier: &Conclusion) -> Stop {
        self.outcome = Some((earlier.indication, earlier.sub_indication));
        Stop
    }

    /// Copy the annotations of a nested conclusion.
    pub(crate) fn absorb(&mut self, child: &Conclusion) {
        self.tracker.extend(child.items.iter().cloned());
    }

    /// Close the sequence. The stage is VALID unless a check failed at
    /// [`Level::Fail`].
    pub(crate) fn conclude(self) -> Conclusion {
        let (indication, sub_indication) = self.outcome.unwrap_or((Indication::Valid, None));

        Conclusion {
            items: self.tracker.into_items(),
            ..Conclusion::new(indication, sub_indication, self.location)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use ades_crypto::hash::DigestAlgorithm;
    use ades_status_tracker::LogKind;
    use chrono::TimeZone;

    use super::*;
    use crate::policy::LevelConstraint;

    fn check(id: &'static str) -> Check {
        Check::new(id, "Is it?").on_failure(Indication::Invalid, SubIndication::HashFailure)
    }

    #[test]
    fn first_failure_stops_the_sequence() {
        let mut seq = ConstraintSequence::new("S-1/bbb/cv", "cv");
        let fail = LevelConstraint::FAIL;

        assert!(seq.check(Some(&fail), check("A"), || true).is_ok());
        assert!(seq.check(Some(&fail), check("B"), || false).is_err());

        let conclusion = seq.conclude();
        assert!(conclusion.is(Indication::Invalid, Some(SubIndication::HashFailure)));
        assert_eq!(conclusion.items.len(), 2);
        assert_eq!(conclusion.items[0].kind, LogKind::Success);
        assert!(conclusion.has_error("B"));
    }

    #[test]
    fn lower_levels_do_not_stop() {
        let mut seq = ConstraintSequence::new("S-1/bbb/sav", "sav");

        let warn = LevelConstraint::new(Level::Warn);
        let inform = LevelConstraint::new(Level::Inform);
        seq.check(Some(&warn), check("W"), || false).unwrap();
        seq.check(Some(&inform), check("I"), || false).unwrap();

        let conclusion = seq.conclude();
        assert!(conclusion.is_valid());
        assert_eq!(conclusion.warnings().count(), 1);
        assert!(conclusion.has_message("I"));
    }

    #[test]
    fn absent_or_ignored_constraint_is_not_evaluated() {
        let mut seq = ConstraintSequence::new("S-1", "test");
        let ignore = LevelConstraint::new(Level::Ignore);

        seq.check::<LevelConstraint>(None, check("N"), || unreachable!("evaluated"))
            .unwrap();
        seq.check(Some(&ignore), check("X"), || unreachable!("evaluated"))
            .unwrap();

        let conclusion = seq.conclude();
        assert!(conclusion.is_valid());
        assert!(conclusion.items.is_empty());
    }

    #[test]
    fn expired_algorithm_is_rescuable() {
        let mut seq = ConstraintSequence::new("S-1/bbb/sav", "sav");
        let table = CryptographicConstraint::default();
        let mut failure = None;

        let result = seq.check_crypto(
            &table,
            CryptoUsage::digest(DigestAlgorithm::Sha1),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Check::new("BBB_SAV_DMDCCM", "Are the digest algorithms reliable?"),
            &mut failure,
        );

        assert!(result.is_err());
        assert!(failure.is_some());
        assert!(seq.conclude().is_rescuable());
    }
}
