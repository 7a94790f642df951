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

//! Proof of existence.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use log::debug;

use crate::token::{TimestampToken, Token, TokenId};

/// Earliest known time at which a token existed, and the timestamp that
/// proves it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Poe {
    pub time: DateTime<Utc>,
    pub timestamp: Option<TokenId>,
}

/// Proofs of existence gathered from verified timestamps.
///
/// Recorded times only ever move earlier.
#[derive(Debug, Default)]
pub struct PoeSet {
    inner: Mutex<HashMap<TokenId, Poe>>,
}

impl PoeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` existed at `time`. Returns `true` if this improved
    /// the recorded proof.
    pub fn add(&self, id: TokenId, time: DateTime<Utc>, timestamp: Option<TokenId>) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        match inner.get(&id) {
            Some(existing) if existing.time <= time => false,
            _ => {
                inner.insert(id, Poe { time, timestamp });
                true
            }
        }
    }

    /// Record the generation time of `timestamp` for every object it covers.
    /// `signature` is the id of the signature the timestamp belongs to; it
    /// is covered by every timestamp that is not a content timestamp.
    ///
    /// Returns the number of improved proofs.
    pub fn extract(&self, timestamp: &TimestampToken, signature: Option<TokenId>) -> usize {
        let time = timestamp.generation_time();
        let source = Some(timestamp.id());

        let mut improved = timestamp
            .references()
            .iter()
            .filter(|r| self.add(r.token_id, time, source))
            .count();

        if let Some(signature) = signature.filter(|_| timestamp.kind().covers_signature()) {
            if self.add(signature, time, source) {
                improved += 1;
            }
        }

        debug!(
            "POE extracted from {} at {time}: {improved} improved",
            timestamp.abbreviation()
        );

        improved
    }

    pub fn get(&self, id: &TokenId) -> Option<Poe> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
    }

    /// Earliest proof of existence for `id`.
    pub fn lowest(&self, id: &TokenId) -> Option<DateTime<Utc>> {
        self.get(id).map(|poe| poe.time)
    }

    /// Returns `true` if `id` is proven to exist at or before `time`.
    pub fn has_poe_before(&self, id: &TokenId, time: DateTime<Utc>) -> bool {
        self.lowest(id).is_some_and(|poe| poe <= time)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn earlier_time_replaces_later() {
        let poe = PoeSet::new();
        let id = TokenId::from_encoded(b"token");
        let t0 = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();

        assert!(poe.add(id, t0, None));
        assert!(poe.add(id, t0 - Duration::days(1), None));
        assert_eq!(poe.lowest(&id), Some(t0 - Duration::days(1)));
    }

    #[test]
    fn never_regresses() {
        let poe = PoeSet::new();
        let id = TokenId::from_encoded(b"token");
        let base = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();

        // arbitrary sequence of offsets
        let offsets = [5, 9, 3, 3, 12, 1, 7, 0, 4];
        let mut best = None;
        for days in offsets {
            poe.add(id, base + Duration::days(days), None);
            let lowest = poe.lowest(&id).unwrap();
            if let Some(previous) = best {
                assert!(lowest <= previous);
            }
            best = Some(lowest);
        }
        assert_eq!(best, Some(base));
    }

    #[test]
    fn unknown_token() {
        let poe = PoeSet::new();
        let id = TokenId::from_encoded(b"token");
        assert!(poe.lowest(&id).is_none());
        assert!(!poe.has_poe_before(&id, Utc::now()));
        assert!(poe.is_empty());
    }
}
