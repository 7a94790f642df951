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

//! The validation processes.
//!
//! Each process is a free function taking a [`RunContext`] and returning
//! its result by value. The stages chain as
//! [`building_blocks`] → [`basic_validation`] → [`adest_validation`] →
//! [`long_term_validation`], the last one calling
//! [`past_signature_validation`] when proofs of existence were found.

use chrono::{DateTime, Utc};

use crate::{poe::PoeSet, policy::ValidationPolicy, validation_context::ResolvedTokens};

mod adest;
mod basic;
mod bbb;
mod checks;
mod ltv;
mod past_signature;

pub use adest::{adest_validation, update_best_signature_time, AdesTResult, TimestampValidation};
pub use basic::basic_validation;
pub use bbb::{building_blocks, timestamp_building_blocks, BuildingBlocks, CryptoFailure};
pub use ltv::{long_term_validation, LongTermResult};
pub use past_signature::past_signature_validation;

/// Everything a process may read. Nothing in it is mutated by the
/// processes except the proof of existence set.
#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    pub policy: &'a ValidationPolicy,

    /// Validation time for current-time checks.
    pub current_time: DateTime<Utc>,

    /// Output of the trust resolver for the signature being validated.
    pub tokens: &'a ResolvedTokens,
    pub poe: &'a PoeSet,
}

impl<'a> RunContext<'a> {
    pub fn new(
        policy: &'a ValidationPolicy,
        current_time: DateTime<Utc>,
        tokens: &'a ResolvedTokens,
        poe: &'a PoeSet,
    ) -> Self {
        Self {
            policy,
            current_time,
            tokens,
            poe,
        }
    }
}
