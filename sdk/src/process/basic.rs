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

use super::BuildingBlocks;
use crate::conclusion::{Conclusion, Indication, SubIndication};

/// Failures the AdES-T process gets a second chance at.
pub(crate) fn is_forwarded(conclusion: &Conclusion) -> bool {
    conclusion.indication == Indication::Indeterminate
        && matches!(
            conclusion.sub_indication,
            Some(
                SubIndication::CryptoConstraintsFailureNoPoe
                    | SubIndication::RevokedNoPoe
                    | SubIndication::OutOfBoundsNoPoe
            )
        )
}

/// Validation of a basic signature: the building blocks verdict, placed
/// under `<id>/basic`.
pub fn basic_validation(bbb: &BuildingBlocks, signature_id: &str) -> Conclusion {
    Conclusion::relocated(&bbb.conclusion, format!("{signature_id}/basic"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ca_revocation_is_not_forwarded() {
        let revoked = |sub| Conclusion::new(Indication::Indeterminate, Some(sub), "S-1/basic");

        assert!(is_forwarded(&revoked(SubIndication::RevokedNoPoe)));
        assert!(is_forwarded(&revoked(SubIndication::OutOfBoundsNoPoe)));
        assert!(!is_forwarded(&revoked(SubIndication::RevokedCaNoPoe)));
        assert!(!is_forwarded(&Conclusion::valid("S-1/basic")));
    }
}
