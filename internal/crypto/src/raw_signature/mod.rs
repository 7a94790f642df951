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

//! Verification of raw signatures over arbitrary byte strings.

pub(crate) mod oids;

mod signing_alg;
pub use signing_alg::{EncryptionAlgorithm, SignatureAlgorithm, UnknownAlgorithmError};

mod validator;
pub use validator::{
    validator_for_signature_algorithm, verify, RawSignatureValidationError, RawSignatureValidator,
};

pub(crate) mod validators;
