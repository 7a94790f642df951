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

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]

pub mod conclusion;
pub use conclusion::{Conclusion, Indication, SubIndication};

mod error;
pub use error::{Error, Result};

pub mod http;
pub use http::{DataLoader, DataLoaderError, OfflineDataLoader, UreqDataLoader};

pub mod poe;
pub use poe::{Poe, PoeSet};

pub mod policy;
pub use policy::{PolicyConfig, ValidationPolicy};

pub mod process;

pub mod reports;
pub use reports::{SignatureReport, ValidationReport};

pub mod revocation_source;
pub use revocation_source::{EmbeddedRevocationSource, RevocationSource, RevocationSourceError};

pub mod settings;

pub mod signature;
pub use signature::SignatureInput;

pub mod token;

pub mod validation_context;
pub use validation_context::{ResolvedTokens, ResolverConfig, ValidationContext};

mod validator;
pub use validator::DocumentValidator;

pub use ades_crypto as crypto;
pub use ades_status_tracker as status_tracker;

#[cfg(test)]
pub(crate) mod tests;
