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

use thiserror::Error;

use crate::token::TokenError;

/// `Error` enumerates the fatal errors returned by validation operations.
///
/// Problems with individual pieces of evidence (an unparseable certificate, a
/// failed AIA download, a signature that does not verify) are never reported
/// through this type. They are attached to the report as annotations so that
/// every signature still receives a verdict.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Required configuration is missing or inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The trust resolver did not drain its worklist in time.
    #[error("trust resolution did not complete within {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },

    /// A [`ValidationContext`] can only be validated once.
    ///
    /// [`ValidationContext`]: crate::ValidationContext
    #[error("the validation context has already been validated")]
    ContextAlreadyValidated,

    #[error("bad parameter: {0}")]
    BadParam(String),

    /// The settings format is not recognized.
    #[error("type is unsupported")]
    UnsupportedType,

    #[error("settings version {0} is newer than this library supports")]
    VersionCompatibility(u32),

    /// A certificate handed directly to the API could not be decoded.
    #[error(transparent)]
    InvalidCertificate(#[from] TokenError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

/// A specialized `Result` type for validation operations.
pub type Result<T> = std::result::Result<T, Error>;
