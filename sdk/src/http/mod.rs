// Copyright 2024 Adobe. All rights reserved.
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

//! Network access.
//!
//! Validation reaches the network in two places:
//! - the trust resolver downloads missing issuer certificates from
//!   Authority Information Access (caIssuers) locations;
//! - the document validator downloads signature policy documents.
//!
//! Online revocation sources are free to use a [`DataLoader`] as well.
//!
//! Host applications can plug in their own loader, or disable networking
//! entirely with [`OfflineDataLoader`].

use std::io;

use thiserror::Error;

mod ureq;
pub use self::ureq::UreqDataLoader;

/// Fetches the content behind a URL.
#[cfg_attr(test, mockall::automock)]
pub trait DataLoader: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DataLoaderError>;
}

/// A [`DataLoader`] that refuses every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineDataLoader;

impl DataLoader for OfflineDataLoader {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, DataLoaderError> {
        Err(DataLoaderError::Offline {
            uri: url.to_owned(),
        })
    }
}

/// Describes errors that can occur when fetching remote content.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataLoaderError {
    /// The URL could not be parsed.
    #[error("invalid URL \"{uri}\": {reason}")]
    InvalidUrl { uri: String, reason: String },

    /// The scheme of the URL is not in the allowed list.
    #[error("remote URI \"{uri}\" is not permitted by the allowed list")]
    UriDisallowed { uri: String },

    /// Network access is disabled.
    #[error("network access is disabled; could not fetch \"{uri}\"")]
    Offline { uri: String },

    /// The server answered with an error status.
    #[error("HTTP status {status} for \"{uri}\"")]
    Status { uri: String, status: u16 },

    #[error(transparent)]
    Io(#[from] io::Error),

    /// An error occurred in the underlying HTTP client.
    #[error("an error occurred in the http client: {0}")]
    Other(String),
}
