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

//! Sources of CRL and OCSP evidence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    http::DataLoaderError,
    token::{CertificateToken, RevocationToken},
};

/// Looks up revocation evidence for a certificate.
///
/// Online implementations (OCSP responders, CRL distribution points) are
/// provided by the host application; [`EmbeddedRevocationSource`] serves the
/// evidence shipped with a signature.
#[cfg_attr(test, mockall::automock)]
pub trait RevocationSource: Send + Sync {
    /// Find evidence about `certificate`, issued by `issuer`.
    fn find(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
    ) -> Result<Option<Arc<RevocationToken>>, RevocationSourceError>;

    /// Returns `true` if `token` may still be relied on at `time` without
    /// fetching newer evidence.
    fn is_fresh(&self, token: &RevocationToken, time: DateTime<Utc>) -> bool {
        token.next_update().is_some_and(|next| time <= next)
    }
}

/// Describes errors that can occur when looking up revocation evidence.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RevocationSourceError {
    #[error(transparent)]
    Network(#[from] DataLoaderError),

    /// The response could not be decoded.
    #[error("malformed revocation data: {0}")]
    Malformed(String),

    #[error("revocation source error: {0}")]
    Other(String),
}

/// Revocation evidence shipped inside a signature.
#[derive(Debug, Default)]
pub struct EmbeddedRevocationSource {
    tokens: Vec<Arc<RevocationToken>>,
}

impl EmbeddedRevocationSource {
    pub fn new(tokens: Vec<Arc<RevocationToken>>) -> Self {
        Self { tokens }
    }
}

impl RevocationSource for EmbeddedRevocationSource {
    /// Returns the most recently produced token covering `certificate`.
    fn find(
        &self,
        certificate: &CertificateToken,
        _issuer: &CertificateToken,
    ) -> Result<Option<Arc<RevocationToken>>, RevocationSourceError> {
        Ok(self
            .tokens
            .iter()
            .filter(|token| token.covers(certificate))
            .max_by_key(|token| token.production_time())
            .cloned())
    }
}
