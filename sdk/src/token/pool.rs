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

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use log::debug;

use super::{CertificateToken, Principal, SourceTag, Token, TokenError, TokenId, TrustServiceInfo};

#[derive(Debug, Default)]
struct PoolInner {
    by_id: HashMap<TokenId, Arc<CertificateToken>>,
    by_subject: HashMap<Vec<u8>, Vec<TokenId>>,
}

/// The set of all certificates known to a validation run.
///
/// The pool holds at most one [`CertificateToken`] per distinct certificate;
/// inserting the same certificate again only merges its source tags.
#[derive(Debug, Default)]
pub struct CertificatePool {
    inner: RwLock<PoolInner>,
}

impl CertificatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the token for `der`, creating it on first sight.
    pub fn get_or_create(
        &self,
        der: &[u8],
        source: SourceTag,
    ) -> Result<Arc<CertificateToken>, TokenError> {
        let id = TokenId::from_encoded(der);
        if let Some(existing) = self.get(&id) {
            existing.add_source(source);
            return Ok(existing);
        }

        let token = CertificateToken::from_der(der)?;
        Ok(self.insert(token, source))
    }

    /// Add an already decoded certificate. If an equal certificate is present
    /// the existing token is returned.
    pub fn insert(&self, token: CertificateToken, source: SourceTag) -> Arc<CertificateToken> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let id = token.id();
        if let Some(existing) = inner.by_id.get(&id) {
            existing.add_source(source);
            return Arc::clone(existing);
        }

        token.add_source(source);
        let token = Arc::new(token);

        debug!(
            "certificate pool: added {} ({})",
            token.abbreviation(),
            token.subject()
        );

        inner
            .by_subject
            .entry(token.subject().raw().to_vec())
            .or_default()
            .push(id);
        inner.by_id.insert(id, Arc::clone(&token));

        token
    }

    /// Register a trust anchor, optionally with trusted list metadata.
    pub fn add_trust_anchor(
        &self,
        der: &[u8],
        source: SourceTag,
        trust_service: Option<TrustServiceInfo>,
    ) -> Result<Arc<CertificateToken>, TokenError> {
        let token = self.get_or_create(der, source)?;
        if let Some(info) = trust_service {
            token.set_trust_service(info);
        }
        Ok(token)
    }

    pub fn get(&self, id: &TokenId) -> Option<Arc<CertificateToken>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(id)
            .cloned()
    }

    /// All certificates whose subject is `principal`, in insertion order.
    pub fn find_by_subject(&self, principal: &Principal) -> Vec<Arc<CertificateToken>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        inner
            .by_subject
            .get(principal.raw())
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn trusted_certificates(&self) -> Vec<Arc<CertificateToken>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .values()
            .filter(|cert| cert.is_trusted())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
