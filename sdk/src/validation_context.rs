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

//! The trust resolver.
//!
//! A [`ValidationContext`] collects the tokens of one signature and, when
//! validated, resolves every issuer chain and looks up revocation evidence
//! for every certificate it reaches. Newly discovered issuers and revocation
//! tokens are processed in turn until nothing is left to do.
//!
//! Work is spread over a small pool of worker threads sharing one worklist.
//! The worklist, the set of known token ids and the count of busy workers
//! live under a single mutex, so the driver can decide termination
//! (nothing pending and nobody busy) without racing a worker that is about
//! to register new work.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError,
    },
    thread,
    time::{Duration, Instant},
};

use ades_status_tracker::{log_item, message_codes, LogItem, StatusTracker};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::{
    http::{DataLoader, DataLoaderError},
    revocation_source::RevocationSource,
    settings,
    token::{
        certificate_chain, CertificatePool, CertificateToken, RevocationToken, SourceTag,
        TimestampToken, Token, TokenId,
    },
    Error, Result,
};

const LOG_LABEL: &str = "resolver";

/// Resolver behavior switches.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolverConfig {
    pub max_workers: usize,
    pub fetch_aia: bool,
    pub online_revocation: bool,
    pub check_expired_certificates: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        (&settings::Resolver::default()).into()
    }
}

impl From<&settings::Resolver> for ResolverConfig {
    fn from(resolver: &settings::Resolver) -> Self {
        Self {
            max_workers: resolver.max_workers,
            fetch_aia: resolver.fetch_aia,
            online_revocation: resolver.online_revocation,
            check_expired_certificates: resolver.check_expired_certificates,
        }
    }
}

#[derive(Clone)]
enum WorkItem {
    Certificate(Arc<CertificateToken>),
    Revocation(Arc<RevocationToken>),
    Timestamp(Arc<TimestampToken>),
}

impl WorkItem {
    fn token(&self) -> &dyn Token {
        match self {
            Self::Certificate(cert) => cert.as_ref(),
            Self::Revocation(revocation) => revocation.as_ref(),
            Self::Timestamp(timestamp) => timestamp.as_ref(),
        }
    }
}

#[derive(Default)]
struct WorkState {
    known: HashSet<TokenId>,
    pending: VecDeque<WorkItem>,
    active: usize,
    finished: bool,
    registered: Vec<WorkItem>,
}

struct Shared {
    pool: Arc<CertificatePool>,
    config: ResolverConfig,
    data_loader: Arc<dyn DataLoader>,
    online_sources: Vec<Arc<dyn RevocationSource>>,
    offline_source: Arc<dyn RevocationSource>,

    state: Mutex<WorkState>,
    work_changed: Condvar,
    cancelled: AtomicBool,
    current_time: OnceLock<DateTime<Utc>>,

    processing_counts: Mutex<HashMap<TokenId, usize>>,
    revocations_by_certificate: Mutex<HashMap<TokenId, Vec<Arc<RevocationToken>>>>,
    log: Mutex<StatusTracker>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decrements the busy-worker count when a work item is done, even if its
/// processing panicked.
struct ActiveGuard<'a>(&'a Shared);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(&self.0.state);
        state.active = state.active.saturating_sub(1);
        self.0.work_changed.notify_all();
    }
}

impl Shared {
    fn now(&self) -> DateTime<Utc> {
        self.current_time.get().copied().unwrap_or_else(Utc::now)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn log(&self, item: LogItem) {
        item.informational(&mut lock(&self.log));
    }

    /// Queue `item` unless a token with the same id was seen before.
    fn register(&self, item: WorkItem) -> bool {
        let id = item.token().id();
        let mut state = lock(&self.state);

        if !state.known.insert(id) {
            return false;
        }

        debug!("resolver: registered {}", item.token().abbreviation());
        state.registered.push(item.clone());
        state.pending.push_back(item);
        self.work_changed.notify_all();
        true
    }

    fn run_worker(&self) {
        loop {
            let item = {
                let mut state = lock(&self.state);
                loop {
                    if state.finished || self.is_cancelled() {
                        return;
                    }
                    if let Some(item) = state.pending.pop_front() {
                        state.active += 1;
                        break item;
                    }
                    state = self
                        .work_changed
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            };

            let _active = ActiveGuard(self);
            self.process(&item);
        }
    }

    fn process(&self, item: &WorkItem) {
        *lock(&self.processing_counts)
            .entry(item.token().id())
            .or_default() += 1;

        match item {
            WorkItem::Certificate(cert) => {
                self.resolve_issuer(cert.as_ref(), &mut HashSet::new());
                self.check_revocation(cert);
            }
            WorkItem::Revocation(revocation) => {
                self.register_embedded_certificates(revocation.as_ref(), SourceTag::Revocation);
                self.resolve_issuer(revocation.as_ref(), &mut HashSet::new());
            }
            WorkItem::Timestamp(timestamp) => {
                self.register_embedded_certificates(timestamp.as_ref(), SourceTag::Timestamp);
                self.resolve_issuer(timestamp.as_ref(), &mut HashSet::new());
            }
        }
    }

    fn register_embedded_certificates(&self, token: &dyn Token, source: SourceTag) {
        for der in token.embedded_certificates() {
            match self.pool.get_or_create(der, source) {
                Ok(cert) => {
                    self.register(WorkItem::Certificate(cert));
                }
                Err(e) => {
                    warn!(
                        "resolver: dropped certificate embedded in {}: {e}",
                        token.abbreviation()
                    );
                    self.log(
                        log_item!(LOG_LABEL, "Embedded certificate could not be decoded", "process")
                            .message_id(message_codes::CTX_MALFORMED_TOKEN)
                            .attribute("token", token.abbreviation())
                            .attribute("error", &e),
                    );
                }
            }
        }
    }

    /// Link the issuer of `token` and, eagerly, the issuers above it.
    fn resolve_issuer(&self, token: &dyn Token, visited: &mut HashSet<TokenId>) {
        if self.is_cancelled() || !visited.insert(token.id()) {
            return;
        }

        if token.is_self_signed() || token.is_trusted() {
            return;
        }

        let issuer = match token.issuer_token() {
            Some(issuer) => issuer,
            None => match self.find_issuer(token) {
                Some(found) => {
                    if token.set_issuer(Arc::clone(&found)) {
                        debug!(
                            "resolver: issuer of {} is {}",
                            token.abbreviation(),
                            found.abbreviation()
                        );
                    }
                    token.issuer_token().unwrap_or(found)
                }
                None => {
                    info!(
                        "resolver: no issuer found for {} ({})",
                        token.abbreviation(),
                        token.issuer_principal()
                    );
                    self.log(
                        log_item!(LOG_LABEL, "Issuer certificate not found", "resolve_issuer")
                            .message_id(message_codes::CTX_ISSUER_NOT_FOUND)
                            .attribute("token", token.abbreviation())
                            .attribute("issuer", token.issuer_principal()),
                    );
                    return;
                }
            },
        };

        self.register(WorkItem::Certificate(Arc::clone(&issuer)));
        self.resolve_issuer(issuer.as_ref(), visited);
    }

    fn find_issuer(&self, token: &dyn Token) -> Option<Arc<CertificateToken>> {
        let candidates = self.pool.find_by_subject(token.issuer_principal());
        if let Some(issuer) = candidates.into_iter().find(|c| token.is_signed_by(c)) {
            return Some(issuer);
        }

        if !self.config.fetch_aia {
            return None;
        }

        for url in token.ca_issuers_urls() {
            if self.is_cancelled() {
                return None;
            }

            let ders = match self.fetch_certificates(url) {
                Ok(ders) => ders,
                Err(e) => {
                    info!("resolver: AIA download from {url} failed: {e}");
                    self.log(
                        log_item!(LOG_LABEL, "Issuer download failed", "find_issuer")
                            .message_id(message_codes::CTX_AIA_FAILURE)
                            .attribute("token", token.abbreviation())
                            .attribute("url", url)
                            .attribute("error", &e),
                    );
                    continue;
                }
            };

            for der in ders {
                match self.pool.get_or_create(&der, SourceTag::Aia) {
                    Ok(candidate) if token.is_signed_by(&candidate) => return Some(candidate),
                    Ok(candidate) => {
                        debug!(
                            "resolver: {} from {url} did not sign {}",
                            candidate.abbreviation(),
                            token.abbreviation()
                        );
                    }
                    Err(e) => {
                        warn!("resolver: certificate downloaded from {url} is malformed: {e}");
                        self.log(
                            log_item!(
                                LOG_LABEL,
                                "Downloaded certificate is malformed",
                                "find_issuer"
                            )
                            .message_id(message_codes::CTX_MALFORMED_TOKEN)
                                .attribute("url", url)
                                .attribute("error", &e),
                        );
                    }
                }
            }
        }

        None
    }

    /// Download a DER certificate or a PEM bundle.
    fn fetch_certificates(&self, url: &str) -> std::result::Result<Vec<Vec<u8>>, DataLoaderError> {
        let bytes = self.data_loader.fetch(url)?;

        if !bytes.starts_with(b"-----BEGIN") {
            return Ok(vec![bytes]);
        }

        let mut ders = Vec::new();
        for pem in x509_parser::pem::Pem::iter_from_buffer(&bytes) {
            let pem = pem.map_err(|e| DataLoaderError::Other(format!("invalid PEM: {e}")))?;
            ders.push(pem.contents);
        }
        Ok(ders)
    }

    fn is_fresh(&self, token: &RevocationToken, time: DateTime<Utc>) -> bool {
        self.online_sources
            .iter()
            .chain(std::iter::once(&self.offline_source))
            .any(|source| source.is_fresh(token, time))
    }

    fn check_revocation(&self, cert: &Arc<CertificateToken>) {
        if self.is_cancelled()
            || cert.is_self_signed()
            || cert.is_trusted()
            || cert.is_revocation_check_exempt()
        {
            return;
        }

        let now = self.now();

        if let Some(existing) = cert.revocation_token() {
            if self.is_fresh(&existing, now) {
                debug!(
                    "resolver: {} already has fresh revocation data {}",
                    cert.abbreviation(),
                    existing.abbreviation()
                );
                self.record_revocation(cert, existing);
                return;
            }
        }

        let Some(issuer) = cert.issuer_token() else {
            self.log(
                log_item!(LOG_LABEL, "Revocation not checked: issuer unknown", "check_revocation")
                    .message_id(message_codes::CTX_NO_REVOCATION)
                    .attribute("certificate", cert.abbreviation()),
            );
            return;
        };

        let mut found = None;

        if self.config.online_revocation && self.online_check_allowed(cert, &issuer, now) {
            found = self
                .online_sources
                .iter()
                .find_map(|source| self.query_source(source.as_ref(), cert, &issuer));
        }

        if found.is_none() {
            found = self.query_source(self.offline_source.as_ref(), cert, &issuer);
        }

        match found {
            Some(token) => {
                debug!(
                    "resolver: revocation data for {} is {}",
                    cert.abbreviation(),
                    token.abbreviation()
                );
                cert.set_revocation(Arc::clone(&token));
                self.record_revocation(cert, token);
            }
            None => {
                info!("resolver: no revocation data for {}", cert.abbreviation());
                self.log(
                    log_item!(LOG_LABEL, "No revocation data found", "check_revocation")
                        .message_id(message_codes::CTX_NO_REVOCATION)
                        .attribute("certificate", cert.abbreviation()),
                );
            }
        }
    }

    fn query_source(
        &self,
        source: &dyn RevocationSource,
        cert: &CertificateToken,
        issuer: &CertificateToken,
    ) -> Option<Arc<RevocationToken>> {
        match source.find(cert, issuer) {
            Ok(found) => found,
            Err(e) => {
                info!(
                    "resolver: revocation lookup for {} failed: {e}",
                    cert.abbreviation()
                );
                self.log(
                    log_item!(LOG_LABEL, "Revocation lookup failed", "check_revocation")
                        .message_id(message_codes::CTX_REVOCATION_FAILURE)
                        .attribute("certificate", cert.abbreviation())
                        .attribute("error", &e),
                );
                None
            }
        }
    }

    fn record_revocation(&self, cert: &CertificateToken, token: Arc<RevocationToken>) {
        {
            let mut by_cert = lock(&self.revocations_by_certificate);
            let entry = by_cert.entry(cert.id()).or_default();
            if !entry.iter().any(|r| r.id() == token.id()) {
                entry.push(Arc::clone(&token));
            }
        }
        self.register(WorkItem::Revocation(token));
    }

    /// Online lookups for an expired certificate only make sense when its
    /// issuer keeps publishing status for expired certificates.
    fn online_check_allowed(
        &self,
        cert: &CertificateToken,
        issuer: &Arc<CertificateToken>,
        now: DateTime<Utc>,
    ) -> bool {
        if cert.not_after() >= now {
            return true;
        }

        if !self.config.check_expired_certificates {
            return false;
        }

        if issuer.has_expired_certs_on_crl() {
            return true;
        }

        certificate_chain(issuer)
            .iter()
            .filter_map(|c| c.trust_service())
            .filter_map(|service| service.expired_certs_revocation_info)
            .any(|since| since < cert.not_after())
    }

    fn resolved(&self, current_time: DateTime<Utc>) -> ResolvedTokens {
        let registered = std::mem::take(&mut lock(&self.state).registered);

        let mut certificates = Vec::new();
        let mut revocations = Vec::new();
        let mut timestamps = Vec::new();
        for item in registered {
            match item {
                WorkItem::Certificate(cert) => certificates.push(cert),
                WorkItem::Revocation(revocation) => revocations.push(revocation),
                WorkItem::Timestamp(timestamp) => timestamps.push(timestamp),
            }
        }

        let mut revocations_by_certificate =
            std::mem::take(&mut *lock(&self.revocations_by_certificate));
        for cert in &certificates {
            let entry = revocations_by_certificate.entry(cert.id()).or_default();
            for revocation in revocations.iter().filter(|r| r.covers(cert)) {
                if !entry.iter().any(|r| r.id() == revocation.id()) {
                    entry.push(Arc::clone(revocation));
                }
            }
        }
        revocations_by_certificate.retain(|_, v| !v.is_empty());

        ResolvedTokens {
            pool: Arc::clone(&self.pool),
            certificates,
            revocations,
            timestamps,
            revocations_by_certificate,
            processing_counts: std::mem::take(&mut *lock(&self.processing_counts)),
            log: std::mem::take(&mut *lock(&self.log)),
            current_time,
        }
    }
}

/// Collects the tokens of one signature and resolves their trust chains.
///
/// A context is single-use: [`validate`](Self::validate) may be called once.
pub struct ValidationContext {
    shared: Arc<Shared>,
    validated: AtomicBool,
}

impl ValidationContext {
    pub fn new(
        pool: Arc<CertificatePool>,
        config: ResolverConfig,
        data_loader: Arc<dyn DataLoader>,
        online_sources: Vec<Arc<dyn RevocationSource>>,
        offline_source: Arc<dyn RevocationSource>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                pool,
                config,
                data_loader,
                online_sources,
                offline_source,
                state: Mutex::new(WorkState::default()),
                work_changed: Condvar::new(),
                cancelled: AtomicBool::new(false),
                current_time: OnceLock::new(),
                processing_counts: Mutex::new(HashMap::new()),
                revocations_by_certificate: Mutex::new(HashMap::new()),
                log: Mutex::new(StatusTracker::default()),
            }),
            validated: AtomicBool::new(false),
        }
    }

    pub fn pool(&self) -> &Arc<CertificatePool> {
        &self.shared.pool
    }

    /// Register a certificate. Returns `false` if it was already known.
    pub fn add_certificate(&self, cert: Arc<CertificateToken>) -> bool {
        self.shared.register(WorkItem::Certificate(cert))
    }

    /// Register revocation evidence. Returns `false` if it was already known.
    pub fn add_revocation(&self, revocation: Arc<RevocationToken>) -> bool {
        self.shared.register(WorkItem::Revocation(revocation))
    }

    /// Register a timestamp. Returns `false` if it was already known.
    pub fn add_timestamp(&self, timestamp: Arc<TimestampToken>) -> bool {
        self.shared.register(WorkItem::Timestamp(timestamp))
    }

    /// Resolve every registered token.
    ///
    /// Fails with [`Error::Timeout`] if the work does not complete within
    /// `timeout`; workers still blocked on the network are abandoned and
    /// their results discarded.
    pub fn validate(
        &self,
        current_time: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<ResolvedTokens> {
        if self.validated.swap(true, Ordering::AcqRel) {
            return Err(Error::ContextAlreadyValidated);
        }

        let _ = self.shared.current_time.set(current_time);
        let started = Instant::now();
        let deadline = started + timeout;

        for n in 0..self.shared.config.max_workers.max(1) {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(format!("ades-resolver-{n}"))
                .spawn(move || shared.run_worker());

            if let Err(e) = spawned {
                self.shutdown();
                return Err(Error::IoError(e));
            }
        }

        let mut state = lock(&self.shared.state);
        loop {
            if state.pending.is_empty() && state.active == 0 {
                state.finished = true;
                self.shared.work_changed.notify_all();
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                drop(state);
                self.shutdown();

                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                warn!("resolver: timed out after {elapsed_ms} ms");
                return Err(Error::Timeout { elapsed_ms });
            }

            state = self
                .shared
                .work_changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        drop(state);

        debug!(
            "resolver: finished in {} ms",
            started.elapsed().as_millis()
        );

        Ok(self.shared.resolved(current_time))
    }

    fn shutdown(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
        let mut state = lock(&self.shared.state);
        state.finished = true;
        self.shared.work_changed.notify_all();
    }
}

impl Drop for ValidationContext {
    fn drop(&mut self) {
        // Idle workers wait on the condvar; release them.
        self.shutdown();
    }
}

/// The result of trust resolution for one signature.
#[derive(Debug)]
pub struct ResolvedTokens {
    pool: Arc<CertificatePool>,
    certificates: Vec<Arc<CertificateToken>>,
    revocations: Vec<Arc<RevocationToken>>,
    timestamps: Vec<Arc<TimestampToken>>,
    revocations_by_certificate: HashMap<TokenId, Vec<Arc<RevocationToken>>>,
    processing_counts: HashMap<TokenId, usize>,
    log: StatusTracker,
    current_time: DateTime<Utc>,
}

impl ResolvedTokens {
    pub fn pool(&self) -> &Arc<CertificatePool> {
        &self.pool
    }

    /// Certificates reached during resolution, in registration order.
    pub fn certificates(&self) -> &[Arc<CertificateToken>] {
        &self.certificates
    }

    pub fn revocations(&self) -> &[Arc<RevocationToken>] {
        &self.revocations
    }

    pub fn timestamps(&self) -> &[Arc<TimestampToken>] {
        &self.timestamps
    }

    /// All revocation evidence known for `cert`.
    pub fn revocations_for(&self, cert: &CertificateToken) -> &[Arc<RevocationToken>] {
        self.revocations_by_certificate
            .get(&cert.id())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The most recently produced revocation evidence for `cert` whose
    /// signer was resolved.
    pub fn latest_revocation(&self, cert: &CertificateToken) -> Option<Arc<RevocationToken>> {
        self.revocations_for(cert)
            .iter()
            .filter(|r| r.issuer_token().is_some())
            .max_by_key(|r| r.production_time())
            .cloned()
    }

    /// How many times the resolver processed the token `id`.
    pub fn processing_count(&self, id: &TokenId) -> usize {
        self.processing_counts.get(id).copied().unwrap_or_default()
    }

    /// The resolved chain of `cert`, starting with `cert`.
    pub fn certificate_chain(&self, cert: &Arc<CertificateToken>) -> Vec<Arc<CertificateToken>> {
        certificate_chain(cert)
    }

    /// Annotations produced while resolving.
    pub fn log(&self) -> &StatusTracker {
        &self.log
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use ades_crypto::raw_signature::SignatureAlgorithm;
    use chrono::TimeZone;

    use super::*;
    use crate::{
        http::{DataLoaderError, MockDataLoader, OfflineDataLoader},
        revocation_source::{EmbeddedRevocationSource, MockRevocationSource},
        tests::pki::{self, CertSpec},
        token::{RevocationData, RevocationKind, RevocationOrigin, RevocationStatus, TokenSignature},
    };

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn context(
        pool: &Arc<CertificatePool>,
        loader: Arc<dyn DataLoader>,
        online: Vec<Arc<dyn RevocationSource>>,
    ) -> ValidationContext {
        ValidationContext::new(
            Arc::clone(pool),
            ResolverConfig::default(),
            loader,
            online,
            Arc::new(EmbeddedRevocationSource::default()),
        )
    }

    #[test]
    fn resolves_issuer_through_aia() {
        let root = pki::self_signed(&CertSpec::ca("Test Root"));
        let leaf = pki::issue(
            &CertSpec::leaf("Leaf").with_ca_issuers("http://ca.test/root.cer"),
            &root,
        );

        let pool = Arc::new(CertificatePool::new());
        let leaf_token = pool.get_or_create(&leaf.der, SourceTag::Signature).unwrap();

        let root_der = root.der.clone();
        let mut loader = MockDataLoader::new();
        loader
            .expect_fetch()
            .withf(|url| url.ends_with("/root.cer"))
            .times(1)
            .returning(move |_| Ok(root_der.clone()));

        let ctx = context(&pool, Arc::new(loader), vec![]);
        ctx.add_certificate(Arc::clone(&leaf_token));
        let resolved = ctx.validate(Utc::now(), Duration::from_secs(10)).unwrap();

        let issuer = leaf_token.issuer_token().unwrap();
        assert_eq!(issuer.der(), root.der.as_slice());
        assert!(issuer.sources().contains(&SourceTag::Aia));
        assert_eq!(resolved.certificates().len(), 2);
    }

    #[test]
    fn aia_failure_is_logged_not_raised() {
        let root = pki::self_signed(&CertSpec::ca("Test Root"));
        let leaf = pki::issue(
            &CertSpec::leaf("Leaf").with_ca_issuers("http://ca.test/root.cer"),
            &root,
        );

        let pool = Arc::new(CertificatePool::new());
        let leaf_token = pool.get_or_create(&leaf.der, SourceTag::Signature).unwrap();

        let mut loader = MockDataLoader::new();
        loader.expect_fetch().returning(|url| {
            Err(DataLoaderError::Status {
                uri: url.to_string(),
                status: 404,
            })
        });

        let ctx = context(&pool, Arc::new(loader), vec![]);
        ctx.add_certificate(Arc::clone(&leaf_token));
        let resolved = ctx.validate(Utc::now(), Duration::from_secs(10)).unwrap();

        assert!(leaf_token.issuer_token().is_none());
        assert!(resolved.log().has_message(message_codes::CTX_AIA_FAILURE));
        assert!(resolved.log().has_message(message_codes::CTX_ISSUER_NOT_FOUND));
    }

    #[test]
    fn online_source_consulted_for_valid_certificate() {
        let root = pki::self_signed(&CertSpec::ca("Test Root"));
        let leaf = pki::issue(&CertSpec::leaf("Leaf"), &root);

        let pool = Arc::new(CertificatePool::new());
        pool.add_trust_anchor(&root.der, SourceTag::TrustedStore, None)
            .unwrap();
        let leaf_token = pool.get_or_create(&leaf.der, SourceTag::Signature).unwrap();

        let mut online = MockRevocationSource::new();
        online.expect_find().times(1).returning(|_, _| Ok(None));

        let ctx = context(&pool, Arc::new(OfflineDataLoader), vec![Arc::new(online)]);
        ctx.add_certificate(leaf_token);
        let resolved = ctx.validate(Utc::now(), Duration::from_secs(10)).unwrap();

        assert!(resolved.log().has_message(message_codes::CTX_NO_REVOCATION));
    }

    #[test]
    fn online_source_skipped_for_expired_certificate() {
        let root = pki::self_signed(&CertSpec::ca("Test Root"));
        let leaf = pki::issue(&CertSpec::leaf("Leaf").valid_between(2010, 2012), &root);

        let pool = Arc::new(CertificatePool::new());
        pool.add_trust_anchor(&root.der, SourceTag::TrustedStore, None)
            .unwrap();
        let leaf_token = pool.get_or_create(&leaf.der, SourceTag::Signature).unwrap();

        let mut online = MockRevocationSource::new();
        online.expect_find().never();

        let ctx = context(&pool, Arc::new(OfflineDataLoader), vec![Arc::new(online)]);
        ctx.add_certificate(leaf_token);
        ctx.validate(at(2020, 1, 1), Duration::from_secs(10)).unwrap();
    }

    #[test]
    fn online_source_forced_by_expired_certs_on_crl() {
        let root = pki::self_signed(&CertSpec::ca("Test Root").with_expired_certs_on_crl(2000));
        let leaf = pki::issue(&CertSpec::leaf("Leaf").valid_between(2010, 2012), &root);

        let pool = Arc::new(CertificatePool::new());
        let root_token = pool
            .add_trust_anchor(&root.der, SourceTag::TrustedStore, None)
            .unwrap();
        assert!(root_token.has_expired_certs_on_crl());
        let leaf_token = pool.get_or_create(&leaf.der, SourceTag::Signature).unwrap();

        let mut online = MockRevocationSource::new();
        online.expect_find().times(1).returning(|_, _| Ok(None));

        let ctx = context(&pool, Arc::new(OfflineDataLoader), vec![Arc::new(online)]);
        ctx.add_certificate(leaf_token);
        ctx.validate(at(2020, 1, 1), Duration::from_secs(10)).unwrap();
    }

    #[test]
    fn ocsp_responder_with_nocheck_is_exempt() {
        let root = pki::self_signed(&CertSpec::ca("Test Root"));
        let responder = pki::issue(&CertSpec::ocsp_responder("Responder"), &root);

        let pool = Arc::new(CertificatePool::new());
        pool.add_trust_anchor(&root.der, SourceTag::TrustedStore, None)
            .unwrap();
        let responder_token = pool
            .get_or_create(&responder.der, SourceTag::Revocation)
            .unwrap();
        assert!(responder_token.is_revocation_check_exempt());

        let mut online = MockRevocationSource::new();
        online.expect_find().never();

        let ctx = context(&pool, Arc::new(OfflineDataLoader), vec![Arc::new(online)]);
        ctx.add_certificate(responder_token);
        let resolved = ctx.validate(Utc::now(), Duration::from_secs(10)).unwrap();
        assert!(!resolved.log().has_message(message_codes::CTX_NO_REVOCATION));
    }

    fn good_crl(
        root: &pki::Issued,
        root_token: &CertificateToken,
        leaf: &CertificateToken,
        this_update: DateTime<Utc>,
    ) -> Arc<RevocationToken> {
        let tbs = format!("crl|{}|good|{this_update}", leaf.id()).into_bytes();

        Arc::new(RevocationToken::new(RevocationData {
            kind: RevocationKind::Crl,
            origin: RevocationOrigin::Embedded,
            status: RevocationStatus::Good,
            revocation_time: None,
            reason: None,
            production_time: this_update,
            next_update: Some(this_update + chrono::Duration::days(30)),
            certificate_issuer: root_token.subject().clone(),
            certificate_serial: leaf.serial().to_vec(),
            issuer: root_token.subject().clone(),
            signature: TokenSignature {
                algorithm: SignatureAlgorithm::EcdsaSha256,
                value: root.sign(&tbs),
                signed_content: tbs.clone(),
            },
            encoded: tbs,
            certificates: Vec::new(),
        }))
    }

    #[test]
    fn fresh_revocation_data_is_not_fetched_again() {
        let root = pki::self_signed(&CertSpec::ca("Test Root"));
        let leaf = pki::issue(&CertSpec::leaf("Leaf"), &root);

        let pool = Arc::new(CertificatePool::new());
        let root_token = pool
            .add_trust_anchor(&root.der, SourceTag::TrustedStore, None)
            .unwrap();
        let leaf_token = pool.get_or_create(&leaf.der, SourceTag::Signature).unwrap();
        let crl = good_crl(&root, &root_token, &leaf_token, at(2020, 1, 1));

        let first = ValidationContext::new(
            Arc::clone(&pool),
            ResolverConfig::default(),
            Arc::new(OfflineDataLoader),
            vec![],
            Arc::new(EmbeddedRevocationSource::new(vec![Arc::clone(&crl)])),
        );
        first.add_certificate(Arc::clone(&leaf_token));
        first
            .validate(at(2020, 1, 10), Duration::from_secs(10))
            .unwrap();
        assert_eq!(leaf_token.revocation_token().unwrap().id(), crl.id());

        // The pool is shared, so the second run sees the evidence found by
        // the first one.
        let mut offline = MockRevocationSource::new();
        offline.expect_find().never();
        offline
            .expect_is_fresh()
            .returning(|token, time| token.next_update().is_some_and(|next| time <= next));

        let second = ValidationContext::new(
            Arc::clone(&pool),
            ResolverConfig::default(),
            Arc::new(OfflineDataLoader),
            vec![],
            Arc::new(offline),
        );
        second.add_certificate(Arc::clone(&leaf_token));
        let resolved = second
            .validate(at(2020, 1, 20), Duration::from_secs(10))
            .unwrap();

        let found = resolved.revocations_for(&leaf_token);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), crl.id());
        assert!(!resolved.log().has_message(message_codes::CTX_NO_REVOCATION));
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let root = pki::self_signed(&CertSpec::ca("Test Root"));

        let pool = Arc::new(CertificatePool::new());
        let token = pool.get_or_create(&root.der, SourceTag::Signature).unwrap();

        let ctx = context(&pool, Arc::new(OfflineDataLoader), vec![]);
        assert!(ctx.add_certificate(Arc::clone(&token)));
        assert!(!ctx.add_certificate(Arc::clone(&token)));

        let again = Arc::new(CertificateToken::from_der(&root.der).unwrap());
        assert!(!ctx.add_certificate(again));

        let resolved = ctx.validate(Utc::now(), Duration::from_secs(10)).unwrap();
        assert_eq!(resolved.processing_count(&token.id()), 1);
    }

    #[test]
    fn second_validate_fails() {
        let pool = Arc::new(CertificatePool::new());
        let ctx = context(&pool, Arc::new(OfflineDataLoader), vec![]);

        ctx.validate(Utc::now(), Duration::from_secs(1)).unwrap();
        assert!(matches!(
            ctx.validate(Utc::now(), Duration::from_secs(1)),
            Err(Error::ContextAlreadyValidated)
        ));
    }
}
