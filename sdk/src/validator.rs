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

use std::{borrow::Cow, sync::Arc, thread, time::Duration};

use ades_status_tracker::{log_item, message_codes, StatusTracker};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::{
    http::{DataLoader, OfflineDataLoader, UreqDataLoader},
    poe::PoeSet,
    process::{
        adest_validation, basic_validation, building_blocks, long_term_validation, RunContext,
    },
    reports::{SignatureReport, ValidationReport},
    revocation_source::{EmbeddedRevocationSource, RevocationSource},
    settings::{load_pem_certificates, Settings, SettingsValidate},
    signature::SignatureInput,
    token::{CertificatePool, CertificateToken, SourceTag, TrustServiceInfo},
    validation_context::{ResolverConfig, ValidationContext},
    Error, Result,
};

/// Validates the signatures of one document.
///
/// All signatures share one certificate pool, seeded with the configured
/// trust anchors, and one set of proofs of existence. Each signature gets
/// its own [`ValidationContext`].
///
/// # Example
/// ```no_run
/// use ades_validation::{settings::Settings, DocumentValidator};
///
/// let settings = Settings::from_toml(&std::fs::read_to_string("settings.toml")?)?;
/// let validator = DocumentValidator::new(settings)?;
///
/// let report = validator.validate(&[])?;
/// println!("{}", report.to_json());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct DocumentValidator {
    settings: Settings,
    pool: Arc<CertificatePool>,
    data_loader: Arc<dyn DataLoader>,
    online_sources: Vec<Arc<dyn RevocationSource>>,
    validation_time: Option<DateTime<Utc>>,
}

impl DocumentValidator {
    /// Create a validator and load the trust anchors named in `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let pool = Arc::new(CertificatePool::new());
        let trust = &settings.trust;

        let bundles = trust
            .trust_anchors
            .iter()
            .map(|pem| (pem, SourceTag::TrustedStore))
            .chain(
                trust
                    .trusted_list_anchors
                    .iter()
                    .map(|pem| (pem, SourceTag::TrustedList)),
            );
        for (pem, source) in bundles {
            for der in load_pem_certificates(pem)? {
                pool.add_trust_anchor(&der, source, None)?;
            }
        }

        for service in &trust.trusted_services {
            let info = TrustServiceInfo {
                service_name: service.name.clone(),
                status: service.status.clone(),
                expired_certs_revocation_info: service.expired_certs_revocation_info,
            };
            for der in load_pem_certificates(&service.certificates)? {
                pool.add_trust_anchor(&der, SourceTag::TrustedList, Some(info.clone()))?;
            }
        }

        let data_loader: Arc<dyn DataLoader> = if settings.network.enabled {
            Arc::new(UreqDataLoader::from_settings(&settings.network))
        } else {
            Arc::new(OfflineDataLoader)
        };

        debug!("validator: {} trust anchors loaded", pool.len());

        Ok(Self {
            settings,
            pool,
            data_loader,
            online_sources: Vec::new(),
            validation_time: None,
        })
    }

    /// Replace the loader used for AIA downloads and policy documents.
    pub fn with_data_loader(mut self, data_loader: Arc<dyn DataLoader>) -> Self {
        self.data_loader = data_loader;
        self
    }

    /// Add an online revocation source, consulted in the order added.
    pub fn with_online_source(mut self, source: Arc<dyn RevocationSource>) -> Self {
        self.online_sources.push(source);
        self
    }

    /// Validate as of `time` instead of the current time.
    pub fn with_validation_time(mut self, time: DateTime<Utc>) -> Self {
        self.validation_time = Some(time);
        self
    }

    pub fn add_trust_anchor(&self, der: &[u8], source: SourceTag) -> Result<Arc<CertificateToken>> {
        Ok(self.pool.add_trust_anchor(der, source, None)?)
    }

    pub fn pool(&self) -> &Arc<CertificatePool> {
        &self.pool
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate `signatures`. Signatures are processed in parallel.
    ///
    /// Fails only when no trust anchor is configured or when trust
    /// resolution for a signature exceeds the configured timeout. Every
    /// other problem is reported in the returned [`ValidationReport`].
    pub fn validate(&self, signatures: &[SignatureInput]) -> Result<ValidationReport> {
        if self.pool.trusted_certificates().is_empty() {
            return Err(Error::Configuration("no trust anchors configured".into()));
        }

        let validation_time = self.validation_time.unwrap_or_else(Utc::now);
        let poe = PoeSet::new();

        let reports = thread::scope(|scope| {
            let handles: Vec<_> = signatures
                .iter()
                .map(|sig| scope.spawn(|| self.validate_signature(sig, validation_time, &poe)))
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(ValidationReport {
            validation_time,
            policy_name: self.settings.policy.name.clone(),
            signatures: reports,
        })
    }

    fn validate_signature(
        &self,
        sig: &SignatureInput,
        validation_time: DateTime<Utc>,
        poe: &PoeSet,
    ) -> Result<SignatureReport> {
        let mut log = StatusTracker::default();

        let context = ValidationContext::new(
            Arc::clone(&self.pool),
            ResolverConfig::from(&self.settings.resolver),
            Arc::clone(&self.data_loader),
            self.online_sources.clone(),
            Arc::new(EmbeddedRevocationSource::new(sig.revocations.clone())),
        );

        for der in &sig.certificates {
            match self.pool.get_or_create(der, SourceTag::Signature) {
                Ok(cert) => {
                    context.add_certificate(cert);
                }
                Err(e) => {
                    warn!("{}: dropped embedded certificate: {e}", sig.id);
                    log_item!(
                        sig.id.clone(),
                        "Embedded certificate could not be decoded",
                        "validate_signature"
                    )
                    .message_id(message_codes::CTX_MALFORMED_TOKEN)
                    .attribute("error", &e)
                    .informational(&mut log);
                }
            }
        }
        for revocation in &sig.revocations {
            context.add_revocation(Arc::clone(revocation));
        }
        for timestamp in &sig.timestamps {
            context.add_timestamp(Arc::clone(timestamp));
        }

        let timeout = Duration::from_millis(self.settings.resolver.timeout_ms);
        let tokens = context.validate(validation_time, timeout)?;
        log.append(tokens.log());

        let sig = self.with_policy_document(sig, &mut log);

        let run = RunContext::new(&self.settings.policy, validation_time, &tokens, poe);
        let bbb = building_blocks(&run, &sig);
        let basic = basic_validation(&bbb, &sig.id);
        let adest = adest_validation(&run, &sig, &bbb, &basic);
        let ltv = long_term_validation(&run, &sig, &bbb, &adest);

        debug!(
            "{}: {} {:?}",
            sig.id, ltv.conclusion.indication, ltv.conclusion.sub_indication
        );

        Ok(SignatureReport::new(
            &sig.id,
            bbb,
            basic,
            adest,
            ltv,
            log.into_items(),
        ))
    }

    /// Download the signature policy document when the signature only
    /// names its location.
    fn with_policy_document<'s>(
        &self,
        sig: &'s SignatureInput,
        log: &mut StatusTracker,
    ) -> Cow<'s, SignatureInput> {
        let Some(url) = sig
            .policy
            .as_ref()
            .filter(|p| p.document.is_none())
            .and_then(|p| p.url.as_deref())
        else {
            return Cow::Borrowed(sig);
        };

        match self.data_loader.fetch(url) {
            Ok(document) => {
                let mut sig = sig.clone();
                if let Some(policy) = sig.policy.as_mut() {
                    policy.document = Some(document);
                }
                Cow::Owned(sig)
            }
            Err(e) => {
                info!("{}: policy document download from {url} failed: {e}", sig.id);
                log_item!(
                    sig.id.clone(),
                    "Signature policy document could not be retrieved",
                    "with_policy_document"
                )
                .message_id(message_codes::CTX_POLICY_UNAVAILABLE)
                .attribute("url", url)
                .attribute("error", &e)
                .informational(log);
                Cow::Borrowed(sig)
            }
        }
    }
}
