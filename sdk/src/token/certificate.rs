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
    collections::{BTreeSet, HashSet},
    fmt,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use ades_crypto::{
    public_key::PublicKeyInfo,
    raw_signature::{self, SignatureAlgorithm},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use x509_parser::{
    der_parser::oid,
    extensions::{GeneralName, ParsedExtension},
    oid_registry::Oid,
    prelude::{FromDer, X509Certificate},
    time::ASN1Time,
};

use super::{Principal, RevocationToken, SourceTag, Token, TokenError, TokenId};

const OCSP_NOCHECK_OID: Oid<'static> = oid!(1.3.6 .1 .5 .5 .7 .48 .1 .5);
const EXPIRED_CERTS_ON_CRL_OID: Oid<'static> = oid!(2.5.29 .60);
const AD_OCSP_OID: Oid<'static> = oid!(1.3.6 .1 .5 .5 .7 .48 .1);
const AD_CA_ISSUERS_OID: Oid<'static> = oid!(1.3.6 .1 .5 .5 .7 .48 .2);

/// Key usage bits of a certificate.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyUsage {
    DigitalSignature,
    NonRepudiation,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    CrlSign,
    EncipherOnly,
    DecipherOnly,
}

impl KeyUsage {
    /// Name used in policy files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DigitalSignature => "digitalSignature",
            Self::NonRepudiation => "nonRepudiation",
            Self::KeyEncipherment => "keyEncipherment",
            Self::DataEncipherment => "dataEncipherment",
            Self::KeyAgreement => "keyAgreement",
            Self::KeyCertSign => "keyCertSign",
            Self::CrlSign => "crlSign",
            Self::EncipherOnly => "encipherOnly",
            Self::DecipherOnly => "decipherOnly",
        }
    }

    fn from_x509(ku: &x509_parser::extensions::KeyUsage) -> Vec<Self> {
        [
            (ku.digital_signature(), Self::DigitalSignature),
            (ku.non_repudiation(), Self::NonRepudiation),
            (ku.key_encipherment(), Self::KeyEncipherment),
            (ku.data_encipherment(), Self::DataEncipherment),
            (ku.key_agreement(), Self::KeyAgreement),
            (ku.key_cert_sign(), Self::KeyCertSign),
            (ku.crl_sign(), Self::CrlSign),
            (ku.encipher_only(), Self::EncipherOnly),
            (ku.decipher_only(), Self::DecipherOnly),
        ]
        .into_iter()
        .filter_map(|(set, usage)| set.then_some(usage))
        .collect()
    }
}

/// Extended key usage purposes of a certificate.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ExtendedKeyUsage {
    Any,
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
    Other(String),
}

impl ExtendedKeyUsage {
    /// Name used in policy files. Unknown purposes are named by OID.
    pub fn name(&self) -> String {
        match self {
            Self::Any => "anyExtendedKeyUsage".to_owned(),
            Self::ServerAuth => "serverAuth".to_owned(),
            Self::ClientAuth => "clientAuth".to_owned(),
            Self::CodeSigning => "codeSigning".to_owned(),
            Self::EmailProtection => "emailProtection".to_owned(),
            Self::TimeStamping => "timeStamping".to_owned(),
            Self::OcspSigning => "ocspSigning".to_owned(),
            Self::Other(oid) => oid.clone(),
        }
    }

    fn from_x509(eku: &x509_parser::extensions::ExtendedKeyUsage) -> Vec<Self> {
        let mut out: Vec<Self> = [
            (eku.any, Self::Any),
            (eku.server_auth, Self::ServerAuth),
            (eku.client_auth, Self::ClientAuth),
            (eku.code_signing, Self::CodeSigning),
            (eku.email_protection, Self::EmailProtection),
            (eku.time_stamping, Self::TimeStamping),
            (eku.ocsp_signing, Self::OcspSigning),
        ]
        .into_iter()
        .filter_map(|(set, usage)| set.then_some(usage))
        .collect();

        out.extend(eku.other.iter().map(|oid| Self::Other(oid.to_id_string())));
        out
    }
}

/// Metadata from a trusted list about the service a trust anchor belongs to.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
pub struct TrustServiceInfo {
    pub service_name: String,

    /// Service status URI or short name, e.g. `granted`.
    #[serde(default)]
    pub status: Option<String>,

    /// Date from which the service keeps revocation information for expired
    /// certificates.
    #[serde(default)]
    pub expired_certs_revocation_info: Option<DateTime<Utc>>,
}

/// A parsed X.509 certificate.
pub struct CertificateToken {
    id: TokenId,
    der: Vec<u8>,
    subject: Principal,
    issuer: Principal,
    serial: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    public_key: Vec<u8>,
    public_key_info: Option<PublicKeyInfo>,
    signature_algorithm: Option<SignatureAlgorithm>,
    tbs: Vec<u8>,
    signature_value: Vec<u8>,
    key_usage: Vec<KeyUsage>,
    ca: bool,
    path_len_constraint: Option<u32>,
    extended_key_usage: Vec<ExtendedKeyUsage>,
    ocsp_no_check: bool,
    expired_certs_on_crl: bool,
    ca_issuers_urls: Vec<String>,
    ocsp_urls: Vec<String>,

    sources: RwLock<BTreeSet<SourceTag>>,
    trust_service: OnceLock<TrustServiceInfo>,
    self_signed: OnceLock<bool>,
    issuer_token: OnceLock<Arc<CertificateToken>>,
    revocation_token: OnceLock<Arc<RevocationToken>>,
}

impl CertificateToken {
    /// Decode a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, TokenError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| TokenError::InvalidCertificate(e.to_string()))?;

        let validity = cert.validity();
        let not_before = asn1_to_utc(&validity.not_before)?;
        let not_after = asn1_to_utc(&validity.not_after)?;

        let key_usage = match cert.key_usage() {
            Ok(Some(ku)) => KeyUsage::from_x509(ku.value),
            _ => Vec::new(),
        };

        let extended_key_usage = match cert.extended_key_usage() {
            Ok(Some(eku)) => ExtendedKeyUsage::from_x509(eku.value),
            _ => Vec::new(),
        };

        let (ca, path_len_constraint) = match cert.basic_constraints() {
            Ok(Some(bc)) => (bc.value.ca, bc.value.path_len_constraint),
            _ => (false, None),
        };

        let mut ocsp_no_check = false;
        let mut expired_certs_on_crl = false;
        let mut ca_issuers_urls = Vec::new();
        let mut ocsp_urls = Vec::new();

        for ext in cert.extensions() {
            if ext.oid == OCSP_NOCHECK_OID {
                ocsp_no_check = true;
            } else if ext.oid == EXPIRED_CERTS_ON_CRL_OID {
                expired_certs_on_crl = true;
            }

            if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
                for desc in &aia.accessdescs {
                    let GeneralName::URI(uri) = &desc.access_location else {
                        continue;
                    };

                    if desc.access_method == AD_CA_ISSUERS_OID {
                        ca_issuers_urls.push((*uri).to_owned());
                    } else if desc.access_method == AD_OCSP_OID {
                        ocsp_urls.push((*uri).to_owned());
                    }
                }
            }
        }

        Ok(Self {
            id: TokenId::from_encoded(der),
            der: der.to_vec(),
            subject: Principal::from_x509_name(cert.subject()),
            issuer: Principal::from_x509_name(cert.issuer()),
            serial: cert.raw_serial().to_vec(),
            not_before,
            not_after,
            public_key: cert.public_key().raw.to_vec(),
            public_key_info: PublicKeyInfo::from_spki(cert.public_key()).ok(),
            signature_algorithm: SignatureAlgorithm::from_oid(&cert.signature_algorithm.algorithm),
            tbs: cert.tbs_certificate.as_ref().to_vec(),
            signature_value: cert.signature_value.as_ref().to_vec(),
            key_usage,
            ca,
            path_len_constraint,
            extended_key_usage,
            ocsp_no_check,
            expired_certs_on_crl,
            ca_issuers_urls,
            ocsp_urls,
            sources: RwLock::new(BTreeSet::new()),
            trust_service: OnceLock::new(),
            self_signed: OnceLock::new(),
            issuer_token: OnceLock::new(),
            revocation_token: OnceLock::new(),
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject(&self) -> &Principal {
        &self.subject
    }

    /// Raw serial number bytes as encoded in the certificate.
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Returns `true` if `time` falls inside the validity interval.
    pub fn is_valid_at(&self, time: DateTime<Utc>) -> bool {
        self.not_before <= time && time <= self.not_after
    }

    /// DER-encoded `SubjectPublicKeyInfo`.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn public_key_info(&self) -> Option<PublicKeyInfo> {
        self.public_key_info
    }

    /// Algorithm the issuer used to sign this certificate.
    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        self.signature_algorithm
    }

    pub fn key_usage(&self) -> &[KeyUsage] {
        &self.key_usage
    }

    pub fn extended_key_usage(&self) -> &[ExtendedKeyUsage] {
        &self.extended_key_usage
    }

    /// The CA flag of the basic constraints extension.
    pub fn is_ca(&self) -> bool {
        self.ca
    }

    pub fn path_len_constraint(&self) -> Option<u32> {
        self.path_len_constraint
    }

    pub fn has_ocsp_no_check(&self) -> bool {
        self.ocsp_no_check
    }

    /// An OCSP responder certificate carrying `id-pkix-ocsp-nocheck` is not
    /// checked for revocation.
    pub fn is_revocation_check_exempt(&self) -> bool {
        self.ocsp_no_check && self.extended_key_usage.contains(&ExtendedKeyUsage::OcspSigning)
    }

    /// Returns `true` if the certificate carries the ExpiredCertsOnCRL
    /// extension, i.e. its CRLs keep entries for expired certificates.
    pub fn has_expired_certs_on_crl(&self) -> bool {
        self.expired_certs_on_crl
    }

    pub fn ocsp_urls(&self) -> &[String] {
        &self.ocsp_urls
    }

    pub fn sources(&self) -> BTreeSet<SourceTag> {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn add_source(&self, source: SourceTag) {
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source);
    }

    pub fn trust_service(&self) -> Option<&TrustServiceInfo> {
        self.trust_service.get()
    }

    /// Attach trusted list metadata. Only the first call has an effect.
    pub fn set_trust_service(&self, info: TrustServiceInfo) -> bool {
        self.trust_service.set(info).is_ok()
    }

    pub fn revocation_token(&self) -> Option<Arc<RevocationToken>> {
        self.revocation_token.get().cloned()
    }

    /// Link revocation evidence. Returns `false` if a link already existed.
    pub fn set_revocation(&self, token: Arc<RevocationToken>) -> bool {
        self.revocation_token.set(token).is_ok()
    }
}

impl Token for CertificateToken {
    fn id(&self) -> TokenId {
        self.id
    }

    fn abbreviation(&self) -> String {
        format!("C-{}", self.id.short())
    }

    fn issuer_principal(&self) -> &Principal {
        &self.issuer
    }

    fn is_signed_by(&self, issuer: &CertificateToken) -> bool {
        if self.issuer != issuer.subject {
            return false;
        }

        let Some(alg) = self.signature_algorithm else {
            return false;
        };

        raw_signature::verify(alg, &self.signature_value, &self.tbs, &issuer.public_key).is_ok()
    }

    fn is_self_signed(&self) -> bool {
        *self.self_signed.get_or_init(|| self.is_signed_by(self))
    }

    fn is_trusted(&self) -> bool {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(SourceTag::is_trusted)
    }

    fn encoded(&self) -> &[u8] {
        &self.der
    }

    fn issuer_token(&self) -> Option<Arc<CertificateToken>> {
        self.issuer_token.get().cloned()
    }

    fn set_issuer(&self, issuer: Arc<CertificateToken>) -> bool {
        if issuer.id == self.id {
            return false;
        }
        self.issuer_token.set(issuer).is_ok()
    }

    fn ca_issuers_urls(&self) -> &[String] {
        &self.ca_issuers_urls
    }
}

impl fmt::Debug for CertificateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateToken")
            .field("id", &self.id)
            .field("subject", &self.subject.name())
            .field("issuer", &self.issuer.name())
            .finish_non_exhaustive()
    }
}

/// Follow issuer links from `cert` up to a trusted or self-signed
/// certificate. The result starts with `cert` itself.
pub fn certificate_chain(cert: &Arc<CertificateToken>) -> Vec<Arc<CertificateToken>> {
    let mut chain = vec![Arc::clone(cert)];
    let mut seen = HashSet::from([cert.id()]);
    let mut current = Arc::clone(cert);

    while !current.is_trusted() && !current.is_self_signed() {
        match current.issuer_token() {
            Some(issuer) if seen.insert(issuer.id()) => {
                chain.push(Arc::clone(&issuer));
                current = issuer;
            }
            _ => break,
        }
    }

    chain
}

fn asn1_to_utc(time: &ASN1Time) -> Result<DateTime<Utc>, TokenError> {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| TokenError::InvalidTime(time.to_string()))
}
