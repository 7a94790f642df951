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
    fmt,
    sync::{Arc, OnceLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CertificateToken, Principal, Token, TokenId, TokenSignature};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RevocationKind {
    Crl,
    Ocsp,
}

/// Whether revocation data was fetched during validation or shipped with the
/// signature.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationOrigin {
    Online,
    Embedded,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationStatus {
    Good,
    Revoked,
    Unknown,
}

/// CRL reason codes (RFC 5280, section 5.3.1).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
}

/// Decoded content of a CRL entry or OCSP single response, as produced by a
/// revocation source or a format adapter.
#[derive(Clone, Debug)]
pub struct RevocationData {
    pub kind: RevocationKind,
    pub origin: RevocationOrigin,
    pub status: RevocationStatus,
    pub revocation_time: Option<DateTime<Utc>>,
    pub reason: Option<RevocationReason>,

    /// `thisUpdate` of the CRL or `producedAt` of the OCSP response.
    pub production_time: DateTime<Utc>,
    pub next_update: Option<DateTime<Utc>>,

    /// Issuer name of the certificate this data is about.
    pub certificate_issuer: Principal,

    /// Serial number of the certificate this data is about.
    pub certificate_serial: Vec<u8>,

    /// Name of the CRL issuer or OCSP responder.
    pub issuer: Principal,
    pub signature: TokenSignature,
    pub encoded: Vec<u8>,

    /// Responder certificates shipped in the OCSP response.
    pub certificates: Vec<Vec<u8>>,
}

/// Revocation evidence about one certificate.
pub struct RevocationToken {
    id: TokenId,
    data: RevocationData,
    issuer_token: OnceLock<Arc<CertificateToken>>,
}

impl RevocationToken {
    pub fn new(data: RevocationData) -> Self {
        Self {
            id: TokenId::from_encoded(&data.encoded),
            data,
            issuer_token: OnceLock::new(),
        }
    }

    pub fn kind(&self) -> RevocationKind {
        self.data.kind
    }

    pub fn origin(&self) -> RevocationOrigin {
        self.data.origin
    }

    pub fn status(&self) -> RevocationStatus {
        self.data.status
    }

    pub fn revocation_time(&self) -> Option<DateTime<Utc>> {
        self.data.revocation_time
    }

    pub fn reason(&self) -> Option<RevocationReason> {
        self.data.reason
    }

    pub fn production_time(&self) -> DateTime<Utc> {
        self.data.production_time
    }

    pub fn next_update(&self) -> Option<DateTime<Utc>> {
        self.data.next_update
    }

    /// Returns `true` if this token carries status information for `cert`.
    pub fn covers(&self, cert: &CertificateToken) -> bool {
        &self.data.certificate_issuer == cert.issuer_principal()
            && self.data.certificate_serial == cert.serial()
    }

    /// Returns `true` if the certificate counts as revoked at `time`.
    pub fn is_revoked_at(&self, time: DateTime<Utc>) -> bool {
        self.data.status == RevocationStatus::Revoked
            && self.data.revocation_time.map_or(true, |revoked| revoked <= time)
    }

    pub fn data(&self) -> &RevocationData {
        &self.data
    }
}

impl Token for RevocationToken {
    fn id(&self) -> TokenId {
        self.id
    }

    fn abbreviation(&self) -> String {
        format!("R-{}", self.id.short())
    }

    fn issuer_principal(&self) -> &Principal {
        &self.data.issuer
    }

    fn is_signed_by(&self, issuer: &CertificateToken) -> bool {
        issuer.subject() == &self.data.issuer && self.data.signature.verify_with(issuer).is_ok()
    }

    fn encoded(&self) -> &[u8] {
        &self.data.encoded
    }

    fn issuer_token(&self) -> Option<Arc<CertificateToken>> {
        self.issuer_token.get().cloned()
    }

    fn set_issuer(&self, issuer: Arc<CertificateToken>) -> bool {
        self.issuer_token.set(issuer).is_ok()
    }

    fn embedded_certificates(&self) -> &[Vec<u8>] {
        &self.data.certificates
    }
}

impl fmt::Debug for RevocationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevocationToken")
            .field("id", &self.id)
            .field("kind", &self.data.kind)
            .field("status", &self.data.status)
            .finish_non_exhaustive()
    }
}
