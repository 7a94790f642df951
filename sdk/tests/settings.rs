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

mod common;

use ades_validation::{
    policy::Level,
    settings::Settings,
    token::{SourceTag, Token},
    DocumentValidator, Error,
};
use common::{at, TestPki};

fn settings_toml(pki: &TestPki) -> String {
    format!(
        r#"
version = 1

[trust]
trust_anchors = '''
{root}'''

[[trust.trusted_services]]
name = "Test Qualified TSA"
status = "http://uri.etsi.org/TrstSvc/TrustedList/Svcstatus/granted"
expired_certs_revocation_info = "2015-01-01T00:00:00Z"
certificates = '''
{tsa}'''

[resolver]
max_workers = 2
fetch_aia = false
online_revocation = false

[network]
enabled = false

[policy]
name = "strict"

[policy.signing_certificate.revocation_freshness]
level = "FAIL"
value = 0
unit = "DAYS"
"#,
        root = pki.root.cert.pem(),
        tsa = pki.tsa.cert.pem(),
    )
}

#[test]
fn validator_from_toml() {
    let pki = TestPki::new();
    let settings = Settings::from_toml(&settings_toml(&pki)).unwrap();

    assert_eq!(settings.resolver.max_workers, 2);
    assert_eq!(settings.policy.name, "strict");
    assert_eq!(
        settings
            .policy
            .signing_certificate
            .revocation_freshness
            .as_ref()
            .unwrap()
            .level,
        Level::Fail
    );
    // Policy entries not named in the file keep their defaults.
    assert!(settings.policy.signing_certificate.not_revoked.is_some());

    let validator = DocumentValidator::new(settings).unwrap();
    let anchors = validator.pool().trusted_certificates();
    assert_eq!(anchors.len(), 2);

    let service = anchors
        .iter()
        .find(|c| c.sources().contains(&SourceTag::TrustedList))
        .unwrap();
    let info = service.trust_service().unwrap();
    assert_eq!(info.service_name, "Test Qualified TSA");
    assert_eq!(info.expired_certs_revocation_info, Some(at(2015, 1, 1)));

    let root = anchors
        .iter()
        .find(|c| c.sources().contains(&SourceTag::TrustedStore))
        .unwrap();
    assert!(root.trust_service().is_none());
    assert!(root.is_trusted());
}

#[test]
fn strict_freshness_rejects_stale_revocation_data() {
    let pki = TestPki::new();
    let settings = Settings::from_toml(&settings_toml(&pki)).unwrap();

    let report = DocumentValidator::new(settings)
        .unwrap()
        .with_validation_time(at(2020, 1, 1))
        .validate(&[pki.signature("S-1")])
        .unwrap();

    // The embedded CRL expired on 2019-01-31.
    let sig = &report.signatures[0];
    assert!(!sig.is_valid());
    assert_eq!(report.policy_name, "strict");
}

#[test]
fn bad_settings_are_rejected() {
    assert!(matches!(
        Settings::from_toml("version = 2"),
        Err(Error::VersionCompatibility(2))
    ));

    let bad_pem = r#"
        [trust]
        trust_anchors = "-----BEGIN CERTIFICATE-----\nnot base64\n-----END CERTIFICATE-----"
    "#;
    assert!(Settings::from_toml(bad_pem).is_err());

    assert!(Settings::from_toml("[resolver]\ntimeout_ms = 0").is_err());
    assert!(Settings::from_toml("[policy]\nname = \"\"").is_err());
}

#[test]
fn offline_validator_is_built_from_json() {
    let pki = TestPki::new();
    let json = serde_json::json!({
        "trust": { "trust_anchors": pki.root.cert.pem() },
        "network": { "enabled": false },
        "resolver": { "fetch_aia": false, "online_revocation": false },
    });
    let settings = Settings::from_json(&json.to_string()).unwrap();

    let report = DocumentValidator::new(settings)
        .unwrap()
        .with_validation_time(at(2020, 1, 1))
        .validate(&[pki.signature("S-1")])
        .unwrap();

    assert!(report.signatures[0].is_valid(), "{report}");
}
