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

//! Settings for configuring trust, the resolver, networking and the
//! validation policy.

use std::path::Path;

use chrono::{DateTime, Utc};
use config::{Config, FileFormat};
use serde_derive::{Deserialize, Serialize};

use crate::{policy::ValidationPolicy, Error, Result};

const VERSION: u32 = 1;

// trait used to validate user input to make sure user supplied configurations are valid
pub(crate) trait SettingsValidate {
    // returns error if settings are invalid
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Decode a PEM bundle into DER certificates.
///
/// JSON-encoded bundles with literal `\n` sequences are accepted.
pub fn load_pem_certificates(pem_data: &str) -> Result<Vec<Vec<u8>>> {
    let data = pem_data.replace("\\n", "\n").into_bytes();

    let mut certs = Vec::new();
    for pem_result in x509_parser::pem::Pem::iter_from_buffer(&data) {
        let pem = pem_result.map_err(|e| Error::BadParam(format!("invalid PEM data: {e}")))?;
        certs.push(pem.contents);
    }
    Ok(certs)
}

/// A trust service taken from a trusted list.
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema))]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct TrustedService {
    pub name: String,

    /// Service certificates as a PEM bundle.
    pub certificates: String,

    /// Service status URI, informational.
    pub status: Option<String>,

    /// Revocation data for certificates that expired after this date is
    /// still published by the service.
    pub expired_certs_revocation_info: Option<DateTime<Utc>>,
}

/// Settings to configure trust anchors.
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema), schemars(default))]
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Trust {
    /// Trust anchors from a local trust store as a PEM bundle.
    pub trust_anchors: Option<String>,

    /// Trust anchors taken from a trusted list as a PEM bundle.
    pub trusted_list_anchors: Option<String>,

    /// Trusted list services, with their metadata.
    pub trusted_services: Vec<TrustedService>,
}

impl Trust {
    /// Returns `true` if no anchor of any kind is configured.
    pub fn is_empty(&self) -> bool {
        self.trust_anchors.is_none()
            && self.trusted_list_anchors.is_none()
            && self.trusted_services.is_empty()
    }
}

impl SettingsValidate for Trust {
    fn validate(&self) -> Result<()> {
        let bundles = self
            .trust_anchors
            .iter()
            .chain(self.trusted_list_anchors.iter())
            .chain(self.trusted_services.iter().map(|s| &s.certificates));

        for bundle in bundles {
            if load_pem_certificates(bundle)?.is_empty() {
                return Err(Error::BadParam(
                    "trust bundle contains no certificates".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Settings to configure the trust resolver.
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema), schemars(default))]
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Resolver {
    /// Number of worker threads per validation context.
    ///
    /// The default value is 4.
    pub max_workers: usize,

    /// Wall-clock budget for trust resolution in milliseconds.
    ///
    /// The default value is 60 seconds.
    pub timeout_ms: u64,

    /// Whether missing issuers are downloaded from AIA caIssuers locations.
    pub fetch_aia: bool,

    /// Whether online revocation sources are consulted.
    pub online_revocation: bool,

    /// Whether online revocation is attempted for expired certificates whose
    /// issuer still publishes their status.
    pub check_expired_certificates: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            max_workers: 4,
            timeout_ms: 60_000,
            fetch_aia: true,
            online_revocation: true,
            check_expired_certificates: true,
        }
    }
}

impl SettingsValidate for Resolver {
    fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::BadParam("resolver.max_workers must be positive".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::BadParam("resolver.timeout_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Settings to configure network access.
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema), schemars(default))]
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Network {
    /// Whether any network access is allowed. When false, every fetch fails
    /// and validation relies on embedded evidence only.
    pub enabled: bool,

    /// Timeout for a single request in milliseconds.
    pub timeout_ms: u64,

    /// URI schemes that may be fetched.
    pub allowed_schemes: Vec<String>,

    /// Responses are truncated to this many bytes.
    pub max_response_size: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 10_000,
            allowed_schemes: vec!["http".to_owned(), "https".to_owned()],
            max_response_size: 1_000_000,
        }
    }
}

impl SettingsValidate for Network {}

impl SettingsValidate for ValidationPolicy {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::BadParam("policy.name must not be empty".into()));
        }
        Ok(())
    }
}

/// Settings for configuring all aspects of signature validation.
#[cfg_attr(feature = "json_schema", derive(schemars::JsonSchema), schemars(default))]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Version of the configuration.
    pub version: u32,
    pub trust: Trust,
    pub resolver: Resolver,
    pub network: Network,

    /// The validation policy.
    pub policy: ValidationPolicy,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load [Settings] from a TOML string, overlaying the defaults.
    pub fn from_toml(toml: &str) -> Result<Self> {
        Self::default().with_string(toml, "toml")
    }

    /// Load [Settings] from a JSON string, overlaying the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::default().with_string(json, "json")
    }

    /// Load [Settings] from a file. The format is inferred from the
    /// extension.
    pub fn from_file<P: AsRef<Path>>(settings_path: P) -> Result<Self> {
        let path = settings_path.as_ref();
        let ext = path
            .extension()
            .ok_or(Error::BadParam(
                "settings file must have json or toml extension".into(),
            ))?
            .to_string_lossy();

        let setting_buf = std::fs::read(path)?;
        Self::default().with_string(&String::from_utf8_lossy(&setting_buf), &ext)
    }

    /// Update this `Settings` instance from a string representation.
    ///
    /// The provided configuration is overlaid on top of the current
    /// settings, so partial documents only change what they name.
    ///
    /// # Example
    /// ```
    /// use ades_validation::settings::Settings;
    ///
    /// let mut settings = Settings::default();
    ///
    /// settings
    ///     .update_from_str(
    ///         r#"
    ///     [resolver]
    ///     fetch_aia = false
    /// "#,
    ///         "toml",
    ///     )
    ///     .unwrap();
    ///
    /// assert!(!settings.resolver.fetch_aia);
    /// assert_eq!(settings.resolver.max_workers, 4);
    /// ```
    pub fn update_from_str(&mut self, settings_str: &str, format: &str) -> Result<()> {
        *self = std::mem::take(self).with_string(settings_str, format)?;
        Ok(())
    }

    /// Overlay a configuration string on this instance.
    pub fn with_string(self, settings_str: &str, format: &str) -> Result<Self> {
        let file_format = match format.to_lowercase().as_str() {
            "json" => FileFormat::Json,
            "toml" => FileFormat::Toml,
            _ => return Err(Error::UnsupportedType),
        };

        // Convert current settings to Config
        let current_config = Config::try_from(&self)
            .map_err(|e| Error::BadParam(format!("could not convert settings: {e}")))?;

        let merged_config = Config::builder()
            .add_source(current_config)
            .add_source(config::File::from_str(settings_str, file_format))
            .build()
            .map_err(|e| Error::BadParam(format!("could not merge configuration: {e}")))?;

        let updated_settings = merged_config
            .try_deserialize::<Settings>()
            .map_err(|e| Error::BadParam(e.to_string()))?;

        updated_settings.validate()?;

        Ok(updated_settings)
    }

    /// Serializes these [Settings] into a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::BadParam(e.to_string()))
    }

    /// Gets a value by dotted path, for example `resolver.max_workers`.
    pub fn get_value<'de, T: serde::de::Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let config = Config::try_from(self)
            .map_err(|e| Error::BadParam(format!("could not convert settings: {e}")))?;

        config
            .get::<T>(path)
            .map_err(|e| Error::BadParam(format!("Failed to get value at '{path}': {e}")))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            version: VERSION,
            trust: Default::default(),
            resolver: Default::default(),
            network: Default::default(),
            policy: Default::default(),
        }
    }
}

impl SettingsValidate for Settings {
    fn validate(&self) -> Result<()> {
        if self.version > VERSION {
            return Err(Error::VersionCompatibility(self.version));
        }
        self.trust.validate()?;
        self.resolver.validate()?;
        self.network.validate()?;
        self.policy.validate()
    }
}
