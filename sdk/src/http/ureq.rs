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

use std::{io::Read, time::Duration};

use log::debug;
use url::Url;

use crate::{
    http::{DataLoader, DataLoaderError},
    settings::Network,
};

/// A blocking [`DataLoader`] backed by [`ureq`].
pub struct UreqDataLoader {
    agent: ureq::Agent,
    allowed_schemes: Vec<String>,
    max_response_size: u64,
}

impl UreqDataLoader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            allowed_schemes: vec!["http".to_owned(), "https".to_owned()],
            max_response_size: 1_000_000,
        }
    }

    pub fn from_settings(network: &Network) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_millis(network.timeout_ms))
                .build(),
            allowed_schemes: network.allowed_schemes.clone(),
            max_response_size: network.max_response_size,
        }
    }

    pub fn with_allowed_schemes(mut self, schemes: Vec<String>) -> Self {
        self.allowed_schemes = schemes;
        self
    }
}

impl DataLoader for UreqDataLoader {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, DataLoaderError> {
        let url = Url::parse(uri).map_err(|e| DataLoaderError::InvalidUrl {
            uri: uri.to_owned(),
            reason: e.to_string(),
        })?;

        if !self
            .allowed_schemes
            .iter()
            .any(|scheme| scheme.eq_ignore_ascii_case(url.scheme()))
        {
            return Err(DataLoaderError::UriDisallowed {
                uri: uri.to_owned(),
            });
        }

        debug!("fetching {url}");

        let response = match self.agent.get(url.as_str()).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(DataLoaderError::Status {
                    uri: uri.to_owned(),
                    status,
                })
            }
            Err(e) => return Err(DataLoaderError::Other(e.to_string())),
        };

        let len = response
            .header("Content-Length")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(10000);

        let mut body: Vec<u8> = Vec::with_capacity(len.min(self.max_response_size as usize));
        response
            .into_reader()
            .take(self.max_response_size)
            .read_to_end(&mut body)?;

        Ok(body)
    }
}
