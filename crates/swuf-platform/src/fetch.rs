//! Script fetchers
//!
//! The host reaches the worker script through a [`ScriptFetcher`]: a
//! lightweight existence probe (HEAD-style) plus a full download. The
//! in-memory store backs tests and the demo; the HTTP fetcher backs real
//! deployments.

use std::collections::HashMap;
use std::time::Duration;

use crate::PlatformError;

/// Network access to the worker script.
pub trait ScriptFetcher {
    /// Check that the script exists without downloading it. Fails loudly when
    /// the device is offline.
    fn probe(&mut self, url: &str) -> Result<(), PlatformError>;

    /// Download the script body.
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, PlatformError>;
}

/// In-memory script store with an offline switch.
#[derive(Debug, Default)]
pub struct MemoryScripts {
    scripts: HashMap<String, Vec<u8>>,
    offline: bool,
}

impl MemoryScripts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish (or replace) the script served at `url`.
    pub fn publish(&mut self, url: &str, body: impl Into<Vec<u8>>) {
        self.scripts.insert(url.to_string(), body.into());
    }

    /// Simulate losing or regaining connectivity.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }
}

impl ScriptFetcher for MemoryScripts {
    fn probe(&mut self, url: &str) -> Result<(), PlatformError> {
        if self.offline {
            return Err(PlatformError::Network("offline".to_string()));
        }
        if self.scripts.contains_key(url) {
            Ok(())
        } else {
            Err(PlatformError::ScriptNotFound(url.to_string()))
        }
    }

    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, PlatformError> {
        if self.offline {
            return Err(PlatformError::Network("offline".to_string()));
        }
        self.scripts
            .get(url)
            .cloned()
            .ok_or_else(|| PlatformError::ScriptNotFound(url.to_string()))
    }
}

/// HTTP fetcher for real script URLs.
pub struct HttpScriptFetcher {
    client: reqwest::blocking::Client,
}

impl HttpScriptFetcher {
    pub fn new() -> Result<Self, PlatformError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    fn parse(url: &str) -> Result<url::Url, PlatformError> {
        url::Url::parse(url).map_err(|e| PlatformError::InvalidUrl(format!("{url}: {e}")))
    }
}

impl ScriptFetcher for HttpScriptFetcher {
    fn probe(&mut self, url: &str) -> Result<(), PlatformError> {
        let url = Self::parse(url)?;
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(PlatformError::ScriptNotFound(format!(
                "{} ({})",
                response.url(),
                response.status().as_u16()
            )))
        }
    }

    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, PlatformError> {
        let url = Self::parse(url)?;
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PlatformError::ScriptNotFound(format!(
                "{} ({})",
                response.url(),
                response.status().as_u16()
            )));
        }
        let body = response
            .bytes()
            .map_err(|e| PlatformError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }
}
