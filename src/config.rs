//! Service configuration, read from TOML.
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration except for `[engine]`: no error-correction engine ships
//! enabled by default and its absence is reported once, when the service is
//! built.
//!
//! ```toml
//! [control]
//! address = "127.0.0.1:7000"
//! read_timeout_ms = 30000
//!
//! [local]
//! endpoint = "127.0.0.1:7100"
//!
//! [engine]
//! kind = "parity-check"
//!
//! [reconciliation]
//! symbols_per_dimension = 16
//!
//! [amplification]
//! extractor = "toeplitz"
//!
//! [restart]
//! max_consecutive_failures = 3
//! backoff_ms = 500
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::adapters::engine::DEFAULT_SYMBOLS_PER_DIMENSION;
use crate::adapters::{ParityCheckEngine, ToeplitzExtractor};
use crate::application::RestartPolicy;
use crate::ports::{ErrorCorrection, Extractor};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("no error-correction engine configured; set [engine] kind")]
    MissingEngine,
    #[error("unknown error-correction engine {0:?}")]
    UnknownEngine(String),
    #[error("unknown extractor {0:?}")]
    UnknownExtractor(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    /// Alice binds here; Bob connects here.
    pub address: String,
    /// Bob's connect timeout; `0` waits for the OS default.
    pub connect_timeout_ms: u64,
    /// Longest wait for the peer's next message, both roles; `0` waits forever.
    pub read_timeout_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:7000".into(),
            connect_timeout_ms: 5_000,
            read_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalConfig {
    /// JSON-line request endpoint for the local producer.
    pub endpoint: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:7100".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconciliationConfig {
    /// Frame length is `mdr_dimension * symbols_per_dimension` symbols.
    pub symbols_per_dimension: usize,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            symbols_per_dimension: DEFAULT_SYMBOLS_PER_DIMENSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmplificationConfig {
    pub extractor: String,
}

impl Default for AmplificationConfig {
    fn default() -> Self {
        Self {
            extractor: "toeplitz".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestartConfig {
    pub max_consecutive_failures: u32,
    pub backoff_ms: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        let policy = RestartPolicy::default();
        Self {
            max_consecutive_failures: policy.max_consecutive_failures,
            backoff_ms: u64::try_from(policy.backoff.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub control: ControlConfig,
    pub local: LocalConfig,
    pub engine: EngineConfig,
    pub reconciliation: ReconciliationConfig,
    pub amplification: AmplificationConfig,
    pub restart: RestartConfig,
}

impl ServiceConfig {
    /// # Errors
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Toml`]
    /// if it does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// # Errors
    /// [`ConfigError::Toml`] on syntax errors or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// # Errors
    /// [`ConfigError::MissingEngine`] when `[engine] kind` is absent,
    /// [`ConfigError::UnknownEngine`] when it names no known engine.
    pub fn build_engine(&self) -> Result<Box<dyn ErrorCorrection + Send>, ConfigError> {
        match self.engine.kind.as_deref() {
            None => Err(ConfigError::MissingEngine),
            Some("parity-check") => Ok(Box::new(ParityCheckEngine::new(
                self.reconciliation.symbols_per_dimension,
            ))),
            Some(other) => Err(ConfigError::UnknownEngine(other.to_owned())),
        }
    }

    /// # Errors
    /// [`ConfigError::UnknownExtractor`] for anything but `"toeplitz"`.
    pub fn build_extractor(&self) -> Result<Box<dyn Extractor + Send>, ConfigError> {
        match self.amplification.extractor.as_str() {
            "toeplitz" => Ok(Box::new(ToeplitzExtractor)),
            other => Err(ConfigError::UnknownExtractor(other.to_owned())),
        }
    }

    #[must_use]
    pub fn restart_policy(&self) -> RestartPolicy {
        RestartPolicy {
            max_consecutive_failures: self.restart.max_consecutive_failures,
            backoff: Duration::from_millis(self.restart.backoff_ms),
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.control.connect_timeout_ms > 0)
            .then(|| Duration::from_millis(self.control.connect_timeout_ms))
    }

    #[must_use]
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.control.read_timeout_ms > 0)
            .then(|| Duration::from_millis(self.control.read_timeout_ms))
    }
}
