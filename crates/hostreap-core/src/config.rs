//! hostreap configuration.
//!
//! Settings come from built-in defaults, an optional TOML file, and the
//! environment, in increasing order of precedence.
//!
//! ```toml
//! [queue]
//! url = "https://sqs.eu-west-1.amazonaws.com/123456789012/asg-lifecycle"
//! wait_time_secs = 20
//!
//! [cluster]
//! endpoint = "http://rancher-server:8080"
//! access_key = "..."
//! secret_key = "..."
//! host_label = "HOSTID"
//! request_timeout = "30s"
//!
//! [aws]
//! region = "eu-west-1"
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound SQS accepts for long polling.
const MAX_WAIT_TIME_SECS: u32 = 20;
/// Upper bound SQS accepts for a single receive.
const MAX_BATCH: u32 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaperConfig {
    pub queue: QueueConfig,
    pub cluster: ClusterConfig,
    pub aws: AwsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queue URL the lifecycle hook publishes to.
    pub url: String,
    /// Long-poll wait per receive call.
    pub wait_time_secs: u32,
    /// Messages fetched per receive call. They are still handled one at a time.
    pub max_messages: u32,
    pub visibility_timeout_secs: Option<u32>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            wait_time_secs: MAX_WAIT_TIME_SECS,
            max_messages: 1,
            visibility_timeout_secs: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Base URL of the cluster manager API.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Host label holding the cloud instance ID.
    pub host_label: String,
    /// Per-request timeout, e.g. "30s", "500ms", "2m".
    pub request_timeout: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://rancher-server:8080".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            host_label: "HOSTID".to_string(),
            request_timeout: "30s".to_string(),
        }
    }
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &redact(&self.access_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("host_label", &self.host_label)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() { "<unset>" } else { "<redacted>" }
}

impl ClusterConfig {
    /// Parsed request timeout.
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.request_timeout).ok_or_else(|| ConfigError::Invalid {
            key: "cluster.request_timeout",
            reason: format!("not a duration: {:?}", self.request_timeout),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub region: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "eu-west-1".to_string(),
        }
    }
}

impl ReaperConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults, then the file (if any), then the process environment.
    /// The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment settings. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SQS_URL") {
            self.queue.url = v;
        }
        if let Some(v) = get("RANCHER_URL") {
            self.cluster.endpoint = v;
        }
        if let Some(v) = get("RANCHER_SERVER_ACCESS_KEY") {
            self.cluster.access_key = v;
        }
        if let Some(v) = get("RANCHER_SERVER_SECRET_KEY") {
            self.cluster.secret_key = v;
        }
        if let Some(v) = get("RANCHER_HOST_LABEL") {
            self.cluster.host_label = v;
        }
        if let Some(v) = get("AWS_REGION") {
            self.aws.region = v;
        }
    }

    /// Check that every required setting is present and in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.url.is_empty() {
            return Err(ConfigError::Missing("queue.url (SQS_URL)"));
        }
        if self.queue.wait_time_secs > MAX_WAIT_TIME_SECS {
            return Err(ConfigError::Invalid {
                key: "queue.wait_time_secs",
                reason: format!("must be at most {MAX_WAIT_TIME_SECS}"),
            });
        }
        if !(1..=MAX_BATCH).contains(&self.queue.max_messages) {
            return Err(ConfigError::Invalid {
                key: "queue.max_messages",
                reason: format!("must be between 1 and {MAX_BATCH}"),
            });
        }
        if self.cluster.access_key.is_empty() {
            return Err(ConfigError::Missing(
                "cluster.access_key (RANCHER_SERVER_ACCESS_KEY)",
            ));
        }
        if self.cluster.secret_key.is_empty() {
            return Err(ConfigError::Missing(
                "cluster.secret_key (RANCHER_SERVER_SECRET_KEY)",
            ));
        }
        if !self.cluster.endpoint.starts_with("http://") {
            return Err(ConfigError::Invalid {
                key: "cluster.endpoint",
                reason: format!("expected an http:// URL, got {:?}", self.cluster.endpoint),
            });
        }
        if self.cluster.host_label.is_empty() {
            return Err(ConfigError::Missing("cluster.host_label"));
        }
        self.cluster.request_timeout()?;
        if self.aws.region.is_empty() {
            return Err(ConfigError::Missing("aws.region (AWS_REGION)"));
        }
        Ok(())
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
