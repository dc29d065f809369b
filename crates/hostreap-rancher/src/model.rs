//! Rancher v1 API resources.

use std::collections::HashMap;

use serde::Deserialize;

/// Host states that no longer count as registered.
const GONE_STATES: &[&str] = &["removed", "purging", "purged"];

/// A host resource.
#[derive(Debug, Clone, Deserialize)]
pub struct Host {
    pub id: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Host {
    /// Whether this host still exists from the cluster's point of view.
    pub fn is_registered(&self) -> bool {
        self.state
            .as_deref()
            .is_none_or(|state| !GONE_STATES.contains(&state))
    }

    pub fn has_label(&self, name: &str, value: &str) -> bool {
        self.labels.get(name).is_some_and(|v| v == value)
    }
}

/// A page of hosts.
#[derive(Debug, Deserialize)]
pub(crate) struct HostCollection {
    #[serde(default)]
    pub data: Vec<Host>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Pagination {
    #[serde(default)]
    pub next: Option<String>,
}
