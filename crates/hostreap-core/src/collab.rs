//! Collaborator capabilities driven by the reconciler.
//!
//! Each trait is a seam: production wires in the Rancher and AWS
//! clients, tests wire in in-memory fakes.

use async_trait::async_trait;

use crate::error::{ClusterError, CompletionError, TransportError};
use crate::types::{HostId, InboundMessage, LifecycleActionContext, LifecycleActionResult};

/// A queue of lifecycle notifications.
#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next message. `Ok(None)` means the source is
    /// exhausted and the loop should stop.
    async fn receive(&mut self) -> Result<Option<InboundMessage>, TransportError>;

    /// Remove a message from the source so it is not redelivered.
    async fn acknowledge(&mut self, message: &InboundMessage) -> Result<(), TransportError>;
}

/// The cluster manager holding the registry of hosts.
#[async_trait]
pub trait ClusterControl: Send + Sync {
    /// Hosts whose label `label_name` equals `label_value`.
    async fn lookup_hosts_by_label(
        &self,
        label_name: &str,
        label_value: &str,
    ) -> Result<Vec<HostId>, ClusterError>;

    /// Stop scheduling new work onto a host.
    async fn deactivate_host(&self, host: &HostId) -> Result<(), ClusterError>;

    /// Remove a (deactivated) host record.
    async fn delete_host(&self, host: &HostId) -> Result<(), ClusterError>;
}

/// The autoscaling control plane that owns the lifecycle hook.
#[async_trait]
pub trait LifecycleNotifier: Send + Sync {
    async fn complete_lifecycle_action(
        &self,
        action: &LifecycleActionContext,
        result: LifecycleActionResult,
    ) -> Result<(), CompletionError>;
}
