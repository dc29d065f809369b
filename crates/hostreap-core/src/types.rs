//! Domain types for lifecycle notifications and host removal.
//!
//! A `LifecycleEvent` lives for one dispatch cycle. Nothing here is
//! persisted: the authoritative state is held by the cluster manager
//! and the cloud provider.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ClusterError, CompletionError};

/// `Event` value carried by Auto Scaling test notifications.
pub const TEST_NOTIFICATION_EVENT: &str = "autoscaling:TEST_NOTIFICATION";

/// `LifecycleTransition` value carried by instance-terminating notifications.
pub const INSTANCE_TERMINATING_TRANSITION: &str = "autoscaling:EC2_INSTANCE_TERMINATING";

// ── Messages ───────────────────────────────────────────────────────

/// One item yielded by a message source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Source-assigned message ID (for logging only).
    pub id: String,
    /// Opaque text payload.
    pub body: String,
    /// Handle used to acknowledge this delivery.
    pub receipt: String,
}

// ── Lifecycle events ───────────────────────────────────────────────

/// A decoded lifecycle notification.
///
/// Every field is optional; which ones are present determines how the
/// event is classified. Fields holding non-string JSON values are
/// treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub event: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lifecycle_transition: Option<String>,
    #[serde(
        rename = "EC2InstanceId",
        default,
        deserialize_with = "lenient_string"
    )]
    pub instance_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub auto_scaling_group_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lifecycle_action_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lifecycle_hook_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub service: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub request_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub account_id: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Correlation fields needed to complete a pending lifecycle action.
///
/// Carried unchanged from the notification to the completion call.
#[derive(Clone, PartialEq, Eq)]
pub struct LifecycleActionContext {
    pub group_name: String,
    pub action_token: String,
    pub hook_name: String,
}

impl fmt::Debug for LifecycleActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleActionContext")
            .field("group_name", &self.group_name)
            .field("action_token", &"<redacted>")
            .field("hook_name", &self.hook_name)
            .finish()
    }
}

/// Correlation fields as they arrived on a termination event.
///
/// They are not needed to remove the host, only to complete the hook
/// afterwards, so missing ones are only reported at completion time.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PendingLifecycleAction {
    pub group_name: Option<String>,
    pub action_token: Option<String>,
    pub hook_name: Option<String>,
}

impl PendingLifecycleAction {
    /// The complete context, or the first missing field as a completion error.
    /// Empty values count as missing.
    pub fn context(&self) -> Result<LifecycleActionContext, CompletionError> {
        Ok(LifecycleActionContext {
            group_name: present(&self.group_name, "AutoScalingGroupName")?,
            action_token: present(&self.action_token, "LifecycleActionToken")?,
            hook_name: present(&self.hook_name, "LifecycleHookName")?,
        })
    }
}

fn present(value: &Option<String>, field: &str) -> Result<String, CompletionError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CompletionError(format!("termination notice is missing {field}")))
}

impl fmt::Debug for PendingLifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLifecycleAction")
            .field("group_name", &self.group_name)
            .field(
                "action_token",
                &self.action_token.as_ref().map(|_| "<redacted>"),
            )
            .field("hook_name", &self.hook_name)
            .finish()
    }
}

/// Immutable per-message context extracted from a termination event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationNotice {
    /// Cloud instance ID, matched against the host label.
    pub instance_id: String,
    pub action: PendingLifecycleAction,
}

/// Result reported back to the lifecycle hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleActionResult {
    /// Let the instance proceed to termination.
    Continue,
}

impl LifecycleActionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "CONTINUE",
        }
    }
}

impl fmt::Display for LifecycleActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Host removal ───────────────────────────────────────────────────

/// Identifier of a host registered with the cluster manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostId(pub String);

impl HostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A step of the host removal sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStep {
    Lookup,
    Deactivate,
    Delete,
}

impl fmt::Display for RemovalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lookup => "lookup",
            Self::Deactivate => "deactivate",
            Self::Delete => "delete",
        })
    }
}

/// Result of driving the removal sequence for one instance.
#[derive(Debug)]
pub enum RemovalOutcome {
    /// No host carries the instance label. Terminal for this message.
    NoHostFound,
    /// A step failed; no later step ran.
    StepFailed { step: RemovalStep, cause: ClusterError },
    /// The host was deactivated and deleted.
    Completed { host: HostId },
}

impl RemovalOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

// ── Dispatch ───────────────────────────────────────────────────────

/// How the dispatch loop disposed of one message. Every variant ends
/// in acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    InvalidPayload,
    TestNotification,
    Unrecognized,
    NoHostFound,
    RemovalFailed(RemovalStep),
    CompletionFailed,
    Completed,
}

impl MessageOutcome {
    /// Whether the message needed no removal work.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::InvalidPayload | Self::TestNotification | Self::Unrecognized
        )
    }

    /// Whether a removal was attempted and did not fully succeed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::NoHostFound | Self::RemovalFailed(_) | Self::CompletionFailed
        )
    }
}

/// Running counters for the dispatch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub received: u64,
    pub acknowledged: u64,
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl DispatchStats {
    pub fn record(&mut self, outcome: MessageOutcome) {
        if outcome == MessageOutcome::Completed {
            self.completed += 1;
        } else if outcome.is_skip() {
            self.skipped += 1;
        } else if outcome.is_failure() {
            self.failed += 1;
        }
    }
}
