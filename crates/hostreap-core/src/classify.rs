//! Event classification.

use crate::error::DecodeError;
use crate::types::{
    INSTANCE_TERMINATING_TRANSITION, LifecycleEvent, PendingLifecycleAction,
    TEST_NOTIFICATION_EVENT, TerminationNotice,
};

/// What to do with a decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Auto Scaling test notification. Acknowledge only.
    TestNotification,
    /// An instance is terminating; remove its host.
    Termination(TerminationNotice),
    /// Neither marker matched. Acknowledge only.
    Unrecognized,
}

/// Classify a decoded event.
///
/// The test marker is checked first, so an event carrying both markers
/// never triggers a removal. A termination event needs an instance ID;
/// the hook fields are carried as they are and only checked when the
/// hook is completed.
pub fn classify(event: LifecycleEvent) -> Result<Disposition, DecodeError> {
    if event.event.as_deref() == Some(TEST_NOTIFICATION_EVENT) {
        return Ok(Disposition::TestNotification);
    }

    if event.lifecycle_transition.as_deref() != Some(INSTANCE_TERMINATING_TRANSITION) {
        return Ok(Disposition::Unrecognized);
    }

    let LifecycleEvent {
        instance_id,
        auto_scaling_group_name,
        lifecycle_action_token,
        lifecycle_hook_name,
        ..
    } = event;

    let instance_id = instance_id
        .filter(|v| !v.is_empty())
        .ok_or(DecodeError::MissingField("EC2InstanceId"))?;

    Ok(Disposition::Termination(TerminationNotice {
        instance_id,
        action: PendingLifecycleAction {
            group_name: auto_scaling_group_name,
            action_token: lifecycle_action_token,
            hook_name: lifecycle_hook_name,
        },
    }))
}
