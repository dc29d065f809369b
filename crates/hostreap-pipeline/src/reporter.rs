//! Lifecycle completion reporter.

use tracing::{info, warn};

use hostreap_core::{
    CompletionError, LifecycleActionResult, LifecycleNotifier, PendingLifecycleAction,
};

/// Tell the autoscaling control plane the instance may terminate.
///
/// Called once per successful removal. A failure is logged and returned
/// but never retried: the provider completes the hook itself when its
/// timeout expires. A notice missing a hook field is reported the same
/// way without calling the notifier.
pub async fn report_completion<N>(
    notifier: &N,
    pending: &PendingLifecycleAction,
) -> Result<(), CompletionError>
where
    N: LifecycleNotifier + ?Sized,
{
    let action = match pending.context() {
        Ok(action) => action,
        Err(e) => {
            warn!(
                group = ?pending.group_name,
                hook = ?pending.hook_name,
                error = %e,
                "cannot complete the lifecycle hook, the provider will complete it after its timeout"
            );
            return Err(e);
        }
    };

    let result = LifecycleActionResult::Continue;
    match notifier.complete_lifecycle_action(&action, result).await {
        Ok(()) => {
            info!(
                group = %action.group_name,
                hook = %action.hook_name,
                %result,
                "lifecycle hook resolved"
            );
            Ok(())
        }
        Err(e) => {
            warn!(
                group = %action.group_name,
                hook = %action.hook_name,
                error = %e,
                "could not complete the lifecycle hook, the provider will complete it after its timeout"
            );
            Err(e)
        }
    }
}
