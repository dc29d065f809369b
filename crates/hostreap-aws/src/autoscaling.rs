//! Auto Scaling lifecycle notifier.

use async_trait::async_trait;
use aws_sdk_autoscaling::Client;
use aws_sdk_autoscaling::error::DisplayErrorContext;

use hostreap_core::{
    CompletionError, LifecycleActionContext, LifecycleActionResult, LifecycleNotifier,
};

/// Completes lifecycle actions through `CompleteLifecycleAction`.
pub struct AutoScalingNotifier {
    client: Client,
}

impl AutoScalingNotifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(sdk: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(sdk))
    }
}

#[async_trait]
impl LifecycleNotifier for AutoScalingNotifier {
    async fn complete_lifecycle_action(
        &self,
        action: &LifecycleActionContext,
        result: LifecycleActionResult,
    ) -> Result<(), CompletionError> {
        self.client
            .complete_lifecycle_action()
            .auto_scaling_group_name(&action.group_name)
            .lifecycle_action_token(&action.action_token)
            .lifecycle_hook_name(&action.hook_name)
            .lifecycle_action_result(result.as_str())
            .send()
            .await
            .map(|_| ())
            .map_err(|e| CompletionError(DisplayErrorContext(&e).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_autoscaling::config::retry::RetryConfig;
    use aws_sdk_autoscaling::config::{BehaviorVersion, Credentials, Region};

    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_is_a_completion_error() {
        let config = aws_sdk_autoscaling::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .credentials_provider(Credentials::new("AKID", "SECRET", None, None, "test"))
            .endpoint_url("http://127.0.0.1:1")
            .retry_config(RetryConfig::disabled())
            .build();
        let notifier = AutoScalingNotifier::new(Client::from_conf(config));

        let action = LifecycleActionContext {
            group_name: "lifecycle-test".to_string(),
            action_token: "b19b6537-1d99-4c2d-be9f-187e7103d44c".to_string(),
            hook_name: "RemoveRancherHost".to_string(),
        };

        let err = notifier
            .complete_lifecycle_action(&action, LifecycleActionResult::Continue)
            .await
            .unwrap_err();
        assert!(!err.0.is_empty());
    }
}
