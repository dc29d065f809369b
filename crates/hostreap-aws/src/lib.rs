//! hostreap-aws — AWS-backed collaborators.
//!
//! - [`SqsMessageSource`]: long-polls the queue the lifecycle hook
//!   publishes to and deletes messages on acknowledgment.
//! - [`AutoScalingNotifier`]: completes pending lifecycle actions.

pub mod autoscaling;
pub mod sqs;

pub use autoscaling::AutoScalingNotifier;
pub use sqs::SqsMessageSource;

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Load shared SDK configuration (credentials chain, retries) for `region`.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
