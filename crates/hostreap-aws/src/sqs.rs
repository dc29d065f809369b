//! SQS message source.

use std::collections::VecDeque;

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message;
use tracing::{debug, trace};

use hostreap_core::config::QueueConfig;
use hostreap_core::{InboundMessage, MessageSource, TransportError};

/// Yields queue messages one at a time.
///
/// A receive call may return a batch; the extra messages are buffered
/// and handed out before the queue is polled again.
pub struct SqsMessageSource {
    client: Client,
    queue_url: String,
    wait_time_secs: i32,
    max_messages: i32,
    visibility_timeout_secs: Option<i32>,
    buffered: VecDeque<InboundMessage>,
}

impl SqsMessageSource {
    pub fn new(client: Client, config: &QueueConfig) -> Self {
        Self {
            client,
            queue_url: config.url.clone(),
            wait_time_secs: to_i32(config.wait_time_secs),
            max_messages: to_i32(config.max_messages).max(1),
            visibility_timeout_secs: config.visibility_timeout_secs.map(to_i32),
            buffered: VecDeque::new(),
        }
    }

    /// Build a source with a client from shared SDK config.
    pub fn from_sdk_config(sdk: &aws_config::SdkConfig, config: &QueueConfig) -> Self {
        Self::new(Client::new(sdk), config)
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

#[async_trait]
impl MessageSource for SqsMessageSource {
    async fn receive(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        loop {
            if let Some(message) = self.buffered.pop_front() {
                return Ok(Some(message));
            }

            let mut request = self
                .client
                .receive_message()
                .queue_url(&self.queue_url)
                .max_number_of_messages(self.max_messages)
                .wait_time_seconds(self.wait_time_secs);
            if let Some(secs) = self.visibility_timeout_secs {
                request = request.visibility_timeout(secs);
            }

            let output = request
                .send()
                .await
                .map_err(|e| TransportError::Receive(DisplayErrorContext(&e).to_string()))?;

            let messages = output.messages.unwrap_or_default();
            if messages.is_empty() {
                trace!(queue = %self.queue_url, "empty poll");
                continue;
            }

            debug!(queue = %self.queue_url, count = messages.len(), "received messages");
            for message in messages {
                self.buffered.push_back(into_inbound(message)?);
            }
        }
    }

    async fn acknowledge(&mut self, message: &InboundMessage) -> Result<(), TransportError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.receipt)
            .send()
            .await
            .map_err(|e| TransportError::Acknowledge {
                message_id: message.id.clone(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}

/// Convert an SQS message. A missing body decodes as an empty payload;
/// a missing receipt handle means the message could never be deleted.
fn into_inbound(message: Message) -> Result<InboundMessage, TransportError> {
    let id = message.message_id.unwrap_or_default();
    let receipt = message.receipt_handle.ok_or_else(|| {
        TransportError::Protocol(format!("message {id:?} has no receipt handle"))
    })?;
    Ok(InboundMessage {
        id,
        body: message.body.unwrap_or_default(),
        receipt,
    })
}

#[cfg(test)]
mod tests {
    use aws_sdk_sqs::config::retry::RetryConfig;
    use aws_sdk_sqs::config::{BehaviorVersion, Credentials, Region};

    use super::*;

    fn offline_client() -> Client {
        let config = aws_sdk_sqs::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .credentials_provider(Credentials::new("AKID", "SECRET", None, None, "test"))
            .endpoint_url("http://127.0.0.1:1")
            .retry_config(RetryConfig::disabled())
            .build();
        Client::from_conf(config)
    }

    fn queue_config() -> QueueConfig {
        QueueConfig {
            url: "http://127.0.0.1:1/123456789012/asg-lifecycle".to_string(),
            ..QueueConfig::default()
        }
    }

    #[test]
    fn converts_message() {
        let message = Message::builder()
            .message_id("9a4f8e17-8c48-4ac0-a98d-a4918181e6a5")
            .receipt_handle("AQEBvsuVlJ4eXC3k")
            .body(r#"{"Event":"autoscaling:TEST_NOTIFICATION"}"#)
            .build();

        let inbound = into_inbound(message).unwrap();
        assert_eq!(inbound.id, "9a4f8e17-8c48-4ac0-a98d-a4918181e6a5");
        assert_eq!(inbound.receipt, "AQEBvsuVlJ4eXC3k");
        assert_eq!(inbound.body, r#"{"Event":"autoscaling:TEST_NOTIFICATION"}"#);
    }

    #[test]
    fn missing_body_is_empty_payload() {
        let message = Message::builder().message_id("m").receipt_handle("r").build();
        assert_eq!(into_inbound(message).unwrap().body, "");
    }

    #[test]
    fn missing_receipt_is_protocol_error() {
        let message = Message::builder().message_id("m").body("{}").build();
        assert!(matches!(into_inbound(message), Err(TransportError::Protocol(_))));
    }

    #[test]
    fn config_values_are_carried() {
        let mut config = queue_config();
        config.max_messages = 10;
        config.wait_time_secs = 5;
        config.visibility_timeout_secs = Some(120);

        let source = SqsMessageSource::new(offline_client(), &config);
        assert_eq!(source.queue_url(), config.url);
        assert_eq!(source.max_messages, 10);
        assert_eq!(source.wait_time_secs, 5);
        assert_eq!(source.visibility_timeout_secs, Some(120));
    }

    #[tokio::test]
    async fn buffered_messages_are_returned_without_polling() {
        let mut source = SqsMessageSource::new(offline_client(), &queue_config());
        source.buffered.push_back(InboundMessage {
            id: "m1".to_string(),
            body: "{}".to_string(),
            receipt: "r1".to_string(),
        });

        let message = source.receive().await.unwrap().unwrap();
        assert_eq!(message.id, "m1");
    }

    #[tokio::test]
    async fn unreachable_queue_is_a_receive_error() {
        let mut source = SqsMessageSource::new(offline_client(), &queue_config());
        assert!(matches!(source.receive().await, Err(TransportError::Receive(_))));
    }

    #[tokio::test]
    async fn unreachable_queue_is_an_acknowledge_error() {
        let mut source = SqsMessageSource::new(offline_client(), &queue_config());
        let message = InboundMessage {
            id: "m1".to_string(),
            body: "{}".to_string(),
            receipt: "r1".to_string(),
        };
        let err = source.acknowledge(&message).await.unwrap_err();
        assert!(matches!(err, TransportError::Acknowledge { ref message_id, .. } if message_id == "m1"));
    }
}
