//! In-memory collaborators that record every call.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use hostreap_core::*;

pub const TERMINATING: &str = r#"{"AutoScalingGroupName":"lifecycle-test","Service":"AWS Auto Scaling","Time":"2015-10-21T13:40:02.108Z","AccountId":"391126026396","LifecycleTransition":"autoscaling:EC2_INSTANCE_TERMINATING","RequestId":"58a52fc2-7e52-42c1-8d8b-7faebc58e2cb","LifecycleActionToken":"b19b6537-1d99-4c2d-be9f-187e7103d44c","EC2InstanceId":"i-abc","LifecycleHookName":"RemoveRancherHost"}"#;

pub const TEST_NOTIFICATION: &str = r#"{"Event":"autoscaling:TEST_NOTIFICATION"}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Lookup { label: String, value: String },
    Deactivate(String),
    Delete(String),
    Complete {
        group: String,
        token: String,
        hook: String,
        result: &'static str,
    },
}

/// Shared, ordered record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn deactivations(&self) -> usize {
        self.count(|c| matches!(c, Call::Deactivate(_)))
    }

    pub fn deletions(&self) -> usize {
        self.count(|c| matches!(c, Call::Delete(_)))
    }

    pub fn completions(&self) -> usize {
        self.count(|c| matches!(c, Call::Complete { .. }))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nowhere,
    Lookup,
    Deactivate,
    Delete,
}

pub struct FakeCluster {
    log: CallLog,
    hosts: Vec<HostId>,
    fail_at: FailAt,
}

impl FakeCluster {
    pub fn new(log: &CallLog, hosts: &[&str]) -> Self {
        Self {
            log: log.clone(),
            hosts: hosts.iter().map(|h| HostId::new(*h)).collect(),
            fail_at: FailAt::Nowhere,
        }
    }

    pub fn failing_at(mut self, fail_at: FailAt) -> Self {
        self.fail_at = fail_at;
        self
    }

    fn outcome(&self, step: FailAt) -> Result<(), ClusterError> {
        if self.fail_at == step {
            Err(ClusterError::Status {
                status: 500,
                body: format!("{step:?} rejected"),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ClusterControl for FakeCluster {
    async fn lookup_hosts_by_label(
        &self,
        label_name: &str,
        label_value: &str,
    ) -> Result<Vec<HostId>, ClusterError> {
        self.log.push(Call::Lookup {
            label: label_name.to_string(),
            value: label_value.to_string(),
        });
        self.outcome(FailAt::Lookup)?;
        Ok(self.hosts.clone())
    }

    async fn deactivate_host(&self, host: &HostId) -> Result<(), ClusterError> {
        self.log.push(Call::Deactivate(host.to_string()));
        self.outcome(FailAt::Deactivate)
    }

    async fn delete_host(&self, host: &HostId) -> Result<(), ClusterError> {
        self.log.push(Call::Delete(host.to_string()));
        self.outcome(FailAt::Delete)
    }
}

pub struct FakeNotifier {
    log: CallLog,
    fail: bool,
}

impl FakeNotifier {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            fail: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl LifecycleNotifier for FakeNotifier {
    async fn complete_lifecycle_action(
        &self,
        action: &LifecycleActionContext,
        result: LifecycleActionResult,
    ) -> Result<(), CompletionError> {
        self.log.push(Call::Complete {
            group: action.group_name.clone(),
            token: action.action_token.clone(),
            hook: action.hook_name.clone(),
            result: result.as_str(),
        });
        if self.fail {
            Err(CompletionError("ValidationError: no active lifecycle action".to_string()))
        } else {
            Ok(())
        }
    }
}

/// A finite queue. Receiving past the end yields `None`, or a transport
/// error when `fail_when_drained` is set.
pub struct QueueSource {
    pending: VecDeque<InboundMessage>,
    acked: Arc<Mutex<Vec<String>>>,
    fail_when_drained: bool,
    fail_ack: bool,
}

impl QueueSource {
    pub fn new(bodies: &[&str]) -> Self {
        let pending = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| InboundMessage {
                id: format!("msg-{i}"),
                body: body.to_string(),
                receipt: format!("receipt-{i}"),
            })
            .collect();
        Self {
            pending,
            acked: Arc::default(),
            fail_when_drained: false,
            fail_ack: false,
        }
    }

    pub fn fail_when_drained(mut self) -> Self {
        self.fail_when_drained = true;
        self
    }

    pub fn fail_ack(mut self) -> Self {
        self.fail_ack = true;
        self
    }

    /// Receipts acknowledged so far, in order.
    pub fn acked(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.acked)
    }
}

#[async_trait]
impl MessageSource for QueueSource {
    async fn receive(&mut self) -> Result<Option<InboundMessage>, TransportError> {
        match self.pending.pop_front() {
            Some(message) => Ok(Some(message)),
            None if self.fail_when_drained => {
                Err(TransportError::Receive("connection reset".to_string()))
            }
            None => Ok(None),
        }
    }

    async fn acknowledge(&mut self, message: &InboundMessage) -> Result<(), TransportError> {
        if self.fail_ack {
            return Err(TransportError::Acknowledge {
                message_id: message.id.clone(),
                reason: "access denied".to_string(),
            });
        }
        self.acked.lock().unwrap().push(message.receipt.clone());
        Ok(())
    }
}
