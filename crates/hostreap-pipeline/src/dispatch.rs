//! Dispatch loop — pulls one message at a time and drives it to
//! acknowledgment.
//!
//! ```text
//! Received → Decoded → Classified ─┬─ Skipped ─────────────────┬→ Acknowledged
//!                                  └─ Removing → Reported ─────┘
//! ```
//!
//! Every branch, including every failure branch, ends in exactly one
//! acknowledgment. Redelivering a message could replay deactivate or
//! delete against a host that is already half removed.

use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};

use hostreap_core::{
    ClusterControl, DispatchStats, Disposition, InboundMessage, LifecycleNotifier,
    MessageOutcome, MessageSource, RemovalOutcome, TerminationNotice, TransportError, classify,
    decode_event,
};

use crate::orchestrator::remove_host;
use crate::reporter::report_completion;

/// Drives lifecycle notifications from a message source through host
/// removal and lifecycle completion.
pub struct Dispatcher<S, C, N> {
    source: S,
    cluster: C,
    notifier: N,
    /// Host label that holds the cloud instance ID.
    host_label: String,
    stats: DispatchStats,
}

impl<S, C, N> Dispatcher<S, C, N>
where
    S: MessageSource,
    C: ClusterControl,
    N: LifecycleNotifier,
{
    /// Create a dispatcher over explicitly constructed collaborators.
    pub fn new(source: S, cluster: C, notifier: N, host_label: impl Into<String>) -> Self {
        Self {
            source,
            cluster,
            notifier,
            host_label: host_label.into(),
            stats: DispatchStats::default(),
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Run until the source is exhausted or shutdown is signalled.
    ///
    /// Shutdown is only observed while waiting for a message; a message
    /// already received always runs to acknowledgment. A transport
    /// failure of the source is returned and should end the process.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<DispatchStats, TransportError> {
        info!(host_label = %self.host_label, "dispatch loop started, awaiting messages");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let received = tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    info!("dispatch loop shutting down");
                    break;
                }
                received = self.source.receive() => received,
            };

            let message = match received {
                Ok(Some(message)) => message,
                Ok(None) => {
                    info!("message source exhausted");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "message source failed");
                    return Err(e);
                }
            };

            self.dispatch(message).await?;
        }

        let stats = self.stats;
        info!(
            received = stats.received,
            completed = stats.completed,
            skipped = stats.skipped,
            failed = stats.failed,
            "dispatch loop stopped"
        );
        Ok(stats)
    }

    /// Receive and fully process a single message.
    ///
    /// Returns `Ok(None)` when the source is exhausted.
    pub async fn process_next(&mut self) -> Result<Option<MessageOutcome>, TransportError> {
        match self.source.receive().await? {
            Some(message) => self.dispatch(message).await.map(Some),
            None => Ok(None),
        }
    }

    async fn dispatch(&mut self, message: InboundMessage) -> Result<MessageOutcome, TransportError> {
        self.stats.received += 1;

        let span = info_span!("message", message_id = %message.id);
        let outcome = self.handle(&message.body).instrument(span).await;

        if let Err(e) = self.source.acknowledge(&message).await {
            error!(message_id = %message.id, error = %e, "failed to acknowledge message");
            return Err(e);
        }
        self.stats.acknowledged += 1;
        self.stats.record(outcome);

        debug!(message_id = %message.id, ?outcome, "message acknowledged");
        Ok(outcome)
    }

    /// Decode, classify, and act on one payload. Never fails: every
    /// error is logged and folded into the outcome.
    pub async fn handle(&self, body: &str) -> MessageOutcome {
        info!("message received");

        let event = match decode_event(body) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "invalid payload, cannot process this message");
                return MessageOutcome::InvalidPayload;
            }
        };

        match classify(event) {
            Ok(Disposition::TestNotification) => {
                info!("test notification, no further processing required");
                MessageOutcome::TestNotification
            }
            Ok(Disposition::Unrecognized) => {
                info!("unknown message type, ignoring");
                MessageOutcome::Unrecognized
            }
            Ok(Disposition::Termination(notice)) => self.terminate(&notice).await,
            Err(e) => {
                warn!(error = %e, "invalid termination notice, cannot process this message");
                MessageOutcome::InvalidPayload
            }
        }
    }

    async fn terminate(&self, notice: &TerminationNotice) -> MessageOutcome {
        let instance_id = notice.instance_id.as_str();
        info!(
            %instance_id,
            group = ?notice.action.group_name,
            hook = ?notice.action.hook_name,
            "received instance terminating notification"
        );

        match remove_host(&self.cluster, &self.host_label, instance_id).await {
            RemovalOutcome::NoHostFound => {
                warn!(
                    %instance_id,
                    label = %self.host_label,
                    "host not found in cluster manager, nothing to remove"
                );
                MessageOutcome::NoHostFound
            }
            RemovalOutcome::StepFailed { step, cause } => {
                error!(
                    %instance_id,
                    %step,
                    error = %cause,
                    "could not remove the host from the cluster manager"
                );
                MessageOutcome::RemovalFailed(step)
            }
            RemovalOutcome::Completed { host } => {
                debug!(%instance_id, host_id = %host, "resolving lifecycle hook");
                match report_completion(&self.notifier, &notice.action).await {
                    Ok(()) => MessageOutcome::Completed,
                    Err(_) => MessageOutcome::CompletionFailed,
                }
            }
        }
    }
}
