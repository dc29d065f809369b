//! hostreap-pipeline — lifecycle-event reconciliation.
//!
//! # Architecture
//!
//! ```text
//! Dispatcher (one message at a time)
//!   ├── MessageSource::receive()
//!   ├── decode_event() + classify()
//!   ├── remove_host()                  → RemovalOutcome
//!   │   ├── lookup_hosts_by_label()
//!   │   ├── deactivate_host()
//!   │   └── delete_host()
//!   ├── report_completion()            (only after Completed)
//!   └── MessageSource::acknowledge()   (always, exactly once)
//! ```
//!
//! Per-message failures are logged and end in acknowledgment. Only a
//! failure of the message source itself is returned to the caller.
//!
//! The removal sequence is never retried here. A stalled lifecycle hook
//! is completed by the autoscaling service once its grace period runs
//! out, so the instance still terminates.

pub mod dispatch;
pub mod orchestrator;
pub mod reporter;

pub use dispatch::Dispatcher;
pub use orchestrator::remove_host;
pub use reporter::report_completion;
