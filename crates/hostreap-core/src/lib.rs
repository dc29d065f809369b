//! hostreap-core — the lifecycle event model for hostreap.
//!
//! Decodes Auto Scaling lifecycle notifications, classifies them, and
//! defines the three collaborator capabilities the reconciler drives:
//! a message source, a cluster control API, and a lifecycle notifier.
//!
//! # Flow
//!
//! ```text
//! InboundMessage.body
//!   └── decode::decode_event()   → LifecycleEvent | DecodeError
//!       └── classify::classify() → Disposition
//!           ├── TestNotification  (acknowledge only)
//!           ├── Unrecognized      (acknowledge only)
//!           └── Termination(TerminationNotice)
//! ```
//!
//! Nothing here performs I/O. Concrete collaborators live in
//! `hostreap-rancher` and `hostreap-aws`; the sequencing lives in
//! `hostreap-pipeline`.

pub mod classify;
pub mod collab;
pub mod config;
pub mod decode;
pub mod error;
pub mod types;

pub use classify::{Disposition, classify};
pub use collab::{ClusterControl, LifecycleNotifier, MessageSource};
pub use config::ReaperConfig;
pub use decode::decode_event;
pub use error::{ClusterError, CompletionError, ConfigError, DecodeError, TransportError};
pub use types::*;
