//! Error types for hostreap.

use thiserror::Error;

/// Why a payload could not be turned into a usable event.
///
/// Every variant is reported as an invalid payload: retrying the same
/// bytes can never succeed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("termination notice is missing {0}")]
    MissingField(&'static str),
}

/// Failure of a cluster-manager call.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("cluster manager returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("host listing exceeded {0} pages")]
    TooManyPages(usize),
}

/// Failure to complete a lifecycle action. Never fatal.
#[derive(Debug, Error)]
#[error("lifecycle completion failed: {0}")]
pub struct CompletionError(pub String);

/// Failure of the message source itself. Terminates the process.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("receive failed: {0}")]
    Receive(String),

    #[error("acknowledge failed for message {message_id}: {reason}")]
    Acknowledge { message_id: String, reason: String },

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
