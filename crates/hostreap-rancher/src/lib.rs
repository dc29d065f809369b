//! hostreap-rancher — cluster control against the Rancher v1 API.
//!
//! | Operation | Request |
//! |---|---|
//! | lookup | `GET /v1/hosts` (follows `pagination.next`), filtered by label |
//! | deactivate | `POST /v1/hosts/{id}?action=deactivate` |
//! | delete | `DELETE /v1/hosts/{id}` |
//!
//! Requests use HTTP basic auth with an API access/secret key pair and
//! a per-request timeout.

pub mod client;
pub mod model;

pub use client::RancherClient;
pub use model::Host;
