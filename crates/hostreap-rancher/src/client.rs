//! Rancher API client.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method, Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use hostreap_core::config::ClusterConfig;
use hostreap_core::{ClusterControl, ClusterError, ConfigError, HostId};

use crate::model::{Host, HostCollection};

/// Guard against a server that keeps handing out `next` links.
const MAX_PAGES: usize = 100;
/// Longest error body kept in a `ClusterError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// Cluster control backed by the Rancher v1 API.
#[derive(Clone)]
pub struct RancherClient {
    http: Client<HttpConnector, Full<Bytes>>,
    /// Base URL without a trailing slash.
    endpoint: String,
    /// `http://host:port` of `endpoint`; every request goes here.
    origin: String,
    authorization: HeaderValue,
    timeout: Duration,
}

impl RancherClient {
    /// Create a client for `endpoint` (e.g. `http://rancher-server:8080`).
    pub fn new(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if !endpoint.starts_with("http://") {
            return Err(ConfigError::Invalid {
                key: "cluster.endpoint",
                reason: format!("only http:// endpoints are supported, got {endpoint:?}"),
            });
        }

        let authority = endpoint
            .parse::<Uri>()
            .ok()
            .and_then(|uri| uri.authority().cloned())
            .ok_or_else(|| ConfigError::Invalid {
                key: "cluster.endpoint",
                reason: format!("not a valid URL: {endpoint:?}"),
            })?;

        let credentials = STANDARD.encode(format!("{access_key}:{secret_key}"));
        let mut authorization = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| ConfigError::Invalid {
                key: "cluster.access_key",
                reason: e.to_string(),
            })?;
        authorization.set_sensitive(true);

        Ok(Self {
            http: Client::builder(TokioExecutor::new()).build_http(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            origin: format!("http://{authority}"),
            authorization,
            timeout,
        })
    }

    /// Create a client from the `[cluster]` config section.
    pub fn from_config(config: &ClusterConfig) -> Result<Self, ConfigError> {
        Self::new(
            &config.endpoint,
            &config.access_key,
            &config.secret_key,
            config.request_timeout()?,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// List every host, following pagination links.
    pub async fn list_hosts(&self) -> Result<Vec<Host>, ClusterError> {
        let mut hosts = Vec::new();
        let mut next = Some(format!("{}/v1/hosts", self.endpoint));
        let mut pages = 0;

        while let Some(uri) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(ClusterError::TooManyPages(MAX_PAGES));
            }

            let body = self.send(Method::GET, &uri, None).await?;
            let page: HostCollection = serde_json::from_slice(&body)
                .map_err(|e| ClusterError::Decode(format!("host collection: {e}")))?;

            hosts.extend(page.data);
            next = match page.pagination.and_then(|p| p.next) {
                Some(link) => Some(self.follow_link(&link)?),
                None => None,
            };
        }

        debug!(count = hosts.len(), pages, "listed hosts");
        Ok(hosts)
    }

    /// Resolve a `next` link against the configured server.
    ///
    /// Only the path and query are taken from the link, so credentials are
    /// never sent to a host or scheme the server names in its response.
    fn follow_link(&self, link: &str) -> Result<String, ClusterError> {
        let uri = link
            .parse::<Uri>()
            .map_err(|e| ClusterError::Decode(format!("pagination link {link:?}: {e}")))?;
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .filter(|pq| pq.starts_with('/'))
            .ok_or_else(|| ClusterError::Decode(format!("pagination link {link:?} has no path")))?;
        Ok(format!("{}{}", self.origin, path))
    }

    fn host_uri(&self, host: &HostId) -> String {
        format!("{}/v1/hosts/{}", self.endpoint, host)
    }

    /// Perform one request and return the body of a 2xx response.
    async fn send(&self, method: Method, uri: &str, body: Option<Bytes>) -> Result<Bytes, ClusterError> {
        let mut builder = Request::builder()
            .method(method.clone())
            .uri(uri)
            .header(AUTHORIZATION, self.authorization.clone())
            .header(ACCEPT, "application/json")
            .header("user-agent", "hostreap/0.1");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(Full::new(body.unwrap_or_default()))
            .map_err(|e| ClusterError::Transport(format!("build {method} {uri}: {e}")))?;

        let exchange = async {
            let resp = self
                .http
                .request(req)
                .await
                .map_err(|e| ClusterError::Transport(format!("{method} {uri}: {e}")))?;
            let status = resp.status();
            let bytes = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| ClusterError::Transport(format!("{method} {uri}: read body: {e}")))?
                .to_bytes();
            Ok::<_, ClusterError>((status, bytes))
        };

        let (status, bytes) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ClusterError::Timeout(self.timeout))??;

        if !status.is_success() {
            debug!(%method, %uri, %status, "cluster manager request rejected");
            return Err(ClusterError::Status {
                status: status.as_u16(),
                body: truncate(&String::from_utf8_lossy(&bytes), MAX_ERROR_BODY),
            });
        }

        Ok(bytes)
    }
}

#[async_trait]
impl ClusterControl for RancherClient {
    async fn lookup_hosts_by_label(
        &self,
        label_name: &str,
        label_value: &str,
    ) -> Result<Vec<HostId>, ClusterError> {
        let hosts = self.list_hosts().await?;
        Ok(select_hosts(&hosts, label_name, label_value))
    }

    async fn deactivate_host(&self, host: &HostId) -> Result<(), ClusterError> {
        let uri = format!("{}?action=deactivate", self.host_uri(host));
        self.send(Method::POST, &uri, Some(Bytes::from_static(b"{}")))
            .await
            .map(|_| ())
    }

    async fn delete_host(&self, host: &HostId) -> Result<(), ClusterError> {
        self.send(Method::DELETE, &self.host_uri(host), None)
            .await
            .map(|_| ())
    }
}

/// Registered hosts whose label `name` equals `value`, in listing order.
fn select_hosts(hosts: &[Host], name: &str, value: &str) -> Vec<HostId> {
    hosts
        .iter()
        .filter(|h| h.is_registered() && h.has_label(name, value))
        .map(|h| HostId::new(h.id.clone()))
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}
