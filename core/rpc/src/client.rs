use std::collections::HashMap;
use std::time::Duration;

use canary_types::{
    Ack, JoinMeshResponse, Node, NodeDiscoveryRequest, PushSamplesRequest, WireNode,
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Error;
use crate::tls::ClientTlsConfig;

/// A single dialed peer endpoint with a per-call deadline baked in (spec
/// §4.3: "install a per-call deadline wrapper with timeout
/// `request_timeout`").
pub struct PeerClient {
    http: reqwest::Client,
    base_url: String,
}

impl PeerClient {
    pub fn new(target: &str, tls: &ClientTlsConfig, request_timeout: Duration) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder().timeout(request_timeout);

        if let Some(ca_path) = &tls.ca_path {
            let ca_pem = std::fs::read(ca_path).map_err(|e| Error::Tls(e.to_string()))?;
            let ca = reqwest::Certificate::from_pem(&ca_pem).map_err(|e| Error::Tls(e.to_string()))?;
            builder = builder.add_root_certificate(ca);

            if let (Some(cert_path), Some(key_path)) = (&tls.client_cert_path, &tls.client_key_path) {
                let mut identity_pem = std::fs::read(cert_path).map_err(|e| Error::Tls(e.to_string()))?;
                identity_pem.extend(std::fs::read(key_path).map_err(|e| Error::Tls(e.to_string()))?);
                let identity =
                    reqwest::Identity::from_pem(&identity_pem).map_err(|e| Error::Tls(e.to_string()))?;
                builder = builder.identity(identity);
            }
        }

        let http = builder.build()?;
        Ok(Self {
            http,
            base_url: format!("{}://{}", tls.scheme(), target),
        })
    }

    async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        req: &Req,
    ) -> Result<Resp, Error> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(req)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { Error::Deadline } else { Error::Transport(e) })?;
        let resp = resp.error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn join_mesh(&self, req: &WireNode) -> Result<JoinMeshResponse, Error> {
        self.post("/mesh/v1/join", req).await
    }

    pub async fn ping(&self, req: &WireNode) -> Result<Ack, Error> {
        self.post("/mesh/v1/ping", req).await
    }

    pub async fn node_discovery(&self, req: &NodeDiscoveryRequest) -> Result<Ack, Error> {
        self.post("/mesh/v1/discover", req).await
    }

    pub async fn push_samples(&self, req: &PushSamplesRequest) -> Result<Ack, Error> {
        self.post("/mesh/v1/push_samples", req).await
    }

    pub async fn rtt(&self) -> Result<Ack, Error> {
        self.post("/mesh/v1/rtt", &serde_json::json!({})).await
    }
}

/// Lazy map from node-id to a live client (spec §4.3). The membership and
/// sample engines never dial directly; every outbound call goes through
/// here so duplicate dials for the same peer collapse into one entry.
pub struct ClientPool {
    clients: Mutex<HashMap<u32, std::sync::Arc<PeerClient>>>,
    tls: ClientTlsConfig,
    request_timeout: Duration,
}

impl ClientPool {
    pub fn new(tls: ClientTlsConfig, request_timeout: Duration) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            tls,
            request_timeout,
        }
    }

    pub fn init_client(&self, node: &Node) -> Result<std::sync::Arc<PeerClient>, Error> {
        let mut guard = self.clients.lock();
        if let Some(existing) = guard.get(&node.id) {
            return Ok(existing.clone());
        }
        let client = std::sync::Arc::new(PeerClient::new(
            &node.target,
            &self.tls,
            self.request_timeout,
        )?);
        guard.insert(node.id, client.clone());
        Ok(client)
    }

    pub fn close_client(&self, id: u32) {
        self.clients.lock().remove(&id);
    }

    /// A client that bypasses the pool. Used by the RTT measurement path
    /// (spec §4.5.1) so connection setup isn't hidden by connection reuse.
    pub fn dial_fresh(&self, target: &str) -> Result<PeerClient, Error> {
        PeerClient::new(target, &self.tls, self.request_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_client_is_idempotent() {
        let pool = ClientPool::new(ClientTlsConfig::default(), Duration::from_secs(1));
        let node = Node::new("a", "127.0.0.1:1", canary_types::NodeState::Ok);
        let first = pool.init_client(&node).unwrap();
        let second = pool.init_client(&node).unwrap();
        assert!(std::sync::Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn close_client_allows_redial() {
        let pool = ClientPool::new(ClientTlsConfig::default(), Duration::from_secs(1));
        let node = Node::new("a", "127.0.0.1:1", canary_types::NodeState::Ok);
        let first = pool.init_client(&node).unwrap();
        pool.close_client(node.id);
        let second = pool.init_client(&node).unwrap();
        assert!(!std::sync::Arc::ptr_eq(&first, &second));
    }
}
