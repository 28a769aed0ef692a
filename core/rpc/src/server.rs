use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use axum_server::tls_rustls::RustlsConfig;
use canary_store::Store;
use canary_types::{node_id, Ack, JoinMeshResponse, NodeDiscoveryRequest, NodeState, Sample, WireNode};
use tokio::sync::mpsc;

use crate::error::Error;
use crate::tls::ServerTlsConfig;

/// Emitted whenever the server learns of a node it didn't already know
/// about, so the membership engine (C4) can react without the handler
/// blocking on it. Spec §4.2: "forwards discovery events into C6's
/// channel."
#[derive(Debug, Clone)]
pub struct NodeDiscovered {
    pub new_node: WireNode,
    pub from: u32,
}

pub struct PeerServerState {
    pub self_name: String,
    pub store: Arc<dyn Store>,
    pub discovered_tx: mpsc::UnboundedSender<NodeDiscovered>,
}

pub fn router(state: Arc<PeerServerState>) -> Router {
    Router::new()
        .route("/mesh/v1/join", post(join_mesh))
        .route("/mesh/v1/ping", post(ping))
        .route("/mesh/v1/discover", post(node_discovery))
        .route("/mesh/v1/push_samples", post(push_samples))
        .route("/mesh/v1/rtt", post(rtt))
        .with_state(state)
}

/// Runs the peer server until `shutdown` fires. Binds plaintext if `tls` has
/// no material configured, otherwise serves HTTP/2 over rustls (spec §6:
/// "transport over HTTP/2 with optional mutual TLS").
pub async fn serve(
    addr: SocketAddr,
    tls: &ServerTlsConfig,
    state: Arc<PeerServerState>,
    shutdown: canary_shutdown::ShutdownController,
) -> Result<(), Error> {
    let app = router(state);
    if tls.is_configured() {
        let cert = tls.cert_path.as_ref().unwrap();
        let key = tls.key_path.as_ref().unwrap();
        let config = RustlsConfig::from_pem_file(cert, key)
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;
        tracing::info!(%addr, "peer server listening (tls)");
        axum_server::bind_rustls(addr, config)
            .handle({
                let handle = axum_server::Handle::new();
                let waiter = handle.clone();
                tokio::spawn(async move {
                    shutdown.wait().await;
                    waiter.graceful_shutdown(None);
                });
                handle
            })
            .serve(app.into_make_service())
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;
    } else {
        tracing::info!(%addr, "peer server listening (plaintext)");
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;
    }
    Ok(())
}

async fn join_mesh(
    State(state): State<Arc<PeerServerState>>,
    Json(req): Json<WireNode>,
) -> Json<JoinMeshResponse> {
    if req.name == state.self_name {
        return Json(JoinMeshResponse::rejected(state.self_name.clone()));
    }

    let dbn = state.store.get_node_by_name(&req.name);
    let collides = !dbn.is_absent() && dbn.state == NodeState::Ok && dbn.target != req.target;
    if collides {
        return Json(JoinMeshResponse::rejected(state.self_name.clone()));
    }

    let from = node_id(&req.target);
    let _ = state.discovered_tx.send(NodeDiscovered {
        new_node: req,
        from,
    });

    let nodes = state.store.list_nodes().iter().map(WireNode::from).collect();
    Json(JoinMeshResponse {
        name_unique: true,
        my_name: state.self_name.clone(),
        nodes,
    })
}

async fn ping(State(state): State<Arc<PeerServerState>>, Json(req): Json<WireNode>) -> Json<Ack> {
    if !req.name.is_empty() || !req.target.is_empty() {
        state.store.set_node(req.into_node(NodeState::Ok));
    }
    Json(Ack::default())
}

async fn node_discovery(
    State(state): State<Arc<PeerServerState>>,
    Json(req): Json<NodeDiscoveryRequest>,
) -> Json<Ack> {
    let from = node_id(&req.i_am_node.target);
    let _ = state.discovered_tx.send(NodeDiscovered {
        new_node: req.new_node,
        from,
    });
    Json(Ack::default())
}

async fn push_samples(
    State(state): State<Arc<PeerServerState>>,
    Json(req): Json<crate::PushSamplesRequest>,
) -> Json<Ack> {
    for wire in req.samples {
        let Some(sample) = wire.try_into_sample() else {
            continue;
        };
        apply_incoming_sample(state.store.as_ref(), sample);
    }
    Json(Ack::default())
}

/// The monotonic-merge rule (spec §4.2): a sample only overwrites the
/// stored row for its `(from, to, key)` if its timestamp is strictly
/// greater. Ties and older samples are silently dropped.
fn apply_incoming_sample(store: &dyn Store, sample: Sample) {
    if sample.ts > store.get_sample_ts(sample.id) {
        store.set_sample(sample);
    }
}

/// Rtt must do no work other than returning — any added logic here biases
/// the RTT measurement that calls it (spec §4.2).
async fn rtt() -> Json<Ack> {
    Json(Ack::default())
}

#[cfg(test)]
mod tests {
    use canary_store::InMemoryStore;
    use canary_types::{Node, SampleKey};

    use super::*;

    fn state() -> (Arc<PeerServerState>, mpsc::UnboundedReceiver<NodeDiscovered>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(PeerServerState {
            self_name: "self".into(),
            store: Arc::new(InMemoryStore::new()),
            discovered_tx: tx,
        });
        (state, rx)
    }

    #[tokio::test]
    async fn join_mesh_rejects_own_name() {
        let (state, _rx) = state();
        let req = WireNode {
            name: "self".into(),
            target: "10.0.0.1:9001".into(),
        };
        let resp = join_mesh(State(state), Json(req)).await;
        assert!(!resp.name_unique);
        assert!(resp.nodes.is_empty());
    }

    #[tokio::test]
    async fn join_mesh_rejects_colliding_ok_name_different_target() {
        let (state, _rx) = state();
        state.store.set_node(Node::new("peer", "10.0.0.1:9001", NodeState::Ok));
        let req = WireNode {
            name: "peer".into(),
            target: "10.0.0.2:9001".into(),
        };
        let resp = join_mesh(State(state), Json(req)).await;
        assert!(!resp.name_unique);
    }

    #[tokio::test]
    async fn join_mesh_accepts_rejoin_with_same_target() {
        let (state, mut rx) = state();
        state.store.set_node(Node::new("peer", "10.0.0.1:9001", NodeState::Ok));
        let req = WireNode {
            name: "peer".into(),
            target: "10.0.0.1:9001".into(),
        };
        let resp = join_mesh(State(state), Json(req)).await;
        assert!(resp.name_unique);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn join_mesh_accepts_non_ok_name_collision() {
        let (state, mut rx) = state();
        state.store.set_node(Node::new("peer", "10.0.0.1:9001", NodeState::Timeout));
        let req = WireNode {
            name: "peer".into(),
            target: "10.0.0.2:9001".into(),
        };
        let resp = join_mesh(State(state), Json(req)).await;
        assert!(resp.name_unique);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn push_samples_applies_monotonic_merge() {
        let (state, _rx) = state();
        let newer = canary_types::WireSample {
            from: "x".into(),
            to: "y".into(),
            key: SampleKey::RttRequest.decimal(),
            value: "5".into(),
            ts: 100,
        };
        let older = canary_types::WireSample {
            from: "x".into(),
            to: "y".into(),
            key: SampleKey::RttRequest.decimal(),
            value: "3".into(),
            ts: 50,
        };
        push_samples(
            State(state.clone()),
            Json(crate::PushSamplesRequest {
                samples: vec![newer],
            }),
        )
        .await;
        push_samples(
            State(state.clone()),
            Json(crate::PushSamplesRequest {
                samples: vec![older],
            }),
        )
        .await;
        let id = canary_types::sample_id("x", "y", SampleKey::RttRequest);
        let stored = state.store.get_sample(id).unwrap();
        assert_eq!(stored.value, "5");
        assert_eq!(stored.ts, 100);
    }

    #[tokio::test]
    async fn ping_with_empty_node_does_not_write() {
        let (state, _rx) = state();
        let before = state.store.list_nodes().len();
        ping(
            State(state.clone()),
            Json(WireNode {
                name: String::new(),
                target: String::new(),
            }),
        )
        .await;
        assert_eq!(state.store.list_nodes().len(), before);
    }
}
