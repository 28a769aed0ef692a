use std::sync::Arc;

use canary_rpc::{ClientPool, NodeDiscovered};
use canary_store::Store;
use canary_types::{node_id, sample_id, Node, NodeDiscoveryRequest, NodeState, SampleKey, WireNode};

use crate::config::MembershipConfig;
use crate::error::Error;

#[derive(Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AllTargetsFailed,
}

/// Drives the join protocol (§4.4.1), the per-node failure detector
/// (§4.4.2), and the node-discovery broadcast (§4.4.3). Ticks and mode
/// switching are the scheduler's job (C6); this engine is invoked by it and
/// never starts or stops its own timers.
pub struct MembershipEngine {
    cfg: MembershipConfig,
    self_id: u32,
    store: Arc<dyn Store>,
    clients: Arc<ClientPool>,
}

impl MembershipEngine {
    pub fn new(cfg: MembershipConfig, store: Arc<dyn Store>, clients: Arc<ClientPool>) -> Self {
        let self_id = node_id(&cfg.self_target);
        Self {
            cfg,
            self_id,
            store,
            clients,
        }
    }

    fn self_wire_node(&self) -> WireNode {
        WireNode {
            name: self.cfg.self_name.clone(),
            target: self.cfg.self_target.clone(),
        }
    }

    /// Spec §4.4.1: dial configured targets in order until one accepts us.
    ///
    /// Goes through the pool, not a fresh dial — spec §4.3 is explicit that
    /// "the membership/sample engines never dial directly" outside the RTT
    /// path, and `client.go`'s `Join()` likewise calls `m.initClient(...)`
    /// and then dials through `m.clients[GetId(node)]`. The placeholder
    /// node only exists to key the pool by target (its id is derived from
    /// `target` alone); its name is never sent anywhere.
    pub async fn attempt_join(&self) -> Result<JoinOutcome, Error> {
        for target in &self.cfg.targets {
            let placeholder = Node::new(String::new(), target.clone(), NodeState::Ok);
            let client = match self.clients.init_client(&placeholder) {
                Ok(client) => client,
                Err(e) => {
                    tracing::debug!(%target, error = %e, "join dial failed, trying next target");
                    continue;
                },
            };

            let resp = match client.join_mesh(&self.self_wire_node()).await {
                Ok(resp) => resp,
                Err(e) => {
                    tracing::debug!(%target, error = %e, "join call failed, trying next target");
                    continue;
                },
            };

            if !resp.name_unique {
                return Err(Error::NameCollision);
            }

            let peer = Node::new(resp.my_name, target.clone(), NodeState::Ok);
            self.store.set_node(peer);

            for wire in resp.nodes {
                if node_id(&wire.target) != self.self_id {
                    self.store.set_node(wire.into_node(NodeState::Ok));
                }
            }

            tracing::info!(%target, "joined mesh");
            return Ok(JoinOutcome::Joined);
        }
        Ok(JoinOutcome::AllTargetsFailed)
    }

    /// Spec §4.4.2: pick one random `Ok` node, ping it, retry on failure up
    /// to `ping_retry_amount` times before evicting. Returns `true` if the
    /// node table became empty as a result (the scheduler should re-enter
    /// join mode).
    pub async fn ping_tick(&self) -> bool {
        let mut candidates = self.store.random_nodes_by_state(NodeState::Ok, 1, &[]);
        let Some(node) = candidates.pop() else {
            return false;
        };

        let client = match self.clients.init_client(&node) {
            Ok(client) => client,
            Err(_) => return self.evict(&node),
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match client.ping(&self.self_wire_node()).await {
                Ok(_) => {
                    self.store.set_node(Node::new(
                        node.name.clone(),
                        node.target.clone(),
                        NodeState::Ok,
                    ));
                    return false;
                },
                Err(_) => {
                    self.store.set_node(Node::new(
                        node.name.clone(),
                        node.target.clone(),
                        NodeState::Timeout,
                    ));
                    self.mark_rtt_nan(&node.name);

                    if attempt >= self.cfg.ping_retry_amount {
                        return self.evict(&node);
                    }
                    tokio::time::sleep(self.cfg.ping_retry_delay).await;
                },
            }
        }
    }

    fn mark_rtt_nan(&self, peer_name: &str) {
        let total_id = sample_id(&self.cfg.self_name, peer_name, SampleKey::RttTotal);
        let request_id = sample_id(&self.cfg.self_name, peer_name, SampleKey::RttRequest);
        self.store.set_sample_nan(total_id);
        self.store.set_sample_nan(request_id);
    }

    /// Final step of the failure-detection ladder: transition to `Dead`,
    /// delete the row, close its client, and report whether the mesh is now
    /// empty.
    fn evict(&self, node: &Node) -> bool {
        self.store.set_node(Node::new(
            node.name.clone(),
            node.target.clone(),
            NodeState::Dead,
        ));
        self.store.delete_node(node.id);
        self.clients.close_client(node.id);
        tracing::info!(name = %node.name, target = %node.target, "evicted node after exhausting ping ladder");
        self.store.list_nodes().is_empty()
    }

    /// Spec §4.4.3: react to a `NodeDiscovered` event — rejoin short-circuit
    /// or gossip fan-out followed by a local upsert.
    pub async fn handle_discovered(&self, event: NodeDiscovered) {
        let existing = self.store.get_node_by_name(&event.new_node.name);
        if !existing.is_absent() {
            self.store.set_node(Node::new(
                existing.name,
                existing.target,
                NodeState::Ok,
            ));
            return;
        }

        let recipients = self.store.random_nodes_by_state(
            NodeState::Ok,
            self.cfg.broadcast_to_amount,
            &[event.from],
        );

        for recipient in recipients {
            let clients = self.clients.clone();
            let new_node = event.new_node.clone();
            let i_am_node = self.self_wire_node();
            tokio::spawn(async move {
                let Ok(client) = clients.init_client(&recipient) else {
                    return;
                };
                if let Err(e) = client
                    .node_discovery(&NodeDiscoveryRequest {
                        new_node,
                        i_am_node,
                    })
                    .await
                {
                    tracing::debug!(error = %e, "node discovery relay failed");
                }
            });
        }

        self.store
            .set_node(event.new_node.into_node(NodeState::Ok));
    }
}
