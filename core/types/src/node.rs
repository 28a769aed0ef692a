use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fnv::fnv1a;

/// Node lifecycle state as tracked by the failure detector.
///
/// The discriminant values are an internal implementation detail: the wire
/// representation of a node (see [`WireNode`]) never carries this enum, so no
/// peer ever observes these numbers. `Ok` is pinned to `1` rather than `0`
/// because some observed revisions of the original source used `0` for a
/// distinct "unknown" sentinel; freezing `Ok = 1` avoids that ambiguity here.
///
/// `Retry` and `TimeoutRetry` are carried for parity with the full state
/// set an agent's node can occupy across the mesh, but the single-ladder
/// failure detector this crate implements (spec §4.4.2) never assigns
/// them — a failed ping goes straight to `Timeout`, and exhausting the
/// ladder deletes the row rather than transitioning through a second
/// `TimeoutRetry` stage. Same shape as [`crate::SampleKey::State`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeState {
    Ok = 1,
    Retry = 2,
    Timeout = 3,
    TimeoutRetry = 4,
    Dead = 5,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Ok => "ok",
            NodeState::Retry => "retry",
            NodeState::Timeout => "timeout",
            NodeState::TimeoutRetry => "timeout_retry",
            NodeState::Dead => "dead",
        }
    }
}

/// A known peer, as tracked by the local store.
///
/// `id` is derived from `target` alone (not `name`) so that redialing the
/// same address always lands on the same row even across a name change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: u32,
    pub name: String,
    pub target: String,
    pub state: NodeState,
    pub state_change_ts: i64,
}

impl Node {
    pub fn new(name: impl Into<String>, target: impl Into<String>, state: NodeState) -> Self {
        let target = target.into();
        let id = node_id(&target);
        Self {
            id,
            name: name.into(),
            target,
            state,
            state_change_ts: now_unix(),
        }
    }

    /// The zero-valued node returned by the store for a missing lookup.
    /// Callers distinguish "absent" from "present" by checking `id == 0`
    /// rather than by an `Option`, matching the store's contract in spec §4.1.
    pub fn is_absent(&self) -> bool {
        self.id == 0
    }
}

impl Default for Node {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            target: String::new(),
            state: NodeState::Ok,
            state_change_ts: 0,
        }
    }
}

pub fn node_id(target: &str) -> u32 {
    fnv1a(target.as_bytes())
}

/// The shape of a `Node` that actually crosses the wire (spec §6: `Node =
/// {name, target}`). State and timestamps are purely local bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WireNode {
    pub name: String,
    pub target: String,
}

impl From<&Node> for WireNode {
    fn from(n: &Node) -> Self {
        WireNode {
            name: n.name.clone(),
            target: n.target.clone(),
        }
    }
}

impl WireNode {
    pub fn into_node(self, state: NodeState) -> Node {
        Node::new(self.name, self.target, state)
    }
}

pub fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_fnv1a_of_target() {
        let n = Node::new("a", "10.0.0.1:9001", NodeState::Ok);
        assert_eq!(n.id, node_id("10.0.0.1:9001"));
    }

    #[test]
    fn zero_valued_node_is_absent() {
        assert!(Node::default().is_absent());
        assert!(!Node::new("a", "t", NodeState::Ok).is_absent());
    }
}
