//! The in-memory, multi-indexed store behind the mesh agent (spec §4.1).
//!
//! Two tables — nodes and samples — each backed by a primary `DashMap`
//! keyed by id, plus secondary indices for name/target lookups. Readers hit
//! the primary map directly and never block a writer; a per-table
//! `parking_lot::Mutex` serializes the handful of writers so the primary
//! map and its secondary indices never tear relative to each other. This is
//! the "single concrete in-memory implementation" the design notes call for
//! rather than a trait hierarchy.

mod nodes;
mod samples;

pub use nodes::NodeTable;
pub use samples::SampleTable;

use canary_types::{Node, NodeState, Sample};

/// The narrow capability set the rest of the system needs from a store
/// (spec's Design Notes §9: "a small abstract capability rather than a deep
/// class hierarchy"). `InMemoryStore` is the only implementation; the trait
/// exists so tests can be written against the contract in isolation.
pub trait Store: Send + Sync {
    fn set_node(&self, node: Node);
    fn set_node_ts_now(&self, id: u32);
    fn delete_node(&self, id: u32);
    fn get_node(&self, id: u32) -> Node;
    fn get_node_by_name(&self, name: &str) -> Node;
    fn list_nodes(&self) -> Vec<Node>;
    fn list_nodes_by_state(&self, state: NodeState) -> Vec<Node>;
    fn random_nodes_by_state(&self, state: NodeState, n: usize, exclude: &[u32]) -> Vec<Node>;

    fn set_sample(&self, sample: Sample);
    fn set_sample_nan(&self, id: u32);
    fn get_sample(&self, id: u32) -> Option<Sample>;
    fn get_sample_ts(&self, id: u32) -> i64;
    fn list_samples(&self) -> Vec<Sample>;
    fn delete_sample(&self, id: u32);

    /// Deletes `Dead` nodes whose `state_change_ts` is older than `max_age`
    /// seconds. Returns the number removed. Spec §4.5.3, optional sweep.
    fn cleanup_dead_nodes(&self, max_age_secs: i64) -> usize;
    /// Deletes samples older than `max_age` seconds. Spec §4.5.3.
    fn cleanup_old_samples(&self, max_age_secs: i64) -> usize;
}

#[derive(Default)]
pub struct InMemoryStore {
    nodes: NodeTable,
    samples: SampleTable,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn set_node(&self, node: Node) {
        self.nodes.set(node);
    }

    fn set_node_ts_now(&self, id: u32) {
        self.nodes.set_ts_now(id);
    }

    fn delete_node(&self, id: u32) {
        self.nodes.delete(id);
    }

    fn get_node(&self, id: u32) -> Node {
        self.nodes.get(id)
    }

    fn get_node_by_name(&self, name: &str) -> Node {
        self.nodes.get_by_name(name)
    }

    fn list_nodes(&self) -> Vec<Node> {
        self.nodes.list()
    }

    fn list_nodes_by_state(&self, state: NodeState) -> Vec<Node> {
        self.nodes.list_by_state(state)
    }

    fn random_nodes_by_state(&self, state: NodeState, n: usize, exclude: &[u32]) -> Vec<Node> {
        self.nodes.random_by_state(state, n, exclude)
    }

    fn set_sample(&self, sample: Sample) {
        self.samples.set(sample);
    }

    fn set_sample_nan(&self, id: u32) {
        self.samples.set_nan(id);
    }

    fn get_sample(&self, id: u32) -> Option<Sample> {
        self.samples.get(id)
    }

    fn get_sample_ts(&self, id: u32) -> i64 {
        self.samples.get_ts(id)
    }

    fn list_samples(&self) -> Vec<Sample> {
        self.samples.list()
    }

    fn delete_sample(&self, id: u32) {
        self.samples.delete(id);
    }

    fn cleanup_dead_nodes(&self, max_age_secs: i64) -> usize {
        self.nodes.cleanup_dead(max_age_secs)
    }

    fn cleanup_old_samples(&self, max_age_secs: i64) -> usize {
        self.samples.cleanup_old(max_age_secs)
    }
}
