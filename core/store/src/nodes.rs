use dashmap::DashMap;
use parking_lot::Mutex;
use rand::seq::SliceRandom;

use canary_types::{now_unix, Node, NodeState};

/// Nodes table: primary map by id, secondary indices by name and by target.
/// `write_lock` is held only across a single upsert/delete so the three maps
/// never observe a torn write; readers go straight through `by_id`/the
/// secondary maps without ever taking it.
#[derive(Default)]
pub struct NodeTable {
    by_id: DashMap<u32, Node>,
    by_name: DashMap<String, u32>,
    by_target: DashMap<String, u32>,
    write_lock: Mutex<()>,
}

impl NodeTable {
    pub fn set(&self, node: Node) {
        let _guard = self.write_lock.lock();
        if let Some(old) = self.by_id.get(&node.id).map(|r| r.value().clone()) {
            if old.name != node.name {
                self.by_name.remove(&old.name);
            }
            if old.target != node.target {
                self.by_target.remove(&old.target);
            }
        }
        self.by_name.insert(node.name.clone(), node.id);
        self.by_target.insert(node.target.clone(), node.id);
        self.by_id.insert(node.id, node);
    }

    pub fn set_ts_now(&self, id: u32) {
        let _guard = self.write_lock.lock();
        if let Some(mut entry) = self.by_id.get_mut(&id) {
            entry.state_change_ts = now_unix();
        }
    }

    pub fn delete(&self, id: u32) {
        let _guard = self.write_lock.lock();
        if let Some((_, node)) = self.by_id.remove(&id) {
            self.by_name.remove(&node.name);
            self.by_target.remove(&node.target);
        }
    }

    pub fn get(&self, id: u32) -> Node {
        self.by_id
            .get(&id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn get_by_name(&self, name: &str) -> Node {
        self.by_name
            .get(name)
            .and_then(|id| self.by_id.get(&id).map(|r| r.value().clone()))
            .unwrap_or_default()
    }

    pub fn list(&self) -> Vec<Node> {
        self.by_id.iter().map(|r| r.value().clone()).collect()
    }

    pub fn list_by_state(&self, state: NodeState) -> Vec<Node> {
        self.by_id
            .iter()
            .filter(|r| r.value().state == state)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Shuffles candidates in `state`, excludes ids in `exclude`, then takes
    /// a prefix of length `n`. Per spec §9's Design Notes: shuffle-then-take
    /// is the specified algorithm, not a weighted scheme.
    pub fn random_by_state(&self, state: NodeState, n: usize, exclude: &[u32]) -> Vec<Node> {
        let mut candidates: Vec<Node> = self
            .by_id
            .iter()
            .map(|r| r.value().clone())
            .filter(|node| node.state == state && !exclude.contains(&node.id))
            .collect();
        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(n);
        candidates
    }

    pub fn cleanup_dead(&self, max_age_secs: i64) -> usize {
        let now = now_unix();
        let stale: Vec<u32> = self
            .by_id
            .iter()
            .filter(|r| {
                let node = r.value();
                node.state == NodeState::Dead && now - node.state_change_ts > max_age_secs
            })
            .map(|r| *r.key())
            .collect();
        for id in &stale {
            self.delete(*id);
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lookup_is_zero_valued() {
        let table = NodeTable::default();
        assert!(table.get(42).is_absent());
        assert!(table.get_by_name("ghost").is_absent());
    }

    #[test]
    fn set_then_get_round_trips() {
        let table = NodeTable::default();
        let n = Node::new("a", "10.0.0.1:9001", NodeState::Ok);
        table.set(n.clone());
        assert_eq!(table.get(n.id), n);
        assert_eq!(table.get_by_name("a"), n);
    }

    #[test]
    fn delete_clears_secondary_indices() {
        let table = NodeTable::default();
        let n = Node::new("a", "10.0.0.1:9001", NodeState::Ok);
        table.set(n.clone());
        table.delete(n.id);
        assert!(table.get(n.id).is_absent());
        assert!(table.get_by_name("a").is_absent());
    }

    #[test]
    fn rename_drops_old_name_index() {
        let table = NodeTable::default();
        let mut n = Node::new("a", "10.0.0.1:9001", NodeState::Ok);
        table.set(n.clone());
        n.name = "b".to_string();
        table.set(n.clone());
        assert!(table.get_by_name("a").is_absent());
        assert_eq!(table.get_by_name("b"), n);
    }

    #[test]
    fn random_by_state_respects_count_and_exclusion() {
        let table = NodeTable::default();
        let mut ids = Vec::new();
        for i in 0..10 {
            let n = Node::new(format!("n{i}"), format!("10.0.0.{i}:9001"), NodeState::Ok);
            ids.push(n.id);
            table.set(n);
        }
        let excluded = ids[0];
        let picked = table.random_by_state(NodeState::Ok, 3, &[excluded]);
        assert_eq!(picked.len(), 3);
        assert!(picked.iter().all(|n| n.id != excluded));
    }

    #[test]
    fn random_by_state_zero_is_empty_and_overcount_is_all() {
        let table = NodeTable::default();
        for i in 0..3 {
            table.set(Node::new(
                format!("n{i}"),
                format!("10.0.0.{i}:9001"),
                NodeState::Ok,
            ));
        }
        assert!(table.random_by_state(NodeState::Ok, 0, &[]).is_empty());
        assert_eq!(table.random_by_state(NodeState::Ok, 50, &[]).len(), 3);
    }

    #[test]
    fn cleanup_dead_removes_only_stale_dead_nodes() {
        let table = NodeTable::default();
        let mut dead = Node::new("dead", "10.0.0.9:9001", NodeState::Dead);
        dead.state_change_ts = now_unix() - 1000;
        table.set(dead.clone());
        let alive = Node::new("alive", "10.0.0.8:9001", NodeState::Ok);
        table.set(alive.clone());

        let removed = table.cleanup_dead(10);
        assert_eq!(removed, 1);
        assert!(table.get(dead.id).is_absent());
        assert!(!table.get(alive.id).is_absent());
    }
}
