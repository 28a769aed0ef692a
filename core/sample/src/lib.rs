mod config;
mod engine;

pub use config::SampleConfig;
pub use engine::SampleEngine;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use canary_rpc::{ClientPool, ClientTlsConfig};
    use canary_store::{InMemoryStore, Store};
    use canary_types::{Node, NodeState, Sample, SampleKey};

    use super::*;

    fn engine(store: Arc<dyn Store>) -> SampleEngine {
        let cfg = SampleConfig {
            self_name: "self".into(),
            push_sample_to_amount: 2,
            push_sample_retry_amount: 1,
            push_sample_retry_delay: Duration::from_millis(1),
            cleanup_nodes: true,
            cleanup_samples: true,
            cleanup_max_age: Duration::from_secs(10),
        };
        let clients = Arc::new(ClientPool::new(ClientTlsConfig::default(), Duration::from_millis(50)));
        SampleEngine::new(cfg, store, clients)
    }

    #[tokio::test]
    async fn rtt_tick_with_empty_store_is_noop() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        engine(store.clone()).rtt_tick().await;
        assert!(store.list_samples().is_empty());
    }

    #[tokio::test]
    async fn rtt_tick_against_unreachable_peer_writes_nothing() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        store.set_node(Node::new("peer", "127.0.0.1:1", NodeState::Ok));
        engine(store.clone()).rtt_tick().await;
        assert!(store.list_samples().is_empty());
    }

    #[tokio::test]
    async fn push_tick_with_no_ok_nodes_is_noop() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        engine(store).push_tick().await;
    }

    #[tokio::test]
    async fn push_tick_with_no_samples_skips_even_with_ok_nodes() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        store.set_node(Node::new("peer", "127.0.0.1:1", NodeState::Ok));
        // Nothing to push yet; push_tick should return before attempting
        // any outbound call rather than sending an empty sample list.
        engine(store).push_tick().await;
    }

    #[test]
    fn cleanup_tick_respects_toggles() {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let mut dead = Node::new("dead", "127.0.0.1:1", NodeState::Dead);
        dead.state_change_ts -= 1000;
        store.set_node(dead.clone());
        let old_sample =
            Sample::new("a", "b", SampleKey::RttTotal, "1").with_ts(canary_types::now_unix() - 1000);
        store.set_sample(old_sample.clone());

        engine(store.clone()).cleanup_tick();

        assert!(store.get_node(dead.id).is_absent());
        assert!(store.get_sample(old_sample.id).is_none());
    }
}
