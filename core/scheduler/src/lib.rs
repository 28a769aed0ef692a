mod config;
mod mode;
mod scheduler;

pub use config::SchedulerConfig;
pub use scheduler::Scheduler;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use canary_membership::{MembershipConfig, MembershipEngine};
    use canary_rpc::{ClientPool, ClientTlsConfig};
    use canary_sample::{SampleConfig, SampleEngine};
    use canary_shutdown::ShutdownController;
    use canary_store::InMemoryStore;
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn scheduler_stays_in_join_mode_with_no_targets_until_shutdown() {
        let store: Arc<dyn canary_store::Store> = Arc::new(InMemoryStore::new());
        let clients = Arc::new(ClientPool::new(
            ClientTlsConfig::default(),
            Duration::from_millis(20),
        ));

        let membership = Arc::new(MembershipEngine::new(
            MembershipConfig {
                self_name: "self".into(),
                self_target: "127.0.0.1:1".into(),
                targets: vec![],
                ping_retry_amount: 1,
                ping_retry_delay: Duration::from_millis(1),
                broadcast_to_amount: 1,
            },
            store.clone(),
            clients.clone(),
        ));
        let sample = Arc::new(SampleEngine::new(
            SampleConfig {
                self_name: "self".into(),
                push_sample_to_amount: 1,
                push_sample_retry_amount: 1,
                push_sample_retry_delay: Duration::from_millis(1),
                cleanup_nodes: false,
                cleanup_samples: false,
                cleanup_max_age: Duration::from_secs(60),
            },
            store,
            clients,
        ));

        let shutdown = ShutdownController::new();
        let (_discovered_tx, discovered_rx) = mpsc::unbounded_channel();

        let scheduler = Scheduler::new(
            membership,
            sample,
            SchedulerConfig {
                join_interval: Duration::from_millis(5),
                ping_interval: Duration::from_millis(5),
                push_sample_interval: Duration::from_millis(5),
                cleanup_interval: Duration::from_millis(5),
                rtt_interval: Duration::from_millis(5),
            },
            shutdown.clone(),
            discovered_rx,
        );

        let handle = tokio::spawn(scheduler.run());
        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler should exit promptly after shutdown")
            .unwrap();
        assert!(result.is_ok());
    }
}
