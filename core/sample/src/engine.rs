use std::sync::Arc;
use std::time::Instant;

use canary_rpc::{ClientPool, PushSamplesRequest};
use canary_store::Store;
use canary_types::{now_unix, NodeState, Sample, SampleKey, WireSample};

use crate::config::SampleConfig;

/// Drives RTT measurement (§4.5.1), sample push-gossip (§4.5.2), and the
/// optional aging sweep (§4.5.3). Like the membership engine, this is
/// invoked by the scheduler's tickers and owns no timers itself.
pub struct SampleEngine {
    cfg: SampleConfig,
    store: Arc<dyn Store>,
    clients: Arc<ClientPool>,
}

impl SampleEngine {
    pub fn new(cfg: SampleConfig, store: Arc<dyn Store>, clients: Arc<ClientPool>) -> Self {
        Self {
            cfg,
            store,
            clients,
        }
    }

    /// Spec §4.5.1: dedicated, unpooled client so connection setup cost is
    /// actually measured rather than hidden by reuse. On any error, no
    /// sample is written — the ping path stamps NaN later if the peer keeps
    /// degrading.
    pub async fn rtt_tick(&self) {
        let Some(node) = self.store.random_nodes_by_state(NodeState::Ok, 1, &[]).pop() else {
            return;
        };

        let t0 = Instant::now();
        let client = match self.clients.dial_fresh(&node.target) {
            Ok(client) => client,
            Err(e) => {
                tracing::debug!(target = %node.target, error = %e, "rtt dial failed");
                return;
            },
        };

        // `dial_fresh` only builds the client object; the real TCP/TLS
        // handshake happens lazily on the first request. Force it now with
        // a throwaway call so `t1` reflects genuine connection-readiness —
        // mirroring client.go's `grpc.Dial(..., grpc.WithBlock())`, which
        // blocks until the transport is actually up before `rttStart` is
        // taken. Without this, the handshake cost would land inside the
        // timed request below instead of in `RttTotal`.
        if let Err(e) = client.rtt().await {
            tracing::debug!(target = %node.target, error = %e, "rtt warm-up call failed");
            return;
        }
        let t1 = Instant::now();

        match client.rtt().await {
            Ok(_) => {
                let t2 = Instant::now();
                let ts = now_unix();
                let total_ns = (t2 - t0).as_nanos();
                let request_ns = (t2 - t1).as_nanos();

                self.store.set_sample(
                    Sample::new(
                        self.cfg.self_name.clone(),
                        node.name.clone(),
                        SampleKey::RttTotal,
                        total_ns.to_string(),
                    )
                    .with_ts(ts),
                );
                self.store.set_sample(
                    Sample::new(
                        self.cfg.self_name.clone(),
                        node.name.clone(),
                        SampleKey::RttRequest,
                        request_ns.to_string(),
                    )
                    .with_ts(ts),
                );
            },
            Err(e) => {
                tracing::debug!(target = %node.target, error = %e, "rtt call failed");
            },
        }
    }

    /// Spec §4.5.2: push the entire sample list to up to
    /// `push_sample_to_amount` random `Ok` nodes, retrying each
    /// independently. No per-sample dedup on send — the receiver's
    /// monotonic merge filters.
    pub async fn push_tick(&self) {
        let recipients = self
            .store
            .random_nodes_by_state(NodeState::Ok, self.cfg.push_sample_to_amount, &[]);
        if recipients.is_empty() {
            return;
        }

        let samples: Vec<WireSample> = self.store.list_samples().iter().map(WireSample::from).collect();
        if samples.is_empty() {
            return;
        }

        for node in recipients {
            let clients = self.clients.clone();
            let store = self.store.clone();
            let samples = samples.clone();
            let retry_amount = self.cfg.push_sample_retry_amount;
            let retry_delay = self.cfg.push_sample_retry_delay;

            tokio::spawn(async move {
                let client = match clients.init_client(&node) {
                    Ok(client) => client,
                    Err(_) => return,
                };

                let mut attempt: u32 = 0;
                loop {
                    attempt += 1;
                    match client
                        .push_samples(&PushSamplesRequest {
                            samples: samples.clone(),
                        })
                        .await
                    {
                        Ok(_) => {
                            store.set_node_ts_now(node.id);
                            return;
                        },
                        Err(e) => {
                            if attempt >= retry_amount {
                                tracing::debug!(
                                    name = %node.name,
                                    error = %e,
                                    "push samples exhausted retries, dropping"
                                );
                                return;
                            }
                            tokio::time::sleep(retry_delay).await;
                        },
                    }
                }
            });
        }
    }

    /// Spec §4.5.3: optional sweeps, each guarded by its own toggle.
    pub fn cleanup_tick(&self) {
        let max_age_secs = self.cfg.cleanup_max_age.as_secs() as i64;
        if self.cfg.cleanup_samples {
            let removed = self.store.cleanup_old_samples(max_age_secs);
            if removed > 0 {
                tracing::debug!(removed, "aged out stale samples");
            }
        }
        if self.cfg.cleanup_nodes {
            let removed = self.store.cleanup_dead_nodes(max_age_secs);
            if removed > 0 {
                tracing::debug!(removed, "aged out dead nodes");
            }
        }
    }
}
