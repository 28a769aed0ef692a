mod config;
mod exit_codes;
mod logging;

use std::net::SocketAddr;
use std::sync::Arc;

use canary_membership::{MembershipConfig, MembershipEngine};
use canary_rpc::{ClientPool, ClientTlsConfig, PeerServerState, ServerTlsConfig};
use canary_sample::{SampleConfig, SampleEngine};
use canary_scheduler::{Scheduler, SchedulerConfig};
use canary_shutdown::ShutdownController;
use canary_store::{InMemoryStore, Store};
use clap::Parser;
use config::Config;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("name collision")]
    NameCollision,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn main() {
    let config = Config::parse();
    logging::init(&config);

    if config.name.trim().is_empty() {
        tracing::error!("--name must not be empty");
        std::process::exit(exit_codes::CONFIG_ERROR);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to start async runtime");
            std::process::exit(exit_codes::CONFIG_ERROR);
        },
    };

    match runtime.block_on(run(config)) {
        Ok(()) => {},
        Err(RunError::NameCollision) => {
            tracing::error!(
                "fatal: a peer reported this agent's name as already in use; choose a different --name"
            );
            std::process::exit(exit_codes::NAME_COLLISION);
        },
        Err(RunError::Other(e)) => {
            tracing::error!(error = %e, "fatal configuration error");
            std::process::exit(exit_codes::CONFIG_ERROR);
        },
    }
}

async fn run(config: Config) -> Result<(), RunError> {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());

    let server_tls = ServerTlsConfig {
        cert_path: config.tls_server_cert.clone(),
        key_path: config.tls_server_key.clone(),
    };
    let client_tls = ClientTlsConfig {
        ca_path: config.tls_ca_cert.clone(),
        client_cert_path: config.tls_client_cert.clone(),
        client_key_path: config.tls_client_key.clone(),
    };

    let clients = Arc::new(ClientPool::new(client_tls, config.request_timeout()));
    let shutdown = ShutdownController::new();

    let (discovered_tx, discovered_rx) = mpsc::unbounded_channel();
    let server_state = Arc::new(PeerServerState {
        self_name: config.name.clone(),
        store: store.clone(),
        discovered_tx,
    });

    let listen_addr: SocketAddr = format!("{}:{}", config.listen_address, config.listen_port)
        .parse()
        .map_err(|e| RunError::Other(anyhow::anyhow!("invalid listen address: {e}")))?;

    let server_task = {
        let shutdown = shutdown.clone();
        let tls = server_tls.clone();
        tokio::spawn(async move {
            if let Err(e) = canary_rpc::serve(listen_addr, &tls, server_state, shutdown).await {
                tracing::error!(error = %e, "peer server exited with an error");
            }
        })
    };

    let membership = Arc::new(MembershipEngine::new(
        MembershipConfig {
            self_name: config.name.clone(),
            self_target: config.join_address.clone(),
            targets: config.targets.clone(),
            ping_retry_amount: config.ping_retry_amount,
            ping_retry_delay: config.ping_retry_delay(),
            broadcast_to_amount: config.broadcast_to_amount,
        },
        store.clone(),
        clients.clone(),
    ));

    let sample = Arc::new(SampleEngine::new(
        SampleConfig {
            self_name: config.name.clone(),
            push_sample_to_amount: config.push_sample_to_amount,
            push_sample_retry_amount: config.push_sample_retry_amount,
            push_sample_retry_delay: config.push_sample_retry_delay(),
            cleanup_nodes: config.cleanup_nodes,
            cleanup_samples: config.cleanup_samples,
            cleanup_max_age: config.cleanup_max_age(),
        },
        store,
        clients,
    ));

    let scheduler = Scheduler::new(
        membership,
        sample,
        SchedulerConfig {
            join_interval: std::time::Duration::from_millis(config.join_interval_ms),
            ping_interval: std::time::Duration::from_millis(config.ping_interval_ms),
            push_sample_interval: std::time::Duration::from_millis(config.push_sample_interval_ms),
            cleanup_interval: std::time::Duration::from_millis(config.cleanup_interval_ms),
            rtt_interval: std::time::Duration::from_millis(config.rtt_interval_ms),
        },
        shutdown.clone(),
        discovered_rx,
    );

    let scheduler_task = tokio::spawn(scheduler.run());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received interrupt, shutting down");
        }
        result = server_task => {
            if let Err(e) = result {
                tracing::error!(error = %e, "peer server task panicked");
            }
        }
    }

    shutdown.shutdown();

    match scheduler_task.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(canary_membership::Error::NameCollision)) => Err(RunError::NameCollision),
        Err(join_err) => Err(RunError::Other(anyhow::anyhow!(
            "scheduler task panicked: {join_err}"
        ))),
    }
}
