use std::sync::Arc;

use canary_membership::{Error as MembershipError, JoinOutcome, MembershipEngine};
use canary_rpc::NodeDiscovered;
use canary_sample::SampleEngine;
use canary_shutdown::ShutdownController;
use tokio::sync::{mpsc, watch};
use tokio::time::interval;

use crate::config::SchedulerConfig;
use crate::mode::{ModeSignal, ModeState};

/// Owns the five tickers and the event loop described in spec §4.6. Only
/// this component starts or stops tickers; the join/steady-state switch is
/// entirely scope-based — leaving a phase drops its tickers, re-entering
/// one creates fresh ones.
pub struct Scheduler {
    membership: Arc<MembershipEngine>,
    sample: Arc<SampleEngine>,
    cfg: SchedulerConfig,
    shutdown: ShutdownController,
    mode: ModeState,
    discovered_rx: mpsc::UnboundedReceiver<NodeDiscovered>,
}

enum PhaseExit {
    Continue,
    Shutdown,
    Fatal(MembershipError),
}

impl Scheduler {
    pub fn new(
        membership: Arc<MembershipEngine>,
        sample: Arc<SampleEngine>,
        cfg: SchedulerConfig,
        shutdown: ShutdownController,
        discovered_rx: mpsc::UnboundedReceiver<NodeDiscovered>,
    ) -> Self {
        Self {
            membership,
            sample,
            cfg,
            shutdown,
            mode: ModeState::new_join(),
            discovered_rx,
        }
    }

    /// Runs both cooperating loops until shutdown fires or the join
    /// protocol reports a fatal name collision (spec §4.4.1 step 3).
    pub async fn run(self) -> Result<(), MembershipError> {
        let Scheduler {
            membership,
            sample,
            cfg,
            shutdown,
            mode,
            mut discovered_rx,
        } = self;

        let (quit_join, quit_join_rx) = ModeSignal::channel();

        let event_loop = {
            let membership = membership.clone();
            let mode = mode.clone();
            let quit_join = quit_join.clone();
            let shutdown = shutdown.clone();
            async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = shutdown.wait() => return,
                        event = discovered_rx.recv() => {
                            let Some(event) = event else { return };
                            membership.handle_discovered(event).await;
                            if mode.is_join() {
                                tracing::info!("discovered while joining, leaving join mode");
                                quit_join.fire();
                            }
                        }
                    }
                }
            }
        };

        let timer_loop = async move {
            let mut quit_join_rx = quit_join_rx;
            loop {
                if shutdown.is_shutdown() {
                    return Ok(());
                }

                match run_join_phase(&membership, &cfg, &shutdown, &mode, &mut quit_join_rx).await {
                    PhaseExit::Shutdown => return Ok(()),
                    PhaseExit::Fatal(e) => return Err(e),
                    PhaseExit::Continue => {},
                }

                if let PhaseExit::Shutdown =
                    run_steady_phase(&membership, &sample, &cfg, &shutdown, &mode).await
                {
                    return Ok(());
                }
            }
        };

        let (timer_result, ()) = tokio::join!(timer_loop, event_loop);
        timer_result
    }
}

async fn run_join_phase(
    membership: &Arc<MembershipEngine>,
    cfg: &SchedulerConfig,
    shutdown: &ShutdownController,
    mode: &ModeState,
    quit_join_rx: &mut watch::Receiver<u64>,
) -> PhaseExit {
    mode.set_join(true);
    let mut join_ticker = interval(cfg.join_interval);
    join_ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => return PhaseExit::Shutdown,
            _ = quit_join_rx.changed() => {
                tracing::info!("quit_join observed, leaving join mode");
                return PhaseExit::Continue;
            }
            _ = join_ticker.tick() => {
                match membership.attempt_join().await {
                    Ok(JoinOutcome::Joined) => return PhaseExit::Continue,
                    Ok(JoinOutcome::AllTargetsFailed) => {
                        tracing::debug!("all join targets failed, retrying next interval");
                    }
                    Err(e) => return PhaseExit::Fatal(e),
                }
            }
        }
    }
}

async fn run_steady_phase(
    membership: &Arc<MembershipEngine>,
    sample: &Arc<SampleEngine>,
    cfg: &SchedulerConfig,
    shutdown: &ShutdownController,
    mode: &ModeState,
) -> PhaseExit {
    mode.set_join(false);
    let (restart_join, mut restart_join_rx) = ModeSignal::channel();

    let mut ping_ticker = interval(cfg.ping_interval);
    let mut push_ticker = interval(cfg.push_sample_interval);
    let mut cleanup_ticker = interval(cfg.cleanup_interval);
    let mut rtt_ticker = interval(cfg.rtt_interval);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => return PhaseExit::Shutdown,
            _ = restart_join_rx.changed() => {
                tracing::info!("node table emptied, re-entering join mode");
                return PhaseExit::Continue;
            }
            _ = ping_ticker.tick() => {
                // Spawned, not awaited inline: the retry ladder can run for
                // `ping_retry_amount * ping_retry_delay` and must not stall
                // the push/cleanup/rtt tickers (spec §5: "the timer loop
                // never blocks on I/O; it dispatches and returns").
                let membership = membership.clone();
                let restart_join = restart_join.clone();
                tokio::spawn(async move {
                    if membership.ping_tick().await {
                        restart_join.fire();
                    }
                });
            }
            _ = push_ticker.tick() => {
                sample.push_tick().await;
            }
            _ = cleanup_ticker.tick() => {
                sample.cleanup_tick();
            }
            _ = rtt_ticker.tick() => {
                sample.rtt_tick().await;
            }
        }
    }
}
