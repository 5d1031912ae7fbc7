//! Core sync engine
//!
//! The SyncEngine is responsible for:
//! - Listing nodes via NodeSource
//! - Aggregating the advertised addresses into desired DNS state
//! - Converging the record store via the Reconciler
//! - Scheduling cycles on a fixed interval
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      ┌──────────────┐      ┌──────────────┐
//! │ NodeSource  │ ───▶ │  SyncEngine  │ ───▶ │ RecordStore  │
//! │ (list)      │      │  (aggregate, │      │ (upsert/     │
//! └─────────────┘      │   reconcile) │      │  delete)     │
//!                      └──────────────┘      └──────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. List current nodes with their annotations
//! 2. Parse, dedup, partition, and sort the advertised addresses
//! 3. Upsert or delete the A record set; then the AAAA record set
//! 4. Emit an event for monitoring/logging
//!
//! Every cycle recomputes desired state from scratch; nothing is carried
//! over between cycles.

use crate::aggregate::aggregate;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::reconcile::{CycleOutcome, Reconciler};
use crate::traits::{NodeSource, RecordStore};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        zone: String,
        record: String,
        interval_secs: u64,
    },

    /// A sync cycle completed with both families converged
    CycleCompleted {
        cycle: u64,
        v4: String,
        v6: String,
    },

    /// A sync cycle failed (node listing or one or both families)
    CycleFailed {
        cycle: u64,
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Core sync engine
///
/// The engine owns the two collaborators and a validated configuration.
/// It exposes a single cycle as a first-class operation ([`run_once`])
/// and a scheduler around it ([`run`]).
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Run one cycle with [`SyncEngine::run_once()`], or start the
///    scheduler with [`SyncEngine::run()`]
/// 3. The scheduler runs an initial cycle synchronously (failure is
///    fatal and propagates), then ticks at the configured interval
/// 4. Steady-state cycle failures are logged and retried on the next
///    tick only; no immediate retry, no backoff
///
/// ## Shutdown
///
/// Shutdown requests are honored between cycles. A cycle that is already
/// running completes before the scheduler exits, so the store is never
/// left with a half-applied family that was cancelled mid-flight.
///
/// [`run_once`]: SyncEngine::run_once
/// [`run`]: SyncEngine::run
pub struct SyncEngine {
    /// Node source for listing cluster nodes
    nodes: Box<dyn NodeSource>,

    /// DNS record store
    store: Box<dyn RecordStore>,

    /// Reconciler holding the normalized zone/record/TTL
    reconciler: Reconciler,

    /// Validated configuration
    config: SyncConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Parameters
    ///
    /// - `nodes`: Node source implementation
    /// - `store`: Record store implementation
    /// - `config`: Sync configuration (validated here)
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events
    pub fn new(
        nodes: Box<dyn NodeSource>,
        store: Box<dyn RecordStore>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let reconciler = Reconciler::new(&config.zone, &config.record, config.ttl_secs);

        let engine = Self {
            nodes,
            store,
            reconciler,
            config,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run exactly one sync cycle
    ///
    /// Lists nodes, aggregates their advertised addresses, and reconciles
    /// both record sets. Returns the per-family outcome on convergence.
    ///
    /// # Errors
    ///
    /// - Node listing failure aborts the cycle before any store call
    /// - A per-family store failure is returned as a partial-cycle error
    ///   after the other family has still been attempted
    pub async fn run_once(&self) -> Result<CycleOutcome> {
        debug!("fetching external IP addresses from nodes");
        let nodes = self.nodes.list_nodes().await?;

        let addresses = aggregate(&nodes, &self.config.annotation_key);
        if addresses.is_empty() {
            info!("no external IP addresses found, cleaning up records");
        } else {
            info!(
                v4 = addresses.v4().len(),
                v6 = addresses.v6().len(),
                record = self.reconciler.record(),
                zone = self.reconciler.zone(),
                "updating DNS records"
            );
        }

        let outcome = self
            .reconciler
            .reconcile(self.store.as_ref(), &addresses)
            .await;
        outcome.into_result()
    }

    /// Run the engine until a shutdown signal is received
    ///
    /// Runs an initial cycle synchronously; an initial-cycle failure is
    /// fatal and propagates, since entering steady state with known-bad
    /// startup state would silently fail to converge indefinitely.
    /// Afterwards, cycles run on a fixed interval until SIGINT.
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine with a controlled shutdown signal
    ///
    /// With `Some(receiver)`, the scheduler exits when the receiver
    /// fires instead of waiting for an OS signal. Used by the daemon to
    /// wire SIGTERM/SIGINT handling and by tests for deterministic
    /// shutdown.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            zone: self.reconciler.zone().to_string(),
            record: self.reconciler.record().to_string(),
            interval_secs: self.config.interval_secs,
        });

        // Initial cycle: failure here is fatal to the caller.
        info!("performing initial DNS sync");
        let outcome = self.run_once().await?;
        info!(v4 = %outcome.v4, v6 = %outcome.v6, "initial sync completed");

        let mut cycle: u64 = 1;
        self.emit_event(EngineEvent::CycleCompleted {
            cycle,
            v4: outcome.v4.to_string(),
            v6: outcome.v6.to_string(),
        });

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        // A slow cycle delays the next tick; ticks never accumulate.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately; the
        // initial cycle already ran, so consume it.
        ticker.tick().await;

        info!(
            interval_secs = self.config.interval_secs,
            "starting periodic sync"
        );

        if let Some(mut rx) = shutdown_rx {
            // Controlled mode: shutdown via the provided channel
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        cycle += 1;
                        self.run_cycle(cycle).await;
                    }

                    _ = &mut rx => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            // Production mode: shutdown via SIGINT
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        cycle += 1;
                        self.run_cycle(cycle).await;
                    }

                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        info!("engine stopped");
        Ok(())
    }

    /// Run one steady-state cycle, logging failure instead of propagating
    ///
    /// Recovery from a failed steady-state cycle is the next tick's job.
    async fn run_cycle(&self, cycle: u64) {
        match self.run_once().await {
            Ok(outcome) => {
                debug!(cycle, v4 = %outcome.v4, v6 = %outcome.v6, "sync cycle completed");
                self.emit_event(EngineEvent::CycleCompleted {
                    cycle,
                    v4: outcome.v4.to_string(),
                    v6: outcome.v6.to_string(),
                });
            }
            Err(e) => {
                error!(cycle, error = %e, "sync cycle failed, retrying on next tick");
                self.emit_event(EngineEvent::CycleFailed {
                    cycle,
                    error: e.to_string(),
                });
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Dropping events under backpressure is preferable to blocking a
        // cycle on a slow consumer.
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full or closed, dropping engine event");
        }
    }
}
