//! Omni governor
//!
//! Cycles every configured network until stopped. Each network is either
//! online (gateway + wallet built at startup) or permanently offline for this
//! run.
//!
//! Two schedules share one pacing policy:
//! - `Concurrent`: one task per network, so a stalled node only slows itself
//! - `Sequential`: a single loop in registry order
//!
//! Shutdown is cooperative: loops stop before their next attempt or during a
//! pause, never in the middle of an attempt.

use crate::alerts::{self, AlertSink};
use crate::chain::{ChainGateway, RelayGateway, RpcGateway};
use crate::config::{Config, Credentials, PacingConfig, RpcConfig, Schedule, Submission};
use crate::networks::{NetworkConfig, NetworkRegistry};
use crate::strike::{
    NetworkContext, StrikeAttempt, StrikeExecutor, DISCOVERY_SENTINEL, PROFIT_RECIPIENT,
};
use crate::wallet::SecureWallet;
use crate::{Error, Result};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sequential node calls one attempt can make, relay submission included
const ATTEMPT_CALL_STAGES: u32 = 5;

/// A registry entry and, when online, its execution context
pub struct NetworkSlot {
    pub config: NetworkConfig,
    pub context: Option<NetworkContext>,
}

impl NetworkSlot {
    pub fn is_online(&self) -> bool {
        self.context.is_some()
    }
}

/// Build one slot per registry network
///
/// Wallet construction and the recipient check are startup-fatal. Gateway
/// failures only take that network offline.
pub async fn connect_networks(
    registry: &NetworkRegistry,
    rpc: &RpcConfig,
    credentials: &Credentials,
    config: &Config,
) -> Result<Vec<NetworkSlot>> {
    let io_timeout = config.io_timeout();

    let mut wallets = Vec::with_capacity(registry.len());
    for network in registry.iter() {
        let wallet = SecureWallet::from_hex(credentials.expose_key(), network.chain_id)?;
        if wallet.address() == PROFIT_RECIPIENT {
            return Err(Error::RecipientCollision(wallet.address()));
        }
        wallets.push(Arc::new(wallet));
    }

    let connections = registry.iter().map(|network| async move {
        let Some(url) = rpc.get(network.network) else {
            return Err(crate::chain::GatewayError::InvalidUrl(format!(
                "no endpoint for {}",
                network.name()
            )));
        };
        RpcGateway::connect(network, url, io_timeout).await
    });
    let gateways = join_all(connections).await;

    let mut slots = Vec::with_capacity(registry.len());
    for ((network, gateway), wallet) in registry.iter().zip(gateways).zip(wallets) {
        let context = match gateway {
            Ok(node) => {
                let gateway = submission_gateway(network, Arc::new(node), credentials, config)?;
                info!(
                    network = %network.network,
                    chain_id = network.chain_id,
                    address = %wallet.address_string(),
                    "Network online"
                );
                Some(NetworkContext {
                    config: network.clone(),
                    gateway,
                    wallet,
                })
            }
            Err(e) => {
                warn!(network = %network.network, error = %e, "Network offline for this run");
                None
            }
        };
        slots.push(NetworkSlot {
            config: network.clone(),
            context,
        });
    }

    Ok(slots)
}

/// Relay endpoint strikes on `network` go through, if any
pub fn relay_endpoint<'a>(network: &'a NetworkConfig, config: &'a Config) -> Option<&'a str> {
    match config.submission {
        Submission::Public => None,
        Submission::Relay => network
            .relay_url
            .map(|default| config.relay_url.as_deref().unwrap_or(default)),
    }
}

/// Wrap a node gateway for the configured submission path
///
/// An unusable relay auth key is startup-fatal in relay mode.
fn submission_gateway(
    network: &NetworkConfig,
    node: Arc<dyn ChainGateway>,
    credentials: &Credentials,
    config: &Config,
) -> Result<Arc<dyn ChainGateway>> {
    let Some(url) = relay_endpoint(network, config) else {
        if config.submission == Submission::Relay {
            warn!(network = %network.network, "No private relay, broadcasting publicly");
        }
        return Ok(node);
    };

    let auth = SecureWallet::from_hex(credentials.relay_auth_key(), network.chain_id)?;
    info!(network = %network.network, relay = url, "Submitting through private relay");
    Ok(Arc::new(RelayGateway::new(
        node,
        url,
        Arc::new(auth),
        config.io_timeout(),
    )))
}

/// How long to wait for in-flight attempts after a stop request
pub fn shutdown_grace(io_timeout: Duration) -> Duration {
    io_timeout * ATTEMPT_CALL_STAGES
}

/// Stops a running governor once in-flight attempts finish
#[derive(Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// Request a stop and wait for `runner`, bounded by `grace`
///
/// Returns the attempt count, or `None` when the runner failed or outlived
/// the grace period.
pub async fn drain(
    shutdown: &ShutdownHandle,
    runner: JoinHandle<u64>,
    grace: Duration,
) -> Option<u64> {
    shutdown.trigger();
    match tokio::time::timeout(grace, runner).await {
        Ok(Ok(attempts)) => Some(attempts),
        Ok(Err(e)) => {
            warn!(error = %e, "Governor task ended abnormally");
            None
        }
        Err(_) => {
            warn!(?grace, "In-flight attempts outlived the shutdown grace");
            None
        }
    }
}

/// Top-level strike loop
pub struct OmniGovernor {
    slots: Vec<NetworkSlot>,
    executor: Arc<StrikeExecutor>,
    pacing: PacingConfig,
    alerts: Option<Arc<AlertSink>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl OmniGovernor {
    pub fn new(slots: Vec<NetworkSlot>, executor: StrikeExecutor, pacing: PacingConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            slots,
            executor: Arc::new(executor),
            pacing,
            alerts: None,
            shutdown: Arc::new(shutdown),
        }
    }

    pub fn with_alerts(mut self, alerts: Option<AlertSink>) -> Self {
        self.alerts = alerts.map(Arc::new);
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    pub fn online_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_online()).count()
    }

    pub fn offline_networks(&self) -> Vec<&'static str> {
        self.slots
            .iter()
            .filter(|s| !s.is_online())
            .map(|s| s.config.name())
            .collect()
    }

    /// Run until `max_passes` is reached or a stop is requested
    ///
    /// Returns the number of attempts made.
    pub async fn run(&self, schedule: Schedule, max_passes: Option<u64>) -> u64 {
        info!(
            online = self.online_count(),
            offline = ?self.offline_networks(),
            schedule = ?schedule,
            "Governor running"
        );
        if let Some(sink) = &self.alerts {
            sink.notify(alerts::startup_message(
                self.online_count(),
                &self.offline_networks(),
            ));
        }
        match schedule {
            Schedule::Sequential => self.run_sequential(max_passes).await,
            Schedule::Concurrent => self.run_concurrent(max_passes).await,
        }
    }

    /// One pass over every online network in registry order
    pub async fn run_pass(&self) -> Vec<StrikeAttempt> {
        let mut stop = self.shutdown.subscribe();
        self.pass(&mut stop).await
    }

    async fn pass(&self, stop: &mut watch::Receiver<bool>) -> Vec<StrikeAttempt> {
        let mut attempts = Vec::new();
        for slot in &self.slots {
            let Some(ctx) = &slot.context else {
                continue;
            };
            if *stop.borrow() {
                break;
            }
            let attempt = self.executor.attempt(ctx, DISCOVERY_SENTINEL).await;
            report(&attempt, self.alerts.as_ref());
            attempts.push(attempt);
            if !pause(self.pacing.network_interval(), stop).await {
                break;
            }
        }
        attempts
    }

    async fn run_sequential(&self, max_passes: Option<u64>) -> u64 {
        let mut stop = self.shutdown.subscribe();
        let mut passes = 0u64;
        let mut total = 0u64;
        loop {
            total += self.pass(&mut stop).await.len() as u64;
            passes += 1;
            if max_passes.is_some_and(|max| passes >= max) {
                return total;
            }
            if !pause(self.pacing.pass_interval(), &mut stop).await {
                return total;
            }
        }
    }

    async fn run_concurrent(&self, max_passes: Option<u64>) -> u64 {
        let tasks = self.slots.iter().filter_map(|slot| {
            let ctx = slot.context.clone()?;
            let executor = Arc::clone(&self.executor);
            let alerts = self.alerts.clone();
            let pacing = self.pacing;
            let stop = self.shutdown.subscribe();
            Some(tokio::spawn(network_loop(
                executor, ctx, pacing, alerts, max_passes, stop,
            )))
        });

        join_all(tasks)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(count) => count,
                Err(e) => {
                    warn!(error = %e, "Network task ended abnormally");
                    0
                }
            })
            .sum()
    }
}

/// A single network's loop; attempts never overlap within one network
async fn network_loop(
    executor: Arc<StrikeExecutor>,
    ctx: NetworkContext,
    pacing: PacingConfig,
    alerts: Option<Arc<AlertSink>>,
    max_passes: Option<u64>,
    mut stop: watch::Receiver<bool>,
) -> u64 {
    let mut passes = 0u64;
    loop {
        if *stop.borrow() {
            return passes;
        }
        let attempt = executor.attempt(&ctx, DISCOVERY_SENTINEL).await;
        report(&attempt, alerts.as_ref());
        passes += 1;
        if max_passes.is_some_and(|max| passes >= max) {
            return passes;
        }
        if !pause(pacing.network_interval() + pacing.pass_interval(), &mut stop).await {
            return passes;
        }
    }
}

fn report(attempt: &StrikeAttempt, alerts: Option<&Arc<AlertSink>>) {
    debug!(
        network = %attempt.network,
        attempt_id = %attempt.id,
        started_at = %attempt.started_at,
        elapsed_ms = (Utc::now() - attempt.started_at).num_milliseconds(),
        outcome = attempt.outcome.label(),
        "Attempt finished"
    );
    if let (Some(sink), Some(text)) = (alerts, alerts::describe(attempt)) {
        sink.notify(text);
    }
}

/// Sleep for `duration`; `false` when a stop was requested first
async fn pause(duration: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    if *stop.borrow() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = stop.wait_for(|stopping| *stopping) => false,
    }
}
