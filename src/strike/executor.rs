//! Per-network strike execution
//!
//! resolve target -> size -> build -> simulate -> broadcast
//!
//! Every failure is contained here and reported as a [`StrikeOutcome`]; nothing
//! propagates to the governor.

use super::{
    resolve_target, IStrikeExecutor, NetworkContext, SkipReason, StrikeAttempt, StrikeMetrics,
    StrikeMetricsCalculator, StrikeOutcome, FIXED_GAS_LIMIT, PROFIT_RECIPIENT,
};
use crate::wallet::StrikeTransaction;
use alloy::primitives::utils::format_ether;
use alloy::primitives::Address;
use alloy::sol_types::SolCall;
use chrono::Utc;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Builds, gates and submits strikes against the executor contract
#[derive(Debug, Clone)]
pub struct StrikeExecutor {
    contract: Address,
    recipient: Address,
    dry_run: bool,
}

impl StrikeExecutor {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            recipient: PROFIT_RECIPIENT,
            dry_run: false,
        }
    }

    /// Simulate only; never broadcast
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn recipient(&self) -> Address {
        self.recipient
    }

    /// Run one strike attempt for `ctx`
    pub async fn attempt(&self, ctx: &NetworkContext, target_hint: &str) -> StrikeAttempt {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let target = resolve_target(target_hint, &ctx.config);
        let span = tracing::info_span!(
            "strike",
            network = %ctx.network(),
            attempt_id = %id,
        );

        let (metrics, outcome) = self.run(ctx, target).instrument(span).await;

        StrikeAttempt {
            id,
            network: ctx.network(),
            started_at,
            target,
            metrics,
            outcome,
        }
    }

    async fn run(
        &self,
        ctx: &NetworkContext,
        target: Address,
    ) -> (Option<StrikeMetrics>, StrikeOutcome) {
        let owner = ctx.wallet.address();

        let (balance, fees) =
            tokio::join!(ctx.gateway.balance(owner), ctx.gateway.fee_estimate());
        let (balance, fees) = match (balance, fees) {
            (Ok(balance), Ok(fees)) => (balance, fees),
            (Err(e), _) | (_, Err(e)) => {
                debug!(error = %e, "Chain read failed");
                return (None, StrikeOutcome::Skipped(SkipReason::Unavailable(e.to_string())));
            }
        };

        let metrics = match StrikeMetricsCalculator::evaluate(balance, fees, &ctx.config) {
            Ok(metrics) => metrics,
            Err(reason) => {
                debug!(balance = %format_ether(balance), %reason, "No viable strike");
                return (None, StrikeOutcome::Skipped(reason));
            }
        };

        let nonce = match ctx.gateway.pending_nonce(owner).await {
            Ok(nonce) => nonce,
            Err(e) => {
                debug!(error = %e, "Nonce read failed");
                return (
                    Some(metrics),
                    StrikeOutcome::Skipped(SkipReason::Unavailable(e.to_string())),
                );
            }
        };

        let tx = self.build(ctx, owner, target, &metrics, nonce);

        debug!(
            target = %target,
            premium = %format_ether(metrics.premium),
            trade_amount = %format_ether(metrics.trade_amount),
            max_fee_per_gas = metrics.max_fee_per_gas,
            nonce,
            "Simulating strike"
        );

        // No transaction reaches the network without a clean eth_call.
        match ctx.gateway.simulate(&tx).await {
            Ok(result) if result.success => {
                debug!(
                    return_bytes = result.return_data.as_ref().map_or(0, |d| d.len()),
                    "Simulation passed"
                );
            }
            Ok(result) => {
                let reason = result
                    .revert_reason
                    .unwrap_or_else(|| "execution reverted".to_string());
                info!(%reason, "Strike rejected by simulation");
                return (Some(metrics), StrikeOutcome::SimulationFailed { reason });
            }
            Err(e) => {
                info!(error = %e, "Strike simulation errored");
                return (
                    Some(metrics),
                    StrikeOutcome::SimulationFailed {
                        reason: e.to_string(),
                    },
                );
            }
        }

        if self.dry_run {
            info!(
                premium = %format_ether(metrics.premium),
                trade_amount = %format_ether(metrics.trade_amount),
                "Dry run: simulation passed, not broadcasting"
            );
            return (Some(metrics), StrikeOutcome::Simulated);
        }

        let signed = match ctx.wallet.sign(&tx) {
            Ok(signed) => signed,
            Err(e) => {
                warn!(error = %e, "Signing failed");
                return (
                    Some(metrics),
                    StrikeOutcome::BroadcastFailed {
                        error: e.to_string(),
                    },
                );
            }
        };

        match ctx.gateway.broadcast(signed.raw).await {
            Ok(tx_hash) => {
                info!(
                    %tx_hash,
                    premium = %format_ether(metrics.premium),
                    trade_amount = %format_ether(metrics.trade_amount),
                    "Strike broadcast"
                );
                (Some(metrics), StrikeOutcome::Broadcast { tx_hash })
            }
            Err(e) => {
                warn!(error = %e, "Broadcast failed");
                (
                    Some(metrics),
                    StrikeOutcome::BroadcastFailed {
                        error: e.to_string(),
                    },
                )
            }
        }
    }

    /// Build the executor call for a sized strike
    pub fn build(
        &self,
        ctx: &NetworkContext,
        from: Address,
        target: Address,
        metrics: &StrikeMetrics,
        nonce: u64,
    ) -> StrikeTransaction {
        let call = IStrikeExecutor::strikeCall {
            router: ctx.config.router,
            token: target,
            stable: ctx.config.stable_token,
            amountIn: metrics.trade_amount,
            recipient: self.recipient,
        };

        StrikeTransaction {
            from,
            to: self.contract,
            data: call.abi_encode().into(),
            value: metrics.premium,
            gas_limit: FIXED_GAS_LIMIT,
            max_fee_per_gas: metrics.max_fee_per_gas,
            max_priority_fee_per_gas: metrics.max_priority_fee_per_gas,
            nonce,
            chain_id: ctx.gateway.chain_id(),
        }
    }
}
