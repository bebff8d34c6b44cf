//! Deterministic strike sizing
//!
//! Pure integer arithmetic over wei; there is no floating point anywhere in
//! this module. A one-wei drift changes what is sent on-chain.

use super::{
    BASE_FEE_MULTIPLIER_DENOMINATOR, BASE_FEE_MULTIPLIER_NUMERATOR, FIXED_GAS_LIMIT,
    FIXED_RESERVE, LEVERAGE_DENOMINATOR, LEVERAGE_NUMERATOR, MIN_BASE_FEE, MIN_LOAN_THRESHOLD,
};
use crate::chain::FeeEstimate;
use crate::networks::NetworkConfig;
use alloy::primitives::U256;

/// Fee fields for one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSnapshot {
    pub base_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl FeeSnapshot {
    /// `max(base, MIN_BASE_FEE) * 1.30 + priority hint`
    pub fn derive(estimate: FeeEstimate, config: &NetworkConfig) -> Self {
        let base = estimate.base_fee_per_gas.max(MIN_BASE_FEE);
        let scaled = base.saturating_mul(BASE_FEE_MULTIPLIER_NUMERATOR) / BASE_FEE_MULTIPLIER_DENOMINATOR;
        Self {
            base_fee_per_gas: estimate.base_fee_per_gas,
            max_fee_per_gas: scaled.saturating_add(config.priority_fee_hint),
            max_priority_fee_per_gas: config.priority_fee_hint,
        }
    }
}

/// A fully determined strike size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeMetrics {
    /// Principal handed to the executor as `amountIn`
    pub trade_amount: U256,
    /// Native value sent with the call
    ///
    /// `balance - overhead` rounded down to a multiple of 9, so up to 8 wei
    /// below the raw headroom; `trade_amount * 9 == premium * 10000` exactly.
    pub premium: U256,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Why no strike was sized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Balance does not cover overhead plus the fixed reserve
    InsufficientHeadroom { balance: U256, required: U256 },
    /// Sized trade is under [`MIN_LOAN_THRESHOLD`]
    BelowLoanThreshold { trade_amount: U256 },
    /// Balance, fee or nonce read failed
    Unavailable(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InsufficientHeadroom { balance, required } => {
                write!(f, "insufficient headroom: balance {} < required {}", balance, required)
            }
            SkipReason::BelowLoanThreshold { trade_amount } => {
                write!(f, "trade amount {} below loan threshold", trade_amount)
            }
            SkipReason::Unavailable(msg) => write!(f, "chain read failed: {}", msg),
        }
    }
}

pub struct StrikeMetricsCalculator;

impl StrikeMetricsCalculator {
    /// Size a strike, or `None` when there is no viable trade
    pub fn compute(
        balance: U256,
        estimate: FeeEstimate,
        config: &NetworkConfig,
    ) -> Option<StrikeMetrics> {
        Self::evaluate(balance, estimate, config).ok()
    }

    /// Size a strike, reporting why it was skipped
    pub fn evaluate(
        balance: U256,
        estimate: FeeEstimate,
        config: &NetworkConfig,
    ) -> Result<StrikeMetrics, SkipReason> {
        let fees = FeeSnapshot::derive(estimate, config);
        let overhead = Self::overhead(fees.max_fee_per_gas, config);
        let required = overhead.saturating_add(FIXED_RESERVE);

        if balance < required {
            return Err(SkipReason::InsufficientHeadroom { balance, required });
        }

        // Aligned down to the leverage denominator so the ratio is exact.
        let headroom = balance - overhead;
        let premium = headroom - headroom % LEVERAGE_DENOMINATOR;
        let trade_amount = premium
            .checked_mul(LEVERAGE_NUMERATOR)
            .map(|scaled| scaled / LEVERAGE_DENOMINATOR)
            .unwrap_or(U256::ZERO);

        if trade_amount < MIN_LOAN_THRESHOLD {
            return Err(SkipReason::BelowLoanThreshold { trade_amount });
        }

        Ok(StrikeMetrics {
            trade_amount,
            premium,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        })
    }

    /// `FIXED_GAS_LIMIT * max_fee + moat`
    pub fn overhead(max_fee_per_gas: u128, config: &NetworkConfig) -> U256 {
        U256::from(FIXED_GAS_LIMIT)
            .saturating_mul(U256::from(max_fee_per_gas))
            .saturating_add(config.moat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::networks::NetworkRegistry;

    const GWEI: u128 = 1_000_000_000;
    const ETHER: u128 = 1_000_000_000_000_000_000;

    fn ether_milli(milli: u128) -> U256 {
        U256::from(milli * ETHER / 1_000)
    }

    /// Ethereum parameters with a 4 gwei hint, so 20 gwei base gives 30 gwei max fee
    fn scenario_config() -> NetworkConfig {
        let mut config = NetworkRegistry::mainnet()
            .get(Network::Ethereum)
            .unwrap()
            .clone();
        config.moat = ether_milli(8);
        config.priority_fee_hint = 4 * GWEI;
        config
    }

    fn fees(base_gwei: u128) -> FeeEstimate {
        FeeEstimate {
            base_fee_per_gas: base_gwei * GWEI,
        }
    }

    #[test]
    fn max_fee_scales_base_and_adds_hint() {
        let config = scenario_config();
        let snapshot = FeeSnapshot::derive(fees(20), &config);
        assert_eq!(snapshot.max_fee_per_gas, 30 * GWEI);
        assert_eq!(snapshot.max_priority_fee_per_gas, 4 * GWEI);
    }

    #[test]
    fn max_fee_applies_base_floor() {
        let config = scenario_config();
        let snapshot = FeeSnapshot::derive(FeeEstimate { base_fee_per_gas: 1 }, &config);
        assert_eq!(
            snapshot.max_fee_per_gas,
            MIN_BASE_FEE * 13 / 10 + config.priority_fee_hint
        );
    }

    #[test]
    fn end_to_end_scenario() {
        let config = scenario_config();
        let balance = ether_milli(5_500);

        let metrics = StrikeMetricsCalculator::compute(balance, fees(20), &config).unwrap();

        // overhead = 1.8M * 30 gwei + 0.008 = 0.062
        assert_eq!(
            StrikeMetricsCalculator::overhead(30 * GWEI, &config),
            ether_milli(62)
        );
        assert_eq!(metrics.premium, U256::from(5_437_999_999_999_999_998u128));
        assert_eq!(
            metrics.trade_amount,
            U256::from(6_042_222_222_222_222_220_000u128)
        );
        assert_eq!(metrics.trade_amount * U256::from(9u8), metrics.premium * U256::from(10_000u16));
        assert_eq!(metrics.max_fee_per_gas, 30 * GWEI);
    }

    #[test]
    fn below_overhead_plus_reserve_is_none() {
        let config = scenario_config();
        let required = StrikeMetricsCalculator::overhead(30 * GWEI, &config) + FIXED_RESERVE;

        for balance in [U256::ZERO, ether_milli(10), required - U256::from(1u8)] {
            assert!(StrikeMetricsCalculator::compute(balance, fees(20), &config).is_none());
            assert!(matches!(
                StrikeMetricsCalculator::evaluate(balance, fees(20), &config),
                Err(SkipReason::InsufficientHeadroom { .. })
            ));
        }
    }

    #[test]
    fn reserve_alone_clears_loan_threshold() {
        let config = scenario_config();
        // Exactly overhead + reserve: premium 0.005 sizes to ~5.55 native.
        let balance = ether_milli(67);
        let metrics = StrikeMetricsCalculator::compute(balance, fees(20), &config).unwrap();
        assert!(metrics.trade_amount >= MIN_LOAN_THRESHOLD);
        assert!(metrics.premium <= FIXED_RESERVE);
    }

    #[test]
    fn ratio_is_exact_for_viable_balances() {
        let config = scenario_config();
        let nine = U256::from(9u8);
        let ten_thousand = U256::from(10_000u16);

        for offset in 0u64..64 {
            let balance = ether_milli(70) + U256::from(offset * 7_919);
            if let Some(m) = StrikeMetricsCalculator::compute(balance, fees(20), &config) {
                assert_eq!(m.trade_amount * nine, m.premium * ten_thousand);
            }
        }
    }

    #[test]
    fn premium_trails_headroom_by_less_than_nine_wei() {
        let config = scenario_config();
        let overhead = StrikeMetricsCalculator::overhead(30 * GWEI, &config);

        for offset in 0u64..18 {
            let balance = ether_milli(5_500) + U256::from(offset);
            let m = StrikeMetricsCalculator::compute(balance, fees(20), &config).unwrap();
            let headroom = balance - overhead;
            assert!(m.premium <= headroom);
            assert!(headroom - m.premium < U256::from(9u8));
        }
    }

    #[test]
    fn trade_amount_is_monotonic_in_balance() {
        let config = scenario_config();
        let mut last = U256::ZERO;
        let mut balance = ether_milli(60);

        for _ in 0..200 {
            if let Some(m) = StrikeMetricsCalculator::compute(balance, fees(20), &config) {
                assert!(m.trade_amount >= last);
                last = m.trade_amount;
            }
            balance += U256::from(100_000_000_000_003u64);
        }
        assert!(last > U256::ZERO);
    }

    #[test]
    fn higher_fees_shrink_the_premium() {
        let config = scenario_config();
        let balance = ether_milli(1_000);
        let cheap = StrikeMetricsCalculator::compute(balance, fees(10), &config).unwrap();
        let pricey = StrikeMetricsCalculator::compute(balance, fees(100), &config).unwrap();
        assert!(pricey.premium < cheap.premium);
        assert!(pricey.max_fee_per_gas > cheap.max_fee_per_gas);
    }

    #[test]
    fn overflowing_trade_is_not_viable() {
        let config = scenario_config();
        let result = StrikeMetricsCalculator::evaluate(U256::MAX, fees(20), &config);
        assert_eq!(
            result,
            Err(SkipReason::BelowLoanThreshold {
                trade_amount: U256::ZERO
            })
        );
    }
}
