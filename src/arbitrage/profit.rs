//! Profit Calculator (C5)
//!
//! Chains the offline quote engine along a circular path, applies the
//! documented 2% multiplicative fee haircut (`spec.md` §9, Open Questions),
//! and ranks surviving opportunities. Grounded on the teacher's
//! `pool/calculator.rs` `simulate_arbitrage`/`calculate_profit` style.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use crate::error::EngineError;
use crate::pool::quote_exact_input;
use crate::types::{ArbitrageOpportunity, CircularPath};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use tracing::debug;

/// Fixed multiplicative haircut on gross profit, approximating per-hop
/// on-chain cost. See `spec.md` §9: a correct implementation would convert
/// gas-denominated fees into the base token via the pool cache; this is a
/// documented placeholder.
const FEE_HAIRCUT: &str = "0.98";

fn fee_haircut() -> Decimal {
    use std::str::FromStr;
    Decimal::from_str(FEE_HAIRCUT).expect("valid decimal literal")
}

/// Scores a round trip's gross profit, fee-adjusted profit, and profit
/// percent from its input and expected output amounts.
fn score_profit(input_amount: Decimal, expected_out: Decimal) -> (Decimal, Decimal, Decimal) {
    let gross_profit = expected_out - input_amount;
    let fee_adjusted_profit = if gross_profit > Decimal::ZERO {
        gross_profit * fee_haircut()
    } else {
        gross_profit
    };
    let profit_pct = if input_amount.is_zero() {
        Decimal::ZERO
    } else {
        (fee_adjusted_profit / input_amount) * Decimal::from(100)
    };
    (gross_profit, fee_adjusted_profit, profit_pct)
}

/// Simulates `path` with `input_amount` of the base token, returning the
/// opportunity if (and only if) quoting succeeds at every hop.
pub fn evaluate_path(
    path: &CircularPath,
    input_amount: Decimal,
    detected_at: i64,
) -> Result<ArbitrageOpportunity, EngineError> {
    let mut amount = input_amount;
    let mut price_impacts = Vec::with_capacity(path.pools.len());

    for (hop_idx, pool) in path.pools.iter().enumerate() {
        let token_in = &path.tokens[hop_idx];
        let result = quote_exact_input(pool, token_in, amount)?;
        price_impacts.push(result.price_impact_percent);
        amount = result.amount_out;
    }

    let expected_out = amount;
    let (gross_profit, fee_adjusted_profit, profit_pct) = score_profit(input_amount, expected_out);

    Ok(ArbitrageOpportunity {
        path: path.clone(),
        input_amount,
        expected_out,
        gross_profit,
        fee_adjusted_profit,
        profit_pct,
        price_impacts,
        detected_at,
    })
}

/// Drops non-positive or below-threshold opportunities and sorts the rest
/// descending by profit percent (ties: fewer hops, then earliest detection).
fn filter_and_sort(
    mut opportunities: Vec<ArbitrageOpportunity>,
    min_profit_percent: Decimal,
) -> Vec<ArbitrageOpportunity> {
    opportunities.retain(|opp| {
        opp.fee_adjusted_profit > Decimal::ZERO && opp.profit_pct >= min_profit_percent
    });

    opportunities.sort_by(|a, b| {
        b.profit_pct
            .cmp(&a.profit_pct)
            .then_with(|| a.path.hop_count().cmp(&b.path.hop_count()))
            .then_with(|| a.detected_at.cmp(&b.detected_at))
            .then(Ordering::Equal)
    });

    opportunities
}

/// Evaluates every candidate path and ranks the survivors.
pub fn rank_opportunities(
    paths: &[CircularPath],
    input_amount: Decimal,
    min_profit_percent: Decimal,
    detected_at: i64,
) -> Vec<ArbitrageOpportunity> {
    let opportunities: Vec<ArbitrageOpportunity> = paths
        .iter()
        .filter_map(|path| match evaluate_path(path, input_amount, detected_at) {
            Ok(opp) => Some(opp),
            Err(e) => {
                debug!(error = %e, "path evaluation failed, skipping");
                None
            }
        })
        .collect();

    filter_and_sort(opportunities, min_profit_percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PoolSnapshot, TokenKey};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn pool(a: &TokenKey, b: &TokenKey, liquidity: u128) -> PoolSnapshot {
        PoolSnapshot {
            token0: a.clone(),
            token1: b.clone(),
            fee: 3000,
            token0_decimals: 18,
            token1_decimals: 18,
            sqrt_price: Decimal::ONE,
            liquidity,
            tick_spacing: 60,
            current_tick: 0,
            tick_data: BTreeMap::new(),
        }
    }

    #[test]
    fn score_profit_matches_spec_scenario_5_numbers() {
        // spec.md §8 scenario 5: three pools, 100 -> 101.5, net profit 1.47%.
        let (gross_profit, fee_adjusted_profit, profit_pct) =
            score_profit(Decimal::from(100), dec!(101.5));
        assert_eq!(gross_profit, dec!(1.5));
        assert_eq!(fee_adjusted_profit, dec!(1.47));
        assert_eq!(profit_pct, dec!(1.47));
    }

    #[test]
    fn accepts_at_low_threshold_rejects_at_high_threshold() {
        // spec.md §8 scenario 5 threshold boundary: a 1.47% opportunity is
        // accepted at minProfit=1.0% and rejected at minProfit=2.0%.
        let a = TokenKey::from_symbol("A");
        let b = TokenKey::from_symbol("B");
        let c = TokenKey::from_symbol("C");

        let path = CircularPath {
            tokens: vec![a.clone(), b.clone(), c.clone(), a.clone()],
            pools: vec![
                pool(&a, &b, 1_000_000_000),
                pool(&b, &c, 1_000_000_000),
                pool(&c, &a, 1_000_000_000),
            ],
        };

        let scenario_5_opportunity = ArbitrageOpportunity {
            path: path.clone(),
            input_amount: Decimal::from(100),
            expected_out: dec!(101.5),
            gross_profit: dec!(1.5),
            fee_adjusted_profit: dec!(1.47),
            profit_pct: dec!(1.47),
            price_impacts: vec![Decimal::ZERO, Decimal::ZERO, Decimal::ZERO],
            detected_at: 0,
        };

        let accepted = filter_and_sort(vec![scenario_5_opportunity.clone()], Decimal::from(1));
        assert_eq!(accepted.len(), 1);

        let rejected = filter_and_sort(vec![scenario_5_opportunity], Decimal::from(2));
        assert!(rejected.is_empty());
    }

    #[test]
    fn sorts_by_descending_profit_percent() {
        let a = TokenKey::from_symbol("A");
        let b = TokenKey::from_symbol("B");

        let path = CircularPath {
            tokens: vec![a.clone(), b.clone(), a.clone()],
            pools: vec![pool(&a, &b, 1_000_000_000), pool(&b, &a, 1_000_000_000)],
        };

        let results = rank_opportunities(&[path.clone(), path], Decimal::from(10), Decimal::from(-100), 0);
        for window in results.windows(2) {
            assert!(window[0].profit_pct >= window[1].profit_pct);
        }
    }
}
