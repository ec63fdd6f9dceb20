//! Offline Quote Engine (C3)
//!
//! Computes exact-input swap outcomes locally over a cached pool snapshot,
//! walking the sparse tick map in the swap direction exactly as the on-chain
//! AMM would. All arithmetic is `rust_decimal::Decimal` — no IEEE-754 floats
//! in the hot path. The tick-to-sqrt-price conversion uses fast exponentiation
//! of a fixed decimal constant rather than a floating-point power function.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use crate::error::EngineError;
use crate::types::{PoolSnapshot, TokenKey};
use rust_decimal::Decimal;
use std::str::FromStr;

/// sqrt(1.0001), the per-tick price ratio step, as a fixed decimal constant.
fn sqrt_tick_ratio() -> Decimal {
    Decimal::from_str("1.0000499987500625").expect("valid decimal literal")
}

/// Computes `sqrt_tick_ratio()^tick` via fast exponentiation, avoiding any
/// floating-point power function.
fn tick_ratio_pow(tick: i32) -> Decimal {
    let base = sqrt_tick_ratio();
    if tick == 0 {
        return Decimal::ONE;
    }
    let (mut exp, invert) = if tick < 0 {
        ((-tick) as u32, true)
    } else {
        (tick as u32, false)
    };
    let mut result = Decimal::ONE;
    let mut current = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result *= current;
        }
        current *= current;
        exp >>= 1;
    }
    if invert {
        Decimal::ONE / result
    } else {
        result
    }
}

/// Result of an offline exact-input quote.
#[derive(Debug, Clone)]
pub struct QuoteResult {
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    pub current_sqrt_price: Decimal,
    pub new_sqrt_price: Decimal,
    pub price_impact_percent: Decimal,
}

/// Computes the exact-input swap outcome of trading `amount_in` of
/// `token_in` through `snapshot`, walking ticks in the swap direction.
pub fn quote_exact_input(
    snapshot: &PoolSnapshot,
    token_in: &TokenKey,
    amount_in: Decimal,
) -> Result<QuoteResult, EngineError> {
    if amount_in <= Decimal::ZERO {
        return Err(EngineError::Quote("amountIn must be positive".into()));
    }
    if !snapshot.contains(token_in) {
        return Err(EngineError::Quote(format!(
            "snapshot does not contain token {token_in}"
        )));
    }

    let zero_for_one = snapshot.zero_for_one(token_in);
    let fee_fraction = Decimal::from(snapshot.fee) / Decimal::from(1_000_000u32);
    let mut amount_remaining = amount_in * (Decimal::ONE - fee_fraction);

    let current_sqrt_price = snapshot.sqrt_price;
    let mut sqrt_price = current_sqrt_price;
    let mut liquidity = Decimal::from(snapshot.liquidity);
    let mut amount_out = Decimal::ZERO;

    // Ticks to cross, in swap direction, starting from current_tick.
    let mut ticks: Vec<(i32, &crate::types::TickInfo)> = snapshot
        .tick_data
        .iter()
        .filter(|(tick, _)| {
            if zero_for_one {
                **tick <= snapshot.current_tick
            } else {
                **tick > snapshot.current_tick
            }
        })
        .map(|(t, info)| (*t, info))
        .collect();
    if zero_for_one {
        ticks.sort_by(|a, b| b.0.cmp(&a.0));
    } else {
        ticks.sort_by(|a, b| a.0.cmp(&b.0));
    }

    for (tick, info) in ticks {
        if amount_remaining <= Decimal::ZERO {
            break;
        }
        if liquidity <= Decimal::ZERO {
            // No liquidity in this region; skip straight to the next tick's
            // liquidity addition.
            liquidity += Decimal::from(info.net_liquidity.unsigned_abs());
            continue;
        }

        let target_sqrt_price = tick_ratio_pow(tick);

        let max_amount_for_step = if zero_for_one {
            // dx = L * (1/sqrtP_target - 1/sqrtP_current)
            liquidity * (Decimal::ONE / target_sqrt_price - Decimal::ONE / sqrt_price)
        } else {
            // dy = L * (sqrtP_target - sqrtP_current)
            liquidity * (target_sqrt_price - sqrt_price)
        }
        .abs();

        if amount_remaining <= max_amount_for_step {
            let new_sqrt_price = if zero_for_one {
                (liquidity * sqrt_price) / (liquidity + amount_remaining * sqrt_price)
            } else {
                sqrt_price + (amount_remaining / liquidity)
            };
            let step_out = if zero_for_one {
                liquidity * (sqrt_price - new_sqrt_price)
            } else {
                liquidity * (Decimal::ONE / sqrt_price - Decimal::ONE / new_sqrt_price)
            };
            amount_out += step_out;
            sqrt_price = new_sqrt_price;
            amount_remaining = Decimal::ZERO;
            break;
        } else {
            let step_out = if zero_for_one {
                liquidity * (sqrt_price - target_sqrt_price)
            } else {
                liquidity * (Decimal::ONE / sqrt_price - Decimal::ONE / target_sqrt_price)
            };
            amount_out += step_out;
            amount_remaining -= max_amount_for_step;
            sqrt_price = target_sqrt_price;

            liquidity += if zero_for_one {
                -Decimal::from(info.net_liquidity)
            } else {
                Decimal::from(info.net_liquidity)
            };
            if liquidity < Decimal::ZERO {
                liquidity = Decimal::ZERO;
            }
        }
    }

    if amount_remaining > Decimal::ZERO {
        return Err(EngineError::Quote(
            "insufficient liquidity to absorb input amount".into(),
        ));
    }

    let current_price_sq = current_sqrt_price * current_sqrt_price;
    let new_price_sq = sqrt_price * sqrt_price;
    let price_impact_percent = if current_price_sq.is_zero() {
        Decimal::ZERO
    } else {
        ((new_price_sq - current_price_sq) / current_price_sq).abs() * Decimal::from(100)
    };

    Ok(QuoteResult {
        amount_in,
        amount_out,
        current_sqrt_price,
        new_sqrt_price: sqrt_price,
        price_impact_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TickInfo;
    use std::collections::BTreeMap;

    fn flat_snapshot(liquidity: u128) -> PoolSnapshot {
        PoolSnapshot {
            token0: TokenKey::from_symbol("A"),
            token1: TokenKey::from_symbol("B"),
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
    fn quote_is_deterministic() {
        let snapshot = flat_snapshot(1_000_000_000);
        let token_in = TokenKey::from_symbol("A");
        let amount_in = Decimal::from(1000);

        let q1 = quote_exact_input(&snapshot, &token_in, amount_in).unwrap();
        let q2 = quote_exact_input(&snapshot, &token_in, amount_in).unwrap();

        assert_eq!(q1.amount_out, q2.amount_out);
        assert_eq!(q1.new_sqrt_price, q2.new_sqrt_price);
    }

    #[test]
    fn quote_rejects_foreign_token() {
        let snapshot = flat_snapshot(1_000_000_000);
        let foreign = TokenKey::from_symbol("ZZZ");
        let result = quote_exact_input(&snapshot, &foreign, Decimal::from(10));
        assert!(result.is_err());
    }

    #[test]
    fn quote_zero_for_one_decreases_price() {
        let snapshot = flat_snapshot(1_000_000_000);
        let token_in = TokenKey::from_symbol("A");
        let result = quote_exact_input(&snapshot, &token_in, Decimal::from(1000)).unwrap();
        assert!(result.new_sqrt_price <= result.current_sqrt_price);
        assert!(result.amount_out > Decimal::ZERO);
    }

    #[test]
    fn quote_fails_with_no_liquidity() {
        let snapshot = flat_snapshot(0);
        let token_in = TokenKey::from_symbol("A");
        let result = quote_exact_input(&snapshot, &token_in, Decimal::from(1000));
        assert!(result.is_err());
    }

    #[test]
    fn tick_ratio_pow_zero_is_one() {
        assert_eq!(tick_ratio_pow(0), Decimal::ONE);
    }

    #[test]
    fn walks_across_a_tick_boundary() {
        let mut tick_data = BTreeMap::new();
        tick_data.insert(
            -60,
            TickInfo {
                net_liquidity: -500_000_000,
                gross_liquidity: 500_000_000,
                fee_growth_outside: Decimal::ZERO,
            },
        );
        let snapshot = PoolSnapshot {
            token0: TokenKey::from_symbol("A"),
            token1: TokenKey::from_symbol("B"),
            fee: 3000,
            token0_decimals: 18,
            token1_decimals: 18,
            sqrt_price: Decimal::ONE,
            liquidity: 1_000_000_000,
            tick_spacing: 60,
            current_tick: 0,
            tick_data,
        };
        let token_in = TokenKey::from_symbol("A");
        let result = quote_exact_input(&snapshot, &token_in, Decimal::from(10_000)).unwrap();
        assert!(result.amount_out > Decimal::ZERO);
    }
}
