//! Core data structures shared across the engine.
//!
//! All monetary and price quantities use `rust_decimal::Decimal` end to end;
//! conversion to `f64` happens only at display/logging boundaries (see
//! `spec.md` §9, "Open-ended numeric strings").
//!
//! Author: AI-Generated
//! Created: 2026-01-27

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of fee tiers a pool may carry (0.05%, 0.30%, 1.00%).
pub const FEE_TIERS: [u32; 3] = [500, 3000, 10000];

/// Canonical token identity: a 4-tuple serialized as `collection|category|type|additionalKey`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenKey {
    pub collection: String,
    pub category: String,
    pub type_: String,
    pub additional_key: String,
}

impl TokenKey {
    pub fn new(
        collection: impl Into<String>,
        category: impl Into<String>,
        type_: impl Into<String>,
        additional_key: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            category: category.into(),
            type_: type_.into(),
            additional_key: additional_key.into(),
        }
    }

    /// Builds a key from a bare symbol using the `Unit|none|none` template tail
    /// described in `spec.md` §4.1 / §4.7.
    pub fn from_symbol(symbol: impl Into<String>) -> Self {
        Self::new(symbol, "Unit", "none", "none")
    }

    /// The `symbol` is the `collection` field.
    pub fn symbol(&self) -> &str {
        &self.collection
    }
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.collection, self.category, self.type_, self.additional_key
        )
    }
}

/// Error returned when parsing a `collection|category|type|additionalKey`
/// token key string fails.
#[derive(Debug)]
pub struct TokenKeyParseError(String);

impl fmt::Display for TokenKeyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TokenKeyParseError {}

impl std::str::FromStr for TokenKey {
    type Err = TokenKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('|').collect();
        if parts.len() != 4 {
            return Err(TokenKeyParseError(format!(
                "token key must have the form collection|category|type|additionalKey, got '{s}'"
            )));
        }
        Ok(TokenKey::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

/// Static registry entry: a token's metadata as loaded from `tokens.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub key: TokenKey,
    pub decimals: u8,
    pub description: String,
}

/// Static registry entry: a candidate pool pair as loaded from `pools.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolListing {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub observed_liquidity: Decimal,
}

/// Per-tick liquidity data in the sparse tick map of a pool snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TickInfo {
    pub net_liquidity: i128,
    pub gross_liquidity: u128,
    pub fee_growth_outside: Decimal,
}

/// A composite pool snapshot: everything C3 needs to quote locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub token0: TokenKey,
    pub token1: TokenKey,
    pub fee: u32,
    pub token0_decimals: u8,
    pub token1_decimals: u8,
    pub sqrt_price: Decimal,
    pub liquidity: u128,
    pub tick_spacing: i32,
    pub current_tick: i32,
    pub tick_data: BTreeMap<i32, TickInfo>,
}

impl PoolSnapshot {
    pub fn contains(&self, token: &TokenKey) -> bool {
        self.token0 == *token || self.token1 == *token
    }

    pub fn other_side(&self, token: &TokenKey) -> Option<&TokenKey> {
        if self.token0 == *token {
            Some(&self.token1)
        } else if self.token1 == *token {
            Some(&self.token0)
        } else {
            None
        }
    }

    pub fn zero_for_one(&self, token_in: &TokenKey) -> bool {
        self.token0 == *token_in
    }
}

/// An ordered cycle of tokens paired with the pool snapshot used on each hop.
/// `tokens[0] == tokens[n]`, `n` in `{2,3,4}`.
#[derive(Debug, Clone)]
pub struct CircularPath {
    pub tokens: Vec<TokenKey>,
    pub pools: Vec<PoolSnapshot>,
}

impl CircularPath {
    /// Number of hops (== number of pools == `tokens.len() - 1`).
    pub fn hop_count(&self) -> usize {
        self.pools.len()
    }

    /// `true` when the path satisfies the invariants of `spec.md` §3:
    /// closed, length in [2,4], intermediate tokens pairwise distinct.
    pub fn is_valid(&self) -> bool {
        let n = self.pools.len();
        if !(2..=4).contains(&n) || self.tokens.len() != n + 1 {
            return false;
        }
        if self.tokens.first() != self.tokens.last() {
            return false;
        }
        let intermediates = &self.tokens[0..n];
        let mut seen = std::collections::HashSet::new();
        for t in intermediates {
            if !seen.insert(t) {
                return false;
            }
        }
        self.tokens
            .windows(2)
            .zip(self.pools.iter())
            .all(|(pair, pool)| pool.contains(&pair[0]) && pool.contains(&pair[1]))
    }
}

/// Partitioned wallet inventory (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub preferred_balance: Decimal,
    pub gas_balance: Decimal,
    pub other_tokens: Vec<(TokenKey, Decimal)>,
    pub total_token_count: usize,
}

/// Why a trade intent was generated (`spec.md` §3 / §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeReason {
    RefillGas,
    DcaToPreferred,
    SpendExcessGas,
    Arbitrage,
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeReason::RefillGas => "RefillGas",
            TradeReason::DcaToPreferred => "DCAToPreferred",
            TradeReason::SpendExcessGas => "SpendExcessGas",
            TradeReason::Arbitrage => "Arbitrage",
        };
        write!(f, "{}", s)
    }
}

/// A single proposed trade (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeIntent {
    pub source_token: TokenKey,
    pub target_token: TokenKey,
    pub amount: Decimal,
    pub reason: TradeReason,
}

/// Append-only history element (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeResult {
    pub success: bool,
    pub source: TokenKey,
    pub target: TokenKey,
    pub amount_in: Decimal,
    pub amount_out: Option<Decimal>,
    pub tx_id: Option<String>,
    pub error: Option<String>,
    pub timestamp: i64,
}

/// A detected circular arbitrage opportunity (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct ArbitrageOpportunity {
    pub path: CircularPath,
    pub input_amount: Decimal,
    pub expected_out: Decimal,
    pub gross_profit: Decimal,
    pub fee_adjusted_profit: Decimal,
    pub profit_pct: Decimal,
    pub price_impacts: Vec<Decimal>,
    pub detected_at: i64,
}

impl ArbitrageOpportunity {
    pub fn base_token(&self) -> &TokenKey {
        &self.path.tokens[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(a: &TokenKey, b: &TokenKey, fee: u32) -> PoolSnapshot {
        PoolSnapshot {
            token0: a.clone(),
            token1: b.clone(),
            fee,
            token0_decimals: 18,
            token1_decimals: 18,
            sqrt_price: Decimal::ONE,
            liquidity: 1_000_000,
            tick_spacing: 60,
            current_tick: 0,
            tick_data: BTreeMap::new(),
        }
    }

    #[test]
    fn token_key_display_and_symbol() {
        let k = TokenKey::from_symbol("GALA");
        assert_eq!(k.to_string(), "GALA|Unit|none|none");
        assert_eq!(k.symbol(), "GALA");
    }

    #[test]
    fn token_key_from_str_round_trips_display() {
        let k: TokenKey = "GALA|Unit|none|none".parse().unwrap();
        assert_eq!(k.symbol(), "GALA");
        assert_eq!(k.to_string(), "GALA|Unit|none|none");
    }

    #[test]
    fn token_key_from_str_rejects_malformed() {
        let err = "onlytwo|parts".parse::<TokenKey>().unwrap_err();
        assert!(err.to_string().contains("collection|category|type|additionalKey"));
    }

    #[test]
    fn circular_path_validates_closed_distinct_cycle() {
        let a = TokenKey::from_symbol("A");
        let b = TokenKey::from_symbol("B");
        let c = TokenKey::from_symbol("C");
        let path = CircularPath {
            tokens: vec![a.clone(), b.clone(), c.clone(), a.clone()],
            pools: vec![pool(&a, &b, 3000), pool(&b, &c, 3000), pool(&c, &a, 3000)],
        };
        assert!(path.is_valid());
        assert_eq!(path.hop_count(), 3);
    }

    #[test]
    fn circular_path_rejects_repeated_intermediate() {
        let a = TokenKey::from_symbol("A");
        let b = TokenKey::from_symbol("B");
        let path = CircularPath {
            tokens: vec![a.clone(), b.clone(), b.clone(), a.clone()],
            pools: vec![pool(&a, &b, 3000), pool(&b, &b, 3000), pool(&b, &a, 3000)],
        };
        assert!(!path.is_valid());
    }

    #[test]
    fn circular_path_rejects_unclosed() {
        let a = TokenKey::from_symbol("A");
        let b = TokenKey::from_symbol("B");
        let c = TokenKey::from_symbol("C");
        let path = CircularPath {
            tokens: vec![a.clone(), b.clone(), c],
            pools: vec![pool(&a, &b, 3000), pool(&b, &a, 3000)],
        };
        assert!(!path.is_valid());
    }
}
