//! Arbitrage Detector (C6)
//!
//! Orchestrates C2 -> C4 -> C5 for a single scan, and keeps bounded
//! detection/execution history plus aggregate statistics. Grounded on the
//! teacher's `OpportunityDetector` (scan/check/record shape) adapted from
//! cross-DEX spread comparison to circular-path simulation.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use crate::arbitrage::path_finder::find_circular_paths;
use crate::arbitrage::profit::rank_opportunities;
use crate::pool::PoolCache;
use crate::registry::Registry;
use crate::types::{ArbitrageOpportunity, TokenKey, TradeResult};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct DetectorStats {
    pub total_detected: u64,
    pub total_executed: u64,
    pub successful_executions: u64,
    pub realized_profit_sum: Decimal,
}

impl DetectorStats {
    pub fn success_rate(&self) -> Decimal {
        if self.total_executed == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(self.successful_executions) / Decimal::from(self.total_executed)
                * Decimal::from(100)
        }
    }

    pub fn average_realized_profit_percent(&self, realized_profit_percents: &[Decimal]) -> Decimal {
        if realized_profit_percents.is_empty() {
            Decimal::ZERO
        } else {
            realized_profit_percents.iter().sum::<Decimal>()
                / Decimal::from(realized_profit_percents.len() as u64)
        }
    }
}

/// Orchestrates arbitrage scans and maintains bounded history (C6).
pub struct ArbitrageDetector {
    history_capacity: usize,
    detected_history: RwLock<VecDeque<ArbitrageOpportunity>>,
    execution_history: RwLock<VecDeque<TradeResult>>,
    stats: RwLock<DetectorStats>,
}

impl ArbitrageDetector {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history_capacity,
            detected_history: RwLock::new(VecDeque::new()),
            execution_history: RwLock::new(VecDeque::new()),
            stats: RwLock::new(DetectorStats::default()),
        }
    }

    /// Runs a full scan: fetch live snapshots for every registered pool
    /// above the liquidity threshold, find circular paths, simulate and
    /// rank them, and record all detected opportunities.
    #[allow(clippy::too_many_arguments)]
    pub async fn scan(
        &self,
        registry: &Registry,
        cache: &PoolCache,
        base_token: &TokenKey,
        max_hops: u8,
        min_liquidity: Decimal,
        notional: Decimal,
        min_profit_percent: Decimal,
        detected_at: i64,
    ) -> Vec<ArbitrageOpportunity> {
        let listings = registry.pools_above_liquidity(min_liquidity);
        let mut snapshots = Vec::with_capacity(listings.len());
        for listing in listings {
            match cache.get(&listing.token0, &listing.token1, listing.fee).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    warn!(token0 = %listing.token0, token1 = %listing.token1, fee = listing.fee, error = %e, "skipping pool with fetch failure");
                }
            }
        }

        let paths = find_circular_paths(base_token, max_hops, &snapshots, min_liquidity);
        let opportunities = rank_opportunities(&paths, notional, min_profit_percent, detected_at);

        info!(
            pool_count = snapshots.len(),
            path_count = paths.len(),
            opportunity_count = opportunities.len(),
            "arbitrage scan complete"
        );

        {
            let mut history = self.detected_history.write().expect("lock poisoned");
            let mut stats = self.stats.write().expect("lock poisoned");
            for opp in &opportunities {
                history.push_back(opp.clone());
                if history.len() > self.history_capacity {
                    history.pop_front();
                }
                stats.total_detected += 1;
            }
        }

        opportunities
    }

    /// Records the outcome of executing an opportunity.
    pub fn record_execution(&self, result: TradeResult) {
        let mut stats = self.stats.write().expect("lock poisoned");
        stats.total_executed += 1;
        if result.success {
            stats.successful_executions += 1;
            if let Some(amount_out) = result.amount_out {
                stats.realized_profit_sum += amount_out - result.amount_in;
            }
        }
        drop(stats);

        let mut history = self.execution_history.write().expect("lock poisoned");
        history.push_back(result);
        if history.len() > self.history_capacity {
            history.pop_front();
        }
    }

    pub fn stats(&self) -> DetectorStats {
        self.stats.read().expect("lock poisoned").clone()
    }

    pub fn recent_detected(&self, limit: usize) -> Vec<ArbitrageOpportunity> {
        let history = self.detected_history.read().expect("lock poisoned");
        history.iter().rev().take(limit).cloned().collect()
    }

    pub fn recent_executions(&self, limit: usize) -> Vec<TradeResult> {
        let history = self.execution_history.read().expect("lock poisoned");
        history.iter().rev().take(limit).cloned().collect()
    }
}
