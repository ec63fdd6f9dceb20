//! Path Finder (C4)
//!
//! Enumerates simple circular paths of length 2-4 over the pool graph via a
//! bounded DFS, grounded on the DFS cycle-search structure of the
//! retrieval pack's multi-hop arbitrage detector (adjacency map plus a
//! depth-bounded stack search) and adapted to the teacher's logging idiom.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use crate::types::{CircularPath, PoolSnapshot, TokenKey};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

/// Builds an undirected adjacency map `token -> [(neighbor, pool_index)]`
/// from pools whose global liquidity exceeds `min_liquidity`.
fn build_adjacency(
    pools: &[PoolSnapshot],
    min_liquidity: Decimal,
) -> HashMap<TokenKey, Vec<(TokenKey, usize)>> {
    let mut adjacency: HashMap<TokenKey, Vec<(TokenKey, usize)>> = HashMap::new();
    for (idx, pool) in pools.iter().enumerate() {
        if Decimal::from(pool.liquidity) <= min_liquidity {
            continue;
        }
        adjacency
            .entry(pool.token0.clone())
            .or_default()
            .push((pool.token1.clone(), idx));
        adjacency
            .entry(pool.token1.clone())
            .or_default()
            .push((pool.token0.clone(), idx));
    }
    adjacency
}

/// Enumerates all simple circular paths of length 2..=max_hops that begin
/// and end at `base_token`, over the supplied pool snapshots. Deterministic
/// given the input order of `pools` (`spec.md` §4.4).
pub fn find_circular_paths(
    base_token: &TokenKey,
    max_hops: u8,
    pools: &[PoolSnapshot],
    min_liquidity: Decimal,
) -> Vec<CircularPath> {
    let max_hops = max_hops.clamp(2, 4);
    let adjacency = build_adjacency(pools, min_liquidity);
    let mut results = Vec::new();

    let Some(neighbors) = adjacency.get(base_token) else {
        return results;
    };

    // 2-cycles: base -> B -> base using two distinct pools.
    for (out_idx, (neighbor, out_pool_idx)) in neighbors.iter().enumerate() {
        for (back_idx, (back_neighbor, back_pool_idx)) in neighbors.iter().enumerate() {
            if back_idx <= out_idx {
                continue;
            }
            if back_neighbor != neighbor || back_pool_idx == out_pool_idx {
                continue;
            }
            results.push(CircularPath {
                tokens: vec![base_token.clone(), neighbor.clone(), base_token.clone()],
                pools: vec![pools[*out_pool_idx].clone(), pools[*back_pool_idx].clone()],
            });
        }
    }

    if max_hops >= 3 {
        dfs(
            base_token,
            base_token,
            max_hops,
            &adjacency,
            pools,
            vec![base_token.clone()],
            Vec::new(),
            &mut results,
        );
    }

    debug!(
        base = %base_token,
        count = results.len(),
        "path finder produced candidate cycles"
    );
    results
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    base_token: &TokenKey,
    current: &TokenKey,
    max_hops: u8,
    adjacency: &HashMap<TokenKey, Vec<(TokenKey, usize)>>,
    pools: &[PoolSnapshot],
    path_tokens: Vec<TokenKey>,
    path_pools: Vec<usize>,
    results: &mut Vec<CircularPath>,
) {
    if path_tokens.len() as u8 > max_hops {
        return;
    }
    let Some(neighbors) = adjacency.get(current) else {
        return;
    };

    for (neighbor, pool_idx) in neighbors {
        if path_pools.last() == Some(pool_idx) {
            continue; // can't reuse the pool we just crossed
        }

        if neighbor == base_token {
            if path_tokens.len() < 3 {
                continue; // 2-cycles are enumerated separately
            }
            let mut tokens = path_tokens.clone();
            tokens.push(base_token.clone());
            let mut idxs = path_pools.clone();
            idxs.push(*pool_idx);
            let candidate = CircularPath {
                tokens,
                pools: idxs.iter().map(|i| pools[*i].clone()).collect(),
            };
            if candidate.is_valid() {
                results.push(candidate);
            }
            continue;
        }

        if path_tokens.contains(neighbor) {
            continue; // intermediates must be pairwise distinct
        }
        if path_tokens.len() as u8 + 1 >= max_hops {
            continue; // would exceed max_hops once closed
        }

        let mut next_tokens = path_tokens.clone();
        next_tokens.push(neighbor.clone());
        let mut next_pools = path_pools.clone();
        next_pools.push(*pool_idx);

        dfs(
            base_token,
            neighbor,
            max_hops,
            adjacency,
            pools,
            next_tokens,
            next_pools,
            results,
        );
    }
}
