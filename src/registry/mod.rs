//! Token/Pool Registry (C1)
//!
//! Static catalog of known tokens and candidate pool pairs, loaded once at
//! startup from CSV. CSV parsing is hand-rolled in the teacher's own style
//! (see the teacher's `tax/csv_logger.rs`) rather than via a dedicated crate.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use crate::error::EngineError;
use crate::types::{PoolListing, TokenInfo, TokenKey};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

const TOKEN_TEMPLATE_TAIL: (&str, &str, &str) = ("Unit", "none", "none");

fn expand_symbol(symbol: &str) -> TokenKey {
    TokenKey::new(
        symbol,
        TOKEN_TEMPLATE_TAIL.0,
        TOKEN_TEMPLATE_TAIL.1,
        TOKEN_TEMPLATE_TAIL.2,
    )
}

fn default_tokens() -> Vec<TokenInfo> {
    [
        ("GALA", 8, "GalaChain native gas token"),
        ("SILK", 8, "Preferred accumulation token"),
        ("GUSDC", 6, "Bridged USDC"),
        ("GWBTC", 8, "Bridged WBTC"),
        ("GWETH", 18, "Bridged WETH"),
    ]
    .into_iter()
    .map(|(symbol, decimals, description)| TokenInfo {
        key: expand_symbol(symbol),
        decimals,
        description: description.to_string(),
    })
    .collect()
}

/// Static catalog of tokens and candidate pools (C1).
pub struct Registry {
    tokens_by_key: HashMap<TokenKey, TokenInfo>,
    tokens_by_symbol: HashMap<String, TokenKey>,
    pools: Vec<PoolListing>,
}

impl Registry {
    /// Loads `tokens.csv` and `pools.csv` from `dir`. A missing/unreadable
    /// token file falls back to the built-in default list; a missing pool
    /// file is non-fatal and yields an empty pool set.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EngineError> {
        let dir = dir.as_ref();
        let tokens = match std::fs::read_to_string(dir.join("tokens.csv")) {
            Ok(contents) => parse_tokens_csv(&contents)?,
            Err(_) => {
                warn!("tokens.csv not found or unreadable, using built-in default list");
                default_tokens()
            }
        };

        let pools = match std::fs::read_to_string(dir.join("pools.csv")) {
            Ok(contents) => parse_pools_csv(&contents)?,
            Err(_) => {
                info!("pools.csv not found, registry starts with an empty pool set");
                Vec::new()
            }
        };

        Ok(Self::from_parts(tokens, pools))
    }

    pub fn from_parts(tokens: Vec<TokenInfo>, pools: Vec<PoolListing>) -> Self {
        let mut tokens_by_key = HashMap::new();
        let mut tokens_by_symbol = HashMap::new();
        for t in tokens {
            tokens_by_symbol.insert(t.key.symbol().to_string(), t.key.clone());
            tokens_by_key.insert(t.key.clone(), t);
        }
        Self {
            tokens_by_key,
            tokens_by_symbol,
            pools,
        }
    }

    pub fn token_by_key(&self, key: &TokenKey) -> Option<&TokenInfo> {
        self.tokens_by_key.get(key)
    }

    pub fn token_by_symbol(&self, symbol: &str) -> Option<&TokenInfo> {
        self.tokens_by_symbol
            .get(symbol)
            .and_then(|k| self.tokens_by_key.get(k))
    }

    pub fn all_pools(&self) -> &[PoolListing] {
        &self.pools
    }

    pub fn pools_for_token(&self, key: &TokenKey) -> Vec<&PoolListing> {
        self.pools
            .iter()
            .filter(|p| &p.token0 == key || &p.token1 == key)
            .collect()
    }

    pub fn pools_above_liquidity(&self, threshold: Decimal) -> Vec<&PoolListing> {
        self.pools
            .iter()
            .filter(|p| p.observed_liquidity > threshold)
            .collect()
    }
}

fn parse_tokens_csv(contents: &str) -> Result<Vec<TokenInfo>, EngineError> {
    let mut out = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        if i == 0 || line.trim().is_empty() {
            continue; // header row
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 4 {
            return Err(EngineError::Config(format!(
                "tokens.csv line {}: expected 4 fields, got {}",
                i + 1,
                fields.len()
            )));
        }
        let symbol = fields[0].trim();
        let key = if fields[1].trim().contains('|') {
            let parts: Vec<&str> = fields[1].trim().split('|').collect();
            if parts.len() != 4 {
                return Err(EngineError::Config(format!(
                    "tokens.csv line {}: malformed tokenKey '{}'",
                    i + 1,
                    fields[1]
                )));
            }
            TokenKey::new(parts[0], parts[1], parts[2], parts[3])
        } else {
            expand_symbol(symbol)
        };
        let decimals: u8 = fields[2].trim().parse().map_err(|_| {
            EngineError::Config(format!("tokens.csv line {}: bad decimals", i + 1))
        })?;
        out.push(TokenInfo {
            key,
            decimals,
            description: fields[3].trim().to_string(),
        });
    }
    Ok(out)
}

fn parse_pools_csv(contents: &str) -> Result<Vec<PoolListing>, EngineError> {
    let mut out = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        if i == 0 || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 4 {
            return Err(EngineError::Config(format!(
                "pools.csv line {}: expected 4 fields, got {}",
                i + 1,
                fields.len()
            )));
        }
        let fee: u32 = fields[2].trim().parse().map_err(|_| {
            EngineError::Config(format!("pools.csv line {}: bad fee", i + 1))
        })?;
        let observed_liquidity = Decimal::from_str(fields[3].trim()).map_err(|_| {
            EngineError::Config(format!("pools.csv line {}: bad liquidity", i + 1))
        })?;
        out.push(PoolListing {
            token0: expand_symbol(fields[0].trim()),
            token1: expand_symbol(fields[1].trim()),
            fee,
            observed_liquidity,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_tokens_csv() {
        let csv = "symbol,tokenKey,decimals,description\nGALA,GALA|Unit|none|none,8,Gas token\n";
        let tokens = parse_tokens_csv(csv).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].key.symbol(), "GALA");
        assert_eq!(tokens[0].decimals, 8);
    }

    #[test]
    fn rejects_malformed_tokens_csv_line() {
        let csv = "symbol,tokenKey,decimals,description\nGALA,GALA|Unit|none|none,8\n";
        let err = parse_tokens_csv(csv).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn missing_pools_file_yields_empty_registry() {
        let tmp = std::env::temp_dir().join(format!("registry-test-{}", std::process::id()));
        std::fs::create_dir_all(&tmp).unwrap();
        std::fs::write(
            tmp.join("tokens.csv"),
            "symbol,tokenKey,decimals,description\nGALA,GALA|Unit|none|none,8,Gas\n",
        )
        .unwrap();
        let registry = Registry::load(&tmp).unwrap();
        assert!(registry.all_pools().is_empty());
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[test]
    fn pools_above_liquidity_filters() {
        let pools = vec![
            PoolListing {
                token0: expand_symbol("A"),
                token1: expand_symbol("B"),
                fee: 3000,
                observed_liquidity: Decimal::from(500),
            },
            PoolListing {
                token0: expand_symbol("B"),
                token1: expand_symbol("C"),
                fee: 3000,
                observed_liquidity: Decimal::from(5000),
            },
        ];
        let registry = Registry::from_parts(default_tokens(), pools);
        let above = registry.pools_above_liquidity(Decimal::from(1000));
        assert_eq!(above.len(), 1);
        assert_eq!(above[0].token1.symbol(), "C");
    }
}
