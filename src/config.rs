//! Configuration management
//!
//! `Cli` mirrors the engine's environment-variable table as `clap` flags
//! (each with a matching `env = "..."` attribute), so operators can override
//! configuration at the command line while `.env`/the process environment
//! remains the documented interface. `load_config` turns a parsed `Cli` into
//! the validated `EngineConfig` the rest of the engine consumes.
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use crate::types::TokenKey;
use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::fmt;

/// Wraps the chain signing key so it can never be accidentally logged.
#[derive(Clone)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

impl fmt::Display for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

#[derive(Debug, Clone)]
pub struct GatewayUrls {
    pub gateway_url: String,
    pub gateway_base_path: String,
    pub bundler_url: String,
    pub bundler_base_path: String,
    pub backend_url: String,
    pub backend_base_path: String,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub preferred_token_key: TokenKey,
    pub preferred_token_name: String,
    pub gas_token_key: TokenKey,
    pub minimum_gas_balance: Decimal,
    pub trade_interval_ms: u64,
    pub max_slippage: Decimal,
    pub trade_amount_percentage: Decimal,
    pub enable_arbitrage: bool,
    pub arbitrage_check_interval_ms: u64,
    pub arbitrage_min_profit_percent: Decimal,
    pub arbitrage_max_trade_size: Decimal,
    pub arbitrage_max_hops: u8,
    pub arbitrage_min_liquidity: Decimal,
    pub arbitrage_pool_cache_ttl_ms: u64,
    pub wallet_address: String,
    pub signing_key: SigningKey,
    pub enable_trading: bool,
    pub transaction_timeout_ms: u64,
    pub port: u16,
    pub gateway: GatewayUrls,
}

/// Command-line surface mirroring the engine's environment variables.
/// Every field falls back to its `env` var, then to the listed default —
/// `WALLET_ADDRESS` and `GALACHAIN_PRIVATE_KEY` have no default and are
/// validated as required by `load_config`.
#[derive(Parser, Debug, Clone)]
#[command(name = "amm-trade-agent", about = "Autonomous trading agent for a concentrated-liquidity AMM", version)]
pub struct Cli {
    #[arg(long, env = "PREFERRED_TOKEN_KEY", default_value = "GALA|Unit|none|none")]
    pub preferred_token_key: TokenKey,

    #[arg(long, env = "PREFERRED_TOKEN_NAME", default_value = "$GALA")]
    pub preferred_token_name: String,

    #[arg(long, env = "GALA_TOKEN_KEY", default_value = "GALA|Unit|none|none")]
    pub gas_token_key: TokenKey,

    #[arg(long, env = "MINIMUM_GALA_BALANCE", default_value = "100")]
    pub minimum_gas_balance: Decimal,

    #[arg(long, env = "TRADE_INTERVAL_MS", default_value_t = 60_000)]
    pub trade_interval_ms: u64,

    #[arg(long, env = "MAX_SLIPPAGE", default_value = "5")]
    pub max_slippage: Decimal,

    #[arg(long, env = "TRADE_AMOUNT_PERCENTAGE", default_value = "10")]
    pub trade_amount_percentage: Decimal,

    #[arg(long, env = "ENABLE_ARBITRAGE", default_value_t = false)]
    pub enable_arbitrage: bool,

    #[arg(long, env = "ARBITRAGE_CHECK_INTERVAL_MS", default_value_t = 120_000)]
    pub arbitrage_check_interval_ms: u64,

    #[arg(long, env = "ARBITRAGE_MIN_PROFIT_PERCENT", default_value = "1.0")]
    pub arbitrage_min_profit_percent: Decimal,

    #[arg(long, env = "ARBITRAGE_MAX_TRADE_SIZE", default_value = "100")]
    pub arbitrage_max_trade_size: Decimal,

    #[arg(long, env = "ARBITRAGE_MAX_HOPS", default_value_t = 3)]
    pub arbitrage_max_hops: u8,

    #[arg(long, env = "ARBITRAGE_MIN_LIQUIDITY", default_value = "1000")]
    pub arbitrage_min_liquidity: Decimal,

    #[arg(long, env = "ARBITRAGE_POOL_CACHE_TTL", default_value_t = 60_000)]
    pub arbitrage_pool_cache_ttl_ms: u64,

    #[arg(long, env = "WALLET_ADDRESS")]
    pub wallet_address: Option<String>,

    #[arg(long, env = "GALACHAIN_PRIVATE_KEY")]
    pub galachain_private_key: Option<String>,

    #[arg(long, env = "ENABLE_TRADING", default_value_t = false)]
    pub enable_trading: bool,

    #[arg(long, env = "TRANSACTION_TIMEOUT_MS", default_value_t = 600_000)]
    pub transaction_timeout_ms: u64,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    #[arg(long, env = "GSWAP_GATEWAY_URL", default_value = "https://gateway.example.invalid")]
    pub gateway_url: String,

    #[arg(long, env = "GSWAP_GATEWAY_BASE_PATH", default_value = "/api/gateway")]
    pub gateway_base_path: String,

    #[arg(long, env = "GSWAP_BUNDLER_URL", default_value = "https://bundler.example.invalid")]
    pub bundler_url: String,

    #[arg(long, env = "GSWAP_BUNDLER_BASE_PATH", default_value = "/api/bundler")]
    pub bundler_base_path: String,

    #[arg(long, env = "GSWAP_BACKEND_URL", default_value = "https://backend.example.invalid")]
    pub backend_url: String,

    #[arg(long, env = "GSWAP_BACKEND_BASE_PATH", default_value = "/api/backend")]
    pub backend_base_path: String,
}

/// Validates a parsed `Cli` into an `EngineConfig`. `main` loads `.env` and
/// calls `Cli::parse()` before this; tests build a `Cli` via
/// `Cli::try_parse_from` to exercise this without touching real args.
pub fn load_config(cli: Cli) -> Result<EngineConfig> {
    let wallet_address = cli.wallet_address.context("WALLET_ADDRESS is required")?;
    let signing_key = SigningKey(
        cli.galachain_private_key
            .context("GALACHAIN_PRIVATE_KEY is required")?,
    );

    Ok(EngineConfig {
        preferred_token_key: cli.preferred_token_key,
        preferred_token_name: cli.preferred_token_name,
        gas_token_key: cli.gas_token_key,
        minimum_gas_balance: cli.minimum_gas_balance,
        trade_interval_ms: cli.trade_interval_ms,
        max_slippage: cli.max_slippage,
        trade_amount_percentage: cli.trade_amount_percentage,
        enable_arbitrage: cli.enable_arbitrage,
        arbitrage_check_interval_ms: cli.arbitrage_check_interval_ms,
        arbitrage_min_profit_percent: cli.arbitrage_min_profit_percent,
        arbitrage_max_trade_size: cli.arbitrage_max_trade_size,
        arbitrage_max_hops: cli.arbitrage_max_hops,
        arbitrage_min_liquidity: cli.arbitrage_min_liquidity,
        arbitrage_pool_cache_ttl_ms: cli.arbitrage_pool_cache_ttl_ms,
        wallet_address,
        signing_key,
        enable_trading: cli.enable_trading,
        transaction_timeout_ms: cli.transaction_timeout_ms,
        port: cli.port,
        gateway: GatewayUrls {
            gateway_url: cli.gateway_url,
            gateway_base_path: cli.gateway_base_path,
            bundler_url: cli.bundler_url,
            bundler_base_path: cli.bundler_base_path,
            backend_url: cli.backend_url,
            backend_base_path: cli.backend_base_path,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_key_never_displays_secret() {
        let k = SigningKey("super-secret".to_string());
        assert_eq!(format!("{k}"), "<redacted>");
        assert_eq!(format!("{k:?}"), "<redacted>");
        assert_eq!(k.reveal(), "super-secret");
    }

    #[test]
    fn cli_rejects_malformed_token_key_flag() {
        let result = Cli::try_parse_from([
            "amm-trade-agent",
            "--preferred-token-key",
            "onlytwo|parts",
            "--wallet-address",
            "eth|0xabc",
            "--galachain-private-key",
            "k",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn load_config_requires_wallet_address_and_signing_key() {
        let cli = Cli::try_parse_from(["amm-trade-agent"]).unwrap();
        let err = load_config(cli).unwrap_err();
        assert!(err.to_string().contains("WALLET_ADDRESS"));
    }

    #[test]
    fn cli_flags_override_defaults_and_flow_into_config() {
        let cli = Cli::try_parse_from([
            "amm-trade-agent",
            "--wallet-address",
            "eth|0xabc",
            "--galachain-private-key",
            "test-key",
            "--port",
            "4000",
            "--enable-trading",
            "true",
        ])
        .unwrap();
        let config = load_config(cli).unwrap();
        assert_eq!(config.port, 4000);
        assert!(config.enable_trading);
        assert_eq!(config.wallet_address, "eth|0xabc");
    }
}
