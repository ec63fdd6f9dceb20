//! HTTP+JSON gateway client (C2/C7/C8's transport dependency).
//!
//! Generalizes the teacher's `reqwest`-based Discord webhook client into the
//! JSON request/response cycle the engine needs: composite pool snapshots,
//! user asset inventories, per-tier pool data probes, quotes, and swap
//! submission. All numeric fields cross the wire as decimal strings and are
//! parsed into `rust_decimal::Decimal` at this boundary — never as `f64`
//! (per `spec.md` §9, "Open-ended numeric strings").
//!
//! Author: AI-Generated
//! Created: 2026-01-29

use crate::config::{GatewayUrls, SigningKey};
use crate::error::EngineError;
use crate::types::{PoolSnapshot, TickInfo, TokenKey};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct CompositePoolResponse {
    #[serde(rename = "Data")]
    data: Option<CompositePoolData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompositePoolData {
    token0_decimals: u8,
    token1_decimals: u8,
    sqrt_price: String,
    liquidity: String,
    tick_spacing: i32,
    current_tick: i32,
    ticks: Vec<WireTick>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTick {
    tick: i32,
    net_liquidity: String,
    gross_liquidity: String,
    fee_growth_outside: String,
}

#[derive(Debug, Deserialize)]
pub struct PoolDataProbe {
    pub fee: u32,
    pub liquidity: Decimal,
}

#[derive(Debug, Deserialize)]
struct UserAssetsResponse {
    #[serde(rename = "Data")]
    data: Option<UserAssetsData>,
}

#[derive(Debug, Deserialize)]
struct UserAssetsData {
    #[serde(default)]
    tokens: Vec<WireAsset>,
}

/// Heterogeneous asset shapes from the underlying transport: some entries
/// carry a nested `tokenClassKey`, others flatten the key fields onto the
/// asset itself. Both are modeled here; parsing tries nested, then flat,
/// then falls back to `symbol`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAsset {
    #[serde(default)]
    pub token_class_key: Option<WireTokenClassKey>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub additional_key: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    pub quantity: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTokenClassKey {
    pub collection: String,
    pub category: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub additional_key: String,
}

impl WireAsset {
    /// Derives a token key trying the nested shape, then flat fields, then
    /// `symbol` as a last resort.
    pub fn token_key(&self) -> Option<TokenKey> {
        if let Some(k) = &self.token_class_key {
            return Some(TokenKey::new(
                k.collection.clone(),
                k.category.clone(),
                k.type_.clone(),
                k.additional_key.clone(),
            ));
        }
        if let (Some(collection), Some(category), Some(type_), Some(additional_key)) = (
            &self.collection,
            &self.category,
            &self.type_,
            &self.additional_key,
        ) {
            return Some(TokenKey::new(
                collection.clone(),
                category.clone(),
                type_.clone(),
                additional_key.clone(),
            ));
        }
        self.symbol.as_ref().map(|s| TokenKey::from_symbol(s.clone()))
    }

    pub fn balance(&self) -> Result<Decimal, EngineError> {
        Decimal::from_str(&self.quantity)
            .map_err(|e| EngineError::Transport(format!("bad asset quantity: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "Data")]
    data: Option<QuoteData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteData {
    amount_out: String,
}

#[derive(Debug, Deserialize)]
struct SwapSubmissionResponse {
    #[serde(rename = "Data")]
    data: Option<SwapSubmissionData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapSubmissionData {
    tx_id: String,
}

/// JSON/HTTP client over the GSwap-style gateway surface.
pub struct GatewayClient {
    http: Client,
    urls: GatewayUrls,
}

impl GatewayClient {
    pub fn new(urls: GatewayUrls) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client builds with static config");
        Self { http, urls }
    }

    fn dex_contract_path(&self) -> String {
        format!("{}{}", self.urls.gateway_url, self.urls.gateway_base_path)
    }

    /// `POST <gateway>/<dexContractPath>/GetCompositePool`.
    pub async fn get_composite_pool(
        &self,
        token0: &TokenKey,
        token1: &TokenKey,
        fee: u32,
    ) -> Result<PoolSnapshot, EngineError> {
        let url = format!("{}/GetCompositePool", self.dex_contract_path());
        let body = serde_json::json!({
            "token0": token0.to_string(),
            "token1": token1.to_string(),
            "fee": fee,
        });
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Transport(format!("GetCompositePool request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(EngineError::Transport(format!(
                "GetCompositePool returned status {}",
                resp.status()
            )));
        }

        let parsed: CompositePoolResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Transport(format!("GetCompositePool decode failed: {e}")))?;

        let data = parsed
            .data
            .ok_or_else(|| EngineError::Transport("GetCompositePool missing Data field".into()))?;

        let sqrt_price = Decimal::from_str(&data.sqrt_price)
            .map_err(|e| EngineError::Transport(format!("bad sqrtPrice: {e}")))?;
        let liquidity: u128 = data
            .liquidity
            .parse()
            .map_err(|e| EngineError::Transport(format!("bad liquidity: {e}")))?;

        let mut tick_data = BTreeMap::new();
        for t in data.ticks {
            let net_liquidity: i128 = t
                .net_liquidity
                .parse()
                .map_err(|e| EngineError::Transport(format!("bad tick net liquidity: {e}")))?;
            let gross_liquidity: u128 = t
                .gross_liquidity
                .parse()
                .map_err(|e| EngineError::Transport(format!("bad tick gross liquidity: {e}")))?;
            let fee_growth_outside = Decimal::from_str(&t.fee_growth_outside)
                .map_err(|e| EngineError::Transport(format!("bad fee growth outside: {e}")))?;
            tick_data.insert(
                t.tick,
                TickInfo {
                    net_liquidity,
                    gross_liquidity,
                    fee_growth_outside,
                },
            );
        }

        debug!(%token0, %token1, fee, tick_count = tick_data.len(), "fetched composite pool");

        Ok(PoolSnapshot {
            token0: token0.clone(),
            token1: token1.clone(),
            fee,
            token0_decimals: data.token0_decimals,
            token1_decimals: data.token1_decimals,
            sqrt_price,
            liquidity,
            tick_spacing: data.tick_spacing,
            current_tick: data.current_tick,
            tick_data,
        })
    }

    /// Probes a single fee tier's pool data, used by C8's fee-tier selection.
    pub async fn get_pool_data(
        &self,
        token0: &TokenKey,
        token1: &TokenKey,
        fee: u32,
    ) -> Result<Option<PoolDataProbe>, EngineError> {
        match self.get_composite_pool(token0, token1, fee).await {
            Ok(snapshot) => Ok(Some(PoolDataProbe {
                fee,
                liquidity: Decimal::from(snapshot.liquidity),
            })),
            Err(EngineError::Transport(msg)) if msg.contains("missing Data") => {
                warn!(%token0, %token1, fee, "no pool data for fee tier");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_user_assets(
        &self,
        wallet_address: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<WireAsset>, EngineError> {
        let url = format!("{}/GetUserAssets", self.dex_contract_path());
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("address", wallet_address),
                ("page", &page.to_string()),
                ("limit", &page_size.to_string()),
            ])
            .send()
            .await
            .map_err(|e| EngineError::Transport(format!("getUserAssets request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(EngineError::Transport(format!(
                "getUserAssets returned status {}",
                resp.status()
            )));
        }

        let parsed: UserAssetsResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Transport(format!("getUserAssets decode failed: {e}")))?;

        Ok(parsed.data.map(|d| d.tokens).unwrap_or_default())
    }

    /// Requests an exact-input quote for a single hop.
    pub async fn quote(
        &self,
        token_in: &TokenKey,
        token_out: &TokenKey,
        fee: u32,
        amount_in: Decimal,
    ) -> Result<Decimal, EngineError> {
        let url = format!("{}/Quote", self.dex_contract_path());
        let body = serde_json::json!({
            "tokenIn": token_in.to_string(),
            "tokenOut": token_out.to_string(),
            "fee": fee,
            "amountIn": amount_in.to_string(),
        });
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Quote(format!("quote request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(EngineError::Quote(format!(
                "quote returned status {}",
                resp.status()
            )));
        }

        let parsed: QuoteResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Quote(format!("quote decode failed: {e}")))?;
        let data = parsed
            .data
            .ok_or_else(|| EngineError::Quote("quote missing Data field".into()))?;

        Decimal::from_str(&data.amount_out)
            .map_err(|e| EngineError::Quote(format!("bad amountOut: {e}")))
    }

    /// Submits a signed swap and returns the transaction id to await on the
    /// notification channel.
    pub async fn submit_swap(
        &self,
        signing_key: &SigningKey,
        token_in: &TokenKey,
        token_out: &TokenKey,
        fee: u32,
        amount_in: Decimal,
        amount_out_minimum: Decimal,
    ) -> Result<String, EngineError> {
        let url = format!("{}/Swap", self.urls.bundler_url.clone() + &self.urls.bundler_base_path);
        let body = serde_json::json!({
            "tokenIn": token_in.to_string(),
            "tokenOut": token_out.to_string(),
            "fee": fee,
            "amountIn": amount_in.to_string(),
            "amountOutMinimum": amount_out_minimum.to_string(),
            "signature": sign_payload(signing_key, &url),
        });
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Submission(format!("swap submission failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(EngineError::Submission(format!(
                "swap submission returned status {}",
                resp.status()
            )));
        }

        let parsed: SwapSubmissionResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Submission(format!("swap submission decode failed: {e}")))?;
        let data = parsed
            .data
            .ok_or_else(|| EngineError::Submission("swap submission missing Data field".into()))?;

        Ok(data.tx_id)
    }
}

/// Placeholder signature scheme: the actual signer is an external
/// collaborator per `spec.md` §1 ("The private-key signer... specified only
/// at their interface"). This crate never inspects `signing_key`'s contents.
fn sign_payload(signing_key: &SigningKey, _payload_context: &str) -> String {
    let _ = signing_key.reveal();
    "signed".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_asset_prefers_nested_token_class_key() {
        let asset = WireAsset {
            token_class_key: Some(WireTokenClassKey {
                collection: "GALA".into(),
                category: "Unit".into(),
                type_: "none".into(),
                additional_key: "none".into(),
            }),
            collection: Some("WRONG".into()),
            category: None,
            type_: None,
            additional_key: None,
            symbol: Some("WRONG".into()),
            quantity: "10".into(),
        };
        assert_eq!(asset.token_key().unwrap().symbol(), "GALA");
    }

    #[test]
    fn wire_asset_falls_back_to_flat_fields() {
        let asset = WireAsset {
            token_class_key: None,
            collection: Some("SILK".into()),
            category: Some("Unit".into()),
            type_: Some("none".into()),
            additional_key: Some("none".into()),
            symbol: None,
            quantity: "5".into(),
        };
        assert_eq!(asset.token_key().unwrap().symbol(), "SILK");
    }

    #[test]
    fn wire_asset_falls_back_to_symbol() {
        let asset = WireAsset {
            token_class_key: None,
            collection: None,
            category: None,
            type_: None,
            additional_key: None,
            symbol: Some("GUSDC".into()),
            quantity: "1".into(),
        };
        assert_eq!(asset.token_key().unwrap().symbol(), "GUSDC");
    }

    #[test]
    fn wire_asset_with_no_identity_yields_none() {
        let asset = WireAsset {
            token_class_key: None,
            collection: None,
            category: None,
            type_: None,
            additional_key: None,
            symbol: None,
            quantity: "1".into(),
        };
        assert!(asset.token_key().is_none());
    }
}
