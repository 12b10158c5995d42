//! Portal marketplace REST client.

use crate::error::{GatewayError, PurchaseError};
use crate::gateway::{MarketplaceGateway, PurchaseExecutor};
use async_trait::async_trait;
use giftwatch_core::{
    GiftFilter, Listing, ListingId, Marketplace, PremarketStatus, SortOrder, Ton, Trade,
};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const MARKETPLACE: Marketplace = Marketplace::Portal;

/// Portal REST API client.
///
/// Portal prices come over the wire as decimal TON strings.
pub struct PortalClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: String,
    premarket: PremarketStatus,
}

impl PortalClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://portals-market.com";
    const PAGE_SIZE: usize = 50;

    pub fn new(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        timeout: Duration,
        premarket: PremarketStatus,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::from_reqwest(MARKETPLACE, e))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            premarket,
        })
    }

    fn status_param(&self) -> &'static str {
        match self.premarket {
            PremarketStatus::Exclude => "listed",
            PremarketStatus::Include => "all",
            PremarketStatus::Only => "premarket",
        }
    }

    /// Parse a Portal search response into listings.
    ///
    /// Response shape:
    /// `{"results":[{"id":"...","name":"...","model":"...","backdrop":"...","price":"5.25"}]}`
    pub fn parse_listings(json: &Value) -> Result<Vec<Listing>, GatewayError> {
        let results = json["results"]
            .as_array()
            .ok_or_else(|| GatewayError::Decode {
                marketplace: MARKETPLACE,
                message: "missing results array".into(),
            })?;

        let mut listings = Vec::with_capacity(results.len());
        for item in results {
            let id = match item["id"].as_str() {
                Some(id) => id,
                None => continue,
            };
            let gift = match item["name"].as_str() {
                Some(name) => name,
                None => continue,
            };
            let price = match item["price"].as_str().and_then(|s| s.parse::<f64>().ok()) {
                Some(p) if p > 0.0 => Ton::from_f64(p),
                _ => continue,
            };
            listings.push(Listing {
                id: ListingId::new(MARKETPLACE, id),
                gift: gift.into(),
                model: item["model"].as_str().map(Into::into),
                backdrop: item["backdrop"].as_str().map(Into::into),
                price,
            });
        }
        Ok(listings)
    }

    /// Parse a Portal sales-history page.
    pub fn parse_trades(json: &Value) -> Result<Vec<Trade>, GatewayError> {
        let actions = json["actions"]
            .as_array()
            .ok_or_else(|| GatewayError::Decode {
                marketplace: MARKETPLACE,
                message: "missing actions array".into(),
            })?;

        let mut trades = Vec::with_capacity(actions.len());
        for action in actions {
            let gift_id = match action["gift_id"].as_str() {
                Some(id) => id,
                None => continue,
            };
            let price = match action["amount"].as_str().and_then(|s| s.parse::<f64>().ok()) {
                Some(p) if p > 0.0 => Ton::from_f64(p),
                _ => continue,
            };
            let at_ms = action["created_at"].as_u64().unwrap_or(0);
            trades.push(Trade {
                gift_id: gift_id.into(),
                price,
                at_ms,
            });
        }
        Ok(trades)
    }
}

#[async_trait]
impl MarketplaceGateway for PortalClient {
    async fn list_listings(
        &self,
        filter: &GiftFilter,
        max_price: Option<Ton>,
        sort: SortOrder,
    ) -> Result<Vec<Listing>, GatewayError> {
        let url = format!("{}/api/market/search", self.base_url);
        let mut query: Vec<(&str, String)> = vec![
            ("sort", "price_asc".into()),
            ("status", self.status_param().into()),
            ("limit", Self::PAGE_SIZE.to_string()),
        ];
        if !filter.gift.is_empty() {
            query.push(("gift_name", filter.gift.to_string()));
        }
        if let Some(ref model) = filter.model {
            query.push(("model", model.to_string()));
        }
        if let Some(ref backdrop) = filter.backdrop {
            query.push(("backdrop", backdrop.to_string()));
        }
        if let Some(max) = max_price {
            query.push(("max_price", format!("{}", max.to_f64())));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.auth_token)
            .query(&query)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(MARKETPLACE, e))?;

        if !response.status().is_success() {
            return Err(GatewayError::Status {
                marketplace: MARKETPLACE,
                status: response.status().as_u16(),
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::from_reqwest(MARKETPLACE, e))?;
        let mut listings = Self::parse_listings(&json)?;

        // Server-side query params are advisory; enforce the filter and
        // bound locally so cycle semantics never depend on upstream quirks.
        listings.retain(|l| filter.matches(l) && max_price.map_or(true, |max| l.price <= max));
        match sort {
            SortOrder::PriceAscending => listings.sort_by_key(|l| l.price),
        }
        debug!(count = listings.len(), "Portal search complete");
        Ok(listings)
    }

    async fn history(
        &self,
        gift_id: &str,
        page_limit: usize,
        page_count: usize,
    ) -> Result<Vec<Trade>, GatewayError> {
        let url = format!("{}/api/market/actions", self.base_url);
        let mut trades = Vec::new();
        for page in 1..=page_count {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.auth_token)
                .query(&[
                    ("gift_id", gift_id.to_string()),
                    ("type", "sale".into()),
                    ("limit", page_limit.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await
                .map_err(|e| GatewayError::from_reqwest(MARKETPLACE, e))?;

            if !response.status().is_success() {
                return Err(GatewayError::Status {
                    marketplace: MARKETPLACE,
                    status: response.status().as_u16(),
                });
            }

            let json: Value = response
                .json()
                .await
                .map_err(|e| GatewayError::from_reqwest(MARKETPLACE, e))?;
            let page_trades = Self::parse_trades(&json)?;
            let got_full_page = page_trades.len() >= page_limit;
            trades.extend(page_trades);
            if !got_full_page {
                break;
            }
        }
        Ok(trades)
    }
}

#[async_trait]
impl PurchaseExecutor for PortalClient {
    async fn buy(&self, listing: &ListingId) -> Result<(), PurchaseError> {
        let url = format!("{}/api/market/{}/buy", self.base_url, listing.raw);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.auth_token)
            .send()
            .await
            .map_err(|e| PurchaseError::Http {
                marketplace: MARKETPLACE,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(PurchaseError::Rejected {
                marketplace: MARKETPLACE,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_listings() {
        let json: Value = serde_json::from_str(
            r#"{"results":[
                {"id":"ab12","name":"Plush Pepe","model":"Mint","backdrop":"Gold","price":"5.25"},
                {"id":"cd34","name":"Candy Cane","price":"0.9"}
            ]}"#,
        )
        .unwrap();

        let listings = PortalClient::parse_listings(&json).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, ListingId::new(Marketplace::Portal, "ab12"));
        assert_eq!(listings[0].price, Ton::from_f64(5.25));
        assert_eq!(listings[0].model.as_deref(), Some("Mint"));
        assert_eq!(listings[1].model, None);
    }

    #[test]
    fn test_parse_listings_skips_malformed_entries() {
        let json: Value = serde_json::from_str(
            r#"{"results":[
                {"name":"No Id","price":"1.0"},
                {"id":"x","name":"Bad Price","price":"free"},
                {"id":"y","name":"Zero","price":"0"},
                {"id":"ok","name":"Fine","price":"2.5"}
            ]}"#,
        )
        .unwrap();

        let listings = PortalClient::parse_listings(&json).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id.raw, "ok");
    }

    #[test]
    fn test_parse_listings_rejects_wrong_shape() {
        let json: Value = serde_json::from_str(r#"{"error":"maintenance"}"#).unwrap();
        assert!(PortalClient::parse_listings(&json).is_err());
    }

    #[test]
    fn test_parse_trades() {
        let json: Value = serde_json::from_str(
            r#"{"actions":[
                {"gift_id":"pepe-1","amount":"4.2","created_at":1724800000000}
            ]}"#,
        )
        .unwrap();

        let trades = PortalClient::parse_trades(&json).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Ton::from_f64(4.2));
        assert_eq!(trades[0].at_ms, 1724800000000);
    }
}
