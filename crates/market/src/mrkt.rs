//! MRKT marketplace REST client.

use crate::error::{GatewayError, PurchaseError};
use crate::gateway::{MarketplaceGateway, PurchaseExecutor};
use async_trait::async_trait;
use giftwatch_core::{
    GiftFilter, Listing, ListingId, Marketplace, PremarketStatus, SortOrder, Ton, Trade,
};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const MARKETPLACE: Marketplace = Marketplace::Mrkt;

/// MRKT REST API client.
///
/// Unlike Portal, MRKT takes search parameters as a JSON body and
/// quotes prices as integer nanoton.
pub struct MrktClient {
    client: reqwest::Client,
    base_url: String,
    auth_token: String,
    premarket: PremarketStatus,
}

impl MrktClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.tgmrkt.io";
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

    fn search_body(&self, filter: &GiftFilter, max_price: Option<Ton>) -> Value {
        let mut body = json!({
            "ordering": "price",
            "count": Self::PAGE_SIZE,
            "premarket": match self.premarket {
                PremarketStatus::Exclude => "none",
                PremarketStatus::Include => "with",
                PremarketStatus::Only => "only",
            },
        });
        if !filter.gift.is_empty() {
            body["collections"] = json!([filter.gift.as_str()]);
        }
        if let Some(ref model) = filter.model {
            body["models"] = json!([model.as_str()]);
        }
        if let Some(ref backdrop) = filter.backdrop {
            body["backdrops"] = json!([backdrop.as_str()]);
        }
        if let Some(max) = max_price {
            body["maxPrice"] = json!(max.0);
        }
        body
    }

    /// Parse an MRKT search response into listings.
    ///
    /// Response shape:
    /// `{"items":[{"externalId":"...","collection":"...","model":"...","backdrop":"...","price":5250000000}]}`
    pub fn parse_listings(json: &Value) -> Result<Vec<Listing>, GatewayError> {
        let items = json["items"]
            .as_array()
            .ok_or_else(|| GatewayError::Decode {
                marketplace: MARKETPLACE,
                message: "missing items array".into(),
            })?;

        let mut listings = Vec::with_capacity(items.len());
        for item in items {
            let id = match item["externalId"].as_str() {
                Some(id) => id,
                None => continue,
            };
            let gift = match item["collection"].as_str() {
                Some(name) => name,
                None => continue,
            };
            let price = match item["price"].as_u64() {
                Some(nano) if nano > 0 => Ton::from_nano(nano),
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

    /// Parse an MRKT sales-history page.
    pub fn parse_trades(json: &Value) -> Result<Vec<Trade>, GatewayError> {
        let sales = json["sales"]
            .as_array()
            .ok_or_else(|| GatewayError::Decode {
                marketplace: MARKETPLACE,
                message: "missing sales array".into(),
            })?;

        let mut trades = Vec::with_capacity(sales.len());
        for sale in sales {
            let gift_id = match sale["giftId"].as_str() {
                Some(id) => id,
                None => continue,
            };
            let price = match sale["price"].as_u64() {
                Some(nano) if nano > 0 => Ton::from_nano(nano),
                _ => continue,
            };
            let at_ms = sale["soldAt"].as_u64().unwrap_or(0);
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
impl MarketplaceGateway for MrktClient {
    async fn list_listings(
        &self,
        filter: &GiftFilter,
        max_price: Option<Ton>,
        sort: SortOrder,
    ) -> Result<Vec<Listing>, GatewayError> {
        let url = format!("{}/api/v1/gifts/search", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_token)
            .json(&self.search_body(filter, max_price))
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

        listings.retain(|l| filter.matches(l) && max_price.map_or(true, |max| l.price <= max));
        match sort {
            SortOrder::PriceAscending => listings.sort_by_key(|l| l.price),
        }
        debug!(count = listings.len(), "MRKT search complete");
        Ok(listings)
    }

    async fn history(
        &self,
        gift_id: &str,
        page_limit: usize,
        page_count: usize,
    ) -> Result<Vec<Trade>, GatewayError> {
        let url = format!("{}/api/v1/gifts/sales", self.base_url);
        let mut trades = Vec::new();
        for page in 0..page_count {
            let response = self
                .client
                .post(&url)
                .header("Authorization", &self.auth_token)
                .json(&json!({
                    "giftId": gift_id,
                    "count": page_limit,
                    "offset": page * page_limit,
                }))
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
impl PurchaseExecutor for MrktClient {
    async fn buy(&self, listing: &ListingId) -> Result<(), PurchaseError> {
        let url = format!("{}/api/v1/gifts/buy", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_token)
            .json(&json!({ "externalId": listing.raw.as_str() }))
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
    fn test_parse_listings_nanoton_prices() {
        let json: Value = serde_json::from_str(
            r#"{"items":[
                {"externalId":"m-1","collection":"Plush Pepe","model":"Mint","price":5250000000},
                {"externalId":"m-2","collection":"Candy Cane","price":900000000}
            ]}"#,
        )
        .unwrap();

        let listings = MrktClient::parse_listings(&json).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, ListingId::new(Marketplace::Mrkt, "m-1"));
        assert_eq!(listings[0].price, Ton::from_f64(5.25));
        assert_eq!(listings[1].price, Ton::from_f64(0.9));
    }

    #[test]
    fn test_parse_listings_rejects_wrong_shape() {
        let json: Value = serde_json::from_str(r#"{"detail":"throttled"}"#).unwrap();
        assert!(MrktClient::parse_listings(&json).is_err());
    }

    #[test]
    fn test_search_body_carries_filter() {
        let client = MrktClient::new(
            MrktClient::DEFAULT_BASE_URL,
            "token",
            Duration::from_secs(5),
            PremarketStatus::Exclude,
        )
        .unwrap();

        let filter = GiftFilter::new("Plush Pepe").with_model("Mint");
        let body = client.search_body(&filter, Some(Ton::from_f64(10.0)));
        assert_eq!(body["collections"], json!(["Plush Pepe"]));
        assert_eq!(body["models"], json!(["Mint"]));
        assert_eq!(body["maxPrice"], json!(10_000_000_000u64));
        assert_eq!(body["premarket"], json!("none"));
        assert!(body.get("backdrops").is_none());
    }
}
