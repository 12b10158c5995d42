//! The gateway capability consumed by the scan cycles.

use crate::{GatewayError, PurchaseError};
use async_trait::async_trait;
use giftwatch_core::{GiftFilter, Listing, ListingId, SortOrder, Ton, Trade};
use tracing::warn;

/// Listing search and trade history across marketplaces.
///
/// The scan cycles only consume this trait, so tests drive them with
/// scripted in-memory implementations.
#[async_trait]
pub trait MarketplaceGateway: Send + Sync {
    /// Fetch current listings matching `filter`, at or below
    /// `max_price` when given, in the requested order.
    async fn list_listings(
        &self,
        filter: &GiftFilter,
        max_price: Option<Ton>,
        sort: SortOrder,
    ) -> Result<Vec<Listing>, GatewayError>;

    /// Fetch recent sales of a gift, newest first.
    async fn history(
        &self,
        gift_id: &str,
        page_limit: usize,
        page_count: usize,
    ) -> Result<Vec<Trade>, GatewayError>;
}

/// The purchase action behind auto-buy.
#[async_trait]
pub trait PurchaseExecutor: Send + Sync {
    async fn buy(&self, listing: &ListingId) -> Result<(), PurchaseError>;
}

/// Fans a query out to Portal and MRKT and merges the results.
///
/// One source failing while the other succeeds yields the successful
/// source's listings; only both failing surfaces an error to the cycle.
pub struct MergedGateway<P, M> {
    portal: P,
    mrkt: M,
}

impl<P, M> MergedGateway<P, M>
where
    P: MarketplaceGateway,
    M: MarketplaceGateway,
{
    pub fn new(portal: P, mrkt: M) -> Self {
        Self { portal, mrkt }
    }
}

#[async_trait]
impl<P, M> MarketplaceGateway for MergedGateway<P, M>
where
    P: MarketplaceGateway,
    M: MarketplaceGateway,
{
    async fn list_listings(
        &self,
        filter: &GiftFilter,
        max_price: Option<Ton>,
        sort: SortOrder,
    ) -> Result<Vec<Listing>, GatewayError> {
        let (portal, mrkt) = tokio::join!(
            self.portal.list_listings(filter, max_price, sort),
            self.mrkt.list_listings(filter, max_price, sort),
        );

        let mut merged = Vec::new();
        let mut failures = 0;
        for result in [portal, mrkt] {
            match result {
                Ok(listings) => merged.extend(listings),
                Err(e) => {
                    warn!(error = %e, "marketplace source failed, using remaining sources");
                    failures += 1;
                }
            }
        }
        if failures == 2 {
            return Err(GatewayError::AllSourcesFailed);
        }

        match sort {
            SortOrder::PriceAscending => merged.sort_by_key(|l| l.price),
        }
        Ok(merged)
    }

    async fn history(
        &self,
        gift_id: &str,
        page_limit: usize,
        page_count: usize,
    ) -> Result<Vec<Trade>, GatewayError> {
        let (portal, mrkt) = tokio::join!(
            self.portal.history(gift_id, page_limit, page_count),
            self.mrkt.history(gift_id, page_limit, page_count),
        );

        let mut merged = Vec::new();
        let mut failures = 0;
        for result in [portal, mrkt] {
            match result {
                Ok(trades) => merged.extend(trades),
                Err(e) => {
                    warn!(error = %e, "marketplace history source failed");
                    failures += 1;
                }
            }
        }
        if failures == 2 {
            return Err(GatewayError::AllSourcesFailed);
        }
        merged.sort_by(|a, b| b.at_ms.cmp(&a.at_ms));
        Ok(merged)
    }
}

/// Routes a purchase to the client owning the listing's marketplace.
pub struct MarketplaceBuyer {
    portal: crate::PortalClient,
    mrkt: crate::MrktClient,
}

impl MarketplaceBuyer {
    pub fn new(portal: crate::PortalClient, mrkt: crate::MrktClient) -> Self {
        Self { portal, mrkt }
    }
}

#[async_trait]
impl PurchaseExecutor for MarketplaceBuyer {
    async fn buy(&self, listing: &ListingId) -> Result<(), PurchaseError> {
        match listing.marketplace {
            giftwatch_core::Marketplace::Portal => self.portal.buy(listing).await,
            giftwatch_core::Marketplace::Mrkt => self.mrkt.buy(listing).await,
        }
    }
}
