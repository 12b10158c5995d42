//! Scripted in-memory collaborators for cycle tests.

use async_trait::async_trait;
use giftwatch_alerts::{DeliveryError, NotificationSink};
use giftwatch_core::{GiftFilter, Listing, ListingId, Marketplace, SortOrder, Ton, Trade, UserId};
use giftwatch_market::{GatewayError, MarketplaceGateway, PurchaseError, PurchaseExecutor};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn listing(marketplace: Marketplace, id: &str, gift: &str, price: f64) -> Listing {
    Listing {
        id: ListingId::new(marketplace, id),
        gift: gift.into(),
        model: None,
        backdrop: None,
        price: Ton::from_f64(price),
    }
}

/// Gateway returning scripted responses in call order.
#[derive(Default)]
pub struct FakeGateway {
    responses: Mutex<VecDeque<Result<Vec<Listing>, GatewayError>>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, listings: Vec<Listing>) {
        self.responses.lock().unwrap().push_back(Ok(listings));
    }

    pub fn push_err(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(GatewayError::AllSourcesFailed));
    }
}

#[async_trait]
impl MarketplaceGateway for FakeGateway {
    async fn list_listings(
        &self,
        _filter: &GiftFilter,
        _max_price: Option<Ton>,
        _sort: SortOrder,
    ) -> Result<Vec<Listing>, GatewayError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted gateway call")
    }

    async fn history(
        &self,
        _gift_id: &str,
        _page_limit: usize,
        _page_count: usize,
    ) -> Result<Vec<Trade>, GatewayError> {
        Ok(Vec::new())
    }
}

/// Sink recording deliveries; can be switched to fail every send or
/// only the next one.
#[derive(Default)]
pub struct FakeSink {
    pub sent: Mutex<Vec<(UserId, String)>>,
    pub fail: AtomicBool,
    pub fail_first: AtomicBool,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent_to(&self, user: UserId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for FakeSink {
    async fn send(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::Relaxed) || self.fail_first.swap(false, Ordering::Relaxed) {
            return Err(DeliveryError {
                user,
                message: "scripted failure".into(),
            });
        }
        self.sent.lock().unwrap().push((user, text.to_string()));
        Ok(())
    }
}

/// Purchase executor with scripted outcomes.
#[derive(Default)]
pub struct FakeBuyer {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeBuyer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PurchaseExecutor for FakeBuyer {
    async fn buy(&self, _listing: &ListingId) -> Result<(), PurchaseError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail.load(Ordering::Relaxed) {
            return Err(PurchaseError::Rejected {
                marketplace: Marketplace::Portal,
                status: 409,
            });
        }
        Ok(())
    }
}
