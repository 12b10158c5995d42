//! Dashboard HTTP API.
//!
//! Every mutating route is a synchronous read-modify-write through the
//! state store's single update path and returns the user's current
//! snapshot, so the dashboard never needs a separate refresh call.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use giftwatch_alerts::next_subscription_id;
use giftwatch_core::{GiftFilter, Subscription, Ton, Trade, UserConfig, UserId};
use giftwatch_market::MarketplaceGateway;
use giftwatch_store::{Snapshot, StateStore};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub gateway: Arc<dyn MarketplaceGateway>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/state/:user", get(get_state))
        .route("/api/filters/:user", patch(patch_filters))
        .route("/api/monitor/:user", post(toggle_monitor))
        .route("/api/autobuy/:user", post(toggle_autobuy))
        .route("/api/subscriptions/:user", post(create_subscription))
        .route("/api/subscriptions/:user/:id", delete(delete_subscription))
        .route("/api/subscriptions/:user/:id/toggle", post(toggle_subscription))
        .route("/api/subscriptions/:user/:id/max-price", put(set_subscription_max_price))
        .route("/api/history/:gift", get(get_history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Patch for filters and price bounds. An empty string clears a model
/// or backdrop constraint; a negative price clears the bound.
#[derive(Debug, Deserialize)]
pub struct FilterPatch {
    pub gift: Option<String>,
    pub model: Option<String>,
    pub backdrop: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

fn apply_filter_patch(cfg: &mut UserConfig, patch: FilterPatch) {
    if let Some(gift) = patch.gift {
        cfg.filter.gift = gift.into();
    }
    if let Some(model) = patch.model {
        cfg.filter.model = (!model.is_empty()).then(|| model.into());
    }
    if let Some(backdrop) = patch.backdrop {
        cfg.filter.backdrop = (!backdrop.is_empty()).then(|| backdrop.into());
    }
    if let Some(min) = patch.min_price {
        cfg.min_price = (min >= 0.0).then(|| Ton::from_f64(min));
    }
    if let Some(max) = patch.max_price {
        cfg.max_price = (max >= 0.0).then(|| Ton::from_f64(max));
    }
}

async fn get_state(
    State(state): State<ApiState>,
    Path(user): Path<i64>,
) -> Result<Json<UserConfig>, StatusCode> {
    state
        .store
        .read(|s| s.users.get(&UserId(user)).cloned())
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn patch_filters(
    State(state): State<ApiState>,
    Path(user): Path<i64>,
    Json(body): Json<FilterPatch>,
) -> Json<UserConfig> {
    let cfg = state
        .store
        .update(|s| {
            let cfg = s.ensure_user(UserId(user));
            apply_filter_patch(cfg, body);
            cfg.clone()
        })
        .await;
    Json(cfg)
}

async fn toggle_monitor(
    State(state): State<ApiState>,
    Path(user): Path<i64>,
) -> Json<UserConfig> {
    let cfg = state
        .store
        .update(|s| {
            let cfg = s.ensure_user(UserId(user));
            cfg.enabled = !cfg.enabled;
            cfg.clone()
        })
        .await;
    Json(cfg)
}

async fn toggle_autobuy(
    State(state): State<ApiState>,
    Path(user): Path<i64>,
) -> Json<UserConfig> {
    let cfg = state
        .store
        .update(|s| {
            let cfg = s.ensure_user(UserId(user));
            cfg.auto_buy_enabled = !cfg.auto_buy_enabled;
            cfg.clone()
        })
        .await;
    Json(cfg)
}

#[derive(Debug, Deserialize)]
pub struct NewSubscription {
    pub gift: String,
    pub model: Option<String>,
    pub backdrop: Option<String>,
    pub max_price: Option<f64>,
}

async fn create_subscription(
    State(state): State<ApiState>,
    Path(user): Path<i64>,
    Json(body): Json<NewSubscription>,
) -> Json<UserConfig> {
    let mut filter = GiftFilter::new(&body.gift);
    if let Some(ref model) = body.model {
        filter = filter.with_model(model);
    }
    if let Some(ref backdrop) = body.backdrop {
        filter = filter.with_backdrop(backdrop);
    }
    let sub = Subscription::new(
        next_subscription_id(),
        filter,
        body.max_price.filter(|v| *v > 0.0).map(Ton::from_f64),
    );

    let cfg = state
        .store
        .update(|s| {
            let cfg = s.ensure_user(UserId(user));
            cfg.subscriptions.push(sub);
            cfg.clone()
        })
        .await;
    Json(cfg)
}

// Subscription mutations look the user up instead of materializing one:
// an unknown user is a 404, not a fresh empty config on disk.
fn remove_subscription(s: &mut Snapshot, user: UserId, id: &str) -> Option<UserConfig> {
    let cfg = s.users.get_mut(&user)?;
    let before = cfg.subscriptions.len();
    cfg.subscriptions.retain(|sub| sub.id != id);
    (cfg.subscriptions.len() < before).then(|| cfg.clone())
}

fn flip_subscription(s: &mut Snapshot, user: UserId, id: &str) -> Option<UserConfig> {
    let cfg = s.users.get_mut(&user)?;
    let sub = cfg.subscription_mut(id)?;
    sub.enabled = !sub.enabled;
    Some(cfg.clone())
}

fn update_subscription_max_price(
    s: &mut Snapshot,
    user: UserId,
    id: &str,
    price: Option<Ton>,
) -> Option<UserConfig> {
    let cfg = s.users.get_mut(&user)?;
    let sub = cfg.subscription_mut(id)?;
    sub.max_price = price;
    Some(cfg.clone())
}

async fn delete_subscription(
    State(state): State<ApiState>,
    Path((user, id)): Path<(i64, String)>,
) -> Result<Json<UserConfig>, StatusCode> {
    state
        .store
        .update(|s| remove_subscription(s, UserId(user), &id))
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn toggle_subscription(
    State(state): State<ApiState>,
    Path((user, id)): Path<(i64, String)>,
) -> Result<Json<UserConfig>, StatusCode> {
    state
        .store
        .update(|s| flip_subscription(s, UserId(user), &id))
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Deserialize)]
pub struct MaxPriceBody {
    /// `null` or negative clears the ceiling.
    pub max_price: Option<f64>,
}

async fn set_subscription_max_price(
    State(state): State<ApiState>,
    Path((user, id)): Path<(i64, String)>,
    Json(body): Json<MaxPriceBody>,
) -> Result<Json<UserConfig>, StatusCode> {
    let price = body.max_price.filter(|v| *v > 0.0).map(Ton::from_f64);
    state
        .store
        .update(|s| update_subscription_max_price(s, UserId(user), &id, price))
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    pub pages: Option<usize>,
}

async fn get_history(
    State(state): State<ApiState>,
    Path(gift): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Trade>>, StatusCode> {
    state
        .gateway
        .history(&gift, query.limit.unwrap_or(20), query.pages.unwrap_or(1))
        .await
        .map(Json)
        .map_err(|e| {
            warn!(gift = %gift, error = %e, "history fetch failed");
            StatusCode::BAD_GATEWAY
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filter_patch_updates_only_present_fields() {
        let mut cfg = UserConfig {
            filter: GiftFilter::new("Plush Pepe").with_model("Mint"),
            max_price: Some(Ton::from_f64(10.0)),
            ..Default::default()
        };

        apply_filter_patch(
            &mut cfg,
            FilterPatch {
                gift: None,
                model: None,
                backdrop: Some("Gold".into()),
                min_price: Some(1.0),
                max_price: None,
            },
        );
        assert_eq!(cfg.filter.gift, "Plush Pepe");
        assert_eq!(cfg.filter.model.as_deref(), Some("Mint"));
        assert_eq!(cfg.filter.backdrop.as_deref(), Some("Gold"));
        assert_eq!(cfg.min_price, Some(Ton::from_f64(1.0)));
        assert_eq!(cfg.max_price, Some(Ton::from_f64(10.0)));
    }

    #[test]
    fn test_filter_patch_clearing_semantics() {
        let mut cfg = UserConfig {
            filter: GiftFilter::new("Plush Pepe").with_model("Mint"),
            min_price: Some(Ton::from_f64(1.0)),
            ..Default::default()
        };

        apply_filter_patch(
            &mut cfg,
            FilterPatch {
                gift: None,
                model: Some(String::new()),
                backdrop: None,
                min_price: Some(-1.0),
                max_price: None,
            },
        );
        assert_eq!(cfg.filter.model, None);
        assert_eq!(cfg.min_price, None);
    }

    #[test]
    fn test_subscription_mutations_do_not_create_unknown_users() {
        let mut s = Snapshot::default();
        assert_eq!(remove_subscription(&mut s, UserId(9), "s1"), None);
        assert_eq!(flip_subscription(&mut s, UserId(9), "s1"), None);
        assert_eq!(
            update_subscription_max_price(&mut s, UserId(9), "s1", None),
            None
        );
        assert!(s.users.is_empty());
    }

    #[test]
    fn test_flip_subscription_toggles_known_subscription() {
        let mut s = Snapshot::default();
        s.ensure_user(UserId(1))
            .subscriptions
            .push(Subscription::new("s1", GiftFilter::new("Pepe"), None));

        let cfg = flip_subscription(&mut s, UserId(1), "s1").unwrap();
        assert!(!cfg.subscription("s1").unwrap().enabled);
        // Unknown subscription id of a known user is still a miss
        assert_eq!(flip_subscription(&mut s, UserId(1), "nope"), None);
    }
}
