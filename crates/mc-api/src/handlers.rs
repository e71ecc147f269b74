//! # mc-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the store.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, FixedOffset, Local};
use mc_core::dto::{AdListResponse, ModerationResponse};
use mc_core::models::Decision;
use mc_core::moderation;
use mc_core::query::{self, AdQuery, SortKey, StatusFilter};
use mc_core::stats::{self, Period};
use mc_core::store::AdStore;
use mc_core::traits::ModerationPayload;
use mc_core::AppError;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ApiResult};

type Clock = Box<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub store: AdStore,
    clock: Clock,
}

impl AppState {
    pub fn new(store: AdStore) -> Self {
        Self {
            store,
            clock: Box::new(|| Local::now().fixed_offset()),
        }
    }

    /// Replaces the wall clock used for statistics windows.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<FixedOffset> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    fn now(&self) -> DateTime<FixedOffset> {
        (self.clock)()
    }
}

/// Raw list parameters. Prices stay strings so an empty form field means "unbounded".
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<StatusFilter>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<SortKey>,
    pub page: Option<usize>,
}

fn parse_price(field: &str, raw: Option<&str>) -> ApiResult<Option<u64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{field} must be a non-negative integer"))),
    }
}

impl ListParams {
    fn into_query(self) -> ApiResult<AdQuery> {
        let defaults = AdQuery::default();
        Ok(AdQuery {
            min_price: parse_price("minPrice", self.min_price.as_deref())?,
            max_price: parse_price("maxPrice", self.max_price.as_deref())?,
            search: self.search.unwrap_or_default(),
            status: self.status.unwrap_or(defaults.status),
            category: self.category.filter(|c| !c.is_empty()).unwrap_or(defaults.category),
            sort: self.sort.unwrap_or(defaults.sort),
            page: self.page.unwrap_or(defaults.page),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub period: Option<Period>,
}

/// `GET /api/v1/ads`
pub async fn list_ads(
    data: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> ApiResult<HttpResponse> {
    let ad_query = params.into_inner().into_query()?;
    let ads = data.store.snapshot().await;
    let page = query::query(&ads, &ad_query);
    Ok(HttpResponse::Ok().json(AdListResponse::from(page)))
}

/// `GET /api/v1/ads/{id}`
pub async fn get_ad(data: web::Data<AppState>, path: web::Path<u64>) -> ApiResult<HttpResponse> {
    let ad_id = path.into_inner();
    let ad = data
        .store
        .get(ad_id)
        .await
        .ok_or_else(|| AppError::ad_not_found(ad_id))?;
    Ok(HttpResponse::Ok().json(ad.as_ref()))
}

async fn submit(
    data: web::Data<AppState>,
    ad_id: u64,
    decision: Decision,
    payload: ModerationPayload,
) -> ApiResult<HttpResponse> {
    moderation::validate_reason_comment(decision, &payload)?;
    let ad = data.store.moderate(ad_id, decision, &payload).await?;

    let message = match decision {
        Decision::Approved => "Ad approved",
        Decision::Rejected => "Ad rejected",
        Decision::RequestChanges => "Changes requested",
    };
    Ok(HttpResponse::Ok().json(ModerationResponse {
        message: message.to_string(),
        ad: ad.as_ref().clone(),
    }))
}

/// `POST /api/v1/ads/{id}/approve`
pub async fn approve(
    data: web::Data<AppState>,
    path: web::Path<u64>,
    body: web::Json<ModerationPayload>,
) -> ApiResult<HttpResponse> {
    submit(data, path.into_inner(), Decision::Approved, body.into_inner()).await
}

/// `POST /api/v1/ads/{id}/reject`
pub async fn reject(
    data: web::Data<AppState>,
    path: web::Path<u64>,
    body: web::Json<ModerationPayload>,
) -> ApiResult<HttpResponse> {
    submit(data, path.into_inner(), Decision::Rejected, body.into_inner()).await
}

/// `POST /api/v1/ads/{id}/request-changes`
pub async fn request_changes(
    data: web::Data<AppState>,
    path: web::Path<u64>,
    body: web::Json<ModerationPayload>,
) -> ApiResult<HttpResponse> {
    submit(data, path.into_inner(), Decision::RequestChanges, body.into_inner()).await
}

/// `POST /api/v1/ads/refresh`
pub async fn refresh(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let count = data.store.refresh().await?;
    Ok(HttpResponse::Ok().json(json!({ "loaded": count })))
}

/// `GET /api/v1/stats/summary`
pub async fn stats_summary(
    data: web::Data<AppState>,
    params: web::Query<StatsParams>,
) -> ApiResult<HttpResponse> {
    let period = params.into_inner().period.unwrap_or_default();
    let ads = data.store.snapshot().await;
    let metrics = stats::aggregate(&ads, period, data.now());
    Ok(HttpResponse::Ok().json(metrics))
}

/// `GET /api/v1/categories`
pub async fn categories(data: web::Data<AppState>) -> HttpResponse {
    let ads = data.store.snapshot().await;
    HttpResponse::Ok().json(query::categories(&ads))
}

/// `GET /health`
pub async fn health(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "ads": data.store.len().await,
    }))
}
