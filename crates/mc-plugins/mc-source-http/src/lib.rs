//! # mc-source-http
//!
//! `reqwest` client for a remote console API, implementing both `AdSource`
//! and `ModerationGateway`. The remote side speaks the same JSON contract as
//! `mc-api`: paginated `GET /api/v1/ads` and one `POST` per decision.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use mc_core::dto::{AdListResponse, ErrorBody, ModerationResponse};
use mc_core::models::{Ad, Decision};
use mc_core::traits::{AdSource, ModerationGateway, ModerationPayload};
use mc_core::AppError;
use reqwest::{Client, Response, StatusCode};

/// Hard stop for runaway pagination metadata.
const MAX_PAGES: usize = 1_000;

#[derive(Clone)]
pub struct HttpAdSource {
    client: Client,
    base_url: String,
}

impl HttpAdSource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn ads_url(&self) -> String {
        format!("{}/api/v1/ads", self.base_url)
    }

    fn action_url(&self, ad_id: u64, decision: Decision) -> String {
        format!("{}/api/v1/ads/{ad_id}/{}", self.base_url, decision.action_path())
    }
}

/// Turns a non-success response into an error, keeping the remote message
/// and mapping 400 (and 404 on a per-ad call) back onto the domain errors.
async fn check(response: Response, ad_id: Option<u64>) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error.message)
        .unwrap_or(text);

    Err(match (status, ad_id) {
        (StatusCode::BAD_REQUEST, _) => AppError::ValidationError(message).into(),
        (StatusCode::NOT_FOUND, Some(id)) => AppError::ad_not_found(id).into(),
        _ => anyhow!("remote console answered {status}: {message}"),
    })
}

#[async_trait]
impl AdSource for HttpAdSource {
    async fn fetch_ads(&self) -> anyhow::Result<Vec<Ad>> {
        let mut ads = Vec::new();
        let mut page = 1usize;

        loop {
            let response = self
                .client
                .get(self.ads_url())
                .query(&[("page", page)])
                .send()
                .await
                .with_context(|| format!("GET {} page {page}", self.ads_url()))?;
            let body: AdListResponse = check(response, None)
                .await?
                .json()
                .await
                .context("ad list response is not valid JSON")?;

            log::debug!(
                "fetched page {}/{} ({} ads)",
                body.pagination.current_page,
                body.pagination.total_pages,
                body.ads.len()
            );
            ads.extend(body.ads);

            if page >= body.pagination.total_pages || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        Ok(ads)
    }
}

#[async_trait]
impl ModerationGateway for HttpAdSource {
    async fn submit(
        &self,
        ad: &Ad,
        decision: Decision,
        payload: &ModerationPayload,
    ) -> anyhow::Result<Ad> {
        let url = self.action_url(ad.id, decision);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;
        let body: ModerationResponse = check(response, Some(ad.id))
            .await?
            .json()
            .await
            .context("moderation response is not valid JSON")?;

        log::info!("remote console: {} (ad {})", body.message, body.ad.id);
        Ok(body.ad)
    }
}
