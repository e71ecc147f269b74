//! # mc-source-fixture
//!
//! Built-in mock collection implementing `AdSource`.
//! Used for local runs and demos when no upstream console API is available.
//! Decisions are applied in memory through `mc_core::store::LocalGateway`.

use anyhow::Context;
use async_trait::async_trait;
use mc_core::models::Ad;
use mc_core::traits::AdSource;

const SEED: &str = include_str!("../data/ads.json");

pub struct FixtureAdSource {
    raw: &'static str,
}

impl FixtureAdSource {
    /// Source backed by the bundled seed collection.
    pub fn new() -> Self {
        Self { raw: SEED }
    }

    /// Source backed by caller-supplied JSON (an array of ads).
    pub fn from_json(raw: &'static str) -> Self {
        Self { raw }
    }
}

impl Default for FixtureAdSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdSource for FixtureAdSource {
    /// Parses the seed on every call, so a refresh resets the collection.
    async fn fetch_ads(&self) -> anyhow::Result<Vec<Ad>> {
        let ads: Vec<Ad> = serde_json::from_str(self.raw).context("fixture collection is not valid JSON")?;
        log::debug!("fixture source yielded {} ads", ads.len());
        Ok(ads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use mc_core::models::{AdStatus, Decision};
    use mc_core::query::{self, AdQuery, SortKey};
    use mc_core::stats::{self, Period};
    use mc_core::store::{AdStore, LocalGateway};
    use mc_core::traits::ModerationPayload;
    use mc_core::AppError;

    async fn store() -> AdStore {
        AdStore::load(Box::new(FixtureAdSource::new()), Box::new(LocalGateway))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn seed_parses_with_consistent_status() {
        let ads = FixtureAdSource::new().fetch_ads().await.unwrap();
        assert_eq!(ads.len(), 15);
        for ad in &ads {
            assert_eq!(ad.status, ad.derived_status(), "ad {}", ad.id);
        }
    }

    #[tokio::test]
    async fn seed_supports_list_queries() {
        let store = store().await;
        let ads = store.snapshot().await;

        let page = query::query(&ads, &AdQuery::default());
        assert_eq!(page.total_count, 15);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.ads[0].id, 1);

        let cheap_first = AdQuery { sort: SortKey::PriceAsc, page: 2, ..AdQuery::default() };
        let page = query::query(&ads, &cheap_first);
        assert_eq!(page.ads.len(), 5);
        assert_eq!(page.ads.last().unwrap().price, 95_000);
    }

    #[tokio::test]
    async fn rejecting_seed_ad_five() {
        let store = store().await;

        let blank = ModerationPayload {
            moderator: "Модератор Иван".into(),
            reason: Some(String::new()),
            comment: None,
        };
        let err = store.moderate(5, Decision::Rejected, &blank).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(store.get(5).await.unwrap().status, AdStatus::Pending);

        let payload = ModerationPayload {
            reason: Some("Некорректное описание".into()),
            ..blank
        };
        let ad = store.moderate(5, Decision::Rejected, &payload).await.unwrap();
        assert_eq!(ad.moderation_history.len(), 1);
        assert_eq!(ad.status, AdStatus::Rejected);
    }

    #[tokio::test]
    async fn seed_statistics_for_the_last_week() {
        let store = store().await;
        let now: DateTime<FixedOffset> = DateTime::parse_from_rfc3339("2025-11-18T20:00:00+03:00").unwrap();

        let metrics = stats::aggregate(&store.snapshot().await, Period::Last7Days, now);
        // Events from 12.11 to 18.11 inclusive, one per ad.
        assert_eq!(metrics.total_decisions, 6);
        assert_eq!(metrics.ads_reviewed, 6);
        assert_eq!(metrics.avg_review_minutes, 0);
        assert_eq!(metrics.daily_activity.len(), 7);
        assert!(metrics.approved_pct + metrics.rejected_pct <= 100);
    }
}
