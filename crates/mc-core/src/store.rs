//! # AdStore
//!
//! Owns the in-memory collection and is the only thing allowed to change it.
//! Readers take a snapshot (a cheap clone of `Arc`s); writes swap a single
//! record's `Arc`, so a snapshot never sees a half-updated ad and every
//! untouched ad stays pointer-equal across versions. Moderation commands run
//! one at a time, so each one builds on the record the previous one wrote.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::error::{AppError, Result};
use crate::models::{Ad, Decision};
use crate::moderation;
use crate::traits::{AdSource, ModerationGateway, ModerationPayload};

pub type Snapshot = Arc<Vec<Arc<Ad>>>;

pub struct AdStore {
    ads: RwLock<Snapshot>,
    commands: Mutex<()>,
    source: Box<dyn AdSource>,
    gateway: Box<dyn ModerationGateway>,
}

fn prepare(ads: Vec<Ad>) -> Result<Vec<Arc<Ad>>> {
    let mut seen = HashSet::with_capacity(ads.len());
    ads.into_iter()
        .map(|mut ad| {
            if !seen.insert(ad.id) {
                return Err(AppError::Parse(format!("duplicate ad id {}", ad.id)));
            }
            let derived = ad.derived_status();
            if ad.status != derived {
                log::warn!(
                    "ad {} arrived with status {:?}, history says {:?}",
                    ad.id,
                    ad.status,
                    derived
                );
                ad.status = derived;
            }
            Ok(Arc::new(ad))
        })
        .collect()
}

impl AdStore {
    /// Creates an empty store. Call [`AdStore::refresh`] to populate it.
    pub fn new(source: Box<dyn AdSource>, gateway: Box<dyn ModerationGateway>) -> Self {
        Self {
            ads: RwLock::new(Arc::new(Vec::new())),
            commands: Mutex::new(()),
            source,
            gateway,
        }
    }

    /// Creates a store and performs the initial load.
    pub async fn load(source: Box<dyn AdSource>, gateway: Box<dyn ModerationGateway>) -> Result<Self> {
        let store = Self::new(source, gateway);
        store.refresh().await?;
        Ok(store)
    }

    /// Re-fetches the whole collection from the source.
    /// On failure the previous collection is kept as is.
    pub async fn refresh(&self) -> Result<usize> {
        let fetched = self.source.fetch_ads().await.map_err(|e| {
            log::warn!("ad retrieval failed, keeping last known collection: {e:#}");
            AppError::Transport(e.to_string())
        })?;
        let fresh = prepare(fetched)?;
        let count = fresh.len();

        *self.ads.write().await = Arc::new(fresh);
        log::info!("loaded {count} ads");
        Ok(count)
    }

    /// The current collection. Later writes do not affect a taken snapshot.
    pub async fn snapshot(&self) -> Snapshot {
        Arc::clone(&*self.ads.read().await)
    }

    pub async fn get(&self, ad_id: u64) -> Option<Arc<Ad>> {
        self.ads.read().await.iter().find(|ad| ad.id == ad_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.ads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Runs the moderation command through the gateway and, on success,
    /// replaces the ad's record with the returned one.
    ///
    /// Commands are serialised for their whole duration, gateway call
    /// included. A refresh that replaces the record mid-flight makes the
    /// command fail with [`AppError::Conflict`] instead of overwriting it.
    pub async fn moderate(
        &self,
        ad_id: u64,
        decision: Decision,
        payload: &ModerationPayload,
    ) -> Result<Arc<Ad>> {
        let _command = self.commands.lock().await;

        let current = self.get(ad_id).await.ok_or_else(|| AppError::ad_not_found(ad_id))?;
        moderation::validate(decision, payload)?;

        let mut updated = self
            .gateway
            .submit(&current, decision, payload)
            .await
            .map_err(|e| {
                log::warn!("moderation of ad {ad_id} failed: {e:#}");
                match e.downcast::<AppError>() {
                    Ok(app) => app,
                    Err(other) => AppError::Transport(other.to_string()),
                }
            })?;

        if updated.id != ad_id {
            return Err(AppError::Transport(format!(
                "gateway answered for ad {} instead of {ad_id}",
                updated.id
            )));
        }
        updated.status = updated.derived_status();
        let updated = Arc::new(updated);

        let mut guard = self.ads.write().await;
        let mut next: Vec<Arc<Ad>> = (**guard).clone();
        let slot = next
            .iter_mut()
            .find(|ad| ad.id == ad_id)
            .ok_or_else(|| AppError::ad_not_found(ad_id))?;
        if !Arc::ptr_eq(slot, &current) {
            log::warn!("ad {ad_id} was reloaded while a {decision:?} decision was in flight");
            return Err(AppError::Conflict(format!(
                "ad {ad_id} changed while the decision was being submitted"
            )));
        }
        *slot = Arc::clone(&updated);
        *guard = Arc::new(next);
        drop(guard);

        log::info!(
            "ad {ad_id} moderated by {}: {:?}",
            payload.moderator,
            decision
        );
        Ok(updated)
    }
}

/// Gateway that applies decisions to the local copy only.
pub struct LocalGateway;

#[async_trait::async_trait]
impl ModerationGateway for LocalGateway {
    async fn submit(
        &self,
        ad: &Ad,
        decision: Decision,
        payload: &ModerationPayload,
    ) -> anyhow::Result<Ad> {
        Ok(moderation::apply(ad, decision, payload, Utc::now())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdStatus, Priority, Seller};
    use crate::traits::{MockAdSource, MockModerationGateway};
    use chrono::TimeZone;

    fn ad(id: u64) -> Ad {
        Ad {
            id,
            title: format!("Ad {id}"),
            description: String::new(),
            price: 10_000,
            category: "Мебель".into(),
            priority: Priority::Normal,
            status: AdStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2025, 11, id as u32, 9, 0, 0).unwrap(),
            images: vec![],
            characteristics: vec![],
            seller: Seller {
                name: "Екатерина".into(),
                rating: 4.6,
                ads_count: 9,
                registered_at: Utc.with_ymd_and_hms(2020, 9, 5, 0, 0, 0).unwrap(),
            },
            moderation_history: vec![],
        }
    }

    fn source_with(ads: Vec<Ad>) -> MockAdSource {
        let mut source = MockAdSource::new();
        source.expect_fetch_ads().returning(move || Ok(ads.clone()));
        source
    }

    fn rejection(reason: &str) -> ModerationPayload {
        ModerationPayload {
            moderator: "Модератор Лена".into(),
            reason: Some(reason.into()),
            comment: None,
        }
    }

    #[tokio::test]
    async fn moderation_replaces_only_the_target_record() {
        let store = AdStore::load(
            Box::new(source_with(vec![ad(1), ad(2), ad(3)])),
            Box::new(LocalGateway),
        )
        .await
        .unwrap();
        let before = store.snapshot().await;

        let updated = store
            .moderate(2, Decision::Rejected, &rejection("Неверная категория"))
            .await
            .unwrap();
        assert_eq!(updated.status, AdStatus::Rejected);

        let after = store.snapshot().await;
        assert!(Arc::ptr_eq(&before[0], &after[0]));
        assert!(Arc::ptr_eq(&before[2], &after[2]));
        assert!(!Arc::ptr_eq(&before[1], &after[1]));
        // the old snapshot is untouched
        assert_eq!(before[1].status, AdStatus::Pending);
    }

    #[tokio::test]
    async fn validation_failure_skips_gateway() {
        let mut gateway = MockModerationGateway::new();
        gateway.expect_submit().never();

        let store = AdStore::load(Box::new(source_with(vec![ad(5)])), Box::new(gateway))
            .await
            .unwrap();
        let err = store.moderate(5, Decision::Rejected, &rejection(" ")).await.unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(store.get(5).await.unwrap().moderation_history.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_keeps_last_known_good() {
        let mut gateway = MockModerationGateway::new();
        gateway
            .expect_submit()
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("connection refused")));

        let store = AdStore::load(Box::new(source_with(vec![ad(1)])), Box::new(gateway))
            .await
            .unwrap();
        let before = store.snapshot().await;

        let err = store.moderate(1, Decision::Approved, &rejection("n/a")).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
        assert!(Arc::ptr_eq(&before, &store.snapshot().await));
    }

    #[tokio::test]
    async fn unknown_ad_is_not_found() {
        let store = AdStore::load(Box::new(source_with(vec![ad(1)])), Box::new(LocalGateway))
            .await
            .unwrap();
        let err = store
            .moderate(42, Decision::Approved, &rejection("n/a"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[tokio::test]
    async fn unknown_ad_wins_over_invalid_payload() {
        let mut gateway = MockModerationGateway::new();
        gateway.expect_submit().never();

        let store = AdStore::load(Box::new(source_with(vec![ad(1)])), Box::new(gateway))
            .await
            .unwrap();
        let err = store.moderate(42, Decision::Rejected, &rejection("")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    /// Hands control back to the runtime before applying the decision.
    struct YieldingGateway;

    #[async_trait::async_trait]
    impl ModerationGateway for YieldingGateway {
        async fn submit(
            &self,
            ad: &Ad,
            decision: Decision,
            payload: &ModerationPayload,
        ) -> anyhow::Result<Ad> {
            tokio::task::yield_now().await;
            LocalGateway.submit(ad, decision, payload).await
        }
    }

    #[tokio::test]
    async fn overlapping_decisions_both_land_in_history() {
        let store = AdStore::load(Box::new(source_with(vec![ad(1)])), Box::new(YieldingGateway))
            .await
            .unwrap();
        let changes = ModerationPayload {
            moderator: "Модератор Лена".into(),
            reason: None,
            comment: Some("Добавьте фото".into()),
        };
        let approval = ModerationPayload {
            moderator: "Модератор Иван".into(),
            reason: None,
            comment: None,
        };

        let (first, second) = tokio::join!(
            store.moderate(1, Decision::RequestChanges, &changes),
            store.moderate(1, Decision::Approved, &approval),
        );
        first.unwrap();
        let second = second.unwrap();

        let stored = store.get(1).await.unwrap();
        assert!(Arc::ptr_eq(&stored, &second));
        let history: Vec<_> = stored
            .moderation_history
            .iter()
            .map(|item| (item.id, item.decision))
            .collect();
        assert_eq!(history, vec![(2, Decision::Approved), (1, Decision::RequestChanges)]);
        assert_eq!(stored.status, AdStatus::Approved);
    }

    #[tokio::test]
    async fn refresh_during_decision_is_a_conflict() {
        let store = AdStore::load(Box::new(source_with(vec![ad(1)])), Box::new(YieldingGateway))
            .await
            .unwrap();
        let approval = ModerationPayload {
            moderator: "Модератор Иван".into(),
            reason: None,
            comment: None,
        };

        let (decision, refresh) = tokio::join!(
            store.moderate(1, Decision::Approved, &approval),
            store.refresh(),
        );
        assert_eq!(refresh.unwrap(), 1);
        assert!(matches!(decision, Err(AppError::Conflict(_))));
        assert!(store.get(1).await.unwrap().moderation_history.is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_collection() {
        let mut source = MockAdSource::new();
        let mut calls = 0;
        source.expect_fetch_ads().returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(vec![ad(1), ad(2)])
            } else {
                Err(anyhow::anyhow!("503 Service Unavailable"))
            }
        });

        let store = AdStore::load(Box::new(source), Box::new(LocalGateway)).await.unwrap();
        assert!(matches!(store.refresh().await, Err(AppError::Transport(_))));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn load_recomputes_status_and_rejects_duplicates() {
        let mut stale = ad(1);
        stale.status = AdStatus::Approved;
        let store = AdStore::load(Box::new(source_with(vec![stale])), Box::new(LocalGateway))
            .await
            .unwrap();
        assert_eq!(store.get(1).await.unwrap().status, AdStatus::Pending);

        let dup = AdStore::load(Box::new(source_with(vec![ad(1), ad(1)])), Box::new(LocalGateway)).await;
        assert!(matches!(dup, Err(AppError::Parse(_))));
    }
}
