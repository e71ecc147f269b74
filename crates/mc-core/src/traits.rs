//! # Core Traits (Ports)
//!
//! Any ad source plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::models::{Ad, Decision};

/// What a moderator submits alongside a decision.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModerationPayload {
    pub moderator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Read side: where the collection comes from.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AdSource: Send + Sync {
    /// Retrieves the full ad collection.
    async fn fetch_ads(&self) -> anyhow::Result<Vec<Ad>>;
}

/// Write side: where moderation decisions are submitted.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ModerationGateway: Send + Sync {
    /// Submits a decision for `ad` and returns the ad as it stands afterwards.
    async fn submit(
        &self,
        ad: &Ad,
        decision: Decision,
        payload: &ModerationPayload,
    ) -> anyhow::Result<Ad>;
}
