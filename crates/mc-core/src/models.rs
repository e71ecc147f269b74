//! # Domain Models
//!
//! These structs represent the entities the moderation console works on.
//! Field names follow the camelCase JSON the console API exchanges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Urgency flag set by the seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    Normal,
    Urgent,
}

/// Moderation state of an ad. Always derived from the latest history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdStatus {
    Pending,
    Approved,
    Rejected,
    RequestChanges,
}

/// The verdict a moderator hands down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    Approved,
    Rejected,
    RequestChanges,
}

impl Decision {
    /// The status an ad ends up in after this decision.
    pub fn resulting_status(self) -> AdStatus {
        match self {
            Decision::Approved => AdStatus::Approved,
            Decision::Rejected => AdStatus::Rejected,
            Decision::RequestChanges => AdStatus::RequestChanges,
        }
    }

    /// Path segment of the submission endpoint for this decision.
    pub fn action_path(self) -> &'static str {
        match self {
            Decision::Approved => "approve",
            Decision::Rejected => "reject",
            Decision::RequestChanges => "request-changes",
        }
    }
}

/// When a history entry was recorded.
///
/// Well-formed values deserialize into `At`. Anything else coming from an
/// upstream feed is kept verbatim so the history stays displayable, but it
/// never takes part in time computations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    At(DateTime<Utc>),
    Malformed(String),
}

impl EventTime {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTime::At(at) => Some(*at),
            EventTime::Malformed(_) => None,
        }
    }
}

impl From<DateTime<Utc>> for EventTime {
    fn from(at: DateTime<Utc>) -> Self {
        EventTime::At(at)
    }
}

/// One audit record of a moderation action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationHistoryItem {
    /// Sequential within the owning ad, starting at 1
    pub id: u32,
    pub moderator: String,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: EventTime,
}

/// Denormalized snapshot of the ad's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub name: String,
    /// 0.0 to 5.0
    pub rating: f32,
    pub ads_count: u32,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characteristic {
    pub key: String,
    pub value: String,
}

/// A single classified listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub price: u64,
    pub category: String,
    pub priority: Priority,
    pub status: AdStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub characteristics: Vec<Characteristic>,
    pub seller: Seller,
    /// Newest entry first
    #[serde(default)]
    pub moderation_history: Vec<ModerationHistoryItem>,
}

impl Ad {
    /// Status as implied by the history: the latest decision, or pending.
    pub fn derived_status(&self) -> AdStatus {
        self.moderation_history
            .first()
            .map(|item| item.decision.resulting_status())
            .unwrap_or(AdStatus::Pending)
    }

    pub fn is_urgent(&self) -> bool {
        self.priority == Priority::Urgent
    }
}

/// Preset rejection reasons offered to moderators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    ProhibitedItem,
    WrongCategory,
    IncorrectDescription,
    PhotoProblems,
    SuspectedFraud,
    Other,
}

impl RejectReason {
    pub const ALL: [RejectReason; 6] = [
        RejectReason::ProhibitedItem,
        RejectReason::WrongCategory,
        RejectReason::IncorrectDescription,
        RejectReason::PhotoProblems,
        RejectReason::SuspectedFraud,
        RejectReason::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RejectReason::ProhibitedItem => "Запрещённый товар",
            RejectReason::WrongCategory => "Неверная категория",
            RejectReason::IncorrectDescription => "Некорректное описание",
            RejectReason::PhotoProblems => "Проблемы с фото",
            RejectReason::SuspectedFraud => "Подозрение на мошенничество",
            RejectReason::Other => "Другое",
        }
    }

    /// Matches a free-text reason against the preset labels.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("other") {
            return Some(RejectReason::Other);
        }
        Self::ALL.into_iter().find(|r| r.label() == label)
    }
}
