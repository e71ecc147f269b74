//! # Moderation Command
//!
//! The only write path into the collection. Produces a new `Ad` value and
//! never touches the input, so callers can swap it in as a whole record.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Ad, Decision, ModerationHistoryItem, RejectReason};
use crate::traits::ModerationPayload;

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checks the payload against the rules every submission must satisfy.
pub fn validate(decision: Decision, payload: &ModerationPayload) -> Result<()> {
    if payload.moderator.trim().is_empty() {
        return Err(AppError::ValidationError("moderator is required".into()));
    }
    if decision == Decision::Rejected && non_blank(&payload.reason).is_none() {
        return Err(AppError::ValidationError(
            "a reason is required when rejecting an ad".into(),
        ));
    }
    Ok(())
}

/// Console-side rule: the generic "other" reason needs a descriptive comment.
pub fn validate_reason_comment(decision: Decision, payload: &ModerationPayload) -> Result<()> {
    let is_other = payload
        .reason
        .as_deref()
        .and_then(RejectReason::from_label)
        .is_some_and(|r| r == RejectReason::Other);

    if decision == Decision::Rejected && is_other && non_blank(&payload.comment).is_none() {
        return Err(AppError::ValidationError(
            "describe the problem when the reason is \"other\"".into(),
        ));
    }
    Ok(())
}

/// Returns a copy of `ad` with the decision recorded at `at`.
pub fn apply(ad: &Ad, decision: Decision, payload: &ModerationPayload, at: DateTime<Utc>) -> Result<Ad> {
    validate(decision, payload)?;

    let item = ModerationHistoryItem {
        id: ad.moderation_history.len() as u32 + 1,
        moderator: payload.moderator.trim().to_string(),
        decision,
        reason: non_blank(&payload.reason),
        comment: non_blank(&payload.comment),
        timestamp: at.into(),
    };

    let mut updated = ad.clone();
    updated.moderation_history.insert(0, item);
    updated.status = updated.derived_status();
    Ok(updated)
}

/// Looks up `ad_id` in the collection and applies the decision to it.
pub fn moderate(
    ads: &[Arc<Ad>],
    ad_id: u64,
    decision: Decision,
    payload: &ModerationPayload,
    at: DateTime<Utc>,
) -> Result<Ad> {
    let ad = ads
        .iter()
        .find(|ad| ad.id == ad_id)
        .ok_or_else(|| AppError::ad_not_found(ad_id))?;
    apply(ad, decision, payload, at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdStatus, Priority, Seller};
    use chrono::TimeZone;

    fn ad(id: u64) -> Arc<Ad> {
        Arc::new(Ad {
            id,
            title: "PlayStation 5".into(),
            description: String::new(),
            price: 52_000,
            category: "Игры и приставки".into(),
            priority: Priority::Urgent,
            status: AdStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2025, 11, 16, 14, 20, 0).unwrap(),
            images: vec![],
            characteristics: vec![],
            seller: Seller {
                name: "Дмитрий".into(),
                rating: 4.7,
                ads_count: 5,
                registered_at: Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap(),
            },
            moderation_history: vec![],
        })
    }

    fn payload(reason: Option<&str>, comment: Option<&str>) -> ModerationPayload {
        ModerationPayload {
            moderator: "Модератор Иван".into(),
            reason: reason.map(str::to_string),
            comment: comment.map(str::to_string),
        }
    }

    #[test]
    fn rejection_without_reason_fails() {
        let ads = vec![ad(5)];
        let err = moderate(&ads, 5, Decision::Rejected, &payload(Some(""), None), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(ads[0].moderation_history.is_empty());
        assert_eq!(ads[0].status, AdStatus::Pending);
    }

    #[test]
    fn rejection_with_reason_records_history() {
        let ads = vec![ad(5)];
        let updated = moderate(
            &ads,
            5,
            Decision::Rejected,
            &payload(Some("Некорректное описание"), None),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(updated.moderation_history.len(), 1);
        assert_eq!(updated.status, AdStatus::Rejected);
        assert_eq!(updated.moderation_history[0].id, 1);
        assert_eq!(updated.moderation_history[0].reason.as_deref(), Some("Некорректное описание"));
    }

    #[test]
    fn unknown_ad_is_not_found() {
        let ads = vec![ad(5)];
        let err = moderate(&ads, 99, Decision::Approved, &payload(None, None), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_, _)));
    }

    #[test]
    fn newest_entry_goes_first_with_next_id() {
        let first = apply(&ad(1), Decision::RequestChanges, &payload(None, Some("Добавьте фото")), Utc::now()).unwrap();
        let second = apply(&first, Decision::Approved, &payload(None, None), Utc::now()).unwrap();

        assert_eq!(second.moderation_history.len(), 2);
        assert_eq!(second.moderation_history[0].id, 2);
        assert_eq!(second.moderation_history[0].decision, Decision::Approved);
        assert_eq!(second.moderation_history[1].decision, Decision::RequestChanges);
        assert_eq!(second.status, AdStatus::Approved);
        assert_eq!(first.status, AdStatus::RequestChanges);
    }

    #[test]
    fn blank_moderator_is_rejected() {
        let mut p = payload(None, None);
        p.moderator = "  ".into();
        assert!(matches!(validate(Decision::Approved, &p), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn other_reason_needs_comment() {
        assert!(validate_reason_comment(Decision::Rejected, &payload(Some("Другое"), None)).is_err());
        assert!(validate_reason_comment(Decision::Rejected, &payload(Some("other"), Some("  "))).is_err());
        assert!(validate_reason_comment(Decision::Rejected, &payload(Some("Другое"), Some("Спам"))).is_ok());
        assert!(validate_reason_comment(Decision::Rejected, &payload(Some("Проблемы с фото"), None)).is_ok());
    }
}
