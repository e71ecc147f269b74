//! # Moderation Statistics
//!
//! Flattens every ad's history into a list of moderation events, keeps the
//! ones inside the reporting window and folds them into dashboard metrics.
//! Calendar days are taken in the timezone of the supplied `now`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Ad, Decision};

/// Reporting window of the statistics dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "today")]
    Today,
    #[default]
    #[serde(rename = "last7days", alias = "7d")]
    Last7Days,
    #[serde(rename = "last30days", alias = "30d")]
    Last30Days,
}

impl Period {
    /// Number of calendar days covered, today included.
    pub fn days(self) -> u64 {
        match self {
            Period::Today => 1,
            Period::Last7Days => 7,
            Period::Last30Days => 30,
        }
    }

    /// Local date of the first day in the window.
    pub fn start_date(self, now: &DateTime<FixedOffset>) -> NaiveDate {
        let today = now.date_naive();
        today.checked_sub_days(Days::new(self.days() - 1)).unwrap_or(today)
    }

    /// Midnight of the first day in the window, as an absolute instant.
    pub fn start(self, now: &DateTime<FixedOffset>) -> DateTime<Utc> {
        let midnight = self.start_date(now).and_time(NaiveTime::MIN);
        now.offset()
            .from_local_datetime(&midnight)
            .single()
            .map(|at| at.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionCounts {
    pub approved: usize,
    pub rejected: usize,
    pub request_changes: usize,
}

impl DecisionCounts {
    pub fn total(&self) -> usize {
        self.approved + self.rejected + self.request_changes
    }

    fn record(&mut self, decision: Decision) {
        match decision {
            Decision::Approved => self.approved += 1,
            Decision::Rejected => self.rejected += 1,
            Decision::RequestChanges => self.request_changes += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: NaiveDate,
    /// `dd.mm` label for chart axes
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryActivity {
    pub category: String,
    pub count: usize,
}

/// Everything the statistics dashboard shows for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationMetrics {
    pub period: Period,
    pub period_start: DateTime<Utc>,
    /// Distinct ads with at least one event in the window
    pub ads_reviewed: usize,
    pub decisions: DecisionCounts,
    pub total_decisions: usize,
    pub approved_pct: u32,
    pub rejected_pct: u32,
    pub avg_review_minutes: i64,
    pub daily_activity: Vec<DailyActivity>,
    pub categories: Vec<CategoryActivity>,
}

/// A history entry tagged with its owning ad.
#[derive(Debug, Clone)]
struct ModerationEvent<'a> {
    ad_id: u64,
    category: &'a str,
    decision: Decision,
    at: DateTime<Utc>,
}

fn collect_events(ads: &[Arc<Ad>], since: DateTime<Utc>, until: DateTime<Utc>) -> Vec<ModerationEvent<'_>> {
    let mut events = Vec::new();
    for ad in ads {
        for item in &ad.moderation_history {
            let Some(at) = item.timestamp.instant() else {
                log::warn!(
                    "skipping history entry {} of ad {}: unparseable timestamp",
                    item.id,
                    ad.id
                );
                continue;
            };
            if at < since || at > until {
                continue;
            }
            events.push(ModerationEvent {
                ad_id: ad.id,
                category: &ad.category,
                decision: item.decision,
                at,
            });
        }
    }
    events
}

fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Mean time between the first and the last event of each ad with two or
/// more events, in whole minutes.
fn average_review_minutes(events: &[ModerationEvent<'_>]) -> i64 {
    let mut spans: HashMap<u64, (DateTime<Utc>, DateTime<Utc>, usize)> = HashMap::new();
    for event in events {
        spans
            .entry(event.ad_id)
            .and_modify(|(first, last, n)| {
                *first = (*first).min(event.at);
                *last = (*last).max(event.at);
                *n += 1;
            })
            .or_insert((event.at, event.at, 1));
    }

    let (sum_ms, reviewed) = spans
        .values()
        .filter(|(_, _, n)| *n >= 2)
        .fold((0i64, 0i64), |(sum, count), (first, last, _)| {
            (sum + (*last - *first).num_milliseconds(), count + 1)
        });

    if reviewed == 0 {
        return 0;
    }
    (sum_ms as f64 / reviewed as f64 / 60_000.0).round() as i64
}

fn daily_activity(
    events: &[ModerationEvent<'_>],
    period: Period,
    now: &DateTime<FixedOffset>,
) -> Vec<DailyActivity> {
    let offset = *now.offset();
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    for event in events {
        *per_day.entry(event.at.with_timezone(&offset).date_naive()).or_default() += 1;
    }

    let first = period.start_date(now);
    (0..period.days())
        .filter_map(|i| first.checked_add_days(Days::new(i)))
        .map(|date| DailyActivity {
            date,
            label: date.format("%d.%m").to_string(),
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

fn category_activity(events: &[ModerationEvent<'_>]) -> Vec<CategoryActivity> {
    let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events {
        *per_category.entry(event.category).or_default() += 1;
    }
    per_category
        .into_iter()
        .map(|(category, count)| CategoryActivity {
            category: category.to_string(),
            count,
        })
        .collect()
}

/// Computes the dashboard metrics for `period` ending at `now`.
pub fn aggregate(ads: &[Arc<Ad>], period: Period, now: DateTime<FixedOffset>) -> ModerationMetrics {
    let period_start = period.start(&now);
    let events = collect_events(ads, period_start, now.with_timezone(&Utc));

    let ads_reviewed = events.iter().map(|e| e.ad_id).collect::<HashSet<_>>().len();

    let mut decisions = DecisionCounts::default();
    for event in &events {
        decisions.record(event.decision);
    }
    let total_decisions = decisions.total();

    let approved_pct = percentage(decisions.approved, total_decisions);
    // Two halves rounding up together would overshoot 100.
    let rejected_pct = percentage(decisions.rejected, total_decisions).min(100 - approved_pct);

    ModerationMetrics {
        period,
        period_start,
        ads_reviewed,
        decisions,
        total_decisions,
        approved_pct,
        rejected_pct,
        avg_review_minutes: average_review_minutes(&events),
        daily_activity: daily_activity(&events, period, &now),
        categories: category_activity(&events),
    }
}
