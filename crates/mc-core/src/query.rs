//! # Query Pipeline
//!
//! Filter → sort → paginate over a snapshot of the collection. Pure: the
//! same `(collection, params)` always yields the same page in the same order.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{Ad, AdStatus};

/// Fixed page length of the ad list.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
    Rejected,
    RequestChanges,
}

impl StatusFilter {
    fn matches(self, status: AdStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == AdStatus::Pending,
            StatusFilter::Approved => status == AdStatus::Approved,
            StatusFilter::Rejected => status == AdStatus::Rejected,
            StatusFilter::RequestChanges => status == AdStatus::RequestChanges,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    DateDesc,
    DateAsc,
    PriceAsc,
    PriceDesc,
    PriorityDesc,
}

/// Parameters of one list request. Missing fields fall back to "no filter",
/// newest first, page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdQuery {
    pub search: String,
    pub status: StatusFilter,
    /// `"all"` or an exact category label
    pub category: String,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub sort: SortKey,
    pub page: usize,
}

impl Default for AdQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            category: "all".to_string(),
            min_price: None,
            max_price: None,
            sort: SortKey::DateDesc,
            page: 1,
        }
    }
}

impl AdQuery {
    fn matches(&self, ad: &Ad, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            if !ad.title.to_lowercase().contains(needle) {
                return false;
            }
        }
        if !self.status.matches(ad.status) {
            return false;
        }
        if self.category != "all" && !self.category.is_empty() && ad.category != self.category {
            return false;
        }
        if self.min_price.is_some_and(|min| ad.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| ad.price > max) {
            return false;
        }
        true
    }
}

/// One page of results plus the pre-pagination match count.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub ads: Vec<Arc<Ad>>,
    pub total_count: usize,
    /// The page actually served after clamping
    pub page: usize,
    pub total_pages: usize,
}

/// Number of pages needed for `total_count` matches; never less than 1.
pub fn total_pages(total_count: usize) -> usize {
    total_count.div_ceil(PAGE_SIZE).max(1)
}

fn compare(sort: SortKey, a: &Ad, b: &Ad) -> Ordering {
    let primary = match sort {
        SortKey::DateDesc => b.created_at.cmp(&a.created_at),
        SortKey::DateAsc => a.created_at.cmp(&b.created_at),
        SortKey::PriceAsc => a.price.cmp(&b.price),
        SortKey::PriceDesc => b.price.cmp(&a.price),
        SortKey::PriorityDesc => b
            .is_urgent()
            .cmp(&a.is_urgent())
            .then_with(|| b.created_at.cmp(&a.created_at)),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Runs the list query over `ads`.
pub fn query(ads: &[Arc<Ad>], params: &AdQuery) -> QueryPage {
    let needle = params.search.trim();
    let needle = (!needle.is_empty()).then(|| needle.to_lowercase());

    let mut matched: Vec<Arc<Ad>> = ads
        .iter()
        .filter(|ad| params.matches(ad, needle.as_deref()))
        .cloned()
        .collect();

    matched.sort_by(|a, b| compare(params.sort, a, b));

    let total_count = matched.len();
    let total_pages = total_pages(total_count);
    let page = params.page.clamp(1, total_pages);
    let start = (page - 1) * PAGE_SIZE;

    let ads = matched.into_iter().skip(start).take(PAGE_SIZE).collect();

    QueryPage {
        ads,
        total_count,
        page,
        total_pages,
    }
}

/// Distinct category labels present in the collection, sorted.
pub fn categories(ads: &[Arc<Ad>]) -> Vec<String> {
    ads.iter()
        .map(|ad| ad.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
