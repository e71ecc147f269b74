//! JSON bodies of the console API, shared by the server and the HTTP source.

use serde::{Deserialize, Serialize};

use crate::models::Ad;
use crate::query::{QueryPage, PAGE_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdListResponse {
    pub ads: Vec<Ad>,
    pub pagination: Pagination,
}

impl From<QueryPage> for AdListResponse {
    fn from(page: QueryPage) -> Self {
        Self {
            pagination: Pagination {
                current_page: page.page,
                total_pages: page.total_pages,
                total_items: page.total_count,
                items_per_page: PAGE_SIZE,
            },
            ads: page.ads.iter().map(|ad| ad.as_ref().clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationResponse {
    pub message: String,
    pub ad: Ad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}
