//! # mc-api
//!
//! The web routing and orchestration layer for the moderation console.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the routes for the moderation console.
///
/// # Developer Note
/// Everything lives under `/api/v1/` except the health probe, so the binary
/// can serve a front end from `/` without clashing.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health)).service(
        web::scope("/api/v1")
            // The list view
            .route("/ads", web::get().to(handlers::list_ads))
            .route("/ads/refresh", web::post().to(handlers::refresh))
            // The detail view and its actions
            .route("/ads/{id}", web::get().to(handlers::get_ad))
            .route("/ads/{id}/approve", web::post().to(handlers::approve))
            .route("/ads/{id}/reject", web::post().to(handlers::reject))
            .route("/ads/{id}/request-changes", web::post().to(handlers::request_changes))
            // The statistics dashboard
            .route("/stats/summary", web::get().to(handlers::stats_summary))
            .route("/categories", web::get().to(handlers::categories)),
    );
}
