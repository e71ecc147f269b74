//! mod-console/crates/mc-api/src/middleware.rs Middleware
//!
//! Request logging and CORS for the console API.

use actix_cors::Cors;
use actix_web::middleware::Logger;

/// Request logger in the default format:
/// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

// The console front end is usually served from a different origin in development.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST"])
        .allow_any_header()
        .max_age(3600)
}
