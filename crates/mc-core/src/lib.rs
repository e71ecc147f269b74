//! mod-console/crates/mc-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the moderation console:
//! the ad model, the list query, the moderation statistics, the moderation
//! command and the store that ties them to an ad source.

pub mod dto;
pub mod error;
pub mod models;
pub mod moderation;
pub mod query;
pub mod stats;
pub mod store;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
