//! HTTP API handlers for autolist-ai

pub mod advisor;
pub mod analyze;
pub mod augment;
pub mod health;
pub mod listing;

pub use advisor::advisor_routes;
pub use analyze::analyze_routes;
pub use augment::augment_routes;
pub use health::health_routes;
pub use listing::listing_routes;
