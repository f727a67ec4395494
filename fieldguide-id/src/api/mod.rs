//! HTTP API handlers for fieldguide-id

pub mod health;
pub mod identify;
pub mod seen;
pub mod sse;

pub use health::health_routes;
pub use identify::identify_routes;
pub use seen::seen_routes;
pub use sse::event_stream;
