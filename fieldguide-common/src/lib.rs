//! # Fieldguide Common Library
//!
//! Shared code for Fieldguide services including:
//! - Error type and result alias
//! - Event types (FieldguideEvent enum) and the broadcast EventBus
//! - TOML configuration loading and root folder resolution
//! - SSE stream helpers
//! - Date/time helpers for seen dates and service downtime windows

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
