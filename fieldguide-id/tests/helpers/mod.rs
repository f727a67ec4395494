//! Test Helper Utilities
//!
//! Shared utilities for testing fieldguide-id

#![allow(dead_code)]

pub mod db_utils;
pub mod fakes;

pub use db_utils::{create_memory_db, create_test_db, seed_seen};
pub use fakes::{
    build_orchestrator, offline_event, online_event, prediction, vision_response, FakeVisionScorer,
    GatedTaxonSource, StaticTaxonSource,
};
