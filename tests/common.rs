#![allow(dead_code)]
//! Shared helpers for engine integration tests.

use jiff::Timestamp;
use taskql::*;

pub fn fixed_now() -> Timestamp {
    "2026-10-19T10:00:00Z".parse().unwrap()
}

pub fn engine_at(timezone_offset_hours: i8) -> QueryEngine {
    let config = EngineConfig {
        timezone_offset_hours,
        ..EngineConfig::default()
    };
    QueryEngine::new(config).unwrap().with_now(fixed_now())
}

pub fn plan_ok(engine: &QueryEngine, query: &str) -> QueryPlan {
    engine.plan(query).unwrap()
}
