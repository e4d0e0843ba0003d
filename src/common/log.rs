//! Structured logging emitting JSON lines through `tracing`.
//!
//! Events across the crate carry `ev` (event name) and, where it applies,
//! `code` and `dur_ms` fields so log consumers can filter without parsing
//! messages.

use tracing::Level;

/// Map the numeric level from [`AppCfg`](crate::common::config::AppCfg) to a tracing level.
pub fn level_for(raw: u8) -> Level {
    match raw {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the JSON-lines subscriber. Returns `false` when one is already installed.
pub fn init(raw_level: u8) -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_max_level(level_for(raw_level))
        .with_target(true)
        .with_current_span(false)
        .try_init()
        .is_ok()
}
