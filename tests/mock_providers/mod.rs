//! Mock Providers
//!
//! - `in_memory`: audio backend and realtime connector fakes driven directly
//!   by the test, for lifecycle scenarios
//! - `gemini_live_mock`: a WebSocket server speaking the Gemini Live wire
//!   protocol, for exercising the real connector

// Not every test binary uses every mock
#![allow(dead_code)]

pub mod gemini_live_mock;
pub mod in_memory;

use std::time::Duration;

/// Poll `condition` until it holds, yielding to spawned tasks in between.
///
/// Works under paused time as well: each sleep auto-advances the clock.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    condition()
}
