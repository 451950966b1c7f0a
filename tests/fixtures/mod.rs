//! Test Fixtures Module
//!
//! - Audio fixtures (programmatically generated)
//! - Booking fixtures

// Not every test binary uses every fixture
#![allow(dead_code)]

pub mod audio_fixtures;
pub mod booking_fixtures;

pub use audio_fixtures::*;
pub use booking_fixtures::*;
