//! Core domain types
//!
//! This module contains the domain structures shared across Flotilla crates.
//! The builder produces them, the runner consumes them, and the client crate
//! moves them over the wire.

pub mod asset;
pub mod build;
pub mod job;
pub mod node;
