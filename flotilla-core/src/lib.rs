//! Flotilla Core
//!
//! Core types and abstractions for the Flotilla deployment orchestrator.
//!
//! This crate contains:
//! - Domain types: Jobs, orchestration nodes, post-deployment actions and the
//!   shared artifact location
//! - Builder: the build-time registration model (`PipelineBuilder` and
//!   `WaveRegistry`) that is finalized exactly once
//! - DTOs: the assembled graph and the payloads exchanged with remote services

pub mod builder;
pub mod domain;
pub mod dto;
pub mod error;

pub use builder::{JobNames, PipelineBuilder, PipelineProps, WaveRegistry};
pub use error::{BuildError, Result};
