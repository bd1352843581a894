//! Data Transfer Objects
//!
//! This module contains the payloads exchanged with remote services (the job
//! service and the monitor invocation) and the serialized form of the
//! finalized orchestration graph.

pub mod graph;
pub mod job;
pub mod monitor;
