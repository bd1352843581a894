//! Build-time registration model
//!
//! Callers register waves on a `PipelineBuilder`, nodes on each
//! `WaveRegistry`, then call `finalize()` exactly once to obtain the
//! assembled graph. Both registries share a two-state lifecycle
//! (`Open -> Finalized`); every operation checks it first and fails fast in
//! the wrong state.
//!
//! Registration happens on a single construction thread before any execution
//! begins, so the lifecycle is shared through `Rc<RefCell<_>>` rather than a
//! lock.

mod lifecycle;
mod pipeline;
mod props;
mod wave;

pub use pipeline::{MONITOR_NAME, PipelineBuilder};
pub use props::{JobNames, PipelineProps};
pub use wave::WaveRegistry;
