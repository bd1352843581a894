use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::node::OrchestrationNode;
use crate::error::{BuildError, Result};

/// Lifecycle shared by a builder and the wave registries it hands out
pub(crate) type SharedLifecycle = Rc<RefCell<Lifecycle>>;

/// Registered wave while the builder is still open
#[derive(Debug)]
pub(crate) struct WaveEntry {
    pub id: String,
    pub nodes: Vec<OrchestrationNode>,
}

impl WaveEntry {
    pub fn new(id: String) -> Self {
        Self {
            id,
            nodes: Vec::new(),
        }
    }
}

/// Two-state registration lifecycle
///
/// `Open` owns every registration; `finalize` moves them out and leaves
/// `Finalized` behind, so nothing registered before finalization stays
/// reachable for mutation.
#[derive(Debug)]
pub(crate) enum Lifecycle {
    Open { waves: Vec<WaveEntry> },
    Finalized,
}

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle::Open { waves: Vec::new() }
    }

    pub fn shared() -> SharedLifecycle {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, Lifecycle::Finalized)
    }

    /// Mutable access to the registrations, refused once finalized
    pub fn open_waves(&mut self, operation: &'static str) -> Result<&mut Vec<WaveEntry>> {
        match self {
            Lifecycle::Open { waves } => Ok(waves),
            Lifecycle::Finalized => Err(BuildError::already_finalized(operation)),
        }
    }

    /// Transition `Open -> Finalized`, returning the registrations
    pub fn finalize(&mut self) -> Result<Vec<WaveEntry>> {
        match std::mem::replace(self, Lifecycle::Finalized) {
            Lifecycle::Open { waves } => Ok(waves),
            Lifecycle::Finalized => Err(BuildError::already_finalized("finalize")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_transitions_once() {
        let mut lifecycle = Lifecycle::new();
        lifecycle
            .open_waves("add_wave")
            .unwrap()
            .push(WaveEntry::new("dev".to_string()));

        let waves = lifecycle.finalize().unwrap();
        assert_eq!(waves.len(), 1);
        assert!(lifecycle.is_finalized());

        let err = lifecycle.finalize().unwrap_err();
        assert_eq!(err, BuildError::already_finalized("finalize"));
    }

    #[test]
    fn test_open_waves_refused_after_finalize() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.finalize().unwrap();

        let err = lifecycle.open_waves("add_node").unwrap_err();
        assert!(err.is_already_finalized());
        assert_eq!(
            err.to_string(),
            "add_node: the pipeline has already been finalized"
        );
    }
}
