use std::fmt;

use serde::{Deserialize, Serialize};

/// One irreversible step of the build sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Blank,
    Bore,
    Recess,
    Fillet,
    Finalize,
}

impl Stage {
    /// Stages in execution order.
    pub const ORDER: [Stage; 5] = [
        Stage::Blank,
        Stage::Bore,
        Stage::Recess,
        Stage::Fillet,
        Stage::Finalize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Blank => "blank",
            Stage::Bore => "bore",
            Stage::Recess => "recess",
            Stage::Fillet => "fillet",
            Stage::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the fillet stage did to the plate's edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeTreatment {
    Filleted,
    /// Chamfer radius was not positive.
    Skipped,
    /// The backend has no fillet operator; edges are left sharp.
    Unsupported,
}

/// Build lifecycle. Transitions only move forward one step at a time,
/// except that any state after `Attached` may jump to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildState {
    Idle,
    Attached,
    DocumentCreated,
    BlankBuilt,
    BoreCut,
    RecessCut,
    Filleted,
    Saved,
    Closed,
}

impl BuildState {
    /// The next state on the success path. `None` for `Closed`.
    pub fn successor(self) -> Option<BuildState> {
        use BuildState::*;
        match self {
            Idle => Some(Attached),
            Attached => Some(DocumentCreated),
            DocumentCreated => Some(BlankBuilt),
            BlankBuilt => Some(BoreCut),
            BoreCut => Some(RecessCut),
            RecessCut => Some(Filleted),
            Filleted => Some(Saved),
            Saved => Some(Closed),
            Closed => None,
        }
    }

    pub fn can_advance_to(self, next: BuildState) -> bool {
        if next == BuildState::Closed {
            return self >= BuildState::Attached && self != BuildState::Closed;
        }
        self.successor() == Some(next)
    }

    pub fn is_terminal(self) -> bool {
        self == BuildState::Closed
    }
}

/// Ordered record of every state a build passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTrace {
    states: Vec<BuildState>,
}

impl BuildTrace {
    pub fn new() -> Self {
        Self {
            states: vec![BuildState::Idle],
        }
    }

    pub fn current(&self) -> BuildState {
        self.states
            .last()
            .copied()
            .unwrap_or(BuildState::Idle)
    }

    pub fn states(&self) -> &[BuildState] {
        &self.states
    }

    /// Record a transition. Returns false, leaving the trace untouched, if
    /// the transition is not allowed from the current state.
    pub fn advance(&mut self, next: BuildState) -> bool {
        if !self.current().can_advance_to(next) {
            return false;
        }
        self.states.push(next);
        true
    }

    /// True when every success-path state was visited in order.
    pub fn is_complete(&self) -> bool {
        let mut expected = Some(BuildState::Idle);
        for &state in &self.states {
            if Some(state) != expected {
                return false;
            }
            expected = state.successor();
        }
        expected.is_none()
    }
}

impl Default for BuildTrace {
    fn default() -> Self {
        Self::new()
    }
}
