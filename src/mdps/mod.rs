pub mod solvers;

use crate::envs::grid_world::PolicyAction;
use crate::State;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Maps a state to the action taken there.
pub trait Policy {
    fn policy(&self, s: State) -> PolicyAction;
}

/// One completed sweep, as handed to the reporting collaborator: a label plus
/// read-only snapshots of the agent's tables at that instant.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    pub label: SweepLabel,
    pub state_values: HashMap<State, f64>,
    pub policy: HashMap<State, PolicyAction>,
    pub max_error: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepLabel {
    ValueIteration {
        sweep: usize,
    },
    /// `sweep` counts evaluation sweeps within the current epoch;
    /// `total_sweeps` runs across epochs.
    PolicyIteration {
        epoch: usize,
        sweep: usize,
        total_sweeps: usize,
    },
}

impl fmt::Display for SweepLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SweepLabel::ValueIteration { sweep } => write!(f, "Iter: {sweep}"),
            SweepLabel::PolicyIteration {
                epoch,
                sweep,
                total_sweeps,
            } => write!(f, "Epoch: {epoch}, Iter: {sweep}, Steps: {total_sweeps}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SolveError {
    #[error("no convergence after {sweeps} sweeps (max error {max_error:e}, tolerance {tolerance:e})")]
    DidNotConverge {
        sweeps: usize,
        max_error: f64,
        tolerance: f64,
    },
}
