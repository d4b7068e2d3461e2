pub mod agent;
pub mod envs;
pub mod mdps;
pub mod render;
pub mod simulate;

pub use agent::Agent;
pub use envs::grid_world::{Action, ConfigError, GridWorld, GridWorldConfig, PolicyAction, Transition};
pub use mdps::{Checkpoint, Policy, SolveError, SweepLabel, DEFAULT_TOLERANCE};

pub type Discrete = i32;

/// A grid coordinate `(i, j)`, 1-based, `i` along the x axis.
pub type State = (Discrete, Discrete);
