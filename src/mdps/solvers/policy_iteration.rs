use super::common;
use crate::agent::Agent;
use crate::envs::grid_world::{GridWorld, PolicyAction};
use crate::mdps::{Checkpoint, SolveError, SweepLabel};
use crate::State;
use std::collections::HashMap;
use tracing::{debug, info};

/// Policy iteration - Sutton & Barto 2018, §4.3.
///
/// Each `next()` performs one policy-evaluation sweep. When the evaluation
/// error reaches tolerance the improvement step runs within the same call:
/// the greedy policy recorded during the last sweep either replaces the
/// current one (a new epoch begins) or matches it (the solver is converged).
/// The value table carries across epochs; re-evaluation under an improved
/// policy resumes from the previous policy's values, not from zero.
pub struct PolicyIteration<'a> {
    env: &'a GridWorld,
    agent: &'a mut Agent,
    tolerance: f64,
    epoch: usize,
    sweep: usize,
    total_sweeps: usize,
    done: bool,
}

impl<'a> PolicyIteration<'a> {
    pub fn new(env: &'a GridWorld, agent: &'a mut Agent, tolerance: f64) -> Self {
        Self {
            env,
            agent,
            tolerance,
            epoch: 0,
            sweep: 0,
            total_sweeps: 0,
            done: false,
        }
    }

    /// Runs to a stable policy and returns `(epochs, total_sweeps)`.
    /// `max_sweeps` caps the running total-sweep counter; like value
    /// iteration's cap it only reports, it never changes the convergence
    /// predicate.
    pub fn exec(&mut self, max_sweeps: Option<usize>) -> Result<(usize, usize), SolveError> {
        let mut last_error = f64::INFINITY;
        while let Some(checkpoint) = self.next() {
            last_error = checkpoint.max_error;
            if let Some(cap) = max_sweeps {
                if !self.done && self.total_sweeps >= cap {
                    return Err(SolveError::DidNotConverge {
                        sweeps: self.total_sweeps,
                        max_error: last_error,
                        tolerance: self.tolerance,
                    });
                }
            }
        }

        Ok((self.epoch, self.total_sweeps))
    }
}

impl Iterator for PolicyIteration<'_> {
    type Item = Checkpoint;

    fn next(&mut self) -> Option<Checkpoint> {
        if self.done {
            return None;
        }
        if self.sweep == 0 {
            self.epoch += 1;
        }

        let mut next_values = HashMap::with_capacity(self.env.valid_states().len());
        let mut greedy: HashMap<State, PolicyAction> =
            HashMap::with_capacity(self.env.valid_states().len());
        let mut max_error: f64 = 0.;
        for &state in self.env.valid_states() {
            if self.env.is_terminal(state) {
                next_values.insert(state, 0.);
                greedy.insert(state, PolicyAction::End);
            } else {
                let (value, greedy_action) = common::policy_backup(self.env, self.agent, state);
                max_error = max_error.max((value - self.agent.state_value(state)).abs());
                next_values.insert(state, value);
                greedy.insert(state, PolicyAction::Move(greedy_action));
            }
        }

        self.agent.replace_state_values(next_values);
        self.sweep += 1;
        self.total_sweeps += 1;

        debug!(
            epoch = self.epoch,
            sweep = self.sweep,
            max_error,
            "policy evaluation sweep"
        );

        // snapshot before any improvement: the checkpoint reports the sweep,
        // not the epoch transition
        let checkpoint = Checkpoint {
            label: SweepLabel::PolicyIteration {
                epoch: self.epoch,
                sweep: self.sweep,
                total_sweeps: self.total_sweeps,
            },
            state_values: self.agent.state_values().clone(),
            policy: self.agent.policy_table().clone(),
            max_error,
        };

        if max_error <= self.tolerance {
            if greedy != *self.agent.policy_table() {
                self.agent.replace_policy(greedy);
                self.sweep = 0;
            } else {
                self.done = true;
                info!(
                    epochs = self.epoch,
                    total_sweeps = self.total_sweeps,
                    "policy iteration converged"
                );
            }
        }

        Some(checkpoint)
    }
}
