use super::common;
use crate::agent::Agent;
use crate::envs::grid_world::{GridWorld, PolicyAction};
use crate::mdps::{Checkpoint, SolveError, SweepLabel};
use std::collections::HashMap;
use tracing::{debug, info};

/// Value iteration - Sutton & Barto 2018, §4.4.
///
/// Each `next()` performs one synchronous sweep over the valid states,
/// replaces the agent's tables wholesale and yields a checkpoint; the
/// iterator is exhausted once the max per-state error reaches tolerance.
/// Abandoning the iterator early leaves the agent at the last completed
/// sweep, never mid-update.
pub struct ValueIteration<'a> {
    env: &'a GridWorld,
    agent: &'a mut Agent,
    tolerance: f64,
    sweep: usize,
    converged: bool,
}

impl<'a> ValueIteration<'a> {
    pub fn new(env: &'a GridWorld, agent: &'a mut Agent, tolerance: f64) -> Self {
        Self {
            env,
            agent,
            tolerance,
            sweep: 0,
            converged: false,
        }
    }

    /// Sweeps to convergence and returns the sweep count. `max_sweeps` is an
    /// optional safety bound: it never changes the convergence predicate, it
    /// only turns an endless loop into a [`SolveError::DidNotConverge`].
    pub fn exec(&mut self, max_sweeps: Option<usize>) -> Result<usize, SolveError> {
        let mut last_error = f64::INFINITY;
        while let Some(checkpoint) = self.next() {
            last_error = checkpoint.max_error;
            if let Some(cap) = max_sweeps {
                if !self.converged && self.sweep >= cap {
                    return Err(SolveError::DidNotConverge {
                        sweeps: self.sweep,
                        max_error: last_error,
                        tolerance: self.tolerance,
                    });
                }
            }
        }

        Ok(self.sweep)
    }
}

impl Iterator for ValueIteration<'_> {
    type Item = Checkpoint;

    fn next(&mut self) -> Option<Checkpoint> {
        if self.converged {
            return None;
        }

        let mut next_values = HashMap::with_capacity(self.env.valid_states().len());
        let mut next_policy = HashMap::with_capacity(self.env.valid_states().len());
        let mut max_error: f64 = 0.;
        for &state in self.env.valid_states() {
            if self.env.is_terminal(state) {
                next_values.insert(state, 0.);
                next_policy.insert(state, PolicyAction::End);
            } else {
                let (value, action) = common::greedy_backup(self.env, self.agent, state);
                max_error = max_error.max((value - self.agent.state_value(state)).abs());
                next_values.insert(state, value);
                next_policy.insert(state, PolicyAction::Move(action));
            }
        }

        self.agent.replace_state_values(next_values);
        self.agent.replace_policy(next_policy);
        self.sweep += 1;
        self.converged = max_error <= self.tolerance;

        debug!(sweep = self.sweep, max_error, "value iteration sweep");
        if self.converged {
            info!(sweeps = self.sweep, "value iteration converged");
        }

        Some(Checkpoint {
            label: SweepLabel::ValueIteration { sweep: self.sweep },
            state_values: self.agent.state_values().clone(),
            policy: self.agent.policy_table().clone(),
            max_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::grid_world::GridWorldConfig;
    use crate::mdps::DEFAULT_TOLERANCE;
    use std::collections::HashSet;

    fn setup() -> (GridWorld, Agent) {
        let env = GridWorld::new(GridWorldConfig::default()).unwrap();
        let agent = Agent::new(&env, Agent::DEFAULT_GAMMA).unwrap();
        (env, agent)
    }

    #[test]
    fn converges_on_the_default_grid() {
        let (env, mut agent) = setup();

        let sweeps = ValueIteration::new(&env, &mut agent, DEFAULT_TOLERANCE)
            .exec(Some(100))
            .unwrap();

        assert_eq!(sweeps, 23);
    }

    #[test]
    fn terminal_values_stay_zero_after_every_sweep() {
        let (env, mut agent) = setup();

        for checkpoint in ValueIteration::new(&env, &mut agent, DEFAULT_TOLERANCE) {
            assert_eq!(checkpoint.state_values[&(4, 3)], 0.);
            assert_eq!(checkpoint.state_values[&(4, 2)], 0.);
            assert_eq!(checkpoint.policy[&(4, 3)], PolicyAction::End);
            assert_eq!(checkpoint.policy[&(4, 2)], PolicyAction::End);
        }
    }

    #[test]
    fn sweep_cap_reports_did_not_converge() {
        let (env, mut agent) = setup();

        let err = ValueIteration::new(&env, &mut agent, DEFAULT_TOLERANCE)
            .exec(Some(5))
            .unwrap_err();

        match err {
            SolveError::DidNotConverge {
                sweeps, max_error, ..
            } => {
                assert_eq!(sweeps, 5);
                assert!(max_error > DEFAULT_TOLERANCE);
            }
        }
    }

    #[test]
    fn a_generous_cap_does_not_alter_convergence() {
        let (env, mut agent) = setup();

        let capped = ValueIteration::new(&env, &mut agent, DEFAULT_TOLERANCE)
            .exec(Some(1000))
            .unwrap();

        let (env, mut agent) = setup();
        let uncapped = ValueIteration::new(&env, &mut agent, DEFAULT_TOLERANCE)
            .exec(None)
            .unwrap();

        assert_eq!(capped, uncapped);
    }

    #[test]
    fn early_abandonment_leaves_consistent_tables() {
        let (env, mut agent) = setup();

        let mut vi = ValueIteration::new(&env, &mut agent, DEFAULT_TOLERANCE);
        let labels = vi
            .by_ref()
            .take(3)
            .map(|c| c.label.to_string())
            .collect::<Vec<_>>();
        drop(vi);

        assert_eq!(labels, ["Iter: 1", "Iter: 2", "Iter: 3"]);
        let valid: HashSet<_> = env.valid_states().iter().copied().collect();
        assert_eq!(
            agent.state_values().keys().copied().collect::<HashSet<_>>(),
            valid
        );
        assert_eq!(
            agent.policy_table().keys().copied().collect::<HashSet<_>>(),
            valid
        );
        assert!(agent.state_values().values().all(|v| v.is_finite()));
    }

    #[test]
    fn checkpoints_snapshot_the_tables_per_sweep() {
        let (env, mut agent) = setup();

        let checkpoints =
            ValueIteration::new(&env, &mut agent, DEFAULT_TOLERANCE).collect::<Vec<_>>();

        assert_eq!(checkpoints.len(), 23);
        // the last checkpoint is the converged table the agent ends up with
        let last = checkpoints.last().unwrap();
        assert_eq!(last.state_values, *agent.state_values());
        assert_eq!(last.policy, *agent.policy_table());
        assert!(last.max_error <= DEFAULT_TOLERANCE);
        // earlier snapshots are genuinely earlier
        assert!(checkpoints[0].max_error > checkpoints[22].max_error);
    }
}
