use crate::envs::grid_world::{Action, ConfigError, GridWorld, PolicyAction};
use crate::mdps::Policy;
use crate::State;
use std::collections::HashMap;

/// The learning agent: a discount factor plus the two tables the solvers
/// iterate on. Both tables are keyed by exactly the environment's valid-state
/// set and are only ever replaced wholesale at sweep boundaries, never
/// mutated mid-sweep.
#[derive(Clone, Debug)]
pub struct Agent {
    gamma: f64,
    state_values: HashMap<State, f64>,
    policy: HashMap<State, PolicyAction>,
}

impl Agent {
    pub const DEFAULT_GAMMA: f64 = 0.9;

    /// State values start at zero; the policy starts as `Down` everywhere,
    /// with the `End` sentinel on terminal states.
    pub fn new(env: &GridWorld, gamma: f64) -> Result<Self, ConfigError> {
        if !(gamma > 0. && gamma <= 1.) {
            return Err(ConfigError::GammaOutOfRange(gamma));
        }

        let state_values = env.valid_states().iter().map(|&s| (s, 0.)).collect();
        let policy = env
            .valid_states()
            .iter()
            .map(|&s| {
                if env.is_terminal(s) {
                    (s, PolicyAction::End)
                } else {
                    (s, PolicyAction::Move(Action::Down))
                }
            })
            .collect();

        Ok(Self {
            gamma,
            state_values,
            policy,
        })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn state_value(&self, state: State) -> f64 {
        match self.state_values.get(&state) {
            Some(&v) => v,
            None => panic!("state_value: {state:?} is not a valid state"),
        }
    }

    pub fn policy_action(&self, state: State) -> PolicyAction {
        match self.policy.get(&state) {
            Some(&a) => a,
            None => panic!("policy_action: {state:?} is not a valid state"),
        }
    }

    pub fn state_values(&self) -> &HashMap<State, f64> {
        &self.state_values
    }

    pub fn policy_table(&self) -> &HashMap<State, PolicyAction> {
        &self.policy
    }

    pub(crate) fn replace_state_values(&mut self, next: HashMap<State, f64>) {
        debug_assert_eq!(next.len(), self.state_values.len());
        self.state_values = next;
    }

    pub(crate) fn replace_policy(&mut self, next: HashMap<State, PolicyAction>) {
        debug_assert_eq!(next.len(), self.policy.len());
        self.policy = next;
    }
}

impl Policy for Agent {
    fn policy(&self, s: State) -> PolicyAction {
        self.policy_action(s)
    }
}
