use crate::{Discrete, State};
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// The four unit moves. `ALL` is the canonical enumeration order, which also
/// fixes the greedy tie-break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Down,
    Left,
    Right,
    Up,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Down, Action::Left, Action::Right, Action::Up];

    pub fn delta(self) -> (Discrete, Discrete) {
        match self {
            Action::Down => (0, -1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
            Action::Up => (0, 1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::Up => "up",
        }
    }
}

/// A policy table entry: a move, or the `End` sentinel for terminal states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolicyAction {
    Move(Action),
    End,
}

impl PolicyAction {
    pub fn label(self) -> &'static str {
        match self {
            PolicyAction::Move(action) => action.label(),
            PolicyAction::End => "END",
        }
    }

    pub fn delta(self) -> (Discrete, Discrete) {
        match self {
            PolicyAction::Move(action) => action.delta(),
            PolicyAction::End => (0, 0),
        }
    }
}

/// One weighted outcome of a `(state, action)` pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub next_state: State,
    pub probability: f64,
    pub reward: f64,
    pub done: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GridWorldConfig {
    pub xdim: Discrete,
    pub ydim: Discrete,
    pub blocked_states: Vec<State>,
    pub terminal_states: Vec<(State, f64)>,
    pub controller_reliability: f64,
}

impl Default for GridWorldConfig {
    /// The 4x3 teaching grid: one blocked cell, a +1 and a -1 terminal.
    ///
    /// ```text
    /// : 0 | 0 | 0 | +1
    /// : 0 | B | 0 | -1
    /// : 0 | 0 | 0 | 0
    /// ```
    fn default() -> Self {
        Self {
            xdim: 4,
            ydim: 3,
            blocked_states: vec![(2, 2)],
            terminal_states: vec![((4, 3), 1.), ((4, 2), -1.)],
            controller_reliability: 0.8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid dimensions must be positive, got {0}x{1}")]
    NonPositiveDims(Discrete, Discrete),
    #[error("{kind} state {state:?} is outside the {xdim}x{ydim} grid")]
    StateOutOfBounds {
        kind: &'static str,
        state: State,
        xdim: Discrete,
        ydim: Discrete,
    },
    #[error("controller reliability must be within [0, 1], got {0}")]
    ReliabilityOutOfRange(f64),
    #[error("discount factor must be within (0, 1], got {0}")]
    GammaOutOfRange(f64),
}

/// A rectangular grid with blocked cells, terminal cells and an unreliable
/// controller: an intended move lands as commanded with probability `p` and
/// drifts to either side with probability `(1 - p) / 2` each. Immutable after
/// construction apart from [`GridWorld::set_rewards`].
#[derive(Clone, Debug)]
pub struct GridWorld {
    xdim: Discrete,
    ydim: Discrete,
    blocked_states: Vec<State>,
    terminal_states: HashSet<State>,
    prob: f64,
    valid_states: Vec<State>,
    rewards: HashMap<State, f64>,
}

impl GridWorld {
    pub fn new(config: GridWorldConfig) -> Result<Self, ConfigError> {
        if config.xdim <= 0 || config.ydim <= 0 {
            return Err(ConfigError::NonPositiveDims(config.xdim, config.ydim));
        }

        let in_bounds =
            |(i, j): State| i >= 1 && i <= config.xdim && j >= 1 && j <= config.ydim;
        if let Some(&state) = config.blocked_states.iter().find(|&&s| !in_bounds(s)) {
            return Err(ConfigError::StateOutOfBounds {
                kind: "blocked",
                state,
                xdim: config.xdim,
                ydim: config.ydim,
            });
        }
        if let Some(&(state, _)) = config.terminal_states.iter().find(|&&(s, _)| !in_bounds(s)) {
            return Err(ConfigError::StateOutOfBounds {
                kind: "terminal",
                state,
                xdim: config.xdim,
                ydim: config.ydim,
            });
        }
        if !(0. ..=1.).contains(&config.controller_reliability) {
            return Err(ConfigError::ReliabilityOutOfRange(
                config.controller_reliability,
            ));
        }

        let valid_states = iproduct!(1..=config.ydim, 1..=config.xdim)
            .map(|(j, i)| (i, j))
            .filter(|s| !config.blocked_states.contains(s))
            .collect::<Vec<_>>();

        let mut env = Self {
            xdim: config.xdim,
            ydim: config.ydim,
            terminal_states: config.terminal_states.iter().map(|&(s, _)| s).collect(),
            blocked_states: config.blocked_states,
            prob: config.controller_reliability,
            valid_states,
            rewards: HashMap::new(),
        };

        let overrides = config.terminal_states.into_iter().collect::<HashMap<_, _>>();
        env.set_rewards(&overrides, 0., 0.);

        Ok(env)
    }

    pub fn xdim(&self) -> Discrete {
        self.xdim
    }

    pub fn ydim(&self) -> Discrete {
        self.ydim
    }

    /// Valid states in canonical order: row (`j`) outer, column (`i`) inner,
    /// both ascending.
    pub fn valid_states(&self) -> &[State] {
        &self.valid_states
    }

    pub fn blocked_states(&self) -> &[State] {
        &self.blocked_states
    }

    pub fn controller_reliability(&self) -> f64 {
        self.prob
    }

    pub fn is_valid(&self, state: State) -> bool {
        let (i, j) = state;
        i >= 1 && i <= self.xdim && j >= 1 && j <= self.ydim
            && !self.blocked_states.contains(&state)
    }

    pub fn is_terminal(&self, state: State) -> bool {
        self.terminal_states.contains(&state)
    }

    /// Reward for arriving at `state`, regardless of origin or action.
    pub fn reward(&self, state: State) -> f64 {
        match self.rewards.get(&state) {
            Some(&r) => r,
            None => panic!("reward: {state:?} is not a valid state"),
        }
    }

    /// Replaces the reward mapping wholesale: `override + transition_reward`
    /// where an override is configured, `default_reward + transition_reward`
    /// everywhere else.
    pub fn set_rewards(
        &mut self,
        overrides: &HashMap<State, f64>,
        default_reward: f64,
        transition_reward: f64,
    ) {
        self.rewards = self
            .valid_states
            .iter()
            .map(|&s| {
                let r = overrides.get(&s).copied().unwrap_or(default_reward);
                (s, r + transition_reward)
            })
            .collect();
    }

    /// Weighted successor outcomes for `(state, action)`: the intended move
    /// plus the two lateral drifts of the unreliable controller. A candidate
    /// leaving the valid-state set bounces back to `state`; collapsed
    /// duplicates merge their probability mass, so the mapping always sums
    /// to 1.
    pub fn transition_probs(&self, state: State, action: Action) -> Vec<Transition> {
        assert!(
            self.is_valid(state),
            "transition_probs: {state:?} is not a valid state"
        );

        let (i, j) = state;
        let (dx, dy) = action.delta();
        let candidates = [
            ((i + dx, j + dy), self.prob),
            ((i + dy, j + dx), 0.5 * (1. - self.prob)),
            ((i - dy, j - dx), 0.5 * (1. - self.prob)),
        ];

        let mut outcomes: Vec<Transition> = Vec::with_capacity(3);
        for (candidate, probability) in candidates {
            if probability == 0. {
                continue;
            }
            let next_state = if self.is_valid(candidate) { candidate } else { state };
            match outcomes.iter_mut().find(|t| t.next_state == next_state) {
                Some(t) => t.probability += probability,
                None => outcomes.push(Transition {
                    next_state,
                    probability,
                    reward: self.reward(next_state),
                    done: self.is_terminal(next_state),
                }),
            }
        }

        outcomes
    }
}
