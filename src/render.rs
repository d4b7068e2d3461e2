//! Textual grid dumps for the reporting side: rows top-down, cells
//! `|`-separated, blocked cells blank. Everything here reads the environment
//! and table snapshots only; nothing mutates.

use crate::envs::grid_world::{GridWorld, PolicyAction};
use crate::State;
use std::collections::HashMap;

pub fn rewards_grid(env: &GridWorld) -> String {
    grid(env, 5, |s| format!("{:+.2}", env.reward(s)))
}

pub fn state_values_grid(env: &GridWorld, state_values: &HashMap<State, f64>) -> String {
    grid(env, 9, |s| format!("{:+.6}", state_values[&s]))
}

pub fn policy_grid(env: &GridWorld, policy: &HashMap<State, PolicyAction>) -> String {
    grid(env, 5, |s| format!("{:5}", policy[&s].label()))
}

fn grid(env: &GridWorld, width: usize, cell: impl Fn(State) -> String) -> String {
    let mut out = String::new();
    for j in (1..=env.ydim()).rev() {
        for i in 1..=env.xdim() {
            let state = (i, j);
            if env.is_valid(state) {
                out.push_str(&cell(state));
            } else {
                out.push_str(&" ".repeat(width));
            }
            out.push('|');
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::envs::grid_world::GridWorldConfig;

    fn setup() -> (GridWorld, Agent) {
        let env = GridWorld::new(GridWorldConfig::default()).unwrap();
        let agent = Agent::new(&env, Agent::DEFAULT_GAMMA).unwrap();
        (env, agent)
    }

    #[test]
    fn rewards_grid_shows_the_default_layout() {
        let (env, _) = setup();
        insta::assert_snapshot!(rewards_grid(&env), @r###"
        +0.00|+0.00|+0.00|+1.00|
        +0.00|     |+0.00|-1.00|
        +0.00|+0.00|+0.00|+0.00|
        "###);
    }

    #[test]
    fn state_values_grid_blanks_blocked_cells() {
        let (env, agent) = setup();
        insta::assert_snapshot!(state_values_grid(&env, agent.state_values()), @r###"
        +0.000000|+0.000000|+0.000000|+0.000000|
        +0.000000|         |+0.000000|+0.000000|
        +0.000000|+0.000000|+0.000000|+0.000000|
        "###);
    }

    #[test]
    fn policy_grid_shows_labels_padded_to_cell_width() {
        let (env, agent) = setup();
        insta::assert_snapshot!(policy_grid(&env, agent.policy_table()), @r###"
        down |down |down |END  |
        down |     |down |END  |
        down |down |down |down |
        "###);
    }
}
