use crate::agent::Agent;
use crate::envs::grid_world::{Action, GridWorld, PolicyAction};
use crate::State;

/// Expected discounted return of taking `action` in `state`, read against the
/// previous sweep's value table only (synchronous/Jacobi back-up; an in-place
/// Gauss-Seidel variant would make results depend on enumeration order).
///
/// Terminal states back up to exactly zero: they contribute reward as a
/// destination of their predecessors, never through their own back-up.
pub fn expected_q_value(env: &GridWorld, agent: &Agent, state: State, action: Action) -> f64 {
    if env.is_terminal(state) {
        return 0.;
    }

    env.transition_probs(state, action)
        .iter()
        .map(|t| t.probability * (t.reward + agent.gamma() * agent.state_value(t.next_state)))
        .sum()
}

/// Maximum Q-value over the four actions, and an action attaining it. Ties
/// resolve to the first maximal action in canonical order (down, left,
/// right, up).
pub fn greedy_backup(env: &GridWorld, agent: &Agent, state: State) -> (f64, Action) {
    let (mut best_value, mut best_action) = (f64::NEG_INFINITY, Action::Down);
    for action in Action::ALL {
        let q = expected_q_value(env, agent, state, action);
        if q > best_value {
            (best_value, best_action) = (q, action);
        }
    }

    (best_value, best_action)
}

/// Policy-evaluation back-up: the Q-value of the *current* policy's action,
/// plus the greedy action recorded for the improvement comparison. The greedy
/// action never feeds the value.
pub fn policy_backup(env: &GridWorld, agent: &Agent, state: State) -> (f64, Action) {
    let value = match agent.policy_action(state) {
        PolicyAction::Move(action) => expected_q_value(env, agent, state, action),
        PolicyAction::End => 0.,
    };
    let (_, greedy_action) = greedy_backup(env, agent, state);

    (value, greedy_action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::grid_world::GridWorldConfig;
    use float_eq::*;
    use std::collections::HashMap;

    fn setup() -> (GridWorld, Agent) {
        let env = GridWorld::new(GridWorldConfig::default()).unwrap();
        let agent = Agent::new(&env, Agent::DEFAULT_GAMMA).unwrap();
        (env, agent)
    }

    #[test]
    fn terminal_states_back_up_to_exactly_zero() {
        let (env, mut agent) = setup();

        // even with value mass next door, a terminal state stays at zero
        let values = agent
            .state_values()
            .keys()
            .map(|&s| (s, 10.))
            .collect::<HashMap<_, _>>();
        agent.replace_state_values(values);

        for action in Action::ALL {
            assert_eq!(expected_q_value(&env, &agent, (4, 3), action), 0.);
            assert_eq!(expected_q_value(&env, &agent, (4, 2), action), 0.);
        }
    }

    #[test]
    fn q_value_weights_arrival_rewards_by_transition_probability() {
        let (env, agent) = setup();

        // from (3,3), right reaches the +1 terminal with the intended 0.8
        assert_float_eq!(
            expected_q_value(&env, &agent, (3, 3), Action::Right),
            0.8,
            abs <= 1e-12
        );
        // up bounces off the wall; only the rightward drift collects the +1
        assert_float_eq!(
            expected_q_value(&env, &agent, (3, 3), Action::Up),
            0.1,
            abs <= 1e-12
        );
    }

    #[test]
    fn q_value_discounts_successor_values() {
        let (env, mut agent) = setup();

        let mut values = agent.state_values().clone();
        values.insert((2, 3), 1.);
        agent.replace_state_values(values);

        // from (1,3), right lands on (2,3) with 0.8 and drifts back with 0.1
        assert_float_eq!(
            expected_q_value(&env, &agent, (1, 3), Action::Right),
            0.8 * 0.9,
            abs <= 1e-12
        );
    }

    #[test]
    fn greedy_backup_ties_resolve_to_the_first_canonical_action() {
        let env = GridWorld::new(GridWorldConfig {
            terminal_states: vec![],
            ..GridWorldConfig::default()
        })
        .unwrap();
        let agent = Agent::new(&env, Agent::DEFAULT_GAMMA).unwrap();

        // zero rewards and a zero value table make all four actions equal
        for &s in env.valid_states() {
            let (value, action) = greedy_backup(&env, &agent, s);
            assert_eq!(value, 0.);
            assert_eq!(action, Action::Down);
        }
    }

    #[test]
    fn greedy_backup_picks_the_reward_bearing_action() {
        let (env, agent) = setup();

        let (value, action) = greedy_backup(&env, &agent, (3, 3));

        assert_float_eq!(value, 0.8, abs <= 1e-12);
        assert_eq!(action, Action::Right);
    }

    #[test]
    fn policy_backup_evaluates_the_current_policy_not_the_greedy_one() {
        let (env, agent) = setup();

        // the default policy walks down from (3,3); the greedy move is right
        let (value, greedy_action) = policy_backup(&env, &agent, (3, 3));

        assert_float_eq!(value, 0.1, abs <= 1e-12);
        assert_eq!(greedy_action, Action::Right);
    }
}
