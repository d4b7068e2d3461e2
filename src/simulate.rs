use crate::envs::grid_world::{GridWorld, PolicyAction};
use crate::mdps::Policy;
use crate::State;
use rand::distributions::WeightedIndex;
use rand::prelude::*;

/// One sampled walk under a fixed policy and the stochastic controller.
#[derive(Clone, Debug, PartialEq)]
pub struct Rollout {
    pub states: Vec<State>,
    pub total_reward: f64,
}

/// Rolls `policy` forward from `start`, sampling each step from the
/// environment's transition model. Stops on entering a terminal state, on an
/// `End` policy action, or after `max_steps` samples.
pub fn rollout(
    env: &GridWorld,
    policy: &dyn Policy,
    start: State,
    max_steps: usize,
    seed: u64,
) -> Rollout {
    assert!(
        env.is_valid(start),
        "rollout: {start:?} is not a valid state"
    );

    let rng = &mut StdRng::seed_from_u64(seed);
    let mut states = vec![start];
    let mut total_reward = 0.;
    let mut s = start;
    for _ in 0..max_steps {
        if env.is_terminal(s) {
            break;
        }
        let action = match policy.policy(s) {
            PolicyAction::Move(action) => action,
            PolicyAction::End => break,
        };

        let ts = env.transition_probs(s, action);
        let dist = WeightedIndex::new(ts.iter().map(|t| t.probability)).unwrap();
        let t = &ts[dist.sample(rng)];
        total_reward += t.reward;
        s = t.next_state;
        states.push(s);
    }

    Rollout {
        states,
        total_reward,
    }
}
