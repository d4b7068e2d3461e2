use gridworld::envs::grid_world::{GridWorld, GridWorldConfig};
use gridworld::mdps::solvers::policy_iteration::PolicyIteration;
use gridworld::mdps::solvers::value_iteration::ValueIteration;
use gridworld::{render, simulate, Agent, DEFAULT_TOLERANCE};
use serde::Deserialize;
use std::error::Error;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RunConfig {
    grid: GridWorldConfig,
    gamma: f64,
    tolerance: f64,
    scheme: Scheme,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Scheme {
    ValueIteration,
    PolicyIteration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            grid: GridWorldConfig::default(),
            gamma: Agent::DEFAULT_GAMMA,
            tolerance: DEFAULT_TOLERANCE,
            scheme: Scheme::PolicyIteration,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let config: RunConfig = match std::env::args().nth(1) {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => RunConfig::default(),
    };

    let env = GridWorld::new(config.grid)?;
    let mut agent = Agent::new(&env, config.gamma)?;

    println!("*** Env rewards ***");
    print!("{}", render::rewards_grid(&env));

    match config.scheme {
        Scheme::ValueIteration => {
            println!("*** Starting value iteration ***");
            for checkpoint in ValueIteration::new(&env, &mut agent, config.tolerance) {
                println!("--> {}", checkpoint.label);
                print!("{}", render::state_values_grid(&env, &checkpoint.state_values));
            }
        }
        Scheme::PolicyIteration => {
            println!("*** Initial policy ***");
            print!("{}", render::policy_grid(&env, agent.policy_table()));
            println!("*** Starting policy iteration ***");
            for checkpoint in PolicyIteration::new(&env, &mut agent, config.tolerance) {
                println!("--> {}", checkpoint.label);
            }
        }
    }

    println!("*** Optimal state values ***");
    print!("{}", render::state_values_grid(&env, agent.state_values()));
    println!("*** Optimal policy ***");
    print!("{}", render::policy_grid(&env, agent.policy_table()));

    let walk = simulate::rollout(&env, &agent, (1, 1), 100, 0);
    println!("*** Sample walk from (1, 1) ***");
    println!("{:?} | reward {:+.2}", walk.states, walk.total_reward);

    Ok(())
}
