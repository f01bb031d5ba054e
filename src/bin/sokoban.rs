use std::error::Error;

use structopt::StructOpt;

use grid_mdp::solver::value_iteration;
use grid_mdp::{advance, Env, Map, Policy, Position, SokobanEnv, StateSpace, ValueFunction};

#[derive(StructOpt, Debug)]
#[structopt(name = "sokoban")]
struct Cli {
    /// Discount factor
    #[structopt(long = "discount_factor", default_value = "0.9")]
    discount_factor: f64,

    /// Convergence threshold
    #[structopt(long = "theta", default_value = "0.001")]
    theta: f64,

    /// Replay cap when stepping the solved policy from the start state
    #[structopt(long = "replay_steps", default_value = "100")]
    replay_steps: usize,
}

/// Walled 7x7 room, one crate, one target.
fn map_one() -> Map {
    let mut walls = vec![
        Position::new(2, 3),
        Position::new(3, 4),
        Position::new(2, 4),
    ];
    for i in 0..7 {
        walls.push(Position::new(i, 0));
        walls.push(Position::new(i, 6));
        walls.push(Position::new(0, i));
        walls.push(Position::new(6, i));
    }
    Map::sokoban(
        7,
        7,
        walls,
        vec![Position::new(2, 5)],
        Position::new(3, 3),
        vec![Position::new(4, 2)],
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::from_args();

    let env = SokobanEnv::new(map_one());
    let space = StateSpace::new(&env);
    println!("{} configurations enumerated", space.len());

    let mut policy = Policy::new(space.len());
    let mut values = ValueFunction::new(&env, &space);
    let sweeps = value_iteration(
        &env,
        &space,
        &mut policy,
        &mut values,
        cli.discount_factor,
        cli.theta,
    );
    println!("converged after {} sweeps", sweeps);

    let start = env.start_state();
    println!(
        "start value: {:.3}",
        values.value_of(&space, &start)
    );

    // Step the solved policy from the start and narrate the moves.
    let mut state = start;
    for step in 0..cli.replay_steps {
        if env.is_terminal(&state) {
            println!("solved in {} moves", step);
            return Ok(());
        }
        let action = policy.action_for(&space, &state);
        let next = advance(&env, &space, &policy, &state);
        println!(
            "{:>3}: {:?} player {} crates {:?}",
            step,
            action,
            next.player(),
            next.crates()
        );
        state = next;
    }
    println!("no solution within {} moves", cli.replay_steps);
    Ok(())
}
