use std::error::Error;

use plotters::style::{BLUE, GREEN, RED};
use rand::rngs::StdRng;
use rand::SeedableRng;
use structopt::StructOpt;

use grid_mdp::solver::{policy_iteration, value_iteration, MonteCarloControl};
use grid_mdp::utils::{moving_average, plot_moving_average};
use grid_mdp::{GridWorldEnv, Map, Policy, Position, StateSpace, ValueFunction};

#[derive(StructOpt, Debug)]
#[structopt(name = "gridworld")]
struct Cli {
    /// Which bundled map to solve: "one" or "two"
    #[structopt(long = "map", default_value = "one")]
    map: String,

    /// Discount factor
    #[structopt(long = "discount_factor", default_value = "0.9")]
    discount_factor: f64,

    /// Convergence threshold for the sweep based solvers
    #[structopt(long = "theta", default_value = "0.001")]
    theta: f64,

    /// Exploration ratio for Monte Carlo control
    #[structopt(long = "epsilon", default_value = "0.4")]
    epsilon: f64,

    /// Number of Monte Carlo episodes
    #[structopt(long = "n_episodes", short = "n", default_value = "10000")]
    n_episodes: usize,

    /// Maximum number of steps per simulated episode
    #[structopt(long = "max_steps", default_value = "100")]
    max_steps: usize,

    /// Moving average window for the charts
    #[structopt(long = "moving_average_window", default_value = "100")]
    moving_average_window: usize,

    /// Seed for reproducibility
    #[structopt(long = "seed", default_value = "42")]
    seed: u64,
}

/// Walled 7x7 room with a pocket of inner walls.
fn map_one() -> Map {
    let mut walls = vec![
        Position::new(4, 4),
        Position::new(5, 4),
        Position::new(4, 3),
    ];
    for i in 0..7 {
        walls.push(Position::new(i, 0));
        walls.push(Position::new(i, 6));
        walls.push(Position::new(0, i));
        walls.push(Position::new(6, i));
    }
    Map::grid(7, 7, walls, Position::new(1, 1), Position::new(5, 5))
}

/// Open 10x10 grid with two small wall clusters.
fn map_two() -> Map {
    Map::grid(
        10,
        10,
        vec![
            Position::new(2, 2),
            Position::new(3, 2),
            Position::new(2, 1),
            Position::new(4, 4),
            Position::new(5, 4),
            Position::new(4, 3),
        ],
        Position::new(6, 0),
        Position::new(1, 9),
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::from_args();

    let map = match cli.map.as_str() {
        "one" => map_one(),
        "two" => map_two(),
        other => panic!("Invalid map: {}", other),
    };

    let env = GridWorldEnv::new(map);
    let space = StateSpace::new(&env);
    println!("{} states enumerated", space.len());

    let mut rng = StdRng::seed_from_u64(cli.seed);

    println!("\nPolicy iteration:");
    let mut policy = Policy::random(&env, &space, &mut rng);
    let mut values = ValueFunction::new(&env, &space);
    let iterations = policy_iteration(
        &env,
        &space,
        &mut policy,
        &mut values,
        cli.discount_factor,
        cli.theta,
    );
    println!("stable after {} improvement rounds", iterations);
    println!("{}", env.render_policy(&space, &policy));
    println!("{}", env.render_values(&space, &values));

    println!("Value iteration:");
    let mut policy = Policy::random(&env, &space, &mut rng);
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
    println!("{}", env.render_policy(&space, &policy));
    println!("{}", env.render_values(&space, &values));

    println!("Monte Carlo control:");
    let mut policy = Policy::random(&env, &space, &mut rng);
    let mut values = ValueFunction::new(&env, &space);
    let mut mc = MonteCarloControl::new(cli.discount_factor, cli.epsilon, cli.max_steps, cli.seed);
    let results = mc.run(&env, &space, &mut policy, &mut values, cli.n_episodes);
    println!("{}", env.render_policy(&space, &policy));
    println!("{}", env.render_values(&space, &values));

    let window = cli.n_episodes / cli.moving_average_window;
    let returns = moving_average(window, &results.returns);
    let lengths: Vec<f64> = results.lengths.iter().map(|&l| l as f64).collect();
    let lengths = moving_average(window, &lengths);
    plot_moving_average(&[returns], &[&BLUE], &["discounted return"], "MC Returns")?;
    plot_moving_average(
        &[lengths],
        &[&RED, &GREEN],
        &["episode length"],
        "MC Episode Lengths",
    )?;

    Ok(())
}
