use rand::rngs::StdRng;
use rand::SeedableRng;

use grid_mdp::solver::MonteCarloControl;
use grid_mdp::{advance, Action, Env, GridWorldEnv, Map, Policy, Position, StateSpace, ValueFunction};

const GAMMA: f64 = 0.9;

/// 1x5 corridor, terminal at the right end.
fn corridor() -> GridWorldEnv {
    GridWorldEnv::new(Map::grid(
        5,
        1,
        vec![],
        Position::new(0, 0),
        Position::new(4, 0),
    ))
}

#[test]
fn pure_exploration_estimates_the_preterminal_value() {
    let env = corridor();
    let space = StateSpace::new(&env);
    let mut rng = StdRng::seed_from_u64(42);
    let mut policy = Policy::random(&env, &space, &mut rng);
    let mut values = ValueFunction::new(&env, &space);

    let mut mc = MonteCarloControl::new(GAMMA, 1.0, 50, 42);
    let results = mc.run(&env, &space, &mut policy, &mut values, 5000);
    assert_eq!(results.returns.len(), 5000);

    // The cell ahead of the terminal is worth one discount step. The random
    // walk occasionally hits the step cap, which drags the average slightly
    // below, hence the loose bound.
    let estimate = values.value_of(&space, &Position::new(3, 0));
    assert!(
        (estimate - 0.9).abs() <= 0.05,
        "estimate {estimate} strayed from 0.9"
    );
}

#[test]
fn control_learns_to_walk_the_corridor() {
    let env = corridor();
    let space = StateSpace::new(&env);
    let mut rng = StdRng::seed_from_u64(7);
    let mut policy = Policy::random(&env, &space, &mut rng);
    let mut values = ValueFunction::new(&env, &space);

    let mut mc = MonteCarloControl::new(GAMMA, 0.5, 50, 7);
    mc.run(&env, &space, &mut policy, &mut values, 2000);

    for x in 1..4 {
        assert_eq!(
            policy.action_for(&space, &Position::new(x, 0)),
            Action::Right,
            "policy points the wrong way at x={x}"
        );
    }

    // Stepping the learned policy from the start reaches the terminal.
    let mut state = env.start_state();
    for _ in 0..10 {
        if env.is_terminal(&state) {
            break;
        }
        state = advance(&env, &space, &policy, &state);
    }
    assert!(env.is_terminal(&state));
}

#[test]
fn episode_count_is_respected_and_lengths_are_capped() {
    let env = corridor();
    let space = StateSpace::new(&env);
    let mut rng = StdRng::seed_from_u64(3);
    let mut policy = Policy::random(&env, &space, &mut rng);
    let mut values = ValueFunction::new(&env, &space);

    let mut mc = MonteCarloControl::new(GAMMA, 1.0, 20, 3);
    let results = mc.run(&env, &space, &mut policy, &mut values, 200);
    assert_eq!(results.lengths.len(), 200);
    // A capped trajectory holds the cap plus the synthetic failure step.
    assert!(results.lengths.iter().all(|&l| l <= 21));
}
