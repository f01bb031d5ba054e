use std::hash::Hash;

use kdam::{tqdm, BarExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::env::{Action, Env};
use crate::policy::{Policy, StateSpace, ValueFunction};
use crate::solver::policy_improvement;

/// One simulated transition: the state the agent was in, the action it
/// took and the reward it collected. Rewards into a terminal state are
/// recorded as 0, the terminal's stored value enters the return through
/// `Episode::terminal_value` instead.
#[derive(Debug, Clone)]
pub struct Step<S> {
    pub state: S,
    pub action: Action,
    pub reward: f64,
}

/// A bounded trajectory. `terminal_value` is the stored value of the
/// terminal state that ended it, or 0 when the step cap cut it short (the
/// last step then carries the synthetic -1 failure reward).
#[derive(Debug, Clone)]
pub struct Episode<S> {
    pub steps: Vec<Step<S>>,
    pub terminal_value: f64,
}

impl<S> Episode<S> {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Per-episode histories of a control run, for charting.
#[derive(Debug, Clone)]
pub struct McResults {
    pub returns: Vec<f64>,
    pub lengths: Vec<usize>,
}

/// Walk the episode backward accumulating the discounted return and credit
/// each state once, at its occurrence closest to the episode's end. Returns
/// the discounted return of the whole episode.
pub fn first_visit_returns<S: Clone + Eq + Hash>(
    episode: &Episode<S>,
    gamma: f64,
    space: &StateSpace<S>,
    sums: &mut [f64],
    counts: &mut [u64],
) -> f64 {
    let mut g = episode.terminal_value;
    for t in (0..episode.steps.len()).rev() {
        let step = &episode.steps[t];
        g = gamma * g + step.reward;
        let seen_later = episode.steps[t + 1..].iter().any(|s| s.state == step.state);
        if seen_later {
            continue;
        }
        if let Some(idx) = space.index_of(&step.state) {
            sums[idx] += g;
            counts[idx] += 1;
        }
    }
    g
}

/// First-visit on-policy Monte Carlo control with an epsilon-greedy
/// behavior policy.
pub struct MonteCarloControl {
    gamma: f64,
    epsilon: f64,
    max_steps: usize,
    rng: StdRng,
}

impl MonteCarloControl {
    pub fn new(gamma: f64, epsilon: f64, max_steps: usize, seed: u64) -> Self {
        Self {
            gamma,
            epsilon,
            max_steps,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn should_explore(&mut self) -> bool {
        self.epsilon > 0.0 && self.rng.gen::<f64>() < self.epsilon
    }

    /// Simulate one trajectory from the start state. Exploration picks a
    /// uniformly random valid action, exploitation follows the target
    /// policy. Hitting the step cap before a terminal state closes the
    /// trajectory with a synthetic -1 step.
    pub fn simulate<E: Env>(
        &mut self,
        env: &E,
        space: &StateSpace<E::State>,
        policy: &Policy,
    ) -> Episode<E::State> {
        let mut steps = Vec::new();
        let mut state = env.start_state();
        loop {
            if env.is_terminal(&state) {
                return Episode {
                    steps,
                    terminal_value: env.initial_value(&state),
                };
            }
            if steps.len() >= self.max_steps {
                let action = policy.action_for(space, &state);
                steps.push(Step {
                    state,
                    action,
                    reward: -1.0,
                });
                return Episode {
                    steps,
                    terminal_value: 0.0,
                };
            }
            let action = if self.should_explore() {
                let valid = env.valid_actions(&state);
                if valid.is_empty() {
                    policy.action_for(space, &state)
                } else {
                    valid[self.rng.gen_range(0..valid.len())]
                }
            } else {
                policy.action_for(space, &state)
            };
            let next = env.next_state(&state, action);
            let reward = if env.is_terminal(&next) {
                0.0
            } else {
                env.reward(&state, action)
            };
            steps.push(Step {
                state,
                action,
                reward,
            });
            state = next;
        }
    }

    /// Run `n_episodes` episodes, refreshing the value estimates and the
    /// greedy target policy after every one. The next episode's behavior
    /// depends on the refreshed policy.
    pub fn run<E: Env>(
        &mut self,
        env: &E,
        space: &StateSpace<E::State>,
        policy: &mut Policy,
        values: &mut ValueFunction,
        n_episodes: usize,
    ) -> McResults {
        let mut sums = vec![0.0; space.len()];
        let mut counts = vec![0u64; space.len()];
        let mut returns = Vec::with_capacity(n_episodes);
        let mut lengths = Vec::with_capacity(n_episodes);

        let mut pb = tqdm!(total = n_episodes);
        for _ in 0..n_episodes {
            let episode = self.simulate(env, space, policy);
            lengths.push(episode.len());
            returns.push(first_visit_returns(
                &episode, self.gamma, space, &mut sums, &mut counts,
            ));
            // States never visited keep their initial value, in particular
            // terminal states keep the value their returns bootstrap from.
            for idx in 0..space.len() {
                if counts[idx] > 0 {
                    values.set(idx, sums[idx] / counts[idx] as f64);
                }
            }
            policy_improvement(env, space, values, policy);
            match pb.update(1) {
                Ok(_) => (),
                Err(e) => panic!("{}", e),
            }
        }
        McResults { returns, lengths }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::GridWorldEnv;
    use crate::map::{Map, Position};

    fn corridor(length: i32) -> GridWorldEnv {
        GridWorldEnv::new(Map::grid(
            length,
            1,
            vec![],
            Position::new(0, 0),
            Position::new(length - 1, 0),
        ))
    }

    #[test]
    fn step_cap_appends_synthetic_failure() {
        let env = corridor(3);
        let space = StateSpace::new(&env);
        let mut policy = Policy::new(space.len());
        for idx in 0..space.len() {
            policy.set(idx, Action::Left);
        }
        // Greedy behavior under a policy that never reaches the terminal.
        let mut mc = MonteCarloControl::new(0.9, 0.0, 5, 1);
        let episode = mc.simulate(&env, &space, &policy);
        assert_eq!(episode.len(), 6);
        assert_eq!(episode.steps.last().unwrap().reward, -1.0);
        assert_eq!(episode.terminal_value, 0.0);
    }

    #[test]
    fn completed_episode_bootstraps_from_terminal_value() {
        let env = corridor(3);
        let space = StateSpace::new(&env);
        let mut policy = Policy::new(space.len());
        for idx in 0..space.len() {
            policy.set(idx, Action::Right);
        }
        let mut mc = MonteCarloControl::new(0.9, 0.0, 50, 1);
        let episode = mc.simulate(&env, &space, &policy);
        assert_eq!(episode.len(), 2);
        assert_eq!(episode.terminal_value, 1.0);
        assert!(episode.steps.iter().all(|s| s.reward == 0.0));

        let mut sums = vec![0.0; space.len()];
        let mut counts = vec![0u64; space.len()];
        let g = first_visit_returns(&episode, 0.9, &space, &mut sums, &mut counts);
        let near = space.index_of(&Position::new(1, 0)).unwrap();
        let start = space.index_of(&Position::new(0, 0)).unwrap();
        assert!((sums[near] - 0.9).abs() < 1e-12);
        assert!((sums[start] - 0.81).abs() < 1e-12);
        assert!((g - 0.81).abs() < 1e-12);
    }

    #[test]
    fn twice_visited_state_is_credited_once_from_the_final_occurrence() {
        let env = corridor(3);
        let space = StateSpace::new(&env);
        let a = Position::new(0, 0);
        let b = Position::new(1, 0);
        let episode = Episode {
            steps: vec![
                Step { state: a, action: Action::Right, reward: 0.0 },
                Step { state: b, action: Action::Left, reward: 0.0 },
                Step { state: a, action: Action::Right, reward: 0.0 },
                Step { state: b, action: Action::Right, reward: 0.0 },
            ],
            terminal_value: 1.0,
        };
        let mut sums = vec![0.0; space.len()];
        let mut counts = vec![0u64; space.len()];
        first_visit_returns(&episode, 0.9, &space, &mut sums, &mut counts);

        let ia = space.index_of(&a).unwrap();
        let ib = space.index_of(&b).unwrap();
        assert_eq!(counts[ia], 1);
        assert_eq!(counts[ib], 1);
        // Credited at the occurrence closest to the end: G = 0.9^2 for a,
        // G = 0.9 for b. The earlier passes through both are not summed.
        assert!((sums[ia] - 0.81).abs() < 1e-12);
        assert!((sums[ib] - 0.9).abs() < 1e-12);
    }
}
