use crate::env::{Action, Env};
use crate::policy::{Policy, StateSpace, ValueFunction};

/// Combined sweep: each non-terminal state takes the best one-step backup
/// over its valid actions, and the policy records the argmax in the same
/// pass. The policy is a byproduct of the current sweep and keeps moving
/// until the value change settles below `theta`. Returns the sweep count.
pub fn value_iteration<E: Env>(
    env: &E,
    space: &StateSpace<E::State>,
    policy: &mut Policy,
    values: &mut ValueFunction,
    gamma: f64,
    theta: f64,
) -> usize {
    let mut sweeps = 0;
    loop {
        sweeps += 1;
        let mut delta: f64 = 0.0;
        for idx in 0..space.len() {
            let state = space.state(idx);
            if env.is_terminal(state) {
                continue;
            }
            let old = values.get(idx);
            let mut best_value = f64::NEG_INFINITY;
            let mut best_action = Action::DEFAULT;
            for action in env.valid_actions(state) {
                let next = env.next_state(state, action);
                let reward = if env.is_terminal(&next) {
                    0.0
                } else {
                    env.reward(state, action)
                };
                let value = reward + gamma * values.value_of(space, &next);
                if value > best_value {
                    best_value = value;
                    best_action = action;
                }
            }
            if best_value == f64::NEG_INFINITY {
                continue;
            }
            values.set(idx, best_value);
            policy.set(idx, best_action);
            delta = delta.max((old - best_value).abs());
        }
        if delta < theta {
            return sweeps;
        }
    }
}
