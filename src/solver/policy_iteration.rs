use crate::env::{Action, Env};
use crate::policy::{Policy, StateSpace, ValueFunction};

/// Fixed-point evaluation of a fixed policy. Sweeps every non-terminal
/// state in enumeration order and applies the one-step backup in place, so
/// later states in a sweep already see this sweep's updates. Repeats until
/// the largest change falls below `theta` and returns the sweep count.
///
/// There is no iteration cap: an environment with an undiscountable reward
/// cycle will keep the caller here forever, by contract.
pub fn policy_evaluation<E: Env>(
    env: &E,
    space: &StateSpace<E::State>,
    policy: &Policy,
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
            let action = policy.action(idx);
            let next = env.next_state(state, action);
            // The terminal's stored value supplies the return, the step
            // reward into it must not be counted on top.
            let reward = if env.is_terminal(&next) {
                0.0
            } else {
                env.reward(state, action)
            };
            let new = reward + gamma * values.value_of(space, &next);
            values.set(idx, new);
            delta = delta.max((old - new).abs());
        }
        if delta < theta {
            return sweeps;
        }
    }
}

/// Greedy policy update against `values`. Ties keep the first action in
/// enumeration order. Returns true when no state changed.
pub fn policy_improvement<E: Env>(
    env: &E,
    space: &StateSpace<E::State>,
    values: &ValueFunction,
    policy: &mut Policy,
) -> bool {
    let mut stable = true;
    for idx in 0..space.len() {
        let state = space.state(idx);
        if env.is_terminal(state) {
            continue;
        }
        let mut best_action = Action::DEFAULT;
        let mut best_value = f64::NEG_INFINITY;
        for action in env.valid_actions(state) {
            let next = env.next_state(state, action);
            let value = values.value_of(space, &next);
            if value > best_value {
                best_value = value;
                best_action = action;
            }
        }
        if best_value == f64::NEG_INFINITY {
            continue;
        }
        if policy.action(idx) != best_action {
            policy.set(idx, best_action);
            stable = false;
        }
    }
    stable
}

/// Alternates evaluation and improvement until the policy is stable.
/// Returns the number of outer iterations.
pub fn policy_iteration<E: Env>(
    env: &E,
    space: &StateSpace<E::State>,
    policy: &mut Policy,
    values: &mut ValueFunction,
    gamma: f64,
    theta: f64,
) -> usize {
    let mut iterations = 0;
    loop {
        iterations += 1;
        policy_evaluation(env, space, policy, values, gamma, theta);
        if policy_improvement(env, space, values, policy) {
            return iterations;
        }
    }
}
