use std::hash::Hash;

use fxhash::{FxBuildHasher, FxHashMap};
use indexmap::IndexSet;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;

use crate::env::{Action, Env};

/// The enumerated states of one environment, each pinned to a canonical
/// index. Policy and value storage is keyed by that index so structural
/// hashing happens once, at enumeration time.
#[derive(Debug, Clone)]
pub struct StateSpace<S> {
    states: IndexSet<S, FxBuildHasher>,
}

impl<S: Clone + Eq + Hash> StateSpace<S> {
    pub fn new<E: Env<State = S>>(env: &E) -> Self {
        let states = env.states().into_iter().collect();
        Self { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn index_of(&self, state: &S) -> Option<usize> {
        self.states.get_index_of(state)
    }

    pub fn state(&self, idx: usize) -> &S {
        self.states
            .get_index(idx)
            .expect("state index out of range")
    }

    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.states.iter()
    }
}

/// Total mapping from state index to action. Unmapped entries read as
/// `Action::DEFAULT`; updates upsert and never remove.
#[derive(Debug, Clone)]
pub struct Policy {
    actions: Vec<Option<Action>>,
}

impl Policy {
    pub fn new(n_states: usize) -> Self {
        Self {
            actions: vec![None; n_states],
        }
    }

    /// A uniformly random valid action per state. States without a valid
    /// action stay unmapped.
    pub fn random<E: Env>(env: &E, space: &StateSpace<E::State>, rng: &mut StdRng) -> Self {
        let mut policy = Self::new(space.len());
        for idx in 0..space.len() {
            let valid = env.valid_actions(space.state(idx));
            if valid.is_empty() {
                continue;
            }
            policy.set(idx, valid[rng.gen_range(0..valid.len())]);
        }
        policy
    }

    pub fn action(&self, idx: usize) -> Action {
        self.lookup(idx).unwrap_or(Action::DEFAULT)
    }

    pub fn lookup(&self, idx: usize) -> Option<Action> {
        self.actions.get(idx).copied().flatten()
    }

    pub fn set(&mut self, idx: usize, action: Action) {
        if idx < self.actions.len() {
            self.actions[idx] = Some(action);
        }
    }

    pub fn action_for<S: Clone + Eq + Hash>(&self, space: &StateSpace<S>, state: &S) -> Action {
        space
            .index_of(state)
            .map_or(Action::DEFAULT, |idx| self.action(idx))
    }

    /// Immutable copy for external consumers. Live storage is never handed
    /// out, a reader must not observe a sweep in progress.
    pub fn snapshot<S: Clone + Eq + Hash>(&self, space: &StateSpace<S>) -> FxHashMap<S, Action> {
        let mut map = FxHashMap::default();
        for idx in 0..space.len() {
            if let Some(action) = self.lookup(idx) {
                map.insert(space.state(idx).clone(), action);
            }
        }
        map
    }
}

/// Scalar estimate per state index. Reads outside the table default to 0.
#[derive(Debug, Clone)]
pub struct ValueFunction {
    values: Array1<f64>,
}

impl ValueFunction {
    pub fn new<E: Env>(env: &E, space: &StateSpace<E::State>) -> Self {
        let values = (0..space.len())
            .map(|idx| env.initial_value(space.state(idx)))
            .collect();
        Self { values }
    }

    pub fn zeros(n_states: usize) -> Self {
        Self {
            values: Array1::zeros(n_states),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> f64 {
        self.values.get(idx).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, idx: usize, value: f64) {
        if let Some(slot) = self.values.get_mut(idx) {
            *slot = value;
        }
    }

    pub fn value_of<S: Clone + Eq + Hash>(&self, space: &StateSpace<S>, state: &S) -> f64 {
        space.index_of(state).map_or(0.0, |idx| self.get(idx))
    }

    pub fn snapshot<S: Clone + Eq + Hash>(&self, space: &StateSpace<S>) -> FxHashMap<S, f64> {
        let mut map = FxHashMap::default();
        for idx in 0..space.len() {
            map.insert(space.state(idx).clone(), self.get(idx));
        }
        map
    }
}

/// Advance one step through a fixed policy without touching any learning
/// state. This is the stepping interface handed to the presentation layer.
pub fn advance<E: Env>(
    env: &E,
    space: &StateSpace<E::State>,
    policy: &Policy,
    state: &E::State,
) -> E::State {
    env.next_state(state, policy.action_for(space, state))
}
