use std::fmt::Debug;
use std::hash::Hash;

mod grid_world;
mod sokoban;

pub use grid_world::GridWorldEnv;
pub use sokoban::{SokobanEnv, SokobanState};

/// The four moves shared by every environment variant. `ALL` fixes the
/// enumeration order, which is also the tie-break order of the greedy
/// solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Right,
    Down,
    Left,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Up, Action::Right, Action::Down, Action::Left];

    /// Fallback returned by policy lookups for unmapped states.
    pub const DEFAULT: Action = Action::Up;

    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (0, 1),
            Action::Right => (1, 0),
            Action::Down => (0, -1),
            Action::Left => (-1, 0),
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Action::Up => '^',
            Action::Right => '>',
            Action::Down => 'v',
            Action::Left => '<',
        }
    }
}

/// Which checks `valid_actions` applies to a candidate move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFilter {
    /// Only reject moves that leave the grid.
    Bounds,
    /// Also reject moves into an obstacle cell.
    BoundsAndObstacles,
}

/// What happens when a move runs into an obstacle cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleRule {
    /// Stay in place, no reward change.
    Bounce,
    /// Stay in place and take a -1 reward.
    Penalize,
}

/// Capability set of a finite deterministic MDP over grid cells.
///
/// `next_state` is total: any action from any state resolves to a successor,
/// bouncing in place when the move is blocked. Everything the solvers do
/// goes through this interface.
pub trait Env {
    type State: Clone + Eq + Hash + Debug;

    /// All states of the problem, in a stable order. Called once per solving
    /// session to build the state space.
    fn states(&self) -> Vec<Self::State>;

    /// Actions worth considering from `state`, in `Action::ALL` order.
    fn valid_actions(&self, state: &Self::State) -> Vec<Action>;

    /// Deterministic transition. Blocked moves return `state` unchanged.
    fn next_state(&self, state: &Self::State, action: Action) -> Self::State;

    /// +1 when the move enters a terminal state, 0 otherwise. Under
    /// `ObstacleRule::Penalize` an obstacle bounce costs -1 instead.
    fn reward(&self, state: &Self::State, action: Action) -> f64;

    fn is_terminal(&self, state: &Self::State) -> bool;

    fn start_state(&self) -> Self::State;

    /// Seed for the value table: 1 at terminal states, 0 elsewhere. Variants
    /// may score partially solved states in between.
    fn initial_value(&self, state: &Self::State) -> f64 {
        if self.is_terminal(state) {
            1.0
        } else {
            0.0
        }
    }
}
