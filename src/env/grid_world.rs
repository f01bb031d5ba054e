use fxhash::FxHashSet;

use crate::env::{Action, ActionFilter, Env, ObstacleRule};
use crate::map::{Map, Position};
use crate::policy::{Policy, StateSpace, ValueFunction};

/// Navigation over a rectangular grid with walls and a single terminal cell.
#[derive(Debug, Clone)]
pub struct GridWorldEnv {
    map: Map,
    obstacles: FxHashSet<Position>,
    filter: ActionFilter,
    rule: ObstacleRule,
}

impl GridWorldEnv {
    pub fn new(map: Map) -> Self {
        Self::with_rules(map, ActionFilter::BoundsAndObstacles, ObstacleRule::Bounce)
    }

    pub fn with_rules(map: Map, filter: ActionFilter, rule: ObstacleRule) -> Self {
        let obstacles = map.obstacles.iter().copied().collect();
        Self {
            map,
            obstacles,
            filter,
            rule,
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    fn blocked(&self, pos: Position) -> bool {
        !self.map.in_bounds(pos) || self.obstacles.contains(&pos)
    }

    /// One row per line, top row first: `#` walls, `T` the terminal cell,
    /// arrow glyphs for mapped states and `.` for unmapped ones.
    pub fn render_policy(&self, space: &StateSpace<Position>, policy: &Policy) -> String {
        let mut out = String::new();
        for y in (0..self.map.height).rev() {
            for x in 0..self.map.width {
                let pos = Position::new(x, y);
                let glyph = if self.obstacles.contains(&pos) {
                    '#'
                } else if self.is_terminal(&pos) {
                    'T'
                } else {
                    match space.index_of(&pos).and_then(|idx| policy.lookup(idx)) {
                        Some(action) => action.glyph(),
                        None => '.',
                    }
                };
                out.push(glyph);
                out.push('\t');
            }
            out.push('\n');
        }
        out
    }

    /// One row per line, top row first, two decimals per cell. Walls and
    /// unknown cells read as 0.00.
    pub fn render_values(&self, space: &StateSpace<Position>, values: &ValueFunction) -> String {
        let mut out = String::new();
        for y in (0..self.map.height).rev() {
            for x in 0..self.map.width {
                let pos = Position::new(x, y);
                out.push_str(&format!("{:.2}\t", values.value_of(space, &pos)));
            }
            out.push('\n');
        }
        out
    }
}

impl Env for GridWorldEnv {
    type State = Position;

    fn states(&self) -> Vec<Position> {
        let mut states = Vec::new();
        for x in 0..self.map.width {
            for y in 0..self.map.height {
                let pos = Position::new(x, y);
                if !self.obstacles.contains(&pos) {
                    states.push(pos);
                }
            }
        }
        states
    }

    fn valid_actions(&self, state: &Position) -> Vec<Action> {
        Action::ALL
            .iter()
            .copied()
            .filter(|action| {
                let (dx, dy) = action.delta();
                let dest = state.shifted(dx, dy);
                match self.filter {
                    ActionFilter::Bounds => self.map.in_bounds(dest),
                    ActionFilter::BoundsAndObstacles => !self.blocked(dest),
                }
            })
            .collect()
    }

    fn next_state(&self, state: &Position, action: Action) -> Position {
        let (dx, dy) = action.delta();
        let dest = state.shifted(dx, dy);
        if self.blocked(dest) {
            *state
        } else {
            dest
        }
    }

    fn reward(&self, state: &Position, action: Action) -> f64 {
        let (dx, dy) = action.delta();
        let dest = state.shifted(dx, dy);
        if self.rule == ObstacleRule::Penalize && self.obstacles.contains(&dest) {
            return -1.0;
        }
        if self.is_terminal(&self.next_state(state, action)) {
            1.0
        } else {
            0.0
        }
    }

    fn is_terminal(&self, state: &Position) -> bool {
        self.map.terminal == Some(*state)
    }

    fn start_state(&self) -> Position {
        self.map.start
    }
}
