use fxhash::FxHashSet;
use itertools::Itertools;

use crate::env::{Action, ActionFilter, Env, ObstacleRule};
use crate::map::{Map, Position};

/// A player position together with the crate cells. The crate list is kept
/// sorted so the derived equality and hash ignore insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SokobanState {
    player: Position,
    crates: Vec<Position>,
}

impl SokobanState {
    pub fn new(player: Position, mut crates: Vec<Position>) -> Self {
        crates.sort_unstable();
        Self { player, crates }
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn crates(&self) -> &[Position] {
        &self.crates
    }

    pub fn has_crate(&self, pos: Position) -> bool {
        self.crates.binary_search(&pos).is_ok()
    }

    fn with_crate_moved(&self, player: Position, from: Position, to: Position) -> Self {
        let crates = self
            .crates
            .iter()
            .map(|&c| if c == from { to } else { c })
            .collect();
        Self::new(player, crates)
    }
}

/// Box pushing on a walled grid. A state is solved when every target cell
/// holds a crate.
#[derive(Debug, Clone)]
pub struct SokobanEnv {
    map: Map,
    obstacles: FxHashSet<Position>,
    filter: ActionFilter,
    rule: ObstacleRule,
}

impl SokobanEnv {
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

    fn free_cells(&self) -> Vec<Position> {
        let mut cells = Vec::new();
        for x in 0..self.map.width {
            for y in 0..self.map.height {
                let pos = Position::new(x, y);
                if !self.obstacles.contains(&pos) {
                    cells.push(pos);
                }
            }
        }
        cells
    }
}

impl Env for SokobanEnv {
    type State = SokobanState;

    /// Every player cell combined with every placement of the crates on the
    /// remaining free cells. This enumeration is combinatorial on purpose,
    /// the solvers sweep the whole configuration space.
    fn states(&self) -> Vec<SokobanState> {
        let free = self.free_cells();
        let n_crates = self.map.crates.len();
        let mut states = Vec::new();
        for &player in &free {
            let others: Vec<Position> = free.iter().copied().filter(|&c| c != player).collect();
            for crates in others.into_iter().combinations(n_crates) {
                states.push(SokobanState::new(player, crates));
            }
        }
        states
    }

    fn valid_actions(&self, state: &SokobanState) -> Vec<Action> {
        Action::ALL
            .iter()
            .copied()
            .filter(|action| {
                let (dx, dy) = action.delta();
                let dest = state.player().shifted(dx, dy);
                match self.filter {
                    ActionFilter::Bounds => self.map.in_bounds(dest),
                    ActionFilter::BoundsAndObstacles => !self.blocked(dest),
                }
            })
            .collect()
    }

    /// Walking into a crate pushes it one cell further when that cell is
    /// free; a blocked push, a wall or the grid edge all bounce.
    fn next_state(&self, state: &SokobanState, action: Action) -> SokobanState {
        let (dx, dy) = action.delta();
        let dest = state.player().shifted(dx, dy);
        if self.blocked(dest) {
            return state.clone();
        }
        if state.has_crate(dest) {
            let crate_dest = dest.shifted(dx, dy);
            if self.blocked(crate_dest) || state.has_crate(crate_dest) {
                return state.clone();
            }
            return state.with_crate_moved(dest, dest, crate_dest);
        }
        SokobanState::new(dest, state.crates().to_vec())
    }

    fn reward(&self, state: &SokobanState, action: Action) -> f64 {
        let (dx, dy) = action.delta();
        let dest = state.player().shifted(dx, dy);
        if self.rule == ObstacleRule::Penalize && self.obstacles.contains(&dest) {
            return -1.0;
        }
        if self.is_terminal(&self.next_state(state, action)) {
            1.0
        } else {
            0.0
        }
    }

    fn is_terminal(&self, state: &SokobanState) -> bool {
        self.map.targets.iter().all(|&t| state.has_crate(t))
    }

    fn start_state(&self) -> SokobanState {
        SokobanState::new(self.map.start, self.map.crates.clone())
    }

    /// Fraction of target cells already covered by a crate.
    fn initial_value(&self, state: &SokobanState) -> f64 {
        if self.map.targets.is_empty() {
            return 0.0;
        }
        let covered = self
            .map
            .targets
            .iter()
            .filter(|&&t| state.has_crate(t))
            .count();
        covered as f64 / self.map.targets.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhash::FxHashMap;

    fn small_map() -> Map {
        // 4x4 room, one wall, one crate, one target.
        Map::sokoban(
            4,
            4,
            vec![Position::new(1, 2)],
            vec![Position::new(3, 3)],
            Position::new(0, 0),
            vec![Position::new(1, 1)],
        )
    }

    #[test]
    fn crate_order_does_not_matter() {
        let a = SokobanState::new(
            Position::new(0, 0),
            vec![Position::new(2, 1), Position::new(1, 2)],
        );
        let b = SokobanState::new(
            Position::new(0, 0),
            vec![Position::new(1, 2), Position::new(2, 1)],
        );
        assert_eq!(a, b);

        let mut map: FxHashMap<SokobanState, i32> = FxHashMap::default();
        map.insert(a, 1);
        assert_eq!(map.get(&b), Some(&1));
    }

    #[test]
    fn enumeration_covers_player_times_crate_placements() {
        let env = SokobanEnv::new(small_map());
        // 15 free cells, one crate: 15 player cells times 14 crate cells.
        assert_eq!(env.states().len(), 15 * 14);
    }

    #[test]
    fn push_against_a_wall_bounces() {
        let env = SokobanEnv::new(small_map());
        let state = SokobanState::new(Position::new(1, 0), vec![Position::new(1, 1)]);
        // (1, 2) is a wall, so this push is blocked and the move bounces.
        assert_eq!(env.next_state(&state, Action::Up), state);
    }

    #[test]
    fn free_push_moves_player_and_crate() {
        let env = SokobanEnv::new(small_map());
        let state = SokobanState::new(Position::new(0, 1), vec![Position::new(1, 1)]);
        let next = env.next_state(&state, Action::Right);
        assert_eq!(next.player(), Position::new(1, 1));
        assert!(next.has_crate(Position::new(2, 1)));
        assert!(!next.has_crate(Position::new(1, 1)));
    }

    #[test]
    fn push_into_another_crate_bounces() {
        let env = SokobanEnv::new(Map::sokoban(
            4,
            4,
            vec![],
            vec![Position::new(3, 3)],
            Position::new(0, 1),
            vec![Position::new(1, 1), Position::new(2, 1)],
        ));
        let state = env.start_state();
        assert_eq!(env.next_state(&state, Action::Right), state);
    }

    #[test]
    fn terminal_means_every_target_covered() {
        let env = SokobanEnv::new(small_map());
        let solved = SokobanState::new(Position::new(0, 0), vec![Position::new(3, 3)]);
        let unsolved = SokobanState::new(Position::new(0, 0), vec![Position::new(2, 2)]);
        assert!(env.is_terminal(&solved));
        assert!(!env.is_terminal(&unsolved));
    }

    #[test]
    fn initial_value_scores_covered_targets() {
        let map = Map::sokoban(
            5,
            5,
            vec![],
            vec![Position::new(1, 1), Position::new(2, 2)],
            Position::new(0, 0),
            vec![Position::new(1, 1), Position::new(3, 3)],
        );
        let env = SokobanEnv::new(map);
        let state = env.start_state();
        assert_eq!(env.initial_value(&state), 0.5);
        let solved = SokobanState::new(
            Position::new(0, 0),
            vec![Position::new(1, 1), Position::new(2, 2)],
        );
        assert_eq!(env.initial_value(&solved), 1.0);
    }
}
