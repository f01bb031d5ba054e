pub mod env;
pub mod map;
pub mod policy;
pub mod solver;
pub mod utils;

pub use env::{Action, ActionFilter, Env, GridWorldEnv, ObstacleRule, SokobanEnv, SokobanState};
pub use map::{Map, Position};
pub use policy::{advance, Policy, StateSpace, ValueFunction};
