pub mod monte_carlo;
pub mod policy_iteration;
pub mod value_iteration;

pub use monte_carlo::{Episode, McResults, MonteCarloControl, Step};
pub use policy_iteration::{policy_evaluation, policy_improvement, policy_iteration};
pub use value_iteration::value_iteration;

/// Default convergence threshold. Sweeps stop once the largest per-state
/// change drops below it.
pub const DEFAULT_THETA: f64 = 0.001;
