//! Queries answered over the explicit reachable list.

pub mod deadlock;
pub mod optimize;

pub use deadlock::{DeadlockOutcome, DeadlockSolver};
pub use optimize::{OptimumOutcome, WeightedOptimizer, weights_from_names, weights_with_default};
