//! Symbolic reachability: Boolean-set manager, bounded fixpoint iteration
//! and the forward-image engine built on them.

pub mod engine;
pub mod fixpoint;
pub mod manager;

pub use engine::{ReachabilityEngine, ReachableSet};
pub use fixpoint::{Fixpoint, FixpointError, least_fixpoint, least_fixpoint_by, subset_lattice_bound};
pub use manager::{BoolSetManager, Enumeration, Layer};
