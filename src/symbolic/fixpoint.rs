//! Bounded least-fixpoint iteration.
//!
//! `least_fixpoint` applies `step` until the value stops changing. For a
//! monotone step over a finite lattice of height `h` the loop needs at most
//! `h + 1` applications; a bound is passed in so that a non-monotone step
//! surfaces as an error instead of a hang.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixpointError {
    #[error("fixpoint not reached within {bound} iterations")]
    BoundExceeded { bound: u128 },
}

#[derive(Debug, Clone)]
pub struct Fixpoint<T> {
    pub value: T,
    /// Number of `step` applications, including the final one that
    /// confirmed stability.
    pub iterations: usize,
}

/// Iteration bound for a subset lattice over `places` Boolean variables:
/// `2^places + 1`, saturating.
pub fn subset_lattice_bound(places: usize) -> u128 {
    u32::try_from(places)
        .ok()
        .and_then(|shift| 1u128.checked_shl(shift))
        .map_or(u128::MAX, |states| states.saturating_add(1))
}

pub fn least_fixpoint<T, F>(seed: T, bound: u128, step: F) -> Result<Fixpoint<T>, FixpointError>
where
    T: PartialEq,
    F: FnMut(&T) -> T,
{
    least_fixpoint_by(seed, bound, step, |a, b| a == b)
}

/// Like [`least_fixpoint`], with stability decided by `same`.
pub fn least_fixpoint_by<T, F, E>(
    seed: T,
    bound: u128,
    mut step: F,
    same: E,
) -> Result<Fixpoint<T>, FixpointError>
where
    F: FnMut(&T) -> T,
    E: Fn(&T, &T) -> bool,
{
    let mut current = seed;
    let mut iterations: usize = 0;
    loop {
        if iterations as u128 >= bound {
            return Err(FixpointError::BoundExceeded { bound });
        }
        let next = step(&current);
        iterations += 1;
        if same(&next, &current) {
            return Ok(Fixpoint {
                value: current,
                iterations,
            });
        }
        current = next;
    }
}
