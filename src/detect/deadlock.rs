//! Deadlock detection as a 0/1 feasibility program over the explicit
//! reachable list.
use std::time::{Duration, Instant};

use crate::ilp::{Direction, IlpModel, LinearExpr, SelectionModel, Sense, SolveStatus};
use crate::net::{Idx, Marking, Net};

#[derive(Debug, Clone, PartialEq)]
pub struct DeadlockOutcome {
    /// A reachable marking with no enabled transition, if one exists.
    pub witness: Option<Marking>,
    /// `None` when the solver was not invoked (empty candidate list).
    pub status: Option<SolveStatus>,
    pub solve_time: Duration,
}

impl DeadlockOutcome {
    pub fn found(&self) -> bool {
        self.witness.is_some()
    }
}

pub struct DeadlockSolver<'a> {
    net: &'a Net,
    reachable: &'a [Marking],
}

impl<'a> DeadlockSolver<'a> {
    pub fn new(net: &'a Net, reachable: &'a [Marking]) -> Self {
        Self { net, reachable }
    }

    /// Builds the program without solving it.
    ///
    /// On top of the selection rows, each transition `t` with pre-set size
    /// `K > 0` gets an indicator `z_t` and
    ///
    /// ```text
    /// Σ_{p ∈ pre(t)} M_p ≥ K·z_t
    /// Σ_{p ∈ pre(t)} M_p ≤ (K − 1) + K·z_t
    /// ```
    ///
    /// so `z_t = 1` exactly when `t` is enabled at `M`. An empty pre-set pins
    /// `z_t = 1`. Finally `Σ z_t = 0`.
    pub fn build_model(&self) -> (IlpModel, SelectionModel) {
        let mut model = IlpModel::new(format!("{}-deadlock", self.net.name));
        let selection = SelectionModel::build(&mut model, self.reachable, self.net.places_len());

        let mut indicators = Vec::with_capacity(self.net.transitions_len());
        for (tid, transition) in self.net.transitions.iter_enumerated() {
            let z = model.add_binary(format!("z_{}", tid.raw()));
            indicators.push(z);

            let k = transition.pre.len() as f64;
            if transition.pre.is_empty() {
                model.add_constraint(LinearExpr::sum([z]), Sense::Eq, 1.0);
                continue;
            }

            let tokens = LinearExpr::sum(
                transition
                    .pre
                    .iter()
                    .map(|place| selection.marking[place.index()]),
            );
            model.add_constraint(tokens.clone().with_term(z, -k), Sense::Ge, 0.0);
            model.add_constraint(tokens.with_term(z, -k), Sense::Le, k - 1.0);
        }

        if !indicators.is_empty() {
            model.add_constraint(LinearExpr::sum(indicators), Sense::Eq, 0.0);
        }
        model.set_objective(LinearExpr::new(), Direction::Feasibility);
        (model, selection)
    }

    pub fn find(&self) -> DeadlockOutcome {
        if self.reachable.is_empty() {
            log::info!("net '{}': no reachable markings, deadlock query skipped", self.net.name);
            return DeadlockOutcome {
                witness: None,
                status: None,
                solve_time: Duration::ZERO,
            };
        }

        let (model, selection) = self.build_model();
        let start = Instant::now();
        let solution = model.solve();
        let solve_time = start.elapsed();

        let witness = selection.decode(&solution);
        if let Some(marking) = &witness {
            debug_assert!(self.net.is_deadlock(marking));
            log::info!(
                "net '{}': deadlock at {}",
                self.net.name,
                self.net.format_marking(marking)
            );
        } else {
            log::info!("net '{}': no deadlock ({})", self.net.name, solution.status);
        }

        DeadlockOutcome {
            witness,
            status: Some(solution.status),
            solve_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::NetBuilder;

    fn fork() -> Net {
        let mut builder = NetBuilder::new("fork");
        builder
            .add_place("p0", true)
            .add_place("p1", false)
            .add_place("p2", false)
            .add_transition("t0")
            .add_arc("p0", "t0")
            .add_arc("t0", "p1")
            .add_arc("t0", "p2");
        builder.build()
    }

    #[test]
    fn fork_deadlocks_after_firing() {
        let net = fork();
        let reachable = vec![Marking::from_bits(&[1, 0, 0]), Marking::from_bits(&[0, 1, 1])];
        let outcome = DeadlockSolver::new(&net, &reachable).find();
        assert_eq!(outcome.witness, Some(Marking::from_bits(&[0, 1, 1])));
        assert_eq!(outcome.status, Some(SolveStatus::Optimal));
    }

    #[test]
    fn empty_list_skips_the_solver() {
        let net = fork();
        let outcome = DeadlockSolver::new(&net, &[]).find();
        assert!(!outcome.found());
        assert_eq!(outcome.status, None);
    }

    #[test]
    fn live_markings_are_infeasible() {
        let net = fork();
        let reachable = vec![Marking::from_bits(&[1, 0, 0])];
        let outcome = DeadlockSolver::new(&net, &reachable).find();
        assert_eq!(outcome.witness, None);
        assert_ne!(outcome.status, Some(SolveStatus::Optimal));
    }

    #[test]
    fn always_enabled_transition_rules_out_deadlock() {
        let mut builder = NetBuilder::new("source");
        builder
            .add_place("a", false)
            .add_transition("gen")
            .add_arc("gen", "a");
        let net = builder.build();
        let reachable = vec![Marking::from_bits(&[0]), Marking::from_bits(&[1])];
        assert!(!DeadlockSolver::new(&net, &reachable).find().found());
    }

    #[test]
    fn model_has_one_indicator_per_transition() {
        let net = fork();
        let reachable = vec![Marking::from_bits(&[1, 0, 0])];
        let (model, _) = DeadlockSolver::new(&net, &reachable).build_model();
        // M_0..M_2, y_0, z_0
        assert_eq!(model.variable_count(), 5);
        // Σy, three tie rows, two indicator rows, Σz
        assert_eq!(model.constraint_count(), 7);
    }
}
