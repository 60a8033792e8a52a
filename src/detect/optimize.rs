//! Weighted optimum over the reachable list: an integer program and a
//! linear scan that serves as its reference.
use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::ilp::{Direction, IlpModel, LinearExpr, SelectionModel, SolveStatus};
use crate::net::{Idx, Marking, Net};

#[derive(Debug, Clone, PartialEq)]
pub struct OptimumOutcome {
    /// Maximizing marking and its weight.
    pub best: Option<(Marking, i64)>,
    /// Solver status; `None` for the scan or when nothing was solved.
    pub status: Option<SolveStatus>,
    pub solve_time: Duration,
}

impl OptimumOutcome {
    fn none() -> Self {
        Self {
            best: None,
            status: None,
            solve_time: Duration::ZERO,
        }
    }

    pub fn value(&self) -> Option<i64> {
        self.best.as_ref().map(|(_, value)| *value)
    }
}

/// Weight vector from place names; unlisted places get `default`.
pub fn weights_with_default(net: &Net, named: &IndexMap<String, i64>, default: i64) -> Vec<i64> {
    let mut weights = vec![default; net.places_len()];
    for (name, &weight) in named {
        match net.place_id(name) {
            Some(place) => weights[place.index()] = weight,
            None => log::warn!("net '{}': weight given for unknown place '{}'", net.name, name),
        }
    }
    weights
}

/// Weight vector from place names; unlisted places weigh zero.
pub fn weights_from_names(net: &Net, named: &IndexMap<String, i64>) -> Vec<i64> {
    weights_with_default(net, named, 0)
}

pub struct WeightedOptimizer<'a> {
    net: &'a Net,
    reachable: &'a [Marking],
    weights: Vec<i64>,
}

impl<'a> WeightedOptimizer<'a> {
    /// Missing trailing weights count as zero.
    pub fn new(net: &'a Net, reachable: &'a [Marking], mut weights: Vec<i64>) -> Self {
        weights.resize(net.places_len(), 0);
        Self {
            net,
            reachable,
            weights,
        }
    }

    pub fn weights(&self) -> &[i64] {
        &self.weights
    }

    /// Selection rows plus `max Σ w_p·M_p`.
    pub fn build_model(&self) -> (IlpModel, SelectionModel) {
        let mut model = IlpModel::new(format!("{}-optimum", self.net.name));
        let selection = SelectionModel::build(&mut model, self.reachable, self.net.places_len());
        let objective = selection
            .marking
            .iter()
            .zip(&self.weights)
            .fold(LinearExpr::new(), |expr, (&m_p, &w)| expr.with_term(m_p, w as f64));
        model.set_objective(objective, Direction::Maximize);
        (model, selection)
    }

    pub fn optimize_ilp(&self) -> OptimumOutcome {
        if self.reachable.is_empty() {
            return OptimumOutcome::none();
        }

        let (model, selection) = self.build_model();
        let start = Instant::now();
        let solution = model.solve();
        let solve_time = start.elapsed();

        // Report the weight of the decoded marking, not the solver's
        // floating-point objective.
        let best = selection.decode(&solution).map(|marking| {
            let value = marking.weighted_sum(&self.weights);
            (marking, value)
        });
        match &best {
            Some((marking, value)) => log::info!(
                "net '{}': optimum {} at {}",
                self.net.name,
                value,
                self.net.format_marking(marking)
            ),
            None => log::warn!("net '{}': optimizer returned {}", self.net.name, solution.status),
        }

        OptimumOutcome {
            best,
            status: Some(solution.status),
            solve_time,
        }
    }

    /// First maximizer in list order.
    pub fn optimize_scan(&self) -> OptimumOutcome {
        let start = Instant::now();
        let mut best: Option<(&Marking, i64)> = None;
        for marking in self.reachable {
            let value = marking.weighted_sum(&self.weights);
            if best.is_none_or(|(_, current)| value > current) {
                best = Some((marking, value));
            }
        }
        OptimumOutcome {
            best: best.map(|(marking, value)| (marking.clone(), value)),
            status: None,
            solve_time: start.elapsed(),
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

    fn reachable() -> Vec<Marking> {
        vec![Marking::from_bits(&[1, 0, 0]), Marking::from_bits(&[0, 1, 1])]
    }

    #[test]
    fn uniform_weights_prefer_more_tokens() {
        let net = fork();
        let list = reachable();
        let optimizer = WeightedOptimizer::new(&net, &list, vec![1; 3]);
        let ilp = optimizer.optimize_ilp();
        assert_eq!(ilp.best, Some((Marking::from_bits(&[0, 1, 1]), 2)));
        assert_eq!(ilp.status, Some(SolveStatus::Optimal));
        assert_eq!(optimizer.optimize_scan().best, ilp.best);
    }

    #[test]
    fn heavy_initial_place_wins() {
        let net = fork();
        let list = reachable();
        let optimizer = WeightedOptimizer::new(&net, &list, vec![5, 1, 1]);
        assert_eq!(optimizer.optimize_ilp().value(), Some(5));
        assert_eq!(optimizer.optimize_scan().value(), Some(5));
    }

    #[test]
    fn empty_list_reports_nothing() {
        let net = fork();
        let optimizer = WeightedOptimizer::new(&net, &[], vec![1; 3]);
        assert_eq!(optimizer.optimize_ilp().best, None);
        assert_eq!(optimizer.optimize_scan().best, None);
    }

    #[test]
    fn named_weights_map_to_places() {
        let net = fork();
        let mut named = IndexMap::new();
        named.insert("p2".to_string(), 4);
        named.insert("ghost".to_string(), 9);
        assert_eq!(weights_from_names(&net, &named), vec![0, 0, 4]);
        assert_eq!(weights_with_default(&net, &named, 1), vec![1, 1, 4]);
    }

    #[test]
    fn short_weight_vector_is_padded() {
        let net = fork();
        let list = reachable();
        let optimizer = WeightedOptimizer::new(&net, &list, vec![2]);
        assert_eq!(optimizer.weights(), &[2, 0, 0]);
    }
}
