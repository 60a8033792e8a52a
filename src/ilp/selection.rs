//! Pick exactly one marking out of an explicit candidate list.
//!
//! Declares a binary `M_p` per place and a selector `y_i` per candidate,
//! then adds
//!
//! * `Σ y_i = 1`
//! * `M_p = Σ y_i · reach[i][p]` for every place `p`.
//!
//! Any feasible point of a model carrying these rows has `M` equal to one
//! of the candidates.
use crate::ilp::model::{IlpModel, IlpSolution, LinearExpr, Sense, VarId};
use crate::net::Marking;

#[derive(Debug, Clone)]
pub struct SelectionModel {
    /// `M_p`, indexed by place.
    pub marking: Vec<VarId>,
    /// `y_i`, indexed by candidate.
    pub selectors: Vec<VarId>,
}

impl SelectionModel {
    pub fn build(model: &mut IlpModel, candidates: &[Marking], places: usize) -> Self {
        let marking: Vec<VarId> = (0..places)
            .map(|place| model.add_binary(format!("M_{place}")))
            .collect();
        let selectors: Vec<VarId> = (0..candidates.len())
            .map(|idx| model.add_binary(format!("y_{idx}")))
            .collect();

        model.add_constraint(LinearExpr::sum(selectors.iter().copied()), Sense::Eq, 1.0);

        for (place, &m_p) in marking.iter().enumerate() {
            let mut row = LinearExpr::new().with_term(m_p, 1.0);
            for (candidate, &y_i) in candidates.iter().zip(&selectors) {
                if candidate.bits().get(place).is_some_and(|bit| *bit != 0) {
                    row.add_term(y_i, -1.0);
                }
            }
            model.add_constraint(row, Sense::Eq, 0.0);
        }

        Self { marking, selectors }
    }

    /// Reads the chosen marking from `M`, rounding each value.
    pub fn decode(&self, solution: &IlpSolution) -> Option<Marking> {
        if !solution.is_optimal() {
            return None;
        }
        let bits = self
            .marking
            .iter()
            .map(|&var| solution.bit(var))
            .collect::<Option<Vec<u8>>>()?;
        Some(Marking::from_bits(&bits))
    }

    pub fn selected(&self, solution: &IlpSolution) -> Option<usize> {
        self.selectors
            .iter()
            .position(|&var| solution.bit(var) == Some(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ilp::model::Direction;

    #[test]
    fn selection_binds_marking_to_a_candidate() {
        let candidates = vec![Marking::from_bits(&[1, 0]), Marking::from_bits(&[0, 1])];
        let mut model = IlpModel::new("select");
        let selection = SelectionModel::build(&mut model, &candidates, 2);
        assert_eq!(model.variable_count(), 4);
        assert_eq!(model.constraint_count(), 3);

        // Force the second place on; only candidate 1 qualifies.
        model.add_constraint(LinearExpr::sum([selection.marking[1]]), Sense::Eq, 1.0);
        model.set_objective(LinearExpr::new(), Direction::Feasibility);
        let solution = model.solve();

        assert_eq!(selection.decode(&solution), Some(candidates[1].clone()));
        assert_eq!(selection.selected(&solution), Some(1));
    }

    #[test]
    fn unsatisfiable_pin_decodes_to_none() {
        let candidates = vec![Marking::from_bits(&[1, 0])];
        let mut model = IlpModel::new("select");
        let selection = SelectionModel::build(&mut model, &candidates, 2);
        model.add_constraint(LinearExpr::sum([selection.marking[1]]), Sense::Eq, 1.0);
        let solution = model.solve();
        assert_eq!(selection.decode(&solution), None);
    }
}
