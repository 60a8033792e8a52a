//! Solver-neutral 0/1 integer program, lowered to `good_lp` on solve.
use std::fmt;

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    solvers::microlp::microlp, variable,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Sum of the given variables, each with coefficient one.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|var| (var, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.constant == 0.0
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.0).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }

    fn lower(&self, handles: &[Variable]) -> Expression {
        self.terms
            .iter()
            .fold(Expression::from_other_affine(self.constant), |acc, (var, coef)| {
                acc + *coef * handles[var.0]
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Eq,
    Le,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Maximize,
    Minimize,
    /// No objective; any feasible point is optimal.
    Feasibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Failed(String),
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
            SolveStatus::Unbounded => write!(f, "unbounded"),
            SolveStatus::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IlpSolution {
    pub status: SolveStatus,
    /// One value per declared variable; empty unless `status` is optimal.
    pub values: Vec<f64>,
}

impl IlpSolution {
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    pub fn value(&self, var: VarId) -> Option<f64> {
        self.values.get(var.0).copied()
    }

    /// Binary value rounded to the nearest integer.
    pub fn bit(&self, var: VarId) -> Option<u8> {
        self.value(var).map(|value| u8::from(value >= 0.5))
    }
}

#[derive(Debug, Clone)]
struct Row {
    expr: LinearExpr,
    sense: Sense,
    rhs: f64,
}

#[derive(Debug, Clone)]
pub struct IlpModel {
    name: String,
    variables: Vec<String>,
    rows: Vec<Row>,
    objective: LinearExpr,
    direction: Direction,
}

impl IlpModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            rows: Vec::new(),
            objective: LinearExpr::new(),
            direction: Direction::Feasibility,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.variables.push(name.into());
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(&mut self, expr: LinearExpr, sense: Sense, rhs: f64) {
        self.rows.push(Row { expr, sense, rhs });
    }

    pub fn set_objective(&mut self, expr: LinearExpr, direction: Direction) {
        self.objective = expr;
        self.direction = direction;
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.rows.len()
    }

    pub fn variable_name(&self, var: VarId) -> Option<&str> {
        self.variables.get(var.0).map(String::as_str)
    }

    pub fn solve(&self) -> IlpSolution {
        log::debug!(
            "ilp '{}': {} binaries, {} constraints, {:?}",
            self.name,
            self.variables.len(),
            self.rows.len(),
            self.direction
        );

        let mut problem = ProblemVariables::new();
        let handles: Vec<Variable> = self
            .variables
            .iter()
            .map(|name| problem.add(variable().binary().name(name.clone())))
            .collect();

        let objective = self.objective.lower(&handles);
        let unsolved = match self.direction {
            Direction::Maximize => problem.maximise(objective),
            Direction::Minimize => problem.minimise(objective),
            Direction::Feasibility => problem.minimise(Expression::from_other_affine(0.0)),
        };

        let mut model = unsolved.using(microlp);
        for row in &self.rows {
            let lhs = row.expr.lower(&handles);
            model = model.with(match row.sense {
                Sense::Eq => constraint::eq(lhs, row.rhs),
                Sense::Le => constraint::leq(lhs, row.rhs),
                Sense::Ge => constraint::geq(lhs, row.rhs),
            });
        }

        let (status, values) = match model.solve() {
            Ok(solution) => (
                SolveStatus::Optimal,
                handles.iter().map(|&handle| solution.value(handle)).collect(),
            ),
            Err(ResolutionError::Infeasible) => (SolveStatus::Infeasible, Vec::new()),
            Err(ResolutionError::Unbounded) => (SolveStatus::Unbounded, Vec::new()),
            Err(err) => (SolveStatus::Failed(err.to_string()), Vec::new()),
        };
        log::debug!("ilp '{}': {}", self.name, status);
        IlpSolution { status, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_heavier_binary() {
        let mut model = IlpModel::new("choose");
        let a = model.add_binary("a");
        let b = model.add_binary("b");
        model.add_constraint(LinearExpr::sum([a, b]), Sense::Le, 1.0);
        model.set_objective(
            LinearExpr::new().with_term(a, 2.0).with_term(b, 3.0),
            Direction::Maximize,
        );
        let solution = model.solve();
        assert!(solution.is_optimal());
        assert_eq!(solution.bit(a), Some(0));
        assert_eq!(solution.bit(b), Some(1));
    }

    #[test]
    fn contradictory_rows_are_infeasible() {
        let mut model = IlpModel::new("clash");
        let a = model.add_binary("a");
        model.add_constraint(LinearExpr::sum([a]), Sense::Ge, 1.0);
        model.add_constraint(LinearExpr::sum([a]), Sense::Le, 0.0);
        let solution = model.solve();
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(solution.values.is_empty());
        assert_eq!(solution.value(a), None);
    }

    #[test]
    fn feasibility_respects_equalities() {
        let mut model = IlpModel::new("pin");
        let a = model.add_binary("a");
        let b = model.add_binary("b");
        model.add_constraint(LinearExpr::sum([a, b]), Sense::Eq, 1.0);
        model.add_constraint(LinearExpr::sum([a]), Sense::Eq, 0.0);
        let solution = model.solve();
        assert!(solution.is_optimal());
        assert_eq!(solution.bit(b), Some(1));
        assert_eq!(model.variable_name(b), Some("b"));
    }

    #[test]
    fn expression_evaluates_against_values() {
        let expr = LinearExpr::constant(1.0)
            .with_term(VarId(0), 2.0)
            .with_term(VarId(1), 0.0);
        assert_eq!(expr.terms().len(), 1);
        assert_eq!(expr.evaluate(&[1.0, 1.0]), 3.0);
    }
}
