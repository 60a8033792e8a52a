//! 0/1 integer programming: a small model layer over `good_lp` and the
//! candidate-selection rows shared by the deadlock and optimum queries.

pub mod model;
pub mod selection;

pub use model::{Direction, IlpModel, IlpSolution, LinearExpr, Sense, SolveStatus, VarId};
pub use selection::SelectionModel;
