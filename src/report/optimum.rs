use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::detect::OptimumOutcome;
use crate::ilp::SolveStatus;
use crate::net::{Marking, Net};
use crate::symbolic::Enumeration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimumMethod {
    Ilp,
    Scan,
}

impl fmt::Display for OptimumMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimumMethod::Ilp => write!(f, "ILP"),
            OptimumMethod::Scan => write!(f, "linear scan"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimumReport {
    pub method: OptimumMethod,
    pub found: bool,
    pub marking: Option<Marking>,
    pub state: Option<String>,
    pub value: Option<i64>,
    pub status: Option<SolveStatus>,
    pub solve_time: Duration,
    pub searched: usize,
    /// The list was capped; `value` is then a lower bound of the optimum.
    pub truncated: bool,
}

impl OptimumReport {
    pub fn from_outcome(
        net: &Net,
        method: OptimumMethod,
        listed: &Enumeration,
        outcome: &OptimumOutcome,
    ) -> Self {
        Self {
            method,
            found: outcome.best.is_some(),
            marking: outcome.best.as_ref().map(|(marking, _)| marking.clone()),
            state: outcome
                .best
                .as_ref()
                .map(|(marking, _)| net.format_marking(marking)),
            value: outcome.value(),
            status: outcome.status.clone(),
            solve_time: outcome.solve_time,
            searched: listed.len(),
            truncated: listed.truncated,
        }
    }
}

impl fmt::Display for OptimumReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.state, self.value) {
            (Some(state), Some(value)) => {
                writeln!(f, ">> Optimal marking ({}):", self.method)?;
                writeln!(f, "{}", state)?;
                writeln!(f, "Value c^T M ({}) = {}", self.method, value)?;
                if self.truncated {
                    writeln!(
                        f,
                        "[Warning] best among the {} listed markings only (list truncated)",
                        self.searched
                    )?;
                }
            }
            _ => writeln!(
                f,
                ">> No marking to optimize ({}); the reachable list is empty or the solver gave no answer.",
                self.method
            )?,
        }
        if let Some(status) = &self.status {
            writeln!(f, "Solver status: {}", status)?;
        }
        writeln!(f, "Solve time ({}): {:?}", self.method, self.solve_time)
    }
}
