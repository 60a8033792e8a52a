use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::detect::DeadlockOutcome;
use crate::ilp::SolveStatus;
use crate::net::{Marking, Net};
use crate::symbolic::Enumeration;

#[derive(Debug, Clone, Serialize)]
pub struct DeadlockReport {
    pub has_deadlock: bool,
    pub witness: Option<Marking>,
    /// Witness rendered with place names, `{p0=1, p1=0}`.
    pub witness_state: Option<String>,
    /// Solver status; absent when the reachable list was empty.
    pub status: Option<SolveStatus>,
    pub solve_time: Duration,
    /// Markings the solver chose from.
    pub searched: usize,
    /// The list was capped, so "no deadlock" only covers `searched`.
    pub truncated: bool,
}

impl DeadlockReport {
    pub fn from_outcome(net: &Net, listed: &Enumeration, outcome: &DeadlockOutcome) -> Self {
        Self {
            has_deadlock: outcome.found(),
            witness_state: outcome
                .witness
                .as_ref()
                .map(|marking| net.format_marking(marking)),
            witness: outcome.witness.clone(),
            status: outcome.status.clone(),
            solve_time: outcome.solve_time,
            searched: listed.len(),
            truncated: listed.truncated,
        }
    }
}

impl fmt::Display for DeadlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.witness_state {
            Some(state) => {
                writeln!(f, ">> Deadlock FOUND. Marking deadlock:")?;
                writeln!(f, "{}", state)?;
            }
            None if self.truncated => writeln!(
                f,
                ">> No deadlock among the {} listed markings (list truncated).",
                self.searched
            )?,
            None => writeln!(f, ">> No deadlock reachable from M0.")?,
        }
        if let Some(status) = &self.status {
            writeln!(f, "Solver status: {}", status)?;
        }
        writeln!(f, "ILP deadlock detection time: {:?}", self.solve_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::NetBuilder;

    fn outcome(witness: Option<Marking>) -> DeadlockOutcome {
        DeadlockOutcome {
            witness,
            status: Some(SolveStatus::Infeasible),
            solve_time: Duration::ZERO,
        }
    }

    fn cycle() -> Net {
        let mut builder = NetBuilder::new("cycle");
        builder
            .add_place("a", true)
            .add_place("b", false)
            .add_transition("go")
            .add_transition("back")
            .add_arc("a", "go")
            .add_arc("go", "b")
            .add_arc("b", "back")
            .add_arc("back", "a");
        builder.build()
    }

    #[test]
    fn truncated_list_weakens_the_verdict() {
        let net = cycle();
        let listed = Enumeration {
            markings: vec![Marking::from_bits(&[1, 0])],
            truncated: true,
        };
        let text = DeadlockReport::from_outcome(&net, &listed, &outcome(None)).to_string();
        assert!(text.contains("No deadlock among the 1 listed markings (list truncated)."));
        assert!(!text.contains("reachable from M0"));
    }

    #[test]
    fn complete_list_gives_the_full_verdict() {
        let net = cycle();
        let listed = Enumeration {
            markings: vec![Marking::from_bits(&[1, 0]), Marking::from_bits(&[0, 1])],
            truncated: false,
        };
        let report = DeadlockReport::from_outcome(&net, &listed, &outcome(None));
        assert!(!report.has_deadlock);
        assert!(report.to_string().contains("No deadlock reachable from M0."));
    }
}
