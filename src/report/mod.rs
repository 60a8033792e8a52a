//! Serializable analysis results with a plain-text rendering.
use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::analysis::state_graph::{CrossCheck, StateGraphStats};
use crate::net::{Idx, Marking};

pub mod deadlock;
pub mod optimum;

pub use deadlock::DeadlockReport;
pub use optimum::{OptimumMethod, OptimumReport};

#[derive(Debug, Clone, Default, Serialize)]
pub struct PhaseTimings {
    pub relation: Duration,
    pub fixpoint: Duration,
    pub enumeration: Duration,
    pub deadlock: Duration,
    pub optimize: Duration,
    pub cross_check: Duration,
    pub total: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub net_name: String,
    pub place_names: Vec<String>,
    pub place_count: usize,
    pub transition_count: usize,
    pub initial_marking: Marking,
    pub arc_diagnostics: Vec<String>,
    /// Transitions with an empty pre-set.
    pub always_enabled: Vec<String>,
    pub fixpoint_iterations: usize,
    /// Marking count from the BDD; exact for all practical place counts.
    pub reachable_count: f64,
    pub markings: Vec<Marking>,
    pub truncated: bool,
    pub deadlock: DeadlockReport,
    pub weights: Vec<i64>,
    pub optimum_ilp: OptimumReport,
    pub optimum_scan: OptimumReport,
    pub state_graph: Option<StateGraphStats>,
    pub cross_check: CrossCheck,
    pub timings: PhaseTimings,
}

impl AnalysisReport {
    /// `{p0=1, p1=0}` with this report's place names.
    pub fn format_marking(&self, marking: &Marking) -> String {
        let parts = marking
            .iter()
            .map(|(place, bit)| {
                let name = self
                    .place_names
                    .get(place.index())
                    .map_or("?", String::as_str);
                format!("{}={}", name, bit)
            })
            .join(", ");
        format!("{{{}}}", parts)
    }

    /// Both optimizers agree on the optimal value.
    pub fn optimum_consistent(&self) -> bool {
        self.optimum_ilp.value == self.optimum_scan.value
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn save_to_file(&self, path: &str) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::Write;

        let mut file = File::create(path)?;
        writeln!(file, "{}", self)?;

        let json_path = format!("{}.json", path);
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(json_path, json.as_bytes())?;

        Ok(())
    }
}

/// At most this many markings are listed in the text report.
const LISTED_MARKINGS: usize = 50;

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Net: {} ===", self.net_name)?;
        writeln!(f, "Places: {}", self.place_count)?;
        writeln!(f, "Transitions: {}", self.transition_count)?;
        writeln!(f, "Place order: [{}]", self.place_names.iter().join(", "))?;
        writeln!(f, "Initial marking: {}", self.format_marking(&self.initial_marking))?;
        if !self.arc_diagnostics.is_empty() {
            writeln!(f, "Dropped arcs:")?;
            for diagnostic in &self.arc_diagnostics {
                writeln!(f, "  {}", diagnostic)?;
            }
        }
        if !self.always_enabled.is_empty() {
            writeln!(
                f,
                "Always enabled (empty pre-set): {}",
                self.always_enabled.iter().join(", ")
            )?;
        }

        writeln!(f, "\n=== BDD-based reachability ===")?;
        writeln!(f, "Reachable markings (BDD): {}", self.reachable_count)?;
        writeln!(f, "Fixpoint iterations: {}", self.fixpoint_iterations)?;
        writeln!(f, "Fixpoint time: {:?}", self.timings.fixpoint)?;
        if self.truncated {
            writeln!(
                f,
                "[Warning] enumeration capped at {} markings",
                self.markings.len()
            )?;
        }
        for marking in self.markings.iter().take(LISTED_MARKINGS) {
            writeln!(f, "  {}", self.format_marking(marking))?;
        }
        if self.markings.len() > LISTED_MARKINGS {
            writeln!(f, "  ... {} more", self.markings.len() - LISTED_MARKINGS)?;
        }

        writeln!(f, "\n=== Deadlock detection (ILP + BDD) ===")?;
        write!(f, "{}", self.deadlock)?;

        writeln!(f, "\n=== Optimization over reachable markings ===")?;
        writeln!(f, "Weights c: [{}]", self.weights.iter().join(", "))?;
        write!(f, "{}", self.optimum_ilp)?;
        write!(f, "{}", self.optimum_scan)?;
        if !self.optimum_consistent() {
            writeln!(f, "[Warning] ILP and linear scan disagree on the optimum")?;
        }

        writeln!(f, "\n=== Explicit cross-check ===")?;
        if let Some(stats) = &self.state_graph {
            writeln!(
                f,
                "Explicit states: {}, edges: {}, deadlocks: {}{}",
                stats.state_count,
                stats.edge_count,
                stats.deadlock_count,
                if stats.truncated { " (truncated)" } else { "" }
            )?;
        }
        match &self.cross_check {
            CrossCheck::Agree => writeln!(f, "BDD and explicit reachable sets agree")?,
            CrossCheck::Disagree {
                only_symbolic,
                only_explicit,
            } => {
                writeln!(f, "BDD and explicit reachable sets DISAGREE")?;
                for marking in only_symbolic {
                    writeln!(f, "  only BDD: {}", self.format_marking(marking))?;
                }
                for marking in only_explicit {
                    writeln!(f, "  only explicit: {}", self.format_marking(marking))?;
                }
            }
            CrossCheck::Skipped { reason } => writeln!(f, "Skipped: {}", reason)?,
        }

        writeln!(f, "\nTotal analysis time: {:?}", self.timings.total)
    }
}
