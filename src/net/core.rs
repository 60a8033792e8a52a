//! 运行时：网的规范化构造、可发生集、发生语义与连通性诊断。
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write as FmtWrite};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::{Arc, ArcDirection, Marking, Place, PlaceSet, Transition};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FireError {
    #[error("transition {0:?} is out of bounds")]
    OutOfBounds(TransitionId),
    #[error("transition {0:?} is not enabled under the supplied marking")]
    NotEnabled(TransitionId),
}

/// An arc that was dropped while building a net.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcDiagnostic {
    pub source: String,
    pub target: String,
    pub reason: String,
}

impl fmt::Display for ArcDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid arc from '{}' to '{}': {}",
            self.source, self.target, self.reason
        )
    }
}

/// Collects places, transitions and arcs by identifier, then freezes them
/// into a canonically indexed [`Net`].
///
/// Identifiers behave like sets: adding one twice is a no-op. Arcs are
/// validated as they arrive; an arc whose endpoints are not a known
/// place/transition pair is recorded as an [`ArcDiagnostic`] and skipped.
#[derive(Debug, Default, Clone)]
pub struct NetBuilder {
    name: String,
    places: BTreeSet<String>,
    transitions: BTreeSet<String>,
    marked: BTreeSet<String>,
    pre: BTreeMap<String, BTreeSet<String>>,
    post: BTreeMap<String, BTreeSet<String>>,
    diagnostics: Vec<ArcDiagnostic>,
}

impl NetBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_place(&mut self, id: impl Into<String>, marked: bool) -> &mut Self {
        let id = id.into();
        if marked {
            self.marked.insert(id.clone());
        }
        self.places.insert(id);
        self
    }

    pub fn add_transition(&mut self, id: impl Into<String>) -> &mut Self {
        self.transitions.insert(id.into());
        self
    }

    pub fn add_arc(&mut self, source: &str, target: &str) -> &mut Self {
        if self.places.contains(source) && self.transitions.contains(target) {
            self.pre
                .entry(target.to_string())
                .or_default()
                .insert(source.to_string());
        } else if self.transitions.contains(source) && self.places.contains(target) {
            self.post
                .entry(source.to_string())
                .or_default()
                .insert(target.to_string());
        } else {
            let reason = match (self.knows(source), self.knows(target)) {
                (false, _) => "source node not found",
                (_, false) => "target node not found",
                _ => "arc must connect a place and a transition",
            };
            let diagnostic = ArcDiagnostic {
                source: source.to_string(),
                target: target.to_string(),
                reason: reason.to_string(),
            };
            log::warn!("{diagnostic}");
            self.diagnostics.push(diagnostic);
        }
        self
    }

    fn knows(&self, id: &str) -> bool {
        self.places.contains(id) || self.transitions.contains(id)
    }

    pub fn diagnostics(&self) -> &[ArcDiagnostic] {
        &self.diagnostics
    }

    /// Sorts identifiers ascending and resolves every set to indices.
    pub fn build(&self) -> Net {
        let places: IndexVec<PlaceId, Place> = self.places.iter().map(Place::new).collect();
        let index: BTreeMap<&str, PlaceId> = self
            .places
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), PlaceId::from_usize(idx)))
            .collect();
        let resolve = |names: Option<&BTreeSet<String>>| -> PlaceSet {
            names
                .map(|names| names.iter().map(|name| index[name.as_str()]).collect())
                .unwrap_or_default()
        };

        let transitions: IndexVec<TransitionId, Transition> = self
            .transitions
            .iter()
            .map(|name| Transition::new(name, resolve(self.pre.get(name)), resolve(self.post.get(name))))
            .collect();

        let initial = Marking::from_places(
            places.len(),
            self.marked
                .iter()
                .filter_map(|name| index.get(name.as_str()).copied()),
        );

        Net {
            name: self.name.clone(),
            places,
            transitions,
            initial,
            diagnostics: self.diagnostics.clone(),
        }
    }
}

/// Connectivity findings for a built net.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticReport {
    pub isolated_places: Vec<(PlaceId, String)>,
    pub isolated_transitions: Vec<(TransitionId, String)>,
    /// Transitions with an empty pre-set; any of them rules out deadlock.
    pub always_enabled: Vec<(TransitionId, String)>,
    pub warnings: Vec<String>,
    pub total_places: usize,
    pub total_transitions: usize,
}

impl DiagnosticReport {
    pub fn has_issues(&self) -> bool {
        !self.isolated_places.is_empty()
            || !self.isolated_transitions.is_empty()
            || !self.always_enabled.is_empty()
            || !self.warnings.is_empty()
    }
}

/// Immutable, canonically indexed 1-safe net.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Net {
    pub name: String,
    pub places: IndexVec<PlaceId, Place>,
    pub transitions: IndexVec<TransitionId, Transition>,
    initial: Marking,
    diagnostics: Vec<ArcDiagnostic>,
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("name", &self.name)
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("initial", &self.initial)
            .finish()
    }
}

impl Net {
    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn initial_marking(&self) -> &Marking {
        &self.initial
    }

    /// Arcs dropped during construction.
    pub fn diagnostics(&self) -> &[ArcDiagnostic] {
        &self.diagnostics
    }

    pub fn place_id(&self, name: &str) -> Option<PlaceId> {
        self.places
            .iter_enumerated()
            .find(|(_, place)| place.name == name)
            .map(|(id, _)| id)
    }

    pub fn transition_id(&self, name: &str) -> Option<TransitionId> {
        self.transitions
            .iter_enumerated()
            .find(|(_, transition)| transition.name == name)
            .map(|(id, _)| id)
    }

    pub fn place_names(&self) -> Vec<String> {
        self.places.iter().map(|place| place.name.clone()).collect()
    }

    pub fn arcs(&self) -> impl Iterator<Item = Arc> + '_ {
        self.transitions.iter_enumerated().flat_map(|(tid, transition)| {
            let inputs = transition
                .pre
                .iter()
                .map(move |&place| Arc::new(place, tid, ArcDirection::PlaceToTransition));
            let outputs = transition
                .post
                .iter()
                .map(move |&place| Arc::new(place, tid, ArcDirection::TransitionToPlace));
            inputs.chain(outputs)
        })
    }

    /// `{p0=1, p1=0}` using place names.
    pub fn format_marking(&self, marking: &Marking) -> String {
        let parts: Vec<String> = marking
            .iter()
            .map(|(place, bit)| format!("{}={}", self.places[place].name, bit))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    pub fn is_transition_enabled(&self, transition: TransitionId, marking: &Marking) -> bool {
        self.transitions
            .get(transition)
            .is_some_and(|t| t.pre.iter().all(|&place| marking.is_marked(place)))
    }

    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<TransitionId> {
        self.transitions
            .indices()
            .filter(|&transition| self.is_transition_enabled(transition, marking))
            .collect()
    }

    pub fn is_deadlock(&self, marking: &Marking) -> bool {
        self.transitions
            .indices()
            .all(|transition| !self.is_transition_enabled(transition, marking))
    }

    /// Clears the pre-set, then marks the post-set; a place in both sets ends
    /// up marked.
    pub fn fire_transition(
        &self,
        marking: &Marking,
        transition: TransitionId,
    ) -> Result<Marking, FireError> {
        let Some(t) = self.transitions.get(transition) else {
            return Err(FireError::OutOfBounds(transition));
        };
        if !self.is_transition_enabled(transition, marking) {
            return Err(FireError::NotEnabled(transition));
        }

        let mut next = marking.clone();
        for &place in &t.pre {
            next.set(place, false);
        }
        for &place in &t.post {
            next.set(place, true);
        }
        Ok(next)
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(&mut dot, "digraph PetriNet {{");
        let _ = writeln!(&mut dot, "    rankdir=LR;");
        let _ = writeln!(&mut dot, "    node [fontname=\"Helvetica\"];");

        for (place_id, place) in self.places.iter_enumerated() {
            let tokens = if self.initial.is_marked(place_id) { "\\n●" } else { "" };
            let _ = writeln!(
                &mut dot,
                "    place_{} [label=\"{}{}\", shape=circle, style=filled, fillcolor=\"#e3f2fd\"];",
                place_id.index(),
                escape_label(&place.name),
                tokens
            );
        }

        for (transition_id, transition) in self.transitions.iter_enumerated() {
            let _ = writeln!(
                &mut dot,
                "    trans_{} [label=\"{}\", shape=box, style=filled, fillcolor=\"#ffe0b2\"];",
                transition_id.index(),
                escape_label(&transition.name)
            );
        }

        for arc in self.arcs() {
            let place = format!("place_{}", arc.place.index());
            let transition = format!("trans_{}", arc.transition.index());
            let _ = match arc.direction {
                ArcDirection::PlaceToTransition => {
                    writeln!(&mut dot, "    {} -> {};", place, transition)
                }
                ArcDirection::TransitionToPlace => {
                    writeln!(&mut dot, "    {} -> {};", transition, place)
                }
            };
        }

        let _ = writeln!(&mut dot, "}}");
        dot
    }

    pub fn write_dot<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_dot())
    }

    pub fn diagnose_connectivity(&self) -> DiagnosticReport {
        let mut report = DiagnosticReport {
            total_places: self.places_len(),
            total_transitions: self.transitions_len(),
            ..DiagnosticReport::default()
        };

        for (place_id, place) in self.places.iter_enumerated() {
            let has_input = self.transitions.iter().any(|t| t.produces(place_id));
            let has_output = self.transitions.iter().any(|t| t.consumes(place_id));

            if !has_input && !has_output {
                report.isolated_places.push((place_id, place.name.clone()));
            } else if !has_input && !self.initial.is_marked(place_id) {
                // 无输入弧且初始无 token 的库所永远不会被标记
                report.warnings.push(format!(
                    "place '{}' ({:?}) has no producer and starts empty; it can never be marked",
                    place.name, place_id
                ));
            }
        }

        for (trans_id, trans) in self.transitions.iter_enumerated() {
            if trans.pre.is_empty() && trans.post.is_empty() {
                report.isolated_transitions.push((trans_id, trans.name.clone()));
            }
            if trans.pre.is_empty() {
                report.always_enabled.push((trans_id, trans.name.clone()));
            } else if trans.post.is_empty() {
                report.warnings.push(format!(
                    "transition '{}' ({:?}) has an empty post-set",
                    trans.name, trans_id
                ));
            }
        }

        report
    }

    pub fn log_diagnostics(&self) {
        let report = self.diagnose_connectivity();

        if !report.has_issues() {
            log::info!("net '{}' passed connectivity checks", self.name);
            return;
        }

        log::warn!(
            "net '{}': {} places, {} transitions",
            self.name,
            report.total_places,
            report.total_transitions
        );
        for (id, name) in &report.isolated_places {
            log::warn!("  isolated place [{}] {}", id.index(), name);
        }
        for (id, name) in &report.isolated_transitions {
            log::warn!("  isolated transition [{}] {}", id.index(), name);
        }
        for (id, name) in &report.always_enabled {
            log::warn!(
                "  transition [{}] {} has an empty pre-set; the net cannot deadlock",
                id.index(),
                name
            );
        }
        for warning in &report.warnings {
            log::warn!("  {}", warning);
        }
    }
}

fn escape_label(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
