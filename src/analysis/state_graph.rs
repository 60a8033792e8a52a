use crate::net::ids::TransitionId;
use crate::net::structure::Marking;
use crate::net::Net;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::VecDeque;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::Path;

/// 状态节点：完整标识及其可激发迁移.
#[derive(Debug, Clone)]
pub struct StateNode {
    pub index: usize,
    pub marking: Marking,
    pub enabled: Vec<TransitionId>,
}

#[derive(Debug, Clone)]
pub struct StateEdge {
    pub transition: TransitionId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateGraphStats {
    pub state_count: usize,
    pub edge_count: usize,
    pub deadlock_count: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StateGraphConfig {
    /// 最多探索的状态数量.None表示不设上限.
    pub state_limit: Option<usize>,
}

/// Outcome of comparing the symbolic enumeration with the explicit graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CrossCheck {
    Agree,
    Disagree {
        only_symbolic: Vec<Marking>,
        only_explicit: Vec<Marking>,
    },
    Skipped {
        reason: String,
    },
}

impl CrossCheck {
    pub fn is_agree(&self) -> bool {
        matches!(self, CrossCheck::Agree)
    }
}

#[derive(Debug)]
pub struct StateGraph {
    pub graph: StableGraph<StateNode, StateEdge>,
    pub initial: NodeIndex,
    pub deadlocks: FxHashSet<NodeIndex>,
    pub truncated: bool,
    pub markings: FxHashMap<Marking, NodeIndex>,
}

impl StateGraph {
    pub fn dot(&self, net: &Net) -> String {
        let edge_attr = |_, edge: petgraph::stable_graph::EdgeReference<StateEdge>| -> String {
            format!("label=\"{}\"", escape(&edge.weight().name))
        };

        let node_attr = |_, (_idx, node): (NodeIndex, &StateNode)| -> String {
            let mut label = format!(
                "s{}\\n{}",
                node.index,
                escape(&net.format_marking(&node.marking))
            );
            if node.enabled.is_empty() {
                label.push_str("\\ndeadlock");
            }
            format!("label=\"{}\"", label)
        };

        format!(
            "{:?}",
            Dot::with_attr_getters(
                &self.graph,
                &[Config::EdgeNoLabel, Config::NodeNoLabel],
                &edge_attr,
                &node_attr
            )
        )
    }

    pub fn write_dot<P: AsRef<Path>>(&self, net: &Net, path: P) -> std::io::Result<()> {
        let dot = self.dot(net);
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, dot)
    }

    pub fn from_net(net: &Net) -> Self {
        Self::with_config(net, StateGraphConfig::default())
    }

    pub fn with_config(net: &Net, config: StateGraphConfig) -> Self {
        let mut graph = StableGraph::new();
        let mut markings: FxHashMap<Marking, NodeIndex> = FxHashMap::default();
        let mut queue = VecDeque::new();
        let mut deadlocks = FxHashSet::default();
        let mut truncated = false;

        let initial_marking = net.initial_marking().clone();
        let initial_index = graph.add_node(StateNode {
            index: 0,
            marking: initial_marking.clone(),
            enabled: Vec::new(),
        });
        markings.insert(initial_marking, initial_index);
        queue.push_back(initial_index);

        while let Some(state_index) = queue.pop_front() {
            let current_marking = graph[state_index].marking.clone();
            let enabled = net.enabled_transitions(&current_marking);
            graph[state_index].enabled = enabled.clone();

            if enabled.is_empty() {
                deadlocks.insert(state_index);
                continue;
            }

            for transition_id in enabled {
                // 可激发迁移必然可以发射
                let Ok(next_marking) = net.fire_transition(&current_marking, transition_id) else {
                    continue;
                };
                let target_index = match markings.entry(next_marking) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        if let Some(limit) = config.state_limit {
                            if graph.node_count() >= limit {
                                truncated = true;
                                continue;
                            }
                        }
                        let index = graph.add_node(StateNode {
                            index: graph.node_count(),
                            marking: entry.key().clone(),
                            enabled: Vec::new(),
                        });
                        entry.insert(index);
                        queue.push_back(index);
                        index
                    }
                };

                graph.add_edge(
                    state_index,
                    target_index,
                    StateEdge {
                        transition: transition_id,
                        name: net.transitions[transition_id].name.clone(),
                    },
                );
            }
        }

        log::debug!(
            "net '{}': explicit state graph has {} states, {} edges{}",
            net.name,
            graph.node_count(),
            graph.edge_count(),
            if truncated { " (truncated)" } else { "" }
        );

        Self {
            graph,
            initial: initial_index,
            deadlocks,
            truncated,
            markings,
        }
    }

    pub fn stats(&self) -> StateGraphStats {
        StateGraphStats {
            state_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            deadlock_count: self.deadlocks.len(),
            truncated: self.truncated,
        }
    }

    pub fn node(&self, index: NodeIndex) -> &StateNode {
        &self.graph[index]
    }

    pub fn contains_marking(&self, marking: &Marking) -> bool {
        self.markings.contains_key(marking)
    }

    /// Deadlock markings, sorted.
    pub fn deadlock_markings(&self) -> Vec<Marking> {
        let mut out: Vec<Marking> = self
            .deadlocks
            .iter()
            .map(|&index| self.graph[index].marking.clone())
            .collect();
        out.sort();
        out
    }

    /// Compares a symbolic enumeration against the explored markings. A
    /// truncated side makes the comparison meaningless.
    pub fn compare(&self, symbolic: &[Marking], symbolic_truncated: bool) -> CrossCheck {
        if self.truncated {
            return CrossCheck::Skipped {
                reason: "explicit exploration hit its state limit".to_string(),
            };
        }
        if symbolic_truncated {
            return CrossCheck::Skipped {
                reason: "symbolic enumeration was truncated".to_string(),
            };
        }

        let symbolic_set: FxHashSet<&Marking> = symbolic.iter().collect();
        let mut only_symbolic: Vec<Marking> = symbolic
            .iter()
            .filter(|marking| !self.contains_marking(marking))
            .cloned()
            .collect();
        let mut only_explicit: Vec<Marking> = self
            .markings
            .keys()
            .filter(|marking| !symbolic_set.contains(marking))
            .cloned()
            .collect();

        if only_symbolic.is_empty() && only_explicit.is_empty() {
            return CrossCheck::Agree;
        }
        only_symbolic.sort();
        only_explicit.sort();
        CrossCheck::Disagree {
            only_symbolic,
            only_explicit,
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::NetBuilder;

    fn build_simple_net() -> Net {
        let mut builder = NetBuilder::new("simple");
        builder
            .add_place("p0", true)
            .add_place("p1", false)
            .add_transition("t0")
            .add_arc("p0", "t0")
            .add_arc("t0", "p1");
        builder.build()
    }

    #[test]
    fn state_limit_truncates_graph() {
        let net = build_simple_net();
        let config = StateGraphConfig {
            state_limit: Some(1),
        };
        let state_graph = StateGraph::with_config(&net, config);

        assert!(state_graph.truncated);
        assert_eq!(state_graph.graph.node_count(), 1);
        assert!(matches!(
            state_graph.compare(&[], false),
            CrossCheck::Skipped { .. }
        ));
    }

    #[test]
    fn records_terminal_deadlock() {
        let net = build_simple_net();
        let state_graph = StateGraph::from_net(&net);
        let stats = state_graph.stats();
        assert_eq!(stats.state_count, 2);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(
            state_graph.deadlock_markings(),
            vec![Marking::from_bits(&[0, 1])]
        );
        let t0 = net.transition_id("t0").unwrap();
        assert_eq!(state_graph.node(state_graph.initial).enabled, vec![t0]);
    }

    #[test]
    fn compare_reports_both_sides() {
        let net = build_simple_net();
        let state_graph = StateGraph::from_net(&net);
        let agree = [Marking::from_bits(&[0, 1]), Marking::from_bits(&[1, 0])];
        assert!(state_graph.compare(&agree, false).is_agree());

        let wrong = [Marking::from_bits(&[1, 0]), Marking::from_bits(&[1, 1])];
        assert_eq!(
            state_graph.compare(&wrong, false),
            CrossCheck::Disagree {
                only_symbolic: vec![Marking::from_bits(&[1, 1])],
                only_explicit: vec![Marking::from_bits(&[0, 1])],
            }
        );
    }

    #[test]
    fn write_dot_creates_parent_dirs() {
        let net = build_simple_net();
        let state_graph = StateGraph::from_net(&net);
        assert!(state_graph.contains_marking(&Marking::from_bits(&[0, 1])));
        assert!(!state_graph.contains_marking(&Marking::from_bits(&[1, 1])));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphs").join("simple.states.dot");
        state_graph.write_dot(&net, &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, state_graph.dot(&net));
    }

    #[test]
    fn dot_labels_deadlocks() {
        let net = build_simple_net();
        let dot = StateGraph::from_net(&net).dot(&net);
        assert!(dot.contains("deadlock"));
        assert!(dot.contains("label=\"t0\""));
    }
}
