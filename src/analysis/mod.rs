pub mod pipeline;
pub mod state_graph;

pub use pipeline::{AnalysisError, analyze, analyze_path, analyze_paths};
pub use state_graph::{CrossCheck, StateGraph, StateGraphConfig, StateGraphStats};
