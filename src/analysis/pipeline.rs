//! One complete analysis of a net, and batch analysis of several files.
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;

use crate::analysis::state_graph::{CrossCheck, StateGraph};
use crate::config::AnalysisConfig;
use crate::detect::{DeadlockSolver, WeightedOptimizer};
use crate::net::{IoError, Net, load_net};
use crate::report::{AnalysisReport, DeadlockReport, OptimumMethod, OptimumReport, PhaseTimings};
use crate::symbolic::{FixpointError, ReachabilityEngine};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to load net: {0}")]
    Io(#[from] IoError),
    #[error("reachability did not converge: {0}")]
    Fixpoint(#[from] FixpointError),
}

/// Engine, enumeration, deadlock query, both optimizers and, if enabled,
/// the explicit cross-check. Everything is owned by this call.
pub fn analyze(net: &Net, config: &AnalysisConfig) -> Result<AnalysisReport, AnalysisError> {
    let started = Instant::now();
    let mut timings = PhaseTimings::default();
    net.log_diagnostics();

    let phase = Instant::now();
    let engine = ReachabilityEngine::new(net);
    timings.relation = phase.elapsed();

    let phase = Instant::now();
    let reach = engine.reachable()?;
    timings.fixpoint = phase.elapsed();
    let reachable_count = engine.count(&reach.set);

    let phase = Instant::now();
    let listed = engine.enumerate(&reach.set, config.enumeration_limit);
    timings.enumeration = phase.elapsed();
    log::info!(
        "net '{}': {} reachable markings after {} iterations",
        net.name,
        reachable_count,
        reach.iterations
    );

    let phase = Instant::now();
    let deadlock = DeadlockSolver::new(net, &listed.markings).find();
    timings.deadlock = phase.elapsed();

    let phase = Instant::now();
    let weights = config.weights_for(net);
    let optimizer = WeightedOptimizer::new(net, &listed.markings, weights);
    let optimum_ilp = optimizer.optimize_ilp();
    let optimum_scan = optimizer.optimize_scan();
    timings.optimize = phase.elapsed();
    if optimum_ilp.value() != optimum_scan.value() {
        log::warn!(
            "net '{}': ILP optimum {:?} differs from scan optimum {:?}",
            net.name,
            optimum_ilp.value(),
            optimum_scan.value()
        );
    }

    let phase = Instant::now();
    let (state_graph, cross_check) = if config.cross_check {
        let graph = StateGraph::with_config(net, config.state_graph_config());
        let verdict = graph.compare(&listed.markings, listed.truncated);
        if let CrossCheck::Disagree {
            only_symbolic,
            only_explicit,
        } = &verdict
        {
            log::warn!(
                "net '{}': cross-check mismatch ({} only symbolic, {} only explicit)",
                net.name,
                only_symbolic.len(),
                only_explicit.len()
            );
        }
        (Some(graph.stats()), verdict)
    } else {
        (
            None,
            CrossCheck::Skipped {
                reason: "disabled by configuration".to_string(),
            },
        )
    };
    timings.cross_check = phase.elapsed();
    timings.total = started.elapsed();

    let diagnosis = net.diagnose_connectivity();
    Ok(AnalysisReport {
        net_name: net.name.clone(),
        place_names: net.place_names(),
        place_count: net.places_len(),
        transition_count: net.transitions_len(),
        initial_marking: net.initial_marking().clone(),
        arc_diagnostics: net.diagnostics().iter().map(ToString::to_string).collect(),
        always_enabled: diagnosis
            .always_enabled
            .into_iter()
            .map(|(_, name)| name)
            .collect(),
        fixpoint_iterations: reach.iterations,
        reachable_count,
        deadlock: DeadlockReport::from_outcome(net, &listed, &deadlock),
        weights: optimizer.weights().to_vec(),
        optimum_ilp: OptimumReport::from_outcome(net, OptimumMethod::Ilp, &listed, &optimum_ilp),
        optimum_scan: OptimumReport::from_outcome(net, OptimumMethod::Scan, &listed, &optimum_scan),
        markings: listed.markings,
        truncated: listed.truncated,
        state_graph,
        cross_check,
        timings,
    })
}

pub fn analyze_path(path: &Path, config: &AnalysisConfig) -> Result<AnalysisReport, AnalysisError> {
    let net = load_net(path)?;
    analyze(&net, config)
}

/// Analyses every file; with `jobs > 1` each file runs on its own rayon
/// worker. Results keep the input order.
pub fn analyze_paths(
    paths: &[PathBuf],
    config: &AnalysisConfig,
) -> Vec<(PathBuf, Result<AnalysisReport, AnalysisError>)> {
    let run = |path: &PathBuf| (path.clone(), analyze_path(path, config));

    if config.jobs <= 1 || paths.len() <= 1 {
        return paths.iter().map(run).collect();
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
    {
        Ok(pool) => pool.install(|| paths.par_iter().map(run).collect()),
        Err(err) => {
            log::warn!("could not start {} workers ({}), running sequentially", config.jobs, err);
            paths.iter().map(run).collect()
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

    #[test]
    fn fork_report_covers_every_phase() {
        let report = analyze(&fork(), &AnalysisConfig::default()).unwrap();
        assert_eq!(report.reachable_count, 2.0);
        assert_eq!(report.markings.len(), 2);
        assert!(!report.truncated);
        assert!(report.deadlock.has_deadlock);
        assert_eq!(report.optimum_ilp.value, Some(2));
        assert!(report.optimum_consistent());
        assert!(report.cross_check.is_agree());
        assert_eq!(report.state_graph.as_ref().map(|s| s.state_count), Some(2));
    }

    #[test]
    fn disabled_cross_check_is_skipped() {
        let config = AnalysisConfig {
            cross_check: false,
            ..AnalysisConfig::default()
        };
        let report = analyze(&fork(), &config).unwrap();
        assert!(report.state_graph.is_none());
        assert!(matches!(report.cross_check, CrossCheck::Skipped { .. }));
    }

    #[test]
    fn small_limit_truncates_and_skips_cross_check() {
        let config = AnalysisConfig {
            enumeration_limit: 1,
            ..AnalysisConfig::default()
        };
        let report = analyze(&fork(), &config).unwrap();
        assert!(report.truncated);
        assert_eq!(report.markings.len(), 1);
        assert_eq!(report.reachable_count, 2.0);
        assert!(matches!(report.cross_check, CrossCheck::Skipped { .. }));
        assert!(report.deadlock.truncated);
        assert_eq!(report.deadlock.searched, 1);
        assert!(report.optimum_ilp.truncated);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let results = analyze_paths(
            &[PathBuf::from("does/not/exist.json")],
            &AnalysisConfig::default(),
        );
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].1, Err(AnalysisError::Io(_))));
    }
}
