use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use pn_reach::analysis::{StateGraph, analyze_paths};
use pn_reach::config::AnalysisConfig;
use pn_reach::net::load_net;
use pn_reach::options::{Options, OutputFormat};
use pn_reach::report::AnalysisReport;

fn main() -> ExitCode {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:?}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let mut flags = shellwords::split(&std::env::var("PN_FLAGS").unwrap_or_default())
        .context("PN_FLAGS is not a valid shell word list")?;
    flags.extend(std::env::args().skip(1));

    let options = match Options::parse_from_args(&flags) {
        Ok(options) => options,
        Err(err) => match err.downcast::<clap::Error>() {
            // --help / --version land here too
            Ok(clap_err) => clap_err.exit(),
            Err(err) => return Err(anyhow!("{}", err)),
        },
    };
    log::debug!("PN options: {:?}", options);

    let mut config = match &options.config {
        Some(path) => AnalysisConfig::load_from_file(path)?,
        None => AnalysisConfig::default(),
    };
    options.apply(&mut config);

    if let Some(dir) = &options.dot_dir {
        write_dot_files(dir, &options.nets, &config)?;
    }

    let mut reports = Vec::with_capacity(options.nets.len());
    for (path, result) in analyze_paths(&options.nets, &config) {
        let report = result.with_context(|| format!("analysis of {:?} failed", path))?;
        reports.push(report);
    }

    emit(&options, &reports)
}

/// Writes `<stem>.dot` (the net) and `<stem>.states.dot` (its explicit
/// state graph) per input file.
fn write_dot_files(dir: &Path, nets: &[std::path::PathBuf], config: &AnalysisConfig) -> Result<()> {
    for path in nets {
        let net = load_net(path).with_context(|| format!("failed to load {:?}", path))?;
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| net.name.clone());
        let target = dir.join(format!("{}.dot", stem));
        net.write_dot(&target)
            .with_context(|| format!("failed to write {:?}", target))?;
        log::info!("wrote {:?}", target);

        let states = dir.join(format!("{}.states.dot", stem));
        StateGraph::with_config(&net, config.state_graph_config())
            .write_dot(&net, &states)
            .with_context(|| format!("failed to write {:?}", states))?;
        log::info!("wrote {:?}", states);
    }
    Ok(())
}

fn emit(options: &Options, reports: &[AnalysisReport]) -> Result<()> {
    let rendered = match options.format {
        OutputFormat::Text => reports
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(reports)?,
    };

    match &options.output {
        None => println!("{}", rendered),
        Some(path) if reports.len() == 1 && options.format == OutputFormat::Text => {
            let path_str = path.to_string_lossy();
            reports[0]
                .save_to_file(&path_str)
                .with_context(|| format!("failed to write {:?}", path))?;
        }
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("failed to write {:?}", path))?;
        }
    }
    Ok(())
}
