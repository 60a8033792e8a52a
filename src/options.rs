//! Parsing Options.
//! `pn-reach [OPTIONS] <NET>...`; extra flags may come from `PN_FLAGS`.

use clap::{Arg, ArgAction, Command, value_parser};
use std::error::Error;
use std::path::PathBuf;

use crate::config::AnalysisConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn make_options_parser() -> clap::Command {
    let parser = Command::new("pn-reach")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Symbolic reachability, deadlock and optimum analysis of 1-safe Petri nets")
        .arg(
            Arg::new("nets")
                .value_name("NET")
                .help("Net files (.pnml, .xml, .json, .ron)")
                .num_args(1..)
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML analysis configuration")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("limit")
                .short('l')
                .long("limit")
                .value_name("N")
                .help("Cap on the explicit marking list")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("no-cross-check")
                .long("no-cross-check")
                .help("Skip the explicit breadth-first cross-check")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .help("Nets analysed in parallel")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .help("Report format")
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the report here (plus FILE.json) instead of stdout")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("dot")
                .long("dot")
                .value_name("DIR")
                .help("Write Graphviz files for each net and its state graph into DIR")
                .value_parser(value_parser!(PathBuf)),
        );
    parser
}

#[derive(Debug, Default)]
pub struct Options {
    pub nets: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub limit: Option<usize>,
    pub no_cross_check: bool,
    pub jobs: Option<usize>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub dot_dir: Option<PathBuf>,
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let flags = shellwords::split(s)?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, Box<dyn Error>> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let format = match matches.get_one::<String>("format").map(String::as_str) {
            Some("json") => OutputFormat::Json,
            Some("text") | None => OutputFormat::Text,
            Some(other) => return Err(format!("unsupported output format: {other}").into()),
        };

        Ok(Options {
            nets: matches
                .get_many::<PathBuf>("nets")
                .map(|paths| paths.cloned().collect())
                .unwrap_or_default(),
            config: matches.get_one::<PathBuf>("config").cloned(),
            limit: matches.get_one::<usize>("limit").copied(),
            no_cross_check: matches.get_flag("no-cross-check"),
            jobs: matches.get_one::<usize>("jobs").copied(),
            format,
            output: matches.get_one::<PathBuf>("output").cloned(),
            dot_dir: matches.get_one::<PathBuf>("dot").cloned(),
        })
    }

    /// Command-line values override the configuration file.
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(limit) = self.limit {
            config.enumeration_limit = limit;
        }
        if self.no_cross_check {
            config.cross_check = false;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs.max(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_str_err() {
        let options = Options::parse_from_str("-f yaml net.pnml");
        assert!(options.is_err());
    }

    #[test]
    fn test_missing_net_err() {
        let options = Options::parse_from_args(&["-l".to_owned(), "10".to_owned()]);
        assert!(options.is_err());
    }

    #[test]
    fn test_parse_full_command_line() {
        let options = Options::parse_from_str(
            "-c 'my config.toml' -l 5 --no-cross-check -j 4 -f json -o out.txt --dot dots a.pnml b.json",
        )
        .unwrap();
        assert_eq!(options.nets, vec![PathBuf::from("a.pnml"), PathBuf::from("b.json")]);
        assert_eq!(options.config, Some(PathBuf::from("my config.toml")));
        assert_eq!(options.format, OutputFormat::Json);
        assert_eq!(options.dot_dir, Some(PathBuf::from("dots")));

        let mut config = AnalysisConfig::default();
        options.apply(&mut config);
        assert_eq!(config.enumeration_limit, 5);
        assert!(!config.cross_check);
        assert_eq!(config.jobs, 4);
    }
}
