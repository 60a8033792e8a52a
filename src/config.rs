use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::state_graph::StateGraphConfig;
use crate::detect::weights_with_default;
use crate::net::Net;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default = "default_enumeration_limit")]
    pub enumeration_limit: usize,
    #[serde(default = "default_cross_check")]
    pub cross_check: bool,
    #[serde(default)]
    pub state_limit: Option<usize>,
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    #[serde(default = "default_weight")]
    pub default_weight: i64,
    #[serde(default)]
    pub weights: IndexMap<String, i64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enumeration_limit: default_enumeration_limit(),
            cross_check: default_cross_check(),
            state_limit: None,
            jobs: default_jobs(),
            default_weight: default_weight(),
            weights: IndexMap::new(),
        }
    }
}

impl AnalysisConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AnalysisConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Per-place weights for `net`: listed names override `default_weight`.
    pub fn weights_for(&self, net: &Net) -> Vec<i64> {
        weights_with_default(net, &self.weights, self.default_weight)
    }

    pub fn state_graph_config(&self) -> StateGraphConfig {
        StateGraphConfig {
            state_limit: self.state_limit,
        }
    }
}

fn default_enumeration_limit() -> usize {
    100_000
}

fn default_cross_check() -> bool {
    true
}

fn default_jobs() -> usize {
    1
}

fn default_weight() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.enumeration_limit, 100_000);
        assert!(config.cross_check);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "enumeration_limit = 10\nstate_limit = 50\n\n[weights]\np1 = 3\np0 = -2"
        )
        .unwrap();
        let config = AnalysisConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.enumeration_limit, 10);
        assert_eq!(config.state_limit, Some(50));
        assert_eq!(config.jobs, 1);
        assert_eq!(
            config.weights.keys().collect::<Vec<_>>(),
            vec!["p1", "p0"]
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "enumeration_limit = \"many\"").unwrap();
        let err = AnalysisConfig::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
