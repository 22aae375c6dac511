//! YAML run files.
//!
//! A run file pins the parameters of a simulation so it can be repeated:
//!
//! ```yaml
//! packet_size: 10
//! node_count: 20
//! initial_contention_window: 32
//! seed: 42
//! ```
//!
//! Every field is optional; command-line values take precedence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::RunnerError;

/// Parameters read from a run file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    pub packet_size: Option<usize>,
    pub node_count: Option<usize>,
    pub initial_contention_window: Option<u64>,
    pub horizon: Option<usize>,
    pub sampling_interval: Option<usize>,
    pub threshold: Option<f64>,
    pub seed: Option<u64>,
    /// Contention windows to sweep instead of a single run.
    #[serde(default)]
    pub sweep_cw: Vec<u64>,
}

impl RunFile {
    /// Parses a run file from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, RunnerError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Reads and parses the run file at `path`.
pub fn load_run_file(path: &Path) -> Result<RunFile, RunnerError> {
    let text = std::fs::read_to_string(path)?;
    RunFile::from_yaml_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_run_file() {
        let file = RunFile::from_yaml_str(
            r#"
packet_size: 10
node_count: 20
initial_contention_window: 32
horizon: 50000
sampling_interval: 500
threshold: 0.001
seed: 42
sweep_cw: [8, 16, 32]
"#,
        )
        .unwrap();

        assert_eq!(file.packet_size, Some(10));
        assert_eq!(file.node_count, Some(20));
        assert_eq!(file.initial_contention_window, Some(32));
        assert_eq!(file.horizon, Some(50000));
        assert_eq!(file.sampling_interval, Some(500));
        assert_eq!(file.threshold, Some(0.001));
        assert_eq!(file.seed, Some(42));
        assert_eq!(file.sweep_cw, vec![8, 16, 32]);
    }

    #[test]
    fn test_partial_run_file() {
        let file = RunFile::from_yaml_str("node_count: 5\n").unwrap();
        assert_eq!(file.node_count, Some(5));
        assert_eq!(file.packet_size, None);
        assert!(file.sweep_cw.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = RunFile::from_yaml_str("nodes: 5\n").unwrap_err();
        assert!(matches!(err, RunnerError::Yaml(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        std::fs::write(&path, "packet_size: 3\nseed: 9\n").unwrap();

        let file = load_run_file(&path).unwrap();
        assert_eq!(file.packet_size, Some(3));
        assert_eq!(file.seed, Some(9));

        let missing = load_run_file(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(missing, RunnerError::Io(_)));
    }
}
