use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::error::ConfigError;
use super::types::{BatchConfig, RunConfig};

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["sim.yaml", "config/sim.yaml"];
pub const DEFAULT_BATCH_PATHS: &[&str] = &["batch.yaml", "config/batch.yaml"];

pub fn load_config(path: Option<PathBuf>) -> Result<RunConfig, ConfigError> {
    let candidates = candidate_paths(path, DEFAULT_CONFIG_PATHS);
    load_first_available(&candidates)
}

pub fn load_batch_config(path: Option<PathBuf>) -> Result<BatchConfig, ConfigError> {
    let candidates = candidate_paths(path, DEFAULT_BATCH_PATHS);
    load_first_available(&candidates)
}

fn candidate_paths(explicit: Option<PathBuf>, defaults: &[&str]) -> Vec<PathBuf> {
    match explicit {
        Some(p) => vec![p],
        None => defaults.iter().map(PathBuf::from).collect(),
    }
}

fn load_first_available<T: DeserializeOwned>(paths: &[PathBuf]) -> Result<T, ConfigError> {
    for candidate in paths {
        if let Some(config) = try_load_file::<T>(candidate)? {
            return Ok(config);
        }
    }
    Err(ConfigError::NotFound(paths.to_vec()))
}

fn try_load_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: T = serde_yaml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn falls_back_through_candidate_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.yaml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "total_ips: 10\ntime_delta: 1\npolicy:\n  type: fifo\nagents: []\n"
        )
        .unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.total_ips, 10);
    }

    #[test]
    fn malformed_yaml_is_reported_as_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.yaml");
        fs::write(&path, "total_ips: \"not a number\"\n").unwrap();

        let err = load_config(Some(path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_config_is_reported_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("missing.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
