// src/config/settings.rs
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::baseline::DEFAULT_BASELINE_PATH;
use crate::ingest::{FetchOptions, DEFAULT_FETCH_CONCURRENCY, DEFAULT_FETCH_TIMEOUT_SECS};

pub const ENV_DATA_FILE: &str = "JOBS_DATA_FILE";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_FETCH_CONCURRENCY: &str = "FETCH_CONCURRENCY";

/// Runtime knobs read from the environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub data_file: PathBuf,
    pub fetch_timeout_secs: u64,
    pub fetch_concurrency: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_BASELINE_PATH),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

impl RunSettings {
    /// Unset or unparsable values fall back to defaults; zero is not a valid budget.
    pub fn from_env() -> Self {
        let d = Self::default();
        let data_file = env::var(ENV_DATA_FILE)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(d.data_file);
        let fetch_timeout_secs = env::var(ENV_FETCH_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .filter(|v: &u64| *v > 0)
            .unwrap_or(d.fetch_timeout_secs);
        let fetch_concurrency = env::var(ENV_FETCH_CONCURRENCY)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .filter(|v: &usize| *v > 0)
            .unwrap_or(d.fetch_concurrency);
        Self {
            data_file,
            fetch_timeout_secs,
            fetch_concurrency,
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            concurrency: self.fetch_concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn env_overrides_and_fallbacks() {
        env::remove_var(ENV_DATA_FILE);
        env::remove_var(ENV_FETCH_TIMEOUT_SECS);
        env::remove_var(ENV_FETCH_CONCURRENCY);
        assert_eq!(RunSettings::from_env(), RunSettings::default());

        env::set_var(ENV_DATA_FILE, "/tmp/jobs.json");
        env::set_var(ENV_FETCH_TIMEOUT_SECS, "30");
        env::set_var(ENV_FETCH_CONCURRENCY, "0");
        let s = RunSettings::from_env();
        assert_eq!(s.data_file, PathBuf::from("/tmp/jobs.json"));
        assert_eq!(s.fetch_options().timeout, Duration::from_secs(30));
        assert_eq!(s.fetch_concurrency, DEFAULT_FETCH_CONCURRENCY);

        env::remove_var(ENV_DATA_FILE);
        env::remove_var(ENV_FETCH_TIMEOUT_SECS);
        env::remove_var(ENV_FETCH_CONCURRENCY);
    }
}
