//! Runtime settings: TOML file, then environment overrides, then defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::DbError;
use crate::query::types::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rows per page requested from the container.
    pub page_size: usize,
    /// Queries at or above this duration are logged as slow.
    pub slow_query_ms: u64,
    /// Concurrent item creations while seeding.
    pub seed_concurrency: usize,
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    pub log_retention: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            slow_query_ms: 500,
            seed_concurrency: 20,
            log_dir: None,
            log_level: "info".into(),
            log_retention: 7,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        let settings: Self = toml::from_str(s).map_err(|e| DbError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, DbError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DbError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Load with precedence: env > first existing file > defaults.
    /// Files are tried in order: `explicit`, `$INBOXQUERY_CONFIG`, `./inboxquery.toml`.
    pub fn load(explicit: Option<&Path>) -> Result<Self, DbError> {
        let mut paths: Vec<PathBuf> = Vec::new();
        if let Some(p) = explicit {
            if !p.exists() {
                return Err(DbError::Config(format!("config file not found: {}", p.display())));
            }
            paths.push(p.to_path_buf());
        }
        if let Ok(p) = std::env::var("INBOXQUERY_CONFIG") {
            paths.push(PathBuf::from(p));
        }
        if let Ok(cur) = std::env::current_dir() {
            paths.push(cur.join("inboxquery.toml"));
        }
        let mut settings = match paths.iter().find(|p| p.exists()) {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        settings.apply_env(|k| std::env::var(k).ok())?;
        Ok(settings)
    }

    /// Apply `INBOXQUERY_*` overrides read through `get`.
    pub fn apply_env<F>(&mut self, get: F) -> Result<(), DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("INBOXQUERY_PAGE_SIZE") {
            self.page_size = parse_num("INBOXQUERY_PAGE_SIZE", &v)?;
        }
        if let Some(v) = get("INBOXQUERY_SLOW_QUERY_MS") {
            self.slow_query_ms = parse_num("INBOXQUERY_SLOW_QUERY_MS", &v)?;
        }
        if let Some(v) = get("INBOXQUERY_SEED_CONCURRENCY") {
            self.seed_concurrency = parse_num("INBOXQUERY_SEED_CONCURRENCY", &v)?;
        }
        if let Some(v) = get("INBOXQUERY_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("INBOXQUERY_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = get("INBOXQUERY_LOG_RETENTION") {
            self.log_retention = parse_num("INBOXQUERY_LOG_RETENTION", &v)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), DbError> {
        if self.page_size == 0 {
            return Err(DbError::InvalidArgument("page_size must be positive".into()));
        }
        if self.seed_concurrency == 0 {
            return Err(DbError::InvalidArgument("seed_concurrency must be positive".into()));
        }
        Ok(())
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, v: &str) -> Result<T, DbError> {
    v.trim().parse::<T>().map_err(|_| DbError::InvalidArgument(format!("{key}: not a number: {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_keys_take_defaults() {
        let s = Settings::from_toml_str("page_size = 25\n").unwrap();
        assert_eq!(s.page_size, 25);
        assert_eq!(s.slow_query_ms, 500);
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut s = Settings::from_toml_str("page_size = 25\nslow_query_ms = 10\n").unwrap();
        let env: HashMap<&str, &str> = [("INBOXQUERY_PAGE_SIZE", "7"), ("INBOXQUERY_LOG_LEVEL", "debug")].into();
        s.apply_env(|k| env.get(k).map(|v| (*v).to_string())).unwrap();
        assert_eq!(s.page_size, 7);
        assert_eq!(s.slow_query_ms, 10);
        assert_eq!(s.log_level, "debug");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(matches!(Settings::from_toml_str("page_size = 0"), Err(DbError::InvalidArgument(_))));
        let mut s = Settings::default();
        let err = s.apply_env(|k| (k == "INBOXQUERY_SEED_CONCURRENCY").then(|| "abc".to_string()));
        assert!(matches!(err, Err(DbError::InvalidArgument(_))));
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        assert!(matches!(Settings::from_toml_str("page_size = ["), Err(DbError::Config(_))));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inboxquery.toml");
        std::fs::write(&path, "seed_concurrency = 4\nlog_retention = 2\n").unwrap();
        let s = Settings::from_file(&path).unwrap();
        assert_eq!(s.seed_concurrency, 4);
        assert_eq!(s.log_retention, 2);
        assert!(matches!(Settings::load(Some(&dir.path().join("missing.toml"))), Err(DbError::Config(_))));
    }
}
