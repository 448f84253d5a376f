//! Optional TOML config file (Section 6): a `[solver]` table and a
//! `[defaults]` table of values the CLI otherwise requires as flags.
//! CLI flags always win over a config value; a config value always
//! wins over the built-in default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SolverConfig {
    /// One of "highs", "cbc", "symphony". Falls back to solver-common's
    /// own search order when absent.
    pub backend: Option<String>,
    pub binary_path: Option<PathBuf>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultsConfig {
    pub duration_years: Option<f64>,
    pub capital_recovery_factor: Option<f64>,
    pub target: Option<f64>,
}

/// Loads `path` if given, else `~/.co2net/config.toml` if it exists,
/// else the empty (all-`None`) config.
pub fn load_config(path: Option<&Path>) -> Result<PlannerConfig> {
    let resolved = match path {
        Some(p) => Some(p.to_path_buf()),
        None => dirs::home_dir().map(|home| home.join(".co2net").join("config.toml")),
    };

    match resolved {
        Some(p) if p.exists() => {
            let text = std::fs::read_to_string(&p)
                .with_context(|| format!("reading config file '{}'", p.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config file '{}'", p.display()))
        }
        _ => Ok(PlannerConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_path_yields_defaults() {
        let cfg = load_config(Some(Path::new("/nonexistent/co2net-config.toml"))).unwrap();
        assert!(cfg.solver.backend.is_none());
        assert!(cfg.defaults.duration_years.is_none());
    }

    #[test]
    fn test_parses_solver_and_defaults_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[solver]\nbackend = \"highs\"\ntimeout_seconds = 120\n\n[defaults]\nduration_years = 20.0\ntarget = 5.0\n",
        )
        .unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.solver.backend.as_deref(), Some("highs"));
        assert_eq!(cfg.solver.timeout_seconds, Some(120));
        assert_eq!(cfg.defaults.duration_years, Some(20.0));
        assert_eq!(cfg.defaults.target, Some(5.0));
    }
}
