//! Runtime configuration loaded from the environment.
//!
//! Training hyper-parameters live in [`crate::training::TrainConfig`]; this
//! snapshot only covers where files live and how loud the logs are.

use std::env;
use std::path::PathBuf;

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub data_root: String,
    pub artifact_path: String,
    pub log_level: u8,
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let data_root = env_or("CROPCAST_DATA_ROOT", "./data");
        let default_artifact = PathBuf::from(&data_root)
            .join("models")
            .join("cropcast.json");
        let artifact_path = lookup("CROPCAST_ARTIFACT")
            .unwrap_or_else(|| default_artifact.to_string_lossy().into_owned());

        Self {
            data_root,
            artifact_path,
            log_level: env_or("CROPCAST_LOG_LEVEL", "1").parse().unwrap_or(1),
        }
    }
}

/// Convenience wrapper kept for parity with [`AppCfg::load`].
pub fn load_cfg() -> AppCfg {
    AppCfg::load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppCfg::from_lookup(|_| None);
        assert_eq!(cfg.data_root, "./data");
        assert_eq!(cfg.log_level, 1);
        assert!(cfg.artifact_path.ends_with("cropcast.json"));
        assert!(cfg.artifact_path.contains("models"));
    }

    #[test]
    fn overrides_and_bad_levels() {
        let vars: HashMap<&str, &str> = [
            ("CROPCAST_DATA_ROOT", "/srv/crops"),
            ("CROPCAST_ARTIFACT", "/tmp/model.json"),
            ("CROPCAST_LOG_LEVEL", "loud"),
        ]
        .into_iter()
        .collect();
        let cfg = AppCfg::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(cfg.data_root, "/srv/crops");
        assert_eq!(cfg.artifact_path, "/tmp/model.json");
        assert_eq!(cfg.log_level, 1);
    }
}
