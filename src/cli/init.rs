//! Init command implementation

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use tinysteps::config::Config;

/// Default configuration content for tinysteps init
pub const DEFAULT_CONFIG: &str = r#"# Tinysteps configuration
# =======================
#
# Every key is optional; missing keys fall back to the values shown here.

# Mastery = 100 * (accuracy_weight * accuracy + level_weight * level_ratio)
# Weights are normalized so they always sum to 1.
[mastery]
accuracy_weight = 0.6
level_weight = 0.4
# Number of most recent sessions (per mode) that feed the accuracy term
accuracy_window = 5

# A year moves to "pending approval" only when all three floors are met
[graduation]
readiness_threshold = 80.0
min_sessions = 10
min_days = 14

# Oldest sessions beyond this count are dropped from the log
[history]
max_sessions = 500

# Optional catalog overrides (the built-in catalogs are used otherwise)
[catalogs]
# badges = "/path/to/badges.toml"
# curriculum = "/path/to/curriculum.toml"
"#;

/// Write the default config file
pub fn init_command(path: Option<&Path>, force: bool) -> Result<()> {
    let config_path: PathBuf = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Config already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }

    Config::write_config_file(&config_path, DEFAULT_CONFIG)?;
    info!("Wrote {}", config_path.display());
    println!("Created {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_writes_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".tinysteps/config.toml");

        init_command(Some(&path), false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
        assert_eq!(Config::load(Some(&path)).unwrap().history.max_sessions, 500);
    }

    #[test]
    fn test_init_requires_force_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[history]\nmax_sessions = 7\n").unwrap();

        let err = init_command(Some(&path), false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(Config::load(Some(&path)).unwrap().history.max_sessions, 7);

        init_command(Some(&path), true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
