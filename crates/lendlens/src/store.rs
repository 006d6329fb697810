use crate::{
    config::LensConfig,
    market::{calc, fixed::FixedPointPolicy},
    paths::LensPaths,
};
use eyre::Context as _;
use std::{fs, path::PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

fn parse_fixed_point_env(s: &str) -> Option<FixedPointPolicy> {
    match s.trim().to_lowercase().as_str() {
        "raw" => Some(FixedPointPolicy::Raw),
        "normalized" | "normalised" => Some(FixedPointPolicy::Normalized),
        _ => None,
    }
}

/// Apply `LENDLENS_*` environment overrides on top of the file contents.
///
/// Per-network RPC endpoints use `LENDLENS_RPC_URL_<NETWORK>` (network name upper-cased).
fn apply_env_overrides(cfg: &mut LensConfig) {
    /// Helper: if an env var is set and non-empty, apply `setter` with the trimmed value.
    fn apply_env(var: &str, setter: impl FnOnce(&str)) {
        if let Ok(u) = std::env::var(var) {
            let t = u.trim();
            if !t.is_empty() {
                setter(t);
            }
        }
    }

    apply_env("LENDLENS_BLOCK_TIME_SECONDS", |v| match calc::parse_block_time(v) {
        Ok(secs) => cfg.calculator.block_time_seconds = secs,
        Err(_e) => warn!(value = v, "ignoring invalid LENDLENS_BLOCK_TIME_SECONDS"),
    });
    apply_env("LENDLENS_DAYS_PER_YEAR", |v| match v.parse::<u32>() {
        Ok(days) if days > 0 => cfg.calculator.days_per_year = days,
        _ => warn!(value = v, "ignoring invalid LENDLENS_DAYS_PER_YEAR"),
    });
    apply_env("LENDLENS_FIXED_POINT", |v| match parse_fixed_point_env(v) {
        Some(p) => cfg.calculator.fixed_point = p,
        None => warn!(value = v, "ignoring invalid LENDLENS_FIXED_POINT"),
    });
    for (name, net) in &mut cfg.networks {
        apply_env(&format!("LENDLENS_RPC_URL_{}", name.to_uppercase()), |v| {
            v.clone_into(&mut net.rpc_url);
        });
    }
}

impl ConfigStore {
    pub fn new(paths: &LensPaths) -> Self {
        Self {
            path: paths.config_file(),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn load_or_init_default(&self) -> eyre::Result<LensConfig> {
        if !self.path.exists() {
            // Overrides stay out of the file written on first run.
            let mut cfg = LensConfig::default();
            self.save(&cfg)?;
            apply_env_overrides(&mut cfg);
            cfg.validate().context("validate config.toml")?;
            return Ok(cfg);
        }

        let s = fs::read_to_string(&self.path).context("read config.toml")?;
        let mut cfg: LensConfig = toml::from_str(&s).context("parse config.toml")?;
        apply_env_overrides(&mut cfg);
        cfg.validate().context("validate config.toml")?;
        Ok(cfg)
    }

    pub fn save(&self, cfg: &LensConfig) -> eyre::Result<()> {
        let s = toml::to_string_pretty(cfg).context("serialize config.toml")?;
        crate::fsutil::write_string_atomic(&self.path, &s).context("write config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &std::path::Path) -> ConfigStore {
        ConfigStore {
            path: dir.join("config.toml"),
        }
    }

    #[test]
    fn first_run_writes_defaults() -> eyre::Result<()> {
        let tmp = tempfile::tempdir()?;
        let store = store_in(tmp.path());
        let cfg = store.load_or_init_default()?;
        assert!(store.path().exists());
        assert!(cfg.networks.contains_key("ethereum"));

        let on_disk: LensConfig = toml::from_str(&fs::read_to_string(store.path())?)?;
        assert_eq!(on_disk, LensConfig::default());
        Ok(())
    }

    #[test]
    fn edits_on_disk_are_loaded() -> eyre::Result<()> {
        let tmp = tempfile::tempdir()?;
        let store = store_in(tmp.path());
        let mut cfg = LensConfig::default();
        cfg.calculator.days_per_year = 360;
        cfg.logos.insert("FOO".to_owned(), "foo.png".to_owned());
        store.save(&cfg)?;
        let loaded = store.load_or_init_default()?;
        assert_eq!(loaded.calculator.days_per_year, 360);
        assert_eq!(loaded.logos.get("FOO").map(String::as_str), Some("foo.png"));
        Ok(())
    }

    #[test]
    fn corrupt_file_is_an_error() -> eyre::Result<()> {
        let tmp = tempfile::tempdir()?;
        let store = store_in(tmp.path());
        fs::write(store.path(), "calculator = [")?;
        assert!(store.load_or_init_default().is_err());
        Ok(())
    }

    #[test]
    fn unusable_rate_constants_on_disk_are_rejected() -> eyre::Result<()> {
        let tmp = tempfile::tempdir()?;
        let store = store_in(tmp.path());
        fs::write(store.path(), "[calculator]\nblock_time_seconds = -2.1\n")?;
        let err = store.load_or_init_default().err().map(|e| format!("{e:#}"));
        assert!(
            err.as_deref().is_some_and(|e| e.contains("invalid rate constants")),
            "{err:?}"
        );

        fs::write(store.path(), "[calculator]\ndays_per_year = 0\n")?;
        assert!(store.load_or_init_default().is_err());
        Ok(())
    }

    #[test]
    fn fixed_point_env_values() {
        assert_eq!(parse_fixed_point_env("Raw"), Some(FixedPointPolicy::Raw));
        assert_eq!(
            parse_fixed_point_env(" normalized "),
            Some(FixedPointPolicy::Normalized)
        );
        assert_eq!(parse_fixed_point_env("scaled"), None);
    }
}
