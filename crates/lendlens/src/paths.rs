use directories::ProjectDirs;
use eyre::ContextCompat as _;
use std::path::PathBuf;

/// JSON log file, created in the data dir.
pub const LOG_FILE_NAME: &str = "lendlens.log.jsonl";

#[derive(Debug, Clone)]
pub struct LensPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
}

impl LensPaths {
    pub fn discover() -> eyre::Result<Self> {
        // Test/CI override knobs.
        if let (Ok(data_dir), Ok(config_dir)) = (
            std::env::var("LENDLENS_DATA_DIR"),
            std::env::var("LENDLENS_CONFIG_DIR"),
        ) {
            return Ok(Self::rooted(PathBuf::from(config_dir), PathBuf::from(data_dir)));
        }

        // macOS: ~/Library/Application Support/lendlens
        // Linux: ~/.config/lendlens
        // Windows: %APPDATA%\\lendlens
        let proj =
            ProjectDirs::from("", "", "lendlens").context("failed to resolve project dirs")?;
        Ok(Self::rooted(
            proj.config_dir().to_path_buf(),
            proj.data_dir().to_path_buf(),
        ))
    }

    fn rooted(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        let log_file = data_dir.join(LOG_FILE_NAME);
        Self {
            config_dir,
            data_dir,
            log_file,
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn ensure_private_dirs(&self) -> eyre::Result<()> {
        crate::fsutil::ensure_private_dir(&self.config_dir)?;
        crate::fsutil::ensure_private_dir(&self.data_dir)?;
        Ok(())
    }
}
