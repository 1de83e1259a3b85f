use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Run settings: built-in defaults, then `hbook.toml` if present, then
/// `HBOOK_*` environment variables. CLI flags are applied on top by `main`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub db_path: PathBuf,
    pub show_warnings: bool,
    /// Programs per parallel batch.
    pub chunk_size: usize,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("hbook").required(false))
                .add_source(Environment::with_prefix("HBOOK")),
        )
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .set_default("input_dir", "data")?
            .set_default("output_dir", "data")?
            .set_default("db_path", "data/hbook.sqlite")?
            .set_default("show_warnings", false)?
            .set_default("chunk_size", 500_i64)?
            .build()
            .context("reading settings")?
            .try_deserialize()
            .context("invalid settings")
    }

    pub fn input(&self, file: &str) -> PathBuf {
        self.input_dir.join(file)
    }

    pub fn output(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::from_builder(Config::builder()).unwrap();
        assert_eq!(settings.input_dir, PathBuf::from("data"));
        assert_eq!(settings.db_path, PathBuf::from("data/hbook.sqlite"));
        assert!(!settings.show_warnings);
        assert_eq!(settings.chunk_size, 500);
        assert_eq!(settings.output("programs-refined.json"), PathBuf::from("data/programs-refined.json"));
    }

    #[test]
    fn overrides_win_over_defaults() {
        let builder = Config::builder()
            .set_override("output_dir", "out")
            .unwrap()
            .set_override("show_warnings", true)
            .unwrap();
        let settings = Settings::from_builder(builder).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert!(settings.show_warnings);
    }
}
