//! Run Loader - configs, instruction sets and genomes from disk
//!
//! # Usage
//!
//! ```ignore
//! use headcpu::loader::{DataLoader, load_config, load_genome};
//!
//! // Configure data directory once at startup
//! DataLoader::set_data_dir("/path/to/run");
//!
//! let config = load_config(DataLoader::path("hardware", "json"))?;
//! let set = load_inst_set(DataLoader::path("instset-heads", "cfg"), &lib)?;
//! let genome = load_genome(DataLoader::path("default-heads", "org"), &set)?;
//! ```
//!
//! # File formats
//!
//! - `*.json`: a [`HardwareConfig`]; missing fields take their defaults
//! - instruction sets: `INSTSET` / `INST` lines (see [`InstSet`])
//! - `*.org`: one instruction name per line, `#` comments
//! - anything else holding a genome: its symbol string

use crate::config::HardwareConfig;
use crate::genome::Genome;
use crate::vm::{InstLib, InstSet};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global data directory for run files
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Data directory configuration
pub struct DataLoader;

impl DataLoader {
    /// Set the data directory. Only the first call takes effect.
    pub fn set_data_dir<P: AsRef<Path>>(path: P) {
        let _ = DATA_DIR.set(path.as_ref().to_path_buf());
    }

    /// The configured data directory, or "data/headcpu"
    pub fn data_dir() -> PathBuf {
        DATA_DIR.get().cloned().unwrap_or_else(|| PathBuf::from("data/headcpu"))
    }

    /// `{data_dir}/{name}.{ext}`
    pub fn path(name: &str, ext: &str) -> PathBuf {
        Self::data_dir().join(name).with_extension(ext)
    }
}

/// Load and validate a JSON hardware config
pub fn load_config(path: impl AsRef<Path>) -> Result<HardwareConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: HardwareConfig = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &HardwareConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Load an instruction set file against `lib`
pub fn load_inst_set<H>(path: impl AsRef<Path>, lib: &InstLib<H>) -> Result<InstSet<H>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read instruction set {}", path.display()))?;
    let set = InstSet::parse(&text, lib)
        .with_context(|| format!("Failed to parse instruction set {}", path.display()))?;
    log::debug!("loaded instruction set '{}' ({} instructions)", set.name(), set.len());
    Ok(set)
}

/// Load a genome: `.org` files by instruction name, anything else as a
/// symbol string
pub fn load_genome<H>(path: impl AsRef<Path>, set: &InstSet<H>) -> Result<Genome> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read genome {}", path.display()))?;
    let genome = if path.extension().map_or(false, |ext| ext == "org") {
        Genome::parse_org(&text, set)
    } else {
        Genome::from_symbols(text.trim())
    }
    .with_context(|| format!("Failed to parse genome {}", path.display()))?;
    genome.check_against(set);
    Ok(genome)
}

/// Write a genome as an `.org` listing
pub fn save_genome_org<H>(genome: &Genome, set: &InstSet<H>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, genome.to_org(set))
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplitPolicy;
    use crate::vm::dialects::heads;

    #[test]
    fn test_data_dir_default() {
        let path = DataLoader::path("ancestor", "org");
        assert!(path.to_string_lossy().ends_with("ancestor.org"));
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hw.json");
        let cfg = HardwareConfig {
            split_policy: SplitPolicy::Half,
            ..HardwareConfig::strict()
        };
        save_config(&cfg, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), cfg);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "stack_size": 0 }"#).unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("stack_size"));
        assert!(load_config(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_inst_set_and_genomes() {
        let dir = tempfile::tempdir().unwrap();
        let lib = heads::library().unwrap();

        let set_path = dir.path().join("instset.cfg");
        std::fs::write(&set_path, heads::DEFAULT_INST_SET).unwrap();
        let set = load_inst_set(&set_path, &lib).unwrap();
        assert_eq!(set.len(), 26);

        let org = dir.path().join("tiny.org");
        std::fs::write(&org, "h-alloc\nh-copy\n# end\nh-divide\n").unwrap();
        let g = load_genome(&org, &set).unwrap();
        assert_eq!(g.to_symbols(), "wvx");

        let sym = dir.path().join("tiny.gen");
        std::fs::write(&sym, "wvx\n").unwrap();
        assert_eq!(load_genome(&sym, &set).unwrap(), g);

        let out = dir.path().join("out.org");
        save_genome_org(&g, &set, &out).unwrap();
        assert_eq!(load_genome(&out, &set).unwrap(), g);
    }

    #[test]
    fn test_bad_genome_reports_file() {
        let dir = tempfile::tempdir().unwrap();
        let lib = heads::library().unwrap();
        let set = heads::default_inst_set(&lib).unwrap();
        let org = dir.path().join("bad.org");
        std::fs::write(&org, "h-alloc\nfrobnicate\n").unwrap();
        let err = load_genome(&org, &set).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.org"));
    }
}
