//! Configuration types for taxomerge

use crate::types::Flag;
use crate::TaxomergeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub conflict: ConflictConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignmentConfig {
    /// Division skeleton in nested notation, e.g. `(Bacteria,Archaea,(Metazoa,Fungi)Eukaryota)life`
    #[serde(default)]
    pub skeleton: Option<String>,
    /// Align tips before internal nodes so subsumption has evidence to work with
    #[serde(default = "default_tips_first")]
    pub tips_first: bool,
    /// Accept a lone surviving candidate as a weak match
    #[serde(default = "default_use_elimination")]
    pub use_elimination: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeConfig {
    /// Flags OR-ed from a source node into its union counterpart
    #[serde(default = "default_sticky_flags")]
    pub sticky_flags: Vec<Flag>,
    /// Reject a resolution when the target has children the source cannot place
    #[serde(default = "default_absorb_unaccounted")]
    pub absorb_unaccounted: bool,
}

/// How input tips are matched to reference nodes during conflict analysis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TipKey {
    #[default]
    Name,
    Id,
    Source,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConflictConfig {
    #[serde(default)]
    pub tip_key: TipKey,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when TAXOMERGE_LOG is not set
    #[serde(default = "default_level")]
    pub level: String,
}

// Default value functions
fn default_tips_first() -> bool { true }
fn default_use_elimination() -> bool { true }
fn default_sticky_flags() -> Vec<Flag> { vec![Flag::Extinct, Flag::Edited, Flag::ForcedVisible] }
fn default_absorb_unaccounted() -> bool { true }
fn default_level() -> String { "info".to_string() }

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            skeleton: None,
            tips_first: default_tips_first(),
            use_elimination: default_use_elimination(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            sticky_flags: default_sticky_flags(),
            absorb_unaccounted: default_absorb_unaccounted(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, TaxomergeError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), TaxomergeError> {
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.alignment.skeleton, None);
        assert!(config.alignment.tips_first);
        assert!(config.alignment.use_elimination);

        assert_eq!(
            config.merge.sticky_flags,
            vec![Flag::Extinct, Flag::Edited, Flag::ForcedVisible]
        );
        assert!(config.merge.absorb_unaccounted);

        assert_eq!(config.conflict.tip_key, TipKey::Name);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config, default_config());
    }

    #[test]
    fn test_load_valid_config() {
        let toml_content = r#"
[alignment]
skeleton = "(Bacteria,(Metazoa,Fungi)Eukaryota)life"
tips_first = false
use_elimination = false

[merge]
sticky_flags = ["extinct", "hybrid"]
absorb_unaccounted = false

[conflict]
tip_key = "source"

[logging]
level = "debug"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(
            config.alignment.skeleton.as_deref(),
            Some("(Bacteria,(Metazoa,Fungi)Eukaryota)life")
        );
        assert!(!config.alignment.tips_first);
        assert!(!config.alignment.use_elimination);
        assert_eq!(config.merge.sticky_flags, vec![Flag::Extinct, Flag::Hybrid]);
        assert!(!config.merge.absorb_unaccounted);
        assert_eq!(config.conflict.tip_key, TipKey::Source);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_partial_config() {
        let toml_content = r#"
[conflict]
tip_key = "id"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(config.conflict.tip_key, TipKey::Id);
        assert!(config.alignment.tips_first);
        assert_eq!(config.merge, MergeConfig::default());
    }

    #[test]
    fn test_load_invalid_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "this is not valid TOML {{").unwrap();

        match load_config(temp_file.path()).unwrap_err() {
            TaxomergeError::Configuration(msg) => {
                assert!(msg.contains("Failed to parse config"));
            }
            _ => panic!("Expected Configuration error"),
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_config("/nonexistent/path/to/taxomerge.toml");
        assert!(matches!(result, Err(TaxomergeError::Io(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.alignment.skeleton = Some("(a,b)life".to_string());
        config.conflict.tip_key = TipKey::Id;

        save_config(temp_file.path(), &config).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(loaded, config);
    }
}
