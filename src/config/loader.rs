//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading pipeline
//! configurations from YAML files.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{
    EngineConfig, Policy, PipelineFile, PipelineMetadata, RegionSpec, RegionsFile, SourceKind,
    SourceSpec, SourcesFile,
};

/// Loads and provides access to the pipeline configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── pipeline.yaml   # Metadata, reference period, date formats, policy
/// ├── sources.yaml    # Expected source files and their columns
/// └── regions.yaml    # Region names and union-name patterns
/// ```
///
/// # Example
///
/// ```no_run
/// use benefit_engine::config::{ConfigLoader, SourceKind};
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// let active = loader.get_source(SourceKind::Active).unwrap();
/// println!("Base population from {}", active.file);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML (`ConfigParseError`)
    /// - The source manifest is inconsistent (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let pipeline_path = path.join("pipeline.yaml");
        let pipeline = Self::load_yaml::<PipelineFile>(&pipeline_path)?;

        let sources_path = path.join("sources.yaml");
        let sources = Self::load_yaml::<SourcesFile>(&sources_path)?;
        Self::validate_sources(&sources_path, &sources.sources)?;

        let regions_path = path.join("regions.yaml");
        let regions = Self::load_yaml::<RegionsFile>(&regions_path)?;

        let config = EngineConfig::new(pipeline, sources.sources, regions.regions);

        Ok(Self { config })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Checks the manifest declares each kind once and always has a base population.
    fn validate_sources(path: &Path, sources: &[SourceSpec]) -> EngineResult<()> {
        let parse_error = |message: String| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message,
        };

        let mut seen = BTreeSet::new();
        for source in sources {
            if !seen.insert(source.kind) {
                return Err(parse_error(format!(
                    "source '{}' is declared more than once",
                    source.kind
                )));
            }
        }

        match sources.iter().find(|s| s.kind == SourceKind::Active) {
            Some(active) if active.required => Ok(()),
            Some(_) => Err(parse_error(
                "the active employees source cannot be optional".to_string(),
            )),
            None => Err(parse_error(
                "no active employees source declared".to_string(),
            )),
        }
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the configuration metadata.
    pub fn metadata(&self) -> &PipelineMetadata {
        self.config.metadata()
    }

    /// Returns the eligibility policy.
    pub fn policy(&self) -> &Policy {
        self.config.policy()
    }

    /// Returns the configured regions.
    pub fn regions(&self) -> &[RegionSpec] {
        self.config.regions()
    }

    /// Gets a declared source by kind.
    ///
    /// Returns `ConfigNotFound` naming the kind if the manifest does not declare it.
    pub fn get_source(&self, kind: SourceKind) -> EngineResult<&SourceSpec> {
        self.config
            .source(kind)
            .ok_or_else(|| EngineError::ConfigNotFound {
                path: format!("sources.yaml: {}", kind),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnRef;
    use crate::models::ReferencePeriod;

    fn config_path() -> &'static str {
        "./config/default"
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.metadata().name, "Monthly meal and transport benefit");
        assert_eq!(
            loader.config().period(),
            ReferencePeriod::new(2025, 5)
        );
    }

    #[test]
    fn test_policy_loaded_correctly() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let policy = loader.policy();

        assert_eq!(policy.termination_cutoff_day, 15);
        assert_eq!(policy.full_month_vacation_days, 30);
        assert!(
            policy
                .excluded_leave_categories
                .contains(&"Licença Maternidade".to_string())
        );
        assert!(policy.excluded_role_titles.contains(&"DIRETOR".to_string()));
    }

    #[test]
    fn test_all_sources_declared() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        for kind in [
            SourceKind::Active,
            SourceKind::Vacations,
            SourceKind::Terminations,
            SourceKind::Admissions,
            SourceKind::Leaves,
            SourceKind::Apprentices,
            SourceKind::Interns,
            SourceKind::RegionRates,
            SourceKind::WorkingDays,
            SourceKind::UnionDocuments,
        ] {
            assert!(loader.get_source(kind).is_ok(), "missing {kind}");
        }
    }

    #[test]
    fn test_working_days_source_has_header_offset() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let working_days = loader.get_source(SourceKind::WorkingDays).unwrap();

        assert_eq!(working_days.header_row, 1);
        assert_eq!(working_days.columns.get("union"), Some(&ColumnRef::Index(0)));
    }

    #[test]
    fn test_region_rates_source_is_comma_separated() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let rates = loader.get_source(SourceKind::RegionRates).unwrap();
        assert_eq!(rates.delimiter, ',');
    }

    #[test]
    fn test_regions_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let names: Vec<&str> = loader.regions().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["São Paulo", "Rio Grande do Sul", "Paraná", "Rio de Janeiro"]
        );
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("pipeline.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_source_kind_rejected() {
        let sources: SourcesFile = serde_yaml::from_str(
            "sources:\n  - kind: active\n    file: a.csv\n  - kind: active\n    file: b.csv\n",
        )
        .unwrap();

        let result = ConfigLoader::validate_sources(Path::new("sources.yaml"), &sources.sources);
        assert!(matches!(result, Err(EngineError::ConfigParseError { .. })));
    }

    #[test]
    fn test_missing_active_source_rejected() {
        let sources: SourcesFile =
            serde_yaml::from_str("sources:\n  - kind: vacations\n    file: f.csv\n").unwrap();

        match ConfigLoader::validate_sources(Path::new("sources.yaml"), &sources.sources) {
            Err(EngineError::ConfigParseError { message, .. }) => {
                assert!(message.contains("active"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }
}
