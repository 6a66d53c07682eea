//! Configuration loading and management for the benefit engine.
//!
//! This module loads the pipeline configuration from YAML files: the
//! eligibility policy, the manifest of expected source files and the region
//! classification used to price each union.
//!
//! # Example
//!
//! ```no_run
//! use benefit_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Loaded configuration: {}", config.metadata().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    ColumnRef, EngineConfig, PipelineFile, PipelineMetadata, Policy, RegionSpec, RegionsFile,
    SourceKind, SourceSpec, SourcesFile,
};
