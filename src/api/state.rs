//! Shared state of the calculation API.

use std::sync::Arc;

use crate::config::{ConfigLoader, Policy};

/// State handed to every request.
///
/// The configuration directory is loaded once at startup; requests only
/// ever read the eligibility policy from it, so the loader is shared behind
/// an `Arc` and never reloaded while serving.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
}

impl AppState {
    /// Wraps a loaded configuration directory.
    pub fn new(config: ConfigLoader) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Cutoff day, vacation threshold and exclusion lists applied to posted records.
    pub fn policy(&self) -> &Policy {
        self.config.policy()
    }
}
