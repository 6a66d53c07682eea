//! External collaborators of the pipeline.
//!
//! Both collaborators sit behind a trait, and each has a caching wrapper so
//! a run asks about any document or identifier at most once.

mod registry;
mod rules;

pub use registry::{
    CachedRegistryLookup, DEFAULT_REGISTRY_URL, HttpRegistryLookup, RegistryLookup,
    RegistryProfile, normalize_registry_id, profile_from_response,
};
pub use rules::{CachedRuleExtractor, ExtractedRule, RuleExtractor, TextRuleExtractor};
