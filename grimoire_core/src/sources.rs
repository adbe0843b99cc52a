//! XP source registry.
//!
//! Maps source identifiers to display names, multipliers, and caps. Unknown
//! sources are created on first reference with defaults, so external callers
//! can invent their own channels without a registration handshake.

use crate::types::{XpSourceDescriptor, SOURCE_ANY, SOURCE_DIRECT, SOURCE_SCHOOL, SOURCE_SELF};
use std::collections::HashMap;

/// Registry of XP source descriptors, keyed by free-form source id
#[derive(Clone, Debug)]
pub struct SourceRegistry {
    sources: HashMap<String, XpSourceDescriptor>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    /// Registry seeded with the built-in sources at default values
    pub fn new() -> Self {
        let mut sources = HashMap::new();
        for (id, descriptor) in builtin_descriptors() {
            sources.insert(id.to_string(), descriptor);
        }
        Self { sources }
    }

    /// Register a source, creating it with defaults if absent.
    ///
    /// If the source already exists only the display name is updated.
    /// Returns true when this call created the descriptor, which is the
    /// only occasion a "source registered" event should fire.
    pub fn register(&mut self, source_id: &str, display_name: &str) -> bool {
        match self.sources.get_mut(source_id) {
            Some(descriptor) => {
                descriptor.display_name = display_name.to_string();
                false
            }
            None => {
                tracing::debug!("Registered XP source '{}'", source_id);
                self.sources.insert(
                    source_id.to_string(),
                    XpSourceDescriptor::with_defaults(display_name),
                );
                true
            }
        }
    }

    /// Resolve a source descriptor, auto-creating with defaults if unknown
    pub fn resolve(&mut self, source_id: &str) -> &XpSourceDescriptor {
        self.sources
            .entry(source_id.to_string())
            .or_insert_with(|| XpSourceDescriptor::with_defaults(source_id))
    }

    /// Set a source's multiplier, silently clamped to be non-negative
    pub fn set_multiplier(&mut self, source_id: &str, value: f64) {
        let clamped = value.max(0.0);
        self.resolve_mut(source_id).multiplier = clamped;
    }

    /// Set a source's cap, silently clamped into [0, 100] percent
    pub fn set_cap(&mut self, source_id: &str, percent: f64) {
        let clamped = percent.clamp(0.0, 100.0);
        self.resolve_mut(source_id).cap_percent = clamped;
    }

    /// Cap percent for a source (default 100 if never referenced)
    pub fn cap_percent(&self, source_id: &str) -> f64 {
        self.sources
            .get(source_id)
            .map(|d| d.cap_percent)
            .unwrap_or(100.0)
    }

    /// Look up a source without creating it
    pub fn get(&self, source_id: &str) -> Option<&XpSourceDescriptor> {
        self.sources.get(source_id)
    }

    /// Iterate all known sources
    pub fn iter(&self) -> impl Iterator<Item = (&str, &XpSourceDescriptor)> {
        self.sources.iter().map(|(id, d)| (id.as_str(), d))
    }

    /// Entries that differ from a freshly-seeded registry.
    ///
    /// This is what gets persisted: custom sources plus built-ins whose
    /// multiplier/cap/name have been changed.
    pub fn overrides(&self) -> HashMap<String, XpSourceDescriptor> {
        let defaults: HashMap<&str, XpSourceDescriptor> =
            builtin_descriptors().into_iter().collect();

        self.sources
            .iter()
            .filter(|(id, descriptor)| defaults.get(id.as_str()) != Some(*descriptor))
            .map(|(id, descriptor)| (id.clone(), descriptor.clone()))
            .collect()
    }

    /// Re-apply persisted overrides on top of the built-in defaults
    pub fn apply_overrides(&mut self, overrides: HashMap<String, XpSourceDescriptor>) {
        for (id, mut descriptor) in overrides {
            descriptor.multiplier = descriptor.multiplier.max(0.0);
            descriptor.cap_percent = descriptor.cap_percent.clamp(0.0, 100.0);
            self.sources.insert(id, descriptor);
        }
    }

    fn resolve_mut(&mut self, source_id: &str) -> &mut XpSourceDescriptor {
        self.sources
            .entry(source_id.to_string())
            .or_insert_with(|| XpSourceDescriptor::with_defaults(source_id))
    }
}

/// The sources that always exist, with their default descriptors
fn builtin_descriptors() -> Vec<(&'static str, XpSourceDescriptor)> {
    vec![
        (SOURCE_ANY, XpSourceDescriptor::with_defaults("Any")),
        (SOURCE_SCHOOL, XpSourceDescriptor::with_defaults("School")),
        (SOURCE_DIRECT, XpSourceDescriptor::with_defaults("Direct")),
        (SOURCE_SELF, XpSourceDescriptor::with_defaults("Self Study")),
    ]
}
