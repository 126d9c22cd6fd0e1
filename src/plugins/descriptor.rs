//! Plugin descriptor - metadata kept for every known plugin

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::trait_def::PluginClass;

/// Directory recorded when a class's provenance cannot be determined
pub const UNKNOWN_DIRECTORY: &str = "unknown";

/// Metadata record for one plugin implementation, loaded or not
#[derive(Debug, Clone, Serialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub description: String,
    pub author: String,
    pub version: String,
    /// Discovery unit the plugin came from
    pub directory: String,
    /// True iff a live instance exists
    pub enabled: bool,
    pub loaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub class: PluginClass,
}

impl PluginDescriptor {
    /// Fresh, disabled descriptor for a class
    pub fn from_class(class: &PluginClass) -> Self {
        Self {
            name: class.name().to_string(),
            description: class.description().to_string(),
            author: class.author().to_string(),
            version: class.version().to_string(),
            directory: class.unit().unwrap_or(UNKNOWN_DIRECTORY).to_string(),
            enabled: false,
            loaded_at: None,
            class: class.clone(),
        }
    }

    /// Same metadata, ignoring load state and the class handle
    pub fn same_metadata(&self, other: &PluginDescriptor) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.author == other.author
            && self.version == other.version
            && self.directory == other.directory
    }
}
