//! Descriptor store - Metadata for every discovered plugin

use std::collections::HashMap;
use chrono::Utc;
use crate::plugins::PluginDescriptor;

/// Holds one descriptor per plugin name, whether or not it is loaded
#[derive(Debug, Default)]
pub struct DescriptorStore {
    descriptors: HashMap<String, PluginDescriptor>,
}

impl DescriptorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by name.
    ///
    /// An enabled entry stays enabled: rescans never regress live-load state.
    pub fn upsert(&mut self, mut descriptor: PluginDescriptor) {
        if let Some(existing) = self.descriptors.get(&descriptor.name) {
            if existing.enabled {
                descriptor.enabled = true;
                descriptor.loaded_at = existing.loaded_at;
            }
        }
        self.descriptors.insert(descriptor.name.clone(), descriptor);
    }

    /// Insert only when the name is unknown, returns whether it was inserted
    pub fn insert_if_absent(&mut self, descriptor: PluginDescriptor) -> bool {
        if self.descriptors.contains_key(&descriptor.name) {
            return false;
        }
        self.descriptors.insert(descriptor.name.clone(), descriptor);
        true
    }

    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.descriptors.get(name)
    }

    /// Snapshot of all descriptors, ordered by name
    pub fn list(&self) -> Vec<PluginDescriptor> {
        let mut all: Vec<PluginDescriptor> = self.descriptors.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Flip the enabled flag, returns false if the name is unknown
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.descriptors.get_mut(name) {
            Some(descriptor) => {
                descriptor.enabled = enabled;
                descriptor.loaded_at = enabled.then(Utc::now);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
