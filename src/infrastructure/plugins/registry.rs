//! Plugin registry - Live plugin instances

use std::collections::HashMap;
use crate::plugins::{Plugin, PluginClass};

/// A live instance together with the class that built it.
///
/// Field order matters: the instance drops before the class, which may be
/// what keeps the instance's code mapped.
pub struct LoadedInstance {
    instance: Box<dyn Plugin>,
    class: PluginClass,
}

impl LoadedInstance {
    pub fn instance(&self) -> &dyn Plugin {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> &mut dyn Plugin {
        self.instance.as_mut()
    }

    pub fn class(&self) -> &PluginClass {
        &self.class
    }
}

/// Registry for live plugins.
///
/// `name -> instance` and `name -> class` are stored as one entry, so the two
/// views always have the same keys.
#[derive(Default)]
pub struct InstanceRegistry {
    entries: HashMap<String, LoadedInstance>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live instance, refusing a name that is already live
    pub fn insert(&mut self, name: impl Into<String>, instance: Box<dyn Plugin>, class: PluginClass) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, LoadedInstance { instance, class });
        true
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LoadedInstance> {
        self.entries.get_mut(name)
    }

    pub fn instance(&self, name: &str) -> Option<&dyn Plugin> {
        self.entries.get(name).map(LoadedInstance::instance)
    }

    pub fn class(&self, name: &str) -> Option<&PluginClass> {
        self.entries.get(name).map(LoadedInstance::class)
    }

    pub fn remove(&mut self, name: &str) -> Option<LoadedInstance> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Live plugin names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
