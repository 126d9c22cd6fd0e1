//! Event registry - Tracks which plugin handlers are bound

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::entities::{EventKind, Subscription};
use crate::domain::traits::EventBinder;
use crate::plugins::Plugin;

/// Records the subscriptions of every bound plugin instance
#[derive(Default)]
pub struct EventRegistry {
    bindings: RwLock<HashMap<String, Vec<Subscription>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a plugin currently has handlers bound
    pub fn is_bound(&self, plugin: &str) -> bool {
        self.bindings
            .read()
            .ok()
            .map(|b| b.contains_key(plugin))
            .unwrap_or(false)
    }

    /// Handlers for an event kind, highest priority first
    pub fn subscribers(&self, kind: EventKind) -> Vec<(String, Subscription)> {
        let Ok(bindings) = self.bindings.read() else {
            return Vec::new();
        };

        let mut found: Vec<(String, Subscription)> = bindings
            .iter()
            .flat_map(|(plugin, subs)| {
                subs.iter()
                    .filter(move |s| s.kind == kind)
                    .map(move |s| (plugin.clone(), s.clone()))
            })
            .collect();
        found.sort_by(|a, b| b.1.priority.cmp(&a.1.priority).then_with(|| a.0.cmp(&b.0)));
        found
    }

    /// Number of bound plugins
    pub fn len(&self) -> usize {
        self.bindings.read().ok().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventBinder for EventRegistry {
    fn bind_instance(&self, plugin: &str, instance: &dyn Plugin) {
        let subscriptions = instance.subscriptions();
        tracing::debug!(plugin = %plugin, handlers = subscriptions.len(), "Binding plugin handlers");
        if let Ok(mut bindings) = self.bindings.write() {
            bindings.insert(plugin.to_string(), subscriptions);
        }
    }

    fn unbind_instance(&self, plugin: &str, _instance: &dyn Plugin) {
        if let Ok(mut bindings) = self.bindings.write() {
            bindings.remove(plugin);
        }
    }
}
