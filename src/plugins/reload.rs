//! Hot reload - replacing plugin code without restarting the host

use tracing::{info, warn};

use super::descriptor::PluginDescriptor;
use super::manager::{report, PluginManager, PROTECTED_PLUGIN};
use crate::application::errors::PluginError;

impl PluginManager {
    /// Unload `name`, re-import its unit and load the fresh implementation
    pub async fn reload(&mut self, name: &str) -> bool {
        if name == PROTECTED_PLUGIN {
            report(name, "reload", &PluginError::Protected(name.to_string()));
            return false;
        }

        let Some(class) = self.registry.class(name) else {
            report(name, "reload", &PluginError::NotFound(name.to_string()));
            return false;
        };
        let Some(unit) = class.unit().map(str::to_string) else {
            warn!(plugin = %name, "Plugin provenance unknown, cannot reload");
            return false;
        };

        if !self.unload(name).await {
            return false;
        }

        let module = match self.scanner.reimport(&unit) {
            Ok(module) => module,
            Err(e) => {
                report(name, "reload", &e);
                return false;
            }
        };

        let Some(fresh) = module.find(name).cloned() else {
            report(name, "reload", &PluginError::NotFound(name.to_string()));
            return false;
        };

        let reloaded = self.load_class(fresh, false).await;
        if reloaded {
            info!(plugin = %name, "Reloaded plugin");
        }
        reloaded
    }

    /// Unload everything but the protected plugin, drop all cached units and
    /// load from scratch. Returns the names loaded.
    ///
    /// Plugins in the excluded set stay off, as they do at startup.
    pub async fn reload_all(&mut self) -> Vec<String> {
        for name in self.registry.names() {
            if name == PROTECTED_PLUGIN {
                continue;
            }
            if !self.unload(&name).await {
                warn!(plugin = %name, "Plugin failed to unload, reloading the rest anyway");
            }
        }

        let keep = self
            .registry
            .class(PROTECTED_PLUGIN)
            .and_then(|class| class.unit())
            .map(str::to_string);
        self.scanner.invalidate_all(keep.as_deref());

        self.load_all(false).await
    }

    /// Re-run discovery and record descriptors for plugins not seen before,
    /// without loading anything.
    ///
    /// Returns the newly discovered names.
    pub fn refresh(&mut self) -> Vec<String> {
        let mut discovered = Vec::new();

        for module in self.scanner.scan(true) {
            for class in module.classes() {
                if self.descriptors.insert_if_absent(PluginDescriptor::from_class(class)) {
                    discovered.push(class.name().to_string());
                }
            }
        }

        if !discovered.is_empty() {
            info!(count = discovered.len(), "Discovered new plugins");
        }
        discovered
    }
}
