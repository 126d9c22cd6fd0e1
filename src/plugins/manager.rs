//! Plugin manager - handles plugin lifecycle
//!
//! Load order for one plugin is construct, bind events, `on_enable`,
//! `async_init`, register. Unload is `on_disable`, unbind events, deregister.
//! A failure is contained at the plugin (load) or unit (scan) it came from;
//! aggregate operations always finish and report partial results.

use std::collections::HashSet;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::application::errors::{panic_message, PluginError, PluginResult};
use crate::domain::traits::{Bot, EventBinder};
use crate::infrastructure::config::PluginConfig;
use crate::infrastructure::plugins::{DescriptorStore, InstanceRegistry, PluginScanner};
use crate::plugins::descriptor::{PluginDescriptor, UNKNOWN_DIRECTORY};
use crate::plugins::trait_def::{Plugin, PluginClass, PluginRegistrar};

/// The administrative plugin, exempt from unload and reload
pub const PROTECTED_PLUGIN: &str = "ManagePlugin";

/// What to load: a class handle or a plugin name to discover
#[derive(Debug, Clone)]
pub enum LoadTarget {
    Class(PluginClass),
    Name(String),
}

impl From<PluginClass> for LoadTarget {
    fn from(class: PluginClass) -> Self {
        LoadTarget::Class(class)
    }
}

impl From<&str> for LoadTarget {
    fn from(name: &str) -> Self {
        LoadTarget::Name(name.to_string())
    }
}

impl From<String> for LoadTarget {
    fn from(name: String) -> Self {
        LoadTarget::Name(name)
    }
}

/// Manages all plugins for the bot
pub struct PluginManager {
    pub(super) scanner: PluginScanner,
    pub(super) descriptors: DescriptorStore,
    pub(super) registry: InstanceRegistry,
    events: Arc<dyn EventBinder>,
    excluded: HashSet<String>,
    bot: Option<Arc<dyn Bot>>,
    hook_timeout: Option<Duration>,
}

impl PluginManager {
    /// Create a manager from the plugin section of the config
    pub fn new(config: &PluginConfig, events: Arc<dyn EventBinder>) -> Self {
        Self {
            scanner: PluginScanner::new(&config.directory, config.shadow_directory()),
            descriptors: DescriptorStore::new(),
            registry: InstanceRegistry::new(),
            events,
            excluded: config.disabled.iter().cloned().collect(),
            bot: None,
            hook_timeout: config.hook_timeout(),
        }
    }

    /// Override the per-hook timeout, `None` waits forever
    pub fn with_hook_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.hook_timeout = timeout;
        self
    }

    /// Register an in-process discovery unit
    pub fn register_unit<F>(&mut self, unit: impl Into<String>, entry: F)
    where
        F: Fn(&mut PluginRegistrar) -> PluginResult<()> + Send + Sync + 'static,
    {
        self.scanner.register_unit(unit, entry);
    }

    /// Set the host handle passed to every enable hook
    pub fn set_bot(&mut self, bot: Arc<dyn Bot>) {
        self.bot = Some(bot);
    }

    /// Load a class, or discover a plugin by name and load it.
    ///
    /// `None` means the name was not found in any unit.
    pub async fn load(&mut self, target: impl Into<LoadTarget>) -> Option<bool> {
        match target.into() {
            LoadTarget::Class(class) => Some(self.load_class(class, false).await),
            LoadTarget::Name(name) => self.load_by_name(&name).await,
        }
    }

    /// Record the class's descriptor and, unless `disabled`, instantiate it
    pub async fn load_class(&mut self, class: PluginClass, disabled: bool) -> bool {
        let name = class.name().to_string();
        match self.try_load_class(class, disabled).await {
            Ok(loaded) => loaded,
            Err(e) => {
                report(&name, "load", &e);
                false
            }
        }
    }

    /// Discover `name` in the units and load the first match
    pub async fn load_by_name(&mut self, name: &str) -> Option<bool> {
        for unit in self.scanner.units() {
            let Some(module) = self.scanner.open(&unit, true) else {
                continue;
            };
            if let Some(class) = module.find(name) {
                let class = class.clone();
                return Some(self.load_class(class, false).await);
            }
        }

        report(name, "load", &PluginError::NotFound(name.to_string()));
        None
    }

    /// Load every discovered plugin, returning the names that were enabled.
    ///
    /// Unless `include_disabled` is set, plugins whose name or unit is in the
    /// excluded set only get a descriptor.
    pub async fn load_all(&mut self, include_disabled: bool) -> Vec<String> {
        let mut loaded = Vec::new();

        for module in self.scanner.scan(false) {
            for class in module.classes() {
                let disabled = !include_disabled && self.is_excluded(class);
                if self.load_class(class.clone(), disabled).await {
                    loaded.push(class.name().to_string());
                }
            }
        }

        info!(count = loaded.len(), "Loaded plugins");
        loaded
    }

    /// Disable and drop a live plugin
    pub async fn unload(&mut self, name: &str) -> bool {
        match self.try_unload(name).await {
            Ok(()) => {
                info!(plugin = %name, "Unloaded plugin");
                true
            }
            Err(e) => {
                report(name, "unload", &e);
                false
            }
        }
    }

    /// Unload every live plugin, returning (unloaded, failed)
    pub async fn unload_all(&mut self) -> (Vec<String>, Vec<String>) {
        let mut unloaded = Vec::new();
        let mut failed = Vec::new();

        for name in self.registry.names() {
            if self.unload(&name).await {
                unloaded.push(name);
            } else {
                failed.push(name);
            }
        }

        (unloaded, failed)
    }

    /// Descriptor snapshot for one plugin
    pub fn descriptor(&self, name: &str) -> Option<PluginDescriptor> {
        self.descriptors.get(name).cloned()
    }

    /// Descriptor snapshots for every known plugin, ordered by name
    pub fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.descriptors.list()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Live instance for `name`
    pub fn instance(&self, name: &str) -> Option<&dyn Plugin> {
        self.registry.instance(name)
    }

    /// Class that built the live instance for `name`
    pub fn class(&self, name: &str) -> Option<&PluginClass> {
        self.registry.class(name)
    }

    /// Names of live plugins, sorted
    pub fn loaded_plugins(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn is_excluded(&self, class: &PluginClass) -> bool {
        self.excluded.contains(class.name())
            || class.unit().is_some_and(|unit| self.excluded.contains(unit))
    }

    async fn try_load_class(&mut self, class: PluginClass, disabled: bool) -> PluginResult<bool> {
        let name = class.name().to_string();

        if self.registry.contains(&name) {
            return Err(PluginError::AlreadyLoaded(name));
        }

        let descriptor = PluginDescriptor::from_class(&class);
        if descriptor.directory == UNKNOWN_DIRECTORY {
            warn!(plugin = %name, "Plugin provenance unknown");
        }
        self.descriptors.upsert(descriptor);

        if disabled {
            info!(plugin = %name, "Plugin is disabled, not loading");
            return Ok(false);
        }

        let instance = self.instantiate(&name, &class).await?;
        self.registry.insert(name.clone(), instance, class);
        self.descriptors.set_enabled(&name, true);
        info!(plugin = %name, "Loaded plugin");
        Ok(true)
    }

    async fn try_unload(&mut self, name: &str) -> PluginResult<()> {
        if name == PROTECTED_PLUGIN {
            return Err(PluginError::Protected(name.to_string()));
        }

        let timeout = self.hook_timeout;
        let entry = self
            .registry
            .get_mut(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        // The instance stays registered on failure so the unload can be retried.
        guard_hook(timeout, name, "on_disable", entry.instance_mut().on_disable()).await?;
        self.events.unbind_instance(name, entry.instance());

        self.registry.remove(name);
        self.descriptors.set_enabled(name, false);
        Ok(())
    }

    /// Build and enable an instance. Nothing is registered here; on failure the
    /// instance is unbound and dropped.
    async fn instantiate(&self, name: &str, class: &PluginClass) -> PluginResult<Box<dyn Plugin>> {
        let bot = self.bot.clone().ok_or(PluginError::HostNotSet)?;
        let mut instance = guard_call(name, "create", || class.create())?;

        guard_call(name, "bind_events", || {
            self.events.bind_instance(name, instance.as_ref());
            Ok(())
        })?;

        let mut started = guard_hook(self.hook_timeout, name, "on_enable", instance.on_enable(bot)).await;
        if started.is_ok() {
            started = guard_hook(self.hook_timeout, name, "async_init", instance.async_init()).await;
        }

        match started {
            Ok(()) => Ok(instance),
            Err(e) => {
                self.events.unbind_instance(name, instance.as_ref());
                Err(e)
            }
        }
    }
}

/// Log a failed lifecycle operation at the level its kind deserves
pub(super) fn report(plugin: &str, op: &'static str, err: &PluginError) {
    match err {
        PluginError::AlreadyLoaded(_) => debug!(plugin = %plugin, op, error = %err, "Plugin already loaded"),
        PluginError::NotFound(_) | PluginError::Protected(_) => {
            warn!(plugin = %plugin, op, error = %err, "Plugin operation refused")
        }
        _ => error!(plugin = %plugin, op, error = %err, "Plugin operation failed"),
    }
}

/// Run synchronous plugin code, turning a panic into a hook failure
fn guard_call<T>(plugin: &str, hook: &'static str, f: impl FnOnce() -> PluginResult<T>) -> PluginResult<T> {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(PluginError::Hook {
            plugin: plugin.to_string(),
            hook,
            reason: panic_message(payload),
        }),
    }
}

/// Await a plugin hook within the configured time bound, containing panics
async fn guard_hook<F>(
    timeout: Option<Duration>,
    plugin: &str,
    hook: &'static str,
    fut: F,
) -> PluginResult<()>
where
    F: Future<Output = PluginResult<()>>,
{
    let fut = AssertUnwindSafe(fut).catch_unwind();
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| PluginError::Timeout {
            plugin: plugin.to_string(),
            hook,
            seconds: limit.as_secs_f64(),
        })?,
        None => fut.await,
    };

    let reason = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => panic_message(payload),
    };
    Err(PluginError::Hook {
        plugin: plugin.to_string(),
        hook,
        reason,
    })
}
