//! Plugin trait definitions

use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::application::errors::PluginResult;
use crate::domain::entities::Subscription;
use crate::domain::traits::Bot;
use crate::infrastructure::plugins::loader::SharedLibrary;

/// Symbol every plugin library exports, see [`export_plugins!`](crate::export_plugins)
pub const REGISTER_SYMBOL: &[u8] = b"carik_plugin_register";

/// Signature of the exported registration entry
pub type RegisterFn = unsafe fn(&mut PluginRegistrar);

/// Core plugin trait that all plugins must implement
///
/// Hooks run in a fixed order: construct, bind events, `on_enable`, `async_init`
/// on load and `on_disable`, unbind events on unload.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Async part of initialization, runs after `on_enable`
    async fn async_init(&mut self) -> PluginResult<()> {
        Ok(())
    }

    /// Called with the host handle when the plugin is enabled
    async fn on_enable(&mut self, _bot: Arc<dyn Bot>) -> PluginResult<()> {
        Ok(())
    }

    /// Called before the plugin is removed
    async fn on_disable(&mut self) -> PluginResult<()> {
        Ok(())
    }

    /// Handlers this plugin wants bound into message routing
    fn subscriptions(&self) -> Vec<Subscription> {
        Vec::new()
    }
}

/// Constructible plugin implementation with its static metadata
pub trait PluginFactory: Send + Sync {
    /// Unique plugin name
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn author(&self) -> &str {
        ""
    }

    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Build a fresh, not yet enabled instance
    fn create(&self) -> PluginResult<Box<dyn Plugin>>;
}

/// A plugin type whose metadata is known at compile time
pub trait PluginType: Plugin + Default + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str = "";
    const AUTHOR: &'static str = "";
    const VERSION: &'static str = "0.0.0";
}

/// Factory for any [`PluginType`]
pub struct TypeFactory<P>(PhantomData<fn() -> P>);

impl<P: PluginType> TypeFactory<P> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<P: PluginType> Default for TypeFactory<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PluginType> PluginFactory for TypeFactory<P> {
    fn name(&self) -> &str {
        P::NAME
    }

    fn description(&self) -> &str {
        P::DESCRIPTION
    }

    fn author(&self) -> &str {
        P::AUTHOR
    }

    fn version(&self) -> &str {
        P::VERSION
    }

    fn create(&self) -> PluginResult<Box<dyn Plugin>> {
        Ok(Box::new(P::default()))
    }
}

/// Collects the implementations a discovery unit exposes
#[derive(Default)]
pub struct PluginRegistrar {
    factories: Vec<Arc<dyn PluginFactory>>,
}

impl PluginRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F: PluginFactory + 'static>(&mut self, factory: F) {
        self.factories.push(Arc::new(factory));
    }

    pub fn register_type<P: PluginType>(&mut self) {
        self.register(TypeFactory::<P>::new());
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub(crate) fn into_factories(self) -> Vec<Arc<dyn PluginFactory>> {
        self.factories
    }
}

/// Handle on one plugin implementation plus where it came from.
///
/// Cloning is cheap. For library units the handle keeps the library mapped,
/// so the factory (and anything it built) never outlives its code.
#[derive(Clone)]
pub struct PluginClass {
    factory: Arc<dyn PluginFactory>,
    unit: Option<String>,
    library: Option<Arc<SharedLibrary>>,
}

impl PluginClass {
    /// Class that did not come out of discovery, its provenance is unknown
    pub fn detached(factory: Arc<dyn PluginFactory>) -> Self {
        Self {
            factory,
            unit: None,
            library: None,
        }
    }

    pub(crate) fn discovered(
        factory: Arc<dyn PluginFactory>,
        unit: impl Into<String>,
        library: Option<Arc<SharedLibrary>>,
    ) -> Self {
        Self {
            factory,
            unit: Some(unit.into()),
            library,
        }
    }

    pub fn name(&self) -> &str {
        self.factory.name()
    }

    pub fn description(&self) -> &str {
        self.factory.description()
    }

    pub fn author(&self) -> &str {
        self.factory.author()
    }

    pub fn version(&self) -> &str {
        self.factory.version()
    }

    /// Discovery unit this class was imported from
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn create(&self) -> PluginResult<Box<dyn Plugin>> {
        self.factory.create()
    }

    /// True when both handles point at the same factory object
    pub fn same_as(&self, other: &PluginClass) -> bool {
        Arc::ptr_eq(&self.factory, &other.factory)
    }
}

impl fmt::Debug for PluginClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginClass")
            .field("name", &self.name())
            .field("unit", &self.unit)
            .field("library", &self.library.is_some())
            .finish()
    }
}

/// Export plugin types from a `cdylib` so a filesystem unit can be discovered.
///
/// ```ignore
/// carik_plugin_host::export_plugins!(WeatherPlugin, ReminderPlugin);
/// ```
#[macro_export]
macro_rules! export_plugins {
    ($($plugin:ty),+ $(,)?) => {
        #[no_mangle]
        pub fn carik_plugin_register(registrar: &mut $crate::plugins::PluginRegistrar) {
            $( registrar.register_type::<$plugin>(); )+
        }
    };
}
