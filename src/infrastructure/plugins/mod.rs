//! Plugin infrastructure for carik-bot
//! 
//! Discovery units are scanned by the `PluginScanner`; the `DescriptorStore`
//! remembers every implementation found and the `InstanceRegistry` owns the live ones.

pub mod loader;
pub mod registry;
pub mod store;

pub use loader::{PluginModule, PluginScanner, UnitEntry};
pub use registry::{InstanceRegistry, LoadedInstance};
pub use store::DescriptorStore;
