//! Plugin system for carik-bot
//! 
//! Discovers plugin implementations, enables them against the host bot and
//! supports unload, reload and rescan without restarting the host.

pub mod descriptor;
pub mod manage;
pub mod manager;
pub mod reload;
pub mod trait_def;

pub use descriptor::{PluginDescriptor, UNKNOWN_DIRECTORY};
pub use manage::ManagePlugin;
pub use manager::{LoadTarget, PluginManager, PROTECTED_PLUGIN};
pub use trait_def::{
    Plugin, PluginClass, PluginFactory, PluginRegistrar, PluginType, RegisterFn, TypeFactory,
    REGISTER_SYMBOL,
};
