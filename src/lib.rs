//! carik-plugin-host - plugin lifecycle manager for carik-bot
//!
//! Plugins are discovered from a directory of units, enabled against the host
//! bot and can be unloaded, reloaded or rescanned while the host keeps running.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
