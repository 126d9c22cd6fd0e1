//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Plugins: Discovery, descriptor store and instance registry
//! - Adapters: Host integrations (console)

pub mod config;
pub mod plugins;
pub mod adapters;
