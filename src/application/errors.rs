//! Application layer errors

use std::any::Any;
use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Plugin lifecycle errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin not found: {0}")]
    NotFound(String),

    #[error("Plugin already loaded: {0}")]
    AlreadyLoaded(String),

    #[error("Plugin {0} is protected")]
    Protected(String),

    #[error("Failed to import unit '{unit}': {reason}")]
    Import { unit: String, reason: String },

    #[error("Hook {hook} failed for {plugin}: {reason}")]
    Hook {
        plugin: String,
        hook: &'static str,
        reason: String,
    },

    #[error("Hook {hook} of {plugin} did not finish within {seconds:.1}s")]
    Timeout {
        plugin: String,
        hook: &'static str,
        seconds: f64,
    },

    #[error("Host handle not set")]
    HostNotSet,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PluginResult<T> = Result<T, PluginError>;

/// Readable message from a caught panic payload
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return format!("panicked: {}", msg);
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return format!("panicked: {}", msg);
    }
    "panicked with a non-string payload".to_string()
}

/// Admin command errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
