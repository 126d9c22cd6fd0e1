use crate::application::errors::CommandError;
use crate::plugins::{PluginDescriptor, PluginManager};

/// Administrative command against the plugin manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    List,
    Info(String),
    Load(String),
    Unload(String),
    UnloadAll,
    Reload(String),
    ReloadAll,
    Refresh,
    Help,
}

/// Parses and runs admin commands, e.g. `/reload Weather`
pub struct AdminService {
    prefix: String,
}

impl AdminService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn parse(&self, text: &str) -> Result<AdminCommand, CommandError> {
        let text = text.trim();
        let text = text.strip_prefix(self.prefix.as_str()).unwrap_or(text);

        let parts: Vec<&str> = text.split_whitespace().collect();
        let Some((name, args)) = parts.split_first() else {
            return Err(CommandError::NotFound(String::new()));
        };

        let plugin_arg = || -> Result<String, CommandError> {
            match args {
                [plugin] => Ok(plugin.to_string()),
                _ => Err(CommandError::InvalidArgs(format!("usage: {} <plugin>", name))),
            }
        };

        match *name {
            "list" => Ok(AdminCommand::List),
            "info" => Ok(AdminCommand::Info(plugin_arg()?)),
            "load" => Ok(AdminCommand::Load(plugin_arg()?)),
            "unload" => Ok(AdminCommand::Unload(plugin_arg()?)),
            "unload-all" => Ok(AdminCommand::UnloadAll),
            "reload" => Ok(AdminCommand::Reload(plugin_arg()?)),
            "reload-all" => Ok(AdminCommand::ReloadAll),
            "refresh" => Ok(AdminCommand::Refresh),
            "help" => Ok(AdminCommand::Help),
            other => Err(CommandError::NotFound(other.to_string())),
        }
    }

    /// Run a command and render the reply
    pub async fn execute(&self, manager: &mut PluginManager, command: AdminCommand) -> String {
        match command {
            AdminCommand::List => {
                let descriptors = manager.descriptors();
                if descriptors.is_empty() {
                    return "No plugins found".to_string();
                }
                let mut reply = "Plugins:\n".to_string();
                for descriptor in &descriptors {
                    reply.push_str(&format!(
                        "  {} {} v{}\n",
                        if descriptor.enabled { "[on] " } else { "[off]" },
                        descriptor.name,
                        descriptor.version
                    ));
                }
                reply
            }
            AdminCommand::Info(name) => match manager.descriptor(&name) {
                Some(descriptor) => render_info(&descriptor),
                None => format!("Plugin {} not found", name),
            },
            AdminCommand::Load(name) => match manager.load(name.as_str()).await {
                Some(true) => format!("Loaded {}", name),
                Some(false) => format!("Failed to load {}", name),
                None => format!("Plugin {} not found", name),
            },
            AdminCommand::Unload(name) => {
                if manager.unload(&name).await {
                    format!("Unloaded {}", name)
                } else {
                    format!("Failed to unload {}", name)
                }
            }
            AdminCommand::UnloadAll => {
                let (unloaded, failed) = manager.unload_all().await;
                format!("Unloaded: {}\nFailed: {}", join(&unloaded), join(&failed))
            }
            AdminCommand::Reload(name) => {
                if manager.reload(&name).await {
                    format!("Reloaded {}", name)
                } else {
                    format!("Failed to reload {}", name)
                }
            }
            AdminCommand::ReloadAll => {
                let loaded = manager.reload_all().await;
                format!("Reloaded: {}", join(&loaded))
            }
            AdminCommand::Refresh => {
                let found = manager.refresh();
                format!("New plugins: {}", join(&found))
            }
            AdminCommand::Help => self.help(),
        }
    }

    pub fn help(&self) -> String {
        let p = &self.prefix;
        [
            format!("{p}list - List known plugins"),
            format!("{p}info <plugin> - Show plugin details"),
            format!("{p}load <plugin> - Load a plugin"),
            format!("{p}unload <plugin> - Unload a plugin"),
            format!("{p}unload-all - Unload every plugin"),
            format!("{p}reload <plugin> - Reload a plugin's code"),
            format!("{p}reload-all - Reload every plugin"),
            format!("{p}refresh - Look for new plugins"),
        ]
        .join("\n")
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

fn render_info(descriptor: &PluginDescriptor) -> String {
    let mut info = format!(
        "{} v{}\nAuthor: {}\nDescription: {}\nDirectory: {}\nEnabled: {}",
        descriptor.name,
        descriptor.version,
        descriptor.author,
        descriptor.description,
        descriptor.directory,
        descriptor.enabled
    );
    if let Some(at) = descriptor.loaded_at {
        info.push_str(&format!("\nLoaded at: {}", at.to_rfc3339()));
    }
    info
}

fn join(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}
