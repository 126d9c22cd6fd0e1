//! Built-in administrative plugin

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::errors::PluginResult;
use crate::domain::entities::{EventKind, Subscription};
use crate::domain::traits::Bot;
use super::trait_def::{Plugin, PluginRegistrar, PluginType};

/// Answers admin commands. Always loaded, never unloaded or reloaded.
#[derive(Default)]
pub struct ManagePlugin {
    bot: Option<Arc<dyn Bot>>,
}

impl ManagePlugin {
    /// Registration entry for the built-in unit
    pub fn register(registrar: &mut PluginRegistrar) -> PluginResult<()> {
        registrar.register_type::<ManagePlugin>();
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.bot.is_some()
    }
}

#[async_trait]
impl Plugin for ManagePlugin {
    async fn on_enable(&mut self, bot: Arc<dyn Bot>) -> PluginResult<()> {
        tracing::debug!(bot = %bot.bot_info().name, "Admin commands available");
        self.bot = Some(bot);
        Ok(())
    }

    async fn on_disable(&mut self) -> PluginResult<()> {
        self.bot = None;
        Ok(())
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(EventKind::Text, "handle_admin_command").with_priority(u8::MAX)]
    }
}

impl PluginType for ManagePlugin {
    const NAME: &'static str = super::manager::PROTECTED_PLUGIN;
    const DESCRIPTION: &'static str = "Plugin administration";
    const AUTHOR: &'static str = "carik-bot";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");
}
