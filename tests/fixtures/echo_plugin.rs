//! Minimal library unit built by `dylib_reload_test`

use carik_plugin_host::domain::entities::{EventKind, Subscription};
use carik_plugin_host::plugins::{Plugin, PluginType};

#[derive(Default)]
pub struct EchoPlugin;

impl Plugin for EchoPlugin {
    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(EventKind::Text, "echo")]
    }
}

impl PluginType for EchoPlugin {
    const NAME: &'static str = "EchoPlugin";
    const DESCRIPTION: &'static str = "Echoes text back";
    const AUTHOR: &'static str = "tests";
    const VERSION: &'static str = match option_env!("ECHO_PLUGIN_VERSION") {
        Some(version) => version,
        None => "0.1.0",
    };
}

carik_plugin_host::export_plugins!(EchoPlugin);
