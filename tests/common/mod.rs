//! Shared fixtures for plugin manager tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use carik_plugin_host::application::errors::{BotError, PluginError, PluginResult};
use carik_plugin_host::application::messaging::EventRegistry;
use carik_plugin_host::domain::entities::{EventKind, Subscription};
use carik_plugin_host::domain::traits::{Bot, BotInfo};
use carik_plugin_host::infrastructure::config::PluginConfig;
use carik_plugin_host::plugins::{
    ManagePlugin, Plugin, PluginFactory, PluginManager, PluginRegistrar, PROTECTED_PLUGIN,
};

static INIT: Once = Once::new();

pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Shared record of hook calls, e.g. `"PluginA:on_enable"`
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// How a fixture plugin misbehaves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fault {
    #[default]
    None,
    FailEnable,
    FailInit,
    FailDisable,
    HangEnable,
    PanicCreate,
    PanicEnable,
    PanicInit,
    PanicDisable,
}

/// Factory for a scripted test plugin
#[derive(Clone)]
pub struct Fixture {
    pub name: &'static str,
    pub version: String,
    pub fault: Fault,
    pub log: CallLog,
}

impl Fixture {
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            version: "1.0.0".to_string(),
            fault: Fault::None,
            log: log.clone(),
        }
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

impl PluginFactory for Fixture {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "test fixture"
    }

    fn author(&self) -> &str {
        "tests"
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn create(&self) -> PluginResult<Box<dyn Plugin>> {
        self.log.lock().unwrap().push(format!("{}:create", self.name));
        if self.fault == Fault::PanicCreate {
            panic!("{} constructor bug", self.name);
        }
        Ok(Box::new(FixturePlugin {
            name: self.name,
            fault: self.fault,
            log: self.log.clone(),
        }))
    }
}

struct FixturePlugin {
    name: &'static str,
    fault: Fault,
    log: CallLog,
}

impl FixturePlugin {
    fn record(&self, hook: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, hook));
    }
}

#[async_trait]
impl Plugin for FixturePlugin {
    async fn async_init(&mut self) -> PluginResult<()> {
        self.record("async_init");
        match self.fault {
            Fault::FailInit => return Err(PluginError::Internal("init exploded".into())),
            Fault::PanicInit => panic!("{} init bug", self.name),
            _ => {}
        }
        Ok(())
    }

    async fn on_enable(&mut self, _bot: Arc<dyn Bot>) -> PluginResult<()> {
        self.record("on_enable");
        match self.fault {
            Fault::FailEnable => Err(PluginError::Internal("enable exploded".into())),
            Fault::HangEnable => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            Fault::PanicEnable => panic!("{} enable bug", self.name),
            _ => Ok(()),
        }
    }

    async fn on_disable(&mut self) -> PluginResult<()> {
        self.record("on_disable");
        match self.fault {
            Fault::FailDisable => return Err(PluginError::Internal("disable exploded".into())),
            Fault::PanicDisable => panic!("{} disable bug", self.name),
            _ => {}
        }
        Ok(())
    }

    fn subscriptions(&self) -> Vec<Subscription> {
        vec![Subscription::new(EventKind::Text, "handle_text")]
    }
}

/// Host handle that only reports who it is
pub struct TestBot;

#[async_trait]
impl Bot for TestBot {
    async fn send_message(&self, _chat_id: &str, _text: &str) -> Result<String, BotError> {
        Ok("test".to_string())
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: "test".to_string(),
            name: "test-bot".to_string(),
            username: "test_bot".to_string(),
        }
    }
}

/// Manager over an empty plugins directory, with the admin plugin registered
/// and the host handle set
pub struct Harness {
    pub manager: PluginManager,
    pub events: Arc<EventRegistry>,
    pub log: CallLog,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new(disabled: &[&str]) -> Self {
        ensure_init();
        let dir = tempfile::tempdir().unwrap();
        let config = PluginConfig {
            directory: dir.path().join("plugins"),
            disabled: disabled.iter().map(|s| s.to_string()).collect(),
            hook_timeout_secs: 5,
            shadow_directory: Some(dir.path().join("shadow")),
        };
        let events = Arc::new(EventRegistry::new());
        let mut manager = PluginManager::new(&config, events.clone());
        manager.register_unit(PROTECTED_PLUGIN, ManagePlugin::register);
        manager.set_bot(Arc::new(TestBot));

        Self {
            manager,
            events,
            log: Arc::new(Mutex::new(Vec::new())),
            dir,
        }
    }

    /// Register a unit exposing the given fixtures
    pub fn unit(&mut self, unit: &str, fixtures: Vec<Fixture>) {
        self.manager.register_unit(unit, move |registrar: &mut PluginRegistrar| {
            for fixture in &fixtures {
                registrar.register(fixture.clone());
            }
            Ok(())
        });
    }

    /// Register a unit that counts imports and bumps its fixture's patch
    /// version on each one, standing in for changed code on disk
    pub fn versioned_unit(&mut self, unit: &str, name: &'static str) -> Arc<AtomicUsize> {
        let imports = Arc::new(AtomicUsize::new(0));
        let counter = imports.clone();
        let log = self.log.clone();
        self.manager.register_unit(unit, move |registrar: &mut PluginRegistrar| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            registrar.register(Fixture::new(name, &log).with_version(format!("1.0.{}", n)));
            Ok(())
        });
        imports
    }

    /// Register a unit whose import always fails
    pub fn broken_unit(&mut self, unit: &str) {
        self.manager.register_unit(unit, |_: &mut PluginRegistrar| {
            Err(PluginError::Internal("syntax error in unit".into()))
        });
    }

    /// Register a unit whose import panics
    pub fn panicking_unit(&mut self, unit: &str) {
        self.manager.register_unit(unit, |_: &mut PluginRegistrar| -> PluginResult<()> {
            panic!("unit registration bug")
        });
    }

    pub fn fixture(&self, name: &'static str) -> Fixture {
        Fixture::new(name, &self.log)
    }
}
