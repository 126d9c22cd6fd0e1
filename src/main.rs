use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use carik_plugin_host::application::errors::BotError;
use carik_plugin_host::application::messaging::EventRegistry;
use carik_plugin_host::application::services::AdminService;
use carik_plugin_host::infrastructure::adapters::ConsoleAdapter;
use carik_plugin_host::infrastructure::config::Config;
use carik_plugin_host::plugins::{ManagePlugin, PluginManager, PROTECTED_PLUGIN};

#[derive(Parser)]
#[command(name = "carik-plugin-host")]
#[command(about = "Plugin lifecycle manager for carik-bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Load plugins and accept admin commands on stdin
    Run,
    /// Discover plugins without loading them
    List {
        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run(load_config(&cli.config)).await,
        Commands::List { json } => list(load_config(&cli.config), json),
        Commands::Version => {
            println!("carik-plugin-host v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(&cli.config),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: &str) -> Config {
    if std::path::Path::new(path).exists() {
        Config::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    }
}

fn build_manager(config: &Config) -> PluginManager {
    let mut manager = PluginManager::new(&config.plugins, Arc::new(EventRegistry::new()));
    manager.register_unit(PROTECTED_PLUGIN, ManagePlugin::register);
    manager
}

async fn run(config: Config) -> Result<(), BotError> {
    tracing::info!(
        "Starting {} with plugins from {}",
        config.bot.name,
        config.plugins.directory.display()
    );

    let mut manager = build_manager(&config);
    manager.set_bot(Arc::new(ConsoleAdapter::new(config.bot.name.clone())));

    let loaded = manager.load_all(false).await;
    tracing::info!("Plugin system initialized with {} plugins: {}", loaded.len(), loaded.join(", "));

    let admin = AdminService::new(config.bot.prefix.clone());
    println!("{}", admin.help());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read stdin: {}", e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        match admin.parse(line) {
            Ok(command) => println!("{}", admin.execute(&mut manager, command).await),
            Err(e) => println!("{}", e),
        }
    }

    let (unloaded, failed) = manager.unload_all().await;
    tracing::info!("Shutting down: {} unloaded, {} still loaded", unloaded.len(), failed.len());
    Ok(())
}

fn list(config: Config, json: bool) -> Result<(), BotError> {
    let mut manager = build_manager(&config);
    manager.refresh();
    let descriptors = manager.descriptors();

    if json {
        let out = serde_json::to_string_pretty(&descriptors)
            .map_err(|e| BotError::Internal(format!("Failed to serialize descriptors: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    for d in descriptors {
        println!("{:<24} v{:<10} {:<16} {}", d.name, d.version, d.directory, d.description);
    }
    Ok(())
}

fn init_config(path: &str) -> Result<(), BotError> {
    if std::path::Path::new(path).exists() {
        println!("Config file already exists: {}", path);
        return Ok(());
    }

    let yaml = Config::default().to_yaml()?;
    std::fs::write(path, yaml).map_err(|e| BotError::Internal(format!("Failed to write config: {}", e)))?;
    println!("Created {}", path);
    Ok(())
}
