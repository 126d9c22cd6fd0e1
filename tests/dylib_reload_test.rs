//! Hot reload of a real library unit
//! Builds tests/fixtures/echo_plugin.rs as a cdylib, so the first run compiles the crate again.
//! Run with: cargo test --test dylib_reload_test

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use carik_plugin_host::application::messaging::EventRegistry;
use carik_plugin_host::infrastructure::config::PluginConfig;
use carik_plugin_host::infrastructure::plugins::loader::entry_point;
use carik_plugin_host::plugins::PluginManager;
use common::TestBot;

const MANIFEST_DIR: &str = env!("CARGO_MANIFEST_DIR");

/// Builds share one target directory, so a build and the copy of its output
/// must not interleave with another test's build.
static BUILD: Mutex<()> = Mutex::new(());

fn toml_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

/// Build the fixture plugin with the given version baked in, returning the library path
fn build_echo_plugin(version: &str) -> PathBuf {
    let work = Path::new(env!("CARGO_TARGET_TMPDIR")).join("echo_plugin");
    fs::create_dir_all(&work).unwrap();

    let manifest = format!(
        r#"[package]
name = "echo_plugin"
version = "0.1.0"
edition = "2021"

[lib]
crate-type = ["cdylib"]
path = "{source}"

[dependencies]
carik-plugin-host = {{ path = "{host}" }}

[workspace]
"#,
        source = toml_path(&Path::new(MANIFEST_DIR).join("tests/fixtures/echo_plugin.rs")),
        host = toml_path(Path::new(MANIFEST_DIR)),
    );
    fs::write(work.join("Cargo.toml"), manifest).unwrap();

    // Resolve the same dependency versions as the host.
    let lock = Path::new(MANIFEST_DIR).join("Cargo.lock");
    if lock.is_file() && !work.join("Cargo.lock").is_file() {
        fs::copy(&lock, work.join("Cargo.lock")).unwrap();
    }

    let target = work.join("target");
    let output = Command::new(option_env!("CARGO").unwrap_or("cargo"))
        .arg("build")
        .arg("--manifest-path")
        .arg(work.join("Cargo.toml"))
        .arg("--target-dir")
        .arg(&target)
        .env("ECHO_PLUGIN_VERSION", version)
        .output()
        .expect("failed to run cargo");
    assert!(
        output.status.success(),
        "echo plugin build failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );

    target.join("debug").join(libloading::library_filename("echo_plugin"))
}

/// Build the fixture at `version` and install it as `<root>/<unit>/`
fn install_echo_plugin(version: &str, root: &Path, unit: &str) {
    let _guard = BUILD.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let library = build_echo_plugin(version);
    let dir = root.join(unit);
    fs::create_dir_all(&dir).unwrap();
    fs::copy(library, entry_point(&dir)).unwrap();
}

fn shadow_files(shadow: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(shadow) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

#[tokio::test]
async fn test_library_unit_loads_and_hot_reloads() {
    common::ensure_init();
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("plugins");
    let shadow = tmp.path().join("shadow");

    install_echo_plugin("0.1.0", &root, "echo");

    let config = PluginConfig {
        directory: root.clone(),
        shadow_directory: Some(shadow.clone()),
        ..PluginConfig::default()
    };
    let events = Arc::new(EventRegistry::new());
    let mut manager = PluginManager::new(&config, events.clone());
    manager.set_bot(Arc::new(TestBot));

    assert_eq!(manager.load_all(false).await, vec!["EchoPlugin".to_string()]);
    let descriptor = manager.descriptor("EchoPlugin").unwrap();
    assert_eq!(descriptor.directory, "echo");
    assert_eq!(descriptor.version, "0.1.0");
    assert_eq!(descriptor.description, "Echoes text back");
    assert!(events.is_bound("EchoPlugin"));

    let first_copy = shadow_files(&shadow);
    assert_eq!(first_copy.len(), 1);

    // Replace the library on disk, then reload from it.
    install_echo_plugin("0.2.0", &root, "echo");
    let old_class = manager.class("EchoPlugin").unwrap().clone();

    assert!(manager.reload("EchoPlugin").await);
    assert_eq!(manager.descriptor("EchoPlugin").unwrap().version, "0.2.0");
    assert!(!manager.class("EchoPlugin").unwrap().same_as(&old_class));

    // The old copy stays mapped while a class from it is alive.
    assert_eq!(shadow_files(&shadow).len(), 2);
    drop(old_class);
    let second_copy = shadow_files(&shadow);
    assert_eq!(second_copy.len(), 1);
    assert_ne!(second_copy, first_copy);

    // The descriptor and module cache still hold the library after unload.
    assert!(manager.unload("EchoPlugin").await);
    assert!(!events.is_bound("EchoPlugin"));
    assert_eq!(shadow_files(&shadow), second_copy);

    drop(manager);
    assert!(shadow_files(&shadow).is_empty());
}

#[tokio::test]
async fn test_library_unit_reload_all_replaces_copy() {
    common::ensure_init();
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("plugins");
    let shadow = tmp.path().join("shadow");

    install_echo_plugin("0.1.0", &root, "echo");

    let config = PluginConfig {
        directory: root,
        shadow_directory: Some(shadow.clone()),
        ..PluginConfig::default()
    };
    let mut manager = PluginManager::new(&config, Arc::new(EventRegistry::new()));
    manager.set_bot(Arc::new(TestBot));

    manager.load_all(false).await;
    let before = shadow_files(&shadow);

    assert_eq!(manager.reload_all().await, vec!["EchoPlugin".to_string()]);
    let after = shadow_files(&shadow);
    assert_eq!(after.len(), 1);
    assert_ne!(after, before);
}
