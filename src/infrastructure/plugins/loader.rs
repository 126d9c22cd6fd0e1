//! Plugin loader - Discovers plugin units and imports their implementations
//!
//! A discovery unit is either a built-in unit registered in-process or a
//! directory under the plugins root holding an entry library (`libmain.so`,
//! `main.dll`, `libmain.dylib`). Libraries are loaded from a uniquely named
//! shadow copy so a re-import always maps the code currently on disk.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::mem::ManuallyDrop;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use uuid::Uuid;

use crate::application::errors::{panic_message, PluginError, PluginResult};
use crate::plugins::{PluginClass, PluginRegistrar, RegisterFn, REGISTER_SYMBOL};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Registration entry of a built-in unit
pub type UnitEntry = Arc<dyn Fn(&mut PluginRegistrar) -> PluginResult<()> + Send + Sync>;

/// Whether `name` is a valid unit identifier
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Entry library path inside a unit directory
pub fn entry_point(unit_dir: &Path) -> PathBuf {
    unit_dir.join(libloading::library_filename("main"))
}

/// A loaded shadow copy of a unit's entry library.
///
/// The copy is deleted once the library is closed.
pub struct SharedLibrary {
    library: ManuallyDrop<Library>,
    path: PathBuf,
}

impl SharedLibrary {
    fn open(path: PathBuf) -> Result<Self, libloading::Error> {
        let library = unsafe { Library::new(&path) }?;
        Ok(Self {
            library: ManuallyDrop::new(library),
            path,
        })
    }

    fn register_fn(&self) -> Result<RegisterFn, libloading::Error> {
        unsafe { self.library.get::<RegisterFn>(REGISTER_SYMBOL).map(|symbol| *symbol) }
    }
}

impl Drop for SharedLibrary {
    fn drop(&mut self) {
        // Close before deleting the file, some platforms lock mapped files.
        unsafe { ManuallyDrop::drop(&mut self.library) };
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %e, "Failed to remove shadow library");
        }
    }
}

/// Contents of one imported unit
#[derive(Debug)]
pub struct PluginModule {
    unit: String,
    classes: Vec<PluginClass>,
}

impl PluginModule {
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn classes(&self) -> &[PluginClass] {
        &self.classes
    }

    /// Class whose name matches
    pub fn find(&self, name: &str) -> Option<&PluginClass> {
        self.classes.iter().find(|class| class.name() == name)
    }
}

/// Scans the plugins root and keeps a cache of imported units
pub struct PluginScanner {
    root: PathBuf,
    shadow_dir: PathBuf,
    builtin: HashMap<String, UnitEntry>,
    cache: HashMap<String, Arc<PluginModule>>,
}

impl PluginScanner {
    pub fn new(root: impl Into<PathBuf>, shadow_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            shadow_dir: shadow_dir.into(),
            builtin: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Register an in-process unit. It shadows a directory of the same name.
    pub fn register_unit<F>(&mut self, unit: impl Into<String>, entry: F)
    where
        F: Fn(&mut PluginRegistrar) -> PluginResult<()> + Send + Sync + 'static,
    {
        let unit = unit.into();
        self.cache.remove(&unit);
        self.builtin.insert(unit, Arc::new(entry));
    }

    /// Discovery units in discovery order
    pub fn units(&self) -> Vec<String> {
        let mut units: BTreeSet<String> = BTreeSet::new();

        for unit in self.builtin.keys() {
            if is_identifier(unit) {
                units.insert(unit.clone());
            } else {
                tracing::warn!(unit = %unit, "Skipping built-in unit with invalid name");
            }
        }

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(root = %self.root.display(), error = %e, "Plugin directory not readable");
                return units.into_iter().collect();
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_dir() || !entry_point(&path).is_file() {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!(path = %path.display(), "Skipping plugin directory with non UTF-8 name");
                continue;
            };

            if !is_identifier(name) {
                tracing::warn!(unit = %name, "Skipping plugin directory with invalid name");
                continue;
            }

            units.insert(name.to_string());
        }

        units.into_iter().collect()
    }

    /// Import a unit, reusing the cached module if there is one
    pub fn import(&mut self, unit: &str) -> PluginResult<Arc<PluginModule>> {
        if let Some(module) = self.cache.get(unit) {
            return Ok(module.clone());
        }
        self.reimport(unit)
    }

    /// Drop any cached state for the unit and import it again
    pub fn reimport(&mut self, unit: &str) -> PluginResult<Arc<PluginModule>> {
        self.cache.remove(unit);
        let module = Arc::new(self.load_unit(unit)?);
        tracing::debug!(unit = %unit, classes = module.classes().len(), "Imported plugin unit");
        self.cache.insert(unit.to_string(), module.clone());
        Ok(module)
    }

    /// Import a unit, logging and swallowing failures
    pub fn open(&mut self, unit: &str, fresh: bool) -> Option<Arc<PluginModule>> {
        let result = if fresh { self.reimport(unit) } else { self.import(unit) };
        match result {
            Ok(module) => Some(module),
            Err(e) => {
                tracing::error!(unit = %unit, error = %e, "Failed to import plugin unit");
                None
            }
        }
    }

    /// Import every unit; a broken unit is logged and skipped
    pub fn scan(&mut self, fresh: bool) -> Vec<Arc<PluginModule>> {
        self.units()
            .iter()
            .filter_map(|unit| self.open(unit, fresh))
            .collect()
    }

    /// Discard cached modules, optionally keeping one unit
    pub fn invalidate_all(&mut self, keep: Option<&str>) {
        self.cache.retain(|unit, _| Some(unit.as_str()) == keep);
    }

    pub fn is_cached(&self, unit: &str) -> bool {
        self.cache.contains_key(unit)
    }

    fn load_unit(&self, unit: &str) -> PluginResult<PluginModule> {
        if !is_identifier(unit) {
            return Err(import_error(unit, "invalid unit name"));
        }

        let mut registrar = PluginRegistrar::new();
        let library = match self.builtin.get(unit) {
            Some(entry) => {
                catch_unwind(AssertUnwindSafe(|| entry(&mut registrar)))
                    .map_err(|payload| import_error(unit, panic_message(payload)))?
                    .map_err(|e| import_error(unit, e))?;
                None
            }
            None => {
                let library = self.load_library(unit)?;
                let register = library
                    .register_fn()
                    .map_err(|e| import_error(unit, format!("missing registration entry: {}", e)))?;
                catch_unwind(AssertUnwindSafe(|| unsafe { register(&mut registrar) }))
                    .map_err(|payload| import_error(unit, panic_message(payload)))?;
                Some(library)
            }
        };

        let mut classes: Vec<PluginClass> = Vec::new();
        for factory in registrar.into_factories() {
            if classes.iter().any(|c| c.name() == factory.name()) {
                tracing::warn!(unit = %unit, plugin = %factory.name(), "Duplicate plugin name in unit, ignoring");
                continue;
            }
            classes.push(PluginClass::discovered(factory, unit, library.clone()));
        }

        Ok(PluginModule {
            unit: unit.to_string(),
            classes,
        })
    }

    fn load_library(&self, unit: &str) -> PluginResult<Arc<SharedLibrary>> {
        let source = entry_point(&self.root.join(unit));
        if !source.is_file() {
            return Err(import_error(unit, format!("entry library not found: {}", source.display())));
        }

        fs::create_dir_all(&self.shadow_dir)?;
        let shadow = self.shadow_dir.join(format!(
            "{}-{}.{}",
            unit,
            Uuid::new_v4().simple(),
            std::env::consts::DLL_EXTENSION
        ));
        fs::copy(&source, &shadow)?;

        match SharedLibrary::open(shadow.clone()) {
            Ok(library) => Ok(Arc::new(library)),
            Err(e) => {
                let _ = fs::remove_file(&shadow);
                Err(import_error(unit, format!("failed to load library: {}", e)))
            }
        }
    }
}

fn import_error(unit: &str, reason: impl ToString) -> PluginError {
    PluginError::Import {
        unit: unit.to_string(),
        reason: reason.to_string(),
    }
}
