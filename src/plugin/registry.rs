/*
 *  plugin/registry.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Registry of loaded plugins and the object classes they provide
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use log::{debug, error, info, warn};

use crate::error::AuraError;
use crate::object::ObjectInstance;
use super::adapter::Plugin;
use super::library::{LibraryLoader, NativeLibraryLoader};
use super::loader::{LoadedPlugin, PluginLoader};
use super::types::{ObjectClass, PluginDescription, PluginKind};

/// Every plugin found under one root directory
///
/// Built once by [`PluginRegistry::open`]; a candidate that fails to load is
/// logged and skipped, so the registry may hold fewer plugins than there are
/// library files (possibly none). Dropping the registry unloads every plugin
/// and closes its library.
pub struct PluginRegistry {
    root: PathBuf,
    plugins: BTreeMap<PathBuf, LoadedPlugin>,
    classes: HashMap<ObjectClass, PathBuf>,
    object_types: HashMap<PluginKind, Vec<String>>,
}

impl PluginRegistry {
    /// Scan `root` and load every plugin found, using the system loader
    pub fn open(root: impl AsRef<Path>) -> Result<Self, AuraError> {
        Self::open_with(root, &NativeLibraryLoader)
    }

    /// Scan `root`, opening candidates through `loader`
    pub fn open_with(root: impl AsRef<Path>, loader: &dyn LibraryLoader) -> Result<Self, AuraError> {
        let root = root.as_ref();
        info!("Scanning for plugins in {}", root.display());

        let candidates = PluginLoader::discover(root)?;
        let mut registry = Self {
            root: root.to_path_buf(),
            plugins: BTreeMap::new(),
            classes: HashMap::new(),
            object_types: HashMap::new(),
        };

        for path in candidates {
            match PluginLoader::load_plugin(&path, loader) {
                Ok(loaded) => registry.register(loaded),
                Err(e) => error!("Skipping plugin {}: {}", path.display(), e),
            }
        }

        info!("Loaded {} plugins from {}", registry.len(), root.display());
        Ok(registry)
    }

    fn register(&mut self, loaded: LoadedPlugin) {
        let path = loaded.path().to_path_buf();
        let description = loaded.plugin().description();

        for object_type in &description.object_types {
            let class = ObjectClass::new(description.kind, object_type.clone());
            debug!("Registering {} from '{}'", class, description.name);

            match self.classes.insert(class, path.clone()) {
                Some(previous) if previous == path => warn!(
                    "'{}' ({}) lists {}:{} twice",
                    description.name,
                    path.display(),
                    description.kind,
                    object_type
                ),
                Some(previous) => {
                    let previous_name = self
                        .plugins
                        .get(&previous)
                        .map(|p| p.plugin().description().name.as_str())
                        .unwrap_or("?");
                    warn!(
                        "{}:{} provided by both '{}' ({}) and '{}' ({}), using the latter",
                        description.kind,
                        object_type,
                        previous_name,
                        previous.display(),
                        description.name,
                        path.display()
                    );
                }
                None => self
                    .object_types
                    .entry(description.kind)
                    .or_default()
                    .push(object_type.clone()),
            }
        }

        self.plugins.insert(path, loaded);
    }

    /// Plugin providing `object_type` for `kind`, if any
    ///
    /// The plugin is borrowed; its unload hook stays with the registry.
    ///
    /// ```compile_fail,E0599
    /// # use aura_live::{PluginKind, PluginRegistry};
    /// let registry = PluginRegistry::open("plugins").unwrap();
    /// registry.plugin_for(PluginKind::Element, "colour").unwrap().unload();
    /// ```
    pub fn plugin_for(&self, kind: PluginKind, object_type: &str) -> Option<&dyn Plugin> {
        let path = self.classes.get(&ObjectClass::new(kind, object_type))?;
        self.plugins.get(path).map(|loaded| loaded.plugin() as &dyn Plugin)
    }

    /// Object types registered for `kind`, in registration order
    pub fn object_types_for(&self, kind: PluginKind) -> &[String] {
        self.object_types.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up the provider of `object_type` and ask it for an instance
    pub fn create_object(&self, kind: PluginKind, object_type: &str) -> Option<ObjectInstance<'_>> {
        match self.plugin_for(kind, object_type) {
            Some(plugin) => plugin.create_object(kind, object_type),
            None => {
                debug!("No plugin provides {}:{}", kind, object_type);
                None
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Paths of the loaded plugins, in load order
    pub fn plugin_paths(&self) -> impl Iterator<Item = &Path> {
        self.plugins.keys().map(PathBuf::as_path)
    }

    /// Descriptions of the loaded plugins, in load order
    pub fn descriptions(&self) -> impl Iterator<Item = &PluginDescription> {
        self.plugins.values().map(|loaded| loaded.plugin().description())
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        debug!("Unloading {} plugins", self.plugins.len());
        // Each LoadedPlugin unloads before closing its library
        self.plugins.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_directory_is_not_an_error() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("readme.txt"), b"no plugins here").unwrap();

        let registry = PluginRegistry::open(root.path()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.root(), root.path());
        assert!(registry.object_types_for(PluginKind::Element).is_empty());
        assert!(registry.plugin_for(PluginKind::Element, "colour").is_none());
        assert!(registry.create_object(PluginKind::Element, "colour").is_none());
    }

    #[test]
    fn test_corrupt_library_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let name = format!("broken{}", std::env::consts::DLL_SUFFIX);
        std::fs::write(root.path().join(name), b"not a shared object").unwrap();

        let registry = PluginRegistry::open(root.path()).unwrap();
        assert_eq!(registry.len(), 0);
    }
}
