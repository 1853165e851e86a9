/*
 *  plugin/loader.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Plugin loader - discovers and loads .so/.dylib/.dll files
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

use std::collections::BTreeSet;
use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use log::{debug, info, warn};

use crate::error::{AuraError, PluginError};
use super::adapter::{NativePlugin, Plugin};
use super::library::{LibraryLoader, PluginLibrary};

/// A validated plugin together with the library that holds its code
///
/// Dropping it runs the plugin's unload hook and only then closes the
/// library: `plugin` is declared before `library`, so the library handle is
/// the last thing released.
pub struct LoadedPlugin {
    plugin: NativePlugin,
    /// Kept open for as long as the plugin's code may run
    #[allow(dead_code)]
    library: Box<dyn PluginLibrary>,
    path: PathBuf,
}

impl LoadedPlugin {
    pub fn plugin(&self) -> &NativePlugin {
        &self.plugin
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LoadedPlugin {
    fn drop(&mut self) {
        self.plugin.unload();
        debug!("Released plugin {}", self.path.display());
    }
}

/// Plugin loader - finds candidate libraries and turns them into plugins
pub struct PluginLoader;

impl PluginLoader {
    /// True for file names ending in the platform library suffix.
    /// A file named only the suffix is not a plugin.
    pub fn is_candidate(path: &Path) -> bool {
        let suffix = std::env::consts::DLL_SUFFIX.as_bytes();
        path.file_name()
            .map(|name| {
                let name = name.as_encoded_bytes();
                name.len() > suffix.len() && name.ends_with(suffix)
            })
            .unwrap_or(false)
    }

    /// Recursively collect candidate libraries under `root`, sorted by path.
    ///
    /// Only an unreadable `root` is an error. Symbolic links are reported and
    /// never followed; unreadable subdirectories are reported and skipped.
    pub fn discover(root: &Path) -> Result<BTreeSet<PathBuf>, AuraError> {
        let entries = fs::read_dir(root).map_err(|source| AuraError::BadPluginDir {
            path: root.to_path_buf(),
            source,
        })?;

        let mut candidates = BTreeSet::new();
        Self::walk(entries, &mut candidates);
        debug!("Found {} plugin candidates under {}", candidates.len(), root.display());
        Ok(candidates)
    }

    fn walk(entries: ReadDir, candidates: &mut BTreeSet<PathBuf>) {
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            // DirEntry::file_type does not follow symbolic links
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!("Failed to stat {}: {}", path.display(), e);
                    continue;
                }
            };

            if file_type.is_symlink() {
                warn!("Skipping symbolic link {}", path.display());
            } else if file_type.is_dir() {
                match fs::read_dir(&path) {
                    Ok(nested) => Self::walk(nested, candidates),
                    Err(e) => warn!("Skipping unreadable directory {}: {}", path.display(), e),
                }
            } else if file_type.is_file() && Self::is_candidate(&path) {
                debug!("Found plugin candidate {}", path.display());
                candidates.insert(path);
            }
        }
    }

    /// Load one candidate
    ///
    /// This performs the following steps:
    /// 1. Open the shared library
    /// 2. Look up `aura_plugin_load`
    /// 3. Call it to get the vtable
    /// 4. Require and call `get_description`
    ///
    /// Any failure drops, and so closes, the library before returning.
    pub fn load_plugin(path: &Path, loader: &dyn LibraryLoader) -> Result<LoadedPlugin, PluginError> {
        info!("Loading plugin from: {}", path.display());

        let library = loader.open(path)?;
        let entry = library.entry_point()?;

        // SAFETY: PluginLibrary implementors only hand out ABI entry points,
        // and `library` is still open
        let vtable = unsafe { entry() };
        // SAFETY: the vtable stays valid while `library` is open, and
        // LoadedPlugin keeps the library until after the plugin is gone
        let plugin = unsafe { NativePlugin::from_vtable(vtable)? };

        let description = plugin.description();
        info!(
            "Loaded plugin: {} v{} by {} ({}, {} object types)",
            description.name,
            description.version,
            description.author,
            description.kind,
            description.object_types.len()
        );

        Ok(LoadedPlugin {
            plugin,
            library,
            path: path.to_path_buf(),
        })
    }
}
