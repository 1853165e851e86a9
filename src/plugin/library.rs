/*
 *  plugin/library.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Shared library backend used by the plugin registry
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

use std::path::{Path, PathBuf};
use log::debug;
use libloading::{Library, Symbol};

use crate::error::PluginError;
use super::ffi::{PluginEntryFn, AURA_PLUGIN_ENTRY_SYMBOL};

/// An open shared library. Dropping it closes the library.
///
/// # Safety
///
/// The loader calls whatever [`entry_point`](PluginLibrary::entry_point)
/// returns. Implementors must only return a function with the
/// `aura_plugin_load` signature and contract, callable for as long as the
/// library stays open.
pub unsafe trait PluginLibrary: Send {
    /// Look up the `aura_plugin_load` entry point.
    ///
    /// The returned function is only valid while this library is open.
    fn entry_point(&self) -> Result<PluginEntryFn, PluginError>;
}

/// Opens plugin candidates by path
pub trait LibraryLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn PluginLibrary>, PluginError>;
}

/// Loader backed by the platform dynamic linker
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLibraryLoader;

struct NativeLibrary {
    library: Library,
    path: PathBuf,
}

impl LibraryLoader for NativeLibraryLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn PluginLibrary>, PluginError> {
        // SAFETY: loading runs the library's initialisers; plugins are
        // trusted code placed in the plugin directory by the operator.
        let library = unsafe {
            Library::new(path).map_err(|e| PluginError::LoadFailed(e.to_string()))?
        };
        debug!("Opened library {}", path.display());

        Ok(Box::new(NativeLibrary {
            library,
            path: path.to_path_buf(),
        }))
    }
}

// SAFETY: the symbol is looked up by its ABI name in a library kept open
// for as long as the returned function may be called
unsafe impl PluginLibrary for NativeLibrary {
    fn entry_point(&self) -> Result<PluginEntryFn, PluginError> {
        // SAFETY: the symbol is declared by the plugin ABI with this signature
        let symbol: Symbol<PluginEntryFn> = unsafe {
            self.library
                .get(AURA_PLUGIN_ENTRY_SYMBOL)
                .map_err(|e| PluginError::MissingEntryPoint(e.to_string()))?
        };
        Ok(*symbol)
    }
}

impl Drop for NativeLibrary {
    fn drop(&mut self) {
        debug!("Closing library {}", self.path.display());
    }
}
