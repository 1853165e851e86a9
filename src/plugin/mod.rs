/*
 *  plugin/mod.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Dynamic plugin system
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

//! Dynamic plugin system for Aura Live
//!
//! Elements, sources, transitions and layouts are provided by plugins
//! (.so/.dylib/.dll files) found under a single root directory at startup.
//!
//! ## Architecture
//!
//! 1. **FFI Layer** (`ffi.rs`) - C ABI types for the stable plugin interface
//! 2. **Library** (`library.rs`) - opens shared libraries, finds the entry point
//! 3. **Loader** (`loader.rs`) - discovers candidates and validates plugins
//! 4. **Adapter** (`adapter.rs`) - wraps a C vtable as a [`Plugin`] trait object
//! 5. **Registry** (`registry.rs`) - indexes object classes to plugins
//!
//! ## Plugin Discovery
//!
//! The root directory is walked recursively. Regular files whose names end in
//! the platform library suffix are candidates and are loaded in path order.
//! Symbolic links are logged and never followed. A candidate that cannot be
//! loaded is logged and skipped; only an unreadable root directory fails.
//!
//! ## Entry Point
//!
//! Each plugin exports `aura_plugin_load`, returning its vtable (see
//! [`ffi::AuraPluginVTable`]). Only `get_description` is mandatory.

pub mod ffi;
pub mod library;
pub mod loader;
pub mod adapter;
pub mod registry;
mod types;

// Re-exports for convenience
pub use ffi::{
    AuraObjectInstance,
    AuraPluginDesc,
    AuraPluginVTable,
    AuraProperty,
    PluginEntryFn,
    RawProperty,
    StaticStr,
};

pub use adapter::{NativePlugin, Plugin};
pub use library::{LibraryLoader, NativeLibraryLoader, PluginLibrary};
pub use loader::{LoadedPlugin, PluginLoader};
pub use registry::PluginRegistry;
pub use types::{ObjectClass, PluginDescription, PluginKind};
