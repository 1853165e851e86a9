/*
 *  lib.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Host library: plugin discovery, property model, application context
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

//! Aura Live host library
//!
//! Plugins are shared libraries exporting `aura_plugin_load`; the
//! [`plugin::PluginRegistry`] finds and loads them, and maps each
//! `(kind, object type)` to the plugin that can instantiate it. Objects carry
//! their configuration as a [`property::PropertyCollection`].

pub mod app;
pub mod config;
pub mod error;
pub mod object;
pub mod plugin;
pub mod property;

pub use app::{AuraLive, DisplaySettings};
pub use config::{Config, ConfigError};
pub use error::{AuraError, PluginError, PropertyError};
pub use object::{ObjectHandle, ObjectInstance};
pub use plugin::{Plugin, PluginDescription, PluginKind, PluginRegistry};
pub use property::{Property, PropertyCollection, PropertyType, PropertyValue};
