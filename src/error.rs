/*
 *  error.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types for the host, plugin loader and property model
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

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Application level errors. These are the only errors that reach `main`.
#[derive(Debug, Error)]
pub enum AuraError {
    /// A second `AuraLive` was requested while one is alive
    #[error("attempted to create a second AuraLive instance")]
    InstanceExists,

    /// The plugin root directory could not be listed
    #[error("failed to list contents of plugins directory {}: {source}", path.display())]
    BadPluginDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or validated
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AuraError {
    /// Process exit code for this error
    pub fn code(&self) -> i32 {
        match self {
            AuraError::InstanceExists => 2,
            AuraError::BadPluginDir { .. } => 3,
            AuraError::Config(_) => 7,
        }
    }
}

/// Reasons a single plugin candidate was rejected.
///
/// These never cross the registry boundary: the loader logs them and moves
/// on to the next candidate.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to open library: {0}")]
    LoadFailed(String),

    #[error("failed to find entry point aura_plugin_load: {0}")]
    MissingEntryPoint(String),

    #[error("NULL returned from aura_plugin_load")]
    NullPlugin,

    #[error("no get_description function specified")]
    MissingDescribe,

    #[error("NULL returned from get_description")]
    NullDescription,

    #[error("invalid plugin description: {0}")]
    InvalidDescription(String),
}

/// Errors raised by the property model and its ABI conversions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("unknown property type tag {0}")]
    UnknownType(i32),

    #[error("minimum {minimum} is above maximum {maximum}")]
    InvalidRange { minimum: String, maximum: String },

    #[error("value {value} is outside {minimum}..={maximum}")]
    OutOfRange {
        value: String,
        minimum: String,
        maximum: String,
    },

    #[error("property '{name}' is {actual:?}, not {expected:?}")]
    TypeMismatch {
        name: String,
        expected: crate::property::PropertyType,
        actual: crate::property::PropertyType,
    },

    #[error("null pointer where a property was expected")]
    NullPointer,

    #[error("property string is not valid UTF-8 or contains NUL: {0}")]
    InvalidString(String),
}
