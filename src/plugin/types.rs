/*
 *  plugin/types.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Rust side of the plugin contract: kinds, classes, descriptions
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

use std::fmt;
use serde::{Deserialize, Serialize};

/// Category of functionality a plugin offers
///
/// Discriminants are the ABI tags used in `AuraPluginDesc::plugin_type`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    /// Static items on the display (colour blocks, images, text)
    Element = 0,
    /// Data sources (e.g. Twitter)
    Source = 1,
    /// Item transitions (e.g. fade)
    Transition = 2,
    /// Item layouts (single item, scrolling list, ticker)
    Layout = 3,
}

impl PluginKind {
    pub const ALL: [PluginKind; 4] = [
        PluginKind::Element,
        PluginKind::Source,
        PluginKind::Transition,
        PluginKind::Layout,
    ];

    /// ABI tag for this kind
    pub fn tag(self) -> i32 {
        self as i32
    }

    /// Kind for an ABI tag, `None` for tags no plugin may use
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(PluginKind::Element),
            1 => Some(PluginKind::Source),
            2 => Some(PluginKind::Transition),
            3 => Some(PluginKind::Layout),
            _ => None,
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PluginKind::Element => "element",
            PluginKind::Source => "source",
            PluginKind::Transition => "transition",
            PluginKind::Layout => "layout",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for PluginKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "element" => Ok(PluginKind::Element),
            "source" => Ok(PluginKind::Source),
            "transition" => Ok(PluginKind::Transition),
            "layout" => Ok(PluginKind::Layout),
            other => Err(format!("unknown plugin kind '{}'", other)),
        }
    }
}

/// Lookup key from an object class to the plugin that provides it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectClass {
    pub kind: PluginKind,
    pub object_type: String,
}

impl ObjectClass {
    pub fn new(kind: PluginKind, object_type: impl Into<String>) -> Self {
        Self { kind, object_type: object_type.into() }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.object_type)
    }
}

/// Everything a plugin says about itself, copied out of the plugin's
/// description record when it is loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescription {
    pub name: String,
    pub author: String,
    pub description: String,
    pub version: String,
    pub kind: PluginKind,
    /// Object types the plugin can instantiate, in declaration order
    pub object_types: Vec<String>,
}
