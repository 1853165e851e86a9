/*
 *  app.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Application context: one per process
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

use std::sync::atomic::{AtomicBool, Ordering};
use log::{debug, info};

use crate::config::Config;
use crate::error::AuraError;
use crate::plugin::{LibraryLoader, NativeLibraryLoader, PluginKind, PluginRegistry};

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

static LIVE: AtomicBool = AtomicBool::new(false);

/// Proof that this is the only live `AuraLive` in the process
#[derive(Debug)]
struct InstanceToken;

impl InstanceToken {
    fn claim() -> Result<Self, AuraError> {
        LIVE.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| InstanceToken)
            .map_err(|_| AuraError::InstanceExists)
    }
}

impl Drop for InstanceToken {
    fn drop(&mut self) {
        LIVE.store(false, Ordering::SeqCst);
        debug!("AuraLive instance released");
    }
}

/// Output surface settings resolved from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    pub windowed: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            windowed: false,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl From<&Config> for DisplaySettings {
    fn from(cfg: &Config) -> Self {
        let defaults = DisplaySettings::default();
        match cfg.display.as_ref() {
            Some(d) => Self {
                windowed: d.windowed.unwrap_or(defaults.windowed),
                width: d.width.unwrap_or(defaults.width),
                height: d.height.unwrap_or(defaults.height),
            },
            None => defaults,
        }
    }
}

/// The running application
///
/// Owns the plugin registry for the life of the process. Only one can exist
/// at a time; [`AuraLive::init`] fails while another is alive.
pub struct AuraLive {
    // declared before the token so plugins are unloaded before the slot frees
    plugins: PluginRegistry,
    display: DisplaySettings,
    _token: InstanceToken,
}

impl AuraLive {
    pub fn init(cfg: &Config) -> Result<Self, AuraError> {
        Self::init_with(cfg, &NativeLibraryLoader)
    }

    /// As [`AuraLive::init`], opening plugins through `loader`
    pub fn init_with(cfg: &Config, loader: &dyn LibraryLoader) -> Result<Self, AuraError> {
        let token = InstanceToken::claim()?;
        let display = DisplaySettings::from(cfg);
        debug!(
            "Display {}x{} {}",
            display.width,
            display.height,
            if display.windowed { "windowed" } else { "full screen" }
        );

        let plugins = PluginRegistry::open_with(cfg.plugins_path(), loader)?;

        Ok(Self {
            plugins,
            display,
            _token: token,
        })
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn display(&self) -> &DisplaySettings {
        &self.display
    }

    /// Object types available per kind, kinds with none left out
    pub fn inventory(&self) -> Vec<(PluginKind, &[String])> {
        PluginKind::ALL
            .into_iter()
            .map(|kind| (kind, self.plugins.object_types_for(kind)))
            .filter(|(_, types)| !types.is_empty())
            .collect()
    }

    /// Write the inventory to the log
    pub fn log_inventory(&self) {
        for description in self.plugins.descriptions() {
            info!(
                "Plugin '{}' v{} by {}: {}",
                description.name, description.version, description.author, description.description
            );
        }
        for (kind, types) in self.inventory() {
            info!("{} types: {}", kind, types.join(", "));
        }
    }
}
