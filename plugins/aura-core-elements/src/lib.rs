/*
 *  Aura Core Elements Plugin
 *
 *  A dynamic plugin for Aura Live that provides the core visual
 *  elements: blocks of colour, gradients, text and images.
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 */

//! # Aura Core Elements
//!
//! Element plugin for Aura Live.
//!
//! ## Object Types
//!
//! - `colour` - a solid block of colour, with a `colour` property
//! - `gradient`, `text`, `image` - advertised, not yet instantiable
//!
//! ## Usage
//!
//! Build the crate and copy the resulting library into the host's plugin
//! directory (`./plugins` unless configured otherwise):
//!
//! ```yaml
//! plugins_path: /usr/local/lib/aura/plugins
//! ```

mod colour;
mod plugin;

// Re-export the plugin entry point
pub use plugin::aura_plugin_load;
