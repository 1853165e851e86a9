/*
 *  object.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Objects instantiated by plugins
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
use std::ptr::NonNull;
use log::debug;

use crate::error::PropertyError;
use crate::plugin::{AuraObjectInstance, ObjectClass, Plugin, PluginKind};
use crate::property::{Property, PropertyCollection};

/// Opaque reference to an instance record allocated by a plugin
///
/// Only the plugin that produced it knows how to free it. A handle cannot be
/// cloned, so the record it names is released at most once.
///
/// ```compile_fail,E0133
/// # use std::ptr::{self, NonNull};
/// # use aura_live::ObjectHandle;
/// # use aura_live::plugin::ffi::AuraObjectInstance;
/// let mut record = AuraObjectInstance {
///     plugin_type: 0,
///     object_type: ptr::null(),
///     properties: ptr::null(),
/// };
/// let handle = ObjectHandle::new(NonNull::from(&mut record));
/// ```
pub struct ObjectHandle(NonNull<AuraObjectInstance>);

impl ObjectHandle {
    /// # Safety
    ///
    /// `raw` must be a live record allocated by the plugin that will later
    /// receive this handle through [`Plugin::release_object`], and nothing
    /// else may free that record.
    pub unsafe fn new(raw: NonNull<AuraObjectInstance>) -> Self {
        Self(raw)
    }

    pub fn as_ptr(&self) -> *mut AuraObjectInstance {
        self.0.as_ptr()
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHandle({:p})", self.0)
    }
}

/// An object created by a plugin, owned by the caller
///
/// The instance borrows the plugin that made it, so it cannot outlive the
/// registry holding that plugin's code. It keeps its own copy of the
/// object's properties; the plugin learns about edits through
/// [`ObjectInstance::update_property`]. The plugin's record is released
/// exactly once, on [`ObjectInstance::release`] or drop.
pub struct ObjectInstance<'p> {
    plugin: &'p dyn Plugin,
    class: ObjectClass,
    properties: PropertyCollection,
    handle: Option<ObjectHandle>,
}

impl<'p> ObjectInstance<'p> {
    /// # Safety
    ///
    /// `handle` must have been produced by `plugin`, which is the only
    /// plugin it will be released to.
    pub unsafe fn new(
        plugin: &'p dyn Plugin,
        kind: PluginKind,
        object_type: impl Into<String>,
        properties: PropertyCollection,
        handle: ObjectHandle,
    ) -> Self {
        Self {
            plugin,
            class: ObjectClass::new(kind, object_type),
            properties,
            handle: Some(handle),
        }
    }

    pub fn kind(&self) -> PluginKind {
        self.class.kind
    }

    pub fn object_type(&self) -> &str {
        &self.class.object_type
    }

    pub fn class(&self) -> &ObjectClass {
        &self.class
    }

    /// The plugin that created this object
    pub fn plugin(&self) -> &'p dyn Plugin {
        self.plugin
    }

    pub fn properties(&self) -> &PropertyCollection {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Store a new property value and notify the owning plugin
    ///
    /// Returns the plugin's answer. A property replacing an existing entry
    /// must keep that entry's type; a mismatch is rejected before the
    /// plugin is told anything.
    pub fn update_property(&mut self, property: Property) -> Result<bool, PropertyError> {
        if let Some(existing) = self.properties.get(&property.name) {
            property.expect_type(existing.property_type())?;
        }

        let accepted = self.plugin.property_changed(&property);
        debug!(
            "{} property '{}' changed, plugin {}",
            self.class,
            property.name,
            if accepted { "accepted" } else { "rejected" }
        );
        self.properties.add(property);
        Ok(accepted)
    }

    /// Hand the object back to its plugin now rather than on drop
    pub fn release(mut self) {
        self.release_handle();
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Releasing {} via '{}'", self.class, self.plugin.description().name);
            self.plugin.release_object(handle);
        }
    }
}

impl Drop for ObjectInstance<'_> {
    fn drop(&mut self) {
        self.release_handle();
    }
}

impl fmt::Debug for ObjectInstance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectInstance")
            .field("class", &self.class)
            .field("plugin", &self.plugin.description().name)
            .field("properties", &self.properties.len())
            .finish()
    }
}
