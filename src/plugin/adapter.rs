/*
 *  plugin/adapter.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Adapter from a plugin vtable to the Plugin trait
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

use std::ffi::CString;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use log::{debug, warn};

use crate::error::PluginError;
use crate::object::{ObjectHandle, ObjectInstance};
use crate::property::{Property, PropertyCollection};
use super::ffi::{
    self,
    AuraObjectInstance,
    AuraPluginVTable,
    RawProperty,
};
use super::types::{PluginDescription, PluginKind};

/// Capabilities of a loaded plugin
///
/// Every capability past `description` is optional at the ABI level; an
/// implementation answers with the documented default when the plugin does
/// not provide it.
pub trait Plugin: Send {
    fn description(&self) -> &PluginDescription;

    /// Instantiate an object of the given type.
    ///
    /// `None` when the kind is not this plugin's kind, when the plugin has no
    /// create capability, or when the plugin declines the type.
    fn create_object(&self, kind: PluginKind, object_type: &str) -> Option<ObjectInstance<'_>>;

    /// Hand an object back to the plugin that allocated it
    fn release_object(&self, handle: ObjectHandle);

    /// Tell the plugin a property changed. Defaults to accepted.
    fn property_changed(&self, property: &Property) -> bool;
}

/// A plugin reached through its C vtable
pub struct NativePlugin {
    vtable: AuraPluginVTable,
    description: PluginDescription,
    unloaded: AtomicBool,
}

impl NativePlugin {
    /// Validate a vtable returned by `aura_plugin_load` and read the
    /// plugin's description.
    ///
    /// # Safety
    ///
    /// `vtable` must be NULL or point at a vtable whose functions stay
    /// callable for as long as the returned plugin is used; in practice the
    /// owning library must outlive it.
    pub unsafe fn from_vtable(vtable: *const AuraPluginVTable) -> Result<Self, PluginError> {
        if vtable.is_null() {
            return Err(PluginError::NullPlugin);
        }

        // SAFETY: non-null, caller guarantees validity
        let vtable = unsafe { *vtable };
        let describe = vtable.get_description.ok_or(PluginError::MissingDescribe)?;

        // SAFETY: the plugin owns the returned record for its lifetime
        let description = unsafe { ffi::description_from_raw(describe())? };

        debug!(
            "Plugin '{}' v{} capabilities: create={} destroy={} property_changed={} unload={}",
            description.name,
            description.version,
            vtable.create.is_some(),
            vtable.destroy.is_some(),
            vtable.property_changed.is_some(),
            vtable.unload.is_some(),
        );

        Ok(Self {
            vtable,
            description,
            unloaded: AtomicBool::new(false),
        })
    }

    /// Copy an instance record the plugin handed out
    ///
    /// Properties the host cannot represent are logged and left out.
    unsafe fn read_instance(&self, object: &AuraObjectInstance, requested: &str) -> (String, PropertyCollection) {
        if object.plugin_type != self.description.kind.tag() {
            warn!(
                "Plugin '{}' returned {} object tagged {}, expected {}",
                self.description.name,
                requested,
                object.plugin_type,
                self.description.kind.tag()
            );
        }

        // SAFETY: the record and its strings belong to the plugin and are
        // alive until destroy is called
        let object_type = unsafe { ffi::string_from_ptr(object.object_type) };
        let object_type = if object_type.is_empty() { requested.to_string() } else { object_type };

        let mut properties = PropertyCollection::new();
        for raw in unsafe { ffi::read_list(object.properties) } {
            match unsafe { ffi::property_from_raw(raw) } {
                Ok(property) => {
                    properties.add(property);
                }
                Err(e) => warn!(
                    "Skipping property of {} from plugin '{}': {}",
                    object_type, self.description.name, e
                ),
            }
        }

        (object_type, properties)
    }

    /// Run the plugin's unload hook. Only the first call has any effect.
    ///
    /// Reached only from [`LoadedPlugin`](super::loader::LoadedPlugin) teardown.
    pub(crate) fn unload(&self) {
        if self.unloaded.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(unload) = self.vtable.unload {
            debug!("Unloading plugin '{}'", self.description.name);
            // SAFETY: valid plugin function, called once
            unsafe { unload() };
        }
    }
}

impl Plugin for NativePlugin {
    fn description(&self) -> &PluginDescription {
        &self.description
    }

    fn create_object(&self, kind: PluginKind, object_type: &str) -> Option<ObjectInstance<'_>> {
        if kind != self.description.kind {
            debug!(
                "Plugin '{}' provides {} objects, not {}",
                self.description.name, self.description.kind, kind
            );
            return None;
        }

        let create = self.vtable.create?;
        let name = match CString::new(object_type) {
            Ok(name) => name,
            Err(e) => {
                warn!("Object type {:?} cannot cross the plugin boundary: {}", object_type, e);
                return None;
            }
        };

        // SAFETY: create is a valid plugin function and name outlives the call
        let raw = unsafe { create(name.as_ptr()) };
        let Some(raw) = NonNull::new(raw) else {
            debug!("Plugin '{}' declined to create {}", self.description.name, object_type);
            return None;
        };

        // SAFETY: the plugin returned a live instance record
        let (object_type, properties) = unsafe { self.read_instance(raw.as_ref(), object_type) };
        debug!(
            "Plugin '{}' created {} with {} properties",
            self.description.name,
            object_type,
            properties.len()
        );

        // SAFETY: raw was allocated by this plugin's create and only this
        // plugin's destroy will see it
        Some(unsafe {
            ObjectInstance::new(self, kind, object_type, properties, ObjectHandle::new(raw))
        })
    }

    fn release_object(&self, handle: ObjectHandle) {
        match self.vtable.destroy {
            // SAFETY: the handle came from this plugin's create and is
            // consumed here, so it is destroyed at most once
            Some(destroy) => unsafe { destroy(handle.as_ptr()) },
            None => warn!(
                "Plugin '{}' has no destroy function; object left allocated",
                self.description.name
            ),
        }
    }

    fn property_changed(&self, property: &Property) -> bool {
        let Some(notify) = self.vtable.property_changed else {
            return true;
        };

        match RawProperty::new(property) {
            // SAFETY: raw stays alive across the call
            Ok(raw) => unsafe { notify(raw.as_ptr()) },
            Err(e) => {
                warn!("Property '{}' cannot cross the plugin boundary: {}", property.name, e);
                false
            }
        }
    }
}
