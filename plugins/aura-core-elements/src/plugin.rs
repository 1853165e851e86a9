/*
 *  plugin.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core elements plugin: vtable and exported entry point
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

use std::ffi::{CStr, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use aura_live::plugin::ffi::{
    property_from_raw,
    AuraObjectInstance,
    AuraPluginDesc,
    AuraPluginVTable,
    AuraProperty,
    StaticStr,
};
use aura_live::plugin::PluginKind;

use crate::colour::{self, ColourObject};

/// Debug output, compiled in only with the `debug-logging` feature
macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "debug-logging")]
        log::debug!($($arg)*);
    };
}

/// Macro to catch panics in FFI functions
///
/// A panic must never unwind into the host; the call answers `$fallback`
/// instead.
macro_rules! catch_panic {
    ($fallback:expr, $code:block) => {
        match catch_unwind(AssertUnwindSafe(|| $code)) {
            Ok(result) => result,
            Err(_panic_info) => {
                trace!("Plugin panic: {:?}", _panic_info.downcast_ref::<&str>());
                $fallback
            }
        }
    };
}

/// Objects handed to the host and not yet destroyed
static LIVE_OBJECTS: AtomicUsize = AtomicUsize::new(0);

static OBJECT_TYPES: [StaticStr; 5] = [
    StaticStr(c"colour".as_ptr()),
    StaticStr(c"gradient".as_ptr()),
    StaticStr(c"text".as_ptr()),
    StaticStr(c"image".as_ptr()),
    StaticStr::NULL,
];

static DESCRIPTION: AuraPluginDesc = AuraPluginDesc {
    name: c"Aura Core Elements".as_ptr(),
    author: c"Clayton Peters".as_ptr(),
    description: c"Provide core visual elements to aura, such as blocks of colour, gradient, text and images".as_ptr(),
    version: c"0.1.0".as_ptr(),
    plugin_type: PluginKind::Element as i32,
    object_types: StaticStr::list(&OBJECT_TYPES),
};

// ============================================================================
// FFI Vtable Implementations
// ============================================================================

unsafe extern "C" fn get_description() -> *const AuraPluginDesc {
    &DESCRIPTION
}

unsafe extern "C" fn unload() {
    let _live = LIVE_OBJECTS.load(Ordering::SeqCst);
    trace!("Unloading core elements, {} objects still live", _live);
}

/// Create an object; NULL for types this plugin cannot build yet
unsafe extern "C" fn create(object_type: *const c_char) -> *mut AuraObjectInstance {
    catch_panic!(ptr::null_mut(), {
        if object_type.is_null() {
            return ptr::null_mut();
        }

        let name = unsafe { CStr::from_ptr(object_type) };
        if name != colour::OBJECT_TYPE {
            // gradient, text and image are advertised but not built yet
            trace!("Cannot create {:?}", name);
            return ptr::null_mut();
        }

        match ColourObject::new() {
            Ok(object) => {
                LIVE_OBJECTS.fetch_add(1, Ordering::SeqCst);
                object.into_raw()
            }
            Err(_e) => {
                trace!("Failed to build colour object: {}", _e);
                ptr::null_mut()
            }
        }
    })
}

/// Destroy an object made by `create`
unsafe extern "C" fn destroy(object: *mut AuraObjectInstance) {
    if !object.is_null() {
        // SAFETY: every non-null object the host holds came from create
        drop(unsafe { ColourObject::from_raw(object) });
        LIVE_OBJECTS.fetch_sub(1, Ordering::SeqCst);
    }
}

unsafe extern "C" fn property_changed(property: *const AuraProperty) -> bool {
    catch_panic!(false, {
        match unsafe { property_from_raw(property) } {
            Ok(property) => {
                let accepted = colour::accepts(&property);
                trace!("Property '{}' changed, accepted={}", property.name, accepted);
                accepted
            }
            Err(_e) => {
                trace!("Unreadable property: {}", _e);
                false
            }
        }
    })
}

// ============================================================================
// Plugin Registration
// ============================================================================

/// Static vtable
static VTABLE: AuraPluginVTable = AuraPluginVTable {
    get_description: Some(get_description),
    unload: Some(unload),
    create: Some(create),
    destroy: Some(destroy),
    property_changed: Some(property_changed),
};

/// Plugin entry point - returns the vtable
#[unsafe(no_mangle)]
pub extern "C" fn aura_plugin_load() -> *const AuraPluginVTable {
    &VTABLE
}
