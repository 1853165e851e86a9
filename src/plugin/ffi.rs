/*
 *  plugin/ffi.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  C ABI types for the plugin interface
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

//! FFI types for the Aura plugin system
//!
//! This module defines the C-compatible records that form the stable ABI
//! between the host and plugins. All records use `#[repr(C)]`. Lists are
//! arrays of pointers terminated by a NULL entry; they are copied into
//! `Vec`s as soon as the host reads them.
//!
//! A plugin exports one symbol:
//!
//! ```c
//! const aura_plugin_vtable_t* aura_plugin_load(void);
//! ```

use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;

use crate::error::{PluginError, PropertyError};
use crate::plugin::types::{PluginDescription, PluginKind};
use crate::property::{
    BooleanValue, Bounded, Colour, FilenameValue, Property, PropertyType, PropertyValue, TextValue,
};

/// Name of the exported plugin entry point
pub const AURA_PLUGIN_ENTRY: &str = "aura_plugin_load";

/// NUL terminated form of [`AURA_PLUGIN_ENTRY`] for symbol lookup
pub const AURA_PLUGIN_ENTRY_SYMBOL: &[u8] = b"aura_plugin_load\0";

/// Plugin entry point; returns NULL on failure
pub type PluginEntryFn = unsafe extern "C" fn() -> *const AuraPluginVTable;

pub type GetDescriptionFn = unsafe extern "C" fn() -> *const AuraPluginDesc;
pub type UnloadFn = unsafe extern "C" fn();
pub type CreateObjectFn = unsafe extern "C" fn(object_type: *const c_char) -> *mut AuraObjectInstance;
pub type DestroyObjectFn = unsafe extern "C" fn(object: *mut AuraObjectInstance);
pub type PropertyChangedFn = unsafe extern "C" fn(property: *const AuraProperty) -> bool;

/// Plugin description record
#[repr(C)]
pub struct AuraPluginDesc {
    /// Plugin name (e.g. "Aura Core Elements"), must not be NULL
    pub name: *const c_char,
    pub author: *const c_char,
    pub description: *const c_char,
    pub version: *const c_char,
    /// `PluginKind` tag
    pub plugin_type: c_int,
    /// NULL terminated list of object type names, or NULL for none
    pub object_types: *const *const c_char,
}

// SAFETY: a description points at data the plugin keeps for its whole
// lifetime and never mutates after handing it out.
unsafe impl Send for AuraPluginDesc {}
unsafe impl Sync for AuraPluginDesc {}

/// Plugin capability table. Every slot may be NULL; only
/// `get_description` is required for the host to accept the plugin.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct AuraPluginVTable {
    pub get_description: Option<GetDescriptionFn>,
    pub unload: Option<UnloadFn>,
    pub create: Option<CreateObjectFn>,
    pub destroy: Option<DestroyObjectFn>,
    pub property_changed: Option<PropertyChangedFn>,
}

/// Common header of every property record
#[repr(C)]
pub struct AuraProperty {
    pub name: *const c_char,
    pub description: *const c_char,
    /// `PropertyType` tag, selects the concrete record below
    pub var_type: c_int,
    pub disabled: bool,
}

#[repr(C)]
pub struct AuraPropertyInt {
    pub base: AuraProperty,
    pub minimum: i64,
    pub maximum: i64,
    pub value: i64,
}

#[repr(C)]
pub struct AuraPropertyFloat {
    pub base: AuraProperty,
    pub minimum: f64,
    pub maximum: f64,
    pub value: f64,
}

#[repr(C)]
pub struct AuraPropertyBool {
    pub base: AuraProperty,
    pub value: bool,
}

#[repr(C)]
pub struct AuraPropertyString {
    pub base: AuraProperty,
    pub password: bool,
    /// UTF-8
    pub value: *const c_char,
}

#[repr(C)]
pub struct AuraPropertyFile {
    pub base: AuraProperty,
    pub value: *const c_char,
}

#[repr(C)]
pub struct AuraPropertyColor {
    pub base: AuraProperty,
    pub has_alpha: bool,
    pub value_r: f32,
    pub value_g: f32,
    pub value_b: f32,
    pub value_a: f32,
}

/// An object instantiated by a plugin
#[repr(C)]
pub struct AuraObjectInstance {
    pub plugin_type: c_int,
    pub object_type: *const c_char,
    /// NULL terminated list of properties, or NULL for none
    pub properties: *const *const AuraProperty,
}

/// A C string pointer that can sit in a `static` list
///
/// Plugins describe themselves with static, NULL terminated tables; a raw
/// pointer is not `Sync` on its own. Layout is that of `*const c_char`.
#[repr(transparent)]
#[derive(Clone, Copy)]
pub struct StaticStr(pub *const c_char);

// SAFETY: only ever wraps pointers to immutable, 'static string data
unsafe impl Sync for StaticStr {}
unsafe impl Send for StaticStr {}

impl StaticStr {
    pub const NULL: StaticStr = StaticStr(ptr::null());

    /// View a static table as the list pointer the ABI expects
    pub const fn list(table: &'static [StaticStr]) -> *const *const c_char {
        table.as_ptr() as *const *const c_char
    }
}

/// Copy a C string, NULL gives an empty string
///
/// # Safety
///
/// `ptr` must be NULL or point at a NUL terminated string.
pub unsafe fn string_from_ptr(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        // SAFETY: caller guarantees a valid NUL terminated string
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}

/// Collect the entries of a NULL terminated pointer array
///
/// # Safety
///
/// `list` must be NULL or point at an array whose last entry is NULL.
pub unsafe fn read_list<T>(list: *const *const T) -> Vec<*const T> {
    let mut entries = Vec::new();
    if list.is_null() {
        return entries;
    }

    let mut cursor = list;
    loop {
        // SAFETY: the sentinel has not been reached yet so cursor is in bounds
        let entry = unsafe { *cursor };
        if entry.is_null() {
            break;
        }
        entries.push(entry);
        cursor = unsafe { cursor.add(1) };
    }
    entries
}

/// Copy a NULL terminated list of C strings
///
/// # Safety
///
/// See [`read_list`]; every entry must be a NUL terminated string.
pub unsafe fn read_string_list(list: *const *const c_char) -> Vec<String> {
    // SAFETY: forwarded caller guarantees
    unsafe { read_list(list) }
        .into_iter()
        .map(|entry| unsafe { string_from_ptr(entry) })
        .collect()
}

/// Convert a plugin's description record
///
/// # Safety
///
/// `desc` must be NULL or point at a valid `AuraPluginDesc` whose strings
/// and lists are valid.
pub unsafe fn description_from_raw(
    desc: *const AuraPluginDesc,
) -> Result<PluginDescription, PluginError> {
    if desc.is_null() {
        return Err(PluginError::NullDescription);
    }

    // SAFETY: non-null, caller guarantees validity
    let desc = unsafe { &*desc };
    if desc.name.is_null() {
        return Err(PluginError::InvalidDescription("name is NULL".into()));
    }

    let kind = PluginKind::from_tag(desc.plugin_type).ok_or_else(|| {
        PluginError::InvalidDescription(format!("unknown plugin type {}", desc.plugin_type))
    })?;

    // SAFETY: caller guarantees the strings and list are valid
    unsafe {
        Ok(PluginDescription {
            name: string_from_ptr(desc.name),
            author: string_from_ptr(desc.author),
            description: string_from_ptr(desc.description),
            version: string_from_ptr(desc.version),
            kind,
            object_types: read_string_list(desc.object_types),
        })
    }
}

/// Convert a property record, dispatching on its type tag
///
/// The tag is checked before the record is reinterpreted as its concrete
/// type, so an unknown tag is rejected without touching any payload.
///
/// # Safety
///
/// `ptr` must be NULL or point at the property record matching the header's
/// `var_type`.
pub unsafe fn property_from_raw(ptr: *const AuraProperty) -> Result<Property, PropertyError> {
    if ptr.is_null() {
        return Err(PropertyError::NullPointer);
    }

    // SAFETY: non-null, caller guarantees a valid header
    let header = unsafe { &*ptr };
    let property_type = PropertyType::try_from(header.var_type)?;

    // SAFETY: the tag selects the record layout the plugin allocated
    let value = unsafe {
        match property_type {
            PropertyType::Integer => {
                let rec = &*(ptr as *const AuraPropertyInt);
                PropertyValue::Integer(Bounded::new(rec.minimum, rec.maximum, rec.value)?)
            }
            PropertyType::Float => {
                let rec = &*(ptr as *const AuraPropertyFloat);
                PropertyValue::Float(Bounded::new(rec.minimum, rec.maximum, rec.value)?)
            }
            PropertyType::Boolean => {
                let rec = &*(ptr as *const AuraPropertyBool);
                PropertyValue::Boolean(BooleanValue { value: rec.value })
            }
            PropertyType::Text => {
                let rec = &*(ptr as *const AuraPropertyString);
                PropertyValue::Text(TextValue {
                    value: string_from_ptr(rec.value),
                    password: rec.password,
                })
            }
            PropertyType::Filename => {
                let rec = &*(ptr as *const AuraPropertyFile);
                PropertyValue::Filename(FilenameValue { value: string_from_ptr(rec.value) })
            }
            PropertyType::Colour => {
                let rec = &*(ptr as *const AuraPropertyColor);
                let colour = if rec.has_alpha {
                    Colour::rgba(rec.value_r, rec.value_g, rec.value_b, rec.value_a)?
                } else {
                    Colour::rgb(rec.value_r, rec.value_g, rec.value_b)?
                };
                PropertyValue::Colour(colour)
            }
        }
    };

    // SAFETY: caller guarantees valid header strings
    let (name, description) = unsafe { (string_from_ptr(header.name), string_from_ptr(header.description)) };

    Ok(Property {
        name,
        description,
        disabled: header.disabled,
        value,
    })
}

enum RawRecord {
    Int(Box<AuraPropertyInt>),
    Float(Box<AuraPropertyFloat>),
    Bool(Box<AuraPropertyBool>),
    Text(Box<AuraPropertyString>),
    File(Box<AuraPropertyFile>),
    Colour(Box<AuraPropertyColor>),
}

/// A [`Property`] laid out as its C record
///
/// Owns the record and every string it points at, so the pointer returned
/// by [`RawProperty::as_ptr`] stays valid for as long as this value lives.
pub struct RawProperty {
    record: RawRecord,
    _strings: Vec<CString>,
}

fn c_string(value: &str) -> Result<CString, PropertyError> {
    CString::new(value).map_err(|e| PropertyError::InvalidString(e.to_string()))
}

impl RawProperty {
    pub fn new(property: &Property) -> Result<Self, PropertyError> {
        let name = c_string(&property.name)?;
        let description = c_string(&property.description)?;
        let base = AuraProperty {
            name: name.as_ptr(),
            description: description.as_ptr(),
            var_type: property.property_type() as c_int,
            disabled: property.disabled,
        };
        let mut strings = vec![name, description];

        let record = match &property.value {
            PropertyValue::Integer(v) => RawRecord::Int(Box::new(AuraPropertyInt {
                base,
                minimum: v.minimum(),
                maximum: v.maximum(),
                value: v.value(),
            })),
            PropertyValue::Float(v) => RawRecord::Float(Box::new(AuraPropertyFloat {
                base,
                minimum: v.minimum(),
                maximum: v.maximum(),
                value: v.value(),
            })),
            PropertyValue::Boolean(v) => {
                RawRecord::Bool(Box::new(AuraPropertyBool { base, value: v.value }))
            }
            PropertyValue::Text(v) => {
                let value = c_string(&v.value)?;
                let record = AuraPropertyString {
                    base,
                    password: v.password,
                    value: value.as_ptr(),
                };
                strings.push(value);
                RawRecord::Text(Box::new(record))
            }
            PropertyValue::Filename(v) => {
                let value = c_string(&v.value)?;
                let record = AuraPropertyFile { base, value: value.as_ptr() };
                strings.push(value);
                RawRecord::File(Box::new(record))
            }
            PropertyValue::Colour(c) => RawRecord::Colour(Box::new(AuraPropertyColor {
                base,
                has_alpha: c.has_alpha(),
                value_r: c.r(),
                value_g: c.g(),
                value_b: c.b(),
                value_a: c.alpha().unwrap_or(1.0),
            })),
        };

        Ok(Self { record, _strings: strings })
    }

    /// Pointer to the record header, valid while `self` is alive
    pub fn as_ptr(&self) -> *const AuraProperty {
        // The header is the first field of every repr(C) record
        match &self.record {
            RawRecord::Int(r) => &r.base,
            RawRecord::Float(r) => &r.base,
            RawRecord::Bool(r) => &r.base,
            RawRecord::Text(r) => &r.base,
            RawRecord::File(r) => &r.base,
            RawRecord::Colour(r) => &r.base,
        }
    }
}

/// An owned, NULL terminated property list for an `AuraObjectInstance`
pub struct RawPropertyList {
    _properties: Vec<RawProperty>,
    pointers: Vec<*const AuraProperty>,
}

impl RawPropertyList {
    pub fn new<'a>(properties: impl IntoIterator<Item = &'a Property>) -> Result<Self, PropertyError> {
        let properties = properties
            .into_iter()
            .map(RawProperty::new)
            .collect::<Result<Vec<_>, _>>()?;
        let mut pointers: Vec<*const AuraProperty> = properties.iter().map(RawProperty::as_ptr).collect();
        pointers.push(ptr::null());
        Ok(Self { _properties: properties, pointers })
    }

    pub fn as_ptr(&self) -> *const *const AuraProperty {
        self.pointers.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.pointers.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
