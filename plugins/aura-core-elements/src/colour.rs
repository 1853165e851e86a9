/*
 *  colour.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Solid colour element
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

use aura_live::plugin::ffi::{AuraObjectInstance, RawPropertyList};
use aura_live::plugin::PluginKind;
use aura_live::property::{Bounded, Colour, Property, PropertyType, PropertyValue};
use aura_live::PropertyError;

pub const OBJECT_TYPE: &std::ffi::CStr = c"colour";

/// A block of colour as handed to the host
///
/// `instance` must stay the first field: the host holds a pointer to it and
/// hands the same pointer back to `destroy`.
#[repr(C)]
pub struct ColourObject {
    instance: AuraObjectInstance,
    properties: RawPropertyList,
}

impl ColourObject {
    /// Properties a new colour block starts with
    pub fn default_properties() -> Result<Vec<Property>, PropertyError> {
        Ok(vec![
            Property::new("colour", PropertyValue::Colour(Colour::rgb(1.0, 1.0, 1.0)?))
                .with_description("Fill colour of the block"),
            Property::new("opacity", PropertyValue::Float(Bounded::new(0.0, 1.0, 1.0)?))
                .with_description("Opacity of the block"),
        ])
    }

    pub fn new() -> Result<Box<Self>, PropertyError> {
        let properties = RawPropertyList::new(&Self::default_properties()?)?;
        Ok(Box::new(Self {
            instance: AuraObjectInstance {
                plugin_type: PluginKind::Element.tag(),
                object_type: OBJECT_TYPE.as_ptr(),
                properties: properties.as_ptr(),
            },
            properties,
        }))
    }

    /// Hand ownership to the host
    pub fn into_raw(self: Box<Self>) -> *mut AuraObjectInstance {
        Box::into_raw(self) as *mut AuraObjectInstance
    }

    /// Take ownership back from the host
    ///
    /// # Safety
    ///
    /// `raw` must come from [`ColourObject::into_raw`] and not have been
    /// reclaimed before.
    pub unsafe fn from_raw(raw: *mut AuraObjectInstance) -> Box<Self> {
        unsafe { Box::from_raw(raw as *mut ColourObject) }
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }
}

/// Whether a changed property is one a colour block understands
pub fn accepts(property: &Property) -> bool {
    match property.name.as_str() {
        "colour" => property.property_type() == PropertyType::Colour,
        "opacity" => property.property_type() == PropertyType::Float,
        _ => false,
    }
}
