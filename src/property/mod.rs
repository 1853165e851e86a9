/*
 *  property/mod.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Typed, bounded configuration values for plugin created objects
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

//! Property model
//!
//! A [`Property`] is a single named piece of object configuration. Its value
//! is a [`PropertyValue`] sum type, one variant per [`PropertyType`], so the
//! concrete shape is always known when reading or writing it.
//!
//! Properties are grouped per object in a [`PropertyCollection`].

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::error::PropertyError;

mod collection;

pub use collection::{PropertyCollection, PropertyMut};

/// The valid value types for object properties
///
/// Discriminants are the ABI tags used by plugins.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Integer = 0,
    Boolean = 1,
    Float = 2,
    Text = 3,
    Filename = 4,
    Colour = 5,
}

impl TryFrom<i32> for PropertyType {
    type Error = PropertyError;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(PropertyType::Integer),
            1 => Ok(PropertyType::Boolean),
            2 => Ok(PropertyType::Float),
            3 => Ok(PropertyType::Text),
            4 => Ok(PropertyType::Filename),
            5 => Ok(PropertyType::Colour),
            other => Err(PropertyError::UnknownType(other)),
        }
    }
}

/// A numeric value constrained to `minimum..=maximum`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    try_from = "BoundedRepr<T>",
    bound(deserialize = "T: Deserialize<'de> + Copy + PartialOrd + fmt::Display")
)]
pub struct Bounded<T> {
    minimum: T,
    maximum: T,
    value: T,
}

#[derive(Deserialize)]
struct BoundedRepr<T> {
    minimum: T,
    maximum: T,
    value: T,
}

impl<T> TryFrom<BoundedRepr<T>> for Bounded<T>
where
    T: Copy + PartialOrd + fmt::Display,
{
    type Error = PropertyError;

    fn try_from(repr: BoundedRepr<T>) -> Result<Self, Self::Error> {
        Bounded::new(repr.minimum, repr.maximum, repr.value)
    }
}

impl<T> Bounded<T>
where
    T: Copy + PartialOrd + fmt::Display,
{
    /// Build a bounded value, checking the invariant up front
    pub fn new(minimum: T, maximum: T, value: T) -> Result<Self, PropertyError> {
        let mut bounded = Self { minimum, maximum, value: minimum };
        bounded.set_range(minimum, maximum)?;
        bounded.set(value)?;
        Ok(bounded)
    }

    pub fn minimum(&self) -> T {
        self.minimum
    }

    pub fn maximum(&self) -> T {
        self.maximum
    }

    pub fn value(&self) -> T {
        self.value
    }

    /// Replace the bounds. The current value is clamped into the new range.
    pub fn set_range(&mut self, minimum: T, maximum: T) -> Result<(), PropertyError> {
        // written this way round so NaN bounds are rejected too
        if !matches!(minimum.partial_cmp(&maximum), Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)) {
            return Err(PropertyError::InvalidRange {
                minimum: minimum.to_string(),
                maximum: maximum.to_string(),
            });
        }

        self.minimum = minimum;
        self.maximum = maximum;
        if self.value < minimum {
            self.value = minimum;
        } else if self.value > maximum {
            self.value = maximum;
        }
        Ok(())
    }

    /// Set the value; it must lie within the current bounds
    pub fn set(&mut self, value: T) -> Result<(), PropertyError> {
        if value >= self.minimum && value <= self.maximum {
            self.value = value;
            Ok(())
        } else {
            Err(PropertyError::OutOfRange {
                value: value.to_string(),
                minimum: self.minimum.to_string(),
                maximum: self.maximum.to_string(),
            })
        }
    }
}

/// An RGB colour with optional alpha, components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColourRepr")]
pub struct Colour {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
    has_alpha: bool,
}

#[derive(Deserialize)]
struct ColourRepr {
    r: f32,
    g: f32,
    b: f32,
    #[serde(default = "opaque")]
    a: f32,
    #[serde(default)]
    has_alpha: bool,
}

fn opaque() -> f32 {
    1.0
}

impl TryFrom<ColourRepr> for Colour {
    type Error = PropertyError;

    fn try_from(repr: ColourRepr) -> Result<Self, Self::Error> {
        if repr.has_alpha {
            Colour::rgba(repr.r, repr.g, repr.b, repr.a)
        } else {
            Colour::rgb(repr.r, repr.g, repr.b)
        }
    }
}

fn unit_component(value: f32) -> Result<f32, PropertyError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(PropertyError::OutOfRange {
            value: value.to_string(),
            minimum: "0".into(),
            maximum: "1".into(),
        })
    }
}

impl Colour {
    pub fn rgb(r: f32, g: f32, b: f32) -> Result<Self, PropertyError> {
        Ok(Self {
            r: unit_component(r)?,
            g: unit_component(g)?,
            b: unit_component(b)?,
            a: 1.0,
            has_alpha: false,
        })
    }

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Result<Self, PropertyError> {
        let mut colour = Self::rgb(r, g, b)?;
        colour.a = unit_component(a)?;
        colour.has_alpha = true;
        Ok(colour)
    }

    pub fn r(&self) -> f32 {
        self.r
    }

    pub fn g(&self) -> f32 {
        self.g
    }

    pub fn b(&self) -> f32 {
        self.b
    }

    /// Alpha component, `None` when the colour does not carry one
    pub fn alpha(&self) -> Option<f32> {
        self.has_alpha.then_some(self.a)
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0, has_alpha: false }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BooleanValue {
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextValue {
    pub value: String,
    /// Mask the value in any UI
    #[serde(default)]
    pub password: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilenameValue {
    pub value: String,
}

/// The concrete value of a property, one variant per [`PropertyType`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyValue {
    Integer(Bounded<i64>),
    Boolean(BooleanValue),
    Float(Bounded<f64>),
    Text(TextValue),
    Filename(FilenameValue),
    Colour(Colour),
}

impl PropertyValue {
    /// Zero/default value for the given type
    pub fn default_for(property_type: PropertyType) -> Self {
        match property_type {
            PropertyType::Integer => PropertyValue::Integer(Bounded::default()),
            PropertyType::Boolean => PropertyValue::Boolean(BooleanValue::default()),
            PropertyType::Float => PropertyValue::Float(Bounded::default()),
            PropertyType::Text => PropertyValue::Text(TextValue::default()),
            PropertyType::Filename => PropertyValue::Filename(FilenameValue::default()),
            PropertyType::Colour => PropertyValue::Colour(Colour::default()),
        }
    }

    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Integer(_) => PropertyType::Integer,
            PropertyValue::Boolean(_) => PropertyType::Boolean,
            PropertyValue::Float(_) => PropertyType::Float,
            PropertyValue::Text(_) => PropertyType::Text,
            PropertyValue::Filename(_) => PropertyType::Filename,
            PropertyValue::Colour(_) => PropertyType::Colour,
        }
    }
}

/// A single named, typed configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Not currently applicable; the stored value is still kept
    #[serde(default)]
    pub disabled: bool,
    pub value: PropertyValue,
}

impl Property {
    /// Allocate an unnamed property of the given type with default values
    pub fn allocate(property_type: PropertyType) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            disabled: false,
            value: PropertyValue::default_for(property_type),
        }
    }

    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            disabled: false,
            value,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn property_type(&self) -> PropertyType {
        self.value.property_type()
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// Fail unless this property holds a value of `expected` type
    pub fn expect_type(&self, expected: PropertyType) -> Result<(), PropertyError> {
        let actual = self.property_type();
        if actual == expected {
            Ok(())
        } else {
            Err(PropertyError::TypeMismatch {
                name: self.name.clone(),
                expected,
                actual,
            })
        }
    }

    pub fn as_integer(&self) -> Option<&Bounded<i64>> {
        match &self.value {
            PropertyValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_integer_mut(&mut self) -> Option<&mut Bounded<i64>> {
        match &mut self.value {
            PropertyValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&Bounded<f64>> {
        match &self.value {
            PropertyValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float_mut(&mut self) -> Option<&mut Bounded<f64>> {
        match &mut self.value {
            PropertyValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match &self.value {
            PropertyValue::Boolean(v) => Some(v.value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextValue> {
        match &self.value {
            PropertyValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_filename(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::Filename(v) => Some(&v.value),
            _ => None,
        }
    }

    pub fn as_colour(&self) -> Option<&Colour> {
        match &self.value {
            PropertyValue::Colour(v) => Some(v),
            _ => None,
        }
    }
}
