/*
 *  property/collection.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Keyed, ordered set of properties owned by one object
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

use std::collections::HashMap;
use std::ops::Deref;
use serde::{Deserialize, Serialize};

use super::{Bounded, Property, PropertyValue};

/// Properties of a single object, unique by name
///
/// Lookup is by name; iteration follows insertion order so a UI can list the
/// properties the way the plugin declared them. Replacing an entry keeps its
/// original position. The collection owns its properties outright, so adding
/// the same property to a second collection means cloning it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Property>", into = "Vec<Property>")]
pub struct PropertyCollection {
    properties: HashMap<String, Property>,
    order: Vec<String>,
}

impl PropertyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Edit an entry in place. The name is the entry's key and stays fixed;
    /// rename by removing and re-adding.
    pub fn get_mut(&mut self, name: &str) -> Option<PropertyMut<'_>> {
        self.properties.get_mut(name).map(PropertyMut)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Add a property, replacing (and returning) any entry with the same name
    pub fn add(&mut self, property: Property) -> Option<Property> {
        let name = property.name.clone();
        let previous = self.properties.insert(name.clone(), property);
        if previous.is_none() {
            self.order.push(name);
        }
        previous
    }

    /// Remove a property by name. Absent names are ignored.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let removed = self.properties.remove(name);
        if removed.is_some() {
            self.order.retain(|n| n != name);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.order.iter().filter_map(|name| self.properties.get(name))
    }
}

/// Mutable view of a property held in a [`PropertyCollection`]
///
/// Everything except the name can change.
///
/// ```compile_fail,E0594
/// # use aura_live::property::{Property, PropertyCollection, PropertyType};
/// let mut props: PropertyCollection = vec![Property::allocate(PropertyType::Integer)].into();
/// let mut entry = props.get_mut("").unwrap();
/// entry.name = "renamed".into();
/// ```
#[derive(Debug)]
pub struct PropertyMut<'a>(&'a mut Property);

impl PropertyMut<'_> {
    pub fn value_mut(&mut self) -> &mut PropertyValue {
        &mut self.0.value
    }

    pub fn set_value(&mut self, value: PropertyValue) {
        self.0.value = value;
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.0.description = description.into();
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.0.disabled = disabled;
    }

    pub fn as_integer_mut(&mut self) -> Option<&mut Bounded<i64>> {
        self.0.as_integer_mut()
    }

    pub fn as_float_mut(&mut self) -> Option<&mut Bounded<f64>> {
        self.0.as_float_mut()
    }
}

impl Deref for PropertyMut<'_> {
    type Target = Property;

    fn deref(&self) -> &Property {
        self.0
    }
}

impl From<Vec<Property>> for PropertyCollection {
    fn from(properties: Vec<Property>) -> Self {
        properties.into_iter().collect()
    }
}

impl From<PropertyCollection> for Vec<Property> {
    fn from(mut collection: PropertyCollection) -> Self {
        collection
            .order
            .iter()
            .filter_map(|name| collection.properties.remove(name))
            .collect()
    }
}

impl FromIterator<Property> for PropertyCollection {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut collection = PropertyCollection::new();
        for property in iter {
            collection.add(property);
        }
        collection
    }
}
