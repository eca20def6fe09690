//! Target resolution: mapping (object name, property name) to a property.
//!
//! Animations name their targets with strings. Hosts implement
//! [`PropertyResolver`] (or register [`AnimatableObject`]s in an
//! [`ObjectRegistry`]) and hand it to the animation manager. A target that does
//! not resolve is not an error: the animation simply has no visible effect.

use std::rc::Rc;

use hashbrown::HashMap;

use crate::property_ref::PropertyRef;

/// Resolves canonical target names to property handles.
pub trait PropertyResolver {
    fn resolve(&self, object: Option<&str>, property: &str) -> Option<PropertyRef>;
}

/// An object exposing named animatable properties.
pub trait AnimatableObject {
    fn name(&self) -> &str;

    fn property(&self, name: &str) -> Option<PropertyRef>;
}

impl<F> PropertyResolver for F
where
    F: Fn(Option<&str>, &str) -> Option<PropertyRef>,
{
    fn resolve(&self, object: Option<&str>, property: &str) -> Option<PropertyRef> {
        self(object, property)
    }
}

/// Name-keyed set of animatable objects.
///
/// An unnamed target resolves against the default object, if one is set.
#[derive(Default)]
pub struct ObjectRegistry {
    objects: HashMap<String, Rc<dyn AnimatableObject>>,
    default_object: Option<String>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an object under its own name.
    pub fn insert(&mut self, object: Rc<dyn AnimatableObject>) -> Option<Rc<dyn AnimatableObject>> {
        self.objects.insert(object.name().to_string(), object)
    }

    pub fn remove(&mut self, name: &str) -> Option<Rc<dyn AnimatableObject>> {
        if self.default_object.as_deref() == Some(name) {
            self.default_object = None;
        }
        self.objects.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Rc<dyn AnimatableObject>> {
        self.objects.get(name)
    }

    pub fn set_default_object(&mut self, name: Option<&str>) {
        self.default_object = name.map(str::to_string);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl PropertyResolver for ObjectRegistry {
    fn resolve(&self, object: Option<&str>, property: &str) -> Option<PropertyRef> {
        let name = object.or(self.default_object.as_deref())?;
        self.objects.get(name)?.property(property)
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.objects.keys().collect();
        names.sort();
        f.debug_struct("ObjectRegistry")
            .field("objects", &names)
            .field("default_object", &self.default_object)
            .finish()
    }
}
