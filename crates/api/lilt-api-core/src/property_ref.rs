//! Type-erased handle to an animatable property.
//!
//! Hosts hand out `PropertyRef`s without knowing which value type an animation
//! will drive; consumers recover the generic view with [`PropertyRef::downcast`].
//! Two handles compare equal when they wrap the same property allocation.

use std::any::{type_name, Any};
use std::fmt;
use std::rc::Rc;

use crate::error::PropertyError;
use crate::property::AnimatableProperty;

trait ErasedProperty {
    fn as_any(&self) -> &dyn Any;
    fn value_type_name(&self) -> &'static str;
    fn has_base_value(&self) -> bool;
    fn base_value_any(&self) -> Result<Box<dyn Any>, PropertyError>;
    fn is_animated(&self) -> bool;
    fn set_is_animated(&self, animated: bool);
    fn animation_value_any(&self) -> Box<dyn Any>;
}

struct Typed<T: 'static>(Rc<dyn AnimatableProperty<T>>);

impl<T: 'static> ErasedProperty for Typed<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn has_base_value(&self) -> bool {
        self.0.has_base_value()
    }

    fn base_value_any(&self) -> Result<Box<dyn Any>, PropertyError> {
        self.0.base_value().map(|v| Box::new(v) as Box<dyn Any>)
    }

    fn is_animated(&self) -> bool {
        self.0.is_animated()
    }

    fn set_is_animated(&self, animated: bool) {
        self.0.set_is_animated(animated);
    }

    fn animation_value_any(&self) -> Box<dyn Any> {
        Box::new(self.0.animation_value())
    }
}

/// Untyped, cloneable handle to a shared property.
#[derive(Clone)]
pub struct PropertyRef {
    inner: Rc<dyn ErasedProperty>,
    addr: *const (),
}

impl PropertyRef {
    pub fn new<T, P>(property: Rc<P>) -> Self
    where
        T: 'static,
        P: AnimatableProperty<T> + 'static,
    {
        let addr = Rc::as_ptr(&property) as *const ();
        let typed: Rc<dyn AnimatableProperty<T>> = property;
        Self {
            inner: Rc::new(Typed(typed)),
            addr,
        }
    }

    /// Recover the generic view, or `None` when `T` is not the property's type.
    pub fn downcast<T: 'static>(&self) -> Option<Rc<dyn AnimatableProperty<T>>> {
        self.inner
            .as_any()
            .downcast_ref::<Typed<T>>()
            .map(|t| t.0.clone())
    }

    /// Like [`downcast`](Self::downcast) but reports the mismatch.
    pub fn try_downcast<T: 'static>(&self) -> Result<Rc<dyn AnimatableProperty<T>>, PropertyError> {
        self.downcast::<T>().ok_or(PropertyError::TypeMismatch {
            expected: type_name::<T>(),
            found: self.value_type_name(),
        })
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.inner.as_any().is::<Typed<T>>()
    }

    pub fn value_type_name(&self) -> &'static str {
        self.inner.value_type_name()
    }

    pub fn ptr_eq(&self, other: &PropertyRef) -> bool {
        self.addr == other.addr
    }

    pub fn has_base_value(&self) -> bool {
        self.inner.has_base_value()
    }

    /// Untyped base value; same failure as the generic view.
    pub fn base_value_any(&self) -> Result<Box<dyn Any>, PropertyError> {
        self.inner.base_value_any()
    }

    pub fn is_animated(&self) -> bool {
        self.inner.is_animated()
    }

    pub fn set_is_animated(&self, animated: bool) {
        self.inner.set_is_animated(animated);
    }

    pub fn animation_value_any(&self) -> Box<dyn Any> {
        self.inner.animation_value_any()
    }
}

impl PartialEq for PropertyRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for PropertyRef {}

impl fmt::Debug for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRef")
            .field("type", &self.value_type_name())
            .field("addr", &self.addr)
            .field("animated", &self.is_animated())
            .finish()
    }
}
