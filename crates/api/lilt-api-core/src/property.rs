//! Animatable property capabilities.
//!
//! A property exposes an optional base value plus an animation overlay. While
//! `is_animated` is set, consumers read the overlay; otherwise the base value
//! (when there is one) is authoritative. Setters take `&self` because
//! properties are shared between the host object and the animation manager.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::PropertyError;

/// Generic capability view over one animatable value slot.
pub trait AnimatableProperty<T> {
    /// Whether `base_value` can be read.
    fn has_base_value(&self) -> bool;

    /// The un-animated value. Fails with [`PropertyError::NotImplemented`]
    /// when the property has no base accessor.
    fn base_value(&self) -> Result<T, PropertyError>;

    fn is_animated(&self) -> bool;

    fn set_is_animated(&self, animated: bool);

    fn animation_value(&self) -> T;

    fn set_animation_value(&self, value: T);
}

/// A property that owns its base value and a separate animation overlay.
#[derive(Debug, Default)]
pub struct AnimatableValue<T> {
    base: RefCell<T>,
    animation: RefCell<T>,
    animated: Cell<bool>,
}

impl<T: Clone> AnimatableValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            animation: RefCell::new(value.clone()),
            base: RefCell::new(value),
            animated: Cell::new(false),
        }
    }

    /// Effective value: the overlay while animated, the base value otherwise.
    pub fn value(&self) -> T {
        if self.animated.get() {
            self.animation.borrow().clone()
        } else {
            self.base.borrow().clone()
        }
    }

    /// Replace the base value. Does not touch the animation overlay.
    pub fn set_value(&self, value: T) {
        *self.base.borrow_mut() = value;
    }
}

impl<T: Clone> AnimatableProperty<T> for AnimatableValue<T> {
    fn has_base_value(&self) -> bool {
        true
    }

    fn base_value(&self) -> Result<T, PropertyError> {
        Ok(self.base.borrow().clone())
    }

    fn is_animated(&self) -> bool {
        self.animated.get()
    }

    fn set_is_animated(&self, animated: bool) {
        self.animated.set(animated);
    }

    fn animation_value(&self) -> T {
        self.animation.borrow().clone()
    }

    fn set_animation_value(&self, value: T) {
        *self.animation.borrow_mut() = value;
    }
}

/// Reads the current value of a delegated slot.
pub type Getter<T> = Rc<dyn Fn() -> T>;
/// Writes a new value into a delegated slot.
pub type Setter<T> = Rc<dyn Fn(T)>;

/// A property whose animation value is read and written through closures.
///
/// Either closure may be absent (for example while the owning object is still
/// being wired up). Reads then yield `T::default()` and writes are dropped.
/// There is no base value: the closures address the live slot directly.
pub struct DelegateAnimatableProperty<T> {
    getter: RefCell<Option<Getter<T>>>,
    setter: RefCell<Option<Setter<T>>>,
    animated: Cell<bool>,
}

impl<T> DelegateAnimatableProperty<T> {
    pub fn new(getter: Option<Getter<T>>, setter: Option<Setter<T>>) -> Self {
        Self {
            getter: RefCell::new(getter),
            setter: RefCell::new(setter),
            animated: Cell::new(false),
        }
    }

    pub fn from_fns(get: impl Fn() -> T + 'static, set: impl Fn(T) + 'static) -> Self {
        Self::new(Some(Rc::new(get)), Some(Rc::new(set)))
    }

    pub fn getter(&self) -> Option<Getter<T>> {
        self.getter.borrow().clone()
    }

    pub fn set_getter(&self, getter: Option<Getter<T>>) {
        *self.getter.borrow_mut() = getter;
    }

    pub fn setter(&self) -> Option<Setter<T>> {
        self.setter.borrow().clone()
    }

    pub fn set_setter(&self, setter: Option<Setter<T>>) {
        *self.setter.borrow_mut() = setter;
    }
}

impl<T: Default> AnimatableProperty<T> for DelegateAnimatableProperty<T> {
    fn has_base_value(&self) -> bool {
        false
    }

    fn base_value(&self) -> Result<T, PropertyError> {
        Err(PropertyError::NotImplemented)
    }

    fn is_animated(&self) -> bool {
        self.animated.get()
    }

    fn set_is_animated(&self, animated: bool) {
        self.animated.set(animated);
    }

    fn animation_value(&self) -> T {
        // Clone the closure out so it may re-enter this property.
        match self.getter() {
            Some(get) => get(),
            None => T::default(),
        }
    }

    fn set_animation_value(&self, value: T) {
        if let Some(set) = self.setter() {
            set(value);
        }
    }
}

impl<T> fmt::Debug for DelegateAnimatableProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateAnimatableProperty")
            .field("has_getter", &self.getter.borrow().is_some())
            .field("has_setter", &self.setter.borrow().is_some())
            .field("animated", &self.animated.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animatable_value_switches_between_base_and_overlay() {
        let p = AnimatableValue::new(1.0f32);
        assert!(p.has_base_value());
        assert_eq!(p.value(), 1.0);

        p.set_animation_value(5.0);
        assert_eq!(p.value(), 1.0);
        p.set_is_animated(true);
        assert_eq!(p.value(), 5.0);
        assert_eq!(p.base_value(), Ok(1.0));

        p.set_value(2.0);
        p.set_is_animated(false);
        assert_eq!(p.value(), 2.0);
    }

    #[test]
    fn delegate_without_accessors_is_inert() {
        let p: DelegateAnimatableProperty<f32> = DelegateAnimatableProperty::new(None, None);
        assert!(p.getter().is_none());
        assert!(p.setter().is_none());
        assert!(!p.has_base_value());
        assert_eq!(p.base_value(), Err(PropertyError::NotImplemented));

        assert!(!p.is_animated());
        p.set_is_animated(true);
        assert!(p.is_animated());

        p.set_animation_value(3.0);
        assert_eq!(p.animation_value(), 0.0);
    }

    #[test]
    fn delegate_reads_and_writes_through_closures() {
        let slot = Rc::new(Cell::new(4.0f32));
        let (r, w) = (slot.clone(), slot.clone());
        let p = DelegateAnimatableProperty::from_fns(move || r.get(), move |v| w.set(v));

        assert_eq!(p.animation_value(), 4.0);
        p.set_animation_value(9.0);
        assert_eq!(slot.get(), 9.0);

        // Detach and reattach the getter.
        let getter = p.getter();
        p.set_getter(None);
        assert_eq!(p.animation_value(), 0.0);
        p.set_getter(getter);
        assert_eq!(p.animation_value(), 9.0);
    }
}
