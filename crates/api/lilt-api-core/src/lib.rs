//! lilt-api-core: value and property capabilities (engine-agnostic)
//!
//! Animation engines consume these as black boxes: a value type only has to be
//! [`Interpolatable`], and a host only has to expose [`AnimatableProperty`]s
//! through a [`PropertyResolver`].

pub mod error;
pub mod interpolate;
pub mod property;
pub mod property_ref;
pub mod resolver;

pub use error::PropertyError;
pub use interpolate::{blend_weighted, Interpolatable, WeightedAverage};
pub use property::{AnimatableProperty, AnimatableValue, DelegateAnimatableProperty, Getter, Setter};
pub use property_ref::PropertyRef;
pub use resolver::{AnimatableObject, ObjectRegistry, PropertyResolver};
