//! Lilt Animation Core (engine-agnostic)
//!
//! Timelines describe how values change over time; instances are the runtime
//! trees created from them; the [`AnimationManager`] advances instance clocks
//! and composes every animated property once per frame.
//!
//! Hosts expose values through [`lilt_api_core`] properties and drive the
//! manager from their frame loop:
//!
//! ```text
//! manager.update(dt)?;            // advance clocks and fades
//! manager.apply_animations()?;    // compose and write values
//! ```

pub mod blend;
pub mod clip;
pub(crate) mod composition;
pub mod config;
pub mod controller;
pub mod easing;
pub mod error;
pub mod from_to_by;
pub mod group;
pub mod ids;
pub mod instance;
pub mod key_frame;
pub mod manager;
pub mod timeline;
pub mod transition;

pub type Result<T> = core::result::Result<T, AnimationError>;

// Re-exports for hosts
pub use blend::BlendGroup;
pub use clip::{AnimationClip, ClipTiming, TimelineClip};
pub use config::Config;
pub use controller::AnimationController;
pub use easing::{
    BackEase, BounceEase, CircleEase, CubicEase, EasingFunction, EasingMode, ElasticEase,
    ExponentialEase, HermiteEase, LogarithmicEase, PowerEase, QuadraticEase, QuarticEase,
    QuinticEase, SineEase,
};
pub use error::AnimationError;
pub use from_to_by::FromToByAnimation;
pub use group::TimelineGroup;
pub use ids::InstanceId;
pub use instance::{AnimationInstance, InstanceCollection};
pub use key_frame::{KeyFrame, KeyFrameAnimation, KeyFrameInterpolation};
pub use manager::{AnimationManager, AnimationTarget};
pub use timeline::{Animation, AnimationState, FillBehavior, LoopBehavior, Timeline, MAX_DURATION};
pub use transition::AnimationTransition;
pub use lilt_api_core::{
    AnimatableObject, AnimatableProperty, AnimatableValue, DelegateAnimatableProperty,
    Interpolatable, ObjectRegistry, PropertyError, PropertyRef, PropertyResolver,
};
