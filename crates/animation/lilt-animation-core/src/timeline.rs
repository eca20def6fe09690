//! Timeline contracts and the time arithmetic shared by every timeline kind.
//!
//! A timeline maps a time measured from its own origin to a state and, for
//! leaf animations, a value. Composite timelines hand a (possibly remapped)
//! time down to their children; see [`Timeline::animation_time`].

use std::fmt;
use std::rc::Rc;

use lilt_api_core::Interpolatable;
use serde::{Deserialize, Serialize};

use crate::instance::AnimationInstance;
use crate::Result;

/// Duration reported by timelines that never complete (for example a clip
/// with speed 0).
pub const MAX_DURATION: f32 = f32::MAX;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationState {
    /// Before the timeline's start.
    Delayed,
    Playing,
    /// Past the active window, holding the last value.
    Filling,
    Stopped,
}

impl AnimationState {
    /// True when the timeline contributes a value.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Filling)
    }
}

/// What happens once a timeline's active window has elapsed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillBehavior {
    #[default]
    Hold,
    Stop,
}

/// How played time beyond the clip window maps back into it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopBehavior {
    /// Clamp to the window.
    #[default]
    Constant,
    /// Repeat the window.
    Cycle,
    /// Repeat the window, offsetting each repetition by the value change
    /// across one window so the animation keeps progressing.
    CycleOffset,
    /// Play forward then backward.
    Oscillate,
}

/// A node in a static, shareable timeline graph.
pub trait Timeline: fmt::Debug + 'static {
    /// Name of the object this timeline (and its children, unless they
    /// override it) animates.
    fn target_object(&self) -> Option<&str> {
        None
    }

    fn fill_behavior(&self) -> FillBehavior;

    /// Time from the origin until the timeline completes; [`MAX_DURATION`]
    /// when it never does.
    fn total_duration(&self) -> f32;

    fn state(&self, time: f32) -> AnimationState;

    /// The time handed to children (or used to sample a leaf), or `None` while
    /// the timeline is delayed or stopped.
    fn animation_time(&self, time: f32) -> Option<f32>;

    /// Time for child `index` given this timeline's animation time.
    fn child_time(&self, _index: usize, animation_time: f32) -> f32 {
        animation_time
    }

    /// Evaluation-time consistency check.
    fn check(&self) -> Result<()> {
        Ok(())
    }

    /// Build the runtime tree for this timeline.
    fn create_instance(self: Rc<Self>) -> AnimationInstance;
}

/// A timeline that produces values of type `T`.
pub trait Animation<T: Interpolatable>: Timeline {
    fn target_property(&self) -> Option<&str>;

    /// Additive animations add their output to the incoming value.
    fn is_additive(&self) -> bool {
        false
    }

    /// Value at `time`. `default_source` is the incoming value and
    /// `default_target` the property's base value; inactive animations return
    /// `default_source`.
    fn value(&self, time: f32, default_source: &T, default_target: &T) -> Result<T>;
}

/// State of a timeline that starts at 0 and runs for `duration`.
pub(crate) fn span_state(time: f32, duration: f32, fill: FillBehavior) -> AnimationState {
    if time < 0.0 {
        AnimationState::Delayed
    } else if time < duration || time == 0.0 {
        AnimationState::Playing
    } else {
        match fill {
            FillBehavior::Hold => AnimationState::Filling,
            FillBehavior::Stop => AnimationState::Stopped,
        }
    }
}

/// Sampling time of a leaf animation, clamped to its duration.
pub(crate) fn span_time(time: f32, duration: f32, fill: FillBehavior) -> Option<f32> {
    match span_state(time, duration, fill) {
        AnimationState::Playing => Some(time.min(duration)),
        AnimationState::Filling => Some(duration),
        AnimationState::Delayed | AnimationState::Stopped => None,
    }
}

/// Euclidean-style modulo that always returns a value with the sign of `b`.
pub(crate) fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Reflect t into [0, span] with ping-pong behavior, where period = 2 * span.
pub(crate) fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let period = 2.0 * span;
    let m = fmod(t, period);
    if m <= span {
        m
    } else {
        period - m
    }
}
