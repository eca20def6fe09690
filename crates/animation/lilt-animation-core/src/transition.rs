//! Transition policies for starting an animation on properties that are
//! already animated.
//!
//! Consumed by `AnimationController::start`; each policy is applied per
//! property the new animation drives.

use serde::{Deserialize, Serialize};

use crate::controller::AnimationController;
use crate::error::check_non_negative;
use crate::ids::InstanceId;
use crate::Result;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnimationTransition {
    /// Remove earlier animations (all of them, or only `previous`). With a
    /// fade the new animation cross-fades in and the replaced ones are
    /// removed once it reaches full weight.
    Replace {
        fade_in: f32,
        previous: Option<InstanceId>,
    },
    /// Freeze the currently visible value, drop every earlier animation and
    /// play the new one on top of the frozen value.
    SnapshotAndReplace { fade_in: f32 },
    /// Stack on top of the existing animations (or directly after `after`),
    /// leaving them running.
    Compose {
        fade_in: f32,
        after: Option<InstanceId>,
    },
}

impl Default for AnimationTransition {
    fn default() -> Self {
        Self::replace()
    }
}

fn check_fade(fade: f32) -> Result<f32> {
    check_non_negative("fade_in", fade)
}

impl AnimationTransition {
    pub fn replace() -> Self {
        Self::Replace {
            fade_in: 0.0,
            previous: None,
        }
    }

    pub fn replace_with_fade(fade_in: f32) -> Result<Self> {
        Ok(Self::Replace {
            fade_in: check_fade(fade_in)?,
            previous: None,
        })
    }

    /// Replace only `previous`, leaving other animations on the same
    /// properties in place.
    pub fn replace_instance(previous: &AnimationController, fade_in: f32) -> Result<Self> {
        Ok(Self::Replace {
            fade_in: check_fade(fade_in)?,
            previous: Some(previous.id()),
        })
    }

    pub fn snapshot_and_replace(fade_in: f32) -> Result<Self> {
        Ok(Self::SnapshotAndReplace {
            fade_in: check_fade(fade_in)?,
        })
    }

    pub fn compose() -> Self {
        Self::Compose {
            fade_in: 0.0,
            after: None,
        }
    }

    pub fn compose_with_fade(fade_in: f32) -> Result<Self> {
        Ok(Self::Compose {
            fade_in: check_fade(fade_in)?,
            after: None,
        })
    }

    /// Insert directly after `after` in each shared property's chain.
    pub fn compose_after(after: &AnimationController, fade_in: f32) -> Result<Self> {
        Ok(Self::Compose {
            fade_in: check_fade(fade_in)?,
            after: Some(after.id()),
        })
    }

    pub fn fade_in(&self) -> f32 {
        match *self {
            Self::Replace { fade_in, .. }
            | Self::SnapshotAndReplace { fade_in }
            | Self::Compose { fade_in, .. } => fade_in,
        }
    }
}
