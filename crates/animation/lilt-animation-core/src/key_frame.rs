//! Key frame animation: a value track sampled between time-stamped keys.
//!
//! Model:
//! - Keys are kept sorted by time; keys with equal times keep insertion order.
//! - A key's interpolation describes the segment that ends at it: `Linear`
//!   blends from the previous key (optionally through an easing curve),
//!   `Discrete` holds the previous value until the key's time is reached.
//! - Before the first key the track blends from the incoming value, so a
//!   track whose first key is not at 0 starts where the property currently is.

use std::rc::Rc;

use lilt_api_core::Interpolatable;
use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;
use crate::error::check_non_negative;
use crate::instance::AnimationInstance;
use crate::timeline::{span_state, span_time, Animation, AnimationState, FillBehavior, Timeline};
use crate::Result;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyFrameInterpolation {
    #[default]
    Linear,
    Discrete,
}

#[derive(Clone, Debug)]
pub struct KeyFrame<T> {
    pub time: f32,
    pub value: T,
    pub interpolation: KeyFrameInterpolation,
    /// Shapes the segment ending at this key; ignored for discrete keys.
    pub easing: Option<Rc<dyn EasingFunction>>,
}

impl<T> KeyFrame<T> {
    pub fn linear(time: f32, value: T) -> Self {
        Self {
            time,
            value,
            interpolation: KeyFrameInterpolation::Linear,
            easing: None,
        }
    }

    pub fn discrete(time: f32, value: T) -> Self {
        Self {
            time,
            value,
            interpolation: KeyFrameInterpolation::Discrete,
            easing: None,
        }
    }

    pub fn with_easing(mut self, easing: Rc<dyn EasingFunction>) -> Self {
        self.easing = Some(easing);
        self
    }
}

#[derive(Debug)]
pub struct KeyFrameAnimation<T: Interpolatable> {
    keys: Vec<KeyFrame<T>>,
    additive: bool,
    fill_behavior: FillBehavior,
    target_object: Option<String>,
    target_property: Option<String>,
}

impl<T: Interpolatable> Default for KeyFrameAnimation<T> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            additive: false,
            fill_behavior: FillBehavior::Hold,
            target_object: None,
            target_property: None,
        }
    }
}

impl<T: Interpolatable> KeyFrameAnimation<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key at its sorted position. Key times must be non-negative.
    pub fn insert(&mut self, key: KeyFrame<T>) -> Result<()> {
        check_non_negative("key time", key.time)?;
        let idx = self.keys.partition_point(|k| k.time <= key.time);
        self.keys.insert(idx, key);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<KeyFrame<T>> {
        (index < self.keys.len()).then(|| self.keys.remove(index))
    }

    pub fn keys(&self) -> &[KeyFrame<T>] {
        &self.keys
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn set_additive(&mut self, additive: bool) {
        self.additive = additive;
    }

    pub fn set_fill_behavior(&mut self, fill: FillBehavior) {
        self.fill_behavior = fill;
    }

    pub fn set_target_object(&mut self, name: Option<&str>) {
        self.target_object = name.map(str::to_string);
    }

    pub fn set_target_property(&mut self, name: Option<&str>) {
        self.target_property = name.map(str::to_string);
    }

    fn duration(&self) -> f32 {
        self.keys.last().map_or(0.0, |k| k.time)
    }

    /// Sample the track at `t`, using `incoming` as the implicit key at 0.
    fn sample(&self, t: f32, incoming: &T) -> T {
        let idx = self.keys.partition_point(|k| k.time <= t);
        if idx == self.keys.len() {
            return match self.keys.last() {
                Some(k) => k.value.clone(),
                None => incoming.clone(),
            };
        }
        let right = &self.keys[idx];
        let (left_time, left_value) = match idx.checked_sub(1).map(|i| &self.keys[i]) {
            Some(k) => (k.time, &k.value),
            None => (0.0, incoming),
        };
        match right.interpolation {
            KeyFrameInterpolation::Discrete => left_value.clone(),
            KeyFrameInterpolation::Linear => {
                let span = (right.time - left_time).max(f32::EPSILON);
                let mut lt = ((t - left_time) / span).clamp(0.0, 1.0);
                if let Some(e) = &right.easing {
                    lt = e.ease(lt);
                }
                left_value.interpolate(&right.value, lt)
            }
        }
    }
}

impl<T: Interpolatable> Timeline for KeyFrameAnimation<T> {
    fn target_object(&self) -> Option<&str> {
        self.target_object.as_deref()
    }

    fn fill_behavior(&self) -> FillBehavior {
        self.fill_behavior
    }

    fn total_duration(&self) -> f32 {
        self.duration()
    }

    fn state(&self, time: f32) -> AnimationState {
        span_state(time, self.duration(), self.fill_behavior)
    }

    fn animation_time(&self, time: f32) -> Option<f32> {
        span_time(time, self.duration(), self.fill_behavior)
    }

    fn create_instance(self: Rc<Self>) -> AnimationInstance {
        AnimationInstance::leaf::<T>(self.clone(), self)
    }
}

impl<T: Interpolatable> Animation<T> for KeyFrameAnimation<T> {
    fn target_property(&self) -> Option<&str> {
        self.target_property.as_deref()
    }

    fn is_additive(&self) -> bool {
        self.additive
    }

    fn value(&self, time: f32, default_source: &T, _default_target: &T) -> Result<T> {
        let Some(t) = self.animation_time(time) else {
            return Ok(default_source.clone());
        };
        if self.additive {
            Ok(default_source.add(&self.sample(t, &T::zero())))
        } else {
            Ok(self.sample(t, default_source))
        }
    }
}
