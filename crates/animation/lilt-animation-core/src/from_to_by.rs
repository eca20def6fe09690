//! From/To/By animation: interpolates between two values over a fixed duration.

use std::rc::Rc;

use lilt_api_core::Interpolatable;

use crate::easing::EasingFunction;
use crate::error::check_non_negative;
use crate::instance::AnimationInstance;
use crate::timeline::{span_state, span_time, Animation, AnimationState, FillBehavior, Timeline};
use crate::Result;

/// Animates from `from` to `to` (or `from + by`).
///
/// An unset `from` starts at the incoming value. An unset `to` resolves to
/// `from + by` when `by` is set and to the property's base value otherwise.
#[derive(Debug)]
pub struct FromToByAnimation<T: Interpolatable> {
    from: Option<T>,
    to: Option<T>,
    by: Option<T>,
    duration: f32,
    easing: Option<Rc<dyn EasingFunction>>,
    additive: bool,
    fill_behavior: FillBehavior,
    target_object: Option<String>,
    target_property: Option<String>,
}

impl<T: Interpolatable> FromToByAnimation<T> {
    pub fn new(duration: f32) -> Result<Self> {
        Ok(Self {
            from: None,
            to: None,
            by: None,
            duration: check_non_negative("duration", duration)?,
            easing: None,
            additive: false,
            fill_behavior: FillBehavior::Hold,
            target_object: None,
            target_property: None,
        })
    }

    pub fn from(&self) -> Option<&T> {
        self.from.as_ref()
    }

    pub fn set_from(&mut self, from: Option<T>) {
        self.from = from;
    }

    pub fn to(&self) -> Option<&T> {
        self.to.as_ref()
    }

    pub fn set_to(&mut self, to: Option<T>) {
        self.to = to;
    }

    pub fn by(&self) -> Option<&T> {
        self.by.as_ref()
    }

    pub fn set_by(&mut self, by: Option<T>) {
        self.by = by;
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f32) -> Result<()> {
        self.duration = check_non_negative("duration", duration)?;
        Ok(())
    }

    pub fn easing(&self) -> Option<&Rc<dyn EasingFunction>> {
        self.easing.as_ref()
    }

    pub fn set_easing(&mut self, easing: Option<Rc<dyn EasingFunction>>) {
        self.easing = easing;
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

    fn progress(&self, t: f32) -> f32 {
        let p = if self.duration <= 0.0 {
            1.0
        } else {
            t / self.duration
        };
        match &self.easing {
            Some(e) => e.ease(p),
            None => p,
        }
    }
}

impl<T: Interpolatable> Timeline for FromToByAnimation<T> {
    fn target_object(&self) -> Option<&str> {
        self.target_object.as_deref()
    }

    fn fill_behavior(&self) -> FillBehavior {
        self.fill_behavior
    }

    fn total_duration(&self) -> f32 {
        self.duration
    }

    fn state(&self, time: f32) -> AnimationState {
        span_state(time, self.duration, self.fill_behavior)
    }

    fn animation_time(&self, time: f32) -> Option<f32> {
        span_time(time, self.duration, self.fill_behavior)
    }

    fn create_instance(self: Rc<Self>) -> AnimationInstance {
        AnimationInstance::leaf::<T>(self.clone(), self)
    }
}

impl<T: Interpolatable> Animation<T> for FromToByAnimation<T> {
    fn target_property(&self) -> Option<&str> {
        self.target_property.as_deref()
    }

    fn is_additive(&self) -> bool {
        self.additive
    }

    fn value(&self, time: f32, default_source: &T, default_target: &T) -> Result<T> {
        let Some(t) = self.animation_time(time) else {
            return Ok(default_source.clone());
        };

        let zero = T::zero();
        let (source, target) = if self.additive {
            (&zero, &zero)
        } else {
            (default_source, default_target)
        };

        let from = self.from.clone().unwrap_or_else(|| source.clone());
        let to = match (&self.to, &self.by) {
            (Some(to), _) => to.clone(),
            (None, Some(by)) => from.add(by),
            (None, None) => target.clone(),
        };
        let value = from.interpolate(&to, self.progress(t));

        if self.additive {
            Ok(default_source.add(&value))
        } else {
            Ok(value)
        }
    }
}
