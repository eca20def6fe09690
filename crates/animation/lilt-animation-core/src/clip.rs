//! Clips: delay, speed, duration, looping and windowing around a child timeline.
//!
//! Mapping from clip time `t` to child time:
//!
//! 1. `local = (t - delay) * speed`, clamped to the played duration.
//! 2. `local + clip_offset` is folded into the window `[clip_start, clip_end]`
//!    according to the [`LoopBehavior`].
//! 3. The position inside the window is read forwards, or backwards when the
//!    clip is reversed.
//!
//! The played duration defaults to the window length, so an unconfigured clip
//! plays its child exactly once.

use std::fmt;
use std::rc::Rc;

use lilt_api_core::Interpolatable;

use crate::error::{check_non_negative, check_not_nan, AnimationError};
use crate::instance::AnimationInstance;
use crate::timeline::{
    fmod, ping_pong, Animation, AnimationState, FillBehavior, LoopBehavior, Timeline,
    MAX_DURATION,
};
use crate::Result;

/// Timing parameters shared by [`AnimationClip`] and [`TimelineClip`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClipTiming {
    delay: f32,
    speed: f32,
    duration: Option<f32>,
    clip_start: Option<f32>,
    clip_end: Option<f32>,
    clip_offset: f32,
    reversed: bool,
    loop_behavior: LoopBehavior,
    fill_behavior: FillBehavior,
}

impl Default for ClipTiming {
    fn default() -> Self {
        Self {
            delay: 0.0,
            speed: 1.0,
            duration: None,
            clip_start: None,
            clip_end: None,
            clip_offset: 0.0,
            reversed: false,
            loop_behavior: LoopBehavior::Constant,
            fill_behavior: FillBehavior::Hold,
        }
    }
}

/// A resolved window position.
#[derive(Copy, Clone, Debug, PartialEq)]
struct WindowPos {
    child_time: f32,
    cycle: f32,
}

impl ClipTiming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// Negative delays start the child part-way through.
    pub fn set_delay(&mut self, delay: f32) -> Result<()> {
        self.delay = check_not_nan("delay", delay)?;
        Ok(())
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// A speed of 0 freezes the clip at its start and it never completes.
    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        self.speed = check_non_negative("speed", speed)?;
        Ok(())
    }

    pub fn duration(&self) -> Option<f32> {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Option<f32>) -> Result<()> {
        if let Some(d) = duration {
            check_non_negative("duration", d)?;
        }
        self.duration = duration;
        Ok(())
    }

    pub fn clip_start(&self) -> Option<f32> {
        self.clip_start
    }

    pub fn set_clip_start(&mut self, start: Option<f32>) -> Result<()> {
        if let Some(s) = start {
            check_not_nan("clip_start", s)?;
        }
        self.clip_start = start;
        Ok(())
    }

    pub fn clip_end(&self) -> Option<f32> {
        self.clip_end
    }

    pub fn set_clip_end(&mut self, end: Option<f32>) -> Result<()> {
        if let Some(e) = end {
            check_not_nan("clip_end", e)?;
        }
        self.clip_end = end;
        Ok(())
    }

    pub fn clip_offset(&self) -> f32 {
        self.clip_offset
    }

    pub fn set_clip_offset(&mut self, offset: f32) -> Result<()> {
        self.clip_offset = check_not_nan("clip_offset", offset)?;
        Ok(())
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    pub fn loop_behavior(&self) -> LoopBehavior {
        self.loop_behavior
    }

    pub fn set_loop_behavior(&mut self, loop_behavior: LoopBehavior) {
        self.loop_behavior = loop_behavior;
    }

    pub fn fill_behavior(&self) -> FillBehavior {
        self.fill_behavior
    }

    pub fn set_fill_behavior(&mut self, fill: FillBehavior) {
        self.fill_behavior = fill;
    }

    fn window(&self, child_duration: f32) -> (f32, f32) {
        (
            self.clip_start.unwrap_or(0.0),
            self.clip_end.unwrap_or(child_duration),
        )
    }

    /// Played duration: the explicit duration or the window length.
    pub fn play_duration(&self, child_duration: f32) -> f32 {
        match self.duration {
            Some(d) => d,
            None => {
                let (s, e) = self.window(child_duration);
                if s.max(e) >= MAX_DURATION {
                    MAX_DURATION
                } else {
                    (e - s).abs()
                }
            }
        }
    }

    pub fn total_duration(&self, child_duration: f32) -> f32 {
        let d = self.play_duration(child_duration);
        if self.speed == 0.0 || d >= MAX_DURATION {
            return MAX_DURATION;
        }
        (self.delay + d / self.speed).clamp(0.0, MAX_DURATION)
    }

    pub fn state(&self, time: f32, child_duration: f32) -> AnimationState {
        if time < self.delay {
            return AnimationState::Delayed;
        }
        let local = (time - self.delay) * self.speed;
        if local < self.play_duration(child_duration) || local == 0.0 {
            AnimationState::Playing
        } else {
            match self.fill_behavior {
                FillBehavior::Hold => AnimationState::Filling,
                FillBehavior::Stop => AnimationState::Stopped,
            }
        }
    }

    /// Cyclic loops need an ordered window; constant loops read an inverted
    /// window backwards.
    pub fn check(&self, child_duration: f32) -> Result<()> {
        let (s, e) = self.window(child_duration);
        if s > e && self.loop_behavior != LoopBehavior::Constant {
            return Err(AnimationError::invalid(format!(
                "clip window [{s}, {e}] is inverted, which {:?} looping does not support",
                self.loop_behavior
            )));
        }
        Ok(())
    }

    /// Child time for clip time `time`, or `None` while delayed or stopped.
    pub fn child_time(&self, time: f32, child_duration: f32) -> Option<f32> {
        self.position(time, child_duration).map(|p| p.child_time)
    }

    fn position(&self, time: f32, child_duration: f32) -> Option<WindowPos> {
        if !self.state(time, child_duration).is_active() {
            return None;
        }
        let play = self.play_duration(child_duration);
        if play <= 0.0 {
            // A zero-length play shows the end of the window at once.
            let (_, end) = self.window_ends(child_duration);
            return Some(WindowPos {
                child_time: end,
                cycle: 0.0,
            });
        }
        let local = ((time - self.delay) * self.speed).min(play);
        Some(self.fold(local + self.clip_offset, child_duration))
    }

    /// Child times at the start and end of one pass through the window.
    fn window_ends(&self, child_duration: f32) -> (f32, f32) {
        let (s, e) = self.window(child_duration);
        let (lo, hi) = (s.min(e), s.max(e));
        if self.reversed != (s > e) {
            (hi, lo)
        } else {
            (lo, hi)
        }
    }

    fn fold(&self, t: f32, child_duration: f32) -> WindowPos {
        let (from, to) = self.window_ends(child_duration);
        let len = (to - from).abs();
        let (m, cycle) = match self.loop_behavior {
            LoopBehavior::Constant => (t.clamp(0.0, len), 0.0),
            LoopBehavior::Cycle | LoopBehavior::CycleOffset => {
                if len <= 0.0 {
                    (0.0, 0.0)
                } else {
                    let mut m = fmod(t, len);
                    let mut cycle = ((t - m) / len).round();
                    // End-inclusive: a pass that lands exactly on a boundary
                    // shows the end of the window, not the start of the next.
                    if t > 0.0 && m == 0.0 {
                        m = len;
                        cycle -= 1.0;
                    }
                    (m, cycle)
                }
            }
            LoopBehavior::Oscillate => (ping_pong(t, len), 0.0),
        };
        let child_time = if from <= to { from + m } else { from - m };
        WindowPos { child_time, cycle }
    }
}

/// A typed clip around a child animation.
pub struct AnimationClip<T: Interpolatable> {
    timing: ClipTiming,
    animation: Option<Rc<dyn Animation<T>>>,
    target_object: Option<String>,
    target_property: Option<String>,
    additive: bool,
}

impl<T: Interpolatable> Default for AnimationClip<T> {
    fn default() -> Self {
        Self {
            timing: ClipTiming::default(),
            animation: None,
            target_object: None,
            target_property: None,
            additive: false,
        }
    }
}

impl<T: Interpolatable> AnimationClip<T> {
    pub fn new(animation: Rc<dyn Animation<T>>) -> Self {
        Self {
            animation: Some(animation),
            ..Self::default()
        }
    }

    pub fn timing(&self) -> &ClipTiming {
        &self.timing
    }

    pub fn timing_mut(&mut self) -> &mut ClipTiming {
        &mut self.timing
    }

    pub fn animation(&self) -> Option<&Rc<dyn Animation<T>>> {
        self.animation.as_ref()
    }

    pub fn set_animation(&mut self, animation: Option<Rc<dyn Animation<T>>>) {
        self.animation = animation;
    }

    /// Override the child's target object.
    pub fn set_target_object(&mut self, name: Option<&str>) {
        self.target_object = name.map(str::to_string);
    }

    /// Override the child's target property.
    pub fn set_target_property(&mut self, name: Option<&str>) {
        self.target_property = name.map(str::to_string);
    }

    pub fn set_additive(&mut self, additive: bool) {
        self.additive = additive;
    }

    fn child_duration(&self) -> f32 {
        self.animation
            .as_ref()
            .map_or(0.0, |a| a.total_duration())
    }
}

impl<T: Interpolatable> fmt::Debug for AnimationClip<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationClip")
            .field("timing", &self.timing)
            .field("animation", &self.animation)
            .field("target_object", &self.target_object)
            .field("target_property", &self.target_property)
            .field("additive", &self.additive)
            .finish()
    }
}

impl<T: Interpolatable> Timeline for AnimationClip<T> {
    fn target_object(&self) -> Option<&str> {
        self.target_object
            .as_deref()
            .or_else(|| self.animation.as_ref().and_then(|a| a.target_object()))
    }

    fn fill_behavior(&self) -> FillBehavior {
        self.timing.fill_behavior
    }

    fn total_duration(&self) -> f32 {
        self.timing.total_duration(self.child_duration())
    }

    fn state(&self, time: f32) -> AnimationState {
        self.timing.state(time, self.child_duration())
    }

    fn animation_time(&self, time: f32) -> Option<f32> {
        self.timing.child_time(time, self.child_duration())
    }

    fn check(&self) -> Result<()> {
        let Some(animation) = &self.animation else {
            return Err(AnimationError::invalid("animation clip has no animation"));
        };
        self.timing.check(animation.total_duration())?;
        animation.check()
    }

    fn create_instance(self: Rc<Self>) -> AnimationInstance {
        AnimationInstance::leaf::<T>(self.clone(), self)
    }
}

impl<T: Interpolatable> Animation<T> for AnimationClip<T> {
    fn target_property(&self) -> Option<&str> {
        self.target_property
            .as_deref()
            .or_else(|| self.animation.as_ref().and_then(|a| a.target_property()))
    }

    fn is_additive(&self) -> bool {
        self.additive
    }

    fn value(&self, time: f32, default_source: &T, default_target: &T) -> Result<T> {
        self.check()?;
        let Some(animation) = &self.animation else {
            return Err(AnimationError::invalid("animation clip has no animation"));
        };
        let child_duration = animation.total_duration();
        let Some(pos) = self.timing.position(time, child_duration) else {
            return Ok(default_source.clone());
        };

        // Additive clips drive their child relative to zero.
        let zero = T::zero();
        let (source, target) = if self.additive {
            (&zero, &zero)
        } else {
            (default_source, default_target)
        };

        let mut value = animation.value(pos.child_time, source, target)?;
        if self.timing.loop_behavior == LoopBehavior::CycleOffset && pos.cycle != 0.0 {
            let (from, to) = self.timing.window_ends(child_duration);
            let start = animation.value(from, source, target)?;
            let end = animation.value(to, source, target)?;
            value = value.add(&end.subtract(&start).scale(pos.cycle));
        }

        if self.additive {
            Ok(default_source.add(&value))
        } else {
            Ok(value)
        }
    }
}

/// A clip around an untyped timeline such as a group.
///
/// `CycleOffset` behaves like `Cycle` here since the child's values are not
/// known to the clip.
#[derive(Debug, Default)]
pub struct TimelineClip {
    timing: ClipTiming,
    timeline: Option<Rc<dyn Timeline>>,
    target_object: Option<String>,
}

impl TimelineClip {
    pub fn new(timeline: Rc<dyn Timeline>) -> Self {
        Self {
            timeline: Some(timeline),
            ..Self::default()
        }
    }

    pub fn timing(&self) -> &ClipTiming {
        &self.timing
    }

    pub fn timing_mut(&mut self) -> &mut ClipTiming {
        &mut self.timing
    }

    pub fn timeline(&self) -> Option<&Rc<dyn Timeline>> {
        self.timeline.as_ref()
    }

    pub fn set_timeline(&mut self, timeline: Option<Rc<dyn Timeline>>) {
        self.timeline = timeline;
    }

    pub fn set_target_object(&mut self, name: Option<&str>) {
        self.target_object = name.map(str::to_string);
    }

    fn child_duration(&self) -> f32 {
        self.timeline.as_ref().map_or(0.0, |t| t.total_duration())
    }
}

impl Timeline for TimelineClip {
    fn target_object(&self) -> Option<&str> {
        self.target_object.as_deref()
    }

    fn fill_behavior(&self) -> FillBehavior {
        self.timing.fill_behavior
    }

    fn total_duration(&self) -> f32 {
        self.timing.total_duration(self.child_duration())
    }

    fn state(&self, time: f32) -> AnimationState {
        self.timing.state(time, self.child_duration())
    }

    fn animation_time(&self, time: f32) -> Option<f32> {
        self.timing.child_time(time, self.child_duration())
    }

    fn check(&self) -> Result<()> {
        let Some(timeline) = &self.timeline else {
            return Err(AnimationError::invalid("timeline clip has no timeline"));
        };
        self.timing.check(timeline.total_duration())
    }

    fn create_instance(self: Rc<Self>) -> AnimationInstance {
        let children = self
            .timeline
            .iter()
            .map(|t| t.clone().create_instance())
            .collect();
        AnimationInstance::group(self, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::from_to_by::FromToByAnimation;
    use approx::assert_abs_diff_eq;

    fn ramp(from: f32, to: f32, duration: f32) -> Rc<dyn Animation<f32>> {
        let mut a = FromToByAnimation::new(duration).unwrap();
        a.set_from(Some(from));
        a.set_to(Some(to));
        Rc::new(a)
    }

    fn clip(child: Rc<dyn Animation<f32>>) -> AnimationClip<f32> {
        AnimationClip::new(child)
    }

    #[test]
    fn delayed_double_speed_clip() {
        let mut c = clip(ramp(100.0, 200.0, 6.0));
        c.timing_mut().set_delay(10.0).unwrap();
        c.timing_mut().set_speed(2.0).unwrap();

        assert_eq!(c.total_duration(), 13.0);
        assert_eq!(c.state(9.99), AnimationState::Delayed);
        assert_eq!(c.value(5.0, &-1.0, &-2.0).unwrap(), -1.0);
        assert_eq!(c.state(10.0), AnimationState::Playing);
        assert_eq!(c.state(12.99), AnimationState::Playing);
        assert_abs_diff_eq!(c.value(11.5, &0.0, &0.0).unwrap(), 150.0, epsilon = 1e-4);
        assert_eq!(c.state(13.0), AnimationState::Filling);
        assert_eq!(c.value(20.0, &0.0, &0.0).unwrap(), 200.0);

        c.timing_mut().set_fill_behavior(FillBehavior::Stop);
        assert_eq!(c.state(13.0), AnimationState::Stopped);
        assert_eq!(c.value(20.0, &7.0, &0.0).unwrap(), 7.0);
    }

    #[test]
    fn zero_duration_clip_jumps_to_the_end() {
        let c = clip(ramp(0.0, 10.0, 0.0));
        assert_eq!(c.total_duration(), 0.0);
        assert_eq!(c.state(0.0), AnimationState::Playing);
        assert_eq!(c.value(0.0, &0.0, &0.0).unwrap(), 10.0);
        assert_eq!(c.state(0.001), AnimationState::Filling);
        assert_eq!(c.value(0.001, &0.0, &0.0).unwrap(), 10.0);

        // An explicit zero duration lands on the end of a longer child's window.
        let mut c = clip(ramp(0.0, 10.0, 4.0));
        c.timing_mut().set_duration(Some(0.0)).unwrap();
        assert_eq!(c.total_duration(), 0.0);
        assert_eq!(c.state(0.0), AnimationState::Playing);
        assert_eq!(c.value(0.0, &0.0, &0.0).unwrap(), 10.0);
        assert_eq!(c.state(0.5), AnimationState::Filling);
        assert_eq!(c.value(0.5, &0.0, &0.0).unwrap(), 10.0);

        c.timing_mut().set_clip_end(Some(2.0)).unwrap();
        assert_abs_diff_eq!(c.value(0.0, &0.0, &0.0).unwrap(), 5.0, epsilon = 1e-5);
        c.timing_mut().set_reversed(true);
        assert_eq!(c.value(0.0, &0.0, &0.0).unwrap(), 0.0);
    }

    #[test]
    fn rejects_bad_timing_at_the_setter() {
        let mut t = ClipTiming::new();
        assert!(t.set_speed(-1.0).is_err());
        assert!(t.set_speed(f32::NAN).is_err());
        assert!(t.set_duration(Some(-0.5)).is_err());
        assert!(t.set_delay(f32::NAN).is_err());
        assert!(t.set_delay(-3.0).is_ok());
        assert_eq!(t.speed(), 1.0);
        assert_eq!(t.duration(), None);
    }

    #[test]
    fn zero_speed_never_completes() {
        let mut c = clip(ramp(0.0, 1.0, 1.0));
        c.timing_mut().set_speed(0.0).unwrap();
        assert_eq!(c.total_duration(), MAX_DURATION);
        assert_eq!(c.state(1e6), AnimationState::Playing);
        assert_eq!(c.value(1e6, &0.0, &0.0).unwrap(), 0.0);
    }

    #[test]
    fn negative_delay_shortens_but_never_below_zero() {
        let mut c = clip(ramp(0.0, 10.0, 4.0));
        c.timing_mut().set_delay(-1.0).unwrap();
        assert_eq!(c.total_duration(), 3.0);
        assert_abs_diff_eq!(c.value(0.0, &0.0, &0.0).unwrap(), 2.5, epsilon = 1e-5);
        c.timing_mut().set_delay(-10.0).unwrap();
        assert_eq!(c.total_duration(), 0.0);
    }

    #[test]
    fn cycle_repeats_the_window_and_ends_on_its_end() {
        let mut c = clip(ramp(0.0, 10.0, 1.0));
        c.timing_mut().set_loop_behavior(LoopBehavior::Cycle);
        c.timing_mut().set_duration(Some(3.0)).unwrap();
        assert_abs_diff_eq!(c.value(0.5, &0.0, &0.0).unwrap(), 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.value(1.5, &0.0, &0.0).unwrap(), 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.value(2.25, &0.0, &0.0).unwrap(), 2.5, epsilon = 1e-5);
        assert_eq!(c.value(3.0, &0.0, &0.0).unwrap(), 10.0);
    }

    #[test]
    fn cycle_offset_keeps_progressing() {
        let mut c = clip(ramp(0.0, 10.0, 1.0));
        c.timing_mut().set_loop_behavior(LoopBehavior::CycleOffset);
        c.timing_mut().set_duration(Some(3.0)).unwrap();
        assert_abs_diff_eq!(c.value(1.5, &0.0, &0.0).unwrap(), 15.0, epsilon = 1e-4);
        assert_abs_diff_eq!(c.value(2.5, &0.0, &0.0).unwrap(), 25.0, epsilon = 1e-4);
        assert_abs_diff_eq!(c.value(3.0, &0.0, &0.0).unwrap(), 30.0, epsilon = 1e-4);
    }

    #[test]
    fn oscillate_and_reverse() {
        let mut c = clip(ramp(0.0, 10.0, 1.0));
        c.timing_mut().set_loop_behavior(LoopBehavior::Oscillate);
        c.timing_mut().set_duration(Some(2.0)).unwrap();
        assert_abs_diff_eq!(c.value(1.25, &0.0, &0.0).unwrap(), 7.5, epsilon = 1e-5);

        let mut r = clip(ramp(0.0, 10.0, 1.0));
        r.timing_mut().set_reversed(true);
        assert_abs_diff_eq!(r.value(0.25, &0.0, &0.0).unwrap(), 7.5, epsilon = 1e-5);
        assert_eq!(r.value(1.0, &0.0, &0.0).unwrap(), 0.0);
    }

    #[test]
    fn sub_window_with_offset() {
        let mut c = clip(ramp(0.0, 10.0, 10.0));
        c.timing_mut().set_clip_start(Some(2.0)).unwrap();
        c.timing_mut().set_clip_end(Some(6.0)).unwrap();
        c.timing_mut().set_clip_offset(1.0).unwrap();
        assert_eq!(c.total_duration(), 4.0);
        assert_abs_diff_eq!(c.value(0.0, &0.0, &0.0).unwrap(), 3.0, epsilon = 1e-5);
        // Constant clamps at the window end.
        assert_abs_diff_eq!(c.value(3.5, &0.0, &0.0).unwrap(), 6.0, epsilon = 1e-5);
    }

    #[test]
    fn inverted_window() {
        let mut c = clip(ramp(0.0, 10.0, 10.0));
        c.timing_mut().set_clip_start(Some(8.0)).unwrap();
        c.timing_mut().set_clip_end(Some(4.0)).unwrap();
        assert_eq!(c.total_duration(), 4.0);
        assert_abs_diff_eq!(c.value(1.0, &0.0, &0.0).unwrap(), 7.0, epsilon = 1e-5);

        c.timing_mut().set_loop_behavior(LoopBehavior::Cycle);
        let err = c.value(1.0, &0.0, &0.0).unwrap_err();
        assert!(matches!(err, AnimationError::InvalidAnimation(_)));
    }

    #[test]
    fn missing_child_is_an_evaluation_error() {
        let c: AnimationClip<f32> = AnimationClip::default();
        assert_eq!(c.total_duration(), 0.0);
        assert!(matches!(
            c.value(0.0, &0.0, &0.0),
            Err(AnimationError::InvalidAnimation(_))
        ));
        assert!(TimelineClip::default().check().is_err());
    }

    #[test]
    fn additive_clip_adds_to_the_incoming_value() {
        let mut by = FromToByAnimation::new(1.0).unwrap();
        by.set_by(Some(4.0));
        let mut c = clip(Rc::new(by));
        c.set_additive(true);
        assert!(c.is_additive());
        assert_abs_diff_eq!(c.value(0.5, &10.0, &0.0).unwrap(), 12.0, epsilon = 1e-5);

        c.timing_mut().set_fill_behavior(FillBehavior::Stop);
        assert_eq!(c.value(5.0, &10.0, &0.0).unwrap(), 10.0);
    }

    #[test]
    fn clip_targets_fall_back_to_the_child() {
        let mut a = FromToByAnimation::<f32>::new(1.0).unwrap();
        a.set_target_property(Some("X"));
        let mut c = clip(Rc::new(a));
        assert_eq!(c.target_property(), Some("X"));
        c.set_target_property(Some("Y"));
        c.set_target_object(Some("box"));
        assert_eq!(c.target_property(), Some("Y"));
        assert_eq!(Timeline::target_object(&c), Some("box"));
    }
}
