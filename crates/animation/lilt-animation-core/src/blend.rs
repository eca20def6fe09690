//! Weighted blending of parallel timelines.
//!
//! A [`BlendGroup`] evaluates its children side by side and combines their
//! values by normalized weight. Weights live behind a `RefCell` so they can be
//! tuned while instances of the group are playing; durations are recomputed on
//! every read, so weight changes take effect immediately.
//!
//! With duration synchronization enabled, every child is time-scaled to finish
//! at the weighted average of the children's durations:
//!
//! ```text
//! target = Σ wᵢ·dᵢ / Σ wᵢ        child time = t · dᵢ / target
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{check_non_negative, AnimationError};
use crate::group::{group_time, index_out_of_range, TimelineGroup};
use crate::instance::AnimationInstance;
use crate::timeline::{span_state, AnimationState, FillBehavior, Timeline, MAX_DURATION};
use crate::Result;

#[derive(Debug, Default)]
pub struct BlendGroup {
    group: TimelineGroup,
    weights: RefCell<Vec<f32>>,
    synchronized: Cell<bool>,
}

fn check_weight(weight: f32) -> Result<f32> {
    check_non_negative("weight", weight)
}

impl BlendGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child with the default weight of 1.
    pub fn push(&mut self, child: Rc<dyn Timeline>) {
        self.group.push(child);
        self.weights.get_mut().push(1.0);
    }

    pub fn push_weighted(&mut self, child: Rc<dyn Timeline>, weight: f32) -> Result<()> {
        let weight = check_weight(weight)?;
        self.group.push(child);
        self.weights.get_mut().push(weight);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Rc<dyn Timeline>> {
        let removed = self.group.remove(index)?;
        self.weights.get_mut().remove(index);
        Some(removed)
    }

    pub fn children(&self) -> &[Rc<dyn Timeline>] {
        self.group.children()
    }

    pub fn len(&self) -> usize {
        self.group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty()
    }

    pub fn set_fill_behavior(&mut self, fill: FillBehavior) {
        self.group.set_fill_behavior(fill);
    }

    pub fn set_target_object(&mut self, name: Option<&str>) {
        self.group.set_target_object(name);
    }

    pub fn weight(&self, index: usize) -> Result<f32> {
        let weights = self.weights.borrow();
        weights
            .get(index)
            .copied()
            .ok_or_else(|| index_out_of_range(index, weights.len()))
    }

    pub fn set_weight(&self, index: usize, weight: f32) -> Result<()> {
        let weight = check_weight(weight)?;
        let mut weights = self.weights.borrow_mut();
        let len = weights.len();
        let slot = weights
            .get_mut(index)
            .ok_or_else(|| index_out_of_range(index, len))?;
        *slot = weight;
        Ok(())
    }

    fn index_of(&self, child: &Rc<dyn Timeline>) -> Result<usize> {
        self.group
            .index_of(child)
            .ok_or_else(|| AnimationError::out_of_range("timeline", "not a child of this blend group"))
    }

    pub fn weight_of(&self, child: &Rc<dyn Timeline>) -> Result<f32> {
        self.weight(self.index_of(child)?)
    }

    pub fn set_weight_of(&self, child: &Rc<dyn Timeline>, weight: f32) -> Result<()> {
        self.set_weight(self.index_of(child)?, weight)
    }

    pub fn total_weight(&self) -> f32 {
        self.weights.borrow().iter().sum()
    }

    /// `weight / total`, or 0 when every weight is zero.
    pub fn normalized_weight(&self, index: usize) -> Result<f32> {
        let w = self.weight(index)?;
        let total = self.total_weight();
        if total > 0.0 {
            Ok(w / total)
        } else {
            Ok(0.0)
        }
    }

    /// Time-scale children so they all finish together.
    pub fn synchronize_durations(&self) {
        self.synchronized.set(true);
    }

    pub fn set_synchronized(&self, synchronized: bool) {
        self.synchronized.set(synchronized);
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronized.get()
    }

    /// Weighted average of child durations; falls back to the longest child
    /// when every weight is zero.
    fn synchronized_duration(&self) -> f32 {
        let weights = self.weights.borrow();
        let mut total_weight = 0.0f64;
        let mut weighted = 0.0f64;
        for (child, &w) in self.group.children().iter().zip(weights.iter()) {
            if w <= 0.0 {
                continue;
            }
            let d = child.total_duration();
            if d >= MAX_DURATION {
                return MAX_DURATION;
            }
            total_weight += f64::from(w);
            weighted += f64::from(w) * f64::from(d);
        }
        if total_weight > 0.0 {
            (weighted / total_weight) as f32
        } else {
            self.group.max_child_duration()
        }
    }
}

impl Timeline for BlendGroup {
    fn target_object(&self) -> Option<&str> {
        self.group.target_object()
    }

    fn fill_behavior(&self) -> FillBehavior {
        self.group.fill_behavior()
    }

    fn total_duration(&self) -> f32 {
        if self.synchronized.get() {
            self.synchronized_duration()
        } else {
            self.group.max_child_duration()
        }
    }

    fn state(&self, time: f32) -> AnimationState {
        span_state(time, self.total_duration(), self.fill_behavior())
    }

    fn animation_time(&self, time: f32) -> Option<f32> {
        group_time(self.state(time), time)
    }

    fn child_time(&self, index: usize, animation_time: f32) -> f32 {
        if !self.synchronized.get() {
            return animation_time;
        }
        let target = self.synchronized_duration();
        let Some(child) = self.group.children().get(index) else {
            return animation_time;
        };
        let d = child.total_duration();
        if target <= 0.0 || target >= MAX_DURATION || d >= MAX_DURATION {
            return animation_time;
        }
        animation_time * d / target
    }

    fn create_instance(self: Rc<Self>) -> AnimationInstance {
        let children = self.group.instantiate_children();
        AnimationInstance::blend(self, children)
    }
}
