//! Parallel groups of timelines.

use std::rc::Rc;

use crate::error::AnimationError;
use crate::instance::AnimationInstance;
use crate::timeline::{span_state, AnimationState, FillBehavior, Timeline};
use crate::Result;

/// Identity of a shared timeline, ignoring vtables.
#[inline]
pub(crate) fn same_timeline(a: &Rc<dyn Timeline>, b: &Rc<dyn Timeline>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Children played in parallel, each timed from the group's origin.
#[derive(Debug, Default)]
pub struct TimelineGroup {
    children: Vec<Rc<dyn Timeline>>,
    fill_behavior: FillBehavior,
    target_object: Option<String>,
}

impl TimelineGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, child: Rc<dyn Timeline>) {
        self.children.push(child);
    }

    pub fn insert(&mut self, index: usize, child: Rc<dyn Timeline>) -> Result<()> {
        if index > self.children.len() {
            return Err(index_out_of_range(index, self.children.len()));
        }
        self.children.insert(index, child);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Rc<dyn Timeline>> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    pub fn index_of(&self, child: &Rc<dyn Timeline>) -> Option<usize> {
        self.children.iter().position(|c| same_timeline(c, child))
    }

    pub fn children(&self) -> &[Rc<dyn Timeline>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn set_fill_behavior(&mut self, fill: FillBehavior) {
        self.fill_behavior = fill;
    }

    pub fn set_target_object(&mut self, name: Option<&str>) {
        self.target_object = name.map(str::to_string);
    }

    /// Longest child duration; an empty group lasts zero.
    pub(crate) fn max_child_duration(&self) -> f32 {
        self.children
            .iter()
            .map(|c| c.total_duration())
            .fold(0.0, f32::max)
    }

    pub(crate) fn instantiate_children(&self) -> Vec<AnimationInstance> {
        self.children
            .iter()
            .map(|c| c.clone().create_instance())
            .collect()
    }
}

pub(crate) fn index_out_of_range(index: usize, len: usize) -> AnimationError {
    AnimationError::out_of_range("index", format!("{index} is out of bounds for {len} children"))
}

/// Group time runs unclamped; children apply their own fill.
pub(crate) fn group_time(state: AnimationState, time: f32) -> Option<f32> {
    state.is_active().then_some(time)
}

impl Timeline for TimelineGroup {
    fn target_object(&self) -> Option<&str> {
        self.target_object.as_deref()
    }

    fn fill_behavior(&self) -> FillBehavior {
        self.fill_behavior
    }

    fn total_duration(&self) -> f32 {
        self.max_child_duration()
    }

    fn state(&self, time: f32) -> AnimationState {
        span_state(time, self.total_duration(), self.fill_behavior)
    }

    fn animation_time(&self, time: f32) -> Option<f32> {
        group_time(self.state(time), time)
    }

    fn create_instance(self: Rc<Self>) -> AnimationInstance {
        let children = self.instantiate_children();
        AnimationInstance::group(self, children)
    }
}
