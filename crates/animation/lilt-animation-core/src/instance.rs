//! Runtime instance trees.
//!
//! `Timeline::create_instance` builds one [`AnimationInstance`] per timeline
//! node, mirroring the static graph. Instances own the mutable per-node state
//! (time, weight, bound property) so a single timeline can be played by many
//! instances at once.

use std::any::Any;
use std::fmt;
use std::ops::Index;
use std::rc::Rc;

use lilt_api_core::{Interpolatable, PropertyRef};

use crate::blend::BlendGroup;
use crate::composition::{Composition, PropertyChain};
use crate::error::{check_non_negative, AnimationError};
use crate::timeline::{Animation, AnimationState, Timeline};
use crate::Result;

/// Type-erased view of a leaf animation.
pub(crate) trait LeafAnimation: fmt::Debug {
    fn target_property(&self) -> Option<&str>;

    /// True when the property's value type matches the animation's.
    fn accepts(&self, property: &PropertyRef) -> bool;

    fn value_type_name(&self) -> &'static str;

    /// A fresh composition chain for `property`, typed like this animation.
    fn create_chain(&self, property: PropertyRef) -> Option<Box<dyn Composition>>;

    fn as_any(&self) -> &dyn Any;
}

pub(crate) struct AnimationLeaf<T: Interpolatable> {
    pub(crate) animation: Rc<dyn Animation<T>>,
}

impl<T: Interpolatable> fmt::Debug for AnimationLeaf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.animation, f)
    }
}

impl<T: Interpolatable> LeafAnimation for AnimationLeaf<T> {
    fn target_property(&self) -> Option<&str> {
        self.animation.target_property()
    }

    fn accepts(&self, property: &PropertyRef) -> bool {
        property.is::<T>()
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn create_chain(&self, property: PropertyRef) -> Option<Box<dyn Composition>> {
        let chain = PropertyChain::<T>::new(property)?;
        Some(Box::new(chain))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) enum NodeKind {
    Leaf(Box<dyn LeafAnimation>),
    Group,
    Blend(Rc<BlendGroup>),
}

/// Ordered child instances. Leaves carry a read-only empty collection.
#[derive(Debug)]
pub struct InstanceCollection {
    items: Vec<AnimationInstance>,
    read_only: bool,
}

impl InstanceCollection {
    pub(crate) fn new(items: Vec<AnimationInstance>) -> Self {
        Self {
            items,
            read_only: false,
        }
    }

    /// The empty collection held by leaf instances.
    pub fn read_only() -> Self {
        Self {
            items: Vec::new(),
            read_only: true,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AnimationInstance> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut AnimationInstance> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnimationInstance> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, AnimationInstance> {
        self.items.iter_mut()
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(AnimationError::invalid_operation(
                "instance collection is read-only",
            ));
        }
        Ok(())
    }

    pub fn push(&mut self, instance: AnimationInstance) -> Result<()> {
        self.check_writable()?;
        self.items.push(instance);
        Ok(())
    }

    /// Replace the instance at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, instance: AnimationInstance) -> Result<AnimationInstance> {
        self.check_writable()?;
        let len = self.items.len();
        let slot = self.items.get_mut(index).ok_or_else(|| {
            AnimationError::out_of_range("index", format!("{index} is out of bounds for {len} instances"))
        })?;
        Ok(std::mem::replace(slot, instance))
    }
}

impl Index<usize> for InstanceCollection {
    type Output = AnimationInstance;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a InstanceCollection {
    type Item = &'a AnimationInstance;
    type IntoIter = std::slice::Iter<'a, AnimationInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// One node of a runtime tree.
pub struct AnimationInstance {
    pub(crate) timeline: Rc<dyn Timeline>,
    pub(crate) kind: NodeKind,
    pub(crate) children: InstanceCollection,
    pub(crate) time: Option<f32>,
    pub(crate) weight: f32,
    pub(crate) property: Option<PropertyRef>,
}

impl AnimationInstance {
    fn with_kind(timeline: Rc<dyn Timeline>, kind: NodeKind, children: InstanceCollection) -> Self {
        Self {
            timeline,
            kind,
            children,
            time: None,
            weight: 1.0,
            property: None,
        }
    }

    /// A leaf producing values of type `T`. `timeline` must be the same object
    /// as `animation`.
    pub fn leaf<T: Interpolatable>(
        animation: Rc<dyn Animation<T>>,
        timeline: Rc<dyn Timeline>,
    ) -> Self {
        Self::with_kind(
            timeline,
            NodeKind::Leaf(Box::new(AnimationLeaf { animation })),
            InstanceCollection::read_only(),
        )
    }

    /// A node whose children are evaluated in order, each on top of the last.
    pub fn group(timeline: Rc<dyn Timeline>, children: Vec<AnimationInstance>) -> Self {
        Self::with_kind(timeline, NodeKind::Group, InstanceCollection::new(children))
    }

    pub fn blend(blend: Rc<BlendGroup>, children: Vec<AnimationInstance>) -> Self {
        let timeline: Rc<dyn Timeline> = blend.clone();
        Self::with_kind(timeline, NodeKind::Blend(blend), InstanceCollection::new(children))
    }

    pub fn timeline(&self) -> &Rc<dyn Timeline> {
        &self.timeline
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn children(&self) -> &InstanceCollection {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut InstanceCollection {
        &mut self.children
    }

    /// Time measured from this node's origin; `None` while the parent is
    /// inactive or the tree has not started.
    pub fn time(&self) -> Option<f32> {
        self.time
    }

    /// Set this node's time and propagate the mapped times to its children.
    pub fn set_time(&mut self, time: Option<f32>) {
        self.time = time;
        let local = time.and_then(|t| self.timeline.animation_time(t));
        for (i, child) in self.children.items.iter_mut().enumerate() {
            child.set_time(local.map(|t| self.timeline.child_time(i, t)));
        }
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Blend factor between the incoming value (0) and this node's output (1).
    pub fn set_weight(&mut self, weight: f32) -> Result<()> {
        self.weight = check_non_negative("weight", weight)?;
        Ok(())
    }

    pub fn state(&self) -> AnimationState {
        match self.time {
            Some(t) => self.timeline.state(t),
            None => AnimationState::Stopped,
        }
    }

    /// Property a leaf is bound to.
    pub fn property(&self) -> Option<&PropertyRef> {
        self.property.as_ref()
    }

    /// Bind leaves by name, inheriting target objects down the tree.
    pub(crate) fn bind_by_name(
        &mut self,
        inherited_object: Option<&str>,
        resolve: &mut dyn FnMut(Option<&str>, &str) -> Option<PropertyRef>,
    ) {
        let timeline = self.timeline.clone();
        let object = timeline.target_object().or(inherited_object);
        match &self.kind {
            NodeKind::Leaf(leaf) => {
                let Some(name) = leaf.target_property() else {
                    log::debug!("leaf {:?} has no target property; left unbound", timeline);
                    return;
                };
                let Some(property) = resolve(object, name) else {
                    log::warn!(
                        "target property {}.{} did not resolve; animation has no effect",
                        object.unwrap_or("<default>"),
                        name
                    );
                    return;
                };
                self.property = checked_binding(leaf.as_ref(), property);
            }
            NodeKind::Group | NodeKind::Blend(_) => {
                for child in self.children.items.iter_mut() {
                    child.bind_by_name(object, resolve);
                }
            }
        }
    }

    /// Bind every leaf to `property`, ignoring target names.
    pub(crate) fn bind_all(&mut self, property: &PropertyRef) {
        match &self.kind {
            NodeKind::Leaf(leaf) => {
                self.property = checked_binding(leaf.as_ref(), property.clone());
            }
            NodeKind::Group | NodeKind::Blend(_) => {
                for child in self.children.items.iter_mut() {
                    child.bind_all(property);
                }
            }
        }
    }

    /// Each distinct bound property with one leaf that animates it.
    pub(crate) fn bound_leaves<'a>(&'a self, out: &mut Vec<(&'a PropertyRef, &'a dyn LeafAnimation)>) {
        match &self.kind {
            NodeKind::Leaf(leaf) => {
                if let Some(p) = &self.property {
                    if !out.iter().any(|(q, _)| *q == p) {
                        out.push((p, leaf.as_ref()));
                    }
                }
            }
            NodeKind::Group | NodeKind::Blend(_) => {
                for child in self.children.iter() {
                    child.bound_leaves(out);
                }
            }
        }
    }

    /// True when any leaf in this tree is bound to `property`.
    pub fn drives(&self, property: &PropertyRef) -> bool {
        match &self.kind {
            NodeKind::Leaf(_) => self.property.as_ref() == Some(property),
            NodeKind::Group | NodeKind::Blend(_) => {
                self.children.iter().any(|c| c.drives(property))
            }
        }
    }
}

fn checked_binding(leaf: &dyn LeafAnimation, property: PropertyRef) -> Option<PropertyRef> {
    if leaf.accepts(&property) {
        Some(property)
    } else {
        log::warn!(
            "animation of {} cannot drive a property of {}; left unbound",
            leaf.value_type_name(),
            property.value_type_name()
        );
        None
    }
}

impl fmt::Debug for AnimationInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            NodeKind::Leaf(_) => "leaf",
            NodeKind::Group => "group",
            NodeKind::Blend(_) => "blend",
        };
        f.debug_struct("AnimationInstance")
            .field("kind", &kind)
            .field("timeline", &self.timeline)
            .field("time", &self.time)
            .field("weight", &self.weight)
            .field("property", &self.property)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{AnimationClip, TimelineClip};
    use crate::from_to_by::FromToByAnimation;
    use crate::group::TimelineGroup;
    use lilt_api_core::AnimatableValue;

    fn named_leaf(property: &str, duration: f32) -> Rc<FromToByAnimation<f32>> {
        let mut a = FromToByAnimation::new(duration).unwrap();
        a.set_target_property(Some(property));
        Rc::new(a)
    }

    #[test]
    fn tree_mirrors_the_timeline_graph() {
        let mut inner = BlendGroup::new();
        inner.push(named_leaf("X", 1.0));
        inner.push(named_leaf("Y", 1.0));
        let mut root = TimelineGroup::new();
        root.push(Rc::new(inner));
        root.push(named_leaf("Z", 2.0));

        let inst = Rc::new(root).create_instance();
        assert!(!inst.is_leaf());
        assert_eq!(inst.children().len(), 2);
        assert_eq!(inst.children()[0].children().len(), 2);
        assert!(inst.children()[1].is_leaf());
        assert!(inst.children()[1].children().is_read_only());
        assert_eq!(inst.weight(), 1.0);
        assert_eq!(inst.state(), AnimationState::Stopped);
    }

    #[test]
    fn leaf_collection_rejects_mutation() {
        let mut inst = named_leaf("X", 1.0).create_instance();
        let other = named_leaf("Y", 1.0).create_instance();
        let err = inst.children_mut().push(other).unwrap_err();
        assert!(matches!(err, AnimationError::InvalidOperation(_)));
        let other = named_leaf("Y", 1.0).create_instance();
        assert!(matches!(
            inst.children_mut().set(0, other),
            Err(AnimationError::InvalidOperation(_))
        ));
    }

    #[test]
    fn group_collection_accepts_mutation() {
        let mut inst = Rc::new(TimelineGroup::new()).create_instance();
        inst.children_mut()
            .push(named_leaf("X", 1.0).create_instance())
            .unwrap();
        let old = inst
            .children_mut()
            .set(0, named_leaf("Y", 1.0).create_instance())
            .unwrap();
        assert!(old.is_leaf());
        assert!(inst.children_mut().set(3, named_leaf("Z", 1.0).create_instance()).is_err());
    }

    #[test]
    fn time_propagates_through_clips_and_groups() {
        let child: Rc<dyn Animation<f32>> = named_leaf("X", 4.0);
        let mut clip = AnimationClip::new(child);
        clip.timing_mut().set_delay(1.0).unwrap();
        let mut group = TimelineGroup::new();
        group.push(Rc::new(clip));
        let mut outer = TimelineClip::new(Rc::new(group));
        outer.timing_mut().set_speed(2.0).unwrap();

        let mut inst = Rc::new(outer).create_instance();
        inst.set_time(Some(1.0));
        let group_inst = &inst.children()[0];
        assert_eq!(group_inst.time(), Some(2.0));
        assert_eq!(group_inst.children()[0].time(), Some(2.0));
        assert_eq!(group_inst.children()[0].state(), AnimationState::Playing);

        inst.set_time(None);
        assert_eq!(inst.children()[0].children()[0].time(), None);
    }

    #[test]
    fn binding_inherits_target_objects_and_checks_types() {
        let mut group = TimelineGroup::new();
        group.set_target_object(Some("box"));
        group.push(named_leaf("X", 1.0));
        group.push(named_leaf("Missing", 1.0));
        let mut inst = Rc::new(group).create_instance();

        let x = PropertyRef::new(Rc::new(AnimatableValue::new(0.0f32)));
        let wrong = PropertyRef::new(Rc::new(AnimatableValue::new([0.0f32; 2])));
        let mut seen = Vec::new();
        let mut resolve = |object: Option<&str>, name: &str| {
            seen.push((object.map(str::to_string), name.to_string()));
            (name == "X").then(|| x.clone())
        };
        inst.bind_by_name(None, &mut resolve);
        assert_eq!(seen[0], (Some("box".to_string()), "X".to_string()));
        assert_eq!(inst.children()[0].property(), Some(&x));
        assert_eq!(inst.children()[1].property(), None);

        inst.bind_all(&wrong);
        assert_eq!(inst.children()[0].property(), None);
        inst.bind_all(&x);
        assert!(inst.drives(&x));

        let mut leaves = Vec::new();
        inst.bound_leaves(&mut leaves);
        assert_eq!(leaves.len(), 1);
    }

    #[test]
    fn weights_are_validated() {
        let mut inst = named_leaf("X", 1.0).create_instance();
        assert!(inst.set_weight(-0.5).is_err());
        assert!(inst.set_weight(f32::NAN).is_err());
        inst.set_weight(0.25).unwrap();
        assert_eq!(inst.weight(), 0.25);
    }
}
