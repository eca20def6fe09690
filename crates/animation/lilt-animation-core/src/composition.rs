//! Composition of instance trees into property values.
//!
//! Each animated property owns a [`PropertyChain`]: the ordered list of root
//! instances driving it. A frame's value is folded through the chain starting
//! from the property's base value; every root sees the previous root's output
//! (or its snapshot) as its incoming value and the base value as its target.
//!
//! Within one tree:
//! - a group folds its children in order,
//! - a blend group averages its children by normalized weight, treating any
//!   missing weight share as the incoming value,
//! - every node then blends its output over the incoming value by its own
//!   instance weight.

use std::rc::Rc;

use lilt_api_core::{blend_weighted, AnimatableProperty, Interpolatable, PropertyRef, WeightedAverage};

use crate::error::AnimationError;
use crate::ids::InstanceId;
use crate::instance::{AnimationInstance, AnimationLeaf, NodeKind};
use crate::Result;

/// Evaluate `node` for `property`. `None` when nothing in the subtree is
/// bound to it or the subtree is inactive.
pub(crate) fn compose<T: Interpolatable>(
    node: &AnimationInstance,
    property: &PropertyRef,
    source: &T,
    target: &T,
) -> Result<Option<T>> {
    let Some(time) = node.time else {
        return Ok(None);
    };
    let value = match &node.kind {
        NodeKind::Leaf(leaf) => {
            if node.property.as_ref() != Some(property) {
                return Ok(None);
            }
            let Some(leaf) = leaf.as_any().downcast_ref::<AnimationLeaf<T>>() else {
                return Ok(None);
            };
            leaf.animation.value(time, source, target)?
        }
        NodeKind::Group => {
            node.timeline.check()?;
            let mut acc: Option<T> = None;
            for child in node.children.iter() {
                let incoming = acc.as_ref().unwrap_or(source);
                if let Some(v) = compose(child, property, incoming, target)? {
                    acc = Some(v);
                }
            }
            match acc {
                Some(v) => v,
                None => return Ok(None),
            }
        }
        NodeKind::Blend(blend) => {
            node.timeline.check()?;
            let mut avg = WeightedAverage::new();
            let mut contributed = false;
            for (i, child) in node.children.iter().enumerate() {
                let Some(v) = compose(child, property, source, target)? else {
                    continue;
                };
                let w = blend.normalized_weight(i).map_err(|_| {
                    AnimationError::invalid(format!("blend group has no weight for child {i}"))
                })?;
                contributed = true;
                avg.add(v, w);
            }
            if !contributed {
                return Ok(None);
            }
            let share = avg.total_weight().min(1.0);
            match avg.finish() {
                Some(v) => blend_weighted(source, v, share),
                None => source.clone(),
            }
        }
    };
    Ok(Some(blend_weighted(source, value, node.weight)))
}

/// Access to the manager's root instances by id.
pub(crate) trait RootLookup {
    fn root(&self, id: InstanceId) -> Option<&AnimationInstance>;
}

/// Type-erased per-property chain, as stored by the manager.
pub(crate) trait Composition {
    fn property(&self) -> &PropertyRef;

    fn is_empty(&self) -> bool;

    fn contains(&self, root: InstanceId) -> bool;

    fn roots(&self) -> Vec<InstanceId>;

    /// Append `root` on top of the chain.
    fn push(&mut self, root: InstanceId);

    /// Insert `root` right after `after`, or on top when `after` is absent.
    fn insert_after(&mut self, after: InstanceId, root: InstanceId);

    /// Freeze the currently visible value as `root`'s incoming value and drop
    /// every other root. Returns the dropped roots.
    fn snapshot_and_replace(&mut self, root: InstanceId) -> Vec<InstanceId>;

    fn remove(&mut self, root: InstanceId) -> bool;

    /// Compute and write the property's animation value.
    fn apply(&self, roots: &dyn RootLookup) -> Result<()>;

    /// Hand the property back to its base value.
    fn release(&self);
}

struct ChainEntry<T> {
    root: InstanceId,
    snapshot: Option<T>,
}

pub(crate) struct PropertyChain<T: Interpolatable> {
    key: PropertyRef,
    property: Rc<dyn AnimatableProperty<T>>,
    entries: Vec<ChainEntry<T>>,
    /// Value seen when the chain was created; stands in for the base value of
    /// properties without one and is restored on release.
    initial: T,
}

impl<T: Interpolatable> PropertyChain<T> {
    /// `None` when `key` does not hold a property of type `T`.
    pub(crate) fn new(key: PropertyRef) -> Option<Self> {
        let property = key.downcast::<T>()?;
        let initial = property
            .base_value()
            .unwrap_or_else(|_| property.animation_value());
        Some(Self {
            key,
            property,
            entries: Vec::new(),
            initial,
        })
    }

    fn base(&self) -> Result<T> {
        if self.property.has_base_value() {
            Ok(self.property.base_value()?)
        } else {
            Ok(self.initial.clone())
        }
    }

    fn visible(&self) -> Result<T> {
        if self.property.is_animated() {
            Ok(self.property.animation_value())
        } else {
            self.base()
        }
    }
}

impl<T: Interpolatable> Composition for PropertyChain<T> {
    fn property(&self) -> &PropertyRef {
        &self.key
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains(&self, root: InstanceId) -> bool {
        self.entries.iter().any(|e| e.root == root)
    }

    fn roots(&self) -> Vec<InstanceId> {
        self.entries.iter().map(|e| e.root).collect()
    }

    fn push(&mut self, root: InstanceId) {
        self.entries.push(ChainEntry {
            root,
            snapshot: None,
        });
    }

    fn insert_after(&mut self, after: InstanceId, root: InstanceId) {
        let entry = ChainEntry {
            root,
            snapshot: None,
        };
        match self.entries.iter().position(|e| e.root == after) {
            Some(i) => self.entries.insert(i + 1, entry),
            None => self.entries.push(entry),
        }
    }

    fn snapshot_and_replace(&mut self, root: InstanceId) -> Vec<InstanceId> {
        let snapshot = match self.visible() {
            Ok(v) => v,
            Err(err) => {
                log::warn!("could not snapshot {:?}: {err}", self.key);
                self.initial.clone()
            }
        };
        let dropped = self.roots();
        self.entries.clear();
        self.entries.push(ChainEntry {
            root,
            snapshot: Some(snapshot),
        });
        dropped
    }

    fn remove(&mut self, root: InstanceId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.root != root);
        self.entries.len() != before
    }

    fn apply(&self, roots: &dyn RootLookup) -> Result<()> {
        let base = self.base()?;
        let mut value = base.clone();
        for entry in &self.entries {
            let Some(root) = roots.root(entry.root) else {
                continue;
            };
            let source = entry.snapshot.clone().unwrap_or(value);
            value = compose(root, &self.key, &source, &base)?.unwrap_or(source);
        }
        self.property.set_animation_value(value);
        self.property.set_is_animated(true);
        Ok(())
    }

    fn release(&self) {
        self.property.set_is_animated(false);
        if !self.property.has_base_value() {
            self.property.set_animation_value(self.initial.clone());
        }
    }
}
