//! AnimationManager: owns running instance trees and writes their values.
//!
//! Per frame:
//! - `update(dt)` advances every unpaused root clock by `dt * speed` and
//!   steps fade ramps. No property is touched.
//! - `apply_animations()` folds every property chain and writes the result,
//!   then prunes roots whose state is `Stopped`.
//!
//! Controllers hold a weak reference to the manager state; once the manager is
//! dropped every controller reports `Stopped` and its operations fail with
//! `InvalidOperation`.

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use lilt_api_core::{AnimatableObject, PropertyRef, PropertyResolver};

use crate::composition::{Composition, RootLookup};
use crate::config::Config;
use crate::controller::AnimationController;
use crate::error::{check_non_negative, AnimationError};
use crate::ids::{IdAllocator, InstanceId};
use crate::instance::AnimationInstance;
use crate::timeline::{AnimationState, Timeline};
use crate::transition::AnimationTransition;
use crate::Result;

/// What an animation's target names resolve against.
#[derive(Clone)]
pub enum AnimationTarget {
    /// The manager's [`PropertyResolver`].
    Resolver,
    /// One object; every target property name is looked up on it.
    Object(Rc<dyn AnimatableObject>),
    /// Several objects, selected by target object name. Unnamed targets use
    /// the first object.
    Objects(Vec<Rc<dyn AnimatableObject>>),
    /// One property; every leaf drives it regardless of names.
    Property(PropertyRef),
}

impl From<PropertyRef> for AnimationTarget {
    fn from(p: PropertyRef) -> Self {
        Self::Property(p)
    }
}

impl From<Rc<dyn AnimatableObject>> for AnimationTarget {
    fn from(o: Rc<dyn AnimatableObject>) -> Self {
        Self::Object(o)
    }
}

impl From<Vec<Rc<dyn AnimatableObject>>> for AnimationTarget {
    fn from(objects: Vec<Rc<dyn AnimatableObject>>) -> Self {
        Self::Objects(objects)
    }
}

impl fmt::Debug for AnimationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolver => f.write_str("Resolver"),
            Self::Object(o) => f.debug_tuple("Object").field(&o.name()).finish(),
            Self::Objects(os) => f
                .debug_tuple("Objects")
                .field(&os.iter().map(|o| o.name()).collect::<Vec<_>>())
                .finish(),
            Self::Property(p) => f.debug_tuple("Property").field(p).finish(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FadeDirection {
    In,
    Out,
}

/// Linear weight ramp in manager time.
#[derive(Copy, Clone, Debug)]
struct Fade {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    direction: FadeDirection,
}

impl Fade {
    fn new(from: f32, to: f32, duration: f32, direction: FadeDirection) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: 0.0,
            direction,
        }
    }

    fn advance(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt).min(self.duration);
    }

    fn value(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * (self.elapsed / self.duration)
    }

    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// A started root instance.
pub(crate) struct ActiveRoot {
    pub(crate) id: InstanceId,
    pub(crate) instance: AnimationInstance,
    pub(crate) clock: f32,
    pub(crate) speed: f32,
    pub(crate) paused: bool,
    /// User weight; the effective instance weight also includes the fade.
    pub(crate) weight: f32,
    fade: Option<Fade>,
    /// Roots to drop from each property's chain once the fade-in completes.
    replaces: Vec<(PropertyRef, InstanceId)>,
}

impl ActiveRoot {
    pub(crate) fn sync_weight(&mut self) {
        let ramp = self.fade.map_or(1.0, |f| f.value());
        self.instance.weight = self.weight * ramp;
    }

    /// Instance state, reported as `Filling` while fading out.
    pub(crate) fn state(&self) -> AnimationState {
        let state = self.instance.state();
        match self.fade {
            Some(f) if f.direction == FadeDirection::Out && state != AnimationState::Stopped => {
                AnimationState::Filling
            }
            _ => state,
        }
    }

    pub(crate) fn seek(&mut self, time: f32) {
        self.clock = time;
        self.instance.set_time(Some(time));
    }
}

struct PendingRoot {
    id: InstanceId,
    instance: AnimationInstance,
    target: AnimationTarget,
}

struct RootTable<'a>(&'a [ActiveRoot]);

impl RootLookup for RootTable<'_> {
    fn root(&self, id: InstanceId) -> Option<&AnimationInstance> {
        self.0.iter().find(|r| r.id == id).map(|r| &r.instance)
    }
}

pub(crate) fn busy() -> AnimationError {
    AnimationError::invalid_operation("animation manager is already in use")
}

fn not_running(id: InstanceId) -> AnimationError {
    AnimationError::invalid_operation(format!("animation {} is not running", id.0))
}

pub(crate) struct ManagerState {
    cfg: Config,
    ids: IdAllocator,
    resolver: Option<Rc<dyn PropertyResolver>>,
    roots: Vec<ActiveRoot>,
    pending: Vec<PendingRoot>,
    chains: Vec<Box<dyn Composition>>,
}

impl ManagerState {
    fn new(cfg: Config, resolver: Option<Rc<dyn PropertyResolver>>) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(),
            resolver,
            roots: Vec::new(),
            pending: Vec::new(),
            chains: Vec::new(),
        }
    }

    fn create(&mut self, timeline: Rc<dyn Timeline>, target: AnimationTarget) -> InstanceId {
        let id = self.ids.alloc();
        let instance = timeline.create_instance();
        self.pending.push(PendingRoot {
            id,
            instance,
            target,
        });
        id
    }

    pub(crate) fn root(&self, id: InstanceId) -> Option<&ActiveRoot> {
        self.roots.iter().find(|r| r.id == id)
    }

    pub(crate) fn root_mut(&mut self, id: InstanceId) -> Result<&mut ActiveRoot> {
        self.roots
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_running(id))
    }

    fn bind(&self, instance: &mut AnimationInstance, target: &AnimationTarget) {
        match target {
            AnimationTarget::Resolver => match &self.resolver {
                Some(resolver) => instance.bind_by_name(None, &mut |o: Option<&str>, n: &str| {
                    resolver.resolve(o, n)
                }),
                None => log::warn!(
                    "no property resolver installed; {:?} is unbound",
                    instance.timeline()
                ),
            },
            AnimationTarget::Object(object) => {
                instance.bind_by_name(None, &mut |_: Option<&str>, n: &str| object.property(n))
            }
            AnimationTarget::Objects(objects) => {
                instance.bind_by_name(None, &mut |o: Option<&str>, n: &str| {
                    let object = match o {
                        Some(name) => objects.iter().find(|x| x.name() == name),
                        None => objects.first(),
                    }?;
                    object.property(n)
                })
            }
            AnimationTarget::Property(property) => instance.bind_all(property),
        }
    }

    pub(crate) fn start(&mut self, id: InstanceId, transition: AnimationTransition) -> Result<()> {
        if self.root(id).is_some() {
            return Err(AnimationError::invalid_operation(format!(
                "animation {} has already been started",
                id.0
            )));
        }
        let idx = self
            .pending
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| {
                AnimationError::invalid_operation(format!(
                    "animation {} was stopped and cannot be restarted",
                    id.0
                ))
            })?;
        let PendingRoot {
            id,
            mut instance,
            target,
        } = self.pending.remove(idx);
        self.bind(&mut instance, &target);
        instance.set_time(Some(0.0));

        let fade_in = transition.fade_in();
        let mut replaces = Vec::new();
        let mut detached = Vec::new();

        let mut leaves = Vec::new();
        instance.bound_leaves(&mut leaves);
        for (property, leaf) in leaves {
            let chain = match self.chains.iter().position(|c| c.property() == property) {
                Some(i) => &mut self.chains[i],
                None => match leaf.create_chain(property.clone()) {
                    Some(chain) => {
                        self.chains.push(chain);
                        let last = self.chains.len() - 1;
                        &mut self.chains[last]
                    }
                    None => continue,
                },
            };
            match transition {
                AnimationTransition::Replace { previous, .. } => {
                    let targets: Vec<InstanceId> = match previous {
                        None => chain.roots(),
                        Some(p) => chain.contains(p).then_some(p).into_iter().collect(),
                    };
                    chain.push(id);
                    if fade_in > 0.0 {
                        replaces.extend(targets.into_iter().map(|t| (property.clone(), t)));
                    } else {
                        for t in targets {
                            chain.remove(t);
                            detached.push(t);
                        }
                    }
                }
                AnimationTransition::SnapshotAndReplace { .. } => {
                    detached.extend(chain.snapshot_and_replace(id));
                }
                AnimationTransition::Compose { after, .. } => match after {
                    Some(after) => chain.insert_after(after, id),
                    None => chain.push(id),
                },
            }
        }

        let fade = (fade_in > 0.0).then(|| Fade::new(0.0, 1.0, fade_in, FadeDirection::In));
        let mut root = ActiveRoot {
            id,
            instance,
            clock: 0.0,
            speed: 1.0,
            paused: false,
            weight: 1.0,
            fade,
            replaces,
        };
        root.sync_weight();
        log::debug!("started animation {} with {:?}", id.0, transition);
        self.roots.push(root);
        self.detach_orphans(&detached);
        Ok(())
    }

    pub(crate) fn stop(&mut self, id: InstanceId, fade_out: Option<f32>) -> Result<()> {
        let fade_out = match fade_out {
            Some(d) => check_non_negative("fade_out", d)?,
            None => 0.0,
        };
        if let Some(i) = self.pending.iter().position(|p| p.id == id) {
            self.pending.remove(i);
            return Ok(());
        }
        let root = self.root_mut(id)?;
        if fade_out > 0.0 {
            let current = root.fade.map_or(1.0, |f| f.value());
            root.fade = Some(Fade::new(current, 0.0, fade_out, FadeDirection::Out));
            root.replaces.clear();
            log::debug!("fading out animation {} over {fade_out}s", id.0);
        } else {
            self.remove_root(id);
        }
        Ok(())
    }

    /// Remove a root from the manager and from every chain.
    fn remove_root(&mut self, id: InstanceId) {
        self.roots.retain(|r| r.id != id);
        for chain in self.chains.iter_mut() {
            chain.remove(id);
        }
        self.release_empty_chains();
        log::debug!("removed animation {}", id.0);
    }

    fn release_empty_chains(&mut self) {
        self.chains.retain(|c| {
            if c.is_empty() {
                c.release();
                false
            } else {
                true
            }
        });
    }

    /// Drop replaced roots that no longer drive any property.
    fn detach_orphans(&mut self, ids: &[InstanceId]) {
        for &id in ids {
            if !self.chains.iter().any(|c| c.contains(id)) && self.root(id).is_some() {
                log::debug!("animation {} was replaced", id.0);
                self.remove_root(id);
            }
        }
    }

    fn complete_fade_in(&mut self, id: InstanceId) {
        let Ok(root) = self.root_mut(id) else {
            return;
        };
        root.fade = None;
        root.sync_weight();
        let replaces = std::mem::take(&mut root.replaces);
        let mut detached = Vec::with_capacity(replaces.len());
        for (property, old) in replaces {
            if let Some(chain) = self.chains.iter_mut().find(|c| *c.property() == property) {
                chain.remove(old);
            }
            detached.push(old);
        }
        self.detach_orphans(&detached);
    }

    pub(crate) fn update(&mut self, dt: f32) -> Result<()> {
        check_non_negative("dt", dt)?;

        let eps = self.cfg.weight_epsilon;
        let mut faded_in = Vec::new();
        let mut faded_out = Vec::new();
        for root in self.roots.iter_mut() {
            if !root.paused {
                let clock = root.clock + dt * root.speed;
                root.seek(clock);
            }
            if let Some(fade) = root.fade.as_mut() {
                fade.advance(dt);
                match fade.direction {
                    FadeDirection::In if fade.is_done() => faded_in.push(root.id),
                    FadeDirection::Out if fade.is_done() || fade.value() <= eps => {
                        faded_out.push(root.id)
                    }
                    _ => {}
                }
            }
            root.sync_weight();
        }
        for id in faded_in {
            self.complete_fade_in(id);
        }
        for id in faded_out {
            self.remove_root(id);
        }
        Ok(())
    }

    pub(crate) fn apply_all(&mut self) -> Result<()> {
        let mut first_err = None;
        let table = RootTable(&self.roots);
        for chain in self.chains.iter() {
            if let Err(err) = chain.apply(&table) {
                log::error!(
                    "animating {:?} failed ({}): {err}",
                    chain.property(),
                    err.category()
                );
                if !self.cfg.isolate_errors {
                    return Err(err);
                }
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        if self.cfg.prune_completed {
            self.prune_completed();
        } else {
            self.release_completed();
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Recompute only the chains `id` participates in.
    pub(crate) fn apply_root(&mut self, id: InstanceId) -> Result<()> {
        if self.root(id).is_none() {
            return Err(not_running(id));
        }
        let table = RootTable(&self.roots);
        for chain in self.chains.iter().filter(|c| c.contains(id)) {
            chain.apply(&table)?;
        }
        Ok(())
    }

    fn completed(&self) -> Vec<InstanceId> {
        self.roots
            .iter()
            .filter(|r| r.instance.state() == AnimationState::Stopped)
            .map(|r| r.id)
            .collect()
    }

    fn prune_completed(&mut self) {
        for id in self.completed() {
            log::debug!("animation {} completed", id.0);
            self.remove_root(id);
        }
    }

    /// Keep completed roots but hand their properties back.
    fn release_completed(&mut self) {
        let done = self.completed();
        if done.is_empty() {
            return;
        }
        for chain in self.chains.iter_mut() {
            for &id in &done {
                chain.remove(id);
            }
        }
        self.release_empty_chains();
    }

    fn stop_property(&mut self, property: &PropertyRef) {
        let Some(i) = self.chains.iter().position(|c| c.property() == property) else {
            return;
        };
        let chain = self.chains.remove(i);
        let roots = chain.roots();
        chain.release();
        self.detach_orphans(&roots);
    }

    fn stop_all(&mut self) {
        self.roots.clear();
        self.pending.clear();
        for chain in self.chains.drain(..) {
            chain.release();
        }
    }
}

/// Top-level scheduler. Single-threaded: all work happens inside explicit
/// calls from the host's frame loop.
pub struct AnimationManager {
    state: Rc<RefCell<ManagerState>>,
}

impl Default for AnimationManager {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl AnimationManager {
    pub fn new(cfg: Config) -> Self {
        Self {
            state: Rc::new(RefCell::new(ManagerState::new(cfg, None))),
        }
    }

    /// A manager resolving [`AnimationTarget::Resolver`] targets through
    /// `resolver`.
    pub fn with_resolver(cfg: Config, resolver: Rc<dyn PropertyResolver>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ManagerState::new(cfg, Some(resolver)))),
        }
    }

    fn state_mut(&self) -> Result<RefMut<'_, ManagerState>> {
        self.state.try_borrow_mut().map_err(|_| busy())
    }

    pub fn set_resolver(&self, resolver: Option<Rc<dyn PropertyResolver>>) -> Result<()> {
        self.state_mut()?.resolver = resolver;
        Ok(())
    }

    pub fn config(&self) -> Config {
        self.state
            .try_borrow()
            .map(|s| s.cfg.clone())
            .unwrap_or_default()
    }

    /// Build a controller without starting it.
    pub fn create_controller(
        &self,
        timeline: Rc<dyn Timeline>,
        target: impl Into<AnimationTarget>,
    ) -> Result<AnimationController> {
        let id = self.state_mut()?.create(timeline, target.into());
        Ok(AnimationController::new(Rc::downgrade(&self.state), id))
    }

    /// Create and start an animation, replacing whatever drives the same
    /// properties.
    pub fn start_animation(
        &self,
        timeline: Rc<dyn Timeline>,
        target: impl Into<AnimationTarget>,
    ) -> Result<AnimationController> {
        let controller = self.create_controller(timeline, target)?;
        controller.start(AnimationTransition::replace())?;
        Ok(controller)
    }

    /// Advance every running root by `dt` seconds.
    pub fn update(&self, dt: f32) -> Result<()> {
        self.state_mut()?.update(dt)
    }

    /// Write the current value of every animated property. A failing property
    /// is logged and skipped (unless `isolate_errors` is off); the first
    /// failure is returned after the pass.
    pub fn apply_animations(&self) -> Result<()> {
        self.state_mut()?.apply_all()
    }

    pub fn update_and_apply(&self, dt: f32) -> Result<()> {
        let mut state = self.state_mut()?;
        state.update(dt)?;
        state.apply_all()
    }

    pub fn is_animated(&self, property: &PropertyRef) -> bool {
        self.state
            .try_borrow()
            .map(|s| s.chains.iter().any(|c| c.property() == property))
            .unwrap_or(false)
    }

    /// Stop every animation of `property` and restore its base value.
    /// Animations that drive other properties keep running there.
    pub fn stop_animations(&self, property: &PropertyRef) -> Result<()> {
        self.state_mut()?.stop_property(property);
        Ok(())
    }

    pub fn stop_all(&self) -> Result<()> {
        self.state_mut()?.stop_all();
        Ok(())
    }

    /// Number of started roots.
    pub fn active_count(&self) -> usize {
        self.state.try_borrow().map(|s| s.roots.len()).unwrap_or(0)
    }
}

impl Drop for AnimationManager {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.stop_all();
        }
    }
}

impl fmt::Debug for AnimationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("AnimationManager");
        if let Ok(s) = self.state.try_borrow() {
            d.field("config", &s.cfg)
                .field("active", &s.roots.len())
                .field("pending", &s.pending.len())
                .field("animated_properties", &s.chains.len());
        }
        d.finish()
    }
}
