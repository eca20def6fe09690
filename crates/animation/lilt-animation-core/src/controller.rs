//! Handle to one root instance owned by an [`AnimationManager`].
//!
//! [`AnimationManager`]: crate::manager::AnimationManager

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use crate::error::{check_non_negative, check_not_nan, AnimationError};
use crate::ids::InstanceId;
use crate::manager::{busy, ActiveRoot, ManagerState};
use crate::timeline::AnimationState;
use crate::transition::AnimationTransition;
use crate::Result;

/// Cheap, cloneable handle. Does not keep the manager alive.
#[derive(Clone)]
pub struct AnimationController {
    state: Weak<RefCell<ManagerState>>,
    id: InstanceId,
}

impl AnimationController {
    pub(crate) fn new(state: Weak<RefCell<ManagerState>>, id: InstanceId) -> Self {
        Self { state, id }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// False once the manager is dropped.
    pub fn is_valid(&self) -> bool {
        self.state.strong_count() > 0
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ManagerState) -> Result<R>) -> Result<R> {
        let state = self
            .state
            .upgrade()
            .ok_or_else(|| AnimationError::invalid_operation("animation manager was dropped"))?;
        let mut state = state.try_borrow_mut().map_err(|_| busy())?;
        f(&mut state)
    }

    fn with_root<R>(&self, f: impl FnOnce(&mut ActiveRoot) -> Result<R>) -> Result<R> {
        self.with_state(|s| f(s.root_mut(self.id)?))
    }

    /// Like `with_root`, but a completed animation cannot be revived.
    fn with_live_root<R>(&self, f: impl FnOnce(&mut ActiveRoot) -> Result<R>) -> Result<R> {
        self.with_root(|r| {
            if r.state() == AnimationState::Stopped {
                return Err(AnimationError::invalid_operation(format!(
                    "animation {} has stopped",
                    r.id.0
                )));
            }
            f(r)
        })
    }

    fn read_root<R>(&self, f: impl FnOnce(&ActiveRoot) -> R) -> Option<R> {
        let state = self.state.upgrade()?;
        let state = state.try_borrow().ok()?;
        state.root(self.id).map(f)
    }

    /// Start the animation. A controller starts at most once.
    pub fn start(&self, transition: AnimationTransition) -> Result<()> {
        self.with_state(|s| s.start(self.id, transition))
    }

    /// Stop now, or fade the weight to zero over `fade_out` seconds first.
    pub fn stop(&self, fade_out: Option<f32>) -> Result<()> {
        self.with_state(|s| s.stop(self.id, fade_out))
    }

    pub fn pause(&self) -> Result<()> {
        self.with_live_root(|r| {
            r.paused = true;
            Ok(())
        })
    }

    pub fn resume(&self) -> Result<()> {
        self.with_live_root(|r| {
            r.paused = false;
            Ok(())
        })
    }

    pub fn is_paused(&self) -> bool {
        self.read_root(|r| r.paused).unwrap_or(false)
    }

    /// `Stopped` before start, after stop, and once the manager is gone.
    pub fn state(&self) -> AnimationState {
        self.read_root(|r| r.state())
            .unwrap_or(AnimationState::Stopped)
    }

    /// Root clock in seconds, if running.
    pub fn time(&self) -> Option<f32> {
        self.read_root(|r| r.clock)
    }

    /// Seek the root clock. Negative times put the animation back into its
    /// delay.
    pub fn set_time(&self, time: f32) -> Result<()> {
        let time = check_not_nan("time", time)?;
        if time.is_infinite() {
            return Err(AnimationError::out_of_range("time", "must be finite"));
        }
        self.with_live_root(|r| {
            r.seek(time);
            Ok(())
        })
    }

    pub fn speed(&self) -> Option<f32> {
        self.read_root(|r| r.speed)
    }

    /// Clock multiplier; may be negative to run backwards.
    pub fn set_speed(&self, speed: f32) -> Result<()> {
        if !speed.is_finite() {
            return Err(AnimationError::out_of_range("speed", "must be finite"));
        }
        self.with_live_root(|r| {
            r.speed = speed;
            Ok(())
        })
    }

    pub fn weight(&self) -> Option<f32> {
        self.read_root(|r| r.weight)
    }

    pub fn set_weight(&self, weight: f32) -> Result<()> {
        let weight = check_non_negative("weight", weight)?;
        self.with_live_root(|r| {
            r.weight = weight;
            r.sync_weight();
            Ok(())
        })
    }

    /// Recompute and write only the properties this animation drives, at
    /// the current clock. Does not advance time.
    pub fn update_and_apply(&self) -> Result<()> {
        self.with_state(|s| s.apply_root(self.id))
    }
}

impl fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationController")
            .field("id", &self.id)
            .field("valid", &self.is_valid())
            .finish()
    }
}
