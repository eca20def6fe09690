use std::cell::Cell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use lilt_animation_core::{
    AnimatableObject, AnimatableProperty, AnimatableValue, AnimationClip, AnimationError,
    AnimationManager, AnimationTarget, Config, DelegateAnimatableProperty, FromToByAnimation,
    LoopBehavior, ObjectRegistry, PropertyRef, TimelineGroup,
};

struct Sprite {
    name: String,
    x: Rc<AnimatableValue<f32>>,
    tint: Rc<AnimatableValue<[f32; 3]>>,
}

impl Sprite {
    fn new(name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            x: Rc::new(AnimatableValue::new(0.0)),
            tint: Rc::new(AnimatableValue::new([1.0, 1.0, 1.0])),
        })
    }
}

impl AnimatableObject for Sprite {
    fn name(&self) -> &str {
        &self.name
    }

    fn property(&self, name: &str) -> Option<PropertyRef> {
        match name {
            "x" => Some(PropertyRef::new(self.x.clone())),
            "tint" => Some(PropertyRef::new(self.tint.clone())),
            _ => None,
        }
    }
}

fn move_x(to: f32) -> FromToByAnimation<f32> {
    let mut a = FromToByAnimation::new(1.0).unwrap();
    a.set_to(Some(to));
    a.set_target_property(Some("x"));
    a
}

fn fade_tint(to: [f32; 3]) -> FromToByAnimation<[f32; 3]> {
    let mut a = FromToByAnimation::new(1.0).unwrap();
    a.set_to(Some(to));
    a.set_target_property(Some("tint"));
    a
}

#[test]
fn object_target_resolves_every_leaf() {
    let m = AnimationManager::default();
    let hero = Sprite::new("hero");

    let mut group = TimelineGroup::new();
    group.push(Rc::new(move_x(8.0)));
    group.push(Rc::new(fade_tint([0.0, 0.5, 1.0])));
    let target: Rc<dyn AnimatableObject> = hero.clone();
    m.start_animation(Rc::new(group), target).unwrap();

    m.update_and_apply(0.5).unwrap();
    assert_abs_diff_eq!(hero.x.value(), 4.0, epsilon = 1e-6);
    assert_abs_diff_eq!(hero.tint.value()[0], 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(hero.tint.value()[1], 0.75, epsilon = 1e-6);
    assert_abs_diff_eq!(hero.tint.value()[2], 1.0, epsilon = 1e-6);
}

#[test]
fn objects_target_selects_by_name() {
    let m = AnimationManager::default();
    let a = Sprite::new("a");
    let b = Sprite::new("b");

    let mut to_b = move_x(2.0);
    to_b.set_target_object(Some("b"));
    let mut group = TimelineGroup::new();
    group.push(Rc::new(move_x(1.0)));
    group.push(Rc::new(to_b));

    let objects: Vec<Rc<dyn AnimatableObject>> = vec![a.clone(), b.clone()];
    m.start_animation(Rc::new(group), objects).unwrap();
    m.update_and_apply(1.0).unwrap();
    assert_eq!(a.x.value(), 1.0);
    assert_eq!(b.x.value(), 2.0);
}

#[test]
fn resolver_inherits_group_target_objects() {
    let hero = Sprite::new("hero");
    let extra = Sprite::new("extra");
    let mut registry = ObjectRegistry::new();
    registry.insert(hero.clone());
    registry.insert(extra.clone());
    let m = AnimationManager::with_resolver(Config::default(), Rc::new(registry));

    let mut group = TimelineGroup::new();
    group.set_target_object(Some("extra"));
    group.push(Rc::new(move_x(6.0)));
    m.start_animation(Rc::new(group), AnimationTarget::Resolver)
        .unwrap();
    m.update_and_apply(1.0).unwrap();
    assert_eq!(extra.x.value(), 6.0);
    assert_eq!(hero.x.value(), 0.0);
}

#[test]
fn unresolved_targets_are_a_no_op() {
    let m = AnimationManager::with_resolver(Config::default(), Rc::new(ObjectRegistry::new()));
    let mut a = move_x(1.0);
    a.set_target_property(Some("missing"));
    let ctrl = m.start_animation(Rc::new(a), AnimationTarget::Resolver).unwrap();
    m.update_and_apply(0.5).unwrap();
    assert_eq!(m.active_count(), 1);
    ctrl.stop(None).unwrap();

    // No resolver at all behaves the same.
    let bare = AnimationManager::default();
    bare.start_animation(Rc::new(move_x(1.0)), AnimationTarget::Resolver)
        .unwrap();
    bare.update_and_apply(0.5).unwrap();
}

#[test]
fn mismatched_value_types_stay_unbound() {
    let m = AnimationManager::default();
    let p = Rc::new(AnimatableValue::new(1.0f64));
    let r = PropertyRef::new(p.clone());
    m.start_animation(Rc::new(move_x(5.0)), r.clone()).unwrap();
    m.update_and_apply(1.0).unwrap();
    assert!(!m.is_animated(&r));
    assert_eq!(p.value(), 1.0);
}

#[test]
fn delegate_property_round_trips_through_its_setter() {
    let store = Rc::new(Cell::new(3.0f32));
    let (get, set) = (store.clone(), store.clone());
    let p = Rc::new(DelegateAnimatableProperty::from_fns(
        move || get.get(),
        move |v| set.set(v),
    ));
    let r = PropertyRef::new(p.clone());

    let m = AnimationManager::default();
    m.start_animation(Rc::new(move_x(10.0)), r.clone()).unwrap();
    m.update_and_apply(0.5).unwrap();
    assert_abs_diff_eq!(store.get(), 6.5, epsilon = 1e-6);
    assert!(p.is_animated());

    m.stop_animations(&r).unwrap();
    assert!(!p.is_animated());
    assert_eq!(store.get(), 3.0);
}

#[test]
fn delegate_without_accessors_is_tolerated() {
    let p = Rc::new(DelegateAnimatableProperty::<f32>::new(None, None));
    let r = PropertyRef::new(p.clone());
    assert!(matches!(
        r.base_value_any(),
        Err(lilt_animation_core::PropertyError::NotImplemented)
    ));

    let m = AnimationManager::default();
    m.start_animation(Rc::new(move_x(10.0)), r.clone()).unwrap();
    m.update_and_apply(0.5).unwrap();
    assert!(p.is_animated());
    assert_eq!(p.animation_value(), 0.0);
}

fn broken_clip() -> AnimationClip<f32> {
    let mut clip = AnimationClip::new(Rc::new(move_x(1.0)));
    let timing = clip.timing_mut();
    timing.set_clip_start(Some(1.0)).unwrap();
    timing.set_clip_end(Some(0.5)).unwrap();
    timing.set_loop_behavior(LoopBehavior::Cycle);
    clip
}

#[test]
fn failing_chain_does_not_stop_the_others() {
    let m = AnimationManager::default();
    let bad = Rc::new(AnimatableValue::new(0.0f32));
    let good = Rc::new(AnimatableValue::new(0.0f32));

    m.start_animation(Rc::new(broken_clip()), PropertyRef::new(bad.clone()))
        .unwrap();
    m.start_animation(Rc::new(move_x(4.0)), PropertyRef::new(good.clone()))
        .unwrap();

    let err = m.update_and_apply(0.5).unwrap_err();
    assert!(matches!(err, AnimationError::InvalidAnimation(_)));
    assert_eq!(good.value(), 2.0);
}

#[test]
fn strict_config_aborts_the_pass() {
    let cfg = Config {
        isolate_errors: false,
        ..Config::default()
    };
    let m = AnimationManager::new(cfg);
    let bad = Rc::new(AnimatableValue::new(0.0f32));
    let good = Rc::new(AnimatableValue::new(0.0f32));

    m.start_animation(Rc::new(broken_clip()), PropertyRef::new(bad.clone()))
        .unwrap();
    m.start_animation(Rc::new(move_x(4.0)), PropertyRef::new(good.clone()))
        .unwrap();

    assert!(m.update_and_apply(0.5).is_err());
    assert!(!good.is_animated());
    assert_eq!(good.value(), 0.0);
}
