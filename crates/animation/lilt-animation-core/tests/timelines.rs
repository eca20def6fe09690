use std::rc::Rc;

use approx::assert_abs_diff_eq;
use lilt_animation_core::{
    AnimatableValue, AnimationClip, AnimationManager, AnimationState, BlendGroup, EasingFunction,
    EasingMode, FillBehavior, FromToByAnimation, KeyFrame, KeyFrameAnimation, LoopBehavior,
    PropertyRef, QuadraticEase, Timeline, TimelineClip, TimelineGroup,
};

fn from_to(from: f32, to: f32, duration: f32) -> Rc<FromToByAnimation<f32>> {
    let mut a = FromToByAnimation::new(duration).unwrap();
    a.set_from(Some(from));
    a.set_to(Some(to));
    Rc::new(a)
}

fn property(base: f32) -> (Rc<AnimatableValue<f32>>, PropertyRef) {
    let p = Rc::new(AnimatableValue::new(base));
    let r = PropertyRef::new(p.clone());
    (p, r)
}

#[test]
fn delayed_double_speed_clip_under_the_manager() {
    let mut clip = AnimationClip::new(from_to(100.0, 200.0, 6.0));
    clip.timing_mut().set_delay(10.0).unwrap();
    clip.timing_mut().set_speed(2.0).unwrap();
    let clip = Rc::new(clip);
    assert_eq!(clip.total_duration(), 13.0);

    let m = AnimationManager::default();
    let (p, r) = property(0.0);
    let ctrl = m.start_animation(clip, r).unwrap();

    m.update_and_apply(5.0).unwrap();
    assert_eq!(ctrl.state(), AnimationState::Delayed);
    assert_eq!(p.value(), 0.0);

    m.update_and_apply(6.5).unwrap();
    assert_eq!(ctrl.state(), AnimationState::Playing);
    assert_abs_diff_eq!(p.value(), 150.0, epsilon = 1e-4);

    m.update_and_apply(2.0).unwrap();
    assert_eq!(ctrl.state(), AnimationState::Filling);
    assert_abs_diff_eq!(p.value(), 200.0, epsilon = 1e-4);
}

#[test]
fn fill_stop_reverts_and_prunes() {
    let mut clip = AnimationClip::new(from_to(100.0, 200.0, 6.0));
    clip.timing_mut().set_speed(2.0).unwrap();
    clip.timing_mut().set_fill_behavior(FillBehavior::Stop);

    let m = AnimationManager::default();
    let (p, r) = property(7.0);
    let ctrl = m.start_animation(Rc::new(clip), r.clone()).unwrap();
    m.update_and_apply(4.0).unwrap();
    assert_eq!(ctrl.state(), AnimationState::Stopped);
    assert_eq!(p.value(), 7.0);
    assert!(!m.is_animated(&r));
}

#[test]
fn blend_group_mixes_by_normalized_weight() {
    let blend = {
        let mut b = BlendGroup::new();
        b.push(from_to(10.0, 10.0, 1.0));
        b.push_weighted(from_to(20.0, 20.0, 1.0), 3.0).unwrap();
        Rc::new(b)
    };
    let m = AnimationManager::default();
    let (p, r) = property(1.0);
    m.start_animation(blend.clone(), r).unwrap();

    m.update_and_apply(0.5).unwrap();
    assert_abs_diff_eq!(p.value(), 17.5, epsilon = 1e-5);

    // Weights are live while the animation plays.
    blend.set_weight(1, 0.0).unwrap();
    m.apply_animations().unwrap();
    assert_abs_diff_eq!(p.value(), 10.0, epsilon = 1e-5);

    blend.set_weight(0, 0.0).unwrap();
    assert_eq!(blend.normalized_weight(0).unwrap(), 0.0);
    assert_eq!(blend.normalized_weight(1).unwrap(), 0.0);
    m.apply_animations().unwrap();
    assert_eq!(p.value(), 1.0);
}

#[test]
fn synchronized_blend_finishes_children_together() {
    let blend = {
        let mut b = BlendGroup::new();
        b.push(from_to(0.0, 10.0, 1.0));
        b.push(from_to(0.0, 10.0, 2.0));
        b.synchronize_durations();
        Rc::new(b)
    };
    assert_abs_diff_eq!(blend.total_duration(), 1.5, epsilon = 1e-6);

    let m = AnimationManager::default();
    let (p, r) = property(0.0);
    m.start_animation(blend, r).unwrap();
    m.update_and_apply(0.75).unwrap();
    assert_abs_diff_eq!(p.value(), 5.0, epsilon = 1e-5);
}

#[test]
fn sequenced_group_in_a_looping_clip() {
    let mut group = TimelineGroup::new();
    group.push(from_to(0.0, 4.0, 2.0));
    let mut clip = TimelineClip::new(Rc::new(group));
    clip.timing_mut().set_duration(Some(5.0)).unwrap();
    clip.timing_mut().set_loop_behavior(LoopBehavior::Cycle);

    let m = AnimationManager::default();
    let (p, r) = property(0.0);
    m.start_animation(Rc::new(clip), r).unwrap();

    m.update_and_apply(1.0).unwrap();
    assert_abs_diff_eq!(p.value(), 2.0, epsilon = 1e-5);
    m.update_and_apply(2.5).unwrap();
    assert_abs_diff_eq!(p.value(), 3.0, epsilon = 1e-5);
}

#[test]
fn key_frames_with_easing() {
    let ease: Rc<dyn EasingFunction> = Rc::new(QuadraticEase::new(EasingMode::EaseIn));
    let mut keys = KeyFrameAnimation::new();
    keys.insert(KeyFrame::linear(1.0, 10.0f32)).unwrap();
    keys.insert(KeyFrame::linear(2.0, 20.0).with_easing(ease))
        .unwrap();
    keys.insert(KeyFrame::discrete(3.0, -5.0)).unwrap();

    let m = AnimationManager::default();
    let (p, r) = property(0.0);
    m.start_animation(Rc::new(keys), r).unwrap();

    m.update_and_apply(0.5).unwrap();
    assert_abs_diff_eq!(p.value(), 5.0, epsilon = 1e-5);
    m.update_and_apply(1.0).unwrap();
    assert_abs_diff_eq!(p.value(), 12.5, epsilon = 1e-5);
    m.update_and_apply(1.0).unwrap();
    assert_abs_diff_eq!(p.value(), 20.0, epsilon = 1e-5);
    m.update_and_apply(0.5).unwrap();
    assert_abs_diff_eq!(p.value(), -5.0, epsilon = 1e-5);
}
