use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lilt_animation_core::{
    AnimatableValue, AnimationManager, AnimationTransition, BlendGroup, CubicEase, EasingFunction,
    EasingMode, FromToByAnimation, LoopBehavior, PropertyRef, TimelineClip,
};

fn looping_blend() -> Rc<TimelineClip> {
    let mut blend = BlendGroup::new();
    for (to, duration) in [(10.0f32, 1.0f32), (20.0, 2.0)] {
        let mut a = FromToByAnimation::new(duration).unwrap();
        a.set_to(Some(to));
        let ease: Rc<dyn EasingFunction> = Rc::new(CubicEase::new(EasingMode::EaseInOut));
        a.set_easing(Some(ease));
        blend.push(Rc::new(a));
    }
    blend.synchronize_durations();
    let mut clip = TimelineClip::new(Rc::new(blend));
    clip.timing_mut().set_loop_behavior(LoopBehavior::Oscillate);
    clip.timing_mut().set_duration(Some(f32::MAX)).unwrap();
    Rc::new(clip)
}

fn manager_step_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("manager_step");

    for count in [10usize, 100, 1000] {
        let manager = AnimationManager::default();
        let timeline = looping_blend();
        let mut props = Vec::with_capacity(count);
        for _ in 0..count {
            let p = Rc::new(AnimatableValue::new(0.0f32));
            let r = PropertyRef::new(p.clone());
            manager.start_animation(timeline.clone(), r.clone()).unwrap();
            let layer = manager.create_controller(timeline.clone(), r).unwrap();
            layer.start(AnimationTransition::compose()).unwrap();
            props.push(p);
        }

        group.bench_function(format!("{count}_properties"), |b| {
            b.iter(|| {
                manager.update_and_apply(black_box(1.0 / 60.0)).unwrap();
                black_box(props[0].value())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, manager_step_benchmark);
criterion_main!(benches);
