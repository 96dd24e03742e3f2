use std::time::Duration;

use approx::assert_relative_eq;
use gesture_transform::{
    classifier::{Catalogue, GestureTemplate, TransformAction},
    config::ControllerConfig,
    controller::{Controller, TickOutcome},
    debounce::Transition,
    features::CurlLevel,
    landmark::{LandmarkSet, LandmarkSource},
    synthetic::{hand, HandShape, ScriptedSource},
    timer::{FixedTicks, TickSource},
    transform::{RenderTarget, SharedTransform, Transform, UpdateOutcome},
};
use nalgebra::{Point3, Vector3};

const TICK: Duration = Duration::from_millis(10);

/// Runs every frame of `source` through `controller`, returning the outcomes.
fn run<T: RenderTarget>(
    controller: &mut Controller,
    source: &mut ScriptedSource,
    ticks: &mut FixedTicks,
    target: &mut T,
) -> Vec<TickOutcome> {
    let mut outcomes = Vec::new();
    while source.remaining() > 0 {
        let landmarks = source.sample().unwrap();
        outcomes.push(controller.tick(ticks.next_tick(), &landmarks, target));
    }
    outcomes
}

fn transitions(outcomes: &[TickOutcome]) -> Vec<Transition> {
    outcomes
        .iter()
        .filter_map(|o| match o {
            TickOutcome::Observed(obs) if obs.transition != Transition::None => Some(obs.transition),
            _ => None,
        })
        .collect()
}

#[test]
fn absent_hand_leaves_transform_unchanged() {
    let mut controller = Controller::new(ControllerConfig::default()).unwrap();
    let mut ticks = FixedTicks::new(TICK);
    let mut target = Transform {
        position: Vector3::new(1.0, 2.0, 3.0),
        rotation: Vector3::new(0.1, 0.2, 0.3),
        scale: 2.0,
    };
    let before = target;

    let mut source = ScriptedSource::new().absent(10);
    let outcomes = run(&mut controller, &mut source, &mut ticks, &mut target);

    assert_eq!(outcomes.len(), 10);
    assert!(outcomes.iter().all(|o| *o == TickOutcome::NoObservation));
    assert_eq!(target, before);
}

#[test]
fn open_hand_rotates_after_settling() {
    let mut controller = Controller::new(
        ControllerConfig::default()
            .settling_delay(Duration::from_millis(100))
            .smoothing_factor(0.5),
    )
    .unwrap();
    let mut ticks = FixedTicks::new(TICK);
    let mut target = Transform::default();

    // Moving while the gesture is still settling does nothing.
    let start = Point3::new(100.0, 100.0, 0.0);
    let mut source = ScriptedSource::new().sweep(
        HandShape::OPEN,
        start,
        start + Vector3::new(0.0, -10.0, 0.0),
        10,
    );
    let outcomes = run(&mut controller, &mut source, &mut ticks, &mut target);
    assert!(controller.confirmed().is_none());
    assert_eq!(target, Transform::default());
    assert_eq!(transitions(&outcomes).len(), 1);

    // The 11th tick confirms and applies that tick's motion.
    let moved = hand(HandShape::OPEN, start + Vector3::new(0.0, -11.0, 0.0));
    let outcome = controller.tick(ticks.next_tick(), &moved, &mut target);
    let TickOutcome::Observed(obs) = outcome else {
        panic!("expected observation, got {outcome:?}");
    };
    assert!(matches!(obs.transition, Transition::Confirmed(_)));
    assert_eq!(controller.confirmed().unwrap().name(), "open");
    assert_relative_eq!(target.rotation.x, 0.5 * std::f32::consts::PI, epsilon = 1e-3);
    assert_eq!(target.rotation.y, 0.0);
    assert_eq!(target.position, Vector3::zeros());
}

#[test]
fn pan_scenario() {
    // Palm moves by (1, -1, 0) in a single tick while "pan" is confirmed.
    let mut controller = Controller::new(
        ControllerConfig::default()
            .settling_delay(Duration::ZERO)
            .smoothing_factor(0.1),
    )
    .unwrap();
    let mut ticks = FixedTicks::new(TICK);
    let mut target = Transform::default();

    let mut source = ScriptedSource::new().hold(HandShape::GRAB, Point3::origin(), 2);
    run(&mut controller, &mut source, &mut ticks, &mut target);
    assert_eq!(
        controller.confirmed().map(|t| t.action()),
        Some(TransformAction::Pan)
    );

    controller.tick(
        ticks.next_tick(),
        &hand(HandShape::GRAB, Point3::new(1.0, -1.0, 0.0)),
        &mut target,
    );
    assert_relative_eq!(target.position.x, -0.1, epsilon = 1e-4);
    assert_relative_eq!(target.position.y, 0.1, epsilon = 1e-4);
    assert_eq!(target.rotation, Vector3::zeros());
    assert_eq!(target.scale, 1.0);
}

#[test]
fn gesture_confirms_once_and_releases_on_change() {
    let mut controller = Controller::new(
        ControllerConfig::default().settling_delay(Duration::from_millis(50)),
    )
    .unwrap();
    let mut ticks = FixedTicks::new(TICK);
    let mut target = Transform::default();
    let open = controller.catalogue().find("open").unwrap();
    let grab = controller.catalogue().find("grab").unwrap();

    let mut source = ScriptedSource::new()
        .hold(HandShape::OPEN, Point3::origin(), 40)
        .hold(HandShape::GRAB, Point3::origin(), 1)
        .hold(HandShape::GRAB, Point3::origin(), 10);
    let outcomes = run(&mut controller, &mut source, &mut ticks, &mut target);

    assert_eq!(
        transitions(&outcomes),
        [
            Transition::Pending(open),
            Transition::Confirmed(open),
            Transition::Released(open),
            Transition::Pending(grab),
            Transition::Confirmed(grab),
        ]
    );
}

#[test]
fn one_frame_glitch_is_ignored() {
    let mut controller = Controller::new(
        ControllerConfig::default().settling_delay(Duration::from_millis(50)),
    )
    .unwrap();
    let mut ticks = FixedTicks::new(TICK);
    let mut target = Transform::default();

    // A single "point" frame in the middle of a held fist never confirms.
    let mut source = ScriptedSource::new()
        .hold(HandShape::FIST, Point3::origin(), 20)
        .hold(HandShape::POINT, Point3::origin(), 1)
        .hold(HandShape::FIST, Point3::origin(), 20);
    let outcomes = run(&mut controller, &mut source, &mut ticks, &mut target);

    assert!(!transitions(&outcomes)
        .iter()
        .any(|t| matches!(t, Transition::Confirmed(_))));
    assert!(controller.confirmed().is_none());
}

#[test]
fn dropout_grace_keeps_gesture_through_glitch() {
    let mut controller = Controller::new(
        ControllerConfig::default()
            .settling_delay(Duration::from_millis(20))
            .dropout_grace(Duration::from_millis(30)),
    )
    .unwrap();
    let mut ticks = FixedTicks::new(TICK);
    let mut target = Transform::default();

    let mut source = ScriptedSource::new()
        .hold(HandShape::GRAB, Point3::origin(), 5)
        .hold(HandShape::FIST, Point3::origin(), 1)
        .hold(HandShape::GRAB, Point3::origin(), 5);
    let outcomes = run(&mut controller, &mut source, &mut ticks, &mut target);

    let released = transitions(&outcomes)
        .iter()
        .filter(|t| matches!(t, Transition::Released(_)))
        .count();
    assert_eq!(released, 0);
    assert_eq!(controller.confirmed().unwrap().name(), "grab");

    // A sustained change does release it.
    let mut source = ScriptedSource::new().hold(HandShape::FIST, Point3::origin(), 5);
    run(&mut controller, &mut source, &mut ticks, &mut target);
    assert!(controller.confirmed().is_none());
}

#[test]
fn scale_never_reaches_zero() {
    let mut controller = Controller::new(
        ControllerConfig::default()
            .settling_delay(Duration::ZERO)
            .smoothing_factor(0.5)
            .scale_sensitivity(1.0),
    )
    .unwrap();
    let mut ticks = FixedTicks::new(TICK);
    let mut target = Transform::default();

    // Pointing while moving down shrinks; large steps drive the candidate negative.
    let start = Point3::origin();
    let mut source = ScriptedSource::new().sweep(
        HandShape::POINT,
        start,
        start + Vector3::new(0.0, 30.0, 0.0),
        31,
    );
    let outcomes = run(&mut controller, &mut source, &mut ticks, &mut target);

    let mut last_applied = 1.0;
    let mut rejected = 0;
    for outcome in &outcomes {
        if let TickOutcome::Observed(obs) = outcome {
            match obs.update {
                UpdateOutcome::Applied(t) => {
                    assert!(t.scale > 0.0);
                    last_applied = t.scale;
                }
                UpdateOutcome::Rejected => rejected += 1,
                UpdateOutcome::Held => {}
            }
        }
    }
    assert!(rejected > 0);
    assert!(target.scale > 0.0);
    assert_eq!(target.scale, last_applied);
}

#[test]
fn custom_catalogue_and_thresholds() {
    use CurlLevel::*;

    let catalogue = Catalogue::new().with(
        GestureTemplate::new("fist", TransformAction::Pan)
            .all_fingers(FullCurl, 1.0)
            .threshold(4.5),
    );
    let mut controller = Controller::new(
        ControllerConfig::default()
            .catalogue(catalogue)
            .settling_delay(Duration::ZERO),
    )
    .unwrap();
    let mut ticks = FixedTicks::new(TICK);
    let mut target = Transform::default();

    let mut source = ScriptedSource::new().hold(HandShape::FIST, Point3::origin(), 2);
    run(&mut controller, &mut source, &mut ticks, &mut target);
    assert_eq!(controller.confirmed().unwrap().name(), "fist");

    // Raising the threshold above the maximum score disables the gesture.
    let mut controller = Controller::new(
        ControllerConfig::default()
            .catalogue(Catalogue::default())
            .threshold("grab", 6.0)
            .settling_delay(Duration::ZERO),
    )
    .unwrap();
    let mut source = ScriptedSource::new().hold(HandShape::GRAB, Point3::origin(), 5);
    run(&mut controller, &mut source, &mut ticks, &mut target);
    assert!(controller.confirmed().is_none());
}

#[test]
fn frame_normalized_motion() {
    let mut controller = Controller::new(
        ControllerConfig::default()
            .settling_delay(Duration::ZERO)
            .smoothing_factor(0.5)
            .frame_size(gesture_transform::features::FrameSize::new(320.0, 240.0)),
    )
    .unwrap();
    let mut ticks = FixedTicks::new(TICK);
    let mut target = Transform::default();

    let start = Point3::new(160.0, 120.0, 0.0);
    let mut source = ScriptedSource::new()
        .hold(HandShape::GRAB, start, 2)
        .hold(HandShape::GRAB, start + Vector3::new(32.0, 0.0, 0.0), 1);
    run(&mut controller, &mut source, &mut ticks, &mut target);

    // 32 px on a 320 px frame is 0.1, halved by smoothing.
    assert_relative_eq!(target.position.x, -0.05, epsilon = 1e-4);
}

#[test]
fn shared_target() {
    let mut controller = Controller::new(ControllerConfig::default().settling_delay(Duration::ZERO))
        .unwrap();
    let mut ticks = FixedTicks::new(TICK);
    let shared = SharedTransform::default();
    let mut writer = shared.clone();

    let mut source = ScriptedSource::new()
        .hold(HandShape::GRAB, Point3::origin(), 2)
        .hold(HandShape::GRAB, Point3::new(5.0, 0.0, 0.0), 1);
    run(&mut controller, &mut source, &mut ticks, &mut writer);

    assert!(shared.get().position.x < 0.0);
}

#[test]
fn malformed_landmarks_are_an_error() {
    struct Broken;

    impl LandmarkSource for Broken {
        fn sample(&mut self) -> anyhow::Result<LandmarkSet> {
            LandmarkSet::from_points([[0.0; 3]; 7])
        }
    }

    let err = Broken.sample().unwrap_err();
    assert!(err.to_string().contains("malformed"), "{err}");
}
