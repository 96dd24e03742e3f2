//! Replays a scripted hand performance through the controller while a render thread samples the
//! shared transform.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use gesture_transform::{
    config::ControllerConfig,
    controller::{Controller, TickOutcome},
    features::FrameSize,
    landmark::LandmarkSource,
    synthetic::{HandShape, ScriptedSource},
    timer::{FpsCounter, TickSource, Timer, WallClock},
    transform::{SharedTransform, Transform},
};
use nalgebra::{Point3, Vector3};

const STREAM_WIDTH: f32 = 320.0;
const STREAM_HEIGHT: f32 = 240.0;

const RENDER_INTERVAL: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    gesture_transform::init_logger!();

    let config = ControllerConfig::from_env()?
        .frame_size(FrameSize::new(STREAM_WIDTH, STREAM_HEIGHT))
        .pan_sensitivity(8.0)
        .scale_sensitivity(4.0);
    let tick_interval = config.tick_interval_value();
    let mut controller = Controller::new(config)?;

    let mut source = script();
    let frames = source.remaining();
    let target = SharedTransform::default();
    let done = AtomicBool::new(false);

    thread::scope(|s| -> anyhow::Result<()> {
        s.spawn(|| {
            let mut last = Transform::default();
            while !done.load(Ordering::Relaxed) {
                let t = target.get();
                if t != last {
                    log::trace!("render: {}", format_transform(&t));
                    last = t;
                }
                thread::sleep(RENDER_INTERVAL);
            }
        });

        let result = drive(&mut controller, &mut source, frames, tick_interval, target.clone());
        done.store(true, Ordering::Relaxed);
        result
    })?;

    log::info!("final transform: {}", format_transform(&target.get()));
    Ok(())
}

fn drive(
    controller: &mut Controller,
    source: &mut impl LandmarkSource,
    frames: usize,
    tick_interval: Duration,
    mut target: SharedTransform,
) -> anyhow::Result<()> {
    let mut clock = WallClock::new();
    let mut fps = FpsCounter::new("controller");
    let timer = Timer::new("tick");
    let mut absent = 0;

    for _ in 0..frames {
        let landmarks = source.sample()?;
        let tick = clock.next_tick();
        let outcome = timer.time(|| controller.tick(tick, &landmarks, &mut target));
        if outcome == TickOutcome::NoObservation {
            absent += 1;
        }

        fps.tick_with(&timer);
        thread::sleep(tick_interval);
    }

    log::debug!("{frames} ticks, {absent} without a hand");
    Ok(())
}

/// Open hand, pan with a half-curled grab, then point upwards to grow the object.
fn script() -> ScriptedSource {
    let center = Point3::new(STREAM_WIDTH / 2.0, STREAM_HEIGHT * 0.75, 0.0);
    let left = center - Vector3::new(60.0, 0.0, 0.0);
    let up = center - Vector3::new(0.0, 50.0, 0.0);

    ScriptedSource::new()
        .absent(20)
        .hold(HandShape::OPEN, center, 30)
        .sweep(HandShape::OPEN, center, up, 60)
        .sweep(HandShape::OPEN, up, center, 60)
        .absent(10)
        .hold(HandShape::GRAB, center, 30)
        .sweep(HandShape::GRAB, center, left, 80)
        .hold(HandShape::FIST, left, 20)
        .hold(HandShape::POINT, left, 30)
        .sweep(HandShape::POINT, left, left - Vector3::new(0.0, 40.0, 0.0), 60)
        .absent(20)
}

fn format_transform(t: &Transform) -> String {
    format!(
        "pos=({:.2}, {:.2}, {:.2}) rot=({:.2}, {:.2}, {:.2}) scale={:.2}",
        t.position.x, t.position.y, t.position.z, t.rotation.x, t.rotation.y, t.rotation.z, t.scale,
    )
}
