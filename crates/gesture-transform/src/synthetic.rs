//! Synthetic hands and scripted landmark sources.
//!
//! Useful for exercising the controller without a camera or a landmark network.

use std::collections::VecDeque;

use nalgebra::{Point3, Vector3};

use crate::features::CurlLevel;
use crate::landmark::{Finger, LandmarkSet, LandmarkSource, NUM_LANDMARKS};

/// Length of every finger segment, in pixels.
const SEGMENT_LEN: f32 = 20.0;

/// Base landmark (CMC for the thumb, MCP otherwise) of each finger relative to the wrist, and the
/// direction the finger points in when straight (degrees clockwise from "up").
const FINGER_BASES: [([f32; 2], f32); 5] = [
    ([-25.0, -15.0], -50.0),
    ([-20.0, -60.0], 0.0),
    ([-5.0, -65.0], 0.0),
    ([10.0, -62.0], 0.0),
    ([25.0, -55.0], 0.0),
];

/// Curl level of every finger of a synthetic hand, in [`Finger::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandShape(pub [CurlLevel; 5]);

impl HandShape {
    pub const OPEN: Self = Self([CurlLevel::NoCurl; 5]);
    pub const GRAB: Self = Self([CurlLevel::HalfCurl; 5]);
    pub const FIST: Self = Self([CurlLevel::FullCurl; 5]);
    pub const POINT: Self = Self([
        CurlLevel::HalfCurl,
        CurlLevel::NoCurl,
        CurlLevel::FullCurl,
        CurlLevel::FullCurl,
        CurlLevel::FullCurl,
    ]);
}

/// Bend per joint that makes a finger measure as `curl`.
///
/// Bending both joints by `b` yields a bend angle of `180° - 1.5b`.
fn joint_bend_degrees(curl: CurlLevel) -> f32 {
    match curl {
        CurlLevel::NoCurl => 10.0,
        CurlLevel::HalfCurl => 60.0,
        CurlLevel::FullCurl => 100.0,
    }
}

/// Unit vector pointing `degrees` clockwise from "up" in image coordinates (Y down).
fn direction(degrees: f32) -> Vector3<f32> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vector3::new(sin, -cos, 0.0)
}

/// Builds a right hand in image coordinates with its wrist at `wrist`.
pub fn hand(shape: HandShape, wrist: Point3<f32>) -> LandmarkSet {
    let mut positions = [wrist; NUM_LANDMARKS];
    for (finger, curl) in Finger::ALL.into_iter().zip(shape.0) {
        let ([x, y], heading) = FINGER_BASES[finger as usize];
        let bend = joint_bend_degrees(curl);
        let chain = finger.chain();

        let mut pos = wrist + Vector3::new(x, y, 0.0);
        positions[chain[0] as usize] = pos;
        for (i, lm) in chain[1..].iter().enumerate() {
            pos += direction(heading + bend * i as f32) * SEGMENT_LEN;
            positions[*lm as usize] = pos;
        }
    }

    LandmarkSet::new(positions)
}

/// A [`LandmarkSource`] replaying a fixed list of observations, then reporting no hand.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    frames: VecDeque<LandmarkSet>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `count` frames with no hand.
    pub fn absent(mut self, count: usize) -> Self {
        self.frames
            .extend(std::iter::repeat_with(LandmarkSet::empty).take(count));
        self
    }

    /// Appends `count` frames of `shape`, moving the wrist linearly from `from` to `to`
    /// (inclusive).
    pub fn sweep(
        mut self,
        shape: HandShape,
        from: Point3<f32>,
        to: Point3<f32>,
        count: usize,
    ) -> Self {
        let steps = count.saturating_sub(1).max(1) as f32;
        self.frames
            .extend((0..count).map(|i| hand(shape, from + (to - from) * (i as f32 / steps))));
        self
    }

    /// Appends `count` frames of `shape` held still at `wrist`.
    pub fn hold(self, shape: HandShape, wrist: Point3<f32>, count: usize) -> Self {
        self.sweep(shape, wrist, wrist, count)
    }

    /// Number of frames left before the source only reports absent hands.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for ScriptedSource {
    fn sample(&mut self) -> anyhow::Result<LandmarkSet> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}
