//! Per-frame geometric features: palm center and finger curl.

use std::{fmt, ops::Index};

use itertools::Itertools;
use nalgebra::{Point3, Vector3};

use crate::landmark::{Finger, LandmarkIdx, LandmarkSet};

/// How bent a finger is.
///
/// Ordered from straight to fully bent, so adjacent variants are "one step" apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CurlLevel {
    NoCurl,
    HalfCurl,
    FullCurl,
}

impl CurlLevel {
    /// Number of steps between two curl levels (0, 1 or 2).
    pub fn distance(self, other: CurlLevel) -> u8 {
        (self as u8).abs_diff(other as u8)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CurlLevel::NoCurl => "none",
            CurlLevel::HalfCurl => "half",
            CurlLevel::FullCurl => "full",
        }
    }
}

/// Bend angle limits (in degrees) separating the [`CurlLevel`]s.
///
/// A straight finger has a bend angle of 180°.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurlThresholds {
    /// Angles above this are [`CurlLevel::NoCurl`].
    pub no_curl_above: f32,
    /// Angles above this (and not above `no_curl_above`) are [`CurlLevel::HalfCurl`]; everything
    /// else is [`CurlLevel::FullCurl`].
    pub half_curl_above: f32,
}

impl Default for CurlThresholds {
    fn default() -> Self {
        Self {
            no_curl_above: 130.0,
            half_curl_above: 60.0,
        }
    }
}

impl CurlThresholds {
    pub fn classify(&self, bend_degrees: f32) -> CurlLevel {
        if bend_degrees > self.no_curl_above {
            CurlLevel::NoCurl
        } else if bend_degrees > self.half_curl_above {
            CurlLevel::HalfCurl
        } else {
            CurlLevel::FullCurl
        }
    }
}

/// Curl level of each finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerCurls([CurlLevel; 5]);

impl FingerCurls {
    /// Creates a curl set, with levels given in [`Finger::ALL`] order.
    pub fn new(levels: [CurlLevel; 5]) -> Self {
        Self(levels)
    }

    /// All fingers at the same curl level.
    pub fn uniform(level: CurlLevel) -> Self {
        Self([level; 5])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Finger, CurlLevel)> + '_ {
        Finger::ALL.into_iter().zip(self.0)
    }
}

impl Index<Finger> for FingerCurls {
    type Output = CurlLevel;

    fn index(&self, finger: Finger) -> &CurlLevel {
        &self.0[finger as usize]
    }
}

impl fmt::Display for FingerCurls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.iter()
                .format_with(", ", |(finger, curl), f| f(&format_args!(
                    "{finger}={}",
                    curl.as_str()
                )))
        )
    }
}

/// Size of the camera frame the landmarks were estimated on, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSize {
    pub width: f32,
    pub height: f32,
}

impl FrameSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Features of a single hand observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    /// Mean of the palm landmarks (possibly normalized to the frame size).
    pub palm_center: Point3<f32>,
    pub curls: FingerCurls,
    /// Distance between thumb tip and index finger tip, in landmark units.
    pub pinch_distance: f32,
}

/// Computes [`Features`] from landmark sets.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    thresholds: CurlThresholds,
    frame_size: Option<FrameSize>,
}

impl FeatureExtractor {
    pub fn new(thresholds: CurlThresholds) -> Self {
        Self {
            thresholds,
            frame_size: None,
        }
    }

    /// Divides the palm center's X and Y by the frame size, making motion independent of the
    /// camera resolution.
    pub fn with_frame_size(self, frame_size: Option<FrameSize>) -> Self {
        Self { frame_size, ..self }
    }

    /// Extracts features from `landmarks`, or returns [`None`] if no hand was observed.
    pub fn extract(&self, landmarks: &LandmarkSet) -> Option<Features> {
        if landmarks.is_empty() {
            return None;
        }

        let mut palm_center = palm_center(landmarks);
        if let Some(frame) = self.frame_size {
            palm_center.x /= frame.width;
            palm_center.y /= frame.height;
        }

        let curls = FingerCurls(
            Finger::ALL.map(|finger| self.thresholds.classify(finger_bend_degrees(landmarks, finger))),
        );

        let pinch_distance = nalgebra::distance(
            &landmarks.position(LandmarkIdx::ThumbTip),
            &landmarks.position(LandmarkIdx::IndexFingerTip),
        );

        Some(Features {
            palm_center,
            curls,
            pinch_distance,
        })
    }
}

/// Extracts features using the default curl thresholds and no frame normalization.
pub fn extract_features(landmarks: &LandmarkSet) -> Option<Features> {
    FeatureExtractor::default().extract(landmarks)
}

/// Computes the center of the palm by averaging the palm landmarks.
///
/// # Panics
///
/// Panics if `landmarks` is empty.
pub fn palm_center(landmarks: &LandmarkSet) -> Point3<f32> {
    let mut sum = Vector3::zeros();
    let mut count = 0;
    for lm in landmarks.palm_landmarks() {
        sum += lm.coords;
        count += 1;
    }

    Point3::from(sum / count as f32)
}

/// Computes how far a finger is bent, in degrees.
///
/// This is the interior angle at the finger's second landmark, between the first and the last
/// landmark of the chain. A straight finger measures 180°, a finger whose tip folds back onto its
/// base approaches 0°.
pub fn finger_bend_degrees(landmarks: &LandmarkSet, finger: Finger) -> f32 {
    let [base, joint, _, tip] = landmarks.finger_chain(finger);
    angle_degrees(base, joint, tip)
}

/// Angle at `vertex` between `a` and `b`, in degrees.
///
/// Degenerate (zero-length) legs are treated as straight (180°).
fn angle_degrees(a: Point3<f32>, vertex: Point3<f32>, b: Point3<f32>) -> f32 {
    let v1 = a - vertex;
    let v2 = b - vertex;

    let mag1 = v1.norm();
    let mag2 = v2.norm();
    if mag1 < 1e-6 || mag2 < 1e-6 {
        return 180.0;
    }

    let cos = (v1.dot(&v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
