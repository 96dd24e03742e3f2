//! Hand landmarks as delivered by a pose estimator.

use std::fmt;

use anyhow::ensure;
use nalgebra::Point3;

/// Number of landmarks in a tracked hand.
pub const NUM_LANDMARKS: usize = 21;

/// A hand observation: either empty (no hand detected) or exactly [`NUM_LANDMARKS`] positions in
/// the order given by [`LandmarkIdx`].
///
/// X and Y are in pixel coordinates of the source frame (Y pointing down), Z is a relative depth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    positions: Box<[Point3<f32>]>,
}

impl LandmarkSet {
    /// Returns a landmark set that signals "no hand detected".
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a landmark set from a complete hand.
    pub fn new(positions: [Point3<f32>; NUM_LANDMARKS]) -> Self {
        Self {
            positions: positions.into(),
        }
    }

    /// Creates a landmark set from raw `[x, y, z]` triples.
    ///
    /// Zero points produce an empty set. Any count other than 0 or [`NUM_LANDMARKS`] is a contract
    /// violation by the landmark source and returns an error.
    pub fn from_points<I>(points: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = [f32; 3]>,
    {
        let positions = points
            .into_iter()
            .map(|[x, y, z]| Point3::new(x, y, z))
            .collect::<Box<[_]>>();
        ensure!(
            positions.is_empty() || positions.len() == NUM_LANDMARKS,
            "malformed landmark set: expected 0 or {} landmarks, got {}",
            NUM_LANDMARKS,
            positions.len()
        );

        Ok(Self { positions })
    }

    /// Returns `true` if this set represents "no hand detected".
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    /// Returns the position of a landmark.
    ///
    /// # Panics
    ///
    /// Panics if the set is empty.
    #[track_caller]
    pub fn position(&self, idx: LandmarkIdx) -> Point3<f32> {
        self.positions[idx as usize]
    }

    /// Returns an iterator over the landmarks that surround the palm.
    pub fn palm_landmarks(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        PALM_LANDMARKS.iter().map(|lm| self.position(*lm))
    }

    /// Returns the 4 landmark positions making up `finger`, from the palm outwards.
    pub fn finger_chain(&self, finger: Finger) -> [Point3<f32>; 4] {
        finger.chain().map(|lm| self.position(lm))
    }
}

/// Names for the hand landmarks.
///
/// # Terminology
///
/// - **CMC**: [Carpometacarpal joint], the lowest joint of the thumb, located near the wrist.
/// - **MCP**: [Metacarpophalangeal joint], the lower joint forming the knuckles near the palm of
///   the hand.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
///
/// [Carpometacarpal joint]: https://en.wikipedia.org/wiki/Carpometacarpal_joint
/// [Metacarpophalangeal joint]: https://en.wikipedia.org/wiki/Metacarpophalangeal_joint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Landmarks averaged to obtain the palm center.
pub const PALM_LANDMARKS: &[LandmarkIdx] = {
    use LandmarkIdx::*;
    &[
        Wrist,
        ThumbCmc,
        IndexFingerMcp,
        MiddleFingerMcp,
        RingFingerMcp,
        PinkyMcp,
    ]
};

/// Bones of the hand skeleton, for drawing.
pub const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Surround the palm:
        (Wrist, ThumbCmc),
        (ThumbCmc, IndexFingerMcp),
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, PinkyMcp),
        (PinkyMcp, Wrist),
        // Thumb:
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Returns the landmarks forming this finger, starting at the palm.
    pub fn chain(self) -> [LandmarkIdx; 4] {
        use LandmarkIdx::*;
        match self {
            Finger::Thumb => [ThumbCmc, ThumbMcp, ThumbIp, ThumbTip],
            Finger::Index => [IndexFingerMcp, IndexFingerPip, IndexFingerDip, IndexFingerTip],
            Finger::Middle => [
                MiddleFingerMcp,
                MiddleFingerPip,
                MiddleFingerDip,
                MiddleFingerTip,
            ],
            Finger::Ring => [RingFingerMcp, RingFingerPip, RingFingerDip, RingFingerTip],
            Finger::Pinky => [PinkyMcp, PinkyPip, PinkyDip, PinkyTip],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supplier of per-tick hand observations, typically wrapping a hand landmark network.
pub trait LandmarkSource {
    /// Returns the current observation. An empty [`LandmarkSet`] means no hand was detected.
    ///
    /// Errors are contract violations (eg. a malformed landmark set) and are not expected to be
    /// recoverable.
    fn sample(&mut self) -> anyhow::Result<LandmarkSet>;
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    fn sample(&mut self) -> anyhow::Result<LandmarkSet> {
        (**self).sample()
    }
}
