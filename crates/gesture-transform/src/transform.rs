//! The controlled object's transform and the gesture-driven updater that moves it.

use std::{
    f32::consts::PI,
    sync::{Arc, Mutex, PoisonError},
};

use nalgebra::Vector3;

use crate::classifier::TransformAction;
use crate::filter::Smoother;

/// Position, rotation (Euler angles in radians) and uniform scale of a 3D object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: f32,
}

/// The identity transform.
impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: 1.0,
        }
    }
}

/// An externally owned object whose transform is driven by the controller.
pub trait RenderTarget {
    /// Returns the current transform, used as the base of the next increment.
    fn transform(&self) -> Transform;

    /// Replaces the transform. Each field is written as a whole.
    fn apply(&mut self, position: Vector3<f32>, rotation: Vector3<f32>, scale: f32);
}

impl RenderTarget for Transform {
    fn transform(&self) -> Transform {
        *self
    }

    fn apply(&mut self, position: Vector3<f32>, rotation: Vector3<f32>, scale: f32) {
        *self = Transform {
            position,
            rotation,
            scale,
        };
    }
}

/// A [`Transform`] that can be written by the controller and read by a render loop running on
/// another thread.
///
/// [`RenderTarget::apply`] replaces all fields under one lock, so readers never observe a
/// partially updated transform.
#[derive(Debug, Clone, Default)]
pub struct SharedTransform {
    inner: Arc<Mutex<Transform>>,
}

impl SharedTransform {
    pub fn new(transform: Transform) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transform)),
        }
    }

    /// Returns a consistent copy of the current transform.
    pub fn get(&self) -> Transform {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RenderTarget for SharedTransform {
    fn transform(&self) -> Transform {
        self.get()
    }

    fn apply(&mut self, position: Vector3<f32>, rotation: Vector3<f32>, scale: f32) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Transform {
            position,
            rotation,
            scale,
        };
    }
}

/// Multipliers converting palm motion into transform units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    /// Scaled by π: a palm delta of 1.0 rotates by up to π radians.
    pub rotation: f32,
    pub pan: f32,
    pub scale: f32,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            rotation: 1.0,
            pan: 1.0,
            scale: 1.0,
        }
    }
}

/// What [`TransformUpdater::update`] did to the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    /// Nothing was written: no gesture is confirmed, or the increment was zero.
    Held,
    /// The target was updated to this transform.
    Applied(Transform),
    /// The increment would have produced an invalid transform (eg. non-positive scale) and was
    /// discarded.
    Rejected,
}

/// Turns a confirmed gesture action and a palm delta into a smoothed transform increment.
#[derive(Debug, Clone)]
pub struct TransformUpdater {
    smoother: Smoother,
    sensitivity: Sensitivity,
}

impl TransformUpdater {
    pub fn new(smoother: Smoother, sensitivity: Sensitivity) -> Self {
        Self {
            smoother,
            sensitivity,
        }
    }

    /// Computes the transform following `current`, or [`None`] if the increment must be
    /// discarded.
    ///
    /// Only the X and Y components of position and rotation are ever changed.
    pub fn next(
        &self,
        action: TransformAction,
        delta: Vector3<f32>,
        current: &Transform,
    ) -> Option<Transform> {
        let s = &self.smoother;
        let mut next = *current;
        match action {
            TransformAction::Rotate => {
                let r = current.rotation;
                let k = PI * self.sensitivity.rotation;
                next.rotation.x = s.smooth(r.x, r.x - delta.y * k);
                next.rotation.y = s.smooth(r.y, r.y - delta.x * k);
            }
            TransformAction::Pan => {
                let p = current.position;
                let k = self.sensitivity.pan;
                next.position.x = s.smooth(p.x, p.x - delta.x * k);
                next.position.y = s.smooth(p.y, p.y - delta.y * k);
            }
            TransformAction::Scale => {
                let candidate = s.smooth(
                    current.scale,
                    current.scale - delta.y * self.sensitivity.scale,
                );
                if !(candidate > 0.0 && candidate.is_finite()) {
                    return None;
                }
                next.scale = candidate;
            }
        }

        let finite = next.position.iter().chain(next.rotation.iter()).all(|v| v.is_finite());
        finite.then_some(next)
    }

    /// Applies the increment for `action` (or nothing, when idle) to `target`.
    ///
    /// `target` is written at most once.
    pub fn update<T: RenderTarget + ?Sized>(
        &self,
        action: Option<TransformAction>,
        delta: Vector3<f32>,
        target: &mut T,
    ) -> UpdateOutcome {
        let Some(action) = action else {
            return UpdateOutcome::Held;
        };

        let current = target.transform();
        match self.next(action, delta, &current) {
            Some(next) if next == current => UpdateOutcome::Held,
            Some(next) => {
                target.apply(next.position, next.rotation, next.scale);
                UpdateOutcome::Applied(next)
            }
            None => {
                log::debug!(
                    "discarding {:?} increment for delta {:?} (scale {})",
                    action,
                    delta.as_slice(),
                    current.scale
                );
                UpdateOutcome::Rejected
            }
        }
    }
}
