//! The per-tick pipeline: features → classification → debouncing → transform update.

use nalgebra::{Point3, Vector3};

use crate::classifier::{Catalogue, Classification, GestureTemplate};
use crate::config::ControllerConfig;
use crate::debounce::{Debouncer, Transition};
use crate::features::{FeatureExtractor, Features};
use crate::filter::Smoother;
use crate::landmark::LandmarkSet;
use crate::timer::Tick;
use crate::transform::{RenderTarget, TransformUpdater, UpdateOutcome};

/// Result of a single [`Controller::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No hand was observed. All state was left as it was.
    NoObservation,
    Observed(Observation),
}

/// Details of a tick that observed a hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub features: Features,
    /// Palm movement since the previous observation (zero for the first one).
    pub palm_delta: Vector3<f32>,
    pub classification: Classification,
    pub transition: Transition,
    pub update: UpdateOutcome,
}

/// Drives a [`RenderTarget`] from a stream of hand observations.
///
/// The controller owns the running state (debouncer and last palm position); configuration is
/// fixed at construction.
#[derive(Debug, Clone)]
pub struct Controller {
    extractor: FeatureExtractor,
    catalogue: Catalogue,
    debouncer: Debouncer,
    updater: TransformUpdater,
    last_palm: Option<Point3<f32>>,
}

impl Controller {
    /// Creates a controller, validating `config`.
    pub fn new(config: ControllerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let catalogue = config.resolved_catalogue()?;

        let smoother = Smoother::new(config.smoothing_factor);
        log::debug!(
            "gesture catalogue: {}; settling {:?}, smoothing {}",
            itertools::join(catalogue.iter().map(|(_, t)| t), ", "),
            config.settling_delay,
            smoother.factor(),
        );

        Ok(Self {
            extractor: FeatureExtractor::new(config.curl_thresholds)
                .with_frame_size(config.frame_size),
            catalogue,
            debouncer: Debouncer::new(config.settling_delay, config.dropout_grace),
            updater: TransformUpdater::new(smoother, config.sensitivity),
            last_palm: None,
        })
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Returns the currently confirmed gesture.
    pub fn confirmed(&self) -> Option<&GestureTemplate> {
        self.debouncer.confirmed().map(|id| self.catalogue.get(id))
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Palm center of the last observed hand.
    pub fn last_palm(&self) -> Option<Point3<f32>> {
        self.last_palm
    }

    /// Processes one tick's observation, writing at most one transform update to `target`.
    ///
    /// An empty `landmarks` set is a no-op: the confirmed gesture, the palm position and the
    /// target's transform are all left untouched. The time spent without a hand does not count
    /// towards settling a pending gesture.
    pub fn tick<T: RenderTarget + ?Sized>(
        &mut self,
        tick: Tick,
        landmarks: &LandmarkSet,
        target: &mut T,
    ) -> TickOutcome {
        let Some(features) = self.extractor.extract(landmarks) else {
            log::trace!("{:?}: no hand", tick.time);
            self.debouncer.hold(tick.time);
            return TickOutcome::NoObservation;
        };

        let palm_delta = match self.last_palm.replace(features.palm_center) {
            Some(last) => features.palm_center - last,
            None => Vector3::zeros(),
        };

        let classification = self.catalogue.classify(&features.curls);
        log::trace!(
            "{:?}: curls {} best {:?} pinch {:.1}",
            tick.time,
            features.curls,
            classification
                .best
                .map(|m| (self.catalogue.get(m.id).name(), m.score)),
            features.pinch_distance,
        );

        let transition = self.debouncer.update(tick.time, classification.gesture);
        match transition {
            Transition::Confirmed(id) => {
                log::debug!("{:?}: confirmed '{}'", tick.time, self.catalogue.get(id))
            }
            Transition::Released(id) => {
                log::debug!("{:?}: released '{}'", tick.time, self.catalogue.get(id))
            }
            _ => {}
        }

        let action = self.confirmed().map(|t| t.action());
        let update = self.updater.update(action, palm_delta, target);

        TickOutcome::Observed(Observation {
            features,
            palm_delta,
            classification,
            transition,
            update,
        })
    }
}
