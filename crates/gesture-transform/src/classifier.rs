//! Template-based hand pose classification.
//!
//! A [`Catalogue`] holds a list of [`GestureTemplate`]s, each describing the expected
//! [`CurlLevel`] of some fingers. Classifying a set of observed [`FingerCurls`] scores every
//! template independently and picks the best one.
//!
//! # Scoring
//!
//! A template's score is the sum over its finger requirements of `weight * credit`, where the
//! credit depends on how far the observed curl level is from the required one:
//!
//! | distance                         | credit |
//! |----------------------------------|--------|
//! | 0 (exact match)                  | 1.0    |
//! | 1 (eg. `HalfCurl` vs. `NoCurl`)  | 0.25   |
//! | 2 (`NoCurl` vs. `FullCurl`)      | 0.0    |
//!
//! Scores are not normalized. A template only counts as recognized when its score reaches its own
//! acceptance threshold; the recognized gesture is the highest-scoring template among those.
//!
//! # Ties
//!
//! When several templates reach the same score, the one registered first in the catalogue wins.

use std::fmt;

use anyhow::{bail, ensure};

use crate::features::{CurlLevel, FingerCurls};
use crate::landmark::Finger;

/// Credit awarded per curl-level distance.
const CREDIT: [f32; 3] = [1.0, 0.25, 0.0];

/// Fraction of a requirement's weight earned when `observed` is compared against `required`.
pub fn credit(observed: CurlLevel, required: CurlLevel) -> f32 {
    CREDIT[usize::from(observed.distance(required))]
}

/// What a recognized gesture does to the controlled transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformAction {
    /// Rotate around the X and Y axes.
    Rotate,
    /// Translate along X and Y.
    Pan,
    /// Change the uniform scale.
    Scale,
}

/// Index of a template in its [`Catalogue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureId(usize);

impl GestureId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Requirement {
    finger: Finger,
    curl: CurlLevel,
    weight: f32,
}

/// A named hand pose, described by the curl level expected for each finger.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureTemplate {
    name: String,
    action: TransformAction,
    requirements: Vec<Requirement>,
    threshold: f32,
}

impl GestureTemplate {
    /// Creates a template without finger requirements and an acceptance threshold of 0.
    pub fn new<N: Into<String>>(name: N, action: TransformAction) -> Self {
        Self {
            name: name.into(),
            action,
            requirements: Vec::new(),
            threshold: 0.0,
        }
    }

    /// Requires `finger` to be at `curl`, contributing up to `weight` to the score.
    ///
    /// A later requirement for the same finger replaces the earlier one.
    pub fn curl(mut self, finger: Finger, curl: CurlLevel, weight: f32) -> Self {
        self.requirements.retain(|r| r.finger != finger);
        self.requirements.push(Requirement {
            finger,
            curl,
            weight,
        });
        self
    }

    /// Requires every finger to be at `curl`.
    pub fn all_fingers(self, curl: CurlLevel, weight: f32) -> Self {
        Finger::ALL
            .into_iter()
            .fold(self, |t, finger| t.curl(finger, curl, weight))
    }

    /// Sets the minimum score at which this template is recognized.
    pub fn threshold(self, threshold: f32) -> Self {
        Self { threshold, ..self }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> TransformAction {
        self.action
    }

    pub fn acceptance_threshold(&self) -> f32 {
        self.threshold
    }

    /// Highest score this template can produce.
    pub fn max_score(&self) -> f32 {
        self.requirements.iter().map(|r| r.weight).sum()
    }

    /// Scores observed finger curls against this template.
    pub fn score(&self, curls: &FingerCurls) -> f32 {
        self.requirements
            .iter()
            .map(|r| r.weight * credit(curls[r.finger], r.curl))
            .sum()
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.name.is_empty(), "gesture template without a name");
        for r in &self.requirements {
            ensure!(
                r.weight.is_finite() && r.weight >= 0.0,
                "gesture '{}': weight for {} must be non-negative, got {}",
                self.name,
                r.finger,
                r.weight
            );
        }
        ensure!(
            self.threshold.is_finite() && self.threshold >= 0.0,
            "gesture '{}': threshold must be non-negative, got {}",
            self.name,
            self.threshold
        );
        Ok(())
    }
}

impl fmt::Display for GestureTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The highest-scoring template for an observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub id: GestureId,
    pub score: f32,
}

/// Result of classifying one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Best-scoring template, regardless of its threshold. [`None`] for an empty catalogue.
    pub best: Option<Match>,
    /// The best-scoring template among those that reached their acceptance threshold.
    pub gesture: Option<GestureId>,
}

impl Classification {
    /// A classification that recognized nothing.
    pub const NONE: Self = Self {
        best: None,
        gesture: None,
    };
}

/// An ordered, immutable-after-setup list of gesture templates.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalogue {
    templates: Vec<GestureTemplate>,
}

/// The default catalogue: `open` rotates, `grab` pans, `point` scales.
impl Default for Catalogue {
    fn default() -> Self {
        use CurlLevel::*;

        Self::new()
            .with(
                GestureTemplate::new("open", TransformAction::Rotate)
                    .all_fingers(NoCurl, 1.0)
                    .threshold(4.5),
            )
            .with(
                GestureTemplate::new("grab", TransformAction::Pan)
                    .all_fingers(HalfCurl, 1.0)
                    .threshold(4.5),
            )
            .with(
                GestureTemplate::new("point", TransformAction::Scale)
                    .curl(Finger::Thumb, HalfCurl, 1.0)
                    .curl(Finger::Index, NoCurl, 1.0)
                    .curl(Finger::Middle, FullCurl, 1.0)
                    .curl(Finger::Ring, FullCurl, 1.0)
                    .curl(Finger::Pinky, FullCurl, 1.0)
                    .threshold(4.5),
            )
    }
}

impl Catalogue {
    /// Creates an empty catalogue.
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
        }
    }

    /// Appends a template. Templates registered earlier win ties.
    pub fn with(mut self, template: GestureTemplate) -> Self {
        self.templates.push(template);
        self
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Returns the template with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` was obtained from a different catalogue and is out of range.
    pub fn get(&self, id: GestureId) -> &GestureTemplate {
        &self.templates[id.0]
    }

    /// Looks up a template by name.
    pub fn find(&self, name: &str) -> Option<GestureId> {
        self.templates
            .iter()
            .position(|t| t.name == name)
            .map(GestureId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GestureId, &GestureTemplate)> + '_ {
        self.templates
            .iter()
            .enumerate()
            .map(|(i, t)| (GestureId(i), t))
    }

    /// Overrides the acceptance threshold of the template called `name`.
    pub fn set_threshold(&mut self, name: &str, threshold: f32) -> anyhow::Result<()> {
        match self.templates.iter_mut().find(|t| t.name == name) {
            Some(template) => {
                template.threshold = threshold;
                Ok(())
            }
            None => bail!("threshold given for unknown gesture '{name}'"),
        }
    }

    /// Checks weights and thresholds and rejects duplicate names.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, template) in self.templates.iter().enumerate() {
            template.validate()?;
            ensure!(
                !self.templates[..i].iter().any(|t| t.name == template.name),
                "duplicate gesture name '{}'",
                template.name
            );
        }
        Ok(())
    }

    /// Scores `curls` against every template, in catalogue order.
    pub fn scores(&self, curls: &FingerCurls) -> Vec<Match> {
        self.iter()
            .map(|(id, t)| Match {
                id,
                score: t.score(curls),
            })
            .collect()
    }

    /// Finds the best matching template for `curls`.
    ///
    /// Only templates whose score reaches their own acceptance threshold are candidates for
    /// [`Classification::gesture`].
    pub fn classify(&self, curls: &FingerCurls) -> Classification {
        let mut best: Option<Match> = None;
        let mut accepted: Option<Match> = None;
        for m in self.scores(curls) {
            // Strictly greater, so that the first-registered template wins ties.
            if best.map_or(true, |b| m.score > b.score) {
                best = Some(m);
            }
            if m.score >= self.get(m.id).threshold && accepted.map_or(true, |a| m.score > a.score) {
                accepted = Some(m);
            }
        }

        Classification {
            best,
            gesture: accepted.map(|m| m.id),
        }
    }
}
