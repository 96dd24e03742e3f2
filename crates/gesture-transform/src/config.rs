//! Controller configuration.
//!
//! # Environment Variables
//!
//! [`ControllerConfig::from_env`] starts from the defaults and applies these overrides:
//!
//! * `GESTURE_SETTLING_DELAY_MS`: settling delay before a gesture is confirmed, in milliseconds.
//! * `GESTURE_SMOOTHING`: smoothing factor, strictly between 0 and 1.
//! * `GESTURE_DROPOUT_GRACE_MS`: how long a confirmed gesture survives contrary classifications,
//!   in milliseconds.

use std::{collections::HashMap, env, env::VarError, str::FromStr, time::Duration};

use anyhow::{bail, ensure, Context};

use crate::classifier::{Catalogue, GestureTemplate};
use crate::features::{CurlThresholds, FrameSize};
use crate::transform::Sensitivity;

/// Configuration of a [`Controller`][crate::controller::Controller].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub(crate) settling_delay: Duration,
    pub(crate) dropout_grace: Duration,
    pub(crate) smoothing_factor: f32,
    pub(crate) sensitivity: Sensitivity,
    pub(crate) catalogue: Catalogue,
    pub(crate) thresholds: HashMap<String, f32>,
    pub(crate) curl_thresholds: CurlThresholds,
    pub(crate) frame_size: Option<FrameSize>,
    pub(crate) tick_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            settling_delay: Self::DEFAULT_SETTLING_DELAY,
            dropout_grace: Duration::ZERO,
            smoothing_factor: Self::DEFAULT_SMOOTHING_FACTOR,
            sensitivity: Sensitivity::default(),
            catalogue: Catalogue::default(),
            thresholds: HashMap::new(),
            curl_thresholds: CurlThresholds::default(),
            frame_size: None,
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
        }
    }
}

impl ControllerConfig {
    pub const DEFAULT_SETTLING_DELAY: Duration = Duration::from_millis(150);

    pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.1;

    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

    /// Returns the default configuration with overrides from the environment applied.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(ms) = env_override::<u64>("GESTURE_SETTLING_DELAY_MS")? {
            config.settling_delay = Duration::from_millis(ms);
        }
        if let Some(factor) = env_override::<f32>("GESTURE_SMOOTHING")? {
            config.smoothing_factor = factor;
        }
        if let Some(ms) = env_override::<u64>("GESTURE_DROPOUT_GRACE_MS")? {
            config.dropout_grace = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Sets how long a raw gesture must be reported before it is confirmed.
    pub fn settling_delay(self, settling_delay: Duration) -> Self {
        Self {
            settling_delay,
            ..self
        }
    }

    /// Sets how long a confirmed gesture survives contrary classifications.
    ///
    /// Defaults to zero: a confirmed gesture is released on the first tick that reports something
    /// else.
    pub fn dropout_grace(self, dropout_grace: Duration) -> Self {
        Self {
            dropout_grace,
            ..self
        }
    }

    /// Sets the exponential smoothing factor, in `(0, 1)`. Smaller values lag more and jitter
    /// less.
    pub fn smoothing_factor(self, smoothing_factor: f32) -> Self {
        Self {
            smoothing_factor,
            ..self
        }
    }

    pub fn rotation_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity.rotation = sensitivity;
        self
    }

    pub fn pan_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity.pan = sensitivity;
        self
    }

    pub fn scale_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity.scale = sensitivity;
        self
    }

    /// Replaces the gesture catalogue.
    pub fn catalogue(self, catalogue: Catalogue) -> Self {
        Self { catalogue, ..self }
    }

    /// Appends a gesture to the catalogue.
    pub fn gesture(mut self, template: GestureTemplate) -> Self {
        self.catalogue = self.catalogue.with(template);
        self
    }

    /// Overrides the acceptance threshold of the gesture called `name`.
    pub fn threshold(mut self, name: impl Into<String>, threshold: f32) -> Self {
        self.thresholds.insert(name.into(), threshold);
        self
    }

    pub fn curl_thresholds(self, curl_thresholds: CurlThresholds) -> Self {
        Self {
            curl_thresholds,
            ..self
        }
    }

    /// Normalizes palm motion to the given camera frame size.
    pub fn frame_size(self, frame_size: FrameSize) -> Self {
        Self {
            frame_size: Some(frame_size),
            ..self
        }
    }

    /// Sets the sampling period of the tick loop driving the controller.
    pub fn tick_interval(self, tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            ..self
        }
    }

    /// Sampling period set with [`tick_interval`][Self::tick_interval].
    pub fn tick_interval_value(&self) -> Duration {
        self.tick_interval
    }

    /// Returns the catalogue with all threshold overrides applied.
    pub fn resolved_catalogue(&self) -> anyhow::Result<Catalogue> {
        let mut catalogue = self.catalogue.clone();
        for (name, &threshold) in &self.thresholds {
            catalogue.set_threshold(name, threshold)?;
        }
        catalogue.validate()?;
        Ok(catalogue)
    }

    /// Checks that all parameters are within their valid ranges.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.smoothing_factor > 0.0 && self.smoothing_factor < 1.0,
            "smoothing factor must be in (0, 1), got {}",
            self.smoothing_factor
        );

        let s = &self.sensitivity;
        for (name, value) in [("rotation", s.rotation), ("pan", s.pan), ("scale", s.scale)] {
            ensure!(value.is_finite(), "{name} sensitivity must be finite, got {value}");
        }

        let c = &self.curl_thresholds;
        ensure!(
            0.0 <= c.half_curl_above && c.half_curl_above < c.no_curl_above && c.no_curl_above <= 180.0,
            "curl limits must satisfy 0 <= half ({}) < none ({}) <= 180",
            c.half_curl_above,
            c.no_curl_above
        );

        if let Some(frame) = self.frame_size {
            ensure!(
                frame.width > 0.0 && frame.height > 0.0,
                "frame size must be positive, got {}x{}",
                frame.width,
                frame.height
            );
        }

        ensure!(!self.tick_interval.is_zero(), "tick interval must not be zero");

        self.resolved_catalogue()?;
        Ok(())
    }
}

fn env_override<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value set for `{name}` variable: '{value}'")),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(s)) => bail!(
            "invalid value set for `{name}` variable: {}",
            s.to_string_lossy()
        ),
    }
}
