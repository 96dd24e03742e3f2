//! Exponential smoothing.

/// Moves `current` towards `target` by `factor` of the remaining distance.
///
/// This is a single step of an exponential low-pass filter. With `factor` in `0.0..=1.0` the
/// result always lies between `current` and `target`.
#[inline]
pub fn smooth(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}

/// An exponential low-pass filter with a fixed smoothing factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    factor: f32,
}

impl Smoother {
    /// Creates a smoother.
    ///
    /// Smaller factors produce more lag and less jitter.
    ///
    /// # Panics
    ///
    /// Panics if `factor` is not strictly between 0.0 and 1.0.
    pub fn new(factor: f32) -> Self {
        assert!(
            factor > 0.0 && factor < 1.0,
            "smoothing factor must be in (0, 1), got {factor}"
        );
        Self { factor }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    #[inline]
    pub fn smooth(&self, current: f32, target: f32) -> f32 {
        smooth(current, target, self.factor)
    }
}

/// Exponential Moving Average – a weighted moving average whose weight decreases exponentially.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f32,
    last: Option<f32>,
}

impl Ema {
    /// Creates a new Exponential Moving Average calculator.
    ///
    /// The `alpha` parameter must be between 0.0 and 1.0 and defines how quickly the weight of
    /// older values should decay. Values close to 1.0 very strongly favor recent values over older
    /// values, while values closer to 0.0 favor more recent values less strongly.
    pub fn new(alpha: f32) -> Self {
        assert!((0.0..=1.0).contains(&alpha));
        Self { alpha, last: None }
    }

    /// Adds a new value, returning the updated average.
    pub fn push(&mut self, value: f32) -> f32 {
        let avg = match self.last {
            Some(last) => smooth(last, value, self.alpha),
            None => value,
        };
        self.last = Some(avg);
        avg
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
