/// Domain interface for temporal smoothing of a subject's horizontal center.
pub trait PositionSmoother: Send {
    fn smooth(&self, previous: f64, current: f64) -> f64;
}

/// EMA (Exponential Moving Average) smoother.
///
/// Formula: `ema[t] = alpha * current + (1 - alpha) * ema[t-1]`
/// Lower alpha is smoother and slower to react.
pub struct ExponentialSmoother {
    alpha: f64,
}

impl ExponentialSmoother {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl PositionSmoother for ExponentialSmoother {
    fn smooth(&self, previous: f64, current: f64) -> f64 {
        self.alpha * current + (1.0 - self.alpha) * previous
    }
}
