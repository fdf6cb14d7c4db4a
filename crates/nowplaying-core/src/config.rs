/// Tuning for the position estimator.
///
/// Both values assume the caller polls roughly once per second. They are
/// approximations of how coarse session timelines behave, not a contract of any
/// platform media API.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EstimatorConfig {
    /// Seconds added per call while the raw position has not advanced.
    pub extrapolation_step_secs: f64,
    /// Forward bias applied when the raw position advances, since sessions report
    /// the start of their last measured interval.
    pub lookahead_secs: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            extrapolation_step_secs: 1.0,
            lookahead_secs: 1.0,
        }
    }
}

impl EstimatorConfig {
    /// Replace negative or non-finite values with the defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let pick = |value: f64, fallback: f64| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                fallback
            }
        };
        Self {
            extrapolation_step_secs: pick(
                self.extrapolation_step_secs,
                defaults.extrapolation_step_secs,
            ),
            lookahead_secs: pick(self.lookahead_secs, defaults.lookahead_secs),
        }
    }
}
