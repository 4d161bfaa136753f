use serde::{Deserialize, Serialize};
use std::fmt;

/// A share of a total expressed in the range 0..=100 (outside it only when
/// upstream counters are inconsistent).
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Percentage {
    /// `part / total * 100`, or zero when there is nothing to divide by so the
    /// JSON payload never carries NaN.
    pub fn of(part: f64, total: u64) -> Self {
        if total == 0 {
            return Percentage::zero();
        }
        Percentage(part / total as f64 * 100.0)
    }

    pub fn zero() -> Self {
        Percentage(0.0)
    }

    pub fn to_f64(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}
