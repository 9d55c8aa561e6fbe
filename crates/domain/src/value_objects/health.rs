use serde::{Deserialize, Serialize};

/// A current/max pair used for hit points and energy.
///
/// `current` is clamped into `0..=max` on construction; the authority is the
/// source of truth, this only guards presentation math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pool {
    current: i64,
    max: i64,
}

impl Pool {
    pub fn new(current: i64, max: i64) -> Self {
        let max = max.max(0);
        Self {
            current: current.clamp(0, max),
            max,
        }
    }

    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Fill ratio in `0.0..=1.0`, zero for an empty pool.
    pub fn ratio(&self) -> f64 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f64 / self.max as f64
        }
    }
}
