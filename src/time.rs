//! Signed, seconds-resolution simulation clock.

use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// A signed count of seconds. Overflow is a bug, not a condition to saturate away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration(pub i64);

impl Duration {
    pub const SECOND: Duration = Duration(1);
    pub const MINUTE: Duration = Duration(60);
    pub const HOUR: Duration = Duration(3600);
    pub const DAY: Duration = Duration(86_400);
    pub const ZERO: Duration = Duration(0);
    pub const MIN: Duration = Duration(i64::MIN);
    pub const MAX: Duration = Duration(i64::MAX);

    pub const fn new(seconds: i64) -> Self {
        Duration(seconds)
    }

    pub fn abs(self) -> Duration {
        Duration(self.0.abs())
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Duration {
    type Output = Duration;
    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_is_sign_independent() {
        assert_eq!(Duration(-30).abs(), Duration(30));
        assert_eq!(Duration(30).abs(), Duration(30));
    }

    #[test]
    fn constants_match_seconds() {
        assert_eq!(Duration::HOUR, Duration(60) + Duration(3540));
        assert_eq!(Duration::DAY.0, 24 * Duration::HOUR.0);
    }
}
