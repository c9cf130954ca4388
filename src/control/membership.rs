//! Fuzzy membership degrees.
//!
//! A degree is a `u8` in `[0, 255]`: 0 is "not at all", 255 is "fully".
//! Fuzzy AND is `min`, fuzzy OR is `max`; neither can leave the range,
//! and construction from wider integers saturates.

/// Degree of membership in a fuzzy set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Membership(u8);

impl Membership {
    pub const NONE: Self = Self(0);
    pub const FULL: Self = Self(255);

    pub const fn new(degree: u8) -> Self {
        Self(degree)
    }

    /// Saturate an arbitrary integer into `[0, 255]`.
    pub const fn saturating(degree: i32) -> Self {
        if degree <= 0 {
            Self::NONE
        } else if degree >= 255 {
            Self::FULL
        } else {
            Self(degree as u8)
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Fuzzy AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.min(other)
    }

    /// Fuzzy OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.max(other)
    }

    #[must_use]
    pub const fn complement(self) -> Self {
        Self(255 - self.0)
    }

    /// Linear ramp: `255 * x / threshold`, saturated.  A non-positive
    /// threshold degenerates to a step at zero.
    pub const fn ramp(x: i32, threshold: i32) -> Self {
        if threshold <= 0 {
            return if x > 0 { Self::FULL } else { Self::NONE };
        }
        let degree = (255 * x as i64) / threshold as i64;
        if degree >= 255 {
            Self::FULL
        } else if degree <= 0 {
            Self::NONE
        } else {
            Self(degree as u8)
        }
    }
}

impl From<Membership> for i32 {
    fn from(m: Membership) -> Self {
        i32::from(m.0)
    }
}

/// Speed-error memberships for `error = target - measured`.
///
/// `high`: measured above target (too fast).  `low`: measured below
/// target (too slow).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorMemberships {
    pub low: Membership,
    pub ok: Membership,
    pub high: Membership,
}

impl ErrorMemberships {
    /// Triangular fuzzification over `±threshold`.
    pub fn fuzzify(error: i32, threshold: i32) -> Self {
        if error < 0 {
            let high = Membership::ramp(error.saturating_neg(), threshold);
            Self {
                low: Membership::NONE,
                ok: high.complement(),
                high,
            }
        } else {
            let low = Membership::ramp(error, threshold);
            Self {
                low,
                ok: low.complement(),
                high: Membership::NONE,
            }
        }
    }

    pub fn sum(&self) -> u32 {
        u32::from(self.low.value()) + u32::from(self.ok.value()) + u32::from(self.high.value())
    }
}

/// Speed-trend memberships for `derivative = measured - previous`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivativeMemberships {
    pub decreasing: Membership,
    pub steady: Membership,
    pub increasing: Membership,
}

impl DerivativeMemberships {
    pub fn fuzzify(derivative: i32, threshold: i32) -> Self {
        if derivative < 0 {
            let decreasing = Membership::ramp(derivative.saturating_neg(), threshold);
            Self {
                decreasing,
                steady: decreasing.complement(),
                increasing: Membership::NONE,
            }
        } else {
            let increasing = Membership::ramp(derivative, threshold);
            Self {
                decreasing: Membership::NONE,
                steady: increasing.complement(),
                increasing,
            }
        }
    }

    pub fn sum(&self) -> u32 {
        u32::from(self.decreasing.value())
            + u32::from(self.steady.value())
            + u32::from(self.increasing.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_or_are_min_max() {
        let a = Membership::new(40);
        let b = Membership::new(200);
        assert_eq!(a.and(b), a);
        assert_eq!(a.or(b), b);
        assert_eq!(a.complement().value(), 215);
    }

    #[test]
    fn saturating_clamps_both_ends() {
        assert_eq!(Membership::saturating(-5), Membership::NONE);
        assert_eq!(Membership::saturating(300), Membership::FULL);
        assert_eq!(Membership::saturating(17).value(), 17);
    }

    #[test]
    fn ramp_saturates_at_threshold() {
        assert_eq!(Membership::ramp(0, 20), Membership::NONE);
        assert_eq!(Membership::ramp(10, 20).value(), 127);
        assert_eq!(Membership::ramp(20, 20), Membership::FULL);
        assert_eq!(Membership::ramp(i32::MAX, 20), Membership::FULL);
        assert_eq!(Membership::ramp(5, 0), Membership::FULL);
    }

    #[test]
    fn error_sets_follow_sign() {
        let too_slow = ErrorMemberships::fuzzify(100, 80);
        assert_eq!(too_slow.low, Membership::FULL);
        assert_eq!(too_slow.high, Membership::NONE);

        let too_fast = ErrorMemberships::fuzzify(-40, 80);
        assert_eq!(too_fast.high.value(), 127);
        assert_eq!(too_fast.ok.value(), 128);
        assert_eq!(too_fast.low, Membership::NONE);

        assert_eq!(ErrorMemberships::fuzzify(0, 80).ok, Membership::FULL);
    }

    #[test]
    fn derivative_sets_follow_sign() {
        let falling = DerivativeMemberships::fuzzify(-80, 80);
        assert_eq!(falling.decreasing, Membership::FULL);
        assert_eq!(falling.steady, Membership::NONE);

        let rising = DerivativeMemberships::fuzzify(20, 80);
        assert_eq!(rising.increasing.value(), 63);
        assert_eq!(rising.sum(), 255);
    }
}
