// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closed scalar intervals on a single axis.

/// Closed interval `[min, max]` on one axis.
///
/// The constructor orders its endpoints, so `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    min: f64,
    max: f64,
}

impl Interval {
    /// Create an interval from two endpoints in any order
    #[inline]
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// Degenerate interval holding a single value
    #[inline]
    pub fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Smallest interval spanning every value of the sequence.
    ///
    /// Returns `None` for an empty sequence.
    pub fn union<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::point(first), |acc, v| Self {
            min: acc.min.min(v),
            max: acc.max.max(v),
        }))
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> f64 {
        (self.min + self.max) * 0.5
    }

    /// Smallest interval covering both intervals
    #[inline]
    pub fn merge(&self, other: &Interval) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow (positive offset) or shrink (negative offset) both ends.
    ///
    /// Shrinking past the center collapses to the center instead of inverting.
    pub fn expanded(&self, offset: f64) -> Self {
        let min = self.min - offset;
        let max = self.max + offset;
        if min <= max {
            Self { min, max }
        } else {
            Self::point(self.center())
        }
    }

    #[inline]
    pub fn contains_value(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Overlap test where each interval is widened by `offset`
    #[inline]
    pub fn overlaps(&self, other: &Interval, offset: f64) -> bool {
        self.min <= other.max + offset && other.min <= self.max + offset
    }

    /// Whether `other` lies inside `self` widened by `offset`
    #[inline]
    pub fn contains(&self, other: &Interval, offset: f64) -> bool {
        self.min - offset <= other.min && other.max <= self.max + offset
    }

    /// Gap between the intervals, zero when they overlap
    #[inline]
    pub fn gap(&self, other: &Interval) -> f64 {
        if other.min > self.max {
            other.min - self.max
        } else if self.min > other.max {
            self.min - other.max
        } else {
            0.0
        }
    }

    /// Distance from a value to the interval, zero inside
    #[inline]
    pub fn distance_to(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_orders_endpoints() {
        let i = Interval::new(3.0, -1.0);
        assert_eq!(i.min(), -1.0);
        assert_eq!(i.max(), 3.0);
        assert_eq!(i.length(), 4.0);
    }

    #[test]
    fn union_spans_values() {
        let i = Interval::union([2.0, -4.0, 7.5, 0.0]).unwrap();
        assert_eq!(i, Interval::new(-4.0, 7.5));
        assert!(Interval::union(std::iter::empty()).is_none());
    }

    #[test]
    fn overlap_with_offset() {
        let a = Interval::new(0.0, 1.0);
        let b = Interval::new(1.05, 2.0);
        assert!(!a.overlaps(&b, 0.0));
        assert!(a.overlaps(&b, 0.1));
        // Touching endpoints count as overlap at zero offset
        assert!(a.overlaps(&Interval::new(1.0, 2.0), 0.0));
        // Negative offset demands real penetration
        assert!(!a.overlaps(&Interval::new(1.0, 2.0), -0.01));
    }

    #[test]
    fn contains_with_offset() {
        let outer = Interval::new(0.0, 10.0);
        assert!(outer.contains(&Interval::new(2.0, 8.0), 0.0));
        assert!(!outer.contains(&Interval::new(-0.05, 8.0), 0.0));
        assert!(outer.contains(&Interval::new(-0.05, 8.0), 0.1));
    }

    #[test]
    fn shrinking_never_inverts() {
        let i = Interval::new(0.0, 1.0).expanded(-2.0);
        assert_eq!(i, Interval::point(0.5));
        assert!(i.min() <= i.max());
    }

    #[test]
    fn gap_and_distance() {
        let a = Interval::new(0.0, 1.0);
        assert_eq!(a.gap(&Interval::new(3.0, 4.0)), 2.0);
        assert_eq!(a.gap(&Interval::new(0.5, 4.0)), 0.0);
        assert_eq!(a.distance_to(-2.0), 2.0);
        assert_eq!(a.distance_to(0.3), 0.0);
    }
}
