// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Axis-aligned bounding boxes with tolerance-aware tests.
//!
//! Every test takes an `offset` so broad-phase pruning can be widened
//! (positive) or tightened (negative) to match the tolerance band of the
//! narrow-phase predicate that follows it.

use nalgebra::{Point3, Vector3};

use crate::interval::Interval;
use crate::ray::Ray;

/// Axis-aligned box made of one interval per axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl BoundingBox {
    /// Create a box from its intervals
    #[inline]
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Box spanning two corner points (in any order)
    #[inline]
    pub fn from_corners(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            x: Interval::new(a.x, b.x),
            y: Interval::new(a.y, b.y),
            z: Interval::new(a.z, b.z),
        }
    }

    /// Degenerate box around a single point
    #[inline]
    pub fn from_point(p: Point3<f64>) -> Self {
        Self {
            x: Interval::point(p.x),
            y: Interval::point(p.y),
            z: Interval::point(p.z),
        }
    }

    /// Tight box around a point set, `None` when empty
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let first = Self::from_point(*iter.next()?);
        Some(iter.fold(first, |acc, p| acc.union(&Self::from_point(*p))))
    }

    /// Smallest box covering a sequence of boxes, `None` when empty
    pub fn union_all<I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = BoundingBox>,
    {
        let mut iter = boxes.into_iter();
        let first = iter.next()?;
        Some(iter.fold(first, |acc, b| acc.union(&b)))
    }

    #[inline]
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            x: self.x.merge(&other.x),
            y: self.y.merge(&other.y),
            z: self.z.merge(&other.z),
        }
    }

    #[inline]
    pub fn axis(&self, axis: usize) -> &Interval {
        match axis {
            0 => &self.x,
            1 => &self.y,
            _ => &self.z,
        }
    }

    #[inline]
    pub fn min(&self) -> Point3<f64> {
        Point3::new(self.x.min(), self.y.min(), self.z.min())
    }

    #[inline]
    pub fn max(&self) -> Point3<f64> {
        Point3::new(self.x.max(), self.y.max(), self.z.max())
    }

    #[inline]
    pub fn center(&self) -> Point3<f64> {
        Point3::new(self.x.center(), self.y.center(), self.z.center())
    }

    #[inline]
    pub fn extent(&self) -> Vector3<f64> {
        Vector3::new(self.x.length(), self.y.length(), self.z.length())
    }

    /// Half the surface area, used as the packing cost metric
    #[inline]
    pub fn half_area(&self) -> f64 {
        let e = self.extent();
        e.x * e.y + e.y * e.z + e.z * e.x
    }

    /// Grow (positive) or shrink (negative) the box on every side
    pub fn expanded(&self, offset: f64) -> Self {
        Self {
            x: self.x.expanded(offset),
            y: self.y.expanded(offset),
            z: self.z.expanded(offset),
        }
    }

    /// Intersection test with both boxes widened by `offset`
    #[inline]
    pub fn intersects(&self, other: &BoundingBox, offset: f64) -> bool {
        self.x.overlaps(&other.x, offset)
            && self.y.overlaps(&other.y, offset)
            && self.z.overlaps(&other.z, offset)
    }

    /// Whether `other` lies inside `self` widened by `offset`
    #[inline]
    pub fn contains(&self, other: &BoundingBox, offset: f64) -> bool {
        self.x.contains(&other.x, offset)
            && self.y.contains(&other.y, offset)
            && self.z.contains(&other.z, offset)
    }

    #[inline]
    pub fn contains_point(&self, p: &Point3<f64>) -> bool {
        self.x.contains_value(p.x) && self.y.contains_value(p.y) && self.z.contains_value(p.z)
    }

    /// Squared distance from a point to the box, zero inside
    #[inline]
    pub fn squared_distance_to_point(&self, p: &Point3<f64>) -> f64 {
        let dx = self.x.distance_to(p.x);
        let dy = self.y.distance_to(p.y);
        let dz = self.z.distance_to(p.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Squared gap between two boxes, zero when they intersect
    #[inline]
    pub fn squared_distance(&self, other: &BoundingBox) -> f64 {
        let dx = self.x.gap(&other.x);
        let dy = self.y.gap(&other.y);
        let dz = self.z.gap(&other.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Whether every endpoint differs from `other` by at most `tolerance`
    pub fn matches(&self, other: &BoundingBox, tolerance: f64) -> bool {
        let a = [self.min(), self.max()];
        let b = [other.min(), other.max()];
        a.iter()
            .zip(b.iter())
            .all(|(p, q)| (p - q).amax() <= tolerance)
    }

    /// Slab test. Returns the parameter interval `(t_enter, t_exit)` of the
    /// ray inside the box, clipped to `t >= 0`.
    pub fn ray_entry(&self, ray: &Ray) -> Option<(f64, f64)> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;
        let inv = ray.inv_direction();

        for axis in 0..3 {
            let interval = self.axis(axis);
            let origin = ray.origin[axis];
            if inv[axis].is_infinite() {
                // Parallel to the slab: inside or never
                if origin < interval.min() || origin > interval.max() {
                    return None;
                }
                continue;
            }
            let t0 = (interval.min() - origin) * inv[axis];
            let t1 = (interval.max() - origin) * inv[axis];
            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            t_min = t_min.max(near);
            t_max = t_max.min(far);
            if t_min > t_max {
                return None;
            }
        }

        Some((t_min, t_max))
    }
}
