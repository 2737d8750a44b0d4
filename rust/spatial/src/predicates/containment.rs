// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Overlap and containment of solids.
//!
//! Both take a negative offset: the first operand is eroded by its
//! magnitude before the comparison, so contact within that band does not
//! count as shared interior.
//!
//! Overlap samples interior probes first and falls back to an exact walk
//! from the points where the two surfaces cross.

use std::ptr;

use ifcql_geometry::{Point3, Triangle, TriangleMesh, Vector3};
use smallvec::SmallVec;

use super::Evaluator;
use crate::repository::MeshPair;

/// Steps taken from a surface crossing into the shared interior
const CROSSING_STEPS: usize = 16;
const CROSSING_GROWTH: f64 = 1.5;
const CROSSING_MIN_STEP: f64 = 1e-6;
/// Below this the two inward normals cancel: opposed faces in contact
const OPPOSED_EPSILON: f64 = 1e-6;

impl<'a> Evaluator<'a> {
    /// Whether the interior of `a` eroded by `|negative_offset|` meets the
    /// interior of `b`
    pub fn overlap(&self, a: &TriangleMesh, b: &TriangleMesh, negative_offset: f64) -> bool {
        if ptr::eq(a, b) {
            return true;
        }
        let erosion = negative_offset.abs();
        if !a.bounds().expanded(-erosion).intersects(b.bounds(), 0.0) {
            return false;
        }

        // Boundary of b reaching into eroded a
        if self
            .probes(b, 0.0)
            .iter()
            .any(|p| self.depth(a, p) > erosion)
        {
            return true;
        }

        // Eroded a reaching into b, for b enclosing it
        if self
            .probes(a, erosion)
            .iter()
            .any(|p| self.depth(b, p) > 0.0)
        {
            return true;
        }

        self.surfaces_cross(a, b, erosion)
    }

    /// Whether the surfaces of `a` and `b` cross into a region deeper than
    /// `erosion` inside `a` and inside `b`.
    ///
    /// Catches interpenetration thinner than the probe spacing. From every
    /// point where an edge of one mesh pierces a triangle of the other, walks
    /// along the sum of the two inward normals with growing steps.
    fn surfaces_cross(&self, a: &TriangleMesh, b: &TriangleMesh, erosion: f64) -> bool {
        let slack = self.config.distance.round_to_zero;
        let (ia, ib) = (self.index(a), self.index(b));

        ia.pairs_within(&ib, 0.0).into_iter().any(|(ta, tb)| {
            let inward = -(a.outward_normal(ta) + b.outward_normal(tb));
            let Some(inward) = inward.try_normalize(OPPOSED_EPSILON) else {
                return false;
            };
            crossings(ta, tb).iter().any(|x| {
                let mut step = (erosion + slack).max(CROSSING_MIN_STEP);
                for _ in 0..CROSSING_STEPS {
                    let q = x + inward * step;
                    if !a.bounds().contains_point(&q) || !b.bounds().contains_point(&q) {
                        return false;
                    }
                    if self.depth(a, &q) > erosion.max(slack) && self.depth(b, &q) > slack {
                        return true;
                    }
                    step *= CROSSING_GROWTH;
                }
                false
            })
        })
    }

    /// Overlap at the configured negative offset
    pub fn overlap_default(&self, a: &TriangleMesh, b: &TriangleMesh) -> bool {
        self.overlap(a, b, self.config.overlap_negative_offset())
    }

    /// Whether `b` lies entirely inside `a` eroded by `|negative_offset|`.
    ///
    /// Directional: `contain(a, b)` and `contain(b, a)` differ.
    pub fn contain(&self, a: &TriangleMesh, b: &TriangleMesh, negative_offset: f64) -> bool {
        if ptr::eq(a, b) {
            return true;
        }
        let erosion = negative_offset.abs();
        let slack = self.config.distance.round_to_zero;
        if !a.bounds().expanded(-erosion).contains(b.bounds(), slack) {
            return false;
        }

        let density = self.config.probe.samples_per_area;
        let inner = self.samples_at(b, density);
        let b_inside = b
            .vertices()
            .iter()
            .chain(inner.points())
            .all(|p| self.depth(a, p) >= erosion - slack);
        if !b_inside {
            return false;
        }

        // The surface of a must not pass through the interior of b
        let outer = self.samples_at(a, density);
        !a.vertices()
            .iter()
            .chain(outer.points())
            .any(|p| self.depth(b, p) > slack)
    }

    /// Containment at the configured negative offset
    pub fn contain_default(&self, a: &TriangleMesh, b: &TriangleMesh) -> bool {
        self.contain(a, b, self.config.contain_negative_offset())
    }

    /// Either mesh contains the other at zero offset
    pub fn nested(&self, a: &TriangleMesh, b: &TriangleMesh) -> bool {
        self.contain(a, b, 0.0) || self.contain(b, a, 0.0)
    }

    pub fn overlap_pairs(&self, pairs: &[MeshPair], negative_offset: f64) -> Vec<MeshPair> {
        Self::filter_pairs(pairs, |a, b| self.overlap(a, b, negative_offset))
    }

    pub fn contain_pairs(&self, pairs: &[MeshPair], negative_offset: f64) -> Vec<MeshPair> {
        Self::filter_pairs(pairs, |a, b| self.contain(a, b, negative_offset))
    }
}

/// Points where an edge of either triangle pierces the other
fn crossings(ta: &Triangle, tb: &Triangle) -> SmallVec<[Point3<f64>; 6]> {
    let mut points = SmallVec::new();
    for (face, other) in [(ta, tb), (tb, ta)] {
        for (p, q) in other.edges() {
            if let Some(t) = face.segment_intersection(&p, &q) {
                let d: Vector3<f64> = q - p;
                points.push(p + d * t);
            }
        }
    }
    points
}
