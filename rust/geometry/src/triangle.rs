// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangle with eagerly computed derived geometry
//!
//! A triangle is built once and never mutated. Edge vectors, normal, area,
//! centroid, bounds and the coefficients of the closest-point quadratic form
//! are computed in the constructor so distance queries only pay for the
//! per-point terms.

use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::{Point3, Vector3};

use crate::bounds::BoundingBox;
use crate::ray::Ray;

/// Relative determinant threshold below which a triangle counts as degenerate
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Minimum ray parameter accepted as a hit (rejects self hits at the origin)
const RAY_EPSILON: f64 = 1e-12;

static NEXT_TRIANGLE_ID: AtomicU64 = AtomicU64::new(1);

/// Immutable triangle A, B, C
#[derive(Debug, Clone)]
pub struct Triangle {
    id: u64,
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
    indices: Option<[u32; 3]>,
    ab: Vector3<f64>,
    ac: Vector3<f64>,
    bc: Vector3<f64>,
    normal: Vector3<f64>,
    double_area: f64,
    centroid: Point3<f64>,
    bounds: BoundingBox,
    // Quadratic form of the closest-point problem
    a00: f64,
    a01: f64,
    a11: f64,
    det: f64,
}

impl Triangle {
    /// Create a triangle from three vertices
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self::build(a, b, c, None)
    }

    /// Create a triangle that remembers the mesh vertex indices it came from
    pub fn with_indices(
        a: Point3<f64>,
        b: Point3<f64>,
        c: Point3<f64>,
        indices: [u32; 3],
    ) -> Self {
        Self::build(a, b, c, Some(indices))
    }

    fn build(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>, indices: Option<[u32; 3]>) -> Self {
        let ab = b - a;
        let ac = c - a;
        let bc = c - b;
        let cross = ab.cross(&ac);
        let double_area = cross.norm();
        let normal = cross
            .try_normalize(f64::MIN_POSITIVE)
            .unwrap_or_else(Vector3::zeros);

        let a00 = ab.norm_squared();
        let a01 = ab.dot(&ac);
        let a11 = ac.norm_squared();
        let det = (a00 * a11 - a01 * a01).abs();

        Self {
            id: NEXT_TRIANGLE_ID.fetch_add(1, Ordering::Relaxed),
            a,
            b,
            c,
            indices,
            ab,
            ac,
            bc,
            normal,
            double_area,
            centroid: Point3::from((a.coords + b.coords + c.coords) / 3.0),
            bounds: BoundingBox::from_corners(a, b).union(&BoundingBox::from_point(c)),
            a00,
            a01,
            a11,
            det,
        }
    }

    /// Process-wide identity, independent of vertex equality
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn a(&self) -> &Point3<f64> {
        &self.a
    }

    #[inline]
    pub fn b(&self) -> &Point3<f64> {
        &self.b
    }

    #[inline]
    pub fn c(&self) -> &Point3<f64> {
        &self.c
    }

    #[inline]
    pub fn vertices(&self) -> [Point3<f64>; 3] {
        [self.a, self.b, self.c]
    }

    /// Original mesh vertex indices, when built from an indexed mesh
    #[inline]
    pub fn vertex_indices(&self) -> Option<[u32; 3]> {
        self.indices
    }

    #[inline]
    pub fn ab(&self) -> &Vector3<f64> {
        &self.ab
    }

    #[inline]
    pub fn ac(&self) -> &Vector3<f64> {
        &self.ac
    }

    #[inline]
    pub fn bc(&self) -> &Vector3<f64> {
        &self.bc
    }

    /// Unit normal `normalize(AB x AC)`, zero for degenerate triangles
    #[inline]
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// Geometric area (half the cross-product magnitude)
    #[inline]
    pub fn area(&self) -> f64 {
        self.double_area * 0.5
    }

    /// Raw magnitude of `AB x AC`
    #[inline]
    pub fn double_area(&self) -> f64 {
        self.double_area
    }

    #[inline]
    pub fn centroid(&self) -> &Point3<f64> {
        &self.centroid
    }

    #[inline]
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Near-zero area: closest-point queries fall back to the vertices
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.det <= DEGENERATE_EPSILON * self.a00 * self.a11
    }

    /// The three edges as `(start, end)` pairs
    #[inline]
    pub fn edges(&self) -> [(Point3<f64>, Point3<f64>); 3] {
        [(self.a, self.b), (self.b, self.c), (self.c, self.a)]
    }

    /// Closest point of the triangle to `point`.
    ///
    /// Classic barycentric region classification: the point is projected
    /// into the `(s, t)` parameter plane of `A + s*AB + t*AC` and the
    /// minimum of the quadratic form is taken over the region it lands in
    /// (interior, one of three edges, or one of three vertices).
    pub fn closest_point(&self, point: &Point3<f64>) -> Point3<f64> {
        if self.is_degenerate() {
            return self.nearest_vertex(point);
        }

        let (a00, a01, a11, det) = (self.a00, self.a01, self.a11, self.det);
        let diff = self.a - point;
        let b0 = diff.dot(&self.ab);
        let b1 = diff.dot(&self.ac);

        let mut s = a01 * b1 - a11 * b0;
        let mut t = a01 * b0 - a00 * b1;

        if s + t <= det {
            if s < 0.0 {
                if t < 0.0 {
                    // region 4
                    if b0 < 0.0 {
                        t = 0.0;
                        s = if -b0 >= a00 { 1.0 } else { -b0 / a00 };
                    } else {
                        s = 0.0;
                        t = clamp_edge(b1, a11);
                    }
                } else {
                    // region 3
                    s = 0.0;
                    t = clamp_edge(b1, a11);
                }
            } else if t < 0.0 {
                // region 5
                t = 0.0;
                s = clamp_edge(b0, a00);
            } else {
                // region 0, interior
                let inv_det = 1.0 / det;
                s *= inv_det;
                t *= inv_det;
            }
        } else if s < 0.0 {
            // region 2
            let tmp0 = a01 + b0;
            let tmp1 = a11 + b1;
            if tmp1 > tmp0 {
                let numer = tmp1 - tmp0;
                let denom = a00 - 2.0 * a01 + a11;
                s = if numer >= denom { 1.0 } else { numer / denom };
                t = 1.0 - s;
            } else {
                s = 0.0;
                t = if tmp1 <= 0.0 { 1.0 } else { clamp_edge(b1, a11) };
            }
        } else if t < 0.0 {
            // region 6
            let tmp0 = a01 + b1;
            let tmp1 = a00 + b0;
            if tmp1 > tmp0 {
                let numer = tmp1 - tmp0;
                let denom = a00 - 2.0 * a01 + a11;
                t = if numer >= denom { 1.0 } else { numer / denom };
                s = 1.0 - t;
            } else {
                t = 0.0;
                s = if tmp1 <= 0.0 { 1.0 } else { clamp_edge(b0, a00) };
            }
        } else {
            // region 1
            let numer = a11 + b1 - a01 - b0;
            if numer <= 0.0 {
                s = 0.0;
                t = 1.0;
            } else {
                let denom = a00 - 2.0 * a01 + a11;
                s = if numer >= denom { 1.0 } else { numer / denom };
                t = 1.0 - s;
            }
        }

        self.a + self.ab * s + self.ac * t
    }

    /// Squared distance from `point` to the closest point of the triangle
    #[inline]
    pub fn closest_squared_distance(&self, point: &Point3<f64>) -> f64 {
        (self.closest_point(point) - point).norm_squared()
    }

    fn nearest_vertex(&self, point: &Point3<f64>) -> Point3<f64> {
        let mut best = self.a;
        let mut best_sq = (self.a - point).norm_squared();
        for v in [self.b, self.c] {
            let sq = (v - point).norm_squared();
            if sq < best_sq {
                best = v;
                best_sq = sq;
            }
        }
        best
    }

    /// Minimum over the six vertex-to-triangle queries in both directions.
    ///
    /// Edge-edge closest features are not considered, so this is an upper
    /// bound of the true distance. Use [`Triangle::squared_distance`] where
    /// near-touching triangles matter.
    pub fn min_squared_distance(&self, other: &Triangle) -> f64 {
        let forward = [self.a, self.b, self.c]
            .iter()
            .map(|v| other.closest_squared_distance(v))
            .fold(f64::INFINITY, f64::min);
        let backward = [other.a, other.b, other.c]
            .iter()
            .map(|v| self.closest_squared_distance(v))
            .fold(f64::INFINITY, f64::min);
        forward.min(backward)
    }

    /// Maximum squared distance over the nine vertex pairs
    pub fn max_squared_distance(&self, other: &Triangle) -> f64 {
        let mut max = 0.0_f64;
        for p in [self.a, self.b, self.c] {
            for q in [other.a, other.b, other.c] {
                max = max.max((p - q).norm_squared());
            }
        }
        max
    }

    /// Exact squared distance between the two triangles.
    ///
    /// Zero when an edge of either triangle passes through the other;
    /// otherwise the minimum over the vertex-triangle and edge-edge pairs.
    pub fn squared_distance(&self, other: &Triangle) -> f64 {
        if self.pierced_by(other) || other.pierced_by(self) {
            return 0.0;
        }

        let mut best = self.min_squared_distance(other);
        for (p1, q1) in self.edges() {
            for (p2, q2) in other.edges() {
                best = best.min(segment_squared_distance(&p1, &q1, &p2, &q2));
            }
        }
        best
    }

    /// Whether any edge of `other` crosses this triangle
    fn pierced_by(&self, other: &Triangle) -> bool {
        other
            .edges()
            .iter()
            .any(|(p, q)| self.segment_intersection(p, q).is_some())
    }

    /// Möller-Trumbore intersection. Returns the ray parameter of the hit.
    ///
    /// Hits on edges count; hits at `t <= epsilon` do not.
    pub fn ray_intersection(&self, ray: &Ray) -> Option<f64> {
        let t = self.intersection_parameter(&ray.origin, &ray.direction)?;
        (t > RAY_EPSILON).then_some(t)
    }

    /// Parameter in `[0, 1]` where segment `p -> q` crosses the triangle
    pub fn segment_intersection(&self, p: &Point3<f64>, q: &Point3<f64>) -> Option<f64> {
        let t = self.intersection_parameter(p, &(q - p))?;
        (0.0..=1.0).contains(&t).then_some(t)
    }

    fn intersection_parameter(&self, origin: &Point3<f64>, dir: &Vector3<f64>) -> Option<f64> {
        let h = dir.cross(&self.ac);
        let a = self.ab.dot(&h);

        // Parallel to the plane (or degenerate triangle)
        if a.abs() < DEGENERATE_EPSILON * self.ab.norm() * self.ac.norm() * dir.norm()
            || a == 0.0
        {
            return None;
        }

        let f = 1.0 / a;
        let s = origin - self.a;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&self.ab);
        let v = f * dir.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        Some(f * self.ac.dot(&q))
    }

    /// New triangle with every vertex moved by `offset`
    pub fn translated(&self, offset: &Vector3<f64>) -> Self {
        Self::build(self.a + offset, self.b + offset, self.c + offset, self.indices)
    }
}

/// Parameter minimizing the 1-D quadratic `a*x^2 + 2*b*x` on `[0, 1]`
#[inline]
fn clamp_edge(b: f64, a: f64) -> f64 {
    if b >= 0.0 {
        0.0
    } else if -b >= a {
        1.0
    } else {
        -b / a
    }
}

/// Squared distance between segments `p1 -> q1` and `p2 -> q2`
pub fn segment_squared_distance(
    p1: &Point3<f64>,
    q1: &Point3<f64>,
    p2: &Point3<f64>,
    q2: &Point3<f64>,
) -> f64 {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a <= f64::EPSILON && e <= f64::EPSILON {
        (0.0, 0.0)
    } else if a <= f64::EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= f64::EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s = if denom > 0.0 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    let c1 = p1 + d1 * s;
    let c2 = p2 + d2 * t;
    (c1 - c2).norm_squared()
}
