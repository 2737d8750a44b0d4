// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface point sampling
//!
//! Directional and equality predicates work on point clouds spread over the
//! mesh surface at a requested density (points per unit area). Sampling is
//! behind the [`PointSampler`] trait so callers can plug in their own
//! strategy; [`SurfaceSampler`] is the deterministic default.

use nalgebra::{Point3, Vector3};

use crate::mesh::TriangleMesh;

/// Points sampled on a mesh surface, with the outward normal at each point
#[derive(Debug, Clone, PartialEq)]
pub struct SampleCloud {
    density: f64,
    points: Vec<Point3<f64>>,
    normals: Vec<Vector3<f64>>,
}

impl SampleCloud {
    /// Create a cloud. `normals` must be parallel to `points`; extra
    /// entries of the longer list are dropped.
    pub fn new(density: f64, mut points: Vec<Point3<f64>>, mut normals: Vec<Vector3<f64>>) -> Self {
        let len = points.len().min(normals.len());
        points.truncate(len);
        normals.truncate(len);
        Self {
            density,
            points,
            normals,
        }
    }

    /// Samples per unit area this cloud was generated with
    #[inline]
    pub fn density(&self) -> f64 {
        self.density
    }

    #[inline]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    #[inline]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate `(point, outward normal)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Point3<f64>, &Vector3<f64>)> {
        self.points.iter().zip(self.normals.iter())
    }
}

/// Strategy that spreads points over a mesh surface
pub trait PointSampler {
    /// Sample `mesh` with roughly `per_area` points per unit of surface area
    fn sample(&self, mesh: &TriangleMesh, per_area: f64) -> SampleCloud;
}

/// Deterministic barycentric-lattice sampler.
///
/// Each triangle receives at least `ceil(area * per_area)` points (and never
/// fewer than one) on a regular lattice strictly inside the triangle, so the
/// same geometry always yields the same cloud.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceSampler;

impl SurfaceSampler {
    pub fn new() -> Self {
        Self
    }

    /// Lattice resolution `k` with `k * (k + 1) / 2 >= count`
    fn resolution(count: usize) -> usize {
        let mut k = 1;
        while k * (k + 1) / 2 < count {
            k += 1;
        }
        k
    }
}

impl PointSampler for SurfaceSampler {
    fn sample(&self, mesh: &TriangleMesh, per_area: f64) -> SampleCloud {
        let per_area = if per_area.is_finite() { per_area.max(0.0) } else { 0.0 };
        let mut points = Vec::new();
        let mut normals = Vec::new();

        for tri in mesh.triangles() {
            let wanted = (tri.area() * per_area).ceil().max(1.0) as usize;
            let k = Self::resolution(wanted);
            let step = 1.0 / k as f64;
            let normal = mesh.outward_normal(tri);

            for i in 0..k {
                for j in 0..(k - i) {
                    let u = (i as f64 + 1.0 / 3.0) * step;
                    let v = (j as f64 + 1.0 / 3.0) * step;
                    points.push(tri.a() + tri.ab() * u + tri.ac() * v);
                    normals.push(normal);
                }
            }
        }

        SampleCloud::new(per_area, points, normals)
    }
}
