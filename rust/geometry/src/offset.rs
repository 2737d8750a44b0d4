// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex offsetting of closed meshes
//!
//! Each shared vertex is moved so that every distinct face plane around it
//! shifts by the requested distance along its outward normal. For a vertex
//! with normals `n_i` the displacement `v` solves `n_i . v = d` in the
//! least-squares sense. A positive distance dilates the solid, a negative
//! one erodes it.

use nalgebra::{Matrix3, Vector3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::Result;
use crate::mesh::{vertex_key, TriangleMesh};
use crate::triangle::Triangle;

/// Normals closer than this (by dot product) count as the same plane
const COPLANAR_DOT: f64 = 1.0 - 1e-9;

/// Cap on displacement length relative to `|distance|` at sharp vertices
const MAX_MITER: f64 = 4.0;

/// Singular values below this are treated as zero by the solver
const SOLVE_EPSILON: f64 = 1e-9;

type NormalFan = SmallVec<[Vector3<f64>; 6]>;

impl TriangleMesh {
    /// Copy of the mesh with every face moved `distance` along its outward
    /// normal. The result keeps the mesh name.
    ///
    /// Eroding by more than half the thickness of the solid folds the result
    /// inside out; callers that need depth guarantees should verify them
    /// against the original mesh.
    pub fn offset(&self, distance: f64) -> Result<TriangleMesh> {
        if distance == 0.0 {
            let triangles = self
                .triangles()
                .iter()
                .map(|t| t.translated(&Vector3::zeros()))
                .collect();
            return TriangleMesh::new(self.name(), triangles);
        }

        let mut fans: FxHashMap<[u64; 3], NormalFan> = FxHashMap::default();
        for tri in self.triangles() {
            if tri.is_degenerate() {
                continue;
            }
            let normal = self.outward_normal(tri);
            for v in tri.vertices() {
                let fan = fans.entry(vertex_key(&v)).or_default();
                if !fan.iter().any(|n| n.dot(&normal) > COPLANAR_DOT) {
                    fan.push(normal);
                }
            }
        }

        let displacements: FxHashMap<[u64; 3], Vector3<f64>> = fans
            .into_iter()
            .map(|(key, fan)| (key, displacement(&fan, distance)))
            .collect();

        let moved = |p: &nalgebra::Point3<f64>| {
            p + displacements
                .get(&vertex_key(p))
                .copied()
                .unwrap_or_else(Vector3::zeros)
        };

        let triangles = self
            .triangles()
            .iter()
            .map(|t| {
                let (a, b, c) = (moved(t.a()), moved(t.b()), moved(t.c()));
                match t.vertex_indices() {
                    Some(indices) => Triangle::with_indices(a, b, c, indices),
                    None => Triangle::new(a, b, c),
                }
            })
            .collect();

        TriangleMesh::new(self.name(), triangles)
    }
}

/// Least-squares displacement moving each plane of the fan by `distance`
fn displacement(fan: &[Vector3<f64>], distance: f64) -> Vector3<f64> {
    match fan {
        [] => Vector3::zeros(),
        [n] => n * distance,
        _ => {
            let mut normal_matrix = Matrix3::zeros();
            let mut rhs = Vector3::zeros();
            for n in fan {
                normal_matrix += n * n.transpose();
                rhs += n * distance;
            }

            let solved = normal_matrix
                .svd(true, true)
                .solve(&rhs, SOLVE_EPSILON)
                .ok()
                .filter(|v| v.iter().all(|c| c.is_finite()));

            let v = match solved {
                Some(v) => v,
                None => {
                    let mean: Vector3<f64> = fan.iter().sum();
                    mean.try_normalize(f64::MIN_POSITIVE)
                        .map(|m| m * distance)
                        .unwrap_or_else(Vector3::zeros)
                }
            };

            let limit = MAX_MITER * distance.abs();
            let len = v.norm();
            if len > limit {
                v * (limit / len)
            } else {
                v
            }
        }
    }
}
