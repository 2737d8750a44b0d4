// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named triangle meshes of building elements

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use nalgebra::{Point3, Vector3};

use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use crate::sampler::SampleCloud;
use crate::triangle::Triangle;

static NEXT_MESH_UID: AtomicU64 = AtomicU64::new(1);

/// Triangulated boundary surface of one building element.
///
/// The name doubles as the join key back to the originating model entity.
/// Triangles and bounds are fixed once built; the only mutable state is the
/// optional sample cloud attached by a point sampler.
#[derive(Debug)]
pub struct TriangleMesh {
    uid: u64,
    name: String,
    triangles: Vec<Triangle>,
    bounds: BoundingBox,
    signed_volume: f64,
    samples: RwLock<Option<Arc<SampleCloud>>>,
}

impl TriangleMesh {
    /// Create a mesh from prebuilt triangles
    pub fn new(name: impl Into<String>, triangles: Vec<Triangle>) -> Result<Self> {
        let name = name.into();

        for (i, tri) in triangles.iter().enumerate() {
            if tri.vertices().iter().any(|v| !v.coords.iter().all(|c| c.is_finite())) {
                return Err(Error::NonFiniteCoordinate {
                    mesh: name,
                    vertex: i * 3,
                });
            }
        }

        let bounds = BoundingBox::union_all(triangles.iter().map(|t| *t.bounds()))
            .ok_or_else(|| Error::EmptyMesh(name.clone()))?;

        let degenerate = triangles.iter().filter(|t| t.is_degenerate()).count();
        if degenerate > 0 {
            tracing::debug!(mesh = %name, degenerate, "Mesh contains degenerate triangles");
        }

        // Signed tetrahedron volume against the origin
        let signed_volume = triangles
            .iter()
            .map(|t| t.a().coords.dot(&t.b().coords.cross(&t.c().coords)))
            .sum::<f64>()
            / 6.0;

        Ok(Self {
            uid: NEXT_MESH_UID.fetch_add(1, Ordering::Relaxed),
            name,
            triangles,
            bounds,
            signed_volume,
            samples: RwLock::new(None),
        })
    }

    /// Create a mesh from a vertex list and triangle index triples.
    ///
    /// Triangles keep their vertex indices for shared-vertex lookups.
    pub fn from_indexed(
        name: impl Into<String>,
        positions: &[Point3<f64>],
        faces: &[[u32; 3]],
    ) -> Result<Self> {
        let name = name.into();

        if let Some(vertex) = positions
            .iter()
            .position(|p| !p.coords.iter().all(|c| c.is_finite()))
        {
            return Err(Error::NonFiniteCoordinate { mesh: name, vertex });
        }

        let mut triangles = Vec::with_capacity(faces.len());
        for face in faces {
            let mut corners = [Point3::origin(); 3];
            for (corner, &index) in corners.iter_mut().zip(face.iter()) {
                *corner = *positions
                    .get(index as usize)
                    .ok_or_else(|| Error::IndexOutOfRange {
                        mesh: name.clone(),
                        index,
                        vertex_count: positions.len(),
                    })?;
            }
            triangles.push(Triangle::with_indices(corners[0], corners[1], corners[2], *face));
        }

        Self::new(name, triangles)
    }

    /// Create a mesh from flat `(x, y, z)` position and `(i0, i1, i2)` index buffers
    pub fn from_buffers(name: impl Into<String>, positions: &[f64], indices: &[u32]) -> Result<Self> {
        let name = name.into();
        if positions.len() % 3 != 0 {
            return Err(Error::MalformedBuffer {
                mesh: name,
                len: positions.len(),
            });
        }
        if indices.len() % 3 != 0 {
            return Err(Error::MalformedBuffer {
                mesh: name,
                len: indices.len(),
            });
        }

        let points: Vec<Point3<f64>> = positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        let faces: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        Self::from_indexed(name, &points, &faces)
    }

    /// Axis-aligned box solid with 12 outward-wound triangles
    pub fn cuboid(name: impl Into<String>, min: Point3<f64>, max: Point3<f64>) -> Result<Self> {
        let b = BoundingBox::from_corners(min, max);
        let (min, max) = (b.min(), b.max());

        let positions = [
            Point3::new(min.x, min.y, min.z), // 0: front-bottom-left
            Point3::new(max.x, min.y, min.z), // 1: front-bottom-right
            Point3::new(max.x, max.y, min.z), // 2: front-top-right
            Point3::new(min.x, max.y, min.z), // 3: front-top-left
            Point3::new(min.x, min.y, max.z), // 4: back-bottom-left
            Point3::new(max.x, min.y, max.z), // 5: back-bottom-right
            Point3::new(max.x, max.y, max.z), // 6: back-top-right
            Point3::new(min.x, max.y, max.z), // 7: back-top-left
        ];

        // Counter-clockwise when viewed from outside
        let faces = [
            [0, 2, 1],
            [0, 3, 2], // z = min
            [4, 5, 6],
            [4, 6, 7], // z = max
            [0, 4, 7],
            [0, 7, 3], // x = min
            [1, 2, 6],
            [1, 6, 5], // x = max
            [0, 1, 5],
            [0, 5, 4], // y = min
            [3, 7, 6],
            [3, 6, 2], // y = max
        ];

        Self::from_indexed(name, &positions, &faces)
    }

    /// Unique identity of this mesh instance within the process
    #[inline]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Union of the triangle bounds
    #[inline]
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Enclosed volume, negative when triangles wind inward
    #[inline]
    pub fn signed_volume(&self) -> f64 {
        self.signed_volume
    }

    #[inline]
    pub fn is_outward_oriented(&self) -> bool {
        self.signed_volume >= 0.0
    }

    /// Triangle normal flipped, if needed, to point out of the solid
    #[inline]
    pub fn outward_normal(&self, triangle: &Triangle) -> Vector3<f64> {
        if self.is_outward_oriented() {
            *triangle.normal()
        } else {
            -triangle.normal()
        }
    }

    pub fn surface_area(&self) -> f64 {
        self.triangles.iter().map(Triangle::area).sum()
    }

    /// Every distinct vertex position of the mesh
    pub fn vertices(&self) -> Vec<Point3<f64>> {
        let mut seen = rustc_hash::FxHashSet::default();
        self.triangles
            .iter()
            .flat_map(|t| t.vertices())
            .filter(|v| seen.insert(vertex_key(v)))
            .collect()
    }

    /// Copy of the mesh moved by `offset`, under a new name
    pub fn translated(&self, name: impl Into<String>, offset: Vector3<f64>) -> Result<Self> {
        let triangles = self.triangles.iter().map(|t| t.translated(&offset)).collect();
        Self::new(name, triangles)
    }

    /// Currently attached sample cloud, if any
    pub fn samples(&self) -> Option<Arc<SampleCloud>> {
        match self.samples.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Attach a sample cloud, replacing any previous one
    pub fn set_samples(&self, cloud: SampleCloud) -> Arc<SampleCloud> {
        let cloud = Arc::new(cloud);
        let mut guard = match self.samples.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(Arc::clone(&cloud));
        cloud
    }

    /// Drop the attached sample cloud
    pub fn clear_samples(&self) {
        let mut guard = match self.samples.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }

    /// Reuse the attached cloud when it was sampled at `density`,
    /// otherwise build a new one with `sample` and attach it.
    pub fn samples_or_insert_with<F>(&self, density: f64, sample: F) -> Arc<SampleCloud>
    where
        F: FnOnce(&TriangleMesh) -> SampleCloud,
    {
        if let Some(cloud) = self.samples() {
            if cloud.density() == density {
                return cloud;
            }
        }
        self.set_samples(sample(self))
    }
}

/// Exact bit pattern of a vertex, used to identify shared vertices
#[inline]
pub(crate) fn vertex_key(p: &Point3<f64>) -> [u64; 3] {
    // Normalize -0.0 so coincident vertices hash alike
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cuboid_is_closed_and_outward() {
        let mesh = TriangleMesh::cuboid("wall", Point3::origin(), Point3::new(2.0, 1.0, 3.0)).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.name(), "wall");
        assert_relative_eq!(mesh.signed_volume(), 6.0, epsilon = 1e-12);
        assert!(mesh.is_outward_oriented());
        assert_relative_eq!(mesh.surface_area(), 22.0, epsilon = 1e-12);
        assert_eq!(mesh.vertices().len(), 8);
        assert_eq!(mesh.bounds().max(), Point3::new(2.0, 1.0, 3.0));

        // Every outward normal points away from the center
        let center = mesh.bounds().center();
        for t in mesh.triangles() {
            assert!(mesh.outward_normal(t).dot(&(*t.centroid() - center)) > 0.0);
        }
    }

    #[test]
    fn inward_winding_is_detected() {
        let mesh = TriangleMesh::cuboid("box", Point3::origin(), Point3::new(1.0, 1.0, 1.0)).unwrap();
        let flipped: Vec<Triangle> = mesh
            .triangles()
            .iter()
            .map(|t| Triangle::new(*t.a(), *t.c(), *t.b()))
            .collect();
        let flipped = TriangleMesh::new("flipped", flipped).unwrap();
        assert!(!flipped.is_outward_oriented());

        let t = &flipped.triangles()[0];
        assert_relative_eq!(flipped.outward_normal(t), -*t.normal());
    }

    #[test]
    fn rejects_empty_and_non_finite_input() {
        assert_eq!(
            TriangleMesh::new("empty", Vec::new()).unwrap_err(),
            Error::EmptyMesh("empty".into())
        );

        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(f64::NAN, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert!(matches!(
            TriangleMesh::from_indexed("nan", &positions, &[[0, 1, 2]]),
            Err(Error::NonFiniteCoordinate { vertex: 1, .. })
        ));

        let tri = Triangle::new(
            Point3::origin(),
            Point3::new(f64::INFINITY, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert!(matches!(
            TriangleMesh::new("inf", vec![tri]),
            Err(Error::NonFiniteCoordinate { .. })
        ));
    }

    #[test]
    fn rejects_bad_indices_and_buffers() {
        let positions = [Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)];
        assert!(matches!(
            TriangleMesh::from_indexed("bad", &positions, &[[0, 1, 7]]),
            Err(Error::IndexOutOfRange { index: 7, vertex_count: 3, .. })
        ));
        assert!(matches!(
            TriangleMesh::from_buffers("bad", &[0.0, 1.0], &[0, 1, 2]),
            Err(Error::MalformedBuffer { len: 2, .. })
        ));
    }

    #[test]
    fn from_buffers_keeps_indices() {
        let mesh = TriangleMesh::from_buffers(
            "slab",
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[0, 1, 2],
        )
        .unwrap();
        assert_eq!(mesh.triangles()[0].vertex_indices(), Some([0, 1, 2]));
    }

    #[test]
    fn translation_builds_a_new_mesh() {
        let a = TriangleMesh::cuboid("a", Point3::origin(), Point3::new(1.0, 1.0, 1.0)).unwrap();
        let b = a.translated("b", Vector3::new(10.0, 0.0, 0.0)).unwrap();
        assert_eq!(b.bounds().min().x, 10.0);
        assert_eq!(a.bounds().min().x, 0.0);
        assert_ne!(a.uid(), b.uid());
        assert_ne!(a.triangles()[0].id(), b.triangles()[0].id());
    }

    #[test]
    fn sample_cloud_cache() {
        let mesh = TriangleMesh::cuboid("a", Point3::origin(), Point3::new(1.0, 1.0, 1.0)).unwrap();
        assert!(mesh.samples().is_none());

        let mut calls = 0;
        let first = mesh.samples_or_insert_with(2.0, |_| {
            calls += 1;
            SampleCloud::new(2.0, vec![Point3::origin()], vec![Vector3::z()])
        });
        let again = mesh.samples_or_insert_with(2.0, |_| {
            calls += 1;
            SampleCloud::new(2.0, Vec::new(), Vec::new())
        });
        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &again));

        mesh.clear_samples();
        assert!(mesh.samples().is_none());
    }
}
