// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial predicate operators.
//!
//! Every operator is a method on [`Evaluator`] with a single-pair form
//! taking two meshes and a batch form taking a slice of [`MeshPair`]s and
//! returning the surviving pairs in their original order. Each test runs a
//! bounding-box broad phase first and a narrow phase against per-mesh
//! triangle indexes afterwards.
//!
//! Solid predicates classify points with [`Evaluator::depth`]: the distance
//! to the mesh surface, positive inside and negative outside. Inside/outside
//! is decided by ray parity, voted over three skewed ray directions so a
//! ray grazing an edge cannot flip the result on its own.

mod containment;
mod directional;
mod distance;
mod equal;
mod touch;

pub use distance::MeshDistance;

use std::cell::RefCell;
use std::sync::Arc;

use ifcql_geometry::{Point3, PointSampler, Ray, SampleCloud, Triangle, TriangleMesh, Vector3};
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::direction::DirectionRegistry;
use crate::index::SpatialIndex;
use crate::repository::MeshPair;

/// Ray directions for the parity vote, skewed off every axis and diagonal
const PARITY_DIRECTIONS: [[f64; 3]; 3] = [
    [1.0, 0.3127, 0.1939],
    [-0.2311, 1.0, 0.4417],
    [0.3719, -0.2683, 1.0],
];

/// Surface lookup used by Equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EqualStrategy {
    /// Measure every sample against every triangle of the other mesh
    BruteForce,
    /// Look samples up in the other mesh's triangle index
    Indexed,
}

/// How many sampled rays must hit for a directional predicate to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coverage {
    /// Every ray, and at least one
    Strict,
    /// At least one ray
    Relaxed,
}

/// Predicate evaluation session.
///
/// Borrows the configuration for its whole lifetime, so tolerances cannot
/// change while it is alive. Triangle indexes, sample clouds and probe
/// points are cached per mesh uid for the length of the session.
pub struct Evaluator<'a> {
    config: &'a Config,
    sampler: &'a dyn PointSampler,
    directions: &'a DirectionRegistry,
    triangle_indexes: RefCell<FxHashMap<u64, Arc<SpatialIndex<Triangle>>>>,
    /// Keyed by mesh uid and sampling density bits
    surface_samples: RefCell<FxHashMap<(u64, u64), Arc<SampleCloud>>>,
    /// Keyed by mesh uid and erosion distance bits
    probes: RefCell<FxHashMap<(u64, u64), Arc<Vec<Point3<f64>>>>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        config: &'a Config,
        sampler: &'a dyn PointSampler,
        directions: &'a DirectionRegistry,
    ) -> Self {
        Self {
            config,
            sampler,
            directions,
            triangle_indexes: RefCell::new(FxHashMap::default()),
            surface_samples: RefCell::new(FxHashMap::default()),
            probes: RefCell::new(FxHashMap::default()),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        self.config
    }

    #[inline]
    pub fn directions(&self) -> &DirectionRegistry {
        self.directions
    }

    /// Triangle index of `mesh`, built on first use
    pub fn index(&self, mesh: &TriangleMesh) -> Arc<SpatialIndex<Triangle>> {
        {
            let cache = self.triangle_indexes.borrow();
            if let Some(cached) = cache.get(&mesh.uid()) {
                return Arc::clone(cached);
            }
        }

        let index = Arc::new(SpatialIndex::from_mesh(mesh, &self.config.index));
        self.triangle_indexes
            .borrow_mut()
            .insert(mesh.uid(), Arc::clone(&index));
        index
    }

    /// Whether `point` lies inside the closed surface of `mesh`
    pub fn contains_point(&self, mesh: &TriangleMesh, point: &Point3<f64>) -> bool {
        if !mesh.bounds().contains_point(point) {
            return false;
        }
        let index = self.index(mesh);
        Self::parity_inside(&index, point)
    }

    fn parity_inside(index: &SpatialIndex<Triangle>, point: &Point3<f64>) -> bool {
        let votes = PARITY_DIRECTIONS
            .iter()
            .filter(|d| {
                let ray = Ray::new(*point, Vector3::new(d[0], d[1], d[2]));
                index.ray_hits(&ray) % 2 == 1
            })
            .count();
        votes >= 2
    }

    /// Signed distance from `point` to the surface of `mesh`, positive inside
    pub fn depth(&self, mesh: &TriangleMesh, point: &Point3<f64>) -> f64 {
        let index = self.index(mesh);
        let distance = index
            .nearest(point)
            .map_or(f64::INFINITY, |(_, squared)| squared.sqrt());
        if mesh.bounds().contains_point(point) && Self::parity_inside(&index, point) {
            distance
        } else {
            -distance
        }
    }

    /// Surface samples of `mesh` at `density`, drawn once per session
    fn samples_at(&self, mesh: &TriangleMesh, density: f64) -> Arc<SampleCloud> {
        let key = (mesh.uid(), density.to_bits());
        {
            let cache = self.surface_samples.borrow();
            if let Some(cached) = cache.get(&key) {
                return Arc::clone(cached);
            }
        }

        let cloud = Arc::new(self.sampler.sample(mesh, density));
        self.surface_samples.borrow_mut().insert(key, Arc::clone(&cloud));
        cloud
    }

    /// Points just inside the surface of `mesh` eroded by `erosion`; empty
    /// when the erosion consumes the mesh's bounding box.
    ///
    /// Each probe is a surface sample moved `round_to_zero` along the inward
    /// normal, so it classifies as interior without sitting on a face.
    fn probes(&self, mesh: &TriangleMesh, erosion: f64) -> Arc<Vec<Point3<f64>>> {
        let key = (mesh.uid(), erosion.to_bits());
        {
            let cache = self.probes.borrow();
            if let Some(cached) = cache.get(&key) {
                return Arc::clone(cached);
            }
        }

        let density = self.config.probe.samples_per_area;
        let cloud = if erosion > 0.0 && mesh.bounds().extent().min() <= 2.0 * erosion {
            // Eroded away entirely
            Arc::new(SampleCloud::new(density, Vec::new(), Vec::new()))
        } else if erosion > 0.0 {
            match mesh.offset(-erosion) {
                Ok(eroded) => Arc::new(self.sampler.sample(&eroded, density)),
                Err(err) => {
                    tracing::debug!(mesh = %mesh.name(), erosion, error = %err, "Erosion failed");
                    Arc::new(SampleCloud::new(density, Vec::new(), Vec::new()))
                }
            }
        } else {
            self.samples_at(mesh, density)
        };

        let step = self.config.distance.round_to_zero;
        let probes: Arc<Vec<Point3<f64>>> =
            Arc::new(cloud.iter().map(|(p, n)| p - n * step).collect());
        self.probes.borrow_mut().insert(key, Arc::clone(&probes));
        probes
    }

    /// Order-preserving filter over a pair sequence
    fn filter_pairs<F>(pairs: &[MeshPair], mut keep: F) -> Vec<MeshPair>
    where
        F: FnMut(&TriangleMesh, &TriangleMesh) -> bool,
    {
        pairs
            .iter()
            .filter(|(a, b)| keep(a, b))
            .cloned()
            .collect()
    }
}
