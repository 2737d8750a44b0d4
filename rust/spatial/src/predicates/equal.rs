// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric equality by surface samples.
//!
//! Every sample of one mesh must lie within the threshold of the other
//! mesh's surface, both ways. Distances are measured to triangles, so two
//! tessellations of the same solid compare equal.
//!
//! Samples come from the cloud attached to each mesh. A cloud drawn at the
//! configured density is reused; otherwise the evaluator's sampler draws one
//! and attaches it.

use std::ptr;

use ifcql_geometry::{SampleCloud, TriangleMesh};

use super::{EqualStrategy, Evaluator};
use crate::repository::MeshPair;

impl<'a> Evaluator<'a> {
    /// Whether every sample of each mesh lies within the equality threshold
    /// of the other mesh's surface
    pub fn equal(&self, a: &TriangleMesh, b: &TriangleMesh, strategy: EqualStrategy) -> bool {
        if ptr::eq(a, b) {
            return true;
        }
        let threshold = self.config.equal.global_threshold;
        if !a.bounds().matches(b.bounds(), threshold) {
            return false;
        }

        let density = self.config.equal.samples_per_area;
        let sa = a.samples_or_insert_with(density, |m| self.sampler.sample(m, density));
        let sb = b.samples_or_insert_with(density, |m| self.sampler.sample(m, density));

        match strategy {
            EqualStrategy::BruteForce => {
                on_surface_brute_force(&sa, b, threshold) && on_surface_brute_force(&sb, a, threshold)
            }
            EqualStrategy::Indexed => {
                let (ia, ib) = (self.index(a), self.index(b));
                sa.points().iter().all(|p| ib.any_within(p, threshold))
                    && sb.points().iter().all(|p| ia.any_within(p, threshold))
            }
        }
    }

    pub fn equal_pairs(&self, pairs: &[MeshPair], strategy: EqualStrategy) -> Vec<MeshPair> {
        Self::filter_pairs(pairs, |a, b| self.equal(a, b, strategy))
    }
}

fn on_surface_brute_force(samples: &SampleCloud, mesh: &TriangleMesh, threshold: f64) -> bool {
    let limit = threshold * threshold;
    samples.points().iter().all(|p| {
        mesh.triangles()
            .iter()
            .any(|t| t.closest_squared_distance(p) <= limit)
    })
}
