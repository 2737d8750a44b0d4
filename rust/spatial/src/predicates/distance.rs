// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimum distance between meshes.

use ifcql_geometry::{Triangle, TriangleMesh};

use super::Evaluator;
use crate::repository::MeshPair;

/// Closest triangle pair of two meshes and the distance between them
#[derive(Debug, Clone)]
pub struct MeshDistance {
    /// Triangle of the first mesh
    pub first: Triangle,
    /// Triangle of the second mesh
    pub second: Triangle,
    /// Euclidean distance, zero below the round-to-zero tolerance
    pub distance: f64,
}

impl<'a> Evaluator<'a> {
    /// Minimum distance between the surfaces of `a` and `b`
    pub fn distance(&self, a: &TriangleMesh, b: &TriangleMesh) -> Option<MeshDistance> {
        let (ia, ib) = (self.index(a), self.index(b));
        let (first, second, squared) = ia.closest_pair(&ib, |x, y| x.squared_distance(y))?;

        let mut distance = squared.sqrt();
        if distance < self.config.distance.round_to_zero {
            distance = 0.0;
        }
        tracing::trace!(a = %a.name(), b = %b.name(), distance, "Mesh distance");

        Some(MeshDistance {
            first: first.clone(),
            second: second.clone(),
            distance,
        })
    }

    /// Whether the surfaces of `a` and `b` come within `threshold`
    pub fn distance_within(&self, a: &TriangleMesh, b: &TriangleMesh, threshold: f64) -> bool {
        if a.bounds().squared_distance(b.bounds()) > threshold * threshold {
            return false;
        }
        self.distance(a, b)
            .is_some_and(|d| d.distance <= threshold)
    }

    /// `distance_within` at the configured global distance threshold
    pub fn distance_within_global(&self, a: &TriangleMesh, b: &TriangleMesh) -> bool {
        self.distance_within(a, b, self.config.distance.global_threshold)
    }

    /// Distance of every pair, in input order
    pub fn distances(&self, pairs: &[MeshPair]) -> Vec<(MeshPair, MeshDistance)> {
        pairs
            .iter()
            .filter_map(|pair| {
                self.distance(&pair.0, &pair.1)
                    .map(|d| (pair.clone(), d))
            })
            .collect()
    }

    pub fn distance_within_pairs(&self, pairs: &[MeshPair], threshold: f64) -> Vec<MeshPair> {
        Self::filter_pairs(pairs, |a, b| self.distance_within(a, b, threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cube, Session};
    use approx::assert_relative_eq;
    use ifcql_geometry::Point3;
    use std::sync::Arc;

    #[test]
    fn face_sharing_cubes_are_at_zero() {
        let session = Session::new();
        let eval = session.evaluator();
        let a = cube("a", [0.0, 0.0, 0.0], 1.0);
        let b = cube("b", [1.0, 0.0, 0.0], 1.0);

        let d = eval.distance(&a, &b).unwrap();
        assert_eq!(d.distance, 0.0);
        assert!(d.first.bounds().intersects(d.second.bounds(), 1e-9));
    }

    #[test]
    fn separated_cubes() {
        let session = Session::new();
        let eval = session.evaluator();
        let a = cube("a", [0.0, 0.0, 0.0], 1.0);
        let b = cube("b", [11.0, 0.0, 0.0], 1.0);
        let c = cube("c", [4.0, 4.0, 1.0], 1.0);

        assert_relative_eq!(eval.distance(&a, &b).unwrap().distance, 10.0);
        assert_relative_eq!(eval.distance(&b, &a).unwrap().distance, 10.0);
        // Closest features are the edge x=1,y=1 and the edge x=4,y=4
        assert_relative_eq!(
            eval.distance(&a, &c).unwrap().distance,
            (Point3::new(1.0, 1.0, 1.0) - Point3::new(4.0, 4.0, 1.0)).norm()
        );

        assert!(eval.distance_within(&a, &b, 10.0));
        assert!(!eval.distance_within(&a, &b, 9.99));
        assert!(!eval.distance_within_global(&a, &b));
    }

    #[test]
    fn tiny_gaps_round_to_zero() {
        let session = Session::new();
        let eval = session.evaluator();
        let a = cube("a", [0.0, 0.0, 0.0], 1.0);
        let b = cube("b", [1.00005, 0.0, 0.0], 1.0);
        assert_eq!(eval.distance(&a, &b).unwrap().distance, 0.0);
    }

    #[test]
    fn batch_keeps_order() {
        let session = Session::new();
        let eval = session.evaluator();
        let a = Arc::new(cube("a", [0.0, 0.0, 0.0], 1.0));
        let b = Arc::new(cube("b", [1.05, 0.0, 0.0], 1.0));
        let c = Arc::new(cube("c", [5.0, 0.0, 0.0], 1.0));
        let pairs = vec![
            (Arc::clone(&c), Arc::clone(&a)),
            (Arc::clone(&a), Arc::clone(&b)),
            (Arc::clone(&b), Arc::clone(&c)),
        ];

        let near = eval.distance_within_pairs(&pairs, 0.1);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].0.name(), "a");

        let all = eval.distances(&pairs);
        assert_eq!(all.len(), 3);
        assert_relative_eq!(all[0].1.distance, 4.0);
        assert_relative_eq!(all[1].1.distance, 0.05, epsilon = 1e-12);
        assert_relative_eq!(all[2].1.distance, 2.95, epsilon = 1e-12);
    }
}
