// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Directional relations ("A is above B") by ray coverage.
//!
//! Rays start at surface samples of A, inset just below the surface, and
//! travel against the direction; a ray covers when it hits a face of B.
//! Faces in contact register at a ray parameter of about the inset.

use ifcql_geometry::{BoundingBox, Ray, TriangleMesh, Vector3};

use super::{Coverage, Evaluator};
use crate::direction::Direction;
use crate::error::{Error, Result};
use crate::repository::MeshPair;

impl<'a> Evaluator<'a> {
    /// Whether `a` lies in `direction` of `b`
    pub fn directional(
        &self,
        a: &TriangleMesh,
        b: &TriangleMesh,
        direction: &Direction,
        coverage: Coverage,
    ) -> bool {
        let tolerance = &self.config.direction;
        let dir = direction.vector();
        if direction.is_axis_aligned()
            && !swept_overlap(a.bounds(), b.bounds(), dir, tolerance.positive_offset)
        {
            return false;
        }

        let index = self.index(b);
        let cloud = self.samples_at(a, tolerance.rays_per_area);
        let inset = self.config.distance.round_to_zero;
        let mut rays = cloud.iter().map(|(p, n)| Ray::new(p - n * inset, -dir));

        match coverage {
            Coverage::Relaxed => rays.any(|ray| index.any_ray_hit(&ray)),
            Coverage::Strict => {
                let mut cast = 0usize;
                for ray in rays {
                    if !index.any_ray_hit(&ray) {
                        return false;
                    }
                    cast += 1;
                }
                cast > 0
            }
        }
    }

    /// `directional` with the direction looked up by name
    pub fn directional_by_name(
        &self,
        a: &TriangleMesh,
        b: &TriangleMesh,
        direction: &str,
        coverage: Coverage,
    ) -> Result<bool> {
        let direction = self
            .directions
            .get(direction)
            .ok_or_else(|| Error::UnknownDirection(direction.to_string()))?;
        Ok(self.directional(a, b, direction, coverage))
    }

    pub fn directional_pairs(
        &self,
        pairs: &[MeshPair],
        direction: &Direction,
        coverage: Coverage,
    ) -> Vec<MeshPair> {
        Self::filter_pairs(pairs, |a, b| self.directional(a, b, direction, coverage))
    }
}

/// Whether `b` starts behind the trailing face of `a` along an axis
/// direction, within `offset`, and overlaps `a` across it
fn swept_overlap(a: &BoundingBox, b: &BoundingBox, dir: &Vector3<f64>, offset: f64) -> bool {
    (0..3).all(|axis| {
        let (ai, bi) = (a.axis(axis), b.axis(axis));
        if dir[axis] > 0.0 {
            bi.min() <= ai.min() + offset
        } else if dir[axis] < 0.0 {
            bi.max() >= ai.max() - offset
        } else {
            ai.overlaps(bi, 0.0)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cube, Session};
    use super::super::Coverage;
    use super::swept_overlap;
    use crate::error::Error;
    use ifcql_geometry::{Point3, TriangleMesh, Vector3};

    #[test]
    fn stacked_cubes() {
        let session = Session::new();
        let eval = session.evaluator();
        let top = cube("top", [0.0, 0.0, 1.0], 1.0);
        let base = cube("base", [0.0, 0.0, 0.0], 1.0);
        let above = session.directions.get("Above").unwrap();
        let below = session.directions.get("Below").unwrap();

        assert!(eval.directional(&top, &base, above, Coverage::Strict));
        assert!(eval.directional(&top, &base, above, Coverage::Relaxed));
        assert!(eval.directional(&base, &top, below, Coverage::Strict));
        assert!(!eval.directional(&base, &top, above, Coverage::Relaxed));
        assert!(!eval.directional(&top, &base, below, Coverage::Relaxed));
    }

    #[test]
    fn partial_footprint_is_relaxed_only() {
        let session = Session::new();
        let eval = session.evaluator();
        let top = cube("top", [0.5, 0.0, 1.5], 1.0);
        let base = cube("base", [0.0, 0.0, 0.0], 1.0);
        let wide = TriangleMesh::cuboid("wide", Point3::new(-1.0, -1.0, 0.0), Point3::new(3.0, 3.0, 0.5))
            .unwrap();

        assert!(!eval.directional_by_name(&top, &base, "above", Coverage::Strict).unwrap());
        assert!(eval.directional_by_name(&top, &base, "above", Coverage::Relaxed).unwrap());
        assert!(eval.directional_by_name(&top, &wide, "Above", Coverage::Strict).unwrap());
    }

    #[test]
    fn swept_box_needs_b_behind_the_trailing_face() {
        let up = Vector3::z();
        let a = cube("a", [0.0, 0.0, 1.0], 1.0);
        let below = cube("below", [0.0, 0.0, 0.0], 1.0);
        // Starts inside a, above its bottom face
        let inside = TriangleMesh::cuboid("inside", Point3::new(0.2, 0.2, 1.5), Point3::new(0.8, 0.8, 3.0))
            .unwrap();
        let beside = cube("beside", [2.0, 0.0, 0.0], 1.0);

        assert!(swept_overlap(a.bounds(), below.bounds(), &up, 0.05));
        assert!(!swept_overlap(a.bounds(), inside.bounds(), &up, 0.05));
        assert!(swept_overlap(a.bounds(), inside.bounds(), &up, 0.6));
        assert!(!swept_overlap(a.bounds(), beside.bounds(), &up, 0.05));
        assert!(swept_overlap(below.bounds(), a.bounds(), &-up, 0.05));
        assert!(!swept_overlap(below.bounds(), a.bounds(), &up, 0.05));

        let session = Session::new();
        let eval = session.evaluator();
        let above = session.directions.get("Above").unwrap();
        assert!(!eval.directional(&a, &inside, above, Coverage::Relaxed));
    }

    #[test]
    fn compass_directions() {
        let session = Session::new();
        let eval = session.evaluator();
        let origin = cube("origin", [0.0, 0.0, 0.0], 1.0);
        let east = cube("east", [2.0, 0.0, 0.0], 1.0);
        let north = cube("north", [0.0, 3.0, 0.0], 1.0);

        for (name, mesh) in [("East", &east), ("North", &north)] {
            assert!(eval.directional_by_name(mesh, &origin, name, Coverage::Strict).unwrap());
        }
        assert!(eval.directional_by_name(&origin, &east, "West", Coverage::Strict).unwrap());
        assert!(eval.directional_by_name(&origin, &north, "South", Coverage::Strict).unwrap());
        assert!(!eval.directional_by_name(&east, &origin, "North", Coverage::Relaxed).unwrap());

        assert_eq!(
            eval.directional_by_name(&east, &origin, "Up", Coverage::Strict),
            Err(Error::UnknownDirection("Up".into()))
        );
    }

    #[test]
    fn strict_implies_relaxed() {
        let session = Session::new();
        let eval = session.evaluator();
        let base = cube("base", [0.0, 0.0, 0.0], 1.0);
        let others = [
            cube("top", [0.0, 0.0, 1.0], 1.0),
            cube("shifted", [0.7, 0.2, 1.2], 1.0),
            cube("side", [1.0, 0.0, 0.0], 1.0),
            cube("far", [5.0, 5.0, 5.0], 1.0),
        ];

        for direction in session.directions.iter() {
            for other in &others {
                for (a, b) in [(other, &base), (&base, other)] {
                    if eval.directional(a, b, direction, Coverage::Strict) {
                        assert!(eval.directional(a, b, direction, Coverage::Relaxed));
                    }
                }
            }
        }
    }

    #[test]
    fn arbitrary_direction() {
        let mut session = Session::new();
        session.config.set_allow_arbitrary_direction(true);
        session
            .directions
            .register("AboveEast", Vector3::new(1.0, 0.0, 1.0), &session.config.direction)
            .unwrap();

        let eval = session.evaluator();
        let base = TriangleMesh::cuboid("base", Point3::new(-5.0, -5.0, 0.0), Point3::new(5.0, 5.0, 1.0))
            .unwrap();
        let roof = cube("roof", [0.0, 0.0, 2.0], 1.0);
        let direction = session.directions.get("aboveeast").unwrap();

        assert!(eval.directional(&roof, &base, direction, Coverage::Strict));
        assert!(!eval.directional(&base, &roof, direction, Coverage::Relaxed));
    }

    #[test]
    fn batch_filter() {
        let session = Session::new();
        let eval = session.evaluator();
        let base = std::sync::Arc::new(cube("base", [0.0, 0.0, 0.0], 1.0));
        let top = std::sync::Arc::new(cube("top", [0.0, 0.0, 1.0], 1.0));
        let pairs = vec![
            (base.clone(), top.clone()),
            (top.clone(), base.clone()),
        ];
        let above = session.directions.get("Above").unwrap();

        let kept = eval.directional_pairs(&pairs, above, Coverage::Strict);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0.name(), "top");
    }
}
