// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary contact and cover.

use ifcql_geometry::TriangleMesh;

use super::Evaluator;
use crate::repository::MeshPair;

impl<'a> Evaluator<'a> {
    /// Whether `a` and `b` touch: their surfaces come within
    /// `positive_offset` while their interiors do not overlap beyond
    /// `negative_offset`, and neither encloses the other.
    ///
    /// Never holds together with `overlap(a, b, negative_offset)`.
    pub fn touch(
        &self,
        a: &TriangleMesh,
        b: &TriangleMesh,
        positive_offset: f64,
        negative_offset: f64,
    ) -> bool {
        self.touch_unnested(a, b, positive_offset, negative_offset) && !self.nested(a, b)
    }

    /// Touch without the nesting check, for pairs known not to enclose
    /// one another
    pub fn touch_unnested(
        &self,
        a: &TriangleMesh,
        b: &TriangleMesh,
        positive_offset: f64,
        negative_offset: f64,
    ) -> bool {
        self.distance_within(a, b, positive_offset) && !self.overlap(a, b, negative_offset)
    }

    /// Touch with the configured offsets
    pub fn touch_default(&self, a: &TriangleMesh, b: &TriangleMesh) -> bool {
        self.touch(
            a,
            b,
            self.config.touch.positive_offset,
            self.config.touch_negative_offset(),
        )
    }

    /// Touching or overlapping
    pub fn cover(
        &self,
        a: &TriangleMesh,
        b: &TriangleMesh,
        positive_offset: f64,
        negative_offset: f64,
    ) -> bool {
        self.overlap(a, b, negative_offset) || self.touch(a, b, positive_offset, negative_offset)
    }

    pub fn touch_pairs(
        &self,
        pairs: &[MeshPair],
        positive_offset: f64,
        negative_offset: f64,
    ) -> Vec<MeshPair> {
        Self::filter_pairs(pairs, |a, b| self.touch(a, b, positive_offset, negative_offset))
    }

    pub fn touch_unnested_pairs(
        &self,
        pairs: &[MeshPair],
        positive_offset: f64,
        negative_offset: f64,
    ) -> Vec<MeshPair> {
        Self::filter_pairs(pairs, |a, b| {
            self.touch_unnested(a, b, positive_offset, negative_offset)
        })
    }

    pub fn cover_pairs(
        &self,
        pairs: &[MeshPair],
        positive_offset: f64,
        negative_offset: f64,
    ) -> Vec<MeshPair> {
        Self::filter_pairs(pairs, |a, b| self.cover(a, b, positive_offset, negative_offset))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{cube, Session};
    use ifcql_geometry::{Point3, TriangleMesh};

    #[test]
    fn face_contact_touches() {
        let session = Session::new();
        let eval = session.evaluator();
        let a = cube("a", [0.0, 0.0, 0.0], 1.0);
        let b = cube("b", [1.0, 0.0, 0.0], 1.0);

        assert!(eval.touch(&a, &b, 0.01, 0.0));
        assert!(eval.touch(&b, &a, 0.01, 0.0));
        assert!(eval.touch_default(&a, &b));
        assert!(eval.cover(&a, &b, 0.01, 0.0));
    }

    #[test]
    fn gap_within_positive_offset() {
        let session = Session::new();
        let eval = session.evaluator();
        let a = cube("a", [0.0, 0.0, 0.0], 1.0);
        let b = cube("b", [1.005, 0.0, 0.0], 1.0);

        assert!(eval.touch(&a, &b, 0.01, 0.0));
        assert!(!eval.touch(&a, &b, 0.001, 0.0));
    }

    #[test]
    fn shallow_penetration_inside_negative_band() {
        let session = Session::new();
        let eval = session.evaluator();
        let a = cube("a", [0.0, 0.0, 0.0], 1.0);
        let b = cube("b", [0.995, 0.0, 0.0], 1.0);

        assert!(eval.touch(&a, &b, 0.01, -0.01));
        assert!(!eval.touch(&a, &b, 0.01, 0.0));
        assert!(eval.cover(&a, &b, 0.01, 0.0));
    }

    #[test]
    fn touch_and_overlap_exclude_each_other() {
        let session = Session::new();
        let eval = session.evaluator();
        let a = cube("a", [0.0, 0.0, 0.0], 1.0);
        let others = [
            cube("face", [1.0, 0.0, 0.0], 1.0),
            cube("half", [0.5, 0.0, 0.0], 1.0),
            cube("far", [11.0, 0.0, 0.0], 1.0),
            cube("inside", [0.25, 0.25, 0.25], 0.5),
        ];

        for b in &others {
            for neg in [0.0, -0.01] {
                let touch = eval.touch(&a, b, 0.01, neg);
                let overlap = eval.overlap(&a, b, neg);
                assert!(!(touch && overlap), "{} touch and overlap", b.name());
                assert_eq!(eval.cover(&a, b, 0.01, neg), touch || overlap);
            }
        }
    }

    #[test]
    fn nested_pairs_do_not_touch() {
        let session = Session::new();
        let eval = session.evaluator();
        let outer = cube("outer", [0.0, 0.0, 0.0], 2.0);
        // Flush with the outer floor; thinner than the band, so overlap
        // misses it and only the nesting check rejects it
        let inner =
            TriangleMesh::cuboid("inner", Point3::new(0.5, 0.5, 0.0), Point3::new(1.5, 1.5, 0.008))
                .unwrap();

        assert!(!eval.overlap(&outer, &inner, -0.01));
        assert!(!eval.overlap(&inner, &outer, -0.01));
        assert!(eval.touch_unnested(&outer, &inner, 0.01, -0.01));
        assert!(!eval.touch(&outer, &inner, 0.01, -0.01));
    }
}
