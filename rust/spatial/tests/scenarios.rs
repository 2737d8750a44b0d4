// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end scenarios over box-shaped elements: registration, pair
//! enumeration and every predicate family through the engine.

use std::sync::Arc;

use approx::assert_relative_eq;
use ifcql_geometry::{Point3, Triangle, TriangleMesh, Vector3};
use ifcql_spatial::{Coverage, Error, SpatialEngine, SpatialRepository};

fn unit_cube(name: &str, x: f64, y: f64, z: f64) -> TriangleMesh {
    TriangleMesh::cuboid(name, Point3::new(x, y, z), Point3::new(x + 1.0, y + 1.0, z + 1.0)).unwrap()
}

#[test]
fn cubes_sharing_a_face() {
    let engine = SpatialEngine::default();
    let eval = engine.evaluator();
    let a = unit_cube("a", 0.0, 0.0, 0.0);
    let b = unit_cube("b", 1.0, 0.0, 0.0);

    assert!(eval.touch(&a, &b, 0.01, 0.0));
    assert!(!eval.overlap(&a, &b, 0.0));
    assert!(!eval.overlap_default(&a, &b));
    assert_eq!(eval.distance(&a, &b).unwrap().distance, 0.0);
}

#[test]
fn cubes_overlapping_by_half() {
    let engine = SpatialEngine::default();
    let eval = engine.evaluator();
    let a = unit_cube("a", 0.0, 0.0, 0.0);
    let b = unit_cube("b", 0.5, 0.0, 0.0);

    assert!(eval.overlap_default(&a, &b));
    assert!(!eval.contain_default(&a, &b));
    assert!(!eval.contain_default(&b, &a));
    assert!(!eval.touch_default(&a, &b));
    assert!(eval.cover(&a, &b, 0.01, -0.01));
}

#[test]
fn cubes_ten_apart() {
    let engine = SpatialEngine::default();
    let eval = engine.evaluator();
    let a = unit_cube("a", 0.0, 0.0, 0.0);
    let b = a.translated("b", Vector3::new(11.0, 0.0, 0.0)).unwrap();

    assert!(!eval.touch_default(&a, &b));
    assert!(!eval.overlap_default(&a, &b));
    assert_relative_eq!(eval.distance(&a, &b).unwrap().distance, 10.0);
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut repo = SpatialRepository::new();
    repo.add_mesh(unit_cube("door", 0.0, 0.0, 0.0)).unwrap();
    let err = repo.add_mesh(unit_cube("door", 3.0, 0.0, 0.0)).unwrap_err();
    assert_eq!(err, Error::DuplicateMeshName("door".to_string()));
    assert_eq!(err.to_string(), "duplicate mesh name: door");
}

#[test]
fn pair_matrix_sizes() {
    let mut repo = SpatialRepository::new();
    let meshes: Vec<_> = (0..7)
        .map(|i| Arc::new(unit_cube(&format!("m{i}"), i as f64 * 2.0, 0.0, 0.0)))
        .collect();
    repo.add_meshes(meshes).unwrap();

    assert_eq!(repo.ordered_pairs().len(), 7 * 6);
    assert_eq!(repo.unordered_pairs().len(), 7 * 6 / 2);
}

#[test]
fn reflexive_solids() {
    let engine = SpatialEngine::default();
    let eval = engine.evaluator();
    let mesh = TriangleMesh::cuboid("slab", Point3::origin(), Point3::new(6.0, 4.0, 0.25)).unwrap();

    assert!(eval.contain(&mesh, &mesh, 0.0));
    assert!(eval.overlap(&mesh, &mesh, 0.0));
    assert!(!eval.touch_default(&mesh, &mesh));
}

#[test]
fn touch_and_overlap_never_both_hold() {
    let engine = SpatialEngine::default();
    let eval = engine.evaluator();
    let a = unit_cube("a", 0.0, 0.0, 0.0);
    let offsets = [
        [1.0, 0.0, 0.0],
        [0.999, 0.0, 0.0],
        [0.995, 0.3, 0.0],
        [0.5, 0.5, 0.5],
        [1.0, 1.0, 1.0],
        [1.02, 0.0, 0.0],
        [0.0, 0.0, -1.0],
    ];

    for o in offsets {
        let b = a.translated("b", Vector3::new(o[0], o[1], o[2])).unwrap();
        for neg in [0.0, -0.01, -0.05] {
            let touch = eval.touch(&a, &b, 0.01, neg);
            let overlap = eval.overlap(&a, &b, neg);
            assert!(!(touch && overlap), "offset {o:?}, band {neg}");
        }
    }
}

#[test]
fn strict_implies_relaxed_for_every_direction() {
    let engine = SpatialEngine::default();
    let eval = engine.evaluator();
    let base = unit_cube("base", 0.0, 0.0, 0.0);
    let neighbours = [
        unit_cube("up", 0.0, 0.0, 1.0),
        unit_cube("down", 0.25, 0.0, -2.0),
        unit_cube("north", 0.0, 1.5, 0.0),
        unit_cube("east", 1.0, 0.5, 0.0),
        unit_cube("diagonal", 3.0, 3.0, 3.0),
    ];

    for direction in engine.directions().iter() {
        for other in &neighbours {
            for (a, b) in [(other, &base), (&base, other)] {
                let strict = eval.directional(a, b, direction, Coverage::Strict);
                let relaxed = eval.directional(a, b, direction, Coverage::Relaxed);
                assert!(!strict || relaxed, "{} {} {}", a.name(), direction.name(), b.name());
            }
        }
    }
}

#[test]
fn engine_over_registered_sets() {
    let mut engine = SpatialEngine::default();
    engine
        .repository_mut()
        .add_meshes([
            Arc::new(unit_cube("slab", 0.0, 0.0, 0.0)),
            Arc::new(unit_cube("beam", 0.0, 0.0, 1.0)),
            Arc::new(unit_cube("2:space", 0.0, 0.0, 1.0)),
            Arc::new(unit_cube("2:far", 20.0, 0.0, 0.0)),
        ])
        .unwrap();

    let mut relation = Vec::new();
    assert_eq!(engine.execute_registered("Touch", &mut relation).unwrap(), 1);
    assert_eq!(relation, [("slab".to_string(), "2:space".to_string())]);

    relation.clear();
    assert_eq!(engine.execute_registered("Equal", &mut relation).unwrap(), 1);
    assert_eq!(relation, [("beam".to_string(), "2:space".to_string())]);

    relation.clear();
    engine.execute_registered("EqualIndexed", &mut relation).unwrap();
    assert_eq!(relation, [("beam".to_string(), "2:space".to_string())]);

    engine.repository_mut().reset();
    relation.clear();
    assert_eq!(engine.execute_registered("Overlap", &mut relation).unwrap(), 0);
}

#[test]
fn crossing_beams_through_the_engine() {
    let mut engine = SpatialEngine::default();
    engine
        .repository_mut()
        .add_meshes([
            Arc::new(
                TriangleMesh::cuboid("beam", Point3::origin(), Point3::new(10.0, 0.2, 0.2)).unwrap(),
            ),
            Arc::new(
                TriangleMesh::cuboid(
                    "2:joist",
                    Point3::new(5.0, -5.0, 0.0),
                    Point3::new(5.2, 5.0, 0.2),
                )
                .unwrap(),
            ),
        ])
        .unwrap();

    let mut relation = Vec::new();
    assert_eq!(engine.execute_registered("Overlap", &mut relation).unwrap(), 1);
    assert_eq!(engine.execute_registered("Touch", &mut relation).unwrap(), 0);
    assert_eq!(engine.execute_registered("Cover", &mut relation).unwrap(), 1);
    assert_eq!(relation.len(), 2);
}

#[test]
fn equal_across_triangulations() {
    #[rustfmt::skip]
    let positions = [
        0.0, 0.0, 0.0,  2.0, 0.0, 0.0,  2.0, 1.0, 0.0,  0.0, 1.0, 0.0,
        0.0, 0.0, 1.0,  2.0, 0.0, 1.0,  2.0, 1.0, 1.0,  0.0, 1.0, 1.0,
    ];
    // Each quad fanned from its second corner
    #[rustfmt::skip]
    let indices = [
        3, 2, 1,  3, 1, 0,
        5, 6, 7,  5, 7, 4,
        1, 5, 4,  1, 4, 0,
        7, 6, 2,  7, 2, 3,
        4, 7, 3,  4, 3, 0,
        2, 6, 5,  2, 5, 1,
    ];
    let retessellated = TriangleMesh::from_buffers("2:block", &positions, &indices).unwrap();
    assert!(retessellated.is_outward_oriented());

    let mut engine = SpatialEngine::default();
    engine
        .repository_mut()
        .add_meshes([
            Arc::new(
                TriangleMesh::cuboid("block", Point3::origin(), Point3::new(2.0, 1.0, 1.0)).unwrap(),
            ),
            Arc::new(retessellated),
        ])
        .unwrap();

    for operator in ["Equal", "EqualIndexed"] {
        let mut relation = Vec::new();
        assert_eq!(engine.execute_registered(operator, &mut relation).unwrap(), 1, "{operator}");
    }
}

#[test]
fn triangle_distance_properties() {
    let t = Triangle::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
    );
    let u = Triangle::new(
        Point3::new(0.5, 0.5, 1.0),
        Point3::new(3.0, 0.0, 2.0),
        Point3::new(0.0, 3.0, 2.5),
    );

    assert!(t.closest_squared_distance(&Point3::new(0.5, 0.5, 0.0)) < 1e-12);
    assert_relative_eq!(t.closest_squared_distance(&Point3::new(0.5, 0.5, -2.0)), 4.0);
    assert!(t.closest_squared_distance(&Point3::new(5.0, 5.0, 5.0)) > 0.0);
    assert_relative_eq!(t.min_squared_distance(&u), u.min_squared_distance(&t));
    assert_relative_eq!(t.squared_distance(&u), 1.0);
    assert!(t.max_squared_distance(&u) >= t.squared_distance(&u));
}
