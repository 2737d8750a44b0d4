// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-QL Spatial Predicates
//!
//! Topological and directional relations between triangulated building
//! elements: touch, overlap, contain, cover, equal, distance and the
//! compass/vertical directions in strict and relaxed variants.
//!
//! The engine is single-threaded. A [`Config`] is owned by the caller and
//! borrowed by every [`Evaluator`]; meshes live in a [`SpatialRepository`]
//! and are compared pairwise through per-mesh [`SpatialIndex`] trees.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ifcql_geometry::{Point3, TriangleMesh};
//! use ifcql_spatial::SpatialEngine;
//!
//! let mut engine = SpatialEngine::default();
//! let slab = TriangleMesh::cuboid("slab", Point3::origin(), Point3::new(4.0, 4.0, 0.3))?;
//! let wall = TriangleMesh::cuboid("2:wall", Point3::new(0.0, 0.0, 0.3), Point3::new(4.0, 0.2, 3.0))?;
//! engine.repository_mut().add_meshes([Arc::new(slab), Arc::new(wall)])?;
//!
//! let mut touching = Vec::new();
//! engine.execute_registered("Touch", &mut touching)?;
//! # Ok::<(), ifcql_spatial::Error>(())
//! ```

pub mod config;
pub mod direction;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod predicates;
pub mod repository;

pub use config::{
    Config, DirectionTolerance, DistanceTolerance, EqualTolerance, IndexConfig, ProbeTolerance,
    TouchTolerance,
};
pub use direction::{Direction, DirectionRegistry};
pub use dispatch::{Predicate, SpatialEngine};
pub use error::{Error, Result};
pub use index::{Bounded, PointDistance, RayCast, SpatialIndex};
pub use predicates::{Coverage, EqualStrategy, Evaluator, MeshDistance};
pub use repository::{MeshPair, NamePair, SpatialRepository, SECOND_OPERAND_PREFIX};
