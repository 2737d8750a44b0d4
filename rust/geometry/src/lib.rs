// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-QL Geometry Primitives
//!
//! Triangles, meshes, bounding boxes and surface sampling used by the
//! spatial predicate engine. Meshes come from an external geometry
//! extraction step; this crate validates them and precomputes everything
//! the distance and ray queries need.

pub mod bounds;
pub mod error;
pub mod interval;
pub mod mesh;
pub mod offset;
pub mod ray;
pub mod sampler;
pub mod triangle;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

/// 3-D coordinate; `.coords` is the vector view
pub type Point = Point3<f64>;

pub use bounds::BoundingBox;
pub use error::{Error, Result};
pub use interval::Interval;
pub use mesh::TriangleMesh;
pub use ray::Ray;
pub use sampler::{PointSampler, SampleCloud, SurfaceSampler};
pub use triangle::{segment_squared_distance, Triangle};
