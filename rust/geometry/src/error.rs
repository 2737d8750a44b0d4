// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building meshes from external geometry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Empty mesh: {0}")]
    EmptyMesh(String),

    #[error("Non-finite coordinate in mesh {mesh} at vertex {vertex}")]
    NonFiniteCoordinate { mesh: String, vertex: usize },

    #[error("Index {index} out of range in mesh {mesh} ({vertex_count} vertices)")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },

    #[error("Malformed buffer in mesh {mesh}: length {len} is not a multiple of 3")]
    MalformedBuffer { mesh: String, len: usize },
}
