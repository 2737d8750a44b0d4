// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the spatial engine.

/// Result type alias for spatial operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring the engine or registering meshes.
///
/// Predicates themselves never fail; these cover setup and dispatch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A mesh with this name is already registered (or appears twice in a batch).
    #[error("duplicate mesh name: {0}")]
    DuplicateMeshName(String),

    /// No predicate is registered under this operator name.
    #[error("unknown spatial operator: {0}")]
    UnknownOperator(String),

    /// No direction is registered under this name.
    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    /// Custom directions are disabled by the direction tolerance settings.
    #[error("arbitrary directions are disabled, cannot register {0}")]
    ArbitraryDirectionDisabled(String),

    /// Direction vector is zero, non-finite, or the name is already taken.
    #[error("invalid direction: {0}")]
    InvalidDirection(String),

    /// Index fanout bounds violate `2 <= min <= max / 2`.
    #[error("invalid index fanout: min {min}, max {max}")]
    InvalidFanout { min: usize, max: usize },

    /// Tolerance value is negative or not finite.
    #[error("invalid tolerance for {field}: {value}")]
    InvalidTolerance { field: &'static str, value: f64 },

    /// Mesh construction failed.
    #[error("geometry error: {0}")]
    Geometry(#[from] ifcql_geometry::Error),
}
