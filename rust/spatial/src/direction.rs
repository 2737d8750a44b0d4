// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named unit directions for the directional predicates.
//!
//! The six built-ins follow the model axes: +Z is up, +Y is north and +X is
//! east.

use ifcql_geometry::Vector3;

use crate::config::DirectionTolerance;
use crate::error::{Error, Result};

const BUILT_IN: [(&str, [f64; 3]); 6] = [
    ("Above", [0.0, 0.0, 1.0]),
    ("Below", [0.0, 0.0, -1.0]),
    ("North", [0.0, 1.0, 0.0]),
    ("South", [0.0, -1.0, 0.0]),
    ("East", [1.0, 0.0, 0.0]),
    ("West", [-1.0, 0.0, 0.0]),
];

/// A registered direction
#[derive(Debug, Clone, PartialEq)]
pub struct Direction {
    name: String,
    vector: Vector3<f64>,
}

impl Direction {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit vector
    #[inline]
    pub fn vector(&self) -> &Vector3<f64> {
        &self.vector
    }

    /// Whether the direction runs along one model axis
    pub fn is_axis_aligned(&self) -> bool {
        self.vector.iter().filter(|c| c.abs() > 1e-12).count() == 1
    }
}

/// Lookup table of directions, matched case-insensitively by name
#[derive(Debug, Clone)]
pub struct DirectionRegistry {
    directions: Vec<Direction>,
}

impl Default for DirectionRegistry {
    fn default() -> Self {
        Self {
            directions: BUILT_IN
                .iter()
                .map(|(name, v)| Direction {
                    name: (*name).to_string(),
                    vector: Vector3::new(v[0], v[1], v[2]),
                })
                .collect(),
        }
    }
}

impl DirectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Direction> {
        self.directions
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Direction> {
        self.directions.iter()
    }

    /// Register a custom direction. The vector is normalized.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        vector: Vector3<f64>,
        tolerance: &DirectionTolerance,
    ) -> Result<&Direction> {
        let name = name.into();
        if !tolerance.allow_arbitrary_direction {
            return Err(Error::ArbitraryDirectionDisabled(name));
        }
        if self.get(&name).is_some() {
            return Err(Error::InvalidDirection(format!("{name} is already registered")));
        }
        let vector = match vector.try_normalize(f64::EPSILON) {
            Some(v) if v.iter().all(|c| c.is_finite()) => v,
            _ => return Err(Error::InvalidDirection(format!("{name} has no usable vector"))),
        };

        tracing::debug!(direction = %name, x = vector.x, y = vector.y, z = vector.z, "Registered direction");
        self.directions.push(Direction { name, vector });
        Ok(&self.directions[self.directions.len() - 1])
    }
}
