// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Half-line used for point membership and directional coverage tests.

use nalgebra::{Point3, Vector3};

/// Ray with a cached component-wise inverse direction for slab tests
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
    inv_direction: Vector3<f64>,
}

impl Ray {
    /// Create a ray. The direction is used as given (not normalized), so
    /// hit parameters are expressed in multiples of it.
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.map(|c| 1.0 / c),
        }
    }

    /// Ray from `p` towards `q`; `t = 1` lands on `q`
    pub fn through(p: Point3<f64>, q: Point3<f64>) -> Self {
        Self::new(p, q - p)
    }

    #[inline]
    pub fn inv_direction(&self) -> &Vector3<f64> {
        &self.inv_direction
    }

    /// Point at parameter `t`
    #[inline]
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_follows_direction() {
        let ray = Ray::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(ray.at(0.5), Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn inverse_of_zero_component_is_infinite() {
        let ray = Ray::new(Point3::origin(), Vector3::new(0.0, 1.0, -2.0));
        assert!(ray.inv_direction().x.is_infinite());
        assert_eq!(ray.inv_direction().z, -0.5);
    }
}
