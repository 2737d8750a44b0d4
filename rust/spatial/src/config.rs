// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerance and index configuration.
//!
//! A [`Config`] is created once during setup and handed by reference to every
//! operator and index constructor. Overlap and Contain have no tolerance
//! storage of their own: their negative offset is derived from the two Touch
//! fields, so changing Touch changes all three predicates at once.
//!
//! Mutating a `Config` while predicates are evaluating against it is not
//! supported; the borrow checker enforces this for safe callers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tolerances of the directional predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionTolerance {
    /// Slack of the swept-box broad phase along the direction.
    pub positive_offset: f64,
    /// Ray origins per unit of surface area.
    pub rays_per_area: f64,
    /// Whether directions beyond the six built-ins may be registered.
    pub allow_arbitrary_direction: bool,
}

impl Default for DirectionTolerance {
    fn default() -> Self {
        Self {
            positive_offset: 0.05,
            rays_per_area: 4.0,
            allow_arbitrary_direction: false,
        }
    }
}

/// Tolerances of the distance operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceTolerance {
    /// Distances below this are reported as zero.
    pub round_to_zero: f64,
    /// Upper bound used by the `DistanceWithin` predicate.
    pub global_threshold: f64,
}

impl Default for DistanceTolerance {
    fn default() -> Self {
        Self {
            round_to_zero: 1e-4,
            global_threshold: 0.1,
        }
    }
}

/// Touch band, also the source of the Overlap and Contain negative offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchTolerance {
    pub positive_offset: f64,
    pub negative_offset_ratio: f64,
}

impl TouchTolerance {
    /// `positive_offset * negative_offset_ratio * -1`
    #[inline]
    pub fn negative_offset(&self) -> f64 {
        self.positive_offset * self.negative_offset_ratio * -1.0
    }
}

impl Default for TouchTolerance {
    fn default() -> Self {
        Self {
            positive_offset: 0.01,
            negative_offset_ratio: 1.0,
        }
    }
}

/// Tolerances of the equality predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualTolerance {
    pub samples_per_area: f64,
    /// Largest accepted distance between matched samples.
    pub global_threshold: f64,
}

impl Default for EqualTolerance {
    fn default() -> Self {
        Self {
            samples_per_area: 16.0,
            global_threshold: 0.05,
        }
    }
}

/// Density of the interior probe points used by the solid predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeTolerance {
    pub samples_per_area: f64,
}

impl Default for ProbeTolerance {
    fn default() -> Self {
        Self {
            samples_per_area: 4.0,
        }
    }
}

/// Node fanout bounds of the spatial index.
///
/// Indexes copy these bounds when they are built; changing them later only
/// affects indexes built afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FanoutBounds")]
pub struct IndexConfig {
    min_fanout: usize,
    max_fanout: usize,
}

/// Unvalidated wire form of [`IndexConfig`]
#[derive(Deserialize)]
struct FanoutBounds {
    min_fanout: usize,
    max_fanout: usize,
}

impl TryFrom<FanoutBounds> for IndexConfig {
    type Error = Error;

    fn try_from(bounds: FanoutBounds) -> Result<Self> {
        Self::new(bounds.min_fanout, bounds.max_fanout)
    }
}

impl IndexConfig {
    /// Create validated fanout bounds.
    pub fn new(min_fanout: usize, max_fanout: usize) -> Result<Self> {
        if min_fanout < 2 || min_fanout > max_fanout / 2 {
            return Err(Error::InvalidFanout {
                min: min_fanout,
                max: max_fanout,
            });
        }
        Ok(Self {
            min_fanout,
            max_fanout,
        })
    }

    #[inline]
    pub fn min_fanout(&self) -> usize {
        self.min_fanout
    }

    #[inline]
    pub fn max_fanout(&self) -> usize {
        self.max_fanout
    }

    /// Replace both bounds; on error the previous bounds are kept.
    pub fn set_fanout(&mut self, min_fanout: usize, max_fanout: usize) -> Result<()> {
        *self = Self::new(min_fanout, max_fanout)?;
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_fanout: 4,
            max_fanout: 10,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub direction: DirectionTolerance,
    pub distance: DistanceTolerance,
    pub touch: TouchTolerance,
    pub equal: EqualTolerance,
    pub probe: ProbeTolerance,
    pub index: IndexConfig,
}

fn checked(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidTolerance { field, value })
    }
}

impl Config {
    /// Negative offset of the Touch band.
    #[inline]
    pub fn touch_negative_offset(&self) -> f64 {
        self.touch.negative_offset()
    }

    /// Negative offset used by Overlap, shared with Touch.
    #[inline]
    pub fn overlap_negative_offset(&self) -> f64 {
        self.touch.negative_offset()
    }

    /// Negative offset used by Contain, shared with Touch.
    #[inline]
    pub fn contain_negative_offset(&self) -> f64 {
        self.touch.negative_offset()
    }

    pub fn set_direction_positive_offset(&mut self, value: f64) -> Result<()> {
        self.direction.positive_offset = checked("direction.positive_offset", value)?;
        Ok(())
    }

    pub fn set_rays_per_area(&mut self, value: f64) -> Result<()> {
        self.direction.rays_per_area = checked("direction.rays_per_area", value)?;
        Ok(())
    }

    pub fn set_allow_arbitrary_direction(&mut self, allow: bool) {
        self.direction.allow_arbitrary_direction = allow;
    }

    pub fn set_round_to_zero(&mut self, value: f64) -> Result<()> {
        self.distance.round_to_zero = checked("distance.round_to_zero", value)?;
        Ok(())
    }

    pub fn set_distance_threshold(&mut self, value: f64) -> Result<()> {
        self.distance.global_threshold = checked("distance.global_threshold", value)?;
        Ok(())
    }

    pub fn set_touch_positive_offset(&mut self, value: f64) -> Result<()> {
        self.touch.positive_offset = checked("touch.positive_offset", value)?;
        Ok(())
    }

    pub fn set_touch_negative_offset_ratio(&mut self, value: f64) -> Result<()> {
        self.touch.negative_offset_ratio = checked("touch.negative_offset_ratio", value)?;
        Ok(())
    }

    pub fn set_equal_samples_per_area(&mut self, value: f64) -> Result<()> {
        self.equal.samples_per_area = checked("equal.samples_per_area", value)?;
        Ok(())
    }

    pub fn set_equal_threshold(&mut self, value: f64) -> Result<()> {
        self.equal.global_threshold = checked("equal.global_threshold", value)?;
        Ok(())
    }

    pub fn set_probe_samples_per_area(&mut self, value: f64) -> Result<()> {
        self.probe.samples_per_area = checked("probe.samples_per_area", value)?;
        Ok(())
    }

    pub fn set_index_fanout(&mut self, min_fanout: usize, max_fanout: usize) -> Result<()> {
        self.index.set_fanout(min_fanout, max_fanout)
    }
}

/// Diagnostic dump with a fixed layout and four decimals per value.
///
/// Not meant to be parsed back; use serde for persistence.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Direction: PositiveOffset={:.4}; RaysPerArea={:.4}; AllowArbitrary={}",
            self.direction.positive_offset,
            self.direction.rays_per_area,
            self.direction.allow_arbitrary_direction
        )?;
        writeln!(
            f,
            "Distance: RoundToZero={:.4}; GlobalThreshold={:.4}",
            self.distance.round_to_zero, self.distance.global_threshold
        )?;
        writeln!(
            f,
            "Touch: PositiveOffset={:.4}; NegativeOffsetRatio={:.4}; NegativeOffset={:.4}",
            self.touch.positive_offset,
            self.touch.negative_offset_ratio,
            self.touch_negative_offset()
        )?;
        writeln!(f, "Overlap: NegativeOffset={:.4}", self.overlap_negative_offset())?;
        writeln!(f, "Contain: NegativeOffset={:.4}", self.contain_negative_offset())?;
        writeln!(
            f,
            "Equal: SamplesPerArea={:.4}; GlobalThreshold={:.4}",
            self.equal.samples_per_area, self.equal.global_threshold
        )?;
        writeln!(f, "Probe: SamplesPerArea={:.4}", self.probe.samples_per_area)?;
        write!(
            f,
            "Index: MinFanout={}; MaxFanout={}",
            self.index.min_fanout(),
            self.index.max_fanout()
        )
    }
}
