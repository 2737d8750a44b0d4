// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Name-based predicate dispatch for the query layer.

use std::fmt;
use std::sync::Arc;

use ifcql_geometry::{PointSampler, SurfaceSampler, TriangleMesh, Vector3};

use crate::config::Config;
use crate::direction::{Direction, DirectionRegistry};
use crate::error::{Error, Result};
use crate::predicates::{Coverage, EqualStrategy, Evaluator};
use crate::repository::{MeshPair, NamePair, SpatialRepository};

/// Binary spatial predicate, evaluated at the configured tolerances
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Touch,
    /// Touch without the nesting check
    TouchUnnested,
    Overlap,
    Contain,
    Cover,
    Equal(EqualStrategy),
    /// Surfaces within the global distance threshold
    DistanceWithin,
    Directional {
        direction: Direction,
        coverage: Coverage,
    },
}

impl Predicate {
    /// Parse an operator name, ignoring ASCII case.
    ///
    /// Directional names are `<Direction>OfStrict` or `<Direction>OfRelaxed`
    /// for any direction in `directions`.
    pub fn parse(name: &str, directions: &DirectionRegistry) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        let fixed = match lower.as_str() {
            "touch" => Some(Self::Touch),
            "touchunnested" => Some(Self::TouchUnnested),
            "overlap" => Some(Self::Overlap),
            "contain" => Some(Self::Contain),
            "cover" => Some(Self::Cover),
            "equal" => Some(Self::Equal(EqualStrategy::BruteForce)),
            "equalindexed" => Some(Self::Equal(EqualStrategy::Indexed)),
            "distancewithin" => Some(Self::DistanceWithin),
            _ => None,
        };
        if let Some(predicate) = fixed {
            return Ok(predicate);
        }

        for (suffix, coverage) in [("ofstrict", Coverage::Strict), ("ofrelaxed", Coverage::Relaxed)] {
            if let Some(stem) = lower.strip_suffix(suffix) {
                let direction = directions
                    .get(stem)
                    .ok_or_else(|| Error::UnknownDirection(name[..stem.len()].to_string()))?;
                return Ok(Self::Directional {
                    direction: direction.clone(),
                    coverage,
                });
            }
        }

        Err(Error::UnknownOperator(name.to_string()))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Touch => f.write_str("Touch"),
            Self::TouchUnnested => f.write_str("TouchUnnested"),
            Self::Overlap => f.write_str("Overlap"),
            Self::Contain => f.write_str("Contain"),
            Self::Cover => f.write_str("Cover"),
            Self::Equal(EqualStrategy::BruteForce) => f.write_str("Equal"),
            Self::Equal(EqualStrategy::Indexed) => f.write_str("EqualIndexed"),
            Self::DistanceWithin => f.write_str("DistanceWithin"),
            Self::Directional {
                direction,
                coverage,
            } => {
                let suffix = match coverage {
                    Coverage::Strict => "OfStrict",
                    Coverage::Relaxed => "OfRelaxed",
                };
                write!(f, "{}{}", direction.name(), suffix)
            }
        }
    }
}

impl<'a> Evaluator<'a> {
    /// Single-pair test of `predicate`
    pub fn test(&self, predicate: &Predicate, a: &TriangleMesh, b: &TriangleMesh) -> bool {
        let config = self.config();
        match predicate {
            Predicate::Touch => self.touch_default(a, b),
            Predicate::TouchUnnested => self.touch_unnested(
                a,
                b,
                config.touch.positive_offset,
                config.touch_negative_offset(),
            ),
            Predicate::Overlap => self.overlap_default(a, b),
            Predicate::Contain => self.contain_default(a, b),
            Predicate::Cover => self.cover(
                a,
                b,
                config.touch.positive_offset,
                config.touch_negative_offset(),
            ),
            Predicate::Equal(strategy) => self.equal(a, b, *strategy),
            Predicate::DistanceWithin => self.distance_within_global(a, b),
            Predicate::Directional {
                direction,
                coverage,
            } => self.directional(a, b, direction, *coverage),
        }
    }

    /// Pairs satisfying `predicate`, in input order
    pub fn filter(&self, predicate: &Predicate, pairs: &[MeshPair]) -> Vec<MeshPair> {
        pairs
            .iter()
            .filter(|(a, b)| self.test(predicate, a, b))
            .cloned()
            .collect()
    }
}

/// Configuration, directions, sampler and repository behind name-based
/// execution.
pub struct SpatialEngine {
    config: Config,
    directions: DirectionRegistry,
    sampler: Box<dyn PointSampler>,
    repository: SpatialRepository,
}

impl Default for SpatialEngine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl SpatialEngine {
    pub fn new(config: Config) -> Self {
        Self::with_sampler(config, SurfaceSampler::new())
    }

    pub fn with_sampler(config: Config, sampler: impl PointSampler + 'static) -> Self {
        Self {
            config,
            directions: DirectionRegistry::new(),
            sampler: Box::new(sampler),
            repository: SpatialRepository::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable configuration; only between executions
    #[inline]
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    #[inline]
    pub fn directions(&self) -> &DirectionRegistry {
        &self.directions
    }

    #[inline]
    pub fn repository(&self) -> &SpatialRepository {
        &self.repository
    }

    #[inline]
    pub fn repository_mut(&mut self) -> &mut SpatialRepository {
        &mut self.repository
    }

    /// Register a custom direction under the current direction tolerance
    pub fn register_direction(&mut self, name: impl Into<String>, vector: Vector3<f64>) -> Result<()> {
        self.directions
            .register(name, vector, &self.config.direction)
            .map(|_| ())
    }

    /// Evaluation session borrowing this engine's state
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.config, self.sampler.as_ref(), &self.directions)
    }

    /// Evaluate `operator` over `set1 x set2` and append the names of every
    /// matching pair to `relation`. Returns the number of pairs appended.
    pub fn execute(
        &self,
        operator: &str,
        relation: &mut Vec<NamePair>,
        set1: &[Arc<TriangleMesh>],
        set2: &[Arc<TriangleMesh>],
    ) -> Result<usize> {
        let predicate = Predicate::parse(operator, &self.directions)?;
        let eval = self.evaluator();
        let before = relation.len();

        for a in set1 {
            for b in set2 {
                if eval.test(&predicate, a, b) {
                    relation.push((a.name().to_string(), b.name().to_string()));
                }
            }
        }

        let matched = relation.len() - before;
        tracing::debug!(
            operator = %predicate,
            pairs = set1.len() * set2.len(),
            matched,
            "Executed spatial operator"
        );
        Ok(matched)
    }

    /// `execute` over the repository's operand sets: every first-set mesh
    /// against the full list of second-set meshes
    pub fn execute_registered(&self, operator: &str, relation: &mut Vec<NamePair>) -> Result<usize> {
        let mut matched = 0;
        for (mesh, many) in self.repository.one_to_many() {
            matched += self.execute(operator, relation, &[mesh], &many)?;
        }
        Ok(matched)
    }
}
