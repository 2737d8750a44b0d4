// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of named meshes and the pair enumerations fed to predicates.

use std::sync::Arc;

use ifcql_geometry::TriangleMesh;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};

/// Ordered pair of meshes handed to a binary predicate
pub type MeshPair = (Arc<TriangleMesh>, Arc<TriangleMesh>);

/// Ordered pair of mesh names written back to the caller
pub type NamePair = (String, String);

/// Default name prefix that places a mesh in the second operand set
pub const SECOND_OPERAND_PREFIX: &str = "2:";

/// Insertion-ordered mesh registry with unique names.
///
/// Meshes are registered once after geometry extraction and the registry is
/// reset between independent queries. Pair enumeration is quadratic; callers
/// are expected to filter candidates before registering them.
#[derive(Debug, Clone)]
pub struct SpatialRepository {
    meshes: Vec<Arc<TriangleMesh>>,
    by_name: FxHashMap<String, usize>,
    second_prefix: String,
}

impl Default for SpatialRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialRepository {
    pub fn new() -> Self {
        Self::with_second_prefix(SECOND_OPERAND_PREFIX)
    }

    /// Registry whose second operand set is every name starting with `prefix`
    pub fn with_second_prefix(prefix: impl Into<String>) -> Self {
        Self {
            meshes: Vec::new(),
            by_name: FxHashMap::default(),
            second_prefix: prefix.into(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Registered meshes in insertion order
    #[inline]
    pub fn meshes(&self) -> &[Arc<TriangleMesh>] {
        &self.meshes
    }

    pub fn add_mesh(&mut self, mesh: impl Into<Arc<TriangleMesh>>) -> Result<()> {
        self.add_meshes([mesh.into()])
    }

    /// Register a batch of meshes.
    ///
    /// The batch is all-or-nothing: a name that is already registered, or
    /// that appears twice in the batch, fails the call and leaves the
    /// registry unchanged.
    pub fn add_meshes<I>(&mut self, meshes: I) -> Result<()>
    where
        I: IntoIterator<Item = Arc<TriangleMesh>>,
    {
        let batch: Vec<Arc<TriangleMesh>> = meshes.into_iter().collect();

        let mut incoming = FxHashSet::default();
        for mesh in &batch {
            let name = mesh.name();
            if self.by_name.contains_key(name) || !incoming.insert(name) {
                tracing::warn!(mesh = %name, batch = batch.len(), "Rejected mesh batch with duplicate name");
                return Err(Error::DuplicateMeshName(name.to_string()));
            }
        }

        self.meshes.reserve(batch.len());
        for mesh in batch {
            tracing::debug!(mesh = %mesh.name(), triangles = mesh.triangle_count(), "Registered mesh");
            self.by_name.insert(mesh.name().to_string(), self.meshes.len());
            self.meshes.push(mesh);
        }
        Ok(())
    }

    /// Look up a mesh; `None` when the name is not registered
    pub fn mesh_by_name(&self, name: &str) -> Option<Arc<TriangleMesh>> {
        self.by_name.get(name).map(|&i| Arc::clone(&self.meshes[i]))
    }

    /// Remove and return a mesh, keeping the order of the others
    pub fn remove_mesh_by_name(&mut self, name: &str) -> Option<Arc<TriangleMesh>> {
        let index = self.by_name.remove(name)?;
        let mesh = self.meshes.remove(index);
        for slot in self.by_name.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        tracing::debug!(mesh = %name, "Removed mesh");
        Some(mesh)
    }

    /// Drop every registered mesh
    pub fn reset(&mut self) {
        tracing::debug!(meshes = self.meshes.len(), "Reset repository");
        self.meshes.clear();
        self.by_name.clear();
    }

    /// Drop the sample clouds attached to registered meshes
    pub fn clear_samples(&self) {
        for mesh in &self.meshes {
            mesh.clear_samples();
        }
    }

    /// Whether `name` belongs to the second operand set
    #[inline]
    pub fn is_second_operand(&self, name: &str) -> bool {
        name.starts_with(self.second_prefix.as_str())
    }

    /// Meshes of operand set 1 (every name without the second-set prefix)
    pub fn first_operands(&self) -> Vec<Arc<TriangleMesh>> {
        self.meshes
            .iter()
            .filter(|m| !self.is_second_operand(m.name()))
            .cloned()
            .collect()
    }

    /// Meshes of operand set 2
    pub fn second_operands(&self) -> Vec<Arc<TriangleMesh>> {
        self.meshes
            .iter()
            .filter(|m| self.is_second_operand(m.name()))
            .cloned()
            .collect()
    }

    /// Every ordered pair `(i, j)` with `i != j`
    pub fn ordered_pairs(&self) -> Vec<MeshPair> {
        let n = self.meshes.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1));
        for (i, a) in self.meshes.iter().enumerate() {
            for (j, b) in self.meshes.iter().enumerate() {
                if i != j {
                    pairs.push((Arc::clone(a), Arc::clone(b)));
                }
            }
        }
        pairs
    }

    /// Every unordered pair, as `(i, j)` with `i < j`
    pub fn unordered_pairs(&self) -> Vec<MeshPair> {
        let n = self.meshes.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for (i, a) in self.meshes.iter().enumerate() {
            for b in &self.meshes[i + 1..] {
                pairs.push((Arc::clone(a), Arc::clone(b)));
            }
        }
        pairs
    }

    /// Each first-set mesh with the full list of second-set meshes
    pub fn one_to_many(&self) -> Vec<(Arc<TriangleMesh>, Vec<Arc<TriangleMesh>>)> {
        let second = self.second_operands();
        self.first_operands()
            .into_iter()
            .map(|mesh| (mesh, second.clone()))
            .collect()
    }
}
