// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounding-volume tree used as the broad phase of every predicate.
//!
//! The tree is an R-tree packed bottom-up with the sort-tile-recursive
//! (STR) order: items are sorted into x slabs, each slab into y runs, each
//! run by z, and every run is split evenly into nodes of at most
//! `max_fanout` entries. Even splitting keeps non-root nodes at or above
//! `min_fanout` whenever a run holds more than one node's worth of items.
//!
//! Fanout bounds are copied from the [`IndexConfig`] passed at construction.
//! Changing the configuration later does not affect an index that already
//! exists.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::ops::ControlFlow;

use ifcql_geometry::{BoundingBox, Point3, Ray, Triangle, TriangleMesh};
use smallvec::SmallVec;

use crate::config::IndexConfig;

/// Anything with an axis-aligned bounding box
pub trait Bounded {
    fn bounds(&self) -> BoundingBox;
}

/// Items that can report their exact squared distance to a point
pub trait PointDistance: Bounded {
    fn squared_distance_to_point(&self, point: &Point3<f64>) -> f64;
}

/// Items a ray can hit; returns the ray parameter of the hit
pub trait RayCast: Bounded {
    fn ray_hit(&self, ray: &Ray) -> Option<f64>;
}

impl Bounded for Triangle {
    #[inline]
    fn bounds(&self) -> BoundingBox {
        *Triangle::bounds(self)
    }
}

impl PointDistance for Triangle {
    #[inline]
    fn squared_distance_to_point(&self, point: &Point3<f64>) -> f64 {
        self.closest_squared_distance(point)
    }
}

impl RayCast for Triangle {
    #[inline]
    fn ray_hit(&self, ray: &Ray) -> Option<f64> {
        self.ray_intersection(ray)
    }
}

impl Bounded for Point3<f64> {
    #[inline]
    fn bounds(&self) -> BoundingBox {
        BoundingBox::from_point(*self)
    }
}

impl PointDistance for Point3<f64> {
    #[inline]
    fn squared_distance_to_point(&self, point: &Point3<f64>) -> f64 {
        (self - point).norm_squared()
    }
}

#[derive(Debug, Clone)]
struct Node {
    bounds: BoundingBox,
    /// Children are item indices when set, node indices otherwise
    leaf: bool,
    children: SmallVec<[usize; 16]>,
}

/// Reference to either an inner node or a stored item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Node(usize),
    Item(usize),
}

/// Min-heap entry ordered by distance
#[derive(Debug, Clone, Copy)]
struct Candidate<K> {
    distance: f64,
    exact: bool,
    key: K,
}

impl<K> PartialEq for Candidate<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K> Eq for Candidate<K> {}

impl<K> PartialOrd for Candidate<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for Candidate<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; exact entries win ties so they pop first
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| self.exact.cmp(&other.exact))
    }
}

/// Packing entry: a slot of the level being built
#[derive(Debug, Clone, Copy)]
struct Entry {
    slot: usize,
    bounds: BoundingBox,
    center: Point3<f64>,
}

impl Entry {
    fn new(slot: usize, bounds: BoundingBox) -> Self {
        Self {
            slot,
            bounds,
            center: bounds.center(),
        }
    }
}

/// Static R-tree over items with bounding boxes
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    items: Vec<T>,
    nodes: Vec<Node>,
    root: Option<usize>,
    depth: usize,
    fanout: IndexConfig,
}

impl<T: Bounded> SpatialIndex<T> {
    /// Build an index over `items` with the fanout bounds of `config`
    pub fn bulk_load(items: Vec<T>, config: &IndexConfig) -> Self {
        let mut index = Self {
            items,
            nodes: Vec::new(),
            root: None,
            depth: 0,
            fanout: *config,
        };
        index.pack();
        tracing::trace!(
            items = index.items.len(),
            nodes = index.nodes.len(),
            depth = index.depth,
            "Packed spatial index"
        );
        index
    }

    /// Add items and repack the whole tree with the fanout captured at
    /// construction
    pub fn insert_bulk<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.items.extend(items);
        self.pack();
    }

    fn pack(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.depth = 0;
        if self.items.is_empty() {
            return;
        }

        let max = self.fanout.max_fanout();
        let mut level: Vec<Entry> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| Entry::new(i, item.bounds()))
            .collect();
        let mut leaf = true;

        loop {
            let groups = str_groups(level, max);
            let mut next = Vec::with_capacity(groups.len());
            for group in groups {
                let Some(bounds) = BoundingBox::union_all(group.iter().map(|e| e.bounds)) else {
                    continue;
                };
                let slot = self.nodes.len();
                self.nodes.push(Node {
                    bounds,
                    leaf,
                    children: group.iter().map(|e| e.slot).collect(),
                });
                next.push(Entry::new(slot, bounds));
            }
            self.depth += 1;
            leaf = false;

            if next.len() <= 1 {
                self.root = next.first().map(|e| e.slot);
                return;
            }
            level = next;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of node levels, 0 when empty
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Box covering every item, `None` when empty
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.root.map(|root| self.nodes[root].bounds)
    }

    /// Fanout bounds this index was packed with
    #[inline]
    pub fn fanout(&self) -> &IndexConfig {
        &self.fanout
    }

    #[inline]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    fn slot_bounds(&self, slot: Slot) -> BoundingBox {
        match slot {
            Slot::Node(i) => self.nodes[i].bounds,
            Slot::Item(i) => self.items[i].bounds(),
        }
    }

    fn children(&self, node: usize) -> impl Iterator<Item = Slot> + '_ {
        let node = &self.nodes[node];
        let leaf = node.leaf;
        node.children
            .iter()
            .map(move |&c| if leaf { Slot::Item(c) } else { Slot::Node(c) })
    }

    /// Visit every item whose box passes `accept`, pruning nodes that fail
    /// it. `on_item` can stop the walk early.
    fn visit<'s, A, F>(&'s self, accept: A, mut on_item: F)
    where
        A: Fn(&BoundingBox) -> bool,
        F: FnMut(&'s T) -> ControlFlow<()>,
    {
        let mut stack: Vec<Slot> = self.root.map(Slot::Node).into_iter().collect();
        while let Some(slot) = stack.pop() {
            match slot {
                Slot::Node(i) => {
                    if accept(&self.nodes[i].bounds) {
                        stack.extend(self.children(i));
                    }
                }
                Slot::Item(i) => {
                    let item = &self.items[i];
                    if accept(&item.bounds()) && on_item(item).is_break() {
                        return;
                    }
                }
            }
        }
    }

    /// Items whose boxes intersect `bounds` widened by `offset`
    pub fn query(&self, bounds: &BoundingBox, offset: f64) -> Vec<&T> {
        let mut found = Vec::new();
        self.visit(
            |b| b.intersects(bounds, offset),
            |item| {
                found.push(item);
                ControlFlow::Continue(())
            },
        );
        found
    }

    /// Items whose boxes intersect the box of `item` widened by `offset`
    pub fn intersecting<B: Bounded>(&self, item: &B, offset: f64) -> Vec<&T> {
        self.query(&item.bounds(), offset)
    }

    /// Best-first search for the item minimizing `exact`.
    ///
    /// `lower` must never exceed `exact` for any item inside the given box.
    pub fn nearest_by<L, E>(&self, lower: L, exact: E) -> Option<(&T, f64)>
    where
        L: Fn(&BoundingBox) -> f64,
        E: Fn(&T) -> f64,
    {
        let root = self.root?;
        let mut heap = BinaryHeap::new();
        heap.push(Candidate {
            distance: lower(&self.nodes[root].bounds),
            exact: false,
            key: Slot::Node(root),
        });

        while let Some(Candidate { distance, exact: done, key }) = heap.pop() {
            match key {
                Slot::Item(i) if done => return Some((&self.items[i], distance)),
                Slot::Item(i) => heap.push(Candidate {
                    distance: exact(&self.items[i]),
                    exact: true,
                    key,
                }),
                Slot::Node(i) => {
                    for child in self.children(i) {
                        heap.push(Candidate {
                            distance: lower(&self.slot_bounds(child)),
                            exact: false,
                            key: child,
                        });
                    }
                }
            }
        }
        None
    }

    /// Pairs `(self item, other item)` whose boxes intersect within `offset`
    pub fn pairs_within<'s, 'o, U: Bounded>(
        &'s self,
        other: &'o SpatialIndex<U>,
        offset: f64,
    ) -> Vec<(&'s T, &'o U)> {
        let mut pairs = Vec::new();
        let (Some(ra), Some(rb)) = (self.root, other.root) else {
            return pairs;
        };

        let mut stack = vec![(Slot::Node(ra), Slot::Node(rb))];
        while let Some((a, b)) = stack.pop() {
            if !self.slot_bounds(a).intersects(&other.slot_bounds(b), offset) {
                continue;
            }
            match (a, b) {
                (Slot::Item(i), Slot::Item(j)) => pairs.push((&self.items[i], &other.items[j])),
                (Slot::Item(_), Slot::Node(j)) => {
                    stack.extend(other.children(j).map(|c| (a, c)));
                }
                (Slot::Node(i), Slot::Item(_)) => {
                    stack.extend(self.children(i).map(|c| (c, b)));
                }
                (Slot::Node(i), Slot::Node(j)) => {
                    if self.nodes[i].bounds.half_area() >= other.nodes[j].bounds.half_area() {
                        stack.extend(self.children(i).map(|c| (c, b)));
                    } else {
                        stack.extend(other.children(j).map(|c| (a, c)));
                    }
                }
            }
        }
        pairs
    }

    /// Dual-tree best-first search for the pair minimizing `exact`.
    ///
    /// Node pairs are ranked by the squared gap between their boxes, so
    /// `exact` must return squared distances. Stops early at zero.
    pub fn closest_pair<'s, 'o, U, E>(
        &'s self,
        other: &'o SpatialIndex<U>,
        exact: E,
    ) -> Option<(&'s T, &'o U, f64)>
    where
        U: Bounded,
        E: Fn(&T, &U) -> f64,
    {
        let (ra, rb) = (self.root?, other.root?);
        let mut heap = BinaryHeap::new();
        heap.push(Candidate {
            distance: self.nodes[ra].bounds.squared_distance(&other.nodes[rb].bounds),
            exact: false,
            key: (Slot::Node(ra), Slot::Node(rb)),
        });

        while let Some(Candidate { distance, exact: done, key }) = heap.pop() {
            let (a, b) = key;
            let split_self = match (a, b) {
                (Slot::Item(i), Slot::Item(j)) => {
                    let (x, y) = (&self.items[i], &other.items[j]);
                    if done {
                        return Some((x, y, distance));
                    }
                    let d = exact(x, y);
                    if d <= 0.0 {
                        return Some((x, y, 0.0));
                    }
                    heap.push(Candidate {
                        distance: d,
                        exact: true,
                        key,
                    });
                    continue;
                }
                (Slot::Item(_), Slot::Node(_)) => false,
                (Slot::Node(_), Slot::Item(_)) => true,
                (Slot::Node(i), Slot::Node(j)) => {
                    self.nodes[i].bounds.half_area() >= other.nodes[j].bounds.half_area()
                }
            };

            if let (true, Slot::Node(i)) = (split_self, a) {
                let fixed = other.slot_bounds(b);
                for child in self.children(i) {
                    heap.push(Candidate {
                        distance: self.slot_bounds(child).squared_distance(&fixed),
                        exact: false,
                        key: (child, b),
                    });
                }
            } else if let Slot::Node(j) = b {
                let fixed = self.slot_bounds(a);
                for child in other.children(j) {
                    heap.push(Candidate {
                        distance: fixed.squared_distance(&other.slot_bounds(child)),
                        exact: false,
                        key: (a, child),
                    });
                }
            }
        }
        None
    }
}

impl<T: PointDistance> SpatialIndex<T> {
    /// Nearest item to `point` with its squared distance
    pub fn nearest(&self, point: &Point3<f64>) -> Option<(&T, f64)> {
        self.nearest_by(
            |b| b.squared_distance_to_point(point),
            |item| item.squared_distance_to_point(point),
        )
    }

    /// Whether any item lies within `radius` of `point`
    pub fn any_within(&self, point: &Point3<f64>, radius: f64) -> bool {
        let limit = radius * radius;
        let mut found = false;
        self.visit(
            |b| b.squared_distance_to_point(point) <= limit,
            |item| {
                found = item.squared_distance_to_point(point) <= limit;
                if found {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        );
        found
    }
}

impl<T: RayCast> SpatialIndex<T> {
    /// Every hit along `ray`, ordered by ray parameter
    pub fn cast_ray(&self, ray: &Ray) -> Vec<(&T, f64)> {
        let mut hits = Vec::new();
        self.visit(
            |b| b.ray_entry(ray).is_some(),
            |item| {
                if let Some(t) = item.ray_hit(ray) {
                    hits.push((item, t));
                }
                ControlFlow::Continue(())
            },
        );
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits
    }

    /// Number of items hit by `ray`
    pub fn ray_hits(&self, ray: &Ray) -> usize {
        let mut count = 0;
        self.visit(
            |b| b.ray_entry(ray).is_some(),
            |item| {
                count += usize::from(item.ray_hit(ray).is_some());
                ControlFlow::Continue(())
            },
        );
        count
    }

    pub fn any_ray_hit(&self, ray: &Ray) -> bool {
        let mut hit = false;
        self.visit(
            |b| b.ray_entry(ray).is_some(),
            |item| {
                hit = item.ray_hit(ray).is_some();
                if hit {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        );
        hit
    }
}

impl SpatialIndex<Triangle> {
    /// Index the triangles of `mesh`
    pub fn from_mesh(mesh: &TriangleMesh, config: &IndexConfig) -> Self {
        tracing::debug!(
            mesh = %mesh.name(),
            triangles = mesh.triangle_count(),
            "Indexing mesh"
        );
        Self::bulk_load(mesh.triangles().to_vec(), config)
    }

    /// Nearest triangle to `triangle` by exact triangle distance
    pub fn nearest_to_triangle(&self, triangle: &Triangle) -> Option<(&Triangle, f64)> {
        let target = *triangle.bounds();
        self.nearest_by(
            |b| b.squared_distance(&target),
            |item| item.squared_distance(triangle),
        )
    }
}

/// Sort-tile-recursive grouping of one tree level
fn str_groups(mut entries: Vec<Entry>, max: usize) -> Vec<Vec<Entry>> {
    let node_count = entries.len().div_ceil(max);
    let slabs = (node_count as f64).cbrt().ceil() as usize;
    sort_by_axis(&mut entries, 0);

    let mut groups = Vec::with_capacity(node_count);
    for mut slab in split_even(entries, slabs) {
        sort_by_axis(&mut slab, 1);
        let runs = (slab.len().div_ceil(max) as f64).sqrt().ceil() as usize;
        for mut run in split_even(slab, runs) {
            sort_by_axis(&mut run, 2);
            let parts = run.len().div_ceil(max);
            groups.extend(split_even(run, parts));
        }
    }
    groups
}

fn sort_by_axis(entries: &mut [Entry], axis: usize) {
    entries.sort_by(|a, b| a.center[axis].total_cmp(&b.center[axis]));
}

/// Split into `parts` contiguous chunks whose sizes differ by at most one
fn split_even<E>(items: Vec<E>, parts: usize) -> Vec<Vec<E>> {
    let parts = parts.clamp(1, items.len().max(1));
    let base = items.len() / parts;
    let extra = items.len() % parts;
    let mut iter = items.into_iter();
    (0..parts)
        .map(|i| iter.by_ref().take(base + usize::from(i < extra)).collect())
        .collect()
}
