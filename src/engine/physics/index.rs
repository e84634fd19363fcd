use std::collections::BTreeSet;

use crate::core::math::Vec2;

use super::bounds::Aabb;
use super::config::IndexConfig;
use super::handle::ObjectHandle;
use super::PhysicsError;

/// World bounds of one primitive of one object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexItem {
    pub bounds: Aabb,
    pub object: ObjectHandle,
    /// Position of the primitive in the object's shape list
    pub primitive: usize,
}

impl IndexItem {
    pub fn new(bounds: Aabb, object: ObjectHandle, primitive: usize) -> Self {
        Self {
            bounds,
            object,
            primitive,
        }
    }

    /// Ordering key: (object, primitive)
    pub fn key(&self) -> (ObjectHandle, usize) {
        (self.object, self.primitive)
    }
}

/// Broad-phase candidate; `first.key() < second.key()`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePair {
    pub first: IndexItem,
    pub second: IndexItem,
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Aabb,
    depth: u32,
    /// Indices into `SpatialIndex::items`
    items: Vec<usize>,
    children: Option<(usize, usize)>,
}

impl Node {
    fn leaf(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }
}

/// KD-tree over primitive bounds, rebuilt from scratch every step.
///
/// Nodes live in one arena and refer to each other by index. Items are
/// stored once; an item straddling a split is referenced by both halves.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    config: IndexConfig,
    items: Vec<IndexItem>,
    nodes: Vec<Node>,
}

impl SpatialIndex {
    /// Empty index
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            items: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Build a tree over `items`. Items with empty bounds are dropped.
    pub fn build(config: IndexConfig, items: impl IntoIterator<Item = IndexItem>) -> Self {
        let mut items: Vec<IndexItem> = items.into_iter().filter(|i| !i.bounds.is_empty()).collect();
        items.sort_by_key(|i| i.key());

        let root_bounds = items.iter().fold(Aabb::EMPTY, |acc, i| acc + i.bounds);
        let mut index = Self {
            config,
            items: Vec::with_capacity(items.len()),
            nodes: Vec::new(),
        };
        if !root_bounds.is_empty() {
            index.nodes.push(Node::leaf(root_bounds, 0));
        }
        for item in items {
            index.insert(item);
        }
        index
    }

    /// Add one item, descending into every child it overlaps
    fn insert(&mut self, item: IndexItem) {
        let id = self.items.len();
        self.items.push(item);

        let mut stack = vec![0];
        while let Some(node) = stack.pop() {
            let Some(current) = self.nodes.get(node) else {
                continue;
            };
            if !current.bounds.intersects(&item.bounds) {
                continue;
            }
            let children = current.children;
            match children {
                Some((low, high)) => {
                    stack.push(high);
                    stack.push(low);
                }
                None => {
                    self.nodes[node].items.push(id);
                    self.split(node);
                }
            }
        }
    }

    fn should_split(&self, node: &Node) -> bool {
        if node.items.len() <= self.config.leaf_capacity || node.depth >= self.config.max_depth {
            return false;
        }
        let objects: BTreeSet<ObjectHandle> = node.items.iter().map(|&i| self.items[i].object).collect();
        if objects.len() < 2 {
            return false;
        }
        // Items that each fill most of the leaf would land in both halves
        // again, so splitting stops once every item does.
        !node
            .items
            .iter()
            .all(|&i| node.bounds.coverage(&self.items[i].bounds) >= self.config.coverage_threshold)
    }

    /// Split a leaf in two and push its items down, recursively
    fn split(&mut self, node: usize) {
        if !self.should_split(&self.nodes[node]) {
            return;
        }
        let depth = self.nodes[node].depth;
        let (low_bounds, high_bounds) = self.nodes[node].bounds.halves(depth % 2 == 0);

        let mut low = Node::leaf(low_bounds, depth + 1);
        let mut high = Node::leaf(high_bounds, depth + 1);
        for id in std::mem::take(&mut self.nodes[node].items) {
            let bounds = self.items[id].bounds;
            if low.bounds.intersects(&bounds) {
                low.items.push(id);
            }
            if high.bounds.intersects(&bounds) {
                high.items.push(id);
            }
        }

        let low_id = self.nodes.len();
        self.nodes.push(low);
        self.nodes.push(high);
        self.nodes[node].children = Some((low_id, low_id + 1));

        self.split(low_id);
        self.split(low_id + 1);
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Indexed items in (object, primitive) order
    pub fn items(&self) -> &[IndexItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.children.is_none()).count()
    }

    /// Deepest node depth, 0 for a single leaf
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Verify every node's item and child references
    pub fn validate(&self) -> Result<(), PhysicsError> {
        for (id, node) in self.nodes.iter().enumerate() {
            if let Some(&bad) = node.items.iter().find(|&&i| i >= self.items.len()) {
                return Err(PhysicsError::IndexCorrupted(format!(
                    "node {} references item {} of {}",
                    id,
                    bad,
                    self.items.len()
                )));
            }
            if let Some((low, high)) = node.children {
                if low >= self.nodes.len() || high >= self.nodes.len() || low <= id || high <= id {
                    return Err(PhysicsError::IndexCorrupted(format!(
                        "node {} has children ({}, {}) of {} nodes",
                        id,
                        low,
                        high,
                        self.nodes.len()
                    )));
                }
                if !node.items.is_empty() {
                    return Err(PhysicsError::IndexCorrupted(format!(
                        "inner node {} still holds {} items",
                        id,
                        node.items.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Candidate pairs from every leaf: items of different objects whose
    /// bounds overlap, ordered by key and free of duplicates
    pub fn collect_pairs(&self) -> Result<Vec<CandidatePair>, PhysicsError> {
        self.validate()?;

        let mut pairs: Vec<(usize, usize)> = Vec::new();
        for node in self.nodes.iter().filter(|n| n.children.is_none()) {
            for (n, &a) in node.items.iter().enumerate() {
                for &b in &node.items[n + 1..] {
                    let (first, second) = (&self.items[a], &self.items[b]);
                    if first.object == second.object || !first.bounds.intersects(&second.bounds) {
                        continue;
                    }
                    // Items are stored in key order, so the index order is canonical
                    pairs.push((a.min(b), a.max(b)));
                }
            }
        }
        pairs.sort_unstable();
        pairs.dedup();

        Ok(pairs
            .into_iter()
            .map(|(a, b)| CandidatePair {
                first: self.items[a],
                second: self.items[b],
            })
            .collect())
    }

    /// Items whose bounds intersect `region`, in key order
    pub fn region_query(&self, region: &Aabb) -> Vec<IndexItem> {
        let mut found = BTreeSet::new();
        let mut stack = if self.nodes.is_empty() { vec![] } else { vec![0] };
        while let Some(node) = stack.pop() {
            let Some(node) = self.nodes.get(node) else {
                continue;
            };
            if !node.bounds.intersects(region) {
                continue;
            }
            match node.children {
                Some((low, high)) => {
                    stack.push(high);
                    stack.push(low);
                }
                None => found.extend(
                    node.items
                        .iter()
                        .copied()
                        .filter(|&i| self.items.get(i).is_some_and(|item| item.bounds.intersects(region))),
                ),
            }
        }
        found.into_iter().map(|i| self.items[i]).collect()
    }

    /// Items whose bounds contain `point`
    pub fn point_query(&self, point: Vec2) -> Vec<IndexItem> {
        self.region_query(&Aabb::new(point, point))
    }

    /// Edges of every node's bounds
    pub fn debug_lines(&self) -> Vec<(Vec2, Vec2)> {
        self.nodes.iter().flat_map(|n| n.bounds.edges()).collect()
    }
}
