// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Height-balanced binary tree over Z-order keys.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]; freed nodes
//! are recycled through a free list. Leaves hold every body whose rounded
//! bounds centre maps to the leaf's key, newest first. When a leaf's bounds
//! change its key is re-derived from them, but only moves while it stays
//! strictly between the neighbouring leaves' keys. Interior nodes carry the
//! union of their subtree's bounds and a key clamped so that
//! `left.max_key < key <= right.min_key`, which is what the descent in
//! [`SpatialTree::insert`] relies on.

use core::fmt;
use std::collections::BTreeSet;

use ortho_geom::Bounds2D;
use thiserror::Error;

use super::zorder::key_of;
use crate::body::{Body, BodyHandle, BodySet};

/// Index of a node in the tree arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw arena index.
    pub const fn index(self) -> u32 {
        self.0
    }

    const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// First structural invariant found broken by [`SpatialTree::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// Child heights differ by more than one.
    #[error("{node}: balance factor {balance} outside -1..=1")]
    Unbalanced {
        /// Offending interior node.
        node: NodeId,
        /// Left height minus right height.
        balance: i64,
    },
    /// Cached height disagrees with the children.
    #[error("{node}: stored height {stored}, expected {expected}")]
    Height {
        /// Offending node.
        node: NodeId,
        /// Height found in the node.
        stored: u32,
        /// Height derived from the children.
        expected: u32,
    },
    /// Interior key does not separate the two subtrees.
    #[error("{node}: key {key:#x} not within ({left_max:#x}, {right_min:#x}]")]
    KeyOrder {
        /// Offending interior node.
        node: NodeId,
        /// The node's key.
        key: u64,
        /// Largest key on the left.
        left_max: u64,
        /// Smallest key on the right.
        right_min: u64,
    },
    /// Cached min/max keys disagree with the subtree.
    #[error("{node}: key range does not match its subtree")]
    KeyRange {
        /// Offending node.
        node: NodeId,
    },
    /// A child does not point back at its parent, or the root has a parent.
    #[error("{node}: parent link is broken")]
    ParentLink {
        /// Node whose parent link is wrong.
        node: NodeId,
    },
    /// A reachable leaf holds no bodies.
    #[error("{node}: leaf holds no bodies")]
    EmptyLeaf {
        /// Offending leaf.
        node: NodeId,
    },
    /// A body appears in more than one place.
    #[error("{body} is listed twice")]
    DuplicateBody {
        /// The repeated body.
        body: BodyHandle,
    },
    /// A listed body does not name this leaf as its node.
    #[error("{body} does not point back at {node}")]
    BackReference {
        /// Leaf listing the body.
        node: NodeId,
        /// The body.
        body: BodyHandle,
    },
    /// A released node is still linked into the tree.
    #[error("{node} is free but still reachable")]
    FreeNode {
        /// The released node.
        node: NodeId,
    },
}

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf(Vec<BodyHandle>),
    Interior { left: NodeId, right: NodeId },
    Free,
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Bounds2D,
    key: u64,
    min_key: u64,
    max_key: u64,
    height: u32,
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl Node {
    fn leaf(body: BodyHandle, bounds: Bounds2D, key: u64) -> Self {
        Self {
            bounds,
            key,
            min_key: key,
            max_key: key,
            height: 0,
            parent: None,
            kind: NodeKind::Leaf(vec![body]),
        }
    }

    const fn interior(left: NodeId, right: NodeId, parent: Option<NodeId>) -> Self {
        Self {
            bounds: Bounds2D::INVALID,
            key: 0,
            min_key: 0,
            max_key: 0,
            height: 1,
            parent,
            kind: NodeKind::Interior { left, right },
        }
    }
}

/// Incrementally balanced spatial index keyed by Z-order.
#[derive(Debug, Default)]
pub struct SpatialTree {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    stack: Vec<NodeId>,
}

fn set_body_node(bodies: &mut BodySet, handle: BodyHandle, node: Option<NodeId>) {
    if let Some(body) = bodies.get_mut(handle) {
        body.set_tree_node(node);
    }
}

impl SpatialTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Root node, if any body is indexed.
    pub const fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// `true` when nothing is indexed.
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the root; a lone leaf has height 0.
    pub fn height(&self) -> u32 {
        self.root.map_or(0, |root| self.node(root).height)
    }

    /// Nodes currently linked into the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Bodies listed by `leaf`, newest first. `None` for interior nodes.
    pub fn leaf_bodies(&self, leaf: NodeId) -> Option<&[BodyHandle]> {
        match &self.nodes.get(leaf.slot())?.kind {
            NodeKind::Leaf(list) => Some(list),
            _ => None,
        }
    }

    /// Z-order key of `node`.
    pub fn key(&self, node: NodeId) -> Option<u64> {
        self.nodes.get(node.slot()).map(|n| n.key)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.slot()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.slot()]
    }

    fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        match self.node(id).kind {
            NodeKind::Interior { left, right } => Some((left, right)),
            _ => None,
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            *self.node_mut(id) = node;
            return id;
        }
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    fn release(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.kind = NodeKind::Free;
        node.parent = None;
        self.free.push(id);
    }

    /// Indexes `handle` under the key of its bounds centre, or refreshes its
    /// leaf if the key did not change.
    pub fn insert(&mut self, bodies: &mut BodySet, handle: BodyHandle) {
        let Some(body) = bodies.get(handle) else {
            return;
        };
        let bounds = body.bounds().xz();
        let key = key_of(bounds.center());
        if let Some(leaf) = body.tree_node() {
            if self.node(leaf).key == key {
                self.refresh_leaf(leaf, bodies);
                return;
            }
            self.remove(bodies, handle);
        }

        let Some(root) = self.root else {
            let leaf = self.alloc(Node::leaf(handle, bounds, key));
            self.root = Some(leaf);
            set_body_node(bodies, handle, Some(leaf));
            return;
        };

        let target = self.closest_leaf(root, key);
        if self.node(target).key == key {
            let node = self.node_mut(target);
            node.bounds = node.bounds.combine(&bounds);
            if let NodeKind::Leaf(list) = &mut node.kind {
                list.insert(0, handle);
            }
            let (parent, merged) = (node.parent, node.bounds);
            set_body_node(bodies, handle, Some(target));
            self.rekey_leaf(target, key_of(merged.center()));
            self.update_ancestors(parent);
        } else {
            let leaf = self.split(target, Node::leaf(handle, bounds, key));
            set_body_node(bodies, handle, Some(leaf));
        }
    }

    /// Drops `handle` from its leaf, splicing the leaf out if it empties.
    pub fn remove(&mut self, bodies: &mut BodySet, handle: BodyHandle) {
        let Some(leaf) = bodies.get(handle).and_then(Body::tree_node) else {
            return;
        };
        set_body_node(bodies, handle, None);

        let remaining = match &mut self.node_mut(leaf).kind {
            NodeKind::Leaf(list) => {
                list.retain(|&h| h != handle);
                list.len()
            }
            _ => return,
        };
        if remaining > 0 {
            self.refresh_leaf(leaf, bodies);
            return;
        }

        let parent = self.node(leaf).parent;
        self.release(leaf);
        let Some(parent) = parent else {
            self.root = None;
            return;
        };
        let Some((left, right)) = self.children(parent) else {
            return;
        };
        let sibling = if left == leaf { right } else { left };
        let grandparent = self.node(parent).parent;
        self.replace_child(grandparent, parent, sibling);
        self.release(parent);
        self.rebalance_upward(grandparent);
    }

    /// Collects every non-kinematic indexed body whose bounds overlap `query`.
    pub fn overlap_bounds(
        &mut self,
        query: &Bounds2D,
        bodies: &BodySet,
        results: &mut Vec<BodyHandle>,
    ) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = core::mem::take(&mut self.stack);
        stack.clear();
        stack.push(root);
        while let Some(id) = stack.pop() {
            match &self.node(id).kind {
                NodeKind::Interior { left, right } => {
                    for child in [*left, *right] {
                        if self.node(child).bounds.intersects(query) {
                            stack.push(child);
                        }
                    }
                }
                NodeKind::Leaf(list) => {
                    for &handle in list {
                        let hit = bodies.get(handle).is_some_and(|body| {
                            !body.is_kinematic() && body.bounds().xz().intersects(query)
                        });
                        if hit {
                            results.push(handle);
                        }
                    }
                }
                NodeKind::Free => {}
            }
        }
        self.stack = stack;
    }

    /// Depth-first walk handing each node's bounds and height to `visit`.
    pub fn traverse_bounds<F>(&self, mut visit: F)
    where
        F: FnMut(&Bounds2D, u32),
    {
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            visit(&node.bounds, node.height);
            if let NodeKind::Interior { left, right } = node.kind {
                stack.push(left);
                stack.push(right);
            }
        }
    }

    /// Checks balance, key ordering, cached heights and links.
    pub fn validate(&self, bodies: &BodySet) -> Result<(), PartitionError> {
        let Some(root) = self.root else {
            return Ok(());
        };
        if self.node(root).parent.is_some() {
            return Err(PartitionError::ParentLink { node: root });
        }
        let mut seen = BTreeSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            match &node.kind {
                NodeKind::Free => return Err(PartitionError::FreeNode { node: id }),
                NodeKind::Leaf(list) => {
                    if list.is_empty() {
                        return Err(PartitionError::EmptyLeaf { node: id });
                    }
                    if node.height != 0 {
                        return Err(PartitionError::Height {
                            node: id,
                            stored: node.height,
                            expected: 0,
                        });
                    }
                    if node.min_key != node.key || node.max_key != node.key {
                        return Err(PartitionError::KeyRange { node: id });
                    }
                    for &body in list {
                        if !seen.insert(body) {
                            return Err(PartitionError::DuplicateBody { body });
                        }
                        if bodies.get(body).and_then(Body::tree_node) != Some(id) {
                            return Err(PartitionError::BackReference { node: id, body });
                        }
                    }
                }
                NodeKind::Interior { left, right } => {
                    let (l, r) = (self.node(*left), self.node(*right));
                    for child in [*left, *right] {
                        if self.node(child).parent != Some(id) {
                            return Err(PartitionError::ParentLink { node: child });
                        }
                    }
                    let expected = 1 + l.height.max(r.height);
                    if node.height != expected {
                        return Err(PartitionError::Height {
                            node: id,
                            stored: node.height,
                            expected,
                        });
                    }
                    let balance = i64::from(l.height) - i64::from(r.height);
                    if balance.abs() > 1 {
                        return Err(PartitionError::Unbalanced { node: id, balance });
                    }
                    if node.min_key != l.min_key || node.max_key != r.max_key {
                        return Err(PartitionError::KeyRange { node: id });
                    }
                    if !(l.max_key < node.key && node.key <= r.min_key) {
                        return Err(PartitionError::KeyOrder {
                            node: id,
                            key: node.key,
                            left_max: l.max_key,
                            right_min: r.min_key,
                        });
                    }
                    stack.push(*left);
                    stack.push(*right);
                }
            }
        }
        Ok(())
    }

    fn closest_leaf(&self, root: NodeId, key: u64) -> NodeId {
        let mut current = root;
        while let NodeKind::Interior { left, right } = self.node(current).kind {
            current = if key < self.node(current).key {
                left
            } else {
                right
            };
        }
        current
    }

    /// Pairs `target` with a new leaf under a fresh interior node.
    fn split(&mut self, target: NodeId, leaf: Node) -> NodeId {
        let key = leaf.key;
        let parent = self.node(target).parent;
        let leaf = self.alloc(leaf);
        let (left, right) = if key < self.node(target).key {
            (leaf, target)
        } else {
            (target, leaf)
        };
        let interior = self.alloc(Node::interior(left, right, parent));
        self.set_children(interior, left, right);
        self.replace_child(parent, target, interior);
        self.update_interior(interior);
        self.rebalance_upward(parent);
        leaf
    }

    fn refresh_leaf(&mut self, leaf: NodeId, bodies: &BodySet) {
        let bounds = match &self.node(leaf).kind {
            NodeKind::Leaf(list) => list
                .iter()
                .filter_map(|&h| bodies.get(h))
                .fold(Bounds2D::INVALID, |acc, body| {
                    acc.safe_combine(&body.bounds().xz())
                }),
            _ => return,
        };
        let node = self.node_mut(leaf);
        node.bounds = bounds;
        let parent = node.parent;
        self.rekey_leaf(leaf, key_of(bounds.center()));
        self.update_ancestors(parent);
    }

    /// Moves `leaf` to `key` if that keeps it strictly between its in-order
    /// neighbours; otherwise the old key stays.
    fn rekey_leaf(&mut self, leaf: NodeId, key: u64) {
        if self.node(leaf).key == key {
            return;
        }
        let (mut lower, mut upper) = (None, None);
        let mut child = leaf;
        let mut current = self.node(leaf).parent;
        while let Some(id) = current {
            if let Some((left, right)) = self.children(id) {
                if right == child && lower.is_none() {
                    lower = Some(self.node(left).max_key);
                }
                if left == child && upper.is_none() {
                    upper = Some(self.node(right).min_key);
                }
            }
            if lower.is_some() && upper.is_some() {
                break;
            }
            child = id;
            current = self.node(id).parent;
        }
        if lower.is_none_or(|k| k < key) && upper.is_none_or(|k| key < k) {
            let node = self.node_mut(leaf);
            node.key = key;
            node.min_key = key;
            node.max_key = key;
        }
    }

    fn set_children(&mut self, id: NodeId, left: NodeId, right: NodeId) {
        self.node_mut(id).kind = NodeKind::Interior { left, right };
        self.node_mut(left).parent = Some(id);
        self.node_mut(right).parent = Some(id);
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: NodeId) {
        match parent {
            None => self.root = Some(new),
            Some(p) => {
                if let NodeKind::Interior { left, right } = &mut self.node_mut(p).kind {
                    if *left == old {
                        *left = new;
                    } else if *right == old {
                        *right = new;
                    }
                }
            }
        }
        self.node_mut(new).parent = parent;
    }

    fn update_interior(&mut self, id: NodeId) {
        let Some((left, right)) = self.children(id) else {
            return;
        };
        let (l, r) = (self.node(left), self.node(right));
        let height = 1 + l.height.max(r.height);
        let bounds = l.bounds.combine(&r.bounds);
        let key = key_of(bounds.center())
            .max(l.max_key.saturating_add(1))
            .min(r.min_key);
        let (min_key, max_key) = (l.min_key, r.max_key);
        let node = self.node_mut(id);
        node.height = height;
        node.bounds = bounds;
        node.key = key;
        node.min_key = min_key;
        node.max_key = max_key;
    }

    fn update_ancestors(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            self.update_interior(id);
            current = self.node(id).parent;
        }
    }

    fn rebalance_upward(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            let top = self.balance(id);
            current = self.node(top).parent;
        }
    }

    fn height_of(&self, id: NodeId) -> i64 {
        i64::from(self.node(id).height)
    }

    /// Restores the balance factor of `id`; returns the subtree's new top.
    fn balance(&mut self, id: NodeId) -> NodeId {
        let Some((left, right)) = self.children(id) else {
            return id;
        };
        let factor = self.height_of(left) - self.height_of(right);
        if factor > 1 {
            if let Some((ll, lr)) = self.children(left) {
                if self.height_of(ll) < self.height_of(lr) {
                    self.rotate_left(left);
                }
            }
            return self.rotate_right(id);
        }
        if factor < -1 {
            if let Some((rl, rr)) = self.children(right) {
                if self.height_of(rr) < self.height_of(rl) {
                    self.rotate_right(right);
                }
            }
            return self.rotate_left(id);
        }
        self.update_interior(id);
        id
    }

    fn rotate_right(&mut self, id: NodeId) -> NodeId {
        let Some((pivot, right)) = self.children(id) else {
            return id;
        };
        let Some((pivot_left, pivot_right)) = self.children(pivot) else {
            return id;
        };
        let parent = self.node(id).parent;
        self.replace_child(parent, id, pivot);
        self.set_children(id, pivot_right, right);
        self.set_children(pivot, pivot_left, id);
        self.update_interior(id);
        self.update_interior(pivot);
        pivot
    }

    fn rotate_left(&mut self, id: NodeId) -> NodeId {
        let Some((left, pivot)) = self.children(id) else {
            return id;
        };
        let Some((pivot_left, pivot_right)) = self.children(pivot) else {
            return id;
        };
        let parent = self.node(id).parent;
        self.replace_child(parent, id, pivot);
        self.set_children(id, left, pivot_left);
        self.set_children(pivot, id, pivot_right);
        self.update_interior(id);
        self.update_interior(pivot);
        pivot
    }
}
