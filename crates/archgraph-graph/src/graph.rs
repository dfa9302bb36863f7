//! In-memory architecture graph.
//!
//! Nodes are keyed by qualified ID. Dependency edges live in a forward
//! (`source -> outgoing`) and a reverse (`target -> incoming`) index;
//! hierarchy lives in separate parent/child indices and is never stored as
//! edges. Every per-node query is a lookup against one of these indices.
//!
//! # Concurrency
//!
//! `ArchGraph` has no internal locking. Build it on one thread, then share it
//! read-only (typically as `Arc<ArchGraph>`); all `&self` methods are pure
//! lookups and are safe to call from any number of threads. The removal
//! operations take `&mut self` and must not be used on a graph that other
//! readers can still observe; put such a graph behind an exclusive lock.

use crate::{GraphEdge, GraphNode};
use archgraph_core::{
    normalize_reference, ArchGraphError, EdgeKind, ElementKind, QualifiedId, RelationOrigin,
    Result, SEPARATOR,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::debug;

/// Structural problem found by [`ArchGraph::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum GraphViolation {
    #[error("edge {from} -> {to} ({kind}) starts at a missing node")]
    MissingSource {
        from: QualifiedId,
        to: QualifiedId,
        kind: EdgeKind,
    },
    #[error("edge {from} -> {to} ({kind}) ends at a missing node")]
    MissingTarget {
        from: QualifiedId,
        to: QualifiedId,
        kind: EdgeKind,
    },
    #[error("edge {from} -> {to} ({kind}) is absent from the reverse index")]
    MissingReverseEntry {
        from: QualifiedId,
        to: QualifiedId,
        kind: EdgeKind,
    },
    #[error("reverse entry {from} -> {to} ({kind}) has no forward edge")]
    MissingForwardEntry {
        from: QualifiedId,
        to: QualifiedId,
        kind: EdgeKind,
    },
    #[error("node {node} names missing parent {parent}")]
    DanglingParent {
        node: QualifiedId,
        parent: QualifiedId,
    },
}

#[derive(Debug, Default, Clone)]
pub struct ArchGraph {
    nodes: FxHashMap<QualifiedId, GraphNode>,
    outgoing: FxHashMap<QualifiedId, Vec<GraphEdge>>,
    incoming: FxHashMap<QualifiedId, Vec<GraphEdge>>,
    children: FxHashMap<QualifiedId, Vec<QualifiedId>>,
    parents: FxHashMap<QualifiedId, QualifiedId>,
    short_ids: FxHashMap<String, Vec<QualifiedId>>,
    edge_count: usize,
}

impl ArchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Node Operations ====================

    /// Insert a node. Fails with `DuplicateIdentifier` if the ID is taken.
    pub fn insert_node(&mut self, node: GraphNode) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(ArchGraphError::DuplicateIdentifier(node.id.to_string()));
        }

        let id = node.id.clone();
        if let Some(parent) = &node.parent {
            self.children
                .entry(parent.clone())
                .or_default()
                .push(id.clone());
            self.parents.insert(id.clone(), parent.clone());
        }
        self.short_ids
            .entry(id.short_id().to_string())
            .or_default()
            .push(id.clone());

        debug!(node = %id, kind = %node.kind, "inserted node");
        self.nodes.insert(id, node);
        Ok(())
    }

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn nodes_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    pub fn count_of_kind(&self, kind: ElementKind) -> usize {
        self.nodes_of_kind(kind).count()
    }

    /// Node IDs in sorted order, for stable output.
    pub fn sorted_ids(&self) -> Vec<&QualifiedId> {
        let mut ids: Vec<&QualifiedId> = self.nodes.keys().collect();
        ids.sort();
        ids
    }

    /// Remove a node, every edge touching it, and all of its index entries.
    ///
    /// Direct children lose their parent link and become roots.
    pub fn remove_node(&mut self, id: &str) -> Result<GraphNode> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| ArchGraphError::UnknownNode(id.to_string()))?;

        if let Some(out) = self.outgoing.remove(id) {
            self.edge_count -= out.len();
            for edge in out {
                if edge.target.as_str() == id {
                    continue;
                }
                Self::drop_from_list(&mut self.incoming, &edge.target, |e| {
                    e.source.as_str() == id
                });
            }
        }
        if let Some(inc) = self.incoming.remove(id) {
            for edge in inc {
                if edge.source.as_str() == id {
                    // self-loop, already counted with the outgoing list
                    continue;
                }
                self.edge_count -= 1;
                Self::drop_from_list(&mut self.outgoing, &edge.source, |e| {
                    e.target.as_str() == id
                });
            }
        }

        if let Some(parent) = self.parents.remove(id) {
            Self::drop_from_list(&mut self.children, &parent, |c| c.as_str() == id);
        }
        if let Some(kids) = self.children.remove(id) {
            for kid in kids {
                self.parents.remove(&kid);
                if let Some(child) = self.nodes.get_mut(&kid) {
                    child.parent = None;
                }
            }
        }

        Self::drop_from_list(&mut self.short_ids, node.id.short_id(), |q| {
            q.as_str() == id
        });

        debug!(node = %id, "removed node");
        Ok(node)
    }

    /// Remove matching entries from an indexed list, deleting the key once empty.
    fn drop_from_list<K, V, Q, F>(map: &mut FxHashMap<K, Vec<V>>, key: &Q, pred: F)
    where
        K: std::borrow::Borrow<Q> + std::hash::Hash + Eq,
        Q: std::hash::Hash + Eq + ?Sized,
        F: Fn(&V) -> bool,
    {
        let now_empty = match map.get_mut(key) {
            Some(list) => {
                list.retain(|v| !pred(v));
                list.is_empty()
            }
            None => false,
        };
        if now_empty {
            map.remove(key);
        }
    }

    // ==================== Edge Operations ====================

    /// Insert a directed edge. Returns `Ok(false)` when an identical
    /// `(source, target, kind)` edge already exists.
    pub fn insert_edge(
        &mut self,
        source: &QualifiedId,
        target: &QualifiedId,
        kind: EdgeKind,
        description: Option<&str>,
    ) -> Result<bool> {
        self.insert_edge_with_origin(source, target, kind, description, RelationOrigin::Structural)
    }

    /// Like [`insert_edge`](Self::insert_edge), recording where the relationship was declared.
    pub fn insert_edge_with_origin(
        &mut self,
        source: &QualifiedId,
        target: &QualifiedId,
        kind: EdgeKind,
        description: Option<&str>,
        origin: RelationOrigin,
    ) -> Result<bool> {
        let edge = GraphEdge::new(source.clone(), target.clone(), kind)
            .with_description(description)
            .with_origin(origin);
        self.push_edge(edge)
    }

    fn push_edge(&mut self, edge: GraphEdge) -> Result<bool> {
        if !self.nodes.contains_key(&edge.source) {
            return Err(ArchGraphError::UnknownNode(edge.source.to_string()));
        }
        if !self.nodes.contains_key(&edge.target) {
            return Err(ArchGraphError::UnknownNode(edge.target.to_string()));
        }

        let forward = self.outgoing.entry(edge.source.clone()).or_default();
        if forward
            .iter()
            .any(|existing| existing.same_relation(&edge.target, edge.kind))
        {
            return Ok(false);
        }
        forward.push(edge.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .push(edge);
        self.edge_count += 1;
        Ok(true)
    }

    /// Remove the `(source, target, kind)` edge from both directions.
    pub fn remove_edge(&mut self, source: &str, target: &str, kind: EdgeKind) -> bool {
        let removed = match self.outgoing.get_mut(source) {
            Some(list) => match list
                .iter()
                .position(|e| e.target.as_str() == target && e.kind == kind)
            {
                Some(pos) => {
                    list.remove(pos);
                    true
                }
                None => false,
            },
            None => false,
        };
        if !removed {
            return false;
        }

        if self.outgoing.get(source).is_some_and(|l| l.is_empty()) {
            self.outgoing.remove(source);
        }
        if let Some(list) = self.incoming.get_mut(target) {
            if let Some(pos) = list
                .iter()
                .position(|e| e.source.as_str() == source && e.kind == kind)
            {
                list.remove(pos);
            }
            if list.is_empty() {
                self.incoming.remove(target);
            }
        }
        self.edge_count -= 1;
        true
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.outgoing.values().flatten()
    }

    pub fn outgoing_edges(&self, id: &str) -> &[GraphEdge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming_edges(&self, id: &str) -> &[GraphEdge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    // ==================== Dependency Queries ====================

    /// Nodes this node depends on, via the forward index.
    pub fn get_dependencies(&self, id: &str) -> Vec<&GraphNode> {
        self.outgoing_edges(id)
            .iter()
            .filter(|e| e.is_dependency())
            .filter_map(|e| self.nodes.get(&e.target))
            .collect()
    }

    /// Nodes that depend on this node, via the reverse index.
    pub fn get_dependents(&self, id: &str) -> Vec<&GraphNode> {
        self.incoming_edges(id)
            .iter()
            .filter(|e| e.is_dependency())
            .filter_map(|e| self.nodes.get(&e.source))
            .collect()
    }

    pub fn dependency_count(&self, id: &str) -> usize {
        self.outgoing_edges(id)
            .iter()
            .filter(|e| e.is_dependency())
            .count()
    }

    pub fn dependent_count(&self, id: &str) -> usize {
        self.incoming_edges(id)
            .iter()
            .filter(|e| e.is_dependency())
            .count()
    }

    /// Shortest dependency path from `from` to `to`, both ends included.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<QualifiedId>> {
        let start: &str = self.nodes.get(from)?.id.as_str();
        if !self.nodes.contains_key(to) {
            return None;
        }

        let mut queue = VecDeque::new();
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut parent: FxHashMap<&str, &str> = FxHashMap::default();

        queue.push_back(start);
        visited.insert(start);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = vec![current];
                let mut node = current;
                while let Some(&prev) = parent.get(node) {
                    path.push(prev);
                    node = prev;
                }
                path.reverse();
                return Some(
                    path.into_iter()
                        .filter_map(|id| self.nodes.get(id).map(|n| n.id.clone()))
                        .collect(),
                );
            }

            for edge in self.outgoing_edges(current).iter().filter(|e| e.is_dependency()) {
                let next = edge.target.as_str();
                if visited.insert(next) {
                    parent.insert(next, current);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Every node that reaches `id` through dependency edges (impact set).
    pub fn transitive_dependents(&self, id: &str) -> Vec<QualifiedId> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut out = Vec::new();
        queue.push_back(id);
        seen.insert(id);

        while let Some(current) = queue.pop_front() {
            for edge in self.incoming_edges(current).iter().filter(|e| e.is_dependency()) {
                if seen.insert(edge.source.as_str()) {
                    out.push(edge.source.clone());
                    queue.push_back(edge.source.as_str());
                }
            }
        }
        out.sort();
        out
    }

    /// Strongly connected dependency cycles, each sorted, longest first.
    pub fn find_cycles(&self) -> Vec<Vec<QualifiedId>> {
        let ids = self.sorted_ids();

        // Kosaraju pass 1: finish order on the forward graph.
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut order: Vec<&str> = Vec::with_capacity(ids.len());
        for root in &ids {
            if !visited.insert(root.as_str()) {
                continue;
            }
            let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
            while let Some((node, idx)) = stack.pop() {
                let deps: Vec<&str> = self
                    .outgoing_edges(node)
                    .iter()
                    .filter(|e| e.is_dependency())
                    .map(|e| e.target.as_str())
                    .collect();
                if idx < deps.len() {
                    stack.push((node, idx + 1));
                    let next = deps[idx];
                    if visited.insert(next) {
                        stack.push((next, 0));
                    }
                } else {
                    order.push(node);
                }
            }
        }

        // Pass 2: collect components on the reverse graph.
        let mut assigned: FxHashSet<&str> = FxHashSet::default();
        let mut cycles = Vec::new();
        for &root in order.iter().rev() {
            if !assigned.insert(root) {
                continue;
            }
            let mut members = vec![root];
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                for edge in self.incoming_edges(node).iter().filter(|e| e.is_dependency()) {
                    let prev = edge.source.as_str();
                    if assigned.insert(prev) {
                        members.push(prev);
                        stack.push(prev);
                    }
                }
            }

            let self_loop = members.len() == 1
                && self
                    .outgoing_edges(root)
                    .iter()
                    .any(|e| e.is_dependency() && e.target.as_str() == root);
            if members.len() > 1 || self_loop {
                let mut cycle: Vec<QualifiedId> = members
                    .into_iter()
                    .filter_map(|m| self.nodes.get(m).map(|n| n.id.clone()))
                    .collect();
                cycle.sort();
                cycles.push(cycle);
            }
        }
        cycles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        cycles
    }

    // ==================== Hierarchy Queries ====================

    pub fn get_children(&self, id: &str) -> Vec<&GraphNode> {
        self.children
            .get(id)
            .map(|kids| kids.iter().filter_map(|k| self.nodes.get(k)).collect())
            .unwrap_or_default()
    }

    pub fn get_parent(&self, id: &str) -> Option<&GraphNode> {
        self.parents.get(id).and_then(|p| self.nodes.get(p))
    }

    /// All descendants at any depth, breadth-first.
    pub fn get_descendants(&self, id: &str) -> Vec<&GraphNode> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&QualifiedId> = self
            .children
            .get(id)
            .map(|kids| kids.iter().collect())
            .unwrap_or_default();

        while let Some(current) = queue.pop_front() {
            if let Some(node) = self.nodes.get(current) {
                out.push(node);
            }
            if let Some(kids) = self.children.get(current) {
                queue.extend(kids.iter());
            }
        }
        out
    }

    // ==================== Resolution ====================

    /// Resolve an unqualified name to the single node that carries it.
    ///
    /// `ShortIdNotFound` and `AmbiguousShortId` are distinct so callers can
    /// ask for a more qualified name in the second case.
    pub fn resolve_short_id(&self, name: &str) -> Result<&QualifiedId> {
        let bucket = self
            .short_ids
            .get(name)
            .or_else(|| self.short_ids.get(normalize_reference(name).as_str()));
        match bucket.map(Vec::as_slice) {
            None | Some([]) => Err(ArchGraphError::ShortIdNotFound(name.to_string())),
            Some([only]) => Ok(only),
            Some(many) => {
                let mut candidates: Vec<String> = many.iter().map(|id| id.to_string()).collect();
                candidates.sort();
                Err(ArchGraphError::AmbiguousShortId {
                    short_id: name.to_string(),
                    candidates,
                })
            }
        }
    }

    /// Resolve a short, partially qualified (`container/component`) or fully
    /// qualified reference, optionally restricted to one element kind.
    pub fn resolve_reference(&self, reference: &str, kind: Option<ElementKind>) -> Result<QualifiedId> {
        let of_kind = |node: &&GraphNode| kind.map_or(true, |k| node.kind == k);

        let trimmed = reference.trim();
        if let Some(node) = self.nodes.get(trimmed).filter(of_kind) {
            return Ok(node.id.clone());
        }
        let normalized = normalize_reference(trimmed);
        if normalized.is_empty() {
            return Err(ArchGraphError::ShortIdNotFound(reference.to_string()));
        }
        if let Some(node) = self.nodes.get(normalized.as_str()).filter(of_kind) {
            return Ok(node.id.clone());
        }

        let short = normalized
            .rsplit(SEPARATOR)
            .next()
            .unwrap_or(normalized.as_str());
        let mut candidates: Vec<&QualifiedId> = self
            .short_ids
            .get(short)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|id| {
                        id.ends_with_path(&normalized)
                            && self.nodes.get(id.as_str()).is_some_and(|n| of_kind(&n))
                    })
                    .collect()
            })
            .unwrap_or_default();
        candidates.sort();

        match candidates.as_slice() {
            [] => Err(ArchGraphError::ShortIdNotFound(reference.to_string())),
            [only] => Ok((*only).clone()),
            many => Err(ArchGraphError::AmbiguousShortId {
                short_id: reference.to_string(),
                candidates: many.iter().map(|id| id.to_string()).collect(),
            }),
        }
    }

    // ==================== Validation ====================

    /// Check every edge and hierarchy link, collecting all problems.
    pub fn validate(&self) -> Vec<GraphViolation> {
        let mut violations = Vec::new();

        for (source, edges) in &self.outgoing {
            for edge in edges {
                if !self.nodes.contains_key(source) {
                    violations.push(GraphViolation::MissingSource {
                        from: edge.source.clone(),
                        to: edge.target.clone(),
                        kind: edge.kind,
                    });
                }
                if !self.nodes.contains_key(&edge.target) {
                    violations.push(GraphViolation::MissingTarget {
                        from: edge.source.clone(),
                        to: edge.target.clone(),
                        kind: edge.kind,
                    });
                }
                let mirrored = self
                    .incoming_edges(edge.target.as_str())
                    .iter()
                    .any(|e| e.source == edge.source && e.kind == edge.kind);
                if !mirrored {
                    violations.push(GraphViolation::MissingReverseEntry {
                        from: edge.source.clone(),
                        to: edge.target.clone(),
                        kind: edge.kind,
                    });
                }
            }
        }

        for edges in self.incoming.values() {
            for edge in edges {
                let mirrored = self
                    .outgoing_edges(edge.source.as_str())
                    .iter()
                    .any(|e| e.same_relation(&edge.target, edge.kind));
                if !mirrored {
                    violations.push(GraphViolation::MissingForwardEntry {
                        from: edge.source.clone(),
                        to: edge.target.clone(),
                        kind: edge.kind,
                    });
                }
            }
        }

        for node in self.nodes.values() {
            if let Some(parent) = &node.parent {
                if !self.nodes.contains_key(parent) {
                    violations.push(GraphViolation::DanglingParent {
                        node: node.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        violations
    }

    #[cfg(test)]
    pub(crate) fn corrupt_for_test(&mut self, edge: GraphEdge) {
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(edge);
    }
}
