//! # Graph Model
//!
//! The Blueprint aggregate root and its structural queries.
//!
//! Nodes and connections are stored in `BTreeMap`s keyed by an insertion
//! slot, with a reverse index from id to slot. Iteration is therefore always
//! in creation order and lookups stay logarithmic. No `HashMap` here.
//!
//! The public surface is read-only. Writes go through
//! [`MutationEngine`](crate::MutationEngine), which uses the crate-private
//! primitives at the bottom of this file.

use crate::config::ConnectionPolicy;
use crate::primitives::{
    CONNECTION_ID_PREFIX, INITIAL_VERSION, MAX_IMPORT_CONNECTION_COUNT, MAX_IMPORT_NODE_COUNT,
    NODE_ID_PREFIX,
};
use crate::{
    BlueprintConnection, BlueprintError, BlueprintId, BlueprintNode, ConnectionId, ConnectionType,
    NodeId, NodeType, PolicyViolation,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// BLUEPRINT
// =============================================================================

/// The aggregate root: nodes, connections and metadata of one diagram.
#[derive(Debug, Clone)]
pub struct Blueprint {
    id: BlueprintId,
    title: String,
    description: Option<String>,

    /// Node storage: slot -> node (slot order == insertion order)
    nodes: BTreeMap<u64, BlueprintNode>,
    /// Reverse lookup: NodeId -> slot
    node_index: BTreeMap<NodeId, u64>,

    /// Connection storage: slot -> connection
    connections: BTreeMap<u64, BlueprintConnection>,
    /// Reverse lookup: ConnectionId -> slot
    connection_index: BTreeMap<ConnectionId, u64>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,

    /// Next insertion slot (shared by nodes and connections)
    next_slot: u64,
    /// Counter for sequential ids. Only ever increases, and survives
    /// export/import as the document's `idSequence`.
    next_sequence: u64,
}

/// Structural equality: same metadata, same nodes and connections in the same
/// order. Internal slots and counters are not compared.
impl PartialEq for Blueprint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.description == other.description
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
            && self.version == other.version
            && self.nodes().eq(other.nodes())
            && self.connections().eq(other.connections())
    }
}

/// Everything needed to assemble a blueprint from outside data.
pub(crate) struct BlueprintParts {
    pub id: BlueprintId,
    pub title: String,
    pub description: Option<String>,
    pub nodes: Vec<BlueprintNode>,
    pub connections: Vec<BlueprintConnection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    /// Persisted high-water mark of the sequential id counter (0 if unknown).
    pub id_sequence: u64,
}

impl Blueprint {
    /// Create an empty blueprint with a random id.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(BlueprintId::new(uuid::Uuid::new_v4().to_string()), title)
    }

    /// Create an empty blueprint with the given id.
    #[must_use]
    pub fn with_id(id: BlueprintId, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            description: None,
            nodes: BTreeMap::new(),
            node_index: BTreeMap::new(),
            connections: BTreeMap::new(),
            connection_index: BTreeMap::new(),
            created_at: now,
            updated_at: now,
            version: INITIAL_VERSION,
            next_slot: 0,
            next_sequence: 0,
        }
    }

    /// Create a version-1 blueprint from a node/connection set supplied by a
    /// generation collaborator.
    ///
    /// Validated like a structured import: duplicate ids or dangling
    /// endpoints fail with `MalformedBlueprint` and nothing is built.
    pub fn seeded(
        title: impl Into<String>,
        description: Option<String>,
        nodes: Vec<BlueprintNode>,
        connections: Vec<BlueprintConnection>,
    ) -> Result<Self, BlueprintError> {
        let now = Utc::now();
        Self::from_parts(BlueprintParts {
            id: BlueprintId::new(uuid::Uuid::new_v4().to_string()),
            title: title.into(),
            description,
            nodes,
            connections,
            created_at: now,
            updated_at: now,
            version: INITIAL_VERSION,
            id_sequence: 0,
        })
    }

    /// Assemble a blueprint, rejecting anything that violates a structural
    /// invariant. Never returns a partially populated aggregate.
    pub(crate) fn from_parts(parts: BlueprintParts) -> Result<Self, BlueprintError> {
        if parts.version < INITIAL_VERSION {
            return Err(BlueprintError::MalformedBlueprint(format!(
                "version must be at least {}, got {}",
                INITIAL_VERSION, parts.version
            )));
        }
        if parts.updated_at < parts.created_at {
            return Err(BlueprintError::MalformedBlueprint(
                "updatedAt precedes createdAt".to_string(),
            ));
        }
        if parts.nodes.len() > MAX_IMPORT_NODE_COUNT {
            return Err(BlueprintError::MalformedBlueprint(format!(
                "Node count {} exceeds maximum allowed {}",
                parts.nodes.len(),
                MAX_IMPORT_NODE_COUNT
            )));
        }
        if parts.connections.len() > MAX_IMPORT_CONNECTION_COUNT {
            return Err(BlueprintError::MalformedBlueprint(format!(
                "Connection count {} exceeds maximum allowed {}",
                parts.connections.len(),
                MAX_IMPORT_CONNECTION_COUNT
            )));
        }

        let mut blueprint = Self::with_id(parts.id, parts.title);
        blueprint.description = parts.description;
        blueprint.created_at = parts.created_at;
        blueprint.updated_at = parts.updated_at;
        blueprint.version = parts.version;
        let mut sequence = parts.id_sequence;

        for mut node in parts.nodes {
            if node.id.as_str().is_empty() {
                return Err(BlueprintError::MalformedBlueprint(
                    "node with empty id".to_string(),
                ));
            }
            if blueprint.contains_node(&node.id) {
                return Err(BlueprintError::MalformedBlueprint(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
            let before = node.technologies.len();
            dedup_technologies(&mut node.technologies);
            if node.technologies.len() != before {
                tracing::warn!(
                    "Dropped {} duplicate technologies on node {}",
                    before - node.technologies.len(),
                    node.id
                );
            }
            if let Some(n) = sequence_suffix(node.id.as_str(), NODE_ID_PREFIX) {
                sequence = sequence.max(n);
            }
            blueprint.insert_node(node);
        }

        for conn in parts.connections {
            if conn.id.as_str().is_empty() {
                return Err(BlueprintError::MalformedBlueprint(
                    "connection with empty id".to_string(),
                ));
            }
            if blueprint.contains_connection(&conn.id) {
                return Err(BlueprintError::MalformedBlueprint(format!(
                    "duplicate connection id {}",
                    conn.id
                )));
            }
            for endpoint in [&conn.source_id, &conn.target_id] {
                if !blueprint.contains_node(endpoint) {
                    return Err(BlueprintError::MalformedBlueprint(format!(
                        "connection {} references unknown node {}",
                        conn.id, endpoint
                    )));
                }
            }
            if let Some(n) = sequence_suffix(conn.id.as_str(), CONNECTION_ID_PREFIX) {
                sequence = sequence.max(n);
            }
            blueprint.insert_connection(conn);
        }

        // Never hand out a sequential id at or below one already seen.
        blueprint.next_sequence = sequence;
        Ok(blueprint)
    }

    // =========================================================================
    // METADATA
    // =========================================================================

    #[must_use]
    pub fn id(&self) -> &BlueprintId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Change counter. Starts at 1, +1 per successful mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    // =========================================================================
    // NODE QUERIES
    // =========================================================================

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &BlueprintNode> {
        self.nodes.values()
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&BlueprintNode> {
        let slot = self.node_index.get(id)?;
        self.nodes.get(slot)
    }

    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_index.contains_key(id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // =========================================================================
    // CONNECTION QUERIES
    // =========================================================================

    /// All connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = &BlueprintConnection> {
        self.connections.values()
    }

    #[must_use]
    pub fn connection(&self, id: &ConnectionId) -> Option<&BlueprintConnection> {
        let slot = self.connection_index.get(id)?;
        self.connections.get(slot)
    }

    #[must_use]
    pub fn contains_connection(&self, id: &ConnectionId) -> bool {
        self.connection_index.contains_key(id)
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connections whose source or target is `node`, in insertion order.
    #[must_use]
    pub fn connections_of(&self, node: &NodeId) -> Vec<&BlueprintConnection> {
        self.connections().filter(|c| c.touches(node)).collect()
    }

    /// Check if a `from -> to` edge exists.
    #[must_use]
    pub fn has_edge(&self, from: &NodeId, to: &NodeId) -> bool {
        self.connections()
            .any(|c| &c.source_id == from && &c.target_id == to)
    }

    /// Nodes `node` may still get a new outgoing connection to.
    ///
    /// Excludes `node` itself and every node already targeted by a
    /// `node -> x` edge. Reverse edges stay available.
    /// Returns an empty list for an unknown node.
    #[must_use]
    pub fn candidate_targets(&self, node: &NodeId) -> Vec<&BlueprintNode> {
        self.candidate_targets_with(node, ConnectionPolicy::Permissive)
    }

    /// Candidate targets under the given policy.
    ///
    /// `Strict` additionally excludes nodes that already have an edge into
    /// `node`.
    #[must_use]
    pub fn candidate_targets_with(
        &self,
        node: &NodeId,
        policy: ConnectionPolicy,
    ) -> Vec<&BlueprintNode> {
        if !self.contains_node(node) {
            return Vec::new();
        }

        let mut taken: BTreeSet<&NodeId> = BTreeSet::new();
        for conn in self.connections() {
            if &conn.source_id == node {
                taken.insert(&conn.target_id);
            }
            if policy == ConnectionPolicy::Strict && &conn.target_id == node {
                taken.insert(&conn.source_id);
            }
        }

        self.nodes()
            .filter(|n| &n.id != node && !taken.contains(&n.id))
            .collect()
    }

    /// Why the strict policy would refuse a `source -> target` edge, if it would.
    #[must_use]
    pub fn strict_violation(&self, source: &NodeId, target: &NodeId) -> Option<PolicyViolation> {
        if source == target {
            return Some(PolicyViolation::SelfLoop);
        }
        if self.has_edge(source, target) {
            return Some(PolicyViolation::DuplicateEdge);
        }
        if self.has_edge(target, source) {
            return Some(PolicyViolation::ReverseEdge);
        }
        None
    }

    // =========================================================================
    // WRITE PRIMITIVES (crate-private, used by MutationEngine)
    // =========================================================================

    pub(crate) fn insert_node(&mut self, node: BlueprintNode) {
        let slot = self.take_slot();
        self.node_index.insert(node.id.clone(), slot);
        self.nodes.insert(slot, node);
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut BlueprintNode> {
        let slot = self.node_index.get(id)?;
        self.nodes.get_mut(slot)
    }

    pub(crate) fn remove_node(&mut self, id: &NodeId) -> Option<BlueprintNode> {
        let slot = self.node_index.remove(id)?;
        self.nodes.remove(&slot)
    }

    pub(crate) fn insert_connection(&mut self, conn: BlueprintConnection) {
        let slot = self.take_slot();
        self.connection_index.insert(conn.id.clone(), slot);
        self.connections.insert(slot, conn);
    }

    pub(crate) fn remove_connection(&mut self, id: &ConnectionId) -> Option<BlueprintConnection> {
        let slot = self.connection_index.remove(id)?;
        let removed = self.connections.remove(&slot)?;
        self.forget_connection_refs(std::slice::from_ref(&removed.id));
        Some(removed)
    }

    /// Remove every connection touching `node`. Returns the removed ids.
    pub(crate) fn remove_connections_of(&mut self, node: &NodeId) -> Vec<ConnectionId> {
        let doomed: Vec<u64> = self
            .connections
            .iter()
            .filter(|(_, c)| c.touches(node))
            .map(|(slot, _)| *slot)
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for slot in doomed {
            if let Some(conn) = self.connections.remove(&slot) {
                self.connection_index.remove(&conn.id);
                removed.push(conn.id);
            }
        }
        self.forget_connection_refs(&removed);
        removed
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.title = title;
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Record one successful mutation.
    pub(crate) fn touch(&mut self) {
        self.version = self.version.saturating_add(1);
        let now = Utc::now();
        // Keep updated_at monotonic even if the wall clock steps back.
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Last value handed out by the sequential id counter.
    pub(crate) fn id_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Next value of the blueprint-scoped id counter.
    pub(crate) fn next_sequence(&mut self) -> u64 {
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.next_sequence
    }

    fn take_slot(&mut self) -> u64 {
        let slot = self.next_slot;
        self.next_slot = self.next_slot.saturating_add(1);
        slot
    }

    /// Drop legacy per-node references to connections that no longer exist.
    fn forget_connection_refs(&mut self, ids: &[ConnectionId]) {
        if ids.is_empty() {
            return;
        }
        for node in self.nodes.values_mut() {
            if let Some(refs) = node.connections.as_mut() {
                refs.retain(|r| !ids.contains(r));
            }
        }
    }
}

/// Numeric suffix of a `<prefix>-<n>` id.
fn sequence_suffix(id: &str, prefix: &str) -> Option<u64> {
    id.strip_prefix(prefix)?.strip_prefix('-')?.parse().ok()
}

/// Remove repeated technology names, keeping the first occurrence.
pub(crate) fn dedup_technologies(technologies: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    technologies.retain(|t| seen.insert(t.clone()));
}

// =============================================================================
// METRICS
// =============================================================================

/// Summary counts for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlueprintMetrics {
    pub node_count: usize,
    pub connection_count: usize,
    pub nodes_by_type: BTreeMap<NodeType, usize>,
    pub connections_by_type: BTreeMap<ConnectionType, usize>,
    /// Nodes with no connection in either direction.
    pub isolated_nodes: usize,
    pub version: u64,
}

impl BlueprintMetrics {
    #[must_use]
    pub fn from_blueprint(blueprint: &Blueprint) -> Self {
        let mut nodes_by_type = BTreeMap::new();
        for node in blueprint.nodes() {
            *nodes_by_type.entry(node.node_type).or_insert(0) += 1;
        }

        let mut connections_by_type = BTreeMap::new();
        let mut connected: BTreeSet<&NodeId> = BTreeSet::new();
        for conn in blueprint.connections() {
            *connections_by_type.entry(conn.connection_type).or_insert(0) += 1;
            connected.insert(&conn.source_id);
            connected.insert(&conn.target_id);
        }

        let isolated_nodes = blueprint
            .nodes()
            .filter(|n| !connected.contains(&n.id))
            .count();

        Self {
            node_count: blueprint.node_count(),
            connection_count: blueprint.connection_count(),
            nodes_by_type,
            connections_by_type,
            isolated_nodes,
            version: blueprint.version(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, Size};

    fn node(id: &str, node_type: NodeType) -> BlueprintNode {
        BlueprintNode {
            id: NodeId::new(id),
            node_type,
            title: id.to_uppercase(),
            description: None,
            position: Position::default(),
            size: Size::default(),
            technologies: Vec::new(),
            connections: None,
        }
    }

    fn conn(id: &str, from: &str, to: &str) -> BlueprintConnection {
        BlueprintConnection {
            id: ConnectionId::new(id),
            source_id: NodeId::new(from),
            target_id: NodeId::new(to),
            connection_type: ConnectionType::Api,
            label: None,
        }
    }

    fn abc() -> Blueprint {
        Blueprint::seeded(
            "abc",
            None,
            vec![
                node("a", NodeType::Frontend),
                node("b", NodeType::Backend),
                node("c", NodeType::Database),
            ],
            vec![conn("c1", "a", "b"), conn("c2", "b", "c")],
        )
        .expect("seeded")
    }

    #[test]
    fn new_blueprint_starts_at_version_one() {
        let bp = Blueprint::new("Empty");
        assert_eq!(bp.version(), 1);
        assert_eq!(bp.node_count(), 0);
        assert_eq!(bp.connection_count(), 0);
        assert_eq!(bp.created_at(), bp.updated_at());
    }

    #[test]
    fn nodes_iterate_in_insertion_order() {
        let bp = Blueprint::seeded(
            "order",
            None,
            vec![
                node("z", NodeType::Custom),
                node("a", NodeType::Custom),
                node("m", NodeType::Custom),
            ],
            Vec::new(),
        )
        .expect("seeded");

        let ids: Vec<_> = bp.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn connections_of_returns_both_directions() {
        let bp = abc();
        let ids: Vec<_> = bp
            .connections_of(&NodeId::new("b"))
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert!(bp.connections_of(&NodeId::new("zzz")).is_empty());
    }

    #[test]
    fn candidate_targets_excludes_self_and_existing_targets() {
        let bp = abc();
        let ids: Vec<_> = bp
            .candidate_targets(&NodeId::new("a"))
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn candidate_targets_keeps_reverse_edge_when_permissive() {
        let bp = abc();
        let ids: Vec<_> = bp
            .candidate_targets(&NodeId::new("b"))
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn candidate_targets_strict_drops_reverse_edge() {
        let bp = abc();
        let strict = bp.candidate_targets_with(&NodeId::new("b"), ConnectionPolicy::Strict);
        assert!(strict.is_empty());
    }

    #[test]
    fn strict_violation_reasons() {
        let bp = abc();
        let a = NodeId::new("a");
        let b = NodeId::new("b");
        let c = NodeId::new("c");
        assert_eq!(bp.strict_violation(&a, &a), Some(PolicyViolation::SelfLoop));
        assert_eq!(bp.strict_violation(&a, &b), Some(PolicyViolation::DuplicateEdge));
        assert_eq!(bp.strict_violation(&b, &a), Some(PolicyViolation::ReverseEdge));
        assert_eq!(bp.strict_violation(&a, &c), None);
    }

    #[test]
    fn seeded_rejects_dangling_connection() {
        let result = Blueprint::seeded(
            "bad",
            None,
            vec![node("a", NodeType::Api)],
            vec![conn("c1", "a", "ghost")],
        );
        assert!(matches!(result, Err(BlueprintError::MalformedBlueprint(_))));
    }

    #[test]
    fn seeded_rejects_duplicate_node_ids() {
        let result = Blueprint::seeded(
            "bad",
            None,
            vec![node("a", NodeType::Api), node("a", NodeType::Service)],
            Vec::new(),
        );
        assert!(matches!(result, Err(BlueprintError::MalformedBlueprint(_))));
    }

    #[test]
    fn seeded_dedups_technologies() {
        let mut n = node("a", NodeType::Frontend);
        n.technologies = vec!["React".into(), "Vite".into(), "React".into()];
        let bp = Blueprint::seeded("t", None, vec![n], Vec::new()).expect("seeded");
        let stored = bp.node(&NodeId::new("a")).expect("node");
        assert_eq!(stored.technologies, vec!["React", "Vite"]);
    }

    #[test]
    fn remove_connections_of_prunes_legacy_refs() {
        let mut a = node("a", NodeType::Frontend);
        a.connections = Some(vec![ConnectionId::new("c1")]);
        let mut bp = Blueprint::seeded(
            "refs",
            None,
            vec![a, node("b", NodeType::Backend)],
            vec![conn("c1", "a", "b")],
        )
        .expect("seeded");

        let removed = bp.remove_connections_of(&NodeId::new("b"));
        assert_eq!(removed, vec![ConnectionId::new("c1")]);
        let refs = bp
            .node(&NodeId::new("a"))
            .and_then(|n| n.connections.clone())
            .expect("refs");
        assert!(refs.is_empty());
    }

    #[test]
    fn sequence_resumes_after_highest_sequential_id() {
        let bp = Blueprint::seeded(
            "seq",
            None,
            vec![
                node("node-3", NodeType::Api),
                node("node-x", NodeType::Api),
                node("node-1", NodeType::Api),
            ],
            vec![conn("conn-7", "node-3", "node-1"), conn("c", "node-1", "node-3")],
        )
        .expect("seeded");
        assert_eq!(bp.id_sequence(), 7);
        assert_eq!(sequence_suffix("node-12", NODE_ID_PREFIX), Some(12));
        assert_eq!(sequence_suffix("nodes-12", NODE_ID_PREFIX), None);
        assert_eq!(sequence_suffix("node-", NODE_ID_PREFIX), None);
    }

    #[test]
    fn touch_bumps_version_by_one() {
        let mut bp = Blueprint::new("v");
        bp.touch();
        bp.touch();
        assert_eq!(bp.version(), 3);
        assert!(bp.updated_at() >= bp.created_at());
    }

    #[test]
    fn equality_ignores_internal_slots() {
        let bp = abc();
        let mut copy = bp.clone();
        // Shift the slot counter without changing content.
        let _ = copy.take_slot();
        assert_eq!(bp, copy);
    }

    #[test]
    fn metrics_count_by_type_and_isolation() {
        let mut bp = abc();
        bp.insert_node(node("d", NodeType::Frontend));

        let metrics = BlueprintMetrics::from_blueprint(&bp);
        assert_eq!(metrics.node_count, 4);
        assert_eq!(metrics.connection_count, 2);
        assert_eq!(metrics.nodes_by_type.get(&NodeType::Frontend), Some(&2));
        assert_eq!(metrics.connections_by_type.get(&ConnectionType::Api), Some(&2));
        assert_eq!(metrics.isolated_nodes, 1);
    }
}
