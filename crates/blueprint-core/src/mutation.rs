//! # Mutation Engine
//!
//! The single write path into a [`Blueprint`].
//!
//! Every operation:
//! - Validates first, then applies (a failure leaves the blueprint untouched)
//! - Bumps `version` by exactly 1 and refreshes `updated_at` on success
//! - Is synchronous and single-threaded
//!
//! ## Connection Policy
//!
//! Under [`ConnectionPolicy::Permissive`] (the default) `add_connection` only
//! checks that both endpoints exist. Self-loops and parallel edges are
//! representable; callers that want to avoid them consult
//! [`Blueprint::candidate_targets`] first, as the properties panel does.
//!
//! Under [`ConnectionPolicy::Strict`] self-loops, duplicate edges and reverse
//! edges between an already connected pair are rejected with
//! [`BlueprintError::ConnectionRejected`].

use crate::config::{ConnectionPolicy, EditorConfig, IdStrategy};
use crate::graph::{Blueprint, dedup_technologies};
use crate::primitives::{CONNECTION_ID_PREFIX, NODE_ID_PREFIX};
use crate::{
    BlueprintConnection, BlueprintError, BlueprintNode, ConnectionDraft, ConnectionId, NodeDraft,
    NodeId, NodePatch,
};

/// Applies creates, updates and deletes to a blueprint.
///
/// Holds only configuration. The same engine can be used on any number of
/// blueprints.
#[derive(Debug, Clone, Default)]
pub struct MutationEngine {
    config: EditorConfig,
}

impl MutationEngine {
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn policy(&self) -> ConnectionPolicy {
        self.config.connection_policy
    }

    // =========================================================================
    // NODES
    // =========================================================================

    /// Insert a node under a freshly minted id. Never fails.
    ///
    /// Repeated technology names in the draft are collapsed to their first
    /// occurrence.
    pub fn add_node(&self, blueprint: &mut Blueprint, draft: NodeDraft) -> BlueprintNode {
        let id = self.mint_node_id(blueprint);
        let mut technologies = draft.technologies;
        dedup_technologies(&mut technologies);

        let node = BlueprintNode {
            id,
            node_type: draft.node_type,
            title: draft.title,
            description: draft.description,
            position: draft.position,
            size: draft.size,
            technologies,
            connections: None,
        };

        blueprint.insert_node(node.clone());
        blueprint.touch();
        tracing::debug!(
            node = %node.id,
            node_type = node.node_type.tag(),
            version = blueprint.version(),
            "add_node"
        );
        node
    }

    /// Merge `patch` into an existing node.
    ///
    /// `position` and `size` replace the whole sub-object.
    pub fn update_node(
        &self,
        blueprint: &mut Blueprint,
        id: &NodeId,
        patch: NodePatch,
    ) -> Result<(), BlueprintError> {
        let node = blueprint
            .node_mut(id)
            .ok_or_else(|| BlueprintError::NodeNotFound(id.clone()))?;

        if let Some(title) = patch.title {
            node.title = title;
        }
        if let Some(node_type) = patch.node_type {
            node.node_type = node_type;
        }
        if let Some(description) = patch.description {
            node.description = description;
        }
        if let Some(position) = patch.position {
            node.position = position;
        }
        if let Some(size) = patch.size {
            node.size = size;
        }
        if let Some(mut technologies) = patch.technologies {
            dedup_technologies(&mut technologies);
            node.technologies = technologies;
        }

        blueprint.touch();
        tracing::debug!(node = %id, version = blueprint.version(), "update_node");
        Ok(())
    }

    /// Remove a node and every connection touching it, as one mutation.
    ///
    /// Returns the ids of the cascaded connections. Clearing a selection that
    /// pointed at the node is the caller's job.
    pub fn delete_node(
        &self,
        blueprint: &mut Blueprint,
        id: &NodeId,
    ) -> Result<Vec<ConnectionId>, BlueprintError> {
        if !blueprint.contains_node(id) {
            return Err(BlueprintError::NodeNotFound(id.clone()));
        }

        let removed = blueprint.remove_connections_of(id);
        blueprint.remove_node(id);
        blueprint.touch();
        tracing::debug!(
            node = %id,
            cascaded = removed.len(),
            version = blueprint.version(),
            "delete_node"
        );
        Ok(removed)
    }

    // =========================================================================
    // CONNECTIONS
    // =========================================================================

    /// Insert a connection under a freshly minted id.
    ///
    /// Fails with `InvalidReference` if either endpoint is unknown, and with
    /// `ConnectionRejected` if the strict policy refuses the edge.
    pub fn add_connection(
        &self,
        blueprint: &mut Blueprint,
        draft: ConnectionDraft,
    ) -> Result<BlueprintConnection, BlueprintError> {
        for endpoint in [&draft.source_id, &draft.target_id] {
            if !blueprint.contains_node(endpoint) {
                return Err(BlueprintError::InvalidReference {
                    missing: endpoint.clone(),
                });
            }
        }

        if self.policy() == ConnectionPolicy::Strict
            && let Some(violation) = blueprint.strict_violation(&draft.source_id, &draft.target_id)
        {
            return Err(BlueprintError::ConnectionRejected(violation));
        }

        let conn = BlueprintConnection {
            id: self.mint_connection_id(blueprint),
            source_id: draft.source_id,
            target_id: draft.target_id,
            connection_type: draft.connection_type,
            label: draft.label,
        };

        blueprint.insert_connection(conn.clone());
        blueprint.touch();
        tracing::debug!(
            connection = %conn.id,
            source = %conn.source_id,
            target = %conn.target_id,
            version = blueprint.version(),
            "add_connection"
        );
        Ok(conn)
    }

    pub fn delete_connection(
        &self,
        blueprint: &mut Blueprint,
        id: &ConnectionId,
    ) -> Result<(), BlueprintError> {
        blueprint
            .remove_connection(id)
            .ok_or_else(|| BlueprintError::ConnectionNotFound(id.clone()))?;
        blueprint.touch();
        tracing::debug!(connection = %id, version = blueprint.version(), "delete_connection");
        Ok(())
    }

    // =========================================================================
    // METADATA
    // =========================================================================

    /// Set the blueprint title.
    pub fn rename_blueprint(&self, blueprint: &mut Blueprint, title: impl Into<String>) {
        blueprint.set_title(title.into());
        blueprint.touch();
        tracing::debug!(version = blueprint.version(), "rename_blueprint");
    }

    /// Set or clear the blueprint description.
    pub fn set_description(&self, blueprint: &mut Blueprint, description: Option<String>) {
        blueprint.set_description(description);
        blueprint.touch();
        tracing::debug!(version = blueprint.version(), "set_description");
    }

    // =========================================================================
    // IDS
    // =========================================================================

    fn mint_node_id(&self, blueprint: &mut Blueprint) -> NodeId {
        loop {
            let id = NodeId::new(self.mint(blueprint, NODE_ID_PREFIX));
            if !blueprint.contains_node(&id) {
                return id;
            }
        }
    }

    fn mint_connection_id(&self, blueprint: &mut Blueprint) -> ConnectionId {
        loop {
            let id = ConnectionId::new(self.mint(blueprint, CONNECTION_ID_PREFIX));
            if !blueprint.contains_connection(&id) {
                return id;
            }
        }
    }

    fn mint(&self, blueprint: &mut Blueprint, prefix: &str) -> String {
        match self.config.id_strategy {
            IdStrategy::Uuid => uuid::Uuid::new_v4().to_string(),
            IdStrategy::Sequential => format!("{}-{}", prefix, blueprint.next_sequence()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::{ConnectionType, NodeType, PolicyViolation, Position, Size};

    fn sequential() -> MutationEngine {
        MutationEngine::new(&EditorConfig::default().with_id_strategy(IdStrategy::Sequential))
    }

    fn strict() -> MutationEngine {
        MutationEngine::new(&EditorConfig::default().with_policy(ConnectionPolicy::Strict))
    }

    fn pair(engine: &MutationEngine, bp: &mut Blueprint) -> (NodeId, NodeId) {
        let a = engine.add_node(bp, NodeDraft::new(NodeType::Frontend).titled("A"));
        let b = engine.add_node(bp, NodeDraft::new(NodeType::Backend).titled("B"));
        (a.id, b.id)
    }

    #[test]
    fn add_node_assigns_id_and_bumps_version() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("t");

        let node = engine.add_node(&mut bp, NodeDraft::new(NodeType::Frontend).titled("UI"));

        assert_eq!(bp.version(), 2);
        assert_eq!(bp.node(&node.id), Some(&node));
        assert!(!node.id.as_str().is_empty());
    }

    #[test]
    fn add_node_collapses_duplicate_technologies() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("t");
        let node = engine.add_node(
            &mut bp,
            NodeDraft::new(NodeType::Frontend).with_technologies(["React", "React", "Vite"]),
        );
        assert_eq!(node.technologies, vec!["React", "Vite"]);
    }

    #[test]
    fn sequential_ids_are_not_reused_after_delete() {
        let engine = sequential();
        let mut bp = Blueprint::new("t");

        let first = engine.add_node(&mut bp, NodeDraft::new(NodeType::Api));
        assert_eq!(first.id.as_str(), "node-1");
        engine.delete_node(&mut bp, &first.id).expect("delete");

        let second = engine.add_node(&mut bp, NodeDraft::new(NodeType::Api));
        assert_eq!(second.id.as_str(), "node-2");
    }

    #[test]
    fn sequential_ids_skip_existing() {
        let engine = sequential();
        let mut bp = Blueprint::seeded(
            "t",
            None,
            vec![BlueprintNode {
                id: NodeId::new("node-1"),
                node_type: NodeType::Custom,
                title: "taken".into(),
                description: None,
                position: Position::default(),
                size: Size::default(),
                technologies: Vec::new(),
                connections: None,
            }],
            Vec::new(),
        )
        .expect("seeded");

        let node = engine.add_node(&mut bp, NodeDraft::new(NodeType::Custom));
        assert_eq!(node.id.as_str(), "node-2");
    }

    #[test]
    fn update_node_replaces_position_and_size() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("t");
        let node = engine.add_node(&mut bp, NodeDraft::new(NodeType::Service));

        engine
            .update_node(
                &mut bp,
                &node.id,
                NodePatch::new()
                    .position(Position::new(5.0, 6.0))
                    .size(Size::new(200.0, 80.0))
                    .description(Some("queue worker".into())),
            )
            .expect("update");

        let stored = bp.node(&node.id).expect("node");
        assert_eq!(stored.position, Position::new(5.0, 6.0));
        assert_eq!(stored.size, Size::new(200.0, 80.0));
        assert_eq!(stored.description.as_deref(), Some("queue worker"));
        assert_eq!(stored.title, "New Service");
        assert_eq!(bp.version(), 3);
    }

    #[test]
    fn update_unknown_node_fails_without_bump() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("t");
        let result = engine.update_node(&mut bp, &NodeId::new("ghost"), NodePatch::new().title("x"));
        assert!(matches!(result, Err(BlueprintError::NodeNotFound(_))));
        assert_eq!(bp.version(), 1);
    }

    #[test]
    fn delete_node_cascades_in_one_version_step() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("t");
        let (a, b) = pair(&engine, &mut bp);
        engine
            .add_connection(&mut bp, ConnectionDraft::new(a.clone(), b.clone(), ConnectionType::Api))
            .expect("connect");
        engine
            .add_connection(&mut bp, ConnectionDraft::new(b.clone(), a.clone(), ConnectionType::Data))
            .expect("connect");
        let before = bp.version();

        let removed = engine.delete_node(&mut bp, &a).expect("delete");

        assert_eq!(removed.len(), 2);
        assert_eq!(bp.connection_count(), 0);
        assert_eq!(bp.version(), before + 1);
    }

    #[test]
    fn add_connection_rejects_unknown_endpoint() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("t");
        let (a, _) = pair(&engine, &mut bp);
        let before = bp.version();

        let result = engine.add_connection(
            &mut bp,
            ConnectionDraft::new(a, NodeId::new("ghost"), ConnectionType::Api),
        );

        match result {
            Err(BlueprintError::InvalidReference { missing }) => {
                assert_eq!(missing, NodeId::new("ghost"));
            }
            other => panic!("expected InvalidReference, got {other:?}"),
        }
        assert_eq!(bp.version(), before);
        assert_eq!(bp.connection_count(), 0);
    }

    #[test]
    fn permissive_allows_self_loop_and_duplicates() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("t");
        let (a, b) = pair(&engine, &mut bp);

        engine
            .add_connection(&mut bp, ConnectionDraft::new(a.clone(), a.clone(), ConnectionType::Api))
            .expect("self-loop");
        engine
            .add_connection(&mut bp, ConnectionDraft::new(a.clone(), b.clone(), ConnectionType::Api))
            .expect("first");
        engine
            .add_connection(&mut bp, ConnectionDraft::new(a, b, ConnectionType::Api))
            .expect("duplicate");
        assert_eq!(bp.connection_count(), 3);
    }

    #[test]
    fn strict_rejects_with_reason() {
        let engine = strict();
        let mut bp = Blueprint::new("t");
        let (a, b) = pair(&engine, &mut bp);
        engine
            .add_connection(&mut bp, ConnectionDraft::new(a.clone(), b.clone(), ConnectionType::Api))
            .expect("first");
        let before = bp.version();

        let cases = [
            (a.clone(), a.clone(), PolicyViolation::SelfLoop),
            (a.clone(), b.clone(), PolicyViolation::DuplicateEdge),
            (b, a, PolicyViolation::ReverseEdge),
        ];
        for (source, target, reason) in cases {
            let result =
                engine.add_connection(&mut bp, ConnectionDraft::new(source, target, ConnectionType::Data));
            match result {
                Err(BlueprintError::ConnectionRejected(v)) => assert_eq!(v, reason),
                other => panic!("expected rejection, got {other:?}"),
            }
        }
        assert_eq!(bp.version(), before);
    }

    #[test]
    fn delete_connection_not_found() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("t");
        let result = engine.delete_connection(&mut bp, &ConnectionId::new("nope"));
        assert!(matches!(result, Err(BlueprintError::ConnectionNotFound(_))));
        assert_eq!(bp.version(), 1);
    }

    #[test]
    fn metadata_edits_bump_version() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("old");
        engine.rename_blueprint(&mut bp, "new");
        engine.set_description(&mut bp, Some("desc".into()));
        assert_eq!(bp.title(), "new");
        assert_eq!(bp.description(), Some("desc"));
        assert_eq!(bp.version(), 3);

        engine.set_description(&mut bp, None);
        assert_eq!(bp.description(), None);
        assert_eq!(bp.version(), 4);
    }
}
