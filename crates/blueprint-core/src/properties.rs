//! # Properties Editor
//!
//! The selection-driven panel: a read model of one node ([`PropertiesView`])
//! and the actions that edit it.
//!
//! Affordance rules live here, not in the mutation engine:
//! - Technology names are trimmed; empty and already-present names are skipped
//! - Connection creation is only offered while candidate targets remain

use crate::graph::Blueprint;
use crate::mutation::MutationEngine;
use crate::{
    BlueprintConnection, BlueprintError, BlueprintNode, ConnectionDraft, ConnectionId,
    ConnectionType, NodeId, NodePatch, PolicyViolation, Position, Size,
};

// =============================================================================
// VIEW
// =============================================================================

/// Direction of a connection relative to the selected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    #[must_use]
    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Outgoing => "→",
            Direction::Incoming => "←",
        }
    }
}

/// One line of the connection list.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRow {
    pub connection: BlueprintConnection,
    pub direction: Direction,
    /// The node at the other end. `None` for a dangling reference.
    pub peer: Option<BlueprintNode>,
}

/// Everything the panel shows for one selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertiesView {
    pub node: BlueprintNode,
    /// Type suggestions not yet on the node, capped to the display limit.
    pub suggestions: Vec<&'static str>,
    pub connections: Vec<ConnectionRow>,
    pub candidate_targets: Vec<BlueprintNode>,
}

impl PropertiesView {
    /// The connection form is hidden, not disabled, when nothing is left to
    /// connect to.
    #[must_use]
    pub fn shows_connection_form(&self) -> bool {
        !self.candidate_targets.is_empty()
    }
}

// =============================================================================
// ACTIONS
// =============================================================================

/// Outcome of a technology add/remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechnologyEdit {
    Applied,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Blank after trimming.
    Empty,
    AlreadyPresent,
    NotPresent,
}

/// Input of the connection creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionForm {
    pub target: NodeId,
    pub connection_type: ConnectionType,
    pub label: Option<String>,
}

impl ConnectionForm {
    #[must_use]
    pub fn new(target: NodeId, connection_type: ConnectionType) -> Self {
        Self {
            target,
            connection_type,
            label: None,
        }
    }

    /// Set the label. Blank labels are dropped.
    #[must_use]
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        let trimmed = label.trim();
        self.label = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }
}

/// Stateless panel logic.
pub struct PropertiesEditor;

impl PropertiesEditor {
    /// Build the panel for `selected`. `None` when nothing (or an unknown
    /// node) is selected.
    #[must_use]
    pub fn view(
        engine: &MutationEngine,
        blueprint: &Blueprint,
        selected: Option<&NodeId>,
    ) -> Option<PropertiesView> {
        let node = blueprint.node(selected?)?;

        let connections = blueprint
            .connections_of(&node.id)
            .into_iter()
            .map(|conn| {
                let (direction, peer_id) = if conn.source_id == node.id {
                    (Direction::Outgoing, &conn.target_id)
                } else {
                    (Direction::Incoming, &conn.source_id)
                };
                ConnectionRow {
                    connection: conn.clone(),
                    direction,
                    peer: blueprint.node(peer_id).cloned(),
                }
            })
            .collect();

        let candidate_targets = blueprint
            .candidate_targets_with(&node.id, engine.policy())
            .into_iter()
            .cloned()
            .collect();

        Some(PropertiesView {
            node: node.clone(),
            suggestions: Self::suggestions(node, engine.config().suggestion_limit),
            connections,
            candidate_targets,
        })
    }

    /// Static type suggestions minus what the node already has.
    #[must_use]
    pub fn suggestions(node: &BlueprintNode, limit: usize) -> Vec<&'static str> {
        node.node_type
            .suggested_technologies()
            .iter()
            .copied()
            .filter(|s| !node.has_technology(s))
            .take(limit)
            .collect()
    }

    // =========================================================================
    // SCALAR FIELDS
    // =========================================================================

    pub fn edit(
        engine: &MutationEngine,
        blueprint: &mut Blueprint,
        node: &NodeId,
        patch: NodePatch,
    ) -> Result<(), BlueprintError> {
        engine.update_node(blueprint, node, patch)
    }

    pub fn set_position(
        engine: &MutationEngine,
        blueprint: &mut Blueprint,
        node: &NodeId,
        position: Position,
    ) -> Result<(), BlueprintError> {
        engine.update_node(blueprint, node, NodePatch::new().position(position))
    }

    pub fn set_size(
        engine: &MutationEngine,
        blueprint: &mut Blueprint,
        node: &NodeId,
        size: Size,
    ) -> Result<(), BlueprintError> {
        engine.update_node(blueprint, node, NodePatch::new().size(size))
    }

    // =========================================================================
    // TECHNOLOGIES
    // =========================================================================

    /// Append a trimmed technology name unless blank or already present.
    ///
    /// Skips do not touch the blueprint.
    pub fn add_technology(
        engine: &MutationEngine,
        blueprint: &mut Blueprint,
        node: &NodeId,
        name: &str,
    ) -> Result<TechnologyEdit, BlueprintError> {
        let current = blueprint
            .node(node)
            .ok_or_else(|| BlueprintError::NodeNotFound(node.clone()))?;

        let name = name.trim();
        if name.is_empty() {
            return Ok(TechnologyEdit::Skipped(SkipReason::Empty));
        }
        if current.has_technology(name) {
            return Ok(TechnologyEdit::Skipped(SkipReason::AlreadyPresent));
        }

        let mut technologies = current.technologies.clone();
        technologies.push(name.to_string());
        engine.update_node(blueprint, node, NodePatch::new().technologies(technologies))?;
        Ok(TechnologyEdit::Applied)
    }

    /// Remove a technology by exact value.
    pub fn remove_technology(
        engine: &MutationEngine,
        blueprint: &mut Blueprint,
        node: &NodeId,
        name: &str,
    ) -> Result<TechnologyEdit, BlueprintError> {
        let current = blueprint
            .node(node)
            .ok_or_else(|| BlueprintError::NodeNotFound(node.clone()))?;

        let Some(index) = current.technologies.iter().position(|t| t == name) else {
            return Ok(TechnologyEdit::Skipped(SkipReason::NotPresent));
        };

        let mut technologies = current.technologies.clone();
        technologies.remove(index);
        engine.update_node(blueprint, node, NodePatch::new().technologies(technologies))?;
        Ok(TechnologyEdit::Applied)
    }

    // =========================================================================
    // CONNECTIONS
    // =========================================================================

    /// Submit the connection form for `source`.
    ///
    /// The target must be one of the current candidate targets. Otherwise the
    /// form is refused with the reason (self-loop, duplicate, reverse) or
    /// `InvalidReference` for an unknown node.
    pub fn create_connection(
        engine: &MutationEngine,
        blueprint: &mut Blueprint,
        source: &NodeId,
        form: ConnectionForm,
    ) -> Result<BlueprintConnection, BlueprintError> {
        for endpoint in [source, &form.target] {
            if !blueprint.contains_node(endpoint) {
                return Err(BlueprintError::InvalidReference {
                    missing: endpoint.clone(),
                });
            }
        }

        let offered = blueprint
            .candidate_targets_with(source, engine.policy())
            .iter()
            .any(|n| n.id == form.target);
        if !offered {
            let reason = blueprint
                .strict_violation(source, &form.target)
                .unwrap_or(PolicyViolation::DuplicateEdge);
            return Err(BlueprintError::ConnectionRejected(reason));
        }

        let mut draft = ConnectionDraft::new(source.clone(), form.target, form.connection_type);
        draft.label = form.label;
        engine.add_connection(blueprint, draft)
    }

    pub fn delete_connection(
        engine: &MutationEngine,
        blueprint: &mut Blueprint,
        id: &ConnectionId,
    ) -> Result<(), BlueprintError> {
        engine.delete_connection(blueprint, id)
    }
}

// =============================================================================
// TESTS
// =============================================================================
