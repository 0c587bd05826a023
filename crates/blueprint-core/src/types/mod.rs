//! # Core Type Definitions
//!
//! This module contains the value types shared by every part of the editor core:
//! - Identifiers (`BlueprintId`, `NodeId`, `ConnectionId`)
//! - Closed tag enumerations (`NodeType`, `ConnectionType`)
//! - Geometry (`Position`, `Size`)
//! - Graph records (`BlueprintNode`, `BlueprintConnection`)
//! - Mutation inputs (`NodeDraft`, `ConnectionDraft`, `NodePatch`)
//! - Error types (`BlueprintError`, `PolicyViolation`)
//!
//! ## Wire Names
//!
//! The serde attributes on the graph records ARE the structured export format.
//! Field names (`type`, `sourceId`, `targetId`, ...) are load-bearing for
//! interoperability with previously exported documents. Do not rename them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

use crate::primitives::{DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a Blueprint aggregate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlueprintId(pub String);

/// Opaque identifier of a node. Assigned once, never reused within a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Opaque identifier of a connection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Create an identifier from any string-like value.
            #[must_use]
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(BlueprintId);
string_id!(NodeId);
string_id!(ConnectionId);

// =============================================================================
// TAGS
// =============================================================================

/// The closed set of architectural component kinds.
///
/// The type only drives presentation (label, icon, color) and technology
/// suggestions. See the `catalog` module.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Frontend,
    Backend,
    Database,
    Api,
    Service,
    Component,
    Custom,
}

/// Presentation-only tag of a connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    #[default]
    Api,
    Data,
    Dependency,
    Communication,
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// A point in canvas space. Also used for offsets (pointer minus node origin).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Extent of a node box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Offset from a box's origin to its geometric center.
    #[must_use]
    pub fn half(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_WIDTH, DEFAULT_NODE_HEIGHT)
    }
}

// =============================================================================
// GRAPH RECORDS
// =============================================================================

/// A typed, positioned box representing one architectural component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub position: Position,
    pub size: Size,
    /// Ordered, duplicate-free list of technology names.
    #[serde(default)]
    pub technologies: Vec<String>,
    /// Connection ids recorded on the node by older documents.
    ///
    /// Carried verbatim for round-trips. The pipeline never adds to it and
    /// prunes ids of connections it deletes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<ConnectionId>>,
}

impl BlueprintNode {
    /// Geometric center of the node box.
    #[must_use]
    pub fn center(&self) -> Position {
        self.position + self.size.half()
    }

    /// Check whether the node lists the given technology (exact match).
    #[must_use]
    pub fn has_technology(&self, name: &str) -> bool {
        self.technologies.iter().any(|t| t == name)
    }
}

/// A directed, typed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintConnection {
    pub id: ConnectionId,
    pub source_id: NodeId,
    pub target_id: NodeId,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl BlueprintConnection {
    /// Check if the connection touches the node at either end.
    #[must_use]
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source_id == node || &self.target_id == node
    }

    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}

// =============================================================================
// MUTATION INPUTS
// =============================================================================

/// A node without an id, as handed to `MutationEngine::add_node`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    pub node_type: NodeType,
    pub title: String,
    pub description: Option<String>,
    pub position: Position,
    pub size: Size,
    pub technologies: Vec<String>,
}

impl NodeDraft {
    /// A draft at the origin with the type's default title and the default size.
    #[must_use]
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            title: node_type.default_title(),
            description: None,
            position: Position::default(),
            size: Size::default(),
            technologies: Vec::new(),
        }
    }

    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn sized(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn with_technologies<I, S>(mut self, technologies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.technologies = technologies.into_iter().map(Into::into).collect();
        self
    }
}

/// A connection without an id, as handed to `MutationEngine::add_connection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDraft {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub connection_type: ConnectionType,
    pub label: Option<String>,
}

impl ConnectionDraft {
    #[must_use]
    pub fn new(source_id: NodeId, target_id: NodeId, connection_type: ConnectionType) -> Self {
        Self {
            source_id,
            target_id,
            connection_type,
            label: None,
        }
    }

    #[must_use]
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Partial node fields merged by `MutationEngine::update_node`.
///
/// `position` and `size` replace the whole sub-object. `description` uses a
/// nested option: `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePatch {
    pub title: Option<String>,
    pub node_type: Option<NodeType>,
    pub description: Option<Option<String>>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub technologies: Option<Vec<String>>,
}

impl NodePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    #[must_use]
    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn technologies(mut self, technologies: Vec<String>) -> Self {
        self.technologies = Some(technologies);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Why a connection was refused by the strict policy or the properties panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    /// Source and target are the same node.
    SelfLoop,
    /// An edge with the same source and target already exists.
    DuplicateEdge,
    /// An edge in the opposite direction already exists (strict policy only).
    ReverseEdge,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PolicyViolation::SelfLoop => "a node cannot connect to itself",
            PolicyViolation::DuplicateEdge => "an identical connection already exists",
            PolicyViolation::ReverseEdge => "the nodes are already connected in reverse",
        };
        f.write_str(text)
    }
}

/// Errors raised by the editor core.
///
/// - Every failure is synchronous and returned to the immediate caller
/// - A failed mutation leaves the blueprint untouched (including its version)
#[derive(Debug, Error)]
pub enum BlueprintError {
    /// The requested node does not exist.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The requested connection does not exist.
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// A connection endpoint does not resolve to a node of this blueprint.
    #[error("Invalid reference: node {missing} does not exist")]
    InvalidReference { missing: NodeId },

    /// The connection was refused by the active connection policy.
    #[error("Connection rejected: {0}")]
    ConnectionRejected(PolicyViolation),

    /// A selection-driven action was invoked with nothing selected.
    #[error("No node selected")]
    NoSelection,

    /// A structured document is missing fields or has the wrong shape.
    #[error("Malformed blueprint: {0}")]
    MalformedBlueprint(String),

    /// Encoding a blueprint failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A configuration source (file or environment) holds an invalid value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An I/O error occurred (host side only).
    #[error("I/O error: {0}")]
    IoError(String),
}

impl BlueprintError {
    /// True for the not-found family (unknown node or connection id).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BlueprintError::NodeNotFound(_) | BlueprintError::ConnectionNotFound(_)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
