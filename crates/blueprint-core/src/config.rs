//! # Editor Configuration
//!
//! Settings that change how the editor core behaves. The core only defines
//! the shape and the defaults; hosts decide where the values come from
//! (the `blueprint` binary reads a TOML file plus `BLUEPRINT_*` env vars).

use crate::Size;
use crate::primitives::SUGGESTION_DISPLAY_LIMIT;
use serde::{Deserialize, Serialize};

/// Which connections `add_connection` accepts beyond reference validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPolicy {
    /// Only endpoint existence is enforced. Self-loops and parallel edges are
    /// representable; the properties panel still never offers them.
    #[default]
    Permissive,
    /// Self-loops, duplicate edges and reverse edges between an already
    /// connected pair are rejected.
    Strict,
}

impl ConnectionPolicy {
    /// Parse a policy name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "permissive" => Some(Self::Permissive),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// How new node and connection ids are minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Random UUID v4.
    #[default]
    Uuid,
    /// `node-<n>` / `conn-<n>` from a counter scoped to the blueprint.
    Sequential,
}

impl IdStrategy {
    /// Parse a strategy name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "uuid" => Some(Self::Uuid),
            "sequential" => Some(Self::Sequential),
            _ => None,
        }
    }
}

/// Editor core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub connection_policy: ConnectionPolicy,
    pub id_strategy: IdStrategy,
    /// Display cap for technology suggestions.
    pub suggestion_limit: usize,
    /// Size of nodes dropped from the palette.
    pub default_node_size: Size,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            connection_policy: ConnectionPolicy::Permissive,
            id_strategy: IdStrategy::Uuid,
            suggestion_limit: SUGGESTION_DISPLAY_LIMIT,
            default_node_size: Size::default(),
        }
    }
}

impl EditorConfig {
    #[must_use]
    pub fn with_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.connection_policy = policy;
        self
    }

    #[must_use]
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }
}
