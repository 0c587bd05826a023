//! # Host Callbacks
//!
//! The outbound contract: the editor hands snapshots to the host and tells it
//! about selection changes. Nothing here waits on the host.

use crate::graph::Blueprint;
use crate::BlueprintNode;

/// Collaborators supplied by the host application.
///
/// Every method defaults to a no-op, so hosts implement only what they use.
pub trait HostCallbacks {
    /// Explicit save action. The host decides how to persist.
    fn on_save(&mut self, _blueprint: &Blueprint) {}

    /// Explicit export action. Typically renders the report.
    fn on_export(&mut self, _blueprint: &Blueprint) {}

    /// Hand the graph to a code generation collaborator.
    fn on_generate(&mut self, _blueprint: &Blueprint) {}

    /// Fired whenever the selected node changes.
    fn on_node_select(&mut self, _node: Option<&BlueprintNode>) {}
}

/// A host that ignores every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl HostCallbacks for NoopHost {}
