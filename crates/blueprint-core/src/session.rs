//! # Editor Session
//!
//! An editing session: the persisted [`Blueprint`] plus the volatile
//! [`InteractionState`], the configured [`MutationEngine`] and the host.
//!
//! - Interaction state is session-local and never serialized
//! - Every selection change is reported through `on_node_select`
//! - `save`, `export` and `generate` hand the current snapshot to the host

use crate::canvas::{Canvas, CanvasEffect, CanvasEvent, InteractionState, Scene};
use crate::config::EditorConfig;
use crate::graph::{Blueprint, BlueprintMetrics};
use crate::host::HostCallbacks;
use crate::mutation::MutationEngine;
use crate::properties::{ConnectionForm, PropertiesEditor, PropertiesView, TechnologyEdit};
use crate::{
    BlueprintConnection, BlueprintError, BlueprintNode, ConnectionId, NodeDraft, NodeId, NodePatch,
};

/// A Blueprint being edited, with its transient UI state and host.
pub struct EditorSession<H: HostCallbacks> {
    blueprint: Blueprint,
    engine: MutationEngine,
    state: InteractionState,
    host: H,
}

impl<H: HostCallbacks> EditorSession<H> {
    /// Start a session on an existing blueprint. Nothing is selected.
    #[must_use]
    pub fn new(blueprint: Blueprint, config: &EditorConfig, host: H) -> Self {
        Self {
            blueprint,
            engine: MutationEngine::new(config),
            state: InteractionState::new(),
            host,
        }
    }

    #[must_use]
    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    #[must_use]
    pub fn engine(&self) -> &MutationEngine {
        &self.engine
    }

    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// End the session, returning the blueprint and the host.
    #[must_use]
    pub fn into_parts(self) -> (Blueprint, H) {
        (self.blueprint, self.host)
    }

    #[must_use]
    pub fn metrics(&self) -> BlueprintMetrics {
        BlueprintMetrics::from_blueprint(&self.blueprint)
    }

    // =========================================================================
    // CANVAS
    // =========================================================================

    /// Deliver one canvas event.
    pub fn handle(&mut self, event: CanvasEvent) -> Result<CanvasEffect, BlueprintError> {
        let before = self.state.selected().cloned();
        let result = Canvas::handle(&self.engine, &mut self.blueprint, &mut self.state, event);
        self.notify_selection(before);
        result
    }

    #[must_use]
    pub fn render(&self) -> Scene {
        Canvas::render(&self.blueprint, &self.state)
    }

    /// Select a node directly (e.g. from a list), or clear with `None`.
    pub fn select(&mut self, node: Option<&NodeId>) -> Result<(), BlueprintError> {
        if let Some(id) = node
            && !self.blueprint.contains_node(id)
        {
            return Err(BlueprintError::NodeNotFound(id.clone()));
        }
        let before = self.state.selected().cloned();
        self.state.select(node.cloned());
        self.notify_selection(before);
        Ok(())
    }

    #[must_use]
    pub fn selected_node(&self) -> Option<&BlueprintNode> {
        self.blueprint.node(self.state.selected()?)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    pub fn add_node(&mut self, draft: NodeDraft) -> BlueprintNode {
        self.engine.add_node(&mut self.blueprint, draft)
    }

    pub fn update_node(&mut self, id: &NodeId, patch: NodePatch) -> Result<(), BlueprintError> {
        self.engine.update_node(&mut self.blueprint, id, patch)
    }

    /// Delete a node and its connections, clearing any transient state that
    /// pointed at it.
    pub fn delete_node(&mut self, id: &NodeId) -> Result<Vec<ConnectionId>, BlueprintError> {
        let removed = self.engine.delete_node(&mut self.blueprint, id)?;
        let before = self.state.selected().cloned();
        Canvas::forget_node(&mut self.state, id);
        self.notify_selection(before);
        Ok(removed)
    }

    pub fn delete_connection(&mut self, id: &ConnectionId) -> Result<(), BlueprintError> {
        PropertiesEditor::delete_connection(&self.engine, &mut self.blueprint, id)
    }

    pub fn rename_blueprint(&mut self, title: impl Into<String>) {
        self.engine.rename_blueprint(&mut self.blueprint, title);
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.engine.set_description(&mut self.blueprint, description);
    }

    // =========================================================================
    // PROPERTIES PANEL (acts on the current selection)
    // =========================================================================

    #[must_use]
    pub fn properties(&self) -> Option<PropertiesView> {
        PropertiesEditor::view(&self.engine, &self.blueprint, self.state.selected())
    }

    pub fn edit_selected(&mut self, patch: NodePatch) -> Result<(), BlueprintError> {
        let id = self.require_selection()?;
        PropertiesEditor::edit(&self.engine, &mut self.blueprint, &id, patch)
    }

    pub fn add_technology(&mut self, name: &str) -> Result<TechnologyEdit, BlueprintError> {
        let id = self.require_selection()?;
        PropertiesEditor::add_technology(&self.engine, &mut self.blueprint, &id, name)
    }

    pub fn remove_technology(&mut self, name: &str) -> Result<TechnologyEdit, BlueprintError> {
        let id = self.require_selection()?;
        PropertiesEditor::remove_technology(&self.engine, &mut self.blueprint, &id, name)
    }

    pub fn connect_selected(
        &mut self,
        form: ConnectionForm,
    ) -> Result<BlueprintConnection, BlueprintError> {
        let id = self.require_selection()?;
        PropertiesEditor::create_connection(&self.engine, &mut self.blueprint, &id, form)
    }

    // =========================================================================
    // HOST ACTIONS
    // =========================================================================

    pub fn save(&mut self) {
        tracing::debug!(version = self.blueprint.version(), "save");
        self.host.on_save(&self.blueprint);
    }

    pub fn export(&mut self) {
        tracing::debug!(version = self.blueprint.version(), "export");
        self.host.on_export(&self.blueprint);
    }

    pub fn generate(&mut self) {
        tracing::debug!(version = self.blueprint.version(), "generate");
        self.host.on_generate(&self.blueprint);
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn require_selection(&self) -> Result<NodeId, BlueprintError> {
        self.state
            .selected()
            .cloned()
            .ok_or(BlueprintError::NoSelection)
    }

    fn notify_selection(&mut self, before: Option<NodeId>) {
        if self.state.selected() == before.as_ref() {
            return;
        }
        let node = self.state.selected().and_then(|id| self.blueprint.node(id));
        self.host.on_node_select(node);
    }
}

// =============================================================================
// TESTS
// =============================================================================
