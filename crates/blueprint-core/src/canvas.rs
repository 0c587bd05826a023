//! # Canvas Interaction Engine
//!
//! Turns pointer, palette and keyboard gestures into mutation engine calls
//! and renders the blueprint into a [`Scene`].
//!
//! ## Transient State
//!
//! Selection, the active drag, the pending palette type and the inline title
//! edit live in [`InteractionState`], which is never part of the persisted
//! [`Blueprint`]. It is passed explicitly to every handler and to `render`.
//!
//! ## Drag Lifecycle
//!
//! ```text
//! Idle --PointerDown(node)--> Dragging --PointerMove--> updateNode(position)
//!   ^                             |
//!   +-------PointerUp/Escape------+
//! ```
//!
//! A drag is attached only between pointer-down and release. Moves that arrive
//! with nothing attached are ignored. [`DragGuard`] gives the same lifecycle
//! as a scoped value: dropping it detaches the drag on every exit path.
//!
//! Releasing or cancelling never rolls back positions already committed.

use crate::graph::Blueprint;
use crate::mutation::MutationEngine;
use crate::primitives::{ARROW_HALF_WIDTH, ARROW_LENGTH, MIN_ARROW_SEGMENT};
use crate::{
    BlueprintError, ConnectionId, ConnectionType, NodeDraft, NodeId, NodePatch, NodeType, Position,
    Size,
};

// =============================================================================
// INTERACTION STATE
// =============================================================================

/// A drag in progress: which node, and where the pointer grabbed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub node: NodeId,
    /// Pointer position minus node position at pointer-down.
    pub offset: Position,
}

/// An inline title edit in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleEdit {
    pub node: NodeId,
    pub buffer: String,
}

/// Session-local UI state. Never serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    selected: Option<NodeId>,
    drag: Option<ActiveDrag>,
    palette: Option<NodeType>,
    title_edit: Option<TitleEdit>,
}

impl InteractionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn drag(&self) -> Option<&ActiveDrag> {
        self.drag.as_ref()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Node type currently dragged from the palette, if any.
    #[must_use]
    pub fn palette(&self) -> Option<NodeType> {
        self.palette
    }

    #[must_use]
    pub fn title_edit(&self) -> Option<&TitleEdit> {
        self.title_edit.as_ref()
    }

    #[must_use]
    pub fn is_renaming(&self, node: &NodeId) -> bool {
        self.title_edit.as_ref().is_some_and(|e| &e.node == node)
    }

    pub fn select(&mut self, node: Option<NodeId>) {
        self.selected = node;
    }
}

// =============================================================================
// EVENTS & EFFECTS
// =============================================================================

/// A discrete user gesture delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    PointerDown { node: NodeId, at: Position },
    PointerMove { at: Position },
    PointerUp,
    /// Click on empty canvas.
    BackgroundClick,
    PaletteDragStart(NodeType),
    /// Palette drag ended outside the canvas.
    PaletteDragEnd,
    Drop { at: Position },
    BeginRename(NodeId),
    RenameInput(String),
    /// Enter key or focus loss.
    CommitRename,
    Escape,
    DeleteSelected,
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasEffect {
    /// Nothing changed.
    Ignored,
    /// Only transient state changed.
    Interaction,
    /// The blueprint was mutated.
    Mutated,
    /// A node was created from the palette.
    Created(NodeId),
}

impl CanvasEffect {
    #[must_use]
    pub fn mutated(&self) -> bool {
        matches!(self, CanvasEffect::Mutated | CanvasEffect::Created(_))
    }

    /// Combine with a later effect, keeping the strongest.
    fn then(self, later: CanvasEffect) -> CanvasEffect {
        match (self, later) {
            (_, created @ CanvasEffect::Created(_)) => created,
            (CanvasEffect::Mutated, _) | (_, CanvasEffect::Mutated) => CanvasEffect::Mutated,
            (CanvasEffect::Ignored, other) => other,
            (first, _) => first,
        }
    }
}

// =============================================================================
// CANVAS
// =============================================================================

/// Stateless event handler and renderer.
pub struct Canvas;

impl Canvas {
    /// Apply one event.
    ///
    /// Fails only when the event names a node that does not exist
    /// (`PointerDown`, `BeginRename`) or a mutation fails.
    pub fn handle(
        engine: &MutationEngine,
        blueprint: &mut Blueprint,
        state: &mut InteractionState,
        event: CanvasEvent,
    ) -> Result<CanvasEffect, BlueprintError> {
        match event {
            CanvasEvent::PointerDown { node, at } => {
                if state.is_renaming(&node) {
                    return Ok(CanvasEffect::Ignored);
                }
                Self::require_node(blueprint, &node)?;
                let committed = Self::commit_rename(engine, blueprint, state)?;
                Self::attach_drag(blueprint, state, &node, at)?;
                Ok(committed.then(CanvasEffect::Interaction))
            }

            CanvasEvent::PointerMove { at } => Self::drag_to(engine, blueprint, state, at),

            CanvasEvent::PointerUp => Ok(if Self::detach_drag(state) {
                CanvasEffect::Interaction
            } else {
                CanvasEffect::Ignored
            }),

            CanvasEvent::BackgroundClick => {
                let committed = Self::commit_rename(engine, blueprint, state)?;
                let had_selection = state.selected.take().is_some();
                let effect = if had_selection {
                    CanvasEffect::Interaction
                } else {
                    CanvasEffect::Ignored
                };
                Ok(committed.then(effect))
            }

            CanvasEvent::PaletteDragStart(node_type) => {
                state.palette = Some(node_type);
                Ok(CanvasEffect::Interaction)
            }

            CanvasEvent::PaletteDragEnd => Ok(match state.palette.take() {
                Some(_) => CanvasEffect::Interaction,
                None => CanvasEffect::Ignored,
            }),

            CanvasEvent::Drop { at } => {
                let Some(node_type) = state.palette.take() else {
                    tracing::trace!("drop with no pending palette type ignored");
                    return Ok(CanvasEffect::Ignored);
                };
                let size = engine.config().default_node_size;
                let node = engine.add_node(
                    blueprint,
                    NodeDraft::new(node_type).at(at - size.half()).sized(size),
                );
                Ok(CanvasEffect::Created(node.id))
            }

            CanvasEvent::BeginRename(node) => {
                if state.is_renaming(&node) {
                    return Ok(CanvasEffect::Ignored);
                }
                Self::require_node(blueprint, &node)?;
                let committed = Self::commit_rename(engine, blueprint, state)?;
                let title = blueprint
                    .node(&node)
                    .map(|n| n.title.clone())
                    .ok_or_else(|| BlueprintError::NodeNotFound(node.clone()))?;
                state.title_edit = Some(TitleEdit {
                    node,
                    buffer: title,
                });
                Ok(committed.then(CanvasEffect::Interaction))
            }

            CanvasEvent::RenameInput(text) => Ok(match state.title_edit.as_mut() {
                Some(edit) => {
                    edit.buffer = text;
                    CanvasEffect::Interaction
                }
                None => CanvasEffect::Ignored,
            }),

            CanvasEvent::CommitRename => Self::commit_rename(engine, blueprint, state),

            CanvasEvent::Escape => {
                if state.title_edit.take().is_some() || Self::detach_drag(state) {
                    return Ok(CanvasEffect::Interaction);
                }
                Ok(match state.palette.take() {
                    Some(_) => CanvasEffect::Interaction,
                    None => CanvasEffect::Ignored,
                })
            }

            CanvasEvent::DeleteSelected => {
                let Some(node) = state.selected.clone() else {
                    return Ok(CanvasEffect::Ignored);
                };
                engine.delete_node(blueprint, &node)?;
                Self::forget_node(state, &node);
                Ok(CanvasEffect::Mutated)
            }
        }
    }

    /// Start a scoped drag of `node` grabbed at `at`.
    ///
    /// Returns `None` if the node is being renamed. The drag detaches when the
    /// guard is dropped.
    pub fn begin_drag<'a>(
        engine: &'a MutationEngine,
        blueprint: &'a mut Blueprint,
        state: &'a mut InteractionState,
        node: &NodeId,
        at: Position,
    ) -> Result<Option<DragGuard<'a>>, BlueprintError> {
        if state.is_renaming(node) {
            return Ok(None);
        }
        Self::require_node(blueprint, node)?;
        Self::commit_rename(engine, blueprint, state)?;
        Self::attach_drag(blueprint, state, node, at)?;
        Ok(Some(DragGuard {
            engine,
            blueprint,
            state,
        }))
    }

    /// Drop every piece of transient state that refers to `node`.
    ///
    /// Call after deleting a node through any path other than
    /// `CanvasEvent::DeleteSelected`.
    pub fn forget_node(state: &mut InteractionState, node: &NodeId) {
        if state.selected.as_ref() == Some(node) {
            state.selected = None;
        }
        if state.drag.as_ref().is_some_and(|d| &d.node == node) {
            state.drag = None;
        }
        if state.is_renaming(node) {
            state.title_edit = None;
        }
    }

    // =========================================================================
    // DRAG PRIMITIVES
    // =========================================================================

    /// Fail before touching anything when a gesture names an unknown node.
    fn require_node(blueprint: &Blueprint, node: &NodeId) -> Result<(), BlueprintError> {
        if blueprint.contains_node(node) {
            Ok(())
        } else {
            Err(BlueprintError::NodeNotFound(node.clone()))
        }
    }

    fn attach_drag(
        blueprint: &Blueprint,
        state: &mut InteractionState,
        node: &NodeId,
        at: Position,
    ) -> Result<(), BlueprintError> {
        let target = blueprint
            .node(node)
            .ok_or_else(|| BlueprintError::NodeNotFound(node.clone()))?;
        state.drag = Some(ActiveDrag {
            node: node.clone(),
            offset: at - target.position,
        });
        state.selected = Some(node.clone());
        Ok(())
    }

    /// Returns true if a drag was attached.
    fn detach_drag(state: &mut InteractionState) -> bool {
        state.drag.take().is_some()
    }

    fn drag_to(
        engine: &MutationEngine,
        blueprint: &mut Blueprint,
        state: &mut InteractionState,
        at: Position,
    ) -> Result<CanvasEffect, BlueprintError> {
        let Some(drag) = state.drag.as_ref() else {
            tracing::trace!("pointer move with no active drag ignored");
            return Ok(CanvasEffect::Ignored);
        };

        if !blueprint.contains_node(&drag.node) {
            tracing::trace!(node = %drag.node, "dragged node vanished, detaching");
            Self::detach_drag(state);
            return Ok(CanvasEffect::Ignored);
        }

        let position = at - drag.offset;
        engine.update_node(blueprint, &drag.node, NodePatch::new().position(position))?;
        Ok(CanvasEffect::Mutated)
    }

    // =========================================================================
    // TITLE EDIT
    // =========================================================================

    /// Commit a pending title edit, if any.
    ///
    /// An unchanged buffer, or a node deleted mid-edit, ends the edit without
    /// a mutation.
    fn commit_rename(
        engine: &MutationEngine,
        blueprint: &mut Blueprint,
        state: &mut InteractionState,
    ) -> Result<CanvasEffect, BlueprintError> {
        let Some(edit) = state.title_edit.take() else {
            return Ok(CanvasEffect::Ignored);
        };
        match blueprint.node(&edit.node) {
            None => Ok(CanvasEffect::Interaction),
            Some(node) if node.title == edit.buffer => Ok(CanvasEffect::Interaction),
            Some(_) => {
                engine.update_node(blueprint, &edit.node, NodePatch::new().title(edit.buffer))?;
                Ok(CanvasEffect::Mutated)
            }
        }
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    /// Build the drawable scene for the current blueprint and UI state.
    ///
    /// Connections whose endpoints do not resolve are skipped.
    #[must_use]
    pub fn render(blueprint: &Blueprint, state: &InteractionState) -> Scene {
        let nodes = blueprint
            .nodes()
            .map(|node| {
                let editing = state.is_renaming(&node.id);
                let title = match state.title_edit.as_ref() {
                    Some(edit) if editing => edit.buffer.clone(),
                    _ => node.title.clone(),
                };
                NodeShape {
                    id: node.id.clone(),
                    node_type: node.node_type,
                    title,
                    position: node.position,
                    size: node.size,
                    accent: node.node_type.accent(),
                    icon: node.node_type.icon(),
                    selected: state.selected.as_ref() == Some(&node.id),
                    dragging: state.drag.as_ref().is_some_and(|d| d.node == node.id),
                    editing,
                }
            })
            .collect();

        let edges = blueprint
            .connections()
            .filter_map(|conn| {
                let (Some(source), Some(target)) =
                    (blueprint.node(&conn.source_id), blueprint.node(&conn.target_id))
                else {
                    tracing::trace!(connection = %conn.id, "skipping dangling connection");
                    return None;
                };
                let from = source.center();
                let to = target.center();
                Some(EdgeShape {
                    id: conn.id.clone(),
                    connection_type: conn.connection_type,
                    stroke: conn.connection_type.stroke(),
                    from,
                    to,
                    arrowhead: arrowhead(from, to),
                    label: conn.label.clone(),
                    midpoint: Position::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0),
                })
            })
            .collect();

        Scene { nodes, edges }
    }
}

/// Triangle with its tip at `to`, pointing along `from -> to`.
fn arrowhead(from: Position, to: Position) -> Option<[Position; 3]> {
    let d = to - from;
    let len = d.x.hypot(d.y);
    if len < MIN_ARROW_SEGMENT {
        return None;
    }
    let (ux, uy) = (d.x / len, d.y / len);
    let base = Position::new(to.x - ux * ARROW_LENGTH, to.y - uy * ARROW_LENGTH);
    let (nx, ny) = (-uy * ARROW_HALF_WIDTH, ux * ARROW_HALF_WIDTH);
    Some([
        to,
        Position::new(base.x + nx, base.y + ny),
        Position::new(base.x - nx, base.y - ny),
    ])
}

// =============================================================================
// SCENE
// =============================================================================

/// Everything a host needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub nodes: Vec<NodeShape>,
    pub edges: Vec<EdgeShape>,
}

impl Scene {
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeShape> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    #[must_use]
    pub fn edge(&self, id: &ConnectionId) -> Option<&EdgeShape> {
        self.edges.iter().find(|e| &e.id == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    pub id: NodeId,
    pub node_type: NodeType,
    /// Live edit buffer while renaming, else the stored title.
    pub title: String,
    pub position: Position,
    pub size: Size,
    pub accent: &'static str,
    pub icon: &'static str,
    pub selected: bool,
    pub dragging: bool,
    pub editing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeShape {
    pub id: ConnectionId,
    pub connection_type: ConnectionType,
    pub stroke: &'static str,
    /// Source node center.
    pub from: Position,
    /// Target node center.
    pub to: Position,
    /// `None` when source and target centers coincide.
    pub arrowhead: Option<[Position; 3]>,
    pub label: Option<String>,
    pub midpoint: Position,
}

// =============================================================================
// DRAG GUARD
// =============================================================================

/// A drag that stays attached for as long as the guard lives.
pub struct DragGuard<'a> {
    engine: &'a MutationEngine,
    blueprint: &'a mut Blueprint,
    state: &'a mut InteractionState,
}

impl DragGuard<'_> {
    /// The dragged node.
    #[must_use]
    pub fn node(&self) -> Option<&NodeId> {
        self.state.drag.as_ref().map(|d| &d.node)
    }

    #[must_use]
    pub fn blueprint(&self) -> &Blueprint {
        &*self.blueprint
    }

    /// Move the dragged node so the grab point sits under `at`.
    ///
    /// Commits one `update_node`. Returns false if the drag already detached
    /// (e.g. the node vanished).
    pub fn move_to(&mut self, at: Position) -> Result<bool, BlueprintError> {
        let effect = Canvas::drag_to(self.engine, self.blueprint, self.state, at)?;
        Ok(effect.mutated())
    }

    /// End the drag explicitly. Same as dropping the guard.
    pub fn release(self) {}
}

impl Drop for DragGuard<'_> {
    fn drop(&mut self) {
        Canvas::detach_drag(self.state);
    }
}

// =============================================================================
// TESTS
// =============================================================================
