//! # blueprint-core
//!
//! The interactive blueprint editor core - THE LOGIC.
//!
//! A blueprint is a graph of typed, positioned nodes (frontend, backend,
//! database, ...) joined by directed, typed connections. This crate holds
//! the graph, the single mutation path into it, the canvas interaction state
//! machine, the properties panel logic and the export transforms.
//!
//! ## Architectural Constraints
//!
//! - Synchronous and single-threaded: no async, no network, no file I/O
//! - Every write goes through [`MutationEngine`], which bumps the version
//!   exactly once per successful operation
//! - UI state ([`InteractionState`]) is kept apart from the persisted
//!   [`Blueprint`] and passed explicitly
//! - Persistence is the host's job, via [`HostCallbacks`]

// =============================================================================
// MODULES
// =============================================================================

pub mod canvas;
pub mod catalog;
pub mod config;
pub mod export;
pub mod graph;
pub mod host;
pub mod mutation;
pub mod primitives;
pub mod properties;
pub mod session;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    BlueprintConnection, BlueprintError, BlueprintId, BlueprintNode, ConnectionDraft,
    ConnectionId, ConnectionType, NodeDraft, NodeId, NodePatch, NodeType, PolicyViolation,
    Position, Size,
};

// =============================================================================
// RE-EXPORTS: Editor
// =============================================================================

pub use canvas::{
    ActiveDrag, Canvas, CanvasEffect, CanvasEvent, DragGuard, EdgeShape, InteractionState,
    NodeShape, Scene, TitleEdit,
};
pub use config::{ConnectionPolicy, EditorConfig, IdStrategy};
pub use export::{
    BlueprintDocument, export_report, export_structured, import_structured,
    import_structured_bytes,
};
pub use graph::{Blueprint, BlueprintMetrics};
pub use host::{HostCallbacks, NoopHost};
pub use mutation::MutationEngine;
pub use properties::{
    ConnectionForm, ConnectionRow, Direction, PropertiesEditor, PropertiesView, SkipReason,
    TechnologyEdit,
};
pub use session::EditorSession;
