//! # Editor Primitives
//!
//! Compiled-in constants for the editor core.
//!
//! Values that hosts may reasonably want to change (default node size,
//! suggestion cap) are only the defaults of `EditorConfig`.

/// Version assigned to a freshly created blueprint.
///
/// Every successful mutation adds exactly 1.
pub const INITIAL_VERSION: u64 = 1;

/// Default node width on creation.
pub const DEFAULT_NODE_WIDTH: f64 = 150.0;

/// Default node height on creation.
pub const DEFAULT_NODE_HEIGHT: f64 = 100.0;

/// How many technology suggestions the properties panel shows at once.
///
/// Display cap only: the node's technology list itself is unbounded.
pub const SUGGESTION_DISPLAY_LIMIT: usize = 6;

/// Prefix of sequential node ids (`node-1`, `node-2`, ...).
pub const NODE_ID_PREFIX: &str = "node";

/// Prefix of sequential connection ids (`conn-1`, `conn-2`, ...).
pub const CONNECTION_ID_PREFIX: &str = "conn";

// =============================================================================
// RENDERING
// =============================================================================

/// Length of the arrowhead drawn at the target end of a connection.
pub const ARROW_LENGTH: f64 = 10.0;

/// Half of the arrowhead's base width.
pub const ARROW_HALF_WIDTH: f64 = 5.0;

/// Segments shorter than this get no arrowhead (no direction to point along).
pub const MIN_ARROW_SEGMENT: f64 = 1e-6;

// =============================================================================
// IMPORT LIMITS
// =============================================================================

/// Maximum number of nodes accepted from a structured document.
///
/// Larger documents are rejected as malformed rather than loaded.
pub const MAX_IMPORT_NODE_COUNT: usize = 100_000;

/// Maximum number of connections accepted from a structured document.
pub const MAX_IMPORT_CONNECTION_COUNT: usize = 1_000_000;
