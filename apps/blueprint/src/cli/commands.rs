//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Mutating commands open an [`EditorSession`] on the blueprint file with a
//! [`FileHost`], apply one operation through the session and call `save()`.

use crate::host::{FileHost, write_document};
use blueprint_core::{
    Blueprint, BlueprintError, BlueprintMetrics, CanvasEffect, CanvasEvent, ConnectionForm,
    ConnectionId, ConnectionType, Direction, EditorConfig, EditorSession, NodeDraft, NodeId,
    NodePatch, NodeType, Position, PropertiesEditor, Size, SkipReason, TechnologyEdit,
    import_structured_bytes,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::TechAction;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a blueprint document (64 MB).
///
/// This prevents memory exhaustion from accidental large files.
const MAX_DOCUMENT_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), BlueprintError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| BlueprintError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(BlueprintError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input path: resolves symlinks and "..", and requires a
/// regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, BlueprintError> {
    let canonical = path.canonicalize().map_err(|e| {
        BlueprintError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(BlueprintError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, BlueprintError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        BlueprintError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(BlueprintError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| BlueprintError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Print a value as pretty JSON for `--json-mode`.
fn print_json<T: Serialize>(value: &T) -> Result<(), BlueprintError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| BlueprintError::SerializationError(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create a new empty blueprint file.
pub fn cmd_init(
    file: &Path,
    config: &EditorConfig,
    title: &str,
    description: Option<String>,
    force: bool,
) -> Result<(), BlueprintError> {
    if file.exists() && !force {
        return Err(BlueprintError::IoError(format!(
            "Blueprint '{}' already exists. Use --force to overwrite.",
            file.display()
        )));
    }

    let blueprint = Blueprint::seeded(title, description, Vec::new(), Vec::new())?;
    let mut session = EditorSession::new(blueprint, config, FileHost::new(file));
    commit(&mut session)?;

    println!(
        "Initialized blueprint '{}' ({}) at {}",
        session.blueprint().title(),
        session.blueprint().id(),
        file.display()
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

#[derive(Serialize)]
struct StatusOutput<'a> {
    file: String,
    id: &'a str,
    title: &'a str,
    version: u64,
    node_count: usize,
    connection_count: usize,
    isolated_nodes: usize,
    nodes_by_type: Vec<(&'static str, usize)>,
    connections_by_type: Vec<(&'static str, usize)>,
    updated_at: String,
}

/// Show blueprint metrics.
pub fn cmd_status(file: &Path, config: &EditorConfig, json_mode: bool) -> Result<(), BlueprintError> {
    let session = open_session(file, config)?;
    let blueprint = session.blueprint();
    let metrics: BlueprintMetrics = session.metrics();

    let nodes_by_type: Vec<_> = metrics
        .nodes_by_type
        .iter()
        .map(|(t, n)| (t.tag(), *n))
        .collect();
    let connections_by_type: Vec<_> = metrics
        .connections_by_type
        .iter()
        .map(|(t, n)| (t.tag(), *n))
        .collect();

    if json_mode {
        return print_json(&StatusOutput {
            file: file.display().to_string(),
            id: blueprint.id().as_str(),
            title: blueprint.title(),
            version: metrics.version,
            node_count: metrics.node_count,
            connection_count: metrics.connection_count,
            isolated_nodes: metrics.isolated_nodes,
            nodes_by_type,
            connections_by_type,
            updated_at: blueprint.updated_at().to_rfc3339(),
        });
    }

    println!("Blueprint Status");
    println!("================");
    println!("File:        {}", file.display());
    println!("Title:       {}", blueprint.title());
    println!("Version:     {}", metrics.version);
    println!("Updated:     {}", blueprint.updated_at().to_rfc3339());
    println!();
    println!("Nodes:       {}", metrics.node_count);
    for (tag, count) in &nodes_by_type {
        println!("  {:<12} {}", tag, count);
    }
    println!("Connections: {}", metrics.connection_count);
    for (tag, count) in &connections_by_type {
        println!("  {:<12} {}", tag, count);
    }
    println!("Isolated:    {}", metrics.isolated_nodes);

    Ok(())
}

// =============================================================================
// NODE COMMANDS
// =============================================================================

/// Arguments of `add-node`.
///
/// With `drop` set the node comes from the palette with its type's defaults,
/// so the title, description, size and technology fields are left unset
/// (the parser refuses the combination).
#[derive(Debug, Clone)]
pub struct NodeArgs {
    pub node_type: NodeType,
    pub title: Option<String>,
    pub description: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub technologies: Vec<String>,
    pub drop: bool,
}

/// Add a node, either from a draft or as a palette drop.
pub fn cmd_add_node(
    file: &Path,
    config: &EditorConfig,
    json_mode: bool,
    args: NodeArgs,
) -> Result<(), BlueprintError> {
    let mut session = open_session(file, config)?;
    let at = Position::new(args.x, args.y);

    let id = if args.drop {
        session.handle(CanvasEvent::PaletteDragStart(args.node_type))?;
        match session.handle(CanvasEvent::Drop { at })? {
            CanvasEffect::Created(id) => id,
            other => {
                return Err(BlueprintError::IoError(format!(
                    "Palette drop did not create a node ({:?})",
                    other
                )));
            }
        }
    } else {
        let default_size = config.default_node_size;
        let size = Size::new(
            args.width.unwrap_or(default_size.width),
            args.height.unwrap_or(default_size.height),
        );
        let mut draft = NodeDraft::new(args.node_type)
            .at(at)
            .sized(size)
            .with_technologies(args.technologies.iter().map(|t| t.trim().to_string()));
        draft.technologies.retain(|t| !t.is_empty());
        if let Some(title) = args.title.clone() {
            draft = draft.titled(title);
        }
        if let Some(description) = args.description.clone() {
            draft = draft.described(description);
        }
        session.add_node(draft).id
    };

    commit(&mut session)?;
    report_node(&session, &id, json_mode)
}

/// Scalar field changes for `update-node`.
#[derive(Debug, Clone, Default)]
pub struct NodeChanges {
    pub title: Option<String>,
    pub node_type: Option<NodeType>,
    pub description: Option<Option<String>>,
    pub position: Option<(f64, f64)>,
    pub size: Option<(f64, f64)>,
}

impl NodeChanges {
    fn into_patch(self) -> NodePatch {
        NodePatch {
            title: self.title,
            node_type: self.node_type,
            description: self.description,
            position: self.position.map(|(x, y)| Position::new(x, y)),
            size: self.size.map(|(w, h)| Size::new(w, h)),
            technologies: None,
        }
    }
}

/// Edit a node through the properties panel.
pub fn cmd_update_node(
    file: &Path,
    config: &EditorConfig,
    id: &str,
    changes: NodeChanges,
) -> Result<(), BlueprintError> {
    let patch = changes.into_patch();
    if patch.is_empty() {
        println!("Nothing to update");
        return Ok(());
    }

    let mut session = open_session(file, config)?;
    session.select(Some(&NodeId::new(id)))?;
    session.edit_selected(patch)?;
    commit(&mut session)?;

    println!("Updated node {}", id);
    Ok(())
}

/// Drag a node so its origin lands on (x, y).
///
/// Grabs the node at its own origin, moves once and releases, the same
/// gesture sequence a pointer produces.
pub fn cmd_move_node(
    file: &Path,
    config: &EditorConfig,
    id: &str,
    x: f64,
    y: f64,
) -> Result<(), BlueprintError> {
    let mut session = open_session(file, config)?;
    let node = NodeId::new(id);
    let grab = session
        .blueprint()
        .node(&node)
        .map(|n| n.position)
        .ok_or_else(|| BlueprintError::NodeNotFound(node.clone()))?;

    session.handle(CanvasEvent::PointerDown {
        node: node.clone(),
        at: grab,
    })?;
    session.handle(CanvasEvent::PointerMove {
        at: Position::new(x, y),
    })?;
    session.handle(CanvasEvent::PointerUp)?;
    commit(&mut session)?;

    println!("Moved node {} to ({}, {})", id, x, y);
    Ok(())
}

/// Delete a node and cascade its connections.
pub fn cmd_delete_node(
    file: &Path,
    config: &EditorConfig,
    json_mode: bool,
    id: &str,
) -> Result<(), BlueprintError> {
    let mut session = open_session(file, config)?;
    let removed = session.delete_node(&NodeId::new(id))?;
    commit(&mut session)?;

    if json_mode {
        let ids: Vec<&str> = removed.iter().map(ConnectionId::as_str).collect();
        print_json(&serde_json::json!({
            "deleted": id,
            "removed_connections": ids,
        }))?;
    } else {
        println!(
            "Deleted node {} ({} connection(s) removed)",
            id,
            removed.len()
        );
    }
    Ok(())
}

fn report_node(
    session: &EditorSession<FileHost>,
    id: &NodeId,
    json_mode: bool,
) -> Result<(), BlueprintError> {
    let node = session
        .blueprint()
        .node(id)
        .ok_or_else(|| BlueprintError::NodeNotFound(id.clone()))?;
    if json_mode {
        print_json(node)?;
    } else {
        println!(
            "Added {} node '{}' ({}) at ({}, {})",
            node.node_type.label(),
            node.title,
            node.id,
            node.position.x,
            node.position.y
        );
    }
    Ok(())
}

// =============================================================================
// TECHNOLOGY COMMANDS
// =============================================================================

/// Add, remove or suggest technologies for a node.
pub fn cmd_tech(
    file: &Path,
    config: &EditorConfig,
    json_mode: bool,
    action: TechAction,
) -> Result<(), BlueprintError> {
    match action {
        TechAction::Add { node, name } => {
            let mut session = open_session(file, config)?;
            session.select(Some(&NodeId::new(&node)))?;
            let outcome = session.add_technology(&name)?;
            finish_tech_edit(&mut session, outcome, &node, name.trim(), "Added")
        }
        TechAction::Remove { node, name } => {
            let mut session = open_session(file, config)?;
            session.select(Some(&NodeId::new(&node)))?;
            let outcome = session.remove_technology(&name)?;
            finish_tech_edit(&mut session, outcome, &node, &name, "Removed")
        }
        TechAction::Suggest { node } => {
            let session = open_session(file, config)?;
            let id = NodeId::new(&node);
            let current = session
                .blueprint()
                .node(&id)
                .ok_or_else(|| BlueprintError::NodeNotFound(id.clone()))?;
            let suggestions = PropertiesEditor::suggestions(current, config.suggestion_limit);

            if json_mode {
                print_json(&suggestions)?;
            } else if suggestions.is_empty() {
                println!("No suggestions for {}", current.title);
            } else {
                println!("Suggestions for {}:", current.title);
                for s in suggestions {
                    println!("  {}", s);
                }
            }
            Ok(())
        }
    }
}

fn finish_tech_edit(
    session: &mut EditorSession<FileHost>,
    outcome: TechnologyEdit,
    node: &str,
    name: &str,
    verb: &str,
) -> Result<(), BlueprintError> {
    match outcome {
        TechnologyEdit::Applied => {
            commit(session)?;
            println!("{} '{}' on node {}", verb, name, node);
        }
        TechnologyEdit::Skipped(reason) => {
            let why = match reason {
                SkipReason::Empty => "name is empty",
                SkipReason::AlreadyPresent => "already listed",
                SkipReason::NotPresent => "not listed",
            };
            println!("Nothing changed: '{}' {}", name, why);
        }
    }
    Ok(())
}

// =============================================================================
// CONNECTION COMMANDS
// =============================================================================

/// Connect two nodes through the properties panel form.
pub fn cmd_connect(
    file: &Path,
    config: &EditorConfig,
    json_mode: bool,
    from: &str,
    to: &str,
    connection_type: ConnectionType,
    label: Option<String>,
) -> Result<(), BlueprintError> {
    let mut session = open_session(file, config)?;
    let source = NodeId::new(from);
    if !session.blueprint().contains_node(&source) {
        return Err(BlueprintError::InvalidReference { missing: source });
    }
    session.select(Some(&source))?;

    let mut form = ConnectionForm::new(NodeId::new(to), connection_type);
    if let Some(label) = label {
        form = form.labelled(label);
    }
    let conn = session.connect_selected(form)?;
    commit(&mut session)?;

    if json_mode {
        print_json(&conn)?;
    } else {
        println!(
            "Connected {} → {} ({}) as {}",
            conn.source_id,
            conn.target_id,
            conn.connection_type.tag(),
            conn.id
        );
    }
    Ok(())
}

/// Delete a connection.
pub fn cmd_disconnect(file: &Path, config: &EditorConfig, id: &str) -> Result<(), BlueprintError> {
    let mut session = open_session(file, config)?;
    session.delete_connection(&ConnectionId::new(id))?;
    commit(&mut session)?;

    println!("Deleted connection {}", id);
    Ok(())
}

#[derive(Serialize)]
struct ConnectionLine<'a> {
    id: &'a str,
    direction: &'static str,
    peer: Option<&'a str>,
    #[serde(rename = "type")]
    connection_type: &'static str,
    label: Option<&'a str>,
}

/// List a node's connections with direction, plus remaining targets.
pub fn cmd_connections(
    file: &Path,
    config: &EditorConfig,
    json_mode: bool,
    node: &str,
) -> Result<(), BlueprintError> {
    let mut session = open_session(file, config)?;
    let id = NodeId::new(node);
    session.select(Some(&id))?;
    let view = session
        .properties()
        .ok_or_else(|| BlueprintError::NodeNotFound(id.clone()))?;

    let lines: Vec<ConnectionLine<'_>> = view
        .connections
        .iter()
        .map(|row| ConnectionLine {
            id: row.connection.id.as_str(),
            direction: match row.direction {
                Direction::Outgoing => "outgoing",
                Direction::Incoming => "incoming",
            },
            peer: row.peer.as_ref().map(|p| p.title.as_str()),
            connection_type: row.connection.connection_type.tag(),
            label: row.connection.label.as_deref(),
        })
        .collect();

    if json_mode {
        let targets: Vec<_> = view
            .candidate_targets
            .iter()
            .map(|n| serde_json::json!({ "id": n.id, "title": n.title }))
            .collect();
        return print_json(&serde_json::json!({
            "node": view.node.id,
            "connections": lines,
            "candidate_targets": targets,
        }));
    }

    println!("Connections of {} ({})", view.node.title, view.node.id);
    if view.connections.is_empty() {
        println!("  (none)");
    }
    for row in &view.connections {
        let peer = row.peer.as_ref().map_or("<missing>", |p| p.title.as_str());
        let label = row
            .connection
            .label
            .as_deref()
            .map(|l| format!(" \"{}\"", l))
            .unwrap_or_default();
        println!(
            "  {} {} ({}){} [{}]",
            row.direction.arrow(),
            peer,
            row.connection.connection_type.tag(),
            label,
            row.connection.id
        );
    }

    if view.shows_connection_form() {
        println!();
        println!("Can connect to:");
        for target in &view.candidate_targets {
            println!("  {} ({})", target.title, target.id);
        }
    }
    Ok(())
}

// =============================================================================
// METADATA COMMANDS
// =============================================================================

pub fn cmd_rename(file: &Path, config: &EditorConfig, title: &str) -> Result<(), BlueprintError> {
    let mut session = open_session(file, config)?;
    session.rename_blueprint(title);
    commit(&mut session)?;

    println!("Renamed blueprint to '{}'", title);
    Ok(())
}

pub fn cmd_describe(
    file: &Path,
    config: &EditorConfig,
    text: Option<String>,
) -> Result<(), BlueprintError> {
    let mut session = open_session(file, config)?;
    let cleared = text.is_none();
    session.set_description(text);
    commit(&mut session)?;

    if cleared {
        println!("Cleared blueprint description");
    } else {
        println!("Updated blueprint description");
    }
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT / GENERATE
// =============================================================================

/// Render the Markdown report through the host export action.
pub fn cmd_report(
    file: &Path,
    config: &EditorConfig,
    output: Option<&Path>,
) -> Result<(), BlueprintError> {
    let blueprint = load_blueprint(file)?;
    let mut host = FileHost::new(file);
    if let Some(output) = output {
        host = host.with_report_path(validate_output_path(output)?);
    }

    let mut session = EditorSession::new(blueprint, config, host);
    session.export();
    match session.host_mut().take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Write the structured document to another path.
pub fn cmd_export(file: &Path, output: &Path) -> Result<(), BlueprintError> {
    let validated_output = validate_output_path(output)?;
    let blueprint = load_blueprint(file)?;
    write_document(&validated_output, &blueprint)?;

    println!(
        "Exported blueprint v{} ({} nodes, {} connections) to {}",
        blueprint.version(),
        blueprint.node_count(),
        blueprint.connection_count(),
        validated_output.display()
    );
    Ok(())
}

/// Validate a structured document and make it the blueprint file.
pub fn cmd_import(file: &Path, input: &Path, force: bool) -> Result<(), BlueprintError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_DOCUMENT_FILE_SIZE)?;

    if file.exists() && !force {
        return Err(BlueprintError::IoError(format!(
            "Blueprint '{}' already exists. Use --force to overwrite.",
            file.display()
        )));
    }

    let data = std::fs::read(&validated_path)
        .map_err(|e| BlueprintError::IoError(format!("Read file: {}", e)))?;
    let blueprint = import_structured_bytes(&data)?;
    write_document(file, &blueprint)?;

    println!(
        "Imported blueprint '{}': {} nodes, {} connections",
        blueprint.title(),
        blueprint.node_count(),
        blueprint.connection_count()
    );
    Ok(())
}

/// Hand the blueprint to the generator collaborator (stdout).
pub fn cmd_generate(file: &Path, config: &EditorConfig) -> Result<(), BlueprintError> {
    let mut session = open_session(file, config)?;
    session.generate();
    match session.host_mut().take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load and validate the blueprint document at `file`.
pub fn load_blueprint(file: &Path) -> Result<Blueprint, BlueprintError> {
    if !file.exists() {
        return Err(BlueprintError::IoError(format!(
            "No blueprint at '{}'. Run `blueprint init` first.",
            file.display()
        )));
    }
    validate_file_size(file, MAX_DOCUMENT_FILE_SIZE)?;
    let data = std::fs::read(file)
        .map_err(|e| BlueprintError::IoError(format!("Read '{}': {}", file.display(), e)))?;
    import_structured_bytes(&data)
}

/// Open an editing session on the blueprint file.
pub fn open_session(
    file: &Path,
    config: &EditorConfig,
) -> Result<EditorSession<FileHost>, BlueprintError> {
    let blueprint = load_blueprint(file)?;
    Ok(EditorSession::new(blueprint, config, FileHost::new(file)))
}

/// Save through the host and surface any write failure.
pub fn commit(session: &mut EditorSession<FileHost>) -> Result<(), BlueprintError> {
    session.save();
    match session.host_mut().take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
