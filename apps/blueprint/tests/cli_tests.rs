//! Integration tests driving the CLI commands against a temp directory.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use blueprint::cli::{
    NodeArgs, NodeChanges, cmd_add_node, cmd_connect, cmd_delete_node, cmd_describe,
    cmd_disconnect, cmd_export, cmd_import, cmd_init, cmd_move_node, cmd_rename, cmd_report,
    cmd_update_node, load_blueprint,
};
use blueprint_core::{
    BlueprintError, ConnectionId, ConnectionPolicy, ConnectionType, EditorConfig, IdStrategy,
    NodeId, NodeType, Position,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn config() -> EditorConfig {
    EditorConfig::default().with_id_strategy(IdStrategy::Sequential)
}

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("blueprint.json");
    cmd_init(&file, &config(), "Shop", None, false).unwrap();
    (dir, file)
}

fn args(node_type: NodeType, title: &str, x: f64, y: f64) -> NodeArgs {
    NodeArgs {
        node_type,
        title: Some(title.to_string()),
        description: None,
        x,
        y,
        width: None,
        height: None,
        technologies: Vec::new(),
        drop: false,
    }
}

fn add(file: &Path, node_type: NodeType, title: &str) {
    cmd_add_node(file, &config(), false, args(node_type, title, 0.0, 0.0)).unwrap();
}

// =============================================================================
// INIT
// =============================================================================

#[test]
fn test_init_creates_version_one() {
    let (_dir, file) = workspace();
    let bp = load_blueprint(&file).unwrap();

    assert_eq!(bp.title(), "Shop");
    assert_eq!(bp.version(), 1);
    assert_eq!(bp.node_count(), 0);
}

#[test]
fn test_init_refuses_overwrite_without_force() {
    let (_dir, file) = workspace();
    let err = cmd_init(&file, &config(), "Other", None, false).unwrap_err();
    assert!(matches!(err, BlueprintError::IoError(_)));

    cmd_init(&file, &config(), "Other", None, true).unwrap();
    assert_eq!(load_blueprint(&file).unwrap().title(), "Other");
}

#[test]
fn test_missing_file_asks_for_init() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_blueprint(&dir.path().join("nope.json")).unwrap_err();
    assert!(err.to_string().contains("init"));
}

// =============================================================================
// NODES
// =============================================================================

#[test]
fn test_add_nodes_persist_with_sequential_ids() {
    let (_dir, file) = workspace();
    add(&file, NodeType::Frontend, "Web App");
    add(&file, NodeType::Api, "Orders");

    let bp = load_blueprint(&file).unwrap();
    assert_eq!(bp.version(), 3);
    assert_eq!(bp.node(&NodeId::new("node-1")).unwrap().title, "Web App");
    assert_eq!(bp.node(&NodeId::new("node-2")).unwrap().title, "Orders");
}

#[test]
fn test_add_node_uses_configured_size_and_tech() {
    let (_dir, file) = workspace();
    let mut node = args(NodeType::Database, "Store", 10.0, 20.0);
    node.width = Some(300.0);
    node.technologies = vec!["PostgreSQL".to_string(), " ".to_string(), "PostgreSQL".to_string()];
    cmd_add_node(&file, &config(), true, node).unwrap();

    let bp = load_blueprint(&file).unwrap();
    let stored = bp.node(&NodeId::new("node-1")).unwrap();
    assert_eq!(stored.size.width, 300.0);
    assert_eq!(stored.size.height, config().default_node_size.height);
    assert_eq!(stored.technologies, vec!["PostgreSQL".to_string()]);
}

#[test]
fn test_palette_drop_centers_node() {
    let (_dir, file) = workspace();
    let mut node = args(NodeType::Service, "", 400.0, 300.0);
    node.title = None;
    node.drop = true;
    cmd_add_node(&file, &config(), false, node).unwrap();

    let bp = load_blueprint(&file).unwrap();
    let stored = bp.node(&NodeId::new("node-1")).unwrap();
    assert_eq!(stored.center(), Position::new(400.0, 300.0));
    assert_eq!(stored.title, NodeType::Service.default_title());
}

#[test]
fn test_move_node_drags_to_target() {
    let (_dir, file) = workspace();
    add(&file, NodeType::Backend, "API");

    cmd_move_node(&file, &config(), "node-1", -40.0, 75.0).unwrap();

    let bp = load_blueprint(&file).unwrap();
    assert_eq!(bp.node(&NodeId::new("node-1")).unwrap().position, Position::new(-40.0, 75.0));
    assert_eq!(bp.version(), 3);
}

#[test]
fn test_update_node_fields() {
    let (_dir, file) = workspace();
    add(&file, NodeType::Backend, "API");

    cmd_update_node(
        &file,
        &config(),
        "node-1",
        NodeChanges {
            title: Some("Gateway".to_string()),
            node_type: Some(NodeType::Service),
            description: Some(Some("edge".to_string())),
            ..NodeChanges::default()
        },
    )
    .unwrap();

    let bp = load_blueprint(&file).unwrap();
    let node = bp.node(&NodeId::new("node-1")).unwrap();
    assert_eq!(node.title, "Gateway");
    assert_eq!(node.node_type, NodeType::Service);
    assert_eq!(node.description.as_deref(), Some("edge"));
}

#[test]
fn test_empty_update_keeps_version() {
    let (_dir, file) = workspace();
    add(&file, NodeType::Backend, "API");

    cmd_update_node(&file, &config(), "node-1", NodeChanges::default()).unwrap();
    assert_eq!(load_blueprint(&file).unwrap().version(), 2);
}

#[test]
fn test_update_unknown_node_fails() {
    let (_dir, file) = workspace();
    let err = cmd_update_node(
        &file,
        &config(),
        "ghost",
        NodeChanges {
            title: Some("x".to_string()),
            ..NodeChanges::default()
        },
    )
    .unwrap_err();
    assert!(err.is_not_found());
}

// =============================================================================
// CONNECTIONS
// =============================================================================

#[test]
fn test_connect_then_delete_node_cascades() {
    let (_dir, file) = workspace();
    add(&file, NodeType::Frontend, "Web App");
    add(&file, NodeType::Api, "Orders");
    add(&file, NodeType::Database, "Store");

    cmd_connect(&file, &config(), false, "node-1", "node-2", ConnectionType::Api, None).unwrap();
    cmd_connect(
        &file,
        &config(),
        false,
        "node-2",
        "node-3",
        ConnectionType::Data,
        Some("writes".to_string()),
    )
    .unwrap();

    let bp = load_blueprint(&file).unwrap();
    assert_eq!(bp.connection_count(), 2);
    let version = bp.version();

    cmd_delete_node(&file, &config(), true, "node-2").unwrap();

    let bp = load_blueprint(&file).unwrap();
    assert_eq!(bp.node_count(), 2);
    assert_eq!(bp.connection_count(), 0);
    assert_eq!(bp.version(), version + 1);
}

#[test]
fn test_connect_to_missing_target_is_invalid_reference() {
    let (_dir, file) = workspace();
    add(&file, NodeType::Frontend, "Web App");

    let err = cmd_connect(&file, &config(), false, "node-1", "ghost", ConnectionType::Api, None)
        .unwrap_err();
    match err {
        BlueprintError::InvalidReference { missing } => assert_eq!(missing, NodeId::new("ghost")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(load_blueprint(&file).unwrap().connection_count(), 0);
}

#[test]
fn test_strict_policy_rejects_duplicate() {
    let (_dir, file) = workspace();
    add(&file, NodeType::Frontend, "Web App");
    add(&file, NodeType::Api, "Orders");
    let strict = config().with_policy(ConnectionPolicy::Strict);

    cmd_connect(&file, &strict, false, "node-1", "node-2", ConnectionType::Api, None).unwrap();
    let err = cmd_connect(&file, &strict, false, "node-1", "node-2", ConnectionType::Data, None)
        .unwrap_err();
    assert!(matches!(err, BlueprintError::ConnectionRejected(_)));
}

#[test]
fn test_disconnect() {
    let (_dir, file) = workspace();
    add(&file, NodeType::Frontend, "Web App");
    add(&file, NodeType::Api, "Orders");
    cmd_connect(&file, &config(), false, "node-1", "node-2", ConnectionType::Api, None).unwrap();

    let id = load_blueprint(&file)
        .unwrap()
        .connections()
        .next()
        .map(|c| c.id.clone())
        .unwrap();
    cmd_disconnect(&file, &config(), id.as_str()).unwrap();

    let bp = load_blueprint(&file).unwrap();
    assert_eq!(bp.connection_count(), 0);
    assert!(!bp.contains_connection(&id));

    let err = cmd_disconnect(&file, &config(), id.as_str()).unwrap_err();
    assert!(matches!(err, BlueprintError::ConnectionNotFound(c) if c == ConnectionId::new(id.as_str())));
}

// =============================================================================
// METADATA / EXPORT / IMPORT
// =============================================================================

#[test]
fn test_rename_and_describe() {
    let (_dir, file) = workspace();
    cmd_rename(&file, &config(), "Store Front").unwrap();
    cmd_describe(&file, &config(), Some("Online shop".to_string())).unwrap();

    let bp = load_blueprint(&file).unwrap();
    assert_eq!(bp.title(), "Store Front");
    assert_eq!(bp.description(), Some("Online shop"));
    assert_eq!(bp.version(), 3);

    cmd_describe(&file, &config(), None).unwrap();
    assert_eq!(load_blueprint(&file).unwrap().description(), None);
}

#[test]
fn test_report_written_to_file() {
    let (dir, file) = workspace();
    add(&file, NodeType::Frontend, "Web App");
    add(&file, NodeType::Api, "Orders");
    cmd_connect(&file, &config(), false, "node-1", "node-2", ConnectionType::Api, None).unwrap();

    let out = dir.path().join("shop.md");
    cmd_report(&file, &config(), Some(&out)).unwrap();

    let report = std::fs::read_to_string(&out).unwrap();
    assert!(report.starts_with("# Shop"));
    assert!(report.contains("## Components (2)"));
    assert!(report.contains("- Web App → Orders (api)"));
    // Reporting does not mutate.
    assert_eq!(load_blueprint(&file).unwrap().version(), 4);
}

#[test]
fn test_export_import_round_trip() {
    let (dir, file) = workspace();
    add(&file, NodeType::Frontend, "Web App");
    add(&file, NodeType::Api, "Orders");
    cmd_connect(&file, &config(), false, "node-1", "node-2", ConnectionType::Api, None).unwrap();

    let exported = dir.path().join("export.json");
    cmd_export(&file, &exported).unwrap();

    let copy = dir.path().join("copy.json");
    cmd_import(&copy, &exported, false).unwrap();

    assert_eq!(load_blueprint(&copy).unwrap(), load_blueprint(&file).unwrap());
}

#[test]
fn test_import_malformed_leaves_target_untouched() {
    let (dir, file) = workspace();
    let before = std::fs::read_to_string(&file).unwrap();

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"id": "x", "title": "missing fields"}"#).unwrap();

    let err = cmd_import(&file, &bad, true).unwrap_err();
    assert!(matches!(err, BlueprintError::MalformedBlueprint(_)));
    assert_eq!(std::fs::read_to_string(&file).unwrap(), before);
}

#[test]
fn test_import_requires_force_for_existing_file() {
    let (dir, file) = workspace();
    let exported = dir.path().join("export.json");
    cmd_export(&file, &exported).unwrap();

    let err = cmd_import(&file, &exported, false).unwrap_err();
    assert!(matches!(err, BlueprintError::IoError(_)));
}

#[test]
fn test_deleted_node_id_not_reissued() {
    let (_dir, file) = workspace();
    add(&file, NodeType::Frontend, "Web App");
    cmd_delete_node(&file, &config(), false, "node-1").unwrap();
    add(&file, NodeType::Api, "Orders");

    let bp = load_blueprint(&file).unwrap();
    assert!(!bp.contains_node(&NodeId::new("node-1")));
    assert_eq!(bp.node(&NodeId::new("node-2")).unwrap().title, "Orders");
}
