//! # Export Module
//!
//! Pure transforms of a blueprint snapshot:
//! - **Structured export**: lossless JSON ([`BlueprintDocument`]) that decodes
//!   back to an equal [`Blueprint`]
//! - **Report export**: one-way Markdown summary for humans
//!
//! Import validates everything `Blueprint` guarantees (unique ids, resolvable
//! endpoints, version >= 1) and never yields a partially populated aggregate.

use crate::graph::{Blueprint, BlueprintParts};
use crate::{BlueprintConnection, BlueprintError, BlueprintId, BlueprintNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

// =============================================================================
// STRUCTURED DOCUMENT
// =============================================================================

/// The on-the-wire shape of a blueprint.
///
/// Field names and nesting are shared with previously exported documents.
/// `idSequence` is optional: documents without it still import, with the
/// sequential id counter resumed from the highest `node-N`/`conn-N` present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintDocument {
    pub id: BlueprintId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<BlueprintNode>,
    pub connections: Vec<BlueprintConnection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    /// High-water mark of sequential id minting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_sequence: Option<u64>,
}

impl BlueprintDocument {
    /// Snapshot a blueprint. Nodes and connections keep insertion order.
    #[must_use]
    pub fn from_blueprint(blueprint: &Blueprint) -> Self {
        Self {
            id: blueprint.id().clone(),
            title: blueprint.title().to_string(),
            description: blueprint.description().map(str::to_string),
            nodes: blueprint.nodes().cloned().collect(),
            connections: blueprint.connections().cloned().collect(),
            created_at: blueprint.created_at(),
            updated_at: blueprint.updated_at(),
            version: blueprint.version(),
            id_sequence: Some(blueprint.id_sequence()).filter(|n| *n > 0),
        }
    }

    /// Rebuild the aggregate, validating structure.
    pub fn into_blueprint(self) -> Result<Blueprint, BlueprintError> {
        Blueprint::from_parts(BlueprintParts {
            id: self.id,
            title: self.title,
            description: self.description,
            nodes: self.nodes,
            connections: self.connections,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
            id_sequence: self.id_sequence.unwrap_or(0),
        })
    }

    /// First node or size with a non-finite coordinate, if any.
    fn non_finite_geometry(&self) -> Option<&BlueprintNode> {
        self.nodes
            .iter()
            .find(|n| !n.position.is_finite() || !n.size.is_finite())
    }
}

// =============================================================================
// STRUCTURED EXPORT / IMPORT
// =============================================================================

/// Encode a blueprint as pretty-printed JSON.
///
/// # Errors
///
/// Returns `BlueprintError::SerializationError` if any node has NaN or
/// infinite geometry (JSON cannot represent it).
pub fn export_structured(blueprint: &Blueprint) -> Result<String, BlueprintError> {
    let document = BlueprintDocument::from_blueprint(blueprint);
    if let Some(node) = document.non_finite_geometry() {
        return Err(BlueprintError::SerializationError(format!(
            "node {} has non-finite geometry",
            node.id
        )));
    }
    serde_json::to_string_pretty(&document)
        .map_err(|e| BlueprintError::SerializationError(e.to_string()))
}

/// Decode a structured export.
///
/// # Errors
///
/// Returns `BlueprintError::MalformedBlueprint` for missing or mistyped
/// fields, duplicate ids, dangling connection endpoints or a zero version.
pub fn import_structured(json: &str) -> Result<Blueprint, BlueprintError> {
    let document: BlueprintDocument = serde_json::from_str(json)
        .map_err(|e| BlueprintError::MalformedBlueprint(e.to_string()))?;
    document.into_blueprint()
}

/// Decode a structured export from raw bytes (e.g. a file read).
pub fn import_structured_bytes(bytes: &[u8]) -> Result<Blueprint, BlueprintError> {
    let document: BlueprintDocument = serde_json::from_slice(bytes)
        .map_err(|e| BlueprintError::MalformedBlueprint(e.to_string()))?;
    document.into_blueprint()
}

// =============================================================================
// REPORT EXPORT
// =============================================================================

/// Render the Markdown report.
///
/// ```text
/// # <title>
///
/// <description>
///
/// ## Components (N)
///
/// ### <node title>
/// - Type: <label>
/// - Description: <text>
/// - Technologies: <a>, <b>
///
/// ## Connections (M)
///
/// - <source title> → <target title> (<type>): <label>
/// ```
///
/// Connections with an unresolvable endpoint are left out, and the
/// connections section is omitted when none remain.
#[must_use]
pub fn export_report(blueprint: &Blueprint) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# {}", blueprint.title());
    out.push('\n');
    if let Some(description) = blueprint.description().filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(out, "{}", description);
        out.push('\n');
    }

    let _ = writeln!(out, "## Components ({})", blueprint.node_count());
    for node in blueprint.nodes() {
        out.push('\n');
        let _ = writeln!(out, "### {}", node.title);
        let _ = writeln!(out, "- Type: {}", node.node_type.label());
        if let Some(description) = node.description.as_deref().filter(|d| !d.trim().is_empty()) {
            let _ = writeln!(out, "- Description: {}", description);
        }
        if !node.technologies.is_empty() {
            let _ = writeln!(out, "- Technologies: {}", node.technologies.join(", "));
        }
    }

    let connections: Vec<_> = blueprint
        .connections()
        .filter_map(|conn| {
            let source = blueprint.node(&conn.source_id)?;
            let target = blueprint.node(&conn.target_id)?;
            Some((conn, source, target))
        })
        .collect();

    if !connections.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "## Connections ({})", connections.len());
        out.push('\n');
        for (conn, source, target) in connections {
            let _ = write!(
                out,
                "- {} → {} ({})",
                source.title,
                target.title,
                conn.connection_type.tag()
            );
            match conn.label.as_deref() {
                Some(label) if !label.is_empty() => {
                    let _ = writeln!(out, ": {}", label);
                }
                _ => out.push('\n'),
            }
        }
    }

    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ConnectionDraft, ConnectionType, EditorConfig, IdStrategy, MutationEngine, NodeDraft,
        NodePatch, NodeType, Position, Size,
    };

    fn sample() -> Blueprint {
        let engine = MutationEngine::new(&EditorConfig::default());
        let mut bp = Blueprint::new("Shop");
        engine.set_description(&mut bp, Some("Online store".into()));
        let web = engine.add_node(
            &mut bp,
            NodeDraft::new(NodeType::Frontend)
                .titled("Web")
                .described("Storefront")
                .at(Position::new(10.5, -3.25))
                .with_technologies(["React", "Vite"]),
        );
        let db = engine.add_node(
            &mut bp,
            NodeDraft::new(NodeType::Database)
                .titled("Orders DB")
                .sized(Size::new(180.0, 90.0)),
        );
        engine
            .add_connection(
                &mut bp,
                ConnectionDraft::new(web.id, db.id, ConnectionType::Data).labelled("orders"),
            )
            .expect("connect");
        bp
    }

    #[test]
    fn structured_round_trip() {
        let bp = sample();
        let json = export_structured(&bp).expect("export");
        let back = import_structured(&json).expect("import");
        assert_eq!(back, bp);
    }

    #[test]
    fn wire_field_names() {
        let json = export_structured(&sample()).expect("export");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        for key in ["id", "title", "description", "nodes", "connections", "createdAt", "updatedAt", "version"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["nodes"][0]["type"], "frontend");
        assert_eq!(value["connections"][0]["type"], "data");
        assert!(value["connections"][0].get("sourceId").is_some());
    }

    #[test]
    fn import_missing_field_is_malformed() {
        let result = import_structured(r#"{"id":"x","title":"t","nodes":[],"connections":[]}"#);
        assert!(matches!(result, Err(BlueprintError::MalformedBlueprint(_))));
    }

    #[test]
    fn import_dangling_endpoint_is_malformed() {
        let json = r#"{
            "id": "bp", "title": "t",
            "nodes": [{"id":"a","type":"api","title":"A",
                       "position":{"x":0,"y":0},"size":{"width":150,"height":100}}],
            "connections": [{"id":"c","sourceId":"a","targetId":"b","type":"api"}],
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
            "version": 3
        }"#;
        let result = import_structured(json);
        assert!(matches!(result, Err(BlueprintError::MalformedBlueprint(_))));
    }

    #[test]
    fn import_accepts_legacy_fields() {
        let json = r#"{
            "id": "bp", "title": "t",
            "nodes": [
                {"id":"a","type":"api","title":"A","position":{"x":0,"y":0},
                 "size":{"width":150,"height":100},"connections":["c"]},
                {"id":"b","type":"service","title":"B","position":{"x":200,"y":0},
                 "size":{"width":150,"height":100},"technologies":["Kafka"]}
            ],
            "connections": [{"id":"c","sourceId":"a","targetId":"b","type":"communication"}],
            "createdAt": "2024-05-01T10:00:00.000Z",
            "updatedAt": "2024-05-02T10:00:00.000Z",
            "version": 7
        }"#;
        let bp = import_structured_bytes(json.as_bytes()).expect("import");
        assert_eq!(bp.version(), 7);
        assert_eq!(bp.node_count(), 2);
        let again = import_structured(&export_structured(&bp).expect("export")).expect("import");
        assert_eq!(again, bp);
    }

    #[test]
    fn import_zero_version_is_malformed() {
        let json = r#"{"id":"x","title":"t","nodes":[],"connections":[],
            "createdAt":"2024-05-01T10:00:00Z","updatedAt":"2024-05-01T10:00:00Z","version":0}"#;
        assert!(matches!(
            import_structured(json),
            Err(BlueprintError::MalformedBlueprint(_))
        ));
    }

    #[test]
    fn non_finite_geometry_fails_export() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("nan");
        let node = engine.add_node(&mut bp, NodeDraft::new(NodeType::Custom));
        engine
            .update_node(&mut bp, &node.id, NodePatch::new().position(Position::new(f64::NAN, 0.0)))
            .expect("update");
        assert!(matches!(
            export_structured(&bp),
            Err(BlueprintError::SerializationError(_))
        ));
    }

    #[test]
    fn retired_sequential_id_not_reissued_after_import() {
        let engine = MutationEngine::new(&EditorConfig::default().with_id_strategy(IdStrategy::Sequential));
        let mut bp = Blueprint::new("ids");
        let keep = engine.add_node(&mut bp, NodeDraft::new(NodeType::Api));
        let retired = engine.add_node(&mut bp, NodeDraft::new(NodeType::Api));
        engine.delete_node(&mut bp, &retired.id).expect("delete");

        let json = export_structured(&bp).expect("export");
        let mut back = import_structured(&json).expect("import");
        let fresh = engine.add_node(&mut back, NodeDraft::new(NodeType::Api));

        assert_eq!(keep.id.as_str(), "node-1");
        assert_eq!(retired.id.as_str(), "node-2");
        assert_ne!(fresh.id, retired.id);
        assert_eq!(fresh.id.as_str(), "node-3");
    }

    #[test]
    fn import_without_sequence_resumes_after_highest_id() {
        let json = r#"{
            "id": "bp", "title": "t",
            "nodes": [{"id":"node-4","type":"api","title":"A",
                       "position":{"x":0,"y":0},"size":{"width":150,"height":100}}],
            "connections": [],
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
            "version": 2
        }"#;
        let engine = MutationEngine::new(&EditorConfig::default().with_id_strategy(IdStrategy::Sequential));
        let mut bp = import_structured(json).expect("import");
        let node = engine.add_node(&mut bp, NodeDraft::new(NodeType::Api));
        assert_eq!(node.id.as_str(), "node-5");
    }

    #[test]
    fn report_layout() {
        let report = export_report(&sample());
        let expected = "\
# Shop

Online store

## Components (2)

### Web
- Type: Frontend
- Description: Storefront
- Technologies: React, Vite

### Orders DB
- Type: Database

## Connections (1)

- Web → Orders DB (data): orders
";
        assert_eq!(report, expected);
    }

    #[test]
    fn report_omits_empty_connections_section() {
        let engine = MutationEngine::default();
        let mut bp = Blueprint::new("Solo");
        engine.add_node(&mut bp, NodeDraft::new(NodeType::Service));
        let report = export_report(&bp);
        assert!(report.contains("## Components (1)"));
        assert!(!report.contains("Connections"));
    }
}
