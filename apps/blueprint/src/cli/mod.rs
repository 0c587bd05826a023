//! # Blueprint CLI Module
//!
//! This module implements the CLI interface for the blueprint editor.
//!
//! ## Available Commands
//!
//! - `init` - Create a new empty blueprint file
//! - `status` - Show blueprint metrics
//! - `add-node` / `update-node` / `move-node` / `delete-node` - Node editing
//! - `tech` - Manage a node's technology list
//! - `connect` / `disconnect` / `connections` - Connection editing
//! - `rename` / `describe` - Blueprint metadata
//! - `report` - Markdown report (host export action)
//! - `export` / `import` - Structured JSON documents
//! - `generate` - Print the document for a code generator

mod commands;

use blueprint_core::{BlueprintError, ConnectionType, EditorConfig, NodeType};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Blueprint - architecture diagram editor
///
/// Every command loads the blueprint file, applies one editor operation and
/// saves it back.
#[derive(Parser, Debug)]
#[command(name = "blueprint")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational logs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the blueprint document
    #[arg(short = 'f', long, global = true, default_value = "blueprint.json")]
    pub file: PathBuf,

    /// Editor config file (default: ./blueprint.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new empty blueprint
    Init {
        /// Blueprint title
        #[arg(short, long)]
        title: String,

        /// Blueprint description
        #[arg(short, long)]
        description: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show blueprint metrics
    Status,

    /// Add a node
    AddNode {
        /// Node type (frontend, backend, database, api, service, component, custom)
        #[arg(short = 't', long = "type", value_parser = parse_node_type)]
        node_type: NodeType,

        /// Title (default: "New <Type>")
        #[arg(long, conflicts_with = "drop")]
        title: Option<String>,

        /// Description
        #[arg(long, conflicts_with = "drop")]
        description: Option<String>,

        /// X coordinate
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        x: f64,

        /// Y coordinate
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        y: f64,

        /// Width (default: configured node width)
        #[arg(long, conflicts_with = "drop")]
        width: Option<f64>,

        /// Height (default: configured node height)
        #[arg(long, conflicts_with = "drop")]
        height: Option<f64>,

        /// Technology (repeatable)
        #[arg(long = "tech", conflicts_with = "drop")]
        technologies: Vec<String>,

        /// Treat x/y as a palette drop point (default node centered on it)
        #[arg(long)]
        drop: bool,
    },

    /// Update a node's fields
    UpdateNode {
        /// Node id
        #[arg(long)]
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New type
        #[arg(short = 't', long = "type", value_parser = parse_node_type)]
        node_type: Option<NodeType>,

        /// New description
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,

        /// Remove the description
        #[arg(long)]
        clear_description: bool,

        /// New X coordinate (requires --y)
        #[arg(short, long, requires = "y", allow_negative_numbers = true)]
        x: Option<f64>,

        /// New Y coordinate (requires --x)
        #[arg(short, long, requires = "x", allow_negative_numbers = true)]
        y: Option<f64>,

        /// New width (requires --height)
        #[arg(long, requires = "height")]
        width: Option<f64>,

        /// New height (requires --width)
        #[arg(long, requires = "width")]
        height: Option<f64>,
    },

    /// Drag a node to a new position
    MoveNode {
        /// Node id
        #[arg(long)]
        id: String,

        /// Target X coordinate
        #[arg(short, long, allow_negative_numbers = true)]
        x: f64,

        /// Target Y coordinate
        #[arg(short, long, allow_negative_numbers = true)]
        y: f64,
    },

    /// Delete a node and its connections
    DeleteNode {
        /// Node id
        #[arg(long)]
        id: String,
    },

    /// Manage a node's technologies
    Tech {
        #[command(subcommand)]
        action: TechAction,
    },

    /// Connect two nodes
    Connect {
        /// Source node id
        #[arg(long)]
        from: String,

        /// Target node id
        #[arg(long)]
        to: String,

        /// Connection type (api, data, dependency, communication)
        #[arg(short = 't', long = "type", default_value = "api", value_parser = parse_connection_type)]
        connection_type: ConnectionType,

        /// Optional label
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Delete a connection
    Disconnect {
        /// Connection id
        #[arg(long)]
        id: String,
    },

    /// List a node's connections and remaining targets
    Connections {
        /// Node id
        #[arg(long)]
        node: String,
    },

    /// Set the blueprint title
    Rename {
        /// New title
        #[arg(short, long)]
        title: String,
    },

    /// Set or clear the blueprint description
    Describe {
        /// New description (omit to clear)
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Write the Markdown report
    Report {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the structured JSON document
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Replace the blueprint file with a validated structured document
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Overwrite an existing blueprint file
        #[arg(long)]
        force: bool,
    },

    /// Print the structured document for a code generator
    Generate,
}

/// Technology list actions.
#[derive(Subcommand, Debug)]
pub enum TechAction {
    /// Append a technology
    Add {
        #[arg(long)]
        node: String,
        #[arg(long)]
        name: String,
    },
    /// Remove a technology
    Remove {
        #[arg(long)]
        node: String,
        #[arg(long)]
        name: String,
    },
    /// Show suggestions for the node's type
    Suggest {
        #[arg(long)]
        node: String,
    },
}

fn parse_node_type(s: &str) -> Result<NodeType, String> {
    NodeType::from_tag(s).ok_or_else(|| {
        let known: Vec<_> = NodeType::ALL.iter().map(|t| t.tag()).collect();
        format!("unknown node type '{}' (expected one of: {})", s, known.join(", "))
    })
}

fn parse_connection_type(s: &str) -> Result<ConnectionType, String> {
    ConnectionType::from_tag(s).ok_or_else(|| {
        let known: Vec<_> = ConnectionType::ALL.iter().map(|t| t.tag()).collect();
        format!(
            "unknown connection type '{}' (expected one of: {})",
            s,
            known.join(", ")
        )
    })
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli, config: &EditorConfig) -> Result<(), BlueprintError> {
    let file = cli.file.as_path();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init {
            title,
            description,
            force,
        }) => cmd_init(file, config, &title, description, force),
        Some(Commands::Status) | None => cmd_status(file, config, json_mode),
        Some(Commands::AddNode {
            node_type,
            title,
            description,
            x,
            y,
            width,
            height,
            technologies,
            drop,
        }) => cmd_add_node(
            file,
            config,
            json_mode,
            NodeArgs {
                node_type,
                title,
                description,
                x,
                y,
                width,
                height,
                technologies,
                drop,
            },
        ),
        Some(Commands::UpdateNode {
            id,
            title,
            node_type,
            description,
            clear_description,
            x,
            y,
            width,
            height,
        }) => {
            let description = if clear_description {
                Some(None)
            } else {
                description.map(Some)
            };
            cmd_update_node(
                file,
                config,
                &id,
                NodeChanges {
                    title,
                    node_type,
                    description,
                    position: x.zip(y),
                    size: width.zip(height),
                },
            )
        }
        Some(Commands::MoveNode { id, x, y }) => cmd_move_node(file, config, &id, x, y),
        Some(Commands::DeleteNode { id }) => cmd_delete_node(file, config, json_mode, &id),
        Some(Commands::Tech { action }) => cmd_tech(file, config, json_mode, action),
        Some(Commands::Connect {
            from,
            to,
            connection_type,
            label,
        }) => cmd_connect(file, config, json_mode, &from, &to, connection_type, label),
        Some(Commands::Disconnect { id }) => cmd_disconnect(file, config, &id),
        Some(Commands::Connections { node }) => cmd_connections(file, config, json_mode, &node),
        Some(Commands::Rename { title }) => cmd_rename(file, config, &title),
        Some(Commands::Describe { text }) => cmd_describe(file, config, text),
        Some(Commands::Report { output }) => cmd_report(file, config, output.as_deref()),
        Some(Commands::Export { output }) => cmd_export(file, &output),
        Some(Commands::Import { input, force }) => cmd_import(file, &input, force),
        Some(Commands::Generate) => cmd_generate(file, config),
    }
}
