//! # Type Catalog
//!
//! Static presentation metadata for node and connection types: display
//! labels, palette icons, accent colors and technology suggestions.
//!
//! Nothing here carries behavior. The graph never branches on a node's type.

use crate::{ConnectionType, NodeType};

impl NodeType {
    /// Every node type, in palette order.
    pub const ALL: [NodeType; 7] = [
        NodeType::Frontend,
        NodeType::Backend,
        NodeType::Database,
        NodeType::Api,
        NodeType::Service,
        NodeType::Component,
        NodeType::Custom,
    ];

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            NodeType::Frontend => "Frontend",
            NodeType::Backend => "Backend",
            NodeType::Database => "Database",
            NodeType::Api => "API",
            NodeType::Service => "Service",
            NodeType::Component => "Component",
            NodeType::Custom => "Custom",
        }
    }

    /// Wire tag, as used in the structured export.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            NodeType::Frontend => "frontend",
            NodeType::Backend => "backend",
            NodeType::Database => "database",
            NodeType::Api => "api",
            NodeType::Service => "service",
            NodeType::Component => "component",
            NodeType::Custom => "custom",
        }
    }

    /// Parse a wire tag (case-insensitive).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.tag().eq_ignore_ascii_case(tag))
    }

    /// Title given to a node created from the palette.
    #[must_use]
    pub fn default_title(&self) -> String {
        format!("New {}", self.label())
    }

    /// Icon name shown on the palette entry and the node header.
    #[must_use]
    pub fn icon(&self) -> &'static str {
        match self {
            NodeType::Frontend => "monitor",
            NodeType::Backend => "server",
            NodeType::Database => "database",
            NodeType::Api => "globe",
            NodeType::Service => "cloud",
            NodeType::Component => "box",
            NodeType::Custom => "settings",
        }
    }

    /// Accent color (hex RGB).
    #[must_use]
    pub fn accent(&self) -> &'static str {
        match self {
            NodeType::Frontend => "#3b82f6",
            NodeType::Backend => "#22c55e",
            NodeType::Database => "#a855f7",
            NodeType::Api => "#f97316",
            NodeType::Service => "#06b6d4",
            NodeType::Component => "#ec4899",
            NodeType::Custom => "#6b7280",
        }
    }

    /// Technology suggestions offered by the properties panel.
    #[must_use]
    pub fn suggested_technologies(&self) -> &'static [&'static str] {
        match self {
            NodeType::Frontend => &[
                "React",
                "Vue.js",
                "Angular",
                "Svelte",
                "Next.js",
                "TypeScript",
                "Tailwind CSS",
                "Vite",
            ],
            NodeType::Backend => &[
                "Node.js",
                "Express",
                "Rust",
                "Axum",
                "Python",
                "FastAPI",
                "Go",
                "Spring Boot",
            ],
            NodeType::Database => &[
                "PostgreSQL",
                "MySQL",
                "MongoDB",
                "Redis",
                "SQLite",
                "DynamoDB",
                "Elasticsearch",
            ],
            NodeType::Api => &[
                "REST",
                "GraphQL",
                "gRPC",
                "WebSocket",
                "OpenAPI",
                "tRPC",
            ],
            NodeType::Service => &[
                "Docker",
                "Kubernetes",
                "AWS Lambda",
                "RabbitMQ",
                "Kafka",
                "Nginx",
            ],
            NodeType::Component => &["React", "Web Components", "Storybook", "CSS Modules"],
            NodeType::Custom => &[],
        }
    }
}

impl ConnectionType {
    /// Every connection type, in picker order.
    pub const ALL: [ConnectionType; 4] = [
        ConnectionType::Api,
        ConnectionType::Data,
        ConnectionType::Dependency,
        ConnectionType::Communication,
    ];

    /// Wire tag, as used in the structured export and the report.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            ConnectionType::Api => "api",
            ConnectionType::Data => "data",
            ConnectionType::Dependency => "dependency",
            ConnectionType::Communication => "communication",
        }
    }

    /// Parse a wire tag (case-insensitive).
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.tag().eq_ignore_ascii_case(tag))
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionType::Api => "API Call",
            ConnectionType::Data => "Data Flow",
            ConnectionType::Dependency => "Dependency",
            ConnectionType::Communication => "Communication",
        }
    }

    /// Stroke color of the drawn line (hex RGB).
    #[must_use]
    pub fn stroke(&self) -> &'static str {
        match self {
            ConnectionType::Api => "#3b82f6",
            ConnectionType::Data => "#22c55e",
            ConnectionType::Dependency => "#f59e0b",
            ConnectionType::Communication => "#8b5cf6",
        }
    }
}
