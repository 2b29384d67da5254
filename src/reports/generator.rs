use crate::types::{GraphSnapshot, ScalabilityMetrics, StoreStatus};
use anyhow::Result;

/// Report generator for store status and metrics
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a status report in the specified format
    pub fn generate(&self, status: &StoreStatus, format: &str) -> Result<String> {
        match format.to_lowercase().as_str() {
            "json" => Ok(serde_json::to_string_pretty(status)?),
            "markdown" => Ok(self.generate_markdown(status)),
            "text" => Ok(self.generate_text(status)),
            _ => Err(anyhow::anyhow!("Unsupported format: {}", format)),
        }
    }

    /// Dump every node and relationship as pretty JSON
    pub fn generate_snapshot(&self, snapshot: &GraphSnapshot) -> Result<String> {
        Ok(serde_json::to_string_pretty(snapshot)?)
    }

    pub fn generate_scalability(&self, metrics: &ScalabilityMetrics) -> String {
        format!(
            r#"Sovereign Scalability
=====================

Address: {}
Lineage Nodes: {}
Max Lineage Depth: {}
Direct Links: {}
Sovereignty Score: {}
Scalability Factor: {:.2}
Network Centrality: {:.2}
"#,
            metrics.address,
            metrics.total_lineage_nodes,
            metrics.max_lineage_depth,
            metrics.out_degree,
            metrics.sovereignty_score,
            metrics.scalability_factor,
            metrics.network_centrality,
        )
    }

    fn type_lines(status: &StoreStatus, prefix: &str) -> String {
        if status.nodes.by_type.is_empty() {
            return format!("{}None", prefix);
        }

        status
            .nodes
            .by_type
            .iter()
            .map(|(node_type, count)| format!("{}{}: {}", prefix, node_type, count))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn generate_markdown(&self, status: &StoreStatus) -> String {
        format!(
            r#"# Lineage Store Status

**Database**: {}
**Host**: {}
**Mode**: {}
**Connected**: {}

## Nodes
- **Total**: {}
{}

## Relationships
- **Total**: {}

## Metrics
- **Nodes Created**: {}
- **Relationships Created**: {}
- **Queries Executed**: {}
- **Traversals Completed**: {}
"#,
            status.database,
            status.host,
            status.mode,
            status.connected,
            status.nodes.total,
            Self::type_lines(status, "- "),
            status.relationships,
            status.metrics.nodes_created,
            status.metrics.relationships_created,
            status.metrics.queries_executed,
            status.metrics.traversals_completed,
        )
    }

    fn generate_text(&self, status: &StoreStatus) -> String {
        format!(
            r#"Lineage Store Status
====================

Database: {} ({})
Mode: {}
Connected: {}

Nodes: {}
{}
Relationships: {}

Nodes Created: {}
Relationships Created: {}
Queries Executed: {}
Traversals Completed: {}
"#,
            status.database,
            status.host,
            status.mode,
            status.connected,
            status.nodes.total,
            Self::type_lines(status, "  "),
            status.relationships,
            status.metrics.nodes_created,
            status.metrics.relationships_created,
            status.metrics.queries_executed,
            status.metrics.traversals_completed,
        )
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
