use crate::config::Config;
use crate::error::{ChainError, LineageError, Result};
use crate::lineage::traversal::GraphTraversal;
use crate::reports::cypher::CypherExporter;
use crate::types::*;
use chrono::{SecondsFormat, Utc};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};
use uuid::Uuid;

/// In-memory property graph of lineage nodes and relationships.
///
/// Node and edge weights live in a petgraph `DiGraph`. Nothing is ever
/// removed individually, so node and edge indices grow with insertion order
/// and double as creation order.
#[derive(Debug)]
pub struct LineageStore {
    graph: DiGraph<Node, Relationship>,
    node_map: HashMap<String, NodeIndex>,
    type_index: HashMap<NodeType, Vec<NodeIndex>>,
    metrics: StoreMetrics,
    config: Config,
}

impl Default for LineageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LineageStore {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        info!(
            "Lineage store ready (in-memory, database: {})",
            config.store.database
        );

        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            type_index: HashMap::new(),
            metrics: StoreMetrics::default(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create a node of a known type
    pub fn create_node(&mut self, node_type: NodeType, mut properties: Properties) -> Node {
        let id = format!("{}-{}", node_type, Uuid::new_v4().simple());
        let now = timestamp();

        properties.insert(CREATED_AT.to_string(), now.clone().into());
        properties.insert(UPDATED_AT.to_string(), now.into());

        let node = Node {
            id: id.clone(),
            node_type,
            properties,
        };

        let index = self.graph.add_node(node.clone());
        self.node_map.insert(id.clone(), index);
        self.type_index.entry(node_type).or_default().push(index);
        self.metrics.nodes_created += 1;

        debug!("Node created: {} ({})", node_type, id);
        node
    }

    /// Create a node from an externally supplied type name
    pub fn create_node_by_name(&mut self, type_name: &str, properties: Properties) -> Result<Node> {
        let node_type: NodeType = type_name.parse()?;
        Ok(self.create_node(node_type, properties))
    }

    pub fn create_sovereign(&mut self, fields: NewSovereign) -> Node {
        self.create_node(NodeType::Sovereign, fields.into_properties())
    }

    pub fn create_scroll(&mut self, fields: NewScroll) -> Node {
        self.create_node(NodeType::Scroll, fields.into_properties())
    }

    pub fn create_nft(&mut self, fields: NewNft) -> Node {
        self.create_node(NodeType::Nft, fields.into_properties())
    }

    pub fn create_decree(&mut self, fields: NewDecree) -> Node {
        self.create_node(NodeType::Decree, fields.into_properties())
    }

    pub fn create_anchor(&mut self, fields: NewAnchor) -> Node {
        self.create_node(NodeType::Anchor, fields.into_properties())
    }

    /// Create a directed relationship between two existing nodes
    pub fn create_relationship(
        &mut self,
        from_id: &str,
        to_id: &str,
        rel_type: RelationshipType,
        mut properties: Properties,
    ) -> Result<Relationship> {
        let from_index = self.require_node(from_id)?;
        let to_index = self.require_node(to_id)?;

        properties.insert(CREATED_AT.to_string(), timestamp().into());

        let relationship = Relationship {
            id: format!("REL-{}", Uuid::new_v4().simple()),
            rel_type,
            from: from_id.to_string(),
            to: to_id.to_string(),
            properties,
        };

        self.graph
            .add_edge(from_index, to_index, relationship.clone());
        self.metrics.relationships_created += 1;

        debug!("Relationship created: {} -[{}]-> {}", from_id, rel_type, to_id);
        Ok(relationship)
    }

    /// Create a relationship from an externally supplied type name.
    /// The type is checked before the endpoints.
    pub fn create_relationship_by_name(
        &mut self,
        from_id: &str,
        to_id: &str,
        type_name: &str,
        properties: Properties,
    ) -> Result<Relationship> {
        let rel_type: RelationshipType = type_name.parse()?;
        self.create_relationship(from_id, to_id, rel_type, properties)
    }

    /// Link consecutive nodes: `ids[0] -> ids[1] -> ... -> ids[n-1]`.
    ///
    /// Each edge carries an `order` property starting at 1. Creation stops
    /// at the first failing edge; earlier edges stay in the store.
    pub fn create_lineage_chain<S: AsRef<str>>(
        &mut self,
        node_ids: &[S],
        rel_type: RelationshipType,
    ) -> std::result::Result<Vec<Relationship>, ChainError> {
        info!("Creating lineage chain with {} nodes", node_ids.len());

        let mut chain = Vec::with_capacity(node_ids.len().saturating_sub(1));

        for (i, pair) in node_ids.windows(2).enumerate() {
            let order = props([("order", i + 1)]);
            match self.create_relationship(pair[0].as_ref(), pair[1].as_ref(), rel_type, order) {
                Ok(relationship) => chain.push(relationship),
                Err(source) => {
                    return Err(ChainError {
                        created: chain,
                        source,
                    })
                }
            }
        }

        info!("Lineage chain created with {} relationships", chain.len());
        Ok(chain)
    }

    pub fn query_node_by_id(&mut self, node_id: &str) -> Option<Node> {
        self.metrics.queries_executed += 1;
        self.node(node_id).cloned()
    }

    /// All nodes of a type in insertion order
    pub fn query_nodes_by_type(&mut self, node_type: NodeType) -> Vec<Node> {
        self.take_nodes_by_type(node_type, usize::MAX)
    }

    /// First `limit` nodes of a type; `None` uses `queries.default_limit`
    pub fn query_nodes_by_type_limited(
        &mut self,
        node_type: NodeType,
        limit: Option<usize>,
    ) -> Vec<Node> {
        let limit = limit.unwrap_or(self.config.queries.default_limit);
        self.take_nodes_by_type(node_type, limit)
    }

    fn take_nodes_by_type(&mut self, node_type: NodeType, limit: usize) -> Vec<Node> {
        self.metrics.queries_executed += 1;

        self.type_index
            .get(&node_type)
            .map(|indices| {
                indices
                    .iter()
                    .take(limit)
                    .map(|&index| self.graph[index].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Relationships touching a node, in creation order
    pub fn query_relationships(
        &mut self,
        node_id: &str,
        direction: TraversalDirection,
    ) -> Vec<Relationship> {
        self.metrics.queries_executed += 1;

        match self.node_map.get(node_id) {
            Some(&index) => self
                .edges_of(index, direction)
                .into_iter()
                .map(|edge| self.graph[edge].clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Breadth-first walk over outgoing relationships, `max_depth` hops inclusive
    pub fn traverse_lineage(&mut self, start_id: &str, max_depth: usize) -> Result<Vec<LineageEntry>> {
        self.traverse_lineage_directed(start_id, max_depth, TraversalDirection::Outgoing)
    }

    pub fn traverse_lineage_directed(
        &mut self,
        start_id: &str,
        max_depth: usize,
        direction: TraversalDirection,
    ) -> Result<Vec<LineageEntry>> {
        let start = self.require_node(start_id)?;

        debug!("Traversing lineage from {} (depth: {})", start_id, max_depth);

        let lineage: Vec<LineageEntry> = GraphTraversal::bfs(self, start, max_depth, direction)
            .into_iter()
            .map(|(index, depth)| LineageEntry {
                node: self.graph[index].clone(),
                depth,
            })
            .collect();

        self.metrics.traversals_completed += 1;
        info!("Lineage traversal complete: {} nodes found", lineage.len());

        Ok(lineage)
    }

    pub fn export_as_cypher(&self) -> String {
        CypherExporter::export(self.graph.node_weights(), self.graph.edge_weights())
    }

    pub fn get_all_nodes(&self) -> Vec<Node> {
        self.graph.node_weights().cloned().collect()
    }

    pub fn get_all_relationships(&self) -> Vec<Relationship> {
        self.graph.edge_weights().cloned().collect()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.get_all_nodes(),
            relationships: self.get_all_relationships(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn relationship_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn get_status(&self) -> StoreStatus {
        StoreStatus {
            connected: true,
            host: format!("{}:{}", self.config.store.host, self.config.store.port),
            database: self.config.store.database.clone(),
            mode: "in-memory".to_string(),
            nodes: NodeCounts {
                total: self.node_count(),
                by_type: self.node_counts_by_type(),
            },
            relationships: self.relationship_count(),
            metrics: self.metrics,
        }
    }

    pub fn get_metrics(&self) -> StoreMetrics {
        self.metrics
    }

    /// Drop every node and relationship and zero the counters
    pub fn clear_all(&mut self) {
        self.graph.clear();
        self.node_map.clear();
        self.type_index.clear();
        self.metrics = StoreMetrics::default();

        info!("All lineage data cleared");
    }

    fn node_counts_by_type(&self) -> BTreeMap<NodeType, usize> {
        self.type_index
            .iter()
            .filter(|(_, indices)| !indices.is_empty())
            .map(|(&node_type, indices)| (node_type, indices.len()))
            .collect()
    }

    pub(crate) fn node(&self, node_id: &str) -> Option<&Node> {
        self.node_map.get(node_id).map(|&index| &self.graph[index])
    }

    pub(crate) fn require_node(&self, node_id: &str) -> Result<NodeIndex> {
        self.node_map
            .get(node_id)
            .copied()
            .ok_or_else(|| LineageError::node_not_found(node_id))
    }

    /// Edge indices incident to a node in creation order, each listed once
    pub(crate) fn edges_of(&self, index: NodeIndex, direction: TraversalDirection) -> Vec<EdgeIndex> {
        let outgoing = self.graph.edges_directed(index, Direction::Outgoing);
        let incoming = self.graph.edges_directed(index, Direction::Incoming);

        let mut edges: Vec<EdgeIndex> = match direction {
            TraversalDirection::Outgoing => outgoing.map(|edge| edge.id()).collect(),
            TraversalDirection::Incoming => incoming.map(|edge| edge.id()).collect(),
            TraversalDirection::Both => outgoing.chain(incoming).map(|edge| edge.id()).collect(),
        };

        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// The endpoint of `edge` that is not `from` (or `from` itself for a self loop)
    pub(crate) fn neighbor_via(&self, edge: EdgeIndex, from: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edge_endpoints(edge)
            .map(|(source, target)| if source == from { target } else { source })
    }

    pub(crate) fn out_degree(&self, index: NodeIndex) -> usize {
        self.graph
            .edges_directed(index, Direction::Outgoing)
            .count()
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
