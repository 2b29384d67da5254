use crate::error::LineageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Core types for the sovereign lineage graph

/// Open property bag attached to nodes and relationships
pub type Properties = BTreeMap<String, PropertyValue>;

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Sovereign,
    Scroll,
    #[serde(rename = "NFT")]
    Nft,
    Decree,
    Anchor,
    Dimension,
    Resonance,
    Lineage,
}

impl NodeType {
    pub const ALL: [NodeType; 8] = [
        NodeType::Sovereign,
        NodeType::Scroll,
        NodeType::Nft,
        NodeType::Decree,
        NodeType::Anchor,
        NodeType::Dimension,
        NodeType::Resonance,
        NodeType::Lineage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Sovereign => "Sovereign",
            NodeType::Scroll => "Scroll",
            NodeType::Nft => "NFT",
            NodeType::Decree => "Decree",
            NodeType::Anchor => "Anchor",
            NodeType::Dimension => "Dimension",
            NodeType::Resonance => "Resonance",
            NodeType::Lineage => "Lineage",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LineageError::invalid_node_type(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Owns,
    Created,
    Inherits,
    LinkedTo,
    ResonatesWith,
    AnchoredBy,
    EvolvedFrom,
    SynchronizedWith,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 8] = [
        RelationshipType::Owns,
        RelationshipType::Created,
        RelationshipType::Inherits,
        RelationshipType::LinkedTo,
        RelationshipType::ResonatesWith,
        RelationshipType::AnchoredBy,
        RelationshipType::EvolvedFrom,
        RelationshipType::SynchronizedWith,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Owns => "OWNS",
            RelationshipType::Created => "CREATED",
            RelationshipType::Inherits => "INHERITS",
            RelationshipType::LinkedTo => "LINKED_TO",
            RelationshipType::ResonatesWith => "RESONATES_WITH",
            RelationshipType::AnchoredBy => "ANCHORED_BY",
            RelationshipType::EvolvedFrom => "EVOLVED_FROM",
            RelationshipType::SynchronizedWith => "SYNCHRONIZED_WITH",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationshipType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LineageError::invalid_relationship_type(s))
    }
}

/// A single property value. Only primitives are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Integer(value as i64)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Integer(value as i64)
    }
}

impl From<usize> for PropertyValue {
    fn from(value: usize) -> Self {
        PropertyValue::Integer(value as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

/// Build a `Properties` bag from key/value pairs.
pub fn props<K, V, I>(pairs: I) -> Properties
where
    K: Into<String>,
    V: Into<PropertyValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub properties: Properties,
}

impl Node {
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    #[serde(rename = "type")]
    pub rel_type: RelationshipType,
    pub from: String,
    pub to: String,
    pub properties: Properties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalDirection {
    Outgoing,
    Incoming,
    Both,
}

impl FromStr for TraversalDirection {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outgoing" => Ok(TraversalDirection::Outgoing),
            "incoming" => Ok(TraversalDirection::Incoming),
            "both" => Ok(TraversalDirection::Both),
            other => Err(LineageError::InvalidArgument(format!(
                "Invalid traversal direction: {}",
                other
            ))),
        }
    }
}

/// A node reached during traversal together with its hop distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEntry {
    pub node: Node,
    pub depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SovereigntyChain {
    pub sovereign: Node,
    pub lineage: Vec<LineageEntry>,
    pub total_nodes: usize,
    pub max_depth: usize,
    pub types: BTreeMap<NodeType, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalabilityMetrics {
    pub address: String,
    pub total_lineage_nodes: usize,
    pub max_lineage_depth: usize,
    pub node_types: BTreeMap<NodeType, usize>,
    pub out_degree: usize,
    pub sovereignty_score: f64,
    pub scalability_factor: f64,
    pub network_centrality: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetrics {
    pub nodes_created: u64,
    pub relationships_created: u64,
    pub queries_executed: u64,
    pub traversals_completed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCounts {
    pub total: usize,
    pub by_type: BTreeMap<NodeType, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStatus {
    pub connected: bool,
    pub host: String,
    pub database: String,
    pub mode: String,
    pub nodes: NodeCounts,
    pub relationships: usize,
    pub metrics: StoreMetrics,
}

/// Full dump of the store contents in insertion order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
}

// Typed node constructors. Each maps caller fields onto snake_case property
// keys; `extra` is merged afterwards.

#[derive(Debug, Clone, Default)]
pub struct NewSovereign {
    pub address: String,
    pub name: Option<String>,
    pub sovereignty_score: Option<i64>,
    pub frequency: Option<f64>,
    pub dimension: Option<i64>,
    pub extra: Properties,
}

#[derive(Debug, Clone, Default)]
pub struct NewScroll {
    pub scroll_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub frequency: Option<f64>,
    pub resonance: Option<f64>,
    pub extra: Properties,
}

#[derive(Debug, Clone, Default)]
pub struct NewNft {
    pub token_id: Option<String>,
    pub contract_address: Option<String>,
    pub metadata_uri: Option<String>,
    pub frequency: Option<f64>,
    pub tier: Option<String>,
    pub extra: Properties,
}

#[derive(Debug, Clone, Default)]
pub struct NewDecree {
    pub decree_id: Option<String>,
    pub decree_type: Option<String>,
    pub content: Option<String>,
    pub frequency: Option<f64>,
    pub resonance: Option<f64>,
    pub extra: Properties,
}

#[derive(Debug, Clone, Default)]
pub struct NewAnchor {
    pub anchor_id: Option<String>,
    pub frequency: Option<f64>,
    pub grounded: Option<bool>,
    pub stability: Option<f64>,
    pub extra: Properties,
}

pub const DEFAULT_FREQUENCY: f64 = 528.0;

fn put<V: Into<PropertyValue>>(properties: &mut Properties, key: &str, value: Option<V>) {
    if let Some(value) = value {
        properties.insert(key.to_string(), value.into());
    }
}

fn with_extra(mut properties: Properties, extra: Properties) -> Properties {
    properties.extend(extra);
    properties
}

impl NewSovereign {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn into_properties(self) -> Properties {
        let mut properties = Properties::new();
        properties.insert("address".to_string(), self.address.into());
        properties.insert(
            "name".to_string(),
            self.name
                .unwrap_or_else(|| "Anonymous Sovereign".to_string())
                .into(),
        );
        properties.insert(
            "sovereignty_score".to_string(),
            self.sovereignty_score.unwrap_or(0).into(),
        );
        properties.insert(
            "frequency".to_string(),
            self.frequency.unwrap_or(DEFAULT_FREQUENCY).into(),
        );
        properties.insert("dimension".to_string(), self.dimension.unwrap_or(1).into());
        with_extra(properties, self.extra)
    }
}

impl NewScroll {
    pub fn into_properties(self) -> Properties {
        let mut properties = Properties::new();
        put(&mut properties, "scroll_id", self.scroll_id);
        put(&mut properties, "title", self.title);
        put(&mut properties, "content", self.content);
        put(
            &mut properties,
            "frequency",
            Some(self.frequency.unwrap_or(DEFAULT_FREQUENCY)),
        );
        put(&mut properties, "resonance", Some(self.resonance.unwrap_or(0.0)));
        with_extra(properties, self.extra)
    }
}

impl NewNft {
    pub fn into_properties(self) -> Properties {
        let mut properties = Properties::new();
        put(&mut properties, "token_id", self.token_id);
        put(&mut properties, "contract_address", self.contract_address);
        put(&mut properties, "metadata_uri", self.metadata_uri);
        put(
            &mut properties,
            "frequency",
            Some(self.frequency.unwrap_or(DEFAULT_FREQUENCY)),
        );
        put(
            &mut properties,
            "tier",
            Some(self.tier.unwrap_or_else(|| "BRONZE".to_string())),
        );
        with_extra(properties, self.extra)
    }
}

impl NewDecree {
    pub fn into_properties(self) -> Properties {
        let mut properties = Properties::new();
        put(&mut properties, "decree_id", self.decree_id);
        put(&mut properties, "decree_type", self.decree_type);
        put(&mut properties, "content", self.content);
        put(&mut properties, "frequency", self.frequency);
        put(&mut properties, "resonance", self.resonance);
        with_extra(properties, self.extra)
    }
}

impl NewAnchor {
    pub fn into_properties(self) -> Properties {
        let mut properties = Properties::new();
        put(&mut properties, "anchor_id", self.anchor_id);
        put(&mut properties, "frequency", self.frequency);
        put(&mut properties, "grounded", self.grounded);
        put(&mut properties, "stability", self.stability);
        with_extra(properties, self.extra)
    }
}
