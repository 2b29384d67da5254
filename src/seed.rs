use crate::error::{LineageError, Result};
use crate::lineage::LineageStore;
use crate::types::*;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Declarative description of nodes and relationships to load into a store.
///
/// Entries reference each other by `key`, a name local to the document.
/// Store ids are allocated during `apply`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub nodes: Vec<SeedNode>,
    #[serde(default)]
    pub relationships: Vec<SeedRelationship>,
    #[serde(default)]
    pub chains: Vec<SeedChain>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedNode {
    pub key: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRelationship {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedChain {
    pub keys: Vec<String>,
    #[serde(rename = "type", default = "default_chain_type")]
    pub rel_type: String,
}

fn default_chain_type() -> String {
    RelationshipType::EvolvedFrom.as_str().to_string()
}

impl SeedDocument {
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read seed file: {:?}", path))?;

        Self::from_yaml_str(&content).with_context(|| format!("Failed to parse seed file: {:?}", path))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Create every entry in document order and return the key -> id map.
    ///
    /// Stops at the first invalid entry; entries created before it remain.
    pub fn apply(&self, store: &mut LineageStore) -> Result<HashMap<String, String>> {
        let mut ids: HashMap<String, String> = HashMap::new();

        for seed in &self.nodes {
            if ids.contains_key(&seed.key) {
                return Err(LineageError::InvalidArgument(format!(
                    "Duplicate seed key: {}",
                    seed.key
                )));
            }
            let node = store.create_node_by_name(&seed.node_type, seed.properties.clone())?;
            debug!("Seeded {} as {}", seed.key, node.id);
            ids.insert(seed.key.clone(), node.id);
        }

        for seed in &self.relationships {
            let from = resolve(&ids, &seed.from)?;
            let to = resolve(&ids, &seed.to)?;
            store.create_relationship_by_name(from, to, &seed.rel_type, seed.properties.clone())?;
        }

        for chain in &self.chains {
            let rel_type: RelationshipType = chain.rel_type.parse()?;
            let chain_ids = chain
                .keys
                .iter()
                .map(|key| resolve(&ids, key).map(str::to_string))
                .collect::<Result<Vec<String>>>()?;
            store
                .create_lineage_chain(&chain_ids, rel_type)
                .map_err(|e| e.source)?;
        }

        info!(
            "Seed applied: {} nodes, {} relationships, {} chains",
            self.nodes.len(),
            self.relationships.len(),
            self.chains.len()
        );
        Ok(ids)
    }

    /// Small built-in lineage used when no seed file is given
    pub fn demo() -> Self {
        let node = |key: &str, node_type: NodeType, properties: Properties| SeedNode {
            key: key.to_string(),
            node_type: node_type.as_str().to_string(),
            properties,
        };
        let link = |from: &str, to: &str, rel_type: RelationshipType| SeedRelationship {
            from: from.to_string(),
            to: to.to_string(),
            rel_type: rel_type.as_str().to_string(),
            properties: Properties::new(),
        };

        SeedDocument {
            nodes: vec![
                node(
                    "sovereign",
                    NodeType::Sovereign,
                    NewSovereign {
                        address: DEMO_ADDRESS.to_string(),
                        name: Some("Genesis Sovereign".to_string()),
                        sovereignty_score: Some(85),
                        ..Default::default()
                    }
                    .into_properties(),
                ),
                node(
                    "genesis",
                    NodeType::Scroll,
                    NewScroll {
                        scroll_id: Some("SCROLL-001".to_string()),
                        title: Some("Genesis Scroll".to_string()),
                        ..Default::default()
                    }
                    .into_properties(),
                ),
                node(
                    "exodus",
                    NodeType::Scroll,
                    NewScroll {
                        scroll_id: Some("SCROLL-002".to_string()),
                        title: Some("Second Scroll".to_string()),
                        resonance: Some(0.8),
                        ..Default::default()
                    }
                    .into_properties(),
                ),
                node(
                    "token",
                    NodeType::Nft,
                    NewNft {
                        token_id: Some("1".to_string()),
                        contract_address: Some("0xabcdef".to_string()),
                        tier: Some("GOLD".to_string()),
                        ..Default::default()
                    }
                    .into_properties(),
                ),
                node(
                    "decree",
                    NodeType::Decree,
                    NewDecree {
                        decree_id: Some("VD-001".to_string()),
                        decree_type: Some("affirmation".to_string()),
                        resonance: Some(0.95),
                        ..Default::default()
                    }
                    .into_properties(),
                ),
                node(
                    "anchor",
                    NodeType::Anchor,
                    NewAnchor {
                        anchor_id: Some("TSA-001".to_string()),
                        grounded: Some(true),
                        stability: Some(1.0),
                        ..Default::default()
                    }
                    .into_properties(),
                ),
            ],
            relationships: vec![
                link("sovereign", "genesis", RelationshipType::Created),
                link("sovereign", "token", RelationshipType::Owns),
                link("sovereign", "decree", RelationshipType::Created),
                link("decree", "anchor", RelationshipType::AnchoredBy),
            ],
            chains: vec![SeedChain {
                keys: vec!["genesis".to_string(), "exodus".to_string()],
                rel_type: RelationshipType::EvolvedFrom.as_str().to_string(),
            }],
        }
    }
}

pub const DEMO_ADDRESS: &str = "0xABC";

fn resolve<'a>(ids: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    ids.get(key)
        .map(String::as_str)
        .ok_or_else(|| LineageError::NotFound(format!("seed key {}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SEED: &str = r#"
nodes:
  - key: ruler
    type: Sovereign
    properties:
      address: "0xSEED"
      sovereignty_score: 42
  - key: first
    type: Scroll
  - key: second
    type: Scroll
    properties:
      title: Second
relationships:
  - from: ruler
    to: first
    type: CREATED
chains:
  - keys: [first, second]
"#;

    #[test]
    fn test_apply_yaml_seed() {
        let seed = SeedDocument::from_yaml_str(SEED).unwrap();
        let mut store = LineageStore::new();
        let ids = seed.apply(&mut store).unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(store.node_count(), 3);
        assert_eq!(store.relationship_count(), 2);

        let chain = store.find_sovereignty_chain("0xSEED").unwrap();
        assert_eq!(chain.total_nodes, 3);
        assert_eq!(chain.max_depth, 2);

        let second = store.query_node_by_id(&ids["second"]).unwrap();
        assert_eq!(second.property("title").and_then(|v| v.as_str()), Some("Second"));

        let evolved = store.query_relationships(&ids["first"], TraversalDirection::Outgoing);
        assert_eq!(evolved[0].rel_type, RelationshipType::EvolvedFrom);
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let seed = SeedDocument {
            relationships: vec![SeedRelationship {
                from: "nobody".to_string(),
                to: "nowhere".to_string(),
                rel_type: "OWNS".to_string(),
                properties: Properties::new(),
            }],
            ..Default::default()
        };

        assert!(seed.apply(&mut LineageStore::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_bad_type_is_invalid_argument() {
        let seed = SeedDocument::from_yaml_str("nodes:\n  - key: x\n    type: Wizard\n").unwrap();
        assert!(seed.apply(&mut LineageStore::new()).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let seed =
            SeedDocument::from_yaml_str("nodes:\n  - {key: x, type: Scroll}\n  - {key: x, type: NFT}\n")
                .unwrap();
        let mut store = LineageStore::new();

        assert!(seed.apply(&mut store).unwrap_err().is_invalid_argument());
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_demo_seed() {
        let mut store = LineageStore::new();
        SeedDocument::demo().apply(&mut store).unwrap();

        let metrics = store.get_sovereign_scalability_metrics(DEMO_ADDRESS).unwrap();
        assert_eq!(metrics.total_lineage_nodes, 6);
        assert_eq!(metrics.out_degree, 3);
        assert_eq!(metrics.sovereignty_score, 85.0);
        assert_eq!(metrics.node_types.get(&NodeType::Scroll), Some(&2));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let seed = SeedDocument::load_from_file(file.path()).await.unwrap();
        assert_eq!(seed.nodes.len(), 3);
        assert_eq!(seed.chains[0].rel_type, "EVOLVED_FROM");
    }
}
