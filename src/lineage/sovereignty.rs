use crate::lineage::graph::LineageStore;
use crate::types::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

impl LineageStore {
    /// Collect everything reachable from the sovereign registered at `address`.
    ///
    /// The first `Sovereign` node (insertion order) whose `address` matches is
    /// used. Traversal follows outgoing relationships up to
    /// `traversal.sovereignty_depth` hops.
    pub fn find_sovereignty_chain(&mut self, address: &str) -> Option<SovereigntyChain> {
        info!("Finding sovereignty chain for {}", address);

        let sovereign = self
            .query_nodes_by_type(NodeType::Sovereign)
            .into_iter()
            .find(|node| node.property("address").and_then(PropertyValue::as_str) == Some(address));

        let sovereign = match sovereign {
            Some(node) => node,
            None => {
                debug!("No sovereign registered for {}", address);
                return None;
            }
        };

        let depth = self.config().traversal.sovereignty_depth;
        let lineage = match self.traverse_lineage(&sovereign.id, depth) {
            Ok(lineage) => lineage,
            Err(e) => {
                warn!("Sovereign {} vanished during traversal: {}", sovereign.id, e);
                return None;
            }
        };

        let chain = SovereigntyChain {
            total_nodes: lineage.len(),
            max_depth: lineage.iter().map(|entry| entry.depth).max().unwrap_or(0),
            types: count_node_types(&lineage),
            sovereign,
            lineage,
        };

        info!("Sovereignty chain found: {} nodes", chain.total_nodes);
        Some(chain)
    }

    /// Derived scalability read model for a sovereign address
    pub fn get_sovereign_scalability_metrics(&mut self, address: &str) -> Option<ScalabilityMetrics> {
        let chain = self.find_sovereignty_chain(address)?;
        let index = self.require_node(&chain.sovereign.id).ok()?;

        let out_degree = self.out_degree(index);
        let sovereignty_score = chain
            .sovereign
            .property("sovereignty_score")
            .and_then(PropertyValue::as_f64)
            .unwrap_or(0.0);

        Some(ScalabilityMetrics {
            address: address.to_string(),
            total_lineage_nodes: chain.total_nodes,
            max_lineage_depth: chain.max_depth,
            node_types: chain.types,
            out_degree,
            sovereignty_score,
            scalability_factor: scalability_factor(out_degree, self.config().metrics.link_weight),
            network_centrality: network_centrality(out_degree, self.node_count()),
        })
    }
}

fn count_node_types(lineage: &[LineageEntry]) -> BTreeMap<NodeType, usize> {
    lineage.iter().fold(BTreeMap::new(), |mut counts, entry| {
        *counts.entry(entry.node.node_type).or_insert(0) += 1;
        counts
    })
}

/// Zero with no direct links, strictly increasing with each one
fn scalability_factor(out_degree: usize, link_weight: f64) -> f64 {
    out_degree as f64 * link_weight
}

/// Degree centrality normalised by the other `total_nodes - 1` nodes, clamped to [0, 1]
fn network_centrality(out_degree: usize, total_nodes: usize) -> f64 {
    if total_nodes <= 1 {
        return 0.0;
    }
    (out_degree as f64 / (total_nodes - 1) as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn sovereign(store: &mut LineageStore, address: &str, score: i64) -> Node {
        store.create_sovereign(NewSovereign {
            address: address.to_string(),
            sovereignty_score: Some(score),
            ..Default::default()
        })
    }

    #[test]
    fn test_end_to_end_sovereignty_scenario() {
        let mut store = LineageStore::new();
        let ruler = sovereign(&mut store, "0xABC", 85);
        let scroll = store.create_scroll(NewScroll {
            scroll_id: Some("SCROLL-001".to_string()),
            title: Some("Genesis Scroll".to_string()),
            ..Default::default()
        });
        store
            .create_relationship(&ruler.id, &scroll.id, RelationshipType::Created, Properties::new())
            .unwrap();

        let chain = store.find_sovereignty_chain("0xABC").unwrap();
        assert_eq!(chain.sovereign.id, ruler.id);
        assert_eq!(chain.total_nodes, 2);
        assert_eq!(chain.max_depth, 1);
        assert_eq!(
            chain.types,
            BTreeMap::from([(NodeType::Sovereign, 1), (NodeType::Scroll, 1)])
        );

        let metrics = store.get_sovereign_scalability_metrics("0xABC").unwrap();
        assert_eq!(metrics.address, "0xABC");
        assert_eq!(metrics.total_lineage_nodes, 2);
        assert_eq!(metrics.sovereignty_score, 85.0);
        assert_eq!(metrics.out_degree, 1);
        assert!(metrics.scalability_factor > 0.0);
        assert_eq!(metrics.network_centrality, 1.0);
    }

    #[test]
    fn test_unknown_address_is_absent() {
        let mut store = LineageStore::new();
        sovereign(&mut store, "0x1", 10);

        assert!(store.find_sovereignty_chain("0x2").is_none());
        assert!(store.get_sovereign_scalability_metrics("0x2").is_none());
    }

    #[test]
    fn test_first_matching_sovereign_wins() {
        let mut store = LineageStore::new();
        let first = sovereign(&mut store, "0xDUP", 1);
        sovereign(&mut store, "0xDUP", 2);

        let chain = store.find_sovereignty_chain("0xDUP").unwrap();
        assert_eq!(chain.sovereign.id, first.id);
    }

    #[test]
    fn test_isolated_sovereign_metrics_are_zero() {
        let mut store = LineageStore::new();
        store.create_sovereign(NewSovereign::new("0xLONE"));

        let metrics = store.get_sovereign_scalability_metrics("0xLONE").unwrap();
        assert_eq!(metrics.total_lineage_nodes, 1);
        assert_eq!(metrics.sovereignty_score, 0.0);
        assert_eq!(metrics.scalability_factor, 0.0);
        assert_eq!(metrics.network_centrality, 0.0);
    }

    #[test]
    fn test_missing_score_property_defaults_to_zero() {
        let mut store = LineageStore::new();
        store.create_node(NodeType::Sovereign, props([("address", "0xRAW")]));

        let metrics = store.get_sovereign_scalability_metrics("0xRAW").unwrap();
        assert_eq!(metrics.sovereignty_score, 0.0);
    }

    #[test]
    fn test_scalability_grows_with_links() {
        let mut store = LineageStore::new();
        let ruler = sovereign(&mut store, "0xGROW", 50);
        let mut previous = store
            .get_sovereign_scalability_metrics("0xGROW")
            .unwrap()
            .scalability_factor;

        for _ in 0..5 {
            let nft = store.create_nft(NewNft::default());
            store
                .create_relationship(&ruler.id, &nft.id, RelationshipType::Owns, Properties::new())
                .unwrap();

            let current = store
                .get_sovereign_scalability_metrics("0xGROW")
                .unwrap()
                .scalability_factor;
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn test_centrality_stays_in_range() {
        let mut store = LineageStore::new();
        let ruler = sovereign(&mut store, "0xHUB", 1);
        let other = store.create_anchor(NewAnchor::default());
        store.create_decree(NewDecree::default());

        store
            .create_relationship(&ruler.id, &other.id, RelationshipType::AnchoredBy, Properties::new())
            .unwrap();
        let half = store.get_sovereign_scalability_metrics("0xHUB").unwrap();
        assert_eq!(half.network_centrality, 0.5);

        for _ in 0..4 {
            store
                .create_relationship(&ruler.id, &ruler.id, RelationshipType::SynchronizedWith, Properties::new())
                .unwrap();
        }
        let saturated = store.get_sovereign_scalability_metrics("0xHUB").unwrap();
        assert_eq!(saturated.network_centrality, 1.0);
    }

    #[test]
    fn test_sovereignty_depth_from_config() {
        let mut config = Config::default();
        config.traversal.sovereignty_depth = 1;
        let mut store = LineageStore::with_config(config);

        let ruler = sovereign(&mut store, "0xSHALLOW", 5);
        let a = store.create_scroll(NewScroll::default());
        let b = store.create_scroll(NewScroll::default());
        store
            .create_relationship(&ruler.id, &a.id, RelationshipType::Created, Properties::new())
            .unwrap();
        store
            .create_relationship(&a.id, &b.id, RelationshipType::EvolvedFrom, Properties::new())
            .unwrap();

        let chain = store.find_sovereignty_chain("0xSHALLOW").unwrap();
        assert_eq!(chain.total_nodes, 2);
    }

    #[test]
    fn test_chain_counts_queries_and_traversals() {
        let mut store = LineageStore::new();
        sovereign(&mut store, "0xCOUNT", 1);

        store.find_sovereignty_chain("0xCOUNT").unwrap();
        let metrics = store.get_metrics();
        assert_eq!(metrics.queries_executed, 1);
        assert_eq!(metrics.traversals_completed, 1);
    }
}
