use crate::error::{ChainError, Result};
use crate::lineage::graph::LineageStore;
use crate::types::*;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Change notification published after every successful write.
///
/// Events are sent while the write lock is still held, so subscribers see
/// them in the order the writes were applied.
#[derive(Debug, Clone, PartialEq)]
pub enum LineageEvent {
    NodeCreated(Node),
    RelationshipCreated(Relationship),
    Cleared,
}

/// Cloneable handle for callers that share one store across tasks.
///
/// All state sits behind a single `RwLock`; writes (and counted queries,
/// which bump metrics) take the write half.
#[derive(Debug, Clone)]
pub struct SharedLineageStore {
    inner: Arc<RwLock<LineageStore>>,
    event_sender: broadcast::Sender<LineageEvent>,
}

impl SharedLineageStore {
    pub fn new(store: LineageStore) -> Self {
        let (event_sender, _) = broadcast::channel(1000);

        Self {
            inner: Arc::new(RwLock::new(store)),
            event_sender,
        }
    }

    /// Subscribe to change events
    pub fn subscribe(&self) -> broadcast::Receiver<LineageEvent> {
        self.event_sender.subscribe()
    }

    fn publish(&self, event: LineageEvent) {
        match self.event_sender.send(event) {
            Ok(subscriber_count) => {
                debug!("Lineage event sent to {} subscribers", subscriber_count);
            }
            Err(_) => {
                debug!("No active subscribers for lineage event");
            }
        }
    }

    /// Run a closure against a shared borrow of the store
    pub async fn read<R>(&self, f: impl FnOnce(&LineageStore) -> R) -> R {
        let store = self.inner.read().await;
        f(&*store)
    }

    /// Run a closure against an exclusive borrow of the store.
    /// No events are published for changes made here.
    pub async fn write<R>(&self, f: impl FnOnce(&mut LineageStore) -> R) -> R {
        let mut store = self.inner.write().await;
        f(&mut *store)
    }

    pub async fn create_node(&self, node_type: NodeType, properties: Properties) -> Node {
        let mut store = self.inner.write().await;
        let node = store.create_node(node_type, properties);
        self.publish(LineageEvent::NodeCreated(node.clone()));
        node
    }

    pub async fn create_node_by_name(&self, type_name: &str, properties: Properties) -> Result<Node> {
        let mut store = self.inner.write().await;
        let node = store.create_node_by_name(type_name, properties)?;
        self.publish(LineageEvent::NodeCreated(node.clone()));
        Ok(node)
    }

    pub async fn create_relationship(
        &self,
        from_id: &str,
        to_id: &str,
        rel_type: RelationshipType,
        properties: Properties,
    ) -> Result<Relationship> {
        let mut store = self.inner.write().await;
        let relationship = store.create_relationship(from_id, to_id, rel_type, properties)?;
        self.publish(LineageEvent::RelationshipCreated(relationship.clone()));
        Ok(relationship)
    }

    pub async fn create_lineage_chain(
        &self,
        node_ids: &[String],
        rel_type: RelationshipType,
    ) -> std::result::Result<Vec<Relationship>, ChainError> {
        let mut store = self.inner.write().await;
        let result = store.create_lineage_chain(node_ids, rel_type);

        let created = match &result {
            Ok(chain) => chain,
            Err(e) => &e.created,
        };
        for relationship in created {
            self.publish(LineageEvent::RelationshipCreated(relationship.clone()));
        }

        result
    }

    pub async fn query_node_by_id(&self, node_id: &str) -> Option<Node> {
        self.inner.write().await.query_node_by_id(node_id)
    }

    pub async fn query_nodes_by_type(&self, node_type: NodeType) -> Vec<Node> {
        self.inner.write().await.query_nodes_by_type(node_type)
    }

    pub async fn query_relationships(
        &self,
        node_id: &str,
        direction: TraversalDirection,
    ) -> Vec<Relationship> {
        self.inner
            .write()
            .await
            .query_relationships(node_id, direction)
    }

    pub async fn traverse_lineage(&self, start_id: &str, max_depth: usize) -> Result<Vec<LineageEntry>> {
        self.inner.write().await.traverse_lineage(start_id, max_depth)
    }

    pub async fn find_sovereignty_chain(&self, address: &str) -> Option<SovereigntyChain> {
        self.inner.write().await.find_sovereignty_chain(address)
    }

    pub async fn get_sovereign_scalability_metrics(&self, address: &str) -> Option<ScalabilityMetrics> {
        self.inner
            .write()
            .await
            .get_sovereign_scalability_metrics(address)
    }

    pub async fn export_as_cypher(&self) -> String {
        self.inner.read().await.export_as_cypher()
    }

    pub async fn get_status(&self) -> StoreStatus {
        self.inner.read().await.get_status()
    }

    pub async fn get_metrics(&self) -> StoreMetrics {
        self.inner.read().await.get_metrics()
    }

    pub async fn clear_all(&self) {
        let mut store = self.inner.write().await;
        store.clear_all();
        self.publish(LineageEvent::Cleared);
    }
}

impl Default for SharedLineageStore {
    fn default() -> Self {
        Self::new(LineageStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_events_follow_writes() {
        let shared = SharedLineageStore::default();
        let mut events = shared.subscribe();

        let a = shared.create_node(NodeType::Sovereign, props([("address", "0xE")])).await;
        let b = shared.create_node_by_name("Scroll", Properties::new()).await.unwrap();
        let rel = shared
            .create_relationship(&a.id, &b.id, RelationshipType::Created, Properties::new())
            .await
            .unwrap();
        shared.clear_all().await;

        assert_eq!(events.recv().await.unwrap(), LineageEvent::NodeCreated(a));
        assert_eq!(events.recv().await.unwrap(), LineageEvent::NodeCreated(b));
        assert_eq!(events.recv().await.unwrap(), LineageEvent::RelationshipCreated(rel));
        assert_eq!(events.recv().await.unwrap(), LineageEvent::Cleared);
    }

    #[tokio::test]
    async fn test_failed_writes_publish_nothing() {
        let shared = SharedLineageStore::default();
        let mut events = shared.subscribe();

        assert!(shared
            .create_node_by_name("Ghost", Properties::new())
            .await
            .unwrap_err()
            .is_invalid_argument());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_partial_chain_publishes_created_edges() {
        let shared = SharedLineageStore::default();
        let a = shared.create_node(NodeType::Scroll, Properties::new()).await;
        let b = shared.create_node(NodeType::Scroll, Properties::new()).await;
        let mut events = shared.subscribe();

        let ids = vec![a.id, b.id, "missing".to_string()];
        let err = shared
            .create_lineage_chain(&ids, RelationshipType::EvolvedFrom)
            .await
            .unwrap_err();

        assert_eq!(err.created.len(), 1);
        assert!(matches!(
            events.recv().await.unwrap(),
            LineageEvent::RelationshipCreated(_)
        ));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_clones_share_state_across_tasks() {
        let shared = SharedLineageStore::default();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = shared.clone();
                tokio::spawn(async move {
                    store.create_node(NodeType::Nft, props([("token_id", i)])).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(shared.get_metrics().await.nodes_created, 8);
        assert_eq!(shared.query_nodes_by_type(NodeType::Nft).await.len(), 8);
        assert_eq!(shared.read(|store| store.node_count()).await, 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_event_log_replays_to_final_state() {
        let shared = SharedLineageStore::default();
        let mut events = shared.subscribe();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = shared.clone();
                tokio::spawn(async move {
                    if i % 4 == 3 {
                        store.clear_all().await;
                    } else {
                        let a = store.create_node(NodeType::Scroll, Properties::new()).await;
                        let b = store.create_node(NodeType::Nft, Properties::new()).await;
                        // a concurrent clear may have removed either endpoint
                        let _ = store
                            .create_relationship(&a.id, &b.id, RelationshipType::LinkedTo, Properties::new())
                            .await;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let mut live_nodes = HashSet::new();
        let mut live_relationships = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                LineageEvent::NodeCreated(node) => {
                    live_nodes.insert(node.id);
                }
                LineageEvent::RelationshipCreated(rel) => {
                    assert!(live_nodes.contains(&rel.from));
                    assert!(live_nodes.contains(&rel.to));
                    live_relationships += 1;
                }
                LineageEvent::Cleared => {
                    live_nodes.clear();
                    live_relationships = 0;
                }
            }
        }

        let (nodes, relationships) = shared
            .read(|store| (store.node_count(), store.relationship_count()))
            .await;
        assert_eq!(live_nodes.len(), nodes);
        assert_eq!(live_relationships, relationships);
    }

    #[test]
    fn test_blocking_use_from_sync_code() {
        let shared = SharedLineageStore::default();
        let status = tokio_test::block_on(async {
            shared.create_node(NodeType::Anchor, Properties::new()).await;
            shared.get_status().await
        });
        assert_eq!(status.nodes.total, 1);
    }
}
