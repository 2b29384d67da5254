use crate::types::{Node, Properties, PropertyValue, Relationship};
use regex::Regex;
use std::sync::OnceLock;

/// Renders the graph as Cypher-style statements for inspection.
///
/// Output looks like what a property-graph database would accept but is not
/// meant to be loaded back into the store.
pub struct CypherExporter;

impl CypherExporter {
    /// One `CREATE` per node followed by one `MATCH ... CREATE` per
    /// relationship, joined by `;\n` and terminated with `;`.
    pub fn export<'a, N, R>(nodes: N, relationships: R) -> String
    where
        N: IntoIterator<Item = &'a Node>,
        R: IntoIterator<Item = &'a Relationship>,
    {
        let statements: Vec<String> = nodes
            .into_iter()
            .map(Self::node_statement)
            .chain(relationships.into_iter().map(Self::relationship_statement))
            .collect();

        if statements.is_empty() {
            return String::new();
        }

        statements.join(";\n") + ";"
    }

    pub fn node_statement(node: &Node) -> String {
        let mut fields = vec![format!("id: {}", quote(&node.id))];
        if !node.properties.is_empty() {
            fields.push(format_properties(&node.properties));
        }

        format!("CREATE (n:{} {{{}}})", node.node_type, fields.join(", "))
    }

    pub fn relationship_statement(relationship: &Relationship) -> String {
        let properties = if relationship.properties.is_empty() {
            String::new()
        } else {
            format!(" {{{}}}", format_properties(&relationship.properties))
        };

        format!(
            "MATCH (a {{id: {}}}), (b {{id: {}}}) CREATE (a)-[r:{}{}]->(b)",
            quote(&relationship.from),
            quote(&relationship.to),
            relationship.rel_type,
            properties
        )
    }
}

fn format_properties(properties: &Properties) -> String {
    properties
        .iter()
        .map(|(key, value)| format!("{}: {}", format_key(key), format_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

fn format_key(key: &str) -> String {
    if identifier_pattern().is_match(key) {
        key.to_string()
    } else {
        format!("`{}`", key.replace('`', "``"))
    }
}

fn format_value(value: &PropertyValue) -> String {
    match value {
        PropertyValue::String(s) => quote(s),
        // NaN and infinities have no Cypher literal
        PropertyValue::Float(x) if !x.is_finite() => "null".to_string(),
        other => other.to_string(),
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::LineageStore;
    use crate::types::*;

    #[test]
    fn test_empty_store_exports_nothing() {
        let store = LineageStore::new();
        assert_eq!(store.export_as_cypher(), "");
    }

    #[test]
    fn test_node_statement_format() {
        let node = Node {
            id: "Sovereign-1".to_string(),
            node_type: NodeType::Sovereign,
            properties: props::<&str, PropertyValue, _>([
                ("address", "0xABC".into()),
                ("sovereignty_score", 85.into()),
                ("grounded", true.into()),
                ("frequency", 528.0.into()),
            ]),
        };

        assert_eq!(
            CypherExporter::node_statement(&node),
            r#"CREATE (n:Sovereign {id: "Sovereign-1", address: "0xABC", frequency: 528, grounded: true, sovereignty_score: 85})"#
        );
    }

    #[test]
    fn test_relationship_statement_format() {
        let relationship = Relationship {
            id: "REL-1".to_string(),
            rel_type: RelationshipType::LinkedTo,
            from: "Scroll-1".to_string(),
            to: "NFT-2".to_string(),
            properties: props([("order", 1)]),
        };

        assert_eq!(
            CypherExporter::relationship_statement(&relationship),
            r#"MATCH (a {id: "Scroll-1"}), (b {id: "NFT-2"}) CREATE (a)-[r:LINKED_TO {order: 1}]->(b)"#
        );

        let bare = Relationship {
            properties: Properties::new(),
            ..relationship
        };
        assert!(CypherExporter::relationship_statement(&bare).ends_with("CREATE (a)-[r:LINKED_TO]->(b)"));
    }

    #[test]
    fn test_strings_and_keys_are_escaped() {
        let node = Node {
            id: "Scroll-1".to_string(),
            node_type: NodeType::Scroll,
            properties: props([("odd key", r#"say "hi" \o/"#)]),
        };

        assert_eq!(
            CypherExporter::node_statement(&node),
            r#"CREATE (n:Scroll {id: "Scroll-1", `odd key`: "say \"hi\" \\o/"})"#
        );
    }

    #[test]
    fn test_store_export_lists_nodes_then_relationships() {
        let mut store = LineageStore::new();
        let sovereign = store.create_sovereign(NewSovereign::new("0xABC"));
        let nft = store.create_nft(NewNft {
            token_id: Some("1".to_string()),
            ..Default::default()
        });
        store
            .create_relationship(&sovereign.id, &nft.id, RelationshipType::Owns, Properties::new())
            .unwrap();

        let cypher = store.export_as_cypher();
        let statements: Vec<&str> = cypher.split(";\n").collect();

        assert_eq!(statements.len(), 3);
        assert!(statements[0].starts_with(&format!("CREATE (n:Sovereign {{id: \"{}\"", sovereign.id)));
        assert!(statements[1].starts_with(&format!("CREATE (n:NFT {{id: \"{}\"", nft.id)));
        assert!(statements[2].contains("-[r:OWNS {createdAt: \""));
        assert!(cypher.ends_with(";"));
    }

    #[test]
    fn test_non_finite_floats_export_as_null() {
        let mut store = LineageStore::new();
        store.create_node(
            NodeType::Decree,
            props([("resonance", f64::NAN), ("power", f64::INFINITY), ("weight", 0.5)]),
        );

        let cypher = store.export_as_cypher();
        assert!(cypher.contains("resonance: null"));
        assert!(cypher.contains("power: null"));
        assert!(cypher.contains("weight: 0.5"));
        assert!(!cypher.contains("NaN"));
        assert!(!cypher.contains("inf"));
    }
}
