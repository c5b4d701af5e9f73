//! On-disk network documents.
//!
//! Two formats are supported:
//!
//! - **JSON**: `{ "nodes": [{"name": "A", "label": "A"}], "edges": [["A", "B"]] }`.
//!   Every edge endpoint must be declared in `nodes`.
//! - **Edge list**: one `parent child` pair per line, `#` starts a comment,
//!   a line with a single name declares an isolated node. Names double as
//!   labels.
//!
//! Both parse into a [`NetworkDocument`], which converts to and from a
//! [`PhyloNetwork`].

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::network::{NodeData, PhyloNetwork};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid JSON document: {0}")]
    Json(String),

    #[error("line {line}: expected `parent child`, got {content:?}")]
    Syntax { line: usize, content: String },

    #[error("node {name:?} is declared more than once")]
    DuplicateNode { name: String },

    #[error("edge references undeclared node {name:?}")]
    UndeclaredNode { name: String },
}

impl DocumentError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidDocument
    }
}

/// One declared node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A network as written on disk: named nodes plus `(parent, child)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDocument {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

/// A network built from a document, with the name of every node.
#[derive(Debug, Clone)]
pub struct NamedNetwork {
    pub network: PhyloNetwork,
    pub by_name: HashMap<String, NodeIndex>,
}

impl NetworkDocument {
    /// Parse the JSON format.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Json`] if the text is not a valid document.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(text).map_err(|e| DocumentError::Json(e.to_string()))
    }

    /// Parse the edge-list format.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Syntax`] for a line with more than two names.
    pub fn from_edge_list(text: &str) -> Result<Self, DocumentError> {
        let mut doc = Self::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut declare = |doc: &mut Self, name: &str| {
            if seen.insert(name.to_string()) {
                doc.nodes.push(NodeEntry {
                    name: name.to_string(),
                    label: Some(name.to_string()),
                });
            }
        };

        for (i, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let names: Vec<&str> = line.split_whitespace().collect();
            match names.as_slice() {
                [single] => declare(&mut doc, *single),
                [parent, child] => {
                    declare(&mut doc, *parent);
                    declare(&mut doc, *child);
                    doc.edges.push(((*parent).to_string(), (*child).to_string()));
                }
                _ => {
                    return Err(DocumentError::Syntax {
                        line: i + 1,
                        content: raw.to_string(),
                    });
                }
            }
        }
        Ok(doc)
    }

    /// Build the network. Nodes are added in declaration order, edges in
    /// document order (parallel edges are kept).
    ///
    /// # Errors
    ///
    /// [`DocumentError::DuplicateNode`] or [`DocumentError::UndeclaredNode`].
    pub fn to_network(&self) -> Result<NamedNetwork, DocumentError> {
        let mut network = PhyloNetwork::new();
        let mut by_name: HashMap<String, NodeIndex> = HashMap::with_capacity(self.nodes.len());

        for entry in &self.nodes {
            if by_name.contains_key(&entry.name) {
                return Err(DocumentError::DuplicateNode {
                    name: entry.name.clone(),
                });
            }
            let v = network.add_node(NodeData::with_label(entry.label.clone()));
            by_name.insert(entry.name.clone(), v);
        }

        let lookup = |name: &String| {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| DocumentError::UndeclaredNode { name: name.clone() })
        };
        let edges = self
            .edges
            .iter()
            .map(|(parent, child)| -> Result<_, DocumentError> {
                Ok((lookup(parent)?, lookup(child)?))
            })
            .collect::<Result<Vec<_>, DocumentError>>()?;
        for (parent, child) in edges {
            network.add_edge(parent, child);
        }

        Ok(NamedNetwork { network, by_name })
    }

    /// Describe `net` as a document.
    ///
    /// A node is named after its label when that label is unique and safe
    /// for the edge-list format; otherwise it gets `_<index>`.
    #[must_use]
    pub fn from_network(net: &PhyloNetwork) -> Self {
        let names = node_names(net);
        let nodes = net
            .nodes()
            .map(|v| NodeEntry {
                name: names[&v].clone(),
                label: net.label(v).map(str::to_string),
            })
            .collect();
        let edges = net
            .edges()
            .filter_map(|e| net.edge_endpoints(e))
            .map(|(parent, child)| (names[&parent].clone(), names[&child].clone()))
            .collect();
        Self { nodes, edges }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(|e| DocumentError::Json(e.to_string()))
    }

    /// Edge-list text. Labels that differ from node names are not kept.
    #[must_use]
    pub fn to_edge_list(&self) -> String {
        let mut out = String::from("# parent child\n");
        let mut touched: HashSet<&str> = HashSet::new();
        for (parent, child) in &self.edges {
            touched.insert(parent.as_str());
            touched.insert(child.as_str());
            let _ = writeln!(out, "{parent} {child}");
        }
        for entry in &self.nodes {
            if !touched.contains(entry.name.as_str()) {
                let _ = writeln!(out, "{}", entry.name);
            }
        }
        out
    }
}

fn node_names(net: &PhyloNetwork) -> HashMap<NodeIndex, String> {
    let mut label_counts: HashMap<&str, usize> = HashMap::new();
    for v in net.nodes() {
        if let Some(label) = net.label(v) {
            *label_counts.entry(label).or_default() += 1;
        }
    }

    let usable = |label: &str| {
        label_counts.get(label) == Some(&1)
            && !label.contains('#')
            && !label.chars().any(char::is_whitespace)
    };

    let mut taken: HashSet<String> = net
        .nodes()
        .filter_map(|v| net.label(v))
        .filter(|&label| usable(label))
        .map(str::to_string)
        .collect();

    net.nodes()
        .map(|v| {
            let name = match net.label(v) {
                Some(label) if usable(label) => label.to_string(),
                _ => {
                    let mut name = format!("_{}", v.index());
                    while !taken.insert(name.clone()) {
                        name.insert(0, '_');
                    }
                    name
                }
            };
            (v, name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_list_skips_comments_and_blank_lines() {
        let doc = NetworkDocument::from_edge_list(
            "# a small network\nR A\nR B   # trailing comment\n\nA H\nB H\nlonely\n",
        )
        .expect("parse");

        let names: Vec<&str> = doc.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["R", "A", "B", "H", "lonely"]);
        assert_eq!(doc.edges.len(), 4);
        assert_eq!(doc.nodes[0].label.as_deref(), Some("R"));
    }

    #[test]
    fn edge_list_rejects_three_names() {
        let err = NetworkDocument::from_edge_list("R A\nA B C\n").expect_err("bad line");
        assert_eq!(
            err,
            DocumentError::Syntax {
                line: 2,
                content: "A B C".to_string()
            }
        );
    }

    #[test]
    fn json_nodes_may_be_unlabelled() {
        let doc = NetworkDocument::from_json(
            r#"{"nodes": [{"name": "r"}, {"name": "x", "label": "X"}], "edges": [["r", "x"]]}"#,
        )
        .expect("parse");
        let named = doc.to_network().expect("build");

        let r = named.by_name["r"];
        assert_eq!(named.network.label(r), None);
        assert_eq!(named.network.label(named.by_name["x"]), Some("X"));
        assert_eq!(named.network.edge_count(), 1);
    }

    #[test]
    fn undeclared_endpoints_are_rejected() {
        let doc = NetworkDocument::from_json(r#"{"nodes": [{"name": "r"}], "edges": [["r", "x"]]}"#)
            .expect("parse");
        assert_eq!(
            doc.to_network().map(|n| n.network.node_count()),
            Err(DocumentError::UndeclaredNode {
                name: "x".to_string()
            })
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let doc = NetworkDocument::from_json(r#"{"nodes": [{"name": "r"}, {"name": "r"}]}"#)
            .expect("parse");
        assert!(matches!(
            doc.to_network(),
            Err(DocumentError::DuplicateNode { .. })
        ));
    }

    #[test]
    fn malformed_json_maps_to_invalid_document() {
        let err = NetworkDocument::from_json("{").expect_err("bad json");
        assert_eq!(err.code(), ErrorCode::InvalidDocument);
    }

    #[test]
    fn unlabelled_and_clashing_nodes_get_index_names() {
        let mut net = PhyloNetwork::new();
        let r = net.add_node(NodeData::default());
        let a = net.add_labelled_node("dup");
        let b = net.add_labelled_node("dup");
        let c = net.add_labelled_node("two words");
        net.add_edge(r, a);
        net.add_edge(r, b);
        net.add_edge(r, c);

        let doc = NetworkDocument::from_network(&net);
        let names: Vec<&str> = doc.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["_0", "_1", "_2", "_3"]);
        assert_eq!(doc.nodes[1].label.as_deref(), Some("dup"));

        let rebuilt = NetworkDocument::from_edge_list(&doc.to_edge_list())
            .expect("parse")
            .to_network()
            .expect("build");
        assert_eq!(rebuilt.network.edge_count(), 3);
    }

    #[test]
    fn json_text_keeps_labels() {
        let net = PhyloNetwork::from_edges(&[("R", "A"), ("R", "B")]);
        let text = NetworkDocument::from_network(&net).to_json().expect("serialize");
        let back = NetworkDocument::from_json(&text)
            .expect("parse")
            .to_network()
            .expect("build");

        assert_eq!(back.network.content_hash(), net.content_hash());
    }
}
