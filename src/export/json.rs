//! JSON export implementation.
//!
//! Exports graph analysis results in JSON format for machine-readable output.

use super::{ExportData, Exporter};
use crate::graph::{NodeKind, NodeMetrics};
use serde::Serialize;
use std::io::{self, Write};

/// JSON exporter implementation.
pub struct JsonExporter;

/// Serializable node for JSON output.
#[derive(Serialize)]
struct JsonNode<'a> {
    name: &'a str,
    dependencies: &'a [String],
    kind: NodeKind,
    #[serde(flatten)]
    metrics: NodeMetrics,
}

/// Serializable edge for JSON output.
#[derive(Serialize)]
struct JsonEdge<'a> {
    from: &'a str,
    to: &'a str,
}

/// Serializable cycle info for JSON output.
#[derive(Serialize)]
struct JsonCycle<'a> {
    nodes: &'a [String],
    path: String,
}

/// Summary statistics for JSON output.
#[derive(Serialize)]
struct JsonSummary {
    total_nodes: usize,
    total_edges: usize,
    recursive: usize,
    leaf: usize,
    unresolved: usize,
    cycles: usize,
    groups: usize,
}

/// Root JSON export structure.
#[derive(Serialize)]
struct JsonExport<'a> {
    name: &'a str,
    summary: JsonSummary,
    nodes: Vec<JsonNode<'a>>,
    edges: Vec<JsonEdge<'a>>,
    unresolved: &'a [String],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cycles: Vec<JsonCycle<'a>>,
    topological_order: Option<&'a [String]>,
    groups: &'a [Vec<String>],
}

impl Exporter for JsonExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        let nodes: Vec<JsonNode> = data
            .nodes
            .iter()
            .map(|n| JsonNode {
                name: &n.name,
                dependencies: &n.dependencies,
                kind: n.kind,
                metrics: n.metrics,
            })
            .collect();

        let edges: Vec<JsonEdge> = data
            .edges
            .iter()
            .map(|(from, to)| JsonEdge { from, to })
            .collect();

        let cycles: Vec<JsonCycle> = data
            .cycles
            .iter()
            .map(|c| JsonCycle {
                nodes: &c.nodes,
                path: c.cycle_path(),
            })
            .collect();

        let export = JsonExport {
            name: &data.name,
            summary: JsonSummary {
                total_nodes: data.nodes.len(),
                total_edges: data.edges.len(),
                recursive: data.count_of_kind(NodeKind::Recursive),
                leaf: data.count_of_kind(NodeKind::Leaf),
                unresolved: data.unresolved.len(),
                cycles: data.cycles.len(),
                groups: data.groups.len(),
            },
            nodes,
            edges,
            unresolved: &data.unresolved,
            cycles,
            topological_order: data.topological_order.as_deref(),
            groups: &data.groups,
        };

        let json = serde_json::to_string_pretty(&export)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        writeln!(writer, "{}", json)
    }
}
