//! Export functionality for dependency graph reports.
//!
//! This module provides exporters for outputting graph analysis results in
//! various formats: JSON, Graphviz DOT, and Markdown.

pub mod dot;
pub mod json;
pub mod markdown;

use crate::graph::{CycleInfo, DependencyGraph, NodeKind, NodeMetrics};
use std::io::{self, Write};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON format - machine-readable, full data
    Json,
    /// Graphviz DOT format - for rendering with `dot`
    Dot,
    /// Markdown format - documentation/reporting
    Markdown,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "dot" | "graphviz" | "gv" => Ok(ExportFormat::Dot),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            _ => Err(format!(
                "Unknown export format: '{}'. Valid formats: json, dot, markdown",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Dot => write!(f, "dot"),
            ExportFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A single node as it appears in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    /// Node name
    pub name: String,
    /// Declared dependencies, in declaration order
    pub dependencies: Vec<String>,
    /// Rendering classification
    pub kind: NodeKind,
    /// Connection counts
    pub metrics: NodeMetrics,
}

/// Data container for export operations.
///
/// Holds every query result an exporter may render, computed once from the
/// graph.
#[derive(Debug, Clone)]
pub struct ExportData {
    /// Report title (e.g., the analyzed file or directory name)
    pub name: String,
    /// Nodes in input order
    pub nodes: Vec<NodeReport>,
    /// Resolved (dependent, dependency) edges
    pub edges: Vec<(String, String)>,
    /// Dependency names with no matching node
    pub unresolved: Vec<String>,
    /// Detected cycles
    pub cycles: Vec<CycleInfo>,
    /// Dependency-first ordering, absent when the graph is cyclic
    pub topological_order: Option<Vec<String>>,
    /// Weakly connected groups of nodes
    pub groups: Vec<Vec<String>>,
}

impl ExportData {
    /// Create new export data from a graph.
    pub fn new(name: impl Into<String>, graph: &DependencyGraph) -> Self {
        let nodes = graph
            .metrics()
            .into_iter()
            .map(|(node, metrics)| NodeReport {
                name: node.name.clone(),
                dependencies: node.dependencies.clone(),
                kind: node.kind(),
                metrics,
            })
            .collect();

        Self {
            name: name.into(),
            nodes,
            edges: graph
                .edges()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            unresolved: graph.unresolved_dependencies().into_iter().collect(),
            cycles: graph.get_cycle_details(),
            topological_order: graph.topological_order().ok(),
            groups: graph.connected_groups(),
        }
    }

    /// Get count of nodes of the given kind
    pub fn count_of_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Returns true if the graph had no cycles.
    pub fn is_acyclic(&self) -> bool {
        self.topological_order.is_some()
    }
}

/// Trait for exporters.
pub trait Exporter {
    /// Export the data to the given writer.
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()>;
}

/// Export data in the specified format.
pub fn export<W: Write>(
    format: ExportFormat,
    data: &ExportData,
    writer: &mut W,
) -> io::Result<()> {
    match format {
        ExportFormat::Json => json::JsonExporter.export(data, writer),
        ExportFormat::Dot => dot::DotExporter.export(data, writer),
        ExportFormat::Markdown => markdown::MarkdownExporter.export(data, writer),
    }
}

/// Export data to a string.
pub fn export_to_string(format: ExportFormat, data: &ExportData) -> io::Result<String> {
    let mut buffer = Vec::new();
    export(format, data, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
