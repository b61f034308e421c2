//! Graphviz DOT export implementation.
//!
//! Renders the graph as DOT text. Nodes are coloured by kind and edges point
//! from a dependency to the units that use it, so data flows left to right.

use super::{ExportData, Exporter};
use crate::graph::NodeKind;
use std::collections::HashSet;
use std::io::{self, Write};

const RECURSIVE_COLOR: &str = "#d0021b";
const LEAF_COLOR: &str = "#7ed321";
const INTERNAL_COLOR: &str = "#f5a623";
const EDGE_COLOR: &str = "#2d3436";

/// DOT exporter implementation.
pub struct DotExporter;

fn fill_color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Recursive => RECURSIVE_COLOR,
        NodeKind::Leaf => LEAF_COLOR,
        NodeKind::Internal => INTERNAL_COLOR,
    }
}

fn escape(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quotes an identifier for DOT output.
fn quote(id: &str) -> String {
    format!("\"{}\"", escape(id))
}

impl Exporter for DotExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "digraph {} {{", quote(&data.name))?;
        writeln!(writer, "    rankdir=LR;")?;
        writeln!(
            writer,
            "    node [shape=box, style=filled, fontname=\"Arial\"];"
        )?;
        writeln!(writer, "    edge [color=\"{}\"];", EDGE_COLOR)?;
        writeln!(writer)?;

        for node in &data.nodes {
            let label = format!(
                "\"{}\\n({} deps)\"",
                escape(&node.name),
                node.metrics.out_degree
            );
            let font = if node.kind == NodeKind::Recursive {
                ", fontcolor=\"white\""
            } else {
                ""
            };
            writeln!(
                writer,
                "    {} [label={}, fillcolor=\"{}\"{}];",
                quote(&node.name),
                label,
                fill_color(node.kind),
                font
            )?;
        }

        for name in &data.unresolved {
            writeln!(
                writer,
                "    {} [shape=ellipse, style=dashed];",
                quote(name)
            )?;
        }

        writeln!(writer)?;

        for (dependent, dependency) in &data.edges {
            writeln!(writer, "    {} -> {};", quote(dependency), quote(dependent))?;
        }

        let unresolved: HashSet<&str> = data.unresolved.iter().map(String::as_str).collect();
        for node in &data.nodes {
            let mut seen = HashSet::new();
            for dep in &node.dependencies {
                if unresolved.contains(dep.as_str()) && seen.insert(dep.as_str()) {
                    writeln!(
                        writer,
                        "    {} -> {} [style=dashed];",
                        quote(dep),
                        quote(&node.name)
                    )?;
                }
            }
        }

        writeln!(writer, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::{acyclic_graph, calculator_graph};

    fn render(data: &ExportData) -> String {
        let mut output = Vec::new();
        DotExporter.export(data, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_dot_structure() {
        let output = render(&ExportData::new("sample_code", &acyclic_graph()));

        assert!(output.starts_with("digraph \"sample_code\" {"));
        assert!(output.contains("rankdir=LR;"));
        assert!(output.trim_end().ends_with('}'));
    }

    #[test]
    fn test_dot_edges_point_from_dependency() {
        let output = render(&ExportData::new("sample_code", &acyclic_graph()));
        assert!(output.contains("\"log_error\" -> \"validate_data\";"));
        assert!(!output.contains("\"validate_data\" -> \"log_error\""));
    }

    #[test]
    fn test_dot_node_colors_and_labels() {
        let output = render(&ExportData::new("sample_code", &calculator_graph()));

        assert!(output.contains(
            "\"power\" [label=\"power\\n(2 deps)\", fillcolor=\"#d0021b\", fontcolor=\"white\"];"
        ));
        assert!(output.contains("\"sqrt\" [label=\"sqrt\\n(1 deps)\", fillcolor=\"#f5a623\"];"));
        assert!(output.contains("\"power\" -> \"power\";"));
    }

    #[test]
    fn test_dot_unresolved_dashed() {
        let output = render(&ExportData::new("sample_code", &calculator_graph()));
        assert!(output.contains("\"std::cerr\" [shape=ellipse, style=dashed];"));
        assert!(output.contains("\"std::cerr\" -> \"logError\" [style=dashed];"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("a\\b"), "\"a\\\\b\"");
    }
}
