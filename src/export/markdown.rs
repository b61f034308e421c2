//! Markdown export implementation.
//!
//! Exports graph analysis results in Markdown format for documentation and reporting.

use super::{ExportData, Exporter};
use crate::graph::NodeKind;
use std::io::{self, Write};

/// Markdown exporter implementation.
pub struct MarkdownExporter;

/// Escapes a name for use inside a table cell.
fn cell(name: &str) -> String {
    name.replace('|', "\\|")
}

impl Exporter for MarkdownExporter {
    fn export<W: Write>(&self, data: &ExportData, writer: &mut W) -> io::Result<()> {
        // Title
        writeln!(writer, "# Dependency Graph Report: {}", data.name)?;
        writeln!(writer)?;

        // Summary section
        writeln!(writer, "## Summary")?;
        writeln!(writer)?;
        writeln!(writer, "| Metric | Count |")?;
        writeln!(writer, "|--------|-------|")?;
        writeln!(writer, "| Nodes | {} |", data.nodes.len())?;
        writeln!(writer, "| Edges | {} |", data.edges.len())?;
        writeln!(
            writer,
            "| Recursive | {} |",
            data.count_of_kind(NodeKind::Recursive)
        )?;
        writeln!(writer, "| Leaf | {} |", data.count_of_kind(NodeKind::Leaf))?;
        writeln!(writer, "| Unresolved | {} |", data.unresolved.len())?;
        writeln!(writer, "| Cycles | {} |", data.cycles.len())?;
        writeln!(writer, "| Groups | {} |", data.groups.len())?;
        writeln!(writer)?;

        // Nodes
        writeln!(writer, "## Nodes")?;
        writeln!(writer)?;
        if data.nodes.is_empty() {
            writeln!(writer, "No nodes.")?;
        } else {
            writeln!(writer, "| Name | Kind | Dependencies | Used By |")?;
            writeln!(writer, "|------|------|--------------|---------|")?;
            for node in &data.nodes {
                let deps = if node.dependencies.is_empty() {
                    "-".to_string()
                } else {
                    node.dependencies
                        .iter()
                        .map(|d| format!("`{}`", cell(d)))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                writeln!(
                    writer,
                    "| `{}` | {} | {} | {} |",
                    cell(&node.name),
                    node.kind,
                    deps,
                    node.metrics.in_degree
                )?;
            }
        }
        writeln!(writer)?;

        // Build order
        writeln!(writer, "## Order")?;
        writeln!(writer)?;
        match &data.topological_order {
            Some(order) => {
                for (i, name) in order.iter().enumerate() {
                    writeln!(writer, "{}. `{}`", i + 1, name)?;
                }
            }
            None => {
                writeln!(writer, "Not available: the graph contains cycles.")?;
            }
        }
        writeln!(writer)?;

        // Cycles
        if !data.cycles.is_empty() {
            writeln!(writer, "## Cycles")?;
            writeln!(writer)?;
            for cycle in &data.cycles {
                writeln!(writer, "- `{}`", cycle.cycle_path())?;
            }
            writeln!(writer)?;
        }

        // Unresolved
        if !data.unresolved.is_empty() {
            writeln!(writer, "## Unresolved Dependencies")?;
            writeln!(writer)?;
            for name in &data.unresolved {
                writeln!(writer, "- `{}`", name)?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::{acyclic_graph, calculator_graph};

    fn render(data: &ExportData) -> String {
        let mut output = Vec::new();
        MarkdownExporter.export(data, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_markdown_summary() {
        let output = render(&ExportData::new("sample_code", &calculator_graph()));

        assert!(output.starts_with("# Dependency Graph Report: sample_code"));
        assert!(output.contains("| Nodes | 4 |"));
        assert!(output.contains("| Recursive | 1 |"));
        assert!(output.contains("| Unresolved | 1 |"));
    }

    #[test]
    fn test_markdown_nodes_table() {
        let output = render(&ExportData::new("sample_code", &calculator_graph()));
        assert!(output.contains("| `power` | recursive | `power`, `validateInput` | 1 |"));
        assert!(output.contains("| `validateInput` | internal | `logError` | 2 |"));
    }

    #[test]
    fn test_markdown_cyclic_sections() {
        let output = render(&ExportData::new("sample_code", &calculator_graph()));
        assert!(output.contains("Not available: the graph contains cycles."));
        assert!(output.contains("## Cycles"));
        assert!(output.contains("- `power -> power`"));
        assert!(output.contains("- `std::cerr`"));
    }

    #[test]
    fn test_markdown_order() {
        let output = render(&ExportData::new("sample_code", &acyclic_graph()));
        assert!(output.contains("1. `log_error`\n2. `validate_data`"));
        assert!(!output.contains("## Cycles"));
        assert!(output.contains("| `log_error` | leaf | - | 1 |"));
    }

    #[test]
    fn test_markdown_escapes_pipes_in_cells() {
        use crate::graph::{DependencyGraph, MetadataRecord};

        let graph = DependencyGraph::from_records(vec![
            MetadataRecord::new("operator|", ["a|b"]),
            MetadataRecord::leaf("a|b"),
        ])
        .unwrap();
        let output = render(&ExportData::new("pipes", &graph));

        assert!(output.contains("| `operator\\|` | internal | `a\\|b` | 0 |"));
        assert!(output.contains("| `a\\|b` | leaf | - | 1 |"));
    }
}
