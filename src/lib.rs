//! metagraph - dependency graphs from function metadata comments
//!
//! This crate builds an immutable dependency graph from `Metadata:` records
//! (a name plus the names it depends on) and answers structural queries:
//! unresolved references, cycles, topological order, and reachability.
//! Records can be extracted from Python, Java, C, and C++ comments, and
//! graphs can be exported as JSON, Graphviz DOT, or Markdown. Directory
//! scans can run in parallel and reuse cached records of unchanged files.

pub mod cache;
pub mod config;
pub mod export;
pub mod graph;
pub mod parser;
