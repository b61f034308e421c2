//! Dependency graph implementation using petgraph.
//!
//! Provides an immutable directed graph built from metadata records, with
//! support for unresolved reference reporting, cycle detection, topological
//! ordering, and transitive reachability.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::Direction;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet, VecDeque};
use tracing::debug;

use super::record::MetadataRecord;

/// Errors returned by graph construction and queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two input records share the same name.
    #[error("Duplicate node: '{name}' is declared more than once")]
    DuplicateNode { name: String },

    /// An input record has an empty (or blank) name.
    #[error("Record at position {position} has an empty name")]
    EmptyName { position: usize },

    /// A query referenced a name that is not a node in the graph.
    #[error("Unknown node: '{0}'")]
    UnknownNode(String),

    /// Topological ordering was requested on a cyclic graph.
    #[error("Dependency graph contains a cycle: {}", .cycle.cycle_path())]
    CyclicGraph { cycle: CycleInfo },
}

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Rendering classification of a node, derived from its declared dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The node lists itself as a dependency
    Recursive,
    /// The node declares no dependencies
    Leaf,
    /// The node declares dependencies, none of them itself
    Internal,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recursive => write!(f, "recursive"),
            Self::Leaf => write!(f, "leaf"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Connection counts for a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeMetrics {
    /// Number of nodes that declare this node as a dependency
    pub in_degree: usize,
    /// Number of declared dependencies (resolved or not)
    pub out_degree: usize,
    /// Whether the node depends on itself
    pub is_recursive: bool,
}

/// Represents a node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    /// Unique node name
    pub name: String,
    /// Declared dependency names, in declaration order
    pub dependencies: Vec<String>,
}

impl DependencyNode {
    /// Returns true if this node lists itself as a dependency.
    pub fn is_recursive(&self) -> bool {
        self.dependencies.iter().any(|d| *d == self.name)
    }

    /// Classifies the node for rendering.
    pub fn kind(&self) -> NodeKind {
        if self.is_recursive() {
            NodeKind::Recursive
        } else if self.dependencies.is_empty() {
            NodeKind::Leaf
        } else {
            NodeKind::Internal
        }
    }

    fn to_record(&self) -> MetadataRecord {
        MetadataRecord {
            name: self.name.clone(),
            dependencies: self.dependencies.clone(),
        }
    }
}

/// Information about a detected dependency cycle.
///
/// Each node depends directly on the next; the last depends on the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleInfo {
    /// Node names in cycle order
    pub nodes: Vec<String>,
}

impl CycleInfo {
    /// Returns a formatted string representation of the cycle path.
    ///
    /// For example: "a -> b -> c -> a"
    pub fn cycle_path(&self) -> String {
        match self.nodes.first() {
            Some(first) => format!("{} -> {}", self.nodes.join(" -> "), first),
            None => String::new(),
        }
    }

    /// Returns the number of nodes in the cycle.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the cycle is empty (should not happen in practice).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnStack,
    Done,
}

/// An immutable directed graph of named code units.
///
/// Nodes are created once from the full record set; edges point from the
/// dependent node to its dependency. Dependency names with no matching node
/// are kept on the node as unresolved (external) references and have no
/// edge. Self-dependencies are represented as self-loops.
///
/// # Example
///
/// ```rust
/// use metagraph::graph::{DependencyGraph, MetadataRecord};
///
/// let graph = DependencyGraph::from_records(vec![
///     MetadataRecord::new("validate_data", ["log_error"]),
///     MetadataRecord::leaf("log_error"),
/// ])
/// .unwrap();
///
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.topological_order().unwrap(), vec!["log_error", "validate_data"]);
/// ```
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// The underlying directed graph; node indices follow input order
    graph: DiGraph<DependencyNode, ()>,
    /// Maps node names to their node indices for O(1) lookup
    node_indices: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Builds a graph from an ordered sequence of metadata records.
    ///
    /// Fails atomically if any record has an empty name or if two records
    /// share a name.
    ///
    /// # Example
    ///
    /// ```rust
    /// use metagraph::graph::{DependencyGraph, GraphError, MetadataRecord};
    ///
    /// let result = DependencyGraph::from_records(vec![
    ///     MetadataRecord::leaf("log_error"),
    ///     MetadataRecord::leaf("log_error"),
    /// ]);
    /// assert!(matches!(result, Err(GraphError::DuplicateNode { .. })));
    /// ```
    pub fn from_records<I>(records: I) -> GraphResult<Self>
    where
        I: IntoIterator<Item = MetadataRecord>,
    {
        let records: Vec<MetadataRecord> = records.into_iter().collect();
        let edge_hint = records.iter().map(|r| r.dependencies.len()).sum();

        let mut graph = DiGraph::with_capacity(records.len(), edge_hint);
        let mut node_indices = HashMap::with_capacity(records.len());

        for (position, record) in records.into_iter().enumerate() {
            if record.name.trim().is_empty() {
                return Err(GraphError::EmptyName { position });
            }
            if node_indices.contains_key(&record.name) {
                return Err(GraphError::DuplicateNode { name: record.name });
            }

            let name = record.name.clone();
            let idx = graph.add_node(DependencyNode {
                name: record.name,
                dependencies: record.dependencies,
            });
            node_indices.insert(name, idx);
        }

        let mut built = Self {
            graph,
            node_indices,
        };
        built.link_edges();

        debug!(
            nodes = built.node_count(),
            edges = built.edge_count(),
            "Built dependency graph"
        );

        Ok(built)
    }

    /// Adds one edge per distinct resolved dependency of every node.
    fn link_edges(&mut self) {
        let adjacency = self.adjacency();
        for (source, targets) in adjacency.into_iter().enumerate() {
            for target in targets {
                self.graph.add_edge(NodeIndex::new(source), target, ());
            }
        }
    }

    /// Resolved dependency targets of every node, indexed by node position.
    ///
    /// Targets keep declaration order with duplicates removed.
    fn adjacency(&self) -> Vec<Vec<NodeIndex>> {
        self.graph
            .node_indices()
            .map(|idx| {
                let mut seen = HashSet::new();
                self.graph[idx]
                    .dependencies
                    .iter()
                    .filter_map(|dep| self.node_indices.get(dep).copied())
                    .filter(|target| seen.insert(*target))
                    .collect()
            })
            .collect()
    }

    fn index_of(&self, name: &str) -> GraphResult<NodeIndex> {
        self.node_indices
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))
    }

    /// Returns every dependency name that does not correspond to a node.
    ///
    /// # Example
    ///
    /// ```rust
    /// use metagraph::graph::{DependencyGraph, MetadataRecord};
    ///
    /// let graph = DependencyGraph::from_records(vec![
    ///     MetadataRecord::new("render", ["format_output", "printf"]),
    ///     MetadataRecord::leaf("format_output"),
    /// ])
    /// .unwrap();
    ///
    /// let unresolved = graph.unresolved_dependencies();
    /// assert_eq!(unresolved.len(), 1);
    /// assert!(unresolved.contains("printf"));
    /// ```
    pub fn unresolved_dependencies(&self) -> BTreeSet<String> {
        self.graph
            .node_weights()
            .flat_map(|node| node.dependencies.iter())
            .filter(|dep| !self.node_indices.contains_key(dep.as_str()))
            .cloned()
            .collect()
    }

    /// Reports every cycle found by a depth-first traversal.
    ///
    /// Traversal starts from each unvisited node in input order and follows
    /// dependencies in declaration order. When a node already on the active
    /// path is reached again, the path from that node to the current node is
    /// reported. A node depending on itself yields a single-node cycle.
    ///
    /// Cyclic metadata is valid data; this never fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// use metagraph::graph::{DependencyGraph, MetadataRecord};
    ///
    /// let graph = DependencyGraph::from_records(vec![
    ///     MetadataRecord::new("a", ["b"]),
    ///     MetadataRecord::new("b", ["c"]),
    ///     MetadataRecord::new("c", ["a"]),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(graph.detect_cycles(), vec![vec!["a", "b", "c"]]);
    /// ```
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let adjacency = self.adjacency();
        let node_count = self.graph.node_count();

        let mut state = vec![VisitState::Unvisited; node_count];
        let mut stack_position = vec![0usize; node_count];
        // (node, index of the next dependency to explore)
        let mut path: Vec<(NodeIndex, usize)> = Vec::new();
        let mut cycles = Vec::new();

        for start in self.graph.node_indices() {
            if state[start.index()] != VisitState::Unvisited {
                continue;
            }

            state[start.index()] = VisitState::OnStack;
            stack_position[start.index()] = 0;
            path.push((start, 0));

            while let Some(&(node, cursor)) = path.last() {
                let Some(&next) = adjacency[node.index()].get(cursor) else {
                    state[node.index()] = VisitState::Done;
                    path.pop();
                    continue;
                };

                if let Some(top) = path.last_mut() {
                    top.1 += 1;
                }

                match state[next.index()] {
                    VisitState::Unvisited => {
                        state[next.index()] = VisitState::OnStack;
                        stack_position[next.index()] = path.len();
                        path.push((next, 0));
                    }
                    VisitState::OnStack => {
                        let cycle = path[stack_position[next.index()]..]
                            .iter()
                            .map(|(idx, _)| self.graph[*idx].name.clone())
                            .collect();
                        cycles.push(cycle);
                    }
                    VisitState::Done => {}
                }
            }
        }

        cycles
    }

    /// Checks if the graph contains cycles.
    pub fn has_cycles(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Returns detailed cycle information for every detected cycle.
    pub fn get_cycle_details(&self) -> Vec<CycleInfo> {
        self.detect_cycles()
            .into_iter()
            .map(|nodes| CycleInfo { nodes })
            .collect()
    }

    /// Returns the set of node names that take part in any cycle.
    pub fn get_nodes_in_cycles(&self) -> HashSet<String> {
        self.detect_cycles().into_iter().flatten().collect()
    }

    /// Orders nodes so that every dependency precedes its dependents.
    ///
    /// Uses Kahn's algorithm over resolved edges. Among nodes that become
    /// ready at the same time, the one declared first in the input wins.
    /// Unresolved dependency names count as already satisfied and are not
    /// emitted.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CyclicGraph`] with one witness cycle if the
    /// resolved edges contain a cycle (including a self-loop).
    ///
    /// # Example
    ///
    /// ```rust
    /// use metagraph::graph::{DependencyGraph, GraphError, MetadataRecord};
    ///
    /// let graph = DependencyGraph::from_records(vec![
    ///     MetadataRecord::new("fibonacci", ["fibonacci"]),
    ///     MetadataRecord::leaf("log_error"),
    /// ])
    /// .unwrap();
    ///
    /// match graph.topological_order() {
    ///     Err(GraphError::CyclicGraph { cycle }) => assert_eq!(cycle.nodes, vec!["fibonacci"]),
    ///     other => panic!("expected a cycle, got {:?}", other),
    /// }
    /// ```
    pub fn topological_order(&self) -> GraphResult<Vec<String>> {
        let node_count = self.graph.node_count();

        let mut remaining: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .count()
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = remaining
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == 0)
            .map(|(position, _)| Reverse(position))
            .collect();

        let mut order = Vec::with_capacity(node_count);

        while let Some(Reverse(position)) = ready.pop() {
            let idx = NodeIndex::new(position);
            order.push(self.graph[idx].name.clone());

            for dependent in self.graph.neighbors_directed(idx, Direction::Incoming) {
                let count = &mut remaining[dependent.index()];
                *count -= 1;
                if *count == 0 {
                    ready.push(Reverse(dependent.index()));
                }
            }
        }

        if order.len() == node_count {
            return Ok(order);
        }

        let emitted: HashSet<&str> = order.iter().map(String::as_str).collect();
        let nodes = self.detect_cycles().into_iter().next().unwrap_or_else(|| {
            self.graph
                .node_weights()
                .filter(|node| !emitted.contains(node.name.as_str()))
                .map(|node| node.name.clone())
                .collect()
        });

        Err(GraphError::CyclicGraph {
            cycle: CycleInfo { nodes },
        })
    }

    /// Returns the transitive dependencies of `name`.
    ///
    /// Unresolved names reached along the way are included as leaves. `name`
    /// itself is only included when it is reached again through a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `name` is not a node.
    ///
    /// # Example
    ///
    /// ```rust
    /// use metagraph::graph::{DependencyGraph, MetadataRecord};
    ///
    /// let graph = DependencyGraph::from_records(vec![
    ///     MetadataRecord::new("power", ["power", "validateInput"]),
    ///     MetadataRecord::new("validateInput", ["logError"]),
    ///     MetadataRecord::leaf("logError"),
    ///     MetadataRecord::new("sqrt", ["validateInput"]),
    /// ])
    /// .unwrap();
    ///
    /// let deps = graph.dependencies_of("sqrt").unwrap();
    /// assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["logError", "validateInput"]);
    /// ```
    pub fn dependencies_of(&self, name: &str) -> GraphResult<BTreeSet<String>> {
        let start = self.index_of(name)?;

        let mut reached = BTreeSet::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for dep in &self.graph[current].dependencies {
                match self.node_indices.get(dep) {
                    Some(&idx) => {
                        if visited.insert(idx) {
                            reached.insert(dep.clone());
                            queue.push_back(idx);
                        }
                    }
                    None => {
                        reached.insert(dep.clone());
                    }
                }
            }
        }

        Ok(reached)
    }

    /// Returns every node that transitively depends on `name`.
    ///
    /// `name` itself is only included when it is reached again through a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `name` is not a node.
    pub fn dependents_of(&self, name: &str) -> GraphResult<BTreeSet<String>> {
        let start = self.index_of(name)?;

        let mut reached = BTreeSet::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for dependent in self.graph.neighbors_directed(current, Direction::Incoming) {
                if visited.insert(dependent) {
                    reached.insert(self.graph[dependent].name.clone());
                    queue.push_back(dependent);
                }
            }
        }

        Ok(reached)
    }

    /// Groups nodes that are connected through resolved edges, ignoring
    /// direction.
    ///
    /// Members keep input order; groups are ordered by their first member.
    pub fn connected_groups(&self) -> Vec<Vec<String>> {
        let mut sets = UnionFind::new(self.graph.node_count());
        for edge in self.graph.raw_edges() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<Vec<String>> = Vec::new();

        for idx in self.graph.node_indices() {
            let root = sets.find(idx.index());
            let group = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(self.graph[idx].name.clone());
        }

        groups
    }

    /// Builds the subgraph of the selected nodes plus their direct
    /// dependencies that exist as nodes.
    ///
    /// Retained nodes keep their full declared dependency lists, so names
    /// left out of the selection become unresolved in the result.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] for the first unknown selection.
    ///
    /// # Example
    ///
    /// ```rust
    /// use metagraph::graph::{DependencyGraph, MetadataRecord};
    ///
    /// let graph = DependencyGraph::from_records(vec![
    ///     MetadataRecord::new("format_output", ["validate_input"]),
    ///     MetadataRecord::new("validate_input", ["log_error"]),
    ///     MetadataRecord::leaf("log_error"),
    /// ])
    /// .unwrap();
    ///
    /// let selected = graph.select(&["format_output"]).unwrap();
    /// assert_eq!(selected.node_count(), 2);
    /// assert!(selected.unresolved_dependencies().contains("log_error"));
    /// ```
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> GraphResult<Self> {
        let mut keep = vec![false; self.graph.node_count()];

        for name in names {
            let idx = self.index_of(name.as_ref())?;
            keep[idx.index()] = true;
            for dep in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                keep[dep.index()] = true;
            }
        }

        let records = self
            .graph
            .node_indices()
            .filter(|idx| keep[idx.index()])
            .map(|idx| self.graph[idx].to_record());

        Self::from_records(records)
    }

    /// Returns connection metrics for a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `name` is not a node.
    pub fn node_metrics(&self, name: &str) -> GraphResult<NodeMetrics> {
        let idx = self.index_of(name)?;
        Ok(self.metrics_at(idx))
    }

    /// Returns metrics for every node, in input order.
    pub fn metrics(&self) -> Vec<(&DependencyNode, NodeMetrics)> {
        self.graph
            .node_indices()
            .map(|idx| (&self.graph[idx], self.metrics_at(idx)))
            .collect()
    }

    fn metrics_at(&self, idx: NodeIndex) -> NodeMetrics {
        let node = &self.graph[idx];
        NodeMetrics {
            in_degree: self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .count(),
            out_degree: node.dependencies.len(),
            is_recursive: node.is_recursive(),
        }
    }

    /// Gets a reference to a node by name.
    pub fn get_node(&self, name: &str) -> Option<&DependencyNode> {
        self.node_indices
            .get(name)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Returns all nodes in input order.
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> {
        self.graph.node_weights()
    }

    /// Returns the resolved edges as (dependent, dependency) name pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.raw_edges().iter().map(|edge| {
            (
                self.graph[edge.source()].name.as_str(),
                self.graph[edge.target()].name.as_str(),
            )
        })
    }

    /// Converts the graph back into the records it was built from.
    pub fn records(&self) -> Vec<MetadataRecord> {
        self.graph.node_weights().map(DependencyNode::to_record).collect()
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of distinct resolved edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Checks if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Checks if a node exists in the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.node_indices.contains_key(name)
    }
}


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;
    use proptest::sample::Index;

    fn node_name(i: usize) -> String {
        format!("n{}", i)
    }

    /// Records whose resolved edges only point at earlier-generated nodes,
    /// shuffled so input order and dependency order disagree.
    fn acyclic_records() -> impl Strategy<Value = Vec<MetadataRecord>> {
        prop::collection::vec((prop::collection::vec(any::<usize>(), 0..4), any::<bool>()), 1..25)
            .prop_map(|specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (picks, external))| {
                        let mut deps: Vec<String> = if i == 0 {
                            Vec::new()
                        } else {
                            picks.iter().map(|p| node_name(p % i)).collect()
                        };
                        if external {
                            deps.push(format!("ext{}", i % 3));
                        }
                        MetadataRecord::new(node_name(i), deps)
                    })
                    .collect::<Vec<_>>()
            })
            .prop_shuffle()
    }

    /// Records with dependencies on any node, including themselves.
    fn any_records() -> impl Strategy<Value = Vec<MetadataRecord>> {
        prop::collection::vec((prop::collection::vec(any::<usize>(), 0..4), any::<bool>()), 1..25)
            .prop_map(|specs| {
                let n = specs.len();
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (picks, external))| {
                        let mut deps: Vec<String> = picks.iter().map(|p| node_name(p % n)).collect();
                        if external {
                            deps.push("ext".to_string());
                        }
                        MetadataRecord::new(node_name(i), deps)
                    })
                    .collect::<Vec<_>>()
            })
    }

    proptest! {
        #[test]
        fn topological_order_lists_each_node_after_its_dependencies(records in acyclic_records()) {
            let graph = DependencyGraph::from_records(records.clone()).unwrap();
            let order = graph.topological_order().unwrap();

            prop_assert_eq!(order.len(), records.len());
            let position: HashMap<&str, usize> = order
                .iter()
                .enumerate()
                .map(|(i, name)| (name.as_str(), i))
                .collect();
            prop_assert_eq!(position.len(), records.len());

            for record in &records {
                let own = position[record.name.as_str()];
                for dep in &record.dependencies {
                    match position.get(dep.as_str()) {
                        Some(&before) => prop_assert!(before < own),
                        None => prop_assert!(graph.unresolved_dependencies().contains(dep)),
                    }
                }
            }
            prop_assert!(graph.detect_cycles().is_empty());
        }

        #[test]
        fn self_dependency_is_always_a_cycle(mut records in any_records(), pick in any::<Index>()) {
            let k = pick.index(records.len());
            let name = records[k].name.clone();
            records[k].dependencies.push(name.clone());

            let graph = DependencyGraph::from_records(records).unwrap();
            prop_assert!(graph.detect_cycles().contains(&vec![name]));
            let is_cyclic = matches!(
                graph.topological_order(),
                Err(GraphError::CyclicGraph { .. })
            );
            prop_assert!(is_cyclic);
        }

        #[test]
        fn ordering_fails_exactly_when_cycles_exist(records in any_records()) {
            let graph = DependencyGraph::from_records(records).unwrap();
            let cycles = graph.detect_cycles();

            match graph.topological_order() {
                Ok(_) => prop_assert!(cycles.is_empty()),
                Err(GraphError::CyclicGraph { cycle }) => {
                    prop_assert_eq!(Some(&cycle.nodes), cycles.first());
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        #[test]
        fn dependencies_of_is_stable_and_closed(records in any_records()) {
            let graph = DependencyGraph::from_records(records.clone()).unwrap();

            for record in &records {
                let first = graph.dependencies_of(&record.name).unwrap();
                prop_assert_eq!(&first, &graph.dependencies_of(&record.name).unwrap());

                for dep in &record.dependencies {
                    prop_assert!(first.contains(dep));
                    if let Ok(further) = graph.dependencies_of(dep) {
                        prop_assert!(further.is_subset(&first));
                    }
                }
            }
        }

        #[test]
        fn duplicate_name_fails_in_either_order(
            records in acyclic_records(),
            pick in any::<Index>(),
            at in any::<Index>()
        ) {
            let k = pick.index(records.len());
            let name = records[k].name.clone();
            let duplicate = MetadataRecord::leaf(name.clone());
            let expected = GraphError::DuplicateNode { name };

            let mut before = records.clone();
            before.insert(at.index(k + 1), duplicate.clone());
            prop_assert_eq!(DependencyGraph::from_records(before).unwrap_err(), expected.clone());

            let mut after = records.clone();
            let tail = records.len() - k;
            after.insert(k + 1 + at.index(tail), duplicate);
            prop_assert_eq!(DependencyGraph::from_records(after).unwrap_err(), expected);
        }
    }
}
