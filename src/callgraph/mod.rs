//! Call graph linking call sites across analyzable methods
//!
//! Nodes are interned method identities held in an arena and addressed by
//! integer handles; edges live in a separate append-only list indexed by
//! source and target handle. The graph is rebuilt per run and never shrinks:
//! once added, nodes and edges stay for the duration of the analysis.
//! Parallel edges between the same caller and callee are all retained, one
//! per call site.

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use std::collections::HashMap;

/// Structural identity of an analyzable method: owning type plus signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodId {
    pub class_name: String,
    pub method_name: String,
    pub signature: String,
}

impl MethodId {
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            signature: signature.into(),
        }
    }
}

impl std::fmt::Display for MethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}{}", self.class_name, self.method_name, self.signature)
    }
}

/// Program location of one method invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Source line of the invocation, 0 when unknown.
    pub line: u32,
    /// Bytecode offset within the calling method.
    pub pc: u32,
}

impl CallSite {
    pub fn new(line: u32, pc: u32) -> Self {
        Self { line, pc }
    }
}

/// Handle to an interned method node. Cheap to copy and compare; two
/// handles are equal exactly when they name the same method identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(usize);

/// Handle to an edge, in global insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeHandle(usize);

/// One directed caller-to-callee edge with its originating call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub source: NodeHandle,
    pub target: NodeHandle,
    pub site: CallSite,
}

/// Append-only call graph with interned nodes.
#[derive(Debug, Default)]
pub struct CallGraph {
    nodes: Vec<MethodId>,
    interned: HashMap<MethodId, NodeHandle>,
    edges: Vec<CallEdge>,
    // Edge handles per node, in insertion order.
    outgoing: Vec<Vec<EdgeHandle>>,
    incoming: Vec<Vec<EdgeHandle>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a method identity, returning the existing handle if the same
    /// identity was requested before.
    pub fn node(&mut self, id: MethodId) -> NodeHandle {
        if let Some(&handle) = self.interned.get(&id) {
            return handle;
        }
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(id.clone());
        self.interned.insert(id, handle);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        handle
    }

    /// Look up a node without interning.
    pub fn find_node(&self, id: &MethodId) -> Option<NodeHandle> {
        self.interned.get(id).copied()
    }

    /// Add a caller-to-callee edge for one call site. Parallel edges for
    /// distinct call sites between the same pair are all kept.
    pub fn add_edge(&mut self, caller: NodeHandle, callee: NodeHandle, site: CallSite) -> EdgeHandle {
        let handle = EdgeHandle(self.edges.len());
        self.edges.push(CallEdge {
            source: caller,
            target: callee,
            site,
        });
        self.outgoing[caller.0].push(handle);
        self.incoming[callee.0].push(handle);
        handle
    }

    pub fn method(&self, node: NodeHandle) -> &MethodId {
        &self.nodes[node.0]
    }

    pub fn edge(&self, edge: EdgeHandle) -> &CallEdge {
        &self.edges[edge.0]
    }

    /// Edges with `node` as caller, in insertion order.
    pub fn edges_from(&self, node: NodeHandle) -> impl Iterator<Item = &CallEdge> + '_ {
        self.outgoing[node.0].iter().map(move |&e| &self.edges[e.0])
    }

    /// Edges with `node` as callee, in insertion order.
    pub fn edges_to(&self, node: NodeHandle) -> impl Iterator<Item = &CallEdge> + '_ {
        self.incoming[node.0].iter().map(move |&e| &self.edges[e.0])
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeHandle> {
        (0..self.nodes.len()).map(NodeHandle)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Strongly connected components containing a cycle: either more than
    /// one node, or a single node that calls itself. Used by detectors that
    /// need recursion awareness.
    pub fn recursive_components(&self) -> Vec<Vec<NodeHandle>> {
        let mut graph = DiGraph::<NodeHandle, ()>::with_capacity(self.nodes.len(), self.edges.len());
        let indices: Vec<_> = self.nodes().map(|n| graph.add_node(n)).collect();
        for edge in &self.edges {
            graph.update_edge(indices[edge.source.0], indices[edge.target.0], ());
        }

        tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || graph.contains_edge(scc[0], scc[0])
            })
            .map(|scc| {
                let mut nodes: Vec<_> = scc.into_iter().map(|ix| graph[ix]).collect();
                nodes.sort();
                nodes
            })
            .collect()
    }
}
