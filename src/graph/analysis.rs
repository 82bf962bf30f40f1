//! Inheritance Analysis
//!
//! Builds the `allOf` inheritance graph (child -> parent, one edge per `$ref`
//! member) and finds its strongly connected components. Any SCC with more
//! than one member, or a schema that lists itself, is a cyclic parent chain.
//! Schemas on such a chain can never be linked to a parent and fail
//! resolution up front.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::SchemaDocument;
use crate::schema::{ref_name, SchemaName};

/// Cyclic parent chains found in a document
#[derive(Debug, Clone, Default)]
pub struct InheritanceAnalysis {
    /// Each cycle, members in document order
    cycles: Vec<Vec<SchemaName>>,
    /// schema name -> index into `cycles`
    membership: HashMap<SchemaName, usize>,
    edge_count: usize,
}

impl InheritanceAnalysis {
    /// The cycle a schema belongs to, if any
    pub fn cycle_of(&self, name: &str) -> Option<&[SchemaName]> {
        self.membership.get(name).map(|&i| self.cycles[i].as_slice())
    }

    pub fn is_cyclic(&self, name: &str) -> bool {
        self.membership.contains_key(name)
    }

    pub fn cycles(&self) -> &[Vec<SchemaName>] {
        &self.cycles
    }

    /// Number of allOf reference edges in the graph
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

/// Compute the inheritance analysis for a document
pub fn compute_inheritance_analysis(document: &SchemaDocument) -> InheritanceAnalysis {
    let mut graph: DiGraph<SchemaName, ()> = DiGraph::with_capacity(
        document.schema_count(),
        document.schema_count(),
    );
    let mut indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(document.schema_count());

    for name in document.names() {
        indices.insert(name, graph.add_node(name.to_string()));
    }

    let mut self_loops: Vec<NodeIndex> = Vec::new();
    for (name, schema) in document.iter() {
        let from = indices[name.as_str()];
        for member in schema.all_of() {
            let Some(reference) = member.reference.as_deref() else {
                continue;
            };
            // Dangling refs surface later as unresolved references
            let Some(&to) = indices.get(ref_name(reference)) else {
                continue;
            };
            if from == to {
                self_loops.push(from);
            }
            graph.add_edge(from, to, ());
        }
    }

    let mut cycles: Vec<Vec<SchemaName>> = kosaraju_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || self_loops.contains(&scc[0]))
        .map(|scc| {
            let mut members: Vec<SchemaName> = scc
                .into_iter()
                .filter_map(|idx| graph.node_weight(idx).cloned())
                .collect();
            members.sort_by_key(|m| document.index_of(m).unwrap_or(usize::MAX));
            members
        })
        .collect();
    cycles.sort_by_key(|c| c.first().and_then(|m| document.index_of(m)).unwrap_or(usize::MAX));

    let mut membership = HashMap::new();
    for (i, cycle) in cycles.iter().enumerate() {
        for member in cycle {
            membership.insert(member.clone(), i);
        }
    }

    InheritanceAnalysis {
        cycles,
        membership,
        edge_count: graph.edge_count(),
    }
}
