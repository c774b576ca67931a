/*!
The precedence graph: one node per cluster id, one directed edge per adjacent pair of ids within an array.
Nodes are stored in sorted `ClusterId` order, so a node index comparison is a cluster id comparison.
Parallel edges from different arrays are kept individually, and self-loops (the same id twice in a row) are recorded but carry no ordering information.

# Example usage
```rust
use spacer_order::precedence_graph::PrecedenceGraph;
use spacer_order::spacer_array::SpacerArray;

let arrays = [
    SpacerArray::from_ids("array_1", ["a", "b", "c"]),
    SpacerArray::from_ids("array_2", ["b", "c", "c"]),
];
let graph = PrecedenceGraph::build(&arrays).unwrap();
assert_eq!(graph.node_count(), 3);
assert_eq!(graph.edge_count(), 4);
assert_eq!(graph.self_loops().count(), 1);
```
*/

use itertools::Itertools;
use log::debug;
use rustc_hash::FxHashMap as HashMap;

use crate::cluster::ClusterId;
use crate::errors::SpacerOrderError;
use crate::spacer_array::{check_unique_names, SpacerArray};

/// A directed "observed immediately before" edge
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecedenceEdge {
    /// Node index of the earlier cluster
    source: usize,
    /// Node index of the later cluster
    target: usize,
    /// Name of the array the adjacency was observed in
    array: String
}

impl PrecedenceEdge {
    /// Constructor
    pub fn new(source: usize, target: usize, array: impl Into<String>) -> PrecedenceEdge {
        PrecedenceEdge {
            source,
            target,
            array: array.into()
        }
    }

    /// Self-loops come from the same cluster appearing twice in a row
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    // Getters
    pub fn source(&self) -> usize {
        self.source
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn array(&self) -> &str {
        &self.array
    }
}

/// Directed multigraph over cluster ids
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrecedenceGraph {
    /// All cluster ids in sorted order
    nodes: Vec<ClusterId>,
    /// Reverse lookup from cluster id to node index
    node_lookup: HashMap<ClusterId, usize>,
    /// All edges, in array order and then position order
    edges: Vec<PrecedenceEdge>
}

impl PrecedenceGraph {
    /// Builds the graph from every adjacent pair of every array.
    /// # Arguments
    /// * `arrays` - the arrays in input order
    /// # Errors
    /// * `SpacerOrderError::DuplicateArrayName` if two arrays share a name, since edges are attributed by name
    pub fn build(arrays: &[SpacerArray]) -> Result<PrecedenceGraph, SpacerOrderError> {
        check_unique_names(arrays.iter().map(|a| a.name()))?;

        // insert in sorted order so that ties in the ordering are broken by cluster id
        let nodes: Vec<ClusterId> = arrays.iter()
            .flat_map(|a| a.cluster_ids().iter().cloned())
            .sorted()
            .dedup()
            .collect();
        let node_lookup: HashMap<ClusterId, usize> = nodes.iter().cloned()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();

        let mut edges = vec![];
        for array in arrays.iter() {
            for (source, target) in array.cluster_ids().iter().tuple_windows() {
                edges.push(PrecedenceEdge::new(node_lookup[source], node_lookup[target], array.name()));
            }
        }

        let graph = PrecedenceGraph {
            nodes,
            node_lookup,
            edges
        };
        debug!("Built precedence graph with {} nodes, {} edges, {} self-loops", graph.node_count(), graph.edge_count(), graph.self_loops().count());
        Ok(graph)
    }

    /// Returns the node index of a cluster id
    pub fn node_index(&self, id: &ClusterId) -> Option<usize> {
        self.node_lookup.get(id).cloned()
    }

    /// Returns the cluster id at a node index
    pub fn node(&self, index: usize) -> &ClusterId {
        &self.nodes[index]
    }

    /// Returns all edges that can carry ordering information, i.e. everything except self-loops
    pub fn ordering_edges(&self) -> impl Iterator<Item = &PrecedenceEdge> {
        self.edges.iter().filter(|e| !e.is_self_loop())
    }

    /// Returns all self-loop edges
    pub fn self_loops(&self) -> impl Iterator<Item = &PrecedenceEdge> {
        self.edges.iter().filter(|e| e.is_self_loop())
    }

    /// Splits the node set into weakly connected components.
    /// Each component is a sorted list of node indices, and components are ordered by their smallest node index.
    pub fn weak_components(&self) -> Vec<Vec<usize>> {
        let mut neighbors: Vec<Vec<usize>> = vec![vec![]; self.node_count()];
        for edge in self.ordering_edges() {
            neighbors[edge.source].push(edge.target);
            neighbors[edge.target].push(edge.source);
        }

        let mut component_of: Vec<Option<usize>> = vec![None; self.node_count()];
        let mut components: Vec<Vec<usize>> = vec![];
        for start in 0..self.node_count() {
            if component_of[start].is_some() {
                continue;
            }

            let component_index = components.len();
            let mut members = vec![start];
            let mut to_visit = vec![start];
            component_of[start] = Some(component_index);
            while let Some(node) = to_visit.pop() {
                for &neighbor in neighbors[node].iter() {
                    if component_of[neighbor].is_none() {
                        component_of[neighbor] = Some(component_index);
                        members.push(neighbor);
                        to_visit.push(neighbor);
                    }
                }
            }
            members.sort_unstable();
            components.push(members);
        }
        components
    }

    /// Creates the subgraph induced by a set of nodes, keeping only edges with both ends inside.
    /// Node indices are re-numbered but the relative order is kept.
    /// # Arguments
    /// * `node_indices` - the nodes to keep
    pub fn induced_subgraph(&self, node_indices: &[usize]) -> PrecedenceGraph {
        let mut kept: Vec<usize> = node_indices.to_vec();
        kept.sort_unstable();
        kept.dedup();

        let mut remap: Vec<Option<usize>> = vec![None; self.node_count()];
        for (new_index, &old_index) in kept.iter().enumerate() {
            remap[old_index] = Some(new_index);
        }

        let nodes: Vec<ClusterId> = kept.iter().map(|&i| self.nodes[i].clone()).collect();
        let node_lookup: HashMap<ClusterId, usize> = nodes.iter().cloned()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();
        let edges: Vec<PrecedenceEdge> = self.edges.iter()
            .filter_map(|e| {
                let source = remap[e.source]?;
                let target = remap[e.target]?;
                Some(PrecedenceEdge::new(source, target, e.array.clone()))
            })
            .collect();

        PrecedenceGraph {
            nodes,
            node_lookup,
            edges
        }
    }

    // Getters
    pub fn nodes(&self) -> &[ClusterId] {
        &self.nodes
    }

    pub fn edges(&self) -> &[PrecedenceEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
