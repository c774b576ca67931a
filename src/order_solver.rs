/*!
Computes the strong order of a precedence graph.
The graph is first ordered with Kahn's algorithm, always emitting the smallest ready cluster id.
If a cycle prevents that, an approximate minimum feedback arc set is found with the Eades-Lin-Smyth heuristic over the edges inside each strongly connected component, those edges are removed, and the reduced graph is ordered again.
Removed edges that point backwards in the final order are reported per array as misorders.

# Example usage
```rust
use spacer_order::order_solver::solve_order;
use spacer_order::precedence_graph::PrecedenceGraph;
use spacer_order::spacer_array::SpacerArray;

let arrays = [
    SpacerArray::from_ids("array_1", ["a", "b", "c", "d"]),
    SpacerArray::from_ids("array_2", ["a", "b", "c", "d"]),
    SpacerArray::from_ids("array_3", ["a", "b", "c", "d"]),
    SpacerArray::from_ids("array_4", ["a", "b", "d", "c"]), // misordered
];
let graph = PrecedenceGraph::build(&arrays).unwrap();
let solution = solve_order(&graph);

let order: Vec<&str> = solution.order().iter().map(|id| id.as_str()).collect();
assert_eq!(order, ["a", "b", "c", "d"]);
assert!(solution.cycles_resolved());
assert_eq!(solution.misorders_for("array_4")[0].to_string(), "(d, c)");
assert!(solution.misorders_for("array_1").is_empty());
```
*/

use log::{debug, warn};
use priority_queue::PriorityQueue;
use rustc_hash::FxHashMap as HashMap;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use std::fmt;

use crate::cluster::ClusterId;
use crate::precedence_graph::PrecedenceGraph;

/// An adjacency in one array that contradicts the strong order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Misorder {
    /// The array the adjacency came from
    array: String,
    /// The cluster observed first
    source: ClusterId,
    /// The cluster observed immediately after
    target: ClusterId
}

impl Misorder {
    /// Constructor
    pub fn new(array: impl Into<String>, source: ClusterId, target: ClusterId) -> Misorder {
        Misorder {
            array: array.into(),
            source,
            target
        }
    }

    // Getters
    pub fn array(&self) -> &str {
        &self.array
    }

    pub fn source(&self) -> &ClusterId {
        &self.source
    }

    pub fn target(&self) -> &ClusterId {
        &self.target
    }
}

impl fmt::Display for Misorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.source, self.target)
    }
}

/// The strong order and the misorders that had to be removed to reach it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderSolution {
    /// Every cluster id exactly once
    order: Vec<ClusterId>,
    /// Removed edges grouped by the array they came from, in edge order
    misorders: HashMap<String, Vec<Misorder>>,
    /// True if the graph was cyclic and edges were removed
    cycles_resolved: bool
}

impl OrderSolution {
    /// Returns the misorders of one array, empty if it has none
    pub fn misorders_for(&self, array: &str) -> &[Misorder] {
        self.misorders.get(array).map(|m| m.as_slice()).unwrap_or(&[])
    }

    /// Returns the total number of removed edges
    pub fn removed_edge_count(&self) -> usize {
        self.misorders.values().map(|m| m.len()).sum()
    }

    /// Returns a lookup from cluster id to its position in the strong order
    pub fn positions(&self) -> HashMap<&ClusterId, usize> {
        self.order.iter()
            .enumerate()
            .map(|(position, id)| (id, position))
            .collect()
    }

    // Getters
    pub fn order(&self) -> &[ClusterId] {
        &self.order
    }

    pub fn misorders(&self) -> &HashMap<String, Vec<Misorder>> {
        &self.misorders
    }

    pub fn cycles_resolved(&self) -> bool {
        self.cycles_resolved
    }
}

/// Kahn's algorithm over node indices, always emitting the smallest ready node.
/// If the graph contains a cycle, only the nodes that could be emitted are returned.
/// # Arguments
/// * `node_count` - the number of nodes
/// * `edges` - (source, target) pairs, must not contain self-loops
pub fn kahn_order(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut in_degree: Vec<usize> = vec![0; node_count];
    let mut successors: Vec<Vec<usize>> = vec![vec![]; node_count];
    for &(source, target) in edges.iter() {
        in_degree[target] += 1;
        successors[source].push(target);
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..node_count)
        .filter(|&v| in_degree[v] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(node_count);
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &successor in successors[node].iter() {
            in_degree[successor] -= 1;
            if in_degree[successor] == 0 {
                ready.push(Reverse(successor));
            }
        }
    }
    order
}

/// Priority for picking the next node when there are no sinks or sources: largest (out - in) degree, then smallest index.
type DeltaPriority = (isize, Reverse<usize>);

/// Working state for the Eades-Lin-Smyth arrangement.
/// Degrees only count edges between nodes that have not been placed yet.
struct Arrangement {
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    out_degree: Vec<usize>,
    in_degree: Vec<usize>,
    placed: Vec<bool>,
    sinks: BTreeSet<usize>,
    sources: BTreeSet<usize>,
    by_delta: PriorityQueue<usize, DeltaPriority>
}

impl Arrangement {
    fn new(node_count: usize, edges: &[(usize, usize)]) -> Arrangement {
        let mut successors: Vec<Vec<usize>> = vec![vec![]; node_count];
        let mut predecessors: Vec<Vec<usize>> = vec![vec![]; node_count];
        for &(source, target) in edges.iter() {
            successors[source].push(target);
            predecessors[target].push(source);
        }
        let out_degree: Vec<usize> = successors.iter().map(|s| s.len()).collect();
        let in_degree: Vec<usize> = predecessors.iter().map(|p| p.len()).collect();

        let mut arrangement = Arrangement {
            successors,
            predecessors,
            out_degree,
            in_degree,
            placed: vec![false; node_count],
            sinks: Default::default(),
            sources: Default::default(),
            by_delta: PriorityQueue::new()
        };
        for node in 0..node_count {
            let priority = arrangement.priority(node);
            arrangement.by_delta.push(node, priority);
            arrangement.classify(node);
        }
        arrangement
    }

    fn priority(&self, node: usize) -> DeltaPriority {
        (self.out_degree[node] as isize - self.in_degree[node] as isize, Reverse(node))
    }

    /// Files a node under sinks or sources; sinks win for isolated nodes
    fn classify(&mut self, node: usize) {
        if self.out_degree[node] == 0 {
            self.sources.remove(&node);
            self.sinks.insert(node);
        } else if self.in_degree[node] == 0 {
            self.sources.insert(node);
        }
    }

    /// Marks a node as placed and updates the degrees of its unplaced neighbors
    fn place(&mut self, node: usize) {
        self.placed[node] = true;
        self.sinks.remove(&node);
        self.sources.remove(&node);
        self.by_delta.remove(&node);

        for i in 0..self.successors[node].len() {
            let successor = self.successors[node][i];
            if !self.placed[successor] {
                self.in_degree[successor] -= 1;
                self.refresh(successor);
            }
        }
        for i in 0..self.predecessors[node].len() {
            let predecessor = self.predecessors[node][i];
            if !self.placed[predecessor] {
                self.out_degree[predecessor] -= 1;
                self.refresh(predecessor);
            }
        }
    }

    fn refresh(&mut self, node: usize) {
        let priority = self.priority(node);
        self.by_delta.change_priority(&node, priority);
        self.classify(node);
    }

    /// Runs the arrangement to completion
    fn arrange(mut self) -> Vec<usize> {
        let node_count = self.placed.len();
        let mut left: Vec<usize> = Vec::with_capacity(node_count);
        let mut right: Vec<usize> = vec![];

        loop {
            if let Some(&sink) = self.sinks.iter().next() {
                // sinks go to the front of the right sequence
                right.push(sink);
                self.place(sink);
            } else if let Some(&source) = self.sources.iter().next() {
                left.push(source);
                self.place(source);
            } else if let Some((node, _priority)) = self.by_delta.pop() {
                left.push(node);
                self.place(node);
            } else {
                break;
            }
        }

        left.extend(right.into_iter().rev());
        left
    }
}

/// Arranges all nodes in a sequence that keeps few edges pointing backwards, using the Eades-Lin-Smyth heuristic.
/// Edges are counted with multiplicity, so an adjacency observed in many arrays is harder to violate.
/// # Arguments
/// * `node_count` - the number of nodes
/// * `edges` - (source, target) pairs, must not contain self-loops
pub fn eades_lin_smyth(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    Arrangement::new(node_count, edges).arrange()
}

/// Labels every node with its strongly connected component using an iterative Tarjan search.
/// Component labels are assigned in the order components are completed, which is a reverse topological order of the condensation.
/// # Arguments
/// * `node_count` - the number of nodes
/// * `edges` - (source, target) pairs
pub fn strongly_connected_components(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut successors: Vec<Vec<usize>> = vec![vec![]; node_count];
    for &(source, target) in edges.iter() {
        successors[source].push(target);
    }

    let mut visit_index: Vec<Option<usize>> = vec![None; node_count];
    let mut low_link: Vec<usize> = vec![0; node_count];
    let mut on_stack: Vec<bool> = vec![false; node_count];
    let mut stack: Vec<usize> = vec![];
    let mut component: Vec<usize> = vec![0; node_count];
    let mut next_index = 0;
    let mut next_component = 0;

    for root in 0..node_count {
        if visit_index[root].is_some() {
            continue;
        }

        visit_index[root] = Some(next_index);
        low_link[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        // each frame is (node, position of the next successor to visit)
        let mut call_stack: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(frame) = call_stack.last_mut() {
            let node = frame.0;
            if frame.1 < successors[node].len() {
                let next = successors[node][frame.1];
                frame.1 += 1;
                match visit_index[next] {
                    None => {
                        visit_index[next] = Some(next_index);
                        low_link[next] = next_index;
                        next_index += 1;
                        stack.push(next);
                        on_stack[next] = true;
                        call_stack.push((next, 0));
                    },
                    Some(next_visit) if on_stack[next] => {
                        low_link[node] = low_link[node].min(next_visit);
                    },
                    Some(_) => {}
                }
            } else {
                call_stack.pop();
                if let Some(&(parent, _)) = call_stack.last() {
                    low_link[parent] = low_link[parent].min(low_link[node]);
                }

                if visit_index[node] == Some(low_link[node]) {
                    // node is the root of a component, everything above it on the stack belongs to it
                    while let Some(member) = stack.pop() {
                        on_stack[member] = false;
                        component[member] = next_component;
                        if member == node {
                            break;
                        }
                    }
                    next_component += 1;
                }
            }
        }
    }
    component
}

/// Returns the indices into `edges` that must be removed to make the graph acyclic.
/// Only edges inside a strongly connected component can lie on a cycle, so the Eades-Lin-Smyth arrangement is computed over those edges alone.
/// An internal edge whose source comes after its target in the arrangement is part of the returned set.
/// Removing them always leaves an acyclic graph.
/// # Arguments
/// * `node_count` - the number of nodes
/// * `edges` - (source, target) pairs, must not contain self-loops
pub fn feedback_arc_set(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let component = strongly_connected_components(node_count, edges);
    let internal: Vec<usize> = (0..edges.len())
        .filter(|&i| component[edges[i].0] == component[edges[i].1])
        .collect();
    let internal_edges: Vec<(usize, usize)> = internal.iter()
        .map(|&i| edges[i])
        .collect();

    let arrangement = eades_lin_smyth(node_count, &internal_edges);
    let mut position = vec![0; node_count];
    for (p, &node) in arrangement.iter().enumerate() {
        position[node] = p;
    }

    internal.into_iter()
        .filter(|&i| position[edges[i].0] > position[edges[i].1])
        .collect()
}

/// Computes the strong order of a precedence graph, resolving cycles if needed.
/// Self-loops are ignored, they never produce misorders.
/// The result only depends on the graph, so repeated calls give identical solutions.
/// # Arguments
/// * `graph` - the precedence graph
pub fn solve_order(graph: &PrecedenceGraph) -> OrderSolution {
    let node_count = graph.node_count();
    let ordering_edges: Vec<_> = graph.ordering_edges().collect();
    let pairs: Vec<(usize, usize)> = ordering_edges.iter()
        .map(|e| (e.source(), e.target()))
        .collect();

    let order = kahn_order(node_count, &pairs);
    if order.len() == node_count {
        debug!("Precedence graph is acyclic, ordered {node_count} clusters");
        return OrderSolution {
            order: order.into_iter().map(|i| graph.node(i).clone()).collect(),
            misorders: Default::default(),
            cycles_resolved: false
        };
    }

    warn!("Precedence graph contains cycles ({} of {} clusters could not be ordered), removing a feedback arc set", node_count - order.len(), node_count);
    let removed = feedback_arc_set(node_count, &pairs);
    let mut is_removed = vec![false; pairs.len()];
    for &i in removed.iter() {
        is_removed[i] = true;
    }

    let kept: Vec<(usize, usize)> = pairs.iter()
        .zip(is_removed.iter())
        .filter(|(_pair, removed)| !**removed)
        .map(|(&pair, _r)| pair)
        .collect();
    let order = kahn_order(node_count, &kept);
    assert_eq!(order.len(), node_count, "graph is still cyclic after removing the feedback arc set");

    // a removed edge that the final order happens to satisfy is not a misorder
    let mut position = vec![0; node_count];
    for (p, &node) in order.iter().enumerate() {
        position[node] = p;
    }
    let removed: Vec<usize> = removed.into_iter()
        .filter(|&i| position[pairs[i].0] > position[pairs[i].1])
        .collect();

    let mut misorders: HashMap<String, Vec<Misorder>> = Default::default();
    for &i in removed.iter() {
        let edge = ordering_edges[i];
        misorders.entry(edge.array().to_string())
            .or_default()
            .push(Misorder::new(edge.array(), graph.node(edge.source()).clone(), graph.node(edge.target()).clone()));
    }
    debug!("Removed {} edges from {} arrays", removed.len(), misorders.len());

    OrderSolution {
        order: order.into_iter().map(|i| graph.node(i).clone()).collect(),
        misorders,
        cycles_resolved: true
    }
}
