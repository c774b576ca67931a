/*!
This module provides access to the SpacerAligner, which runs the full pipeline: clustering every spacer, building the precedence graph, solving the strong order, and laying each array out over it.

# Example usage
```rust
use spacer_order::spacer_aligner::SpacerAligner;

let first: &[u8] = b"ACCGTTAGGCAT";
let second: &[u8] = b"GGATCCTTAGCA";
let third: &[u8] = b"TTTCGGACAGTA";
let arrays = [
    ("genome_1", vec![first, second, third]),
    ("genome_2", vec![first, second, third]),
    ("genome_3", vec![first, second, third]),
    ("genome_4", vec![first, third, second]), // misordered
];

// add all the arrays
let mut aligner: SpacerAligner = Default::default();
for (name, spacers) in arrays.into_iter() {
    aligner.add_array(name, spacers).unwrap();
}

// run the pipeline and check the results
let alignment = aligner.align().unwrap();
assert_eq!(alignment.order().len(), 3);
assert!(alignment.rows()[0].misorders().is_empty());
assert_eq!(alignment.rows()[3].misorders().len(), 1);
```
*/

use log::debug;
use std::io::Write;

use crate::align_config::AlignConfig;
use crate::cluster::{cluster_units, ClusterId, SpacerClusters};
use crate::errors::SpacerOrderError;
use crate::order_solver::{solve_order, OrderSolution};
use crate::precedence_graph::PrecedenceGraph;
use crate::reconstruct::{reconstruct, write_alignment_tsv, AlignedRow};
use crate::spacer_array::{assign_arrays, RawArray, SpacerArray};

/// Contains the result of ordering one set of arrays
#[derive(Clone, Debug, PartialEq)]
pub struct SpacerAlignment {
    /// The arrays as cluster ids, in input order
    arrays: Vec<SpacerArray>,
    /// The strong order and misorders
    solution: OrderSolution,
    /// One row per array, in input order
    rows: Vec<AlignedRow>,
    /// The text written for gaps in the tabular report
    gap_marker: String
}

impl SpacerAlignment {
    /// Builds the graph, solves the order, and reconstructs the rows for a set of arrays.
    /// # Arguments
    /// * `arrays` - the arrays to order
    /// * `gap_marker` - the text used for gaps when writing the report
    /// # Errors
    /// * if array names are not unique
    /// * if reconstruction finds an array inconsistent with the order
    pub fn from_arrays(arrays: Vec<SpacerArray>, gap_marker: &str) -> Result<SpacerAlignment, Box<dyn std::error::Error>> {
        let graph = PrecedenceGraph::build(&arrays)?;
        Self::from_graph(arrays, &graph, gap_marker)
    }

    fn from_graph(arrays: Vec<SpacerArray>, graph: &PrecedenceGraph, gap_marker: &str) -> Result<SpacerAlignment, Box<dyn std::error::Error>> {
        let solution = solve_order(graph);
        let rows = reconstruct(&arrays, &solution)?;
        Ok(SpacerAlignment {
            arrays,
            solution,
            rows,
            gap_marker: gap_marker.to_string()
        })
    }

    /// Writes the tabular report for this alignment, using the configured gap marker
    /// # Arguments
    /// * `writer` - the output destination
    /// # Errors
    /// * if writing fails
    pub fn write_tsv<W: Write>(&self, writer: &mut W) -> Result<(), Box<dyn std::error::Error>> {
        write_alignment_tsv(writer, &self.rows, &self.gap_marker)
    }

    // Getters
    pub fn order(&self) -> &[ClusterId] {
        self.solution.order()
    }

    pub fn solution(&self) -> &OrderSolution {
        &self.solution
    }

    pub fn arrays(&self) -> &[SpacerArray] {
        &self.arrays
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn gap_marker(&self) -> &str {
        &self.gap_marker
    }
}

/// Core utility that orders spacer arrays.
/// Arrays are added one at a time with their raw spacer sequences, and the whole corpus is processed in a single batch.
#[derive(Debug, Default)]
pub struct SpacerAligner<'a> {
    /// Contains all the arrays that have been added so far
    arrays: Vec<RawArray<'a>>,
    /// The config for this run
    config: AlignConfig
}

impl<'a> SpacerAligner<'a> {
    /// Creates a new instance of SpacerAligner.
    /// # Arguments
    /// * `config` - the clustering and reporting options
    /// # Errors
    /// * None so far
    pub fn with_config(config: AlignConfig) -> Result<SpacerAligner<'a>, Box<dyn std::error::Error>> {
        Ok(SpacerAligner {
            arrays: vec![],
            config
        })
    }

    /// Adds a new named array of raw spacers.
    /// # Arguments
    /// * `name` - the array name, must be unique
    /// * `spacers` - the spacer sequences in array order
    /// # Errors
    /// * `SpacerOrderError::DuplicateArrayName` if the name was already added
    pub fn add_array(&mut self, name: &str, spacers: Vec<&'a [u8]>) -> Result<(), Box<dyn std::error::Error>> {
        if self.arrays.iter().any(|a| a.name() == name) {
            return Err(SpacerOrderError::DuplicateArrayName { array: name.to_string() }.into());
        }
        self.arrays.push(RawArray::new(name, spacers));
        Ok(())
    }

    /// Clusters every spacer of the corpus and converts the arrays into cluster ids.
    /// # Errors
    /// * `SpacerOrderError::EmptyInput` if the corpus is empty and `require_non_empty` is set
    /// * `SpacerOrderError::Clustering` if a spacer cannot be clustered
    pub fn cluster_arrays(&self) -> Result<(SpacerClusters, Vec<SpacerArray>), Box<dyn std::error::Error>> {
        let unit_count: usize = self.arrays.iter().map(|a| a.units().len()).sum();
        if self.config.require_non_empty && unit_count == 0 {
            return Err(SpacerOrderError::EmptyInput.into());
        }

        let clusters = cluster_units(self.arrays.iter().flat_map(|a| a.units().iter().cloned()), &self.config)?;
        let arrays = assign_arrays(&self.arrays, &clusters)?;
        debug!("Assigned {} arrays with {unit_count} spacers to {} clusters", arrays.len(), clusters.len());
        Ok((clusters, arrays))
    }

    /// Runs the pipeline over all arrays, producing a single strong order over every cluster.
    /// # Errors
    /// * see `cluster_arrays(...)`
    pub fn align(&self) -> Result<SpacerAlignment, Box<dyn std::error::Error>> {
        let (_clusters, arrays) = self.cluster_arrays()?;
        SpacerAlignment::from_arrays(arrays, &self.config.gap_marker)
    }

    /// Runs the pipeline separately for each weakly connected group of clusters.
    /// An array belongs to the group containing its clusters; arrays without spacers belong to no group.
    /// Groups are ordered by their smallest cluster id.
    /// # Errors
    /// * see `cluster_arrays(...)`
    pub fn align_groups(&self) -> Result<Vec<SpacerAlignment>, Box<dyn std::error::Error>> {
        let (_clusters, arrays) = self.cluster_arrays()?;
        let graph = PrecedenceGraph::build(&arrays)?;

        let mut group_of_node: Vec<usize> = vec![0; graph.node_count()];
        let components = graph.weak_components();
        for (group, component) in components.iter().enumerate() {
            for &node in component.iter() {
                group_of_node[node] = group;
            }
        }

        // adjacent clusters share a component, so the first spacer decides the group
        let mut group_arrays: Vec<Vec<SpacerArray>> = vec![vec![]; components.len()];
        for array in arrays.into_iter() {
            if let Some(first) = array.cluster_ids().first() {
                let node = graph.node_index(first)
                    .ok_or_else(|| SpacerOrderError::InconsistentArray { array: array.name().to_string(), unit: first.to_string() })?;
                group_arrays[group_of_node[node]].push(array);
            }
        }

        debug!("Split {} clusters into {} groups", graph.node_count(), components.len());
        components.iter()
            .zip(group_arrays)
            .map(|(component, arrays)| {
                let subgraph = graph.induced_subgraph(component);
                SpacerAlignment::from_graph(arrays, &subgraph, &self.config.gap_marker)
            })
            .collect()
    }

    // getters
    pub fn arrays(&self) -> &[RawArray<'a>] {
        &self.arrays
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::align_config::{AlignConfigBuilder, Orientation};
    use crate::canonical::reverse_complement;

    const SPACER_A: &[u8] = b"ACCGTTAGGCATTCAGGATCCAATGCAGTCG";
    const SPACER_B: &[u8] = b"GGATCCTTAGCAGTACCATGAGCTAGCTTAC";
    const SPACER_C: &[u8] = b"TTTCGGACAGTAAGCGCTAGGGTACTTTGCA";
    const SPACER_D: &[u8] = b"CAGGTCATGCTTGACCAAGGTTCGATCGAGA";
    const SPACER_E: &[u8] = b"GCTAGGCTTACGATCGGACTTAGGACCATGT";
    const SPACER_F: &[u8] = b"TGACCGGTAAGCTTGCATAACGGTCAGGTTA";

    /// Introduces a single substitution, well within the default identity threshold
    fn mutate(spacer: &[u8], position: usize) -> Vec<u8> {
        let mut mutated = spacer.to_vec();
        mutated[position] = if mutated[position] == b'A' { b'C' } else { b'A' };
        mutated
    }

    fn ids(values: &[&str]) -> Vec<ClusterId> {
        values.iter().map(|&v| ClusterId::from(v)).collect()
    }

    #[test]
    fn test_identical_arrays() {
        let mut aligner = SpacerAligner::default();
        for i in 0..4 {
            aligner.add_array(&format!("genome_{i}"), vec![SPACER_A, SPACER_B, SPACER_C, SPACER_D]).unwrap();
        }
        let alignment = aligner.align().unwrap();
        assert_eq!(alignment.order().len(), 4);
        assert!(!alignment.solution().cycles_resolved());
        for (row, array) in alignment.rows().iter().zip(alignment.arrays()) {
            let present: Vec<ClusterId> = row.present_ids().into_iter().cloned().collect();
            assert_eq!(present, array.cluster_ids());
            assert!(row.cells().iter().all(|c| c.is_some()));
        }
    }

    #[test]
    fn test_mutated_and_flipped_spacers() {
        // the same four slots seen through noisy and reverse-complemented spacers
        let b_mutated = mutate(SPACER_B, 5);
        let c_flipped = reverse_complement(SPACER_C);
        let mut aligner = SpacerAligner::default();
        aligner.add_array("genome_1", vec![SPACER_A, SPACER_B, SPACER_C, SPACER_D]).unwrap();
        aligner.add_array("genome_2", vec![SPACER_A, b_mutated.as_slice(), c_flipped.as_slice(), SPACER_D]).unwrap();
        aligner.add_array("genome_3", vec![SPACER_A, SPACER_B, SPACER_D, SPACER_C]).unwrap();
        aligner.add_array("genome_4", vec![SPACER_A, SPACER_B, SPACER_C, SPACER_D]).unwrap();

        let (clusters, arrays) = aligner.cluster_arrays().unwrap();
        assert_eq!(clusters.len(), 4);
        assert_eq!(arrays[0].cluster_ids(), arrays[1].cluster_ids());

        let alignment = aligner.align().unwrap();
        assert_eq!(alignment.order(), arrays[0].cluster_ids());
        assert_eq!(alignment.solution().removed_edge_count(), 1);
        assert_eq!(alignment.rows()[2].misorders().len(), 1);
        let misorder = &alignment.rows()[2].misorders()[0];
        assert_eq!(misorder.source(), &arrays[2].cluster_ids()[2]);
        assert_eq!(misorder.target(), &arrays[2].cluster_ids()[3]);
    }

    #[test]
    fn test_disjoint_arrays_single_order() {
        let mut aligner = SpacerAligner::default();
        aligner.add_array("left", vec![SPACER_A, SPACER_B]).unwrap();
        aligner.add_array("right", vec![SPACER_C, SPACER_D]).unwrap();

        let alignment = aligner.align().unwrap();
        assert_eq!(alignment.order().len(), 4);

        // every column is filled by exactly one of the two arrays
        let left = alignment.rows()[0].cells();
        let right = alignment.rows()[1].cells();
        for (l, r) in left.iter().zip(right.iter()) {
            assert!(l.is_some() != r.is_some());
        }
    }

    #[test]
    fn test_align_groups() {
        let mut aligner = SpacerAligner::with_config(AlignConfigBuilder::default()
            .orientation(Orientation::Native)
            .build().unwrap()
        ).unwrap();
        aligner.add_array("first", vec![SPACER_A, SPACER_B]).unwrap();
        aligner.add_array("second", vec![SPACER_E, SPACER_F]).unwrap();
        aligner.add_array("third", vec![SPACER_B, SPACER_C]).unwrap();
        aligner.add_array("empty", vec![]).unwrap();

        let groups = aligner.align_groups().unwrap();
        assert_eq!(groups.len(), 2);

        // A=1, E=2, B=3, F=4, C=5 after sorting the native sequences
        assert_eq!(groups[0].order(), &ids(&["1", "3", "5"]));
        assert_eq!(groups[0].rows().iter().map(|r| r.name()).collect::<Vec<_>>(), vec!["first", "third"]);
        assert_eq!(groups[1].order(), &ids(&["2", "4"]));
        assert_eq!(groups[1].rows().iter().map(|r| r.name()).collect::<Vec<_>>(), vec!["second"]);
    }

    #[test]
    fn test_empty_corpus() {
        let aligner = SpacerAligner::default();
        let alignment = aligner.align().unwrap();
        assert!(alignment.order().is_empty());
        assert!(alignment.rows().is_empty());
        assert!(aligner.align_groups().unwrap().is_empty());

        let strict = SpacerAligner::with_config(AlignConfigBuilder::default()
            .require_non_empty(true)
            .build().unwrap()
        ).unwrap();
        let err = strict.align().unwrap_err();
        assert_eq!(err.downcast_ref::<SpacerOrderError>(), Some(&SpacerOrderError::EmptyInput));
    }

    #[test]
    fn test_errors() {
        let mut aligner = SpacerAligner::default();
        aligner.add_array("genome_1", vec![SPACER_A]).unwrap();
        let err = aligner.add_array("genome_1", vec![SPACER_B]).unwrap_err();
        assert_eq!(err.to_string(), "Array name \"genome_1\" was provided more than once");

        // non-nucleotide spacer under canonical orientation
        aligner.add_array("genome_2", vec![b"ACGTXACGT".as_slice()]).unwrap();
        let err = aligner.align().unwrap_err();
        assert!(matches!(err.downcast_ref::<SpacerOrderError>(), Some(SpacerOrderError::Clustering { .. })));
        assert!(err.to_string().contains("ACGTXACGT"));
    }

    #[test]
    fn test_write_tsv() {
        let mut aligner = SpacerAligner::default();
        aligner.add_array("genome_1", vec![SPACER_A, SPACER_B]).unwrap();
        aligner.add_array("genome_2", vec![SPACER_B]).unwrap();
        let alignment = aligner.align().unwrap();

        let mut buffer: Vec<u8> = vec![];
        alignment.write_tsv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "spacer_name\tspacer_alignment\tmisordered");
        assert!(lines[2].starts_with("genome_2\t"));
        assert!(lines[2].ends_with("\t-"));
    }

    #[test]
    fn test_configured_gap_marker() {
        let mut aligner = SpacerAligner::with_config(AlignConfigBuilder::default()
            .orientation(Orientation::Native)
            .gap_marker(".")
            .build().unwrap()
        ).unwrap();
        aligner.add_array("genome_1", vec![SPACER_A, SPACER_B]).unwrap();
        aligner.add_array("genome_2", vec![SPACER_B]).unwrap();
        aligner.add_array("genome_3", vec![SPACER_E, SPACER_F]).unwrap();

        // natively sorted: A=1, E=2, B=3, F=4, and the two chains interleave by id
        let alignment = aligner.align().unwrap();
        assert_eq!(alignment.gap_marker(), ".");
        let mut buffer: Vec<u8> = vec![];
        alignment.write_tsv(&mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "spacer_name\tspacer_alignment\tmisordered\n\
            genome_1\t1 . 3 .\t.\n\
            genome_2\t. . 3 .\t.\n\
            genome_3\t. 2 . 4\t.\n"
        );

        // every group carries the marker too
        let groups = aligner.align_groups().unwrap();
        assert!(groups.iter().all(|g| g.gap_marker() == "."));
    }
}
