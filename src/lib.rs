/*!
# spacer_order
This library computes a consensus "strong order" over the spacers of many CRISPR arrays.
Spacers are clustered by sequence identity, each array becomes a sequence of cluster ids, and a single total order is chosen that agrees with as many observed adjacencies as possible.

Key benefits:
* Orientation-agnostic clustering, so arrays read from either strand collapse onto the same clusters
* Exact ordering whenever the arrays agree, with a feedback arc set heuristic only when they conflict
* Every conflicting adjacency is reported back against the array it came from

Performance notes:
* Clustering is the dominant cost; the k-mer backend avoids comparing every unit against every representative
* Ordering is near-linear in the number of adjacencies

# Example usage
```rust
use spacer_order::spacer_aligner::SpacerAligner;

let first: &[u8] = b"ACCGTTAGGCATTCAG";
let second: &[u8] = b"GGATCCTTAGCAGTAC";
let third: &[u8] = b"TTTCGGACAGTAAGCG";

// add all the arrays
let mut aligner: SpacerAligner = Default::default();
aligner.add_array("genome_1", vec![first, second, third]).unwrap();
aligner.add_array("genome_2", vec![first, second]).unwrap();
aligner.add_array("genome_3", vec![second, third]).unwrap();

// run the ordering and check the results
let alignment = aligner.align().unwrap();
assert_eq!(alignment.order().len(), 3);
assert_eq!(alignment.rows()[0].present_ids().len(), 3);
assert!(alignment.rows().iter().all(|r| r.misorders().is_empty()));
```
*/

/// Configuration for clustering and reporting
pub mod align_config;
/// Nucleotide validation and orientation handling
pub mod canonical;
/// Greedy identity clustering of spacers
pub mod cluster;
/// Error types shared by every stage
pub mod errors;
/// Utility for generating examples
pub mod example_gen;
/// Strong order solving: Kahn ordering and feedback arc set removal
pub mod order_solver;
/// The directed adjacency graph over cluster ids
pub mod precedence_graph;
/// Layout of each array over the strong order
pub mod reconstruct;
/// Basic pair-wise alignment utilities
pub mod sequence_alignment;
/// Candidate lookup for cluster representatives
pub mod similarity;
/// Main functionality that runs the whole pipeline
pub mod spacer_aligner;
/// Named arrays of spacers and cluster ids
pub mod spacer_array;
