/*!
Greedy clustering of near-identical spacers into stable cluster identifiers.
Canonical units are visited in sorted order; each one joins the most similar existing representative that meets the identity threshold, or starts a new cluster.
With `Orientation::Canonical`, a unit is also scored in reverse complement, since a substitution near either end can change which strand sorts first.
Cluster identifiers are assigned as "1", "2", ... in creation order.

# Example usage
```rust
use spacer_order::align_config::{AlignConfigBuilder, Orientation};
use spacer_order::cluster::{cluster_units, ClusterId};

let units: [&[u8]; 5] = [b"AAAAAAAAAAA", b"AAAAAAAAAAT", b"AAAAAAAAAAC", b"AAAAAAAAAAG", b"GGGGGGGGGGG"];
let config = AlignConfigBuilder::default()
    .identity_threshold(0.9)
    .orientation(Orientation::Native)
    .build().unwrap();

let clusters = cluster_units(units.iter().cloned(), &config).unwrap();
assert_eq!(clusters.len(), 2);
assert_eq!(clusters.assign(b"AAAAAAAAAAT").unwrap(), Some(&ClusterId::from_index(1)));
assert_eq!(clusters.assign(b"GGGGGGGGGGG").unwrap(), Some(&ClusterId::from_index(2)));
```
*/

use log::{debug, trace};
use rustc_hash::FxHashMap as HashMap;
use std::cmp::Ordering;
use std::fmt;

use crate::align_config::{AlignConfig, Orientation};
use crate::canonical::{canonicalize, reverse_complement};
use crate::errors::SpacerOrderError;
use crate::sequence_alignment::identity_within;
use crate::similarity::build_index;

/// Opaque, stable identifier of a cluster.
/// Ordering is numeric-aware: ids made only of digits compare by value and come before all other ids, which compare lexicographically.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClusterId(String);

impl ClusterId {
    /// Constructor
    pub fn new(id: impl Into<String>) -> ClusterId {
        ClusterId(id.into())
    }

    /// Creates the id of the `index`-th created cluster, 1-based
    pub fn from_index(index: usize) -> ClusterId {
        ClusterId(index.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric value if the id is made only of digits
    fn numeric_value(&self) -> Option<u128> {
        if !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit()) {
            self.0.parse().ok()
        } else {
            None
        }
    }
}

impl Ord for ClusterId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_value(), other.numeric_value()) {
            // string comparison breaks ties like "01" vs "1"
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0)
        }
    }
}

impl PartialOrd for ClusterId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClusterId {
    fn from(value: &str) -> Self {
        ClusterId::new(value)
    }
}

impl From<String> for ClusterId {
    fn from(value: String) -> Self {
        ClusterId(value)
    }
}

/// A single cluster of canonical units
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// The stable identifier
    id: ClusterId,
    /// The unit that founded the cluster; all other members were compared against it
    representative: Vec<u8>,
    /// All canonical members in sorted order, including the representative
    members: Vec<Vec<u8>>
}

impl Cluster {
    // Getters
    pub fn id(&self) -> &ClusterId {
        &self.id
    }

    pub fn representative(&self) -> &[u8] {
        &self.representative
    }

    pub fn members(&self) -> &[Vec<u8>] {
        &self.members
    }
}

/// The result of clustering a corpus: a partition of all canonical units.
#[derive(Clone, Debug)]
pub struct SpacerClusters {
    /// Clusters in creation order
    clusters: Vec<Cluster>,
    /// Canonical unit to index into `clusters`
    lookup: HashMap<Vec<u8>, usize>,
    /// The orientation used to canonicalize, needed to look up raw units
    orientation: Orientation
}

impl SpacerClusters {
    /// Returns the cluster id for an already canonical unit
    /// # Arguments
    /// * `canonical` - the canonical unit
    pub fn cluster_of(&self, canonical: &[u8]) -> Option<&ClusterId> {
        self.lookup.get(canonical).map(|&ci| &self.clusters[ci].id)
    }

    /// Canonicalizes a raw unit and returns its cluster id, or None if the unit was never clustered.
    /// # Arguments
    /// * `unit` - the raw unit
    /// # Errors
    /// * if the unit cannot be canonicalized
    pub fn assign(&self, unit: &[u8]) -> Result<Option<&ClusterId>, SpacerOrderError> {
        let canonical = canonicalize(unit, self.orientation)?;
        Ok(self.cluster_of(&canonical))
    }

    // Getters
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}

/// Canonicalizes and clusters a collection of raw units.
/// Duplicate units are allowed; the output does not depend on input order.
/// # Arguments
/// * `units` - all raw units of the corpus
/// * `config` - provides the threshold, orientation, normalization, and similarity backend
/// # Errors
/// * `SpacerOrderError::Clustering` if the threshold is outside (0, 1] or a unit cannot be canonicalized
/// * if the similarity backend is misconfigured
pub fn cluster_units<'a>(units: impl IntoIterator<Item = &'a [u8]>, config: &AlignConfig) -> Result<SpacerClusters, Box<dyn std::error::Error>> {
    let mut canonical_units: Vec<Vec<u8>> = units.into_iter()
        .map(|u| canonicalize(u, config.orientation))
        .collect::<Result<_, _>>()?;
    canonical_units.sort();
    canonical_units.dedup();

    cluster_canonical(&canonical_units, config)
}

/// Clusters a set of canonical units, which must already be sorted and de-duplicated.
/// # Arguments
/// * `canonical_units` - sorted, unique canonical units
/// * `config` - provides the threshold, normalization, and similarity backend
/// # Errors
/// * `SpacerOrderError::Clustering` if the threshold is outside (0, 1]
/// * if the similarity backend is misconfigured
pub fn cluster_canonical(canonical_units: &[Vec<u8>], config: &AlignConfig) -> Result<SpacerClusters, Box<dyn std::error::Error>> {
    let threshold = config.identity_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(SpacerOrderError::invalid_threshold(threshold).into());
    }
    debug_assert!(canonical_units.windows(2).all(|w| w[0] < w[1]));

    let mut index = build_index(config.similarity_backend)?;
    let mut clusters: Vec<Cluster> = vec![];
    let mut lookup: HashMap<Vec<u8>, usize> = Default::default();

    for unit in canonical_units.iter() {
        if unit.is_empty() {
            return Err(SpacerOrderError::clustering(unit, "unit is empty").into());
        }

        let reverse = match config.orientation {
            Orientation::Canonical => Some(reverse_complement(unit)),
            Orientation::Native => None
        };
        let mut candidates = index.candidates(unit);
        if let Some(rc) = reverse.as_ref() {
            candidates.extend(index.candidates(rc));
            candidates.sort_unstable();
            candidates.dedup();
        }

        // best identity wins, ties go to the earliest cluster
        let mut best: Option<(usize, f64)> = None;
        for candidate in candidates {
            let representative = &clusters[candidate].representative;
            let forward_identity = identity_within(unit, representative, threshold, config.identity_normalization);
            let reverse_identity = reverse.as_ref()
                .and_then(|rc| identity_within(rc, representative, threshold, config.identity_normalization));
            let identity = match (forward_identity, reverse_identity) {
                (Some(f), Some(r)) => Some(f.max(r)),
                (f, r) => f.or(r)
            };
            if let Some(identity) = identity {
                if best.map_or(true, |(_, best_identity)| identity > best_identity) {
                    best = Some((candidate, identity));
                }
            }
        }

        let cluster_index = match best {
            Some((cluster_index, identity)) => {
                trace!("{} joins cluster {} ({identity:.3})", String::from_utf8_lossy(unit), clusters[cluster_index].id);
                clusters[cluster_index].members.push(unit.clone());
                cluster_index
            },
            None => {
                let cluster_index = clusters.len();
                let id = ClusterId::from_index(cluster_index + 1);
                trace!("{} founds cluster {id}", String::from_utf8_lossy(unit));
                index.insert(cluster_index, unit);
                clusters.push(Cluster {
                    id,
                    representative: unit.clone(),
                    members: vec![unit.clone()]
                });
                cluster_index
            }
        };
        lookup.insert(unit.clone(), cluster_index);
    }

    debug!("Clustered {} unique units into {} clusters", canonical_units.len(), clusters.len());
    Ok(SpacerClusters {
        clusters,
        lookup,
        orientation: config.orientation
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use itertools::Itertools;

    use crate::align_config::{AlignConfigBuilder, IdentityNormalization, SimilarityBackend};

    fn native_config(threshold: f64) -> AlignConfig {
        AlignConfigBuilder::default()
            .identity_threshold(threshold)
            .orientation(Orientation::Native)
            .build().unwrap()
    }

    #[test]
    fn test_cluster_id_order() {
        let ids: Vec<ClusterId> = ["10", "b", "2", "a", "1", "01"].iter()
            .map(|&s| ClusterId::from(s))
            .sorted()
            .collect();
        let expected: Vec<ClusterId> = ["01", "1", "2", "10", "a", "b"].iter()
            .map(|&s| ClusterId::from(s))
            .collect();
        assert_eq!(ids, expected);
        assert_eq!(ClusterId::from_index(3).to_string(), "3");
    }

    #[test]
    fn test_near_identical_units() {
        // lower-case units are fine when compared natively
        let units: [&[u8]; 5] = [b"aaaaaaaaaaa", b"aaaaaaaaaat", b"aaaaaaaaaac", b"aaaaaaaaaag", b"ggggggggggg"];
        let clusters = cluster_units(units.iter().cloned(), &native_config(0.9)).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters.clusters()[0].representative(), b"aaaaaaaaaaa");
        assert_eq!(clusters.clusters()[0].members().len(), 4);
        assert_eq!(clusters.clusters()[1].members(), &[b"ggggggggggg".to_vec()]);

        // a stricter threshold leaves every unit alone
        let clusters = cluster_units(units.iter().cloned(), &native_config(1.0)).unwrap();
        assert_eq!(clusters.len(), 5);
    }

    #[test]
    fn test_partition() {
        let units: [&[u8]; 6] = [b"ACGTACGTAA", b"ACGTACGTAT", b"TTGCAGGCAA", b"TTGCAGGCAT", b"GGGGCCCCAA", b"ACGTACGTAA"];
        let clusters = cluster_units(units.iter().cloned(), &native_config(0.9)).unwrap();

        // every unit maps to exactly one cluster, and members never overlap
        for unit in units.iter() {
            assert!(clusters.assign(unit).unwrap().is_some());
        }
        let total_members: usize = clusters.clusters().iter().map(|c| c.members().len()).sum();
        assert_eq!(total_members, 5);
        assert_eq!(clusters.len(), 3);
    }

    #[test]
    fn test_input_order_independent() {
        let units: [&[u8]; 5] = [b"TTGCAGGCAA", b"ACGTACGTAT", b"GGGGCCCCAA", b"ACGTACGTAA", b"TTGCAGGCAT"];
        let forward = cluster_units(units.iter().cloned(), &native_config(0.9)).unwrap();
        let backward = cluster_units(units.iter().rev().cloned(), &native_config(0.9)).unwrap();
        assert_eq!(forward.clusters(), backward.clusters());
    }

    #[test]
    fn test_recluster_representatives() {
        let units: [&[u8]; 6] = [b"ACGTACGTAA", b"ACGTACGTAT", b"TTGCAGGCAA", b"TTGCAGGCAT", b"GGGGCCCCAA", b"GGGGCCCCAT"];
        let config = native_config(0.9);
        let clusters = cluster_units(units.iter().cloned(), &config).unwrap();

        let representatives: Vec<&[u8]> = clusters.clusters().iter().map(|c| c.representative()).collect();
        let reclustered = cluster_units(representatives.iter().cloned(), &config).unwrap();
        assert_eq!(reclustered.len(), clusters.len());
        for cluster in clusters.clusters() {
            assert_eq!(reclustered.cluster_of(cluster.representative()), Some(cluster.id()));
        }
    }

    #[test]
    fn test_reverse_complement_collapses() {
        let forward = b"ACCGTTAGGCAT".to_vec();
        let reverse = reverse_complement(&forward);
        let config = AlignConfigBuilder::default().identity_threshold(1.0).build().unwrap();
        let clusters = cluster_units([forward.as_slice(), reverse.as_slice()], &config).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.orientation(), Orientation::Canonical);
        assert_eq!(clusters.assign(&forward).unwrap(), clusters.assign(&reverse).unwrap());

        // natively, they are two different spacers
        let clusters = cluster_units([forward.as_slice(), reverse.as_slice()], &native_config(1.0)).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters.orientation(), Orientation::Native);
    }

    #[test]
    fn test_noise_across_strands() {
        // the substitution at the first base flips which strand sorts first
        let spacer = b"TCCGTTAGGCATTCAGGATCCAATGCAGTCG".to_vec();
        let mut noisy = spacer.clone();
        noisy[0] = b'A';
        let config = AlignConfigBuilder::default().build().unwrap();
        let canonical_spacer = canonicalize(&spacer, Orientation::Canonical).unwrap();
        let canonical_noisy = canonicalize(&noisy, Orientation::Canonical).unwrap();
        assert_eq!(canonical_spacer, reverse_complement(&spacer));
        assert_eq!(canonical_noisy, noisy);

        let clusters = cluster_units([spacer.as_slice(), noisy.as_slice()], &config).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters.assign(&spacer).unwrap(), clusters.assign(&noisy).unwrap());
    }

    #[test]
    fn test_kmer_backend_matches_exhaustive() {
        let units: [&[u8]; 6] = [b"ACGTACGTAACC", b"ACGTACGTATCC", b"TTGCAGGCAAGG", b"TTGCAGGCATGG", b"GGGGCCCCAATT", b"GGGGCCCCATTT"];
        let exhaustive = cluster_units(units.iter().cloned(), &native_config(0.9)).unwrap();
        let kmer = cluster_units(units.iter().cloned(), &AlignConfigBuilder::default()
            .identity_threshold(0.9)
            .orientation(Orientation::Native)
            .similarity_backend(SimilarityBackend::Kmer { k: 4 })
            .build().unwrap()
        ).unwrap();
        assert_eq!(exhaustive.clusters(), kmer.clusters());
    }

    #[test]
    fn test_shorter_normalization() {
        // one unit is the other with two bases trimmed
        let units: [&[u8]; 2] = [b"ACGTACGTAC", b"ACGTACGT"];
        let longer = cluster_units(units.iter().cloned(), &native_config(0.8)).unwrap();
        assert_eq!(longer.len(), 1);
        let shorter = cluster_units(units.iter().cloned(), &AlignConfigBuilder::default()
            .identity_threshold(0.8)
            .orientation(Orientation::Native)
            .identity_normalization(IdentityNormalization::ShorterSequence)
            .build().unwrap()
        ).unwrap();
        assert_eq!(shorter.len(), 2);
    }

    #[test]
    fn test_empty_corpus() {
        let clusters = cluster_units(std::iter::empty(), &native_config(0.9)).unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_errors() {
        let units: [&[u8]; 1] = [b"ACGT"];
        let err = cluster_units(units.iter().cloned(), &native_config(0.0)).unwrap_err();
        assert_eq!(err.downcast_ref::<SpacerOrderError>(), Some(&SpacerOrderError::invalid_threshold(0.0)));
        assert!(cluster_units(units.iter().cloned(), &native_config(1.2)).is_err());

        // canonical orientation requires nucleotides
        let units: [&[u8]; 2] = [b"ACGT", b"ACGZ"];
        let config = AlignConfigBuilder::default().build().unwrap();
        let err = cluster_units(units.iter().cloned(), &config).unwrap_err();
        assert!(matches!(err.downcast_ref::<SpacerOrderError>(), Some(SpacerOrderError::Clustering { .. })));
    }
}
