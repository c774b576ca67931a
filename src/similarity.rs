/*!
Pluggable lookup of cluster representatives.
The clusterer asks an index for the representatives worth scoring against each new unit; the exhaustive index returns all of them, while the k-mer index only returns those sharing at least one k-mer.
*/

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use simple_error::bail;

use crate::align_config::SimilarityBackend;

/// A lookup structure over cluster representatives.
pub trait RepresentativeIndex {
    /// Registers a new representative for the cluster at `cluster_index`.
    /// Indices are expected to be inserted in increasing order starting at 0.
    /// # Arguments
    /// * `cluster_index` - the index of the cluster the representative stands for
    /// * `representative` - the representative unit
    fn insert(&mut self, cluster_index: usize, representative: &[u8]);

    /// Returns the cluster indices worth scoring against `unit`, in ascending order.
    /// # Arguments
    /// * `unit` - the unit looking for a cluster
    fn candidates(&self, unit: &[u8]) -> Vec<usize>;

    /// Returns the number of representatives registered so far
    fn len(&self) -> usize;

    /// Returns true if no representative has been registered
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Returns every representative as a candidate.
#[derive(Debug, Default)]
pub struct ExhaustiveIndex {
    /// Number of registered representatives
    count: usize
}

impl RepresentativeIndex for ExhaustiveIndex {
    fn insert(&mut self, cluster_index: usize, _representative: &[u8]) {
        self.count = self.count.max(cluster_index + 1);
    }

    fn candidates(&self, _unit: &[u8]) -> Vec<usize> {
        (0..self.count).collect()
    }

    fn len(&self) -> usize {
        self.count
    }
}

/// Inverted index from k-mers to the representatives containing them.
/// Representatives (and queries) shorter than `k` cannot be indexed and always fall back to exhaustive comparison.
#[derive(Debug)]
pub struct KmerIndex {
    /// The k-mer length
    k: usize,
    /// For each k-mer, the clusters whose representative contains it
    postings: HashMap<Vec<u8>, Vec<usize>>,
    /// Representatives shorter than k
    short_representatives: Vec<usize>,
    /// Number of registered representatives
    count: usize
}

impl KmerIndex {
    /// Creates an empty index.
    /// # Arguments
    /// * `k` - the k-mer length
    /// # Errors
    /// * if `k` is 0
    pub fn new(k: usize) -> Result<KmerIndex, Box<dyn std::error::Error>> {
        if k == 0 {
            bail!("k-mer length must be at least 1");
        }
        Ok(KmerIndex {
            k,
            postings: Default::default(),
            short_representatives: vec![],
            count: 0
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl RepresentativeIndex for KmerIndex {
    fn insert(&mut self, cluster_index: usize, representative: &[u8]) {
        self.count = self.count.max(cluster_index + 1);
        if representative.len() < self.k {
            self.short_representatives.push(cluster_index);
            return;
        }

        for kmer in representative.windows(self.k) {
            let entry = self.postings.entry(kmer.to_vec()).or_default();
            // a repeated k-mer within one representative is only recorded once
            if entry.last() != Some(&cluster_index) {
                entry.push(cluster_index);
            }
        }
    }

    fn candidates(&self, unit: &[u8]) -> Vec<usize> {
        if unit.len() < self.k {
            return (0..self.count).collect();
        }

        let mut found: HashSet<usize> = self.short_representatives.iter().cloned().collect();
        for kmer in unit.windows(self.k) {
            if let Some(clusters) = self.postings.get(kmer) {
                found.extend(clusters.iter().cloned());
            }
        }

        let mut candidates: Vec<usize> = found.into_iter().collect();
        candidates.sort_unstable();
        candidates
    }

    fn len(&self) -> usize {
        self.count
    }
}

/// Creates the representative index for a configured backend.
/// # Arguments
/// * `backend` - the configured similarity backend
/// # Errors
/// * if the backend parameters are invalid
pub fn build_index(backend: SimilarityBackend) -> Result<Box<dyn RepresentativeIndex>, Box<dyn std::error::Error>> {
    let index: Box<dyn RepresentativeIndex> = match backend {
        SimilarityBackend::Exhaustive => Box::<ExhaustiveIndex>::default(),
        SimilarityBackend::Kmer { k } => Box::new(KmerIndex::new(k)?)
    };
    Ok(index)
}
