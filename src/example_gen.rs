
use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};

use crate::canonical::reverse_complement;

const NUCLEOTIDES: [u8; 4] = *b"ACGT";

/// A generated array along with the true slot of every spacer
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticArray {
    /// Array name, "array_{i}"
    pub name: String,
    /// Index into the true spacer list for each position
    pub truth_indices: Vec<usize>,
    /// The observed spacers, possibly mutated or flipped
    pub spacers: Vec<Vec<u8>>
}

impl SyntheticArray {
    /// Returns the spacers as slices, ready for `SpacerAligner::add_array(...)`
    pub fn spacer_slices(&self) -> Vec<&[u8]> {
        self.spacers.iter().map(|s| s.as_slice()).collect()
    }
}

/// Creates a corpus of arrays we can verify is working.
/// Each array is a contiguous window of a random true spacer order.
/// # Arguments
/// * `num_spacers` - the number of true spacers
/// * `spacer_len` - the length of each true spacer
/// * `num_arrays` - the number of arrays to generate from the true order
/// * `mutation_rate` - per-base substitution rate applied to every observed spacer
/// * `flip_rate` - chance that an observed spacer is reverse complemented
/// * `swap_rate` - chance that a spacer is swapped with its right neighbor
/// * `seed` - the random seed, the output is fully determined by the arguments
pub fn generate_arrays(
    num_spacers: usize, spacer_len: usize, num_arrays: usize,
    mutation_rate: f64, flip_rate: f64, swap_rate: f64, seed: u64
) -> (Vec<Vec<u8>>, Vec<SyntheticArray>) {
    assert!(num_spacers > 0);
    assert!(spacer_len > 0);
    assert!((0.0..=1.0).contains(&mutation_rate));
    assert!((0.0..=1.0).contains(&flip_rate));
    assert!((0.0..=1.0).contains(&swap_rate));

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let base_distribution = Uniform::new(0, NUCLEOTIDES.len());
    let basem1_distribution = Uniform::new(1, NUCLEOTIDES.len());
    let start_distribution = Uniform::new(0, num_spacers);
    let event_distribution = Uniform::new(0.0, 1.0);

    let truth: Vec<Vec<u8>> = (0..num_spacers)
        .map(|_i| {
            (0..spacer_len)
                .map(|_j| NUCLEOTIDES[rng.sample(base_distribution)])
                .collect()
        })
        .collect();

    let arrays: Vec<SyntheticArray> = (0..num_arrays)
        .map(|array_index| {
            let start = rng.sample(start_distribution);
            let length = rng.gen_range(1..=(num_spacers - start));
            let mut truth_indices: Vec<usize> = (start..(start + length)).collect();

            let mut position = 0;
            while position + 1 < truth_indices.len() {
                if rng.sample(event_distribution) < swap_rate {
                    truth_indices.swap(position, position + 1);
                    // do not let a spacer travel further than one slot
                    position += 2;
                } else {
                    position += 1;
                }
            }

            let spacers: Vec<Vec<u8>> = truth_indices.iter()
                .map(|&truth_index| {
                    let mut spacer: Vec<u8> = truth[truth_index].iter()
                        .map(|&c| {
                            if rng.sample(event_distribution) < mutation_rate {
                                // substitution to any other base
                                let offset = rng.sample(basem1_distribution);
                                let c_index = NUCLEOTIDES.iter().position(|&n| n == c).unwrap_or(0);
                                NUCLEOTIDES[(c_index + offset) % NUCLEOTIDES.len()]
                            } else {
                                c
                            }
                        })
                        .collect();
                    if rng.sample(event_distribution) < flip_rate {
                        spacer = reverse_complement(&spacer);
                    }
                    spacer
                })
                .collect();

            SyntheticArray {
                name: format!("array_{array_index}"),
                truth_indices,
                spacers
            }
        })
        .collect();

    (truth, arrays)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::spacer_aligner::SpacerAligner;

    #[test]
    fn test_windows_without_noise() {
        let (truth, arrays) = generate_arrays(20, 30, 10, 0.0, 0.0, 0.0, 0);
        assert_eq!(truth.len(), 20);
        assert!(truth.iter().all(|t| t.len() == 30));
        assert_eq!(arrays.len(), 10);
        for array in arrays.iter() {
            assert!(!array.truth_indices.is_empty());
            assert!(array.truth_indices.windows(2).all(|w| w[0] + 1 == w[1]));
            for (&truth_index, spacer) in array.truth_indices.iter().zip(array.spacers.iter()) {
                assert_eq!(spacer, &truth[truth_index]);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let first = generate_arrays(15, 25, 8, 0.02, 0.3, 0.1, 42);
        let second = generate_arrays(15, 25, 8, 0.02, 0.3, 0.1, 42);
        assert_eq!(first, second);

        let other = generate_arrays(15, 25, 8, 0.02, 0.3, 0.1, 43);
        assert_ne!(first, other);
    }

    #[test]
    fn test_noisy_corpus_recovers_truth() {
        // mutations and flips only, so no array contradicts the true order
        let (truth, arrays) = generate_arrays(12, 32, 20, 0.01, 0.5, 0.0, 7);
        let mut aligner = SpacerAligner::default();
        for array in arrays.iter() {
            aligner.add_array(&array.name, array.spacer_slices()).unwrap();
        }

        let alignment = aligner.align().unwrap();
        assert!(alignment.order().len() <= truth.len());
        assert!(!alignment.solution().cycles_resolved());
        for row in alignment.rows() {
            assert!(row.misorders().is_empty());
        }

        // each array must appear in the strong order in the same order it was written
        let positions = alignment.solution().positions();
        for array in alignment.arrays() {
            let array_positions: Vec<usize> = array.cluster_ids().iter().map(|id| positions[id]).collect();
            assert!(array_positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
