/*!
Contains configuration information for the spacer ordering pipeline.
Typical usage is to use the builder to construct the config, e.g.
```
use spacer_order::align_config::{AlignConfig, AlignConfigBuilder, Orientation, SimilarityBackend};
let config: AlignConfig = AlignConfigBuilder::default()
    .identity_threshold(0.95)
    .orientation(Orientation::Native)
    .similarity_backend(SimilarityBackend::Kmer { k: 8 })
    .build()
    .unwrap();
```
*/

/// Controls whether a spacer and its reverse complement are treated as the same unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Each spacer is replaced by the lexicographically smaller of itself and its reverse complement.
    /// Requires a nucleotide alphabet.
    #[default]
    Canonical,
    /// Spacers are compared exactly as provided, any byte alphabet is allowed.
    Native
}

/// Controls which sequence length normalizes the edit distance when computing identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdentityNormalization {
    /// identity = 1 - edits / max(len1, len2)
    #[default]
    LongerSequence,
    /// identity = 1 - edits / min(len1, len2); more permissive for truncated spacers
    ShorterSequence
}

/// Controls how candidate cluster representatives are found for each unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SimilarityBackend {
    /// Every representative is scored, O(n*k) overall
    #[default]
    Exhaustive,
    /// Only representatives sharing at least one k-mer with the unit are scored
    Kmer {
        /// The k-mer length
        k: usize
    }
}

/**
Contains configuration information for the spacer ordering pipeline.
Typical usage is to use the builder to construct the config, e.g.
```
use spacer_order::align_config::{AlignConfig, AlignConfigBuilder, IdentityNormalization};
let config: AlignConfig = AlignConfigBuilder::default()
    .identity_threshold(0.8)
    .identity_normalization(IdentityNormalization::ShorterSequence)
    .build()
    .unwrap();
```
*/
#[derive(derive_builder::Builder, Clone, Debug)]
#[builder(default)]
pub struct AlignConfig {
    /// Minimum identity for a unit to join an existing cluster, must be in (0, 1]
    pub identity_threshold: f64,
    /// Reverse-complement handling for the units
    pub orientation: Orientation,
    /// The length used to normalize edit distance into identity
    pub identity_normalization: IdentityNormalization,
    /// The representative lookup strategy used while clustering
    pub similarity_backend: SimilarityBackend,
    /// The text written for a gap when emitting rows
    #[builder(setter(into))]
    pub gap_marker: String,
    /// If true, an empty corpus is reported as an error instead of an empty result
    pub require_non_empty: bool
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            // spacers from the same ancestral slot are typically near-identical
            identity_threshold: 0.9,
            orientation: Orientation::Canonical,
            identity_normalization: IdentityNormalization::LongerSequence,
            similarity_backend: SimilarityBackend::Exhaustive,
            // matches the downstream reporting tables
            gap_marker: "-".to_string(),
            // an empty corpus is a valid trivial case
            require_non_empty: false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AlignConfigBuilder::default().build().unwrap();
        assert_eq!(config.identity_threshold, 0.9);
        assert_eq!(config.orientation, Orientation::Canonical);
        assert_eq!(config.identity_normalization, IdentityNormalization::LongerSequence);
        assert_eq!(config.similarity_backend, SimilarityBackend::Exhaustive);
        assert_eq!(config.gap_marker, "-");
        assert!(!config.require_non_empty);
    }

    #[test]
    fn test_builder_overrides() {
        let config = AlignConfigBuilder::default()
            .gap_marker(".")
            .similarity_backend(SimilarityBackend::Kmer { k: 5 })
            .require_non_empty(true)
            .build().unwrap();
        assert_eq!(config.gap_marker, ".");
        assert_eq!(config.similarity_backend, SimilarityBackend::Kmer { k: 5 });
        assert!(config.require_non_empty);
    }
}
