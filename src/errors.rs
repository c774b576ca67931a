/*!
Error taxonomy for the ordering pipeline.
Public functions return `Result<_, Box<dyn std::error::Error>>`; when the failure is one of the kinds below, the boxed error is a `SpacerOrderError` and can be recovered with `downcast_ref`.
Cycles in the precedence graph are never errors, they are resolved and reported as misorders.
*/

use std::fmt;

/// The failure kinds that abort an ordering run.
#[derive(Clone, Debug, PartialEq)]
pub enum SpacerOrderError {
    /// No arrays or units were supplied and the config requires a non-empty corpus
    EmptyInput,
    /// Similarity is undefined for a unit under the current configuration
    Clustering {
        /// The offending unit, lossily decoded for display
        unit: String,
        /// Why the unit could not be clustered
        reason: String
    },
    /// An array references a unit without a cluster assignment
    InconsistentArray {
        array: String,
        unit: String
    },
    /// Two arrays were added with the same name
    DuplicateArrayName {
        array: String
    }
}

impl SpacerOrderError {
    /// Convenience constructor for clustering failures on a raw unit
    /// # Arguments
    /// * `unit` - the raw unit that failed
    /// * `reason` - a short description of the failure
    pub fn clustering(unit: &[u8], reason: impl Into<String>) -> SpacerOrderError {
        SpacerOrderError::Clustering {
            unit: String::from_utf8_lossy(unit).into_owned(),
            reason: reason.into()
        }
    }

    /// Clustering failure for an identity threshold outside of (0, 1]
    /// # Arguments
    /// * `threshold` - the rejected threshold
    pub fn invalid_threshold(threshold: f64) -> SpacerOrderError {
        SpacerOrderError::Clustering {
            unit: String::new(),
            reason: format!("identity threshold {threshold} is outside of (0, 1]")
        }
    }
}

impl fmt::Display for SpacerOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpacerOrderError::EmptyInput => write!(f, "No arrays or units were provided"),
            SpacerOrderError::Clustering { unit, reason } if unit.is_empty() => write!(f, "Failed to cluster units: {reason}"),
            SpacerOrderError::Clustering { unit, reason } => write!(f, "Failed to cluster unit \"{unit}\": {reason}"),
            SpacerOrderError::InconsistentArray { array, unit } => write!(f, "Array \"{array}\" references unit \"{unit}\" which has no cluster"),
            SpacerOrderError::DuplicateArrayName { array } => write!(f, "Array name \"{array}\" was provided more than once")
        }
    }
}

impl std::error::Error for SpacerOrderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_offenders() {
        let err = SpacerOrderError::clustering(b"ACGX", "symbol 'X' is not a nucleotide");
        assert_eq!(err.to_string(), "Failed to cluster unit \"ACGX\": symbol 'X' is not a nucleotide");

        let err = SpacerOrderError::invalid_threshold(1.5);
        assert_eq!(err.to_string(), "Failed to cluster units: identity threshold 1.5 is outside of (0, 1]");

        let err = SpacerOrderError::InconsistentArray { array: "genome_1".to_string(), unit: "ACGT".to_string() };
        assert_eq!(err.to_string(), "Array \"genome_1\" references unit \"ACGT\" which has no cluster");
    }

    #[test]
    fn test_boxed_downcast() {
        let boxed: Box<dyn std::error::Error> = Box::new(SpacerOrderError::DuplicateArrayName { array: "a".to_string() });
        assert_eq!(boxed.downcast_ref::<SpacerOrderError>(), Some(&SpacerOrderError::DuplicateArrayName { array: "a".to_string() }));
    }
}
