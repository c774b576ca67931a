/*!
Maps raw spacer units onto a single representative form.
With `Orientation::Canonical`, a spacer and its reverse complement share the representative that is lexicographically smaller.

# Example usage
```rust
use spacer_order::align_config::Orientation;
use spacer_order::canonical::canonicalize;

// GGCA is the reverse complement of TGCC and sorts first
assert_eq!(canonicalize(b"TGCC", Orientation::Canonical).unwrap(), b"GGCA".to_vec());
assert_eq!(canonicalize(b"GGCA", Orientation::Canonical).unwrap(), b"GGCA".to_vec());
assert_eq!(canonicalize(b"TGCC", Orientation::Native).unwrap(), b"TGCC".to_vec());
```
*/

use crate::align_config::Orientation;
use crate::errors::SpacerOrderError;

/// Returns the complement of a single upper-case nucleotide, or None if it is not one of `ACGTN`.
fn complement(symbol: u8) -> Option<u8> {
    match symbol {
        b'A' => Some(b'T'),
        b'T' => Some(b'A'),
        b'C' => Some(b'G'),
        b'G' => Some(b'C'),
        b'N' => Some(b'N'),
        _ => None
    }
}

/// Upper-cases a nucleotide unit and verifies every symbol is in `ACGTN`.
/// # Arguments
/// * `unit` - the raw unit
/// # Errors
/// * if the unit is empty or contains a non-nucleotide symbol
pub fn validate_nucleotides(unit: &[u8]) -> Result<Vec<u8>, SpacerOrderError> {
    if unit.is_empty() {
        return Err(SpacerOrderError::clustering(unit, "unit is empty"));
    }

    let upper = unit.to_ascii_uppercase();
    if let Some(&bad) = upper.iter().find(|&&s| complement(s).is_none()) {
        return Err(SpacerOrderError::clustering(unit, format!("symbol '{}' is not a nucleotide", bad as char)));
    }
    Ok(upper)
}

/// Returns the reverse complement of an upper-case nucleotide sequence.
/// Symbols outside of `ACGTN` are passed through unchanged; use `validate_nucleotides` first when that matters.
/// # Arguments
/// * `sequence` - the sequence to reverse complement
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev()
        .map(|&s| complement(s).unwrap_or(s))
        .collect()
}

/// Returns the canonical form of a unit.
/// # Arguments
/// * `unit` - the raw unit
/// * `orientation` - whether reverse complements are collapsed
/// # Errors
/// * if the unit is empty
/// * if `orientation` is `Canonical` and the unit is not a nucleotide sequence
pub fn canonicalize(unit: &[u8], orientation: Orientation) -> Result<Vec<u8>, SpacerOrderError> {
    match orientation {
        Orientation::Native => {
            if unit.is_empty() {
                Err(SpacerOrderError::clustering(unit, "unit is empty"))
            } else {
                Ok(unit.to_vec())
            }
        },
        Orientation::Canonical => {
            let forward = validate_nucleotides(unit)?;
            let reverse = reverse_complement(&forward);
            Ok(forward.min(reverse))
        }
    }
}
