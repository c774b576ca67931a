/*!
Basic pair-wise comparison utilities used for clustering spacers.
Edit distance is computed with a wavefront (WFA) search that can stop early once a maximum number of edits is exceeded.
*/

use crate::align_config::IdentityNormalization;

/// Returns the full edit distance between two u8 slices by using a version of WFA.
/// # Arguments
/// * `v1` - the first sequence
/// * `v2` - the second sequence
/// # Examples
/// ```rust
/// use spacer_order::sequence_alignment::wfa_ed;
/// let v1: Vec<u8> = vec![0, 1, 2, 4, 5];
/// let v2: Vec<u8> = vec![0, 1, 3, 4, 5];
/// let v3: Vec<u8> = vec![1, 2, 3, 5];
/// assert_eq!(wfa_ed(&v1, &v1), 0);
/// assert_eq!(wfa_ed(&v1, &v2), 1);
/// assert_eq!(wfa_ed(&v1, &v3), 2);
/// ```
pub fn wfa_ed(v1: &[u8], v2: &[u8]) -> usize {
    // an unbounded search always reaches the end, at worst with max(len) edits
    wfa_ed_bounded(v1, v2, None).unwrap_or(v1.len().max(v2.len()))
}

/// Returns the edit distance between two u8 slices if it is at most `max_edits`, otherwise None.
/// The search only ever explores `2*max_edits+1` diagonals, so small bounds are cheap.
/// # Arguments
/// * `v1` - the first sequence
/// * `v2` - the second sequence
/// * `max_edits` - an optional upper bound on the edit distance; if None, the search is unbounded
/// # Examples
/// ```rust
/// use spacer_order::sequence_alignment::wfa_ed_bounded;
/// assert_eq!(wfa_ed_bounded(b"ACGTACGT", b"ACGAACGT", Some(1)), Some(1));
/// assert_eq!(wfa_ed_bounded(b"ACGTACGT", b"TTTTACGT", Some(1)), None);
/// ```
pub fn wfa_ed_bounded(v1: &[u8], v2: &[u8], max_edits: Option<usize>) -> Option<usize> {
    let l1 = v1.len() as isize;
    let l2 = v2.len() as isize;

    // the diagonal (j - i) that the end of both sequences sits on
    let final_diagonal = l2 - l1;
    if max_edits.map_or(false, |m| final_diagonal.unsigned_abs() > m) {
        // length difference alone exceeds the bound
        return None;
    }

    // wavefront[k] stores the furthest offset into v1 on diagonal (k - edits); -1 is unreachable
    let mut wavefront: Vec<isize> = vec![0];
    let mut edits: usize = 0;

    loop {
        let e = edits as isize;

        // extend every diagonal along its matches
        for (k, offset) in wavefront.iter_mut().enumerate() {
            if *offset < 0 {
                continue;
            }
            let diagonal = k as isize - e;
            let mut i = *offset;
            let mut j = i + diagonal;
            while i < l1 && j < l2 && v1[i as usize] == v2[j as usize] {
                i += 1;
                j += 1;
            }
            *offset = i;

            if diagonal == final_diagonal && i == l1 {
                return Some(edits);
            }
        }

        if max_edits.map_or(false, |m| edits >= m) {
            return None;
        }

        // wavefront for edits+1 has two more diagonals, slot k+1 in the next wave is the same diagonal as slot k now
        let mut next_wf: Vec<isize> = vec![-1; wavefront.len() + 2];
        for (k, &offset) in wavefront.iter().enumerate() {
            if offset < 0 {
                continue;
            }
            let i = offset;
            let j = i + (k as isize - e);

            if i < l1 {
                // v2 has a deletion relative to v1
                next_wf[k] = next_wf[k].max(i + 1);
            }
            if i < l1 && j < l2 {
                // mismatch
                next_wf[k + 1] = next_wf[k + 1].max(i + 1);
            }
            if j < l2 {
                // v2 has an insertion relative to v1
                next_wf[k + 2] = next_wf[k + 2].max(i);
            }
        }

        edits += 1;
        wavefront = next_wf;
    }
}

/// Returns the denominator used to turn edits into identity.
fn identity_length(l1: usize, l2: usize, normalization: IdentityNormalization) -> usize {
    match normalization {
        IdentityNormalization::LongerSequence => l1.max(l2),
        IdentityNormalization::ShorterSequence => l1.min(l2)
    }
}

/// Converts an edit distance into an identity in [0, 1].
/// # Arguments
/// * `edits` - the edit distance between the two sequences
/// * `l1` - length of the first sequence
/// * `l2` - length of the second sequence
/// * `normalization` - which length normalizes the edits
pub fn identity_from_edits(edits: usize, l1: usize, l2: usize, normalization: IdentityNormalization) -> f64 {
    let length = identity_length(l1, l2, normalization);
    if length == 0 {
        return if edits == 0 { 1.0 } else { 0.0 };
    }
    (1.0 - edits as f64 / length as f64).max(0.0)
}

/// Returns the identity of two sequences.
/// # Arguments
/// * `v1` - the first sequence
/// * `v2` - the second sequence
/// * `normalization` - which length normalizes the edits
/// # Examples
/// ```rust
/// use spacer_order::align_config::IdentityNormalization;
/// use spacer_order::sequence_alignment::sequence_identity;
/// assert_eq!(sequence_identity(b"AAAAAAAAAA", b"AAAAAAAAAT", IdentityNormalization::LongerSequence), 0.9);
/// ```
pub fn sequence_identity(v1: &[u8], v2: &[u8], normalization: IdentityNormalization) -> f64 {
    identity_from_edits(wfa_ed(v1, v2), v1.len(), v2.len(), normalization)
}

/// Returns the identity of two sequences only if it meets `threshold`.
/// The threshold is converted into an edit bound up front so dissimilar pairs exit early.
/// # Arguments
/// * `v1` - the first sequence
/// * `v2` - the second sequence
/// * `threshold` - the minimum identity
/// * `normalization` - which length normalizes the edits
pub fn identity_within(v1: &[u8], v2: &[u8], threshold: f64, normalization: IdentityNormalization) -> Option<f64> {
    let length = identity_length(v1.len(), v2.len(), normalization);
    // small epsilon so that e.g. 0.9 * 10 still allows exactly one edit
    let max_edits = ((1.0 - threshold) * length as f64 + 1e-9).floor().max(0.0) as usize;
    let edits = wfa_ed_bounded(v1, v2, Some(max_edits))?;
    let identity = identity_from_edits(edits, v1.len(), v2.len(), normalization);
    if identity + 1e-9 >= threshold {
        Some(identity)
    } else {
        None
    }
}
