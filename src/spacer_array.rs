/*!
Named spacer arrays, both as raw units and as cluster id sequences.
Raw arrays are converted once all units of the corpus have been clustered; the resulting `SpacerArray` values are immutable.
*/

use rustc_hash::FxHashSet as HashSet;

use crate::cluster::{ClusterId, SpacerClusters};
use crate::errors::SpacerOrderError;

/// A named array of raw units, as read by a record parser
#[derive(Clone, Debug, PartialEq)]
pub struct RawArray<'a> {
    /// Unique name of the array
    name: String,
    /// The units in array order
    units: Vec<&'a [u8]>
}

impl<'a> RawArray<'a> {
    /// Constructor
    pub fn new(name: impl Into<String>, units: Vec<&'a [u8]>) -> RawArray<'a> {
        RawArray {
            name: name.into(),
            units
        }
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn units(&self) -> &[&'a [u8]] {
        &self.units
    }
}

/// A named, ordered sequence of cluster ids
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpacerArray {
    /// Unique name of the array
    name: String,
    /// The cluster ids in array order
    cluster_ids: Vec<ClusterId>
}

impl SpacerArray {
    /// Constructor
    pub fn new(name: impl Into<String>, cluster_ids: Vec<ClusterId>) -> SpacerArray {
        SpacerArray {
            name: name.into(),
            cluster_ids
        }
    }

    /// Convenience constructor from anything that converts into cluster ids
    /// # Arguments
    /// * `name` - the array name
    /// * `ids` - the cluster ids in order
    pub fn from_ids<I, T>(name: impl Into<String>, ids: I) -> SpacerArray
    where
        I: IntoIterator<Item = T>,
        T: Into<ClusterId>
    {
        SpacerArray::new(name, ids.into_iter().map(|id| id.into()).collect())
    }

    /// Returns true if the array contains the cluster id
    pub fn contains(&self, id: &ClusterId) -> bool {
        self.cluster_ids.contains(id)
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cluster_ids(&self) -> &[ClusterId] {
        &self.cluster_ids
    }

    pub fn len(&self) -> usize {
        self.cluster_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cluster_ids.is_empty()
    }
}

/// Verifies that no array name is used twice.
/// # Arguments
/// * `names` - all array names in input order
/// # Errors
/// * `SpacerOrderError::DuplicateArrayName` naming the first repeated name
pub fn check_unique_names<'n>(names: impl IntoIterator<Item = &'n str>) -> Result<(), SpacerOrderError> {
    let mut seen: HashSet<&str> = Default::default();
    for name in names {
        if !seen.insert(name) {
            return Err(SpacerOrderError::DuplicateArrayName { array: name.to_string() });
        }
    }
    Ok(())
}

/// Converts raw arrays into cluster id arrays, preserving input order.
/// # Arguments
/// * `raw_arrays` - the raw arrays
/// * `clusters` - the clustering of every unit in `raw_arrays`
/// # Errors
/// * `SpacerOrderError::DuplicateArrayName` if two arrays share a name
/// * `SpacerOrderError::Clustering` if a unit cannot be canonicalized
/// * `SpacerOrderError::InconsistentArray` if a unit was not part of the clustering
pub fn assign_arrays(raw_arrays: &[RawArray], clusters: &SpacerClusters) -> Result<Vec<SpacerArray>, SpacerOrderError> {
    check_unique_names(raw_arrays.iter().map(|ra| ra.name()))?;

    raw_arrays.iter()
        .map(|raw_array| {
            let cluster_ids = raw_array.units().iter()
                .map(|&unit| {
                    clusters.assign(unit)?
                        .cloned()
                        .ok_or_else(|| SpacerOrderError::InconsistentArray {
                            array: raw_array.name().to_string(),
                            unit: String::from_utf8_lossy(unit).into_owned()
                        })
                })
                .collect::<Result<Vec<ClusterId>, SpacerOrderError>>()?;
            Ok(SpacerArray::new(raw_array.name(), cluster_ids))
        })
        .collect()
}
