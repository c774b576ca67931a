/*!
Projects each array onto the strong order.
Every row has one cell per position of the strong order, holding the cluster id if the array contains it and a gap otherwise.
Rows also carry the misorders attributed to their array.

# Example usage
```rust
use spacer_order::order_solver::solve_order;
use spacer_order::precedence_graph::PrecedenceGraph;
use spacer_order::reconstruct::reconstruct;
use spacer_order::spacer_array::SpacerArray;

let arrays = [
    SpacerArray::from_ids("array_1", ["a", "b", "c"]),
    SpacerArray::from_ids("array_2", ["a", "c"]),
];
let solution = solve_order(&PrecedenceGraph::build(&arrays).unwrap());
let rows = reconstruct(&arrays, &solution).unwrap();
assert_eq!(rows[1].to_string(), "array_2\ta - c\t-");
```
*/

use itertools::Itertools;
use log::warn;
use std::fmt;
use std::io::Write;

use crate::cluster::ClusterId;
use crate::errors::SpacerOrderError;
use crate::order_solver::{Misorder, OrderSolution};
use crate::spacer_array::SpacerArray;

/// Column names of the tabular report
pub const TSV_HEADER: [&str; 3] = ["spacer_name", "spacer_alignment", "misordered"];

/// One array laid out over the strong order
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedRow {
    /// The array name
    name: String,
    /// One cell per strong order position; None is a gap
    cells: Vec<Option<ClusterId>>,
    /// Misorders of this array, possibly empty
    misorders: Vec<Misorder>,
    /// Cluster ids that occurred more than once in the array; only one cell can show them
    duplicates: Vec<ClusterId>
}

impl AlignedRow {
    /// Returns the non-gap cells in order
    pub fn present_ids(&self) -> Vec<&ClusterId> {
        self.cells.iter().flatten().collect()
    }

    /// Renders the row as a tab-separated line
    /// # Arguments
    /// * `gap_marker` - the text used for gaps and for an empty misorder list
    pub fn to_tsv_line(&self, gap_marker: &str) -> String {
        let cells = self.cells.iter()
            .map(|c| c.as_ref().map_or(gap_marker, |id| id.as_str()))
            .join(" ");
        let misorders = if self.misorders.is_empty() {
            gap_marker.to_string()
        } else {
            self.misorders.iter().join(" ")
        };
        format!("{}\t{cells}\t{misorders}", self.name)
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[Option<ClusterId>] {
        &self.cells
    }

    pub fn misorders(&self) -> &[Misorder] {
        &self.misorders
    }

    pub fn duplicates(&self) -> &[ClusterId] {
        &self.duplicates
    }
}

/// Renders with the default `-` gap marker; use `to_tsv_line` for a configured one
impl fmt::Display for AlignedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tsv_line("-"))
    }
}

/// Lays out every array over the strong order, in input order.
/// # Arguments
/// * `arrays` - the arrays that produced `solution`
/// * `solution` - the strong order and misorders
/// # Errors
/// * `SpacerOrderError::InconsistentArray` if an array contains a cluster id missing from the order
pub fn reconstruct(arrays: &[SpacerArray], solution: &OrderSolution) -> Result<Vec<AlignedRow>, SpacerOrderError> {
    let positions = solution.positions();
    let width = solution.order().len();

    arrays.iter()
        .map(|array| {
            let mut cells: Vec<Option<ClusterId>> = vec![None; width];
            let mut duplicates: Vec<ClusterId> = vec![];
            for id in array.cluster_ids().iter() {
                let position = *positions.get(id)
                    .ok_or_else(|| SpacerOrderError::InconsistentArray {
                        array: array.name().to_string(),
                        unit: id.to_string()
                    })?;

                // the last occurrence wins, which for a single global order is the same cell
                if cells[position].replace(id.clone()).is_some() && !duplicates.contains(id) {
                    duplicates.push(id.clone());
                }
            }

            if !duplicates.is_empty() {
                warn!("Array {} contains repeated clusters that a single order cannot represent: {}", array.name(), duplicates.iter().join(", "));
            }

            Ok(AlignedRow {
                name: array.name().to_string(),
                cells,
                misorders: solution.misorders_for(array.name()).to_vec(),
                duplicates
            })
        })
        .collect()
}

/// Writes the tabular report: a header line and then one line per row.
/// # Arguments
/// * `writer` - the output destination
/// * `rows` - the aligned rows
/// * `gap_marker` - the text used for gaps
/// # Errors
/// * if writing fails
pub fn write_alignment_tsv<W: Write>(writer: &mut W, rows: &[AlignedRow], gap_marker: &str) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(writer, "{}", TSV_HEADER.join("\t"))?;
    for row in rows.iter() {
        writeln!(writer, "{}", row.to_tsv_line(gap_marker))?;
    }
    Ok(())
}
