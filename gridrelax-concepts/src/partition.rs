//! Row-band decomposition of the grid interior.

use serde::{Deserialize, Serialize};

use crate::errors::SetupError;

/// Contiguous block of interior rows owned by one worker.
///
/// Both bounds are inclusive and always interior: `1 <= start_row <=
/// end_row <= dim - 2`. The halo rows above and below the block are read by
/// the owning worker but never written by it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Partition {
    /// First interior row owned by the worker.
    pub start_row: usize,
    /// Last interior row owned by the worker (inclusive).
    pub end_row: usize,
}

impl Partition {
    /// Number of rows owned by this partition.
    pub fn row_count(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    /// Row directly above the partition. Owned by the previous partition or,
    /// for the topmost partition, a fixed border row.
    pub fn halo_above(&self) -> usize {
        self.start_row - 1
    }

    /// Row directly below the partition. Owned by the next partition or, for
    /// the bottommost partition, a fixed border row.
    pub fn halo_below(&self) -> usize {
        self.end_row + 1
    }
}

/// Splits the `dimension - 2` interior rows of a grid over `worker_count`
/// workers into contiguous bands.
///
/// When the interior does not divide evenly, the first `interior %
/// worker_count` partitions receive one extra row. When there are more
/// workers than interior rows the worker count is clamped down so that no
/// empty partition is ever produced; the returned vector may therefore be
/// shorter than `worker_count`.
///
/// ```
/// use gridrelax_concepts::{partition_rows, Partition};
///
/// // 8 interior rows over 3 workers: 3 + 3 + 2
/// let parts = partition_rows(10, 3).unwrap();
/// assert_eq!(
///     parts,
///     vec![
///         Partition { start_row: 1, end_row: 3 },
///         Partition { start_row: 4, end_row: 6 },
///         Partition { start_row: 7, end_row: 8 },
///     ]
/// );
/// ```
pub fn partition_rows(dimension: usize, worker_count: usize) -> Result<Vec<Partition>, SetupError> {
    if dimension < 3 {
        return Err(SetupError(format!(
            "grid dimension must be at least 3 to contain an interior row, got {}",
            dimension
        )));
    }
    if worker_count == 0 {
        return Err(SetupError(
            "worker count must be at least 1".to_string(),
        ));
    }
    let interior = dimension - 2;
    let workers = worker_count.min(interior);
    let base = interior / workers;
    let remainder = interior % workers;
    let mut partitions = Vec::with_capacity(workers);
    let mut next_row = 1;
    for rank in 0..workers {
        let rows = base + usize::from(rank < remainder);
        partitions.push(Partition {
            start_row: next_row,
            end_row: next_row + rows - 1,
        });
        next_row += rows;
    }
    Ok(partitions)
}
