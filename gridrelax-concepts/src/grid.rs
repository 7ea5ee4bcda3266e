//! The square grid store shared by every execution model.
//!
//! A [Grid] owns the full N×N field of values in the shared-memory variant and
//! acts as the source/sink of row bands in the distributed variant.
//! Border cells (row or column `0` or `N-1`) are fixed boundary conditions:
//! no engine component mutates them after initialisation.

use num::Float;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::errors::{IndexError, SetupError};
use crate::partition::Partition;

/// Square N×N field of floating point values stored in row-major order.
///
/// ```
/// use gridrelax_concepts::Grid;
///
/// let grid: Grid<f64> = Grid::from_fn(4, |row, col| (row * 4 + col) as f64).unwrap();
/// assert_eq!(grid.dim(), 4);
/// assert_eq!(grid.get(1, 2), 6.0);
/// assert!(grid.is_interior(1, 1));
/// assert!(!grid.is_interior(0, 3));
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Grid<F = f64> {
    /// Side length N.
    dim: usize,
    /// Row-major cell values of length `dim * dim`.
    data: Vec<F>,
}

impl<F> Grid<F>
where
    F: Float,
{
    /// Creates a grid filled with a constant value.
    ///
    /// Returns a [SetupError] for dimensions below 3 since such a grid has no
    /// interior row to relax.
    pub fn new(dim: usize, fill: F) -> Result<Self, SetupError> {
        Self::check_dim(dim)?;
        Ok(Self {
            dim,
            data: vec![fill; dim * dim],
        })
    }

    /// Creates a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(dim: usize, mut f: impl FnMut(usize, usize) -> F) -> Result<Self, SetupError> {
        Self::check_dim(dim)?;
        let data = (0..dim * dim).map(|n| f(n / dim, n % dim)).collect();
        Ok(Self { dim, data })
    }

    /// Takes ownership of an existing row-major buffer.
    pub fn from_raw(dim: usize, data: Vec<F>) -> Result<Self, SetupError> {
        Self::check_dim(dim)?;
        if data.len() != dim * dim {
            return Err(SetupError(format!(
                "buffer of length {} does not match grid dimension {}",
                data.len(),
                dim
            )));
        }
        Ok(Self { dim, data })
    }

    /// Populates a grid with reproducible whole-valued samples in `0..10`.
    ///
    /// Mirrors the classic seeded initialisation of relaxation test grids.
    /// The same seed always produces the same grid.
    ///
    /// ```
    /// use gridrelax_concepts::Grid;
    ///
    /// let g1: Grid<f64> = Grid::random(10, 1000).unwrap();
    /// let g2: Grid<f64> = Grid::random(10, 1000).unwrap();
    /// assert_eq!(g1, g2);
    /// ```
    pub fn random(dim: usize, seed: u64) -> Result<Self, SetupError> {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        Self::from_fn(dim, |_, _| {
            // 0..=9 is exactly representable in both f32 and f64
            F::from(rng.gen_range(0..10u32)).unwrap_or_else(F::zero)
        })
    }

    /// Grids below 3x3 have no interior cell and cannot be relaxed.
    fn check_dim(dim: usize) -> Result<(), SetupError> {
        if dim < 3 {
            return Err(SetupError(format!(
                "grid dimension must be at least 3 to contain an interior row, got {}",
                dim
            )));
        }
        Ok(())
    }

    /// Side length N of the grid.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Value at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> F {
        self.data[row * self.dim + col]
    }

    /// Overwrites the value at `(row, col)`.
    ///
    /// Engine components only ever call this for interior cells; the border
    /// invariant is kept by the callers and checked in the test suites.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: F) {
        self.data[row * self.dim + col] = value;
    }

    /// Whether `(row, col)` lies strictly inside the fixed border.
    #[inline]
    pub fn is_interior(&self, row: usize, col: usize) -> bool {
        row > 0 && row < self.dim - 1 && col > 0 && col < self.dim - 1
    }

    /// Iterates over all interior cell coordinates in row-major order.
    pub fn interior(&self) -> impl Iterator<Item = (usize, usize)> {
        let dim = self.dim;
        (1..dim - 1).flat_map(move |row| (1..dim - 1).map(move |col| (row, col)))
    }

    /// Borrows one full row.
    pub fn row(&self, row: usize) -> &[F] {
        &self.data[row * self.dim..(row + 1) * self.dim]
    }

    /// Borrows the whole row-major buffer.
    pub fn as_slice(&self) -> &[F] {
        &self.data
    }

    /// Copies the rows of a partition plus its two halo rows into a fresh
    /// buffer of `(row_count + 2) * dim` values.
    ///
    /// Row `0` of the buffer is the halo row above the partition and the last
    /// buffer row is the halo row below it; both are owned by a neighbouring
    /// partition (or are fixed border rows at the grid edges).
    pub fn band_with_halo(&self, partition: &Partition) -> Vec<F> {
        let lo = partition.halo_above() * self.dim;
        let hi = (partition.halo_below() + 1) * self.dim;
        self.data[lo..hi].to_vec()
    }

    /// Writes the owned rows of a partition back into the grid.
    ///
    /// `rows` holds `partition.row_count()` full rows without halos. Only
    /// interior columns are copied so border columns cannot be clobbered by a
    /// stale band.
    pub fn write_interior_rows(
        &mut self,
        partition: &Partition,
        rows: &[F],
    ) -> Result<(), IndexError> {
        if rows.len() != partition.row_count() * self.dim {
            return Err(IndexError(format!(
                "band of {} values does not hold {} rows of length {}",
                rows.len(),
                partition.row_count(),
                self.dim
            )));
        }
        if partition.start_row < 1 || partition.end_row >= self.dim - 1 {
            return Err(IndexError(format!(
                "partition rows {}..={} are not interior rows of a grid of dimension {}",
                partition.start_row, partition.end_row, self.dim
            )));
        }
        for (offset, row) in (partition.start_row..=partition.end_row).enumerate() {
            for col in 1..self.dim - 1 {
                self.data[row * self.dim + col] = rows[offset * self.dim + col];
            }
        }
        Ok(())
    }

    /// Largest absolute difference over all interior cells of two grids.
    pub fn max_interior_diff(&self, other: &Self) -> Result<F, IndexError> {
        if self.dim != other.dim {
            return Err(IndexError(format!(
                "cannot compare grids of dimensions {} and {}",
                self.dim, other.dim
            )));
        }
        Ok(self
            .interior()
            .map(|(row, col)| (self.get(row, col) - other.get(row, col)).abs())
            .fold(F::zero(), F::max))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_degenerate_dimensions() {
        for dim in 0..3 {
            assert!(Grid::<f64>::new(dim, 0.0).is_err());
        }
        assert!(Grid::<f64>::new(3, 0.0).is_ok());
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(Grid::from_raw(3, vec![0.0; 8]).is_err());
        assert!(Grid::from_raw(3, vec![0.0; 9]).is_ok());
    }

    #[test]
    fn random_is_seed_deterministic_and_bounded() {
        let g: Grid<f32> = Grid::random(12, 42).unwrap();
        let h: Grid<f32> = Grid::random(12, 42).unwrap();
        assert_eq!(g, h);
        assert!(g.as_slice().iter().all(|&v| (0.0..10.0).contains(&v)));
        let other: Grid<f32> = Grid::random(12, 43).unwrap();
        assert_ne!(g, other);
    }

    #[test]
    fn interior_iteration_covers_exactly_the_inner_square() {
        let grid: Grid<f64> = Grid::new(5, 0.0).unwrap();
        let cells: Vec<_> = grid.interior().collect();
        assert_eq!(cells.len(), 9);
        assert!(cells.iter().all(|&(r, c)| grid.is_interior(r, c)));
        assert!(!cells.contains(&(0, 1)));
        assert!(!cells.contains(&(4, 3)));
    }

    #[test]
    fn band_with_halo_contains_neighbouring_rows() {
        let grid: Grid<f64> = Grid::from_fn(5, |row, _| row as f64).unwrap();
        let partition = Partition {
            start_row: 2,
            end_row: 3,
        };
        let band = grid.band_with_halo(&partition);
        assert_eq!(band.len(), 4 * 5);
        assert_eq!(band[0], 1.0);
        assert_eq!(band[5], 2.0);
        assert_eq!(band[15], 4.0);
    }

    #[test]
    fn write_interior_rows_keeps_border_columns() {
        let mut grid: Grid<f64> = Grid::new(5, 1.0).unwrap();
        let partition = Partition {
            start_row: 1,
            end_row: 2,
        };
        let rows = vec![9.0; 2 * 5];
        grid.write_interior_rows(&partition, &rows).unwrap();
        for row in 1..=2 {
            assert_eq!(grid.get(row, 0), 1.0);
            assert_eq!(grid.get(row, 4), 1.0);
            for col in 1..4 {
                assert_eq!(grid.get(row, col), 9.0);
            }
        }
        assert_eq!(grid.get(3, 2), 1.0);
    }

    #[test]
    fn write_interior_rows_rejects_mismatched_bands() {
        let mut grid: Grid<f64> = Grid::new(5, 0.0).unwrap();
        let partition = Partition {
            start_row: 1,
            end_row: 3,
        };
        assert!(grid.write_interior_rows(&partition, &vec![0.0; 5]).is_err());
        let too_far = Partition {
            start_row: 3,
            end_row: 4,
        };
        assert!(grid
            .write_interior_rows(&too_far, &vec![0.0; 10])
            .is_err());
    }

    #[test]
    fn max_interior_diff_ignores_the_border() {
        let a: Grid<f64> = Grid::new(4, 0.0).unwrap();
        let mut b = a.clone();
        b.set(0, 0, 100.0);
        assert_eq!(a.max_interior_diff(&b).unwrap(), 0.0);
        b.set(1, 2, 0.5);
        assert_eq!(a.max_interior_diff(&b).unwrap(), 0.5);
    }
}
