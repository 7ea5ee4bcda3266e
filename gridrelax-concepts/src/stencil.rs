//! The four-point averaging kernel applied to every interior cell.

use num::Float;

use crate::grid::Grid;

/// Average of the four orthogonal neighbours of `(row, col)`.
///
/// The coordinate must be interior; neighbour indices would otherwise wrap or
/// fall outside the grid.
///
/// ```
/// use gridrelax_concepts::{four_point_average, Grid};
///
/// let grid: Grid<f64> = Grid::from_fn(3, |row, col| (row + col) as f64).unwrap();
/// // neighbours of the centre cell hold 1, 1, 3, 3
/// assert_eq!(four_point_average(&grid, 1, 1), 2.0);
/// ```
pub fn four_point_average<F>(grid: &Grid<F>, row: usize, col: usize) -> F
where
    F: Float,
{
    debug_assert!(grid.is_interior(row, col));
    let sum = grid.get(row - 1, col)
        + grid.get(row + 1, col)
        + grid.get(row, col - 1)
        + grid.get(row, col + 1);
    sum / four::<F>()
}

/// Relaxes the interior cells of one row given slices of the rows above and
/// below it, writing results into `out`.
///
/// All four slices must have the same length. Border columns of `out` are
/// copied through unchanged so the caller can swap whole rows.
pub fn relax_row<F>(above: &[F], row: &[F], below: &[F], out: &mut [F])
where
    F: Float,
{
    let dim = row.len();
    debug_assert!(above.len() == dim && below.len() == dim && out.len() == dim);
    out[0] = row[0];
    out[dim - 1] = row[dim - 1];
    for col in 1..dim - 1 {
        out[col] = (above[col] + below[col] + row[col - 1] + row[col + 1]) / four::<F>();
    }
}

/// The constant 4 in the generic float type.
#[inline]
fn four<F: Float>() -> F {
    F::one() + F::one() + F::one() + F::one()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn averages_the_orthogonal_neighbours() {
        let mut grid: Grid<f64> = Grid::new(3, 0.0).unwrap();
        grid.set(0, 1, 8.0);
        grid.set(2, 1, 4.0);
        grid.set(1, 0, 2.0);
        grid.set(1, 2, 6.0);
        // the centre value itself does not contribute
        grid.set(1, 1, 1000.0);
        assert_eq!(four_point_average(&grid, 1, 1), 5.0);
    }

    #[test]
    fn row_kernel_matches_the_cell_kernel() {
        let grid: Grid<f64> =
            Grid::from_fn(6, |row, col| (row * 7 + col * 3) as f64 * 0.25).unwrap();
        for row in 1..5 {
            let mut out = vec![0.0; 6];
            relax_row(grid.row(row - 1), grid.row(row), grid.row(row + 1), &mut out);
            for col in 1..5 {
                assert_eq!(out[col], four_point_average(&grid, row, col));
            }
        }
    }

    #[test]
    fn row_kernel_preserves_border_columns() {
        let above = [1.0, 2.0, 3.0];
        let row = [-7.0, 5.0, 9.0];
        let below = [4.0, 6.0, 8.0];
        let mut out = [0.0; 3];
        relax_row(&above, &row, &below, &mut out);
        assert_eq!(out[0], -7.0);
        assert_eq!(out[2], 9.0);
        assert_eq!(out[1], (2.0 + 6.0 - 7.0 + 9.0) / 4.0);
    }

    #[test]
    fn works_for_f32() {
        let grid: Grid<f32> = Grid::new(4, 2.0).unwrap();
        assert_eq!(four_point_average(&grid, 2, 2), 2.0);
    }
}
