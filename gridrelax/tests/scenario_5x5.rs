use gridrelax::prelude::*;

/// The 5x5 grid seeded with row-major values 0..24.
fn scenario_grid() -> Grid<f64> {
    Grid::from_fn(5, |row, col| (row * 5 + col) as f64).unwrap()
}

#[test]
fn five_by_five_reaches_a_stable_interior_fixed_point() {
    let precision = 0.1;
    let seeded = scenario_grid();
    for backend in [
        BackendChoice::LockCell,
        BackendChoice::Jacobi,
        BackendChoice::Banded,
    ] {
        let settings = RelaxSettings::new(2, precision)
            .unwrap()
            .with_backend(backend);
        let outcome = relax(seeded.clone(), &settings).unwrap();
        assert!(outcome.converged);

        // no interior cell moves by the precision or more in a further step
        for (row, col) in outcome.grid.interior() {
            let next = four_point_average(&outcome.grid, row, col);
            assert!((next - outcome.grid.get(row, col)).abs() < precision);
        }

        // border values keep their exact seeded values
        for i in 0..5 {
            assert_eq!(outcome.grid.get(0, i), seeded.get(0, i));
            assert_eq!(outcome.grid.get(4, i), seeded.get(4, i));
            assert_eq!(outcome.grid.get(i, 0), seeded.get(i, 0));
            assert_eq!(outcome.grid.get(i, 4), seeded.get(i, 4));
        }
    }
}

#[test]
fn oversubscribed_workers_still_relax_the_scenario() {
    // 5x5 has 3 interior rows; 8 workers must be clamped to 3
    let partitions = partition_rows(5, 8).unwrap();
    assert_eq!(partitions.len(), 3);

    let settings = RelaxSettings::new(8, 0.1)
        .unwrap()
        .with_backend(BackendChoice::Banded);
    let outcome = relax(scenario_grid(), &settings).unwrap();
    assert!(outcome.converged);
}
