//! Fixtures for tests: synthetic cases in temporary folders
use crate::field::transpose_to_disk;
use binary_interface::write_to_binary;
use ndarray::{Array1, Array2};
use std::path::{Path, PathBuf};

/// Write grid file with `ny` equidistant points in \[0, 1\]
pub fn write_grid(dir: &Path, ny: usize) {
    let yy = Array1::<f64>::linspace(0., 1., ny);
    let mut content = String::from("# j y\n");
    for (j, y) in yy.iter().enumerate() {
        content += &format!("{} {:e}\n", j + 1, y);
    }
    std::fs::write(dir.join(crate::case::GRID_FILE), content).unwrap();
}

/// Write case config (and grid) with data folder `dir`
pub fn write_case(dir: &Path, nx: usize, ny: usize, dt: f64, ra: f64, pr: f64) -> PathBuf {
    write_grid(dir, ny);
    let config = dir.join("case.dat");
    let content = format!(
        "# nx ny dt Ra Pr folder\n{} {} {:e} {:e} {:e} {}\n",
        nx,
        ny,
        dt,
        ra,
        pr,
        dir.display()
    );
    std::fs::write(&config, content).unwrap();
    config
}

/// Write (nx, ny) field in the on-disk layout
pub fn write_field(dir: &Path, name: &str, field: &Array2<f64>) {
    write_to_binary(dir.join(name), &transpose_to_disk(field)).unwrap();
}

/// Write definition file, return its path
pub fn write_definition(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Field with value i + 10 j at (i, j)
pub fn ramp(nx: usize, ny: usize) -> Array2<f64> {
    Array2::from_shape_fn((nx, ny), |(i, j)| i as f64 + 10. * j as f64)
}

/// Assert two arrays are close
pub fn approx_eq(result: &Array2<f64>, expected: &Array2<f64>) {
    assert_eq!(result.shape(), expected.shape());
    for (a, b) in expected.iter().zip(result.iter()) {
        let tol = 1e-12 * a.abs().max(1.);
        if (a - b).abs() > tol {
            panic!("Large difference of values, got {} expected {}.", b, a)
        }
    }
}
