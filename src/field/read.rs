//! Read raw binary fields of a case
use crate::case::GridCase;
use crate::errors::{PostError, Result};
use binary_interface::read_from_binary;
use ndarray::Array2;
use tracing::debug;

/// Read binary field `name` from the data folder of the case.
///
/// On disk the field is stored as `ny` rows of `nx` values,
/// the returned array is (nx, ny).
///
/// # Errors
/// `FieldIo` when the file is missing or does not hold
/// exactly `nx * ny` doubles.
pub fn read_field(case: &GridCase, name: &str) -> Result<Array2<f64>> {
    let path = case.folder.join(name);
    debug!("Reading field {:?}", path);
    let stored = read_from_binary(&path, [case.ny, case.nx])
        .map_err(|source| PostError::FieldIo { path, source })?;
    Ok(transpose_from_disk(stored))
}

/// Convert (ny, nx) on-disk layout to (nx, ny)
pub fn transpose_from_disk(stored: Array2<f64>) -> Array2<f64> {
    stored.reversed_axes().as_standard_layout().into_owned()
}
