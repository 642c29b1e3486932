//! Write fields of a case in the raw binary layout
use crate::case::GridCase;
use crate::errors::{PostError, Result};
use binary_interface::write_to_binary;
use ndarray::{Array2, ArrayView2};
use std::path::Path;
use tracing::debug;

/// Write (nx, ny) field as binary file `name` into the data
/// folder of the case, so it can be read back as raw field.
///
/// # Errors
/// `FieldIo` when the file can not be written, `GridShapeMismatch`
/// when the field does not match the case.
pub fn write_field(case: &GridCase, name: &str, field: &Array2<f64>) -> Result<()> {
    super::check_shape(case, field, name)?;
    write_field_to(case.folder.join(name), field)
}

/// Write (nx, ny) field as binary file to an arbitrary path
pub(crate) fn write_field_to<P: AsRef<Path>>(path: P, field: &Array2<f64>) -> Result<()> {
    let path = path.as_ref();
    debug!("Writing field {:?}", path);
    write_to_binary(path, &transpose_to_disk(field)).map_err(|source| PostError::FieldIo {
        path: path.to_path_buf(),
        source,
    })
}

/// View (nx, ny) field in the (ny, nx) on-disk layout
pub fn transpose_to_disk(field: &Array2<f64>) -> ArrayView2<'_, f64> {
    field.t()
}
