//! Interface between ndarray and the raw files written by the
//! statistics post-processing of the solver.
//!
//! Two formats are supported:
//!
//! - flat binary dumps: `n` little-endian IEEE-754 doubles, no header,
//!   read into an `Array2` of a caller-supplied shape (row-major),
//! - whitespace separated column text files (grid files, profiles),
//!   where `#` starts a comment.
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Data, Ix2};
use num_traits::Float;
use std::fmt::LowerExp;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Size of one stored value in bytes
pub const BYTES_PER_VALUE: usize = std::mem::size_of::<f64>();

/// Errors of the raw file interface
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying I/O failure (missing file, permissions, ...)
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Binary file does not hold exactly the expected number of bytes
    #[error("expected {expected} bytes, file holds {found} bytes")]
    Size {
        /// Expected number of bytes
        expected: u64,
        /// Actual number of bytes
        found: u64,
    },
    /// Requested shape does not fit into memory
    #[error("shape {rows} x {cols} is too large")]
    TooLarge {
        /// Number of rows
        rows: usize,
        /// Number of columns
        cols: usize,
    },
    /// Columns of unequal length passed to the column writer
    #[error("column {column} has length {found}, expected {expected}")]
    Length {
        /// Index of the offending column
        column: usize,
        /// Length of the first column
        expected: usize,
        /// Length of the offending column
        found: usize,
    },
    /// Malformed line in a column text file
    #[error("line {line}: {message}")]
    Parse {
        /// Line number (1-based)
        line: usize,
        /// What went wrong
        message: String,
    },
    /// Array could not be shaped
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, Error>;

///////////////////////////////////////////////////////////////
//                      Binary
///////////////////////////////////////////////////////////////

/// Read flat binary file into an array of given shape.
///
/// The values are interpreted in row-major order, i.e. the last
/// index of `shape` varies fastest.
///
/// # Errors
/// When the file can not be opened, when its length is
/// not exactly `shape[0] * shape[1] * 8` bytes, or when that
/// size overflows.
///
/// # Example
/// ```
/// use binary_interface::{read_from_binary, write_to_binary};
/// use ndarray::prelude::*;
/// let dir = tempfile::tempdir().unwrap();
/// let fname = dir.path().join("x.bin");
/// let x = Array2::<f64>::from_elem((2, 3), 5.);
/// write_to_binary(&fname, &x).unwrap();
/// let y = read_from_binary(&fname, [2, 3]).unwrap();
/// assert_eq!(x, y);
/// ```
pub fn read_from_binary<P: AsRef<Path>>(filename: P, shape: [usize; 2]) -> Result<Array2<f64>> {
    let expected = shape[0]
        .checked_mul(shape[1])
        .and_then(|n| n.checked_mul(BYTES_PER_VALUE))
        .ok_or(Error::TooLarge {
            rows: shape[0],
            cols: shape[1],
        })? as u64;

    // Check size before reading anything
    let mut file = File::open(filename)?;
    let found = file.metadata()?.len();
    if found != expected {
        return Err(Error::Size { expected, found });
    }

    let mut bytes = Vec::with_capacity(expected as usize);
    file.read_to_end(&mut bytes)?;
    let values: Vec<f64> = bytes
        .chunks_exact(BYTES_PER_VALUE)
        .map(|b| {
            let mut buf = [0u8; BYTES_PER_VALUE];
            buf.copy_from_slice(b);
            f64::from_le_bytes(buf)
        })
        .collect();

    Ok(Array2::from_shape_vec(shape, values)?)
}

/// Write array to flat binary file, row-major order.
///
/// # Errors
/// When the file can not be created or written.
pub fn write_to_binary<P, S>(filename: P, array: &ArrayBase<S, Ix2>) -> Result<()>
where
    P: AsRef<Path>,
    S: Data<Elem = f64>,
{
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);
    // iter() walks the logical (row-major) order, independent of memory layout
    for v in array.iter() {
        writer.write_all(&v.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

///////////////////////////////////////////////////////////////
//                      Text columns
///////////////////////////////////////////////////////////////

/// Read one column (0-based) of a whitespace separated text file.
///
/// Blank lines and everything after `#` are ignored.
///
/// # Errors
/// When the file can not be read, a line has too few columns
/// or an entry is not a float.
pub fn read_column<P: AsRef<Path>>(filename: P, column: usize) -> Result<Array1<f64>> {
    let reader = BufReader::new(File::open(filename)?);
    let mut values = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let content = strip_comment(&line);
        if content.trim().is_empty() {
            continue;
        }
        let token = content
            .split_whitespace()
            .nth(column)
            .ok_or_else(|| Error::Parse {
                line: i + 1,
                message: format!("missing column {}", column + 1),
            })?;
        let value = token.parse::<f64>().map_err(|_| Error::Parse {
            line: i + 1,
            message: format!("{:?} is not a float", token),
        })?;
        values.push(value);
    }
    Ok(Array1::from(values))
}

/// Write columns of equal length to a text file.
///
/// The header names are written on a leading `#` line.
///
/// # Errors
/// When the file can not be written or the columns differ in length.
pub fn write_columns<P, T>(filename: P, header: &[&str], columns: &[ArrayView1<T>]) -> Result<()>
where
    P: AsRef<Path>,
    T: Float + LowerExp,
{
    let nrows = columns.first().map_or(0, |c| c.len());
    for (column, c) in columns.iter().enumerate() {
        if c.len() != nrows {
            return Err(Error::Length {
                column,
                expected: nrows,
                found: c.len(),
            });
        }
    }

    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);
    if !header.is_empty() {
        writeln!(writer, "# {}", header.join(" "))?;
    }
    for row in 0..nrows {
        let line: Vec<String> = columns
            .iter()
            .map(|c| format!("{:>24.16e}", c[row]))
            .collect();
        writeln!(writer, "{}", line.join(" "))?;
    }
    writer.flush()?;
    Ok(())
}

/// Return part of the line before the comment character
fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or("")
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    #[test]
    /// Read & Write 2-D data
    fn test_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let fname = dir.path().join("var.bin");
        let array = Array2::<f64>::from_elem((10, 7), 5.);
        write_to_binary(&fname, &array).unwrap();
        let array_read = read_from_binary(&fname, [10, 7]).unwrap();
        assert_eq!(array, array_read);
    }

    #[test]
    fn test_write_transposed_view() {
        let dir = tempfile::tempdir().unwrap();
        let fname = dir.path().join("var.bin");
        let array = array![[1., 2., 3.], [4., 5., 6.]];
        write_to_binary(&fname, &array.t()).unwrap();
        let array_read = read_from_binary(&fname, [3, 2]).unwrap();
        assert_eq!(array_read, array![[1., 4.], [2., 5.], [3., 6.]]);
    }

    #[test]
    fn test_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let fname = dir.path().join("var.bin");
        let array = Array2::<f64>::zeros((2, 2));
        write_to_binary(&fname, &array).unwrap();
        match read_from_binary(&fname, [2, 3]) {
            Err(Error::Size { expected, found }) => {
                assert_eq!(expected, 48);
                assert_eq!(found, 32);
            }
            other => panic!("expected size error, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let fname = dir.path().join("var.bin");
        write_to_binary(&fname, &Array2::<f64>::zeros((2, 2))).unwrap();
        match read_from_binary(&fname, [usize::MAX / 4, 3]) {
            Err(Error::TooLarge { rows, cols }) => {
                assert_eq!(rows, usize::MAX / 4);
                assert_eq!(cols, 3);
            }
            other => panic!("expected too large error, got {:?}", other),
        }
        assert!(matches!(
            read_from_binary(&fname, [usize::MAX, 2]),
            Err(Error::TooLarge { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_from_binary(dir.path().join("nope"), [1, 1]);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_read_column() {
        let dir = tempfile::tempdir().unwrap();
        let fname = dir.path().join("yp.dat");
        std::fs::write(&fname, "# j y\n1 0.0\n\n2 0.25 # inline\n3 1.0\n").unwrap();
        let y = read_column(&fname, 1).unwrap();
        assert_eq!(y, array![0.0, 0.25, 1.0]);
        let err = read_column(&fname, 2).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_write_columns() {
        let dir = tempfile::tempdir().unwrap();
        let fname = dir.path().join("profile.dat");
        let x = array![0.0, 0.5, 1.0];
        let v = array![1.0, -2.0, 3.0];
        write_columns(&fname, &["x", "v"], &[x.view(), v.view()]).unwrap();
        assert_eq!(read_column(&fname, 0).unwrap(), x);
        assert_eq!(read_column(&fname, 1).unwrap(), v);

        let short = array![1.0];
        let err = write_columns(&fname, &[], &[x.view(), short.view()]).unwrap_err();
        assert!(matches!(err, Error::Length { column: 1, .. }));
    }
}
