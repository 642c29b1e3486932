//! # Field references
//!
//! A factor of a quantity term names a field on the grid of the
//! case. The field is either
//!
//! - a raw binary dump in the data folder of the case (`tt`, `um`, ...), or
//! - another quantity definition, marked by a leading `@`
//!   (`@qty_k.dat`), which is evaluated recursively.
//!
//! The kind is fixed once, when the definition is parsed.
pub mod read;
pub mod write;

use crate::case::GridCase;
use crate::errors::{PostError, Result};
use crate::quantity::Evaluator;
use enum_dispatch::enum_dispatch;
use ndarray::Array2;
use std::fmt;
use std::path::PathBuf;

pub use read::{read_field, transpose_from_disk};
pub use write::{transpose_to_disk, write_field};

/// Prefix marking a nested quantity reference
pub const NESTED_PREFIX: char = '@';

/// Resolve a field reference to an (nx, ny) array
#[enum_dispatch]
pub trait LoadField {
    /// Return the field; nested quantities are evaluated with `evaluator`
    fn load(&self, evaluator: &mut Evaluator<'_>) -> Result<Array2<f64>>;
}

/// Raw binary field in the data folder of the case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    /// File name relative to the data folder
    pub name: String,
}

impl LoadField for RawFile {
    fn load(&self, evaluator: &mut Evaluator<'_>) -> Result<Array2<f64>> {
        read_field(evaluator.case(), &self.name)
    }
}

/// Field computed from another quantity definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedQuantity {
    /// Path of the definition file
    pub path: PathBuf,
}

impl LoadField for NestedQuantity {
    fn load(&self, evaluator: &mut Evaluator<'_>) -> Result<Array2<f64>> {
        evaluator.evaluate_nested(&self.path)
    }
}

/// Either kind of field reference
#[enum_dispatch(LoadField)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldReference {
    /// Raw binary dump
    RawFile,
    /// Nested quantity definition
    NestedQuantity,
}

impl FieldReference {
    /// Classify token. With `all_nested`, every token is a
    /// quantity definition, prefixed or not.
    pub fn parse(token: &str, all_nested: bool) -> Self {
        match token.strip_prefix(NESTED_PREFIX) {
            Some(path) => NestedQuantity {
                path: PathBuf::from(path),
            }
            .into(),
            None if all_nested => NestedQuantity {
                path: PathBuf::from(token),
            }
            .into(),
            None => RawFile {
                name: token.to_string(),
            }
            .into(),
        }
    }

    /// True for nested quantity references
    pub fn is_nested(&self) -> bool {
        matches!(self, FieldReference::NestedQuantity(_))
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldReference::RawFile(r) => write!(f, "{}", r.name),
            FieldReference::NestedQuantity(n) => {
                write!(f, "{}{}", NESTED_PREFIX, n.path.display())
            }
        }
    }
}

/// Load a single field reference with a fresh evaluator
///
/// # Errors
/// See [`Evaluator::evaluate`] and [`read_field`].
pub fn load(case: &GridCase, reference: &str) -> Result<Array2<f64>> {
    let mut evaluator = Evaluator::new(case);
    FieldReference::parse(reference, false).load(&mut evaluator)
}

/// Fail unless `field` has the shape of `case`
pub(crate) fn check_shape(case: &GridCase, field: &Array2<f64>, context: &str) -> Result<()> {
    let found = field.dim();
    if found == case.shape() {
        Ok(())
    } else {
        Err(PostError::GridShapeMismatch {
            context: context.to_string(),
            expected: case.shape(),
            found,
        })
    }
}
