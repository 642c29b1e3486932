//! Extract profiles and point values from quantities and budgets
//!
//! The profiles are handed to external plotting as plain column
//! text files, see [`write_profiles`].
use crate::budget::Budget;
use crate::errors::{PostError, Result};
use crate::quantity::{Quantity, Style};
use binary_interface::write_columns;
use ndarray::{Array1, Axis};
use std::path::Path;

/// Direction of the coordinate along a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Along {
    /// Profile along x at fixed y
    X,
    /// Profile along y at fixed x
    Y,
}

impl Along {
    fn name(self) -> &'static str {
        match self {
            Along::X => "x",
            Along::Y => "y",
        }
    }
}

/// One-dimensional cut through a quantity
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Name of the quantity
    pub label: String,
    /// Coordinate running along the profile
    pub along: Along,
    /// Position of the cut in the other coordinate
    pub position: f64,
    /// Coordinates
    pub coords: Array1<f64>,
    /// Values
    pub values: Array1<f64>,
    /// Plot style of the quantity
    pub style: Style,
}

impl Profile {
    /// Short description, e.g. "at x = 0.5"
    pub fn title(&self) -> String {
        let fixed = match self.along {
            Along::X => "y",
            Along::Y => "x",
        };
        format!("At {} = {}", fixed, self.position)
    }
}

impl Quantity<'_> {
    /// All y at node i
    ///
    /// # Errors
    /// `OutOfRange` when `i >= nx`.
    pub fn profile_i(&self, i: usize) -> Result<Profile> {
        self.case.check_i(i)?;
        Ok(Profile {
            label: self.name.clone(),
            along: Along::Y,
            position: self.case.xx[i],
            coords: self.case.yy.clone(),
            values: self.data.index_axis(Axis(0), i).to_owned(),
            style: self.style.clone(),
        })
    }

    /// All x at node j
    ///
    /// # Errors
    /// `OutOfRange` when `j >= ny`.
    pub fn profile_j(&self, j: usize) -> Result<Profile> {
        self.case.check_j(j)?;
        Ok(Profile {
            label: self.name.clone(),
            along: Along::X,
            position: self.case.yy[j],
            coords: self.case.xx.clone(),
            values: self.data.index_axis(Axis(1), j).to_owned(),
            style: self.style.clone(),
        })
    }

    /// All y at the node closest to x
    ///
    /// # Errors
    /// `OutOfRange` when x is outside \[0, 1\].
    pub fn profile_x(&self, x: f64) -> Result<Profile> {
        self.profile_i(self.case.nearest_i(x)?)
    }

    /// All x at the node closest to y
    ///
    /// # Errors
    /// `OutOfRange` when y is outside \[0, 1\].
    pub fn profile_y(&self, y: f64) -> Result<Profile> {
        self.profile_j(self.case.nearest_j(y)?)
    }

    /// Value at node (i, j)
    ///
    /// # Errors
    /// `OutOfRange` when (i, j) is not a node.
    pub fn value_ij(&self, i: usize, j: usize) -> Result<f64> {
        self.case.check_i(i)?;
        self.case.check_j(j)?;
        Ok(self.data[[i, j]])
    }

    /// Value at the node closest to (x, y)
    ///
    /// # Errors
    /// `OutOfRange` when x or y is outside \[0, 1\].
    pub fn value_xy(&self, x: f64, y: f64) -> Result<f64> {
        self.value_ij(self.case.nearest_i(x)?, self.case.nearest_j(y)?)
    }
}

impl Budget<'_> {
    /// Profiles of all terms at node i
    ///
    /// # Errors
    /// `OutOfRange` when `i >= nx`.
    pub fn profiles_i(&self, i: usize) -> Result<Vec<Profile>> {
        self.terms.iter().map(|t| t.profile_i(i)).collect()
    }

    /// Profiles of all terms at node j
    ///
    /// # Errors
    /// `OutOfRange` when `j >= ny`.
    pub fn profiles_j(&self, j: usize) -> Result<Vec<Profile>> {
        self.terms.iter().map(|t| t.profile_j(j)).collect()
    }

    /// Profiles of all terms at the node closest to x
    ///
    /// # Errors
    /// `OutOfRange` when x is outside \[0, 1\].
    pub fn profiles_x(&self, x: f64) -> Result<Vec<Profile>> {
        self.profiles_i(self.case.nearest_i(x)?)
    }

    /// Profiles of all terms at the node closest to y
    ///
    /// # Errors
    /// `OutOfRange` when y is outside \[0, 1\].
    pub fn profiles_y(&self, y: f64) -> Result<Vec<Profile>> {
        self.profiles_j(self.case.nearest_j(y)?)
    }

    /// Values of all terms at node (i, j)
    ///
    /// # Errors
    /// `OutOfRange` when (i, j) is not a node.
    pub fn values_ij(&self, i: usize, j: usize) -> Result<Vec<(String, f64)>> {
        self.terms
            .iter()
            .map(|t| t.value_ij(i, j).map(|v| (t.name.clone(), v)))
            .collect()
    }

    /// Values of all terms at the node closest to (x, y)
    ///
    /// # Errors
    /// `OutOfRange` when x or y is outside \[0, 1\].
    pub fn values_xy(&self, x: f64, y: f64) -> Result<Vec<(String, f64)>> {
        self.values_ij(self.case.nearest_i(x)?, self.case.nearest_j(y)?)
    }
}

/// Write profiles sharing one coordinate as column table:
/// coordinate first, then one column per profile.
///
/// # Errors
/// `GridShapeMismatch` when the profiles run along different
/// coordinates, `FieldIo` when the file can not be written.
pub fn write_profiles<P: AsRef<Path>>(path: P, profiles: &[Profile]) -> Result<()> {
    let path = path.as_ref();
    let first = match profiles.first() {
        Some(p) => p,
        None => return Ok(()),
    };
    for p in profiles {
        if p.along != first.along || p.coords.len() != first.coords.len() {
            return Err(PostError::GridShapeMismatch {
                context: format!("profiles written to {}", path.display()),
                expected: (first.coords.len(), 1),
                found: (p.coords.len(), 1),
            });
        }
    }

    // Labels may contain blanks, columns are separated by blanks
    let labels: Vec<String> = profiles.iter().map(|p| p.label.replace(' ', "_")).collect();
    let mut header = vec![first.along.name()];
    header.extend(labels.iter().map(String::as_str));

    let mut columns = vec![first.coords.view()];
    columns.extend(profiles.iter().map(|p| p.values.view()));
    write_columns(path, &header, &columns).map_err(|source| PostError::FieldIo {
        path: path.to_path_buf(),
        source,
    })
}
