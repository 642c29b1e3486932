//! # Setup of a simulation case
//!
//! A case bundles the grid and the physical parameters of one
//! run. It is read from a small text file
//! ```text
//! # nx ny dt Ra Pr folder
//! 128 64 1e-3 1e8 1.0 data/
//! ```
//! and from the grid file `yp.dat` inside the data folder, whose
//! second column holds the (non-uniform) y-coordinates.
use crate::errors::{PostError, Result};
use binary_interface::read_column;
use ndarray::Array1;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the grid file in the data folder
pub const GRID_FILE: &str = "yp.dat";

/// Grid and parameters of one simulation case.
///
/// Immutable after construction, shared read-only by all
/// quantities and budgets built from it.
#[derive(Debug, Clone)]
pub struct GridCase {
    /// Config file the case was read from
    pub config: PathBuf,
    /// Number of grid points in x
    pub nx: usize,
    /// Number of grid points in y
    pub ny: usize,
    /// Time step (already rescaled)
    pub dt: f64,
    /// Rayleigh number
    pub ra: f64,
    /// Prandtl number
    pub pr: f64,
    /// Uniform x-coordinates in \[0, 1\]
    pub xx: Array1<f64>,
    /// y-coordinates read from the grid file
    pub yy: Array1<f64>,
    /// Folder holding the binary fields
    pub folder: PathBuf,
}

impl GridCase {
    /// Build case from parameters and y-coordinates.
    ///
    /// # Errors
    /// When a parameter is out of range or `yy` does not hold `ny` points.
    pub fn new<P: AsRef<Path>>(
        nx: usize,
        ny: usize,
        dt: f64,
        ra: f64,
        pr: f64,
        folder: P,
        yy: Array1<f64>,
    ) -> Result<Self> {
        let config = PathBuf::new();
        validate(&config, nx, ny, dt, ra, pr)?;
        if yy.len() != ny {
            return Err(PostError::parse_file(
                folder.as_ref().join(GRID_FILE),
                format!("grid holds {} points, expected ny = {}", yy.len(), ny),
            ));
        }
        Ok(Self {
            config,
            nx,
            ny,
            dt,
            ra,
            pr,
            xx: Array1::linspace(0., 1., nx),
            yy,
            folder: folder.as_ref().to_path_buf(),
        })
    }

    /// Read case from config file.
    ///
    /// # Errors
    /// When the config or grid file can not be read or is malformed.
    pub fn from_file<P: AsRef<Path>>(config: P) -> Result<Self> {
        Self::from_file_with_dt_factor(config, 1.)
    }

    /// Read case from config file and rescale the time step by
    /// a constant factor, which depends on the time integration
    /// scheme of the run that produced the data.
    ///
    /// # Errors
    /// When the config or grid file can not be read or is malformed.
    pub fn from_file_with_dt_factor<P: AsRef<Path>>(config: P, dt_factor: f64) -> Result<Self> {
        let config = config.as_ref();
        let content = std::fs::read_to_string(config).map_err(|e| PostError::read(config, e))?;

        // Collect (line, token) of everything that is not a comment
        let tokens: Vec<(usize, &str)> = content
            .lines()
            .enumerate()
            .flat_map(|(i, line)| {
                line.split('#')
                    .next()
                    .unwrap_or("")
                    .split_whitespace()
                    .map(move |t| (i + 1, t))
            })
            .collect();
        if tokens.len() != 6 {
            return Err(PostError::parse_file(
                config,
                format!(
                    "expected 6 entries (nx ny dt Ra Pr folder), found {}",
                    tokens.len()
                ),
            ));
        }

        let nx = parse_token::<usize>(config, tokens[0], "nx")?;
        let ny = parse_token::<usize>(config, tokens[1], "ny")?;
        let dt = parse_token::<f64>(config, tokens[2], "dt")? * dt_factor;
        let ra = parse_token::<f64>(config, tokens[3], "Ra")?;
        let pr = parse_token::<f64>(config, tokens[4], "Pr")?;
        let folder = PathBuf::from(tokens[5].1);
        validate(config, nx, ny, dt, ra, pr)?;

        // The size of the domain in x is fixed, y is read from file
        let grid = folder.join(GRID_FILE);
        debug!("Reading grid {:?}", grid);
        let yy = read_column(&grid, 1).map_err(|e| match e {
            binary_interface::Error::Io(source) => PostError::read(&grid, source),
            other => PostError::parse_file(&grid, other.to_string()),
        })?;
        if yy.len() != ny {
            return Err(PostError::parse_file(
                &grid,
                format!("grid holds {} points, expected ny = {}", yy.len(), ny),
            ));
        }

        let case = Self {
            config: config.to_path_buf(),
            nx,
            ny,
            dt,
            ra,
            pr,
            xx: Array1::linspace(0., 1., nx),
            yy,
            folder,
        };
        info!("Loaded case {:?} ({} x {})", config, nx, ny);
        Ok(case)
    }

    /// Shape of every field of this case
    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Index of the x-node closest to `x`
    ///
    /// # Errors
    /// When `x` is outside \[0, 1\].
    pub fn nearest_i(&self, x: f64) -> Result<usize> {
        check_unit(x, "x")?;
        Ok(nearest(&self.xx, x))
    }

    /// Index of the y-node closest to `y`
    ///
    /// # Errors
    /// When `y` is outside \[0, 1\].
    pub fn nearest_j(&self, y: f64) -> Result<usize> {
        check_unit(y, "y")?;
        Ok(nearest(&self.yy, y))
    }

    /// Check node index in x
    ///
    /// # Errors
    /// When `i` is not a node.
    pub fn check_i(&self, i: usize) -> Result<()> {
        check_index(i, self.nx, "i")
    }

    /// Check node index in y
    ///
    /// # Errors
    /// When `j` is not a node.
    pub fn check_j(&self, j: usize) -> Result<()> {
        check_index(j, self.ny, "j")
    }
}

impl fmt::Display for GridCase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Setup of the case :")?;
        writeln!(f, "   Config file : {}", self.config.display())?;
        writeln!(f, "   (nx, ny) : ({}, {})", self.nx, self.ny)?;
        writeln!(f, "   Time step : {}", self.dt)?;
        writeln!(f, "   Rayleigh number : {}", self.ra)?;
        writeln!(f, "   Prandtl number : {}", self.pr)?;
        write!(f, "   Data folder : {}", self.folder.display())
    }
}

fn parse_token<T: std::str::FromStr>(
    config: &Path,
    (line, token): (usize, &str),
    name: &str,
) -> Result<T> {
    token
        .parse::<T>()
        .map_err(|_| PostError::parse(config, line, format!("invalid {}: {:?}", name, token)))
}

fn validate(config: &Path, nx: usize, ny: usize, dt: f64, ra: f64, pr: f64) -> Result<()> {
    let fail = |message: &str| Err(PostError::parse_file(config, message));
    if nx == 0 || ny == 0 {
        return fail("nx and ny must be positive");
    }
    if !(dt > 0.) {
        return fail("dt must be positive");
    }
    if !(ra >= 0.) {
        return fail("Ra must be non-negative");
    }
    if !(pr > 0.) {
        return fail("Pr must be positive");
    }
    Ok(())
}

fn check_unit(value: f64, what: &'static str) -> Result<()> {
    if (0. ..=1.).contains(&value) {
        Ok(())
    } else {
        Err(PostError::OutOfRange {
            what,
            value: value.to_string(),
            range: "[0, 1]".to_string(),
        })
    }
}

fn check_index(index: usize, n: usize, what: &'static str) -> Result<()> {
    if index < n {
        Ok(())
    } else {
        Err(PostError::OutOfRange {
            what,
            value: index.to_string(),
            range: format!("[0, {}]", n - 1),
        })
    }
}

/// First index of the smallest distance
fn nearest(coords: &Array1<f64>, value: f64) -> usize {
    let mut best = 0;
    let mut dist = f64::INFINITY;
    for (i, c) in coords.iter().enumerate() {
        let d = (c - value).abs();
        if d < dist {
            best = i;
            dist = d;
        }
    }
    best
}
