//! # Budgets
//!
//! A budget groups the quantities which form the terms of one
//! conservation equation, e.g. the transport equation of the
//! turbulent kinetic energy. Its definition file lists
//! ```text
//! # name, one definition per term, then Y/N
//! budget of <k>
//! qty_k_production.dat
//! qty_k_dissipation.dat
//! qty_k_transport.dat
//! Y
//! ```
//! If the last line is `Y`, a residual term named `Error` is
//! appended, holding the sum of all other terms.
pub mod pie;

use crate::case::GridCase;
use crate::errors::{PostError, Result};
use crate::quantity::definition::content_lines;
use crate::quantity::{Evaluator, Quantity, Style};
use ndarray::Array2;
pub use pie::{PieChart, PieSlice};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the synthesized residual term
pub const RESIDUAL_NAME: &str = "Error";

/// Collection of quantities forming a budget
#[derive(Debug, Clone)]
pub struct Budget<'a> {
    /// Case of all terms
    pub case: &'a GridCase,
    /// Definition file
    pub config: PathBuf,
    /// Display name
    pub name: String,
    /// Terms in definition order, residual last
    pub terms: Vec<Quantity<'a>>,
}

impl<'a> Budget<'a> {
    /// Build budget from definition file
    ///
    /// # Errors
    /// When the budget file or any term fails, see [`Evaluator::evaluate`].
    pub fn new<P: AsRef<Path>>(case: &'a GridCase, config: P) -> Result<Self> {
        Self::with_evaluator(&mut Evaluator::new(case), config)
    }

    /// Build budget, evaluating the terms with `evaluator`
    ///
    /// # Errors
    /// When the budget file or any term fails, see [`Evaluator::evaluate`].
    pub fn with_evaluator<P: AsRef<Path>>(evaluator: &mut Evaluator<'a>, config: P) -> Result<Self> {
        let config = config.as_ref();
        let case = evaluator.case();
        let content = std::fs::read_to_string(config).map_err(|e| PostError::read(config, e))?;
        let lines = content_lines(&content);
        if lines.len() < 2 {
            return Err(PostError::parse_file(
                config,
                "expected at least a name and a Y/N residual flag",
            ));
        }

        let name = lines[0].1.to_string();
        let (line, flag) = lines[lines.len() - 1];
        let residual = match flag.to_lowercase().as_str() {
            "y" => true,
            "n" => false,
            _ => {
                return Err(PostError::parse(
                    config,
                    line,
                    format!("residual flag must be Y or N, got {:?}", flag),
                ))
            }
        };

        let mut terms = Vec::with_capacity(lines.len() - 1);
        for &(_, path) in &lines[1..lines.len() - 1] {
            debug!("Budget {:?}: term {:?}", config, path);
            terms.push(evaluator.evaluate(path)?);
        }

        if residual {
            let mut sum = Array2::<f64>::zeros(case.shape());
            for term in &terms {
                sum += &term.data;
            }
            terms.push(Quantity::from_data(case, RESIDUAL_NAME, sum, Style::residual())?);
        }
        info!("Built budget {:?} ({}) with {} terms", config, name, terms.len());

        Ok(Self {
            case,
            config: config.to_path_buf(),
            name,
            terms,
        })
    }

    /// Synthesized residual, if any
    pub fn residual(&self) -> Option<&Quantity<'a>> {
        self.terms
            .last()
            .filter(|t| t.name == RESIDUAL_NAME && t.config.as_os_str().is_empty())
    }

    /// Pie chart of all terms at node (i, j)
    ///
    /// # Errors
    /// `OutOfRange` when (i, j) is not a node.
    pub fn pie_ij(&self, i: usize, j: usize) -> Result<PieChart> {
        self.case.check_i(i)?;
        self.case.check_j(j)?;
        let samples = self
            .terms
            .iter()
            .map(|t| (t.name.clone(), t.data[[i, j]]))
            .collect();
        Ok(PieChart::from_samples(samples))
    }

    /// Pie chart of all terms at the node closest to (x, y)
    ///
    /// # Errors
    /// `OutOfRange` when x or y is outside \[0, 1\].
    pub fn pie_xy(&self, x: f64, y: f64) -> Result<PieChart> {
        let i = self.case.nearest_i(x)?;
        let j = self.case.nearest_j(y)?;
        self.pie_ij(i, j)
    }
}

impl fmt::Display for Budget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Setup of the case associated with the budget :")?;
        writeln!(f, "{}", self.case)?;
        writeln!(f, "Setup of the budget :")?;
        writeln!(f, "   Config file : {}", self.config.display())?;
        writeln!(f, "   Name : {}", self.name)?;
        writeln!(f, "   nterms : {}", self.terms.len())?;
        let names: Vec<&str> = self.terms.iter().map(|t| t.name.as_str()).collect();
        write!(f, "   terms : {}", names.join(", "))
    }
}
