#![warn(missing_docs)]
//! # rustpost: budgets of statistically averaged convection flows
//!
//! Post-processing of the averaged fields of 2-D Rayleigh-Bénard
//! simulations. Raw binary fields on a structured (nx, ny) grid are
//! combined into *quantities* through small definition files:
//! weighted sums of products of fields, scaled by float literals
//! or by constants of the case (Ra, Pr, dt, ...). Quantities may
//! reference other quantity definitions.
//!
//! Quantities are grouped into *budgets*, the terms of one
//! conservation equation, optionally closed by a residual term.
//!
//! ```ignore
//! use rustpost::{Budget, GridCase, Quantity};
//! let case = GridCase::from_file("case_ra_1e8.dat")?;
//! let k = Quantity::new(&case, "qty_k.dat")?;
//! let bud_k = Budget::new(&case, "bud_k.dat")?;
//! println!("{}", bud_k.pie_xy(0.1, 0.5)?);
//! ```
pub mod budget;
pub mod case;
pub mod errors;
pub mod extract;
pub mod field;
pub mod quantity;
pub mod scaling;
#[cfg(test)]
mod testing;

pub use budget::{Budget, PieChart, PieSlice};
pub use case::GridCase;
pub use errors::{Location, PostError, Result};
pub use extract::{write_profiles, Along, Profile};
pub use field::{load, FieldReference, LoadField};
pub use quantity::{Evaluator, Quantity, QuantityDefinition, Style};
pub use scaling::{resolve, NamedScaling, Scaling};
