//! Proportional decomposition of a budget at one grid point
use std::fmt;

/// Label of the slice which is pulled out of the chart
pub const EXPLODED_LABEL: &str = "Error";

/// One slice of a pie chart
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    /// Term name
    pub label: String,
    /// Signed value of the term
    pub value: f64,
    /// |value| / sum |values|
    pub fraction: f64,
    /// Separate slice from the rest
    pub explode: bool,
}

/// Budget terms at one grid point, as fractions of the sum of
/// their magnitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    /// Slices, ascending by signed value
    pub slices: Vec<PieSlice>,
    /// Sum of magnitudes
    pub scale: f64,
}

impl PieChart {
    /// Build chart from (label, value) samples.
    ///
    /// A chart whose values are all zero has all fractions zero.
    /// Infinite values share the whole chart, a NaN value makes
    /// all fractions NaN.
    ///
    /// # Example
    /// ```
    /// use rustpost::PieChart;
    /// let pie = PieChart::from_samples(vec![
    ///     ("A".to_string(), -3.0),
    ///     ("B".to_string(), 1.0),
    ///     ("Error".to_string(), 2.0),
    /// ]);
    /// assert_eq!(pie.scale, 6.0);
    /// assert_eq!(pie.fraction("A"), Some(0.5));
    /// ```
    pub fn from_samples(mut samples: Vec<(String, f64)>) -> Self {
        samples.sort_by(|a, b| a.1.total_cmp(&b.1));
        let scale: f64 = samples.iter().map(|(_, v)| v.abs()).sum();
        let infinite = samples.iter().filter(|(_, v)| v.is_infinite()).count();
        let slices = samples
            .into_iter()
            .map(|(label, value)| {
                let fraction = if scale.is_nan() {
                    f64::NAN
                } else if infinite > 0 {
                    if value.is_infinite() {
                        1. / infinite as f64
                    } else {
                        0.
                    }
                } else if scale > 0. {
                    value.abs() / scale
                } else {
                    0.
                };
                let explode = label == EXPLODED_LABEL;
                PieSlice {
                    label,
                    value,
                    fraction,
                    explode,
                }
            })
            .collect();
        Self { slices, scale }
    }

    /// Fraction of the slice with the given label
    pub fn fraction(&self, label: &str) -> Option<f64> {
        self.slices
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.fraction)
    }
}

impl fmt::Display for PieChart {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for s in &self.slices {
            writeln!(
                f,
                "{:>24} {:>14.6e} {:>7.2}%{}",
                s.label,
                s.value,
                100. * s.fraction,
                if s.explode { " *" } else { "" }
            )?;
        }
        write!(f, "{:>24} {:>14.6e}", "sum |.|", self.scale)
    }
}
