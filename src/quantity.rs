//! # Quantities
//!
//! A quantity is a named field on the grid of a case, defined
//! as a weighted sum of products of other fields:
//!
//! data = s_global * sum_k ( s_k * prod_l f_kl )
//!
//! The definition is read from a small text file (see
//! [`definition`]), evaluated eagerly on construction and
//! immutable afterwards.
pub mod definition;

use crate::case::GridCase;
use crate::errors::{PostError, Result};
use crate::field::write::write_field_to;
use crate::field::{check_shape, LoadField};
pub use definition::{QuantityDefinition, Term};
use ndarray::{Array2, Zip};
use num_traits::Float;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Maximum depth of nested quantity definitions
pub const MAX_DEPTH: usize = 64;

/// Attributes used by external plotting only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    /// Line color / format
    pub color: Option<String>,
    /// Marker edge color
    pub marker_edge_color: String,
    /// Marker face color, always "none"
    pub marker_face_color: String,
    /// Plot a marker every n points
    pub mark_every: Option<usize>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: None,
            marker_edge_color: String::from("none"),
            marker_face_color: String::from("none"),
            mark_every: None,
        }
    }
}

impl Style {
    /// Dashed black, used for the residual of budgets
    pub fn residual() -> Self {
        Self {
            color: Some(String::from("k--")),
            ..Self::default()
        }
    }
}

/// Evaluated quantity
#[derive(Debug, Clone)]
pub struct Quantity<'a> {
    /// Case the quantity lives on
    pub case: &'a GridCase,
    /// Definition file (empty for synthesized quantities)
    pub config: PathBuf,
    /// Display name
    pub name: String,
    /// Number of additive terms
    pub nterms: usize,
    /// Built (at least partly) from other quantities
    pub from_nested: bool,
    /// Values (nx, ny)
    pub data: Array2<f64>,
    /// Minimum of data
    pub min: f64,
    /// Maximum of data
    pub max: f64,
    /// Maximum of |data|
    pub absmax: f64,
    /// Plot style
    pub style: Style,
}

impl<'a> Quantity<'a> {
    /// Evaluate quantity from definition file
    ///
    /// # Errors
    /// See [`Evaluator::evaluate`].
    ///
    /// # Example
    /// ```
    /// use ndarray::array;
    /// use rustpost::{GridCase, Quantity};
    /// let dir = tempfile::tempdir().unwrap();
    /// let case = GridCase::new(2, 2, 0.1, 1e6, 1.0, dir.path(), array![0., 1.]).unwrap();
    /// let config = dir.path().join("qty_one.dat");
    /// std::fs::write(&config, "one\n1\n1.0\nra\n").unwrap();
    /// let one = Quantity::new(&case, &config).unwrap();
    /// assert_eq!(one.max, 1e6);
    /// ```
    pub fn new<P: AsRef<Path>>(case: &'a GridCase, config: P) -> Result<Self> {
        Evaluator::new(case).evaluate(config)
    }

    /// Wrap an already computed field
    ///
    /// # Errors
    /// `GridShapeMismatch` when data does not match the case.
    pub fn from_data(case: &'a GridCase, name: &str, data: Array2<f64>, style: Style) -> Result<Self> {
        check_shape(case, &data, name)?;
        let (min, max, absmax) = statistics(&data);
        Ok(Self {
            case,
            config: PathBuf::new(),
            name: name.to_string(),
            nterms: 0,
            from_nested: false,
            data,
            min,
            max,
            absmax,
            style,
        })
    }

    /// Write data in the raw binary layout, so it can be reused
    /// as a raw field.
    ///
    /// # Errors
    /// `FieldIo` when writing fails.
    pub fn write_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_field_to(path, &self.data)
    }
}

impl fmt::Display for Quantity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.case)?;
        writeln!(f, "Setup of the quantity :")?;
        writeln!(f, "   Config file : {}", self.config.display())?;
        writeln!(f, "   Name of the quantity : {}", self.name)?;
        writeln!(f, "   Constructed from other quantities : {}", self.from_nested)?;
        writeln!(f, "   Number of terms : {}", self.nterms)?;
        writeln!(f, "   Min / Max : {} / {}", self.min, self.max)?;
        writeln!(f, "   clr : {:?}", self.style.color)?;
        writeln!(f, "   mrkedgeclr : {}", self.style.marker_edge_color)?;
        writeln!(f, "   mrkfaceclr : {}", self.style.marker_face_color)?;
        write!(f, "   markevery : {:?}", self.style.mark_every)
    }
}

/// Minimum, maximum and absolute maximum.
///
/// A single NaN value makes all three NaN.
pub fn statistics<A: Float>(data: &Array2<A>) -> (A, A, A) {
    if data.iter().any(|v| v.is_nan()) {
        return (A::nan(), A::nan(), A::nan());
    }
    let min = data.fold(A::infinity(), |m, &v| m.min(v));
    let max = data.fold(A::neg_infinity(), |m, &v| m.max(v));
    let absmax = data.fold(A::zero(), |m, &v| m.max(v.abs()));
    (min, max, absmax)
}

/// Evaluates quantity definitions of one case.
///
/// Keeps the stack of definitions currently being evaluated,
/// which detects circular references between definitions, and
/// an optional cache of evaluated fields.
pub struct Evaluator<'a> {
    case: &'a GridCase,
    /// Canonical paths of the definitions being evaluated
    stack: Vec<PathBuf>,
    cache: Option<HashMap<PathBuf, Array2<f64>>>,
}

impl<'a> Evaluator<'a> {
    /// Evaluator without cache, every reference is evaluated anew
    pub fn new(case: &'a GridCase) -> Self {
        Self {
            case,
            stack: Vec::new(),
            cache: None,
        }
    }

    /// Evaluator which evaluates every definition file at most once
    pub fn with_cache(case: &'a GridCase) -> Self {
        Self {
            case,
            stack: Vec::new(),
            cache: Some(HashMap::new()),
        }
    }

    /// Case of the evaluator
    pub fn case(&self) -> &'a GridCase {
        self.case
    }

    /// Evaluate quantity from definition file
    ///
    /// # Errors
    /// Any of the errors of [`PostError`] raised by the definition,
    /// the fields it references, or nested definitions.
    pub fn evaluate<P: AsRef<Path>>(&mut self, config: P) -> Result<Quantity<'a>> {
        let config = config.as_ref();
        let key = canonical(config)?;
        self.enter(&key)?;
        let result = QuantityDefinition::from_file(config).and_then(|def| {
            let data = self.compute(&def)?;
            Ok((def, data))
        });
        self.stack.pop();
        let (def, data) = result?;

        if let Some(cache) = &mut self.cache {
            cache.insert(key, data.clone());
        }
        let (min, max, absmax) = statistics(&data);
        info!("Evaluated {:?} ({}), min / max: {} / {}", config, def.name, min, max);
        Ok(Quantity {
            case: self.case,
            config: config.to_path_buf(),
            name: def.name.clone(),
            nterms: def.len(),
            from_nested: def.has_nested(),
            data,
            min,
            max,
            absmax,
            style: def.style,
        })
    }

    /// Field of a nested definition
    pub(crate) fn evaluate_nested(&mut self, config: &Path) -> Result<Array2<f64>> {
        if let Some(cache) = &self.cache {
            if let Some(data) = cache.get(&canonical(config)?) {
                debug!("Cached {:?}", config);
                return Ok(data.clone());
            }
        }
        Ok(self.evaluate(config)?.data)
    }

    /// Push definition on the stack, unless it is already there
    fn enter(&mut self, key: &Path) -> Result<()> {
        if let Some(start) = self.stack.iter().position(|p| p == key) {
            let mut chain = self.stack[start..].to_vec();
            chain.push(key.to_path_buf());
            return Err(PostError::CircularReference { chain });
        }
        if self.stack.len() >= MAX_DEPTH {
            return Err(PostError::NestingTooDeep {
                depth: MAX_DEPTH,
                chain: self.stack.clone(),
            });
        }
        self.stack.push(key.to_path_buf());
        Ok(())
    }

    /// Per-term scaling before summation, global scaling after.
    fn compute(&mut self, def: &QuantityDefinition) -> Result<Array2<f64>> {
        let shape = self.case.shape();
        let mut data = Array2::<f64>::zeros(shape);
        for term in &def.terms {
            let mut product = Array2::<f64>::ones(shape);
            for factor in &term.factors {
                let field = factor.load(self)?;
                let context = format!("{}:{} ({})", def.path.display(), term.line, factor);
                check_shape(self.case, &field, &context)?;
                product *= &field;
            }
            let scale = term.scaling.value(self.case);
            Zip::from(&mut data)
                .and(&product)
                .for_each(|d, &p| *d += p * scale);
        }
        let scale = def.scaling.value(self.case);
        data.mapv_inplace(|d| d * scale);
        Ok(data)
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| PostError::read(path, e))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{approx_eq, ramp, write_case, write_definition, write_field};
    use std::path::Path;

    fn setup(dir: &Path) -> GridCase {
        let config = write_case(dir, 3, 2, 0.1, 1e6, 0.71);
        write_field(dir, "fieldA", &ramp(3, 2));
        write_field(dir, "fieldB", &Array2::from_elem((3, 2), -2.));
        GridCase::from_file(&config).unwrap()
    }

    #[test]
    fn test_product_with_scalings() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());
        let config = write_definition(dir.path(), "qty.dat", "A2\n1\nfieldA fieldA 2.0\nra\n");
        let qty = Quantity::new(&case, &config).unwrap();
        let a = ramp(3, 2);
        let expected = a.mapv(|v| 2.0 * 1e6 * v * v);
        approx_eq(&qty.data, &expected);
        assert_eq!(qty.name, "A2");
        assert_eq!(qty.nterms, 1);
        assert_eq!(qty.min, 0.);
        assert_eq!(qty.max, expected[[2, 1]]);
        assert_eq!(qty.absmax, qty.max);
    }

    #[test]
    fn test_sum_of_terms() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());
        let config = write_definition(
            dir.path(),
            "qty.dat",
            "sum\n2\nfieldA 1.0\nfieldB fieldA invdt\n-0.5\n",
        );
        let qty = Quantity::new(&case, &config).unwrap();
        let a = ramp(3, 2);
        let expected = a.mapv(|v| (v + (-2. * v) * 10.) * -0.5);
        approx_eq(&qty.data, &expected);
        assert_eq!(qty.min, expected[[0, 0]].min(0.));
        assert_eq!(qty.absmax, expected.fold(0., |m: f64, v| m.max(v.abs())));
    }

    #[test]
    fn test_zero_terms() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());
        let config = write_definition(dir.path(), "qty.dat", "zero\n0\nre\n");
        let qty = Quantity::new(&case, &config).unwrap();
        assert_eq!(qty.data, Array2::<f64>::zeros((3, 2)));
        assert_eq!((qty.min, qty.max, qty.absmax), (0., 0., 0.));
    }

    #[test]
    fn test_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());
        let config = write_definition(dir.path(), "qty.dat", "q\n2\nfieldA fieldB invre\nfieldA 0.3\nsqrtra\n");
        let a = Quantity::new(&case, &config).unwrap();
        let b = Quantity::new(&case, &config).unwrap();
        assert_eq!(a.data, b.data);
        assert_eq!(a.min.to_bits(), b.min.to_bits());
        assert_eq!(a.max.to_bits(), b.max.to_bits());
        assert_eq!(a.absmax.to_bits(), b.absmax.to_bits());
    }

    #[test]
    fn test_nested() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());
        let inner = write_definition(dir.path(), "qty_inner.dat", "inner\n1\nfieldA 2.0\n1.0\n");
        let content = format!("outer\n1\n@{} fieldB 1.0\n0.5\n", inner.display());
        let outer = write_definition(dir.path(), "qty_outer.dat", &content);
        let qty = Quantity::new(&case, &outer).unwrap();
        assert!(qty.from_nested);
        approx_eq(&qty.data, &ramp(3, 2).mapv(|v| 2. * v * -2. * 0.5));

        // legacy negative count, same result
        let content = format!("outer\n-1\n{} 1.0\n1.0\n", inner.display());
        let legacy = write_definition(dir.path(), "qty_legacy.dat", &content);
        let qty = Quantity::new(&case, &legacy).unwrap();
        approx_eq(&qty.data, &ramp(3, 2).mapv(|v| 2. * v));
    }

    #[test]
    fn test_sibling_references_are_not_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());
        let inner = write_definition(dir.path(), "qty_inner.dat", "inner\n1\nfieldA 1.0\n1.0\n");
        let content = format!(
            "outer\n2\n@{0} @{0} 1.0\n@{0} 1.0\n1.0\n",
            inner.display()
        );
        let outer = write_definition(dir.path(), "qty_outer.dat", &content);
        let plain = Quantity::new(&case, &outer).unwrap();
        let cached = Evaluator::with_cache(&case).evaluate(&outer).unwrap();
        assert_eq!(plain.data, cached.data);
        approx_eq(&plain.data, &ramp(3, 2).mapv(|v| v * v + v));
    }

    #[test]
    fn test_circular_reference() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());
        let a = dir.path().join("qty_a.dat");
        let b = dir.path().join("qty_b.dat");
        std::fs::write(&a, format!("a\n1\n@{} 1.0\n1.0\n", b.display())).unwrap();
        std::fs::write(&b, format!("b\n1\nfieldA @{} 1.0\n1.0\n", a.display())).unwrap();
        match Quantity::new(&case, &a).unwrap_err() {
            PostError::CircularReference { chain } => {
                assert_eq!(chain.len(), 3);
                assert_eq!(chain[0], chain[2]);
            }
            other => panic!("expected circular reference, got {:?}", other),
        }

        let s = dir.path().join("qty_self.dat");
        std::fs::write(&s, format!("s\n-1\n{} 1.0\n1.0\n", s.display())).unwrap();
        assert!(matches!(
            Quantity::new(&case, &s).unwrap_err(),
            PostError::CircularReference { .. }
        ));
    }

    #[test]
    fn test_errors_abort_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());
        let config = write_definition(dir.path(), "qty.dat", "q\n1\nfieldA bogus\n1.0\n");
        assert!(matches!(
            Quantity::new(&case, &config).unwrap_err(),
            PostError::UnknownScalingToken { .. }
        ));
        let config = write_definition(dir.path(), "qty.dat", "q\n1\nmissing 1.0\n1.0\n");
        assert!(matches!(
            Quantity::new(&case, &config).unwrap_err(),
            PostError::FieldIo { .. }
        ));
        assert!(matches!(
            Quantity::new(&case, dir.path().join("nope.dat")).unwrap_err(),
            PostError::ConfigRead { .. }
        ));
    }

    #[test]
    fn test_from_data_and_write_binary() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());
        let data = ramp(3, 2).mapv(|v| -v);
        let qty = Quantity::from_data(&case, "neg", data.clone(), Style::residual()).unwrap();
        assert_eq!(qty.min, -12.);
        assert_eq!(qty.max, 0.);
        assert_eq!(qty.absmax, 12.);
        assert_eq!(qty.style.color.as_deref(), Some("k--"));

        qty.write_binary(dir.path().join("neg")).unwrap();
        let config = write_definition(dir.path(), "qty.dat", "again\n1\nneg 1.0\n1.0\n");
        assert_eq!(Quantity::new(&case, &config).unwrap().data, data);

        assert!(matches!(
            Quantity::from_data(&case, "bad", Array2::zeros((2, 2)), Style::default()),
            Err(PostError::GridShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_statistics() {
        let data = ndarray::array![[1., -4.], [3., 2.]];
        assert_eq!(statistics(&data), (-4., 3., 4.));

        let mut data = Array2::<f64>::ones((3, 2));
        data[[1, 1]] = f64::NAN;
        let (min, max, absmax) = statistics(&data);
        assert!(min.is_nan() && max.is_nan() && absmax.is_nan());

        let data = Array2::<f64>::from_elem((3, 2), f64::NAN);
        let (min, max, absmax) = statistics(&data);
        assert!(min.is_nan() && max.is_nan() && absmax.is_nan());
    }

    #[test]
    fn test_nan_statistics_for_vanishing_rayleigh() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_case(dir.path(), 3, 2, 0.1, 0., 0.71);
        let case = GridCase::from_file(&config).unwrap();
        // 0 * (1 / sqrt(0)) is NaN everywhere
        let config = write_definition(dir.path(), "qty.dat", "zero\n0\ninvsqrtra\n");
        let qty = Quantity::new(&case, &config).unwrap();
        assert!(qty.data.iter().all(|v| v.is_nan()));
        assert!(qty.min.is_nan());
        assert!(qty.max.is_nan());
        assert!(qty.absmax.is_nan());
    }

    /// Chain of `n` definitions, each referencing the next, the last one reads fieldA
    fn write_chain(dir: &Path, prefix: &str, n: usize) -> PathBuf {
        for k in (0..n).rev() {
            let content = if k + 1 == n {
                String::from("last\n1\nfieldA 1.0\n1.0\n")
            } else {
                let next = dir.join(format!("{}_{}.dat", prefix, k + 1));
                format!("link {}\n1\n@{} 1.0\n1.0\n", k, next.display())
            };
            write_definition(dir, &format!("{}_{}.dat", prefix, k), &content);
        }
        dir.join(format!("{}_0.dat", prefix))
    }

    #[test]
    fn test_nesting_depth() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());

        let deepest = write_chain(dir.path(), "ok", MAX_DEPTH);
        let qty = Quantity::new(&case, &deepest).unwrap();
        assert_eq!(qty.data, ramp(3, 2));

        let too_deep = write_chain(dir.path(), "deep", MAX_DEPTH + 1);
        match Quantity::new(&case, &too_deep).unwrap_err() {
            PostError::NestingTooDeep { depth, chain } => {
                assert_eq!(depth, 64);
                assert_eq!(chain.len(), 64);
            }
            other => panic!("expected nesting too deep, got {:?}", other),
        }
    }

    #[test]
    fn test_cache_keeps_first_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let case = setup(dir.path());
        let inner = write_definition(dir.path(), "qty_inner.dat", "inner\n1\nfieldA 1.0\n1.0\n");
        let content = format!("outer\n1\n@{} 1.0\n1.0\n", inner.display());
        let outer = write_definition(dir.path(), "qty_outer.dat", &content);

        let mut cached = Evaluator::with_cache(&case);
        let first = cached.evaluate(&outer).unwrap();
        assert_eq!(first.data, ramp(3, 2));

        write_definition(dir.path(), "qty_inner.dat", "inner\n1\nfieldA 5.0\n1.0\n");
        let second = cached.evaluate(&outer).unwrap();
        assert_eq!(second.data, first.data);

        let fresh = Evaluator::new(&case).evaluate(&outer).unwrap();
        approx_eq(&fresh.data, &ramp(3, 2).mapv(|v| 5. * v));
    }
}
