//! Parse quantity definition files
//!
//! ```text
//! # comment lines and blank lines are skipped
//! <k> = 0.5 (u'u' + v'v' + w'w')      name
//! 3                                   number of terms
//! uu_mean 0.5                         term: fields..., scaling
//! vv_mean 0.5
//! ww_mean 0.5
//! 1.0                                 global scaling
//! b-                                  optional: line color
//! b                                   optional: marker edge color
//! 10                                  optional: mark every
//! ```
use super::Style;
use crate::errors::{PostError, Result};
use crate::field::FieldReference;
use crate::scaling::Scaling;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One additive term: product of fields times a scaling
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// Fields to multiply
    pub factors: Vec<FieldReference>,
    /// Scaling of the product
    pub scaling: Scaling,
    /// Line of the term in the definition file
    pub line: usize,
}

/// Parsed, not yet evaluated, quantity definition
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityDefinition {
    /// Definition file
    pub path: PathBuf,
    /// Display name
    pub name: String,
    /// Term count as written; negative marks nested references
    pub nterms: i64,
    /// Additive terms
    pub terms: Vec<Term>,
    /// Global scaling, applied after summation
    pub scaling: Scaling,
    /// Plot style
    pub style: Style,
}

impl QuantityDefinition {
    /// Read and parse definition file
    ///
    /// # Errors
    /// `ConfigRead` when the file can not be read, `ConfigParse` or
    /// `UnknownScalingToken` when it is malformed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PostError::read(path, e))?;
        Self::parse(path, &content)
    }

    /// Parse content of definition file `path`
    ///
    /// # Errors
    /// `ConfigParse` or `UnknownScalingToken` when it is malformed.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let lines = content_lines(content);
        if lines.len() < 3 {
            return Err(PostError::parse_file(
                path,
                "expected at least a name, a number of terms and a global scaling",
            ));
        }

        let name = lines[0].1.to_string();
        let (line, text) = lines[1];
        let nterms = text.parse::<i64>().map_err(|_| {
            PostError::parse(path, line, format!("number of terms {:?} is not an integer", text))
        })?;
        let all_nested = nterms < 0;
        let n = nterms.unsigned_abs() as usize;
        if lines.len() < n + 3 {
            return Err(PostError::parse_file(
                path,
                format!(
                    "expected {} terms and a global scaling, found {} lines after the term count",
                    n,
                    lines.len() - 2
                ),
            ));
        }

        let terms = lines[2..n + 2]
            .iter()
            .map(|&(line, text)| parse_term(path, line, text, all_nested))
            .collect::<Result<Vec<_>>>()?;

        let (line, text) = lines[n + 2];
        let scaling = parse_single_scaling(path, line, text)?;

        let style = if lines.len() > n + 3 {
            parse_style(path, &lines[n + 3..])?
        } else {
            Style::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            name,
            nterms,
            terms,
            scaling,
            style,
        })
    }

    /// Number of additive terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True for quantities without terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True if any factor is a nested quantity
    pub fn has_nested(&self) -> bool {
        self.terms
            .iter()
            .any(|t| t.factors.iter().any(FieldReference::is_nested))
    }
}

/// Non-blank lines not starting with `#`, with line numbers (1-based)
pub(crate) fn content_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
        .collect()
}

fn parse_term(path: &Path, line: usize, text: &str, all_nested: bool) -> Result<Term> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    // never empty, blank lines are skipped
    let (last, fields) = tokens
        .split_last()
        .ok_or_else(|| PostError::parse(path, line, "empty term"))?;
    let scaling = last.parse::<Scaling>().map_err(|e| e.at(path, line))?;
    let factors = fields
        .iter()
        .map(|t| FieldReference::parse(t, all_nested))
        .collect();
    Ok(Term {
        factors,
        scaling,
        line,
    })
}

fn parse_single_scaling(path: &Path, line: usize, text: &str) -> Result<Scaling> {
    let mut tokens = text.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => token.parse::<Scaling>().map_err(|e| e.at(path, line)),
        _ => Err(PostError::parse(
            path,
            line,
            format!("global scaling must be a single token, got {:?}", text),
        )),
    }
}

fn parse_style(path: &Path, lines: &[(usize, &str)]) -> Result<Style> {
    if lines.len() < 3 {
        return Err(PostError::parse(
            path,
            lines[0].0,
            "incomplete plot style, expected color, marker edge color and mark-every",
        ));
    }
    if lines.len() > 3 {
        warn!(
            "Ignoring {} trailing line(s) in {:?}",
            lines.len() - 3,
            path
        );
    }
    let (line, text) = lines[2];
    let mark_every = text.parse::<usize>().map_err(|_| {
        PostError::parse(path, line, format!("mark-every {:?} is not an integer", text))
    })?;
    Ok(Style {
        color: Some(lines[0].1.to_string()),
        marker_edge_color: lines[1].1.to_string(),
        mark_every: Some(mark_every),
        ..Style::default()
    })
}
