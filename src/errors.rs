//! Error types of the post-processing library
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Position inside a definition or config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// File, if known
    pub path: Option<PathBuf>,
    /// Line number (1-based), if known
    pub line: Option<usize>,
}

impl Location {
    /// Location pointing to a line of a file
    pub fn new<P: AsRef<Path>>(path: P, line: usize) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            line: Some(line),
        }
    }

    /// Location pointing to a file as a whole
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            line: None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.path, self.line) {
            (Some(p), Some(l)) => write!(f, "{}:{}", p.display(), l),
            (Some(p), None) => write!(f, "{}", p.display()),
            (None, Some(l)) => write!(f, "line {}", l),
            (None, None) => write!(f, "<input>"),
        }
    }
}

/// Errors raised while building cases, quantities and budgets.
#[derive(Error, Debug)]
pub enum PostError {
    /// Malformed case, quantity or budget definition
    #[error("parse error at {location}: {message}")]
    ConfigParse {
        /// Offending file and line
        location: Location,
        /// What went wrong
        message: String,
    },
    /// Case, quantity or budget definition could not be read
    #[error("cannot read {}: {source}", .path.display())]
    ConfigRead {
        /// Offending file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// Scaling token is neither a float nor a known constant
    #[error("unknown scaling token {token:?} at {location}")]
    UnknownScalingToken {
        /// Offending token
        token: String,
        /// Where it was found
        location: Location,
    },
    /// Raw binary field is missing or has the wrong size
    #[error("cannot load field {}: {source}", .path.display())]
    FieldIo {
        /// Offending binary file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: binary_interface::Error,
    },
    /// Quantity definitions reference each other in a loop
    #[error("circular quantity reference: {}", display_chain(.chain))]
    CircularReference {
        /// Definitions on the stack, closed by the repeated one
        chain: Vec<PathBuf>,
    },
    /// Nested definitions exceed the maximum depth
    #[error("quantity nesting deeper than {depth}: {}", display_chain(.chain))]
    NestingTooDeep {
        /// Maximum depth
        depth: usize,
        /// Definitions on the stack
        chain: Vec<PathBuf>,
    },
    /// Arrays to be combined differ in shape
    #[error("grid shape mismatch in {context}: expected {expected:?}, got {found:?}")]
    GridShapeMismatch {
        /// Where the arrays were combined
        context: String,
        /// Shape of the case (nx, ny)
        expected: (usize, usize),
        /// Shape of the offending array
        found: (usize, usize),
    },
    /// Index or position outside the grid
    #[error("{what} = {value} is out of range {range}")]
    OutOfRange {
        /// Name of the index or coordinate
        what: &'static str,
        /// Requested value
        value: String,
        /// Valid range
        range: String,
    },
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, PostError>;

impl PostError {
    /// Shortcut for a parse error at file and line
    pub(crate) fn parse<P: AsRef<Path>, S: Into<String>>(path: P, line: usize, message: S) -> Self {
        PostError::ConfigParse {
            location: Location::new(path, line),
            message: message.into(),
        }
    }

    /// Shortcut for a parse error concerning a whole file
    pub(crate) fn parse_file<P: AsRef<Path>, S: Into<String>>(path: P, message: S) -> Self {
        PostError::ConfigParse {
            location: Location::file(path),
            message: message.into(),
        }
    }

    /// Shortcut for a read error
    pub(crate) fn read<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        PostError::ConfigRead {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Attach a file and line to errors that were raised without one
    #[must_use]
    pub fn at<P: AsRef<Path>>(self, path: P, line: usize) -> Self {
        match self {
            PostError::UnknownScalingToken { token, location } if location.path.is_none() => {
                PostError::UnknownScalingToken {
                    token,
                    location: Location::new(path, line),
                }
            }
            PostError::ConfigParse { location, message } if location.path.is_none() => {
                PostError::ConfigParse {
                    location: Location::new(path, line),
                    message,
                }
            }
            other => other,
        }
    }
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
