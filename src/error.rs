//! Error type shared by the core and its I/O collaborators.
//!
//! Only fatal conditions live here. Recoverable ones (conflicting supports in
//! the Bayesian tree, ML branches without a Bayesian counterpart) are reported
//! through [`crate::index::SplitConflict`] and [`crate::mapper::MappingReport`].

use std::path::PathBuf;

use itertools::Itertools;
use phylotree::tree::{NewickParseError, TreeError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapperError>;

/// Which of the two input trees an error refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TreeRole {
    Ml,
    Bayes,
}

impl std::fmt::Display for TreeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeRole::Ml => write!(f, "ML tree"),
            TreeRole::Bayes => write!(f, "Bayesian tree"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MapperError {
    #[error(
        "taxon sets differ: only in ML tree [{}], only in Bayesian tree [{}]",
        .ml_only.iter().join(", "),
        .bayes_only.iter().join(", ")
    )]
    TaxonMismatch {
        ml_only: Vec<String>,
        bayes_only: Vec<String>,
    },

    #[error("malformed {tree}: {reason}")]
    MalformedTree { tree: TreeRole, reason: String },

    #[error("leaf '{taxon}' is not part of the taxon universe")]
    UnknownTaxon { taxon: String },

    #[error("{name} must be within [{min}, {max}], got {value}")]
    ThresholdOutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("input file does not exist: {}", .path.display())]
    MissingInput { path: PathBuf },

    #[error("no tree found in {}", .path.display())]
    NoTreeFound { path: PathBuf },

    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse tree: {0}")]
    Parse(#[from] NewickParseError),

    #[error("tree error: {0}")]
    Tree(#[from] TreeError),
}

impl MapperError {
    /// Process exit code used by the command-line binary.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ThresholdOutOfRange { .. } | Self::MissingInput { .. } => 2,
            Self::Io(_) => 4,
            _ => 3,
        }
    }

    pub(crate) fn malformed(tree: TreeRole, reason: impl Into<String>) -> Self {
        Self::MalformedTree {
            tree,
            reason: reason.into(),
        }
    }
}
