//! Python binding layer for support mapping.
//!
//! Exposes the file-based run and an in-memory variant working on Newick
//! strings.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::MapperConfig;
use crate::error::MapperError;
use crate::filter::Thresholds;
use crate::io::{TreeFormat, parse_newick, render_newick};
use crate::pipeline::{run, transfer_supports};

fn to_py_err(e: MapperError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Map PP values from a Bayesian tree file onto an ML tree file.
///
/// Args:
///     ml_path: ML tree file (BP values as internal node labels)
///     bayes_path: Bayesian tree file (PP values as labels or `prob` annotations)
///     out_path: Output Newick file, gzip-compressed when ending in `.gz`
///     min_bp: Hide BP values below this percentage (default: no filtering)
///     min_pp: Hide PP values below this probability (default: no filtering)
///     tree_format: "newick" or "nexus" (default: "newick")
///
/// Returns:
///     A tuple (matched, considered) of ML branch counts.
///
/// Raises:
///     ValueError: On invalid thresholds, unreadable trees or differing taxa
#[pyfunction]
#[pyo3(signature = (ml_path, bayes_path, out_path, min_bp=None, min_pp=None, tree_format="newick"))]
fn map_support(
    ml_path: String,
    bayes_path: String,
    out_path: String,
    min_bp: Option<f64>,
    min_pp: Option<f64>,
    tree_format: &str,
) -> PyResult<(usize, usize)> {
    let format: TreeFormat = tree_format.parse().map_err(PyValueError::new_err)?;
    let config = MapperConfig::new(ml_path, bayes_path, out_path, format, min_bp, min_pp)
        .map_err(to_py_err)?;
    let summary = run(&config).map_err(to_py_err)?;
    Ok((summary.mapping.matched, summary.mapping.considered))
}

/// Map PP values between two Newick strings and return the annotated Newick.
///
/// Raises:
///     ValueError: On invalid thresholds, unparsable trees or differing taxa
#[pyfunction]
#[pyo3(signature = (ml_newick, bayes_newick, min_bp=None, min_pp=None))]
fn map_support_newick(
    ml_newick: &str,
    bayes_newick: &str,
    min_bp: Option<f64>,
    min_pp: Option<f64>,
) -> PyResult<String> {
    let thresholds = Thresholds::new(min_bp, min_pp).map_err(to_py_err)?;
    let ml = parse_newick(ml_newick)
        .map_err(to_py_err)?
        .ok_or_else(|| PyValueError::new_err("ML tree string is empty"))?;
    let bayes = parse_newick(bayes_newick)
        .map_err(to_py_err)?
        .ok_or_else(|| PyValueError::new_err("Bayesian tree string is empty"))?;

    let outcome = transfer_supports(ml, &bayes, &thresholds).map_err(to_py_err)?;
    render_newick(&outcome.tree).map_err(to_py_err)
}

/// Python module definition
#[pymodule]
fn bayes_mapper(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(map_support, m)?)?;
    m.add_function(wrap_pyfunction!(map_support_newick, m)?)?;
    Ok(())
}
