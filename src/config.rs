//! Validated settings for one mapping run.

use std::path::PathBuf;

use crate::error::{MapperError, Result};
use crate::filter::Thresholds;
use crate::io::TreeFormat;

#[derive(Clone, Debug, PartialEq)]
pub struct MapperConfig {
    pub ml_tree: PathBuf,
    pub bayes_tree: PathBuf,
    pub output: PathBuf,
    pub format: TreeFormat,
    pub thresholds: Thresholds,
}

impl MapperConfig {
    /// Thresholds are checked first, then the existence of both input files,
    /// so a bad threshold is reported before any tree is touched.
    ///
    /// # Errors
    /// [`MapperError::ThresholdOutOfRange`] or [`MapperError::MissingInput`].
    pub fn new(
        ml_tree: impl Into<PathBuf>,
        bayes_tree: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        format: TreeFormat,
        min_bp: Option<f64>,
        min_pp: Option<f64>,
    ) -> Result<Self> {
        let thresholds = Thresholds::new(min_bp, min_pp)?;
        let ml_tree = existing(ml_tree.into())?;
        let bayes_tree = existing(bayes_tree.into())?;
        Ok(MapperConfig {
            ml_tree,
            bayes_tree,
            output: output.into(),
            format,
            thresholds,
        })
    }
}

fn existing(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(MapperError::MissingInput { path })
    }
}
