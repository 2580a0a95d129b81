//! End-to-end driver: validate, index, map, filter, write.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::MapperConfig;
use crate::error::{Result, TreeRole};
use crate::filter::{FilterReport, Thresholds, filter};
use crate::index::{SplitConflict, SupportIndex};
use crate::io::{read_tree, render_newick, write_tree};
use crate::mapper::{MappingReport, map};
use crate::split::TaxonUniverse;
use crate::tree::SupportTree;

/// The annotated ML tree plus what happened on the way.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub tree: SupportTree,
    pub universe: TaxonUniverse,
    pub indexed_splits: usize,
    pub conflicts: Vec<SplitConflict>,
    pub mapping: MappingReport,
    pub filtering: FilterReport,
}

/// Carry PP values from `bayes` onto `ml` and apply `thresholds`.
///
/// Performs no I/O. Both trees are validated before anything is indexed.
///
/// # Errors
/// [`crate::MapperError::MalformedTree`] or [`crate::MapperError::TaxonMismatch`].
pub fn transfer_supports(
    mut ml: SupportTree,
    bayes: &SupportTree,
    thresholds: &Thresholds,
) -> Result<TransferOutcome> {
    ml.validate(TreeRole::Ml)?;
    bayes.validate(TreeRole::Bayes)?;
    let universe = TaxonUniverse::from_trees(&ml, bayes)?;

    let index = SupportIndex::build(bayes, &universe)?;
    let mapping = map(&mut ml, &index, &universe)?;
    let filtering = filter(&mut ml, thresholds);

    Ok(TransferOutcome {
        tree: ml,
        universe,
        indexed_splits: index.len(),
        conflicts: index.conflicts().to_vec(),
        mapping,
        filtering,
    })
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PathBuf,
    pub taxa: usize,
    pub indexed_splits: usize,
    pub conflicts: usize,
    pub mapping: MappingReport,
    pub filtering: FilterReport,
}

/// Read both trees, transfer supports and write the result.
///
/// The output is rendered completely before the file is created, so a fatal
/// error never leaves a partial output behind.
pub fn run(config: &MapperConfig) -> Result<RunSummary> {
    let ml = read_tree(&config.ml_tree, config.format)?;
    let bayes = read_tree(&config.bayes_tree, config.format)?;
    info!(
        ml_nodes = ml.size(),
        bayes_nodes = bayes.size(),
        "read ML tree {} and Bayesian tree {}",
        config.ml_tree.display(),
        config.bayes_tree.display()
    );

    let outcome = transfer_supports(ml, &bayes, &config.thresholds)?;
    if !outcome.conflicts.is_empty() {
        warn!(
            conflicts = outcome.conflicts.len(),
            "Bayesian tree contains ambiguous splits, first values were kept"
        );
    }
    info!(
        "Matched {} of {} ML branches against {} Bayesian splits ({} taxa)",
        outcome.mapping.matched,
        outcome.mapping.considered,
        outcome.indexed_splits,
        outcome.universe.len()
    );
    if config.thresholds.is_active() {
        info!(
            hidden_bp = outcome.filtering.hidden_bp,
            hidden_pp = outcome.filtering.hidden_pp,
            "applied support thresholds"
        );
    }

    let newick = render_newick(&outcome.tree)?;
    write_tree(&config.output, &newick)?;

    Ok(RunSummary {
        output: config.output.clone(),
        taxa: outcome.universe.len(),
        indexed_splits: outcome.indexed_splits,
        conflicts: outcome.conflicts.len(),
        mapping: outcome.mapping,
        filtering: outcome.filtering,
    })
}
