//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Transfers Bayesian posterior probabilities (PP) onto the matching branches
//! of a maximum-likelihood tree that carries bootstrap proportions (BP).
//!
//! Modules:
//! - `tree`: arena tree model holding BP and PP per branch.
//! - `bitset`: compact bitset representation for leaf sets.
//! - `split`: taxon universe and canonical bipartitions.
//! - `index`: bipartition → support lookup built from the Bayesian tree.
//! - `mapper`: attaches PP values to the ML tree.
//! - `filter`: minimum BP / PP thresholds.
//! - `io`: Newick / NEXUS reading and annotated Newick writing.
//! - `config`, `pipeline`: validated settings and the end-to-end run.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod bitset;
pub mod config;
pub mod error;
pub mod filter;
pub mod index;
pub mod io;
pub mod mapper;
pub mod pipeline;
pub mod split;
pub mod tree;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use bitset::Bitset;
pub use config::MapperConfig;
pub use error::{MapperError, Result, TreeRole};
pub use filter::{Thresholds, filter};
pub use index::SupportIndex;
pub use io::{TreeFormat, parse_newick, read_tree, render_newick};
pub use mapper::map;
pub use pipeline::{run, transfer_supports};
pub use split::{Bipartition, SplitTable, TaxonUniverse, split_for};
pub use tree::{Node, Support, SupportTree};
