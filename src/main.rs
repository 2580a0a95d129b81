use bayes_mapper::config::MapperConfig;
use bayes_mapper::io::TreeFormat;
use bayes_mapper::pipeline::run;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Map Bayesian posterior probabilities onto the matching branches of an ML
/// tree and write a tree labelled `BP/PP`.
#[derive(Parser, Debug)]
#[command(
    name = "bayes-mapper",
    version,
    disable_version_flag = true,
    arg_required_else_help = true,
    about = "Transfer PP values from a Bayesian tree onto an ML tree with BP values"
)]
struct Args {
    /// Display the version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// File of the ML tree (carries BP values)
    #[arg(short = 'm', long = "ml-tree", value_name = "FILE")]
    ml_tree: PathBuf,

    /// File of the Bayesian tree (carries PP values)
    #[arg(short = 'b', long = "bayes-tree", value_name = "FILE")]
    bayes_tree: PathBuf,

    /// Format of both tree files
    #[arg(short = 'f', long = "tree-format", value_enum, default_value_t = TreeFormat::Newick)]
    tree_format: TreeFormat,

    /// Output file; a `.gz` suffix writes gzip-compressed output
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,

    /// Hide BP values below this percentage (0-100)
    #[arg(long = "min-bp", value_name = "NUM")]
    min_bp: Option<f64>,

    /// Hide PP values below this probability (0-1)
    #[arg(long = "min-pp", value_name = "NUM")]
    min_pp: Option<f64>,

    /// Quiet mode: only warnings and errors are logged
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parse the command line. A bare invocation prints the help and exits 0.
fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => e.exit(),
    }
}

fn main() {
    let args = parse_args();
    init_logging(args.quiet);

    let config = match MapperConfig::new(
        &args.ml_tree,
        &args.bayes_tree,
        &args.out,
        args.tree_format,
        args.min_bp,
        args.min_pp,
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            std::process::exit(e.exit_code());
        }
    };

    let t0 = Instant::now();
    match run(&config) {
        Ok(summary) => {
            let secs = t0.elapsed().as_secs_f64();
            info!(
                "Wrote {} ({} unmatched ML branches) in {secs:.3}s",
                summary.output.display(),
                summary.mapping.unmatched_count()
            );
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(e.exit_code());
        }
    }
}
