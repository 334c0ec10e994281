//! Command-line interface for the Tarn front end.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tarn_resolve::resolve;
use tarn_syntax::{parse, pretty_print, Program};
use tarn_trans::decls_quantifier_alternation_graph;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tarn", version)]
#[command(about = "Tarn specification language front end", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and resolve a Tarn file
    Parse {
        /// Input file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dump the resolved syntax tree
        #[arg(short, long)]
        verbose: bool,
    },

    /// Pretty-print a Tarn file
    Format {
        /// Input file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the quantifier-alternation graph, one edge per line
    Graph {
        /// Input file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

fn run(cli: Cli) -> Result<(), ExitCode> {
    match cli.command {
        Commands::Parse { file, verbose } => {
            let program = load_resolved(&file)?;
            info!(file = %file.display(), decls = program.decls.len(), "parsed and resolved");
            if verbose {
                println!("{:#?}", program);
            } else {
                println!("{}: {} declarations", file.display(), program.decls.len());
            }
            Ok(())
        }
        Commands::Format { file } => {
            // Formatting prints the tree as parsed, before resolution
            // rewrites two-state expressions.
            let program = load_parsed(&file)?;
            print!("{}", pretty_print(&program));
            Ok(())
        }
        Commands::Graph { file } => {
            let program = load_resolved(&file)?;
            let graph = decls_quantifier_alternation_graph(&program, []).map_err(|e| {
                eprintln!("{}: error: {}", file.display(), e);
                ExitCode::FAILURE
            })?;
            for (from, to) in graph.edges() {
                println!("{} -> {}", from, to);
            }
            Ok(())
        }
    }
}

fn load_parsed(file: &Path) -> Result<Program, ExitCode> {
    let source = fs::read_to_string(file).map_err(|e| {
        eprintln!("{}: {}", file.display(), e);
        ExitCode::FAILURE
    })?;
    parse(&source).map_err(|e| {
        eprintln!("{}", e.render(&file.display().to_string()));
        ExitCode::FAILURE
    })
}

fn load_resolved(file: &Path) -> Result<Program, ExitCode> {
    let mut program = load_parsed(file)?;
    resolve(&mut program).map_err(|e| {
        let span = e.span();
        eprintln!(
            "{}:{}:{}: error: {}",
            file.display(),
            span.line,
            span.column,
            e
        );
        ExitCode::FAILURE
    })?;
    Ok(program)
}
