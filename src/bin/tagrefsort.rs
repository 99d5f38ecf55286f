//! tagrefsort CLI - renumber LaTeX \tag equations in a Jupyter notebook

#[cfg(feature = "cli")]
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tagrefsort::{update_notebook, Notebook, RenumberError, RenumberOptions, RenumberResult};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "tagrefsort")]
#[command(version)]
#[command(
    about = "Read a Jupyter Notebook (.ipynb) file and normalize LaTeX \\tag numbering",
    long_about = None
)]
struct Cli {
    /// Path to the .ipynb file to be modified
    notebook: PathBuf,

    /// Path to save the modified .ipynb file (overwrites the input if not provided)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number given to the first tag
    #[arg(long, value_name = "N")]
    start: Option<u32>,

    /// Only renumber tags; leave $(label)$ references alone
    #[arg(long)]
    no_refs: bool,

    /// TOML file with renumbering options
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write a JSON report of assigned tags and warnings
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn is_notebook_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "ipynb")
}

#[cfg(feature = "cli")]
fn load_options(cli: &Cli) -> RenumberResult<RenumberOptions> {
    let mut options = match cli.config {
        Some(ref path) => {
            let text = fs::read_to_string(path)?;
            toml::from_str::<RenumberOptions>(&text).map_err(|e| {
                RenumberError::invalid_input(format!("config {}: {}", path.display(), e))
            })?
        }
        None => RenumberOptions::default(),
    };
    if let Some(start) = cli.start {
        options.first_tag = start.max(1);
    }
    if cli.no_refs {
        options.rewrite_refs = false;
    }
    Ok(options)
}

#[cfg(feature = "cli")]
fn run(cli: &Cli) -> RenumberResult<()> {
    let options = load_options(cli)?;
    let output = cli.output.as_deref().unwrap_or(&cli.notebook);

    let mut notebook = Notebook::read(&cli.notebook)?;
    let report = update_notebook(&mut notebook, options)?;
    notebook.write(output)?;

    if let Some(ref path) = cli.report {
        fs::write(path, report.to_json_string()?)?;
    }

    if cli.output.is_some() {
        println!("Written: {}", output.display());
    } else {
        println!("Overwritten: {}", cli.notebook.display());
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tagrefsort=warn")),
        )
        .init();

    let cli = Cli::parse();

    if !cli.notebook.exists() {
        fail(format!("file not found: {}", cli.notebook.display()));
    }
    if !is_notebook_path(&cli.notebook) {
        fail("input file must be .ipynb");
    }
    if cli.output.as_deref().is_some_and(|p| !is_notebook_path(p)) {
        fail("output file must be .ipynb");
    }

    if let Err(e) = run(&cli) {
        fail(e);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install tagrefsort --features cli");
    eprintln!("  tagrefsort [OPTIONS] <NOTEBOOK>");
}
