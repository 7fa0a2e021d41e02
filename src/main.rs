//! modelbook CLI: compile model definitions into a notebook.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use modelbook::compiler::ModelCompiler;
use modelbook::config::ModelConfig;
use modelbook::error::NotebookError;
use modelbook::export;
use modelbook::notebook::Notebook;
use modelbook::sketch::SketchKind;

#[derive(Parser)]
#[command(name = "modelbook", version, about = "Metamodel compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the model described by a config file and write the notebook as JSON.
    Compile {
        /// Path to modelbook.toml.
        config: PathBuf,

        /// Output file; overrides `[output] path`. Stdout when neither is set.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Compile model files and report errors without writing anything.
    Check {
        /// Model DSL files, loaded in order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print one sketch as JSON.
    Show {
        /// Model DSL files, loaded in order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Sketch name.
        #[arg(long)]
        name: String,
    },

    /// List sketch names, optionally of one kind.
    List {
        /// Model DSL files, loaded in order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// constraint, formatter, domain, entity or association.
        #[arg(long)]
        kind: Option<String>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { config, out } => {
            let model = ModelConfig::load(&config)?;
            let base = config.parent().unwrap_or_else(|| Path::new("."));
            let notebook = ModelCompiler::compile_config(&model, base)?;
            let json = export::to_json(&notebook, model.output.pretty).into_diagnostic()?;

            match out.or_else(|| model.output_path(base)) {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent).into_diagnostic()?;
                    }
                    std::fs::write(&path, json).into_diagnostic()?;
                    println!("Compiled model \"{}\" to {}", model.model.name, path.display());
                    println!("{}", export::summary(&notebook));
                }
                None => println!("{json}"),
            }
        }

        Commands::Check { files } => {
            let notebook = compile_files(&files)?;
            println!("OK: {} file(s), {} sketch(es)", files.len(), notebook.len());
            println!("{}", export::summary(&notebook));
        }

        Commands::Show { files, name } => {
            let notebook = compile_files(&files)?;
            let sketch = notebook
                .get(&name)
                .ok_or(NotebookError::NotFound { name: name.clone() })?;
            let json = serde_json::to_string_pretty(sketch).into_diagnostic()?;
            println!("{json}");
        }

        Commands::List { files, kind } => {
            let kind = match kind {
                Some(k) => match SketchKind::parse(&k) {
                    Some(kind) => Some(kind),
                    None => miette::bail!(
                        "unknown sketch kind \"{k}\" (expected constraint, formatter, domain, entity or association)"
                    ),
                },
                None => None,
            };

            let notebook = compile_files(&files)?;
            let sketches: Vec<_> = notebook
                .iter()
                .filter(|s| kind.is_none_or(|k| s.kind() == k))
                .collect();
            if sketches.is_empty() {
                println!("No sketches.");
            } else {
                println!("Sketches ({}):", sketches.len());
                for sketch in sketches {
                    println!("  {} [{}]", sketch.name(), sketch.kind());
                }
            }
        }
    }

    Ok(())
}

fn compile_files(files: &[PathBuf]) -> Result<Notebook> {
    let mut compiler = ModelCompiler::new();
    for file in files {
        compiler.load_file(file)?;
    }
    Ok(compiler.compile(&Notebook::new())?)
}
