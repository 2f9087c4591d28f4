//! Weave CLI - document composition from the command line

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;

use weave::{
    ComposeError, ComposeOptions, Composer, DocumentNode, FileErrorPolicy, FixSuggestion,
    MissingSlotPolicy, ParsedDocument, ResolveFrom, SlotValue, DEFAULT_MAX_DEPTH,
};

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Weave - fills slot markers in documents from reusable fragments")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a document, filling its slot markers
    Compose {
        /// Path to the root document
        file: PathBuf,

        /// JSON file mapping slot names to values (string, {"source": ..},
        /// or {"text"/"source": .., "slots": {..}})
        #[arg(short, long)]
        slots: Option<PathBuf>,

        /// Write output here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Base directory for relative source paths
        #[arg(long)]
        base_path: Option<PathBuf>,

        /// Resolve relative paths against the cwd or the parent document
        #[arg(long, value_enum, default_value = "cwd")]
        resolve_from: ResolveFrom,

        /// Maximum composition depth
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Policy for placeholders with no slot value
        #[arg(long, value_enum, default_value = "keep")]
        on_missing_slot: MissingSlotPolicy,

        /// Policy for unreadable or absent sources
        #[arg(long, value_enum, default_value = "warn-empty")]
        on_file_error: FileErrorPolicy,

        /// Resolve independent slots concurrently
        #[arg(long)]
        parallel: bool,
    },

    /// List the unprotected placeholders in a document
    Inspect {
        /// Path to the document
        file: PathBuf,
    },
}

/// One slot definition in the --slots JSON file.
#[derive(Deserialize)]
#[serde(untagged)]
enum SlotSpec {
    Literal(String),
    Detailed(DetailedSlot),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedSlot {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    source: Option<PathBuf>,
    #[serde(default)]
    slots: Option<HashMap<String, SlotSpec>>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compose {
            file,
            slots,
            out,
            base_path,
            resolve_from,
            max_depth,
            on_missing_slot,
            on_file_error,
            parallel,
        } => {
            let options = ComposeOptions {
                base_path,
                resolve_from,
                max_depth,
                on_missing_slot,
                on_file_error,
                parallel,
                cache: None,
            };
            run_compose(&file, slots.as_deref(), out.as_deref(), options).await
        }
        Commands::Inspect { file } => inspect(&file).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn run_compose(
    file: &std::path::Path,
    slots_file: Option<&std::path::Path>,
    out_file: Option<&std::path::Path>,
    options: ComposeOptions,
) -> Result<(), ComposeError> {
    let mut node = DocumentNode::from_source(file);
    if let Some(path) = slots_file {
        for (name, value) in load_slots(path)? {
            node = node.with_slot(name, value);
        }
    }

    let composed = Composer::new().compose(&node, &options).await?;

    for err in &composed.errors {
        eprintln!("{} {}", "Warning:".yellow().bold(), err);
        if let Some(suggestion) = err.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
    }

    match out_file {
        Some(path) => tokio::fs::write(path, &composed.text)
            .await
            .map_err(|e| ComposeError::Source {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?,
        None => print!("{}", composed.text),
    }

    Ok(())
}

async fn inspect(file: &std::path::Path) -> Result<(), ComposeError> {
    let text = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| ComposeError::Source {
            path: file.to_path_buf(),
            details: e.to_string(),
        })?;

    let parsed = ParsedDocument::parse(&text);
    println!(
        "{} {} placeholder(s), {} protected region(s)",
        "✓".green(),
        parsed.placeholders().len(),
        parsed.regions().len()
    );
    for ph in parsed.placeholders() {
        println!("  {} at byte {}", ph.name.cyan(), ph.start);
    }

    Ok(())
}

fn load_slots(path: &std::path::Path) -> Result<Vec<(String, SlotValue)>, ComposeError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ComposeError::Source {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    let specs: HashMap<String, SlotSpec> = serde_json::from_str(&raw)
        .map_err(|e| ComposeError::Validation {
            details: format!("invalid slots file '{}': {e}", path.display()),
        })?;

    specs
        .into_iter()
        .map(|(name, spec)| Ok((name.clone(), slot_value(&name, spec)?)))
        .collect()
}

fn slot_value(name: &str, spec: SlotSpec) -> Result<SlotValue, ComposeError> {
    let detailed = match spec {
        SlotSpec::Literal(text) => return Ok(SlotValue::text(text)),
        SlotSpec::Detailed(d) => d,
    };

    let mut node = match (detailed.text, detailed.source) {
        (Some(_), Some(_)) => {
            return Err(ComposeError::Validation {
                details: format!("slot '{name}' has both text and source; pick one"),
            })
        }
        (None, None) => {
            return Err(ComposeError::Validation {
                details: format!("slot '{name}' needs text or source"),
            })
        }
        (Some(text), None) => {
            if detailed.slots.is_none() {
                return Ok(SlotValue::text(text));
            }
            DocumentNode::from_text(text)
        }
        (None, Some(source)) => {
            if detailed.slots.is_none() {
                return Ok(SlotValue::source(source));
            }
            DocumentNode::from_source(source)
        }
    };

    for (child_name, child_spec) in detailed.slots.unwrap_or_default() {
        let value = slot_value(&child_name, child_spec)?;
        node = node.with_slot(child_name, value);
    }
    Ok(SlotValue::node(node))
}
