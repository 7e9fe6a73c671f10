//! # Tableau Context CLI (`tbctx`)
//!
//! The `tbctx` binary drives the extraction-and-assembly pipeline: parse a
//! Tableau workbook or Prep flow into a canonical JSON record, then combine
//! a stored record with matching historical issues into a context block.
//!
//! ## Usage
//!
//! ```bash
//! tbctx --config ./config/tbctx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tbctx parse workbook <file> <name>` | Extract workbook metadata and save it under `<name>` |
//! | `tbctx parse flow <file> <name>` | Extract prep-flow metadata and save it under `<name>` |
//! | `tbctx context <name>` | Assemble the context block for a dashboard or flow |
//! | `tbctx issues <name>` | List historical issues matching a dashboard name |

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};

use tableau_context::config::{self, Config};
use tableau_context::context::{self, RenderLimits};
use tableau_context::document::Document;
use tableau_context::issues::HistoricalIssueIndex;
use tableau_context::models::{DashboardKind, DashboardMetadata};
use tableau_context::store::MetadataStore;
use tableau_context::{prepflow, workbook};

/// Tableau Context CLI — metadata extraction and context assembly for
/// Tableau workbooks and Prep flows.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file falls back to built-in defaults.
#[derive(Parser)]
#[command(
    name = "tbctx",
    about = "Tableau Context — metadata extraction and context assembly for Tableau workbooks and Prep flows",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tbctx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Parse a Tableau XML artifact into a canonical metadata record.
    ///
    /// Writes `<metadata_dir>/workbooks/<name>.json` or
    /// `<metadata_dir>/prep_flows/<name>.json` and prints per-collection
    /// counts. Re-running overwrites the previous record.
    Parse {
        #[command(subcommand)]
        artifact: ParseArtifact,
    },

    /// Assemble the context block for a dashboard or flow.
    ///
    /// Loads the stored metadata record (a placeholder is rendered when none
    /// exists), queries the historical-issue index, and prints the combined
    /// Markdown context block to stdout.
    Context {
        /// Dashboard or flow name (the key the record was saved under).
        name: String,

        /// Artifact kind the record was saved as.
        #[arg(long, value_enum, default_value_t = KindArg::Workbook)]
        kind: KindArg,

        /// Maximum historical issues to include (overrides config).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List historical issues matching a dashboard name.
    ///
    /// Matching is a case-insensitive substring test against the
    /// `Dashboard/Workflow Name` column, in original dataset order.
    Issues {
        /// Dashboard or flow name to match.
        name: String,

        /// Maximum issues to list (overrides config).
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Artifact-specific parse subcommands.
#[derive(Subcommand)]
enum ParseArtifact {
    /// Parse a Tableau workbook (.twb).
    Workbook {
        /// Path to the workbook XML file.
        file: PathBuf,
        /// Record key (dashboard name) to save the metadata under.
        name: String,
    },
    /// Parse a Tableau Prep flow (.tfl).
    Flow {
        /// Path to the prep-flow XML file.
        file: PathBuf,
        /// Record key (flow name) to save the metadata under.
        name: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Workbook,
    PrepFlow,
}

impl From<KindArg> for DashboardKind {
    fn from(kind: KindArg) -> DashboardKind {
        match kind {
            KindArg::Workbook => DashboardKind::Workbook,
            KindArg::PrepFlow => DashboardKind::PrepFlow,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        Config::default()
    };
    let store = MetadataStore::new(&cfg.paths.metadata_dir);

    match cli.command {
        Commands::Parse { artifact } => match artifact {
            ParseArtifact::Workbook { file, name } => {
                let doc = Document::from_path(&file)
                    .with_context(|| format!("Failed to load workbook: {}", file.display()))?;
                let metadata = workbook::extract(&doc, &name, &file_name(&file));
                println!("Parsed workbook '{}':", name);
                println!("  - Data sources: {}", metadata.datasources.len());
                println!("  - Calculated fields: {}", metadata.calculated_fields.len());
                println!("  - Parameters: {}", metadata.parameters.len());
                println!("  - Filters: {}", metadata.filters.len());
                println!("  - Joins: {}", metadata.joins.len());
                let path = store.save(&DashboardMetadata::Workbook(metadata), &name)?;
                println!("Saved workbook metadata to: {}", path.display());
            }
            ParseArtifact::Flow { file, name } => {
                let doc = Document::from_path(&file)
                    .with_context(|| format!("Failed to load prep flow: {}", file.display()))?;
                let metadata = prepflow::extract(&doc, &name, &file_name(&file));
                println!("Parsed prep flow '{}':", name);
                println!("  - Input sources: {}", metadata.input_sources.len());
                println!("  - Steps: {}", metadata.steps.len());
                println!("  - Joins: {}", metadata.joins.len());
                println!("  - Outputs: {}", metadata.outputs.len());
                let path = store.save(&DashboardMetadata::PrepFlow(metadata), &name)?;
                println!("Saved prep flow metadata to: {}", path.display());
            }
        },
        Commands::Context { name, kind, limit } => {
            let kind = DashboardKind::from(kind);
            let index = HistoricalIssueIndex::load(&cfg.paths.issues_path);
            let metadata = store.load(&name, kind);
            let issues = index.issues_for(&name, limit.unwrap_or(cfg.context.max_issues));
            let block = context::assemble(
                &name,
                kind,
                metadata.as_ref(),
                &issues,
                RenderLimits {
                    max_calculated_fields: cfg.context.max_calculated_fields,
                    max_filters: cfg.context.max_filters,
                },
            );
            println!("{}", block);
        }
        Commands::Issues { name, limit } => {
            let index = HistoricalIssueIndex::load(&cfg.paths.issues_path);
            let issues = index.issues_for(&name, limit.unwrap_or(cfg.context.max_issues));
            if issues.is_empty() {
                println!("No historical issues found for '{}'.", name);
            } else {
                println!("Found {} issue(s) for '{}':", issues.len(), name);
                for (i, issue) in issues.iter().enumerate() {
                    println!("{}. [{}] {}", i + 1, issue.dashboard_name, issue.issue_description);
                    println!("   Root cause: {}", issue.root_cause);
                    println!("   Resolution: {}", issue.resolution);
                }
            }
        }
    }

    Ok(())
}

/// The bare file name recorded in `source_file`, falling back to the full
/// path text for pathological paths.
fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
