//! Scopedb CLI - Command-line interface for the program scope database

use clap::{Parser, Subcommand};
use scopedb::frontend::FileUnit;
use scopedb::model::uses::{NamePrefix, Use, UseKind};
use scopedb::resolve::{Candidate, Resolver};
use scopedb::{Language, Query, SourceLocation, StructuralPath, WorkingSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "scopedb")]
#[command(version = "0.0.1")]
#[command(about = "Cross-file program scope database - merge, query, resolve")]
#[command(long_about = r#"
Scopedb merges per-file scope fragments into one global scope tree and
resolves names, types, and calls against it.

Example usage:
  scopedb index --path ./fragments
  scopedb resolve --path ./fragments --name App.Widget --kind type
  scopedb show --path ./fragments
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a scopedb.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a directory of fragment files and print statistics
    Index {
        /// Directory containing *.scope.json fragment files
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Resolve a possibly-qualified name against an indexed directory
    Resolve {
        /// Directory containing *.scope.json fragment files
        #[arg(short, long)]
        path: PathBuf,

        /// Name to resolve, e.g. "App.Widget"
        #[arg(short, long)]
        name: String,

        /// What the name is used as (type, namespace, name)
        #[arg(short, long, default_value = "type")]
        kind: String,

        /// Language of the use site
        #[arg(short, long)]
        language: Option<String>,

        /// Read-lock budget in milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,
    },

    /// Print the merged scope tree
    Show {
        /// Directory containing *.scope.json fragment files
        #[arg(short, long)]
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = scopedb::config::load_config(cli.config.as_deref())?.unwrap_or_default();

    match cli.command {
        Commands::Index { path } => {
            let (working_set, indexed) = index_directory(&path, &config)?;
            println!("✅ Indexed {indexed} fragment files");
            let snapshot = working_set.snapshot(config.lock_timeout())?;
            print!("{}", snapshot.stats());
        }

        Commands::Resolve {
            path,
            name,
            kind,
            language,
            timeout_ms,
        } => {
            let (working_set, _) = index_directory(&path, &config)?;
            let language: Language = language
                .or_else(|| config.language.clone())
                .as_deref()
                .unwrap_or("csharp")
                .parse()?;
            let kind = match kind.as_str() {
                "type" => UseKind::Type,
                "namespace" => UseKind::Namespace,
                "name" => UseKind::Name,
                other => anyhow::bail!("unknown use kind: {other}"),
            };
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.lock_timeout());

            let ws = working_set.clone();
            let query = Query::new(
                &working_set,
                timeout,
                move |tree, (name, kind, language): (String, UseKind, Language)| {
                    let (prefix, simple) = NamePrefix::split_qualified(&name, language);
                    let location = SourceLocation::reference(
                        "<query>",
                        1,
                        1,
                        StructuralPath::parse("/unit")?,
                    );
                    let use_ = Use {
                        name: simple,
                        location,
                        parent_scope: Some(tree.root()),
                        prefix,
                        aliases: Vec::new(),
                        language,
                        kind,
                    };

                    let resolver = Resolver::new(tree, ws.builtins());
                    let candidates = resolver.find_matches(&use_)?;
                    let mut lines = Vec::new();
                    for candidate in candidates {
                        match candidate {
                            Candidate::Definition(id) => {
                                let Some(node) = tree.get(id) else {
                                    continue;
                                };
                                let location = node
                                    .primary_location()
                                    .map(|l| l.to_string())
                                    .unwrap_or_else(|| "<no location>".into());
                                lines.push(format!(
                                    "{} {}  {}",
                                    node.kind.label(),
                                    tree.full_name(id),
                                    location
                                ));
                            }
                            Candidate::Variable { scope, name } => {
                                lines.push(format!(
                                    "variable {} in {}",
                                    name,
                                    tree.full_name(scope)
                                ));
                            }
                            Candidate::BuiltIn(builtin) => {
                                lines.push(format!(
                                    "built-in {} ({})",
                                    builtin.name, builtin.language
                                ));
                            }
                        }
                    }
                    Ok::<_, scopedb::Error>(lines)
                },
            );

            let lines = query.execute((name.clone(), kind, language))??;
            if lines.is_empty() {
                println!("🤔 No matches for {name}");
            } else {
                for line in lines {
                    println!("{line}");
                }
            }
        }

        Commands::Show { path } => {
            let (working_set, _) = index_directory(&path, &config)?;
            let snapshot = working_set.snapshot(config.lock_timeout())?;
            print!("{}", snapshot.format_tree());
        }
    }

    Ok(())
}

/// Walk a directory and feed every fragment file into a fresh working set.
fn index_directory(
    path: &Path,
    config: &scopedb::config::ScopeDbConfig,
) -> anyhow::Result<(WorkingSet, usize)> {
    let working_set = WorkingSet::new();
    let suffix = config.fragment_suffix().to_string();
    let language: Language = config.language.as_deref().unwrap_or("csharp").parse()?;
    let mut indexed = 0;

    for entry in ignore::WalkBuilder::new(path)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
    {
        let file_path = entry.path();
        if !file_path.to_string_lossy().ends_with(&suffix) {
            continue;
        }
        let relative = file_path
            .strip_prefix(path)
            .unwrap_or(file_path)
            .to_string_lossy()
            .to_string();
        let content = std::fs::read_to_string(file_path)?;
        let unit = FileUnit::new(relative.clone(), language, content);
        match working_set.add_or_update_file(&unit) {
            Ok(()) => indexed += 1,
            Err(e) => tracing::warn!("skipping {relative}: {e}"),
        }
    }

    Ok((working_set, indexed))
}
