use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use crewkb::commands::entry::{AddArgs, UpdateArgs};
use crewkb::commands::{entry, model, search};
use crewkb::completions::{write_completions, CompletionShell};
use crewkb::search::{DEFAULT_RECENT_DAYS, DEFAULT_RELATED_LIMIT, DEFAULT_SEARCH_LIMIT};
use crewkb::store::EntryQuery;
use crewkb::validation::clap_name_validator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crewkb")]
#[command(about = "Shared knowledge base for cooperating agents", long_about = None)]
#[command(version)]
struct Cli {
    /// Knowledge base root directory
    #[arg(long, global = true, default_value = "knowledge")]
    root: PathBuf,

    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the directory layout, categories.yaml and config.toml
    Init,

    /// Add a new entry
    Add {
        /// Entry content
        content: String,

        /// Category to file the entry under
        #[arg(short, long, value_parser = clap_name_validator)]
        category: String,

        /// Tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Origin of the knowledge
        #[arg(short, long, default_value = "cli")]
        source: String,

        /// Confidence in [0, 1]; values outside are clamped
        #[arg(long, default_value_t = 1.0)]
        confidence: f64,

        /// References (repeatable)
        #[arg(short, long = "reference")]
        references: Vec<String>,

        /// Metadata as a JSON object
        #[arg(short, long)]
        metadata: Option<String>,
    },

    /// Show an entry as JSON
    Get {
        #[arg(value_parser = clap_name_validator)]
        category: String,

        #[arg(value_parser = clap_name_validator)]
        id: String,
    },

    /// Update an entry, archiving the previous version
    Update {
        #[arg(value_parser = clap_name_validator)]
        id: String,

        /// Replacement content
        #[arg(long)]
        content: Option<String>,

        /// Replacement tag list (repeatable)
        #[arg(short, long = "tag")]
        tags: Option<Vec<String>>,

        /// Metadata keys to merge, as a JSON object
        #[arg(short, long)]
        metadata: Option<String>,

        #[arg(long)]
        confidence: Option<f64>,
    },

    /// List entry ids in a category
    List {
        #[arg(value_parser = clap_name_validator)]
        category: String,
    },

    /// Filter entries by text, category, tags and confidence
    Query {
        /// Case-insensitive content substring
        text: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// Required tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[arg(long, default_value_t = 0.0)]
        min_confidence: f64,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// List categories with entry counts
    Categories,

    /// List entries carrying a tag
    Tagged { tag: String },

    /// Rebuild the search snapshot
    Reindex,

    /// Rank entries by relevance to a query
    Search {
        query: String,

        /// Restrict to categories (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,

        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,

        /// Record the search in the log under this source
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Entries most similar to a snapshot entry
    Related {
        /// Snapshot key (category/id) or bare entry id
        entry: String,

        #[arg(short, long, default_value_t = DEFAULT_RELATED_LIMIT)]
        limit: usize,
    },

    /// Entries updated within the last N days
    Recent {
        #[arg(short, long, default_value_t = DEFAULT_RECENT_DAYS)]
        days: i64,
    },

    /// Store a structured document under a chosen id
    Store {
        #[arg(value_parser = clap_name_validator)]
        category: String,

        #[arg(value_parser = clap_name_validator)]
        id: String,

        /// Document body as a JSON object
        #[arg(long, conflicts_with = "file")]
        json: Option<String>,

        /// Document body from a JSON or YAML file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show a model's capabilities with best practices and templates
    Model {
        #[arg(value_parser = clap_name_validator)]
        model_id: String,
    },

    /// Show a prompt template with related content
    Template {
        #[arg(value_parser = clap_name_validator)]
        template_id: String,
    },

    /// Check whether a model satisfies a template's required capabilities
    Compat {
        #[arg(value_parser = clap_name_validator)]
        template_id: String,

        #[arg(value_parser = clap_name_validator)]
        model_id: String,
    },

    /// List templates compatible with a model
    Templates {
        #[arg(value_parser = clap_name_validator)]
        model_id: String,
    },

    /// Search domain knowledge
    Domain { domain: String },

    /// Show a model's optimization tips
    Tips {
        #[arg(value_parser = clap_name_validator)]
        model_id: String,
    },

    /// Merge performance metrics into a model's document
    Perf {
        #[arg(value_parser = clap_name_validator)]
        model_id: String,

        /// Metrics as a JSON object
        metrics: String,
    },

    /// Show recorded searches, newest first
    History {
        #[arg(short, long)]
        source: Option<String>,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Aggregate recorded searches
    Stats {
        #[arg(short, long)]
        source: Option<String>,

        #[arg(short, long, default_value_t = DEFAULT_RECENT_DAYS)]
        days: i64,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let root = cli.root.as_path();
    match cli.command {
        Commands::Init => entry::init(root),
        Commands::Add {
            content,
            category,
            tags,
            source,
            confidence,
            references,
            metadata,
        } => entry::add(
            root,
            AddArgs {
                content,
                category,
                tags,
                source,
                confidence,
                references,
                metadata,
            },
        ),
        Commands::Get { category, id } => entry::get(root, &category, &id),
        Commands::Update {
            id,
            content,
            tags,
            metadata,
            confidence,
        } => entry::update(
            root,
            &id,
            UpdateArgs {
                content,
                tags,
                metadata,
                confidence,
            },
        ),
        Commands::List { category } => entry::list(root, &category),
        Commands::Query {
            text,
            category,
            tags,
            min_confidence,
            limit,
        } => entry::query(
            root,
            EntryQuery {
                text,
                category,
                tags,
                min_confidence,
                limit,
            },
        ),
        Commands::Categories => entry::categories(root),
        Commands::Tagged { tag } => entry::tagged(root, &tag),
        Commands::Reindex => search::reindex(root),
        Commands::Search {
            query,
            categories,
            limit,
            source,
        } => search::search(root, &query, categories, limit, source.as_deref()),
        Commands::Related { entry, limit } => search::related(root, &entry, limit),
        Commands::Recent { days } => search::recent(root, days),
        Commands::Store {
            category,
            id,
            json,
            file,
        } => model::store(root, &category, &id, json.as_deref(), file.as_deref()),
        Commands::Model { model_id } => model::model(root, &model_id),
        Commands::Template { template_id } => model::template(root, &template_id),
        Commands::Compat {
            template_id,
            model_id,
        } => model::compat(root, &template_id, &model_id),
        Commands::Templates { model_id } => model::templates(root, &model_id),
        Commands::Domain { domain } => model::domain(root, &domain),
        Commands::Tips { model_id } => model::tips(root, &model_id),
        Commands::Perf { model_id, metrics } => model::perf(root, &model_id, &metrics),
        Commands::History { source, limit } => search::history(root, source.as_deref(), limit),
        Commands::Stats { source, days } => search::stats(root, source.as_deref(), days),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            write_completions(&mut cmd, shell, &mut std::io::stdout());
            Ok(())
        }
    }
}
