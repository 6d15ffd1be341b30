//! Regtags CLI - command-line access to the multi-tenant tag store

use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use regtags::config::{self, RegtagsConfig};
use regtags::ui::{self, Icons, theme};
use regtags::{
    AuthorFilter, PageRequest, PaginationContext, RequestContext, ResourceVersion, TagId, TagStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "regtags")]
#[command(version)]
#[command(about = "Multi-tenant tag store for versioned registry resources")]
#[command(long_about = r#"
Regtags attaches tags to immutable resource versions, scoped per tenant.

Example usage:
  regtags add 100 release --author alice
  regtags count 100 release
  regtags counts 100 --start 1 --count 10 --sort-by count --sort-order desc
  regtags paths release stable
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Tenant to act as (overrides config)
    #[arg(short, long, global = true, allow_negative_numbers = true)]
    tenant: Option<i32>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Tag a resource version
    Add {
        version: i64,
        tag: String,
        #[arg(short, long)]
        author: String,
    },

    /// Copy every tag of one version onto another
    Copy { from: i64, to: i64 },

    /// List tag names on a version
    Tags { version: i64 },

    /// Check whether an author applied a tag to a version
    Exists {
        version: i64,
        tag: String,
        #[arg(short, long)]
        author: String,
    },

    /// Count taggings of one name on a version
    Count { version: i64, tag: String },

    /// Tag names on a version with their counts
    Counts {
        version: i64,
        /// First row of the page (1-based)
        #[arg(long)]
        start: Option<i64>,
        /// Page size
        #[arg(long)]
        count: Option<i64>,
        /// Sort field: name or count
        #[arg(long, default_value = "")]
        sort_by: String,
        /// Sort order: asc or desc
        #[arg(long, default_value = "")]
        sort_order: String,
    },

    /// List taggings on a version
    Taggings {
        version: i64,
        /// Only taggings with this exact name
        #[arg(long)]
        tag: Option<String>,
        /// Only taggings by this author (default: any author)
        #[arg(short, long, requires = "tag")]
        author: Option<String>,
    },

    /// Show one tagging by id
    Tagging { id: i64 },

    /// Paths of resources carrying any of the tags
    Paths {
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Remove a tag from a version
    Remove {
        version: i64,
        tag: String,
        /// Only remove the tags applied by this author
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Show statistics for the tenant
    Stats,
}

fn open_store(cli: &Cli, config: &RegtagsConfig) -> anyhow::Result<TagStore> {
    let database = cli
        .database
        .clone()
        .or_else(|| config.database.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| config::default_database_path_in(&PathBuf::from(".")));
    config::ensure_db_dir(&database)?;

    let tenant = cli.tenant.map(regtags::TenantId).unwrap_or_else(|| config.tenant_id());
    tracing::debug!("Opening {:?} as tenant {}", database, tenant);

    let store = TagStore::open(&database, Arc::new(tenant), Arc::new(config.locator()?))?
        .with_key_strategy(config.storage.key_strategy)
        .with_pagination(config.pagination.enabled);
    store.set_busy_timeout(config.storage.busy_timeout())?;
    Ok(store)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
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
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(&cli) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    if let Commands::Init { force } = cli.command {
        let config = RegtagsConfig {
            database: Some(config::default_database_path_in(&PathBuf::from(".")).display().to_string()),
            ..RegtagsConfig::default()
        };
        config::write_config(&config_path, &config, force)?;
        ui::success(&format!("Wrote {}", config_path.display()));
        return Ok(());
    }

    let config = config::load_config(Some(&config_path))?.unwrap_or_default();
    let store = open_store(cli, &config)?;
    let json = cli.format == Format::Json;

    match &cli.command {
        Commands::Init { .. } => unreachable!("handled before opening the store"),

        Commands::Add { version, tag, author } => {
            store.add_tagging(tag, ResourceVersion(*version), author)?;
            ui::success(&format!("Tagged version {} with '{}'", version, tag));
        }

        Commands::Copy { from, to } => {
            store.copy_tags(ResourceVersion(*from), ResourceVersion(*to))?;
            let copied = store.get_tags(ResourceVersion(*to))?.len();
            ui::status(Icons::COPY, "Copied", &format!("version {} -> {} ({} tags on target)", from, to, copied));
        }

        Commands::Tags { version } => {
            let tags = store.get_tags(ResourceVersion(*version))?;
            if json {
                print_json(&tags)?;
            } else if tags.is_empty() {
                println!("{} No tags on version {}.", Icons::EMPTY, version);
            } else {
                for tag in tags {
                    println!("{} {}", Icons::TAG, tag.style(theme().tag.clone()));
                }
            }
        }

        Commands::Exists { version, tag, author } => {
            let exists = store.tagging_exists(tag, ResourceVersion(*version), author)?;
            if json {
                print_json(&serde_json::json!({ "exists": exists }))?;
            } else if exists {
                ui::success(&format!("{} tagged version {} with '{}'", author, version, tag));
            } else {
                println!("{} {} has not tagged version {} with '{}'", Icons::CROSS, author, version, tag);
            }
        }

        Commands::Count { version, tag } => {
            let count = store.get_tag_count(ResourceVersion(*version), tag)?;
            if json {
                print_json(&serde_json::json!({ "tag": tag, "count": count }))?;
            } else {
                ui::summary_row(tag, &count.to_string());
            }
        }

        Commands::Counts { version, start, count, sort_by, sort_order } => {
            let request = match (start, count) {
                (None, None) if sort_by.is_empty() && sort_order.is_empty() => PageRequest::unpaginated(),
                _ => PageRequest::new(PaginationContext::from_raw(
                    start.unwrap_or(1),
                    count.unwrap_or(i64::from(u32::MAX)),
                    sort_by,
                    sort_order,
                )?),
            };
            let counts = store.get_tags_with_count(ResourceVersion(*version), Some(&request as &dyn RequestContext))?;
            if json {
                print_json(&serde_json::json!({ "tags": counts, "total": request.row_count() }))?;
            } else {
                println!("{}", ui::count_table(&counts));
                if let Some(total) = request.row_count() {
                    ui::info("Total", &total.to_string());
                }
            }
        }

        Commands::Taggings { version, tag, author } => {
            let version = ResourceVersion(*version);
            let taggings = match tag {
                Some(tag) => store.get_tagging(version, tag, &AuthorFilter::from(author.clone()))?,
                None => store.get_taggings(version)?,
            };
            if json {
                print_json(&taggings)?;
            } else if taggings.is_empty() {
                println!("{} No taggings found.", Icons::EMPTY);
            } else {
                println!("{}", ui::tagging_table(&taggings));
            }
        }

        Commands::Tagging { id } => match store.get_tagging_by_id(TagId(*id))? {
            Some(tagging) if json => print_json(&tagging)?,
            Some(tagging) => {
                ui::status(Icons::TAG, "Tag", &tagging.name);
                ui::status(Icons::PERSON, "Author", &tagging.author);
                ui::status(Icons::PAGE, "Tagged", &tagging.tagged_at.to_rfc3339());
                match &tagging.resource_path {
                    Some(path) => ui::status(Icons::LINK, "Path", &path.style(theme().path.clone()).to_string()),
                    None => ui::status(Icons::LINK, "Path", &ui::muted("unresolved")),
                }
            }
            None => {
                ui::warn(&format!("No tagging with id {}", id));
                std::process::exit(2);
            }
        },

        Commands::Paths { tags } => {
            let paths = store.get_paths_with_any_tag(tags.as_slice())?;
            if json {
                print_json(&paths)?;
            } else if paths.is_empty() {
                println!("{} No resources carry {}.", Icons::EMPTY, tags.join(", "));
            } else {
                ui::header(Icons::SEARCH, &format!("Resources tagged {}", tags.join(" or ")));
                for path in paths {
                    println!("  {}", path.style(theme().path.clone()));
                }
            }
        }

        Commands::Remove { version, tag, author } => {
            let version = ResourceVersion(*version);
            let removed = match author {
                Some(author) => store.remove_taggings(version, tag, author)?,
                None => store.remove_tagging(version, tag)?,
            };
            ui::status(Icons::DEL, "Removed", &format!("{} tag rows {}", removed, ui::dim(&format!("({})", tag))));
        }

        Commands::Stats => {
            let stats = store.stats()?;
            if json {
                print_json(&stats)?;
            } else {
                ui::header(Icons::STATS, "Regtags Statistics");
                ui::status(Icons::DATABASE, "Key strategy", store.key_strategy().as_str());
                ui::section("Rows");
                println!("{}", ui::stats_table(&stats));
            }
        }
    }

    Ok(())
}
