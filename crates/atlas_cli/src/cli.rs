//! Argument surface and command dispatch.
//!
//! # Responsibility
//! - Define the clap command tree for bookmark CRUD and HTML import.
//! - Own the store handle lifecycle: open the database per invocation and
//!   pass it down explicitly, no process-global connection.

use anyhow::{Context, Result};
use atlas_core::db::open_db;
use atlas_core::{
    default_log_level, init_logging, Bookmark, BookmarkDraft, BookmarkId, BookmarkPatch,
    BookmarkService, HtmlImporter, ImportSummary, SqliteBookmarkRepository,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_DB_FILE: &str = "atlas.sqlite3";

/// Top-level CLI for the Atlas bookmark manager.
#[derive(Debug, Parser)]
#[command(name = "atlas")]
#[command(about = "Personal bookmark manager with URL deduplication", long_about = None)]
pub struct Cli {
    /// Path to the SQLite database file.
    #[arg(long, global = true, default_value = DEFAULT_DB_FILE)]
    pub db: PathBuf,

    /// Directory for rolling diagnostic logs. Logging stays off without it.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Log level used when --log-dir is set.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Save a bookmark unless its normalized URL already exists.
    Add {
        /// URL to save.
        url: String,

        /// Display title. Defaults to the URL.
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Tag value; repeat the flag for multiple tags.
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Label describing where this bookmark came from.
        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        language: Option<String>,

        /// Print the stored record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show one bookmark by ID or by raw URL.
    Show {
        /// Bookmark ID, or a URL to look up through normalization.
        target: String,

        #[arg(long)]
        json: bool,
    },

    /// List bookmarks, newest first.
    List {
        #[arg(long)]
        limit: Option<u32>,

        #[arg(long, default_value_t = 0)]
        offset: u32,

        #[arg(long)]
        json: bool,
    },

    /// Update fields of an existing bookmark.
    ///
    /// Patching --url never recomputes the dedup key.
    Update {
        /// Bookmark ID.
        id: String,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Replacement tag value; repeat the flag for the full new set.
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Delete one bookmark by ID.
    Delete {
        /// Bookmark ID.
        id: String,
    },

    /// Import bookmarks from an exported HTML file.
    Import {
        /// Path to the exported HTML file.
        path: PathBuf,

        /// Parse the HTML without persisting bookmarks to the database.
        #[arg(long)]
        dry_run: bool,

        /// Directory to write a timestamped import summary report.
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Source label stamped on imported bookmarks.
        #[arg(long)]
        source_label: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

pub fn run_from_args() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_ref() {
        let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
        init_logging(level, &log_dir.to_string_lossy()).map_err(anyhow::Error::msg)?;
    }

    match cli.command {
        CliCommand::Add {
            url,
            title,
            description,
            tags,
            source,
            language,
            json,
        } => {
            let mut draft = BookmarkDraft::new(url, title.unwrap_or_default());
            draft.description = description;
            draft.tags = tags;
            draft.source = source;
            draft.language = language;

            let mut conn = open_db(&cli.db)?;
            let repo = SqliteBookmarkRepository::new(&mut conn);
            let service = BookmarkService::new(repo);

            let (bookmark, created) = service.create_bookmark(&draft)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&bookmark)?);
            } else if created {
                println!("Saved {} -> {}", bookmark.uuid, bookmark.url);
            } else {
                println!(
                    "Already saved as {} ({}), keeping the existing record",
                    bookmark.uuid, bookmark.title
                );
            }
        }

        CliCommand::Show { target, json } => {
            let mut conn = open_db(&cli.db)?;
            let repo = SqliteBookmarkRepository::new(&mut conn);
            let service = BookmarkService::new(repo);

            let bookmark = match BookmarkId::parse_str(&target) {
                Ok(id) => service.get_bookmark(id)?,
                Err(_) => service.get_bookmark_by_url(&target)?,
            };
            let bookmark =
                bookmark.with_context(|| format!("no bookmark matches `{target}`"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&bookmark)?);
            } else {
                print_bookmark_details(&bookmark);
            }
        }

        CliCommand::List {
            limit,
            offset,
            json,
        } => {
            let mut conn = open_db(&cli.db)?;
            let repo = SqliteBookmarkRepository::new(&mut conn);
            let service = BookmarkService::new(repo);

            let listed = service.list_bookmarks(limit, offset)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listed.items)?);
            } else if listed.items.is_empty() {
                println!("No bookmarks.");
            } else {
                for bookmark in &listed.items {
                    println!("{}  {}  {}", bookmark.uuid, bookmark.title, bookmark.url);
                }
            }
        }

        CliCommand::Update {
            id,
            url,
            title,
            description,
            tags,
            source,
            language,
            json,
        } => {
            let id = parse_bookmark_id(&id)?;
            let patch = BookmarkPatch {
                url,
                title,
                description,
                tags: if tags.is_empty() { None } else { Some(tags) },
                source,
                language,
                ..Default::default()
            };

            let mut conn = open_db(&cli.db)?;
            let repo = SqliteBookmarkRepository::new(&mut conn);
            let service = BookmarkService::new(repo);

            let updated = service.update_bookmark(id, &patch)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&updated)?);
            } else {
                println!("Updated {}", updated.uuid);
            }
        }

        CliCommand::Delete { id } => {
            let id = parse_bookmark_id(&id)?;

            let mut conn = open_db(&cli.db)?;
            let repo = SqliteBookmarkRepository::new(&mut conn);
            let service = BookmarkService::new(repo);

            service.delete_bookmark(id)?;
            println!("Deleted {id}");
        }

        CliCommand::Import {
            path,
            dry_run,
            report_dir,
            source_label,
            json,
        } => {
            let importer = match source_label {
                Some(label) => HtmlImporter::with_source(Some(label)),
                None => HtmlImporter::new(),
            };
            let drafts = importer.parse_file(&path)?;

            let summary = if dry_run {
                ImportSummary {
                    imported: drafts.len(),
                    skipped_duplicates: 0,
                }
            } else {
                let mut conn = open_db(&cli.db)?;
                let repo = SqliteBookmarkRepository::new(&mut conn);
                let mut service = BookmarkService::new(repo);
                service.import_drafts(drafts.clone())?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "Imported: {}, skipped duplicates: {}",
                    summary.imported, summary.skipped_duplicates
                );
            }

            if let Some(dir) = report_dir {
                let report = write_import_report(&dir, &path, &drafts, &summary)?;
                println!("Results written to {}", report.display());
            }
        }
    }

    Ok(())
}

fn parse_bookmark_id(raw: &str) -> Result<BookmarkId> {
    BookmarkId::parse_str(raw).with_context(|| format!("`{raw}` is not a valid bookmark ID"))
}

fn print_bookmark_details(bookmark: &Bookmark) {
    println!("{}  {}", bookmark.uuid, bookmark.title);
    println!("  url:            {}", bookmark.url);
    println!("  normalized url: {}", bookmark.normalized_url);
    if let Some(description) = bookmark.description.as_deref() {
        println!("  description:    {description}");
    }
    if !bookmark.tags.is_empty() {
        println!("  tags:           {}", bookmark.tag_list().join(", "));
    }
    if let Some(source) = bookmark.source.as_deref() {
        println!("  source:         {source}");
    }
    if let Some(language) = bookmark.language.as_deref() {
        println!("  language:       {language}");
    }
    println!("  created at:     {} ms", bookmark.created_at);
    println!("  updated at:     {} ms", bookmark.updated_at);
}

/// Writes a human-readable import report next to the structured logs.
///
/// The file name embeds the Unix timestamp so repeated imports never
/// overwrite each other.
fn write_import_report(
    dir: &Path,
    source_file: &Path,
    drafts: &[BookmarkDraft],
    summary: &ImportSummary,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory `{}`", dir.display()))?;

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    let report_path = dir.join(format!("results_{stamp}.log"));

    let mut lines = vec![
        format!("Import executed at {stamp} (unix seconds)"),
        format!("Source file: {}", source_file.display()),
        format!("Total parsed bookmarks: {}", drafts.len()),
        format!("Imported records: {}", summary.imported),
        format!("Skipped duplicates: {}", summary.skipped_duplicates),
        String::new(),
        "Bookmarks:".to_string(),
    ];

    if drafts.is_empty() {
        lines.push("  (no bookmarks parsed)".to_string());
    } else {
        for (index, draft) in drafts.iter().enumerate() {
            lines.push(format!("  {}. {} -> {}", index + 1, draft.title, draft.url));
            if !draft.tags.is_empty() {
                lines.push(format!("     Tags: {}", draft.tags.join(", ")));
            }
            if let Some(description) = draft.description.as_deref() {
                lines.push(format!("     Description: {description}"));
            }
            if let Some(source) = draft.source.as_deref() {
                lines.push(format!("     Source: {source}"));
            }
        }
    }

    let body = lines.join("\n") + "\n";
    std::fs::write(&report_path, body)
        .with_context(|| format!("failed to write report `{}`", report_path.display()))?;
    Ok(report_path)
}
