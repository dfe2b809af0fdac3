//! Operator CLI over the newsdesk core.
//!
//! # Responsibility
//! - Load configuration, open the store and dispatch one command.
//! - Print plain-text, line-oriented results.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use newsdesk_core::{
    init_logging, open_db, open_db_in_memory, AssetsService, Connection, ContentDocument,
    ContentEdit, ContentKind, ContentListQuery, ContentService, ContentSummary, CoreConfig,
    CurationEntry, CurationList, CurationService, MovieBoard, MovieEntryPatch, NewContent,
    PromoSlot, SlugAllocator, SqliteContentRepository, SqliteCurationRepository,
    SqliteSiteAssetsRepository,
};
use uuid::Uuid;

const IN_MEMORY_DB: &str = ":memory:";

#[derive(Parser)]
#[command(author, version, about = "Newsdesk content and curation tool.")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// SQLite database path (`:memory:` for a scratch store).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check core linkage.
    Ping,
    /// Print the slug a title would receive.
    Slugify {
        title: String,
        #[arg(long, default_value = "news")]
        kind: ContentKind,
    },
    /// Create a document.
    Add(AddArgs),
    /// Replace editable fields of a document.
    Edit(EditArgs),
    /// Print one document by id or slug.
    Show(ShowArgs),
    /// List documents, newest first.
    List(ListArgs),
    /// Delete a document and purge it from curation lists.
    Delete { id: Uuid },
    /// Homepage widgets and section lists.
    Curate {
        #[command(subcommand)]
        command: CurateCommands,
    },
    /// Poster and ad placements.
    Promo {
        #[command(subcommand)]
        command: PromoCommands,
    },
    /// Featured homepage gallery.
    Featured {
        #[command(subcommand)]
        command: FeaturedCommands,
    },
    /// Movie release and collection boards.
    Board {
        #[command(subcommand)]
        command: BoardCommands,
    },
    /// Recent uploaded file links.
    Links {
        #[command(subcommand)]
        command: LinkCommands,
    },
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    kind: ContentKind,
    #[arg(long)]
    title: String,
    /// Required for news and gallery; videos default to `videos`.
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    sub_category: Option<String>,
    #[arg(long)]
    main_url: Option<String>,
    #[arg(long)]
    media_url: Option<String>,
    #[arg(long)]
    posted_by: Option<String>,
    /// Repeatable.
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    movie_rating: Option<i64>,
}

#[derive(Args)]
struct EditArgs {
    id: Uuid,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    sub_category: Option<String>,
    /// Replaces the whole tag set when given.
    #[arg(long = "tag")]
    tags: Vec<String>,
    #[arg(long)]
    movie_rating: Option<i64>,
}

#[derive(Args)]
struct ShowArgs {
    /// Document id, or a slug when `--kind` is given.
    key: String,
    #[arg(long)]
    kind: Option<ContentKind>,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long)]
    kind: Option<ContentKind>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    sub_category: Option<String>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long, default_value_t = 0)]
    offset: u32,
}

#[derive(Subcommand)]
enum CurateCommands {
    /// Replace a list from `ID:POSITION` pairs.
    Set {
        list: CurationList,
        #[arg(value_name = "ID:POSITION", value_parser = parse_entry)]
        entries: Vec<CurationEntry>,
    },
    /// Replace a list from ids; positions follow argument order.
    SetSection { list: CurationList, ids: Vec<Uuid> },
    /// Print a list in position order.
    Show { list: CurationList },
}

#[derive(Subcommand)]
enum PromoCommands {
    Set {
        slot: PromoSlot,
        #[arg(long)]
        image_url: String,
        #[arg(long, default_value = "")]
        link: String,
    },
    /// Print one slot, or every slot when omitted.
    Show { slot: Option<PromoSlot> },
}

#[derive(Subcommand)]
enum FeaturedCommands {
    Set { id: Uuid },
    Clear,
    Show,
}

#[derive(Subcommand)]
enum BoardCommands {
    /// Append a row; DETAIL is the release date or the amount.
    Add {
        board: MovieBoard,
        movie: String,
        detail: String,
        category: String,
    },
    /// Print rows, newest first.
    List { board: MovieBoard },
    /// Change the given fields of one row.
    Edit {
        board: MovieBoard,
        id: Uuid,
        #[arg(long)]
        movie: Option<String>,
        #[arg(long)]
        detail: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    Delete { board: MovieBoard, id: Uuid },
}

#[derive(Subcommand)]
enum LinkCommands {
    Push { url: String },
    /// Print kept links, oldest first.
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => CoreConfig::load(path)
            .with_context(|| format!("loading config `{}`", path.display()))?,
        None => CoreConfig::default(),
    };
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir).context("starting file logging")?;
    }

    let db_path = cli.db.clone().or_else(|| config.database_path.clone());
    let conn = open_store(db_path.as_deref())?;
    run(cli.command, &conn, &config)
}

fn open_store(path: Option<&Path>) -> Result<Connection> {
    match path {
        Some(path) if path != Path::new(IN_MEMORY_DB) => {
            open_db(path).with_context(|| format!("opening database `{}`", path.display()))
        }
        _ => open_db_in_memory().context("opening in-memory database"),
    }
}

fn run(command: Commands, conn: &Connection, config: &CoreConfig) -> Result<()> {
    match command {
        Commands::Ping => {
            println!("newsdesk_core ping={}", newsdesk_core::ping());
            println!("newsdesk_core version={}", newsdesk_core::core_version());
        }
        Commands::Slugify { title, kind } => {
            let content = SqliteContentRepository::try_new(conn)?;
            let slug = SlugAllocator::new(config.slug).allocate(&content, kind, &title, None)?;
            println!("{slug}");
        }
        Commands::Add(args) => {
            let service = content_service(conn, config)?;
            let mut input = NewContent::new(args.kind, args.title, args.category)
                .with_description(args.description)
                .with_tags(args.tags);
            input.sub_category = args.sub_category;
            input.main_url = args.main_url;
            input.media_url = args.media_url;
            input.posted_by = args.posted_by;
            input.movie_rating = args.movie_rating;
            print_document(&service.create(input)?);
        }
        Commands::Edit(args) => {
            let service = content_service(conn, config)?;
            let current = service
                .get(args.id)?
                .with_context(|| format!("content `{}` not found", args.id))?;
            let mut edit = ContentEdit::from_document(&current);
            if let Some(title) = args.title {
                edit.title = title;
            }
            if let Some(description) = args.description {
                edit.description = description;
            }
            if let Some(category) = args.category {
                edit.category = category;
            }
            if args.sub_category.is_some() {
                edit.sub_category = args.sub_category;
            }
            if !args.tags.is_empty() {
                edit.tags = args.tags;
            }
            if args.movie_rating.is_some() {
                edit.movie_rating = args.movie_rating;
            }
            print_document(&service.edit(args.id, edit)?);
        }
        Commands::Show(args) => {
            let service = content_service(conn, config)?;
            let found = match args.kind {
                Some(kind) => service.get_by_slug(kind, &args.key)?,
                None => {
                    let id = Uuid::parse_str(args.key.trim())
                        .with_context(|| format!("`{}` is not a content id", args.key))?;
                    service.get(id)?
                }
            };
            match found {
                Some(doc) => print_document(&doc),
                None => bail!("content `{}` not found", args.key),
            }
        }
        Commands::List(args) => {
            let service = content_service(conn, config)?;
            let result = service.list(&ContentListQuery {
                kind: args.kind,
                category: args.category,
                sub_category: args.sub_category,
                limit: args.limit,
                offset: args.offset,
            })?;
            for doc in &result.items {
                print_summary_line(&doc.summary());
            }
        }
        Commands::Delete { id } => {
            let outcome = content_service(conn, config)?.delete(id)?;
            println!(
                "deleted {} purged_entries={} lists={}",
                outcome.id,
                outcome.purged_entries,
                outcome
                    .purged_lists
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            );
        }
        Commands::Curate { command } => {
            let service = CurationService::new(SqliteCurationRepository::try_new(conn)?);
            match command {
                CurateCommands::Set { list, entries } => {
                    let stored = service.set_list(list, entries)?;
                    println!("{list} entries={}", stored.len());
                }
                CurateCommands::SetSection { list, ids } => {
                    let stored = service.set_section(list, &ids)?;
                    println!("{list} entries={}", stored.len());
                }
                CurateCommands::Show { list } => {
                    for item in service.get_list(list)? {
                        print!("{}\t", item.position);
                        print_summary_line(&item.content);
                    }
                }
            }
        }
        Commands::Promo { command } => {
            let service = assets_service(conn)?;
            match command {
                PromoCommands::Set {
                    slot,
                    image_url,
                    link,
                } => {
                    let stored = service.set_promo(slot, &image_url, &link)?;
                    println!("{slot}\t{}\t{}", stored.image_url, stored.link);
                }
                PromoCommands::Show { slot } => {
                    let slots = match slot {
                        Some(slot) => vec![slot],
                        None => PromoSlot::ALL.to_vec(),
                    };
                    for slot in slots {
                        let asset = service.get_promo(slot)?;
                        println!("{slot}\t{}\t{}", asset.image_url, asset.link);
                    }
                }
            }
        }
        Commands::Featured { command } => {
            let service = assets_service(conn)?;
            match command {
                FeaturedCommands::Set { id } => {
                    print_summary_line(&service.set_featured_gallery(id)?);
                }
                FeaturedCommands::Clear => service.clear_featured_gallery()?,
                FeaturedCommands::Show => match service.featured_gallery()? {
                    Some(summary) => print_summary_line(&summary),
                    None => println!("no featured gallery"),
                },
            }
        }
        Commands::Board { command } => {
            let service = assets_service(conn)?;
            match command {
                BoardCommands::Add {
                    board,
                    movie,
                    detail,
                    category,
                } => {
                    let entry = service.add_movie_entry(board, &movie, &detail, &category)?;
                    println!("{}", entry.id);
                }
                BoardCommands::List { board } => {
                    for entry in service.movie_entries(board)? {
                        println!(
                            "{}\t{}\t{}\t{}",
                            entry.id, entry.movie, entry.detail, entry.category
                        );
                    }
                }
                BoardCommands::Edit {
                    board,
                    id,
                    movie,
                    detail,
                    category,
                } => {
                    let patch = MovieEntryPatch {
                        movie,
                        detail,
                        category,
                    };
                    let entry = service.edit_movie_entry(board, id, patch)?;
                    println!(
                        "{}\t{}\t{}\t{}",
                        entry.id, entry.movie, entry.detail, entry.category
                    );
                }
                BoardCommands::Delete { board, id } => {
                    service.delete_movie_entry(board, id)?;
                    println!("deleted {id}");
                }
            }
        }
        Commands::Links { command } => {
            let service = assets_service(conn)?;
            let links = match command {
                LinkCommands::Push { url } => service.push_file_link(&url)?,
                LinkCommands::List => service.file_links()?,
            };
            for link in links {
                println!("{link}");
            }
        }
    }
    Ok(())
}

fn assets_service(conn: &Connection) -> Result<AssetsService<SqliteSiteAssetsRepository<'_>>> {
    Ok(AssetsService::new(SqliteSiteAssetsRepository::try_new(conn)?))
}

fn content_service<'conn>(
    conn: &'conn Connection,
    config: &CoreConfig,
) -> Result<ContentService<SqliteContentRepository<'conn>, SqliteCurationRepository<'conn>>> {
    Ok(ContentService::with_policies(
        SqliteContentRepository::try_new(conn)?,
        SqliteCurationRepository::try_new(conn)?,
        config.slug,
        config.content,
    ))
}

fn parse_entry(value: &str) -> Result<CurationEntry, String> {
    let (id, position) = value
        .split_once(':')
        .ok_or_else(|| format!("expected ID:POSITION, got `{value}`"))?;
    let id = Uuid::parse_str(id.trim()).map_err(|err| format!("invalid id `{id}`: {err}"))?;
    let position = position
        .trim()
        .parse::<i64>()
        .map_err(|err| format!("invalid position `{position}`: {err}"))?;
    Ok(CurationEntry::new(id, position))
}

fn print_summary_line(summary: &ContentSummary) {
    println!(
        "{}\t{}\t{}\t{}",
        summary.id, summary.kind, summary.slug, summary.title
    );
}

fn print_document(doc: &ContentDocument) {
    println!("id={}", doc.id);
    println!("kind={}", doc.kind);
    println!("slug={}", doc.slug);
    println!("title={}", doc.title);
    println!("category={}", doc.category);
    if let Some(sub_category) = doc.sub_category.as_deref() {
        println!("sub_category={sub_category}");
    }
    if !doc.tags.is_empty() {
        println!("tags={}", doc.tags.join(","));
    }
    if let Some(rating) = doc.movie_rating {
        println!("movie_rating={rating}");
    }
}
