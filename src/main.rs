mod cli;
mod error;
mod logging;

use crate::cli::{Cli, Command, DuplicatesArgs, MetaCommand, SettingsCommand, SpreadArgs, TapZoneArgs};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::pin::pin;
use std::process::ExitCode;
use std::sync::Arc;
use yomu_config::{Config, LogConfig};
use yomu_duplicates::{DuplicateEvent, DuplicateFinder, Manga};
use yomu_meta::{Database, Location, MetaStore, SqliteStore, StoreHandle, app_key, value};
use yomu_queue::{Queue, default_concurrency};
use yomu_settings::spread::{PageSize, spreads};
use yomu_settings::tapzone::TapZones;
use yomu_settings::{ReadingDirection, SettingsService, TapZoneInvert};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init(&LogConfig::default(), cli.verbose);
            tracing::error!(error = ?e, "could not load configuration");
            return ExitCode::FAILURE;
        },
    };
    logging::init(&config.log, cli.verbose);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "command failed");
            ExitCode::FAILURE
        },
    }
}

/// File and environment configuration with the command-line overrides on top.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(path) = &cli.database {
        config.database.path = Some(path.clone());
    }
    if let Some(url) = &cli.server {
        config.server.url = Some(url.clone());
    }
    config.validate().or_raise(|| ErrorKind::Config)?;
    Ok(config)
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Command::Meta(command) => run_meta(command, &config, cli.dry_run).await,
        Command::Settings(command) => run_settings(command, &config, cli.dry_run).await,
        Command::TapZone(args) => tap_zone(args),
        Command::Spreads(args) => print_json(&spread_pages(args)),
        Command::Duplicates(args) => duplicates(args, &config).await,
    }
}

/// The configured metadata backend.
enum Backend {
    Local(SqliteStore),
    #[cfg_attr(not(feature = "graphql"), allow(dead_code))]
    Remote(StoreHandle),
}

impl Backend {
    async fn open(config: &Config, dry_run: bool) -> Result<Self> {
        if let Some(url) = &config.server.url {
            if dry_run {
                exn::bail!(ErrorKind::Input("--dry-run only applies to the local database".to_string()));
            }
            return Self::remote(url);
        }
        let path = config.database_path().or_raise(|| ErrorKind::Config)?;
        let location = Self::location(path, dry_run).await?;
        tracing::debug!(?location, dry_run, "opening metadata database");
        let db = Database::open(location).await.or_raise(|| ErrorKind::Store)?;
        Ok(Self::Local(SqliteStore::new(db.pool().clone(), dry_run)))
    }

    /// Dry runs leave the filesystem untouched: an existing database is opened
    /// read-only, a missing one is stood in for by an empty in-memory one.
    async fn location(path: PathBuf, dry_run: bool) -> Result<Location> {
        if dry_run {
            let exists = tokio::fs::try_exists(&path).await.or_raise(|| ErrorKind::Store)?;
            return Ok(if exists { Location::ReadOnly(path) } else { Location::Memory });
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Store)?;
        }
        Ok(Location::File(path))
    }

    #[cfg(feature = "graphql")]
    fn remote(url: &str) -> Result<Self> {
        tracing::debug!(%url, "using reader server");
        let store = yomu_meta::GraphqlStore::new(url).or_raise(|| ErrorKind::Store)?;
        Ok(Self::Remote(Arc::new(store)))
    }

    #[cfg(not(feature = "graphql"))]
    fn remote(url: &str) -> Result<Self> {
        exn::bail!(ErrorKind::Input(format!("cannot use server {url}: built without the `graphql` feature")))
    }

    fn handle(&self) -> StoreHandle {
        match self {
            Self::Local(store) => Arc::new(store.clone()),
            Self::Remote(store) => Arc::clone(store),
        }
    }
}

async fn run_meta(command: MetaCommand, config: &Config, dry_run: bool) -> Result<()> {
    let backend = Backend::open(config, dry_run).await?;
    let store = backend.handle();
    let stored_key = |key: String, raw: bool| if raw { key } else { app_key(key) };
    let bag = match command {
        MetaCommand::Get { holder } => store.metas(&holder).await,
        MetaCommand::Set { holder, key, value, raw } => store.set(&holder, &stored_key(key, raw), &value).await,
        MetaCommand::Delete { holder, key, raw } => store.delete(&holder, &stored_key(key, raw)).await,
        MetaCommand::Holders => {
            let Backend::Local(sqlite) = &backend else {
                exn::bail!(ErrorKind::Input("listing holders needs the local database".to_string()));
            };
            let holders = sqlite.holders().await.or_raise(|| ErrorKind::Store)?;
            let names: Vec<String> = holders.iter().map(ToString::to_string).collect();
            return print_json(&names);
        },
    };
    print_json(&bag.or_raise(|| ErrorKind::Store)?)
}

async fn run_settings(command: SettingsCommand, config: &Config, dry_run: bool) -> Result<()> {
    let service = SettingsService::new(Backend::open(config, dry_run).await?.handle());
    match command {
        SettingsCommand::Reader { manga, genres } => {
            let resolved = service.load_reader(manga, &genres).await.or_raise(|| ErrorKind::Settings)?;
            tracing::info!(manga, mode = %resolved.value.reading_mode, "resolved reader settings");
            print_json(&resolved.to_json())
        },
        SettingsCommand::Show { domain, holder } => {
            print_json(&service.load_json(domain, &holder).await.or_raise(|| ErrorKind::Settings)?)
        },
        SettingsCommand::Set { holder, key, value } => {
            let bag = service.set(&holder, &key, &value::decode(&value)).await.or_raise(|| ErrorKind::Settings)?;
            print_json(&bag)
        },
        SettingsCommand::Reset { holder, key } => {
            print_json(&service.reset(&holder, &key).await.or_raise(|| ErrorKind::Settings)?)
        },
        SettingsCommand::Profile { mode, key, value } => {
            let bag = service.save_profile(mode, &key, &value::decode(&value)).await.or_raise(|| ErrorKind::Settings)?;
            print_json(&bag)
        },
    }
}

fn direction(rtl: bool) -> ReadingDirection {
    if rtl { ReadingDirection::Rtl } else { ReadingDirection::Ltr }
}

fn tap_zone(args: TapZoneArgs) -> Result<()> {
    let invert = TapZoneInvert { horizontal: args.invert_h, vertical: args.invert_v };
    let zones = TapZones::new(args.layout, invert, direction(args.rtl));
    let Some(action) = zones.action_at(args.x, args.y, args.width, args.height) else {
        exn::bail!(ErrorKind::Input(format!(
            "({}, {}) is outside the {}x{} viewport",
            args.x, args.y, args.width, args.height
        )));
    };

    #[derive(Serialize)]
    struct Output<T, R> {
        action: T,
        regions: R,
    }
    print_json(&Output { action, regions: zones.regions() })
}

fn spread_pages(args: SpreadArgs) -> Vec<yomu_settings::spread::Spread> {
    let pages: Vec<PageSize> = args.pages.into_iter().map(|(width, height)| PageSize::new(width, height)).collect();
    spreads(&pages, args.offset, direction(args.rtl))
}

async fn duplicates(args: DuplicatesArgs, config: &Config) -> Result<()> {
    let raw = tokio::fs::read(&args.library)
        .await
        .or_raise(|| ErrorKind::Input(format!("cannot read {}", args.library.display())))?;
    let mangas: Vec<Manga> = serde_json::from_slice(&raw)
        .or_raise(|| ErrorKind::Input(format!("{} is not a JSON array of manga", args.library.display())))?;

    let queue = Queue::new(config.queue.concurrency.unwrap_or_else(default_concurrency));
    let finder = DuplicateFinder::new(queue).with_chunk_size(args.chunk_size.unwrap_or(config.duplicates.chunk_size));
    let check_alternative_titles = args.alternative_titles || config.duplicates.check_alternative_titles;

    let entries = mangas.len();
    let mut events = pin!(finder.find_stream(mangas, check_alternative_titles));
    while let Some(event) = events.next().await {
        match event.or_raise(|| ErrorKind::Duplicates)? {
            DuplicateEvent::Started => tracing::info!(entries, check_alternative_titles, "checking for duplicates"),
            DuplicateEvent::Dispatched(chunks) => {
                tracing::info!(chunks, chunk_size = finder.chunk_size(), "dispatched workers")
            },
            DuplicateEvent::ChunkChecked { index, groups } => tracing::debug!(chunk = index, groups, "chunk done"),
            DuplicateEvent::Complete(groups) => {
                tracing::info!(groups = groups.len(), "duplicate check complete");
                return print_json(&groups);
            },
        }
    }
    Ok(())
}

/// Pretty JSON on stdout, newline-terminated.
fn print_json(value: &impl Serialize) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).or_raise(|| ErrorKind::Output)?;
    writeln!(out).or_raise(|| ErrorKind::Output)
}
