use crate::error::{ErrorKind, Result};
use apod_cache::{Database, Repository};
use apod_config::Config;
use apod_fetch::ApodClient;
use apod_library::{Added, CacheManager, FetchedApod};
use apod_storage::backend::LocalStore;
use clap::{Parser, Subcommand};
use exn::{OptionExt, ResultExt};
use std::path::Path;
use std::sync::Arc;
use time::format_description::BorrowedFormatItem;
use time::macros::{date, format_description};
use time::{Date, OffsetDateTime};
use tracing::info;

/// The first Astronomy Picture of the Day ever published.
const FIRST_APOD: Date = date!(1995 - 06 - 16);
const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

#[derive(Parser)]
#[command(name = "apod", version, about = "Fetch NASA's Astronomy Picture of the Day into a local cache")]
pub struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download a day's picture into the cache
    Fetch {
        /// Date of the feature (YYYY-MM-DD); today if omitted
        #[arg(value_parser = parse_apod_date)]
        date: Option<Date>,
    },
    /// Show the stored metadata of a cached image
    Info { id: i64 },
    /// List the titles of every cached image
    Titles,
    /// Print the absolute path of a cached image file
    Path { id: i64 },
    /// Look a date up in the public APOD archive listing
    Archive {
        /// Date to look up (YYYY-MM-DD)
        #[arg(value_parser = parse_apod_date)]
        date: Date,
    },
}

fn parse_apod_date(raw: &str) -> std::result::Result<Date, String> {
    let date = Date::parse(raw, DATE_FORMAT).map_err(|_| format!("`{raw}` is not a date in YYYY-MM-DD format"))?;
    if date < FIRST_APOD {
        return Err(format!("the first picture was published on {FIRST_APOD}"));
    }
    if date > today() {
        return Err(format!("{date} is in the future"));
    }
    Ok(date)
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .or_raise(|| ErrorKind::Config)?;
    // Relative cache_dir is resolved against the working directory once,
    // here, so the store only ever sees an absolute root.
    let root = std::path::absolute(&config.cache_dir).or_raise(|| ErrorKind::Cache)?;
    let store = Arc::new(LocalStore::new("images", &root).or_raise(|| ErrorKind::Cache)?);
    let database = Database::connect(root.join(&config.database_file)).await.or_raise(|| ErrorKind::Cache)?;
    let manager = CacheManager::new(store.clone(), Repository::from(&database));

    match cli.command {
        Command::Fetch { date } => fetch(&config, &manager, date.unwrap_or_else(today)).await?,
        Command::Info { id } => show_info(&manager, id).await?,
        Command::Titles => list_titles(&manager).await?,
        Command::Path { id } => show_path(&manager, &store, id).await?,
        Command::Archive { date } => search_archive(&config, date).await?,
    }

    database.close().await;
    Ok(())
}

async fn fetch(config: &Config, manager: &CacheManager, date: Date) -> Result<()> {
    let timeout = std::time::Duration::from_secs(config.api.timeout_seconds);
    let client = ApodClient::new(&config.api.base_url, &config.api.key, timeout).or_raise(|| ErrorKind::Fetch)?;
    info!(%date, "requesting feature metadata");
    let feature = client.get(date).await.or_raise(|| ErrorKind::Fetch)?;
    println!("{}: {}", feature.date, feature.title);

    let url = feature.image_url().or_raise(|| ErrorKind::Fetch)?;
    let bytes = client.download(url).await.or_raise(|| ErrorKind::Fetch)?;
    let fetched = FetchedApod {
        date,
        url: url.to_string(),
        bytes,
        title: feature.title.clone(),
        explanation: feature.explanation.clone(),
    };

    match manager.add_to_cache(&fetched).await.or_raise(|| ErrorKind::Cache)? {
        Added::Inserted(id) => println!("cached as #{id}"),
        Added::Existing(id) => println!("already in the cache as #{id}"),
    }
    Ok(())
}

async fn search_archive(config: &Config, date: Date) -> Result<()> {
    let timeout = std::time::Duration::from_secs(config.api.timeout_seconds);
    let client = ApodClient::new(&config.api.base_url, &config.api.key, timeout).or_raise(|| ErrorKind::Fetch)?;
    match client.find_archive_page(date).await.or_raise(|| ErrorKind::Fetch)? {
        Some(url) => println!("{url}"),
        None => println!("no archive entry for {date}"),
    }
    Ok(())
}

async fn show_info(manager: &CacheManager, id: i64) -> Result<()> {
    let record = manager
        .get(id)
        .await
        .or_raise(|| ErrorKind::Cache)?
        .ok_or_raise(|| ErrorKind::UnknownId(id))?;
    println!("title: {}", record.title);
    println!("file:  {}", record.file_path);
    println!("hash:  {}", record.content_hash);
    println!();
    println!("{}", record.explanation);
    Ok(())
}

async fn list_titles(manager: &CacheManager) -> Result<()> {
    let titles = manager.titles().await.or_raise(|| ErrorKind::Cache)?;
    for title in titles {
        println!("{title}");
    }
    Ok(())
}

async fn show_path(manager: &CacheManager, store: &LocalStore, id: i64) -> Result<()> {
    let record = manager
        .get(id)
        .await
        .or_raise(|| ErrorKind::Cache)?
        .ok_or_raise(|| ErrorKind::UnknownId(id))?;
    let absolute = store.absolute(Path::new(&record.file_path)).or_raise(|| ErrorKind::Cache)?;
    println!("{}", absolute.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_apod_date() {
        assert_eq!(parse_apod_date("1995-06-16").unwrap(), FIRST_APOD);
        assert_eq!(parse_apod_date("2022-05-22").unwrap(), date!(2022 - 05 - 22));
    }

    #[test]
    fn test_parse_apod_date_rejects_garbage() {
        assert!(parse_apod_date("not-a-date").is_err());
        assert!(parse_apod_date("2022-13-40").is_err());
        assert!(parse_apod_date("22-05-22").is_err());
    }

    #[test]
    fn test_parse_apod_date_rejects_out_of_range() {
        // The day before the very first feature
        assert!(parse_apod_date("1995-06-15").is_err());
        assert!(parse_apod_date("9999-01-01").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        assert!(Cli::try_parse_from(["apod", "fetch"]).is_ok());
        assert!(Cli::try_parse_from(["apod", "fetch", "2022-05-22"]).is_ok());
        assert!(Cli::try_parse_from(["apod", "info", "3"]).is_ok());
        assert!(Cli::try_parse_from(["apod", "titles"]).is_ok());
        assert!(Cli::try_parse_from(["apod", "path", "3"]).is_ok());
        assert!(Cli::try_parse_from(["apod", "archive", "2022-05-22"]).is_ok());
        // archive requires a date
        assert!(Cli::try_parse_from(["apod", "archive"]).is_err());
        assert!(Cli::try_parse_from(["apod", "titles", "--config", "alt.toml"]).is_ok());
        assert!(Cli::try_parse_from(["apod", "nonsense"]).is_err());
    }
}
