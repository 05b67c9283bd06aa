//! lifelist - species near a place versus a user's life list
//!
//! Settings live in two places at once: the share URL's query string and the
//! `settings` table of `<root>/lifelist.db`. Pass a previously printed share
//! URL with `--url` to restore its settings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use lifelist::models::SpeciesViewRecord;
use lifelist::{INatClient, LifeListSession, ObservationApi, SortKey};
use lifelist_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use lifelist_common::settings::{ConfigMirror, QueryStringMirror, StorageMirror};
use lifelist_common::ConfigStore;

/// Command-line arguments for lifelist
#[derive(Parser, Debug)]
#[command(name = "lifelist")]
#[command(about = "Compare the most observed species near a place with your iNaturalist life list")]
#[command(version)]
struct Args {
    /// Folder holding lifelist.db
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Share URL whose query string seeds the settings
    #[arg(long, env = "LIFELIST_URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the species list
    Show {
        #[arg(long, value_enum, default_value_t = SortKey::ObservationCount)]
        sort: SortKey,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Search places by name
    Places { query: String },
    /// Search users by login or name
    Users { query: String },
    /// Look up a taxon by id
    Taxon { id: u64 },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print every setting
    Show,
    /// Set a setting; values are JSON, bare strings are accepted
    Set { key: String, value: String },
    /// Restore a setting to its default
    Unset { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load_or_default();

    // Logs go to stderr; stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml_config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting lifelist v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let resolver = RootFolderResolver::new(args.root_folder.clone(), toml_config.clone());
    let initializer = RootFolderInitializer::new(resolver.resolve());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let pool = lifelist_common::db::init_database(&db_path).await?;

    let share_url = args
        .url
        .as_deref()
        .unwrap_or_else(|| toml_config.share_base_url());
    let url_mirror = Arc::new(QueryStringMirror::parse(share_url)?);
    let storage_mirror: Arc<dyn ConfigMirror> = Arc::new(StorageMirror::new(pool));

    let store = Arc::new(ConfigStore::load(url_mirror.clone(), storage_mirror).await?);

    let api: Arc<dyn ObservationApi> = Arc::new(
        INatClient::new(toml_config.api_base_url()).context("Failed to create iNaturalist client")?,
    );
    let session = LifeListSession::new(store.clone(), api.clone());

    match args.command {
        Command::Show { sort, json } => show(&session, sort, json).await?,
        Command::Config { action } => match action {
            ConfigAction::Show => print_settings(&store, &url_mirror),
            ConfigAction::Set { key, value } => {
                store.set_raw(&key, &value).await?;
                println!("{}", url_mirror.url());
            }
            ConfigAction::Unset { key } => {
                store.reset(&key).await?;
                println!("{}", url_mirror.url());
            }
        },
        Command::Places { query } => {
            for place in session.place_resolver().search(&query).await? {
                let location = place
                    .location
                    .map(|c| format!("{},{}", c.latitude, c.longitude))
                    .unwrap_or_else(|| "-".to_string());
                println!("{:>10}  {}  ({})", place.id, place.display_name, location);
            }
        }
        Command::Users { query } => {
            for user in session.user_resolver().search(&query).await? {
                println!("{:>10}  {}", user.id, user.label());
            }
        }
        Command::Taxon { id } => match api.taxon(id).await? {
            Some(taxon) => match taxon.preferred_common_name {
                Some(common) => println!("{}  {} ({})", taxon.id, common, taxon.name),
                None => println!("{}  {}", taxon.id, taxon.name),
            },
            None => println!("No taxon with id {}", id),
        },
    }

    Ok(())
}

async fn show(session: &LifeListSession, sort: SortKey, json: bool) -> Result<()> {
    let missing = session.missing_configuration();
    if !missing.is_empty() {
        println!(
            "Finish configuring before the list can be shown; missing: {}",
            missing.join(", ")
        );
        println!("Use `lifelist config set <key> <value>` (see `lifelist places` and `lifelist users`).");
    }

    session.refresh().await;

    for (source, error) in session.errors() {
        eprintln!("Could not load {}: {}", source, error);
    }

    if let Some(Some(place)) = session.place().data {
        if place.location.is_none() {
            eprintln!("Place {} has no usable location", place.display_name);
        }
    }

    let records = session.species_view(Some(sort)).data.unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if let Some(Some(place)) = session.place().data {
        let user = session
            .user()
            .data
            .flatten()
            .map(|u| u.label())
            .unwrap_or_else(|| "-".to_string());
        let seen = records.iter().filter(|r| r.seen).count();
        println!(
            "{} | user {} | seen {} of {}",
            place.display_name,
            user,
            seen,
            records.len()
        );
    }

    for record in &records {
        println!("{}", format_record(record));
    }

    Ok(())
}

fn format_record(record: &SpeciesViewRecord) -> String {
    let species = &record.species;
    let mark = if record.seen { "[x]" } else { "[ ]" };
    let iconic = species.iconic_taxon_name.as_deref().unwrap_or("-");
    let name = match species.common_name.as_deref().filter(|n| !n.is_empty()) {
        Some(common) => format!("{} ({})", common, species.scientific_name),
        None => species.scientific_name.clone(),
    };
    format!(
        "{} {:>7}  {:<12} {}  {}",
        mark, species.observation_count, iconic, name, record.external_link
    )
}

fn print_settings(store: &ConfigStore, url_mirror: &QueryStringMirror) {
    for meta in ConfigStore::metadata() {
        let value = store.encoded(meta.key).unwrap_or_else(|| "(unset)".to_string());
        let default = (meta.default_value)().unwrap_or_else(|| "(unset)".to_string());
        println!(
            "{:<10} = {:<12} default {:<8} {}",
            meta.key, value, default, meta.description
        );
    }
    println!("share url: {}", url_mirror.url());
}
