use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use filmgraph::{
    catalog::Catalog,
    config::Config,
    db,
    queries::MovieLookup,
    recommend::Recommender,
    sync::CatalogSync,
    tmdb::{MetadataProvider, TmdbClient},
};

/// Mirrors the TMDB catalog into a local database and recommends movies
/// from user ratings.
#[derive(Parser)]
#[command(name = "filmgraph", about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the movie and tv genre lists
    Genres,

    /// Mirror every movie newer than the highest one stored
    Movies,

    /// Load full detail for persons
    Persons {
        /// Use every person only known from movie credits
        #[arg(long, conflicts_with = "ids")]
        unloaded: bool,

        /// Provider person ids; the change feed is used when empty
        ids: Vec<i64>,
    },

    /// Recommend movies for a user
    Recommend {
        #[arg(long)]
        user: String,

        #[arg(long, default_value = "20")]
        limit: u64,
    },

    /// Search stored movies by title
    Search { text: String },

    /// Show a stored movie by provider id or IMDb id
    Show { id: MovieLookup },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,filmgraph=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let db = db::connect_and_migrate(config.database_url.as_str()).await?;
    let catalog = Catalog::new(db.clone());

    match cli.command {
        Commands::Genres => {
            let count = sync(&config, catalog)?.sync_genres().await?;
            println!("{count} genres stored");
        },
        Commands::Movies => {
            let report = sync(&config, catalog)?.sync_movie_catalog().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        },
        Commands::Persons { unloaded, ids } => {
            let sync = sync(&config, catalog)?;
            let report = if unloaded {
                sync.sync_unloaded_persons().await?
            } else {
                sync.sync_person_batch((!ids.is_empty()).then_some(ids)).await?
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        },
        Commands::Recommend { user, limit } => {
            let recommender = Recommender::new(db, config.recommend_match);
            let recommendations = recommender.recommend(&user, limit).await?;
            println!("{}", serde_json::to_string_pretty(&recommendations)?);
        },
        Commands::Search { text } => {
            let movies = catalog.search_movies(&text).await?;
            println!("{}", serde_json::to_string_pretty(&movies)?);
        },
        Commands::Show { id } => {
            let movie = catalog.find_movie(&id).await?.context("movie not stored")?;
            println!("{}", serde_json::to_string_pretty(&movie)?);
        },
    }

    Ok(())
}

fn sync(config: &Config, catalog: Catalog) -> anyhow::Result<CatalogSync> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("filmgraph/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.tmdb_timeout_secs))
        .build()?;

    let tmdb: Arc<dyn MetadataProvider> = Arc::new(TmdbClient::new(
        http,
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_language.clone(),
        config.tmdb_rps,
    ));

    Ok(CatalogSync::new(catalog, tmdb, config.sync.clone()))
}
