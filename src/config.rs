use anyhow::Context;

use crate::recommend::MatchPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_language: String,
    pub tmdb_rps: u32,
    pub tmdb_timeout_secs: u64,
    pub sync: SyncSettings,
    pub recommend_match: MatchPolicy,
}

/// Knobs for the batch driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncSettings {
    pub window_size: usize,
    pub person_start_offset: usize,
    pub person_changes_days: Option<i64>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { window_size: 4, person_start_offset: 0, person_changes_days: None }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://filmgraph.db?mode=rwc".to_string());

        let tmdb_api_key = std::env::var("TMDB_API_KEY").unwrap_or_else(|_| "".to_string());
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());
        let tmdb_language =
            std::env::var("TMDB_LANGUAGE").unwrap_or_else(|_| "en-US".to_string());

        let tmdb_rps: u32 =
            std::env::var("TMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(40);

        let tmdb_timeout_secs: u64 =
            std::env::var("TMDB_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(15);

        let window_size: usize = std::env::var("SYNC_WINDOW_SIZE")
            .unwrap_or_else(|_| "4".to_string())
            .parse()
            .context("SYNC_WINDOW_SIZE")?;
        if window_size == 0 {
            anyhow::bail!("SYNC_WINDOW_SIZE must be at least 1");
        }

        let person_start_offset: usize = std::env::var("PERSON_START_OFFSET")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .context("PERSON_START_OFFSET")?;

        let person_changes_days: Option<i64> = match std::env::var("PERSON_CHANGES_DAYS") {
            Ok(s) => Some(s.parse().context("PERSON_CHANGES_DAYS")?),
            Err(_) => None,
        };

        let recommend_match = match std::env::var("RECOMMEND_MATCH") {
            Ok(s) => s.parse().map_err(anyhow::Error::msg).context("RECOMMEND_MATCH")?,
            Err(_) => MatchPolicy::default(),
        };

        Ok(Self {
            database_url,
            tmdb_api_key,
            tmdb_base_url,
            tmdb_language,
            tmdb_rps,
            tmdb_timeout_secs,
            sync: SyncSettings { window_size, person_start_offset, person_changes_days },
            recommend_match,
        })
    }
}
