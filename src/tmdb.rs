use std::{num::NonZeroU32, sync::Arc};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use jiff::civil::Date;
use reqwest::StatusCode;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Provider error code for "The resource you requested could not be found."
const RESOURCE_NOT_FOUND: i32 = 34;

const MOVIE_APPENDS: &str = "alternative_titles,credits,keywords,translations";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenreKind {
    Movie,
    Tv,
}

impl GenreKind {
    fn path(self) -> &'static str {
        match self {
            GenreKind::Movie => "genre/movie/list",
            GenreKind::Tv => "genre/tv/list",
        }
    }
}

/// Date bounds for the person change feed. Unset bounds fall back to the
/// provider's default of the last 24 hours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeWindow {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

/// Everything the sync pipeline needs from the remote metadata provider.
///
/// Lookups of a single record return `Ok(None)` when the provider confirms the
/// record does not exist; every other failure is an error.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn latest_movie_id(&self) -> AppResult<i64>;

    async fn movie(&self, id: i64) -> AppResult<Option<MovieResponse>>;

    async fn person(&self, id: i64) -> AppResult<Option<PersonResponse>>;

    async fn person_changes(&self, window: ChangeWindow, page: u32) -> AppResult<ChangesPage>;

    async fn genres(&self, kind: GenreKind) -> AppResult<Vec<NamedEntry>>;
}

pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    language: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        base_url: String,
        language: String,
        rps: u32,
    ) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("no TMDB_API_KEY provided, provider requests will be rejected");
        }

        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN),
        )));
        Self { client, api_key, base_url, language, limiter }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<Option<T>> {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let resp = self
            .client
            .get(url)
            .query(&[("api_key", &self.api_key), ("language", &self.language)])
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(Some(resp.json().await?));
        }

        let envelope: ErrorEnvelope = resp.json().await.unwrap_or_default();
        if is_missing(status, &envelope) {
            debug!(path = %path, "provider has no such record");
            return Ok(None);
        }

        Err(AppError::Upstream {
            status: status.as_u16(),
            message: envelope.status_message.unwrap_or_else(|| status.to_string()),
        })
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn latest_movie_id(&self) -> AppResult<i64> {
        let latest: Option<LatestEntry> = self.get("movie/latest", &[]).await?;
        latest.map(|l| l.id).ok_or_else(|| AppError::Upstream {
            status: StatusCode::NOT_FOUND.as_u16(),
            message: "latest movie is unavailable".to_string(),
        })
    }

    async fn movie(&self, id: i64) -> AppResult<Option<MovieResponse>> {
        self.get(&format!("movie/{id}"), &[("append_to_response", MOVIE_APPENDS.to_string())])
            .await
    }

    async fn person(&self, id: i64) -> AppResult<Option<PersonResponse>> {
        self.get(&format!("person/{id}"), &[("append_to_response", "translations".to_string())])
            .await
    }

    async fn person_changes(&self, window: ChangeWindow, page: u32) -> AppResult<ChangesPage> {
        let mut query = vec![("page", page.to_string())];
        if let Some(start) = window.start_date {
            query.push(("start_date", start.to_string()));
        }
        if let Some(end) = window.end_date {
            query.push(("end_date", end.to_string()));
        }

        let page: Option<ChangesPage> = self.get("person/changes", &query).await?;
        Ok(page.unwrap_or_default())
    }

    async fn genres(&self, kind: GenreKind) -> AppResult<Vec<NamedEntry>> {
        let resp: Option<GenresResponse> = self.get(kind.path(), &[]).await?;
        Ok(resp.map(|r| r.genres).unwrap_or_default())
    }
}

fn is_missing(status: StatusCode, envelope: &ErrorEnvelope) -> bool {
    status == StatusCode::NOT_FOUND && envelope.status_code == Some(RESOURCE_NOT_FOUND)
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    status_code: Option<i32>,
    status_message: Option<String>,
    #[allow(dead_code)]
    success: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct LatestEntry {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct GenresResponse {
    #[serde(default)]
    genres: Vec<NamedEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NamedEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CompanyEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub logo_path: Option<String>,
    pub origin_country: Option<String>,
    pub parent_company: Option<Box<CompanyEntry>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CountryEntry {
    pub iso_3166_1: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LanguageEntry {
    pub iso_639_1: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AlternativeTitles {
    #[serde(default)]
    pub titles: Vec<AlternativeTitleEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AlternativeTitleEntry {
    #[serde(default)]
    pub iso_3166_1: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastEntry>,
    #[serde(default)]
    pub crew: Vec<CrewEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CastEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: i32,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub order: i32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CrewEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: i32,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub job: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Keywords {
    #[serde(default)]
    pub keywords: Vec<NamedEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Translations<D> {
    #[serde(default = "Vec::new")]
    pub translations: Vec<TranslationEntry<D>>,
}

impl<D> Default for Translations<D> {
    fn default() -> Self {
        Self { translations: Vec::new() }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TranslationEntry<D> {
    #[serde(default)]
    pub iso_3166_1: String,
    #[serde(default)]
    pub iso_639_1: String,
    #[serde(default)]
    pub name: String,
    pub data: Option<D>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieTranslationData {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub homepage: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PersonTranslationData {
    pub biography: Option<String>,
}

/// `GET /movie/{id}` with every sub-resource the catalog stores appended.
#[derive(Clone, Debug, Deserialize)]
pub struct MovieResponse {
    pub id: i64,
    #[serde(default)]
    pub adult: bool,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub genres: Vec<NamedEntry>,
    pub homepage: Option<String>,
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_title: String,
    pub overview: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    pub poster_path: Option<String>,
    #[serde(default)]
    pub production_companies: Vec<CompanyEntry>,
    #[serde(default)]
    pub production_countries: Vec<CountryEntry>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub revenue: i64,
    pub runtime: Option<i32>,
    #[serde(default)]
    pub spoken_languages: Vec<LanguageEntry>,
    #[serde(default)]
    pub status: String,
    pub tagline: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i32,
    #[serde(default)]
    pub alternative_titles: AlternativeTitles,
    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub keywords: Keywords,
    #[serde(default)]
    pub translations: Translations<MovieTranslationData>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PersonResponse {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub also_known_as: Vec<String>,
    #[serde(default)]
    pub adult: bool,
    pub biography: Option<String>,
    pub birthday: Option<String>,
    pub deathday: Option<String>,
    #[serde(default)]
    pub gender: i32,
    pub homepage: Option<String>,
    pub imdb_id: Option<String>,
    pub known_for_department: Option<String>,
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub translations: Translations<PersonTranslationData>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChangesPage {
    #[serde(default)]
    pub results: Vec<ChangeEntry>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChangeEntry {
    pub id: i64,
    pub adult: Option<bool>,
}
