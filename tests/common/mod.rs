#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use filmgraph::{
    catalog::Catalog,
    config::SyncSettings,
    db,
    error::{AppError, AppResult},
    sync::CatalogSync,
    tmdb::{
        ChangeWindow, ChangesPage, GenreKind, MetadataProvider, MovieResponse, NamedEntry,
        PersonResponse,
    },
};
use serde_json::json;

/// In-memory provider. Ids listed in `failures` error that many times
/// before answering normally.
#[derive(Default)]
pub struct FakeProvider {
    pub latest: i64,
    pub movies: HashMap<i64, MovieResponse>,
    pub persons: HashMap<i64, PersonResponse>,
    pub change_pages: Vec<Vec<i64>>,
    pub movie_genres: Vec<NamedEntry>,
    pub tv_genres: Vec<NamedEntry>,
    pub failures: Mutex<HashMap<i64, usize>>,
    pub movie_calls: Mutex<Vec<i64>>,
    pub person_calls: Mutex<Vec<i64>>,
}

impl FakeProvider {
    pub fn fail(&self, id: i64, times: usize) {
        self.failures.lock().unwrap().insert(id, times);
    }

    pub fn movie_calls(&self) -> Vec<i64> {
        let mut calls = self.movie_calls.lock().unwrap().clone();
        calls.sort_unstable();
        calls
    }

    pub fn person_calls(&self) -> Vec<i64> {
        let mut calls = self.person_calls.lock().unwrap().clone();
        calls.sort_unstable();
        calls
    }

    fn take_failure(&self, id: i64) -> AppResult<()> {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&id) {
            Some(left) if *left > 0 => {
                *left -= 1;
                Err(AppError::Upstream { status: 503, message: "try again".into() })
            },
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    async fn latest_movie_id(&self) -> AppResult<i64> {
        Ok(self.latest)
    }

    async fn movie(&self, id: i64) -> AppResult<Option<MovieResponse>> {
        self.movie_calls.lock().unwrap().push(id);
        self.take_failure(id)?;
        Ok(self.movies.get(&id).cloned())
    }

    async fn person(&self, id: i64) -> AppResult<Option<PersonResponse>> {
        self.person_calls.lock().unwrap().push(id);
        self.take_failure(id)?;
        Ok(self.persons.get(&id).cloned())
    }

    async fn person_changes(&self, _window: ChangeWindow, page: u32) -> AppResult<ChangesPage> {
        let results = self
            .change_pages
            .get(page as usize - 1)
            .map(|ids| ids.iter().map(|id| json!({"id": id, "adult": false})).collect())
            .unwrap_or_default();

        Ok(serde_json::from_value(json!({
            "results": serde_json::Value::Array(results),
            "page": page,
            "total_pages": self.change_pages.len(),
        }))
        .unwrap())
    }

    async fn genres(&self, kind: GenreKind) -> AppResult<Vec<NamedEntry>> {
        Ok(match kind {
            GenreKind::Movie => self.movie_genres.clone(),
            GenreKind::Tv => self.tv_genres.clone(),
        })
    }
}

/// Description of a test movie; turned into a provider payload by
/// [`movie_payload`].
pub struct MovieSpec<'a> {
    pub id: i64,
    pub title: &'a str,
    pub status: &'a str,
    pub popularity: f64,
    pub adult: bool,
    pub genres: &'a [i64],
    pub keywords: &'a [i64],
    pub cast: &'a [i64],
    /// French title, when the movie carries a translation.
    pub translation: Option<&'a str>,
}

impl<'a> MovieSpec<'a> {
    pub fn new(id: i64, title: &'a str) -> Self {
        Self {
            id,
            title,
            status: "Released",
            popularity: 1.0,
            adult: false,
            genres: &[],
            keywords: &[],
            cast: &[],
            translation: None,
        }
    }
}

pub fn movie_payload(spec: &MovieSpec<'_>) -> MovieResponse {
    let genres: Vec<_> =
        spec.genres.iter().map(|id| json!({"id": id, "name": format!("genre {id}")})).collect();
    let keywords: Vec<_> =
        spec.keywords.iter().map(|id| json!({"id": id, "name": format!("keyword {id}")})).collect();
    let cast: Vec<_> = spec
        .cast
        .iter()
        .enumerate()
        .map(|(order, id)| {
            json!({
                "id": id,
                "name": format!("person {id}"),
                "gender": 1,
                "character": format!("role {order}"),
                "order": order,
            })
        })
        .collect();
    let crew: Vec<_> = spec
        .cast
        .first()
        .map(|id| {
            json!({"id": id, "name": format!("person {id}"), "department": "Directing", "job": "Director"})
        })
        .into_iter()
        .collect();
    let translations: Vec<_> = spec
        .translation
        .map(|title| {
            json!({
                "iso_3166_1": "FR", "iso_639_1": "fr", "name": "Français",
                "data": {"title": title, "overview": "", "homepage": ""}
            })
        })
        .into_iter()
        .collect();

    serde_json::from_value(json!({
        "id": spec.id,
        "imdb_id": format!("tt{:07}", spec.id),
        "title": spec.title,
        "original_title": spec.title,
        "original_language": "en",
        "status": spec.status,
        "adult": spec.adult,
        "popularity": spec.popularity,
        "release_date": "2001-01-01",
        "genres": genres,
        "production_companies": [{
            "id": 900, "name": "Studio", "origin_country": "US",
            "parent_company": {"id": 901, "name": "Holding", "origin_country": "US"}
        }],
        "credits": {"cast": cast, "crew": crew},
        "keywords": {"keywords": keywords},
        "translations": {"translations": translations},
    }))
    .unwrap()
}

pub fn person_payload(id: i64) -> PersonResponse {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("person {id}"),
        "adult": false,
        "imdb_id": format!("nm{:07}", id),
        "biography": "Works in film.",
        "birthday": "1970-01-01",
        "gender": 1,
        "popularity": id as f64,
        "also_known_as": [format!("p{id}")],
    }))
    .unwrap()
}

pub fn provider_with(specs: &[MovieSpec<'_>]) -> FakeProvider {
    let movies: HashMap<i64, MovieResponse> =
        specs.iter().map(|s| (s.id, movie_payload(s))).collect();
    FakeProvider {
        latest: specs.iter().map(|s| s.id).max().unwrap_or(0),
        movies,
        ..Default::default()
    }
}

pub async fn setup(provider: FakeProvider, window_size: usize) -> (Catalog, CatalogSync, Arc<FakeProvider>) {
    let db = db::connect_in_memory().await.unwrap();
    let catalog = Catalog::new(db);
    let provider = Arc::new(provider);
    let settings = SyncSettings { window_size, ..Default::default() };
    let sync = CatalogSync::new(catalog.clone(), provider.clone(), settings);
    (catalog, sync, provider)
}
