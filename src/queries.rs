//! Read-side lookups over the mirrored catalog.

use std::{collections::BTreeSet, str::FromStr};

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, LikeExpr},
};

use crate::{
    catalog::Catalog,
    entities::{credit, keyword, movie, movie_keyword, person, tag},
    error::{AppError, AppResult},
    models::{MovieCredit, MovieDetails, MovieSummary, PersonSummary},
};

const MAX_PAGE: u64 = 250;
const SEARCH_LIMIT: u64 = 100;
const LIKE_ESCAPE: char = '!';

/// Ways a caller may name a movie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MovieLookup {
    Id(i32),
    Remote(i64),
    Imdb(String),
}

impl FromStr for MovieLookup {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("tt") {
            return Ok(MovieLookup::Imdb(s.to_string()));
        }
        s.parse::<i64>()
            .map(MovieLookup::Remote)
            .map_err(|_| AppError::Validation(format!("invalid movie id {s:?}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersonLookup {
    Remote(i64),
    Imdb(String),
}

impl FromStr for PersonLookup {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("nm") {
            return Ok(PersonLookup::Imdb(s.to_string()));
        }
        s.parse::<i64>()
            .map(PersonLookup::Remote)
            .map_err(|_| AppError::Validation(format!("invalid person id {s:?}")))
    }
}

impl Catalog {
    pub async fn find_movie(&self, lookup: &MovieLookup) -> AppResult<Option<MovieDetails>> {
        let query = match lookup {
            MovieLookup::Id(id) => movie::Entity::find_by_id(*id),
            MovieLookup::Remote(remote_id) => {
                movie::Entity::find().filter(movie::Column::RemoteId.eq(*remote_id))
            },
            MovieLookup::Imdb(imdb_id) => {
                movie::Entity::find().filter(movie::Column::ImdbId.eq(imdb_id.as_str()))
            },
        };

        let Some(movie) = query.one(self.db()).await? else {
            return Ok(None);
        };

        let tags = movie.find_related(tag::Entity).all(self.db()).await?;
        let keywords = movie.find_related(keyword::Entity).all(self.db()).await?;

        Ok(Some(MovieDetails {
            movie,
            tags: tags.into_iter().map(|t| t.name).collect(),
            keywords: keywords.into_iter().map(|k| k.name).collect(),
        }))
    }

    pub async fn movie_credits(&self, movie_id: i32) -> AppResult<Vec<MovieCredit>> {
        let rows = credit::Entity::find()
            .filter(credit::Column::MovieId.eq(movie_id))
            .order_by_asc(credit::Column::Id)
            .find_also_related(person::Entity)
            .all(self.db())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(c, p)| {
                let p = p?;
                Some(MovieCredit {
                    person_id: p.id,
                    person_remote_id: p.remote_id,
                    imdb_id: p.imdb_id,
                    name: p.name,
                    profile_path: p.profile_path,
                    credit_type: c.credit_type,
                    department: c.department,
                    job: c.job,
                    character: c.character,
                    cast_order: c.cast_order,
                })
            })
            .collect())
    }

    /// Movies sharing at least one keyword with `movie_id`, most popular first.
    pub async fn related_movies(&self, movie_id: i32, limit: u64) -> AppResult<Vec<MovieSummary>> {
        let keyword_ids: Vec<i32> = movie_keyword::Entity::find()
            .select_only()
            .column(movie_keyword::Column::KeywordId)
            .filter(movie_keyword::Column::MovieId.eq(movie_id))
            .into_tuple()
            .all(self.db())
            .await?;

        if keyword_ids.is_empty() {
            return Ok(Vec::new());
        }

        let related: BTreeSet<i32> = movie_keyword::Entity::find()
            .select_only()
            .column(movie_keyword::Column::MovieId)
            .filter(movie_keyword::Column::KeywordId.is_in(keyword_ids))
            .filter(movie_keyword::Column::MovieId.ne(movie_id))
            .into_tuple::<i32>()
            .all(self.db())
            .await?
            .into_iter()
            .collect();

        if related.is_empty() {
            return Ok(Vec::new());
        }

        let movies = movie::Entity::find()
            .filter(movie::Column::Id.is_in(related))
            .order_by_desc(movie::Column::Popularity)
            .limit(limit)
            .all(self.db())
            .await?;

        Ok(movies.into_iter().map(summary).collect())
    }

    /// Case-insensitive substring match on the title, the original title or
    /// any translated title. Adult titles are excluded.
    pub async fn search_movies(&self, text: &str) -> AppResult<Vec<MovieSummary>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("search text is empty".to_string()));
        }

        let pattern = like_pattern(text);
        let translated = Expr::cust_with_values(
            r#"EXISTS (SELECT 1 FROM json_each("movie"."translations") AS t WHERE t.value ->> 'title' LIKE ? ESCAPE '!')"#,
            [pattern.clone()],
        );

        let movies = movie::Entity::find()
            .filter(
                Condition::any()
                    .add(movie::Column::Title.like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)))
                    .add(movie::Column::OriginalTitle.like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)))
                    .add(translated),
            )
            .filter(movie::Column::Adult.eq(false))
            .order_by_desc(movie::Column::Popularity)
            .limit(SEARCH_LIMIT)
            .all(self.db())
            .await?;

        Ok(movies.into_iter().map(summary).collect())
    }

    pub async fn popular_movies(&self, count: Option<u64>) -> AppResult<Vec<MovieSummary>> {
        let count = page_size(count)?;
        let movies = movie::Entity::find()
            .order_by_desc(movie::Column::Popularity)
            .limit(count)
            .all(self.db())
            .await?;
        Ok(movies.into_iter().map(summary).collect())
    }

    pub async fn popular_people(&self, count: Option<u64>) -> AppResult<Vec<PersonSummary>> {
        let count = page_size(count)?;
        let people = person::Entity::find()
            .order_by_desc(person::Column::Popularity)
            .limit(count)
            .all(self.db())
            .await?;

        Ok(people
            .into_iter()
            .map(|p| PersonSummary {
                remote_id: p.remote_id,
                imdb_id: p.imdb_id,
                name: p.name,
                profile_path: p.profile_path,
                popularity: p.popularity,
            })
            .collect())
    }

    pub async fn find_person(&self, lookup: &PersonLookup) -> AppResult<Option<person::Model>> {
        let filter = match lookup {
            PersonLookup::Remote(remote_id) => person::Column::RemoteId.eq(*remote_id),
            PersonLookup::Imdb(imdb_id) => person::Column::ImdbId.eq(imdb_id.as_str()),
        };
        Ok(person::Entity::find().filter(filter).one(self.db()).await?)
    }
}

fn page_size(count: Option<u64>) -> AppResult<u64> {
    match count {
        None => Ok(MAX_PAGE),
        Some(0) => Err(AppError::Validation("count must be positive".to_string())),
        Some(c) if c > MAX_PAGE => {
            Err(AppError::Validation(format!("max allowed count is {MAX_PAGE}")))
        },
        Some(c) => Ok(c),
    }
}

fn summary(m: movie::Model) -> MovieSummary {
    MovieSummary {
        id: m.id,
        remote_id: m.remote_id,
        title: m.title,
        poster_path: m.poster_path,
        popularity: m.popularity,
    }
}

/// `%text%` with the LIKE wildcards in `text` escaped.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
