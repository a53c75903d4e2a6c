//! Content-based recommendations from a user's ratings.
//!
//! Every keyword and genre carried by a rated movie gets a weighted frequency
//! of `occurrences + sum of scores`. Released movies the user has not rated
//! are scored by summing the frequencies of their keywords and genres
//! ("density") and ranked by density, then popularity.

use std::{collections::HashMap, str::FromStr};

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QuerySelect,
    sea_query::{Query, SelectStatement},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    entities::{
        movie::{self, MovieStatus},
        movie_keyword, movie_tag, seen,
    },
    error::AppResult,
    models::Recommendation,
    ratings::parse_user_id,
};

/// How a candidate has to overlap with the rated set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// At least one shared keyword and at least one shared genre.
    #[default]
    All,
    /// At least one shared keyword or genre.
    Any,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "and" => Ok(MatchPolicy::All),
            "any" | "or" => Ok(MatchPolicy::Any),
            other => Err(format!("unknown match policy {other:?}, expected \"all\" or \"any\"")),
        }
    }
}

#[derive(Clone)]
pub struct Recommender {
    db: DatabaseConnection,
    policy: MatchPolicy,
}

#[derive(Debug, FromQueryResult)]
struct Candidate {
    id: i32,
    title: String,
    poster_path: Option<String>,
    popularity: f64,
}

impl Recommender {
    pub fn new(db: DatabaseConnection, policy: MatchPolicy) -> Self {
        Self { db, policy }
    }

    /// Id sets (rated movies, their keywords and genres) stay inside SQL as
    /// subqueries, so the statement size does not grow with the catalog.
    pub async fn recommend(&self, user_id: &str, limit: u64) -> AppResult<Vec<Recommendation>> {
        let user_id = parse_user_id(user_id)?;

        let ratings = seen::Entity::find()
            .filter(seen::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        if ratings.is_empty() {
            debug!(user_id = %user_id, "no ratings, nothing to recommend");
            return Ok(Vec::new());
        }

        let scores: HashMap<i32, i32> = ratings.iter().map(|s| (s.movie_id, s.score)).collect();

        let (rated_keywords, rated_tags) = futures::try_join!(
            self.rated_links(LinkKind::Keyword, user_id),
            self.rated_links(LinkKind::Tag, user_id),
        )?;

        let keyword_weights = weighted_frequencies(&rated_keywords, &scores);
        let tag_weights = weighted_frequencies(&rated_tags, &scores);

        // Links of unrated movies to the rated keywords and genres. These are
        // the only links that contribute to a density.
        let (keyword_hits, tag_hits, candidates) = futures::try_join!(
            self.candidate_links(LinkKind::Keyword, user_id),
            self.candidate_links(LinkKind::Tag, user_id),
            self.candidates(user_id),
        )?;
        debug!(user_id = %user_id, rated = scores.len(), candidates = candidates.len(), "scoring");

        let mut density = densities(&keyword_hits, &keyword_weights);
        for (movie_id, d) in densities(&tag_hits, &tag_weights) {
            *density.entry(movie_id).or_default() += d;
        }

        Ok(rank(candidates, &density, limit))
    }

    async fn rated_links(&self, kind: LinkKind, user_id: Uuid) -> AppResult<Vec<(i32, i32)>> {
        let links = match kind {
            LinkKind::Keyword => {
                movie_keyword::Entity::find()
                    .select_only()
                    .columns([movie_keyword::Column::MovieId, movie_keyword::Column::KeywordId])
                    .filter(movie_keyword::Column::MovieId.in_subquery(rated_movies(user_id)))
                    .into_tuple()
                    .all(&self.db)
                    .await?
            },
            LinkKind::Tag => {
                movie_tag::Entity::find()
                    .select_only()
                    .columns([movie_tag::Column::MovieId, movie_tag::Column::TagId])
                    .filter(movie_tag::Column::MovieId.in_subquery(rated_movies(user_id)))
                    .into_tuple()
                    .all(&self.db)
                    .await?
            },
        };
        Ok(links)
    }

    async fn candidate_links(&self, kind: LinkKind, user_id: Uuid) -> AppResult<Vec<(i32, i32)>> {
        let links = match kind {
            LinkKind::Keyword => {
                movie_keyword::Entity::find()
                    .select_only()
                    .columns([movie_keyword::Column::MovieId, movie_keyword::Column::KeywordId])
                    .filter(movie_keyword::Column::KeywordId.in_subquery(kind.rated_values(user_id)))
                    .filter(movie_keyword::Column::MovieId.not_in_subquery(rated_movies(user_id)))
                    .into_tuple()
                    .all(&self.db)
                    .await?
            },
            LinkKind::Tag => {
                movie_tag::Entity::find()
                    .select_only()
                    .columns([movie_tag::Column::MovieId, movie_tag::Column::TagId])
                    .filter(movie_tag::Column::TagId.in_subquery(kind.rated_values(user_id)))
                    .filter(movie_tag::Column::MovieId.not_in_subquery(rated_movies(user_id)))
                    .into_tuple()
                    .all(&self.db)
                    .await?
            },
        };
        Ok(links)
    }

    /// Released, unrated movies overlapping the rated set under the policy.
    async fn candidates(&self, user_id: Uuid) -> AppResult<Vec<Candidate>> {
        let overlap = match self.policy {
            MatchPolicy::All => Condition::all(),
            MatchPolicy::Any => Condition::any(),
        }
        .add(movie::Column::Id.in_subquery(LinkKind::Keyword.matching_movies(user_id)))
        .add(movie::Column::Id.in_subquery(LinkKind::Tag.matching_movies(user_id)));

        Ok(movie::Entity::find()
            .select_only()
            .columns([
                movie::Column::Id,
                movie::Column::Title,
                movie::Column::PosterPath,
                movie::Column::Popularity,
            ])
            .filter(overlap)
            .filter(movie::Column::Id.not_in_subquery(rated_movies(user_id)))
            .filter(movie::Column::Status.eq(MovieStatus::Released))
            .into_model::<Candidate>()
            .all(&self.db)
            .await?)
    }
}

#[derive(Clone, Copy)]
enum LinkKind {
    Keyword,
    Tag,
}

impl LinkKind {
    /// Keyword or genre ids carried by the user's rated movies.
    fn rated_values(self, user_id: Uuid) -> SelectStatement {
        match self {
            LinkKind::Keyword => Query::select()
                .column(movie_keyword::Column::KeywordId)
                .from(movie_keyword::Entity)
                .and_where(movie_keyword::Column::MovieId.in_subquery(rated_movies(user_id)))
                .to_owned(),
            LinkKind::Tag => Query::select()
                .column(movie_tag::Column::TagId)
                .from(movie_tag::Entity)
                .and_where(movie_tag::Column::MovieId.in_subquery(rated_movies(user_id)))
                .to_owned(),
        }
    }

    /// Movies sharing at least one of the rated values.
    fn matching_movies(self, user_id: Uuid) -> SelectStatement {
        match self {
            LinkKind::Keyword => Query::select()
                .column(movie_keyword::Column::MovieId)
                .from(movie_keyword::Entity)
                .and_where(movie_keyword::Column::KeywordId.in_subquery(self.rated_values(user_id)))
                .to_owned(),
            LinkKind::Tag => Query::select()
                .column(movie_tag::Column::MovieId)
                .from(movie_tag::Entity)
                .and_where(movie_tag::Column::TagId.in_subquery(self.rated_values(user_id)))
                .to_owned(),
        }
    }
}

fn rated_movies(user_id: Uuid) -> SelectStatement {
    Query::select()
        .column(seen::Column::MovieId)
        .from(seen::Entity)
        .and_where(seen::Column::UserId.eq(user_id))
        .to_owned()
}

/// `(movie, value)` links of the rated movies to
/// `value -> occurrences + sum of scores`.
pub fn weighted_frequencies(links: &[(i32, i32)], scores: &HashMap<i32, i32>) -> HashMap<i32, i64> {
    let mut weights: HashMap<i32, i64> = HashMap::new();
    for (movie_id, value) in links {
        let score = scores.get(movie_id).copied().unwrap_or(0);
        *weights.entry(*value).or_default() += 1 + i64::from(score);
    }
    weights
}

/// Candidate movie id to its summed weight over `links`. Values without a
/// weight are skipped.
pub fn densities(links: &[(i32, i32)], weights: &HashMap<i32, i64>) -> HashMap<i32, i64> {
    let mut out: HashMap<i32, i64> = HashMap::new();
    for (movie_id, value) in links {
        match weights.get(value) {
            Some(&w) if w != 0 => *out.entry(*movie_id).or_default() += w,
            _ => {},
        }
    }
    out
}

/// Density desc, popularity desc, then id for a stable order.
fn rank(
    mut movies: Vec<Candidate>,
    densities: &HashMap<i32, i64>,
    limit: u64,
) -> Vec<Recommendation> {
    let density = |m: &Candidate| densities.get(&m.id).copied().unwrap_or(0);

    movies.sort_by(|a, b| {
        density(b)
            .cmp(&density(a))
            .then_with(|| b.popularity.total_cmp(&a.popularity))
            .then_with(|| a.id.cmp(&b.id))
    });

    movies
        .into_iter()
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .map(|m| Recommendation { movie_id: m.id, title: m.title, poster_path: m.poster_path })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parsing() {
        assert_eq!("ALL".parse::<MatchPolicy>().unwrap(), MatchPolicy::All);
        assert_eq!(" any ".parse::<MatchPolicy>().unwrap(), MatchPolicy::Any);
        assert_eq!("or".parse::<MatchPolicy>().unwrap(), MatchPolicy::Any);
        assert!("most".parse::<MatchPolicy>().is_err());
        assert_eq!(MatchPolicy::default(), MatchPolicy::All);
    }

    #[test]
    fn frequency_counts_occurrences_and_scores() {
        let scores = HashMap::from([(1, 5), (2, 3)]);
        // keyword 10 on both rated movies, keyword 11 only on movie 2
        let links = [(1, 10), (2, 10), (2, 11)];
        let weights = weighted_frequencies(&links, &scores);
        assert_eq!(weights[&10], 2 + 5 + 3);
        assert_eq!(weights[&11], 1 + 3);
    }

    #[test]
    fn shared_keyword_and_genre_density() {
        // X (id 1) rated 5 with keywords {k1, k2} and genre {g1}.
        let scores = HashMap::from([(1, 5)]);
        let keyword_weights = weighted_frequencies(&[(1, 101), (1, 102)], &scores);
        let tag_weights = weighted_frequencies(&[(1, 201)], &scores);

        // Y (id 2) has k1 and g1, Z (id 3) has k2 and no genre.
        let keyword_hits = [(2, 101), (3, 102)];
        let tag_hits = [(2, 201)];

        let mut d = densities(&keyword_hits, &keyword_weights);
        for (m, w) in densities(&tag_hits, &tag_weights) {
            *d.entry(m).or_default() += w;
        }
        assert_eq!(d[&2], 12);
        assert_eq!(d[&3], 6);
    }

    fn candidate(id: i32, popularity: f64) -> Candidate {
        Candidate { id, title: format!("m{id}"), poster_path: None, popularity }
    }

    #[test]
    fn ranking_orders_by_density_then_popularity_then_id() {
        let density = HashMap::from([(1, 6), (2, 12), (3, 6), (4, 6)]);
        let movies = vec![candidate(1, 5.0), candidate(2, 1.0), candidate(3, 9.0), candidate(4, 5.0)];

        let ranked = rank(movies, &density, 3);
        assert_eq!(ranked.iter().map(|r| r.movie_id).collect::<Vec<_>>(), vec![2, 3, 1]);
    }

    #[test]
    fn zero_weights_do_not_contribute() {
        let weights = HashMap::from([(7, 0), (8, 4)]);
        let d = densities(&[(1, 7), (1, 8), (2, 7)], &weights);
        assert_eq!(d.get(&1), Some(&4));
        assert_eq!(d.get(&2), None);
    }
}
