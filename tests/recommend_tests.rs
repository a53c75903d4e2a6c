mod common;

use common::{MovieSpec, movie_payload};
use filmgraph::{
    catalog::Catalog,
    db,
    entities::{keyword, tag},
    error::AppError,
    normalize::normalize_movie,
    ratings::Ratings,
    recommend::{MatchPolicy, Recommender},
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

const K1: i64 = 101;
const K2: i64 = 102;
const G1: i64 = 201;

struct Fixture {
    catalog: Catalog,
    ratings: Ratings,
    user: String,
}

impl Fixture {
    async fn new() -> Self {
        let db = db::connect_in_memory().await.unwrap();
        let ratings = Ratings::new(db.clone());
        let user = ratings.find_or_create_user("Ana", "ana@example.com", None).await.unwrap();
        Self { catalog: Catalog::new(db), ratings, user: user.id.to_string() }
    }

    async fn store(&self, spec: MovieSpec<'_>) -> i32 {
        let normalized = normalize_movie(movie_payload(&spec)).unwrap();
        self.catalog.store_movie(&normalized).await.unwrap()
    }

    fn recommender(&self, policy: MatchPolicy) -> Recommender {
        Recommender::new(self.catalog.db().clone(), policy)
    }
}

/// X is rated 5 and carries {k1, k2} / {g1}. Y shares k1 and g1, Z only k2.
async fn ranking_fixture() -> (Fixture, i32, i32, i32) {
    let f = Fixture::new().await;
    let x = f.store(MovieSpec { keywords: &[K1, K2], genres: &[G1], ..MovieSpec::new(1, "X") }).await;
    let y = f
        .store(MovieSpec { keywords: &[K1], genres: &[G1], popularity: 10.0, ..MovieSpec::new(2, "Y") })
        .await;
    let z = f.store(MovieSpec { keywords: &[K2], popularity: 50.0, ..MovieSpec::new(3, "Z") }).await;
    f.ratings.add_rating(&f.user, x, 5).await.unwrap();
    (f, x, y, z)
}

#[tokio::test]
async fn no_ratings_means_no_recommendations() {
    let f = Fixture::new().await;
    f.store(MovieSpec { keywords: &[K1], genres: &[G1], ..MovieSpec::new(1, "X") }).await;

    let out = f.recommender(MatchPolicy::All).recommend(&f.user, 10).await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn malformed_user_id_is_rejected() {
    let f = Fixture::new().await;
    let err = f.recommender(MatchPolicy::All).recommend("not-a-user", 10).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn keyword_and_genre_must_both_match() {
    let (f, _, y, _) = ranking_fixture().await;

    let out = f.recommender(MatchPolicy::All).recommend(&f.user, 1).await.unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].movie_id, y);
    assert_eq!(out[0].title, "Y");

    let out = f.recommender(MatchPolicy::All).recommend(&f.user, 10).await.unwrap();
    assert_eq!(out.iter().map(|r| r.movie_id).collect::<Vec<_>>(), vec![y]);
}

#[tokio::test]
async fn any_policy_ranks_by_density_before_popularity() {
    let (f, _, y, z) = ranking_fixture().await;

    // Y: 6 + 6 = 12, Z: 6. Z is more popular but ranks second.
    let out = f.recommender(MatchPolicy::Any).recommend(&f.user, 10).await.unwrap();
    assert_eq!(out.iter().map(|r| r.movie_id).collect::<Vec<_>>(), vec![y, z]);
}

#[tokio::test]
async fn popularity_breaks_density_ties() {
    let (f, _, y, _) = ranking_fixture().await;
    let w = f
        .store(MovieSpec { keywords: &[K1], genres: &[G1], popularity: 80.0, ..MovieSpec::new(4, "W") })
        .await;

    let out = f.recommender(MatchPolicy::All).recommend(&f.user, 10).await.unwrap();
    assert_eq!(out.iter().map(|r| r.movie_id).collect::<Vec<_>>(), vec![w, y]);
}

#[tokio::test]
async fn rated_and_unreleased_movies_are_excluded() {
    let (f, x, y, _) = ranking_fixture().await;
    f.store(MovieSpec {
        keywords: &[K1],
        genres: &[G1],
        status: "Planned",
        popularity: 99.0,
        ..MovieSpec::new(5, "Planned")
    })
    .await;
    f.ratings.add_rating(&f.user, y, 1).await.unwrap();

    for policy in [MatchPolicy::All, MatchPolicy::Any] {
        let out = f.recommender(policy).recommend(&f.user, 10).await.unwrap();
        let ids: Vec<i32> = out.iter().map(|r| r.movie_id).collect();
        assert!(!ids.contains(&x));
        assert!(!ids.contains(&y));
        assert!(out.iter().all(|r| r.title != "Planned"));
    }
}

/// More candidates than SQLite accepts bound parameters in one statement.
const BULK: i64 = 33_000;

#[tokio::test]
async fn candidate_sets_larger_than_the_parameter_limit() {
    let (f, _, y, _) = ranking_fixture().await;
    let db = f.catalog.db();

    let k1 = keyword::Entity::find().filter(keyword::Column::RemoteId.eq(K1)).one(db).await.unwrap().unwrap();
    let g1 = tag::Entity::find().filter(tag::Column::RemoteId.eq(G1)).one(db).await.unwrap().unwrap();

    db.execute_unprepared(&format!(
        "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < {BULK})
         INSERT INTO movie (remote_id, title, original_title, original_language, status, adult,
             popularity, vote_average, vote_count, budget, revenue, production_countries,
             spoken_languages, titles, translations, created_at, updated_at)
         SELECT 1000000 + i, 'bulk ' || i, 'bulk ' || i, 'en', 'Released', 0, i / 1000.0,
             0, 0, 0, 0, '[]', '[]', '[]', '[]', 0, 0
         FROM n"
    ))
    .await
    .unwrap();
    db.execute_unprepared(&format!(
        "INSERT INTO movie_keyword (movie_id, keyword_id) SELECT id, {} FROM movie WHERE remote_id > 1000000",
        k1.id
    ))
    .await
    .unwrap();
    db.execute_unprepared(&format!(
        "INSERT INTO movie_tag (movie_id, tag_id) SELECT id, {} FROM movie WHERE remote_id > 1000000",
        g1.id
    ))
    .await
    .unwrap();

    for policy in [MatchPolicy::All, MatchPolicy::Any] {
        let out = f.recommender(policy).recommend(&f.user, 3).await.unwrap();
        let titles: Vec<&str> = out.iter().map(|r| r.title.as_str()).collect();
        // same density as Y, but more popular
        assert_eq!(titles, vec!["bulk 33000", "bulk 32999", "bulk 32998"]);
        assert!(out.iter().all(|r| r.movie_id != y));
    }
}
